use anyhow::Result;

use mealcoach_core::service::LedgerService;

use crate::config::Config;

pub(crate) fn cmd_config_show(
    svc: &LedgerService,
    config: &Config,
    client: &str,
    json: bool,
) -> Result<()> {
    let policy = svc.policy()?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "data_dir": config.data_dir,
                "db_path": config.db_path,
                "client": client,
                "completion_tolerance": policy.tolerance,
            }))?
        );
    } else {
        println!("Data directory:       {}", config.data_dir.display());
        println!("Database:             {}", config.db_path.display());
        println!("Client:               {client}");
        println!("Completion tolerance: {}", policy.tolerance);
    }
    Ok(())
}

pub(crate) fn cmd_config_set_tolerance(svc: &LedgerService, tolerance: f64, json: bool) -> Result<()> {
    let policy = svc.set_tolerance(tolerance)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&policy)?);
    } else {
        let t = policy.tolerance;
        println!("Completion tolerance set to {t}");
    }
    Ok(())
}
