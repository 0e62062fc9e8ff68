use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use mealcoach_core::models::{MealPlan, NewMealPlan};
use mealcoach_core::quantity::format_grams;
use mealcoach_core::service::LedgerService;

use super::helpers::{format_targets, json_error, truncate};

pub(crate) fn cmd_plan_import(
    svc: &LedgerService,
    client: &str,
    file: &Path,
    json: bool,
) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read plan file: {}", file.display()))?;
    let new_plan: NewMealPlan = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid meal plan JSON in {}", file.display()))?;
    let plan = svc.import_plan(client, &new_plan)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        let id = plan.id;
        let name = &plan.name;
        let slots = plan.slots.len();
        let options: usize = plan
            .slots
            .iter()
            .flat_map(|s| &s.categories)
            .map(|c| c.options.len())
            .sum();
        println!("Imported plan {id} '{name}' for {client}: {slots} slots, {options} food options");
        println!("Plan {id} is now active");
    }
    Ok(())
}

fn print_plan(plan: &MealPlan) {
    #[derive(Tabled)]
    struct OptionRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Macro")]
        macro_type: String,
        #[tabled(rename = "Food")]
        name: String,
        #[tabled(rename = "Serving")]
        serving: String,
        #[tabled(rename = "Cal")]
        calories: String,
        #[tabled(rename = "P")]
        protein: String,
        #[tabled(rename = "C")]
        carbs: String,
        #[tabled(rename = "F")]
        fat: String,
    }

    let id = plan.id;
    let name = &plan.name;
    println!("=== Plan {id}: {name} ===");
    let daily = format_targets(&plan.daily_targets);
    if !daily.is_empty() {
        println!("  Daily targets: {daily}");
    }

    for slot in &plan.slots {
        let slot_name = slot.name.to_uppercase();
        let slot_id = slot.id;
        let targets = format_targets(&slot.targets);
        if targets.is_empty() {
            println!("\n  [{slot_id}] {slot_name}");
        } else {
            println!("\n  [{slot_id}] {slot_name} (target {targets})");
        }

        let rows: Vec<OptionRow> = slot
            .categories
            .iter()
            .flat_map(|category| {
                category.options.iter().map(move |o| OptionRow {
                    id: o.id,
                    macro_type: category.macro_type.to_string(),
                    name: truncate(&o.name, 30),
                    serving: format_grams(o.serving_size.as_ref()),
                    calories: format!("{:.0}", o.calories),
                    protein: format!("{:.1}", o.protein_g),
                    carbs: format!("{:.1}", o.carb_g),
                    fat: format!("{:.1}", o.fat_g),
                })
            })
            .collect();
        if rows.is_empty() {
            println!("  (no food options)");
            continue;
        }
        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(3..8)).with(Alignment::right()))
            .to_string();
        println!("{table}");

        for category in &slot.categories {
            if let Some(instruction) = &category.quantity_instruction {
                let macro_type = category.macro_type;
                println!("  {macro_type}: {instruction}");
            }
        }
    }
}

pub(crate) fn cmd_plan_show(svc: &LedgerService, client: &str, json: bool) -> Result<()> {
    let Some(plan) = svc.active_plan(client)? else {
        let message = format!("No active meal plan for client '{client}'");
        if json {
            println!("{}", json_error(&message));
        } else {
            eprintln!("{message}");
        }
        process::exit(2);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

pub(crate) fn cmd_plan_list(svc: &LedgerService, client: &str, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct PlanRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Slots")]
        slots: i64,
        #[tabled(rename = "Active")]
        active: String,
        #[tabled(rename = "Imported")]
        created_at: String,
    }

    let plans = svc.list_plans(client)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plans)?);
        return Ok(());
    }

    if plans.is_empty() {
        eprintln!("No meal plans for client '{client}'");
        process::exit(2);
    }

    let rows: Vec<PlanRow> = plans
        .iter()
        .map(|p| PlanRow {
            id: p.id,
            name: truncate(&p.name, 35),
            slots: p.slot_count,
            active: if p.is_active { "*".into() } else { String::new() },
            created_at: p.created_at.chars().take(10).collect(),
        })
        .collect();
    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_plan_activate(
    svc: &LedgerService,
    client: &str,
    plan_id: i64,
    json: bool,
) -> Result<()> {
    let plan = svc.activate_plan(client, plan_id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        let name = &plan.name;
        println!("Plan {plan_id} '{name}' is now active for {client}");
    }
    Ok(())
}
