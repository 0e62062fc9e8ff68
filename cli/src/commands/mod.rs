mod choice;
mod day;
mod helpers;
mod plan;
mod settings;

pub(crate) use choice::{cmd_choose, cmd_custom, cmd_delete, cmd_update};
pub(crate) use day::{cmd_allowance, cmd_complete, cmd_day, cmd_reconcile};
pub(crate) use plan::{cmd_plan_activate, cmd_plan_import, cmd_plan_list, cmd_plan_show};
pub(crate) use settings::{cmd_config_set_tolerance, cmd_config_show};
