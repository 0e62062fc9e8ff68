use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use mealcoach_core::models::{CompletionMethod, validate_macro_type};
use mealcoach_core::quantity::format_grams;
use mealcoach_core::reconcile::CompletionState;
use mealcoach_core::service::LedgerService;
use mealcoach_core::view::{CategoryView, SlotView};

use super::helpers::{format_macros, format_remaining, format_targets, no_neg_zero, parse_date, truncate};

fn completion_label(state: CompletionState) -> &'static str {
    match state {
        CompletionState::NotCompleted => "open",
        CompletionState::Cleared => "unchecked",
        CompletionState::Completed(CompletionMethod::Manual) => "done (manual)",
        CompletionState::Completed(CompletionMethod::Auto) => "done (auto)",
    }
}

fn print_slot(slot: &SlotView) {
    let name = slot.name.to_uppercase();
    let id = slot.slot_id;
    let state = completion_label(slot.completion);
    let totals = format_macros(&slot.totals);
    println!("  [{id}] {name} [{state}] {totals}");
    if slot.has_targets {
        let targets = format_targets(&slot.targets);
        let remaining = format_remaining(&slot.remaining);
        println!("      target {targets} | to go {remaining}");
    }

    for choice in &slot.choices {
        let cid = choice.id;
        let label = choice.display_name().map_or_else(
            || {
                let option_name = choice
                    .food_option_id
                    .and_then(|id| {
                        slot.categories
                            .iter()
                            .flat_map(|c| &c.options)
                            .find(|o| o.option_id == id)
                    })
                    .map_or("?", |o| o.name.as_str());
                let grams = format_grams(choice.quantity.as_ref());
                if grams.is_empty() {
                    format!("{option_name} (1 serving)")
                } else {
                    format!("{option_name} {grams}")
                }
            },
            |custom| format!("{custom} (custom)"),
        );
        println!("      #{cid} {label}");
    }
}

pub(crate) fn cmd_day(
    svc: &LedgerService,
    client: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let view = svc.day_view(client, date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let date = &view.date;
    let plan = &view.plan_name;
    println!("=== {date}: {plan} ===\n");
    for slot in &view.slots {
        print_slot(slot);
        println!();
    }

    let done = view.completed_slots;
    let total = view.total_slots;
    println!("  TOTAL: {}", format_macros(&view.totals));
    let daily = format_targets(&view.daily_targets);
    if !daily.is_empty() {
        println!("  TARGET: {daily}");
        println!("  REMAINING: {}", format_remaining(&view.remaining));
    }
    println!("  MEALS DONE: {done}/{total}");
    Ok(())
}

pub(crate) fn cmd_reconcile(
    svc: &LedgerService,
    client: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let writes = svc.reconcile(client, date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&writes)?);
        return Ok(());
    }

    if writes.is_empty() {
        println!("All meal completions for {date} are up to date");
    }
    for w in &writes {
        let slot = w.meal_slot_id;
        let state = if w.is_completed { "complete" } else { "incomplete" };
        println!("Slot {slot} marked {state} (auto)");
    }
    Ok(())
}

pub(crate) fn cmd_complete(
    svc: &LedgerService,
    client: &str,
    slot_id: i64,
    completed: bool,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let record = svc.set_completion(client, date, slot_id, completed)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else if completed {
        println!("Slot {slot_id} marked complete for {date}");
    } else {
        println!("Slot {slot_id} marked incomplete for {date}");
    }
    Ok(())
}

fn print_allowance(category: &CategoryView) {
    #[derive(Tabled)]
    struct AllowanceRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Food")]
        name: String,
        #[tabled(rename = "Serving")]
        serving: String,
        #[tabled(rename = "Remaining")]
        remaining: String,
    }

    let macro_type = category.macro_type;
    let consumed = no_neg_zero(category.consumed_g);
    println!("{macro_type}: {consumed:.0}g eaten");
    if let Some(instruction) = &category.quantity_instruction {
        println!("  {instruction}");
    }

    let rows: Vec<AllowanceRow> = category
        .options
        .iter()
        .map(|o| AllowanceRow {
            id: o.option_id,
            name: truncate(&o.name, 35),
            serving: format!("{:.0}g", o.canonical_serving_g),
            remaining: format!("{:.0}g", o.remaining_g),
        })
        .collect();
    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn cmd_allowance(
    svc: &LedgerService,
    client: &str,
    slot_id: i64,
    macro_type: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let macro_type = validate_macro_type(macro_type)?;
    let category = svc.category_allowance(client, date, slot_id, macro_type)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&category)?);
    } else {
        print_allowance(&category);
    }
    Ok(())
}
