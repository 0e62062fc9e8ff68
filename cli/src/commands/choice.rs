use std::process;

use anyhow::Result;

use mealcoach_core::models::CustomFood;
use mealcoach_core::quantity::format_grams;
use mealcoach_core::reconcile::CompletionWrite;
use mealcoach_core::service::{LedgerService, RecordedChoice};

use super::helpers::{json_error, parse_date, parse_quantity};

fn print_completions(writes: &[CompletionWrite]) {
    for w in writes {
        let slot = w.meal_slot_id;
        if w.is_completed {
            println!("  Slot {slot} reached its targets and was marked complete");
        } else {
            println!("  Slot {slot} is no longer on target and was marked incomplete");
        }
    }
}

fn print_recorded(verb: &str, recorded: &RecordedChoice) {
    let choice = &recorded.choice;
    let id = choice.id;
    let what = choice.display_name().map_or_else(
        || {
            let option = choice
                .food_option_id
                .map_or_else(|| "?".to_string(), |o| format!("option {o}"));
            let grams = format_grams(choice.quantity.as_ref());
            if grams.is_empty() {
                format!("{option} (1 serving)")
            } else {
                format!("{grams} of {option}")
            }
        },
        str::to_string,
    );
    println!("{verb} choice {id}: {what}");

    if let Some(p) = &recorded.projection {
        if p.exceeds() {
            let over = p.overflow_g();
            let remaining = p.remaining_g;
            eprintln!(
                "Warning: exceeds the category allowance by {over:.0}g ({remaining:.0}g was left)"
            );
        } else {
            let left = p.projected_g;
            println!("  {left:.0}g left in this category");
        }
    }
    print_completions(&recorded.completions);
}

pub(crate) fn cmd_choose(
    svc: &LedgerService,
    client: &str,
    option_id: i64,
    quantity: &str,
    slot: Option<i64>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let quantity = parse_quantity(quantity);
    let recorded = svc.record_choice(client, date, slot, option_id, Some(quantity))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recorded)?);
    } else {
        print_recorded("Recorded", &recorded);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_custom(
    svc: &LedgerService,
    client: &str,
    name: &str,
    slot: Option<i64>,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let custom = CustomFood {
        name: name.to_string(),
        calories,
        protein_g: protein,
        carb_g: carbs,
        fat_g: fat,
    };
    let recorded = svc.record_custom_food(client, date, slot, custom)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recorded)?);
    } else {
        print_recorded("Recorded", &recorded);
    }
    Ok(())
}

pub(crate) fn cmd_update(
    svc: &LedgerService,
    choice_id: i64,
    quantity: &str,
    json: bool,
) -> Result<()> {
    let recorded = svc.update_choice_quantity(choice_id, Some(parse_quantity(quantity)))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recorded)?);
    } else {
        print_recorded("Updated", &recorded);
    }
    Ok(())
}

pub(crate) fn cmd_delete(svc: &LedgerService, choice_id: i64, json: bool) -> Result<()> {
    if svc.db().find_choice(choice_id)?.is_none() {
        if json {
            println!("{}", json_error(&format!("Choice {choice_id} not found")));
        } else {
            eprintln!("Choice {choice_id} not found");
        }
        process::exit(2);
    }

    let writes = svc.delete_choice(choice_id)?;
    if json {
        println!(
            "{}",
            serde_json::json!({ "deleted": choice_id, "completions": writes })
        );
    } else {
        println!("Deleted choice {choice_id}");
        print_completions(&writes);
    }
    Ok(())
}
