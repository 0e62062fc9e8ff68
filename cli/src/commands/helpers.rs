use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;

use mealcoach_core::models::MacroTargets;
use mealcoach_core::quantity::Quantity;
use mealcoach_core::scaling::Macros;
use mealcoach_core::view::RemainingToTarget;

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

/// A bare number is taken as grams; anything else is kept as typed ("150g", "150,5").
pub(crate) fn parse_quantity(s: &str) -> Quantity {
    let trimmed = s.trim();
    match trimmed.parse::<f64>() {
        Ok(g) if g.is_finite() => Quantity::Grams(g),
        _ => Quantity::Text(trimmed.to_string()),
    }
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

pub(crate) fn format_macros(m: &Macros) -> String {
    let cal = no_neg_zero(m.calories);
    let p = no_neg_zero(m.protein);
    let c = no_neg_zero(m.carbs);
    let f = no_neg_zero(m.fat);
    format!("{cal:.0} kcal | P:{p:.0}g C:{c:.0}g F:{f:.0}g")
}

/// Declared targets only, e.g. `P:40g` or `500 kcal | C:60g`. Empty when none are set.
pub(crate) fn format_targets(t: &MacroTargets) -> String {
    let mut parts = Vec::new();
    if let Some(cal) = MacroTargets::declared(t.calories) {
        parts.push(format!("{cal:.0} kcal"));
    }
    for (label, value) in [("P", t.protein_g), ("C", t.carb_g), ("F", t.fat_g)] {
        if let Some(v) = MacroTargets::declared(value) {
            parts.push(format!("{label}:{v:.0}g"));
        }
    }
    parts.join(" | ")
}

pub(crate) fn format_remaining(r: &RemainingToTarget) -> String {
    let mut parts = Vec::new();
    if let Some(cal) = r.calories {
        let cal = no_neg_zero(cal);
        parts.push(format!("{cal:.0} kcal"));
    }
    for (label, value) in [("P", r.protein_g), ("C", r.carb_g), ("F", r.fat_g)] {
        if let Some(v) = value {
            let v = no_neg_zero(v);
            parts.push(format!("{label}:{v:.0}g"));
        }
    }
    parts.join(" | ")
}
