use serde::Serialize;

use crate::models::{ClientChoice, FoodOption, MacroType};
use crate::plan_index::PlanIndex;
use crate::totals::category_total_consumed;

/// Grams still available in the slot's `macro_type` pool, using `option`'s
/// canonical serving as the pool size. Never negative.
#[must_use]
pub fn option_remaining_grams(
    slot_id: i64,
    macro_type: MacroType,
    option: &FoodOption,
    choices: &[ClientChoice],
    index: &PlanIndex<'_>,
) -> f64 {
    let recommended = option.canonical_serving_grams();
    if recommended <= 0.0 {
        return 0.0;
    }
    let consumed = category_total_consumed(slot_id, macro_type, choices, index);
    (recommended - consumed).max(0.0)
}

/// What committing a selection would do to a category pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AllowanceProjection {
    pub remaining_g: f64,
    pub proposed_g: f64,
    /// Signed: negative means the selection overshoots the pool by that much.
    pub projected_g: f64,
}

impl AllowanceProjection {
    #[must_use]
    pub fn exceeds(&self) -> bool {
        self.projected_g < 0.0
    }

    #[must_use]
    pub fn overflow_g(&self) -> f64 {
        (-self.projected_g).max(0.0)
    }
}

/// Project a proposed selection of `proposed_g` grams of `option`. When the
/// selection replaces an existing choice, pass its id as `replacing` so its
/// current grams are not counted twice. Overshooting is reported, not refused.
#[must_use]
pub fn project_selection(
    slot_id: i64,
    macro_type: MacroType,
    option: &FoodOption,
    proposed_g: f64,
    choices: &[ClientChoice],
    index: &PlanIndex<'_>,
    replacing: Option<i64>,
) -> AllowanceProjection {
    let remaining_g = match replacing {
        Some(id) => {
            let others: Vec<ClientChoice> =
                choices.iter().filter(|c| c.id != id).cloned().collect();
            option_remaining_grams(slot_id, macro_type, option, &others, index)
        }
        None => option_remaining_grams(slot_id, macro_type, option, choices, index),
    };
    AllowanceProjection {
        remaining_g,
        proposed_g,
        projected_g: remaining_g - proposed_g,
    }
}
