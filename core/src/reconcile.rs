//! Meal completion reconciliation.
//!
//! Each (slot, date) is either untouched, set by the client (checked or
//! unchecked), or completed automatically because the slot's totals reached
//! its targets. A pass compares every targeted slot's totals with its targets
//! and emits the writes needed to move auto state along; whatever the client
//! set last is never touched.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{CompletionMethod, CompletionRecord, MacroTargets, MealSlot};
use crate::scaling::Macros;
use crate::snapshot::DaySnapshot;
use crate::totals::meal_totals;

pub const DEFAULT_TOLERANCE: f64 = 0.5;

/// Setting key the tolerance is persisted under.
pub const TOLERANCE_SETTING: &str = "completion_tolerance";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconcilePolicy {
    /// Absolute slack, in the target's own unit (kcal or grams).
    pub tolerance: f64,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "method", rename_all = "snake_case")]
pub enum CompletionState {
    NotCompleted,
    /// Unchecked by the client; stays unchecked whatever the totals do.
    Cleared,
    Completed(CompletionMethod),
}

impl CompletionState {
    #[must_use]
    pub fn from_record(record: Option<&CompletionRecord>) -> Self {
        match record {
            Some(r) if r.is_completed => Self::Completed(r.completion_method),
            Some(r) if r.completion_method == CompletionMethod::Manual => Self::Cleared,
            _ => Self::NotCompleted,
        }
    }

    #[must_use]
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// A completion record the caller should persist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionWrite {
    pub meal_slot_id: i64,
    pub date: NaiveDate,
    pub is_completed: bool,
    pub completion_method: CompletionMethod,
}

impl CompletionWrite {
    #[must_use]
    pub fn to_record(&self, updated_at: &str) -> CompletionRecord {
        CompletionRecord {
            meal_slot_id: self.meal_slot_id,
            date: self.date,
            is_completed: self.is_completed,
            completion_method: self.completion_method,
            updated_at: updated_at.to_string(),
        }
    }
}

/// A direct client action: always written, whatever the current state.
#[must_use]
pub fn manual_toggle(meal_slot_id: i64, date: NaiveDate, completed: bool) -> CompletionWrite {
    CompletionWrite {
        meal_slot_id,
        date,
        is_completed: completed,
        completion_method: CompletionMethod::Manual,
    }
}

fn meets(target: Option<f64>, current: f64, policy: &ReconcilePolicy) -> bool {
    MacroTargets::declared(target).is_none_or(|t| current >= t - policy.tolerance)
}

/// Whether `totals` reach every declared target within the policy's tolerance.
#[must_use]
pub fn meets_targets(targets: &MacroTargets, totals: &Macros, policy: &ReconcilePolicy) -> bool {
    meets(targets.calories, totals.calories, policy)
        && meets(targets.protein_g, totals.protein, policy)
        && meets(targets.carb_g, totals.carbs, policy)
        && meets(targets.fat_g, totals.fat, policy)
}

/// Next state for a targeted slot, or `None` when nothing changes.
#[must_use]
pub fn next_state(current: CompletionState, meets_all: bool) -> Option<CompletionState> {
    let auto = CompletionState::Completed(CompletionMethod::Auto);
    match (meets_all, current) {
        (_, CompletionState::Cleared) | (true, CompletionState::Completed(_)) => None,
        (true, CompletionState::NotCompleted) => Some(auto),
        (false, CompletionState::Completed(CompletionMethod::Auto)) => {
            Some(CompletionState::NotCompleted)
        }
        (false, _) => None,
    }
}

/// Decide the write (if any) for one slot given its totals and current record.
#[must_use]
pub fn reconcile_slot(
    slot: &MealSlot,
    date: NaiveDate,
    totals: &Macros,
    current: Option<&CompletionRecord>,
    policy: &ReconcilePolicy,
) -> Option<CompletionWrite> {
    if !slot.targets.has_any() {
        return None;
    }
    let state = CompletionState::from_record(current);
    let meets_all = meets_targets(&slot.targets, totals, policy);
    let next = next_state(state, meets_all)?;
    debug!(slot_id = slot.id, %date, ?state, ?next, meets_all, "completion transition");
    Some(CompletionWrite {
        meal_slot_id: slot.id,
        date,
        is_completed: next.is_completed(),
        completion_method: CompletionMethod::Auto,
    })
}

/// One reconciliation pass over every slot in the snapshot's plan.
#[must_use]
pub fn reconcile_day(snapshot: &DaySnapshot, policy: &ReconcilePolicy) -> Vec<CompletionWrite> {
    let index = snapshot.index();
    snapshot
        .plan
        .slots
        .iter()
        .filter_map(|slot| {
            let totals = meal_totals(slot.id, &snapshot.choices, &index);
            reconcile_slot(
                slot,
                snapshot.date,
                &totals,
                snapshot.completion_for(slot.id),
                policy,
            )
        })
        .collect()
}
