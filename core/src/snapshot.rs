use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{ClientChoice, CompletionRecord, MealPlan};
use crate::plan_index::PlanIndex;
use crate::quantity::Quantity;
use crate::reconcile::CompletionWrite;

/// Everything the engine needs for one client on one day. Immutable: the
/// `with_*` / `without_*` methods consume the snapshot and hand back the next
/// version instead of editing in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySnapshot {
    pub client_id: String,
    pub date: NaiveDate,
    pub version: u64,
    pub plan: MealPlan,
    pub choices: Vec<ClientChoice>,
    pub completions: Vec<CompletionRecord>,
}

impl DaySnapshot {
    #[must_use]
    pub fn new(
        client_id: &str,
        date: NaiveDate,
        plan: MealPlan,
        choices: Vec<ClientChoice>,
        completions: Vec<CompletionRecord>,
    ) -> Self {
        Self {
            client_id: client_id.to_string(),
            date,
            version: 0,
            plan,
            choices,
            completions,
        }
    }

    #[must_use]
    pub fn index(&self) -> PlanIndex<'_> {
        PlanIndex::new(&self.plan)
    }

    #[must_use]
    pub fn completion_for(&self, slot_id: i64) -> Option<&CompletionRecord> {
        self.completions.iter().find(|c| c.meal_slot_id == slot_id)
    }

    #[must_use]
    pub fn choice(&self, choice_id: i64) -> Option<&ClientChoice> {
        self.choices.iter().find(|c| c.id == choice_id)
    }

    /// Add a choice, replacing any existing choice with the same id.
    #[must_use]
    pub fn with_choice(mut self, choice: ClientChoice) -> Self {
        if let Some(existing) = self.choices.iter_mut().find(|c| c.id == choice.id) {
            *existing = choice;
        } else {
            self.choices.push(choice);
        }
        self.bump()
    }

    #[must_use]
    pub fn with_quantity(mut self, choice_id: i64, quantity: Option<Quantity>) -> Self {
        if let Some(existing) = self.choices.iter_mut().find(|c| c.id == choice_id) {
            existing.quantity = quantity;
        }
        self.bump()
    }

    #[must_use]
    pub fn without_choice(mut self, choice_id: i64) -> Self {
        self.choices.retain(|c| c.id != choice_id);
        self.bump()
    }

    /// Overwrite (or create) the completion record for the write's slot.
    #[must_use]
    pub fn with_completion(mut self, write: &CompletionWrite) -> Self {
        let record = CompletionRecord {
            meal_slot_id: write.meal_slot_id,
            date: write.date,
            is_completed: write.is_completed,
            completion_method: write.completion_method,
            updated_at: String::new(),
        };
        if let Some(existing) = self
            .completions
            .iter_mut()
            .find(|c| c.meal_slot_id == write.meal_slot_id)
        {
            *existing = record;
        } else {
            self.completions.push(record);
        }
        self.bump()
    }

    fn bump(mut self) -> Self {
        self.version += 1;
        self
    }
}
