use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::allowance::{AllowanceProjection, project_selection};
use crate::db::Database;
use crate::models::{
    ClientChoice, CompletionRecord, CustomFood, MacroType, MealPlan, NewChoice, NewMealPlan,
    PlanSummary, invalid, validate_new_choice, validate_new_plan, validate_tolerance,
};
use crate::quantity::{Quantity, parse_grams};
use crate::reconcile::{
    CompletionWrite, ReconcilePolicy, TOLERANCE_SETTING, manual_toggle, reconcile_day,
};
use crate::snapshot::DaySnapshot;
use crate::view::{CategoryView, DayView, build_day_view, category_view};

/// Where reconciled completion writes are persisted.
///
/// Implemented by [`Database`]; anything else that can take a write (a
/// remote API client, a test double) can stand in for it.
pub trait CompletionSink {
    fn upsert_completion(&self, client_id: &str, write: &CompletionWrite) -> Result<()>;
}

impl CompletionSink for Database {
    fn upsert_completion(&self, client_id: &str, write: &CompletionWrite) -> Result<()> {
        let record = write.to_record(&Local::now().to_rfc3339());
        Database::upsert_completion(self, client_id, &record).map(|_| ())
    }
}

/// Issue every write, logging (not propagating) failures. Returns how many
/// landed. A write that fails is re-derived by the next pass.
pub fn flush_completion_writes<S: CompletionSink + ?Sized>(
    sink: &S,
    client_id: &str,
    writes: &[CompletionWrite],
) -> usize {
    let mut landed = 0;
    for write in writes {
        match sink.upsert_completion(client_id, write) {
            Ok(()) => landed += 1,
            Err(e) => warn!(
                client_id,
                slot_id = write.meal_slot_id,
                date = %write.date,
                error = %e,
                "failed to persist completion; next pass will retry"
            ),
        }
    }
    landed
}

/// Outcome of recording or changing a choice.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedChoice {
    pub choice: ClientChoice,
    /// Present for catalog choices whose option is in the active plan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection: Option<AllowanceProjection>,
    pub completions: Vec<CompletionWrite>,
}

pub struct LedgerService {
    db: Database,
}

impl LedgerService {
    pub fn new(db_path: &Path) -> Result<Self> {
        let db = Database::open(db_path)?;
        Ok(Self { db })
    }

    pub fn new_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self { db })
    }

    #[must_use]
    pub fn db(&self) -> &Database {
        &self.db
    }

    // --- Plans ---

    pub fn import_plan(&self, client_id: &str, plan: &NewMealPlan) -> Result<MealPlan> {
        validate_new_plan(plan)?;
        let stored = self.db.import_plan(client_id, plan)?;
        info!(
            client_id,
            plan_id = stored.id,
            slots = stored.slots.len(),
            "imported meal plan"
        );
        Ok(stored)
    }

    pub fn active_plan(&self, client_id: &str) -> Result<Option<MealPlan>> {
        self.db.get_active_plan(client_id)
    }

    pub fn list_plans(&self, client_id: &str) -> Result<Vec<PlanSummary>> {
        self.db.list_plans(client_id)
    }

    pub fn activate_plan(&self, client_id: &str, plan_id: i64) -> Result<MealPlan> {
        let plan = self.db.activate_plan(client_id, plan_id)?;
        info!(client_id, plan_id, "activated meal plan");
        Ok(plan)
    }

    // --- Policy ---

    pub fn policy(&self) -> Result<ReconcilePolicy> {
        let Some(raw) = self.db.get_setting(TOLERANCE_SETTING)? else {
            return Ok(ReconcilePolicy::default());
        };
        let tolerance: f64 = raw
            .trim()
            .parse()
            .with_context(|| format!("Stored completion tolerance '{raw}' is not a number"))?;
        // A bad stored value is a storage problem, not caller input
        validate_tolerance(tolerance)
            .map_err(|e| anyhow!("Stored completion tolerance is unusable: {e}"))?;
        Ok(ReconcilePolicy { tolerance })
    }

    pub fn set_tolerance(&self, tolerance: f64) -> Result<ReconcilePolicy> {
        validate_tolerance(tolerance)?;
        self.db
            .set_setting(TOLERANCE_SETTING, &tolerance.to_string())?;
        info!(tolerance, "completion tolerance updated");
        Ok(ReconcilePolicy { tolerance })
    }

    // --- Day snapshot & reconciliation ---

    pub fn load_snapshot(&self, client_id: &str, date: NaiveDate) -> Result<DaySnapshot> {
        let Some(plan) = self.db.get_active_plan(client_id)? else {
            bail!("No active meal plan for client '{client_id}'");
        };
        let choices = self.db.get_choices(client_id, date)?;
        let completions = self.db.get_completions(client_id, date)?;
        Ok(DaySnapshot::new(client_id, date, plan, choices, completions))
    }

    /// Derive, persist and apply this snapshot's completion writes. The
    /// returned snapshot reflects the derived state even where a write failed.
    fn settle(
        &self,
        snapshot: DaySnapshot,
        policy: &ReconcilePolicy,
    ) -> (DaySnapshot, Vec<CompletionWrite>) {
        let writes = reconcile_day(&snapshot, policy);
        if writes.is_empty() {
            return (snapshot, writes);
        }
        let landed = flush_completion_writes(&self.db, &snapshot.client_id, &writes);
        debug!(
            client_id = %snapshot.client_id,
            date = %snapshot.date,
            derived = writes.len(),
            landed,
            "reconciled day"
        );
        let snapshot = writes.iter().fold(snapshot, DaySnapshot::with_completion);
        (snapshot, writes)
    }

    /// One explicit reconciliation pass; returns the writes it issued.
    pub fn reconcile(&self, client_id: &str, date: NaiveDate) -> Result<Vec<CompletionWrite>> {
        let snapshot = self.load_snapshot(client_id, date)?;
        let policy = self.policy()?;
        let (_, writes) = self.settle(snapshot, &policy);
        Ok(writes)
    }

    pub fn day_view(&self, client_id: &str, date: NaiveDate) -> Result<DayView> {
        let snapshot = self.load_snapshot(client_id, date)?;
        let policy = self.policy()?;
        let (snapshot, _) = self.settle(snapshot, &policy);
        Ok(build_day_view(&snapshot, &policy))
    }

    // --- Choices ---

    /// Record `quantity` of a catalog option. A choice already stored for the
    /// same (client, date, slot, option) is updated instead of duplicated.
    /// Overshooting the category pool is reported in the projection, not refused.
    pub fn record_choice(
        &self,
        client_id: &str,
        date: NaiveDate,
        meal_slot_id: Option<i64>,
        food_option_id: i64,
        quantity: Option<Quantity>,
    ) -> Result<RecordedChoice> {
        let snapshot = self.load_snapshot(client_id, date)?;
        let policy = self.policy()?;

        let (new_choice, existing_id, projection) = {
            let index = snapshot.index();
            let Some(entry) = index.option(food_option_id) else {
                invalid!("Food option {food_option_id} is not part of the active meal plan");
            };
            if let Some(requested) = meal_slot_id {
                if requested != entry.slot_id {
                    invalid!("Food option {food_option_id} does not belong to meal slot {requested}");
                }
            }
            let new_choice = NewChoice {
                client_id: client_id.to_string(),
                date,
                meal_slot_id: Some(entry.slot_id),
                food_option_id: Some(food_option_id),
                quantity: quantity.clone(),
                custom: None,
            };
            validate_new_choice(&new_choice)?;

            let existing_id = self
                .db
                .find_catalog_choice(client_id, date, Some(entry.slot_id), food_option_id)?
                .map(|c| c.id);
            let projection = project_selection(
                entry.slot_id,
                entry.macro_type,
                entry.option,
                parse_grams(quantity.as_ref()),
                &snapshot.choices,
                &index,
                existing_id,
            );
            if projection.exceeds() {
                debug!(
                    food_option_id,
                    overflow_g = projection.overflow_g(),
                    "selection exceeds category allowance"
                );
            }
            (new_choice, existing_id, projection)
        };

        let stored = match existing_id {
            Some(id) => {
                debug!(choice_id = id, "updating existing catalog choice");
                self.db.update_choice_quantity(id, quantity.as_ref())?
            }
            None => self.db.insert_choice(&new_choice)?,
        };
        Ok(self.finish(snapshot, stored, Some(projection), &policy))
    }

    pub fn record_custom_food(
        &self,
        client_id: &str,
        date: NaiveDate,
        meal_slot_id: Option<i64>,
        custom: CustomFood,
    ) -> Result<RecordedChoice> {
        let snapshot = self.load_snapshot(client_id, date)?;
        let policy = self.policy()?;
        if let Some(slot_id) = meal_slot_id {
            if snapshot.plan.slot(slot_id).is_none() {
                invalid!("Meal slot {slot_id} is not part of the active meal plan");
            }
        }
        let new_choice = NewChoice {
            client_id: client_id.to_string(),
            date,
            meal_slot_id,
            food_option_id: None,
            quantity: None,
            custom: Some(custom),
        };
        validate_new_choice(&new_choice)?;
        let stored = self.db.insert_choice(&new_choice)?;
        Ok(self.finish(snapshot, stored, None, &policy))
    }

    pub fn update_choice_quantity(
        &self,
        choice_id: i64,
        quantity: Option<Quantity>,
    ) -> Result<RecordedChoice> {
        let current = self.db.get_choice(choice_id)?;
        if current.has_custom_values() {
            invalid!("Choice {choice_id} is a custom food; custom foods take no quantity");
        }
        validate_new_choice(&NewChoice {
            client_id: current.client_id.clone(),
            date: current.date,
            meal_slot_id: current.meal_slot_id,
            food_option_id: current.food_option_id,
            quantity: quantity.clone(),
            custom: None,
        })?;

        let snapshot = self.load_snapshot(&current.client_id, current.date)?;
        let policy = self.policy()?;
        let projection = {
            let index = snapshot.index();
            current
                .food_option_id
                .and_then(|id| index.option(id))
                .map(|entry| {
                    project_selection(
                        index.resolve_slot(&current).unwrap_or(entry.slot_id),
                        entry.macro_type,
                        entry.option,
                        parse_grams(quantity.as_ref()),
                        &snapshot.choices,
                        &index,
                        Some(choice_id),
                    )
                })
        };
        let stored = self
            .db
            .update_choice_quantity(choice_id, quantity.as_ref())?;
        Ok(self.finish(snapshot, stored, projection, &policy))
    }

    /// Delete a choice and reconcile its day. Returns the completion writes issued.
    pub fn delete_choice(&self, choice_id: i64) -> Result<Vec<CompletionWrite>> {
        let current = self.db.get_choice(choice_id)?;
        let snapshot = self.load_snapshot(&current.client_id, current.date)?;
        let policy = self.policy()?;
        if !self.db.delete_choice(choice_id)? {
            bail!("Choice not found");
        }
        let (_, writes) = self.settle(snapshot.without_choice(choice_id), &policy);
        Ok(writes)
    }

    fn finish(
        &self,
        snapshot: DaySnapshot,
        stored: ClientChoice,
        projection: Option<AllowanceProjection>,
        policy: &ReconcilePolicy,
    ) -> RecordedChoice {
        let (_, completions) = self.settle(snapshot.with_choice(stored.clone()), policy);
        RecordedChoice {
            choice: stored,
            projection,
            completions,
        }
    }

    // --- Completion & allowance ---

    /// Manual toggle by the client. Always written; auto reconciliation never
    /// overrides a manual completion.
    pub fn set_completion(
        &self,
        client_id: &str,
        date: NaiveDate,
        meal_slot_id: i64,
        completed: bool,
    ) -> Result<CompletionRecord> {
        let Some(plan) = self.db.get_active_plan(client_id)? else {
            bail!("No active meal plan for client '{client_id}'");
        };
        if plan.slot(meal_slot_id).is_none() {
            invalid!("Meal slot {meal_slot_id} is not part of the active meal plan");
        }
        let write = manual_toggle(meal_slot_id, date, completed);
        let record = self
            .db
            .upsert_completion(client_id, &write.to_record(""))?;
        info!(client_id, slot_id = meal_slot_id, %date, completed, "manual completion toggle");
        Ok(record)
    }

    pub fn category_allowance(
        &self,
        client_id: &str,
        date: NaiveDate,
        meal_slot_id: i64,
        macro_type: MacroType,
    ) -> Result<CategoryView> {
        let snapshot = self.load_snapshot(client_id, date)?;
        let Some(slot) = snapshot.plan.slot(meal_slot_id) else {
            invalid!("Meal slot {meal_slot_id} is not part of the active meal plan");
        };
        let Some(category) = slot.category(macro_type) else {
            invalid!("Meal slot '{}' has no {macro_type} category", slot.name);
        };
        let index = snapshot.index();
        Ok(category_view(
            meal_slot_id,
            category,
            &snapshot.choices,
            &index,
        ))
    }
}
