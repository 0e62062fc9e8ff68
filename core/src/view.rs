use serde::Serialize;

use crate::allowance::option_remaining_grams;
use crate::models::{ClientChoice, MacroCategory, MacroTargets, MacroType, MealSlot};
use crate::plan_index::PlanIndex;
use crate::reconcile::{CompletionState, ReconcilePolicy, meets_targets};
use crate::scaling::Macros;
use crate::snapshot::DaySnapshot;
use crate::totals::{category_total_consumed, day_totals, meal_totals};

#[derive(Debug, Clone, Serialize)]
pub struct OptionView {
    pub option_id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_alt: Option<String>,
    pub canonical_serving_g: f64,
    pub remaining_g: f64,
    pub per_serving: Macros,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub category_id: i64,
    pub macro_type: MacroType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity_instruction: Option<String>,
    pub consumed_g: f64,
    pub options: Vec<OptionView>,
}

/// Signed distance to each declared target; `None` where no target is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RemainingToTarget {
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carb_g: Option<f64>,
    pub fat_g: Option<f64>,
}

impl RemainingToTarget {
    #[must_use]
    pub fn between(targets: &MacroTargets, totals: &Macros) -> Self {
        let diff = |target: Option<f64>, eaten: f64| MacroTargets::declared(target).map(|t| t - eaten);
        Self {
            calories: diff(targets.calories, totals.calories),
            protein_g: diff(targets.protein_g, totals.protein),
            carb_g: diff(targets.carb_g, totals.carbs),
            fat_g: diff(targets.fat_g, totals.fat),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotView {
    pub slot_id: i64,
    pub name: String,
    pub order_index: i64,
    pub targets: MacroTargets,
    pub has_targets: bool,
    pub totals: Macros,
    pub remaining: RemainingToTarget,
    pub meets_targets: bool,
    pub completion: CompletionState,
    pub categories: Vec<CategoryView>,
    pub choices: Vec<ClientChoice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayView {
    pub client_id: String,
    pub date: String,
    pub version: u64,
    pub plan_id: i64,
    pub plan_name: String,
    pub slots: Vec<SlotView>,
    pub totals: Macros,
    pub daily_targets: MacroTargets,
    pub remaining: RemainingToTarget,
    pub completed_slots: usize,
    pub total_slots: usize,
    pub tolerance: f64,
}

/// Consumed grams for one category pool and what each option may still take from it.
#[must_use]
pub fn category_view(
    slot_id: i64,
    category: &MacroCategory,
    choices: &[ClientChoice],
    index: &PlanIndex<'_>,
) -> CategoryView {
    CategoryView {
        category_id: category.id,
        macro_type: category.macro_type,
        quantity_instruction: category.quantity_instruction.clone(),
        consumed_g: category_total_consumed(slot_id, category.macro_type, choices, index),
        options: category
            .options
            .iter()
            .map(|option| OptionView {
                option_id: option.id,
                name: option.name.clone(),
                name_alt: option.name_alt.clone(),
                canonical_serving_g: option.canonical_serving_grams(),
                remaining_g: option_remaining_grams(
                    slot_id,
                    category.macro_type,
                    option,
                    choices,
                    index,
                ),
                per_serving: Macros::per_serving(option),
                notes: option.notes.clone(),
            })
            .collect(),
    }
}

fn build_slot_view(
    snapshot: &DaySnapshot,
    index: &PlanIndex<'_>,
    slot: &MealSlot,
    policy: &ReconcilePolicy,
) -> SlotView {
    let choices = &snapshot.choices;
    let totals = meal_totals(slot.id, choices, index);
    let has_targets = slot.targets.has_any();

    let categories = slot
        .categories
        .iter()
        .map(|category| category_view(slot.id, category, choices, index))
        .collect();

    SlotView {
        slot_id: slot.id,
        name: slot.name.clone(),
        order_index: slot.order_index,
        targets: slot.targets,
        has_targets,
        totals,
        remaining: RemainingToTarget::between(&slot.targets, &totals),
        meets_targets: has_targets && meets_targets(&slot.targets, &totals, policy),
        completion: CompletionState::from_record(snapshot.completion_for(slot.id)),
        categories,
        choices: choices
            .iter()
            .filter(|c| index.resolve_slot(c) == Some(slot.id))
            .cloned()
            .collect(),
    }
}

/// Derive everything a day screen shows from a snapshot.
#[must_use]
pub fn build_day_view(snapshot: &DaySnapshot, policy: &ReconcilePolicy) -> DayView {
    let index = snapshot.index();
    let mut slots: Vec<SlotView> = snapshot
        .plan
        .slots
        .iter()
        .map(|slot| build_slot_view(snapshot, &index, slot, policy))
        .collect();
    slots.sort_by_key(|s| s.order_index);

    let totals = day_totals(&snapshot.choices, &index);
    let completed_slots = slots.iter().filter(|s| s.completion.is_completed()).count();

    DayView {
        client_id: snapshot.client_id.clone(),
        date: snapshot.date.format("%Y-%m-%d").to_string(),
        version: snapshot.version,
        plan_id: snapshot.plan.id,
        plan_name: snapshot.plan.name.clone(),
        total_slots: slots.len(),
        slots,
        totals,
        daily_targets: snapshot.plan.daily_targets,
        remaining: RemainingToTarget::between(&snapshot.plan.daily_targets, &totals),
        completed_slots,
        tolerance: policy.tolerance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CompletionMethod;
    use crate::plan_index::fixtures::{catalog, custom, date, plan};
    use crate::reconcile::manual_toggle;

    #[test]
    fn test_day_view_slots_and_allowances() {
        let mut plan = plan();
        // Stored order differs from display order
        plan.slots.reverse();
        let snap = DaySnapshot::new(
            "c1",
            date(),
            plan,
            vec![catalog(1, 10, Some("60g")), catalog(2, 30, Some("75g"))],
            vec![],
        );
        let view = build_day_view(&snap, &ReconcilePolicy::default());

        assert_eq!(view.date, "2024-06-15");
        assert_eq!(view.total_slots, 2);
        assert_eq!(view.slots[0].name, "Breakfast");
        assert_eq!(view.slots[1].name, "Lunch");

        let breakfast = &view.slots[0];
        assert_eq!(breakfast.choices.len(), 1);
        assert!((breakfast.totals.protein - 12.0).abs() < 0.01);
        assert!((breakfast.remaining.protein_g.unwrap() - 28.0).abs() < 0.01);
        assert!(breakfast.remaining.calories.is_none());
        assert!(!breakfast.meets_targets);

        let protein = &breakfast.categories[0];
        assert!((protein.consumed_g - 60.0).abs() < 0.01);
        for option in &protein.options {
            assert!((option.remaining_g - 40.0).abs() < 0.01);
        }

        let lunch = &view.slots[1];
        assert!(!lunch.has_targets);
        assert!(!lunch.meets_targets);
        assert!((lunch.categories[0].options[0].remaining_g - 75.0).abs() < 0.01);
    }

    #[test]
    fn test_day_view_daily_totals_and_completion_count() {
        let snap = DaySnapshot::new(
            "c1",
            date(),
            plan(),
            vec![
                catalog(1, 10, Some("100g")),
                custom(2, None, "Latte", [120.0, 6.0, 10.0, 6.0]),
            ],
            vec![],
        )
        .with_completion(&manual_toggle(2, date(), true));
        let view = build_day_view(&snap, &ReconcilePolicy { tolerance: 1.0 });

        assert!((view.totals.calories - 320.0).abs() < 0.01);
        assert!((view.remaining.calories.unwrap() - 1680.0).abs() < 0.01);
        assert!((view.remaining.protein_g.unwrap() - 124.0).abs() < 0.01);
        assert_eq!(view.completed_slots, 1);
        assert_eq!(
            view.slots[1].completion,
            CompletionState::Completed(CompletionMethod::Manual)
        );
        assert!((view.tolerance - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_remaining_to_target_is_signed() {
        let targets = MacroTargets {
            calories: Some(500.0),
            ..MacroTargets::default()
        };
        let totals = Macros {
            calories: 650.0,
            ..Macros::ZERO
        };
        let remaining = RemainingToTarget::between(&targets, &totals);
        assert!((remaining.calories.unwrap() + 150.0).abs() < 0.01);
        assert!(remaining.fat_g.is_none());
    }
}
