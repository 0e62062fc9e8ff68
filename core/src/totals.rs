use crate::models::{ChoiceSource, ClientChoice, MacroType};
use crate::plan_index::PlanIndex;
use crate::quantity::parse_grams;
use crate::scaling::{Macros, scale};

/// Macros one choice contributes, wherever it is slotted. Custom entries
/// count as-is; catalog entries are scaled to their quantity; a choice whose
/// option is missing from the plan, or that carries no source, counts zero.
#[must_use]
pub fn choice_contribution(choice: &ClientChoice, index: &PlanIndex<'_>) -> Macros {
    match choice.source() {
        Some(ChoiceSource::Custom {
            calories,
            protein_g,
            carb_g,
            fat_g,
        }) => Macros {
            calories,
            protein: protein_g,
            carbs: carb_g,
            fat: fat_g,
        },
        Some(ChoiceSource::Catalog {
            food_option_id,
            quantity,
        }) => index
            .option(food_option_id)
            .map_or(Macros::ZERO, |entry| scale(entry.option, parse_grams(quantity))),
        None => Macros::ZERO,
    }
}

/// Consumed macros for one meal slot.
#[must_use]
pub fn meal_totals(slot_id: i64, choices: &[ClientChoice], index: &PlanIndex<'_>) -> Macros {
    choices
        .iter()
        .filter(|c| index.resolve_slot(c) == Some(slot_id))
        .map(|c| choice_contribution(c, index))
        .sum()
}

/// Grams drawn from a slot's macro-category pool. Custom foods never draw
/// from a pool, and a catalog choice draws exactly its parsed quantity (so a
/// blank quantity draws nothing even though it counts as a full serving in
/// [`meal_totals`]).
#[must_use]
pub fn category_total_consumed(
    slot_id: i64,
    macro_type: MacroType,
    choices: &[ClientChoice],
    index: &PlanIndex<'_>,
) -> f64 {
    choices
        .iter()
        .filter_map(|c| match c.source() {
            Some(ChoiceSource::Catalog {
                food_option_id,
                quantity,
            }) => {
                let entry = index.option(food_option_id)?;
                let in_slot = index.resolve_slot(c) == Some(slot_id);
                (in_slot && entry.macro_type == macro_type).then(|| parse_grams(quantity))
            }
            _ => None,
        })
        .sum()
}

/// Everything eaten on the day, including custom foods without a slot.
#[must_use]
pub fn day_totals(choices: &[ClientChoice], index: &PlanIndex<'_>) -> Macros {
    choices.iter().map(|c| choice_contribution(c, index)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan_index::fixtures::{catalog, custom, plan};

    #[test]
    fn test_meal_totals_scales_catalog_choice() {
        let plan = plan();
        let index = PlanIndex::new(&plan);
        let choices = vec![catalog(1, 10, Some("150g"))];

        let totals = meal_totals(1, &choices, &index);
        assert!((totals.calories - 300.0).abs() < 0.01);
        assert!((totals.protein - 30.0).abs() < 0.01);
        assert!((totals.carbs - 15.0).abs() < 0.01);
        assert!((totals.fat - 7.5).abs() < 0.01);
    }

    #[test]
    fn test_meal_totals_blank_quantity_counts_full_serving() {
        let plan = plan();
        let index = PlanIndex::new(&plan);
        let choices = vec![catalog(1, 10, Some(""))];

        let totals = meal_totals(1, &choices, &index);
        assert!((totals.calories - 200.0).abs() < 0.01);
        assert!((totals.protein - 20.0).abs() < 0.01);
        assert!((totals.carbs - 10.0).abs() < 0.01);
        assert!((totals.fat - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_meal_totals_only_counts_matching_slot() {
        let plan = plan();
        let index = PlanIndex::new(&plan);
        let choices = vec![
            catalog(1, 10, Some("100g")),
            catalog(2, 30, Some("150g")),
            custom(3, Some(2), "Apple", [95.0, 0.5, 25.0, 0.3]),
        ];

        let breakfast = meal_totals(1, &choices, &index);
        assert!((breakfast.calories - 200.0).abs() < 0.01);

        let lunch = meal_totals(2, &choices, &index);
        assert!((lunch.calories - (195.0 + 95.0)).abs() < 0.01);
        assert!((lunch.carbs - 67.0).abs() < 0.01);
    }

    #[test]
    fn test_meal_totals_custom_is_not_scaled() {
        let plan = plan();
        let index = PlanIndex::new(&plan);
        let mut shake = custom(1, Some(1), "Shake", [250.0, 30.0, 10.0, 5.0]);
        shake.quantity = Some("500g".into());

        let totals = meal_totals(1, &[shake], &index);
        assert!((totals.calories - 250.0).abs() < 0.01);
        assert!((totals.protein - 30.0).abs() < 0.01);
    }

    #[test]
    fn test_meal_totals_ignores_unknown_and_empty_choices() {
        let plan = plan();
        let index = PlanIndex::new(&plan);
        let mut unknown = catalog(1, 999, Some("100g"));
        unknown.meal_slot_id = Some(1);
        let mut empty = catalog(2, 10, None);
        empty.food_option_id = None;
        empty.meal_slot_id = Some(1);

        let totals = meal_totals(1, &[unknown, empty], &index);
        assert_eq!(totals, Macros::ZERO);
    }

    #[test]
    fn test_category_total_consumed_shares_pool() {
        let plan = plan();
        let index = PlanIndex::new(&plan);
        let choices = vec![
            catalog(1, 10, Some("60g")),
            catalog(2, 11, Some("25,5")),
            catalog(3, 20, Some("40g")),
            custom(4, Some(1), "Jerky", [80.0, 15.0, 3.0, 1.0]),
        ];

        let protein = category_total_consumed(1, MacroType::Protein, &choices, &index);
        assert!((protein - 85.5).abs() < 0.01);

        let carb = category_total_consumed(1, MacroType::Carb, &choices, &index);
        assert!((carb - 40.0).abs() < 0.01);

        let fat = category_total_consumed(1, MacroType::Fat, &choices, &index);
        assert!(fat.abs() < f64::EPSILON);
    }

    #[test]
    fn test_category_total_consumed_blank_quantity_draws_nothing() {
        let plan = plan();
        let index = PlanIndex::new(&plan);
        let choices = vec![catalog(1, 10, None)];
        assert!(category_total_consumed(1, MacroType::Protein, &choices, &index).abs() < 0.01);
    }

    #[test]
    fn test_category_total_respects_explicit_slot() {
        let plan = plan();
        let index = PlanIndex::new(&plan);
        // Rice eaten at breakfast draws from breakfast's carb pool, not lunch's
        let mut rice = catalog(1, 30, Some("70g"));
        rice.meal_slot_id = Some(1);
        let choices = vec![rice];

        assert!((category_total_consumed(1, MacroType::Carb, &choices, &index) - 70.0).abs() < 0.01);
        assert!(category_total_consumed(2, MacroType::Carb, &choices, &index).abs() < 0.01);
    }

    #[test]
    fn test_day_totals_include_unslotted_custom() {
        let plan = plan();
        let index = PlanIndex::new(&plan);
        let choices = vec![
            catalog(1, 10, Some("100g")),
            custom(2, None, "Cookie", [150.0, 2.0, 20.0, 7.0]),
        ];
        let totals = day_totals(&choices, &index);
        assert!((totals.calories - 350.0).abs() < 0.01);
        assert!((totals.fat - 12.0).abs() < 0.01);
    }
}
