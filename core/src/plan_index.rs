use std::collections::HashMap;

use tracing::{debug, warn};

use crate::models::{ClientChoice, FoodOption, MacroType, MealPlan};

/// Where a catalog option lives inside the plan.
#[derive(Debug, Clone, Copy)]
pub struct OptionEntry<'a> {
    pub slot_id: i64,
    pub category_id: i64,
    pub macro_type: MacroType,
    pub option: &'a FoodOption,
}

/// Lookup from food option id to its owning slot and macro category,
/// built once per plan.
#[derive(Debug, Clone)]
pub struct PlanIndex<'a> {
    options: HashMap<i64, OptionEntry<'a>>,
}

impl<'a> PlanIndex<'a> {
    #[must_use]
    pub fn new(plan: &'a MealPlan) -> Self {
        let mut options = HashMap::new();
        for slot in &plan.slots {
            for category in &slot.categories {
                for option in &category.options {
                    if options.contains_key(&option.id) {
                        // First occurrence owns the option
                        warn!(
                            option_id = option.id,
                            slot_id = slot.id,
                            "food option listed in more than one place; keeping first"
                        );
                        continue;
                    }
                    options.insert(
                        option.id,
                        OptionEntry {
                            slot_id: slot.id,
                            category_id: category.id,
                            macro_type: category.macro_type,
                            option,
                        },
                    );
                }
            }
        }
        debug!(plan_id = plan.id, options = options.len(), "indexed meal plan");
        Self { options }
    }

    #[must_use]
    pub fn option(&self, option_id: i64) -> Option<&OptionEntry<'a>> {
        self.options.get(&option_id)
    }

    /// Slot a choice belongs to: its explicit slot, else the slot owning its food option.
    #[must_use]
    pub fn resolve_slot(&self, choice: &ClientChoice) -> Option<i64> {
        choice.meal_slot_id.or_else(|| {
            choice
                .food_option_id
                .and_then(|id| self.option(id))
                .map(|entry| entry.slot_id)
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDate;

    use crate::models::{
        ClientChoice, FoodOption, MacroCategory, MacroTargets, MacroType, MealPlan, MealSlot,
    };
    use crate::quantity::Quantity;

    pub fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    pub fn option(id: i64, name: &str, serving: &str, macros: [f64; 4]) -> FoodOption {
        FoodOption {
            id,
            name: name.to_string(),
            name_alt: None,
            calories: macros[0],
            protein_g: macros[1],
            carb_g: macros[2],
            fat_g: macros[3],
            serving_size: Some(Quantity::from(serving)),
            notes: None,
        }
    }

    /// Breakfast (slot 1, protein target 40g) with a shared 100g protein pool
    /// (chicken id 10, tofu id 11) and a carb category (oats id 20);
    /// Lunch (slot 2, no targets) with rice (id 30).
    pub fn plan() -> MealPlan {
        MealPlan {
            id: 1,
            uuid: String::new(),
            client_id: "c1".to_string(),
            name: "Lean bulk".to_string(),
            daily_targets: MacroTargets {
                calories: Some(2000.0),
                protein_g: Some(150.0),
                carb_g: Some(200.0),
                fat_g: Some(60.0),
            },
            slots: vec![
                MealSlot {
                    id: 1,
                    name: "Breakfast".to_string(),
                    order_index: 0,
                    targets: MacroTargets {
                        protein_g: Some(40.0),
                        ..MacroTargets::default()
                    },
                    categories: vec![
                        MacroCategory {
                            id: 100,
                            macro_type: MacroType::Protein,
                            quantity_instruction: Some("100g cooked".to_string()),
                            options: vec![
                                option(10, "Chicken", "100g", [200.0, 20.0, 10.0, 5.0]),
                                option(11, "Tofu", "100g", [120.0, 12.0, 2.0, 7.0]),
                            ],
                        },
                        MacroCategory {
                            id: 101,
                            macro_type: MacroType::Carb,
                            quantity_instruction: None,
                            options: vec![option(20, "Oats", "50g", [190.0, 6.5, 33.0, 3.5])],
                        },
                    ],
                },
                MealSlot {
                    id: 2,
                    name: "Lunch".to_string(),
                    order_index: 1,
                    targets: MacroTargets::default(),
                    categories: vec![MacroCategory {
                        id: 200,
                        macro_type: MacroType::Carb,
                        quantity_instruction: None,
                        options: vec![option(30, "Rice", "150g", [195.0, 4.0, 42.0, 0.5])],
                    }],
                },
            ],
            is_active: true,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    pub fn catalog(id: i64, option_id: i64, quantity: Option<&str>) -> ClientChoice {
        ClientChoice {
            id,
            uuid: String::new(),
            client_id: "c1".to_string(),
            date: date(),
            meal_slot_id: None,
            food_option_id: Some(option_id),
            quantity: quantity.map(Quantity::from),
            custom_food_name: None,
            custom_calories: None,
            custom_protein_g: None,
            custom_carb_g: None,
            custom_fat_g: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    pub fn custom(id: i64, slot_id: Option<i64>, name: &str, macros: [f64; 4]) -> ClientChoice {
        ClientChoice {
            id,
            uuid: String::new(),
            client_id: "c1".to_string(),
            date: date(),
            meal_slot_id: slot_id,
            food_option_id: None,
            quantity: None,
            custom_food_name: Some(name.to_string()),
            custom_calories: Some(macros[0]),
            custom_protein_g: Some(macros[1]),
            custom_carb_g: Some(macros[2]),
            custom_fat_g: Some(macros[3]),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{catalog, custom, plan};
    use super::*;

    #[test]
    fn test_index_covers_every_option() {
        let plan = plan();
        let index = PlanIndex::new(&plan);
        assert_eq!(index.len(), 4);

        let tofu = index.option(11).unwrap();
        assert_eq!(tofu.slot_id, 1);
        assert_eq!(tofu.category_id, 100);
        assert_eq!(tofu.macro_type, MacroType::Protein);
        assert_eq!(tofu.option.name, "Tofu");

        assert!(index.option(999).is_none());
    }

    #[test]
    fn test_duplicate_option_keeps_first_owner() {
        let mut plan = plan();
        let chicken = plan.slots[0].categories[0].options[0].clone();
        plan.slots[1].categories[0].options.push(chicken);
        let index = PlanIndex::new(&plan);
        assert_eq!(index.option(10).unwrap().slot_id, 1);
    }

    #[test]
    fn test_resolve_slot_prefers_explicit_slot() {
        let plan = plan();
        let index = PlanIndex::new(&plan);

        let implicit = catalog(1, 30, Some("100g"));
        assert_eq!(index.resolve_slot(&implicit), Some(2));

        let mut explicit = catalog(2, 30, Some("100g"));
        explicit.meal_slot_id = Some(1);
        assert_eq!(index.resolve_slot(&explicit), Some(1));

        let orphan = catalog(3, 999, None);
        assert_eq!(index.resolve_slot(&orphan), None);

        let unslotted_custom = custom(4, None, "Bar", [100.0, 10.0, 10.0, 2.0]);
        assert_eq!(index.resolve_slot(&unslotted_custom), None);
    }
}
