use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::quantity::{Quantity, parse_grams};

/// Input the caller can fix (a malformed plan, choice or setting), as
/// opposed to a storage failure. Travels inside `anyhow::Error`; use
/// `downcast_ref::<InvalidInput>()` to tell the two apart.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct InvalidInput(pub String);

/// Return early with an [`InvalidInput`] error.
macro_rules! invalid {
    ($($arg:tt)*) => {
        return Err(anyhow::Error::new($crate::models::InvalidInput(format!($($arg)*))))
    };
}
pub(crate) use invalid;

/// Macro type a category groups its food options under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MacroType {
    #[serde(alias = "proteins")]
    Protein,
    #[serde(alias = "carbs", alias = "carbohydrate", alias = "carbohydrates")]
    Carb,
    #[serde(alias = "fats")]
    Fat,
}

impl MacroType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Protein => "protein",
            Self::Carb => "carb",
            Self::Fat => "fat",
        }
    }
}

impl fmt::Display for MacroType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MacroType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        validate_macro_type(s)
    }
}

/// Parse a macro type name, accepting the plural/long forms coaches tend to type.
pub fn validate_macro_type(value: &str) -> Result<MacroType> {
    match value.trim().to_lowercase().as_str() {
        "protein" | "proteins" => Ok(MacroType::Protein),
        "carb" | "carbs" | "carbohydrate" | "carbohydrates" => Ok(MacroType::Carb),
        "fat" | "fats" => Ok(MacroType::Fat),
        _ => invalid!("Invalid macro type '{value}'. Must be one of: protein, carb, fat"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionMethod {
    Manual,
    Auto,
}

impl CompletionMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Auto => "auto",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "manual" => Ok(Self::Manual),
            "auto" => Ok(Self::Auto),
            _ => bail!("Invalid completion method '{value}'. Must be manual or auto"),
        }
    }
}

/// Per-slot or per-day nutritional targets. Each field is independently optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroTargets {
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub protein_g: Option<f64>,
    #[serde(default)]
    pub carb_g: Option<f64>,
    #[serde(default)]
    pub fat_g: Option<f64>,
}

impl MacroTargets {
    /// A target counts as declared only when it is present and positive.
    #[must_use]
    pub fn declared(value: Option<f64>) -> Option<f64> {
        value.filter(|v| *v > 0.0)
    }

    #[must_use]
    pub fn has_any(&self) -> bool {
        [self.calories, self.protein_g, self.carb_g, self.fat_g]
            .into_iter()
            .any(|t| Self::declared(t).is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodOption {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_alt: Option<String>,
    pub calories: f64,
    pub protein_g: f64,
    pub carb_g: f64,
    pub fat_g: f64,
    /// Descriptive serving, e.g. "100g" or "150,5 g".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serving_size: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl FoodOption {
    /// Grams the published macro values refer to. Zero when the serving is missing or unparseable.
    #[must_use]
    pub fn canonical_serving_grams(&self) -> f64 {
        parse_grams(self.serving_size.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroCategory {
    pub id: i64,
    pub macro_type: MacroType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_instruction: Option<String>,
    pub options: Vec<FoodOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealSlot {
    pub id: i64,
    pub name: String,
    pub order_index: i64,
    #[serde(default)]
    pub targets: MacroTargets,
    pub categories: Vec<MacroCategory>,
}

impl MealSlot {
    #[must_use]
    pub fn category(&self, macro_type: MacroType) -> Option<&MacroCategory> {
        self.categories.iter().find(|c| c.macro_type == macro_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    pub client_id: String,
    pub name: String,
    #[serde(default)]
    pub daily_targets: MacroTargets,
    pub slots: Vec<MealSlot>,
    pub is_active: bool,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl MealPlan {
    #[must_use]
    pub fn slot(&self, slot_id: i64) -> Option<&MealSlot> {
        self.slots.iter().find(|s| s.id == slot_id)
    }
}

/// Lightweight listing row for a client's plans.
#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    pub slot_count: i64,
    pub created_at: String,
}

/// A food the client entered by hand, with absolute macro values for the entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomFood {
    pub name: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub carb_g: f64,
    #[serde(default)]
    pub fat_g: f64,
}

/// One intake event as stored by the persistence layer.
///
/// Catalog-backed choices carry `food_option_id` (+ `quantity`); custom
/// entries carry the `custom_*` fields. Records coming back from storage are
/// not guaranteed to be consistent, so use [`ClientChoice::source`] rather
/// than reading the fields directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientChoice {
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    pub client_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub meal_slot_id: Option<i64>,
    #[serde(default)]
    pub food_option_id: Option<i64>,
    #[serde(default)]
    pub quantity: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_food_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_calories: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_protein_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_carb_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fat_g: Option<f64>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Where a choice's macros come from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChoiceSource<'a> {
    Catalog {
        food_option_id: i64,
        quantity: Option<&'a Quantity>,
    },
    Custom {
        calories: f64,
        protein_g: f64,
        carb_g: f64,
        fat_g: f64,
    },
}

impl ClientChoice {
    #[must_use]
    pub fn has_custom_values(&self) -> bool {
        self.custom_food_name.is_some()
            || self.custom_calories.is_some()
            || self.custom_protein_g.is_some()
            || self.custom_carb_g.is_some()
            || self.custom_fat_g.is_some()
    }

    /// Custom values win over a catalog reference; `None` means the record
    /// carries neither and contributes nothing.
    #[must_use]
    pub fn source(&self) -> Option<ChoiceSource<'_>> {
        if self.has_custom_values() {
            return Some(ChoiceSource::Custom {
                calories: self.custom_calories.unwrap_or(0.0),
                protein_g: self.custom_protein_g.unwrap_or(0.0),
                carb_g: self.custom_carb_g.unwrap_or(0.0),
                fat_g: self.custom_fat_g.unwrap_or(0.0),
            });
        }
        self.food_option_id
            .map(|food_option_id| ChoiceSource::Catalog {
                food_option_id,
                quantity: self.quantity.as_ref(),
            })
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.custom_food_name.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub meal_slot_id: i64,
    pub date: NaiveDate,
    pub is_completed: bool,
    pub completion_method: CompletionMethod,
    #[serde(default)]
    pub updated_at: String,
}

// --- Write types ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewFoodOption {
    pub name: String,
    #[serde(default)]
    pub name_alt: Option<String>,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub carb_g: f64,
    #[serde(default)]
    pub fat_g: f64,
    #[serde(default)]
    pub serving_size: Option<Quantity>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMacroCategory {
    pub macro_type: MacroType,
    #[serde(default)]
    pub quantity_instruction: Option<String>,
    #[serde(default)]
    pub options: Vec<NewFoodOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMealSlot {
    pub name: String,
    /// Defaults to the slot's position in the plan file.
    #[serde(default)]
    pub order_index: Option<i64>,
    #[serde(default)]
    pub targets: MacroTargets,
    #[serde(default)]
    pub categories: Vec<NewMacroCategory>,
}

/// A plan as authored by the trainer (the JSON accepted by `plan import`).
#[derive(Debug, Clone, Deserialize)]
pub struct NewMealPlan {
    pub name: String,
    #[serde(default)]
    pub daily_targets: MacroTargets,
    #[serde(default)]
    pub slots: Vec<NewMealSlot>,
}

#[derive(Debug, Clone)]
pub struct NewChoice {
    pub client_id: String,
    pub date: NaiveDate,
    pub meal_slot_id: Option<i64>,
    pub food_option_id: Option<i64>,
    pub quantity: Option<Quantity>,
    pub custom: Option<CustomFood>,
}

// --- Validation (write boundary only) ---

fn validate_non_negative(label: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        invalid!("{label} must be a non-negative number");
    }
    Ok(())
}

fn validate_targets(label: &str, targets: &MacroTargets) -> Result<()> {
    for (field, value) in [
        ("calories", targets.calories),
        ("protein_g", targets.protein_g),
        ("carb_g", targets.carb_g),
        ("fat_g", targets.fat_g),
    ] {
        if let Some(v) = value {
            validate_non_negative(&format!("{label} {field} target"), v)?;
        }
    }
    Ok(())
}

pub fn validate_new_plan(plan: &NewMealPlan) -> Result<()> {
    if plan.name.trim().is_empty() {
        invalid!("Plan name must not be empty");
    }
    validate_targets("Daily", &plan.daily_targets)?;
    if plan.slots.is_empty() {
        invalid!("Plan must contain at least one meal slot");
    }
    for slot in &plan.slots {
        if slot.name.trim().is_empty() {
            invalid!("Meal slot name must not be empty");
        }
        validate_targets(&format!("Slot '{}'", slot.name), &slot.targets)?;
        for (i, category) in slot.categories.iter().enumerate() {
            if slot.categories[..i]
                .iter()
                .any(|c| c.macro_type == category.macro_type)
            {
                invalid!(
                    "Slot '{}' declares the {} category more than once",
                    slot.name,
                    category.macro_type
                );
            }
            for option in &category.options {
                if option.name.trim().is_empty() {
                    invalid!("Food option name must not be empty (slot '{}')", slot.name);
                }
                validate_non_negative(&format!("{} calories", option.name), option.calories)?;
                validate_non_negative(&format!("{} protein_g", option.name), option.protein_g)?;
                validate_non_negative(&format!("{} carb_g", option.name), option.carb_g)?;
                validate_non_negative(&format!("{} fat_g", option.name), option.fat_g)?;
            }
        }
    }
    Ok(())
}

/// Validate a choice before it is written: exactly one of catalog/custom, non-negative quantity.
pub fn validate_new_choice(choice: &NewChoice) -> Result<()> {
    if choice.client_id.trim().is_empty() {
        invalid!("client_id must not be empty");
    }
    match (&choice.food_option_id, &choice.custom) {
        (Some(_), Some(_)) => {
            invalid!("A choice references either a food option or a custom food, not both")
        }
        (None, None) => invalid!("A choice must reference a food option or carry a custom food"),
        (Some(_), None) => {
            if let Some(Quantity::Grams(g)) = choice.quantity {
                validate_non_negative("Quantity", g)?;
            }
            if let Some(Quantity::Text(ref text)) = choice.quantity {
                if text.trim_start().starts_with('-') {
                    invalid!("Quantity must not be negative");
                }
            }
        }
        (None, Some(custom)) => {
            if custom.name.trim().is_empty() {
                invalid!("Custom food name must not be empty");
            }
            if choice.quantity.is_some() {
                invalid!("Custom foods carry absolute macros and take no quantity");
            }
            validate_non_negative("Custom calories", custom.calories)?;
            validate_non_negative("Custom protein_g", custom.protein_g)?;
            validate_non_negative("Custom carb_g", custom.carb_g)?;
            validate_non_negative("Custom fat_g", custom.fat_g)?;
        }
    }
    Ok(())
}

pub fn validate_tolerance(tolerance: f64) -> Result<()> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        invalid!("Completion tolerance must be a finite, non-negative number (got {tolerance})");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macro_type_accepts_long_forms_in_plan_files() {
        let parsed: Vec<MacroType> =
            serde_json::from_str(r#"["protein", "carbs", "carbohydrates", "fats"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                MacroType::Protein,
                MacroType::Carb,
                MacroType::Carb,
                MacroType::Fat
            ]
        );
        assert_eq!(serde_json::to_string(&MacroType::Carb).unwrap(), "\"carb\"");
    }

    fn catalog_choice(option_id: i64, quantity: Option<Quantity>) -> ClientChoice {
        ClientChoice {
            id: 1,
            uuid: String::new(),
            client_id: "c1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            meal_slot_id: None,
            food_option_id: Some(option_id),
            quantity,
            custom_food_name: None,
            custom_calories: None,
            custom_protein_g: None,
            custom_carb_g: None,
            custom_fat_g: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn new_choice() -> NewChoice {
        NewChoice {
            client_id: "c1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            meal_slot_id: Some(1),
            food_option_id: Some(10),
            quantity: Some(Quantity::Text("150g".to_string())),
            custom: None,
        }
    }

    fn one_slot_plan() -> NewMealPlan {
        NewMealPlan {
            name: "Cut".to_string(),
            daily_targets: MacroTargets::default(),
            slots: vec![NewMealSlot {
                name: "Breakfast".to_string(),
                order_index: None,
                targets: MacroTargets::default(),
                categories: vec![NewMacroCategory {
                    macro_type: MacroType::Protein,
                    quantity_instruction: None,
                    options: vec![NewFoodOption {
                        name: "Eggs".to_string(),
                        calories: 155.0,
                        protein_g: 13.0,
                        ..NewFoodOption::default()
                    }],
                }],
            }],
        }
    }

    #[test]
    fn test_macro_type_aliases() {
        assert_eq!(validate_macro_type("Protein").unwrap(), MacroType::Protein);
        assert_eq!(validate_macro_type("carbs").unwrap(), MacroType::Carb);
        assert_eq!(validate_macro_type(" FAT ").unwrap(), MacroType::Fat);
        assert!(validate_macro_type("fiber").is_err());
        assert_eq!("carbohydrates".parse::<MacroType>().unwrap(), MacroType::Carb);
    }

    #[test]
    fn test_macro_type_serde_lowercase() {
        let json = serde_json::to_string(&MacroType::Carb).unwrap();
        assert_eq!(json, "\"carb\"");
        let parsed: MacroType = serde_json::from_str("\"fat\"").unwrap();
        assert_eq!(parsed, MacroType::Fat);
    }

    #[test]
    fn test_completion_method_parse() {
        assert_eq!(CompletionMethod::parse("auto").unwrap(), CompletionMethod::Auto);
        assert_eq!(
            CompletionMethod::parse("manual").unwrap(),
            CompletionMethod::Manual
        );
        assert!(CompletionMethod::parse("robot").is_err());
    }

    #[test]
    fn test_targets_declared_ignores_zero_and_null() {
        let none = MacroTargets {
            calories: Some(0.0),
            protein_g: None,
            carb_g: Some(-5.0),
            fat_g: None,
        };
        assert!(!none.has_any());

        let some = MacroTargets {
            protein_g: Some(40.0),
            ..MacroTargets::default()
        };
        assert!(some.has_any());
    }

    #[test]
    fn test_canonical_serving_grams_from_descriptive_string() {
        let option = FoodOption {
            id: 1,
            name: "Rice".to_string(),
            name_alt: None,
            calories: 130.0,
            protein_g: 2.7,
            carb_g: 28.0,
            fat_g: 0.3,
            serving_size: Some(Quantity::Text("150,5 g cooked".to_string())),
            notes: None,
        };
        assert!((option.canonical_serving_grams() - 150.5).abs() < f64::EPSILON);

        let missing = FoodOption {
            serving_size: None,
            ..option
        };
        assert!(missing.canonical_serving_grams().abs() < f64::EPSILON);
    }

    #[test]
    fn test_choice_source_catalog() {
        let choice = catalog_choice(7, Some(Quantity::Text("80g".to_string())));
        match choice.source() {
            Some(ChoiceSource::Catalog {
                food_option_id,
                quantity,
            }) => {
                assert_eq!(food_option_id, 7);
                assert_eq!(quantity, Some(&Quantity::Text("80g".to_string())));
            }
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn test_choice_source_custom_defaults_missing_values() {
        let mut choice = catalog_choice(7, None);
        choice.food_option_id = None;
        choice.custom_food_name = Some("Protein bar".to_string());
        choice.custom_protein_g = Some(20.0);
        assert_eq!(
            choice.source(),
            Some(ChoiceSource::Custom {
                calories: 0.0,
                protein_g: 20.0,
                carb_g: 0.0,
                fat_g: 0.0,
            })
        );
    }

    #[test]
    fn test_choice_source_neither() {
        let mut choice = catalog_choice(7, None);
        choice.food_option_id = None;
        assert!(choice.source().is_none());
    }

    #[test]
    fn test_choice_deserializes_numeric_and_text_quantity() {
        let json = r#"{"id":1,"client_id":"c1","date":"2024-06-15","food_option_id":3,"quantity":150}"#;
        let choice: ClientChoice = serde_json::from_str(json).unwrap();
        assert_eq!(choice.quantity, Some(Quantity::Grams(150.0)));

        let json = r#"{"id":1,"client_id":"c1","date":"2024-06-15","food_option_id":3,"quantity":"150,5"}"#;
        let choice: ClientChoice = serde_json::from_str(json).unwrap();
        assert_eq!(choice.quantity, Some(Quantity::Text("150,5".to_string())));
    }

    #[test]
    fn test_validate_new_choice_catalog_ok() {
        assert!(validate_new_choice(&new_choice()).is_ok());
    }

    #[test]
    fn test_validate_new_choice_both_sources() {
        let mut choice = new_choice();
        choice.custom = Some(CustomFood {
            name: "Bar".to_string(),
            ..CustomFood::default()
        });
        assert!(validate_new_choice(&choice).is_err());
    }

    #[test]
    fn test_validate_new_choice_neither_source() {
        let mut choice = new_choice();
        choice.food_option_id = None;
        assert!(validate_new_choice(&choice).is_err());
    }

    #[test]
    fn test_validate_new_choice_negative_quantity() {
        let mut choice = new_choice();
        choice.quantity = Some(Quantity::Grams(-10.0));
        assert!(validate_new_choice(&choice).is_err());
        choice.quantity = Some(Quantity::Text("-10g".to_string()));
        assert!(validate_new_choice(&choice).is_err());
    }

    #[test]
    fn test_validate_new_choice_custom_rules() {
        let mut choice = new_choice();
        choice.food_option_id = None;
        choice.quantity = None;
        choice.custom = Some(CustomFood {
            name: "Shake".to_string(),
            calories: 250.0,
            protein_g: 30.0,
            carb_g: 10.0,
            fat_g: 5.0,
        });
        assert!(validate_new_choice(&choice).is_ok());

        choice.custom.as_mut().unwrap().name = "  ".to_string();
        assert!(validate_new_choice(&choice).is_err());
    }

    #[test]
    fn test_validate_new_plan_ok() {
        assert!(validate_new_plan(&one_slot_plan()).is_ok());
    }

    #[test]
    fn test_validate_new_plan_rejects_duplicate_category() {
        let mut plan = one_slot_plan();
        let dup = plan.slots[0].categories[0].clone();
        plan.slots[0].categories.push(dup);
        assert!(validate_new_plan(&plan).is_err());
    }

    #[test]
    fn test_validate_new_plan_rejects_empty_and_negative() {
        let mut plan = one_slot_plan();
        plan.name = String::new();
        assert!(validate_new_plan(&plan).is_err());

        let mut plan = one_slot_plan();
        plan.slots[0].categories[0].options[0].fat_g = -1.0;
        assert!(validate_new_plan(&plan).is_err());

        let mut plan = one_slot_plan();
        plan.slots.clear();
        assert!(validate_new_plan(&plan).is_err());
    }

    #[test]
    fn test_validate_tolerance() {
        assert!(validate_tolerance(0.5).is_ok());
        assert!(validate_tolerance(0.0).is_ok());
        assert!(validate_tolerance(-0.1).is_err());
        assert!(validate_tolerance(f64::NAN).is_err());
    }
}
