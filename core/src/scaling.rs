use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::models::FoodOption;

/// Serving assumed when an option's canonical serving is missing or unparseable.
pub const FALLBACK_SERVING_G: f64 = 100.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Macros {
    pub const ZERO: Macros = Macros {
        calories: 0.0,
        protein: 0.0,
        carbs: 0.0,
        fat: 0.0,
    };

    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            calories: self.calories * factor,
            protein: self.protein * factor,
            carbs: self.carbs * factor,
            fat: self.fat * factor,
        }
    }

    #[must_use]
    pub fn per_serving(option: &FoodOption) -> Self {
        Self {
            calories: option.calories,
            protein: option.protein_g,
            carbs: option.carb_g,
            fat: option.fat_g,
        }
    }
}

impl Add for Macros {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            calories: self.calories + rhs.calories,
            protein: self.protein + rhs.protein,
            carbs: self.carbs + rhs.carbs,
            fat: self.fat + rhs.fat,
        }
    }
}

impl AddAssign for Macros {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Macros {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// Factor applied to per-serving macros. A zero or absent amount counts as
/// one full serving, not as nothing eaten.
#[must_use]
pub fn scale_factor(canonical_serving_g: f64, consumed_g: f64) -> f64 {
    let base = if canonical_serving_g > 0.0 {
        canonical_serving_g
    } else {
        FALLBACK_SERVING_G
    };
    if consumed_g > 0.0 {
        consumed_g / base
    } else {
        1.0
    }
}

/// Macros of `option` for `consumed_g` grams eaten.
#[must_use]
pub fn scale(option: &FoodOption, consumed_g: f64) -> Macros {
    let factor = scale_factor(option.canonical_serving_grams(), consumed_g);
    Macros::per_serving(option).scaled(factor)
}
