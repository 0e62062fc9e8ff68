use std::fmt;

use serde::{Deserialize, Serialize};

/// A free-form quantity as clients and trainers enter it: either a bare
/// number of grams or text such as `"150g"` / `"150,5"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Grams(f64),
    Text(String),
}

impl Quantity {
    #[must_use]
    pub fn grams(&self) -> f64 {
        parse_grams(Some(self))
    }
}

impl From<f64> for Quantity {
    fn from(value: f64) -> Self {
        Self::Grams(value)
    }
}

impl From<&str> for Quantity {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grams(g) => write!(f, "{g}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Numeric gram value of a quantity. Never fails: absent, malformed,
/// negative or non-finite input yields 0.
#[must_use]
pub fn parse_grams(value: Option<&Quantity>) -> f64 {
    match value {
        None => 0.0,
        Some(Quantity::Grams(g)) if g.is_finite() && *g >= 0.0 => *g,
        Some(Quantity::Grams(_)) => 0.0,
        Some(Quantity::Text(s)) => parse_grams_str(s),
    }
}

/// Extract the first numeric token of `s` (`.` or `,` as decimal separator).
#[must_use]
pub fn parse_grams_str(s: &str) -> f64 {
    let bytes = s.as_bytes();
    let Some(start) = bytes.iter().position(u8::is_ascii_digit) else {
        return 0.0;
    };

    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }

    let mut token = s[start..end].to_string();
    if end + 1 < bytes.len()
        && matches!(bytes[end], b'.' | b',')
        && bytes[end + 1].is_ascii_digit()
    {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        token.push('.');
        token.push_str(&s[frac_start..frac_end]);
    }

    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Display form of a quantity: rounded grams with a `g` suffix, or empty
/// when there is nothing positive to show.
#[must_use]
pub fn format_grams(value: Option<&Quantity>) -> String {
    let grams = parse_grams(value);
    if grams <= 0.0 {
        return String::new();
    }
    format!("{:.0}g", grams.round())
}
