use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::macros::MacroResult;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Largest accepted TDEE in kcal.
pub const MAX_TDEE: i64 = 100_000;
/// Largest accepted body weight in lbs.
pub const MAX_WEIGHT: f64 = 10_000.0;

// --- Food log types ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodLogEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone)]
pub struct NewFoodLog {
    pub date: NaiveDate,
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Full replacement of a logged food's values. The entry keeps its date.
#[derive(Debug, Clone)]
pub struct UpdateFoodLog {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Autocomplete template captured the first time a food name is logged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedFood {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DailyTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl DailyTotals {
    #[must_use]
    pub fn from_entries(entries: &[FoodLogEntry]) -> Self {
        entries.iter().fold(Self::default(), |acc, e| Self {
            calories: acc.calories + e.calories,
            protein: acc.protein + e.protein,
            carbs: acc.carbs + e.carbs,
            fat: acc.fat + e.fat,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub entries: Vec<FoodLogEntry>,
    pub totals: DailyTotals,
    pub targets: MacroResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories_remaining: Option<f64>,
}

// --- Weight log types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Night,
}

impl TimeOfDay {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Night => "night",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TimeOfDay {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "morning" => Ok(TimeOfDay::Morning),
            "night" => Ok(TimeOfDay::Night),
            _ => Err(Error::validation(format!(
                "Invalid time of day '{s}'. Must be one of: morning, night"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightLogEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub time_of_day: TimeOfDay,
    pub weight: f64,
}

#[derive(Debug, Clone)]
pub struct NewWeightLog {
    pub date: NaiveDate,
    pub time_of_day: TimeOfDay,
    pub weight: f64,
}

/// A weight sample next to the food calories it is compared against.
///
/// Morning weigh-ins pair with the previous day's intake, night weigh-ins with
/// the same day's.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightWithCalories {
    pub id: i64,
    pub date: NaiveDate,
    pub weight: f64,
    pub calories: f64,
}

// --- Settings ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TdeeSetting {
    pub tdee: i64,
    pub goal: String,
    pub last_updated: String,
}

// --- Validation ---

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| Error::validation(format!("Invalid date '{s}'. Use YYYY-MM-DD")))
}

fn require_finite(field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::validation(format!("{field} must be a number")))
    }
}

/// Validate a food's values, returning the trimmed name.
pub fn validate_food_values(
    name: &str,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Food name must not be empty"));
    }
    require_finite("calories", calories)?;
    if calories <= 0.0 {
        return Err(Error::validation("calories must be greater than 0"));
    }
    for (field, value) in [("protein", protein), ("carbs", carbs), ("fat", fat)] {
        require_finite(field, value)?;
        if value < 0.0 {
            return Err(Error::validation(format!("{field} must not be negative")));
        }
    }
    Ok(name.to_string())
}

pub fn validate_weight(weight: f64) -> Result<()> {
    require_finite("weight", weight)?;
    if weight <= 0.0 {
        return Err(Error::validation("weight must be greater than 0"));
    }
    if weight > MAX_WEIGHT {
        return Err(Error::validation(format!(
            "weight must be at most {MAX_WEIGHT}"
        )));
    }
    Ok(())
}

pub fn validate_tdee(tdee: i64) -> Result<()> {
    if tdee <= 0 {
        return Err(Error::validation("TDEE must be a positive integer"));
    }
    if tdee > MAX_TDEE {
        return Err(Error::validation(format!("TDEE must be at most {MAX_TDEE}")));
    }
    Ok(())
}
