//! Macro targets derived from body weight, TDEE, and a goal.
//!
//! Protein and fat are grams per unit of body weight (the tables are tuned for
//! pounds). Carbs fill whatever calories remain after protein and fat, and the
//! calorie target is TDEE shifted by the goal's offset.
//!
//! All rounding is half-to-even.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const PROTEIN_KCAL_PER_G: i64 = 4;
const CARBS_KCAL_PER_G: f64 = 4.0;
const FAT_KCAL_PER_G: i64 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Goal {
    #[serde(rename = "Mild Cut")]
    MildCut,
    #[serde(rename = "Moderate Cut")]
    ModerateCut,
    #[serde(rename = "Aggressive Cut")]
    AggressiveCut,
    #[serde(rename = "Maintenance")]
    Maintenance,
    #[serde(rename = "Lean Bulk")]
    LeanBulk,
    #[serde(rename = "Aggressive Bulk")]
    AggressiveBulk,
}

impl Goal {
    pub const ALL: [Goal; 6] = [
        Goal::MildCut,
        Goal::ModerateCut,
        Goal::AggressiveCut,
        Goal::Maintenance,
        Goal::LeanBulk,
        Goal::AggressiveBulk,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Goal::MildCut => "Mild Cut",
            Goal::ModerateCut => "Moderate Cut",
            Goal::AggressiveCut => "Aggressive Cut",
            Goal::Maintenance => "Maintenance",
            Goal::LeanBulk => "Lean Bulk",
            Goal::AggressiveBulk => "Aggressive Bulk",
        }
    }

    /// Grams of protein per unit of body weight.
    #[must_use]
    pub fn protein_multiplier(self) -> f64 {
        match self {
            Goal::MildCut => 1.15,
            Goal::ModerateCut => 1.25,
            Goal::AggressiveCut => 1.40,
            Goal::Maintenance => 1.05,
            Goal::LeanBulk => 0.95,
            Goal::AggressiveBulk => 0.85,
        }
    }

    /// Grams of fat per unit of body weight.
    #[must_use]
    pub fn fat_multiplier(self) -> f64 {
        match self {
            Goal::MildCut => 0.40,
            Goal::ModerateCut => 0.35,
            Goal::AggressiveCut => 0.30,
            Goal::Maintenance | Goal::LeanBulk => 0.45,
            Goal::AggressiveBulk => 0.35,
        }
    }

    /// Calories added to TDEE to get the daily calorie target.
    #[must_use]
    pub fn calorie_offset(self) -> i64 {
        match self {
            Goal::MildCut => -350,
            Goal::ModerateCut => -550,
            Goal::AggressiveCut => -850,
            Goal::Maintenance => 0,
            Goal::LeanBulk => 250,
            Goal::AggressiveBulk => 550,
        }
    }

    /// Exact lookup of a stored label.
    pub fn from_label(label: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|g| g.label() == label)
            .ok_or_else(|| Error::UnknownGoal(label.to_string()))
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Lenient parse for user input: "moderate cut", "Moderate-Cut" and
/// "moderate_cut" all resolve to `Goal::ModerateCut`.
impl FromStr for Goal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_lowercase();
        Self::ALL
            .into_iter()
            .find(|g| g.label().replace(' ', "").to_lowercase() == normalized)
            .ok_or_else(|| Error::UnknownGoal(s.to_string()))
    }
}

/// TDEE and goal label as read back from the settings store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacroSettings {
    pub tdee: i64,
    pub goal: String,
}

/// Computed targets. Fields are filled in progressively: nothing without a
/// weight, only `weight` without settings, everything when both are known.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MacroResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fat: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbs: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calorie_target: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tdee: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
}

impl MacroResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weight.is_none()
    }

    #[must_use]
    pub fn has_targets(&self) -> bool {
        self.calorie_target.is_some()
    }
}

fn round_grams(value: f64) -> i64 {
    value.round_ties_even() as i64
}

fn out_of_range() -> Error {
    Error::validation("Weight or TDEE too large to compute macro targets")
}

/// Compute macro targets.
///
/// Carbs are not clamped: a TDEE smaller than the protein and fat calories
/// yields a negative carb target. Inputs large enough to overflow the kcal
/// arithmetic are rejected with a validation error.
#[allow(clippy::cast_precision_loss)]
pub fn compute_macros(
    latest_weight: Option<f64>,
    settings: Option<&MacroSettings>,
) -> Result<MacroResult> {
    let Some(weight) = latest_weight else {
        return Ok(MacroResult::default());
    };
    let Some(settings) = settings else {
        return Ok(MacroResult {
            weight: Some(weight),
            ..MacroResult::default()
        });
    };

    let goal = Goal::from_label(&settings.goal)?;
    let protein = round_grams(weight * goal.protein_multiplier());
    let fat = round_grams(weight * goal.fat_multiplier());
    let fixed_kcal = protein
        .checked_mul(PROTEIN_KCAL_PER_G)
        .zip(fat.checked_mul(FAT_KCAL_PER_G))
        .and_then(|(p, f)| p.checked_add(f))
        .ok_or_else(out_of_range)?;
    let remaining = settings
        .tdee
        .checked_sub(fixed_kcal)
        .ok_or_else(out_of_range)?;
    let carbs = round_grams(remaining as f64 / CARBS_KCAL_PER_G);
    let calorie_target = settings
        .tdee
        .checked_add(goal.calorie_offset())
        .ok_or_else(out_of_range)?;

    Ok(MacroResult {
        weight: Some(weight),
        protein: Some(protein),
        fat: Some(fat),
        carbs: Some(carbs),
        calorie_target: Some(calorie_target),
        tdee: Some(settings.tdee),
        goal: Some(goal.label().to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(tdee: i64, goal: &str) -> MacroSettings {
        MacroSettings {
            tdee,
            goal: goal.to_string(),
        }
    }

    #[test]
    fn test_no_weight_is_empty() {
        let result = compute_macros(None, Some(&settings(2500, "Maintenance"))).unwrap();
        assert!(result.is_empty());
        assert_eq!(result, MacroResult::default());
    }

    #[test]
    fn test_weight_without_settings() {
        let result = compute_macros(Some(180.0), None).unwrap();
        assert_eq!(result.weight, Some(180.0));
        assert!(result.protein.is_none());
        assert!(result.calorie_target.is_none());
        assert!(!result.has_targets());
    }

    #[test]
    fn test_moderate_cut_example() {
        let result = compute_macros(Some(180.0), Some(&settings(2500, "Moderate Cut"))).unwrap();
        assert_eq!(result.protein, Some(225));
        assert_eq!(result.fat, Some(63));
        // (2500 - (900 + 567)) / 4 = 258.25
        assert_eq!(result.carbs, Some(258));
        assert_eq!(result.calorie_target, Some(1950));
        assert_eq!(result.tdee, Some(2500));
        assert_eq!(result.goal.as_deref(), Some("Moderate Cut"));
    }

    #[test]
    fn test_every_goal_offset() {
        let expected = [
            ("Mild Cut", 2150),
            ("Moderate Cut", 1950),
            ("Aggressive Cut", 1650),
            ("Maintenance", 2500),
            ("Lean Bulk", 2750),
            ("Aggressive Bulk", 3050),
        ];
        for (goal, target) in expected {
            let result = compute_macros(Some(150.0), Some(&settings(2500, goal))).unwrap();
            assert_eq!(result.calorie_target, Some(target), "{goal}");
        }
    }

    #[test]
    fn test_rounds_half_to_even() {
        // 170 * 0.45 = 76.5 -> 76, 190 * 0.45 = 85.5 -> 86
        let a = compute_macros(Some(170.0), Some(&settings(2500, "Maintenance"))).unwrap();
        assert_eq!(a.fat, Some(76));
        let b = compute_macros(Some(190.0), Some(&settings(2500, "Maintenance"))).unwrap();
        assert_eq!(b.fat, Some(86));
        // 2 kcal remaining -> 0.5 g carbs -> 0
        assert_eq!(round_grams(0.5), 0);
        assert_eq!(round_grams(1.5), 2);
        assert_eq!(round_grams(-2.5), -2);
    }

    #[test]
    fn test_negative_carbs_pass_through() {
        let result = compute_macros(Some(250.0), Some(&settings(1000, "Aggressive Cut"))).unwrap();
        // protein 350 g (1400 kcal), fat 75 g (675 kcal)
        assert_eq!(result.protein, Some(350));
        assert_eq!(result.fat, Some(75));
        assert!(result.carbs.unwrap() < 0);
        assert_eq!(result.carbs, Some(-269));
    }

    #[test]
    fn test_calories_balance_within_rounding() {
        for goal in Goal::ALL {
            for weight in [97.3, 120.0, 155.5, 180.0, 212.8, 260.1] {
                for tdee in [1600, 2100, 2500, 3333] {
                    let r = compute_macros(Some(weight), Some(&settings(tdee, goal.label())))
                        .unwrap();
                    let kcal =
                        r.carbs.unwrap() * 4 + r.protein.unwrap() * 4 + r.fat.unwrap() * 9;
                    assert!((kcal - tdee).abs() <= 2, "{goal} {weight} {tdee}: {kcal}");
                }
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let s = settings(2300, "Lean Bulk");
        let a = compute_macros(Some(165.4), Some(&s)).unwrap();
        let b = compute_macros(Some(165.4), Some(&s)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_huge_tdee_is_rejected() {
        let err = compute_macros(Some(180.0), Some(&settings(i64::MAX, "Lean Bulk"))).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_huge_weight_is_rejected() {
        let err = compute_macros(Some(1e300), Some(&settings(2500, "Maintenance"))).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_upper_bounds_compute() {
        let r = compute_macros(Some(10_000.0), Some(&settings(100_000, "Aggressive Bulk"))).unwrap();
        assert_eq!(r.calorie_target, Some(100_550));
        assert_eq!(r.protein, Some(8_500));
    }

    #[test]
    fn test_unknown_goal() {
        let err = compute_macros(Some(180.0), Some(&settings(2500, "Recomp"))).unwrap_err();
        assert!(matches!(err, Error::UnknownGoal(ref g) if g == "Recomp"));
    }

    #[test]
    fn test_stored_label_is_exact() {
        assert!(Goal::from_label("moderate cut").is_err());
        assert_eq!(Goal::from_label("Lean Bulk").unwrap(), Goal::LeanBulk);
    }

    #[test]
    fn test_goal_from_str_lenient() {
        assert_eq!("moderate-cut".parse::<Goal>().unwrap(), Goal::ModerateCut);
        assert_eq!("AGGRESSIVE_BULK".parse::<Goal>().unwrap(), Goal::AggressiveBulk);
        assert_eq!(" Maintenance ".parse::<Goal>().unwrap(), Goal::Maintenance);
        assert!("bulk".parse::<Goal>().is_err());
    }

    #[test]
    fn test_result_serialization_skips_missing() {
        let result = compute_macros(Some(180.0), None).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!({ "weight": 180.0 }));
    }
}
