use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::export;
use crate::macros::{self, Goal, MacroResult, MacroSettings};
use crate::models::{
    DailyTotals, DaySummary, FoodLogEntry, NewFoodLog, NewWeightLog, SavedFood, TdeeSetting,
    TimeOfDay, UpdateFoodLog, WeightLogEntry, WeightWithCalories, validate_food_values,
    validate_tdee, validate_weight,
};

/// Operation contracts of the tracker. Every mutation validates its input
/// before touching the database.
pub struct TrackerService {
    db: Database,
}

impl TrackerService {
    pub fn open(db_path: &Path) -> Result<Self> {
        let db = Database::open(db_path)?;
        Ok(Self { db })
    }

    pub fn new_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self { db })
    }

    #[must_use]
    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    // --- Settings ---

    /// Store the TDEE and goal, replacing any previous setting. Goal labels are
    /// parsed leniently and stored in canonical form.
    pub fn set_settings(&self, tdee: i64, goal: &str) -> Result<TdeeSetting> {
        validate_tdee(tdee)?;
        let goal: Goal = goal.parse().map_err(|_| {
            let labels: Vec<&str> = Goal::ALL.iter().map(|g| g.label()).collect();
            Error::validation(format!(
                "Invalid goal '{goal}'. Must be one of: {}",
                labels.join(", ")
            ))
        })?;
        let setting = self.db.set_tdee_setting(tdee, goal.label())?;
        info!(tdee, goal = goal.label(), "updated TDEE setting");
        Ok(setting)
    }

    pub fn latest_settings(&self) -> Result<Option<MacroSettings>> {
        self.db.get_macro_settings()
    }

    pub fn tdee_setting(&self) -> Result<Option<TdeeSetting>> {
        self.db.get_tdee_setting()
    }

    pub fn clear_settings(&self) -> Result<bool> {
        let cleared = self.db.clear_tdee_setting()?;
        if cleared {
            info!("cleared TDEE setting");
        }
        Ok(cleared)
    }

    // --- Macros ---

    pub fn compute_macros(
        latest_weight: Option<f64>,
        settings: Option<&MacroSettings>,
    ) -> Result<MacroResult> {
        macros::compute_macros(latest_weight, settings)
    }

    /// Targets for the current state: latest weight plus stored settings.
    pub fn macro_targets(&self) -> Result<MacroResult> {
        let weight = self.db.get_latest_weight()?;
        let settings = self.db.get_macro_settings()?;
        macros::compute_macros(weight, settings.as_ref())
    }

    // --- Food log ---

    pub fn add_food(
        &self,
        date: NaiveDate,
        name: &str,
        calories: f64,
        protein: f64,
        carbs: f64,
        fat: f64,
    ) -> Result<FoodLogEntry> {
        let name = validate_food_values(name, calories, protein, carbs, fat)?;
        let entry = self.db.insert_food_log(&NewFoodLog {
            date,
            name,
            calories,
            protein,
            carbs,
            fat,
        })?;
        info!(id = entry.id, date = %entry.date, name = %entry.name, "logged food");
        Ok(entry)
    }

    pub fn edit_food(
        &self,
        id: i64,
        name: &str,
        calories: f64,
        protein: f64,
        carbs: f64,
        fat: f64,
    ) -> Result<FoodLogEntry> {
        let name = validate_food_values(name, calories, protein, carbs, fat)?;
        let entry = self.db.update_food_log(
            id,
            &UpdateFoodLog {
                name,
                calories,
                protein,
                carbs,
                fat,
            },
        )?;
        info!(id, "edited food entry");
        Ok(entry)
    }

    /// Delete a food entry. Deleting a missing id is not an error.
    pub fn delete_food(&self, id: i64) -> Result<()> {
        if self.db.delete_food_log(id)? {
            info!(id, "deleted food entry");
        } else {
            debug!(id, "food entry already absent");
        }
        Ok(())
    }

    pub fn get_food(&self, id: i64) -> Result<FoodLogEntry> {
        self.db.get_food_log(id)
    }

    pub fn list_foods_for_date(&self, date: NaiveDate) -> Result<Vec<FoodLogEntry>> {
        self.db.get_food_logs_for_date(date)
    }

    pub fn list_all_foods(&self) -> Result<Vec<FoodLogEntry>> {
        self.db.get_all_food_logs()
    }

    pub fn daily_totals(&self, date: NaiveDate) -> Result<DailyTotals> {
        let entries = self.db.get_food_logs_for_date(date)?;
        Ok(DailyTotals::from_entries(&entries))
    }

    pub fn list_saved_foods(&self) -> Result<Vec<SavedFood>> {
        self.db.list_saved_foods()
    }

    pub fn find_saved_food(&self, name: &str) -> Result<Option<SavedFood>> {
        self.db.get_saved_food(name)
    }

    pub fn search_saved_foods(&self, query: &str) -> Result<Vec<SavedFood>> {
        debug!(query, "searching saved foods");
        self.db.search_saved_foods(query)
    }

    // --- Weight log ---

    pub fn add_weight(
        &self,
        date: NaiveDate,
        time_of_day: TimeOfDay,
        weight: f64,
    ) -> Result<WeightLogEntry> {
        validate_weight(weight)?;
        let entry = self.db.insert_weight_log(&NewWeightLog {
            date,
            time_of_day,
            weight,
        })?;
        info!(id = entry.id, date = %date, %time_of_day, weight, "logged weight");
        Ok(entry)
    }

    /// Delete a weight entry. Deleting a missing id is not an error.
    pub fn delete_weight(&self, id: i64) -> Result<()> {
        if self.db.delete_weight_log(id)? {
            info!(id, "deleted weight entry");
        } else {
            debug!(id, "weight entry already absent");
        }
        Ok(())
    }

    pub fn latest_weight(&self) -> Result<Option<f64>> {
        self.db.get_latest_weight()
    }

    pub fn list_weights(&self, time_of_day: TimeOfDay) -> Result<Vec<WeightWithCalories>> {
        self.db.get_weights_with_calories(time_of_day)
    }

    pub fn weight_history(&self) -> Result<Vec<WeightLogEntry>> {
        self.db.get_weight_history()
    }

    // --- Summaries ---

    pub fn day_summary(&self, date: NaiveDate) -> Result<DaySummary> {
        let entries = self.db.get_food_logs_for_date(date)?;
        let totals = DailyTotals::from_entries(&entries);
        let targets = self.macro_targets()?;
        #[allow(clippy::cast_precision_loss)]
        let calories_remaining = targets
            .calorie_target
            .map(|target| target as f64 - totals.calories);
        Ok(DaySummary {
            date,
            entries,
            totals,
            targets,
            calories_remaining,
        })
    }

    // --- Export ---

    pub fn export_foods_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let entries = self.db.get_all_food_logs()?;
        export::write_foods_csv(writer, &entries)?;
        Ok(entries.len())
    }

    pub fn export_weights_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let entries = self.db.get_weight_history()?;
        export::write_weights_csv(writer, &entries)?;
        Ok(entries.len())
    }

    pub fn export_saved_foods_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let foods = self.db.list_saved_foods()?;
        export::write_saved_foods_csv(writer, &foods)?;
        Ok(foods.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_add_food_round_trip() {
        let svc = TrackerService::new_in_memory().unwrap();
        let entry = svc.add_food(jan(1), "Oatmeal", 300.0, 10.0, 54.0, 6.0).unwrap();

        let foods = svc.list_foods_for_date(jan(1)).unwrap();
        assert_eq!(foods.len(), 1);
        assert_eq!(foods[0], entry);
        assert_eq!(foods[0].name, "Oatmeal");
        assert_eq!(foods[0].calories, 300.0);
        assert_eq!(foods[0].protein, 10.0);
        assert_eq!(foods[0].carbs, 54.0);
        assert_eq!(foods[0].fat, 6.0);
    }

    #[test]
    fn test_daily_totals_example() {
        let svc = TrackerService::new_in_memory().unwrap();
        svc.add_food(jan(1), "Oatmeal", 300.0, 10.0, 54.0, 6.0).unwrap();
        svc.add_food(jan(1), "Banana", 105.0, 1.0, 27.0, 0.0).unwrap();
        svc.add_food(jan(2), "Pizza", 900.0, 30.0, 100.0, 40.0).unwrap();

        let totals = svc.daily_totals(jan(1)).unwrap();
        assert_eq!(
            totals,
            DailyTotals {
                calories: 405.0,
                protein: 11.0,
                carbs: 81.0,
                fat: 6.0,
            }
        );
        assert_eq!(svc.daily_totals(jan(9)).unwrap(), DailyTotals::default());
    }

    #[test]
    fn test_add_food_validation_happens_before_write() {
        let svc = TrackerService::new_in_memory().unwrap();
        for (name, cal, p, c, f) in [
            ("", 100.0, 0.0, 0.0, 0.0),
            ("Water", 0.0, 0.0, 0.0, 0.0),
            ("Bad", 100.0, -1.0, 0.0, 0.0),
            ("Bad", 100.0, 0.0, -1.0, 0.0),
            ("Bad", 100.0, 0.0, 0.0, -1.0),
        ] {
            let err = svc.add_food(jan(1), name, cal, p, c, f).unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }
        assert!(svc.list_foods_for_date(jan(1)).unwrap().is_empty());
        assert!(svc.list_saved_foods().unwrap().is_empty());
    }

    #[test]
    fn test_saved_food_keeps_first_values() {
        let svc = TrackerService::new_in_memory().unwrap();
        svc.add_food(jan(1), "Protein Shake", 160.0, 30.0, 5.0, 2.0).unwrap();
        svc.add_food(jan(2), "Protein Shake", 220.0, 40.0, 8.0, 3.0).unwrap();
        let saved = svc.find_saved_food("Protein Shake").unwrap().unwrap();
        assert_eq!(saved.calories, 160.0);
        assert_eq!(saved.protein, 30.0);
    }

    #[test]
    fn test_edit_food() {
        let svc = TrackerService::new_in_memory().unwrap();
        let entry = svc.add_food(jan(1), "Oatmeal", 300.0, 10.0, 54.0, 6.0).unwrap();
        let edited = svc
            .edit_food(entry.id, "Oatmeal", 350.0, 12.0, 60.0, 7.0)
            .unwrap();
        assert_eq!(edited.calories, 350.0);
        assert_eq!(svc.daily_totals(jan(1)).unwrap().calories, 350.0);
    }

    #[test]
    fn test_edit_food_missing_id() {
        let svc = TrackerService::new_in_memory().unwrap();
        let err = svc.edit_food(99, "Ghost", 100.0, 0.0, 0.0, 0.0).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_edit_food_validates_first() {
        let svc = TrackerService::new_in_memory().unwrap();
        let entry = svc.add_food(jan(1), "Oatmeal", 300.0, 10.0, 54.0, 6.0).unwrap();
        let err = svc.edit_food(entry.id, "Oatmeal", -1.0, 0.0, 0.0, 0.0).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(svc.get_food(entry.id).unwrap().calories, 300.0);
    }

    #[test]
    fn test_delete_food_is_idempotent() {
        let svc = TrackerService::new_in_memory().unwrap();
        let keep = svc.add_food(jan(1), "Apple", 95.0, 0.5, 25.0, 0.3).unwrap();
        let gone = svc.add_food(jan(1), "Banana", 105.0, 1.0, 27.0, 0.0).unwrap();

        svc.delete_food(gone.id).unwrap();
        let after_first = svc.list_foods_for_date(jan(1)).unwrap();
        svc.delete_food(gone.id).unwrap();
        let after_second = svc.list_foods_for_date(jan(1)).unwrap();

        assert_eq!(after_first, vec![keep]);
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn test_search_saved_foods() {
        let svc = TrackerService::new_in_memory().unwrap();
        svc.add_food(jan(1), "Rice", 200.0, 4.0, 45.0, 0.4).unwrap();
        svc.add_food(jan(1), "Chicken Breast", 165.0, 31.0, 0.0, 3.6).unwrap();
        svc.add_food(jan(1), "Almonds", 160.0, 6.0, 6.0, 14.0).unwrap();

        let all = svc.search_saved_foods("").unwrap();
        let names: Vec<&str> = all.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Almonds", "Chicken Breast", "Rice"]);
        assert_eq!(all, svc.list_saved_foods().unwrap());

        let hits = svc.search_saved_foods("CHICK").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Chicken Breast");
    }

    #[test]
    fn test_add_weight_rejects_non_positive() {
        let svc = TrackerService::new_in_memory().unwrap();
        assert!(matches!(
            svc.add_weight(jan(1), TimeOfDay::Morning, 0.0),
            Err(Error::Validation(_))
        ));
        assert!(svc.add_weight(jan(1), TimeOfDay::Night, -180.0).is_err());
        assert!(svc.latest_weight().unwrap().is_none());
    }

    #[test]
    fn test_latest_weight_tie_break() {
        let svc = TrackerService::new_in_memory().unwrap();
        svc.add_weight(jan(1), TimeOfDay::Night, 182.0).unwrap();
        svc.add_weight(jan(1), TimeOfDay::Morning, 180.0).unwrap();
        assert_eq!(svc.latest_weight().unwrap(), Some(180.0));
    }

    #[test]
    fn test_delete_weight_is_idempotent() {
        let svc = TrackerService::new_in_memory().unwrap();
        let entry = svc.add_weight(jan(1), TimeOfDay::Morning, 180.0).unwrap();
        svc.delete_weight(entry.id).unwrap();
        svc.delete_weight(entry.id).unwrap();
        assert!(svc.weight_history().unwrap().is_empty());
    }

    #[test]
    fn test_list_weights_joins_calories() {
        let svc = TrackerService::new_in_memory().unwrap();
        svc.add_food(jan(1), "Dinner", 2100.0, 100.0, 200.0, 80.0).unwrap();
        svc.add_weight(jan(2), TimeOfDay::Morning, 180.0).unwrap();
        svc.add_weight(jan(1), TimeOfDay::Night, 182.0).unwrap();

        let mornings = svc.list_weights(TimeOfDay::Morning).unwrap();
        assert_eq!(mornings.len(), 1);
        assert_eq!(mornings[0].calories, 2100.0);

        let nights = svc.list_weights(TimeOfDay::Night).unwrap();
        assert_eq!(nights.len(), 1);
        assert_eq!(nights[0].calories, 2100.0);
    }

    #[test]
    fn test_set_settings_validation() {
        let svc = TrackerService::new_in_memory().unwrap();
        assert!(matches!(
            svc.set_settings(0, "Maintenance"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            svc.set_settings(2500, "Recomp"),
            Err(Error::Validation(_))
        ));
        assert!(svc.latest_settings().unwrap().is_none());
    }

    #[test]
    fn test_set_settings_rejects_oversized_tdee() {
        let svc = TrackerService::new_in_memory().unwrap();
        svc.add_weight(jan(1), TimeOfDay::Morning, 180.0).unwrap();
        assert!(matches!(
            svc.set_settings(i64::MAX, "Lean Bulk"),
            Err(Error::Validation(_))
        ));
        assert!(svc.tdee_setting().unwrap().is_none());
        assert!(!svc.macro_targets().unwrap().has_targets());
    }

    #[test]
    fn test_add_weight_rejects_oversized() {
        let svc = TrackerService::new_in_memory().unwrap();
        assert!(matches!(
            svc.add_weight(jan(1), TimeOfDay::Morning, 1e300),
            Err(Error::Validation(_))
        ));
        assert_eq!(svc.latest_weight().unwrap(), None);
    }

    #[test]
    fn test_set_settings_canonicalizes_goal() {
        let svc = TrackerService::new_in_memory().unwrap();
        let setting = svc.set_settings(2500, "moderate-cut").unwrap();
        assert_eq!(setting.goal, "Moderate Cut");
        let latest = svc.latest_settings().unwrap().unwrap();
        assert_eq!(
            latest,
            MacroSettings {
                tdee: 2500,
                goal: "Moderate Cut".to_string(),
            }
        );
    }

    #[test]
    fn test_settings_last_write_wins() {
        let svc = TrackerService::new_in_memory().unwrap();
        svc.set_settings(2500, "Moderate Cut").unwrap();
        svc.set_settings(2800, "Lean Bulk").unwrap();
        let latest = svc.latest_settings().unwrap().unwrap();
        assert_eq!(latest.tdee, 2800);
        assert_eq!(latest.goal, "Lean Bulk");
        assert!(svc.clear_settings().unwrap());
        assert!(!svc.clear_settings().unwrap());
    }

    #[test]
    fn test_macro_targets_scenario() {
        let svc = TrackerService::new_in_memory().unwrap();
        assert!(svc.macro_targets().unwrap().is_empty());

        svc.add_weight(jan(1), TimeOfDay::Morning, 180.0).unwrap();
        let weight_only = svc.macro_targets().unwrap();
        assert_eq!(weight_only.weight, Some(180.0));
        assert!(!weight_only.has_targets());

        svc.set_settings(2500, "Moderate Cut").unwrap();
        let targets = svc.macro_targets().unwrap();
        assert_eq!(targets.protein, Some(225));
        assert_eq!(targets.fat, Some(63));
        assert_eq!(targets.carbs, Some(258));
        assert_eq!(targets.calorie_target, Some(1950));
    }

    #[test]
    fn test_day_summary() {
        let svc = TrackerService::new_in_memory().unwrap();
        svc.add_weight(jan(1), TimeOfDay::Morning, 180.0).unwrap();
        svc.set_settings(2500, "Moderate Cut").unwrap();
        svc.add_food(jan(1), "Oatmeal", 300.0, 10.0, 54.0, 6.0).unwrap();
        svc.add_food(jan(1), "Banana", 105.0, 1.0, 27.0, 0.0).unwrap();

        let summary = svc.day_summary(jan(1)).unwrap();
        assert_eq!(summary.entries.len(), 2);
        assert_eq!(summary.totals.calories, 405.0);
        assert_eq!(summary.calories_remaining, Some(1545.0));
    }

    #[test]
    fn test_day_summary_without_settings() {
        let svc = TrackerService::new_in_memory().unwrap();
        let summary = svc.day_summary(jan(1)).unwrap();
        assert!(summary.entries.is_empty());
        assert!(summary.targets.is_empty());
        assert!(summary.calories_remaining.is_none());
    }

    #[test]
    fn test_export_counts_rows() {
        let svc = TrackerService::new_in_memory().unwrap();
        svc.add_food(jan(1), "Oatmeal", 300.0, 10.0, 54.0, 6.0).unwrap();
        svc.add_food(jan(2), "Oatmeal", 300.0, 10.0, 54.0, 6.0).unwrap();
        svc.add_weight(jan(2), TimeOfDay::Morning, 180.0).unwrap();

        let mut foods = Vec::new();
        assert_eq!(svc.export_foods_csv(&mut foods).unwrap(), 2);
        assert_eq!(String::from_utf8(foods).unwrap().lines().count(), 3);

        let mut saved = Vec::new();
        assert_eq!(svc.export_saved_foods_csv(&mut saved).unwrap(), 1);

        let mut weights = Vec::new();
        assert_eq!(svc.export_weights_csv(&mut weights).unwrap(), 1);
        assert!(String::from_utf8(weights).unwrap().contains("2024-01-02,morning,180.0"));
    }
}
