use std::path::Path;

use chrono::{Local, NaiveDate};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{Error, Result};
use crate::macros::MacroSettings;
use crate::models::{
    DATE_FORMAT, FoodLogEntry, NewFoodLog, NewWeightLog, SavedFood, TdeeSetting, TimeOfDay,
    UpdateFoodLog, WeightLogEntry, WeightWithCalories,
};

/// Sentinel primary key of the single `tdee_settings` row.
const SETTINGS_ID: i64 = 1;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS food_logs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    date TEXT NOT NULL,
                    name TEXT NOT NULL CHECK (length(name) > 0),
                    calories REAL NOT NULL CHECK (calories > 0),
                    protein REAL NOT NULL CHECK (protein >= 0),
                    carbs REAL NOT NULL CHECK (carbs >= 0),
                    fat REAL NOT NULL CHECK (fat >= 0)
                );

                CREATE TABLE IF NOT EXISTS saved_foods (
                    name TEXT PRIMARY KEY NOT NULL,
                    calories REAL NOT NULL,
                    protein REAL NOT NULL,
                    carbs REAL NOT NULL,
                    fat REAL NOT NULL
                );

                CREATE TABLE IF NOT EXISTS weight_logs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    date TEXT NOT NULL,
                    time_of_day TEXT NOT NULL CHECK (time_of_day IN ('morning', 'night')),
                    weight REAL NOT NULL CHECK (weight > 0)
                );

                CREATE TABLE IF NOT EXISTS tdee_settings (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    tdee INTEGER NOT NULL CHECK (tdee > 0),
                    goal TEXT NOT NULL,
                    last_updated TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_food_logs_date ON food_logs(date);
                CREATE INDEX IF NOT EXISTS idx_weight_logs_date ON weight_logs(date);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    fn date_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
        let s: String = row.get(idx)?;
        NaiveDate::parse_from_str(&s, DATE_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    }

    // 0: id, 1: date, 2: name, 3: calories, 4: protein, 5: carbs, 6: fat
    fn food_log_from_row(row: &rusqlite::Row) -> rusqlite::Result<FoodLogEntry> {
        Ok(FoodLogEntry {
            id: row.get(0)?,
            date: Self::date_column(row, 1)?,
            name: row.get(2)?,
            calories: row.get(3)?,
            protein: row.get(4)?,
            carbs: row.get(5)?,
            fat: row.get(6)?,
        })
    }

    fn saved_food_from_row(row: &rusqlite::Row) -> rusqlite::Result<SavedFood> {
        Ok(SavedFood {
            name: row.get(0)?,
            calories: row.get(1)?,
            protein: row.get(2)?,
            carbs: row.get(3)?,
            fat: row.get(4)?,
        })
    }

    fn weight_log_from_row(row: &rusqlite::Row) -> rusqlite::Result<WeightLogEntry> {
        let time_of_day: String = row.get(2)?;
        let time_of_day = time_of_day
            .parse::<TimeOfDay>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
        Ok(WeightLogEntry {
            id: row.get(0)?,
            date: Self::date_column(row, 1)?,
            time_of_day,
            weight: row.get(3)?,
        })
    }

    // --- Food logs ---

    /// Insert a food log and, if this name has never been saved, a saved-food
    /// template with the same values. An existing template is left untouched.
    pub fn insert_food_log(&self, food: &NewFoodLog) -> Result<FoodLogEntry> {
        let tx = self.conn.unchecked_transaction()?;
        let date_str = food.date.format(DATE_FORMAT).to_string();
        tx.execute(
            "INSERT INTO food_logs (date, name, calories, protein, carbs, fat)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                date_str,
                food.name,
                food.calories,
                food.protein,
                food.carbs,
                food.fat
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "INSERT OR IGNORE INTO saved_foods (name, calories, protein, carbs, fat)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![food.name, food.calories, food.protein, food.carbs, food.fat],
        )?;
        tx.commit()?;
        self.get_food_log(id)
    }

    pub fn get_food_log(&self, id: i64) -> Result<FoodLogEntry> {
        self.conn
            .query_row(
                "SELECT id, date, name, calories, protein, carbs, fat FROM food_logs WHERE id = ?1",
                params![id],
                Self::food_log_from_row,
            )
            .optional()?
            .ok_or_else(|| Error::not_found(format!("Food entry {id} not found")))
    }

    pub fn update_food_log(&self, id: i64, update: &UpdateFoodLog) -> Result<FoodLogEntry> {
        let rows = self.conn.execute(
            "UPDATE food_logs SET name = ?1, calories = ?2, protein = ?3, carbs = ?4, fat = ?5
             WHERE id = ?6",
            params![
                update.name,
                update.calories,
                update.protein,
                update.carbs,
                update.fat,
                id
            ],
        )?;
        if rows == 0 {
            return Err(Error::not_found(format!("Food entry {id} not found")));
        }
        self.get_food_log(id)
    }

    /// Returns whether a row was removed.
    pub fn delete_food_log(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM food_logs WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    pub fn get_food_logs_for_date(&self, date: NaiveDate) -> Result<Vec<FoodLogEntry>> {
        let date_str = date.format(DATE_FORMAT).to_string();
        let mut stmt = self.conn.prepare(
            "SELECT id, date, name, calories, protein, carbs, fat
             FROM food_logs WHERE date = ?1 ORDER BY id",
        )?;
        let entries = stmt
            .query_map(params![date_str], Self::food_log_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    pub fn get_all_food_logs(&self) -> Result<Vec<FoodLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, name, calories, protein, carbs, fat
             FROM food_logs ORDER BY date, id",
        )?;
        let entries = stmt
            .query_map([], Self::food_log_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    // --- Saved foods ---

    pub fn list_saved_foods(&self) -> Result<Vec<SavedFood>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, calories, protein, carbs, fat FROM saved_foods ORDER BY name")?;
        let foods = stmt
            .query_map([], Self::saved_food_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(foods)
    }

    pub fn get_saved_food(&self, name: &str) -> Result<Option<SavedFood>> {
        let food = self
            .conn
            .query_row(
                "SELECT name, calories, protein, carbs, fat FROM saved_foods WHERE name = ?1",
                params![name],
                Self::saved_food_from_row,
            )
            .optional()?;
        Ok(food)
    }

    /// Case-insensitive substring search on saved food names, ordered by
    /// name. Case is folded with Unicode rules, so "éclair" matches "Éclair".
    pub fn search_saved_foods(&self, query: &str) -> Result<Vec<SavedFood>> {
        let foods = self.list_saved_foods()?;
        if query.is_empty() {
            return Ok(foods);
        }
        let needle = query.to_lowercase();
        Ok(foods
            .into_iter()
            .filter(|f| f.name.to_lowercase().contains(&needle))
            .collect())
    }

    // --- Weight logs ---

    pub fn insert_weight_log(&self, entry: &NewWeightLog) -> Result<WeightLogEntry> {
        let date_str = entry.date.format(DATE_FORMAT).to_string();
        self.conn.execute(
            "INSERT INTO weight_logs (date, time_of_day, weight) VALUES (?1, ?2, ?3)",
            params![date_str, entry.time_of_day.as_str(), entry.weight],
        )?;
        let id = self.conn.last_insert_rowid();
        Ok(WeightLogEntry {
            id,
            date: entry.date,
            time_of_day: entry.time_of_day,
            weight: entry.weight,
        })
    }

    /// Returns whether a row was removed.
    pub fn delete_weight_log(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM weight_logs WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    /// Weight of the most recent entry. On the same date a morning entry beats
    /// a night entry; among equals the last inserted wins.
    pub fn get_latest_weight(&self) -> Result<Option<f64>> {
        let weight = self
            .conn
            .query_row(
                "SELECT weight FROM weight_logs
                 ORDER BY date DESC,
                          CASE time_of_day
                              WHEN 'morning' THEN 0
                              WHEN 'night' THEN 1
                              ELSE 2
                          END,
                          id DESC
                 LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(weight)
    }

    /// Weights for one time of day, oldest first, each paired with the food
    /// calories it reflects: the previous day's for morning, the same day's
    /// for night.
    pub fn get_weights_with_calories(
        &self,
        time_of_day: TimeOfDay,
    ) -> Result<Vec<WeightWithCalories>> {
        let day_offset = match time_of_day {
            TimeOfDay::Morning => "-1 day",
            TimeOfDay::Night => "+0 days",
        };
        let mut stmt = self.conn.prepare(
            "SELECT w.id, w.date, w.weight,
                    COALESCE((SELECT SUM(f.calories) FROM food_logs f
                              WHERE f.date = date(w.date, ?2)), 0.0)
             FROM weight_logs w
             WHERE w.time_of_day = ?1
             ORDER BY w.date, w.id",
        )?;
        let rows = stmt
            .query_map(params![time_of_day.as_str(), day_offset], |row| {
                Ok(WeightWithCalories {
                    id: row.get(0)?,
                    date: Self::date_column(row, 1)?,
                    weight: row.get(2)?,
                    calories: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn get_weight_history(&self) -> Result<Vec<WeightLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, time_of_day, weight FROM weight_logs ORDER BY date DESC, id DESC",
        )?;
        let entries = stmt
            .query_map([], Self::weight_log_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    // --- TDEE settings ---

    /// Replace the active setting. The table never holds more than one row.
    pub fn set_tdee_setting(&self, tdee: i64, goal: &str) -> Result<TdeeSetting> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO tdee_settings (id, tdee, goal, last_updated)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                tdee = excluded.tdee,
                goal = excluded.goal,
                last_updated = excluded.last_updated",
            params![SETTINGS_ID, tdee, goal, now],
        )?;
        Ok(TdeeSetting {
            tdee,
            goal: goal.to_string(),
            last_updated: now,
        })
    }

    pub fn get_tdee_setting(&self) -> Result<Option<TdeeSetting>> {
        let setting = self
            .conn
            .query_row(
                "SELECT tdee, goal, last_updated FROM tdee_settings
                 ORDER BY last_updated DESC LIMIT 1",
                [],
                |row| {
                    Ok(TdeeSetting {
                        tdee: row.get(0)?,
                        goal: row.get(1)?,
                        last_updated: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(setting)
    }

    pub fn get_macro_settings(&self) -> Result<Option<MacroSettings>> {
        Ok(self.get_tdee_setting()?.map(|s| MacroSettings {
            tdee: s.tdee,
            goal: s.goal,
        }))
    }

    pub fn clear_tdee_setting(&self) -> Result<bool> {
        let rows = self.conn.execute("DELETE FROM tdee_settings", [])?;
        Ok(rows > 0)
    }
}
