//! CSV export of logged data. One header row, then one row per record with
//! columns in model field order.

use std::io::Write;

use serde::Serialize;

use crate::error::Result;
use crate::models::{FoodLogEntry, SavedFood, WeightLogEntry};

fn write_records<W: Write, T: Serialize>(writer: W, records: &[T], header: &[&str]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    // Written explicitly so an empty export still carries a header.
    wtr.write_record(header)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub const FOOD_HEADER: &[&str] = &["id", "date", "name", "calories", "protein", "carbs", "fat"];
pub const WEIGHT_HEADER: &[&str] = &["id", "date", "time_of_day", "weight"];
pub const SAVED_FOOD_HEADER: &[&str] = &["name", "calories", "protein", "carbs", "fat"];

pub fn write_foods_csv<W: Write>(writer: W, entries: &[FoodLogEntry]) -> Result<()> {
    write_records(writer, entries, FOOD_HEADER)
}

pub fn write_weights_csv<W: Write>(writer: W, entries: &[WeightLogEntry]) -> Result<()> {
    write_records(writer, entries, WEIGHT_HEADER)
}

pub fn write_saved_foods_csv<W: Write>(writer: W, foods: &[SavedFood]) -> Result<()> {
    write_records(writer, foods, SAVED_FOOD_HEADER)
}
