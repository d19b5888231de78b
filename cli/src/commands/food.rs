use anyhow::{Context, Result, bail};

use fitlog_core::TrackerService;
use fitlog_core::models::SavedFood;

use super::helpers::{parse_date, print_food_log_table, print_json, print_saved_food_table};

/// Macro values given on the command line. Missing values are filled from the
/// saved food with the same name.
pub(crate) struct FoodArgs {
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
}

impl FoodArgs {
    fn resolve(&self, saved: Option<&SavedFood>, name: &str) -> Result<(f64, f64, f64, f64)> {
        let calories = match (self.calories, saved) {
            (Some(c), _) => c,
            (None, Some(s)) => s.calories,
            (None, None) => {
                bail!("No saved food named '{name}'. Provide --calories (and macros) to log it")
            }
        };
        let pick = |given: Option<f64>, from_saved: fn(&SavedFood) -> f64| {
            given.or_else(|| saved.map(from_saved)).unwrap_or(0.0)
        };
        Ok((
            calories,
            pick(self.protein, |s| s.protein),
            pick(self.carbs, |s| s.carbs),
            pick(self.fat, |s| s.fat),
        ))
    }
}

pub(crate) fn cmd_food_add(
    svc: &TrackerService,
    name: &str,
    args: &FoodArgs,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let saved = svc.find_saved_food(name.trim())?;
    let (calories, protein, carbs, fat) = args.resolve(saved.as_ref(), name)?;

    let entry = svc.add_food(date, name, calories, protein, carbs, fat)?;

    if json {
        print_json(&entry)?;
    } else {
        println!(
            "Logged [{}] {} on {}: {:.0} kcal | P:{:.0}g C:{:.0}g F:{:.0}g",
            entry.id,
            entry.name,
            entry.date,
            entry.calories,
            entry.protein,
            entry.carbs,
            entry.fat
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_food_edit(
    svc: &TrackerService,
    id: i64,
    name: &str,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    json: bool,
) -> Result<()> {
    let entry = svc.edit_food(id, name, calories, protein, carbs, fat)?;

    if json {
        print_json(&entry)?;
    } else {
        println!(
            "Updated [{}] {}: {:.0} kcal | P:{:.0}g C:{:.0}g F:{:.0}g",
            entry.id, entry.name, entry.calories, entry.protein, entry.carbs, entry.fat
        );
    }
    Ok(())
}

pub(crate) fn cmd_food_delete(svc: &TrackerService, id: i64, json: bool) -> Result<()> {
    svc.delete_food(id)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted food entry {id}");
    }
    Ok(())
}

pub(crate) fn cmd_food_list(svc: &TrackerService, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let entries = svc.list_foods_for_date(date)?;
    let totals = svc.daily_totals(date)?;

    if json {
        print_json(&serde_json::json!({
            "date": date,
            "entries": entries,
            "totals": totals,
        }))?;
    } else if entries.is_empty() {
        eprintln!("No foods logged for {date}");
    } else {
        print_food_log_table(&entries);
        println!(
            "TOTAL: {:.0} kcal | P:{:.0}g C:{:.0}g F:{:.0}g",
            totals.calories, totals.protein, totals.carbs, totals.fat
        );
    }
    Ok(())
}

pub(crate) fn cmd_food_saved(svc: &TrackerService, json: bool) -> Result<()> {
    let foods = svc.list_saved_foods()?;

    if json {
        print_json(&foods)?;
    } else if foods.is_empty() {
        eprintln!("No saved foods yet. Foods are saved the first time you log them.");
    } else {
        print_saved_food_table(&foods);
    }
    Ok(())
}

pub(crate) fn cmd_food_search(svc: &TrackerService, query: &str, json: bool) -> Result<()> {
    let foods = svc
        .search_saved_foods(query)
        .with_context(|| format!("Failed to search saved foods for '{query}'"))?;

    if json {
        print_json(&foods)?;
    } else if foods.is_empty() {
        eprintln!("No saved foods match '{query}'");
    } else {
        print_saved_food_table(&foods);
    }
    Ok(())
}
