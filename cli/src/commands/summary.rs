use anyhow::Result;

use fitlog_core::TrackerService;

use super::helpers::{parse_date, print_food_log_table, print_json};

pub(crate) fn cmd_summary(svc: &TrackerService, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let summary = svc.day_summary(date)?;

    if json {
        return print_json(&summary);
    }

    println!("=== {date} ===\n");
    if summary.entries.is_empty() {
        println!("  No foods logged\n");
    } else {
        print_food_log_table(&summary.entries);
    }

    let totals = &summary.totals;
    println!(
        "  TOTAL: {:.0} kcal | P:{:.0}g C:{:.0}g F:{:.0}g",
        totals.calories, totals.protein, totals.carbs, totals.fat
    );

    let targets = &summary.targets;
    if let (Some(cal), Some(p), Some(c), Some(f)) = (
        targets.calorie_target,
        targets.protein,
        targets.carbs,
        targets.fat,
    ) {
        println!("  TARGET: {cal} kcal | P:{p}g C:{c}g F:{f}g");
        #[allow(clippy::cast_precision_loss)]
        let (rp, rc, rf) = (
            p as f64 - totals.protein,
            c as f64 - totals.carbs,
            f as f64 - totals.fat,
        );
        let rcal = summary.calories_remaining.unwrap_or_default();
        println!("  REMAINING: {rcal:.0} kcal | P:{rp:.0}g C:{rc:.0}g F:{rf:.0}g");
    } else if targets.is_empty() {
        eprintln!("\nLog a weight and set a TDEE to see targets.");
    } else {
        eprintln!("\nSet a TDEE with `fitlog settings set` to see targets.");
    }
    Ok(())
}
