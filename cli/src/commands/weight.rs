use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use fitlog_core::TrackerService;
use fitlog_core::models::TimeOfDay;

use super::helpers::{parse_date, print_json};

pub(crate) fn cmd_weight_add(
    svc: &TrackerService,
    value: f64,
    time_of_day: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let time_of_day: TimeOfDay = time_of_day.parse()?;
    let date = parse_date(date)?;
    let entry = svc.add_weight(date, time_of_day, value)?;

    if json {
        print_json(&entry)?;
    } else {
        println!(
            "Logged [{}] {:.1} lbs ({}) for {}",
            entry.id, entry.weight, entry.time_of_day, entry.date
        );
    }
    Ok(())
}

pub(crate) fn cmd_weight_delete(svc: &TrackerService, id: i64, json: bool) -> Result<()> {
    svc.delete_weight(id)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted weight entry {id}");
    }
    Ok(())
}

pub(crate) fn cmd_weight_list(svc: &TrackerService, time_of_day: &str, json: bool) -> Result<()> {
    let time_of_day: TimeOfDay = time_of_day.parse()?;
    let rows = svc.list_weights(time_of_day)?;

    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        eprintln!("No {time_of_day} weights logged. Use `fitlog weight add` to record one.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct WeightRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Weight (lbs)")]
        weight: String,
        #[tabled(rename = "Calories")]
        calories: String,
    }

    let calories_label = match time_of_day {
        TimeOfDay::Morning => "previous day",
        TimeOfDay::Night => "same day",
    };
    let table_rows: Vec<WeightRow> = rows
        .iter()
        .map(|r| WeightRow {
            id: r.id,
            date: r.date.to_string(),
            weight: format!("{:.1}", r.weight),
            calories: format!("{:.0}", r.calories),
        })
        .collect();

    let table = Table::new(&table_rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    eprintln!("Calories are from the {calories_label}.");
    Ok(())
}

pub(crate) fn cmd_weight_latest(svc: &TrackerService, json: bool) -> Result<()> {
    let weight = svc.latest_weight()?;

    if json {
        println!("{}", serde_json::json!({ "weight": weight }));
    } else if let Some(w) = weight {
        println!("{w:.1} lbs");
    } else {
        eprintln!("No weight logged yet");
    }
    Ok(())
}

pub(crate) fn cmd_weight_history(svc: &TrackerService, json: bool) -> Result<()> {
    let entries = svc.weight_history()?;

    if json {
        print_json(&entries)?;
    } else if entries.is_empty() {
        eprintln!("No weight entries found");
    } else {
        for e in &entries {
            println!("[{}] {} | {:<7} | {:.1} lbs", e.id, e.date, e.time_of_day, e.weight);
        }
    }
    Ok(())
}
