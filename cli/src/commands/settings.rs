use anyhow::Result;

use fitlog_core::TrackerService;
use fitlog_core::macros::MacroResult;

use super::helpers::print_json;

fn print_targets(targets: &MacroResult) {
    let Some(weight) = targets.weight else {
        eprintln!("No weight logged yet. Log one with `fitlog weight add` to compute targets.");
        return;
    };
    println!("Latest weight: {weight:.1} lbs");

    if let (Some(cal), Some(p), Some(c), Some(f)) = (
        targets.calorie_target,
        targets.protein,
        targets.carbs,
        targets.fat,
    ) {
        println!("Target: {cal} kcal/day  Protein: {p}g  Carbs: {c}g  Fat: {f}g");
    } else {
        eprintln!("No TDEE set. Use `fitlog settings set <tdee> <goal>` to compute targets.");
    }
}

pub(crate) fn cmd_settings_set(
    svc: &TrackerService,
    tdee: i64,
    goal: &str,
    json: bool,
) -> Result<()> {
    let setting = svc.set_settings(tdee, goal)?;
    let targets = svc.macro_targets()?;

    if json {
        print_json(&serde_json::json!({ "settings": setting, "targets": targets }))?;
    } else {
        println!("TDEE: {} kcal  Goal: {}", setting.tdee, setting.goal);
        print_targets(&targets);
    }
    Ok(())
}

pub(crate) fn cmd_settings_show(svc: &TrackerService, json: bool) -> Result<()> {
    let setting = svc.tdee_setting()?;
    let targets = svc.macro_targets()?;

    if json {
        return print_json(&serde_json::json!({ "settings": setting, "targets": targets }));
    }

    match &setting {
        Some(s) => println!(
            "TDEE: {} kcal  Goal: {}  (updated {})",
            s.tdee, s.goal, s.last_updated
        ),
        None => {
            eprintln!("No TDEE set. Use `fitlog settings set <tdee> <goal>` to set one.");
            return Ok(());
        }
    }
    print_targets(&targets);
    Ok(())
}

pub(crate) fn cmd_settings_clear(svc: &TrackerService, json: bool) -> Result<()> {
    let cleared = svc.clear_settings()?;

    if json {
        println!("{}", serde_json::json!({ "cleared": cleared }));
    } else if cleared {
        println!("Settings cleared");
    } else {
        eprintln!("No settings were stored");
    }
    Ok(())
}
