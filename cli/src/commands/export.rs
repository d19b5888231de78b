use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;

use fitlog_core::TrackerService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ExportKind {
    Foods,
    Weights,
    SavedFoods,
}

impl ExportKind {
    fn label(self) -> &'static str {
        match self {
            ExportKind::Foods => "food entries",
            ExportKind::Weights => "weight entries",
            ExportKind::SavedFoods => "saved foods",
        }
    }
}

fn write_export<W: Write>(svc: &TrackerService, kind: ExportKind, writer: W) -> Result<usize> {
    let count = match kind {
        ExportKind::Foods => svc.export_foods_csv(writer)?,
        ExportKind::Weights => svc.export_weights_csv(writer)?,
        ExportKind::SavedFoods => svc.export_saved_foods_csv(writer)?,
    };
    Ok(count)
}

/// Write a CSV export to `output`, or stdout when no path is given.
pub(crate) fn cmd_export(
    svc: &TrackerService,
    kind: ExportKind,
    output: Option<&Path>,
    json: bool,
) -> Result<()> {
    let count = if let Some(path) = output {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write_export(svc, kind, BufWriter::new(file))?
    } else {
        write_export(svc, kind, io::stdout().lock())?
    };

    if json {
        // Keep stdout clean for CSV when no file was given.
        let report = serde_json::json!({
            "exported": count,
            "kind": kind.label(),
            "output": output.map(|p| p.display().to_string()),
        });
        eprintln!("{report}");
    } else if let Some(path) = output {
        println!("Exported {count} {} to {}", kind.label(), path.display());
    } else {
        eprintln!("Exported {count} {}", kind.label());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_export_foods_to_file() {
        let svc = TrackerService::new_in_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        svc.add_food(date, "Oatmeal", 300.0, 10.0, 54.0, 6.0).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foods.csv");
        cmd_export(&svc, ExportKind::Foods, Some(&path), false).unwrap();

        let csv = std::fs::read_to_string(&path).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("id,date,name,calories,protein,carbs,fat"));
        assert_eq!(lines.next(), Some("1,2024-01-01,Oatmeal,300.0,10.0,54.0,6.0"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_export_saved_foods_header_only_when_empty() {
        let svc = TrackerService::new_in_memory().unwrap();
        let mut buf = Vec::new();
        let count = write_export(&svc, ExportKind::SavedFoods, &mut buf).unwrap();
        assert_eq!(count, 0);
        assert_eq!(String::from_utf8(buf).unwrap(), "name,calories,protein,carbs,fat\n");
    }
}
