use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use fitlog_core::models::ExportData;
use fitlog_core::service::FitlogService;

pub(crate) fn cmd_export(svc: &FitlogService, csv: bool, output: Option<&Path>) -> Result<()> {
    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create file: {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };

    if csv {
        let rows = svc.export_csv(&mut out)?;
        tracing::info!(rows, "exported CSV");
    } else {
        let data = svc.export_all()?;
        serde_json::to_writer_pretty(&mut out, &data).context("Failed to write export")?;
        writeln!(out)?;
        tracing::info!(
            workouts = data.workouts.len(),
            meals = data.meals.len(),
            water_events = data.water_events.len(),
            "exported JSON"
        );
    }

    if let Some(path) = output {
        eprintln!("Exported to {}", path.display());
    }
    Ok(())
}

pub(crate) fn cmd_import(svc: &FitlogService, path: &Path, json: bool) -> Result<()> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    let data: ExportData = serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("Invalid export file: {}", path.display()))?;

    let summary = svc.import_all(&data)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Import complete.\n");
        println!("  Workouts imported:     {}", summary.workouts_imported);
        println!("  Meals imported:        {}", summary.meals_imported);
        println!("  Water events imported: {}", summary.water_events_imported);
        if summary.profile_replaced {
            println!("  Profile replaced from export.");
        }
    }
    Ok(())
}
