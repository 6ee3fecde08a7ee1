use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{MealEntry, WaterEvent, WorkoutEntry};

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    kind: &'static str,
    date: NaiveDate,
    name: &'a str,
    duration_minutes: Option<i64>,
    calories: Option<i64>,
    amount_ml: Option<i64>,
}

/// Write every entry as one CSV row, ordered by date.
///
/// Columns: `kind,date,name,duration_minutes,calories,amount_ml`. Workout rows
/// carry the stored burn estimate in `calories`; water rows leave `name` empty.
pub fn write_entries_csv<W: Write>(
    writer: W,
    workouts: &[WorkoutEntry],
    meals: &[MealEntry],
    water_events: &[WaterEvent],
) -> Result<usize> {
    let mut rows: Vec<CsvRow> = Vec::with_capacity(workouts.len() + meals.len() + water_events.len());

    rows.extend(workouts.iter().map(|w| CsvRow {
        kind: "workout",
        date: w.date,
        name: &w.exercise,
        duration_minutes: Some(w.duration_minutes),
        calories: Some(w.calories_burned),
        amount_ml: None,
    }));
    rows.extend(meals.iter().map(|m| CsvRow {
        kind: "meal",
        date: m.date,
        name: &m.name,
        duration_minutes: None,
        calories: Some(m.calories),
        amount_ml: None,
    }));
    rows.extend(water_events.iter().map(|e| CsvRow {
        kind: "water",
        date: e.date,
        name: "",
        duration_minutes: None,
        calories: None,
        amount_ml: Some(e.amount_ml),
    }));

    // Stable: within a day, workouts then meals then water
    rows.sort_by_key(|r| r.date);

    let mut wtr = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        wtr.write_record([
            "kind",
            "date",
            "name",
            "duration_minutes",
            "calories",
            "amount_ml",
        ])?;
    }
    for row in &rows {
        wtr.serialize(row).context("Failed to write CSV row")?;
    }
    wtr.flush()?;
    Ok(rows.len())
}
