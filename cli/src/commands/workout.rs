use anyhow::Result;
use chrono::NaiveDate;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use fitlog_core::models::{NewWorkoutEntry, WorkoutEntry};
use fitlog_core::service::FitlogService;

use super::helpers::{json_error, parse_date, truncate};

pub(crate) const RECENT_WORKOUTS_LIMIT: i64 = 6;

pub(crate) fn cmd_workout_log(
    svc: &FitlogService,
    exercise: &str,
    minutes: i64,
    date: Option<String>,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    let date = parse_date(date, today)?;
    let workout = svc.log_workout(&NewWorkoutEntry {
        date,
        exercise: exercise.to_string(),
        duration_minutes: minutes,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&workout)?);
    } else {
        println!(
            "Logged {} for {} min on {} (~{} cal burned) [id {}]",
            workout.exercise,
            workout.duration_minutes,
            workout.date.format("%Y-%m-%d"),
            workout.calories_burned,
            workout.id
        );
    }
    Ok(())
}

pub(crate) fn cmd_workout_list(
    svc: &FitlogService,
    date: Option<String>,
    recent: bool,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    let workouts = if recent {
        svc.recent_workouts(RECENT_WORKOUTS_LIMIT)?
    } else {
        svc.list_workouts(Some(parse_date(date, today)?))?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&workouts)?);
        return Ok(());
    }

    if workouts.is_empty() {
        eprintln!("No workouts logged. Use `fitlog workout log` to add one.");
        process::exit(2);
    }

    print_workout_table(&workouts);
    Ok(())
}

pub(crate) fn cmd_workout_delete(svc: &FitlogService, id: i64, json: bool) -> Result<()> {
    if svc.delete_workout(id)? {
        if json {
            println!("{}", serde_json::json!({ "deleted": id }));
        } else {
            println!("Deleted workout {id}");
        }
        Ok(())
    } else {
        if json {
            println!("{}", json_error(&format!("Workout {id} not found")));
        } else {
            eprintln!("Workout {id} not found");
        }
        process::exit(2);
    }
}

pub(crate) fn print_workout_table(workouts: &[WorkoutEntry]) {
    #[derive(Tabled)]
    struct WorkoutRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Exercise")]
        exercise: String,
        #[tabled(rename = "Minutes")]
        minutes: i64,
        #[tabled(rename = "Burned")]
        burned: i64,
    }

    let rows: Vec<WorkoutRow> = workouts
        .iter()
        .map(|w| WorkoutRow {
            id: w.id,
            date: w.date.format("%Y-%m-%d").to_string(),
            exercise: truncate(&w.exercise, 30),
            minutes: w.duration_minutes,
            burned: w.calories_burned,
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}
