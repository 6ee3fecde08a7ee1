use anyhow::Result;
use chrono::NaiveDate;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use fitlog_core::service::FitlogService;

use super::helpers::{calorie_status, parse_date, progress_bar, water_status};
use super::workout::{RECENT_WORKOUTS_LIMIT, print_workout_table};

pub(crate) fn cmd_summary(
    svc: &FitlogService,
    date: Option<String>,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    let date = parse_date(date, today)?;
    let dash = svc.dashboard(date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dash)?);
        return Ok(());
    }

    let totals = &dash.totals;
    println!("=== {} ===", dash.date.format("%Y-%m-%d"));
    println!("Hi, {}!\n", dash.profile_name);

    println!(
        "  WORKOUTS: {} ({} min, ~{} cal burned)",
        totals.workout_count, totals.total_workout_minutes, totals.total_calories_burned
    );

    let cal = &dash.calorie_progress;
    println!(
        "  CALORIES: {} {} / {} ({:.0}%)",
        progress_bar(cal.percent, 20),
        totals.total_calories_consumed,
        cal.goal,
        cal.percent
    );
    println!("            {}", calorie_status(cal));

    let water = &dash.water_progress;
    println!(
        "  WATER:    {} {} / {} ml ({:.0}%)",
        progress_bar(water.percent, 20),
        totals.total_water_ml,
        water.goal,
        water.percent
    );
    println!("            {}", water_status(water));

    let recent = svc.recent_workouts(RECENT_WORKOUTS_LIMIT)?;
    if !recent.is_empty() {
        println!("\n  Recent workouts:");
        print_workout_table(&recent);
    }

    Ok(())
}

pub(crate) fn cmd_week(
    svc: &FitlogService,
    days: u32,
    date: Option<String>,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    #[derive(Tabled)]
    struct WeekRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Day")]
        day: String,
        #[tabled(rename = "Workout min")]
        minutes: i64,
        #[tabled(rename = "Calories")]
        calories: i64,
        #[tabled(rename = "Water ml")]
        water: i64,
    }

    let end = parse_date(date, today)?;
    let progress = svc.weekly_progress(end, days)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&progress)?);
        return Ok(());
    }

    // All three series share the same buckets
    let rows: Vec<WeekRow> = progress
        .workout_minutes
        .iter()
        .zip(&progress.calories)
        .zip(&progress.hydration_ml)
        .map(|((w, c), h)| WeekRow {
            date: w.date.format("%Y-%m-%d").to_string(),
            day: w.label.clone(),
            minutes: w.value,
            calories: c.value,
            water: h.value,
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

pub(crate) fn cmd_stats(svc: &FitlogService, json: bool) -> Result<()> {
    let stats = svc.stats()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("  Total workouts:   {}", stats.total_workouts);
    println!("  Workout minutes:  {}", stats.total_workout_minutes);
    println!("  Average duration: {} min", stats.average_workout_minutes);
    println!("  Meals logged:     {}", stats.total_meals);
    println!("  Water records:    {}", stats.water_records);
    Ok(())
}
