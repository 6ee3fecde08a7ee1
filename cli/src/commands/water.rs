use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

use fitlog_core::metrics::{GoalProgress, goal_progress_or_fallback};
use fitlog_core::models::{NewWaterEvent, WATER_QUICK_ADD_ML, WaterEvent};
use fitlog_core::service::FitlogService;

use super::helpers::{parse_date, progress_bar, water_status};

pub(crate) fn cmd_water_add(
    svc: &FitlogService,
    amount_ml: i64,
    date: Option<String>,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    let date = parse_date(date, today)?;
    if !WATER_QUICK_ADD_ML.contains(&amount_ml) {
        tracing::debug!(amount_ml, "logging non-standard water amount");
    }
    let event = svc.log_water(&NewWaterEvent { date, amount_ml })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&event)?);
    } else {
        let total = svc.water_total(date)?;
        println!(
            "Added {}ml on {} ({total}ml total)",
            event.amount_ml,
            event.date.format("%Y-%m-%d")
        );
    }
    Ok(())
}

pub(crate) fn cmd_water_show(
    svc: &FitlogService,
    date: Option<String>,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    #[derive(Serialize)]
    struct WaterDay {
        date: NaiveDate,
        progress: GoalProgress,
        events: Vec<WaterEvent>,
    }

    let date = parse_date(date, today)?;
    let events = svc.list_water_events(Some(date))?;
    let total: i64 = events.iter().map(|e| e.amount_ml).sum();
    let goal = svc.profile()?.daily_water_goal_ml;
    let progress = goal_progress_or_fallback(total, goal);

    if json {
        let day = WaterDay {
            date,
            progress,
            events,
        };
        println!("{}", serde_json::to_string_pretty(&day)?);
        return Ok(());
    }

    println!("=== Water {} ===\n", date.format("%Y-%m-%d"));
    println!(
        "  {} {total} / {goal} ml ({:.0}%)",
        progress_bar(progress.percent, 20),
        progress.percent
    );
    println!("  {}", water_status(&progress));
    if !events.is_empty() {
        let amounts: Vec<String> = events.iter().map(|e| format!("{}ml", e.amount_ml)).collect();
        println!("\n  Logged: {}", amounts.join(", "));
    }
    Ok(())
}
