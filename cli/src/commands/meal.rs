use anyhow::Result;
use chrono::NaiveDate;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use fitlog_core::models::NewMealEntry;
use fitlog_core::service::FitlogService;

use super::helpers::{json_error, parse_date, truncate};

pub(crate) fn cmd_meal_log(
    svc: &FitlogService,
    name: &str,
    calories: i64,
    date: Option<String>,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    let date = parse_date(date, today)?;
    let meal = svc.log_meal(&NewMealEntry {
        date,
        name: name.to_string(),
        calories,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&meal)?);
    } else {
        println!(
            "Logged {} ({} cal) on {} [id {}]",
            meal.name,
            meal.calories,
            meal.date.format("%Y-%m-%d"),
            meal.id
        );
    }
    Ok(())
}

pub(crate) fn cmd_meal_list(
    svc: &FitlogService,
    date: Option<String>,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    let date = parse_date(date, today)?;
    let meals = svc.list_meals(Some(date))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&meals)?);
        return Ok(());
    }

    if meals.is_empty() {
        eprintln!("No meals logged for {}", date.format("%Y-%m-%d"));
        process::exit(2);
    }

    #[derive(Tabled)]
    struct MealRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Meal")]
        name: String,
        #[tabled(rename = "Calories")]
        calories: i64,
    }

    let rows: Vec<MealRow> = meals
        .iter()
        .map(|m| MealRow {
            id: m.id,
            name: truncate(&m.name, 35),
            calories: m.calories,
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    let total: i64 = meals.iter().map(|m| m.calories).sum();
    println!("  TOTAL: {total} cal");
    Ok(())
}

pub(crate) fn cmd_meal_delete(svc: &FitlogService, id: i64, json: bool) -> Result<()> {
    if svc.delete_meal(id)? {
        if json {
            println!("{}", serde_json::json!({ "deleted": id }));
        } else {
            println!("Deleted meal {id}");
        }
        Ok(())
    } else {
        if json {
            println!("{}", json_error(&format!("Meal {id} not found")));
        } else {
            eprintln!("Meal {id} not found");
        }
        process::exit(2);
    }
}
