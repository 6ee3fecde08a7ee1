use anyhow::{Result, bail};

use fitlog_core::models::UserProfile;
use fitlog_core::service::FitlogService;

pub(crate) fn cmd_profile_show(svc: &FitlogService, json: bool) -> Result<()> {
    let profile = svc.profile()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        print_profile(&profile);
    }
    Ok(())
}

pub(crate) fn cmd_profile_set(
    svc: &FitlogService,
    name: Option<String>,
    calorie_goal: Option<i64>,
    water_goal: Option<i64>,
    json: bool,
) -> Result<()> {
    if name.is_none() && calorie_goal.is_none() && water_goal.is_none() {
        bail!("Nothing to update. Provide at least one of --name, --calorie-goal, or --water-goal");
    }

    let current = svc.profile()?;
    let profile = merge_profile(current, name, calorie_goal, water_goal);
    let saved = svc.save_profile(&profile)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&saved)?);
    } else {
        println!("Profile updated.\n");
        print_profile(&saved);
    }
    Ok(())
}

/// Fill unspecified fields from the current profile; the result is saved whole.
fn merge_profile(
    current: UserProfile,
    name: Option<String>,
    calorie_goal: Option<i64>,
    water_goal: Option<i64>,
) -> UserProfile {
    UserProfile {
        name: name.unwrap_or(current.name),
        daily_calorie_goal: calorie_goal.unwrap_or(current.daily_calorie_goal),
        daily_water_goal_ml: water_goal.unwrap_or(current.daily_water_goal_ml),
    }
}

fn print_profile(profile: &UserProfile) {
    println!("  Name:          {}", profile.name);
    println!("  Calorie goal:  {} cal/day", profile.daily_calorie_goal);
    println!("  Water goal:    {} ml/day", profile.daily_water_goal_ml);
}
