//! Daily and weekly aggregation over logged records.
//!
//! Every function here is pure: callers hand in record snapshots and a
//! reference `today`, and the same inputs always produce the same output.
//! Sums saturate at `i64::MAX` instead of overflowing.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::error::MetricsError;
use crate::models::{MealEntry, UserProfile, WaterEvent, WorkoutEntry};

pub const DEFAULT_WINDOW_DAYS: u32 = 7;
/// Longest accepted series window, one leap year.
pub const MAX_WINDOW_DAYS: u32 = 366;

/// A record that belongs to exactly one calendar day.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for WorkoutEntry {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for MealEntry {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for WaterEvent {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

fn on_day<R: Dated>(records: &[R], day: NaiveDate) -> impl Iterator<Item = &R> {
    records.iter().filter(move |r| r.date() == day)
}

fn saturating_sum(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0, i64::saturating_add)
}

// --- Today ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TodayTotals {
    pub workout_count: i64,
    pub total_workout_minutes: i64,
    pub total_calories_burned: i64,
    pub meal_count: i64,
    pub total_calories_consumed: i64,
    pub total_water_ml: i64,
}

pub fn today_totals(
    workouts: &[WorkoutEntry],
    meals: &[MealEntry],
    water_events: &[WaterEvent],
    today: NaiveDate,
) -> TodayTotals {
    let mut totals = TodayTotals::default();

    for w in on_day(workouts, today) {
        totals.workout_count += 1;
        totals.total_workout_minutes =
            totals.total_workout_minutes.saturating_add(w.duration_minutes);
        totals.total_calories_burned =
            totals.total_calories_burned.saturating_add(w.calories_burned);
    }
    for m in on_day(meals, today) {
        totals.meal_count += 1;
        totals.total_calories_consumed =
            totals.total_calories_consumed.saturating_add(m.calories);
    }
    totals.total_water_ml = saturating_sum(on_day(water_events, today).map(|e| e.amount_ml));

    totals
}

// --- Goal progress ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoalProgress {
    pub consumed: i64,
    pub goal: i64,
    /// Progress clamped to `[0, 100]`, for progress bars.
    pub percent: f64,
    /// Unclamped progress; above 100 means over the goal.
    pub raw_percent: f64,
    /// `goal - consumed`. Negative when over budget.
    pub remaining: i64,
    pub goal_valid: bool,
}

impl GoalProgress {
    /// Progress shown when the goal cannot be used as a denominator.
    #[must_use]
    pub fn fallback(consumed: i64, goal: i64) -> Self {
        Self {
            consumed,
            goal,
            percent: 0.0,
            raw_percent: 0.0,
            remaining: goal.saturating_sub(consumed),
            goal_valid: false,
        }
    }

    #[must_use]
    pub fn is_met(&self) -> bool {
        self.goal_valid && self.consumed >= self.goal
    }

    #[must_use]
    pub fn over_budget_by(&self) -> Option<i64> {
        (self.goal_valid && self.remaining < 0).then_some(self.remaining.saturating_neg())
    }
}

#[allow(clippy::cast_precision_loss)]
pub fn goal_progress(consumed: i64, goal: i64) -> Result<GoalProgress, MetricsError> {
    if goal <= 0 {
        return Err(MetricsError::InvalidGoal { goal });
    }
    let raw_percent = consumed as f64 / goal as f64 * 100.0;
    Ok(GoalProgress {
        consumed,
        goal,
        percent: raw_percent.clamp(0.0, 100.0),
        raw_percent,
        remaining: goal.saturating_sub(consumed),
        goal_valid: true,
    })
}

/// Like [`goal_progress`], but recovers from an invalid goal with 0% progress.
#[must_use]
pub fn goal_progress_or_fallback(consumed: i64, goal: i64) -> GoalProgress {
    goal_progress(consumed, goal).unwrap_or_else(|err| {
        tracing::warn!(consumed, goal, "{err}; showing 0% progress");
        GoalProgress::fallback(consumed, goal)
    })
}

// --- Series ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesBucket {
    pub date: NaiveDate,
    /// Short weekday name of `date` (`Mon` .. `Sun`).
    pub label: String,
    pub value: i64,
}

/// One bucket per day from `today - (window_days - 1)` through `today`, oldest
/// first. Days without records still get a bucket, valued by `aggregate(&[])`.
///
/// A window of 0 days is empty. Windows longer than [`MAX_WINDOW_DAYS`], or
/// starting before the earliest representable date, are rejected rather than
/// returned short.
pub fn weekly_series<R, D, A>(
    records: &[R],
    today: NaiveDate,
    window_days: u32,
    date_of: D,
    aggregate: A,
) -> Result<Vec<SeriesBucket>, MetricsError>
where
    D: Fn(&R) -> NaiveDate,
    A: Fn(&[&R]) -> i64,
{
    if window_days > MAX_WINDOW_DAYS {
        return Err(MetricsError::WindowTooLong {
            window_days,
            max: MAX_WINDOW_DAYS,
        });
    }
    let Some(span) = window_days.checked_sub(1) else {
        return Ok(Vec::new());
    };
    let start = today
        .checked_sub_days(Days::new(u64::from(span)))
        .ok_or(MetricsError::WindowOutOfRange { today, window_days })?;

    let mut by_day: BTreeMap<NaiveDate, Vec<&R>> = BTreeMap::new();
    for record in records {
        let day = date_of(record);
        if day >= start && day <= today {
            by_day.entry(day).or_default().push(record);
        }
    }

    Ok(start
        .iter_days()
        .take_while(|day| *day <= today)
        .map(|day| {
            let matching = by_day.get(&day).map_or(&[][..], Vec::as_slice);
            SeriesBucket {
                date: day,
                label: day.format("%a").to_string(),
                value: aggregate(matching),
            }
        })
        .collect())
}

fn sum_series<R: Dated>(
    records: &[R],
    today: NaiveDate,
    window_days: u32,
    value_of: impl Fn(&R) -> i64,
) -> Result<Vec<SeriesBucket>, MetricsError> {
    weekly_series(records, today, window_days, |r: &R| r.date(), |day| {
        saturating_sum(day.iter().map(|r| value_of(r)))
    })
}

pub fn workout_minutes_series(
    workouts: &[WorkoutEntry],
    today: NaiveDate,
    window_days: u32,
) -> Result<Vec<SeriesBucket>, MetricsError> {
    sum_series(workouts, today, window_days, |w| w.duration_minutes)
}

pub fn calorie_series(
    meals: &[MealEntry],
    today: NaiveDate,
    window_days: u32,
) -> Result<Vec<SeriesBucket>, MetricsError> {
    sum_series(meals, today, window_days, |m| m.calories)
}

pub fn hydration_series(
    water_events: &[WaterEvent],
    today: NaiveDate,
    window_days: u32,
) -> Result<Vec<SeriesBucket>, MetricsError> {
    sum_series(water_events, today, window_days, |e| e.amount_ml)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyProgress {
    pub end_date: NaiveDate,
    pub window_days: u32,
    pub workout_minutes: Vec<SeriesBucket>,
    pub calories: Vec<SeriesBucket>,
    pub hydration_ml: Vec<SeriesBucket>,
}

pub fn build_weekly_progress(
    workouts: &[WorkoutEntry],
    meals: &[MealEntry],
    water_events: &[WaterEvent],
    today: NaiveDate,
    window_days: u32,
) -> Result<WeeklyProgress, MetricsError> {
    Ok(WeeklyProgress {
        end_date: today,
        window_days,
        workout_minutes: workout_minutes_series(workouts, today, window_days)?,
        calories: calorie_series(meals, today, window_days)?,
        hydration_ml: hydration_series(water_events, today, window_days)?,
    })
}

// --- All-time stats ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActivityStats {
    pub total_workouts: i64,
    pub total_workout_minutes: i64,
    pub average_workout_minutes: i64,
    pub total_meals: i64,
    pub water_records: i64,
}

#[allow(clippy::cast_possible_wrap)]
pub fn activity_stats(
    workouts: &[WorkoutEntry],
    meals: &[MealEntry],
    water_events: &[WaterEvent],
) -> ActivityStats {
    let total_workouts = workouts.len() as i64;
    let total_workout_minutes = saturating_sum(workouts.iter().map(|w| w.duration_minutes));
    // Integer division rounding half up, without doubling the total
    let average_workout_minutes = if total_workouts > 0 {
        let quotient = total_workout_minutes / total_workouts;
        let remainder = total_workout_minutes % total_workouts;
        if remainder >= total_workouts - remainder {
            quotient + 1
        } else {
            quotient
        }
    } else {
        0
    };

    ActivityStats {
        total_workouts,
        total_workout_minutes,
        average_workout_minutes,
        total_meals: meals.len() as i64,
        water_records: water_events.len() as i64,
    }
}

// --- Dashboard ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub date: NaiveDate,
    pub profile_name: String,
    pub totals: TodayTotals,
    pub calorie_progress: GoalProgress,
    pub water_progress: GoalProgress,
}

pub fn build_dashboard(
    profile: &UserProfile,
    workouts: &[WorkoutEntry],
    meals: &[MealEntry],
    water_events: &[WaterEvent],
    today: NaiveDate,
) -> Dashboard {
    let totals = today_totals(workouts, meals, water_events, today);
    Dashboard {
        date: today,
        profile_name: profile.name.clone(),
        totals,
        calorie_progress: goal_progress_or_fallback(
            totals.total_calories_consumed,
            profile.daily_calorie_goal,
        ),
        water_progress: goal_progress_or_fallback(
            totals.total_water_ml,
            profile.daily_water_goal_ml,
        ),
    }
}
