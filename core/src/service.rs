use std::io::Write;
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;

use crate::csv_export::write_entries_csv;
use crate::db::Database;
use crate::metrics::{
    ActivityStats, Dashboard, WeeklyProgress, activity_stats, build_dashboard,
    build_weekly_progress,
};
use crate::models::{
    ExportData, ImportSummary, MealEntry, NewMealEntry, NewWaterEvent, NewWorkoutEntry,
    UserProfile, WaterEvent, WorkoutEntry,
};

/// Where the aggregator reads raw records from.
///
/// `Database` is the production source. A `None` date means every date.
pub trait RecordSource {
    fn list_workouts(&self, date: Option<NaiveDate>) -> Result<Vec<WorkoutEntry>>;
    fn list_meals(&self, date: Option<NaiveDate>) -> Result<Vec<MealEntry>>;
    fn list_water_events(&self, date: Option<NaiveDate>) -> Result<Vec<WaterEvent>>;
    fn profile(&self) -> Result<UserProfile>;
}

impl RecordSource for Database {
    fn list_workouts(&self, date: Option<NaiveDate>) -> Result<Vec<WorkoutEntry>> {
        Database::list_workouts(self, date)
    }

    fn list_meals(&self, date: Option<NaiveDate>) -> Result<Vec<MealEntry>> {
        Database::list_meals(self, date)
    }

    fn list_water_events(&self, date: Option<NaiveDate>) -> Result<Vec<WaterEvent>> {
        Database::list_water_events(self, date)
    }

    fn profile(&self) -> Result<UserProfile> {
        self.get_profile()
    }
}

pub fn dashboard_from(source: &impl RecordSource, today: NaiveDate) -> Result<Dashboard> {
    let profile = source.profile()?;
    let workouts = source.list_workouts(Some(today))?;
    let meals = source.list_meals(Some(today))?;
    let water = source.list_water_events(Some(today))?;
    Ok(build_dashboard(&profile, &workouts, &meals, &water, today))
}

pub fn weekly_progress_from(
    source: &impl RecordSource,
    today: NaiveDate,
    window_days: u32,
) -> Result<WeeklyProgress> {
    let workouts = source.list_workouts(None)?;
    let meals = source.list_meals(None)?;
    let water = source.list_water_events(None)?;
    Ok(build_weekly_progress(
        &workouts,
        &meals,
        &water,
        today,
        window_days,
    )?)
}

pub fn stats_from(source: &impl RecordSource) -> Result<ActivityStats> {
    let workouts = source.list_workouts(None)?;
    let meals = source.list_meals(None)?;
    let water = source.list_water_events(None)?;
    Ok(activity_stats(&workouts, &meals, &water))
}

pub struct FitlogService {
    db: Database,
}

impl FitlogService {
    pub fn new(db_path: &Path) -> Result<Self> {
        let db = Database::open(db_path)?;
        Ok(Self { db })
    }

    pub fn new_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self { db })
    }

    // --- Workouts ---

    pub fn log_workout(&self, entry: &NewWorkoutEntry) -> Result<WorkoutEntry> {
        let workout = self.db.insert_workout(entry)?;
        tracing::info!(
            id = workout.id,
            exercise = %workout.exercise,
            minutes = workout.duration_minutes,
            calories_burned = workout.calories_burned,
            "logged workout"
        );
        Ok(workout)
    }

    pub fn get_workout(&self, id: i64) -> Result<WorkoutEntry> {
        self.db.get_workout(id)
    }

    pub fn list_workouts(&self, date: Option<NaiveDate>) -> Result<Vec<WorkoutEntry>> {
        self.db.list_workouts(date)
    }

    pub fn recent_workouts(&self, limit: i64) -> Result<Vec<WorkoutEntry>> {
        self.db.recent_workouts(limit)
    }

    pub fn delete_workout(&self, id: i64) -> Result<bool> {
        let deleted = self.db.delete_workout(id)?;
        if deleted {
            tracing::info!(id, "deleted workout");
        }
        Ok(deleted)
    }

    // --- Meals ---

    pub fn log_meal(&self, entry: &NewMealEntry) -> Result<MealEntry> {
        let meal = self.db.insert_meal(entry)?;
        tracing::info!(
            id = meal.id,
            name = %meal.name,
            calories = meal.calories,
            "logged meal"
        );
        Ok(meal)
    }

    pub fn get_meal(&self, id: i64) -> Result<MealEntry> {
        self.db.get_meal(id)
    }

    pub fn list_meals(&self, date: Option<NaiveDate>) -> Result<Vec<MealEntry>> {
        self.db.list_meals(date)
    }

    pub fn delete_meal(&self, id: i64) -> Result<bool> {
        let deleted = self.db.delete_meal(id)?;
        if deleted {
            tracing::info!(id, "deleted meal");
        }
        Ok(deleted)
    }

    // --- Water ---

    pub fn log_water(&self, event: &NewWaterEvent) -> Result<WaterEvent> {
        let event = self.db.insert_water_event(event)?;
        tracing::info!(id = event.id, amount_ml = event.amount_ml, "logged water");
        Ok(event)
    }

    pub fn list_water_events(&self, date: Option<NaiveDate>) -> Result<Vec<WaterEvent>> {
        self.db.list_water_events(date)
    }

    pub fn water_total(&self, date: NaiveDate) -> Result<i64> {
        self.db.water_total_for_date(date)
    }

    // --- Profile ---

    pub fn profile(&self) -> Result<UserProfile> {
        self.db.get_profile()
    }

    pub fn save_profile(&self, profile: &UserProfile) -> Result<UserProfile> {
        let saved = self.db.save_profile(profile)?;
        tracing::info!(
            name = %saved.name,
            calorie_goal = saved.daily_calorie_goal,
            water_goal_ml = saved.daily_water_goal_ml,
            "saved profile"
        );
        Ok(saved)
    }

    // --- Aggregates ---

    pub fn dashboard(&self, today: NaiveDate) -> Result<Dashboard> {
        dashboard_from(&self.db, today)
    }

    pub fn weekly_progress(&self, today: NaiveDate, window_days: u32) -> Result<WeeklyProgress> {
        weekly_progress_from(&self.db, today, window_days)
    }

    pub fn stats(&self) -> Result<ActivityStats> {
        stats_from(&self.db)
    }

    // --- Export / Import ---

    pub fn export_all(&self) -> Result<ExportData> {
        self.db.export_all()
    }

    pub fn import_all(&self, data: &ExportData) -> Result<ImportSummary> {
        self.db.import_all(data)
    }

    /// Write every logged entry as CSV. Returns the number of rows written.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let workouts = self.db.list_workouts(None)?;
        let meals = self.db.list_meals(None)?;
        let water = self.db.list_water_events(None)?;
        write_entries_csv(writer, &workouts, &meals, &water)
    }
}
