use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use crate::models::{
    EXPORT_VERSION, ExportData, ImportSummary, MAX_ENTRY_CALORIES, MealEntry, NewMealEntry,
    NewWaterEvent, NewWorkoutEntry, UserProfile, WaterEvent, WorkoutEntry, validate_meal,
    validate_profile, validate_water, validate_workout,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "opened database");
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            tracing::debug!(from = version, to = 1, "migrating database schema");
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS workouts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    date TEXT NOT NULL,
                    exercise TEXT NOT NULL,
                    duration_minutes INTEGER NOT NULL CHECK (duration_minutes > 0),
                    calories_burned INTEGER NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS meals (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    date TEXT NOT NULL,
                    name TEXT NOT NULL,
                    calories INTEGER NOT NULL CHECK (calories >= 0),
                    protein INTEGER NOT NULL DEFAULT 0,
                    carbs INTEGER NOT NULL DEFAULT 0,
                    fats INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS water_intake (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    date TEXT NOT NULL,
                    amount_ml INTEGER NOT NULL CHECK (amount_ml > 0),
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS profile (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    name TEXT NOT NULL,
                    daily_calorie_goal INTEGER NOT NULL,
                    daily_water_goal_ml INTEGER NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_workouts_date ON workouts(date);
                CREATE INDEX IF NOT EXISTS idx_meals_date ON meals(date);
                CREATE INDEX IF NOT EXISTS idx_water_intake_date ON water_intake(date);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    fn date_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
        let raw: String = row.get(idx)?;
        NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    }

    // 0: id, 1: uuid, 2: date, 3: exercise, 4: duration_minutes,
    // 5: calories_burned, 6: created_at
    fn workout_from_row(row: &rusqlite::Row) -> rusqlite::Result<WorkoutEntry> {
        Ok(WorkoutEntry {
            id: row.get(0)?,
            uuid: row.get(1)?,
            date: Self::date_column(row, 2)?,
            exercise: row.get(3)?,
            duration_minutes: row.get(4)?,
            calories_burned: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    // 0: id, 1: uuid, 2: date, 3: name, 4: calories,
    // 5: protein, 6: carbs, 7: fats, 8: created_at
    fn meal_from_row(row: &rusqlite::Row) -> rusqlite::Result<MealEntry> {
        Ok(MealEntry {
            id: row.get(0)?,
            uuid: row.get(1)?,
            date: Self::date_column(row, 2)?,
            name: row.get(3)?,
            calories: row.get(4)?,
            protein: row.get(5)?,
            carbs: row.get(6)?,
            fats: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    fn water_event_from_row(row: &rusqlite::Row) -> rusqlite::Result<WaterEvent> {
        Ok(WaterEvent {
            id: row.get(0)?,
            uuid: row.get(1)?,
            date: Self::date_column(row, 2)?,
            amount_ml: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    // --- Workouts ---

    pub fn insert_workout(&self, entry: &NewWorkoutEntry) -> Result<WorkoutEntry> {
        validate_workout(entry)?;
        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO workouts (uuid, date, exercise, duration_minutes, calories_burned, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                uuid,
                entry.date.format(DATE_FORMAT).to_string(),
                entry.exercise.trim(),
                entry.duration_minutes,
                entry.calories_burned(),
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_workout(id)
    }

    pub fn get_workout(&self, id: i64) -> Result<WorkoutEntry> {
        self.conn
            .query_row(
                "SELECT id, uuid, date, exercise, duration_minutes, calories_burned, created_at
                 FROM workouts WHERE id = ?1",
                params![id],
                Self::workout_from_row,
            )
            .context("Workout not found")
    }

    pub fn list_workouts(&self, date: Option<NaiveDate>) -> Result<Vec<WorkoutEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, uuid, date, exercise, duration_minutes, calories_burned, created_at
             FROM workouts
             WHERE ?1 IS NULL OR date = ?1
             ORDER BY date, id",
        )?;
        let date_str = date.map(|d| d.format(DATE_FORMAT).to_string());
        let workouts = stmt
            .query_map(params![date_str], Self::workout_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(workouts)
    }

    /// Most recently logged workouts first.
    pub fn recent_workouts(&self, limit: i64) -> Result<Vec<WorkoutEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, uuid, date, exercise, duration_minutes, calories_burned, created_at
             FROM workouts
             ORDER BY id DESC
             LIMIT ?1",
        )?;
        let workouts = stmt
            .query_map(params![limit], Self::workout_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(workouts)
    }

    pub fn delete_workout(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM workouts WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // --- Meals ---

    pub fn insert_meal(&self, entry: &NewMealEntry) -> Result<MealEntry> {
        validate_meal(entry)?;
        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO meals (uuid, date, name, calories, protein, carbs, fats, created_at)
             VALUES (?1, ?2, ?3, ?4, 0, 0, 0, ?5)",
            params![
                uuid,
                entry.date.format(DATE_FORMAT).to_string(),
                entry.name.trim(),
                entry.calories,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_meal(id)
    }

    pub fn get_meal(&self, id: i64) -> Result<MealEntry> {
        self.conn
            .query_row(
                "SELECT id, uuid, date, name, calories, protein, carbs, fats, created_at
                 FROM meals WHERE id = ?1",
                params![id],
                Self::meal_from_row,
            )
            .context("Meal not found")
    }

    pub fn list_meals(&self, date: Option<NaiveDate>) -> Result<Vec<MealEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, uuid, date, name, calories, protein, carbs, fats, created_at
             FROM meals
             WHERE ?1 IS NULL OR date = ?1
             ORDER BY date, id",
        )?;
        let date_str = date.map(|d| d.format(DATE_FORMAT).to_string());
        let meals = stmt
            .query_map(params![date_str], Self::meal_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(meals)
    }

    pub fn delete_meal(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM meals WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // --- Water ---

    pub fn insert_water_event(&self, event: &NewWaterEvent) -> Result<WaterEvent> {
        validate_water(event)?;
        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO water_intake (uuid, date, amount_ml, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                uuid,
                event.date.format(DATE_FORMAT).to_string(),
                event.amount_ml,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.conn
            .query_row(
                "SELECT id, uuid, date, amount_ml, created_at FROM water_intake WHERE id = ?1",
                params![id],
                Self::water_event_from_row,
            )
            .context("Water event not found after insert")
    }

    pub fn list_water_events(&self, date: Option<NaiveDate>) -> Result<Vec<WaterEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, uuid, date, amount_ml, created_at
             FROM water_intake
             WHERE ?1 IS NULL OR date = ?1
             ORDER BY date, id",
        )?;
        let date_str = date.map(|d| d.format(DATE_FORMAT).to_string());
        let events = stmt
            .query_map(params![date_str], Self::water_event_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }

    pub fn water_total_for_date(&self, date: NaiveDate) -> Result<i64> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(amount_ml), 0) FROM water_intake WHERE date = ?1",
            params![date.format(DATE_FORMAT).to_string()],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    // --- Profile ---

    /// The saved profile, or the default profile if none has been saved.
    pub fn get_profile(&self) -> Result<UserProfile> {
        let profile = self
            .conn
            .query_row(
                "SELECT name, daily_calorie_goal, daily_water_goal_ml FROM profile WHERE id = 1",
                [],
                |row| {
                    Ok(UserProfile {
                        name: row.get(0)?,
                        daily_calorie_goal: row.get(1)?,
                        daily_water_goal_ml: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(profile.unwrap_or_default())
    }

    /// Replace the whole profile.
    pub fn save_profile(&self, profile: &UserProfile) -> Result<UserProfile> {
        validate_profile(profile)?;
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR REPLACE INTO profile (id, name, daily_calorie_goal, daily_water_goal_ml, updated_at)
             VALUES (1, ?1, ?2, ?3, ?4)",
            params![
                profile.name.trim(),
                profile.daily_calorie_goal,
                profile.daily_water_goal_ml,
                now,
            ],
        )?;
        self.get_profile()
    }

    // --- Export / Import ---

    pub fn export_all(&self) -> Result<ExportData> {
        Ok(ExportData {
            version: EXPORT_VERSION,
            exported_at: Local::now().to_rfc3339(),
            profile: self.get_profile()?,
            workouts: self.list_workouts(None)?,
            meals: self.list_meals(None)?,
            water_events: self.list_water_events(None)?,
        })
    }

    /// Insert every exported entry whose uuid is not already present and
    /// replace the profile. Re-importing the same export is a no-op for entries.
    pub fn import_all(&self, data: &ExportData) -> Result<ImportSummary> {
        if data.version > EXPORT_VERSION {
            anyhow::bail!(
                "Unsupported export version {} (newest supported is {EXPORT_VERSION})",
                data.version
            );
        }

        let tx = self.conn.unchecked_transaction()?;
        let mut summary = ImportSummary::default();

        for w in &data.workouts {
            validate_workout(&NewWorkoutEntry {
                date: w.date,
                exercise: w.exercise.clone(),
                duration_minutes: w.duration_minutes,
            })
            .with_context(|| format!("Invalid workout in import: {}", w.uuid))?;
            if !(0..=MAX_ENTRY_CALORIES).contains(&w.calories_burned) {
                anyhow::bail!(
                    "Invalid workout in import: {}: calories burned must be between 0 and {MAX_ENTRY_CALORIES} (got {})",
                    w.uuid,
                    w.calories_burned
                );
            }
            summary.workouts_imported += tx.execute(
                "INSERT OR IGNORE INTO workouts (uuid, date, exercise, duration_minutes, calories_burned, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    import_uuid(&w.uuid),
                    w.date.format(DATE_FORMAT).to_string(),
                    w.exercise,
                    w.duration_minutes,
                    w.calories_burned,
                    import_timestamp(&w.created_at),
                ],
            )? as i64;
        }

        for m in &data.meals {
            validate_meal(&NewMealEntry {
                date: m.date,
                name: m.name.clone(),
                calories: m.calories,
            })
            .with_context(|| format!("Invalid meal in import: {}", m.uuid))?;
            summary.meals_imported += tx.execute(
                "INSERT OR IGNORE INTO meals (uuid, date, name, calories, protein, carbs, fats, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    import_uuid(&m.uuid),
                    m.date.format(DATE_FORMAT).to_string(),
                    m.name,
                    m.calories,
                    m.protein,
                    m.carbs,
                    m.fats,
                    import_timestamp(&m.created_at),
                ],
            )? as i64;
        }

        for e in &data.water_events {
            validate_water(&NewWaterEvent {
                date: e.date,
                amount_ml: e.amount_ml,
            })
            .with_context(|| format!("Invalid water event in import: {}", e.uuid))?;
            summary.water_events_imported += tx.execute(
                "INSERT OR IGNORE INTO water_intake (uuid, date, amount_ml, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    import_uuid(&e.uuid),
                    e.date.format(DATE_FORMAT).to_string(),
                    e.amount_ml,
                    import_timestamp(&e.created_at),
                ],
            )? as i64;
        }

        self.save_profile(&data.profile)
            .context("Invalid profile in import")?;
        summary.profile_replaced = true;

        tx.commit()?;
        tracing::info!(
            workouts = summary.workouts_imported,
            meals = summary.meals_imported,
            water_events = summary.water_events_imported,
            "import complete"
        );
        Ok(summary)
    }
}

fn import_uuid(uuid: &str) -> String {
    if uuid.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        uuid.to_string()
    }
}

fn import_timestamp(created_at: &str) -> String {
    if created_at.is_empty() {
        Local::now().to_rfc3339()
    } else {
        created_at.to_string()
    }
}
