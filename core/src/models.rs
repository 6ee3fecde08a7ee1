use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fixed calorie-burn estimate applied when a workout is logged.
pub const CALORIES_PER_WORKOUT_MINUTE: i64 = 5;

/// Quick-add amounts offered for water logging.
pub const WATER_QUICK_ADD_ML: [i64; 4] = [250, 500, 750, 1000];

/// Smallest accepted daily calorie or water goal.
pub const MIN_DAILY_GOAL: i64 = 500;

/// Longest single workout: one full day.
pub const MAX_WORKOUT_MINUTES: i64 = 24 * 60;
/// Largest calorie value accepted for one meal or one stored burn estimate.
pub const MAX_ENTRY_CALORIES: i64 = 100_000;
/// Largest single water intake.
pub const MAX_WATER_ML: i64 = 100_000;

pub const DEFAULT_PROFILE_NAME: &str = "User";
pub const DEFAULT_CALORIE_GOAL: i64 = 2000;
pub const DEFAULT_WATER_GOAL_ML: i64 = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutEntry {
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    pub date: NaiveDate,
    pub exercise: String,
    pub duration_minutes: i64,
    pub calories_burned: i64,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealEntry {
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    pub date: NaiveDate,
    pub name: String,
    pub calories: i64,
    // Macros are stored but never computed; the logging path writes zero.
    #[serde(default)]
    pub protein: i64,
    #[serde(default)]
    pub carbs: i64,
    #[serde(default)]
    pub fats: i64,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaterEvent {
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    pub date: NaiveDate,
    pub amount_ml: i64,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub daily_calorie_goal: i64,
    pub daily_water_goal_ml: i64,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROFILE_NAME.to_string(),
            daily_calorie_goal: DEFAULT_CALORIE_GOAL,
            daily_water_goal_ml: DEFAULT_WATER_GOAL_ML,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewWorkoutEntry {
    pub date: NaiveDate,
    pub exercise: String,
    pub duration_minutes: i64,
}

impl NewWorkoutEntry {
    #[must_use]
    pub fn calories_burned(&self) -> i64 {
        estimate_calories_burned(self.duration_minutes)
    }
}

#[derive(Debug, Clone)]
pub struct NewMealEntry {
    pub date: NaiveDate,
    pub name: String,
    pub calories: i64,
}

#[derive(Debug, Clone)]
pub struct NewWaterEvent {
    pub date: NaiveDate,
    pub amount_ml: i64,
}

/// Rough burn estimate stored with each workout. Never recomputed after logging.
#[must_use]
pub fn estimate_calories_burned(duration_minutes: i64) -> i64 {
    duration_minutes.saturating_mul(CALORIES_PER_WORKOUT_MINUTE)
}

pub fn validate_workout(entry: &NewWorkoutEntry) -> Result<()> {
    if entry.exercise.trim().is_empty() {
        bail!("Exercise name must not be empty");
    }
    if entry.duration_minutes < 1 {
        bail!(
            "Workout duration must be at least 1 minute (got {})",
            entry.duration_minutes
        );
    }
    if entry.duration_minutes > MAX_WORKOUT_MINUTES {
        bail!(
            "Workout duration must be at most {MAX_WORKOUT_MINUTES} minutes (got {})",
            entry.duration_minutes
        );
    }
    Ok(())
}

pub fn validate_meal(entry: &NewMealEntry) -> Result<()> {
    if entry.name.trim().is_empty() {
        bail!("Meal name must not be empty");
    }
    if entry.calories < 0 {
        bail!("Calories must be non-negative (got {})", entry.calories);
    }
    if entry.calories > MAX_ENTRY_CALORIES {
        bail!(
            "Calories must be at most {MAX_ENTRY_CALORIES} (got {})",
            entry.calories
        );
    }
    Ok(())
}

pub fn validate_water(event: &NewWaterEvent) -> Result<()> {
    if event.amount_ml <= 0 {
        bail!("Water amount must be greater than 0 ml");
    }
    if event.amount_ml > MAX_WATER_ML {
        bail!(
            "Water amount must be at most {MAX_WATER_ML} ml (got {})",
            event.amount_ml
        );
    }
    Ok(())
}

pub fn validate_profile(profile: &UserProfile) -> Result<()> {
    if profile.name.trim().is_empty() {
        bail!("Profile name must not be empty");
    }
    if profile.daily_calorie_goal < MIN_DAILY_GOAL {
        bail!(
            "Daily calorie goal must be at least {MIN_DAILY_GOAL} (got {})",
            profile.daily_calorie_goal
        );
    }
    if profile.daily_water_goal_ml < MIN_DAILY_GOAL {
        bail!(
            "Daily water goal must be at least {MIN_DAILY_GOAL} ml (got {})",
            profile.daily_water_goal_ml
        );
    }
    Ok(())
}

// --- Export / Import types ---

pub const EXPORT_VERSION: i64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportData {
    pub version: i64,
    pub exported_at: String,
    pub profile: UserProfile,
    #[serde(default)]
    pub workouts: Vec<WorkoutEntry>,
    #[serde(default)]
    pub meals: Vec<MealEntry>,
    #[serde(default)]
    pub water_events: Vec<WaterEvent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    pub workouts_imported: i64,
    pub meals_imported: i64,
    pub water_events_imported: i64,
    pub profile_replaced: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn test_estimate_calories_burned() {
        assert_eq!(estimate_calories_burned(30), 150);
        assert_eq!(estimate_calories_burned(1), 5);
        assert_eq!(estimate_calories_burned(0), 0);
    }

    #[test]
    fn test_estimate_calories_burned_saturates() {
        assert_eq!(estimate_calories_burned(i64::MAX / 2), i64::MAX);
        assert_eq!(
            estimate_calories_burned(MAX_WORKOUT_MINUTES),
            MAX_WORKOUT_MINUTES * CALORIES_PER_WORKOUT_MINUTE
        );
    }

    #[test]
    fn test_new_workout_calories_burned() {
        let entry = NewWorkoutEntry {
            date: date(),
            exercise: "Rowing".to_string(),
            duration_minutes: 45,
        };
        assert_eq!(entry.calories_burned(), 225);
    }

    #[test]
    fn test_validate_workout() {
        let mut entry = NewWorkoutEntry {
            date: date(),
            exercise: "Run".to_string(),
            duration_minutes: 20,
        };
        assert!(validate_workout(&entry).is_ok());

        entry.duration_minutes = 0;
        assert!(validate_workout(&entry).is_err());

        entry.duration_minutes = 10;
        entry.exercise = "   ".to_string();
        assert!(validate_workout(&entry).is_err());
    }

    #[test]
    fn test_validate_workout_upper_bound() {
        let mut entry = NewWorkoutEntry {
            date: date(),
            exercise: "Ultra".to_string(),
            duration_minutes: MAX_WORKOUT_MINUTES,
        };
        assert!(validate_workout(&entry).is_ok());
        assert!(entry.calories_burned() <= MAX_ENTRY_CALORIES);

        entry.duration_minutes = MAX_WORKOUT_MINUTES + 1;
        assert!(validate_workout(&entry).is_err());

        entry.duration_minutes = i64::MAX / 2;
        assert!(validate_workout(&entry).is_err());
    }

    #[test]
    fn test_validate_meal() {
        let mut entry = NewMealEntry {
            date: date(),
            name: "Oatmeal".to_string(),
            calories: 0,
        };
        assert!(validate_meal(&entry).is_ok());

        entry.calories = -1;
        assert!(validate_meal(&entry).is_err());

        entry.calories = 300;
        entry.name = String::new();
        assert!(validate_meal(&entry).is_err());

        entry.name = "Feast".to_string();
        entry.calories = MAX_ENTRY_CALORIES;
        assert!(validate_meal(&entry).is_ok());
        entry.calories = MAX_ENTRY_CALORIES + 1;
        assert!(validate_meal(&entry).is_err());
        entry.calories = i64::MAX;
        assert!(validate_meal(&entry).is_err());
    }

    #[test]
    fn test_validate_water_accepts_arbitrary_positive() {
        for amount in WATER_QUICK_ADD_ML {
            assert!(
                validate_water(&NewWaterEvent {
                    date: date(),
                    amount_ml: amount
                })
                .is_ok()
            );
        }
        assert!(
            validate_water(&NewWaterEvent {
                date: date(),
                amount_ml: 333
            })
            .is_ok()
        );
        assert!(
            validate_water(&NewWaterEvent {
                date: date(),
                amount_ml: 0
            })
            .is_err()
        );
        assert!(
            validate_water(&NewWaterEvent {
                date: date(),
                amount_ml: MAX_WATER_ML
            })
            .is_ok()
        );
        assert!(
            validate_water(&NewWaterEvent {
                date: date(),
                amount_ml: MAX_WATER_ML + 1
            })
            .is_err()
        );
    }

    #[test]
    fn test_validate_profile() {
        assert!(validate_profile(&UserProfile::default()).is_ok());

        let low_calories = UserProfile {
            daily_calorie_goal: 499,
            ..UserProfile::default()
        };
        assert!(validate_profile(&low_calories).is_err());

        let low_water = UserProfile {
            daily_water_goal_ml: 100,
            ..UserProfile::default()
        };
        assert!(validate_profile(&low_water).is_err());

        // Multiples of 100 are a UI convention only
        let odd_water = UserProfile {
            daily_water_goal_ml: 2150,
            ..UserProfile::default()
        };
        assert!(validate_profile(&odd_water).is_ok());
    }

    #[test]
    fn test_default_profile() {
        let p = UserProfile::default();
        assert_eq!(p.name, "User");
        assert_eq!(p.daily_calorie_goal, 2000);
        assert_eq!(p.daily_water_goal_ml, 2000);
    }

    #[test]
    fn test_entry_date_serializes_as_plain_day() {
        let entry = WaterEvent {
            id: 1,
            uuid: "u".to_string(),
            date: date(),
            amount_ml: 250,
            created_at: String::new(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["date"], "2024-06-15");
    }
}
