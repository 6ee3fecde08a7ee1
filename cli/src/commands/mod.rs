mod helpers;
mod import;
mod meal;
mod profile;
mod summary;
mod timer;
mod water;
mod workout;

pub(crate) use import::{cmd_export, cmd_import};
pub(crate) use meal::{cmd_meal_delete, cmd_meal_list, cmd_meal_log};
pub(crate) use profile::{cmd_profile_set, cmd_profile_show};
pub(crate) use summary::{cmd_stats, cmd_summary, cmd_week};
pub(crate) use timer::cmd_timer;
pub(crate) use water::{cmd_water_add, cmd_water_show};
pub(crate) use workout::{cmd_workout_delete, cmd_workout_list, cmd_workout_log};
