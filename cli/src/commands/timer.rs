use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;
use tokio::sync::oneshot;

use fitlog_core::models::{NewWorkoutEntry, WorkoutEntry};
use fitlog_core::service::FitlogService;
use fitlog_core::timer::{IntervalScheduler, TickScheduler, WorkoutTimer, format_elapsed};

use super::helpers::parse_date;

const REDRAW_PERIOD: Duration = Duration::from_millis(250);

#[derive(Serialize)]
struct TimerSession {
    elapsed_seconds: u64,
    elapsed: String,
    completed_minutes: u64,
    workout: Option<WorkoutEntry>,
}

pub(crate) async fn cmd_timer(
    svc: &FitlogService,
    log: Option<String>,
    date: Option<String>,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    let date = parse_date(date, today)?;
    let mut timer = WorkoutTimer::new(IntervalScheduler::current()?);
    timer.start();
    if !json {
        eprintln!("Timer running. Press Enter or Ctrl-C to stop.");
    }

    wait_for_stop(&timer, !json).await?;

    let elapsed_seconds = timer.stop().unwrap_or_else(|| timer.elapsed_seconds());
    let completed_minutes = timer.completed_minutes();
    if !json {
        eprintln!();
    }

    let workout = match log.as_deref() {
        Some(exercise) => match session_workout(exercise, elapsed_seconds, date) {
            Some(entry) => Some(svc.log_workout(&entry)?),
            None => {
                if !json {
                    eprintln!("Session shorter than a minute; nothing logged.");
                }
                None
            }
        },
        None => None,
    };

    if json {
        let session = TimerSession {
            elapsed_seconds,
            elapsed: format_elapsed(elapsed_seconds),
            completed_minutes,
            workout,
        };
        println!("{}", serde_json::to_string_pretty(&session)?);
    } else {
        println!(
            "Workout completed: {completed_minutes} minutes ({})",
            format_elapsed(elapsed_seconds)
        );
        if let Some(w) = workout {
            println!(
                "Logged {} for {} min (~{} cal burned) [id {}]",
                w.exercise, w.duration_minutes, w.calories_burned, w.id
            );
        }
    }
    Ok(())
}

/// The workout to store for a finished session, if it lasted a whole minute.
fn session_workout(exercise: &str, elapsed_seconds: u64, date: NaiveDate) -> Option<NewWorkoutEntry> {
    let minutes = i64::try_from(elapsed_seconds / 60).ok()?;
    (minutes >= 1).then(|| NewWorkoutEntry {
        date,
        exercise: exercise.to_string(),
        duration_minutes: minutes,
    })
}

/// Redraw the elapsed time until Enter, end of input or Ctrl-C.
async fn wait_for_stop<S: TickScheduler>(timer: &WorkoutTimer<S>, render: bool) -> Result<()> {
    let mut enter = spawn_enter_listener();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut redraw = tokio::time::interval(REDRAW_PERIOD);

    loop {
        tokio::select! {
            _ = redraw.tick() => {
                if render {
                    eprint!("\r  {}", format_elapsed(timer.elapsed_seconds()));
                    std::io::stderr().flush()?;
                }
            }
            _ = &mut enter => return Ok(()),
            res = &mut ctrl_c => {
                res.context("Failed to listen for Ctrl-C")?;
                return Ok(());
            }
        }
    }
}

// Blocking stdin read on a plain thread so the runtime can shut down without it.
fn spawn_enter_listener() -> oneshot::Receiver<()> {
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
        let _ = tx.send(());
    });
    rx
}
