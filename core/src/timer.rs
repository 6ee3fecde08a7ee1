//! Workout stopwatch.
//!
//! The timer counts whole seconds delivered by a [`TickScheduler`] rather than
//! reading the wall clock, so tests can drive it with [`ManualScheduler`] and
//! the CLI can drive it with a tokio interval.
//!
//! A timer owns at most one ticker at a time. Stopping or resetting drops the
//! ticker, and every tick re-checks the run epoch under the state lock, so no
//! increment lands after `stop` or `reset` has returned.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Callback invoked once per tick.
pub type TickFn = Box<dyn FnMut() + Send + 'static>;

/// Source of periodic ticks. The returned ticker cancels the tick source when
/// dropped.
pub trait TickScheduler {
    type Ticker;

    fn start(&self, on_tick: TickFn) -> Self::Ticker;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerSnapshot {
    pub running: bool,
    pub elapsed_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TimerEvent {
    Started,
    Stopped { elapsed_seconds: u64 },
}

#[derive(Debug, Default)]
struct TimerState {
    running: bool,
    elapsed_seconds: u64,
    // Bumped on every start/stop/reset; ticks from an older run are ignored.
    epoch: u64,
}

fn lock(state: &Mutex<TimerState>) -> MutexGuard<'_, TimerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct WorkoutTimer<S: TickScheduler> {
    state: Arc<Mutex<TimerState>>,
    scheduler: S,
    ticker: Option<S::Ticker>,
}

impl<S: TickScheduler> WorkoutTimer<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            state: Arc::new(Mutex::new(TimerState::default())),
            scheduler,
            ticker: None,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> TimerSnapshot {
        let state = lock(&self.state);
        TimerSnapshot {
            running: state.running,
            elapsed_seconds: state.elapsed_seconds,
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        lock(&self.state).running
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        lock(&self.state).elapsed_seconds
    }

    /// Whole minutes elapsed, as reported when a session completes.
    #[must_use]
    pub fn completed_minutes(&self) -> u64 {
        self.elapsed_seconds() / 60
    }

    /// Start counting. Returns `false` (and does nothing) if already running.
    pub fn start(&mut self) -> bool {
        let epoch = {
            let mut state = lock(&self.state);
            if state.running {
                return false;
            }
            state.running = true;
            state.epoch = state.epoch.wrapping_add(1);
            state.epoch
        };

        let shared = Arc::clone(&self.state);
        let ticker = self.scheduler.start(Box::new(move || {
            let mut state = lock(&shared);
            if state.running && state.epoch == epoch {
                state.elapsed_seconds = state.elapsed_seconds.saturating_add(1);
            }
        }));
        self.ticker = Some(ticker);
        tracing::debug!("workout timer started");
        true
    }

    /// Stop counting. Returns the final elapsed seconds, or `None` if the
    /// timer was not running.
    pub fn stop(&mut self) -> Option<u64> {
        let elapsed = {
            let mut state = lock(&self.state);
            if !state.running {
                return None;
            }
            state.running = false;
            state.epoch = state.epoch.wrapping_add(1);
            state.elapsed_seconds
        };
        self.ticker = None;
        tracing::debug!(elapsed_seconds = elapsed, "workout timer stopped");
        Some(elapsed)
    }

    /// Single start/stop button: stops when running, starts when idle.
    pub fn toggle(&mut self) -> TimerEvent {
        match self.stop() {
            Some(elapsed_seconds) => TimerEvent::Stopped { elapsed_seconds },
            None => {
                self.start();
                TimerEvent::Started
            }
        }
    }

    /// Cancel any running tick source and zero the counter.
    pub fn reset(&mut self) {
        {
            let mut state = lock(&self.state);
            state.running = false;
            state.elapsed_seconds = 0;
            state.epoch = state.epoch.wrapping_add(1);
        }
        self.ticker = None;
    }
}

/// Render elapsed seconds as `MM:SS`. Minutes are not wrapped into hours.
#[must_use]
pub fn format_elapsed(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

// --- Schedulers ---

/// Ticks from a tokio interval task.
#[derive(Debug, Clone)]
pub struct IntervalScheduler {
    handle: Handle,
    period: Duration,
}

impl IntervalScheduler {
    pub const DEFAULT_PERIOD: Duration = Duration::from_secs(1);

    #[must_use]
    pub fn new(handle: Handle, period: Duration) -> Self {
        Self { handle, period }
    }

    /// Scheduler on the current tokio runtime with a one-second period.
    pub fn current() -> Result<Self> {
        let handle = Handle::try_current().context("Workout timer needs a tokio runtime")?;
        Ok(Self::new(handle, Self::DEFAULT_PERIOD))
    }
}

pub struct IntervalTicker {
    task: JoinHandle<()>,
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl TickScheduler for IntervalScheduler {
    type Ticker = IntervalTicker;

    fn start(&self, mut on_tick: TickFn) -> IntervalTicker {
        let period = self.period;
        let task = self.handle.spawn(async move {
            // First tick one full period after start, not immediately
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                interval.tick().await;
                on_tick();
            }
        });
        IntervalTicker { task }
    }
}

#[derive(Default)]
struct ManualInner {
    next_id: u64,
    active: Vec<(u64, TickFn)>,
}

/// Scheduler whose ticks are delivered by calling [`ManualScheduler::advance`].
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualInner>>,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `ticks` ticks to every active ticker.
    pub fn advance(&self, ticks: u32) {
        for _ in 0..ticks {
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            for (_, on_tick) in &mut inner.active {
                on_tick();
            }
        }
    }

    #[must_use]
    pub fn active_tickers(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .active
            .len()
    }
}

pub struct ManualTicker {
    id: u64,
    inner: Arc<Mutex<ManualInner>>,
}

impl Drop for ManualTicker {
    fn drop(&mut self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.active.retain(|(id, _)| *id != self.id);
    }
}

impl TickScheduler for ManualScheduler {
    type Ticker = ManualTicker;

    fn start(&self, on_tick: TickFn) -> ManualTicker {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.active.push((id, on_tick));
        ManualTicker {
            id,
            inner: Arc::clone(&self.inner),
        }
    }
}
