use crate::format::{self, DurationFormatter, FormattingMode};
use crate::lap::{Lap, LapData};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Serialize, Serializer};
use serde_json::value::RawValue;
use serde_json::Value;
use std::fmt::{Debug, Display, Formatter};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A wall-clock stopwatch that records named laps.
///
/// All operations take `&self`; the state sits behind a single reader/writer
/// lock, so a stopwatch can be shared between threads through an `Arc`.
///
/// Time comes from the system clock. Adjusting the clock while the stopwatch
/// runs shows up directly in the measured durations.
pub struct Stopwatch {
    state: RwLock<State>,
}

struct State {
    start: DateTime<Utc>,
    // None while counting.
    stop: Option<DateTime<Utc>>,
    // Elapsed time at the end of the most recent lap.
    mark: TimeDelta,
    laps: Vec<Lap>,
    formatter: DurationFormatter,
    mode: FormattingMode,
}

impl State {
    fn restart(&mut self, now: DateTime<Utc>, offset: TimeDelta, active: bool) {
        self.start = shift(now, -offset);
        self.stop = if active { None } else { Some(now) };
        self.mark = TimeDelta::zero();
        self.laps.clear();
    }

    fn is_active(&self) -> bool {
        self.stop.is_none()
    }

    fn elapsed_time_from(&self, now: DateTime<Utc>) -> TimeDelta {
        match self.stop {
            None => now - self.start,
            Some(stop) => stop - self.start,
        }
    }
}

impl Debug for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("start", &self.start)
            .field("stop", &self.stop)
            .field("mark", &self.mark)
            .field("laps", &self.laps)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new(TimeDelta::zero(), true)
    }
}

impl Stopwatch {
    /// Creates a stopwatch whose elapsed time already includes `offset`.
    ///
    /// A negative offset moves the start into the future, so the elapsed time
    /// counts up from below zero. An inactive stopwatch is frozen at `offset`
    /// until [`start`](Self::start) is called.
    pub fn new(offset: TimeDelta, active: bool) -> Self {
        let now = Utc::now();
        let mut state = State {
            start: now,
            stop: None,
            mark: TimeDelta::zero(),
            laps: Vec::new(),
            formatter: format::default_formatter(),
            mode: FormattingMode::default(),
        };
        state.restart(now, offset, active);

        Self {
            state: RwLock::new(state),
        }
    }

    /// Re-use the stopwatch as if it was just created. The formatter and the
    /// formatting mode are kept.
    pub fn reset(&self, offset: TimeDelta, active: bool) {
        let now = Utc::now();
        let mut state = self.write();

        state.restart(now, offset, active);

        tracing::debug!(%offset, active, "reset stopwatch");
    }

    /// Resumes counting. The time spent stopped is not counted.
    pub fn start(&self) {
        let mut state = self.write();

        if let Some(stop) = state.stop.take() {
            let paused = Utc::now() - stop;
            state.start = shift(state.start, paused);

            tracing::debug!(%paused, "resumed stopwatch");
        }
    }

    pub fn stop(&self) {
        let mut state = self.write();

        if state.is_active() {
            let now = Utc::now();
            state.stop = Some(now);

            tracing::debug!(elapsed = %state.elapsed_time_from(now), "stopped stopwatch");
        }
    }

    pub fn is_active(&self) -> bool {
        self.read().is_active()
    }

    pub fn elapsed_time(&self) -> TimeDelta {
        self.elapsed_time_from(Utc::now())
    }

    /// Elapsed time as of `now`. A stopped stopwatch ignores `now`.
    pub fn elapsed_time_from(&self, now: DateTime<Utc>) -> TimeDelta {
        self.read().elapsed_time_from(now)
    }

    /// Time since the last lap, without recording one.
    pub fn lap_time(&self) -> TimeDelta {
        let now = Utc::now();
        let state = self.read();

        state.elapsed_time_from(now) - state.mark
    }

    pub fn lap(&self, state: impl Into<String>) -> Lap {
        self.lap_with_data(state, None)
    }

    pub fn lap_with_data(&self, state: impl Into<String>, data: Option<LapData>) -> Lap {
        self.lap_with_data_and_time(Utc::now(), state, data)
    }

    /// Ends the current lap at `now` and returns it.
    ///
    /// Timestamps older than the previous lap are accepted and yield a
    /// negative duration.
    pub fn lap_with_data_and_time(
        &self,
        now: DateTime<Utc>,
        state: impl Into<String>,
        data: Option<LapData>,
    ) -> Lap {
        let mut guard = self.write();

        let elapsed = guard.elapsed_time_from(now);
        let lap = Lap::new(
            state.into(),
            elapsed - guard.mark,
            data,
            Arc::clone(&guard.formatter),
        );

        guard.mark = elapsed;
        guard.laps.push(lap.clone());

        tracing::trace!(state = lap.state(), duration = %lap.duration(), "recorded lap");

        lap
    }

    pub fn laps(&self) -> Vec<Lap> {
        self.read().laps.clone()
    }

    /// Replaces the duration formatter. Laps recorded earlier keep theirs.
    pub fn set_formatter<F>(&self, formatter: F)
    where
        F: Fn(TimeDelta) -> String + Send + Sync + 'static,
    {
        self.write().formatter = Arc::new(formatter);
    }

    pub fn set_formatting_mode(&self, mode: FormattingMode) {
        self.write().mode = mode;
    }

    pub fn formatting_mode(&self) -> FormattingMode {
        self.read().mode
    }

    /// The rendering as UTF-8 bytes, for writers that want raw JSON.
    pub fn to_json_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    // Writers never leave the state half-updated, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Debug for Stopwatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stopwatch")
            .field("state", &*self.read())
            .finish()
    }
}

impl Display for Stopwatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.read();

        match state.mode {
            FormattingMode::JsonArray => {
                f.write_str("[")?;
                for (index, lap) in state.laps.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{lap}")?;
                }
                f.write_str("]")
            }
            FormattingMode::JsonObject => write_object(f, &state.laps, |lap| {
                Value::String(lap.formatted()).to_string()
            }),
            FormattingMode::JsonObjectMs => {
                write_object(f, &state.laps, |lap| format!("{:.3}", lap.milliseconds()))
            }
        }
    }
}

// Repeated labels are written as repeated keys.
fn write_object(
    f: &mut Formatter<'_>,
    laps: &[Lap],
    value: impl Fn(&Lap) -> String,
) -> std::fmt::Result {
    f.write_str("{")?;
    for (index, lap) in laps.iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}:{}", Value::from(lap.state()), value(lap))?;
    }
    f.write_str("}")
}

/// Embeds the rendering as raw JSON instead of a quoted string.
impl Serialize for Stopwatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = RawValue::from_string(self.to_string()).map_err(serde::ser::Error::custom)?;
        raw.serialize(serializer)
    }
}

fn shift(at: DateTime<Utc>, by: TimeDelta) -> DateTime<Utc> {
    at.checked_add_signed(by).unwrap_or(if by < TimeDelta::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}
