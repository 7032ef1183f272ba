use chrono::TimeDelta;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

/// Renders a single duration as text. Laps keep the handle that was current
/// when they were recorded.
pub type DurationFormatter = Arc<dyn Fn(TimeDelta) -> String + Send + Sync>;

pub fn default_formatter() -> DurationFormatter {
    Arc::new(human)
}

/// How a whole stopwatch renders its laps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FormattingMode {
    /// `[{"state":"a","time":"10ms"}, ...]`, one object per lap including its data.
    #[default]
    JsonArray,
    /// `{"a":"10ms", "b":"20ms"}`. Lap data is dropped.
    JsonObject,
    /// `{"a":10.000, "b":20.000}` in milliseconds. Lap data is dropped.
    JsonObjectMs,
}

impl FormattingMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            FormattingMode::JsonArray => "JSON_ARRAY",
            FormattingMode::JsonObject => "JSON_OBJECT",
            FormattingMode::JsonObjectMs => "JSON_OBJECT_MS",
        }
    }
}

impl Display for FormattingMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for FormattingMode {
    fn from(value: &str) -> Self {
        match value {
            "JSON_OBJECT" => FormattingMode::JsonObject,
            "JSON_OBJECT_MS" => FormattingMode::JsonObjectMs,
            _ => FormattingMode::JsonArray,
        }
    }
}

// Unknown tags fall back to the array mode instead of failing.
impl FromStr for FormattingMode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FormattingMode::from(s))
    }
}

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Compact unit form: `0s`, `750ns`, `1.5µs`, `10ms`, `2.25s`, `1m30s`, `1h0m0s`.
pub fn human(duration: TimeDelta) -> String {
    let (sign, nanos) = split_sign(duration);

    if nanos == 0 {
        return String::from("0s");
    }

    if nanos < NANOS_PER_MICRO {
        return format!("{sign}{nanos}ns");
    }

    if nanos < NANOS_PER_MILLI {
        return format!("{sign}{}µs", fraction(nanos, NANOS_PER_MICRO));
    }

    if nanos < NANOS_PER_SECOND {
        return format!("{sign}{}ms", fraction(nanos, NANOS_PER_MILLI));
    }

    let total_secs = nanos / NANOS_PER_SECOND;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = fraction(nanos % (60 * NANOS_PER_SECOND), NANOS_PER_SECOND);

    if hours > 0 {
        format!("{sign}{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{sign}{minutes}m{seconds}s")
    } else {
        format!("{sign}{seconds}s")
    }
}

/// Format as "HH:MM:SS.cs" (centiseconds)
pub fn clock(duration: TimeDelta) -> String {
    let (sign, nanos) = split_sign(duration);
    let centis = nanos / (10 * NANOS_PER_MILLI);
    let total_secs = centis / 100;
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;
    format!("{sign}{:02}:{:02}:{:02}.{:02}", h, m, s, centis % 100)
}

/// Milliseconds with three decimals, e.g. `1234.567ms`.
pub fn millis(duration: TimeDelta) -> String {
    format!("{:.3}ms", as_millis(duration))
}

/// Whole microseconds expressed as fractional milliseconds.
pub fn as_millis(duration: TimeDelta) -> f64 {
    match duration.num_microseconds() {
        Some(micros) => micros as f64 / 1000.0,
        None => duration.num_milliseconds() as f64,
    }
}

fn split_sign(duration: TimeDelta) -> (&'static str, u128) {
    let nanos = i128::from(duration.num_seconds()) * NANOS_PER_SECOND as i128
        + i128::from(duration.subsec_nanos());
    let sign = if nanos < 0 { "-" } else { "" };

    (sign, nanos.unsigned_abs())
}

// Renders `value / unit` with the remainder as trailing-zero-trimmed decimals.
fn fraction(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let remainder = value % unit;

    if remainder == 0 {
        return whole.to_string();
    }

    let width = unit.ilog10() as usize;
    let digits = format!("{remainder:0width$}");

    format!("{whole}.{}", digits.trim_end_matches('0'))
}
