use crate::format::{self, DurationFormatter};
use chrono::TimeDelta;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt::{Debug, Display, Formatter};

/// Extra context attached to a lap by the caller.
pub type LapData = Map<String, Value>;

/// One completed interval of a [`Stopwatch`](crate::Stopwatch).
#[derive(Clone)]
pub struct Lap {
    state: String,
    duration: TimeDelta,
    data: Option<LapData>,
    formatter: DurationFormatter,
}

impl Lap {
    pub(crate) fn new(
        state: String,
        duration: TimeDelta,
        data: Option<LapData>,
        formatter: DurationFormatter,
    ) -> Self {
        Self {
            state,
            duration,
            data,
            formatter,
        }
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn duration(&self) -> TimeDelta {
        self.duration
    }

    pub fn data(&self) -> Option<&LapData> {
        self.data.as_ref()
    }

    /// The duration rendered with the formatter captured when the lap was recorded.
    pub fn formatted(&self) -> String {
        (self.formatter)(self.duration)
    }

    pub fn milliseconds(&self) -> f64 {
        format::as_millis(self.duration)
    }
}

impl Debug for Lap {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lap")
            .field("state", &self.state)
            .field("duration", &self.duration)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

impl Serialize for Lap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = if self.data.is_some() { 3 } else { 2 };
        let mut lap = serializer.serialize_struct("Lap", fields)?;

        lap.serialize_field("state", &self.state)?;
        lap.serialize_field("time", &self.formatted())?;
        if let Some(data) = &self.data {
            lap.serialize_field("data", data)?;
        }

        lap.end()
    }
}

impl Display for Lap {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
        f.write_str(&text)
    }
}
