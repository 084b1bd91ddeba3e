use std::fmt;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use crate::errors::ShiftError;

// @module: Timestamps, deltas and shift arithmetic

const MS_PER_SECOND: i64 = 1000;
const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 3600;

/// Largest magnitude accepted for the millisecond component of a delta
pub const MAX_DELTA_MS: i64 = 999;

// @const: SRT timing line regex, eight signed integer fields
// Whitespace may precede each number and surround the arrow; anything after
// the end timestamp (position coordinates) is ignored.
static TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^\s*([+-]?\d+):\s*([+-]?\d+):\s*([+-]?\d+),\s*([+-]?\d+)",
        r"\s*-->",
        r"\s*([+-]?\d+):\s*([+-]?\d+):\s*([+-]?\d+),\s*([+-]?\d+)",
    ))
    .expect("timing regex is valid")
});

/// Signed adjustment applied uniformly to every cue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeDelta {
    ms: i32,
    s: i32,
    m: i32,
    h: i32,
    count: i32,
}

impl TimeDelta {
    /// Build a delta, rejecting milliseconds outside [-999, 999]
    pub fn new(ms: i32, s: i32, m: i32, h: i32, count: i32) -> Result<Self, ShiftError> {
        if !(-MAX_DELTA_MS..=MAX_DELTA_MS).contains(&i64::from(ms)) {
            return Err(ShiftError::DeltaOutOfRange { value: i64::from(ms) });
        }
        Ok(Self { ms, s, m, h, count })
    }

    /// Delta that only moves times by whole seconds
    pub fn seconds(s: i32) -> Self {
        Self { s, ..Self::default() }
    }

    /// Delta that only renumbers cues
    pub fn count(count: i32) -> Self {
        Self { count, ..Self::default() }
    }

    pub fn ms(&self) -> i64 {
        i64::from(self.ms)
    }

    pub fn s(&self) -> i64 {
        i64::from(self.s)
    }

    pub fn m(&self) -> i64 {
        i64::from(self.m)
    }

    pub fn h(&self) -> i64 {
        i64::from(self.h)
    }

    pub fn index_offset(&self) -> i64 {
        i64::from(self.count)
    }

    /// Field-wise sum of two deltas, validated like any other delta
    pub fn combine(&self, other: &TimeDelta) -> Result<Self, ShiftError> {
        let sum = |a: i32, b: i32| {
            a.checked_add(b)
                .ok_or_else(|| ShiftError::Config(format!("delta sum {} + {} overflows", a, b)))
        };
        Self::new(
            sum(self.ms, other.ms)?,
            sum(self.s, other.s)?,
            sum(self.m, other.m)?,
            sum(self.h, other.h)?,
            sum(self.count, other.count)?,
        )
    }

    /// True when applying this delta leaves every line unchanged
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for TimeDelta {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:+}h {:+}m {:+}s {:+}ms, count {:+}",
            self.h, self.m, self.s, self.ms, self.count
        )
    }
}

/// What to do with a shifted timestamp that falls before zero
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NegativeTimePolicy {
    /// Write negative components as they come out of the arithmetic
    #[default]
    Keep,
    /// Pin the timestamp to 00:00:00,000
    Clamp,
    /// Abort the run
    Reject,
}

/// Point on the subtitle timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timestamp {
    pub h: i64,
    pub m: i64,
    pub s: i64,
    pub ms: i64,
}

impl Timestamp {
    pub fn new(h: i64, m: i64, s: i64, ms: i64) -> Self {
        Self { h, m, s, ms }
    }

    /// Signed total in milliseconds
    pub fn total_millis(&self) -> i64 {
        (self.h * SECONDS_PER_HOUR + self.m * SECONDS_PER_MINUTE + self.s) * MS_PER_SECOND + self.ms
    }

    pub fn is_negative(&self) -> bool {
        self.total_millis() < 0
    }

    /// Apply `delta` with carry and borrow between fields
    ///
    /// Milliseconds always end in [0, 999]. Hours, minutes and seconds come
    /// from truncating division of the total seconds, so a total below zero
    /// yields negative components rather than wrapping.
    pub fn adjust(&self, delta: &TimeDelta) -> Timestamp {
        let total_ms = delta.ms() + self.ms;
        let mut total_seconds = (delta.h() + self.h) * SECONDS_PER_HOUR
            + (delta.m() + self.m) * SECONDS_PER_MINUTE
            + (delta.s() + self.s);

        total_seconds += total_ms.div_euclid(MS_PER_SECOND);
        let ms = total_ms.rem_euclid(MS_PER_SECOND);

        let h = total_seconds / SECONDS_PER_HOUR;
        let m = (total_seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
        let s = total_seconds - m * SECONDS_PER_MINUTE - h * SECONDS_PER_HOUR;

        Timestamp { h, m, s, ms }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02},{:03}", self.h, self.m, self.s, self.ms)
    }
}

/// Start and end of one cue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueInterval {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl CueInterval {
    /// Parse a `H:M:S,ms --> H:M:S,ms` line, `None` if any field is missing
    pub fn parse(line: &str) -> Option<Self> {
        let caps = TIMING_REGEX.captures(line)?;
        let mut fields = [0i64; 8];
        for (i, field) in fields.iter_mut().enumerate() {
            *field = i64::from(caps.get(i + 1)?.as_str().parse::<i32>().ok()?);
        }
        Some(Self {
            start: Timestamp::new(fields[0], fields[1], fields[2], fields[3]),
            end: Timestamp::new(fields[4], fields[5], fields[6], fields[7]),
        })
    }

    /// Shift both ends and apply the negative-time policy
    ///
    /// Returns the offending timestamp when the policy is `Reject`.
    pub fn shifted(&self, delta: &TimeDelta, policy: NegativeTimePolicy) -> Result<Self, Timestamp> {
        Ok(Self {
            start: apply_policy(self.start.adjust(delta), policy)?,
            end: apply_policy(self.end.adjust(delta), policy)?,
        })
    }
}

impl fmt::Display for CueInterval {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} --> {}", self.start, self.end)
    }
}

fn apply_policy(ts: Timestamp, policy: NegativeTimePolicy) -> Result<Timestamp, Timestamp> {
    if !ts.is_negative() {
        return Ok(ts);
    }
    match policy {
        NegativeTimePolicy::Keep => Ok(ts),
        NegativeTimePolicy::Clamp => Ok(Timestamp::default()),
        NegativeTimePolicy::Reject => Err(ts),
    }
}
