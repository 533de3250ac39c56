// src/core/time.rs
//
// Session-relative microsecond timeline: epoch is monitoring start, not
// 1970, and the unit is a timestamp naming the sample *center* instant
// rather than a raw duration.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Sample interval for 160 Hz EEG acquisition, in microseconds.
pub const EEG_SAMPLE_INTERVAL_US: i64 = 6_250;

/// A single clock domain. Reserved for future device-clock support; today
/// every timestamped record in the core carries `Host` and mixing records
/// across domains is refused at the call site that would need to compare
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClockDomain {
    Host,
}

/// A session-relative microsecond timestamp. Never negative once a
/// session has started; names the center instant of the sample it is
/// attached to, never its start or end (see spec invariant 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimestampUs(pub i64);

impl TimestampUs {
    pub const ZERO: TimestampUs = TimestampUs(0);

    pub fn new(us: i64) -> Self {
        TimestampUs(us)
    }

    pub fn as_i64(self) -> i64 {
        self.0
    }

    pub fn add_us(self, delta: i64) -> Self {
        TimestampUs(self.0 + delta)
    }

    pub fn saturating_sub(self, other: TimestampUs) -> i64 {
        self.0.saturating_sub(other.0)
    }
}

/// Monotonic wall-clock microseconds since the Unix epoch. Used only to
/// anchor session start and the playback clock's wall reference; never
/// stored on a sample.
pub fn utc_us_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_micros() as i64
}

/// A session clock: hands out monotonically non-decreasing
/// `TimestampUs` values relative to the instant it was created. Used by
/// acquisition to stamp incoming samples; one per monitoring session.
pub struct SessionClock {
    anchor_us: i64,
    last: AtomicI64,
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            anchor_us: utc_us_now(),
            last: AtomicI64::new(i64::MIN),
        }
    }

    /// Stamp "now" relative to session start. Clamps to be strictly
    /// non-decreasing relative to the previous call, per invariant 1 —
    /// a wall-clock hiccup must never produce a timeline regression.
    pub fn now(&self) -> TimestampUs {
        let raw = utc_us_now() - self.anchor_us;
        let clamped = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
                Some(raw.max(prev))
            })
            .unwrap_or(raw);
        TimestampUs(clamped.max(raw))
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}
