//! # Interval Accumulator
//!
//! Pause bookkeeping for a single ticket and the net active duration
//! derived from it.
//!
//! ## Net Duration
//! ```text
//!  entry                                                        now
//!    │◄──── active ────►│◄─ pause ─►│◄── active ──►│◄─ pause (open) ─►│
//!    ├──────────────────┼───────────┼──────────────┼──────────────────┤
//!                       start       end            start
//!
//!  net = (now − entry) − Σ closed spans − (now − open start)
//! ```
//!
//! ## Invariants
//! - At most one interval is open, and it is always the last one
//! - Intervals are ordered by start and never overlap
//! - Intervals are never removed

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Pause Interval
// =============================================================================

/// One contiguous span during which a ticket accrued no billable time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PauseInterval {
    #[ts(as = "String")]
    pub start: DateTime<Utc>,

    /// `None` while the pause is still running.
    #[ts(as = "Option<String>")]
    pub end: Option<DateTime<Utc>>,
}

impl PauseInterval {
    #[inline]
    pub const fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Length of the pause; an open pause is measured up to `now`.
    pub fn span(&self, now: DateTime<Utc>) -> Duration {
        self.end.unwrap_or(now) - self.start
    }
}

// =============================================================================
// Duration Anomaly
// =============================================================================

/// Raised when the raw net duration comes out negative.
///
/// Only possible with skewed clocks between the hosts that recorded the
/// timestamps. The duration is clamped to zero and billing continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NegativeDurationAnomaly {
    /// The unclamped result, in seconds (always negative).
    pub raw_seconds: i64,
}

/// Result of [`PauseLog::net_active_duration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetDuration {
    /// Billable time, never negative.
    pub active: Duration,
    pub anomaly: Option<NegativeDurationAnomaly>,
}

impl NetDuration {
    pub fn whole_minutes(&self) -> i64 {
        self.active.num_minutes()
    }
}

// =============================================================================
// Pause Log
// =============================================================================

/// The ordered pause history of one ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PauseLog {
    intervals: Vec<PauseInterval>,
}

impl PauseLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a log from persisted intervals, checking every invariant.
    pub fn from_intervals(intervals: Vec<PauseInterval>) -> CoreResult<Self> {
        let last = intervals.len().saturating_sub(1);

        for (i, interval) in intervals.iter().enumerate() {
            match interval.end {
                None if i != last => {
                    return Err(inconsistent("only the latest pause may be open"));
                }
                Some(end) if end < interval.start => {
                    return Err(inconsistent("pause ends before it starts"));
                }
                _ => {}
            }
        }

        for pair in intervals.windows(2) {
            // The first of any pair is closed, checked above.
            if let Some(end) = pair[0].end {
                if pair[1].start < end {
                    return Err(inconsistent("pauses overlap or are out of order"));
                }
            }
        }

        Ok(PauseLog { intervals })
    }

    pub fn intervals(&self) -> &[PauseInterval] {
        &self.intervals
    }

    pub fn into_intervals(self) -> Vec<PauseInterval> {
        self.intervals
    }

    /// The running pause, if any.
    pub fn open_interval(&self) -> Option<&PauseInterval> {
        self.intervals.last().filter(|i| i.is_open())
    }

    pub fn is_paused(&self) -> bool {
        self.open_interval().is_some()
    }

    /// Latest timestamp recorded in the log.
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.intervals.last().map(|i| i.end.unwrap_or(i.start))
    }

    /// Starts a pause at `now`.
    ///
    /// ## Errors
    /// - `AlreadyPaused` if a pause is running (the log is left untouched)
    /// - `InvalidTimestamp` if `now` precedes the end of the previous pause
    pub fn open_pause(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        if self.is_paused() {
            return Err(CoreError::AlreadyPaused);
        }

        if let Some(previous_end) = self.latest_timestamp() {
            if now < previous_end {
                return Err(CoreError::InvalidTimestamp {
                    at: now,
                    earliest: previous_end,
                });
            }
        }

        self.intervals.push(PauseInterval {
            start: now,
            end: None,
        });
        Ok(())
    }

    /// Ends the running pause at `now`.
    ///
    /// ## Errors
    /// - `NotPaused` if no pause is running
    /// - `InvalidTimestamp` if `now` precedes the pause start
    pub fn close_pause(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        let open = self
            .intervals
            .last_mut()
            .filter(|i| i.is_open())
            .ok_or(CoreError::NotPaused)?;

        if now < open.start {
            return Err(CoreError::InvalidTimestamp {
                at: now,
                earliest: open.start,
            });
        }

        open.end = Some(now);
        Ok(())
    }

    /// Total paused time up to `now`, including a running pause.
    pub fn paused_duration(&self, now: DateTime<Utc>) -> Duration {
        self.intervals
            .iter()
            .fold(Duration::zero(), |total, i| total + i.span(now))
    }

    /// Net billable time between `entry_time` and `now`.
    ///
    /// Pure in `now`: the same history always yields the same result. A
    /// negative raw value is clamped to zero and reported as an anomaly.
    pub fn net_active_duration(&self, entry_time: DateTime<Utc>, now: DateTime<Utc>) -> NetDuration {
        let raw = (now - entry_time) - self.paused_duration(now);

        if raw < Duration::zero() {
            NetDuration {
                active: Duration::zero(),
                anomaly: Some(NegativeDurationAnomaly {
                    raw_seconds: raw.num_seconds(),
                }),
            }
        } else {
            NetDuration {
                active: raw,
                anomaly: None,
            }
        }
    }
}

fn inconsistent(reason: &str) -> CoreError {
    CoreError::InconsistentSnapshot {
        reason: reason.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 14, 16, 0, 0).unwrap() + Duration::minutes(minute)
    }

    #[test]
    fn test_no_pauses() {
        let log = PauseLog::new();
        let net = log.net_active_duration(at(0), at(90));
        assert_eq!(net.whole_minutes(), 90);
        assert!(net.anomaly.is_none());
    }

    #[test]
    fn test_closed_pause_is_subtracted() {
        let mut log = PauseLog::new();
        log.open_pause(at(30)).unwrap();
        log.close_pause(at(60)).unwrap();
        assert_eq!(log.net_active_duration(at(0), at(120)).whole_minutes(), 90);
    }

    #[test]
    fn test_open_pause_measured_against_now() {
        let mut log = PauseLog::new();
        log.open_pause(at(30)).unwrap();
        assert_eq!(log.net_active_duration(at(0), at(45)).whole_minutes(), 30);
        assert_eq!(log.net_active_duration(at(0), at(100)).whole_minutes(), 30);
    }

    #[test]
    fn test_double_pause_leaves_history_unchanged() {
        let mut log = PauseLog::new();
        log.open_pause(at(10)).unwrap();
        let before = log.clone();

        assert_eq!(log.open_pause(at(20)), Err(CoreError::AlreadyPaused));
        assert_eq!(log, before);
    }

    #[test]
    fn test_close_without_pause() {
        let mut log = PauseLog::new();
        assert_eq!(log.close_pause(at(5)), Err(CoreError::NotPaused));

        log.open_pause(at(5)).unwrap();
        log.close_pause(at(6)).unwrap();
        assert_eq!(log.close_pause(at(7)), Err(CoreError::NotPaused));
    }

    #[test]
    fn test_clock_regression_rejected() {
        let mut log = PauseLog::new();
        log.open_pause(at(30)).unwrap();
        assert!(matches!(
            log.close_pause(at(29)),
            Err(CoreError::InvalidTimestamp { .. })
        ));
        assert!(log.is_paused());

        log.close_pause(at(40)).unwrap();
        assert!(matches!(
            log.open_pause(at(35)),
            Err(CoreError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn test_zero_length_pause_allowed() {
        let mut log = PauseLog::new();
        log.open_pause(at(10)).unwrap();
        log.close_pause(at(10)).unwrap();
        log.open_pause(at(10)).unwrap();
        assert_eq!(log.intervals().len(), 2);
    }

    #[test]
    fn test_negative_duration_clamped() {
        // Entry recorded by a host whose clock ran ahead.
        let log = PauseLog::new();
        let net = log.net_active_duration(at(10), at(0));
        assert_eq!(net.active, Duration::zero());
        assert_eq!(net.anomaly, Some(NegativeDurationAnomaly { raw_seconds: -600 }));
    }

    #[test]
    fn test_monotonic_while_active() {
        let mut log = PauseLog::new();
        log.open_pause(at(20)).unwrap();
        log.close_pause(at(35)).unwrap();

        let mut previous = Duration::zero();
        for minute in 35..200 {
            let net = log.net_active_duration(at(0), at(minute)).active;
            assert!(net >= previous);
            previous = net;
        }
    }

    #[test]
    fn test_from_intervals_validates() {
        let ok = vec![
            PauseInterval { start: at(10), end: Some(at(20)) },
            PauseInterval { start: at(30), end: None },
        ];
        assert!(PauseLog::from_intervals(ok).unwrap().is_paused());

        let open_in_middle = vec![
            PauseInterval { start: at(10), end: None },
            PauseInterval { start: at(30), end: Some(at(40)) },
        ];
        assert!(PauseLog::from_intervals(open_in_middle).is_err());

        let overlapping = vec![
            PauseInterval { start: at(10), end: Some(at(25)) },
            PauseInterval { start: at(20), end: Some(at(30)) },
        ];
        assert!(PauseLog::from_intervals(overlapping).is_err());

        let backwards = vec![PauseInterval { start: at(10), end: Some(at(5)) }];
        assert!(PauseLog::from_intervals(backwards).is_err());
    }
}
