//! Current and next interval selection
//!
//! Given a snapshot and a direction, picks the interval whose start is the
//! latest one not after "now" and the first interval strictly after it.

use crate::amber::{Direction, Interval, Snapshot};
use crate::logging::get_logger;
use chrono::{DateTime, Utc};
use std::ops::Deref;

/// An interval together with its resolved start instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selected<'a> {
    pub interval: &'a Interval,
    pub starts_at: DateTime<Utc>,
}

impl Deref for Selected<'_> {
    type Target = Interval;

    fn deref(&self) -> &Interval {
        self.interval
    }
}

/// Result of selecting within one direction
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Selection<'a> {
    pub current: Option<Selected<'a>>,
    pub next: Option<Selected<'a>>,
}

impl Selection<'_> {
    /// No usable interval exists for the direction
    pub const fn is_unavailable(&self) -> bool {
        self.current.is_none()
    }
}

/// Select against the wall clock, read once for the whole selection
pub fn select(snapshot: &Snapshot, direction: Direction) -> Selection<'_> {
    select_at(snapshot, direction, Utc::now())
}

/// Select the current and next interval as of `now`.
///
/// Intervals whose timestamp cannot be parsed are skipped. Equal timestamps
/// keep their original order. When every interval lies in the future the
/// earliest one stands in as current and the one after it becomes next.
pub fn select_at(snapshot: &Snapshot, direction: Direction, now: DateTime<Utc>) -> Selection<'_> {
    let Some(group) = snapshot.group(direction) else {
        return Selection::default();
    };
    let logger = get_logger("selector");

    let mut timed: Vec<Selected<'_>> = group
        .intervals
        .iter()
        .filter_map(|interval| match interval.starts_at(snapshot.source_tz) {
            Ok(starts_at) => Some(Selected { interval, starts_at }),
            Err(e) => {
                logger.debug(&format!("Skipping {direction} interval: {e}"));
                None
            }
        })
        .collect();
    if timed.is_empty() {
        return Selection::default();
    }

    // Stable sort keeps API order among duplicates
    timed.sort_by_key(|s| s.starts_at);
    let split = timed.partition_point(|s| s.starts_at <= now);
    let (elapsed, upcoming) = timed.split_at(split);

    match (elapsed.last(), upcoming) {
        (Some(latest), _) => Selection {
            current: Some(*latest),
            next: upcoming.first().copied(),
        },
        // The earliest forecast stands in as current, so next moves one on
        (None, [earliest, rest @ ..]) => {
            logger.debug(&format!(
                "No {direction} interval has started yet; using the earliest forecast"
            ));
            Selection {
                current: Some(*earliest),
                next: rest.first().copied(),
            }
        }
        (None, []) => {
            logger.warn(&format!("No {direction} interval around {now}; using the last one"));
            Selection {
                current: timed.last().copied(),
                next: None,
            }
        }
    }
}
