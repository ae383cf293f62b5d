//! Per-device output throttling.
//!
//! Limits how often a row is printed for each device. Devices are keyed by
//! their cluster key and time is taken from capture timestamps, so replaying
//! a recording throttles exactly like the live capture did.

use std::collections::HashMap;
use std::time::Duration;

/// A throttle that limits the rate of events per device key.
///
/// Each key is tracked independently, allowing at most one event per
/// `interval`. The first event for a key is always allowed.
#[derive(Debug)]
pub struct Throttle {
    /// Minimum time between events for each key
    interval_nanos: i64,
    /// Capture timestamp of the last emitted event per key
    last_emitted: HashMap<String, i64>,
}

impl Throttle {
    /// Create a new throttle with the specified minimum interval between events.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use beaconwatch::throttle::Throttle;
    ///
    /// let mut throttle = Throttle::new(Duration::from_secs(3));
    /// assert!(throttle.should_emit("MAC:AA:BB:CC:DD:EE:FF", 0));
    /// ```
    pub fn new(interval: Duration) -> Self {
        Throttle {
            interval_nanos: i64::try_from(interval.as_nanos()).unwrap_or(i64::MAX),
            last_emitted: HashMap::new(),
        }
    }

    /// Check if an event for `key` captured at `now_nanos` should be emitted.
    ///
    /// Returns `true` if at least the interval has passed since the last
    /// emitted event for this key (or if this is the first event), and
    /// records `now_nanos` as the new reference. Blocked events do not reset
    /// the timer. A timestamp earlier than the last emitted one is blocked.
    pub fn should_emit(&mut self, key: &str, now_nanos: i64) -> bool {
        match self.last_emitted.get(key) {
            Some(last) if now_nanos.saturating_sub(*last) < self.interval_nanos => false,
            _ => {
                self.last_emitted.insert(key.to_string(), now_nanos);
                true
            }
        }
    }

    /// Forget every key.
    pub fn reset(&mut self) {
        self.last_emitted.clear();
    }
}

/// Unit suffixes accepted by [`parse_duration`] with their length in
/// milliseconds. `ms` must be tried before `m` and `s`.
const UNITS: [(&str, u64); 4] = [("ms", 1), ("h", 3_600_000), ("m", 60_000), ("s", 1_000)];

/// Parse a `--throttle` value such as `"3s"`, `"1m"`, `"2h"` or `"500ms"`.
///
/// A bare number counts as seconds and blanks between the number and its
/// unit are ignored.
///
/// ```
/// use beaconwatch::throttle::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("500ms"), Ok(Duration::from_millis(500)));
/// assert_eq!(parse_duration("90"), Ok(Duration::from_secs(90)));
/// ```
pub fn parse_duration(src: &str) -> Result<Duration, String> {
    let src = src.trim();
    if src.is_empty() {
        return Err("empty duration string".to_string());
    }

    let (amount, unit_millis) = UNITS
        .iter()
        .find_map(|&(suffix, millis)| {
            src.strip_suffix(suffix)
                .map(|rest| (rest.trim_end(), millis))
        })
        .unwrap_or((src, 1_000));

    let amount: u64 = amount
        .parse()
        .map_err(|_| format!("invalid duration: {src:?}"))?;
    amount
        .checked_mul(unit_millis)
        .map(Duration::from_millis)
        .ok_or_else(|| format!("duration out of range: {src:?}"))
}
