//! Distance estimation from received signal strength.
//!
//! Uses the log-distance path loss model with a single exponent. There is no
//! smoothing over time and no per-device calibration, so estimates jump with
//! every reading and are only good for a rough "near / far" ordering.

use std::ops::RangeInclusive;

/// Returned when no sensible distance can be derived.
pub const UNAVAILABLE: f64 = -1.0;

/// Reference power at 1 m used when a frame has no usable TX power.
pub const DEFAULT_REFERENCE_DBM: i32 = -59;

/// Free-space path loss exponent.
pub const DEFAULT_PATH_LOSS_EXPONENT: f64 = 2.0;

/// Readings outside this band are placeholders or nonsense.
pub const PLAUSIBLE_DBM: RangeInclusive<i32> = -100..=-30;

/// Estimates are clamped to this range, in meters.
pub const METERS_RANGE: RangeInclusive<f64> = 0.1..=30.0;

/// Estimate the distance in meters for an RSSI reading.
///
/// `tx_power` is only used as the 1 m reference when it is itself plausible;
/// otherwise [`DEFAULT_REFERENCE_DBM`] is used. Returns [`UNAVAILABLE`] for
/// implausible RSSI values.
pub fn meters_from_rssi(rssi: i32, tx_power: Option<i32>, path_loss_exponent: f64) -> f64 {
    if !PLAUSIBLE_DBM.contains(&rssi) {
        return UNAVAILABLE;
    }

    let reference = tx_power
        .filter(|power| PLAUSIBLE_DBM.contains(power))
        .unwrap_or(DEFAULT_REFERENCE_DBM);

    let exponent = f64::from(reference - rssi) / (10.0 * path_loss_exponent);
    let clamped = 10f64
        .powf(exponent)
        .clamp(*METERS_RANGE.start(), *METERS_RANGE.end());

    if clamped.is_finite() { clamped } else { UNAVAILABLE }
}

/// Whether `meters` is a real estimate rather than [`UNAVAILABLE`].
pub fn is_available(meters: f64) -> bool {
    meters >= 0.0
}

/// Distance estimator with a configurable path loss exponent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityEstimator {
    pub path_loss_exponent: f64,
}

impl Default for ProximityEstimator {
    fn default() -> Self {
        Self {
            path_loss_exponent: DEFAULT_PATH_LOSS_EXPONENT,
        }
    }
}

impl ProximityEstimator {
    pub fn new(path_loss_exponent: f64) -> Self {
        Self { path_loss_exponent }
    }

    pub fn meters(&self, rssi: i32, tx_power: Option<i32>) -> f64 {
        meters_from_rssi(rssi, tx_power, self.path_loss_exponent)
    }
}
