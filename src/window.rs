//! Rolling time window of advertisements grouped per device.
//!
//! Frames are grouped into clusters by a stable key (the device address, or
//! the first manufacturer id for anonymous frames). Every insert prunes the
//! members that fell out of the window relative to the inserted frame's
//! timestamp, and clusters left empty are dropped.
//!
//! # Ordering precondition
//!
//! Pruning scans each cluster from the front and stops at the first member
//! inside the window. This is only correct when frames are added in
//! non-decreasing timestamp order, which capture backends guarantee per
//! producer. Out-of-order frames are not rejected; they merely may survive
//! longer than the window.

use crate::frame::{AdvertisementFrame, ResolvedAdvertisement};
use crate::proximity::ProximityEstimator;
use crate::vendor::VendorLabel;
use indexmap::IndexMap;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::trace;

/// Title of a row whose device did not advertise a name.
pub const UNKNOWN_TITLE: &str = "Unknown";

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Grouping key of a frame.
///
/// `MAC:<address>` for frames with a non-blank address, otherwise
/// `VENDOR:<first manufacturer id>`, or `VENDOR:-1` without manufacturer data.
pub fn key_of(frame: &AdvertisementFrame) -> String {
    if !frame.address.trim().is_empty() {
        format!("MAC:{}", frame.address)
    } else {
        let company = frame.first_company_id().map_or(-1, i32::from);
        format!("VENDOR:{company}")
    }
}

/// All windowed frames sharing one key, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub key: String,
    pub members: VecDeque<ResolvedAdvertisement>,
}

impl Cluster {
    fn new(key: String) -> Self {
        Self {
            key,
            members: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member with the highest timestamp; the later one on ties.
    pub fn latest(&self) -> Option<&ResolvedAdvertisement> {
        self.members.iter().max_by_key(|m| m.timestamp_nanos())
    }

    fn prune_before(&mut self, cutoff: i64) -> usize {
        let before = self.members.len();
        while self
            .members
            .front()
            .is_some_and(|m| m.timestamp_nanos() < cutoff)
        {
            self.members.pop_front();
        }
        before - self.members.len()
    }
}

/// Display projection of one cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceRow {
    /// Cluster key the row was built from
    pub key: String,
    /// Advertised name or [`UNKNOWN_TITLE`]
    pub title: String,
    pub mac: String,
    pub rssi: i32,
    /// Estimated distance, or [`crate::proximity::UNAVAILABLE`]
    pub estimated_meters: f64,
    /// Whole seconds since the latest frame of this device
    pub age_secs: u64,
    pub vendor: VendorLabel,
    pub service_names: Vec<String>,
    pub payload_hex: Option<String>,
}

/// Per-device clusters over a fixed time horizon.
///
/// Single writer: `add` takes `&mut self` and callers serialize producers.
/// All read accessors return owned copies.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    clusters: IndexMap<String, Cluster>,
    window: Duration,
    window_nanos: i64,
}

impl RollingWindow {
    pub fn new(window: Duration) -> Self {
        Self {
            clusters: IndexMap::new(),
            window,
            window_nanos: i64::try_from(window.as_nanos()).unwrap_or(i64::MAX),
        }
    }

    /// Add a frame to its cluster, then prune relative to its timestamp.
    pub fn add(&mut self, record: ResolvedAdvertisement) {
        let now = record.timestamp_nanos();
        let key = key_of(&record.frame);
        self.clusters
            .entry(key)
            .or_insert_with_key(|key| Cluster::new(key.clone()))
            .members
            .push_back(record);
        self.prune(now);
    }

    /// Drop members older than `now - window` and remove emptied clusters.
    ///
    /// A member exactly `window` old is kept.
    pub fn prune(&mut self, now: i64) {
        let cutoff = now.saturating_sub(self.window_nanos);
        let mut dropped = 0;
        for cluster in self.clusters.values_mut() {
            dropped += cluster.prune_before(cutoff);
        }
        let before = self.clusters.len();
        self.clusters.retain(|_, cluster| !cluster.is_empty());
        if dropped > 0 {
            trace!(
                frames = dropped,
                clusters = before - self.clusters.len(),
                "pruned rolling window"
            );
        }
    }

    /// Copy of all clusters in first-seen order.
    pub fn clusters(&self) -> Vec<Cluster> {
        self.clusters.values().cloned().collect()
    }

    /// Copy of every windowed frame, oldest first.
    pub fn flat(&self) -> Vec<ResolvedAdvertisement> {
        let mut frames: Vec<ResolvedAdvertisement> = self
            .clusters
            .values()
            .flat_map(|cluster| cluster.members.iter().cloned())
            .collect();
        frames.sort_by_key(ResolvedAdvertisement::timestamp_nanos);
        frames
    }

    /// One row per cluster from its latest frame, nearest first.
    ///
    /// Rows without a distance estimate carry the negative sentinel and so
    /// sort before every real estimate.
    pub fn rows(&self, now: i64, estimator: &ProximityEstimator) -> Vec<DeviceRow> {
        let mut rows: Vec<DeviceRow> = self
            .clusters
            .values()
            .filter_map(|cluster| {
                let latest = cluster.latest()?;
                let frame = &latest.frame;
                let age_nanos = now.saturating_sub(frame.timestamp_nanos).max(0);
                Some(DeviceRow {
                    key: cluster.key.clone(),
                    title: frame
                        .advertised_name
                        .clone()
                        .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
                    mac: frame.address.clone(),
                    rssi: frame.rssi,
                    estimated_meters: estimator.meters(frame.rssi, frame.tx_power),
                    age_secs: u64::try_from(age_nanos / NANOS_PER_SEC).unwrap_or(0),
                    vendor: latest.vendor.clone(),
                    service_names: latest.service_names.clone(),
                    payload_hex: latest.manufacturer.as_ref().map(|m| m.payload_hex.clone()),
                })
            })
            .collect();
        rows.sort_by(|a, b| a.estimated_meters.total_cmp(&b.estimated_meters));
        rows
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Forget every cluster.
    pub fn clear(&mut self) {
        self.clusters.clear();
    }
}
