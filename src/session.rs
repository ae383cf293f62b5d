//! Capture session: the pipeline from raw frames to device rows.

use crate::event::CaptureEvent;
use crate::frame::{AdvertisementFrame, ResolvedAdvertisement};
use crate::proximity::ProximityEstimator;
use crate::resolve::Resolver;
use crate::side_channel::{GpsFix, WifiNetwork};
use crate::snapshot::Snapshot;
use crate::window::{DeviceRow, RollingWindow};
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info};

/// Default rolling window horizon.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy)]
struct Started {
    wall: DateTime<Utc>,
    instant: Instant,
}

/// One capture session.
///
/// Owns the rolling window and the latest side-channel data. After every
/// processed frame the sorted device rows are published on a watch channel,
/// see [`Session::subscribe`].
///
/// A session has a single writer. Frames from concurrent producers must be
/// funnelled through one channel before reaching [`Session::process`].
#[derive(Debug)]
pub struct Session {
    resolver: Resolver,
    estimator: ProximityEstimator,
    window: RollingWindow,
    started: Option<Started>,
    latest_wifi: Vec<WifiNetwork>,
    latest_gps: Option<GpsFix>,
    /// Highest capture timestamp processed; the session's notion of "now"
    now_nanos: i64,
    rows: watch::Sender<Vec<DeviceRow>>,
}

impl Session {
    pub fn new(resolver: Resolver, estimator: ProximityEstimator, window: Duration) -> Self {
        let (rows, _) = watch::channel(Vec::new());
        Self {
            resolver,
            estimator,
            window: RollingWindow::new(window),
            started: None,
            latest_wifi: Vec::new(),
            latest_gps: None,
            now_nanos: 0,
            rows,
        }
    }

    /// Mark the session as started. Calling it again while running has no effect.
    pub fn start(&mut self) {
        if self.started.is_some() {
            return;
        }
        self.started = Some(Started {
            wall: Utc::now(),
            instant: Instant::now(),
        });
        info!(window = ?self.window.window(), "capture session started");
    }

    /// Stop the session and forget every windowed frame.
    pub fn stop(&mut self) {
        if self.started.take().is_some() {
            info!(clusters = self.window.cluster_count(), "capture session stopped");
        }
        self.window.clear();
        self.latest_wifi.clear();
        self.latest_gps = None;
        self.now_nanos = 0;
        self.rows.send_replace(Vec::new());
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Receiver of the device rows published after every frame.
    pub fn subscribe(&self) -> watch::Receiver<Vec<DeviceRow>> {
        self.rows.subscribe()
    }

    /// Dispatch one capture event.
    pub fn handle(&mut self, event: CaptureEvent) {
        match event {
            CaptureEvent::Advertisement(frame) => {
                self.process(frame);
            }
            CaptureEvent::Wifi(networks) => self.update_wifi(networks),
            CaptureEvent::Gps(fix) => self.update_gps(fix),
        }
    }

    /// Resolve a frame, add it to the window and publish fresh rows.
    ///
    /// Returns the resolved record.
    pub fn process(&mut self, frame: AdvertisementFrame) -> ResolvedAdvertisement {
        let record = self.resolver.resolve(frame);
        self.now_nanos = self.now_nanos.max(record.timestamp_nanos());
        self.window.add(record.clone());

        let rows = self.window.rows(self.now_nanos, &self.estimator);
        self.rows.send_replace(rows);
        record
    }

    /// Remember a Wi-Fi scan. Empty scans keep the previous results.
    pub fn update_wifi(&mut self, networks: Vec<WifiNetwork>) {
        if networks.is_empty() {
            debug!("ignoring empty wifi scan");
            return;
        }
        self.latest_wifi = networks;
    }

    pub fn update_gps(&mut self, fix: GpsFix) {
        self.latest_gps = Some(fix);
    }

    /// Current rows, nearest device first.
    pub fn rows(&self) -> Vec<DeviceRow> {
        self.rows.borrow().clone()
    }

    pub fn window(&self) -> &RollingWindow {
        &self.window
    }

    /// Copy of the session state.
    ///
    /// Before [`Session::start`] the start time is the snapshot time.
    pub fn snapshot(&self) -> Snapshot {
        let taken_at = Utc::now();
        let (started_at, elapsed_secs) = match self.started {
            Some(started) => (started.wall, started.instant.elapsed().as_secs()),
            None => (taken_at, 0),
        };
        Snapshot {
            taken_at,
            started_at,
            elapsed_secs,
            ble: self.window.flat(),
            wifi: self.latest_wifi.clone(),
            gps: self.latest_gps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oui::OuiTable;
    use crate::proximity::UNAVAILABLE;
    use crate::registry::IdentifierRegistry;
    use crate::test_utils::{TEST_ADDRESS, base_frame, secs};
    use crate::vendor::VendorLabel;
    use std::sync::Arc;

    fn session(window: Duration) -> Session {
        let registry = IdentifierRegistry::from_slices(
            br#"{"76": "Apple, Inc."}"#,
            br#"{"FEED": "Tile"}"#,
        );
        let resolver = Resolver::new(Arc::new(registry), Arc::new(OuiTable::default()));
        Session::new(resolver, ProximityEstimator::default(), window)
    }

    fn wifi(bssid: &str) -> WifiNetwork {
        WifiNetwork {
            ssid: Some("home".into()),
            bssid: bssid.into(),
            rssi_dbm: -50,
            freq_mhz: 5180,
            capabilities: None,
        }
    }

    #[test]
    fn test_process_publishes_rows() {
        let mut session = session(DEFAULT_WINDOW);
        let rows = session.subscribe();

        let mut frame = base_frame(TEST_ADDRESS, secs(1));
        frame.manufacturer_data.insert(76, vec![0x4C, 0x00, 0x10, 0x05]);
        frame.service_uuids = vec!["0000FEED-0000-1000-8000-00805F9B34FB".into()];
        let record = session.process(frame);
        assert_eq!(record.vendor, VendorLabel::Manufacturer("Apple, Inc.".into()));

        let mut far = base_frame("11:22:33:44:55:66", secs(2));
        far.rssi = -90;
        session.process(far);

        let published = rows.borrow().clone();
        assert_eq!(published, session.rows());
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].mac, TEST_ADDRESS);
        assert_eq!(published[0].service_names, vec!["Tile"]);
        assert_eq!(published[0].payload_hex.as_deref(), Some("1005"));
        assert_eq!(published[0].age_secs, 1);
        assert_eq!(published[1].mac, "11:22:33:44:55:66");
    }

    #[test]
    fn test_rows_for_implausible_rssi() {
        let mut session = session(DEFAULT_WINDOW);
        let mut frame = base_frame(TEST_ADDRESS, secs(1));
        frame.rssi = 127;
        session.process(frame);
        assert_eq!(session.rows()[0].estimated_meters, UNAVAILABLE);
    }

    #[test]
    fn test_window_prunes_old_devices() {
        let mut session = session(Duration::from_secs(2));
        session.process(base_frame("11:22:33:44:55:66", secs(0)));
        session.process(base_frame(TEST_ADDRESS, secs(3)));
        assert_eq!(session.window().cluster_count(), 1);
        assert_eq!(session.rows().len(), 1);
    }

    #[test]
    fn test_side_channel_keeps_latest() {
        let mut session = session(DEFAULT_WINDOW);
        session.handle(CaptureEvent::Wifi(vec![wifi("00:00:00:00:00:01")]));
        session.handle(CaptureEvent::Wifi(Vec::new()));
        session.handle(CaptureEvent::Gps(GpsFix {
            latitude: 60.0,
            longitude: 24.0,
            accuracy_m: 10.0,
        }));
        session.handle(CaptureEvent::Gps(GpsFix {
            latitude: 61.0,
            longitude: 25.0,
            accuracy_m: 3.0,
        }));

        let snapshot = session.snapshot();
        assert_eq!(snapshot.wifi, vec![wifi("00:00:00:00:00:01")]);
        assert_eq!(snapshot.gps.map(|g| g.latitude), Some(61.0));
    }

    #[test]
    fn test_snapshot_contains_windowed_frames_in_time_order() {
        let mut session = session(DEFAULT_WINDOW);
        session.start();
        session.handle(CaptureEvent::Advertisement(base_frame("B", secs(1))));
        session.handle(CaptureEvent::Advertisement(base_frame("A", secs(2))));
        session.handle(CaptureEvent::Advertisement(base_frame("B", secs(3))));

        let snapshot = session.snapshot();
        let times: Vec<i64> = snapshot.ble.iter().map(|r| r.timestamp_nanos()).collect();
        assert_eq!(times, vec![secs(1), secs(2), secs(3)]);
        assert!(snapshot.started_at <= snapshot.taken_at);
        assert_eq!(snapshot.elapsed_secs, 0);
    }

    #[test]
    fn test_start_stop() {
        let mut session = session(DEFAULT_WINDOW);
        let rows = session.subscribe();
        assert!(!session.is_running());

        session.start();
        let first = session.snapshot().started_at;
        session.start();
        assert_eq!(session.snapshot().started_at, first);
        assert!(session.is_running());

        session.process(base_frame(TEST_ADDRESS, secs(1)));
        session.update_wifi(vec![wifi("00:00:00:00:00:01")]);
        session.stop();

        assert!(!session.is_running());
        assert!(session.window().is_empty());
        assert!(rows.borrow().is_empty());
        let snapshot = session.snapshot();
        assert!(snapshot.ble.is_empty());
        assert!(snapshot.wifi.is_empty());
    }
}
