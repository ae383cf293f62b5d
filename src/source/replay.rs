//! Replay backend: recorded capture events, one JSON object per line.
//!
//! ```text
//! {"gps": {"lat": 60.17, "lon": 24.94, "acc": 5.0}}
//! {"ble": {"address": "AA:BB:CC:DD:EE:FF", "timestampNanos": 1000, "rssi": -70}}
//! {"wifi": [{"ssid": "home", "bssid": "00:11:22:33:44:55", "rssi": -40, "freq": 2412}]}
//! ```
//!
//! Blank lines are ignored. Lines that fail to decode are logged and skipped
//! so one corrupt record does not end the replay.

use super::{EVENT_CHANNEL_BUFFER_SIZE, SourceError};
use crate::event::CaptureEvent;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Open the replay input and start delivering its events.
///
/// `None` or a path of `-` reads standard input.
pub async fn start_capture(
    input: Option<PathBuf>,
) -> Result<mpsc::Receiver<CaptureEvent>, SourceError> {
    match input {
        Some(path) if path != Path::new("-") => {
            let file = tokio::fs::File::open(&path)
                .await
                .map_err(|source| SourceError::Open {
                    path: path.clone(),
                    source,
                })?;
            debug!(path = %path.display(), "replaying capture file");
            Ok(spawn_reader(file))
        }
        _ => {
            debug!("replaying capture from stdin");
            Ok(spawn_reader(tokio::io::stdin()))
        }
    }
}

/// Decode one line. Blank lines yield `Ok(None)`.
pub fn parse_line(line_number: usize, line: &str) -> Result<Option<CaptureEvent>, SourceError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(|source| SourceError::Decode {
            line: line_number,
            source,
        })
}

/// Read events from `reader` on a spawned task.
///
/// The channel closes at end of input, on a read error, or when the
/// receiver is dropped.
pub fn spawn_reader<R>(reader: R) -> mpsc::Receiver<CaptureEvent>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_BUFFER_SIZE);

    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        let mut line_number = 0;
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!("{}", SourceError::Read(e));
                    break;
                }
            };
            line_number += 1;

            match parse_line(line_number, &line) {
                Ok(Some(event)) => {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("skipping record: {e}"),
            }
        }
        debug!(lines = line_number, "replay finished");
    });

    rx
}
