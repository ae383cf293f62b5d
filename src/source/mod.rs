//! Capture backends feeding [`CaptureEvent`]s into a session.
//!
//! Every backend hands back the receiving half of a bounded channel and
//! pushes events from a spawned task. The channel closes when the backend
//! has nothing more to deliver.

#[cfg(feature = "bluer")]
pub mod bluer;
pub mod replay;

use crate::event::CaptureEvent;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::mpsc;

/// Channel buffer size for capture events.
pub const EVENT_CHANNEL_BUFFER_SIZE: usize = 256;

/// Error type for capture backends.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Bluetooth/adapter related error
    #[error("Bluetooth error: {0}")]
    Bluetooth(String),
    #[error("cannot open capture file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read capture input: {0}")]
    Read(#[from] io::Error),
    #[error("invalid capture event on line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Available capture backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    /// Recorded JSON-lines capture, from a file or stdin
    Replay,
    /// BlueZ D-Bus discovery (requires bluetoothd daemon)
    #[cfg(feature = "bluer")]
    Bluer,
}

impl Default for Backend {
    fn default() -> Self {
        #[cfg(feature = "bluer")]
        return Backend::Bluer;
        #[cfg(not(feature = "bluer"))]
        return Backend::Replay;
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Replay => write!(f, "replay"),
            #[cfg(feature = "bluer")]
            Backend::Bluer => write!(f, "bluer"),
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "replay" | "file" => Ok(Backend::Replay),
            #[cfg(feature = "bluer")]
            "bluer" | "bluez" => Ok(Backend::Bluer),
            _ => Err(format!("Unknown backend: {}", s)),
        }
    }
}

/// What to capture from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureConfig {
    pub backend: Backend,
    /// Replay input; `None` or `-` reads stdin
    pub input: Option<PathBuf>,
}

/// Source abstraction to enable deterministic tests without Bluetooth hardware.
pub trait FrameSource: Send + Sync {
    fn start_capture(
        &self,
        config: CaptureConfig,
    ) -> Pin<
        Box<dyn Future<Output = Result<mpsc::Receiver<CaptureEvent>, SourceError>> + Send + '_>,
    >;
}

/// Source that delegates to the compiled-in backends.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealSource;

impl FrameSource for RealSource {
    fn start_capture(
        &self,
        config: CaptureConfig,
    ) -> Pin<
        Box<dyn Future<Output = Result<mpsc::Receiver<CaptureEvent>, SourceError>> + Send + '_>,
    > {
        Box::pin(start_capture(config))
    }
}

/// Start capturing with the configured backend.
pub async fn start_capture(
    config: CaptureConfig,
) -> Result<mpsc::Receiver<CaptureEvent>, SourceError> {
    match config.backend {
        Backend::Replay => replay::start_capture(config.input).await,
        #[cfg(feature = "bluer")]
        Backend::Bluer => bluer::start_capture().await,
    }
}

/// Monotonic capture clock.
///
/// Timestamps are nanoseconds since the clock was created. They never go
/// backwards, which the rolling window relies on.
#[derive(Debug, Clone, Copy)]
pub struct CaptureClock {
    origin: Instant,
}

impl Default for CaptureClock {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn now_nanos(&self) -> i64 {
        i64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(i64::MAX)
    }
}
