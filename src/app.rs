//! Core application runner (business logic) for `beaconwatch`.
//!
//! This module is intentionally decoupled from CLI parsing, logging setup and
//! process exit codes so it can be tested deterministically.

use crate::event::CaptureEvent;
use crate::output::RowFormatter;
use crate::output::json;
use crate::output::line::{DEFAULT_MEASUREMENT, LineFormatter};
use crate::proximity::{DEFAULT_PATH_LOSS_EXPONENT, ProximityEstimator};
use crate::registry::{RegistryCell, RegistrySources};
use crate::resolve::Resolver;
use crate::session::Session;
use crate::source::{Backend, CaptureConfig, FrameSource, SourceError};
use crate::throttle::Throttle;
use crate::window::key_of;
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Configuration for the core run loop.
#[derive(Parser, Debug, Clone)]
#[command(author, about, version)]
pub struct Options {
    /// Company identifier table (JSON). Defaults to the bundled table.
    #[arg(long, value_name = "PATH")]
    pub companies: Option<PathBuf>,

    /// Service UUID table (JSON). Defaults to the bundled table.
    #[arg(long, value_name = "PATH")]
    pub services: Option<PathBuf>,

    /// How long a device stays listed after its last advertisement.
    /// Accepts duration with suffix: 3s, 1m, 500ms, 2h.
    #[arg(long, default_value = "120s", value_parser = crate::throttle::parse_duration)]
    pub window: Duration,

    /// Print at most one row per device per interval.
    /// Accepts duration with suffix: 3s, 1m, 500ms, 2h.
    /// Without suffix, value is interpreted as seconds.
    #[arg(long, value_parser = crate::throttle::parse_duration)]
    pub throttle: Option<Duration>,

    /// Path loss exponent of the distance model (2.0 is free space)
    #[arg(long, default_value_t = DEFAULT_PATH_LOSS_EXPONENT)]
    pub path_loss_exponent: f64,

    /// The name of the measurement in the printed line protocol rows.
    #[arg(long, default_value = DEFAULT_MEASUREMENT)]
    pub measurement: String,

    /// Capture backend to use
    #[arg(long, default_value_t, value_enum)]
    pub backend: Backend,

    /// Capture file for the replay backend; `-` or nothing reads stdin
    #[arg(long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Write a JSON snapshot of the session here when capture ends
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Errors returned by the core run loop.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("cannot write snapshot to {}: {source}", .path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn export_snapshot(session: &Session, path: PathBuf) -> Result<(), RunError> {
    let snapshot = session.snapshot();
    File::create(&path)
        .map_err(serde_json::Error::io)
        .and_then(|file| json::write_snapshot(&snapshot, BufWriter::new(file)))
        .map_err(|source| RunError::Export {
            path: path.clone(),
            source,
        })?;
    info!(path = %path.display(), frames = snapshot.ble.len(), "snapshot exported");
    Ok(())
}

/// Run the core processing loop, writing one formatted row to `out` per
/// processed advertisement.
///
/// - The registry is taken from `registry`, loading it from the configured
///   sources if this is the first use of the cell.
/// - Rows are optionally throttled per device using capture timestamps.
/// - Wi-Fi and GPS events only update the session's side-channel state.
/// - When the source closes, the session snapshot is exported if requested.
pub async fn run_with_io(
    options: Options,
    source: &dyn FrameSource,
    registry: &RegistryCell,
    out: &mut dyn Write,
) -> Result<(), RunError> {
    let sources = RegistrySources {
        companies: options.companies,
        services: options.services,
    };
    let registry = registry.get_or_build(|| sources.load());
    info!(
        companies = registry.company_count(),
        services = registry.service_count(),
        "identifier registry ready"
    );

    let resolver = Resolver::with_builtin_oui(registry);
    let estimator = ProximityEstimator::new(options.path_loss_exponent);
    let mut session = Session::new(resolver, estimator, options.window);
    let rows = session.subscribe();
    let formatter = LineFormatter::new(options.measurement);

    // Create throttle if interval is specified
    let mut throttle = options.throttle.map(Throttle::new);

    let config = CaptureConfig {
        backend: options.backend,
        input: options.input,
    };
    debug!(backend = %config.backend, "starting capture");
    let mut events = source.start_capture(config).await?;
    session.start();

    while let Some(event) = events.recv().await {
        let CaptureEvent::Advertisement(frame) = event else {
            session.handle(event);
            continue;
        };

        let record = session.process(frame);
        let key = key_of(&record.frame);
        let timestamp = record.timestamp_nanos();

        let should_emit = throttle
            .as_mut()
            .is_none_or(|t: &mut Throttle| t.should_emit(&key, timestamp));
        if !should_emit {
            continue;
        }

        let line = rows
            .borrow()
            .iter()
            .find(|row| row.key == key)
            .map(|row| formatter.format(row, Some(timestamp)));
        if let Some(line) = line {
            writeln!(out, "{line}")?;
        }
    }

    info!(
        devices = session.window().cluster_count(),
        "capture source closed"
    );
    if let Some(path) = options.export {
        export_snapshot(&session, path)?;
    }
    session.stop();

    Ok(())
}
