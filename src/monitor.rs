// ABOUTME: Directory monitor: polls the inbox for PWX files, converts, quarantines failures
// ABOUTME: Per-file isolation; a failing document never aborts the loop or blocks its neighbors
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Continuous conversion loop.
//!
//! Layout under the monitored base directory:
//! `original/` (inbox for incoming PWX files), `converted/` (finished
//! FIT/TCX artifacts), `processed/` (sources that converted cleanly),
//! `failed/` (quarantine). A source is moved out of the inbox exactly
//! once per attempt, so a malformed file cannot wedge the loop.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::constants::dirs;
use crate::convert::{self, ConversionOutput, ConvertOptions};
use crate::upload::{self, UploadOutcome, UploadSink, UploadStatus};

/// Resolved directory layout under the monitored base.
#[derive(Debug, Clone)]
pub struct MonitorPaths {
    /// Inbox scanned for incoming PWX files
    pub inbox: PathBuf,
    /// Destination for finished artifacts
    pub converted: PathBuf,
    /// Destination for cleanly converted sources
    pub processed: PathBuf,
    /// Quarantine for sources that failed conversion
    pub failed: PathBuf,
}

impl MonitorPaths {
    #[must_use]
    pub fn new(base: &Path) -> Self {
        Self {
            inbox: base.join(dirs::INBOX),
            converted: base.join(dirs::CONVERTED),
            processed: base.join(dirs::PROCESSED),
            failed: base.join(dirs::FAILED),
        }
    }
}

/// Create the full directory layout if any of it is missing.
///
/// # Errors
///
/// Propagates the underlying I/O error when a directory cannot be created.
pub fn setup_directories(paths: &MonitorPaths) -> io::Result<()> {
    for dir in [&paths.inbox, &paths.converted, &paths.processed, &paths.failed] {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
            info!(dir = %dir.display(), "created directory");
        }
    }
    Ok(())
}

/// What happened to one inbox file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Converted; source moved to processed/
    Converted,
    /// Conversion failed; source moved to failed/
    Quarantined,
}

/// List PWX files currently sitting in the inbox, in name order.
///
/// # Errors
///
/// Propagates the underlying I/O error when the inbox cannot be read.
pub fn scan_inbox(paths: &MonitorPaths) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(&paths.inbox)? {
        let entry = entry?;
        let path = entry.path();
        let is_pwx = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pwx"));
        if is_pwx && path.is_file() {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Convert one inbox file and do the move bookkeeping. Conversion
/// failures quarantine the source; upload failures are logged and do not
/// demote a successful conversion.
pub async fn process_file(
    paths: &MonitorPaths,
    options: &ConvertOptions,
    sink: Option<&mut (dyn UploadSink + Send)>,
    file_name: &str,
) -> ProcessOutcome {
    let input = paths.inbox.join(file_name);
    info!(file_name, "processing");

    match convert::convert_file(&input, &paths.converted, options) {
        Ok(output) => {
            move_source(&input, &paths.processed.join(file_name));
            if let Some(sink) = sink {
                upload_preferred_artifact(sink, &output).await;
            }
            ProcessOutcome::Converted
        }
        Err(err) => {
            error!(file_name, error = %err, "conversion failed");
            move_source(&input, &paths.failed.join(file_name));
            ProcessOutcome::Quarantined
        }
    }
}

fn move_source(from: &Path, to: &Path) {
    if let Err(err) = fs::rename(from, to) {
        // The file stays in the inbox and will be retried next scan.
        error!(from = %from.display(), to = %to.display(), error = %err, "could not move source file");
    }
}

/// Hand the preferred artifact (FIT over TCX) to the sink and follow the
/// processing status for a bounded number of polls.
async fn upload_preferred_artifact(sink: &mut (dyn UploadSink + Send), output: &ConversionOutput) {
    let Some(path) = output.upload_candidate() else {
        return;
    };
    let Some((file_name, extension)) = path
        .file_name()
        .and_then(|n| n.to_str())
        .zip(path.extension().and_then(|e| e.to_str()))
    else {
        return;
    };

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(path = %path.display(), error = %err, "could not read artifact for upload");
            return;
        }
    };

    match sink.upload(file_name, extension, &bytes).await {
        Ok(UploadOutcome::Duplicate) => {
            info!(file_name, "already on strava, nothing to upload");
        }
        Ok(UploadOutcome::Accepted(handle)) => {
            match upload::wait_for_activity(sink, handle, 10, Duration::from_secs(2)).await {
                Ok(UploadStatus::Ready { activity_id }) => {
                    info!(
                        activity_id,
                        "upload processed: https://www.strava.com/activities/{activity_id}"
                    );
                }
                Ok(UploadStatus::Pending) => {
                    info!(file_name, "upload accepted, still processing");
                }
                Ok(UploadStatus::Failed { message }) => {
                    warn!(file_name, message = %message, "strava could not process the upload");
                }
                Err(err) => warn!(file_name, error = %err, "status polling failed"),
            }
        }
        Err(err) => {
            // Non-fatal: the conversion stands, only the upload failed.
            warn!(file_name, error = %err, "upload failed");
        }
    }
}

/// Run the polling loop until ctrl-c.
///
/// # Errors
///
/// Returns an error when the directory layout cannot be created or the
/// inbox becomes unreadable.
pub async fn run(config: &Config, mut sink: Option<Box<dyn UploadSink + Send>>) -> io::Result<()> {
    let paths = MonitorPaths::new(&config.base_dir);
    setup_directories(&paths)?;
    info!(base = %config.base_dir.display(), interval = ?config.poll_interval, "monitoring inbox");

    let mut ticker = tokio::time::interval(config.poll_interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for file_name in scan_inbox(&paths)? {
                    match sink {
                        Some(ref mut s) => {
                            process_file(&paths, &config.options, Some(&mut **s), &file_name).await;
                        }
                        None => {
                            process_file(&paths, &config.options, None, &file_name).await;
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("stopping monitor");
                return Ok(());
            }
        }
    }
}
