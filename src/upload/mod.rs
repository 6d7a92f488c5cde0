// ABOUTME: Upload sink seam: async trait, outcome types, and bounded status polling
// ABOUTME: The conversion core only knows this narrow interface, never the HTTP details
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! The upload sink is an external collaborator behind a narrow interface:
//! hand it finished bytes and an extension, get back an opaque handle, a
//! duplicate signal, or an error. Duplicates are an already-satisfied
//! outcome, not a failure.

pub mod strava;

pub use strava::StravaUploader;

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::UploadError;

/// Opaque identifier for an in-flight upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadHandle(pub u64);

/// What the sink did with the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The sink accepted the bytes and is processing them
    Accepted(UploadHandle),
    /// The activity already exists server-side; nothing left to do
    Duplicate,
}

/// Processing state of an accepted upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    /// Still being processed
    Pending,
    /// Processing finished; the activity is live
    Ready {
        /// Server-side activity id
        activity_id: u64,
    },
    /// The sink rejected the upload during processing
    Failed {
        /// Server-supplied reason
        message: String,
    },
}

/// Narrow interface the core calls to hand off a finished artifact.
#[async_trait]
pub trait UploadSink: Send {
    /// Submit encoded bytes under the given file name and data type
    /// (`fit` or `tcx`).
    async fn upload(
        &mut self,
        file_name: &str,
        extension: &str,
        bytes: &[u8],
    ) -> Result<UploadOutcome, UploadError>;

    /// Ask the sink how a previously accepted upload is doing.
    async fn poll_status(&mut self, handle: UploadHandle) -> Result<UploadStatus, UploadError>;
}

/// Poll an accepted upload until it settles or `attempts` runs out.
/// Returns the last observed status; `Pending` after the final attempt
/// means the sink was still chewing when we gave up.
pub async fn wait_for_activity(
    sink: &mut (dyn UploadSink + Send),
    handle: UploadHandle,
    attempts: u32,
    delay: Duration,
) -> Result<UploadStatus, UploadError> {
    let mut last = UploadStatus::Pending;
    for _ in 0..attempts {
        tokio::time::sleep(delay).await;
        last = sink.poll_status(handle).await?;
        match last {
            UploadStatus::Pending => {}
            UploadStatus::Ready { .. } | UploadStatus::Failed { .. } => break,
        }
    }
    Ok(last)
}
