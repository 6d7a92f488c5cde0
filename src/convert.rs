// ABOUTME: One-shot conversion pipeline: read PWX once, encode FIT/TCX in memory, persist atomically
// ABOUTME: A conversion either completes with fully-formed artifacts or fails leaving nothing behind
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::Document;
use tracing::{debug, info};

use crate::errors::{ConvertError, EncodeError, FormatError};
use crate::models::{EncodedActivity, RideMode, RideSummary};
use crate::{fit, pwx, tcx};

/// What to produce for one source document.
#[derive(Debug, Clone, Copy)]
pub struct ConvertOptions {
    /// Emit the FIT artifact
    pub fit: bool,
    /// Emit the TCX artifact
    pub tcx: bool,
    /// TCX labeling mode
    pub mode: RideMode,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            fit: true,
            tcx: true,
            mode: RideMode::Ride,
        }
    }
}

/// Result of one successful conversion.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    /// Shared artifact stem derived from the parsed start instant
    pub base_name: String,
    /// Path of the written FIT artifact, when enabled
    pub fit_path: Option<PathBuf>,
    /// Path of the written TCX artifact, when enabled
    pub tcx_path: Option<PathBuf>,
    /// Aggregates of the converted ride, for logging and operator summaries
    pub summary: RideSummary,
}

impl ConversionOutput {
    /// The artifact the upload sink should prefer: FIT over TCX.
    #[must_use]
    pub fn upload_candidate(&self) -> Option<&Path> {
        self.fit_path
            .as_deref()
            .or(self.tcx_path.as_deref())
    }
}

/// Convert one PWX document, writing enabled artifacts under `out_dir` as
/// `<base_name>.fit` / `<base_name>.tcx`.
///
/// Both artifacts are encoded fully in memory before anything touches the
/// filesystem, and each is persisted through a temp-file rename, so a
/// failed conversion never leaves a partial artifact where a downstream
/// uploader could pick it up.
///
/// # Errors
///
/// `ConvertError::Read` when the source is unreadable, `::Format` when it
/// is malformed, `::Encode` when persisting an artifact fails.
pub fn convert_file(
    input: &Path,
    out_dir: &Path,
    options: &ConvertOptions,
) -> Result<ConversionOutput, ConvertError> {
    let text = fs::read_to_string(input).map_err(|source| ConvertError::Read {
        path: input.to_path_buf(),
        source,
    })?;
    let doc = Document::parse(&text).map_err(FormatError::Xml)?;
    let workout = pwx::parse(&doc)?;
    let base_name = workout.start().base_name();
    debug!(input = %input.display(), %base_name, "parsed workout");

    // One aggregation pass up front validates the sample stream and gives
    // the pipeline its totals; each encoder then re-derives the same
    // values through the shared SummaryBuilder during its own pass.
    let mut builder = crate::summary::SummaryBuilder::new();
    for sample in workout.samples() {
        builder.observe(&sample.map_err(ConvertError::Format)?);
    }
    let summary = builder.finish();

    // Encode everything before writing anything.
    let fit_artifact = if options.fit {
        Some(fit::encode(&workout)?)
    } else {
        None
    };
    let tcx_artifact = if options.tcx {
        Some(tcx::encode(&workout, options.mode)?)
    } else {
        None
    };

    let fit_path = fit_artifact
        .map(|artifact| persist(out_dir, &base_name, &artifact))
        .transpose()?;
    let tcx_path = tcx_artifact
        .map(|artifact| persist(out_dir, &base_name, &artifact))
        .transpose()?;

    info!(
        %base_name,
        distance_m = summary.total_distance_m,
        ascent_m = summary.total_ascent_m,
        elapsed_s = summary.total_elapsed_s,
        "conversion complete"
    );

    Ok(ConversionOutput {
        base_name,
        fit_path,
        tcx_path,
        summary,
    })
}

/// Write encoded bytes to `<out_dir>/<base_name>.<ext>` through a temp
/// file in the same directory plus an atomic rename.
fn persist(
    out_dir: &Path,
    base_name: &str,
    artifact: &EncodedActivity,
) -> Result<PathBuf, EncodeError> {
    let target = out_dir.join(format!("{base_name}.{}", artifact.extension));
    let staging = out_dir.join(format!(".{base_name}.{}.tmp", artifact.extension));

    let write = |path: &Path| -> std::io::Result<()> {
        fs::write(path, &artifact.bytes)?;
        fs::rename(path, &target)
    };
    write(&staging).map_err(|source| {
        // best effort: do not leave the staging file around on failure
        let _ = fs::remove_file(&staging);
        EncodeError::Io {
            path: target.clone(),
            source,
        }
    })?;
    Ok(target)
}
