// ABOUTME: Error taxonomy for parsing, encoding, conversion, and upload failures
// ABOUTME: Structured thiserror enums; binaries wrap these in anyhow at the top level
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::path::PathBuf;

/// Malformed or incomplete source document. Fatal to a single conversion;
/// the pipeline guarantees no partial artifact is left behind.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The document is not well-formed XML
    #[error("workout file is not well-formed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    /// No workout container element in the document
    #[error("no 'workout' element found in PWX document")]
    MissingWorkout,

    /// The workout has no start-time element
    #[error("no start time found in workout")]
    MissingStartTime,

    /// The start-time text is not a recognizable timestamp
    #[error("cannot parse workout start time '{value}'")]
    InvalidStartTime {
        /// Raw text of the time element
        value: String,
    },

    /// A sample is missing its required time offset
    #[error("sample {index} has no 'timeoffset' element")]
    MissingTimeOffset {
        /// Zero-based position of the sample in document order
        index: usize,
    },

    /// The summary section declares a non-numeric duration
    #[error("summary declares invalid duration '{value}'")]
    InvalidDuration {
        /// Raw text of the duration element
        value: String,
    },

    /// A present sample field failed numeric parsing
    #[error("sample {index} has invalid '{field}' value '{value}'")]
    InvalidSampleValue {
        /// Zero-based position of the sample in document order
        index: usize,
        /// Element name of the offending field
        field: &'static str,
        /// Raw text that failed to parse
        value: String,
    },

    /// The bytes are not a FIT file (inspection only)
    #[error("not a FIT file: {reason}")]
    InvalidFit {
        /// What the inspector rejected
        reason: String,
    },
}

/// I/O failure while persisting a finished artifact. Fatal to that
/// conversion only.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// Writing or renaming the target artifact failed
    #[error("failed to write artifact {}: {source}", path.display())]
    Io {
        /// Destination path of the artifact
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// In-memory serialization of the markup document failed
    #[error("failed to serialize TCX document: {0}")]
    Serialize(String),
}

/// Everything that can end one conversion. Upload failures are deliberately
/// not part of this: a conversion that succeeds but fails to upload is
/// still a successful conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Reading the source document failed
    #[error("failed to read source file {}: {source}", path.display())]
    Read {
        /// Path of the source document
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The source document is malformed
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Persisting an artifact failed
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Upload-sink failures. Non-fatal to the conversion that produced the
/// artifact; the monitor logs these and moves on. A duplicate activity is
/// not an error at all (`UploadOutcome::Duplicate`).
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Credential exchange was rejected (bad client id/secret or refresh token)
    #[error("strava authentication failed: {0}")]
    Auth(String),

    /// The API rejected the upload for a non-duplicate reason
    #[error("strava rejected upload ({status}): {message}")]
    Rejected {
        /// HTTP status code of the rejection
        status: u16,
        /// Message extracted from the error body
        message: String,
    },

    /// Transport-level failure talking to the API
    #[error("strava request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The artifact extension is not accepted by the sink
    #[error("unsupported upload format '{0}' (expected fit or tcx)")]
    UnsupportedFormat(String),
}
