// ABOUTME: Velobridge library: PWX parsing, FIT/TCX encoding, Strava upload, directory monitor
// ABOUTME: The conversion core is pure; filesystem and network glue live at the edges
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # Velobridge
//!
//! Watches a drop directory for Velotron/TrainingPeaks PWX workout
//! exports, transcodes each one into a FIT and a TCX activity file, and
//! optionally uploads the result to Strava.
//!
//! The core is the sample-stream transcoder: [`pwx`] walks the ordered
//! time series once per consumer, [`summary`] folds running aggregates
//! (maximum distance, maximum speed, positive-delta ascent, elapsed
//! time), and [`fit`]/[`tcx`] render per-sample records plus internally
//! consistent lap/session summaries. Everything else — [`monitor`]'s
//! polling loop and [`upload`]'s Strava client — is thin glue behind
//! narrow interfaces.

/// Environment-based runtime configuration
pub mod config;

/// Shared constants: FIT profile numbers, Strava endpoints, directory names
pub mod constants;

/// One-shot conversion pipeline with atomic artifact persistence
pub mod convert;

/// Error taxonomy: `FormatError`, `EncodeError`, `ConvertError`, `UploadError`
pub mod errors;

/// FIT binary activity encoder and container inspector
pub mod fit;

/// Core domain types: `ActivityStart`, `Sample`, `RideSummary`
pub mod models;

/// Directory polling loop with per-file failure isolation
pub mod monitor;

/// PWX document reader with dynamic namespace detection
pub mod pwx;

/// Running-aggregate accumulator shared by both encoders
pub mod summary;

/// TCX markup activity encoder
pub mod tcx;

/// Upload sink trait and the Strava implementation
pub mod upload;
