// ABOUTME: Core domain types shared by the parser, aggregator, encoders, and upload sink
// ABOUTME: ActivityStart, Sample, RideSummary, EncodedActivity, and the TCX labeling mode
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use chrono::{DateTime, Duration, FixedOffset};

/// Parsed start instant of a workout, always carrying an explicit UTC
/// offset. When the source document omits one, the local offset at parse
/// time is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityStart {
    /// The start instant with its resolved offset
    pub instant: DateTime<FixedOffset>,
}

impl ActivityStart {
    #[must_use]
    pub fn new(instant: DateTime<FixedOffset>) -> Self {
        Self { instant }
    }

    /// Start instant as Unix milliseconds
    #[must_use]
    pub fn timestamp_ms(&self) -> i64 {
        self.instant.timestamp_millis()
    }

    /// Instant of a sample at the given offset, millisecond resolution
    #[must_use]
    pub fn sample_time(&self, time_offset_s: f64) -> DateTime<FixedOffset> {
        self.instant + Duration::milliseconds((time_offset_s * 1000.0).round() as i64)
    }

    /// Unix milliseconds of a sample at the given offset
    #[must_use]
    pub fn sample_timestamp_ms(&self, time_offset_s: f64) -> i64 {
        self.timestamp_ms() + (time_offset_s * 1000.0).round() as i64
    }

    /// Shared artifact base name for this workout: `YYYY-MM-DD_HH-MM-SS`
    /// in the workout's own offset. Both output formats use it so a given
    /// input always maps to one artifact pair.
    #[must_use]
    pub fn base_name(&self) -> String {
        self.instant.format("%Y-%m-%d_%H-%M-%S").to_string()
    }
}

/// One timestamped observation from the source time series. Every optional
/// field is independently present or absent; absence means the field is
/// omitted from the output node, never zeroed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sample {
    /// Seconds since the workout start, non-negative
    pub time_offset_s: f64,
    /// Cumulative distance in meters
    pub distance_m: Option<f64>,
    /// Altitude in meters
    pub altitude_m: Option<f64>,
    /// Heart rate in beats per minute
    pub heart_rate_bpm: Option<u8>,
    /// Cadence in revolutions per minute
    pub cadence_rpm: Option<u8>,
    /// Power in watts
    pub power_w: Option<u16>,
    /// Speed in meters per second
    pub speed_mps: Option<f64>,
}

/// Whole-activity aggregates derived from one pass over the samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RideSummary {
    /// Running maximum of observed distance values — deliberately not the
    /// last value, tolerating non-monotonic or duplicate distances
    pub total_distance_m: f64,
    /// Maximum observed speed
    pub max_speed_mps: f64,
    /// Sum of positive altitude deltas across the previous-altitude chain
    pub total_ascent_m: f64,
    /// Time offset of the last sample, 0 when there are none
    pub total_elapsed_s: f64,
}

/// A finished output artifact: the encoded bytes plus the file extension
/// they should be written under. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedActivity {
    /// Fully encoded file contents
    pub bytes: Vec<u8>,
    /// Extension without the dot (`fit` or `tcx`)
    pub extension: &'static str,
}

/// Labeling mode for the TCX encoder. Affects descriptive metadata only;
/// numeric content is identical in both modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RideMode {
    /// Generic outdoor/indoor cycling
    #[default]
    Ride,
    /// Trainer sessions labeled so Strava files them as virtual rides
    VirtualRide,
}

impl RideMode {
    /// Sport attribute value for the TCX Activity element
    #[must_use]
    pub fn tcx_sport(self) -> &'static str {
        match self {
            Self::Ride => "Biking",
            Self::VirtualRide => "VirtualRide",
        }
    }
}
