// ABOUTME: FIT binary activity encoder: file_id, timer events, per-sample records, lap, session
// ABOUTME: Single forward append-only pass; aggregates re-derived through SummaryBuilder
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! FIT activity encoder (format A).
//!
//! Emits the fixed message sequence some consuming services depend on:
//! file_id, timer-start event, one record per sample, lap, session, and a
//! closing timer-stop event. Every record carries the synthetic constant
//! position from [`crate::constants::position`] so time-series graphs keep
//! a map context even for indoor rides. Timestamps are carried as Unix
//! milliseconds up to this layer and converted to FIT-epoch seconds only
//! when the bytes are written.

mod inspect;
mod profile;
mod writer;

pub use inspect::{inspect, FitOverview};
pub use profile::mesg_name;

use crate::constants::{fit as fit_const, position};
use crate::errors::FormatError;
use crate::models::{EncodedActivity, RideSummary};
use crate::pwx::PwxWorkout;
use crate::summary::SummaryBuilder;

use profile::{local, mesg_num, EVENT_FIELDS, FILE_ID_FIELDS, LAP_FIELDS, RECORD_FIELDS, SESSION_FIELDS};
use writer::FitWriter;

/// Encode a parsed workout as a FIT activity file.
///
/// # Errors
///
/// Returns `FormatError` when the sample stream itself is malformed (a
/// sample without a time offset, or a non-numeric field value). Encoding
/// is otherwise infallible: the artifact is assembled fully in memory.
pub fn encode(workout: &PwxWorkout<'_, '_>) -> Result<EncodedActivity, FormatError> {
    let start = workout.start();
    let start_ts = fit_timestamp(start.timestamp_ms());
    let mut writer = FitWriter::new();

    writer.write_definition(local::FILE_ID, mesg_num::FILE_ID, FILE_ID_FIELDS);
    writer.data_header(local::FILE_ID);
    writer.put_u8(fit_const::FILE_TYPE_ACTIVITY);
    writer.put_u16(fit_const::MANUFACTURER_GARMIN);
    writer.put_u16(fit_const::PRODUCT_EDGE_530);
    writer.put_u32(fit_const::SERIAL_NUMBER);
    writer.put_u32(start_ts);

    writer.write_definition(local::EVENT, mesg_num::EVENT, EVENT_FIELDS);
    write_timer_event(&mut writer, start_ts, fit_const::EVENT_TYPE_START);

    writer.write_definition(local::RECORD, mesg_num::RECORD, RECORD_FIELDS);
    let lat = semicircles(position::SYNTHETIC_LAT_DEG);
    let lon = semicircles(position::SYNTHETIC_LON_DEG);
    let mut totals = SummaryBuilder::new();
    let mut last_ts = start_ts;

    for sample in workout.samples() {
        let sample = sample?;
        totals.observe(&sample);
        let ts = fit_timestamp(start.sample_timestamp_ms(sample.time_offset_s));
        last_ts = ts;

        writer.data_header(local::RECORD);
        writer.put_u32(ts);
        writer.put_i32(lat);
        writer.put_i32(lon);
        writer.put_opt_u32(sample.distance_m.map(distance_cm));
        writer.put_opt_u16(sample.altitude_m.map(altitude_scaled_u16));
        writer.put_opt_u32(sample.altitude_m.map(altitude_scaled_u32));
        writer.put_opt_u8(sample.heart_rate_bpm);
        writer.put_opt_u8(sample.cadence_rpm);
        writer.put_opt_u16(sample.power_w);
        writer.put_opt_u16(sample.speed_mps.map(speed_scaled_u16));
        writer.put_opt_u32(sample.speed_mps.map(speed_scaled_u32));
    }

    let summary = totals.finish();

    writer.write_definition(local::LAP, mesg_num::LAP, LAP_FIELDS);
    writer.data_header(local::LAP);
    write_totals(&mut writer, last_ts, start_ts, &summary);

    writer.write_definition(local::SESSION, mesg_num::SESSION, SESSION_FIELDS);
    writer.data_header(local::SESSION);
    write_totals(&mut writer, last_ts, start_ts, &summary);
    writer.put_u8(fit_const::SPORT_CYCLING);
    writer.put_u16(0); // first_lap_index
    writer.put_u16(1); // num_laps

    write_timer_event(&mut writer, last_ts, fit_const::EVENT_TYPE_STOP_ALL);

    Ok(EncodedActivity {
        bytes: writer.finish(),
        extension: "fit",
    })
}

/// Shared aggregate prefix of the lap and session messages.
fn write_totals(writer: &mut FitWriter, timestamp: u32, start_ts: u32, summary: &RideSummary) {
    let elapsed_ms = (summary.total_elapsed_s * 1000.0).round() as u32;
    writer.put_u32(timestamp);
    writer.put_u32(start_ts);
    writer.put_u32(elapsed_ms);
    writer.put_u32(elapsed_ms);
    writer.put_u32(distance_cm(summary.total_distance_m));
    writer.put_u16(speed_scaled_u16(summary.max_speed_mps));
    writer.put_u16(summary.total_ascent_m.round().clamp(0.0, 65534.0) as u16);
}

fn write_timer_event(writer: &mut FitWriter, timestamp: u32, event_type: u8) {
    writer.data_header(local::EVENT);
    writer.put_u32(timestamp);
    writer.put_u8(fit_const::EVENT_TIMER);
    writer.put_u8(event_type);
}

/// Unix milliseconds to FIT-epoch seconds.
fn fit_timestamp(unix_ms: i64) -> u32 {
    ((unix_ms as f64 / 1000.0).round() as i64 - fit_const::FIT_EPOCH_OFFSET_S).max(0) as u32
}

fn semicircles(degrees: f64) -> i32 {
    (degrees / 180.0 * 2_147_483_648.0).round() as i32
}

fn distance_cm(meters: f64) -> u32 {
    (meters * 100.0).round().max(0.0) as u32
}

/// altitude fields use scale 5, offset 500
fn altitude_scaled_u16(meters: f64) -> u16 {
    ((meters + 500.0) * 5.0).round().clamp(0.0, 65534.0) as u16
}

fn altitude_scaled_u32(meters: f64) -> u32 {
    ((meters + 500.0) * 5.0).round().max(0.0) as u32
}

fn speed_scaled_u16(mps: f64) -> u16 {
    (mps * 1000.0).round().clamp(0.0, 65534.0) as u16
}

fn speed_scaled_u32(mps: f64) -> u32 {
    (mps * 1000.0).round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_timestamp_epoch_conversion() {
        // 1989-12-31T00:00:00Z is second zero of the FIT epoch
        assert_eq!(fit_timestamp(631_065_600_000), 0);
        assert_eq!(fit_timestamp(631_065_601_000), 1);
        // sub-second values round to the nearest second
        assert_eq!(fit_timestamp(631_065_601_499), 1);
        assert_eq!(fit_timestamp(631_065_601_500), 2);
    }

    #[test]
    fn test_semicircles_matches_reference_position() {
        // 90 degrees is 2^30 semicircles
        assert_eq!(semicircles(90.0), 1_073_741_824);
        assert_eq!(semicircles(0.0), 0);
        let lat = semicircles(40.0150);
        let expected = (40.0150_f64 * (4_294_967_296.0 / 360.0)).round() as i32;
        assert_eq!(lat, expected);
    }

    #[test]
    fn test_scaling_helpers() {
        assert_eq!(distance_cm(200.0), 20_000);
        assert_eq!(altitude_scaled_u16(100.0), 3000);
        assert_eq!(altitude_scaled_u16(-600.0), 0);
        assert_eq!(speed_scaled_u16(11.0), 11_000);
    }
}
