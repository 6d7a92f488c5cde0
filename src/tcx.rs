// ABOUTME: TCX markup activity encoder with strict trackpoint element ordering
// ABOUTME: Owned-node build, lap distance placeholder patched after the pass, serialized once
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! TCX activity encoder (format B).
//!
//! The document is assembled as owned nodes in memory: the lap carries a
//! placeholder distance at creation time and is patched with the final
//! running maximum once the per-sample pass completes, then everything is
//! serialized in a single shot — a two-phase write by design, never a
//! partially flushed artifact. Trackpoint child order (Time, Position,
//! Altitude, Distance, HeartRateBpm, Cadence, Extensions) is load-bearing
//! for some consumers and must not be reordered.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::constants::{fit as device, position};
use crate::errors::{ConvertError, EncodeError};
use crate::models::{EncodedActivity, RideMode};
use crate::pwx::PwxWorkout;
use crate::summary::SummaryBuilder;

const TCX_NS: &str = "http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2";
const EXT_NS: &str = "http://www.garmin.com/xmlschemas/ActivityExtension/v2";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const TCX_XSD: &str = "http://www.garmin.com/xmlschemas/TrainingCenterDatabasev2.xsd";

/// Device block constants. Strava only trusts file-supplied elevation when
/// the creator looks like a barometric head unit.
const CREATOR_NAME: &str = "Garmin Edge 530";

/// One per-sample output node, owned until the single serialization pass.
#[derive(Debug, Clone)]
struct Trackpoint {
    time: String,
    altitude_m: Option<f64>,
    distance_m: Option<f64>,
    heart_rate_bpm: Option<u8>,
    cadence_rpm: Option<u8>,
    power_w: Option<u16>,
    speed_mps: Option<f64>,
}

#[derive(Debug, Clone)]
struct LapSummary {
    start_time: String,
    total_time_s: Option<f64>,
    distance_m: f64,
}

/// Encode a parsed workout as a TCX document.
///
/// # Errors
///
/// Returns `ConvertError::Format` when the sample stream is malformed and
/// `ConvertError::Encode` if document serialization fails.
pub fn encode(
    workout: &PwxWorkout<'_, '_>,
    mode: RideMode,
) -> Result<EncodedActivity, ConvertError> {
    let start = workout.start();
    let start_text = rfc3339(start.instant);

    // Lap is created with a placeholder distance; the real value is only
    // known after the full per-sample pass and is patched in below.
    let mut lap = LapSummary {
        start_time: start_text.clone(),
        total_time_s: workout.declared_duration_s(),
        distance_m: 0.0,
    };

    let mut totals = SummaryBuilder::new();
    let mut trackpoints = Vec::new();
    for sample in workout.samples() {
        let sample = sample?;
        totals.observe(&sample);
        trackpoints.push(Trackpoint {
            time: rfc3339(start.sample_time(sample.time_offset_s)),
            altitude_m: sample.altitude_m,
            distance_m: sample.distance_m,
            heart_rate_bpm: sample.heart_rate_bpm,
            cadence_rpm: sample.cadence_rpm,
            power_w: sample.power_w,
            speed_mps: sample.speed_mps,
        });
    }

    let summary = totals.finish();
    lap.distance_m = summary.total_distance_m;

    let bytes = serialize(mode.tcx_sport(), &start_text, &lap, &trackpoints)
        .map_err(|e| EncodeError::Serialize(e.to_string()))?;

    Ok(EncodedActivity {
        bytes,
        extension: "tcx",
    })
}

fn rfc3339(instant: DateTime<FixedOffset>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, false)
}

fn serialize(
    sport: &str,
    activity_id: &str,
    lap: &LapSummary,
    trackpoints: &[Trackpoint],
) -> Result<Vec<u8>, quick_xml::Error> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("TrainingCenterDatabase");
    root.push_attribute(("xmlns", TCX_NS));
    root.push_attribute(("xmlns:ax", EXT_NS));
    root.push_attribute(("xmlns:xsi", XSI_NS));
    root.push_attribute(("xsi:schemaLocation", format!("{TCX_NS} {TCX_XSD}").as_str()));
    writer.write_event(Event::Start(root))?;

    writer.write_event(Event::Start(BytesStart::new("Activities")))?;
    let mut activity = BytesStart::new("Activity");
    activity.push_attribute(("Sport", sport));
    writer.write_event(Event::Start(activity))?;
    leaf(&mut writer, "Id", activity_id)?;

    let mut lap_start = BytesStart::new("Lap");
    lap_start.push_attribute(("StartTime", lap.start_time.as_str()));
    writer.write_event(Event::Start(lap_start))?;
    if let Some(total) = lap.total_time_s {
        leaf(&mut writer, "TotalTimeSeconds", &format!("{total:.1}"))?;
    }
    leaf(&mut writer, "DistanceMeters", &format!("{:.2}", lap.distance_m))?;

    writer.write_event(Event::Start(BytesStart::new("Track")))?;
    for point in trackpoints {
        write_trackpoint(&mut writer, point)?;
    }
    writer.write_event(Event::End(BytesEnd::new("Track")))?;
    writer.write_event(Event::End(BytesEnd::new("Lap")))?;

    write_creator(&mut writer)?;

    writer.write_event(Event::End(BytesEnd::new("Activity")))?;
    writer.write_event(Event::End(BytesEnd::new("Activities")))?;
    writer.write_event(Event::End(BytesEnd::new("TrainingCenterDatabase")))?;

    Ok(writer.into_inner())
}

/// Child order here is fixed by the consuming services; see module docs.
fn write_trackpoint(
    writer: &mut Writer<Vec<u8>>,
    point: &Trackpoint,
) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new("Trackpoint")))?;

    leaf(writer, "Time", &point.time)?;

    writer.write_event(Event::Start(BytesStart::new("Position")))?;
    leaf(
        writer,
        "LatitudeDegrees",
        &format!("{:.4}", position::SYNTHETIC_LAT_DEG),
    )?;
    leaf(
        writer,
        "LongitudeDegrees",
        &format!("{:.4}", position::SYNTHETIC_LON_DEG),
    )?;
    writer.write_event(Event::End(BytesEnd::new("Position")))?;

    if let Some(alt) = point.altitude_m {
        leaf(writer, "AltitudeMeters", &format!("{alt}"))?;
    }
    if let Some(dist) = point.distance_m {
        leaf(writer, "DistanceMeters", &format!("{dist:.2}"))?;
    }
    if let Some(hr) = point.heart_rate_bpm {
        writer.write_event(Event::Start(BytesStart::new("HeartRateBpm")))?;
        leaf(writer, "Value", &format!("{hr}"))?;
        writer.write_event(Event::End(BytesEnd::new("HeartRateBpm")))?;
    }
    if let Some(cad) = point.cadence_rpm {
        leaf(writer, "Cadence", &format!("{cad}"))?;
    }

    // The extension block exists when either power or speed is present;
    // the two fields stay independent inside it.
    if point.power_w.is_some() || point.speed_mps.is_some() {
        writer.write_event(Event::Start(BytesStart::new("Extensions")))?;
        writer.write_event(Event::Start(BytesStart::new("ax:TPX")))?;
        if let Some(power) = point.power_w {
            leaf(writer, "ax:Watts", &format!("{power}"))?;
        }
        if let Some(speed) = point.speed_mps {
            leaf(writer, "ax:Speed", &format!("{speed}"))?;
        }
        writer.write_event(Event::End(BytesEnd::new("ax:TPX")))?;
        writer.write_event(Event::End(BytesEnd::new("Extensions")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("Trackpoint")))?;
    Ok(())
}

fn write_creator(writer: &mut Writer<Vec<u8>>) -> Result<(), quick_xml::Error> {
    let mut creator = BytesStart::new("Creator");
    creator.push_attribute(("xsi:type", "Device_t"));
    writer.write_event(Event::Start(creator))?;
    leaf(writer, "Name", CREATOR_NAME)?;
    leaf(writer, "UnitId", &format!("{}", device::SERIAL_NUMBER))?;
    leaf(writer, "ProductID", &format!("{}", device::PRODUCT_EDGE_530))?;
    writer.write_event(Event::Start(BytesStart::new("Version")))?;
    leaf(writer, "VersionMajor", "9")?;
    leaf(writer, "VersionMinor", "75")?;
    leaf(writer, "BuildMajor", "0")?;
    leaf(writer, "BuildMinor", "0")?;
    writer.write_event(Event::End(BytesEnd::new("Version")))?;
    writer.write_event(Event::End(BytesEnd::new("Creator")))?;
    Ok(())
}

fn leaf(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
