//! TCX encoder structure tests
//!
//! The artifact is re-parsed and checked for the load-bearing trackpoint
//! element order, the patched lap distance, and extension-block gating.

mod common;

use roxmltree::Document;
use velobridge::models::RideMode;
use velobridge::tcx;

const TCX_NS: &str = "http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2";
const EXT_NS: &str = "http://www.garmin.com/xmlschemas/ActivityExtension/v2";

fn encode(content: &str, mode: RideMode) -> String {
    let doc = Document::parse(content).unwrap();
    let workout = velobridge::pwx::parse(&doc).unwrap();
    String::from_utf8(tcx::encode(&workout, mode).unwrap().bytes).unwrap()
}

fn element_names(parent: roxmltree::Node<'_, '_>) -> Vec<String> {
    parent
        .children()
        .filter(|n| n.is_element())
        .map(|n| n.tag_name().name().to_string())
        .collect()
}

#[test]
fn test_document_structure_and_lap_distance() {
    let text = encode(common::SAMPLE_PWX, RideMode::Ride);
    let doc = Document::parse(&text).unwrap();

    let activity = doc
        .descendants()
        .find(|n| n.has_tag_name((TCX_NS, "Activity")))
        .unwrap();
    assert_eq!(activity.attribute("Sport"), Some("Biking"));

    let id = activity
        .children()
        .find(|n| n.has_tag_name((TCX_NS, "Id")))
        .unwrap();
    assert!(id.text().unwrap().starts_with("2025-12-03T05:48:22"));

    let lap = activity
        .children()
        .find(|n| n.has_tag_name((TCX_NS, "Lap")))
        .unwrap();
    assert!(lap
        .attribute("StartTime")
        .unwrap()
        .starts_with("2025-12-03T05:48:22"));

    // declared duration surfaces as the lap total time; the distance is
    // the patched running maximum, 2-decimal formatted
    let total_time = lap
        .children()
        .find(|n| n.has_tag_name((TCX_NS, "TotalTimeSeconds")))
        .unwrap();
    assert_eq!(total_time.text(), Some("60.0"));
    let distance = lap
        .children()
        .find(|n| n.has_tag_name((TCX_NS, "DistanceMeters")))
        .unwrap();
    assert_eq!(distance.text(), Some("200.00"));

    let trackpoints: Vec<_> = doc
        .descendants()
        .filter(|n| n.has_tag_name((TCX_NS, "Trackpoint")))
        .collect();
    assert_eq!(trackpoints.len(), 3);

    let first_hr = trackpoints[0]
        .descendants()
        .find(|n| n.has_tag_name((TCX_NS, "Value")))
        .unwrap();
    assert_eq!(first_hr.text(), Some("120"));
}

#[test]
fn test_trackpoint_element_order_is_exact() {
    let text = encode(common::SAMPLE_PWX, RideMode::Ride);
    let doc = Document::parse(&text).unwrap();
    let first = doc
        .descendants()
        .find(|n| n.has_tag_name((TCX_NS, "Trackpoint")))
        .unwrap();

    assert_eq!(
        element_names(first),
        vec![
            "Time",
            "Position",
            "AltitudeMeters",
            "DistanceMeters",
            "HeartRateBpm",
            "Cadence",
            "Extensions"
        ]
    );
}

#[test]
fn test_synthetic_position_on_every_trackpoint() {
    let text = encode(common::SAMPLE_PWX, RideMode::Ride);
    let doc = Document::parse(&text).unwrap();

    let latitudes: Vec<_> = doc
        .descendants()
        .filter(|n| n.has_tag_name((TCX_NS, "LatitudeDegrees")))
        .map(|n| n.text().unwrap().to_string())
        .collect();
    assert_eq!(latitudes, vec!["40.0150"; 3]);

    let longitudes: Vec<_> = doc
        .descendants()
        .filter(|n| n.has_tag_name((TCX_NS, "LongitudeDegrees")))
        .map(|n| n.text().unwrap().to_string())
        .collect();
    assert_eq!(longitudes, vec!["-105.2705"; 3]);
}

#[test]
fn test_extension_block_present_when_power_or_speed() {
    // strip power from the middle sample, speed from the last: both still
    // get a TPX block; a sample with neither gets none
    let content = common::SAMPLE_PWX
        .replace("<pwr>210</pwr>\n      ", "")
        .replace("<spd>12</spd>\n    ", "")
        .replace("<pwr>220</pwr>\n      ", "");
    let text = encode(&content, RideMode::Ride);
    let doc = Document::parse(&text).unwrap();

    let trackpoints: Vec<_> = doc
        .descendants()
        .filter(|n| n.has_tag_name((TCX_NS, "Trackpoint")))
        .collect();

    // first sample kept power and speed
    let first_tpx = trackpoints[0]
        .descendants()
        .find(|n| n.has_tag_name((EXT_NS, "TPX")))
        .unwrap();
    let tpx_children: Vec<_> = first_tpx
        .children()
        .filter(|n| n.is_element())
        .map(|n| n.tag_name().name().to_string())
        .collect();
    assert_eq!(tpx_children, vec!["Watts", "Speed"]);

    // second lost power but kept speed: block present, Watts absent
    let second_tpx = trackpoints[1]
        .descendants()
        .find(|n| n.has_tag_name((EXT_NS, "TPX")))
        .unwrap();
    assert!(second_tpx
        .children()
        .any(|n| n.has_tag_name((EXT_NS, "Speed"))));
    assert!(!second_tpx
        .children()
        .any(|n| n.has_tag_name((EXT_NS, "Watts"))));

    // third lost both: no extension block at all
    assert!(!trackpoints[2]
        .descendants()
        .any(|n| n.has_tag_name((TCX_NS, "Extensions"))
            || n.has_tag_name((EXT_NS, "TPX"))));
}

#[test]
fn test_missing_optional_field_isolated_to_its_node() {
    let content = common::SAMPLE_PWX.replace("<hr>130</hr>\n      ", "");
    let text = encode(&content, RideMode::Ride);
    let doc = Document::parse(&text).unwrap();

    let hr_values: Vec<_> = doc
        .descendants()
        .filter(|n| n.has_tag_name((TCX_NS, "Value")))
        .map(|n| n.text().unwrap().to_string())
        .collect();
    assert_eq!(hr_values, vec!["120", "140"]);

    let trackpoints: Vec<_> = doc
        .descendants()
        .filter(|n| n.has_tag_name((TCX_NS, "Trackpoint")))
        .collect();
    assert!(!trackpoints[1]
        .children()
        .any(|n| n.has_tag_name((TCX_NS, "HeartRateBpm"))));
    // the neighbor fields on the same node are untouched
    assert!(trackpoints[1]
        .children()
        .any(|n| n.has_tag_name((TCX_NS, "Cadence"))));
}

#[test]
fn test_empty_workout_has_lap_but_no_trackpoints() {
    let text = encode(common::EMPTY_PWX, RideMode::Ride);
    let doc = Document::parse(&text).unwrap();

    assert!(doc
        .descendants()
        .any(|n| n.has_tag_name((TCX_NS, "Lap"))));
    assert_eq!(
        doc.descendants()
            .filter(|n| n.has_tag_name((TCX_NS, "Trackpoint")))
            .count(),
        0
    );
    // no declared duration means no TotalTimeSeconds element
    assert!(!doc
        .descendants()
        .any(|n| n.has_tag_name((TCX_NS, "TotalTimeSeconds"))));
    // placeholder patched with the zero running maximum
    let distance = doc
        .descendants()
        .find(|n| n.has_tag_name((TCX_NS, "DistanceMeters")))
        .unwrap();
    assert_eq!(distance.text(), Some("0.00"));
}

#[test]
fn test_creator_block_marks_trusted_device() {
    let text = encode(common::SAMPLE_PWX, RideMode::Ride);
    let doc = Document::parse(&text).unwrap();

    let creator = doc
        .descendants()
        .find(|n| n.has_tag_name((TCX_NS, "Creator")))
        .unwrap();
    let name = creator
        .children()
        .find(|n| n.has_tag_name((TCX_NS, "Name")))
        .unwrap();
    assert_eq!(name.text(), Some("Garmin Edge 530"));
}
