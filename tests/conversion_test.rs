//! End-to-end conversion pipeline tests
//!
//! Covers the documented aggregate properties, artifact naming, failure
//! atomicity, and namespace handling of the PWX reader.

mod common;

use std::fs;

use tempfile::tempdir;
use velobridge::convert::{convert_file, ConvertOptions};
use velobridge::errors::{ConvertError, FormatError};
use velobridge::models::RideMode;

fn default_options() -> ConvertOptions {
    ConvertOptions::default()
}

#[test]
fn test_convert_produces_both_artifacts() {
    let dir = tempdir().unwrap();
    let input = common::write_file(dir.path(), "ride.pwx", common::SAMPLE_PWX);

    let output = convert_file(&input, dir.path(), &default_options()).unwrap();

    assert_eq!(output.base_name, common::SAMPLE_BASE_NAME);
    let fit_path = output.fit_path.as_ref().unwrap();
    let tcx_path = output.tcx_path.as_ref().unwrap();
    assert_eq!(
        fit_path.file_name().unwrap().to_str().unwrap(),
        format!("{}.fit", common::SAMPLE_BASE_NAME)
    );
    assert_eq!(
        tcx_path.file_name().unwrap().to_str().unwrap(),
        format!("{}.tcx", common::SAMPLE_BASE_NAME)
    );
    assert!(fit_path.exists());
    assert!(tcx_path.exists());

    assert_eq!(output.summary.total_distance_m, 200.0);
    assert_eq!(output.summary.total_ascent_m, 10.0);
    assert_eq!(output.summary.total_elapsed_s, 60.0);
}

#[test]
fn test_upload_candidate_prefers_fit() {
    let dir = tempdir().unwrap();
    let input = common::write_file(dir.path(), "ride.pwx", common::SAMPLE_PWX);

    let both = convert_file(&input, dir.path(), &default_options()).unwrap();
    assert_eq!(both.upload_candidate(), both.fit_path.as_deref());

    let tcx_only = ConvertOptions {
        fit: false,
        ..default_options()
    };
    let output = convert_file(&input, dir.path(), &tcx_only).unwrap();
    assert_eq!(output.upload_candidate(), output.tcx_path.as_deref());
}

#[test]
fn test_repeat_conversion_is_byte_identical() {
    let dir = tempdir().unwrap();
    let input = common::write_file(dir.path(), "ride.pwx", common::SAMPLE_PWX);

    let first = convert_file(&input, dir.path(), &default_options()).unwrap();
    let fit_first = fs::read(first.fit_path.as_ref().unwrap()).unwrap();
    let tcx_first = fs::read(first.tcx_path.as_ref().unwrap()).unwrap();

    let second = convert_file(&input, dir.path(), &default_options()).unwrap();
    let fit_second = fs::read(second.fit_path.as_ref().unwrap()).unwrap();
    let tcx_second = fs::read(second.tcx_path.as_ref().unwrap()).unwrap();

    assert_eq!(fit_first, fit_second);
    assert_eq!(tcx_first, tcx_second);
}

#[test]
fn test_empty_sample_sequence_converts_cleanly() {
    let dir = tempdir().unwrap();
    let input = common::write_file(dir.path(), "empty.pwx", common::EMPTY_PWX);

    let output = convert_file(&input, dir.path(), &default_options()).unwrap();
    assert_eq!(output.summary.total_distance_m, 0.0);
    assert_eq!(output.summary.total_ascent_m, 0.0);
    assert_eq!(output.summary.total_elapsed_s, 0.0);
    assert!(output.fit_path.as_ref().unwrap().exists());
    assert!(output.tcx_path.as_ref().unwrap().exists());
}

#[test]
fn test_malformed_xml_leaves_no_artifact() {
    let dir = tempdir().unwrap();
    let out_dir = dir.path().join("out");
    fs::create_dir(&out_dir).unwrap();
    let input = common::write_file(dir.path(), "corrupt.pwx", "this is not xml");

    let result = convert_file(&input, &out_dir, &default_options());
    assert!(matches!(
        result,
        Err(ConvertError::Format(FormatError::Xml(_)))
    ));
    assert_eq!(fs::read_dir(&out_dir).unwrap().count(), 0);
}

#[test]
fn test_missing_time_leaves_no_artifact() {
    let dir = tempdir().unwrap();
    let out_dir = dir.path().join("out");
    fs::create_dir(&out_dir).unwrap();
    let content = common::SAMPLE_PWX.replace("<time>2025-12-03T05:48:22</time>", "");
    let input = common::write_file(dir.path(), "no_time.pwx", &content);

    let result = convert_file(&input, &out_dir, &default_options());
    assert!(matches!(
        result,
        Err(ConvertError::Format(FormatError::MissingStartTime))
    ));
    assert_eq!(fs::read_dir(&out_dir).unwrap().count(), 0);
}

#[test]
fn test_sample_without_timeoffset_fails_conversion() {
    let dir = tempdir().unwrap();
    let out_dir = dir.path().join("out");
    fs::create_dir(&out_dir).unwrap();
    let content = common::SAMPLE_PWX.replace(
        "<timeoffset>30</timeoffset>\n      ",
        "",
    );
    let input = common::write_file(dir.path(), "bad_sample.pwx", &content);

    let result = convert_file(&input, &out_dir, &default_options());
    assert!(matches!(
        result,
        Err(ConvertError::Format(FormatError::MissingTimeOffset { index: 1 }))
    ));
    assert_eq!(fs::read_dir(&out_dir).unwrap().count(), 0);
}

#[test]
fn test_alternate_namespace_accepted() {
    let dir = tempdir().unwrap();
    let content = common::SAMPLE_PWX.replace(
        "http://www.peaksware.com/PWX/1/0",
        "http://www.thierrys-world.de/pwx/",
    );
    let input = common::write_file(dir.path(), "alt_ns.pwx", &content);

    let output = convert_file(&input, dir.path(), &default_options()).unwrap();
    assert_eq!(output.summary.total_distance_m, 200.0);
}

#[test]
fn test_unnamespaced_document_accepted() {
    let dir = tempdir().unwrap();
    let content =
        common::SAMPLE_PWX.replace(r#" xmlns="http://www.peaksware.com/PWX/1/0""#, "");
    let input = common::write_file(dir.path(), "no_ns.pwx", &content);

    let output = convert_file(&input, dir.path(), &default_options()).unwrap();
    assert_eq!(output.summary.total_elapsed_s, 60.0);
}

#[test]
fn test_virtual_ride_mode_changes_label_only() {
    let dir = tempdir().unwrap();
    let input = common::write_file(dir.path(), "ride.pwx", common::SAMPLE_PWX);

    let plain = convert_file(&input, dir.path(), &default_options()).unwrap();
    let plain_tcx = fs::read_to_string(plain.tcx_path.as_ref().unwrap()).unwrap();

    let virtual_options = ConvertOptions {
        mode: RideMode::VirtualRide,
        ..default_options()
    };
    let virt = convert_file(&input, dir.path(), &virtual_options).unwrap();
    let virt_tcx = fs::read_to_string(virt.tcx_path.as_ref().unwrap()).unwrap();

    assert!(plain_tcx.contains(r#"Sport="Biking""#));
    assert!(virt_tcx.contains(r#"Sport="VirtualRide""#));
    // numeric content is identical in both modes
    assert_eq!(
        plain_tcx.replace("Biking", "VirtualRide"),
        virt_tcx
    );
}
