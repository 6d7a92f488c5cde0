//! Strava upload sink tests: rejection classification, token refresh
//! policy, and the authorization URL. No network involved.

use reqwest::StatusCode;
use velobridge::config::StravaCredentials;
use velobridge::errors::UploadError;
use velobridge::upload::strava::{authorization_url, classify_rejection, StravaUploader};
use velobridge::upload::{UploadOutcome, UploadSink};

fn test_credentials() -> StravaCredentials {
    StravaCredentials {
        client_id: "client_id".to_string(),
        client_secret: "client_secret".to_string(),
        refresh_token: "refresh_token".to_string(),
    }
}

#[test]
fn test_conflict_status_is_duplicate() {
    let result = classify_rejection(StatusCode::CONFLICT, "{}");
    assert!(matches!(result, Ok(UploadOutcome::Duplicate)));
}

#[test]
fn test_duplicate_marker_in_body_is_duplicate() {
    let body = r#"{"message":"Conflict","errors":[{"resource":"Upload","field":"activity","code":"duplicate"}]}"#;
    let result = classify_rejection(StatusCode::BAD_REQUEST, body);
    assert!(matches!(result, Ok(UploadOutcome::Duplicate)));
}

#[test]
fn test_unauthorized_is_auth_error() {
    let result = classify_rejection(StatusCode::UNAUTHORIZED, r#"{"message":"Authorization Error"}"#);
    assert!(matches!(result, Err(UploadError::Auth(_))));
}

#[test]
fn test_other_rejection_carries_status_and_message() {
    let result = classify_rejection(
        StatusCode::UNPROCESSABLE_ENTITY,
        r#"{"message":"malformed file"}"#,
    );
    match result {
        Err(UploadError::Rejected { status, message }) => {
            assert_eq!(status, 422);
            assert_eq!(message, "malformed file");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[test]
fn test_fresh_uploader_needs_token() {
    let uploader = StravaUploader::new(test_credentials());
    assert!(uploader.needs_refresh(0));
    assert!(uploader.needs_refresh(1_700_000_000));
}

#[tokio::test]
async fn test_unsupported_extension_rejected_before_any_request() {
    let mut uploader = StravaUploader::new(test_credentials());
    let result = uploader.upload("ride.gpx", "gpx", b"bytes").await;
    assert!(matches!(
        result,
        Err(UploadError::UnsupportedFormat(ext)) if ext == "gpx"
    ));
}

#[test]
fn test_authorization_url_carries_client_and_scope() {
    let url = authorization_url("12345", "http://localhost").unwrap();
    assert!(url.starts_with("https://www.strava.com/oauth/authorize?"));
    assert!(url.contains("client_id=12345"));
    assert!(url.contains("response_type=code"));
    assert!(url.contains("activity%3Awrite"));
}
