// ABOUTME: Shared constants for FIT profile numbers, Strava endpoints, and monitor layout
// ABOUTME: Values are grouped by domain; environment-tunable settings live in config, not here
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

/// Synthetic geographic position stamped on every per-sample output node.
///
/// Strava only renders heart-rate/power graphs over time when the file has
/// position data, so indoor rides get a fixed point near Boulder, CO. This
/// is a compatibility shim, not a real position.
pub mod position {
    /// Latitude in degrees
    pub const SYNTHETIC_LAT_DEG: f64 = 40.0150;
    /// Longitude in degrees
    pub const SYNTHETIC_LON_DEG: f64 = -105.2705;
}

/// FIT profile numbers used by the binary encoder
pub mod fit {
    /// Seconds between the Unix epoch and the FIT epoch (1989-12-31T00:00:00Z)
    pub const FIT_EPOCH_OFFSET_S: i64 = 631_065_600;

    /// Garmin manufacturer id
    pub const MANUFACTURER_GARMIN: u16 = 1;
    /// Garmin Edge 530 product id, taken from a known-good reference file
    pub const PRODUCT_EDGE_530: u16 = 3121;
    /// Serial number stamped into file_id
    pub const SERIAL_NUMBER: u32 = 12345;

    /// file_id type for an activity file
    pub const FILE_TYPE_ACTIVITY: u8 = 4;
    /// Sport enum for cycling
    pub const SPORT_CYCLING: u8 = 2;
    /// event enum: timer
    pub const EVENT_TIMER: u8 = 0;
    /// event_type enum: start
    pub const EVENT_TYPE_START: u8 = 0;
    /// event_type enum: stop_all
    pub const EVENT_TYPE_STOP_ALL: u8 = 4;
}

/// Strava API endpoints and OAuth scope
pub mod strava {
    /// Upload and status endpoint base
    pub const API_BASE: &str = "https://www.strava.com/api/v3";
    /// Token refresh / code exchange endpoint
    pub const TOKEN_URL: &str = "https://www.strava.com/oauth/token";
    /// Interactive authorization endpoint
    pub const AUTH_URL: &str = "https://www.strava.com/oauth/authorize";
    /// Scopes required for uploading and reading back activities
    pub const UPLOAD_SCOPES: &str = "activity:write,activity:read_all";
    /// Refresh the access token when it expires within this window
    pub const TOKEN_EXPIRY_MARGIN_S: i64 = 300;
    /// Description attached to uploaded activities
    pub const UPLOAD_DESCRIPTION: &str = "Uploaded by Velobridge";
}

/// Directory layout under the monitored base directory
pub mod dirs {
    /// Incoming PWX files are dropped here
    pub const INBOX: &str = "original";
    /// Finished FIT/TCX artifacts
    pub const CONVERTED: &str = "converted";
    /// Successfully converted sources
    pub const PROCESSED: &str = "processed";
    /// Quarantine for sources that failed conversion
    pub const FAILED: &str = "failed";
}

/// Default monitor poll interval in seconds
pub const DEFAULT_POLL_INTERVAL_S: u64 = 2;
