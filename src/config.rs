// ABOUTME: Environment-based runtime configuration built once at startup and passed explicitly
// ABOUTME: Replaces process-global credential/feature flags with an explicit Config struct
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

use crate::constants::DEFAULT_POLL_INTERVAL_S;
use crate::convert::ConvertOptions;

/// Strava OAuth client credentials. Upload support is enabled only when
/// all three are configured.
#[derive(Debug, Clone)]
pub struct StravaCredentials {
    /// OAuth application client id
    pub client_id: String,
    /// OAuth application client secret
    pub client_secret: String,
    /// Long-lived refresh token obtained through the setup flow
    pub refresh_token: String,
}

/// Runtime configuration for the monitor and conversion pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory holding the original/converted/processed/failed layout
    pub base_dir: PathBuf,
    /// Inbox poll interval
    pub poll_interval: Duration,
    /// Which artifacts to produce and how to label the TCX
    pub options: ConvertOptions,
    /// Upload credentials, when fully configured
    pub strava: Option<StravaCredentials>,
}

impl Config {
    /// Build the configuration from the environment, with an optional
    /// CLI-supplied base directory taking precedence.
    #[must_use]
    pub fn from_env(cli_dir: Option<PathBuf>) -> Self {
        Self {
            base_dir: resolve_base_dir(cli_dir),
            poll_interval: poll_interval_from_env(),
            options: ConvertOptions::default(),
            strava: strava_credentials_from_env(),
        }
    }
}

/// Default mount points checked when nothing is configured. The Velotron
/// head unit exports to a volume named one of these.
const DEFAULT_MOUNTS: [&str; 3] = ["/veloMonitor", "/velotronMonitor", "/Volumes/veloMonitor"];

/// Resolve the monitored base directory. Precedence: CLI argument,
/// `MONITOR_PATH`, the first default mount that exists, then the current
/// directory.
#[must_use]
pub fn resolve_base_dir(cli_dir: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = cli_dir {
        return dir;
    }
    if let Ok(path) = env::var("MONITOR_PATH") {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    for candidate in DEFAULT_MOUNTS {
        let path = Path::new(candidate);
        if path.exists() {
            return path.to_path_buf();
        }
    }
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn poll_interval_from_env() -> Duration {
    let seconds = env::var("POLL_INTERVAL")
        .ok()
        .and_then(|raw| match raw.parse::<u64>() {
            Ok(value) if value > 0 => Some(value),
            _ => {
                warn!(raw = %raw, "ignoring invalid POLL_INTERVAL");
                None
            }
        })
        .unwrap_or(DEFAULT_POLL_INTERVAL_S);
    Duration::from_secs(seconds)
}

/// Read Strava credentials from the environment. Returns `None` (with a
/// warning naming what is missing) unless all three variables are set.
#[must_use]
pub fn strava_credentials_from_env() -> Option<StravaCredentials> {
    let client_id = env::var("STRAVA_CLIENT_ID").ok().filter(|v| !v.is_empty());
    let client_secret = env::var("STRAVA_CLIENT_SECRET").ok().filter(|v| !v.is_empty());
    let refresh_token = env::var("STRAVA_REFRESH_TOKEN").ok().filter(|v| !v.is_empty());

    match (client_id, client_secret, refresh_token) {
        (Some(client_id), Some(client_secret), Some(refresh_token)) => {
            info!("strava upload enabled");
            Some(StravaCredentials {
                client_id,
                client_secret,
                refresh_token,
            })
        }
        (client_id, client_secret, refresh_token) => {
            let mut missing = Vec::new();
            if client_id.is_none() {
                missing.push("STRAVA_CLIENT_ID");
            }
            if client_secret.is_none() {
                missing.push("STRAVA_CLIENT_SECRET");
            }
            if refresh_token.is_none() {
                missing.push("STRAVA_REFRESH_TOKEN");
            }
            if missing.len() < 3 {
                warn!(missing = ?missing, "strava upload disabled: credentials incomplete");
            }
            None
        }
    }
}
