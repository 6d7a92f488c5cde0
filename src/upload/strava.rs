// ABOUTME: Strava implementation of the upload sink: token refresh, multipart upload, status polls
// ABOUTME: Duplicate rejections classify as UploadOutcome::Duplicate, credential failures as Auth
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{UploadHandle, UploadOutcome, UploadSink, UploadStatus};
use crate::config::StravaCredentials;
use crate::constants::strava;
use crate::errors::UploadError;

/// Endpoint set, overridable so tests and staging never hit the real API.
#[derive(Debug, Clone)]
pub struct StravaEndpoints {
    /// REST base, e.g. `https://www.strava.com/api/v3`
    pub api_base: String,
    /// OAuth token endpoint
    pub token_url: String,
}

impl Default for StravaEndpoints {
    fn default() -> Self {
        Self {
            api_base: strava::API_BASE.to_string(),
            token_url: strava::TOKEN_URL.to_string(),
        }
    }
}

/// Upload client holding the refresh credentials and the current
/// short-lived access token.
pub struct StravaUploader {
    client: Client,
    credentials: StravaCredentials,
    endpoints: StravaEndpoints,
    access_token: Option<String>,
    expires_at: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: i64,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    activity_id: Option<u64>,
}

impl StravaUploader {
    #[must_use]
    pub fn new(credentials: StravaCredentials) -> Self {
        Self::with_endpoints(credentials, StravaEndpoints::default())
    }

    #[must_use]
    pub fn with_endpoints(credentials: StravaCredentials, endpoints: StravaEndpoints) -> Self {
        Self {
            client: Client::new(),
            credentials,
            endpoints,
            access_token: None,
            expires_at: 0,
        }
    }

    /// Whether the access token must be refreshed before the next call:
    /// missing, or expiring within the configured margin.
    #[must_use]
    pub fn needs_refresh(&self, now: i64) -> bool {
        self.access_token.is_none() || now > self.expires_at - strava::TOKEN_EXPIRY_MARGIN_S
    }

    async fn ensure_token(&mut self) -> Result<(), UploadError> {
        if self.needs_refresh(Utc::now().timestamp()) {
            self.refresh_access_token().await?;
        }
        Ok(())
    }

    /// Exchange the refresh token for a fresh access token. Strava may
    /// rotate the refresh token; when it does, the new one replaces ours.
    ///
    /// # Errors
    ///
    /// `UploadError::Auth` when the credential exchange is rejected,
    /// `UploadError::Transport` when the endpoint is unreachable.
    pub async fn refresh_access_token(&mut self) -> Result<(), UploadError> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", self.credentials.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(&self.endpoints.token_url)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Auth(auth_failure_message(&body)));
        }

        let token: TokenResponse = response.json().await?;
        self.access_token = Some(token.access_token);
        self.expires_at = token.expires_at;
        if let Some(rotated) = token.refresh_token {
            self.credentials.refresh_token = rotated;
        }
        info!("refreshed strava access token");
        Ok(())
    }
}

#[async_trait]
impl UploadSink for StravaUploader {
    async fn upload(
        &mut self,
        file_name: &str,
        extension: &str,
        bytes: &[u8],
    ) -> Result<UploadOutcome, UploadError> {
        if extension != "fit" && extension != "tcx" {
            return Err(UploadError::UnsupportedFormat(extension.to_string()));
        }
        self.ensure_token().await?;
        let token = self.access_token.clone().unwrap_or_default();

        debug!(file_name, extension, size = bytes.len(), "uploading to strava");
        // Minimal payload so Strava reads metadata from the file itself,
        // mimicking a manual web upload as closely as possible.
        let form = Form::new()
            .text("description", strava::UPLOAD_DESCRIPTION)
            .text("data_type", extension.to_string())
            .part(
                "file",
                Part::bytes(bytes.to_vec()).file_name(file_name.to_string()),
            );

        let response = self
            .client
            .post(format!("{}/uploads", self.endpoints.api_base))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let accepted: UploadResponse = response.json().await?;
            info!(upload_id = accepted.id, "strava accepted upload");
            return Ok(UploadOutcome::Accepted(UploadHandle(accepted.id)));
        }

        let body = response.text().await.unwrap_or_default();
        classify_rejection(status, &body)
    }

    async fn poll_status(&mut self, handle: UploadHandle) -> Result<UploadStatus, UploadError> {
        self.ensure_token().await?;
        let token = self.access_token.clone().unwrap_or_default();

        let response = self
            .client
            .get(format!("{}/uploads/{}", self.endpoints.api_base, handle.0))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let parsed: StatusResponse = response.json().await?;
        Ok(match (parsed.activity_id, parsed.error) {
            (Some(activity_id), _) => UploadStatus::Ready { activity_id },
            (None, Some(message)) if !message.is_empty() => {
                warn!(message = %message, "strava rejected upload during processing");
                UploadStatus::Failed { message }
            }
            _ => UploadStatus::Pending,
        })
    }
}

/// Map a non-success upload response onto the outcome taxonomy: HTTP 409
/// or a "duplicate" marker anywhere in the error body means the activity
/// is already on Strava and the upload is considered satisfied.
pub fn classify_rejection(status: StatusCode, body: &str) -> Result<UploadOutcome, UploadError> {
    if status == StatusCode::CONFLICT || body.to_lowercase().contains("duplicate") {
        info!("activity already on strava (duplicate)");
        return Ok(UploadOutcome::Duplicate);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(UploadError::Auth(error_message(body)));
    }
    Err(UploadError::Rejected {
        status: status.as_u16(),
        message: error_message(body),
    })
}

/// Pull the human-readable message out of a Strava error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

/// Distinguish which credential was rejected during token refresh, the
/// way operators need it spelled out.
fn auth_failure_message(body: &str) -> String {
    let lowered = body.to_lowercase();
    if lowered.contains("invalid client") || lowered.contains("client_id") {
        "STRAVA_CLIENT_ID or STRAVA_CLIENT_SECRET is incorrect".to_string()
    } else if lowered.contains("invalid_grant") || lowered.contains("refresh_token") {
        "STRAVA_REFRESH_TOKEN is invalid or expired".to_string()
    } else {
        error_message(body)
    }
}

/// Authorization URL for the one-time interactive setup flow.
///
/// # Errors
///
/// Only if the base URL constant fails to parse, which would be a build
/// defect.
pub fn authorization_url(client_id: &str, redirect_uri: &str) -> Result<String, url::ParseError> {
    let mut url = url::Url::parse(strava::AUTH_URL)?;
    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("approval_prompt", "force")
        .append_pair("scope", strava::UPLOAD_SCOPES);
    Ok(url.into())
}

/// Tokens returned by the one-time authorization-code exchange.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    /// Short-lived access token
    pub access_token: String,
    /// Long-lived refresh token to persist in the environment
    pub refresh_token: String,
}

/// Exchange an authorization code for tokens (setup flow only).
///
/// # Errors
///
/// `UploadError::Auth` when Strava rejects the code or credentials,
/// `UploadError::Transport` on network failure.
pub async fn exchange_authorization_code(
    client_id: &str,
    client_secret: &str,
    code: &str,
) -> Result<TokenGrant, UploadError> {
    let client = Client::new();
    let params = [
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("code", code),
        ("grant_type", "authorization_code"),
    ];

    let response = client.post(strava::TOKEN_URL).form(&params).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(UploadError::Auth(auth_failure_message(&body)));
    }

    let token: TokenResponse = response.json().await?;
    Ok(TokenGrant {
        access_token: token.access_token,
        refresh_token: token.refresh_token.unwrap_or_default(),
    })
}
