//! A minimal client for the product's HTTP API.
//!
//! Covers exactly the endpoints the pipeline consumes: the build-info
//! readiness probe, first-user creation, login, session verification, and
//! the nested health report used by diagnostics.

mod error;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::{config::AdminCredentials, consts};

pub use self::error::Error;

/// Header carrying the session token on authenticated requests.
pub const SESSION_TOKEN_HEADER: &str = "Coder-Session-Token";

#[derive(Clone, Debug, Deserialize)]
pub struct BuildInfo {
    pub version: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoginResponse {
    pub session_token: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct User {
    pub username: String,
    pub email: String,
}

/// The product's health report: a top-level verdict plus per-subsystem
/// sections, each carrying its own `healthy` flag.
#[derive(Clone, Debug, Deserialize)]
pub struct HealthReport {
    pub healthy: bool,

    #[serde(default)]
    pub database: Option<HealthSection>,

    #[serde(default)]
    pub websocket: Option<HealthSection>,

    #[serde(default)]
    pub access_url: Option<HealthSection>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HealthSection {
    pub healthy: bool,
}

impl HealthReport {
    /// Names of the subsystems reporting unhealthy.
    #[must_use]
    pub fn unhealthy_subsystems(&self) -> Vec<&'static str> {
        let Self { healthy: _, database, websocket, access_url } = self;
        [("database", database), ("websocket", websocket), ("access_url", access_url)]
            .into_iter()
            .filter_map(|(name, section)| {
                section.as_ref().is_some_and(|section| !section.healthy).then_some(name)
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
struct CreateFirstUserRequest<'a> {
    email: &'a str,
    username: &'a str,
    password: &'a str,
    trial: bool,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

pub struct Client {
    base_url: String,
    http: reqwest::Client,
}

impl Client {
    /// Creates a client against `base_url`. Every request carries a bounded
    /// timeout, so a wedged deployment cannot stall the pipeline
    /// indefinitely; the readiness poll uses its own tighter per-attempt
    /// bound.
    pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(consts::API_REQUEST_TIMEOUT)
            .build()
            .context(error::BuildClientSnafu)?;
        Ok(Self { base_url, http })
    }

    pub async fn build_info(&self) -> Result<BuildInfo, Error> {
        self.get_json("/api/v2/buildinfo", None).await
    }

    /// One readiness attempt: a build-info GET under the per-attempt bound.
    async fn probe_build_info(&self) -> Result<BuildInfo, Error> {
        let url = self.url("/api/v2/buildinfo");
        let response = self
            .http
            .get(&url)
            .timeout(consts::READINESS_ATTEMPT_TIMEOUT)
            .send()
            .await
            .with_context(|_| error::RequestSnafu { url: url.clone() })?;
        Self::decode(url, response).await
    }

    /// Bounded spin-wait for the deployment to answer its build-info
    /// endpoint: one GET per attempt, `delay` between attempts, fatal once
    /// the ceiling is reached.
    pub async fn wait_until_ready(
        &self,
        attempts: u32,
        delay: Duration,
    ) -> Result<BuildInfo, Error> {
        let progress = indicatif::ProgressBar::new(u64::from(attempts));
        progress.set_style(
            indicatif::ProgressStyle::default_bar()
                .template("{spinner:.green} [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
                .expect("the template is valid")
                .progress_chars("#>-"),
        );
        progress.set_message("waiting for the deployment to answer");

        for attempt in 1..=attempts {
            match self.probe_build_info().await {
                Ok(info) => {
                    progress.finish_and_clear();
                    return Ok(info);
                }
                Err(err) => {
                    tracing::debug!("Readiness attempt {attempt}/{attempts} failed: {err}");
                }
            }
            progress.inc(1);
            if attempt < attempts {
                tokio::time::sleep(delay).await;
            }
        }

        progress.finish_and_clear();
        Err(Error::NeverBecameReady { attempts })
    }

    /// Creates the first administrative account. A deployment that already
    /// has one answers with a conflict, surfaced as
    /// [`Error::FirstUserExists`] so the caller can treat it as benign.
    pub async fn create_first_user(&self, admin: &AdminCredentials) -> Result<(), Error> {
        let url = self.url("/api/v2/users/first");
        let request = CreateFirstUserRequest {
            email: &admin.email,
            username: &admin.username,
            password: &admin.password,
            trial: false,
        };
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .with_context(|_| error::RequestSnafu { url: url.clone() })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status == reqwest::StatusCode::CONFLICT
            || status == reqwest::StatusCode::FORBIDDEN
        {
            Err(Error::FirstUserExists)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Error::Status { url, status, body })
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, Error> {
        let url = self.url("/api/v2/users/login");
        let response = self
            .http
            .post(&url)
            .json(&LoginRequest { email, password })
            .send()
            .await
            .with_context(|_| error::RequestSnafu { url: url.clone() })?;

        Self::decode(url, response).await
    }

    /// Fetches the account the session token belongs to; the bootstrap step
    /// uses this to verify the persisted session actually works.
    pub async fn current_user(&self, token: &str) -> Result<User, Error> {
        self.get_json("/api/v2/users/me", Some(token)).await
    }

    pub async fn health(&self, token: Option<&str>) -> Result<HealthReport, Error> {
        self.get_json("/api/v2/debug/health", token).await
    }

    async fn get_json<T>(&self, path: &str, token: Option<&str>) -> Result<T, Error>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = self.url(path);
        let mut request = self.http.get(&url);
        if let Some(token) = token {
            request = request.header(SESSION_TOKEN_HEADER, token);
        }
        let response =
            request.send().await.with_context(|_| error::RequestSnafu { url: url.clone() })?;

        Self::decode(url, response).await
    }

    async fn decode<T>(url: String, response: reqwest::Response) -> Result<T, Error>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status { url, status, body });
        }
        response.json::<T>().await.context(error::DecodeSnafu { url })
    }

    fn url(&self, path: &str) -> String { format!("{}{path}", self.base_url) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_strips_trailing_slash() {
        let client = Client::new("http://localhost/").expect("Should build client");
        assert_eq!(client.url("/api/v2/buildinfo"), "http://localhost/api/v2/buildinfo");
    }

    #[test]
    fn test_build_info_tolerates_extra_fields() {
        let info: BuildInfo = serde_json::from_str(
            r#"{"version": "v2.15.0", "external_url": "https://github.com/coder/coder"}"#,
        )
        .expect("Should deserialize build info");
        assert_eq!(info.version, "v2.15.0");
    }

    #[test]
    fn test_login_response_deserializes() {
        let response: LoginResponse =
            serde_json::from_str(r#"{"session_token": "tok-abc123"}"#)
                .expect("Should deserialize login response");
        assert_eq!(response.session_token, "tok-abc123");
    }

    #[test]
    fn test_health_report_collects_unhealthy_subsystems() {
        let report: HealthReport = serde_json::from_str(
            r#"{
                "healthy": false,
                "database": {"healthy": true},
                "websocket": {"healthy": false},
                "access_url": {"healthy": false}
            }"#,
        )
        .expect("Should deserialize health report");

        assert!(!report.healthy);
        assert_eq!(report.unhealthy_subsystems(), vec!["websocket", "access_url"]);
    }

    #[test]
    fn test_health_report_tolerates_missing_sections() {
        let report: HealthReport =
            serde_json::from_str(r#"{"healthy": true}"#).expect("Should deserialize health report");
        assert!(report.healthy);
        assert!(report.unhealthy_subsystems().is_empty());
    }
}
