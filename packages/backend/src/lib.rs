#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Client for the student map backend.
//!
//! The backend serves student, campus, and previous-school data and
//! stores affected-area reports. [`BackendApi`] abstracts it so the map
//! session can run against an in-memory fake; [`HttpBackend`] talks to
//! the real service over JSON/HTTP. Nothing is retried.

use serde::de::DeserializeOwned;
use student_map_hazard_models::{AffectedAreaReport, EventReport};
use student_map_student_models::{Campus, ClusterType, Cohort, PreviousSchool, StudentRecord};
use thiserror::Error;

/// Default backend base URL.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";

/// Errors from backend requests.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("{url} returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
        /// Response body or error detail.
        message: String,
    },

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response had an unexpected shape.
    #[error("Parse error: {message}")]
    Parse {
        /// What went wrong.
        message: String,
    },
}

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Base URL, without a trailing slash (e.g. `http://host/api`).
    pub base_url: String,
}

impl BackendConfig {
    /// Reads `STUDENT_MAP_API_URL`, defaulting to [`DEFAULT_API_URL`].
    #[must_use]
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("STUDENT_MAP_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(base_url)
    }

    /// Creates a config for `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// The backend operations the map session consumes.
#[async_trait::async_trait]
pub trait BackendApi: Send + Sync {
    /// `GET /students?cohort=..&cluster_type=..`
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the request or decoding fails.
    async fn fetch_students(
        &self,
        cohort: Cohort,
        cluster_type: ClusterType,
    ) -> Result<Vec<StudentRecord>, BackendError>;

    /// `GET /campuses`
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the request or decoding fails.
    async fn fetch_campuses(&self) -> Result<Vec<Campus>, BackendError>;

    /// `GET /previous-schools`
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the request or decoding fails.
    async fn fetch_previous_schools(&self) -> Result<Vec<PreviousSchool>, BackendError>;

    /// `POST /affected-areas`; returns the backend's acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the request fails or is rejected.
    async fn store_affected_area(
        &self,
        report: &AffectedAreaReport,
    ) -> Result<serde_json::Value, BackendError>;

    /// `GET /event-reports/{id}`
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the request or decoding fails.
    async fn fetch_event_report(&self, id: u64) -> Result<EventReport, BackendError>;
}

/// [`BackendApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    config: BackendConfig,
}

impl HttpBackend {
    /// Creates a client for the configured backend.
    #[must_use]
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Creates a client from environment configuration.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(BackendConfig::from_env())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    async fn read_body(resp: reqwest::Response) -> Result<String, BackendError> {
        let status = resp.status();
        let url = resp.url().to_string();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                url,
                message: error_detail(&body),
            });
        }
        Ok(body)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, BackendError> {
        let url = self.url(path);
        log::debug!("GET {url} {query:?}");
        let resp = self.client.get(&url).query(query).send().await?;
        let body = Self::read_body(resp).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait::async_trait]
impl BackendApi for HttpBackend {
    async fn fetch_students(
        &self,
        cohort: Cohort,
        cluster_type: ClusterType,
    ) -> Result<Vec<StudentRecord>, BackendError> {
        let body: serde_json::Value = self
            .get(
                "/students",
                &[
                    ("cohort", cohort.as_ref()),
                    ("cluster_type", cluster_type.as_ref()),
                ],
            )
            .await?;
        parse_student_list(body)
    }

    async fn fetch_campuses(&self) -> Result<Vec<Campus>, BackendError> {
        self.get("/campuses", &[]).await
    }

    async fn fetch_previous_schools(&self) -> Result<Vec<PreviousSchool>, BackendError> {
        self.get("/previous-schools", &[]).await
    }

    async fn store_affected_area(
        &self,
        report: &AffectedAreaReport,
    ) -> Result<serde_json::Value, BackendError> {
        let url = self.url("/affected-areas");
        log::debug!("POST {url}");
        let resp = self.client.post(&url).json(report).send().await?;
        let body = Self::read_body(resp).await?;
        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn fetch_event_report(&self, id: u64) -> Result<EventReport, BackendError> {
        self.get(&format!("/event-reports/{id}"), &[]).await
    }
}

/// Accepts either a bare array of students or an object wrapping one in
/// a `students` field.
fn parse_student_list(body: serde_json::Value) -> Result<Vec<StudentRecord>, BackendError> {
    let list = match body {
        serde_json::Value::Array(_) => body,
        serde_json::Value::Object(mut map) => {
            map.remove("students").ok_or_else(|| BackendError::Parse {
                message: "Student response object has no students field".to_string(),
            })?
        }
        other => {
            return Err(BackendError::Parse {
                message: format!("Unexpected student response: {other}"),
            });
        }
    };
    Ok(serde_json::from_value(list)?)
}

/// Extracts a FastAPI-style `detail` message, falling back to the raw
/// body.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str().map(String::from)))
        .unwrap_or_else(|| body.to_string())
}
