//! HTTP client for the results service.
//!
//! | Call          | Endpoint                    | Body                    |
//! |---------------|-----------------------------|-------------------------|
//! | session probe | `GET /users/me`             |                         |
//! | upload        | `POST /upload`              | multipart `file`        |
//! | preview       | `POST /templates/preview`   | `{"type", "data"}`      |
//! | export        | `POST /templates/download`  | `{"type", "data"}`      |
//!
//! A 401 from any endpoint becomes [`SmsFormatError::AuthExpired`]. Other non-2xx
//! answers become the error of the stage that made the call, carrying the response
//! text.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret as _;
use serde::{Deserialize, Serialize};

use super::{Backend, ChosenFile};
use crate::dataset::{ParsedRow, PreviewRow, Record, TemplateType};
use crate::error::{Result, SmsFormatError};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Session,
    Upload,
    Transform,
    Export,
}

impl Stage {
    fn error(self, message: String) -> SmsFormatError {
        match self {
            Self::Session => SmsFormatError::Network(message),
            Self::Upload => SmsFormatError::Upload(message),
            Self::Transform => SmsFormatError::Transform(message),
            Self::Export => SmsFormatError::Export(message),
        }
    }
}

/// Map a non-success status to the error of the calling stage.
fn classify(stage: Stage, status: StatusCode, body: &str) -> SmsFormatError {
    if status == StatusCode::UNAUTHORIZED {
        return SmsFormatError::AuthExpired;
    }
    let body = body.trim();
    if body.is_empty() {
        stage.error(format!("HTTP {status}"))
    } else {
        stage.error(format!("HTTP {status}: {body}"))
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    data: Vec<ParsedRow>,
}

#[derive(Debug, Deserialize)]
struct PreviewResponse {
    preview: Option<Vec<PreviewRow>>,
}

#[derive(Debug, Serialize)]
struct TemplateRequest<'a, T> {
    #[serde(rename = "type")]
    template: TemplateType,
    data: &'a [T],
}

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// # Errors
    ///
    /// Returns [`SmsFormatError::Config`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SmsFormatError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn bearer(session: &Session) -> Result<String> {
        Ok(format!("Bearer {}", session.credential()?.expose_secret()))
    }

    async fn send(
        stage: Stage,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| stage.error(format!("request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(?stage, %status, "Service call failed");
        Err(classify(stage, status, &body))
    }
}

impl Backend for HttpBackend {
    async fn check_session(&self, session: &Session) -> Result<()> {
        let request = self
            .client
            .get(self.url("/users/me"))
            .header(reqwest::header::AUTHORIZATION, Self::bearer(session)?);
        Self::send(Stage::Session, request).await?;
        Ok(())
    }

    async fn upload(&self, session: &Session, file: &ChosenFile) -> Result<Vec<ParsedRow>> {
        let bytes = tokio::fs::read(file.path()).await.map_err(|e| {
            SmsFormatError::Upload(format!("cannot read {}: {e}", file.path().display()))
        })?;
        tracing::info!(file = file.name(), bytes = bytes.len(), "Uploading workbook");

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file.name().to_owned()));
        let request = self
            .client
            .post(self.url("/upload"))
            .header(reqwest::header::AUTHORIZATION, Self::bearer(session)?)
            .multipart(form);

        let parsed: UploadResponse = Self::send(Stage::Upload, request)
            .await?
            .json()
            .await
            .map_err(|e| SmsFormatError::Upload(format!("malformed upload response: {e}")))?;
        Ok(parsed.data)
    }

    async fn transform(
        &self,
        session: &Session,
        template: TemplateType,
        rows: &[ParsedRow],
    ) -> Result<Vec<PreviewRow>> {
        let request = self
            .client
            .post(self.url("/templates/preview"))
            .header(reqwest::header::AUTHORIZATION, Self::bearer(session)?)
            .json(&TemplateRequest { template, data: rows });

        let parsed: PreviewResponse = Self::send(Stage::Transform, request)
            .await?
            .json()
            .await
            .map_err(|e| SmsFormatError::Transform(format!("malformed preview response: {e}")))?;
        parsed
            .preview
            .ok_or_else(|| SmsFormatError::Transform("response contained no preview".to_owned()))
    }

    async fn export(
        &self,
        session: &Session,
        template: TemplateType,
        rows: &[Record],
    ) -> Result<Vec<u8>> {
        let request = self
            .client
            .post(self.url("/templates/download"))
            .header(reqwest::header::AUTHORIZATION, Self::bearer(session)?)
            .json(&TemplateRequest { template, data: rows });

        let bytes = Self::send(Stage::Export, request)
            .await?
            .bytes()
            .await
            .map_err(|e| SmsFormatError::Export(format!("download interrupted: {e}")))?;
        Ok(bytes.to_vec())
    }
}
