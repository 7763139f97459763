//! Collaborators the pipeline talks to.
//!
//! The controller only knows the traits in this module:
//!
//! - [`Backend`]: session probe, upload, transform (preview) and export.
//! - [`DownloadSink`]: stores an exported workbook under its download name.
//! - [`HandoffSink`]: passes the chosen rows on to the messaging screen.
//!
//! Two backends ship with the crate. [`HttpBackend`] talks to the results service;
//! [`LocalBackend`] reads CSV/JSON sheets and renders messages in-process with the
//! [`crate::template`] formatters, which is what `--offline` uses.

pub mod http;
pub mod local;
pub mod sink;

use std::future::Future;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::{ParsedRow, PreviewRow, Record, TemplateType};
use crate::error::Result;
use crate::session::Session;

pub use http::HttpBackend;
pub use local::LocalBackend;
pub use sink::{FileDownloadSink, FileHandoffSink};

/// Name used when the uploaded file has no usable name.
pub const FALLBACK_FILE_NAME: &str = "UploadedFile.xlsx";

/// Prefix of every downloaded workbook.
pub const DOWNLOAD_PREFIX: &str = "SMS_";

/// The spreadsheet the operator picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChosenFile {
    path: PathBuf,
    name: String,
}

impl ChosenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| FALLBACK_FILE_NAME.to_owned());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Original file name, without directories.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `SMS_<original name>`, with the extension swapped when the export format
    /// differs from the upload.
    pub fn download_name(&self, extension: Option<&str>) -> String {
        let name = match extension {
            Some(ext) => Path::new(&self.name)
                .with_extension(ext)
                .to_string_lossy()
                .into_owned(),
            None => self.name.clone(),
        };
        format!("{DOWNLOAD_PREFIX}{name}")
    }
}

/// Rows handed to the messaging screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandoffPayload {
    pub data: Vec<Record>,
}

/// Upload, preview and export services.
///
/// Every call receives the session so implementations can attach the bearer
/// credential. An HTTP 401 must be reported as
/// [`crate::error::SmsFormatError::AuthExpired`]; the controller invalidates the
/// session when it sees one.
pub trait Backend {
    /// Whether calls fail without a credential.
    fn requires_credential(&self) -> bool {
        true
    }

    /// Check that the credential is still accepted.
    fn check_session(&self, session: &Session) -> impl Future<Output = Result<()>> + Send;

    /// Decode the chosen spreadsheet into rows.
    fn upload(
        &self,
        session: &Session,
        file: &ChosenFile,
    ) -> impl Future<Output = Result<Vec<ParsedRow>>> + Send;

    /// Compute the `Result` message for every row, in order.
    fn transform(
        &self,
        session: &Session,
        template: TemplateType,
        rows: &[ParsedRow],
    ) -> impl Future<Output = Result<Vec<PreviewRow>>> + Send;

    /// Render `rows` into a downloadable workbook.
    fn export(
        &self,
        session: &Session,
        template: TemplateType,
        rows: &[Record],
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// File extension of the exported bytes when it differs from the upload.
    fn export_extension(&self) -> Option<&'static str> {
        None
    }
}

/// Where exported workbooks end up.
pub trait DownloadSink {
    /// Store `bytes` as `file_name` and return where they went.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SmsFormatError::Export`] if the bytes cannot be stored.
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Receiver of the rows sent on to the messaging screen.
pub trait HandoffSink {
    /// # Errors
    ///
    /// Returns [`crate::error::SmsFormatError::Handoff`] if the payload cannot be stored.
    fn deliver(&self, payload: &HandoffPayload) -> Result<()>;
}
