//! Centralized error handling for the SMS format pipeline.
//!
//! Every stage of the pipeline reports failures through [`SmsFormatError`]. The
//! variants fall into four groups, and callers are expected to treat them
//! differently:
//!
//! - **Validation** ([`SmsFormatError::Validation`]): the operator typed a bad row
//!   range. Nothing changed; show the message and let them retry.
//! - **Preconditions** (`NoFileSelected`, `NoDataToPreview`, `NoDataToExport`,
//!   `NoPreview`, `Busy`): the action is not available right now. Nothing changed.
//! - **Collaborator failures** (`Upload`, `Transform`, `Export`, `Handoff`,
//!   `Network`): a backend or sink failed. The pipeline is back in its last stable
//!   state and the same action can be retried.
//! - **Session** ([`SmsFormatError::AuthExpired`]): the credential is gone or was
//!   rejected. This is the only fatal variant, see [`SmsFormatError::is_fatal`].
//!
//! ```
//! use sms_format::error::SmsFormatError;
//!
//! fn describe(err: &SmsFormatError) -> &'static str {
//!     match err {
//!         SmsFormatError::AuthExpired => "log in again",
//!         SmsFormatError::Validation(_) => "fix the row range",
//!         _ if err.is_retryable() => "try again",
//!         _ => "see message",
//!     }
//! }
//! assert_eq!(describe(&SmsFormatError::AuthExpired), "log in again");
//! ```

use std::fmt;

use crate::pipeline::PipelineState;
use crate::selection::RangeError;

/// Main error type for pipeline operations.
#[derive(Debug)]
pub enum SmsFormatError {
    /// The row range expression could not be parsed
    Validation(RangeError),

    /// A preview was requested before a file was chosen
    NoFileSelected,

    /// The upload produced no rows to transform
    NoDataToPreview,

    /// Neither preview rows nor parsed rows are available
    NoDataToExport,

    /// A selection command needs a preview that does not exist yet
    NoPreview,

    /// Another collaborator call is still outstanding
    Busy(PipelineState),

    /// The upload service rejected the file
    Upload(String),

    /// The transform service failed or returned an inconsistent preview
    Transform(String),

    /// The export service or download sink failed
    Export(String),

    /// The handoff payload could not be stored
    Handoff(String),

    /// Credential missing or rejected (HTTP 401)
    AuthExpired,

    /// Transport-level failure that says nothing about the credential
    Network(String),

    /// I/O errors
    Io(std::io::Error),

    /// Configuration errors
    Config(String),

    /// Generic error with context
    Other(String),
}

impl SmsFormatError {
    /// Whether the session has to be re-established before anything else can run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AuthExpired)
    }

    /// Whether re-invoking the same action may succeed without operator input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Upload(_)
                | Self::Transform(_)
                | Self::Export(_)
                | Self::Handoff(_)
                | Self::Network(_)
                | Self::Busy(_)
        )
    }
}

impl fmt::Display for SmsFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "{e}"),
            Self::NoFileSelected => write!(f, "Please upload an Excel file"),
            Self::NoDataToPreview => write!(f, "The uploaded file contains no rows to preview"),
            Self::NoDataToExport => write!(f, "No data to export"),
            Self::NoPreview => write!(f, "No preview data available"),
            Self::Busy(state) => write!(f, "Another operation is in progress ({state})"),
            Self::Upload(msg) => write!(f, "Upload failed: {msg}"),
            Self::Transform(msg) => write!(f, "Preview failed: {msg}"),
            Self::Export(msg) => write!(f, "Download failed: {msg}"),
            Self::Handoff(msg) => write!(f, "Unable to transfer data to Send SMS page: {msg}"),
            Self::AuthExpired => write!(f, "Session expired, please log in again"),
            Self::Network(msg) => write!(f, "Network error: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for SmsFormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RangeError> for SmsFormatError {
    fn from(err: RangeError) -> Self {
        Self::Validation(err)
    }
}

impl From<std::io::Error> for SmsFormatError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for SmsFormatError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<serde_json::Error> for SmsFormatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(format!("JSON error: {err}"))
    }
}

impl From<csv::Error> for SmsFormatError {
    fn from(err: csv::Error) -> Self {
        Self::Other(format!("CSV error: {err}"))
    }
}

// The CLI reports errors as plain messages
impl From<SmsFormatError> for String {
    fn from(err: SmsFormatError) -> Self {
        err.to_string()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, SmsFormatError>;
