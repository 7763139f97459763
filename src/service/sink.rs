//! Filesystem sinks for downloads and handoff payloads.

use std::path::{Path, PathBuf};

use super::{DownloadSink, HandoffPayload, HandoffSink};
use crate::error::{Result, SmsFormatError};

/// File name the messaging screen picks the handoff payload up from.
pub const HANDOFF_FILE_NAME: &str = "imported_template_data.json";

/// Writes downloads into a directory.
pub struct FileDownloadSink {
    dir: PathBuf,
}

impl FileDownloadSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DownloadSink for FileDownloadSink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        // Only the final component is used so a crafted name cannot escape `dir`.
        let name = Path::new(file_name)
            .file_name()
            .ok_or_else(|| SmsFormatError::Export(format!("invalid file name '{file_name}'")))?;
        let target = self.dir.join(name);

        std::fs::create_dir_all(&self.dir)
            .and_then(|()| std::fs::write(&target, bytes))
            .map_err(|e| SmsFormatError::Export(format!("cannot write {}: {e}", target.display())))?;

        tracing::info!(path = %target.display(), bytes = bytes.len(), "Saved download");
        Ok(target)
    }
}

/// Writes the handoff payload as pretty JSON to a fixed path.
pub struct FileHandoffSink {
    path: PathBuf,
}

impl FileHandoffSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HandoffSink for FileHandoffSink {
    fn deliver(&self, payload: &HandoffPayload) -> Result<()> {
        let content = serde_json::to_string_pretty(payload)
            .map_err(|e| SmsFormatError::Handoff(format!("cannot encode rows: {e}")))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SmsFormatError::Handoff(format!("cannot create {}: {e}", parent.display())))?;
        }
        std::fs::write(&self.path, content).map_err(|e| {
            SmsFormatError::Handoff(format!("cannot write {}: {e}", self.path.display()))
        })?;

        tracing::info!(path = %self.path.display(), rows = payload.data.len(), "Handed off rows");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Record;
    use serde_json::json;

    #[test]
    fn test_download_is_written_inside_dir() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let sink = FileDownloadSink::new(dir.path().join("out"));

        let path = sink.save("../../SMS_batch.xlsx", b"xlsx-bytes")?;
        assert_eq!(path, dir.path().join("out").join("SMS_batch.xlsx"));
        assert_eq!(std::fs::read(&path)?, b"xlsx-bytes");
        Ok(())
    }

    #[test]
    fn test_handoff_payload_shape() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let sink = FileHandoffSink::new(dir.path().join(HANDOFF_FILE_NAME));

        let row: Record = serde_json::from_value(json!({"Result": "hi"}))?;
        sink.deliver(&HandoffPayload { data: vec![row] })?;

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(sink.path())?)?;
        assert_eq!(written, json!({"data": [{"Result": "hi"}]}));
        Ok(())
    }

    #[test]
    fn test_handoff_failure_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A directory where the file should go makes the write fail.
        let sink = FileHandoffSink::new(dir.path());
        let result = sink.deliver(&HandoffPayload::default());
        assert!(matches!(result, Err(SmsFormatError::Handoff(_))));
    }
}
