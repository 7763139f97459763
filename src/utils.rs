use std::path::PathBuf;

pub const APP_DIR_NAME: &str = "sms-format";

/// Directories the application reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardPaths {
    /// Holds `config.json`
    pub base_dir: PathBuf,
    /// Default target for exported workbooks
    pub output_dir: PathBuf,
    /// Default target for handoff payloads
    pub handoff_dir: PathBuf,
    pub logs_dir: PathBuf,
}

/// Platform directories, falling back to the working directory when the platform
/// has none.
pub fn standard_paths() -> StandardPaths {
    let base_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME);
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME);
    let output_dir = dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    StandardPaths {
        base_dir,
        output_dir,
        handoff_dir: data_dir.join("handoff"),
        logs_dir: data_dir.join("logs"),
    }
}

/// Shortens `text` to `max` characters, marking the cut with `…`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
