//! Row and dataset types shared by every pipeline stage.
//!
//! Rows are kept as insertion-ordered JSON objects so column order survives the
//! round trip through the upload, preview and export services untouched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An ordered column-name → value mapping.
pub type Record = serde_json::Map<String, Value>;

/// Column holding the computed SMS text.
pub const RESULT_COLUMN: &str = "Result";
pub const STUDENT_PHONE_COLUMN: &str = "Student Phone No";
pub const GUARDIAN_PHONE_COLUMN: &str = "Guardian Phone No";
pub const STUDENT_PHONE_ALIAS: &str = "Student Phone";
pub const GUARDIAN_PHONE_ALIAS: &str = "Guardian Phone";

/// Which result format the transform applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateType {
    /// Varsity / Engineering admission results (MCQ + Written = Total)
    Varsity,
    /// Medical admission results (single Marks column)
    Medical,
    /// SSC / HSC results (MCQ with optional CQ)
    #[default]
    SscHsc,
}

impl TemplateType {
    pub const ALL: [Self; 3] = [Self::Varsity, Self::Medical, Self::SscHsc];

    /// Wire name used by the preview and download services.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Varsity => "varsity",
            Self::Medical => "medical",
            Self::SscHsc => "ssc_hsc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Varsity => "Varsity / Engineering Result",
            Self::Medical => "Medical Result",
            Self::SscHsc => "SSC / HSC Result",
        }
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "varsity" => Ok(Self::Varsity),
            "medical" => Ok(Self::Medical),
            "ssc_hsc" | "ssc-hsc" => Ok(Self::SscHsc),
            other => Err(format!(
                "unknown template type '{other}' (expected varsity, medical or ssc_hsc)"
            )),
        }
    }
}

/// One spreadsheet row as decoded by the upload service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParsedRow(Record);

impl ParsedRow {
    pub fn new(record: Record) -> Self {
        Self(record)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn record(&self) -> &Record {
        &self.0
    }

    pub fn into_record(self) -> Record {
        self.0
    }
}

impl From<Record> for ParsedRow {
    fn from(record: Record) -> Self {
        Self(record)
    }
}

/// A parsed row after the transform added its `Result` message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreviewRow(Record);

impl PreviewRow {
    pub fn new(record: Record) -> Self {
        Self(record)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// The computed SMS text, empty when the transform produced none.
    pub fn result(&self) -> &str {
        self.0
            .get(RESULT_COLUMN)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn student_phone(&self) -> String {
        self.phone(STUDENT_PHONE_COLUMN, STUDENT_PHONE_ALIAS)
    }

    pub fn guardian_phone(&self) -> String {
        self.phone(GUARDIAN_PHONE_COLUMN, GUARDIAN_PHONE_ALIAS)
    }

    fn phone(&self, column: &str, alias: &str) -> String {
        [column, alias]
            .iter()
            .filter_map(|key| self.0.get(*key))
            .map(display_value)
            .find(|v| !v.is_empty())
            .unwrap_or_default()
    }

    /// Copy legacy phone aliases into the canonical columns and render numeric
    /// phone cells as digit strings.
    pub fn normalize_phones(&mut self) {
        for (column, alias) in [
            (STUDENT_PHONE_COLUMN, STUDENT_PHONE_ALIAS),
            (GUARDIAN_PHONE_COLUMN, GUARDIAN_PHONE_ALIAS),
        ] {
            let phone = self.phone(column, alias);
            if !phone.is_empty() || self.0.contains_key(column) {
                self.0.insert(column.to_owned(), Value::String(phone));
            }
        }
    }

    pub fn record(&self) -> &Record {
        &self.0
    }

    pub fn record_mut(&mut self) -> &mut Record {
        &mut self.0
    }

    pub fn into_record(self) -> Record {
        self.0
    }
}

impl From<Record> for PreviewRow {
    fn from(record: Record) -> Self {
        Self(record)
    }
}

/// The rows returned by one transform call, in upload order.
///
/// Rows are addressed by position only. A dataset is never edited; a new preview
/// replaces it as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewDataset {
    template: TemplateType,
    rows: Vec<PreviewRow>,
}

impl PreviewDataset {
    pub fn new(template: TemplateType, rows: Vec<PreviewRow>) -> Self {
        Self { template, rows }
    }

    /// Template that produced these rows.
    pub fn template(&self) -> TemplateType {
        self.template
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PreviewRow> {
        self.rows.get(index)
    }

    pub fn rows(&self) -> &[PreviewRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PreviewRow> {
        self.rows.iter()
    }
}

impl<'a> IntoIterator for &'a PreviewDataset {
    type Item = &'a PreviewRow;
    type IntoIter = std::slice::Iter<'a, PreviewRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Render a cell the way it appears in a message: strings verbatim, integral
/// numbers without a fractional part, null as empty.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_owned(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => format_number(f),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// `85.0` → `85`, `72.5` → `72.5`.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}
