//! In-process backend for working without the results service.
//!
//! Sheets are read from `.csv` or `.json` files, messages are rendered with the
//! bundled templates, and exports are written as CSV. No credential is needed.

use serde_json::Value;

use super::{Backend, ChosenFile};
use crate::dataset::{ParsedRow, PreviewRow, Record, TemplateType, display_value};
use crate::error::{Result, SmsFormatError};
use crate::session::Session;
use crate::template;

pub struct LocalBackend {
    signature: String,
}

impl LocalBackend {
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
        }
    }
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new(template::DEFAULT_SIGNATURE)
    }
}

impl Backend for LocalBackend {
    fn requires_credential(&self) -> bool {
        false
    }

    async fn check_session(&self, _session: &Session) -> Result<()> {
        Ok(())
    }

    async fn upload(&self, _session: &Session, file: &ChosenFile) -> Result<Vec<ParsedRow>> {
        let bytes = tokio::fs::read(file.path()).await.map_err(|e| {
            SmsFormatError::Upload(format!("cannot read {}: {e}", file.path().display()))
        })?;
        let extension = file
            .path()
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let rows = match extension.as_str() {
            "csv" => read_csv(&bytes)?,
            "json" => read_json(&bytes)?,
            other => {
                return Err(SmsFormatError::Upload(format!(
                    "unsupported file type '.{other}' (offline mode reads .csv or .json)"
                )));
            }
        };
        tracing::info!(file = file.name(), rows = rows.len(), "Read sheet locally");
        Ok(rows)
    }

    async fn transform(
        &self,
        _session: &Session,
        template: TemplateType,
        rows: &[ParsedRow],
    ) -> Result<Vec<PreviewRow>> {
        Ok(template::render(template, rows, &self.signature))
    }

    async fn export(
        &self,
        _session: &Session,
        _template: TemplateType,
        rows: &[Record],
    ) -> Result<Vec<u8>> {
        write_csv(rows)
    }

    fn export_extension(&self) -> Option<&'static str> {
        Some("csv")
    }
}

fn read_csv(bytes: &[u8]) -> Result<Vec<ParsedRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);
    let headers = reader
        .headers()
        .map_err(|e| SmsFormatError::Upload(format!("unreadable CSV header: {e}")))?
        .clone();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record =
            record.map_err(|e| SmsFormatError::Upload(format!("CSV row {}: {e}", line + 1)))?;
        let row: Record = headers
            .iter()
            .zip(record.iter())
            .map(|(column, cell)| (column.to_owned(), cell_value(cell)))
            .collect();
        rows.push(ParsedRow::new(row));
    }
    Ok(rows)
}

fn read_json(bytes: &[u8]) -> Result<Vec<ParsedRow>> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| SmsFormatError::Upload(format!("invalid JSON: {e}")))?;
    let rows = match value {
        Value::Object(mut map) => map.remove("data").unwrap_or(Value::Array(Vec::new())),
        other => other,
    };
    serde_json::from_value(rows)
        .map_err(|e| SmsFormatError::Upload(format!("expected an array of row objects: {e}")))
}

/// Spreadsheet-like cell typing: blank is null, plain numbers are numbers, and
/// anything with a leading zero (phone numbers, roll codes) stays text.
fn cell_value(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    let leading_zero = cell.len() > 1 && cell.starts_with('0') && !cell.starts_with("0.");
    if !leading_zero {
        if let Ok(n) = cell.parse::<i64>() {
            return Value::from(n);
        }
        if let Some(n) = cell
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .and_then(serde_json::Number::from_f64)
        {
            return Value::Number(n);
        }
    }
    Value::String(cell.to_owned())
}

fn write_csv(rows: &[Record]) -> Result<Vec<u8>> {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;
    for row in rows {
        writer.write_record(
            columns
                .iter()
                .map(|c| row.get(*c).map(display_value).unwrap_or_default()),
        )?;
    }
    writer
        .into_inner()
        .map_err(|e| SmsFormatError::Export(format!("failed to finish CSV: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write as _;

    fn session() -> Session {
        Session::anonymous()
    }

    #[tokio::test]
    async fn test_reads_csv_sheet() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile()?;
        writeln!(file, "Exam,Name,Roll,MCQ,Student Phone No")?;
        writeln!(file, "Physics,Rafi,101,22.5,01712345678")?;
        writeln!(file, "Physics,Mim,102,,01812345678")?;

        let backend = LocalBackend::default();
        let rows = backend
            .upload(&session(), &ChosenFile::new(file.path()))
            .await?;

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Roll"), Some(&json!(101)));
        assert_eq!(rows[0].get("MCQ"), Some(&json!(22.5)));
        assert_eq!(rows[0].get("Student Phone No"), Some(&json!("01712345678")));
        assert_eq!(rows[1].get("MCQ"), Some(&Value::Null));
        Ok(())
    }

    #[tokio::test]
    async fn test_reads_json_in_upload_shape() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile()?;
        write!(file, r#"{{"data": [{{"Name": "Rafi", "Marks": 70}}]}}"#)?;

        let rows = LocalBackend::default()
            .upload(&session(), &ChosenFile::new(file.path()))
            .await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Marks"), Some(&json!(70)));
        Ok(())
    }

    #[tokio::test]
    async fn test_rejects_unknown_extension() -> Result<()> {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile()?;
        let result = LocalBackend::default()
            .upload(&session(), &ChosenFile::new(file.path()))
            .await;
        assert!(matches!(result, Err(SmsFormatError::Upload(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_transform_uses_signature() -> Result<()> {
        let rows: Vec<ParsedRow> =
            serde_json::from_value(json!([{"Exam": "Bio", "Name": "A", "Roll": 1, "MCQ": 10}]))?;
        let preview = LocalBackend::new("Test Coaching")
            .transform(&session(), TemplateType::SscHsc, &rows)
            .await?;
        assert!(preview[0].result().ends_with("— Test Coaching"));
        Ok(())
    }

    #[test]
    fn test_export_csv_unions_columns() -> Result<()> {
        let rows: Vec<Record> = serde_json::from_value(json!([
            {"Name": "A", "Result": "line one\nline two"},
            {"Name": "B", "Position": 2},
        ]))?;
        let bytes = write_csv(&rows)?;
        let text = String::from_utf8(bytes).expect("utf-8 output");
        assert!(text.starts_with("Name,Result,Position\n"));
        assert!(text.contains("\"line one\nline two\""));
        assert!(text.contains("B,,2"));
        Ok(())
    }

    #[test]
    fn test_cell_value_typing() {
        assert_eq!(cell_value(""), Value::Null);
        assert_eq!(cell_value("0"), json!(0));
        assert_eq!(cell_value("0.5"), json!(0.5));
        assert_eq!(cell_value("017"), json!("017"));
        assert_eq!(cell_value("Absent"), json!("Absent"));
    }
}
