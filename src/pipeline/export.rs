//! Row assembly for export and handoff.

use crate::dataset::{ParsedRow, PreviewDataset, Record};
use crate::error::{Result, SmsFormatError};
use crate::selection::SelectionStore;

/// Which rows the assembler picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSource {
    /// Selected preview rows, in dataset order
    Selected,
    /// Every preview row; the selection was empty
    FullPreview,
    /// Uploaded rows without messages; no preview exists
    Raw,
}

impl RowSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Selected => "selected",
            Self::FullPreview => "full_preview",
            Self::Raw => "raw",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssembledRows {
    pub source: RowSource,
    pub rows: Vec<Record>,
}

impl AssembledRows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Pick the rows an export or handoff acts on.
///
/// Precedence: selected preview rows, then the whole preview, then the raw parsed
/// rows. Selected rows keep dataset order regardless of the order they were toggled.
///
/// # Errors
///
/// Returns [`SmsFormatError::NoDataToExport`] when none of the sources has rows.
pub fn assemble_rows(
    preview: Option<&PreviewDataset>,
    selection: &SelectionStore,
    parsed: &[ParsedRow],
) -> Result<AssembledRows> {
    if let Some(preview) = preview.filter(|p| !p.is_empty()) {
        if !selection.is_empty() {
            let rows = selection
                .indices()
                .filter_map(|i| preview.get(i))
                .map(|row| row.record().clone())
                .collect();
            return Ok(AssembledRows {
                source: RowSource::Selected,
                rows,
            });
        }
        return Ok(AssembledRows {
            source: RowSource::FullPreview,
            rows: preview.iter().map(|row| row.record().clone()).collect(),
        });
    }

    if parsed.is_empty() {
        return Err(SmsFormatError::NoDataToExport);
    }
    Ok(AssembledRows {
        source: RowSource::Raw,
        rows: parsed.iter().map(|row| row.record().clone()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{PreviewRow, TemplateType};
    use serde_json::json;

    fn preview(names: &[&str]) -> PreviewDataset {
        let rows = names
            .iter()
            .map(|n| serde_json::from_value::<PreviewRow>(json!({"Name": n})).expect("row"))
            .collect();
        PreviewDataset::new(TemplateType::SscHsc, rows)
    }

    fn names(rows: &AssembledRows) -> Vec<&str> {
        rows.rows
            .iter()
            .filter_map(|r| r.get("Name").and_then(|v| v.as_str()))
            .collect()
    }

    #[test]
    fn test_selected_rows_follow_dataset_order() -> Result<()> {
        let dataset = preview(&["A", "B", "C"]);
        let mut selection = SelectionStore::new(3);
        selection.toggle(2);
        selection.toggle(0);

        let rows = assemble_rows(Some(&dataset), &selection, &[])?;
        assert_eq!(rows.source, RowSource::Selected);
        assert_eq!(names(&rows), ["A", "C"]);
        Ok(())
    }

    #[test]
    fn test_empty_selection_exports_full_preview() -> Result<()> {
        let dataset = preview(&["A", "B"]);
        let rows = assemble_rows(Some(&dataset), &SelectionStore::new(2), &[])?;
        assert_eq!(rows.source, RowSource::FullPreview);
        assert_eq!(rows.len(), 2);
        Ok(())
    }

    #[test]
    fn test_raw_rows_without_preview() -> Result<()> {
        let parsed: Vec<ParsedRow> = serde_json::from_value(json!([{"Name": "X"}]))?;
        let rows = assemble_rows(None, &SelectionStore::default(), &parsed)?;
        assert_eq!(rows.source, RowSource::Raw);
        assert_eq!(names(&rows), ["X"]);
        Ok(())
    }

    #[test]
    fn test_nothing_to_export() {
        let result = assemble_rows(None, &SelectionStore::default(), &[]);
        assert!(matches!(result, Err(SmsFormatError::NoDataToExport)));
    }
}
