//! Result message templates.
//!
//! Each template turns a mark sheet into one SMS per student. They share the same
//! frame:
//!
//! ```text
//! ফলাফল: <Exam>
//! Name: <Name>, Roll: <Roll>, ...marks..., Position: <rank>, Highest Marks: <max>
//! — <signature>
//! ```
//!
//! Position is a competition rank over the template's score column: highest score
//! is 1 and tied scores share the lower rank (`90, 85, 85, 70` → `1, 2, 2, 4`). A
//! missing or zero score produces an "Absent" line instead of marks.
//!
//! Besides the `Result` column the templates write the coerced score columns and
//! `Position` back into each row, so the exported sheet carries the same numbers the
//! message quotes.

mod medical;
mod ssc_hsc;
mod varsity;

use serde_json::Value;

use crate::dataset::{
    ParsedRow, PreviewRow, RESULT_COLUMN, Record, TemplateType, display_value, format_number,
};

/// Footer used when no signature is configured.
pub const DEFAULT_SIGNATURE: &str = "Big Bang Exam Care";

pub(crate) const POSITION_COLUMN: &str = "Position";

/// Apply `template` to every row, producing one preview row per input row in the
/// same order.
pub fn render(template: TemplateType, rows: &[ParsedRow], signature: &str) -> Vec<PreviewRow> {
    let mut records: Vec<Record> = rows.iter().map(|r| r.record().clone()).collect();

    let messages = match template {
        TemplateType::SscHsc => ssc_hsc::format_results(&mut records, signature),
        TemplateType::Varsity => varsity::format_results(&mut records, signature),
        TemplateType::Medical => medical::format_results(&mut records, signature),
    };

    records
        .into_iter()
        .zip(messages)
        .map(|(mut record, message)| {
            record.insert(RESULT_COLUMN.to_owned(), Value::String(message));
            let mut row = PreviewRow::new(record);
            row.normalize_phones();
            row
        })
        .collect()
}

/// Lenient numeric coercion: numbers pass through, numeric strings are parsed,
/// anything else counts as missing.
pub(crate) fn coerce_numeric(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

pub(crate) fn numeric_column(records: &[Record], column: &str) -> Vec<Option<f64>> {
    records
        .iter()
        .map(|r| coerce_numeric(r.get(column)))
        .collect()
}

/// Competition rank, descending. Missing scores get no rank.
pub(crate) fn rank_descending(scores: &[Option<f64>]) -> Vec<Option<usize>> {
    scores
        .iter()
        .map(|score| {
            score.map(|s| {
                1 + scores
                    .iter()
                    .flatten()
                    .filter(|other| **other > s)
                    .count()
            })
        })
        .collect()
}

/// Largest present score, `0` when there is none.
pub(crate) fn highest(scores: &[Option<f64>]) -> f64 {
    scores.iter().flatten().copied().reduce(f64::max).unwrap_or(0.0)
}

pub(crate) fn has_column(records: &[Record], column: &str) -> bool {
    records.iter().any(|r| r.contains_key(column))
}

pub(crate) fn number_value(value: Option<f64>) -> Value {
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < 9.0e15 => Value::from(v as i64),
        Some(v) => serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number),
        None => Value::Null,
    }
}

pub(crate) fn position_value(rank: Option<usize>) -> Value {
    rank.map_or(Value::Null, Value::from)
}

pub(crate) fn text(record: &Record, column: &str) -> String {
    record.get(column).map(display_value).unwrap_or_default()
}

pub(crate) fn score_text(value: f64) -> String {
    format_number(value)
}

pub(crate) fn rank_text(rank: Option<usize>) -> String {
    rank.map(|r| r.to_string()).unwrap_or_default()
}

/// Opening line naming the exam.
pub(crate) fn header(record: &Record) -> String {
    format!("ফলাফল: {}\n", text(record, "Exam"))
}

/// `Name: .., Roll: ..` prefix shared by all templates.
pub(crate) fn identity(record: &Record) -> String {
    format!("Name: {}, Roll: {}", text(record, "Name"), text(record, "Roll"))
}

pub(crate) fn footer(signature: &str) -> String {
    format!("— {signature}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(values: Value) -> Vec<ParsedRow> {
        serde_json::from_value(values).expect("rows deserialize")
    }

    #[test]
    fn test_rank_ties_share_lowest_rank() {
        let scores = [Some(90.0), Some(85.0), None, Some(85.0), Some(70.0)];
        assert_eq!(
            rank_descending(&scores),
            vec![Some(1), Some(2), None, Some(2), Some(4)]
        );
    }

    #[test]
    fn test_highest_ignores_missing() {
        assert_eq!(highest(&[None, Some(12.5), Some(3.0)]), 12.5);
        assert_eq!(highest(&[None, None]), 0.0);
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(coerce_numeric(Some(&json!(" 42 "))), Some(42.0));
        assert_eq!(coerce_numeric(Some(&json!(17))), Some(17.0));
        assert_eq!(coerce_numeric(Some(&json!("absent"))), None);
        assert_eq!(coerce_numeric(Some(&json!(null))), None);
        assert_eq!(coerce_numeric(None), None);
    }

    #[test]
    fn test_render_preserves_order_and_count() {
        let input = rows(json!([
            {"Exam": "Chem", "Name": "A", "Roll": 1, "Marks": 40},
            {"Exam": "Chem", "Name": "B", "Roll": 2, "Marks": 60},
            {"Exam": "Chem", "Name": "C", "Roll": 3, "Marks": 50},
        ]));
        let preview = render(TemplateType::Medical, &input, DEFAULT_SIGNATURE);
        assert_eq!(preview.len(), 3);
        let names: Vec<String> = preview.iter().map(|r| text(r.record(), "Name")).collect();
        assert_eq!(names, ["A", "B", "C"]);
        assert!(preview.iter().all(|r| r.result().ends_with("— Big Bang Exam Care")));
    }

    #[test]
    fn test_render_normalizes_phone_aliases() {
        let input = rows(json!([
            {"Name": "A", "Roll": 1, "MCQ": 20, "Student Phone": 1_712_000_000_i64},
        ]));
        let preview = render(TemplateType::SscHsc, &input, DEFAULT_SIGNATURE);
        assert_eq!(preview[0].student_phone(), "1712000000");
        assert_eq!(
            preview[0].get("Student Phone No"),
            Some(&json!("1712000000"))
        );
    }
}
