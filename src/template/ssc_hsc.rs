//! SSC / HSC results: MCQ only, or MCQ + CQ when the sheet has a `CQ` column.

use crate::dataset::Record;

use super::{
    POSITION_COLUMN, footer, has_column, header, highest, identity, number_value,
    numeric_column, position_value, rank_descending, rank_text, score_text,
};

pub(super) fn format_results(records: &mut [Record], signature: &str) -> Vec<String> {
    if has_column(records, "CQ") {
        with_cq(records, signature)
    } else {
        mcq_only(records, signature)
    }
}

fn with_cq(records: &mut [Record], signature: &str) -> Vec<String> {
    let mcq: Vec<f64> = numeric_column(records, "MCQ")
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect();
    let cq: Vec<f64> = numeric_column(records, "CQ")
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect();
    let totals: Vec<Option<f64>> = mcq.iter().zip(&cq).map(|(m, c)| Some(m + c)).collect();
    let ranks = rank_descending(&totals);
    let top = score_text(highest(&totals));

    let mut messages = Vec::with_capacity(records.len());
    for (i, record) in records.iter_mut().enumerate() {
        let (m, c) = (mcq.get(i).copied().unwrap_or(0.0), cq.get(i).copied().unwrap_or(0.0));
        let total = m + c;
        let rank = ranks.get(i).copied().flatten();

        record.insert("MCQ".to_owned(), number_value(Some(m)));
        record.insert("CQ".to_owned(), number_value(Some(c)));
        record.insert("Total".to_owned(), number_value(Some(total)));
        record.insert(POSITION_COLUMN.to_owned(), position_value(rank));

        let body = if total == 0.0 {
            format!("{}, Absent\nHighest Marks: {top}\n", identity(record))
        } else {
            format!(
                "{}, MCQ: {}, CQ: {}, Total: {}, Position: {}, Highest Marks: {top}\n",
                identity(record),
                score_text(m),
                score_text(c),
                score_text(total),
                rank_text(rank),
            )
        };
        messages.push(format!("{}{body}{}", header(record), footer(signature)));
    }
    messages
}

fn mcq_only(records: &mut [Record], signature: &str) -> Vec<String> {
    let has_mcq = has_column(records, "MCQ");
    let mcq: Vec<Option<f64>> = numeric_column(records, "MCQ")
        .into_iter()
        .map(|v| has_mcq.then(|| v.unwrap_or(0.0)))
        .collect();
    let ranks = rank_descending(&mcq);
    let top = score_text(highest(&mcq));

    let mut messages = Vec::with_capacity(records.len());
    for (i, record) in records.iter_mut().enumerate() {
        let score = mcq.get(i).copied().flatten();
        let rank = ranks.get(i).copied().flatten();

        if has_mcq {
            record.insert("MCQ".to_owned(), number_value(score));
        }
        record.insert(POSITION_COLUMN.to_owned(), position_value(rank));

        let body = match score {
            Some(s) if s != 0.0 => format!(
                "{}, Obtained Marks (MCQ): {}, Position: {}, Highest Marks (MCQ): {top}\n",
                identity(record),
                score_text(s),
                rank_text(rank),
            ),
            _ => format!("{}, Absent\nHighest Marks (MCQ): {top}\n", identity(record)),
        };
        messages.push(format!("{}{body}{}", header(record), footer(signature)));
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn records(values: Value) -> Vec<Record> {
        serde_json::from_value(values).expect("records deserialize")
    }

    #[test]
    fn test_mcq_and_cq_are_totalled_and_ranked() {
        let mut rows = records(json!([
            {"Exam": "Physics 1st", "Name": "Rafi", "Roll": 101, "MCQ": 20, "CQ": 45},
            {"Exam": "Physics 1st", "Name": "Mim", "Roll": 102, "MCQ": "25", "CQ": 50},
        ]));
        let messages = format_results(&mut rows, "Big Bang Exam Care");

        assert_eq!(
            messages[0],
            "ফলাফল: Physics 1st\n\
             Name: Rafi, Roll: 101, MCQ: 20, CQ: 45, Total: 65, Position: 2, Highest Marks: 75\n\
             — Big Bang Exam Care"
        );
        assert!(messages[1].contains("Total: 75, Position: 1"));
        assert_eq!(rows[1].get("MCQ"), Some(&json!(25)));
        assert_eq!(rows[0].get("Total"), Some(&json!(65)));
        assert_eq!(rows[0].get("Position"), Some(&json!(2)));
    }

    #[test]
    fn test_zero_total_is_absent() {
        let mut rows = records(json!([
            {"Exam": "Math", "Name": "Nila", "Roll": 7, "MCQ": null, "CQ": ""},
            {"Exam": "Math", "Name": "Tanvir", "Roll": 8, "MCQ": 30, "CQ": 40},
        ]));
        let messages = format_results(&mut rows, "Sig");

        assert_eq!(
            messages[0],
            "ফলাফল: Math\nName: Nila, Roll: 7, Absent\nHighest Marks: 70\n— Sig"
        );
    }

    #[test]
    fn test_mcq_only_sheet() {
        let mut rows = records(json!([
            {"Exam": "Bio", "Name": "Rafi", "Roll": 1, "MCQ": 18.5},
            {"Exam": "Bio", "Name": "Mim", "Roll": 2, "MCQ": 0},
        ]));
        let messages = format_results(&mut rows, "Sig");

        assert_eq!(
            messages[0],
            "ফলাফল: Bio\nName: Rafi, Roll: 1, Obtained Marks (MCQ): 18.5, Position: 1, \
             Highest Marks (MCQ): 18.5\n— Sig"
        );
        assert_eq!(
            messages[1],
            "ফলাফল: Bio\nName: Mim, Roll: 2, Absent\nHighest Marks (MCQ): 18.5\n— Sig"
        );
    }

    #[test]
    fn test_missing_mcq_column_marks_everyone_absent() {
        let mut rows = records(json!([{"Exam": "Bio", "Name": "Rafi", "Roll": 1}]));
        let messages = format_results(&mut rows, "Sig");

        assert!(messages[0].contains("Absent\nHighest Marks (MCQ): 0\n"));
        assert_eq!(rows[0].get("Position"), Some(&Value::Null));
    }
}
