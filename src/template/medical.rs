//! Medical admission results, ranked by the sheet's `Marks` column.

use crate::dataset::Record;

use super::{
    POSITION_COLUMN, footer, has_column, header, highest, identity, number_value,
    numeric_column, position_value, rank_descending, rank_text, score_text,
};

pub(super) fn format_results(records: &mut [Record], signature: &str) -> Vec<String> {
    let has_marks = has_column(records, "Marks");
    let marks: Vec<Option<f64>> = if has_marks {
        numeric_column(records, "Marks")
    } else {
        vec![None; records.len()]
    };
    let ranks = rank_descending(&marks);
    let top = score_text(highest(&marks));

    let mut messages = Vec::with_capacity(records.len());
    for (i, record) in records.iter_mut().enumerate() {
        let score = marks.get(i).copied().flatten();
        let rank = ranks.get(i).copied().flatten();

        if has_marks {
            record.insert("Marks".to_owned(), number_value(score));
        }
        record.insert(POSITION_COLUMN.to_owned(), position_value(rank));

        // Both lines keep the space before the newline that recipients already see.
        let body = match score {
            Some(s) if s != 0.0 => format!(
                "{}, Obtained Marks: {}, Position: {}, Highest Marks: {top} \n",
                identity(record),
                score_text(s),
                rank_text(rank),
            ),
            _ => format!("{}, Absent, Highest Marks: {top} \n", identity(record)),
        };
        messages.push(format!("{}{body}{}", header(record), footer(signature)));
    }
    messages
}
