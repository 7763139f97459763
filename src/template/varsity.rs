//! Varsity / Engineering results, ranked by the sheet's `Total` column.

use crate::dataset::{Record, display_value};

use super::{
    POSITION_COLUMN, footer, has_column, header, highest, identity, number_value,
    numeric_column, position_value, rank_descending, rank_text, score_text,
};

pub(super) fn format_results(records: &mut [Record], signature: &str) -> Vec<String> {
    let has_total = has_column(records, "Total");
    let totals: Vec<Option<f64>> = if has_total {
        numeric_column(records, "Total")
    } else {
        vec![None; records.len()]
    };
    let ranks = rank_descending(&totals);
    let top = score_text(highest(&totals));

    let mut messages = Vec::with_capacity(records.len());
    for (i, record) in records.iter_mut().enumerate() {
        let total = totals.get(i).copied().flatten();
        let rank = ranks.get(i).copied().flatten();

        if has_total {
            record.insert("Total".to_owned(), number_value(total));
        }
        record.insert(POSITION_COLUMN.to_owned(), position_value(rank));

        let body = match total {
            Some(t) if t != 0.0 => format!(
                "{}, MCQ: {}, Written: {}, Total: {}, Position: {}, Highest Marks: {top}.\n",
                identity(record),
                record.get("MCQ").map(display_value).unwrap_or_default(),
                record.get("Written").map(display_value).unwrap_or_default(),
                score_text(t),
                rank_text(rank),
            ),
            _ => format!("{}, Absent, Highest Marks: {top}\n", identity(record)),
        };
        messages.push(format!("{}{body}{}", header(record), footer(signature)));
    }
    messages
}
