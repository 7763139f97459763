//! Row selection over the current preview dataset.
//!
//! Operators pick rows in two ways: ticking individual rows, or typing a compact
//! range expression. Expressions are 1-based because that is what the operator sees
//! next to each row; everything stored here is 0-based.
//!
//! | Expression | Meaning                           |
//! |------------|-----------------------------------|
//! | `20`       | row 20 only                       |
//! | `20-50`    | rows 20 through 50, clamped       |
//! | `20-`      | row 20 through the last row       |
//!
//! ```
//! use sms_format::selection::SelectionStore;
//!
//! let mut selection = SelectionStore::new(100);
//! selection.apply_range("20-50")?;
//! assert_eq!(selection.count(), 31);
//! # Ok::<(), sms_format::selection::RangeError>(())
//! ```

pub mod range;
pub mod store;

pub use range::{RangeError, parse_range};
pub use store::SelectionStore;
