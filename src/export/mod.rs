//! Export of result records.
//!
//! Results are written as CSV, one row per input URL, in input order.

mod csv;

pub use self::csv::{write_csv, write_csv_to};
