//! Record extraction
//!
//! Turns the active document into [`ProductRecord`]s and [`ReviewRecord`]s.
//! Individual field failures never abort a record; they fall back to the
//! field's default and are tallied in [`ExtractionStats`].

mod field;
mod parse;
mod record;

pub use field::{ExtractionStats, FieldExtractor, FieldTally, Read, Scope};
pub use parse::{
    mentions_promo, parse_ownership, parse_parenthesized_count, parse_rating, parse_timestamp,
};
pub use record::{ProductRecord, RecordBuilder, ReviewRecord};
