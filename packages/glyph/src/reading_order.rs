//! Reading-order reconstruction.
//!
//! Records are stably sorted by page, block, line, descending `y1`, and
//! ascending `x1`. Characters within a line are concatenated without any
//! added spacing; a single separator is emitted whenever the page, block,
//! or line changes from one record to the next.

use tax_revenue_glyph_models::CharacterRecord;

/// Separator inserted at every page, block, or line boundary.
pub const SEPARATOR: char = ' ';

/// Sorts `records` into reading order and flattens them to a string.
///
/// An empty input yields an empty string; callers treat a document without
/// characters as a failure before reaching this point.
#[must_use]
pub fn reconstruct(mut records: Vec<CharacterRecord>) -> String {
    records.sort_by(CharacterRecord::reading_order);

    let mut text = String::with_capacity(records.len() + records.len() / 4);
    let mut previous: Option<&CharacterRecord> = None;

    for record in &records {
        if previous.is_some_and(|p| p.crosses_boundary(record)) {
            text.push(SEPARATOR);
        }
        text.push_str(&record.value);
        previous = Some(record);
    }

    text
}
