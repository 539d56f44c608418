#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Glyph-to-text reconstruction.
//!
//! Turns the positioned-glyph markup emitted by a page-layout converter
//! into a single line of reading-order text:
//!
//! 1. [`parser`] reads page, block, line, and text tags into
//!    [`CharacterRecord`]s.
//! 2. [`normalize`] folds each character to its canonical form.
//! 3. [`reading_order`] sorts the records and inserts separators at
//!    hierarchy boundaries.
//! 4. [`stopwords`] lower-cases, collapses whitespace, and drops stop words.

pub mod normalize;
pub mod parser;
pub mod reading_order;
pub mod stopwords;

use std::io::BufRead;
use std::path::PathBuf;

pub use stopwords::{Language, StopWords};
pub use tax_revenue_glyph_models::CharacterRecord;

/// Errors that can occur while reconstructing document text.
#[derive(Debug, thiserror::Error)]
pub enum GlyphError {
    /// I/O error while reading markup or stop-word files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The markup contained no text elements.
    #[error("Markup contained no characters")]
    Empty,

    /// A stop-word file could not be read.
    #[error("Failed to read stop words from {}: {source}", path.display())]
    StopWords {
        /// Path of the stop-word file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// No stop-word list is available for the language.
    #[error("No stop-word list available for {0}")]
    UnknownLanguage(Language),
}

/// Parses glyph markup and returns the cleaned, reading-order text.
///
/// # Errors
///
/// Returns [`GlyphError::Io`] if the markup cannot be read, or
/// [`GlyphError::Empty`] if it yields no characters.
pub fn reconstruct_markup<R: BufRead>(
    markup: R,
    stop_words: &StopWords,
) -> Result<String, GlyphError> {
    let mut records = parser::parse_markup(markup)?;
    if records.is_empty() {
        return Err(GlyphError::Empty);
    }

    normalize::normalize_records(&mut records);
    let raw = reading_order::reconstruct(records);

    Ok(stop_words.clean_text(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_PAGES: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<pages>
<page id="1" bbox="0.000,0.000,612.000,792.000" rotate="0">
<textbox id="0" bbox="10.000,700.000,40.000,710.000">
<textline bbox="10.000,700.000,40.000,710.000">
<text font="ABCDEE+Arial" bbox="20.000,700.000,25.000,710.000" ncolour="0" size="10.000">b</text>
<text font="ABCDEE+Arial" bbox="10.000,700.000,15.000,710.000" ncolour="0" size="10.000">a</text>
<text font="ABCDEE+Arial" bbox="30.000,700.000,35.000,710.000" ncolour="0" size="10.000">c</text>
<text>
</text>
</textline>
</textbox>
</page>
<page id="2" bbox="0.000,0.000,612.000,792.000" rotate="0">
<textbox id="0" bbox="10.000,700.000,30.000,710.000">
<textline bbox="10.000,700.000,30.000,710.000">
<text font="ABCDEE+Arial" bbox="10.000,700.000,15.000,710.000" ncolour="0" size="10.000">D</text>
<text font="ABCDEE+Arial" bbox="20.000,700.000,25.000,710.000" ncolour="0" size="10.000">e</text>
</textline>
</textbox>
</page>
</pages>
"#;

    #[test]
    fn reconstructs_two_page_document() {
        let text = reconstruct_markup(TWO_PAGES.as_bytes(), &StopWords::empty()).unwrap();
        assert_eq!(text, "abc de");
    }

    #[test]
    fn drops_stop_words_from_output() {
        let stop_words = StopWords::from_words(["abc"]);
        let text = reconstruct_markup(TWO_PAGES.as_bytes(), &stop_words).unwrap();
        assert_eq!(text, "de");
    }

    #[test]
    fn markup_without_text_is_empty() {
        let markup = "<pages>\n<page id=\"1\">\n</page>\n</pages>\n";
        let err = reconstruct_markup(markup.as_bytes(), &StopWords::empty()).unwrap_err();
        assert!(matches!(err, GlyphError::Empty));
    }
}
