//! Character normalization applied to every glyph before sorting.
//!
//! Folds Latin diacritics to their base letters and collapses
//! punctuation, digits, control characters, and any other non-ASCII code
//! point to a single space. Apostrophes are elided so contractions stay
//! joined. The rule table is ordered; each rule only sees inputs that
//! earlier rules let through.

use tax_revenue_glyph_models::CharacterRecord;

const SPACE: &str = " ";

/// Maps one glyph payload to its canonical form.
///
/// Total over all inputs: the empty string maps to the empty string, any
/// multi-character payload maps to a space, and every single code point
/// maps to a defined output.
#[must_use]
pub fn normalize_char(raw: &str) -> &str {
    let mut chars = raw.chars();
    let Some(c) = chars.next() else {
        return "";
    };
    if chars.next().is_some() {
        return SPACE;
    }

    match u32::from(c) {
        0..=38 | 40..=64 | 91..=96 | 123..=126 | 0x201D => SPACE,
        39 | 0x2019 => "",
        0xC0..=0xC6 | 0xE0..=0xE6 => "a",
        0xC7 | 0xE7 => "c",
        0xC8..=0xCB | 0xE8..=0xEB => "e",
        0xCC..=0xCF | 0xEC..=0xEF => "i",
        0xD1 | 0xF1 => "n",
        0xD2..=0xD6 | 0xD8 | 0xF2..=0xF6 | 0xF8 => "o",
        0xDF => "ss",
        0xD9..=0xDC | 0xF9..=0xFC => "u",
        0xDD | 0xFD | 0xFF => "y",
        128.. => SPACE,
        _ => raw,
    }
}

/// Normalizes the value of every record in place.
pub fn normalize_records(records: &mut [CharacterRecord]) {
    for record in records {
        let normalized = normalize_char(&record.value);
        if normalized != record.value {
            record.value = normalized.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stays_empty() {
        assert_eq!(normalize_char(""), "");
    }

    #[test]
    fn combined_glyph_becomes_space() {
        assert_eq!(normalize_char("fi"), " ");
        assert_eq!(normalize_char("ab"), " ");
    }

    #[test]
    fn punctuation_digits_and_controls_become_space() {
        for raw in ["\t", "\n", " ", "!", "&", ",", ".", "/", ":", "@", "[", "`", "{", "~", "5", "0", "\u{201D}"] {
            assert_eq!(normalize_char(raw), " ", "input {raw:?}");
        }
    }

    #[test]
    fn apostrophes_are_elided() {
        assert_eq!(normalize_char("'"), "");
        assert_eq!(normalize_char("\u{2019}"), "");
    }

    #[test]
    fn folds_accented_letters() {
        assert_eq!(normalize_char("é"), "e");
        assert_eq!(normalize_char("À"), "a");
        assert_eq!(normalize_char("Ç"), "c");
        assert_eq!(normalize_char("ñ"), "n");
        assert_eq!(normalize_char("Ø"), "o");
        assert_eq!(normalize_char("ü"), "u");
        assert_eq!(normalize_char("ÿ"), "y");
        assert_eq!(normalize_char("ß"), "ss");
    }

    #[test]
    fn unlisted_non_ascii_becomes_space() {
        for raw in ["×", "÷", "Ð", "Þ", "€", "\u{2014}", "漢"] {
            assert_eq!(normalize_char(raw), " ", "input {raw:?}");
        }
    }

    #[test]
    fn ascii_letters_pass_through() {
        assert_eq!(normalize_char("a"), "a");
        assert_eq!(normalize_char("Z"), "Z");
        assert_eq!(normalize_char("\u{7F}"), "\u{7F}");
    }

    #[test]
    fn single_character_outputs_are_fixed_points() {
        for code in (0..=0x10FFFF_u32).step_by(97).chain(0..=0x2FF) {
            let Some(c) = char::from_u32(code) else {
                continue;
            };
            let once = normalize_char(c.encode_utf8(&mut [0; 4])).to_string();
            if once.chars().count() == 1 {
                assert_eq!(normalize_char(&once), once, "code point {code:#X}");
            }
        }
    }

    #[test]
    fn normalizes_records_in_place() {
        let mut records = vec![CharacterRecord {
            page: 1,
            block: 0,
            line: 1,
            x1: 0.0,
            y1: 0.0,
            x2: 1.0,
            y2: 1.0,
            font_size: 10.0,
            font: "F".to_string(),
            value: "É".to_string(),
        }];
        normalize_records(&mut records);
        assert_eq!(records[0].value, "e");
    }
}
