//! Line-oriented parser for positioned-glyph markup.
//!
//! The markup is never parsed as a tree. Each trimmed input line is tested
//! against four tag shapes in order (page, text box, text line, text) and
//! anything else is ignored. A text-box tag resets the line counter and
//! each text-line tag increments it.

use std::io::BufRead;
use std::sync::LazyLock;

use regex::Regex;
use tax_revenue_glyph_models::CharacterRecord;

use crate::GlyphError;

static PAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<page id="(\d+)""#).expect("valid regex"));

static TEXTBOX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<textbox id="(\d+)""#).expect("valid regex"));

static TEXTLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<textline").expect("valid regex"));

static TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"<text.*font="(.*)".*"#,
        r#"bbox="(-?[0-9]+\.[0-9]+),(-?[0-9]+\.[0-9]+),(-?[0-9]+\.[0-9]+),(-?[0-9]+\.[0-9]+)""#,
        r#".*size="([0-9]+\.[0-9]+)">(.*)</text>"#,
    ))
    .expect("valid regex")
});

/// Tracks the page/block/line position while streaming markup lines.
#[derive(Debug, Default)]
struct Cursor {
    page: u32,
    block: u32,
    line: u32,
}

/// Parses glyph markup into character records in document order.
///
/// Values are returned raw (entity-decoded but not normalized).
///
/// # Errors
///
/// Returns [`GlyphError::Io`] if reading from `markup` fails.
pub fn parse_markup<R: BufRead>(markup: R) -> Result<Vec<CharacterRecord>, GlyphError> {
    let mut cursor = Cursor::default();
    let mut records = Vec::new();

    for line in markup.lines() {
        let line = line?;
        if let Some(record) = parse_line(line.trim(), &mut cursor) {
            records.push(record);
        }
    }

    log::debug!(
        "Parsed {} glyphs (last page id {})",
        records.len(),
        records.last().map_or(0, |r| r.page)
    );

    Ok(records)
}

fn parse_line(line: &str, cursor: &mut Cursor) -> Option<CharacterRecord> {
    if let Some(caps) = PAGE_RE.captures(line) {
        cursor.page = caps[1].parse().unwrap_or(cursor.page);
        return None;
    }
    if let Some(caps) = TEXTBOX_RE.captures(line) {
        cursor.block = caps[1].parse().unwrap_or(cursor.block);
        cursor.line = 0;
        return None;
    }
    if TEXTLINE_RE.is_match(line) {
        cursor.line += 1;
        return None;
    }

    let caps = TEXT_RE.captures(line)?;
    let number = |i: usize| caps[i].parse::<f64>().ok();

    Some(CharacterRecord {
        page: cursor.page,
        block: cursor.block,
        line: cursor.line,
        x1: number(2)?,
        y1: number(3)?,
        x2: number(4)?,
        y2: number(5)?,
        font_size: number(6)?,
        font: caps[1].to_string(),
        value: decode_entities(&caps[7]),
    })
}

/// Decodes the five predefined XML entities.
fn decode_entities(payload: &str) -> String {
    if !payload.contains('&') {
        return payload.to_string();
    }

    payload
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
