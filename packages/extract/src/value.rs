//! Line cleaning and numeric value normalization.
//!
//! Layout text is cleaned line by line before matching, and every matched
//! numeric token goes through [`normalize_value`] regardless of whether it
//! came from a catalog entry or the fallback.

/// Lower-cases a layout-text line and replaces every character outside
/// the matching alphabet with a space.
///
/// Form feeds, newlines, carriage returns, tabs, and vertical tabs are
/// dropped outright. Non-breaking spaces become spaces and em dashes become
/// hyphens. Runs of other disallowed characters collapse to one space.
#[must_use]
pub fn clean_line(line: &str) -> String {
    let mut cleaned = String::with_capacity(line.len());
    let mut in_run = false;

    for c in line.to_lowercase().chars() {
        let mapped = match c {
            '\x0C' | '\n' | '\r' | '\t' | '\x0B' => continue,
            '\u{A0}' => ' ',
            '\u{2014}' => '-',
            c if is_allowed(c) => c,
            _ => {
                if !in_run {
                    cleaned.push(' ');
                    in_run = true;
                }
                continue;
            }
        };
        in_run = false;
        cleaned.push(mapped);
    }

    cleaned
}

const fn is_allowed(c: char) -> bool {
    matches!(
        c,
        ' ' | 'a'..='z'
            | '0'..='9'
            | ','
            | '.'
            | '!'
            | '?'
            | ':'
            | ';'
            | '$'
            | '%'
            | '&'
            | '<'
            | '>'
            | '('
            | ')'
            | '['
            | ']'
            | '{'
            | '}'
            | '/'
            | '_'
            | '='
            | '+'
            | '-'
            | '*'
    )
}

/// Normalizes a matched numeric token.
///
/// Currency symbols are removed, an asterisk becomes a minus sign, a
/// parenthesized value is negated, and a value made only of one to three
/// dashes becomes `"0"`.
#[must_use]
pub fn normalize_value(raw: &str) -> String {
    let value = raw.replace('$', "").replace('*', "-");

    if let Some(inner) = value
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return format!("-{inner}");
    }

    match value.as_str() {
        "-" | "--" | "---" => "0".to_string(),
        _ => value,
    }
}

/// Parses normalized value text into a number.
///
/// Thousands separators and percent signs are ignored. A trailing minus
/// (left by an asterisk marker) negates the value. Returns `None` for text
/// that is not a number.
#[must_use]
pub fn parse_amount(value: &str) -> Option<f64> {
    let digits: String = value.chars().filter(|c| !matches!(c, ',' | '%')).collect();

    if let Some(body) = digits.strip_suffix('-').filter(|b| !b.is_empty()) {
        return body.parse::<f64>().ok().map(|n| -n.abs());
    }

    digits.parse::<f64>().ok()
}

/// Formats a number as value text with thousands separators, the way the
/// statements print their figures. Whole numbers print without a
/// fractional part and negative zero prints as `"0"`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
pub fn format_amount(amount: f64) -> String {
    if amount == 0.0 {
        return "0".to_string();
    }
    let plain = if amount.fract() == 0.0 && amount.abs() < 1e15 {
        format!("{}", amount.abs() as i64)
    } else {
        format!("{}", amount.abs())
    };

    let (whole, fraction) = plain
        .split_once('.')
        .map_or((plain.as_str(), None), |(w, f)| (w, Some(f)));
    let mut formatted = String::with_capacity(plain.len() + whole.len() / 3 + 1);
    if amount < 0.0 {
        formatted.push('-');
    }
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(digit);
    }
    if let Some(fraction) = fraction {
        formatted.push('.');
        formatted.push_str(fraction);
    }
    formatted
}

/// Forces a normalized value negative. Unparseable text is returned
/// unchanged.
#[must_use]
pub fn negate_abs(value: &str) -> String {
    parse_amount(value).map_or_else(
        || {
            log::debug!("Leaving non-numeric value {value:?} unsigned");
            value.to_string()
        },
        |amount| format_amount(-amount.abs()),
    )
}
