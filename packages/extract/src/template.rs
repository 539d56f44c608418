//! Config-driven jurisdiction template definition.
//!
//! [`TemplateDefinition`] captures everything unique about one
//! jurisdiction's revenue statement: the category catalog, zone
//! captions, header rules for column resolution, and the shape of a data
//! line. A single generic extractor handles every template.

use serde::Deserialize;
use tax_revenue_extract_models::{TaxUnit, TimeBasis, ZoneKind};

use crate::TemplateError;

// ── Top-level template ───────────────────────────────────────────────────

/// A complete, config-driven extraction template for one jurisdiction.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateDefinition {
    /// Jurisdiction key (e.g., `"CT"`). Also the document name prefix.
    pub id: String,
    /// Human-readable jurisdiction name.
    pub name: String,
    /// Unit assumed until a unit line says otherwise.
    #[serde(default)]
    pub unit: TaxUnit,
    /// Time basis of every figure in the statement.
    #[serde(default)]
    pub time_basis: TimeBasis,
    /// What to do when a zone starts before any header resolved a column.
    #[serde(default)]
    pub missing_header: MissingHeaderPolicy,
    /// Drop repeated category names, keeping the first.
    #[serde(default)]
    pub dedupe: bool,
    /// Subtract refund-zone amounts from matching revenue categories.
    #[serde(default)]
    pub net_refunds: bool,
    /// Suffix that links a refund category to its revenue category.
    #[serde(default = "default_refund_suffix")]
    pub refund_suffix: String,
    /// Pattern whose first capture names the unit (e.g., `in thousands`).
    #[serde(default)]
    pub unit_pattern: Option<String>,
    /// Pattern whose captures name the slots in the order the table
    /// presents them.
    #[serde(default)]
    pub slot_order_pattern: Option<String>,
    /// Shape of a data line.
    pub layout: LayoutConfig,
    /// Value slots emitted per matched label.
    #[serde(default = "default_slots")]
    pub slots: Vec<SlotConfig>,
    /// Header rules that resolve slot columns.
    #[serde(default)]
    pub headers: Vec<HeaderRule>,
    /// Ad-hoc label extraction for lines no catalog entry matches.
    #[serde(default)]
    pub fallback: Option<FallbackConfig>,
    /// Table regions, each with its own catalog.
    pub zones: Vec<ZoneDefinition>,
}

fn default_refund_suffix() -> String {
    " refund".to_string()
}

fn default_slots() -> Vec<SlotConfig> {
    vec![SlotConfig {
        name: String::new(),
        default_column: 1,
    }]
}

/// Column policy for zones entered without a resolving header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingHeaderPolicy {
    /// Keep whatever column was last resolved (initially the slot default).
    #[default]
    Inherit,
    /// Forget the column at every zone start and skip data lines until a
    /// header resolves it again.
    RequireHeader,
}

// ── Line layout ──────────────────────────────────────────────────────────

/// Where the numeric tokens sit relative to the label.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayoutConfig {
    /// Values precede the label and the line is anchored at its start.
    #[serde(default)]
    pub anchored: bool,
    /// Number of value tokens before the label.
    #[serde(default)]
    pub leading_values: usize,
    /// Number of value tokens after the label.
    #[serde(default)]
    pub trailing_values: usize,
    /// Pattern matched directly after the label (e.g., an optional
    /// parenthetical note).
    #[serde(default)]
    pub label_suffix: String,
}

impl LayoutConfig {
    /// Total value tokens on a data line.
    #[must_use]
    pub const fn value_count(&self) -> usize {
        self.leading_values + self.trailing_values
    }
}

/// One value emitted per matched label.
#[derive(Debug, Clone, Deserialize)]
pub struct SlotConfig {
    /// Appended to the category name when non-empty.
    #[serde(default)]
    pub name: String,
    /// 1-based value column used until a header resolves another.
    pub default_column: usize,
}

// ── Column resolution ────────────────────────────────────────────────────

/// A header line pattern and how to pick a column from its captures.
#[derive(Debug, Clone, Deserialize)]
pub struct HeaderRule {
    /// Pattern whose captures are the header cells.
    pub pattern: String,
    /// Which cell within each slot's share of cells to choose.
    pub select: ColumnSelect,
    /// Zone opened by this header, if any.
    #[serde(default)]
    pub opens_zone: Option<String>,
}

/// Strategy for choosing a column among header cells.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSelect {
    /// The strictly later year wins; ties keep the first cell.
    LaterYear,
    /// The strictly earlier year wins; ties keep the first cell.
    EarlierYear,
    /// The cell equal to the report year.
    TargetYear,
    /// The last cell equal to this label (e.g., `"actual"`).
    Label(String),
}

// ── Fallback ─────────────────────────────────────────────────────────────

/// Generic label extraction for lines no catalog entry matches.
#[derive(Debug, Clone, Deserialize)]
pub struct FallbackConfig {
    /// Pattern for the ad-hoc label.
    #[serde(default = "default_fallback_label")]
    pub label: String,
    /// Pattern allowed between the line start and the label.
    #[serde(default)]
    pub prefix: String,
    /// Labels the fallback must never emit (e.g., column captions).
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_fallback_label() -> String {
    r"[a-z]+[\D]*?".to_string()
}

// ── Zones and catalogs ───────────────────────────────────────────────────

/// A table region and its ordered category catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneDefinition {
    /// Zone name referenced by header rules.
    pub name: String,
    /// Revenue or refund.
    #[serde(default)]
    pub kind: ZoneKind,
    /// Caption that opens the zone.
    #[serde(default)]
    pub start: Option<String>,
    /// Captions that close the zone.
    #[serde(default)]
    pub end: Vec<String>,
    /// Sign applied to every value in the zone.
    #[serde(default)]
    pub sign: ValueSign,
    /// Ordered catalog. The first matching entry wins.
    pub categories: Vec<CategoryPattern>,
}

/// Sign handling for a zone's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSign {
    /// Keep values as printed.
    #[default]
    AsReported,
    /// Force values negative.
    Negative,
}

/// One catalog entry: a category label and the pattern that finds it.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryPattern {
    /// Category name written to the output.
    pub category: String,
    /// Label pattern.
    pub pattern: String,
    /// Added to the resolved column for this category only.
    #[serde(default)]
    pub column_offset: usize,
    /// The label sits alone on its line and the values follow on the next
    /// line.
    #[serde(default)]
    pub continuation: bool,
}

/// Parses and validates a template definition from TOML.
///
/// # Errors
///
/// Returns [`TemplateError::Toml`] if the TOML is malformed, or
/// [`TemplateError::Invalid`] if the definition is inconsistent.
pub fn parse_template_toml(toml_str: &str) -> Result<TemplateDefinition, TemplateError> {
    let definition: TemplateDefinition = toml::from_str(toml_str)?;
    validate(&definition)?;
    Ok(definition)
}

fn validate(def: &TemplateDefinition) -> Result<(), TemplateError> {
    let invalid = |message: String| TemplateError::Invalid {
        id: def.id.clone(),
        message,
    };

    let value_count = def.layout.value_count();
    if value_count == 0 {
        return Err(invalid("layout declares no value columns".to_string()));
    }
    if def.slots.is_empty() {
        return Err(invalid("at least one slot is required".to_string()));
    }
    for slot in &def.slots {
        if slot.default_column == 0 || slot.default_column > value_count {
            return Err(invalid(format!(
                "slot {:?} default column {} is outside 1..={value_count}",
                slot.name, slot.default_column
            )));
        }
    }
    if def.zones.is_empty() {
        return Err(invalid("at least one zone is required".to_string()));
    }
    for zone in def.headers.iter().filter_map(|h| h.opens_zone.as_ref()) {
        if !def.zones.iter().any(|z| &z.name == zone) {
            return Err(invalid(format!("header opens unknown zone {zone:?}")));
        }
    }
    for zone in &def.zones {
        let opened_by_header = def
            .headers
            .iter()
            .any(|h| h.opens_zone.as_ref() == Some(&zone.name));
        if zone.start.is_none() && !opened_by_header {
            return Err(invalid(format!("zone {:?} can never open", zone.name)));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
id = "XX"
name = "Example"

[layout]
trailing_values = 2

[[zones]]
name = "revenue"
start = 'monthly revenue'
end = ['total']
categories = [
  { category = "withholding", pattern = 'withholding' },
]
"#;

    #[test]
    fn applies_defaults() {
        let def = parse_template_toml(MINIMAL).unwrap();
        assert_eq!(def.unit, TaxUnit::Dollars);
        assert_eq!(def.time_basis, TimeBasis::Month);
        assert_eq!(def.missing_header, MissingHeaderPolicy::Inherit);
        assert_eq!(def.refund_suffix, " refund");
        assert_eq!(def.slots.len(), 1);
        assert_eq!(def.slots[0].default_column, 1);
        assert_eq!(def.zones[0].kind, ZoneKind::Revenue);
        assert_eq!(def.zones[0].sign, ValueSign::AsReported);
    }

    #[test]
    fn parses_label_select() {
        let toml_str = format!(
            "{MINIMAL}\n[[headers]]\npattern = '(actual|estimated)\\s+(actual|estimated)'\nselect = {{ label = \"actual\" }}\n"
        );
        let def = parse_template_toml(&toml_str).unwrap();
        assert_eq!(def.headers[0].select, ColumnSelect::Label("actual".to_string()));
    }

    #[test]
    fn rejects_out_of_range_default_column() {
        let toml_str = MINIMAL.replace(
            "[layout]",
            "[[slots]]\ndefault_column = 3\n\n[layout]",
        );
        let err = parse_template_toml(&toml_str).unwrap_err();
        assert!(matches!(err, TemplateError::Invalid { .. }), "{err}");
    }

    #[test]
    fn rejects_unknown_zone_reference() {
        let toml_str = format!(
            "{MINIMAL}\n[[headers]]\npattern = '(\\d{{4}})'\nselect = \"target_year\"\nopens_zone = \"nowhere\"\n"
        );
        assert!(parse_template_toml(&toml_str).is_err());
    }
}
