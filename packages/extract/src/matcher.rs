//! Regex compilation for a [`TemplateDefinition`].
//!
//! Every catalog entry becomes a full-line pattern: the label capture
//! surrounded by the layout's value captures. Value captures are named
//! `v0`, `v1`, ... in line order, so a 1-based column `n` always reads
//! capture `v{n-1}` whether the values lead or trail the label.

use regex::{Captures, Regex};

use crate::TemplateError;
use crate::template::{CategoryPattern, LayoutConfig, TemplateDefinition};

/// Characters a value token may contain.
const VALUE_CHARS: &str = r"[\d,.()$%*-]+";

/// A template with every pattern compiled.
#[derive(Debug)]
pub struct CompiledTemplate {
    /// The source definition.
    pub definition: TemplateDefinition,
    /// Unit line rule.
    pub unit: Option<Regex>,
    /// Slot order rule.
    pub slot_order: Option<Regex>,
    /// Header rules, parallel to `definition.headers`.
    pub headers: Vec<Regex>,
    /// Zones, parallel to `definition.zones`.
    pub zones: Vec<CompiledZone>,
    /// Fallback line pattern.
    pub fallback: Option<Regex>,
    /// Values-only pattern used to complete continuation labels.
    pub values_only: Regex,
    value_names: Vec<String>,
}

/// A zone's compiled captions and catalog.
#[derive(Debug)]
pub struct CompiledZone {
    /// Opening caption.
    pub start: Option<Regex>,
    /// Closing captions.
    pub end: Vec<Regex>,
    /// Catalog, parallel to the zone definition's categories.
    pub categories: Vec<CompiledCategory>,
}

/// A compiled catalog entry.
#[derive(Debug)]
pub struct CompiledCategory {
    /// Label plus values on one line.
    pub line: Regex,
    /// Label alone, for continuation entries.
    pub label: Regex,
}

impl CompiledTemplate {
    /// Compiles every pattern in `definition`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Regex`] naming the first pattern that fails
    /// to compile.
    pub fn compile(definition: TemplateDefinition) -> Result<Self, TemplateError> {
        let id = definition.id.as_str();
        let layout = &definition.layout;

        let unit = definition
            .unit_pattern
            .as_deref()
            .map(|p| compile(id, p))
            .transpose()?;
        let slot_order = definition
            .slot_order_pattern
            .as_deref()
            .map(|p| compile(id, p))
            .transpose()?;
        let headers = definition
            .headers
            .iter()
            .map(|h| compile(id, &h.pattern))
            .collect::<Result<Vec<_>, _>>()?;

        let catalog_start = if layout.anchored { "^" } else { "" };
        let mut zones = Vec::with_capacity(definition.zones.len());
        for zone in &definition.zones {
            zones.push(CompiledZone {
                start: zone.start.as_deref().map(|p| compile(id, p)).transpose()?,
                end: zone
                    .end
                    .iter()
                    .map(|p| compile(id, p))
                    .collect::<Result<Vec<_>, _>>()?,
                categories: zone
                    .categories
                    .iter()
                    .map(|c| compile_category(id, layout, catalog_start, c))
                    .collect::<Result<Vec<_>, _>>()?,
            });
        }

        let fallback = definition
            .fallback
            .as_ref()
            .map(|fb| {
                let start = if layout.anchored {
                    "^".to_string()
                } else {
                    format!(r"^\s*{}", fb.prefix)
                };
                compile(id, &line_pattern(layout, &start, &fb.label))
            })
            .transpose()?;

        let values_only = compile(id, &values_only_pattern(layout.trailing_values))?;
        let max_offset = definition
            .zones
            .iter()
            .flat_map(|z| &z.categories)
            .map(|c| c.column_offset)
            .max()
            .unwrap_or(0);
        let value_names = (0..layout.value_count() + max_offset)
            .map(|i| format!("v{i}"))
            .collect();

        Ok(Self {
            definition,
            unit,
            slot_order,
            headers,
            zones,
            fallback,
            values_only,
            value_names,
        })
    }

    /// Raw token at 1-based `column` of a line match, if the line has that
    /// many values.
    #[must_use]
    pub fn value_at<'t>(&self, caps: &Captures<'t>, column: usize) -> Option<&'t str> {
        let name = self.value_names.get(column.checked_sub(1)?)?;
        caps.name(name).map(|m| m.as_str())
    }

    /// Raw token at 1-based `column` of a values-only match.
    #[must_use]
    pub fn continuation_value_at<'t>(&self, caps: &Captures<'t>, column: usize) -> Option<&'t str> {
        let index = column.checked_sub(1 + self.definition.layout.leading_values)?;
        caps.name(self.value_names.get(index)?).map(|m| m.as_str())
    }
}

fn compile(id: &str, pattern: &str) -> Result<Regex, TemplateError> {
    Regex::new(&format!("(?i){pattern}")).map_err(|source| TemplateError::Regex {
        id: id.to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

fn compile_category(
    id: &str,
    layout: &LayoutConfig,
    start: &str,
    category: &CategoryPattern,
) -> Result<CompiledCategory, TemplateError> {
    let mut line = line_pattern(layout, start, &category.pattern);
    for extra in 0..category.column_offset {
        let index = layout.value_count() + extra;
        line.push_str(&format!(r"(?:\s+\$?\s*(?P<v{index}>{VALUE_CHARS}))?"));
    }

    Ok(CompiledCategory {
        line: compile(id, &line)?,
        label: compile(id, &category.pattern)?,
    })
}

/// Builds `{start}{leading values}(?P<label>{label}){suffix}{trailing values}`.
fn line_pattern(layout: &LayoutConfig, start: &str, label: &str) -> String {
    let mut pattern = String::from(start);
    let mut index = 0;

    for _ in 0..layout.leading_values {
        pattern.push_str(&format!(r"\s*\$?\s*(?P<v{index}>{VALUE_CHARS})"));
        index += 1;
    }
    if layout.leading_values > 0 {
        pattern.push_str(r"\s*");
    }

    pattern.push_str(&format!("(?P<label>{label})"));
    pattern.push_str(&layout.label_suffix);

    for _ in 0..layout.trailing_values {
        pattern.push_str(&format!(r"\s+\$?\s*(?P<v{index}>{VALUE_CHARS})"));
        index += 1;
    }

    pattern
}

/// Builds `^{text}{values}$`: a line whose only numbers are the trailing
/// value tokens, optionally after a run of label text.
fn values_only_pattern(trailing_values: usize) -> String {
    let mut pattern = String::from(r"^[^\d$()]*?");
    for i in 0..trailing_values {
        let gap = if i == 0 { r"\s*" } else { r"\s+" };
        pattern.push_str(&format!(r"{gap}\$?\s*(?P<v{i}>{VALUE_CHARS})"));
    }
    pattern.push_str(r"\s*$");
    pattern
}
