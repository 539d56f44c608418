//! The generic template-driven extractor.
//!
//! [`TemplateExtractor`] runs one compiled template over a document's
//! layout text. Each cleaned line is fed through the same steps in order:
//! unit rule, slot order, header rules, zone transitions, and finally
//! (inside a zone) pending continuation, catalog, and fallback matching.

use regex::Captures;
use tax_revenue_extract_models::{ExtractedLineItem, ReportPeriod, TaxUnit, ZoneKind};

use crate::column::ColumnResolver;
use crate::items::ItemColumns;
use crate::matcher::CompiledTemplate;
use crate::netting::{dedupe_keep_first, net_refunds};
use crate::template::{TemplateDefinition, ValueSign};
use crate::value::{clean_line, negate_abs, normalize_value};
use crate::zone::{Transition, ZoneDetector};
use crate::{ExtractError, RevenueExtractor, TemplateError};

/// Extractor backed by a [`TemplateDefinition`].
#[derive(Debug)]
pub struct TemplateExtractor {
    template: CompiledTemplate,
}

impl TemplateExtractor {
    /// Compiles `definition` into an extractor.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Regex`] if any pattern fails to compile.
    pub fn new(definition: TemplateDefinition) -> Result<Self, TemplateError> {
        Ok(Self {
            template: CompiledTemplate::compile(definition)?,
        })
    }
}

impl RevenueExtractor for TemplateExtractor {
    fn id(&self) -> &str {
        &self.template.definition.id
    }

    fn name(&self) -> &str {
        &self.template.definition.name
    }

    fn extract(
        &self,
        text: &str,
        period: ReportPeriod,
    ) -> Result<Vec<ExtractedLineItem>, ExtractError> {
        let def = &self.template.definition;

        let mut scan = Scan::new(&self.template, period);
        for raw in text.lines() {
            let line = clean_line(raw);
            if !line.trim().is_empty() {
                scan.observe(&line);
            }
        }

        let mut candidates = scan.items.finish(&def.id)?;
        if def.net_refunds {
            candidates = net_refunds(candidates, &def.refund_suffix, &def.id);
        }
        if def.dedupe {
            candidates = dedupe_keep_first(candidates);
        }

        log::debug!("[{}] Extracted {} line items for {period}", def.id, candidates.len());

        Ok(candidates
            .into_iter()
            .map(|c| ExtractedLineItem {
                source_id: def.id.clone(),
                period,
                category: c.category,
                value: c.value,
                unit: c.unit,
                time_basis: c.time_basis,
            })
            .collect())
    }
}

// ── Per-document scan state ──────────────────────────────────────────────

struct Scan<'a> {
    template: &'a CompiledTemplate,
    period: ReportPeriod,
    unit: TaxUnit,
    zones: ZoneDetector,
    columns: ColumnResolver,
    /// Continuation catalog entry in the active zone awaiting its values.
    pending: Option<usize>,
    items: ItemColumns,
}

impl<'a> Scan<'a> {
    fn new(template: &'a CompiledTemplate, period: ReportPeriod) -> Self {
        let def = &template.definition;
        Self {
            template,
            period,
            unit: def.unit,
            zones: ZoneDetector::default(),
            columns: ColumnResolver::new(&def.slots, def.missing_header),
            pending: None,
            items: ItemColumns::default(),
        }
    }

    fn observe(&mut self, line: &str) {
        let template = self.template;
        let def = &template.definition;

        self.observe_unit(line);
        self.observe_slot_order(line);

        if self.observe_headers(line) {
            return;
        }

        match self.zones.observe(line, &template.zones) {
            Transition::Opened(index) => {
                log::debug!("[{}] Entered zone {:?}", def.id, def.zones[index].name);
                self.columns.on_zone_start();
                self.pending = None;
                return;
            }
            Transition::Closed(index) => {
                log::debug!("[{}] Left zone {:?}", def.id, def.zones[index].name);
                self.pending = None;
                return;
            }
            Transition::None => {}
        }

        let Some(zone_index) = self.zones.active() else {
            return;
        };

        if !self.columns.is_resolved() {
            log::warn!("[{}] No column resolved; skipping line {line:?}", def.id);
            return;
        }

        self.match_line(zone_index, line);
    }

    fn observe_unit(&mut self, line: &str) {
        let Some(caps) = self.template.unit.as_ref().and_then(|re| re.captures(line)) else {
            return;
        };
        match caps.get(1).map(|m| m.as_str().parse::<TaxUnit>()) {
            Some(Ok(unit)) => self.unit = unit,
            _ => log::debug!("Ignoring unit line {line:?}"),
        }
    }

    fn observe_slot_order(&mut self, line: &str) {
        let Some(caps) = self
            .template
            .slot_order
            .as_ref()
            .and_then(|re| re.captures(line))
        else {
            return;
        };
        let names: Vec<&str> = caps.iter().skip(1).flatten().map(|m| m.as_str()).collect();
        self.columns.set_order(&names);
    }

    /// Applies every matching header rule. Returns `true` if the line is a
    /// header line.
    fn observe_headers(&mut self, line: &str) -> bool {
        let template = self.template;
        let mut is_header = false;

        for (rule, re) in template.definition.headers.iter().zip(&template.headers) {
            let Some(caps) = re.captures(line) else {
                continue;
            };
            is_header = true;

            if let Some(zone) = &rule.opens_zone {
                if let Some(index) = template.definition.zones.iter().position(|z| &z.name == zone) {
                    self.zones.open(index);
                    self.columns.on_zone_start();
                    self.pending = None;
                }
            }

            let cells: Vec<&str> = caps.iter().skip(1).flatten().map(|m| m.as_str()).collect();
            self.columns.apply_header(&cells, &rule.select, self.period);
        }

        is_header
    }

    fn match_line(&mut self, zone_index: usize, line: &str) {
        let template = self.template;
        let zone = &template.zones[zone_index];
        let zone_def = &template.definition.zones[zone_index];

        if let Some(entry) = self.pending {
            let is_catalog_line = zone
                .categories
                .iter()
                .zip(&zone_def.categories)
                .any(|(compiled, category)| {
                    !category.continuation && compiled.line.is_match(line)
                });

            if !is_catalog_line {
                if let Some(caps) = template.values_only.captures(line) {
                    let category = &zone_def.categories[entry];
                    log::trace!("Continuation {:?} completed by {line:?}", category.category);
                    self.emit(zone_index, &category.category, category.column_offset, &caps, true);
                    self.pending = None;
                    return;
                }
            }
        }

        for (entry, (compiled, category)) in zone.categories.iter().zip(&zone_def.categories).enumerate() {
            if category.continuation {
                if !compiled.label.is_match(line) {
                    continue;
                }
                if let Some(caps) = template.values_only.captures(line) {
                    log::trace!("Matched {:?} with its values in {line:?}", category.category);
                    self.emit(zone_index, &category.category, category.column_offset, &caps, true);
                } else {
                    self.pending = Some(entry);
                }
                return;
            }

            if let Some(caps) = compiled.line.captures(line) {
                log::trace!("Matched {:?} in {line:?}", category.category);
                self.emit(zone_index, &category.category, category.column_offset, &caps, false);
                return;
            }
        }

        let Some(fallback) = &template.fallback else {
            return;
        };
        let Some(caps) = fallback.captures(line) else {
            return;
        };

        let label = caps["label"].split_whitespace().collect::<Vec<_>>().join(" ");
        let excluded = template
            .definition
            .fallback
            .as_ref()
            .is_some_and(|fb| fb.exclude.iter().any(|e| e == &label));
        if label.is_empty() || excluded {
            return;
        }

        let name = if zone_def.kind == ZoneKind::Refund {
            format!("{label}{}", template.definition.refund_suffix)
        } else {
            label
        };
        log::trace!("Fallback label {name:?} from {line:?}");
        self.emit(zone_index, &name, 0, &caps, false);
    }

    /// Records one item per slot for a matched label.
    fn emit(
        &mut self,
        zone_index: usize,
        category: &str,
        column_offset: usize,
        caps: &Captures<'_>,
        continuation: bool,
    ) {
        let template = self.template;
        let def = &template.definition;
        let zone_def = &def.zones[zone_index];

        for (slot_index, slot) in def.slots.iter().enumerate() {
            let name = if slot.name.is_empty() {
                category.to_string()
            } else {
                format!("{category} {}", slot.name)
            };

            self.items.push_category(name, zone_def.kind);
            self.items.push_unit(self.unit);
            self.items.push_time_basis(def.time_basis);

            let value_at = |column: usize| {
                if continuation {
                    template.continuation_value_at(caps, column)
                } else {
                    template.value_at(caps, column)
                }
            };
            // An offset past the last value on the line reads the resolved
            // column itself.
            let raw = self.columns.column(slot_index).and_then(|column| {
                value_at(column + column_offset).or_else(|| {
                    if column_offset > 0 {
                        log::debug!(
                            "[{}] {category:?} has no value at offset {column_offset}",
                            def.id
                        );
                        value_at(column)
                    } else {
                        None
                    }
                })
            });

            let Some(raw) = raw else {
                log::warn!(
                    "[{}] {category:?} has no value in the resolved column (offset {column_offset})",
                    def.id
                );
                continue;
            };

            let value = normalize_value(raw);
            let value = match zone_def.sign {
                ValueSign::AsReported => value,
                ValueSign::Negative => negate_abs(&value),
            };
            self.items.push_value(value);
        }
    }
}
