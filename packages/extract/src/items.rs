//! Parallel attribute lists and the consistency gate.
//!
//! Matches append to four lists (category, value, unit, time basis). A
//! document's items are only released when all four lists have the same
//! length; any mismatch discards the whole document.

use tax_revenue_extract_models::{TaxUnit, TimeBasis, ZoneKind};

use crate::ExtractError;

/// A line item that passed the consistency gate but has not yet been
/// netted or deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Category name.
    pub category: String,
    /// Normalized value.
    pub value: String,
    /// Unit in effect when the line was read.
    pub unit: TaxUnit,
    /// Time basis of the template.
    pub time_basis: TimeBasis,
    /// Kind of zone the line was read in.
    pub kind: ZoneKind,
}

/// Accumulates matched attributes as four parallel lists.
#[derive(Debug, Default)]
pub struct ItemColumns {
    categories: Vec<(String, ZoneKind)>,
    values: Vec<String>,
    units: Vec<TaxUnit>,
    time_bases: Vec<TimeBasis>,
}

impl ItemColumns {
    /// Appends a category name.
    pub fn push_category(&mut self, category: String, kind: ZoneKind) {
        self.categories.push((category, kind));
    }

    /// Appends a value.
    pub fn push_value(&mut self, value: String) {
        self.values.push(value);
    }

    /// Appends a unit.
    pub fn push_unit(&mut self, unit: TaxUnit) {
        self.units.push(unit);
    }

    /// Appends a time basis.
    pub fn push_time_basis(&mut self, time_basis: TimeBasis) {
        self.time_bases.push(time_basis);
    }

    /// Number of categories recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
            && self.values.is_empty()
            && self.units.is_empty()
            && self.time_bases.is_empty()
    }

    /// Releases the recorded items if all four lists have equal length.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::CatalogMismatch`] if the list lengths
    /// disagree.
    pub fn finish(self, source_id: &str) -> Result<Vec<Candidate>, ExtractError> {
        let n = self.categories.len();
        if self.values.len() != n || self.units.len() != n || self.time_bases.len() != n {
            return Err(ExtractError::CatalogMismatch {
                source_id: source_id.to_string(),
                categories: n,
                values: self.values.len(),
                units: self.units.len(),
                time_bases: self.time_bases.len(),
            });
        }

        Ok(self
            .categories
            .into_iter()
            .zip(self.values)
            .zip(self.units)
            .zip(self.time_bases)
            .map(|((((category, kind), value), unit), time_basis)| Candidate {
                category,
                value,
                unit,
                time_basis,
                kind,
            })
            .collect())
    }
}
