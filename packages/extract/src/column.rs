//! Column resolution from header lines.
//!
//! Each slot holds an optional 1-based value column. `None` is the
//! explicit "no column resolved" state: under
//! [`MissingHeaderPolicy::RequireHeader`] every zone start clears the
//! columns and data lines are skipped until a header resolves them again.
//! Under [`MissingHeaderPolicy::Inherit`] the last resolved column (or the
//! slot default) carries forward.

use tax_revenue_extract_models::ReportPeriod;

use crate::template::{ColumnSelect, MissingHeaderPolicy, SlotConfig};

/// Per-slot column state for one document scan.
#[derive(Debug, Clone)]
pub struct ColumnResolver {
    names: Vec<String>,
    defaults: Vec<usize>,
    columns: Vec<Option<usize>>,
    /// `order[k]` is the slot presented `k`-th in the table.
    order: Vec<usize>,
    policy: MissingHeaderPolicy,
}

impl ColumnResolver {
    /// Creates a resolver seeded according to `policy`.
    #[must_use]
    pub fn new(slots: &[SlotConfig], policy: MissingHeaderPolicy) -> Self {
        let defaults: Vec<usize> = slots.iter().map(|s| s.default_column).collect();
        let columns = match policy {
            MissingHeaderPolicy::Inherit => defaults.iter().copied().map(Some).collect(),
            MissingHeaderPolicy::RequireHeader => vec![None; slots.len()],
        };

        Self {
            names: slots.iter().map(|s| s.name.clone()).collect(),
            defaults,
            columns,
            order: (0..slots.len()).collect(),
            policy,
        }
    }

    /// Called whenever a zone opens.
    pub fn on_zone_start(&mut self) {
        if self.policy == MissingHeaderPolicy::RequireHeader {
            self.columns.fill(None);
        }
    }

    /// Column for `slot`, or `None` if unresolved.
    #[must_use]
    pub fn column(&self, slot: usize) -> Option<usize> {
        self.columns.get(slot).copied().flatten()
    }

    /// Whether every slot has a column.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.columns.iter().all(Option::is_some)
    }

    /// Default column for `slot`.
    #[must_use]
    pub fn default_column(&self, slot: usize) -> Option<usize> {
        self.defaults.get(slot).copied()
    }

    /// Reorders slots from the slot names a caption lists in table order.
    /// Returns `false` and leaves the order unchanged unless every name is
    /// a known slot and every slot is named exactly once.
    pub fn set_order(&mut self, names: &[&str]) -> bool {
        if names.len() != self.names.len() {
            return false;
        }

        let mut order = Vec::with_capacity(names.len());
        for name in names {
            match self.names.iter().position(|n| n == name.trim()) {
                Some(slot) if !order.contains(&slot) => order.push(slot),
                _ => return false,
            }
        }

        log::debug!("Slot order now {names:?}");
        self.order = order;
        true
    }

    /// Applies a header line's cells. Cells are split into equal chunks,
    /// one per slot in table order; the cell chosen by `select` within a
    /// chunk sets that slot's column. Returns `true` if any column changed.
    pub fn apply_header(
        &mut self,
        cells: &[&str],
        select: &ColumnSelect,
        period: ReportPeriod,
    ) -> bool {
        let slots = self.order.len();
        if slots == 0 || cells.is_empty() || cells.len() % slots != 0 {
            log::warn!(
                "Header with {} cells cannot be split across {slots} slot(s)",
                cells.len()
            );
            return false;
        }

        let chunk = cells.len() / slots;
        let mut changed = false;

        for (position, &slot) in self.order.iter().enumerate() {
            let group = &cells[position * chunk..(position + 1) * chunk];
            if let Some(index) = choose(group, select, period) {
                let column = position * chunk + index + 1;
                log::debug!("Slot {:?} resolved to column {column}", self.names[slot]);
                self.columns[slot] = Some(column);
                changed = true;
            }
        }

        changed
    }
}

/// Picks a 0-based position within `cells`.
fn choose(cells: &[&str], select: &ColumnSelect, period: ReportPeriod) -> Option<usize> {
    match select {
        ColumnSelect::LaterYear => extreme_year(cells, |candidate, best| candidate > best),
        ColumnSelect::EarlierYear => extreme_year(cells, |candidate, best| candidate < best),
        ColumnSelect::TargetYear => {
            let target = period.year_label();
            cells.iter().position(|c| c.trim() == target)
        }
        ColumnSelect::Label(label) => cells.iter().rposition(|c| c.trim() == label),
    }
}

/// Position of the year preferred by `better`, keeping the first on ties.
fn extreme_year(cells: &[&str], better: impl Fn(u32, u32) -> bool) -> Option<usize> {
    let years: Vec<u32> = cells
        .iter()
        .map(|c| c.trim().parse().ok())
        .collect::<Option<_>>()?;

    let mut best = 0;
    for (i, &year) in years.iter().enumerate().skip(1) {
        if better(year, years[best]) {
            best = i;
        }
    }
    (!years.is_empty()).then_some(best)
}
