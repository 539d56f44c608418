//! Zone detection.
//!
//! Tracks which table region of a statement the current line belongs to.
//! A start caption opens its zone (and takes precedence over any end
//! caption on the same line); otherwise an end caption of the active zone
//! returns the detector to inactive. The state persists across lines until
//! the next transition.

use tax_revenue_extract_models::{ZoneKind, ZoneState};

use crate::matcher::CompiledZone;

/// Result of feeding one line to the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The line changed nothing.
    None,
    /// The line opened the zone at this index.
    Opened(usize),
    /// The line closed the zone at this index.
    Closed(usize),
}

/// Zone state machine for one document scan.
#[derive(Debug, Clone, Default)]
pub struct ZoneDetector {
    active: Option<usize>,
}

impl ZoneDetector {
    /// Index of the active zone.
    #[must_use]
    pub const fn active(&self) -> Option<usize> {
        self.active
    }

    /// Current state given the zone kinds of the template.
    #[must_use]
    pub fn state(&self, kinds: &[ZoneKind]) -> ZoneState {
        self.active
            .and_then(|i| kinds.get(i))
            .map_or(ZoneState::Inactive, |&kind| ZoneState::from(kind))
    }

    /// Opens the zone at `index` directly (e.g., from a header rule).
    pub fn open(&mut self, index: usize) {
        self.active = Some(index);
    }

    /// Evaluates one line against the zone captions.
    pub fn observe(&mut self, line: &str, zones: &[CompiledZone]) -> Transition {
        let started = zones
            .iter()
            .position(|z| z.start.as_ref().is_some_and(|re| re.is_match(line)));
        if let Some(index) = started {
            self.active = Some(index);
            return Transition::Opened(index);
        }

        if let Some(index) = self.active {
            if zones[index].end.iter().any(|re| re.is_match(line)) {
                self.active = None;
                return Transition::Closed(index);
            }
        }

        Transition::None
    }
}
