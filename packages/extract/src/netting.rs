//! Refund netting and duplicate removal.
//!
//! Refund categories are linked to revenue categories by exact name:
//! `"<category><suffix>"`. Each linked revenue value becomes
//! `|revenue| - |refund|`. Refund rows never survive to the output;
//! a refund with no revenue counterpart is logged and dropped.

use std::collections::{HashMap, HashSet};

use tax_revenue_extract_models::ZoneKind;

use crate::items::Candidate;
use crate::value::{format_amount, parse_amount};

/// Nets refund-zone candidates into their revenue categories and drops
/// every refund-zone candidate.
#[must_use]
pub fn net_refunds(candidates: Vec<Candidate>, suffix: &str, source_id: &str) -> Vec<Candidate> {
    let mut refunds: HashMap<String, String> = HashMap::new();
    for c in candidates.iter().filter(|c| c.kind == ZoneKind::Refund) {
        refunds
            .entry(c.category.clone())
            .or_insert_with(|| c.value.clone());
    }

    let mut used: HashSet<String> = HashSet::new();
    let mut netted = Vec::with_capacity(candidates.len());

    for mut candidate in candidates {
        if candidate.kind == ZoneKind::Refund {
            continue;
        }

        let refund_name = format!("{}{suffix}", candidate.category);
        if let Some(refund) = refunds.get(&refund_name) {
            match (parse_amount(&candidate.value), parse_amount(refund)) {
                (Some(revenue), Some(refund)) => {
                    candidate.value = format_amount(revenue.abs() - refund.abs());
                }
                _ => log::warn!(
                    "[{source_id}] Cannot net {:?} ({:?}) against {refund_name:?} ({refund:?})",
                    candidate.category,
                    candidate.value,
                ),
            }
            used.insert(refund_name);
        }
        netted.push(candidate);
    }

    for name in refunds.keys().filter(|name| !used.contains(*name)) {
        log::warn!("[{source_id}] Refund {name:?} has no matching revenue category; dropped");
    }

    netted
}

/// Removes repeated category names, keeping the first occurrence.
#[must_use]
pub fn dedupe_keep_first(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen: HashSet<String> = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.category.clone()))
        .collect()
}
