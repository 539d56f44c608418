//! Template registry, loaded from embedded TOML configs.
//!
//! Each `.toml` file in `packages/extract/templates/` is baked into the
//! binary at compile time via [`include_str!`]. Adding a jurisdiction is a
//! new TOML file plus one line in the list below.

use std::collections::BTreeMap;

use crate::extractor::TemplateExtractor;
use crate::template::{TemplateDefinition, parse_template_toml};
use crate::{ExtractError, RevenueExtractor};

/// TOML configs embedded at compile time.
const TEMPLATE_TOMLS: &[(&str, &str)] = &[
    ("ca", include_str!("../templates/ca.toml")),
    ("ct", include_str!("../templates/ct.toml")),
    ("nj", include_str!("../templates/nj.toml")),
    ("pa", include_str!("../templates/pa.toml")),
];

/// Total number of embedded templates (used in tests).
#[cfg(test)]
const EXPECTED_TEMPLATE_COUNT: usize = 4;

/// Returns all embedded template definitions.
///
/// # Panics
///
/// Panics if any embedded TOML config is malformed (the configs ship with
/// the binary, so this is caught by the registry tests).
#[must_use]
pub fn all_templates() -> Vec<TemplateDefinition> {
    TEMPLATE_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_template_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Maps jurisdiction keys to extractors.
#[derive(Default)]
pub struct TemplateRegistry {
    extractors: BTreeMap<String, Box<dyn RevenueExtractor>>,
}

impl TemplateRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every embedded template.
    ///
    /// # Panics
    ///
    /// Panics if any embedded template is malformed or has a pattern that
    /// does not compile.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for definition in all_templates() {
            let id = definition.id.clone();
            let extractor = TemplateExtractor::new(definition)
                .unwrap_or_else(|e| panic!("Failed to compile template {id}: {e}"));
            registry.register(Box::new(extractor));
        }
        registry
    }

    /// Adds or replaces the extractor for its jurisdiction key.
    pub fn register(&mut self, extractor: Box<dyn RevenueExtractor>) {
        let id = extractor.id().to_uppercase();
        if self.extractors.insert(id.clone(), extractor).is_some() {
            log::warn!("Replaced extractor for {id}");
        }
    }

    /// Looks up the extractor for `id` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::UnknownJurisdiction`] if none is registered.
    pub fn get(&self, id: &str) -> Result<&dyn RevenueExtractor, ExtractError> {
        self.extractors
            .get(&id.to_uppercase())
            .map(AsRef::as_ref)
            .ok_or_else(|| ExtractError::UnknownJurisdiction(id.to_string()))
    }

    /// Registered jurisdiction keys in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.extractors.keys().map(String::as_str)
    }

    /// Registered extractors in key order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn RevenueExtractor> {
        self.extractors.values().map(AsRef::as_ref)
    }

    /// Number of registered extractors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use tax_revenue_extract_models::{ExtractedLineItem, ReportPeriod, TaxUnit, TimeBasis};

    use super::*;

    #[test]
    fn loads_all_templates() {
        let templates = all_templates();
        assert_eq!(templates.len(), EXPECTED_TEMPLATE_COUNT);
    }

    #[test]
    fn template_ids_are_unique() {
        let templates = all_templates();
        let mut ids: Vec<&str> = templates.iter().map(|t| t.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), templates.len());
    }

    #[test]
    fn every_template_compiles() {
        let registry = TemplateRegistry::builtin();
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["CA", "CT", "NJ", "PA"]);
    }

    #[test]
    fn catalogs_keep_declaration_order() {
        let templates = all_templates();
        let ct = templates.iter().find(|t| t.id == "CT").unwrap();
        assert_eq!(ct.zones[0].categories[0].category, "withholding");
        assert_eq!(ct.zones[1].categories[0].category, "withholding refund");
        assert_eq!(ct.zones[0].categories.len(), 55);
        assert_eq!(ct.zones[1].categories.len(), 40);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = TemplateRegistry::builtin();
        assert_eq!(registry.get("nj").unwrap().name(), "New Jersey");
        assert!(matches!(
            registry.get("ZZ"),
            Err(ExtractError::UnknownJurisdiction(_))
        ));
    }

    fn pairs(items: &[ExtractedLineItem]) -> Vec<(&str, &str)> {
        items
            .iter()
            .map(|i| (i.category.as_str(), i.value.as_str()))
            .collect()
    }

    #[test]
    fn connecticut_nets_refunds_into_revenue() {
        let text = "\
Current Month Revenue Comparison
Type of Revenue 2023 2022
Withholding $1,000 $900
Sales & Use 500 400
Withholding 7 7
Totals 1,507 1,307
Current Month Refunds Comparison
Type of Refund 2023 2022
Withholding 100 90
Hospitals 5 7
Total Refunds 105 97
";
        let registry = TemplateRegistry::builtin();
        let period = ReportPeriod::new(2023, 5).unwrap();
        let items = registry.get("CT").unwrap().extract(text, period).unwrap();

        assert_eq!(pairs(&items), vec![("withholding", "900"), ("sales and use", "500")]);
        assert!(items.iter().all(|i| i.unit == TaxUnit::Dollars));
    }

    #[test]
    fn california_emits_one_item_per_fund() {
        let text = "\
Comparative Statement of Revenues Received
(In Thousands)
General Fund Special Funds
2023 2022 2023 2022
Cigarette Tax 100 90 50 40
Total Revenues 100 90 50 40
";
        let registry = TemplateRegistry::builtin();
        let period = ReportPeriod::new(2023, 7).unwrap();
        let items = registry.get("CA").unwrap().extract(text, period).unwrap();

        assert_eq!(
            pairs(&items),
            vec![
                ("cigarette tax general fund", "100"),
                ("cigarette tax special funds", "50"),
            ]
        );
        assert!(items.iter().all(|i| i.time_basis == TimeBasis::YtdThruMonth));
        assert!(items.iter().all(|i| i.unit == TaxUnit::Thousands));
    }

    #[test]
    fn new_jersey_reads_leading_report_year_column() {
        let text = "\
2022 2023 Change
1,000 1,100 10.0% Cigarette 5,000 5,500 10.0%
Note: preliminary figures
";
        let registry = TemplateRegistry::builtin();
        let period = ReportPeriod::new(2023, 5).unwrap();
        let items = registry.get("NJ").unwrap().extract(text, period).unwrap();

        assert_eq!(pairs(&items), vec![("cigarette", "1,100")]);
    }

    #[test]
    fn pennsylvania_picks_actual_column() {
        let text = "\
General Fund Comparison of Actual to Estimate
Revenue Sources Estimated Actual
Bank Shares 90 100
Bank Shares 1 2
Total - Other Motor Receipts 5 5
";
        let registry = TemplateRegistry::builtin();
        let period = ReportPeriod::new(2023, 5).unwrap();
        let items = registry.get("PA").unwrap().extract(text, period).unwrap();

        assert_eq!(pairs(&items), vec![("bank shares", "100")]);
    }

    #[test]
    fn pennsylvania_keeps_total_next_to_its_subtotal_label() {
        let text = "\
General Fund Comparison of Actual to Estimate
Revenue Sources Actual Estimated
Licenses & Fees 10 20
Total - Licenses and Fees 30 40
Total - Other Motor Receipts 5 5
";
        let registry = TemplateRegistry::builtin();
        let period = ReportPeriod::new(2023, 5).unwrap();
        let items = registry.get("PA").unwrap().extract(text, period).unwrap();

        assert_eq!(
            pairs(&items),
            vec![("licenses & fees", "10"), ("total - licenses and fees", "30")]
        );
    }

    #[test]
    fn connecticut_single_line_insurers_keep_their_own_values() {
        let text = "\
Current Month Revenue Comparison
Nonadmitted / Unauthorized / Captive Insurers 500 700
Alcoholic Beverages 10 20
";
        let registry = TemplateRegistry::builtin();
        let period = ReportPeriod::new(2023, 5).unwrap();
        let items = registry.get("CT").unwrap().extract(text, period).unwrap();

        assert_eq!(
            pairs(&items),
            vec![
                ("nonadmitted unauthorized captive insurers", "500"),
                ("alcoholic beverages", "10"),
            ]
        );
    }

    #[test]
    fn connecticut_offset_refunds_with_later_year_second() {
        let text = "\
Current Month Revenue Comparison
Type of Revenue 2022 2023
Hospitals 50 60
Withholding 1,500 2,000
Totals 1,550 2,060
Current Month Refunds Comparison
Type of Refund 2022 2023
Hospitals 1 3 9
Withholding 100 750
Total Refunds 101 753
";
        let registry = TemplateRegistry::builtin();
        let period = ReportPeriod::new(2023, 5).unwrap();
        let items = registry.get("CT").unwrap().extract(text, period).unwrap();

        assert_eq!(
            pairs(&items),
            vec![("hospitals", "51"), ("withholding", "1,250")]
        );
    }

    struct Fixed;

    impl RevenueExtractor for Fixed {
        fn id(&self) -> &str {
            "zz"
        }

        fn name(&self) -> &str {
            "Fixed"
        }

        fn extract(
            &self,
            _text: &str,
            period: ReportPeriod,
        ) -> Result<Vec<ExtractedLineItem>, ExtractError> {
            Ok(vec![ExtractedLineItem {
                source_id: "ZZ".to_string(),
                period,
                category: "fixed".to_string(),
                value: "1".to_string(),
                unit: TaxUnit::Dollars,
                time_basis: TimeBasis::Month,
            }])
        }
    }

    #[test]
    fn custom_extractors_register_without_dispatch_changes() {
        let mut registry = TemplateRegistry::builtin();
        registry.register(Box::new(Fixed));
        assert_eq!(registry.len(), 5);

        let period = ReportPeriod::new(2024, 1).unwrap();
        let items = registry.get("ZZ").unwrap().extract("", period).unwrap();
        assert_eq!(items[0].category, "fixed");
    }
}
