//! Scrape pipeline: layout text to pipe-delimited rows.
//!
//! For one report period, each jurisdiction's statement is converted to
//! layout text if needed, run through its template, and written to
//! `dat/{ST}_{yyyy}_{mm}.txt`. Rows from every jurisdiction are then
//! collected into `prod/{yyyy}_{mm}.txt`, which is rebuilt on every run.

use std::path::Path;

use tax_revenue_extract::{ExtractError, RevenueExtractor, TemplateRegistry};
use tax_revenue_extract_models::{ReportPeriod, RevenueRow};

use crate::PipelineError;
use crate::convert::remove_if_exists;
use crate::converter::DocumentConverter;
use crate::output::{read_rows, write_rows};
use crate::progress::ProgressCallback;
use crate::project::ProjectLayout;

/// What to scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeOptions {
    /// Report period.
    pub period: ReportPeriod,
    /// Re-extract documents whose row file already exists.
    pub force: bool,
    /// Jurisdictions to scrape. Every registered one when `None`.
    pub jurisdictions: Option<Vec<String>>,
}

impl ScrapeOptions {
    /// Options scraping every jurisdiction without forcing.
    #[must_use]
    pub const fn new(period: ReportPeriod) -> Self {
        Self {
            period,
            force: false,
            jurisdictions: None,
        }
    }
}

/// Counts from one scrape run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrapeSummary {
    /// Documents extracted in this run.
    pub extracted: usize,
    /// Documents whose rows were read from an existing row file.
    pub cached: usize,
    /// Jurisdictions with no layout text for the period.
    pub missing: usize,
    /// Documents discarded because their extraction was inconsistent.
    pub discarded: usize,
    /// Documents skipped after an I/O or row-file error.
    pub failed: usize,
    /// Rows in the aggregate product.
    pub rows: usize,
}

/// Scrapes every selected jurisdiction for `options.period`.
///
/// # Errors
///
/// Returns [`PipelineError::Extract`] if a requested jurisdiction has no
/// template, or an I/O or CSV error if the aggregate product cannot be
/// written. Per-document failures are logged and counted as failed.
pub fn scrape_period(
    layout: &ProjectLayout,
    registry: &TemplateRegistry,
    converter: &dyn DocumentConverter,
    options: &ScrapeOptions,
    progress: &dyn ProgressCallback,
) -> Result<ScrapeSummary, PipelineError> {
    let period = options.period;
    let extractors: Vec<&dyn RevenueExtractor> = match &options.jurisdictions {
        Some(ids) => ids
            .iter()
            .map(|id| registry.get(id))
            .collect::<Result<_, _>>()?,
        None => registry.iter().collect(),
    };

    log::info!("Scraping {} jurisdiction(s) for {period}", extractors.len());
    progress.set_total(extractors.len() as u64);

    let mut summary = ScrapeSummary::default();
    let mut product: Vec<RevenueRow> = Vec::new();

    for extractor in extractors {
        let id = extractor.id();
        progress.set_message(format!("{} ({id})", extractor.name()));

        match scrape_document(layout, extractor, converter, options, &mut summary) {
            Ok(rows) => product.extend(rows),
            Err(e) => {
                log::error!("[{id}] Failed to scrape {period}: {e}");
                summary.failed += 1;
            }
        }
        progress.inc(1);
    }

    let product_path = layout.product(period);
    remove_if_exists(&product_path)?;
    if product.is_empty() {
        log::info!("No rows scraped for {period}; no product written");
    } else {
        write_rows(&product_path, &product)?;
        log::info!("Wrote {} row(s) to {}", product.len(), product_path.display());
    }
    summary.rows = product.len();

    progress.finish(format!("{period}: {} row(s)", summary.rows));
    Ok(summary)
}

fn scrape_document(
    layout: &ProjectLayout,
    extractor: &dyn RevenueExtractor,
    converter: &dyn DocumentConverter,
    options: &ScrapeOptions,
    summary: &mut ScrapeSummary,
) -> Result<Vec<RevenueRow>, PipelineError> {
    let id = extractor.id();
    let period = options.period;
    let pdf = layout.statement_pdf(id, period);
    let txt = layout.statement_text(id, period);
    let dat = layout.statement_rows(id, period);

    if !txt.exists() && pdf.exists() {
        convert_layout(converter, &pdf, &txt)?;
    }

    if dat.exists() {
        if !options.force {
            let rows = read_rows(&dat)?;
            log::info!("[{id}] Using {} existing row(s) from {}", rows.len(), dat.display());
            summary.cached += 1;
            return Ok(rows);
        }
        log::info!("[{id}] Replacing {}", dat.display());
        remove_if_exists(&dat)?;
    }

    if !txt.exists() {
        log::info!("[{id}] No statement text for {period}");
        summary.missing += 1;
        return Ok(Vec::new());
    }

    let bytes = std::fs::read(&txt)?;
    let text = String::from_utf8_lossy(&bytes);

    let items = match extractor.extract(&text, period) {
        Ok(items) => items,
        Err(e @ ExtractError::CatalogMismatch { .. }) => {
            log::warn!("[{id}] Discarding {period}: {e}");
            summary.discarded += 1;
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let rows: Vec<RevenueRow> = items.iter().map(RevenueRow::from).collect();
    summary.extracted += 1;
    if rows.is_empty() {
        log::info!("[{id}] No line items found; no row file written");
    } else {
        write_rows(&dat, &rows)?;
        log::info!("[{id}] Wrote {} row(s) to {}", rows.len(), dat.display());
    }
    Ok(rows)
}

/// Runs the layout converter, removing an empty result.
fn convert_layout(
    converter: &dyn DocumentConverter,
    pdf: &Path,
    txt: &Path,
) -> Result<(), PipelineError> {
    if let Err(e) = converter.convert(pdf, txt) {
        log::warn!("Layout conversion of {} failed: {e}", pdf.display());
    }

    let empty = std::fs::metadata(txt).is_ok_and(|m| m.len() == 0);
    if empty {
        log::warn!("Layout conversion of {} produced no text", pdf.display());
        remove_if_exists(txt)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tax_revenue_extract_models::{TaxUnit, TimeBasis};

    use super::*;
    use crate::progress::NullProgress;

    const CT_TEXT: &str = "\
Current Month Revenue Comparison
Type of Revenue 2023 2022
Withholding 1,000 900
Sales & Use 500 400
Totals 1,500 1,300
Current Month Refunds Comparison
Type of Refund 2023 2022
Sales & Use 20 10
Total Refunds 20 10
";

    /// Copies a fixed text into every output it is asked for.
    struct FixtureConverter(&'static str);

    impl DocumentConverter for FixtureConverter {
        fn convert(&self, _input: &Path, output: &Path) -> Result<(), PipelineError> {
            std::fs::write(output, self.0)?;
            Ok(())
        }
    }

    fn setup() -> (tempfile::TempDir, ProjectLayout, ReportPeriod) {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        layout.init().unwrap();
        (dir, layout, ReportPeriod::new(2023, 5).unwrap())
    }

    fn only_ct(period: ReportPeriod) -> ScrapeOptions {
        ScrapeOptions {
            jurisdictions: Some(vec!["ct".to_string()]),
            ..ScrapeOptions::new(period)
        }
    }

    #[test]
    fn converts_extracts_and_aggregates() {
        let (_dir, layout, period) = setup();
        std::fs::write(layout.statement_pdf("CT", period), b"%PDF").unwrap();

        let summary = scrape_period(
            &layout,
            &TemplateRegistry::builtin(),
            &FixtureConverter(CT_TEXT),
            &only_ct(period),
            &NullProgress,
        )
        .unwrap();

        assert_eq!(summary.extracted, 1);
        assert_eq!(summary.rows, 2);
        assert!(layout.statement_text("CT", period).exists());

        let rows = read_rows(&layout.statement_rows("CT", period)).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].tax_type, "withholding");
        assert_eq!(rows[0].tax_value, "1,000");
        assert_eq!(rows[1].tax_type, "sales and use");
        assert_eq!(rows[1].tax_value, "480");
        assert_eq!(rows[1].tax_unit, TaxUnit::Dollars);
        assert_eq!(rows[1].tax_time, TimeBasis::Month);

        assert_eq!(read_rows(&layout.product(period)).unwrap(), rows);
    }

    #[test]
    fn existing_rows_are_reused_unless_forced() {
        let (_dir, layout, period) = setup();
        std::fs::write(layout.statement_text("CT", period), CT_TEXT).unwrap();

        let cached = RevenueRow {
            state: "CT".to_string(),
            year: "2023".to_string(),
            month: "05".to_string(),
            tax_type: "cached".to_string(),
            tax_value: "1".to_string(),
            tax_unit: TaxUnit::Dollars,
            tax_time: TimeBasis::Month,
        };
        write_rows(&layout.statement_rows("CT", period), &[cached.clone()]).unwrap();

        let registry = TemplateRegistry::builtin();
        let converter = FixtureConverter("");

        let summary =
            scrape_period(&layout, &registry, &converter, &only_ct(period), &NullProgress).unwrap();
        assert_eq!(summary.cached, 1);
        assert_eq!(read_rows(&layout.product(period)).unwrap(), vec![cached]);

        let forced = ScrapeOptions {
            force: true,
            ..only_ct(period)
        };
        let summary = scrape_period(&layout, &registry, &converter, &forced, &NullProgress).unwrap();
        assert_eq!(summary.extracted, 1);
        assert_eq!(summary.rows, 2);
    }

    #[test]
    fn empty_conversion_is_removed_and_no_product_written() {
        let (_dir, layout, period) = setup();
        std::fs::write(layout.statement_pdf("CT", period), b"%PDF").unwrap();
        std::fs::write(layout.product(period), "stale").unwrap();

        let summary = scrape_period(
            &layout,
            &TemplateRegistry::builtin(),
            &FixtureConverter(""),
            &only_ct(period),
            &NullProgress,
        )
        .unwrap();

        assert_eq!(summary.missing, 1);
        assert!(!layout.statement_text("CT", period).exists());
        assert!(!layout.product(period).exists());
    }

    #[test]
    fn unreadable_row_file_fails_only_its_document() {
        let (_dir, layout, period) = setup();
        std::fs::write(
            layout.statement_rows("CA", period),
            "state|year|month\nCA|2023\n",
        )
        .unwrap();
        std::fs::write(
            layout.statement_text("PA", period),
            "\
General Fund Comparison of Actual to Estimate
Revenue Sources Estimated Actual
Bank Shares 90 100
Total - Other Motor Receipts 5 5
",
        )
        .unwrap();
        let options = ScrapeOptions {
            jurisdictions: Some(vec!["CA".to_string(), "PA".to_string()]),
            ..ScrapeOptions::new(period)
        };

        let summary = scrape_period(
            &layout,
            &TemplateRegistry::builtin(),
            &FixtureConverter(""),
            &options,
            &NullProgress,
        )
        .unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.extracted, 1);
        let product = read_rows(&layout.product(period)).unwrap();
        assert_eq!(product.len(), 1);
        assert_eq!(product[0].state, "PA");
        assert_eq!(product[0].tax_type, "bank shares");
        assert_eq!(product[0].tax_value, "100");
    }

    #[test]
    fn unknown_jurisdiction_is_an_error() {
        let (_dir, layout, period) = setup();
        let options = ScrapeOptions {
            jurisdictions: Some(vec!["ZZ".to_string()]),
            ..ScrapeOptions::new(period)
        };

        let result = scrape_period(
            &layout,
            &TemplateRegistry::builtin(),
            &FixtureConverter(""),
            &options,
            &NullProgress,
        );
        assert!(matches!(
            result,
            Err(PipelineError::Extract(ExtractError::UnknownJurisdiction(_)))
        ));
    }
}
