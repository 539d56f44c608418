#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Template-driven extraction of tax revenue line items.
//!
//! Each reporting jurisdiction is described by a TOML template (see
//! [`template`]) listing its revenue tables, header rules, and ordered
//! category catalog. The [`registry`] maps jurisdiction keys to
//! [`RevenueExtractor`]s so adding a jurisdiction never touches dispatch
//! code.

pub mod column;
pub mod extractor;
pub mod items;
pub mod matcher;
pub mod netting;
pub mod registry;
pub mod template;
pub mod value;
pub mod zone;

pub use extractor::TemplateExtractor;
pub use registry::TemplateRegistry;
pub use tax_revenue_extract_models::{ExtractedLineItem, ReportPeriod};

/// Errors from loading or compiling a template.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// TOML parsing failed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A template pattern failed to compile.
    #[error("[{id}] Invalid pattern {pattern:?}: {source}")]
    Regex {
        /// Template id.
        id: String,
        /// The offending pattern.
        pattern: String,
        /// Underlying regex error.
        source: regex::Error,
    },

    /// The template is internally inconsistent.
    #[error("[{id}] Invalid template: {message}")]
    Invalid {
        /// Template id.
        id: String,
        /// Description of what went wrong.
        message: String,
    },
}

/// Errors from extracting line items.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Template loading or compilation failed.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The parallel attribute lists disagree in length, so none of the
    /// document's items can be trusted.
    #[error(
        "[{source_id}] Catalog mismatch: {categories} categories, {values} values, {units} units, {time_bases} time bases"
    )]
    CatalogMismatch {
        /// Jurisdiction key.
        source_id: String,
        /// Number of categories recorded.
        categories: usize,
        /// Number of values recorded.
        values: usize,
        /// Number of units recorded.
        units: usize,
        /// Number of time bases recorded.
        time_bases: usize,
    },

    /// No extractor is registered for the jurisdiction.
    #[error("Unknown jurisdiction: {0}")]
    UnknownJurisdiction(String),
}

/// A per-jurisdiction line item extractor.
pub trait RevenueExtractor: Send + Sync {
    /// Jurisdiction key (e.g., `"CT"`).
    fn id(&self) -> &str;

    /// Human-readable jurisdiction name.
    fn name(&self) -> &str;

    /// Extracts line items from a statement's layout text.
    ///
    /// Returns an empty list when nothing matched.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::CatalogMismatch`] if the matched attributes
    /// fail the consistency check.
    fn extract(
        &self,
        text: &str,
        period: ReportPeriod,
    ) -> Result<Vec<ExtractedLineItem>, ExtractError>;
}
