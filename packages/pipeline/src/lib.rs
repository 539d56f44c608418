#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Batch drivers that turn statement documents into text and rows.
//!
//! Two products are built from a project directory:
//!
//! - **convert**: per document class, glyph markup from an external
//!   converter is reconstructed into one line of reading-order text.
//! - **scrape**: per report period, layout text for each jurisdiction is
//!   run through its template and written as pipe-delimited rows, plus one
//!   aggregate file for the period.
//!
//! Both drivers treat an existing output file as a finished document and
//! isolate failures to the document that caused them.

pub mod config;
pub mod convert;
pub mod converter;
pub mod output;
pub mod progress;
pub mod project;
pub mod scrape;

use std::path::PathBuf;

use tax_revenue_extract::ExtractError;
use tax_revenue_glyph::GlyphError;

pub use config::PipelineConfig;
pub use convert::{ConvertSummary, convert_class};
pub use converter::{CommandConverter, DocumentConverter};
pub use project::{ClassFolder, DocumentClass, ProjectLayout};
pub use scrape::{ScrapeOptions, ScrapeSummary, scrape_period};

/// Errors that can occur while running a pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reading or writing a pipe-delimited table.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Text reconstruction failed.
    #[error(transparent)]
    Glyph(#[from] GlyphError),

    /// Line item extraction failed.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The pipeline configuration file is malformed.
    #[error("Invalid config {}: {source}", path.display())]
    Config {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying parse error.
        source: toml::de::Error,
    },

    /// A converter command template has no program.
    #[error("Converter command is empty")]
    EmptyCommand,

    /// An external converter exited unsuccessfully.
    #[error("Converter {program} exited with {status}")]
    Converter {
        /// Program that was run.
        program: String,
        /// Exit status as reported by the OS.
        status: String,
    },
}
