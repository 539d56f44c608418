#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the tax revenue toolchain.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tax_revenue_cli_utils::{IndicatifProgress, MultiProgress, init_logger};
use tax_revenue_extract::TemplateRegistry;
use tax_revenue_extract_models::{ReportPeriod, RevenueRow};
use tax_revenue_glyph::{Language, StopWords, reconstruct_markup};
use tax_revenue_pipeline::output::write_rows_to;
use tax_revenue_pipeline::{
    CommandConverter, DocumentClass, PipelineConfig, PipelineError, ProjectLayout, ScrapeOptions,
    convert_class, scrape_period,
};

#[derive(Parser)]
#[command(
    name = "tax_revenue",
    about = "Reconstructs and scrapes state tax revenue statements"
)]
struct Cli {
    /// Project directory holding the document folders
    #[arg(long, global = true, default_value = ".")]
    project: PathBuf,
    /// Pipeline configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the project folders
    Init,
    /// Reconstruct text for every document of a class
    Convert {
        /// Document class (neg, pos, or pred)
        #[arg(long, default_value = "pos")]
        class: DocumentClass,
        /// Stop-word language (overrides the config file)
        #[arg(long)]
        language: Option<Language>,
    },
    /// Scrape revenue rows for one report period
    Scrape {
        /// Report year (e.g., 2023)
        #[arg(long)]
        year: i32,
        /// Report month, 1 through 12
        #[arg(long)]
        month: u32,
        /// Re-extract documents whose row file already exists
        #[arg(long)]
        force: bool,
        /// Comma-separated jurisdiction keys (e.g., "CT,NJ"). Overrides the
        /// config file; defaults to every registered jurisdiction.
        #[arg(long)]
        jurisdictions: Option<String>,
    },
    /// Reconstruct text from a single glyph markup file
    Reconstruct {
        /// Glyph markup file
        markup: PathBuf,
        /// Write the text here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Stop-word language (overrides the config file)
        #[arg(long)]
        language: Option<Language>,
    },
    /// Extract rows from a single layout text file and print them
    Extract {
        /// Jurisdiction key (e.g., "CT")
        jurisdiction: String,
        /// Layout text file
        text: PathBuf,
        /// Report year (e.g., 2023)
        #[arg(long)]
        year: i32,
        /// Report month, 1 through 12
        #[arg(long)]
        month: u32,
    },
    /// List the registered jurisdiction templates
    Jurisdictions,
}

#[allow(clippy::too_many_lines)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = init_logger();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    let layout = ProjectLayout::new(&cli.project);

    match cli.command {
        Commands::Init => {
            let created = layout.init()?;
            log::info!(
                "Project {} ready ({} folder(s) created)",
                layout.root().display(),
                created.len()
            );
        }
        Commands::Convert { class, language } => {
            run_convert(&multi, &config, &layout, class, language)?;
        }
        Commands::Scrape {
            year,
            month,
            force,
            jurisdictions,
        } => {
            let options = ScrapeOptions {
                period: ReportPeriod::new(year, month)?,
                force,
                jurisdictions: jurisdictions
                    .as_deref()
                    .map(parse_list)
                    .or_else(|| config.jurisdictions.clone()),
            };
            run_scrape(&multi, &config, &layout, &options)?;
        }
        Commands::Reconstruct {
            markup,
            output,
            language,
        } => {
            let stop_words = load_stop_words(&config, language)?;
            let text = reconstruct_markup(BufReader::new(File::open(&markup)?), &stop_words)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, text)?;
                    log::info!("Wrote {}", path.display());
                }
                None => println!("{text}"),
            }
        }
        Commands::Extract {
            jurisdiction,
            text,
            year,
            month,
        } => {
            let period = ReportPeriod::new(year, month)?;
            let registry = TemplateRegistry::builtin();
            let contents = String::from_utf8_lossy(&std::fs::read(&text)?).into_owned();

            let items = registry.get(&jurisdiction)?.extract(&contents, period)?;
            let rows: Vec<RevenueRow> = items.iter().map(RevenueRow::from).collect();
            write_rows_to(std::io::stdout().lock(), &rows)?;
            log::info!("Extracted {} row(s)", rows.len());
        }
        Commands::Jurisdictions => {
            let registry = TemplateRegistry::builtin();
            println!("{:<6} NAME", "ID");
            println!("{}", "-".repeat(30));
            for extractor in registry.iter() {
                println!("{:<6} {}", extractor.id(), extractor.name());
            }
        }
    }

    Ok(())
}

fn run_convert(
    multi: &MultiProgress,
    config: &PipelineConfig,
    layout: &ProjectLayout,
    class: DocumentClass,
    language: Option<Language>,
) -> Result<(), Box<dyn std::error::Error>> {
    let stop_words = load_stop_words(config, language)?;
    let converter = CommandConverter::new(config.converter.xml_command.clone());

    let progress = IndicatifProgress::documents_bar(multi, &format!("Converting {class}"));
    let summary = convert_class(layout, class, &converter, &stop_words, progress.as_ref())?;

    log::info!(
        "{class}: {} converted, {} skipped, {} problem(s)",
        summary.converted,
        summary.skipped,
        summary.problems
    );
    Ok(())
}

fn run_scrape(
    multi: &MultiProgress,
    config: &PipelineConfig,
    layout: &ProjectLayout,
    options: &ScrapeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = TemplateRegistry::builtin();
    let converter = CommandConverter::new(config.converter.layout_command.clone());

    let total = options
        .jurisdictions
        .as_ref()
        .map_or(registry.len(), Vec::len);
    let progress = IndicatifProgress::jurisdictions_bar(
        multi,
        &format!("Scraping {}", options.period),
        total as u64,
    );
    let summary = scrape_period(layout, &registry, &converter, options, progress.as_ref())?;

    log::info!(
        "{}: {} extracted, {} cached, {} missing, {} discarded, {} failed, {} row(s)",
        options.period,
        summary.extracted,
        summary.cached,
        summary.missing,
        summary.discarded,
        summary.failed,
        summary.rows
    );
    Ok(())
}

/// Loads the configured stop words, with `language` taking precedence.
fn load_stop_words(
    config: &PipelineConfig,
    language: Option<Language>,
) -> Result<StopWords, PipelineError> {
    let mut selection = config.stop_words.clone();
    if let Some(language) = language {
        selection.language = language;
    }
    selection.load()
}

/// Splits a comma-separated list, dropping blanks.
fn parse_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
        .collect()
}
