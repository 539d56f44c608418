//! Project directory layout.
//!
//! A project holds two independent trees:
//!
//! - per document class, `{class}_pdf`, `{class}_xml`, `{class}_txt`, and
//!   `{class}_prob` folders for the convert pipeline;
//! - `pdf`, `txt`, `dat`, and `prod` folders for the scrape pipeline, with
//!   documents named `{ST}_{yyyy}_{mm}`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use tax_revenue_extract_models::ReportPeriod;

use crate::PipelineError;

/// Label of a document set in the convert pipeline.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DocumentClass {
    /// Documents known not to be revenue statements.
    Neg,
    /// Documents known to be revenue statements.
    Pos,
    /// Unlabeled documents awaiting classification.
    Pred,
}

/// One of the four folders each document class owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum ClassFolder {
    /// Source documents.
    Pdf,
    /// Intermediate glyph markup.
    Xml,
    /// Reconstructed text.
    Txt,
    /// Documents whose conversion failed.
    Prob,
}

/// Folders of the scrape pipeline, in creation order.
const SCRAPE_FOLDERS: &[&str] = &["dat", "pdf", "prod", "txt"];

/// Resolves every path the pipelines read or write under a project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    /// A layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ── Convert pipeline ─────────────────────────────────────────────────

    /// Folder `{class}_{folder}`.
    #[must_use]
    pub fn class_dir(&self, class: DocumentClass, folder: ClassFolder) -> PathBuf {
        self.root.join(format!("{class}_{folder}"))
    }

    /// Path of `{name}.{ext}` inside `{class}_{folder}`, where the
    /// extension matches the folder (`prob` keeps `pdf`).
    #[must_use]
    pub fn class_file(&self, class: DocumentClass, folder: ClassFolder, name: &str) -> PathBuf {
        let ext = match folder {
            ClassFolder::Pdf | ClassFolder::Prob => "pdf",
            ClassFolder::Xml => "xml",
            ClassFolder::Txt => "txt",
        };
        self.class_dir(class, folder).join(format!("{name}.{ext}"))
    }

    // ── Scrape pipeline ──────────────────────────────────────────────────

    /// Document name `{ST}_{yyyy}_{mm}`.
    #[must_use]
    pub fn document_name(jurisdiction: &str, period: ReportPeriod) -> String {
        format!("{}_{}", jurisdiction.to_uppercase(), period.file_suffix())
    }

    /// Source statement `pdf/{ST}_{yyyy}_{mm}.pdf`.
    #[must_use]
    pub fn statement_pdf(&self, jurisdiction: &str, period: ReportPeriod) -> PathBuf {
        self.root
            .join("pdf")
            .join(format!("{}.pdf", Self::document_name(jurisdiction, period)))
    }

    /// Layout text `txt/{ST}_{yyyy}_{mm}.txt`.
    #[must_use]
    pub fn statement_text(&self, jurisdiction: &str, period: ReportPeriod) -> PathBuf {
        self.root
            .join("txt")
            .join(format!("{}.txt", Self::document_name(jurisdiction, period)))
    }

    /// Per-document rows `dat/{ST}_{yyyy}_{mm}.txt`.
    #[must_use]
    pub fn statement_rows(&self, jurisdiction: &str, period: ReportPeriod) -> PathBuf {
        self.root
            .join("dat")
            .join(format!("{}.txt", Self::document_name(jurisdiction, period)))
    }

    /// Aggregate rows `prod/{yyyy}_{mm}.txt`.
    #[must_use]
    pub fn product(&self, period: ReportPeriod) -> PathBuf {
        self.root
            .join("prod")
            .join(format!("{}.txt", period.file_suffix()))
    }

    // ── Provisioning ─────────────────────────────────────────────────────

    /// Every folder either pipeline expects.
    #[must_use]
    pub fn folders(&self) -> Vec<PathBuf> {
        let mut folders: Vec<PathBuf> = SCRAPE_FOLDERS.iter().map(|f| self.root.join(f)).collect();
        for class in DocumentClass::iter() {
            for folder in ClassFolder::iter() {
                folders.push(self.class_dir(class, folder));
            }
        }
        folders
    }

    /// Creates every missing folder. Returns the folders that were created.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Io`] if a folder cannot be created.
    pub fn init(&self) -> Result<Vec<PathBuf>, PipelineError> {
        let mut created = Vec::new();
        for folder in self.folders() {
            if folder.is_dir() {
                log::debug!("Folder {} already exists", folder.display());
                continue;
            }
            std::fs::create_dir_all(&folder)?;
            log::info!("Created {}", folder.display());
            created.push(folder);
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_paths_follow_folder_convention() {
        let layout = ProjectLayout::new("/data");
        assert_eq!(
            layout.class_file(DocumentClass::Pos, ClassFolder::Xml, "report"),
            PathBuf::from("/data/pos_xml/report.xml")
        );
        assert_eq!(
            layout.class_file(DocumentClass::Neg, ClassFolder::Prob, "report"),
            PathBuf::from("/data/neg_prob/report.pdf")
        );
    }

    #[test]
    fn statement_paths_use_jurisdiction_and_period() {
        let layout = ProjectLayout::new("proj");
        let period = ReportPeriod::new(2023, 7).unwrap();

        assert_eq!(ProjectLayout::document_name("ct", period), "CT_2023_07");
        assert_eq!(
            layout.statement_rows("CT", period),
            PathBuf::from("proj/dat/CT_2023_07.txt")
        );
        assert_eq!(layout.product(period), PathBuf::from("proj/prod/2023_07.txt"));
    }

    #[test]
    fn parses_document_class_case_insensitively() {
        assert_eq!("POS".parse::<DocumentClass>().unwrap(), DocumentClass::Pos);
        assert!("other".parse::<DocumentClass>().is_err());
    }

    #[test]
    fn init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());

        let created = layout.init().unwrap();
        assert_eq!(created.len(), 4 + 3 * 4);
        assert!(dir.path().join("pred_prob").is_dir());
        assert!(dir.path().join("prod").is_dir());

        assert!(layout.init().unwrap().is_empty());
    }
}
