//! Runtime configuration.
//!
//! Every field has a default, so an absent or partial config file is
//! valid. Command-line flags override what is loaded here.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tax_revenue_glyph::{Language, StopWords};

use crate::PipelineError;

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// External converter commands.
    pub converter: ConverterConfig,
    /// Stop-word selection for text reconstruction.
    pub stop_words: StopWordsConfig,
    /// Jurisdictions to scrape. All registered ones when absent.
    pub jurisdictions: Option<Vec<String>>,
}

/// Command templates for the external converters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Produces glyph markup from a source document.
    pub xml_command: String,
    /// Produces layout-preserving text from a source document.
    pub layout_command: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            xml_command: "pdf2txt.py -o {output} -t xml {input}".to_string(),
            layout_command: "pdftotext -layout {input} {output}".to_string(),
        }
    }
}

/// Which stop-word list to load.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StopWordsConfig {
    /// Document language.
    pub language: Language,
    /// Directory holding `stop_{language}.txt` files.
    pub directory: Option<PathBuf>,
}

impl Default for StopWordsConfig {
    fn default() -> Self {
        Self {
            language: Language::English,
            directory: None,
        }
    }
}

impl StopWordsConfig {
    /// Loads the configured list.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Glyph`] if the list cannot be read or no
    /// list exists for the language.
    pub fn load(&self) -> Result<StopWords, PipelineError> {
        Ok(StopWords::load(self.language, self.directory.as_deref())?)
    }
}

impl PipelineConfig {
    /// Parses a configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if the input is malformed.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Io`] if the file cannot be read, or
    /// [`PipelineError::Config`] if it is malformed.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents).map_err(|source| PipelineError::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(
            config.converter.layout_command,
            "pdftotext -layout {input} {output}"
        );
        assert_eq!(config.stop_words.language, Language::English);
        assert!(config.jurisdictions.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
jurisdictions = ["CT", "NJ"]

[converter]
layout_command = "mutool draw -F txt -o {output} {input}"

[stop_words]
language = "spanish"
"#,
        )
        .unwrap();

        assert_eq!(config.jurisdictions, Some(vec!["CT".to_string(), "NJ".to_string()]));
        assert_eq!(
            config.converter.xml_command,
            "pdf2txt.py -o {output} -t xml {input}"
        );
        assert_eq!(config.stop_words.language, Language::Spanish);
    }

    #[test]
    fn load_reports_path_of_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        std::fs::write(&path, "jurisdictions = 3").unwrap();

        match PipelineConfig::load(&path) {
            Err(PipelineError::Config { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected config error, got {other:?}"),
        }
    }
}
