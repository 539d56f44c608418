//! Stop-word lists and the final text-cleaning step.
//!
//! A [`StopWords`] value is passed explicitly into cleaning rather than
//! held globally. The English list is embedded at compile time; other
//! languages are read from `stop_{language}.txt` files, one word per line.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::GlyphError;

const ENGLISH: &str = include_str!("stopwords/english.txt");

/// Languages with a stop-word file naming convention.
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
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Language {
    Danish,
    Dutch,
    English,
    Finnish,
    French,
    German,
    Hungarian,
    Italian,
    Norwegian,
    Portuguese,
    Spanish,
    Swedish,
    Turkish,
}

impl Language {
    /// File name of this language's stop-word list.
    #[must_use]
    pub fn file_name(self) -> String {
        format!("stop_{}.txt", self.as_ref())
    }
}

/// A set of lower-case words removed from reconstructed text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// An empty list that removes nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The embedded English list.
    #[must_use]
    pub fn english() -> Self {
        Self::parse(ENGLISH)
    }

    /// Builds a list from the given words (lower-cased).
    #[must_use]
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Reads a list from a file with one word per line. Blank lines are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GlyphError::StopWords`] if the file cannot be read.
    pub fn from_file(path: &Path) -> Result<Self, GlyphError> {
        let contents = std::fs::read_to_string(path).map_err(|source| GlyphError::StopWords {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&contents))
    }

    /// Loads the list for `language`, preferring `stop_{language}.txt` in
    /// `directory` and falling back to the embedded English list.
    ///
    /// # Errors
    ///
    /// Returns [`GlyphError::StopWords`] if the file exists but cannot be
    /// read, or [`GlyphError::UnknownLanguage`] if there is no file and no
    /// embedded list for the language.
    pub fn load(language: Language, directory: Option<&Path>) -> Result<Self, GlyphError> {
        let candidate: Option<PathBuf> = directory.map(|d| d.join(language.file_name()));

        if let Some(path) = candidate.filter(|p| p.is_file()) {
            log::debug!("Loading {language} stop words from {}", path.display());
            return Self::from_file(&path);
        }

        match language {
            Language::English => Ok(Self::english()),
            other => Err(GlyphError::UnknownLanguage(other)),
        }
    }

    fn parse(contents: &str) -> Self {
        Self::from_words(contents.lines())
    }

    /// Number of words in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Whether `word` is a stop word.
    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// Lower-cases `text`, collapses whitespace runs to single spaces, and
    /// drops stop words.
    #[must_use]
    pub fn clean_text(&self, text: &str) -> String {
        let lower = text.to_lowercase();
        lower
            .split_whitespace()
            .filter(|word| !self.contains(word))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
