//! Convert pipeline: source documents to reconstructed text.
//!
//! For each document in `{class}_pdf`, the markup converter writes
//! `{class}_xml/{name}.xml`, which is reconstructed into
//! `{class}_txt/{name}.txt` and then deleted. A document whose markup is
//! missing, empty, or yields no characters is moved to `{class}_prob` and
//! any partial text is removed. An existing text file marks the document
//! as done.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tax_revenue_glyph::{StopWords, reconstruct_markup};

use crate::PipelineError;
use crate::converter::DocumentConverter;
use crate::progress::ProgressCallback;
use crate::project::{ClassFolder, DocumentClass, ProjectLayout};

/// Counts from one convert run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    /// Documents reconstructed in this run.
    pub converted: usize,
    /// Documents whose text already existed.
    pub skipped: usize,
    /// Documents moved to the problem folder.
    pub problems: usize,
}

enum Outcome {
    Converted,
    Skipped,
    Problem,
}

/// Converts every document of `class`.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] only if the source folder cannot be
/// listed. Per-document failures are logged and counted as problems.
pub fn convert_class(
    layout: &ProjectLayout,
    class: DocumentClass,
    converter: &dyn DocumentConverter,
    stop_words: &StopWords,
    progress: &dyn ProgressCallback,
) -> Result<ConvertSummary, PipelineError> {
    let names = list_documents(layout, class)?;
    log::info!("Converting {} {class} document(s)", names.len());
    progress.set_total(names.len() as u64);

    let mut summary = ConvertSummary::default();
    for name in &names {
        progress.set_message(name.clone());

        match convert_document(layout, class, name, converter, stop_words) {
            Ok(Outcome::Converted) => summary.converted += 1,
            Ok(Outcome::Skipped) => summary.skipped += 1,
            Ok(Outcome::Problem) => summary.problems += 1,
            Err(e) => {
                log::error!("Failed to convert {name}: {e}");
                summary.problems += 1;
            }
        }
        progress.inc(1);
    }

    progress.finish(format!(
        "{class}: {} converted, {} skipped, {} problem(s)",
        summary.converted, summary.skipped, summary.problems
    ));
    Ok(summary)
}

/// Sorted document names in `{class}_pdf`, renaming upper- or mixed-case
/// extensions to `.pdf` on the way.
fn list_documents(
    layout: &ProjectLayout,
    class: DocumentClass,
) -> Result<Vec<String>, PipelineError> {
    let dir = layout.class_dir(class, ClassFolder::Pdf);

    let mut files: Vec<String> = std::fs::read_dir(&dir)?
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    files.sort();

    let mut names = Vec::with_capacity(files.len());
    for file in files {
        let Some((stem, ext)) = file.rsplit_once('.') else {
            continue;
        };
        if stem.is_empty() || !ext.eq_ignore_ascii_case("pdf") {
            continue;
        }

        if ext != "pdf" {
            let renamed = layout.class_file(class, ClassFolder::Pdf, stem);
            if let Err(e) = std::fs::rename(dir.join(&file), &renamed) {
                log::warn!("Cannot rename {file} to {}: {e}", renamed.display());
                continue;
            }
            log::debug!("Renamed {file} to {}", renamed.display());
        }
        names.push(stem.to_string());
    }

    Ok(names)
}

fn convert_document(
    layout: &ProjectLayout,
    class: DocumentClass,
    name: &str,
    converter: &dyn DocumentConverter,
    stop_words: &StopWords,
) -> Result<Outcome, PipelineError> {
    let txt = layout.class_file(class, ClassFolder::Txt, name);
    if txt.exists() {
        log::debug!("Text for {name} already exists, skipping");
        return Ok(Outcome::Skipped);
    }

    let pdf = layout.class_file(class, ClassFolder::Pdf, name);
    let xml = layout.class_file(class, ClassFolder::Xml, name);

    let text = converter
        .convert(&pdf, &xml)
        .and_then(|()| reconstruct_file(&xml, stop_words));
    remove_if_exists(&xml)?;

    match text {
        Ok(text) => {
            std::fs::write(&txt, text)?;
            log::info!("Converted {name}");
            Ok(Outcome::Converted)
        }
        Err(e) => {
            log::warn!("Problem converting {name}: {e}");
            remove_if_exists(&txt)?;
            let prob = layout.class_file(class, ClassFolder::Prob, name);
            std::fs::rename(&pdf, &prob)?;
            Ok(Outcome::Problem)
        }
    }
}

fn reconstruct_file(xml: &Path, stop_words: &StopWords) -> Result<String, PipelineError> {
    let file = File::open(xml)?;
    Ok(reconstruct_markup(BufReader::new(file), stop_words)?)
}

/// Removes `path` if it is present.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] if an existing file cannot be removed.
pub fn remove_if_exists(path: &Path) -> Result<(), PipelineError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::progress::NullProgress;

    /// Writes canned markup keyed by source file name.
    struct FixtureConverter {
        markup: HashMap<&'static str, &'static str>,
    }

    impl DocumentConverter for FixtureConverter {
        fn convert(&self, input: &Path, output: &Path) -> Result<(), PipelineError> {
            let name = input.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if let Some(markup) = self.markup.get(name) {
                std::fs::write(output, markup)?;
            }
            Ok(())
        }
    }

    const MARKUP: &str = r#"<page id="1" bbox="0,0,612,792">
<textbox id="0" bbox="0,0,100,100">
<textline bbox="0,0,100,100">
<text font="Arial" bbox="10.000,700.000,15.000,710.000" size="10.000">T</text>
<text font="Arial" bbox="15.000,700.000,20.000,710.000" size="10.000">a</text>
<text font="Arial" bbox="20.000,700.000,25.000,710.000" size="10.000">x</text>
</textline>
</textbox>
</page>
"#;

    fn setup() -> (tempfile::TempDir, ProjectLayout) {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        layout.init().unwrap();
        (dir, layout)
    }

    fn touch(layout: &ProjectLayout, file: &str) {
        let path = layout.class_dir(DocumentClass::Pos, ClassFolder::Pdf).join(file);
        std::fs::write(path, b"%PDF").unwrap();
    }

    #[test]
    fn converts_skips_and_relocates_problems() {
        let (_dir, layout) = setup();
        touch(&layout, "good.pdf");
        touch(&layout, "upper.PDF");
        touch(&layout, "empty.pdf");
        touch(&layout, "done.pdf");
        touch(&layout, "notes.doc");
        std::fs::write(
            layout.class_file(DocumentClass::Pos, ClassFolder::Txt, "done"),
            "already here",
        )
        .unwrap();

        let converter = FixtureConverter {
            markup: HashMap::from([
                ("good.pdf", MARKUP),
                ("upper.pdf", MARKUP),
                ("empty.pdf", "<pages>\n</pages>\n"),
            ]),
        };

        let summary = convert_class(
            &layout,
            DocumentClass::Pos,
            &converter,
            &StopWords::empty(),
            &NullProgress,
        )
        .unwrap();

        assert_eq!(
            summary,
            ConvertSummary {
                converted: 2,
                skipped: 1,
                problems: 1,
            }
        );

        let text = std::fs::read_to_string(layout.class_file(
            DocumentClass::Pos,
            ClassFolder::Txt,
            "good",
        ))
        .unwrap();
        assert_eq!(text, "tax");

        assert!(layout.class_file(DocumentClass::Pos, ClassFolder::Pdf, "upper").exists());
        assert!(layout.class_file(DocumentClass::Pos, ClassFolder::Prob, "empty").exists());
        assert!(!layout.class_file(DocumentClass::Pos, ClassFolder::Pdf, "empty").exists());
        assert!(!layout.class_file(DocumentClass::Pos, ClassFolder::Txt, "empty").exists());

        let xml_left = std::fs::read_dir(layout.class_dir(DocumentClass::Pos, ClassFolder::Xml))
            .unwrap()
            .count();
        assert_eq!(xml_left, 0);
    }

    #[test]
    fn missing_markup_is_a_problem() {
        let (_dir, layout) = setup();
        touch(&layout, "locked.pdf");

        let converter = FixtureConverter {
            markup: HashMap::new(),
        };
        let summary = convert_class(
            &layout,
            DocumentClass::Pos,
            &converter,
            &StopWords::english(),
            &NullProgress,
        )
        .unwrap();

        assert_eq!(summary.problems, 1);
        assert!(layout.class_file(DocumentClass::Pos, ClassFolder::Prob, "locked").exists());
    }

    #[test]
    fn remove_if_exists_ignores_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        remove_if_exists(&dir.path().join("absent.txt")).unwrap();
    }
}
