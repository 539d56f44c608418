//! External document converters.
//!
//! Both pipelines depend on a converter that turns a source document into
//! another file: glyph markup for the convert pipeline, layout text for
//! the scrape pipeline. [`DocumentConverter`] is the seam; the production
//! implementation shells out to a configured command.

use std::path::Path;
use std::process::Command;

use crate::PipelineError;

/// Turns `input` into `output`.
///
/// Success means the converter ran; callers still check that `output`
/// exists and is non-empty before using it.
pub trait DocumentConverter: Send + Sync {
    /// Converts one document.
    ///
    /// # Errors
    ///
    /// Returns an error if the converter cannot be run or reports failure.
    fn convert(&self, input: &Path, output: &Path) -> Result<(), PipelineError>;
}

/// Runs a command template such as `pdftotext -layout {input} {output}`.
///
/// The template is split on whitespace; `{input}` and `{output}` are
/// replaced inside each argument, so paths with spaces stay one argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandConverter {
    template: String,
}

impl CommandConverter {
    /// A converter running `template`.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Program and arguments for one conversion.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyCommand`] if the template is blank.
    pub fn command_line(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<(String, Vec<String>), PipelineError> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();

        let mut parts = self.template.split_whitespace().map(|part| {
            part.replace("{input}", &input)
                .replace("{output}", &output)
        });
        let program = parts.next().ok_or(PipelineError::EmptyCommand)?;
        Ok((program, parts.collect()))
    }
}

impl DocumentConverter for CommandConverter {
    fn convert(&self, input: &Path, output: &Path) -> Result<(), PipelineError> {
        let (program, args) = self.command_line(input, output)?;
        log::debug!("Running {program} {}", args.join(" "));

        let status = Command::new(&program).args(&args).status()?;
        if !status.success() {
            return Err(PipelineError::Converter {
                program,
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn substitutes_paths_into_template() {
        let converter = CommandConverter::new("pdf2txt.py -o {output} -t xml {input}");
        let (program, args) = converter
            .command_line(&PathBuf::from("in dir/a.pdf"), &PathBuf::from("out/a.xml"))
            .unwrap();

        assert_eq!(program, "pdf2txt.py");
        assert_eq!(args, vec!["-o", "out/a.xml", "-t", "xml", "in dir/a.pdf"]);
    }

    #[test]
    fn rejects_blank_template() {
        let converter = CommandConverter::new("   ");
        assert!(matches!(
            converter.command_line(Path::new("a"), Path::new("b")),
            Err(PipelineError::EmptyCommand)
        ));
    }

    #[test]
    fn missing_program_is_an_io_error() {
        let converter = CommandConverter::new("tax-revenue-no-such-converter {input} {output}");
        assert!(matches!(
            converter.convert(Path::new("a"), Path::new("b")),
            Err(PipelineError::Io(_))
        ));
    }
}
