//! Pipe-delimited row files.
//!
//! Every file starts with the header row
//! `state|year|month|tax_type|tax_value|tax_unit|tax_time`, taken from the
//! field names of [`RevenueRow`].

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tax_revenue_extract_models::RevenueRow;

use crate::PipelineError;

const DELIMITER: u8 = b'|';

/// Writes `rows` to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] if the file cannot be created, or
/// [`PipelineError::Csv`] if a row cannot be written.
pub fn write_rows(path: &Path, rows: &[RevenueRow]) -> Result<(), PipelineError> {
    write_rows_to(File::create(path)?, rows)
}

/// Writes the header and `rows` to `writer`.
///
/// # Errors
///
/// Returns [`PipelineError::Csv`] if a row cannot be written.
pub fn write_rows_to<W: Write>(writer: W, rows: &[RevenueRow]) -> Result<(), PipelineError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads every row from `path`.
///
/// # Errors
///
/// Returns [`PipelineError::Csv`] if the file cannot be read or a row does
/// not parse.
pub fn read_rows(path: &Path) -> Result<Vec<RevenueRow>, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .from_path(path)?;
    reader
        .deserialize()
        .collect::<Result<Vec<RevenueRow>, _>>()
        .map_err(PipelineError::from)
}

#[cfg(test)]
mod tests {
    use tax_revenue_extract_models::{TaxUnit, TimeBasis};

    use super::*;

    fn row(tax_type: &str, tax_value: &str) -> RevenueRow {
        RevenueRow {
            state: "CA".to_string(),
            year: "2023".to_string(),
            month: "07".to_string(),
            tax_type: tax_type.to_string(),
            tax_value: tax_value.to_string(),
            tax_unit: TaxUnit::Thousands,
            tax_time: TimeBasis::YtdThruMonth,
        }
    }

    #[test]
    fn writes_header_and_pipe_delimited_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CA_2023_07.txt");

        write_rows(&path, &[row("cigarette tax general fund", "-1,234")]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "state|year|month|tax_type|tax_value|tax_unit|tax_time\n\
             CA|2023|07|cigarette tax general fund|-1,234|thousands|ytd thru month\n"
        );
    }

    #[test]
    fn reads_back_written_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.txt");
        let rows = vec![row("sales", "85"), row("withholding", "0")];

        write_rows(&path, &rows).unwrap();
        assert_eq!(read_rows(&path).unwrap(), rows);
    }
}
