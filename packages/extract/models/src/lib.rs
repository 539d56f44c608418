#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Data types for template-driven revenue extraction.
//!
//! Every jurisdiction template produces [`ExtractedLineItem`]s, which are
//! flattened to [`RevenueRow`]s for the pipe-delimited output files.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Earliest report year accepted by [`ReportPeriod::new`].
pub const MIN_YEAR: i32 = 2000;
/// Latest report year accepted by [`ReportPeriod::new`].
pub const MAX_YEAR: i32 = 2050;

/// Errors from constructing or parsing a [`ReportPeriod`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeriodError {
    /// Year or month outside the accepted range.
    #[error("Invalid report period {year}-{month:02}")]
    OutOfRange {
        /// Requested year.
        year: i32,
        /// Requested month.
        month: u32,
    },

    /// Text that is not `yyyy-mm` or `yyyy_mm`.
    #[error("Unrecognized report period: {0}")]
    Unparseable(String),
}

/// The year and month a revenue statement reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawReportPeriod")]
pub struct ReportPeriod {
    year: i32,
    month: u32,
}

/// Unchecked wire form of a [`ReportPeriod`].
#[derive(Deserialize)]
struct RawReportPeriod {
    year: i32,
    month: u32,
}

impl TryFrom<RawReportPeriod> for ReportPeriod {
    type Error = PeriodError;

    fn try_from(raw: RawReportPeriod) -> Result<Self, Self::Error> {
        Self::new(raw.year, raw.month)
    }
}

impl ReportPeriod {
    /// Creates a period after checking the month is a calendar month and
    /// the year lies in [`MIN_YEAR`]..=[`MAX_YEAR`].
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::OutOfRange`] for an invalid year or month.
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodError> {
        let date = NaiveDate::from_ymd_opt(year, month, 1)
            .filter(|d| (MIN_YEAR..=MAX_YEAR).contains(&d.year()))
            .ok_or(PeriodError::OutOfRange { year, month })?;

        Ok(Self {
            year: date.year(),
            month: date.month(),
        })
    }

    /// Four-digit year.
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Calendar month, 1 through 12.
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// Year formatted as four digits.
    #[must_use]
    pub fn year_label(self) -> String {
        format!("{:04}", self.year)
    }

    /// Month formatted as two digits.
    #[must_use]
    pub fn month_label(self) -> String {
        format!("{:02}", self.month)
    }

    /// The `yyyy_mm` suffix used in document and output file names.
    #[must_use]
    pub fn file_suffix(self) -> String {
        format!("{:04}_{:02}", self.year, self.month)
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for ReportPeriod {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unparseable = || PeriodError::Unparseable(s.to_string());
        let (year, month) = s.split_once(['-', '_']).ok_or_else(unparseable)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(unparseable());
        }
        let year = year.parse().map_err(|_| unparseable())?;
        let month = month.parse().map_err(|_| unparseable())?;
        Self::new(year, month)
    }
}

/// Magnitude of the figures in a revenue table.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaxUnit {
    /// Whole dollars.
    #[default]
    Dollars,
    /// Thousands of dollars.
    Thousands,
    /// Millions of dollars.
    Millions,
    /// Billions of dollars.
    Billions,
}

/// Which span of time a reported figure covers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum TimeBasis {
    /// The report month alone.
    #[default]
    #[serde(rename = "month")]
    #[strum(serialize = "month")]
    Month,
    /// Fiscal year to date through the report month.
    #[serde(rename = "ytd thru month")]
    #[strum(serialize = "ytd thru month")]
    YtdThruMonth,
}

/// Kind of table region a zone represents.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ZoneKind {
    /// Gross revenue table.
    #[default]
    Revenue,
    /// Refund table whose amounts offset revenue categories.
    Refund,
}

/// Which table region the current line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ZoneState {
    /// Outside any recognized table.
    #[default]
    Inactive,
    /// Inside a revenue table.
    Revenue,
    /// Inside a refund table.
    Refund,
}

impl From<ZoneKind> for ZoneState {
    fn from(kind: ZoneKind) -> Self {
        match kind {
            ZoneKind::Revenue => Self::Revenue,
            ZoneKind::Refund => Self::Refund,
        }
    }
}

/// One labeled figure extracted from a revenue statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedLineItem {
    /// Jurisdiction key of the template that produced the item.
    pub source_id: String,
    /// Period the statement reports on.
    pub period: ReportPeriod,
    /// Tax category label.
    pub category: String,
    /// Normalized numeric text (may carry a leading minus and commas).
    pub value: String,
    /// Magnitude of `value`.
    pub unit: TaxUnit,
    /// Time span `value` covers.
    pub time_basis: TimeBasis,
}

/// One row of the pipe-delimited output table.
///
/// Field order defines the header row
/// `state|year|month|tax_type|tax_value|tax_unit|tax_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueRow {
    /// Jurisdiction key.
    pub state: String,
    /// Four-digit year.
    pub year: String,
    /// Two-digit month.
    pub month: String,
    /// Tax category label.
    pub tax_type: String,
    /// Normalized value.
    pub tax_value: String,
    /// Magnitude of the value.
    pub tax_unit: TaxUnit,
    /// Time span of the value.
    pub tax_time: TimeBasis,
}

impl From<&ExtractedLineItem> for RevenueRow {
    fn from(item: &ExtractedLineItem) -> Self {
        Self {
            state: item.source_id.clone(),
            year: item.period.year_label(),
            month: item.period.month_label(),
            tax_type: item.category.clone(),
            tax_value: item.value.clone(),
            tax_unit: item.unit,
            tax_time: item.time_basis,
        }
    }
}
