#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Glyph record types shared by the markup parser and the reading-order
//! reconstructor.
//!
//! A [`CharacterRecord`] is one character from a page-layout markup
//! document together with its placement in the page → block → line
//! hierarchy and its bounding box.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// One positioned character from a page-layout markup document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRecord {
    /// Page id from the enclosing page tag.
    pub page: u32,
    /// Block id from the enclosing text-box tag.
    pub block: u32,
    /// 1-based line counter within the block (0 before the first line tag).
    pub line: u32,
    /// Left edge.
    pub x1: f64,
    /// Bottom edge. Page coordinates grow upward.
    pub y1: f64,
    /// Right edge.
    pub x2: f64,
    /// Top edge.
    pub y2: f64,
    /// Font size in points.
    pub font_size: f64,
    /// Font name as reported by the markup.
    pub font: String,
    /// Character payload. Zero to two characters once normalized.
    pub value: String,
}

impl CharacterRecord {
    /// Returns `true` when `other` sits in a different page, block, or line.
    #[must_use]
    pub const fn crosses_boundary(&self, other: &Self) -> bool {
        self.page != other.page || self.block != other.block || self.line != other.line
    }

    /// Compares two records by reading order: page, block, line, then top
    /// to bottom (descending `y1`), then left to right (ascending `x1`).
    #[must_use]
    pub fn reading_order(&self, other: &Self) -> Ordering {
        self.page
            .cmp(&other.page)
            .then(self.block.cmp(&other.block))
            .then(self.line.cmp(&other.line))
            .then(other.y1.total_cmp(&self.y1))
            .then(self.x1.total_cmp(&other.x1))
    }
}
