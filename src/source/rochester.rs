// ASTRA - GPL-3.0-or-later
// This file is part of ASTRA.
//
// Copyright (C) 2025 ASTRA Collaboration
//
// ASTRA is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// ASTRA is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with ASTRA.  If not, see <https://www.gnu.org/licenses/>.

//! Scrapers for the Rochester Astronomy supernova pages.
//!
//! The main list prints one discovery per paragraph:
//!
//! ```text
//! AT2025abao discovered 2025/10/28.41 by ... R.A. = 21h42m15.42s Decl. = +53°17'43.1" ... Mag 15.1 ... Type LRN
//! ```
//!
//! The per-year pages carry a plain table plus some entries written in the
//! same free-text style.

use super::html::{Page, TableRow};
use super::{PageFetcher, SourceError, TransientSource};
use crate::candidate::{dedup_by_id, parse_magnitude, CandidateRecord};
use fancy_regex::Regex;
use std::sync::LazyLock;

pub const COORDINATE_SOURCE_LABEL: &str = "Rochester_Entries_With_Coords";
pub const TABLE_SOURCE_LABEL: &str = "Rochester";
pub const DEFAULT_MAX_ENTRIES: usize = 100;

const UNKNOWN_TYPE: &str = "unknown";

// An entry starts at a designation directly followed by "discovered", optionally
// after `= alias` names. Designations quoted inside an entry's text do not split it.
static ENTRY_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b((?:AT|SN)\s?\d{4}[A-Za-z]+)\b(?=(?:\s*=\s*\S+)*\s+discovered\b)")
        .expect("entry pattern is valid")
});
static DESIGNATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:AT|SN)\s?\d{4}[A-Za-z]+$").expect("designation pattern is valid")
});
static DISCOVERED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bdiscovered\s+(\d{4}/\d{2}/\d{2})").expect("discovered pattern is valid")
});
static RIGHT_ASCENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"R\.A\.\s*=\s*(\d{1,2}\s*[h:\s]\s*\d{1,2}\s*[m:\s]\s*\d{1,2}(?:\.\d+)?s?)")
        .expect("R.A. pattern is valid")
});
static DECLINATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"Decl\.\s*=\s*([+\-−]?\d{1,2}\s*[d°:\s]\s*\d{1,2}\s*['′m:\s]\s*\d{1,2}(?:\.\d+)?\s*["″s]?)"#)
        .expect("Decl. pattern is valid")
});
static MAGNITUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bMag\s+(\d+(?:\.\d+)?)").expect("Mag pattern is valid"));
static TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bType\s+([\w?/\-]+)").expect("Type pattern is valid"));

/// Fields of one free-text discovery entry
#[derive(Debug, Clone, PartialEq)]
struct TextEntry {
    id: String,
    discovered: Option<String>,
    ra: Option<String>,
    dec: Option<String>,
    magnitude: Option<f64>,
    type_tag: Option<String>,
}

impl TextEntry {
    fn into_record(self, source: &str) -> CandidateRecord {
        let type_tag = self.type_tag.unwrap_or_else(|| UNKNOWN_TYPE.to_string());
        let mut record = CandidateRecord::new(self.id, self.magnitude, type_tag).with_source(source);
        if let (Some(ra), Some(dec)) = (self.ra, self.dec) {
            record = record.with_coordinates(ra, dec);
        }
        if let Some(date) = self.discovered {
            record = record.with_discovered(date);
        }
        record
    }
}

fn first_capture(pattern: &Regex, text: &str) -> Option<String> {
    let caps = pattern.captures(text).ok().flatten()?;
    Some(caps.get(1)?.as_str().trim().to_string())
}

fn normalize_designation(raw: &str) -> String {
    raw.split_whitespace().collect()
}

/// Split page text into discovery entries and pull out their fields.
/// Chunks without a "discovered" date are not entries and are dropped.
fn text_entries(text: &str) -> Vec<TextEntry> {
    let starts: Vec<(usize, String)> = ENTRY_START
        .captures_iter(text)
        .filter_map(Result::ok)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some((whole.start(), normalize_designation(caps.get(1)?.as_str())))
        })
        .collect();

    starts
        .iter()
        .enumerate()
        .filter_map(|(idx, (start, id))| {
            let end = starts.get(idx + 1).map_or(text.len(), |(next, _)| *next);
            let chunk = &text[*start..end];
            let discovered = first_capture(&DISCOVERED, chunk)?;
            Some(TextEntry {
                id: id.clone(),
                discovered: Some(discovered),
                ra: first_capture(&RIGHT_ASCENSION, chunk),
                dec: first_capture(&DECLINATION, chunk),
                magnitude: first_capture(&MAGNITUDE, chunk).and_then(|m| parse_magnitude(&m)),
                type_tag: first_capture(&TYPE, chunk),
            })
        })
        .collect()
}

/// Entries that report a position, deduplicated, at most `max_entries`
#[must_use]
pub fn parse_coordinate_entries(page: &str, max_entries: usize) -> Vec<CandidateRecord> {
    let entries = text_entries(&Page::parse(page).text());
    let total = entries.len();

    let records: Vec<CandidateRecord> = entries
        .into_iter()
        .filter(|entry| entry.ra.is_some() && entry.dec.is_some())
        .map(|entry| entry.into_record(COORDINATE_SOURCE_LABEL))
        .collect();

    let with_coordinates = records.len();
    let mut records = dedup_by_id(records);
    records.truncate(max_entries);

    tracing::debug!(
        "Entries on page: {total}, with coordinates: {with_coordinates}, kept: {}",
        records.len()
    );
    records
}

/// Column positions of a transient table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TableLayout {
    id: usize,
    magnitude: Option<usize>,
    type_tag: Option<usize>,
    ra: Option<usize>,
    dec: Option<usize>,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            id: 0,
            magnitude: Some(1),
            type_tag: Some(2),
            ra: None,
            dec: None,
        }
    }
}

impl TableLayout {
    fn from_header(header: &TableRow) -> Self {
        let find = |names: &[&str]| {
            header.cells.iter().position(|cell| {
                let cell = cell.to_ascii_lowercase();
                names.iter().any(|name| cell.starts_with(name))
            })
        };
        let defaults = Self::default();
        Self {
            id: find(&["name", "object", "designation", "sn", "id"]).unwrap_or(defaults.id),
            magnitude: find(&["mag"]).or(defaults.magnitude),
            type_tag: find(&["type"]).or(defaults.type_tag),
            ra: find(&["r.a", "ra"]),
            dec: find(&["decl", "dec"]),
        }
    }

    fn record(&self, row: &TableRow) -> Option<CandidateRecord> {
        let cell = |idx: Option<usize>| idx.and_then(|i| row.cells.get(i)).map(|c| c.trim());

        let raw_id = cell(Some(self.id))?;
        if !DESIGNATION.is_match(raw_id).unwrap_or(false) {
            return None;
        }

        let magnitude = cell(self.magnitude).and_then(parse_magnitude);
        let type_tag = cell(self.type_tag)
            .filter(|t| !t.is_empty() && *t != "-")
            .unwrap_or(UNKNOWN_TYPE);

        let mut record = CandidateRecord::new(normalize_designation(raw_id), magnitude, type_tag)
            .with_source(TABLE_SOURCE_LABEL);
        if let (Some(ra), Some(dec)) = (cell(self.ra), cell(self.dec)) {
            if !ra.is_empty() && !dec.is_empty() {
                record = record.with_coordinates(ra, dec);
            }
        }
        Some(record)
    }
}

fn table_records(rows: &[TableRow]) -> Vec<CandidateRecord> {
    let layout = rows
        .iter()
        .find(|row| row.header)
        .map_or_else(TableLayout::default, TableLayout::from_header);

    rows.iter()
        .filter(|row| !row.header)
        .filter_map(|row| layout.record(row))
        .collect()
}

/// Table rows plus free-text entries outside the tables, deduplicated
#[must_use]
pub fn parse_table_page(page: &str) -> Vec<CandidateRecord> {
    let page = Page::parse(page);
    let mut records: Vec<CandidateRecord> =
        page.tables().iter().flat_map(|rows| table_records(rows)).collect();
    let from_tables = records.len();

    records.extend(
        text_entries(&page.text_outside_tables())
            .into_iter()
            .map(|entry| entry.into_record(TABLE_SOURCE_LABEL)),
    );

    tracing::debug!(
        "Table rows: {from_tables}, text entries: {}",
        records.len() - from_tables
    );
    dedup_by_id(records)
}

/// Primary source: discovery entries that carry R.A./Decl.
pub struct RochesterCoordinateSource {
    fetcher: PageFetcher,
    url: String,
    max_entries: usize,
}

impl RochesterCoordinateSource {
    pub fn new(fetcher: PageFetcher, url: impl Into<String>, max_entries: usize) -> Self {
        Self {
            fetcher,
            url: url.into(),
            max_entries,
        }
    }
}

impl TransientSource for RochesterCoordinateSource {
    fn name(&self) -> &str {
        COORDINATE_SOURCE_LABEL
    }

    fn fetch(&self) -> Result<Vec<CandidateRecord>, SourceError> {
        let page = self.fetcher.fetch(&self.url)?;
        let records = parse_coordinate_entries(&page, self.max_entries);
        tracing::info!("Found {} transients with coordinates", records.len());
        Ok(records)
    }
}

/// Fallback source: the simpler per-year table page
pub struct RochesterTableSource {
    fetcher: PageFetcher,
    url: String,
}

impl RochesterTableSource {
    pub fn new(fetcher: PageFetcher, url: impl Into<String>) -> Self {
        Self {
            fetcher,
            url: url.into(),
        }
    }
}

impl TransientSource for RochesterTableSource {
    fn name(&self) -> &str {
        TABLE_SOURCE_LABEL
    }

    fn fetch(&self) -> Result<Vec<CandidateRecord>, SourceError> {
        let page = self.fetcher.fetch(&self.url)?;
        let records = parse_table_page(&page);
        tracing::info!("Found {} transients on {}", records.len(), self.url);
        Ok(records)
    }
}
