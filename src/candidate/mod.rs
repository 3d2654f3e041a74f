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

use fancy_regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

// Leading decimal number, ignoring band suffixes such as "16.5V" or "17.2r"
static MAGNITUDE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+(?:\.\d+)?)").expect("magnitude pattern is valid"));

/// Type tags that mean "not classified yet"
pub const UNKNOWN_TYPE_TAGS: [&str; 2] = ["unknown", "unk"];

/// Right ascension / declination exactly as the source printed them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkyCoordinates {
    pub ra: String,
    pub dec: String,
}

impl SkyCoordinates {
    pub fn new(ra: impl Into<String>, dec: impl Into<String>) -> Self {
        Self {
            ra: ra.into().trim().to_string(),
            dec: dec.into().trim().to_string(),
        }
    }
}

/// Quantities reported by the catalog for the nearest matched source.
/// Not every catalog row carries every quantity, so all fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogMatch {
    /// mas/yr
    pub proper_motion_ra: Option<f64>,
    /// mas/yr
    pub proper_motion_dec: Option<f64>,
    /// mas
    pub parallax: Option<f64>,
    /// Gaia G band
    pub catalog_magnitude: Option<f64>,
    pub separation_arcsec: Option<f64>,
}

impl CatalogMatch {
    /// Total proper motion in mas/yr, only when both components are known
    #[must_use]
    pub fn total_proper_motion(&self) -> Option<f64> {
        let pmra = finite(self.proper_motion_ra)?;
        let pmdec = finite(self.proper_motion_dec)?;
        Some(pmra.mul_add(pmra, pmdec * pmdec).sqrt())
    }

    /// Parallax distance in parsec, only for a strictly positive parallax
    #[must_use]
    pub fn distance_pc(&self) -> Option<f64> {
        finite(self.parallax)
            .filter(|parallax| *parallax > 0.0)
            .map(|parallax| 1000.0 / parallax)
    }
}

/// Outcome of the catalog cross-match for one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CrossMatch {
    /// Lookup ran but found nothing, or failed for this candidate
    Unmatched {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Matched(CatalogMatch),
}

impl CrossMatch {
    #[must_use]
    pub const fn catalog(&self) -> Option<&CatalogMatch> {
        match self {
            Self::Matched(catalog) => Some(catalog),
            Self::Unmatched { .. } => None,
        }
    }
}

/// One transient as delivered by a source, normalized once at the scraping boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: String,
    pub magnitude: Option<f64>,
    pub type_tag: String,
    #[serde(default)]
    pub coordinates: Option<SkyCoordinates>,
    #[serde(default)]
    pub discovered: Option<String>,
    #[serde(default)]
    pub source: String,
    /// `None` until enrichment has run for this record
    #[serde(default)]
    pub cross_match: Option<CrossMatch>,
}

impl CandidateRecord {
    pub fn new(id: impl Into<String>, magnitude: Option<f64>, type_tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            magnitude,
            type_tag: type_tag.into(),
            coordinates: None,
            discovered: None,
            source: String::new(),
            cross_match: None,
        }
    }

    #[must_use]
    pub fn with_coordinates(mut self, ra: impl Into<String>, dec: impl Into<String>) -> Self {
        self.coordinates = Some(SkyCoordinates::new(ra, dec));
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    #[must_use]
    pub fn with_discovered(mut self, date: impl Into<String>) -> Self {
        self.discovered = Some(date.into());
        self
    }

    #[must_use]
    pub fn with_cross_match(mut self, cross_match: CrossMatch) -> Self {
        self.cross_match = Some(cross_match);
        self
    }

    /// Magnitude usable for scoring; NaN counts as unknown
    #[must_use]
    pub fn known_magnitude(&self) -> Option<f64> {
        finite(self.magnitude)
    }

    #[must_use]
    pub fn has_unknown_type(&self) -> bool {
        UNKNOWN_TYPE_TAGS.contains(&self.type_tag.as_str())
    }

    #[must_use]
    pub fn is_matched(&self) -> bool {
        self.catalog_match().is_some()
    }

    #[must_use]
    pub fn catalog_match(&self) -> Option<&CatalogMatch> {
        self.cross_match.as_ref().and_then(CrossMatch::catalog)
    }
}

/// Parse a magnitude cell. Band suffixes are dropped, anything else unparseable is unknown.
#[must_use]
pub fn parse_magnitude(text: &str) -> Option<f64> {
    let caps = MAGNITUDE_PATTERN.captures(text).ok().flatten()?;
    caps.get(1)?
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|m| m.is_finite())
}

/// Remove repeated ids, keeping the first occurrence and the input order
pub fn dedup_by_id(records: Vec<CandidateRecord>) -> Vec<CandidateRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(record.id.clone()))
        .collect()
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}
