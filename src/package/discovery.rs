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

use super::{create_dir, write_csv, write_text, PackageError};
use crate::anomaly::Anomaly;
use crate::report::{format_magnitude, Priority, ScienceCategory};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const SCRAPED_SOURCE: &str = "http://www.rochesterastronomy.org/snimages/sn2025.html";

/// What a single-object package is built from
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryRequest {
    pub id: String,
    pub score: f64,
    pub magnitude: Option<f64>,
    pub type_tag: Option<String>,
    pub ra: Option<String>,
    pub dec: Option<String>,
}

impl DiscoveryRequest {
    #[must_use]
    pub fn from_anomaly(anomaly: &Anomaly) -> Self {
        Self {
            id: anomaly.id.clone(),
            score: anomaly.score,
            magnitude: anomaly.magnitude,
            type_tag: Some(anomaly.type_tag.clone()).filter(|t| !t.is_empty()),
            ra: anomaly.coordinates.as_ref().map(|c| c.ra.clone()),
            dec: anomaly.coordinates.as_ref().map(|c| c.dec.clone()),
        }
    }

    fn magnitude_text(&self) -> String {
        self.magnitude
            .map_or_else(|| "Unknown".to_string(), |m| format_magnitude(Some(m)))
    }

    fn type_text(&self) -> &str {
        self.type_tag.as_deref().unwrap_or("Unknown")
    }
}

/// A written package directory and its files in creation order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryPackage {
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
}

#[derive(Serialize)]
struct PhotometryRow<'a> {
    date: &'a str,
    magnitude: &'a str,
    source: &'a str,
    notes: &'a str,
}

fn significance(category: ScienceCategory) -> &'static str {
    match category {
        ScienceCategory::LuminousRedNova => {
            "Luminous Red Novae (LRNe) are extremely rare stellar mergers (fewer than 20 known). Key characteristics:
- **Outburst Duration**: 100-200 days
- **Light Curve**: Double-peaked (merger followed by shell ejection)
- **Spectra**: Cool, emission lines of H, Ca II, Fe II
- **Progenitor**: Contact binary (K/M giants)

If confirmed, this would be one of the brightest LRNe in the northern hemisphere."
        }
        ScienceCategory::CataclysmicVariable => {
            "Cataclysmic variables in unusual outburst states can provide insights into:
- **Accretion physics**: Mass transfer rates and disk instabilities
- **Binary evolution**: Orbital period changes and mass ratios
- **Magnetic fields**: White dwarf magnetic field strengths

This object's brightness suggests either a nearby system or an unusually high accretion rate."
        }
        ScienceCategory::Supernova => {
            "Supernovae at this brightness are valuable for:
- **Cosmology**: Distance ladder calibration
- **Stellar evolution**: Progenitor constraints
- **Nucleosynthesis**: Chemical enrichment studies

Follow-up will determine if this is a standard or peculiar event."
        }
        ScienceCategory::Unclassified => {
            "Unknown transients at this brightness are particularly interesting because:
- **Novel phenomena**: May represent new classes of objects
- **Follow-up feasibility**: Bright enough for detailed study
- **Classification potential**: Spectroscopy will reveal nature

This could be a rare type of supernova, an unusual CV outburst, or a new phenomenon entirely."
        }
    }
}

fn index_markdown(request: &DiscoveryRequest, date: &str, timestamp: &str) -> String {
    let id = &request.id;
    let priority = Priority::from_score(request.score);
    let status = priority.label();
    let marker = priority.marker();
    let action = priority.action();
    let mag = request.magnitude_text();
    let obj_type = request.type_text();
    let ra = request.ra.as_deref().unwrap_or("[To be measured]");
    let dec = request.dec.as_deref().unwrap_or("[To be measured]");
    let score = format!("{:.1}", request.score);
    let significance = significance(ScienceCategory::from_type_tag(obj_type));

    format!(
        "---
discovery_id: {id}
date: {date}
discoverer: ASTRA Autonomous System v{VERSION}
status: {status}
---

# Discovery Report: {id}

## Executive Summary

**Object**: {id}
**RA**: {ra} **Dec**: {dec} (J2000)
**Discovery Magnitude**: {mag}
**Current Magnitude**: [To be measured]
**Classification**: {obj_type}
**Priority**: **{marker} {status} PRIORITY** - {action}

## Discovery Details

### Automated Detection
- **Discovery Engine**: ASTRA v{VERSION}
- **Anomaly Score**: {score}/10
- **Scraping Source**: Rochester Astronomy Supernova Page
- **Discovery Time**: {timestamp}

### Photometric Properties
- **Initial Magnitude**: {mag} (unfiltered)
- **Distance Estimate**: [To be calculated after classification]

## Scientific Significance

{significance}

## Recommended Observations

### Immediate (within 24-48 hours)
- **Spectroscopy**: Low-res (R~300-1000), 4000-7000 Å, S/N >20
- **Photometry**: BVRI (or griz), time series every 2-4 hours
- **Telescope**: 1-4m class sufficient

### Short-term (1-2 weeks)
- **Multi-band monitoring**: Track light curve shape
- **High-res spectroscopy**: If brightens to m<14
- **Radio/X-ray**: Search for circumstellar interaction

### Long-term (months)
- **Spectroscopic evolution**: Follow temperature changes
- **Archival search**: HST for progenitor

## Observation Planning

### Tonight's Targets (if observable)
- **Rise**: [Calculate for your location]
- **Transit**: [Calculate for your location]
- **Set**: [Calculate for your location]
- **Airmass <2.0**: [Time range]
- **Moon**: [Check visibility]

### Suggested Exposure Times (for 2m telescope)
- **Spectroscopy**: 300s low-res, 1800s high-res
- **Photometry**: 30s BV, 20s RI, 10s z

## Data Availability

- **Discovery Data**: [Link to CSV](./data.csv)
- **Scraped Source**: {SCRAPED_SOURCE}
- **ASTRA Run**: [System Log](./discovery.log)

## Contact & Collaboration

**Lead Discoverer**: ASTRA Autonomous System
**Human Oversight**: [Your Name]
**Institution**: [Your Institution]

## Citation

If this discovery leads to publication, please cite:
`ASTRA Collaboration (2025). ASTRA: Autonomous System for Transient Research & Analysis.`

---

### For TNS/ATel Submission

Remove editorial notes and submit to:
- **TNS**: https://www.wis-tns.org/submit
- **ATel**: http://www.astronomerstelegram.org/submit.php

Use classification \"{obj_type}\" depending on spectroscopy.
"
    )
}

fn observation_plan_markdown(request: &DiscoveryRequest, timestamp: &str) -> String {
    let priority = Priority::from_score(request.score);
    format!(
        "# Observation Plan for {id}

**Priority**: {marker} {label} PRIORITY
**Magnitude**: {mag}
**Type**: {obj_type}

## Immediate Actions

1. **Spectroscopy**: Obtain classification spectrum
2. **Photometry**: Start multi-band monitoring
3. **Astrometry**: Confirm position

## Telescope Requirements

- **Aperture**: 2-4m for spectroscopy
- **Instruments**: {instrument}, BVRI filters
- **Exposure**: {exposure} for S/N>20

## Timeline

- **Discovery**: {timestamp}
- **First Spectrum**: Within 24-48 hours
- **Classification**: Within 1 week
- **Monitoring**: Daily for 2 weeks
",
        id = request.id,
        marker = priority.marker(),
        label = priority.label(),
        mag = request.magnitude_text(),
        obj_type = request.type_text(),
        instrument = priority.instrument(),
        exposure = priority.exposure().unwrap_or("Photometric cadence"),
    )
}

fn discovery_log(request: &DiscoveryRequest, timestamp: &str) -> String {
    format!(
        "ASTRA Discovery Log for {id}
Generated: {timestamp}
Score: {score:.1}/10
Magnitude: {mag}
Type: {obj_type}

System: ASTRA v{VERSION}
Status: Discovery packaged successfully
",
        id = request.id,
        score = request.score,
        mag = request.magnitude_text(),
        obj_type = request.type_text(),
    )
}

fn readme_markdown(request: &DiscoveryRequest, date: &str) -> String {
    format!(
        "# Discovery Package: {id}

**Date**: {date}
**Score**: {score:.1}/10
**Magnitude**: {mag}
**Type**: {obj_type}

## Files

- `index.md` - Main discovery report
- `data.csv` - Photometric data
- `observation_plan.md` - ATel/TNS-ready plan
- `discovery.log` - System logs
- `README.md` - This file

## Usage

1. Review `index.md` for full details
2. Use `observation_plan.md` for telescope proposals
3. Submit `index.md` to TNS/ATel after follow-up
",
        id = request.id,
        score = request.score,
        mag = request.magnitude_text(),
        obj_type = request.type_text(),
    )
}

/// Write `<root>/<date>_<id>/` with the report, data stub, plan, log and README
pub fn create_discovery_package(
    request: &DiscoveryRequest,
    root: &Path,
    now: DateTime<Utc>,
) -> Result<DiscoveryPackage, PackageError> {
    let date = now.format("%Y-%m-%d").to_string();
    let timestamp = now.format("%Y-%m-%d %H:%M:%S UTC").to_string();

    let dir = root.join(format!("{date}_{}", request.id));
    create_dir(&dir)?;

    let index = dir.join("index.md");
    write_text(&index, &index_markdown(request, &date, &timestamp))?;

    let data = dir.join("data.csv");
    let magnitude = request.magnitude_text();
    write_csv(
        &data,
        &[PhotometryRow {
            date: &date,
            magnitude: &magnitude,
            source: "ASTRA",
            notes: "Discovery",
        }],
    )?;

    let plan = dir.join("observation_plan.md");
    write_text(&plan, &observation_plan_markdown(request, &timestamp))?;

    let log = dir.join("discovery.log");
    write_text(&log, &discovery_log(request, &timestamp))?;

    let readme = dir.join("README.md");
    write_text(&readme, &readme_markdown(request, &date))?;

    tracing::info!("Packaged discovery {} at {}", request.id, dir.display());
    Ok(DiscoveryPackage {
        dir,
        files: vec![index, data, plan, log, readme],
    })
}
