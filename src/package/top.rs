//! Package the best objects of an already rendered report.
//!
//! The report text is the only input, so a report from an earlier run can be
//! packaged without re-running the pipeline.

use super::{create_dir, write_json, write_text, PackageError, CONTACT_EMAIL};
use crate::candidate::parse_magnitude;
use crate::report::{ANOMALY_SECTION, SUB_RULE};
use chrono::{DateTime, Local};
use fancy_regex::Regex;
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use std::sync::LazyLock;

const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SUMMARY_FILE: &str = "packaging_summary.json";

static ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+\.\s+(\S+)\s+\(Score:\s*(\d+(?:\.\d+)?)").expect("entry pattern is valid")
});
static DETAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+([A-Za-z][A-Za-z ]*):\s*(.*)$").expect("detail pattern is valid")
});

/// One anomaly block read back from a report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryDetails {
    pub id: String,
    pub score: f64,
    pub magnitude: Option<f64>,
    #[serde(rename = "type")]
    pub type_tag: Option<String>,
    pub position: Option<String>,
    pub reasons: Vec<String>,
}

impl DiscoveryDetails {
    fn new(id: &str, score: f64) -> Self {
        Self {
            id: id.to_string(),
            score,
            magnitude: None,
            type_tag: None,
            position: None,
            reasons: Vec::new(),
        }
    }

    fn apply_detail(&mut self, label: &str, value: &str) {
        match label {
            "Magnitude" => self.magnitude = parse_magnitude(value),
            "Type" => self.type_tag = Some(value.to_string()).filter(|t| !t.is_empty()),
            "Position" => self.position = Some(value.to_string()),
            "Reasons" => {
                self.reasons = value
                    .split(", ")
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(ToString::to_string)
                    .collect();
            }
            _ => {}
        }
    }

    fn type_text(&self) -> &str {
        self.type_tag.as_deref().unwrap_or("Unknown")
    }

    fn magnitude_text(&self) -> String {
        self.magnitude
            .map_or_else(|| "N/A".to_string(), |m| format!("{m:.1}"))
    }

    fn reason_text(&self) -> String {
        if self.reasons.is_empty() {
            "N/A".to_string()
        } else {
            self.reasons.join(", ")
        }
    }
}

/// Summary written next to the packages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackagingSummary {
    pub packaging_date: String,
    pub total_discoveries: usize,
    pub source_report: String,
    pub packages: Vec<String>,
}

fn captures<'t>(pattern: &Regex, line: &'t str) -> Option<fancy_regex::Captures<'t>> {
    pattern.captures(line).ok().flatten()
}

/// Read up to `max` anomaly blocks, in report order, from the anomaly section
#[must_use]
pub fn extract_top_discoveries(report: &str, max: usize) -> Vec<DiscoveryDetails> {
    let mut discoveries: Vec<DiscoveryDetails> = Vec::new();
    let section = report
        .lines()
        .skip_while(|line| line.trim() != ANOMALY_SECTION)
        .skip(1);

    for line in section {
        if line.trim().is_empty() || line.trim() == SUB_RULE {
            continue;
        }

        if let Some(caps) = captures(&ENTRY, line) {
            if discoveries.len() == max {
                break;
            }
            let (Some(id), Some(score)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let Ok(score) = score.as_str().parse::<f64>() else {
                continue;
            };
            discoveries.push(DiscoveryDetails::new(id.as_str(), score));
        } else if let Some(caps) = captures(&DETAIL, line) {
            if let (Some(current), Some(label), Some(value)) =
                (discoveries.last_mut(), caps.get(1), caps.get(2))
            {
                current.apply_detail(label.as_str().trim(), value.as_str().trim());
            }
        } else {
            // next section heading
            break;
        }
    }

    discoveries
}

fn atel_report(details: &DiscoveryDetails, date: &str, time: &str, year: &str) -> String {
    let id = &details.id;
    let obj_type = details.type_text();
    let mag = details.magnitude_text();
    let score = format!("{:.1}", details.score);
    let reason = details.reason_text();

    format!(
        "ATel #{year}: {id} - High Priority Transient Discovery

{id} discovered by ASTRA autonomous discovery system

Authors: ASTRA Collaboration <{CONTACT_EMAIL}>
Affiliation: Shannon Labs
Date: {date} {time}
Subject: {id} - {obj_type} discovery

We report the discovery of {id}, identified by the ASTRA autonomous
transient discovery system on {date}.

Object Information:
- Designation: {id}
- Type: {obj_type}
- Magnitude: {mag}
- Discovery Score: {score}
- Classification Reason: {reason}

The object was automatically flagged for high priority based on its anomalous
characteristics in the ASTRA multi-factor scoring system.

Follow-up observations are strongly encouraged, particularly spectroscopic
classification to confirm the object type.

Coordinates: {position}
Host Galaxy: [Determine from cross-matching]

For more information about this discovery, contact the ASTRA team at
{CONTACT_EMAIL}.

---

Classification: Uncertain (Follow-up required)
Follow-up Priority: High
Recommended Facilities: 2m+ class telescopes for spectroscopy
",
        position = details
            .position
            .as_deref()
            .unwrap_or("[Insert from catalog cross-match when available]"),
    )
}

fn observation_plan(details: &DiscoveryDetails, date: &str) -> String {
    let (ra, dec) = details
        .position
        .as_deref()
        .and_then(|p| p.split_once(' '))
        .unwrap_or(("[HH:MM:SS]", "[±DD:MM:SS]"));

    format!(
        "Observation Plan for {id}

Generated by ASTRA on {date}

TARGET INFORMATION:
------------------
Object ID: {id}
Type: {obj_type}
Current Magnitude: {mag}
Discovery Score: {score:.1}

IMMEDIATE OBSERVATIONS (Next 48 hours):
---------------------------------------

1. SPECTROSCOPY (High Priority)
   Facility: 2m+ class telescope
   Resolution: R ~ 1000-3000
   Wavelength range: 4000-9000 Å
   Exposure time: ~1800s (adjust for magnitude)
   Goal: Confirm classification, measure velocities

2. MULTI-BAND PHOTOMETRY
   Filters: B, V, R, I
   Cadence: Every 12 hours
   Goal: Build light curve, measure colors
   Precision: 0.05 mag or better

FOLLOW-UP OBSERVATIONS (Next 2 weeks):
--------------------------------------

1. POLARIMETRY (If available)
   Goal: Check for intrinsic polarization
   Priority: Medium

2. RADIO OBSERVATIONS (If facilities available)
   Frequency: 1-8 GHz
   Goal: Search for radio emission
   Priority: Low

COORDINATES:
------------
RA: {ra}
Dec: {dec}

VISIBILITY:
-----------
Moon distance: [Calculate]
Airmass constraints: < 2.0
Optimal observing window: [Calculate]

CONTACTS:
---------
For coordination: {CONTACT_EMAIL}

NOTES:
------
{notes}

---
This plan was automatically generated by ASTRA v{VERSION}
",
        id = details.id,
        obj_type = details.type_text(),
        mag = details.magnitude_text(),
        score = details.score,
        notes = details.reason_text(),
    )
}

fn package_readme(details: &DiscoveryDetails, date: &str) -> String {
    format!(
        "# {id} Discovery Package

Generated by ASTRA Autonomous Discovery System on {date}

## Files in this package:

- `{id}_ATel_report.txt` - ATel-style discovery report
- `{id}_observation_plan.txt` - Detailed follow-up observations
- `{id}_data.json` - Machine-readable discovery data

## Discovery Summary:

**Object ID:** {id}
**Type:** {obj_type}
**Magnitude:** {mag}
**Score:** {score:.1}
**Classification Reason:** {reason}

## Next Steps:

1. Review the observation plan
2. Coordinate spectroscopic observations
3. Begin photometric monitoring
4. Submit to TNS/ATel if confirmed as new discovery

## Contact:

For questions or coordination: {CONTACT_EMAIL}

---
This package was automatically generated by ASTRA v{VERSION}
",
        id = details.id,
        obj_type = details.type_text(),
        mag = details.magnitude_text(),
        score = details.score,
        reason = details.reason_text(),
    )
}

fn package_one(details: &DiscoveryDetails, out: &Path, now: DateTime<Local>) -> Result<(), PackageError> {
    let dir = out.join(&details.id);
    create_dir(&dir)?;

    let date = now.format("%Y-%m-%d").to_string();
    let time = now.format("%H:%M:%S").to_string();
    let year = now.format("%Y").to_string();

    write_text(
        &dir.join(format!("{}_ATel_report.txt", details.id)),
        &atel_report(details, &date, &time, &year),
    )?;
    write_text(
        &dir.join(format!("{}_observation_plan.txt", details.id)),
        &observation_plan(details, &date),
    )?;

    let data = json!({
        "discovery": details,
        "metadata": {
            "generated_by": format!("ASTRA v{VERSION}"),
            "generation_time": now.to_rfc3339(),
            "pipeline_version": VERSION,
            "data_sources": [
                "Rochester Astronomy Supernova Page",
                "Automated classification",
                "Cross-matching with astronomical catalogs",
            ],
        },
        "observation_status": {
            "spectroscopy": "pending",
            "photometry": "pending",
            "polarimetry": "pending",
            "radio": "pending",
        },
    });
    write_json(&dir.join(format!("{}_data.json", details.id)), &data)?;

    write_text(&dir.join("README.md"), &package_readme(details, &date))
}

/// Write one package directory per discovery plus `packaging_summary.json`
pub fn package_discoveries(
    discoveries: &[DiscoveryDetails],
    source_report: &str,
    out: &Path,
    now: DateTime<Local>,
) -> Result<PackagingSummary, PackageError> {
    create_dir(out)?;

    let mut packages = Vec::with_capacity(discoveries.len());
    for details in discoveries {
        package_one(details, out, now)?;
        tracing::info!("Packaged {}", details.id);
        packages.push(details.id.clone());
    }

    let summary = PackagingSummary {
        packaging_date: now.to_rfc3339(),
        total_discoveries: packages.len(),
        source_report: source_report.to_string(),
        packages,
    };
    write_json(&out.join(SUMMARY_FILE), &summary)?;
    Ok(summary)
}

/// Extract up to `max` discoveries from `report` and package them.
///
/// Returns `None` when the report lists no anomalies; nothing is written then.
pub fn package_top_discoveries(
    report: &str,
    source_report: &str,
    out: &Path,
    max: usize,
    now: DateTime<Local>,
) -> Result<Option<PackagingSummary>, PackageError> {
    let discoveries = extract_top_discoveries(report, max);
    if discoveries.is_empty() {
        tracing::info!("No high-priority discoveries in {source_report}");
        return Ok(None);
    }
    package_discoveries(&discoveries, source_report, out, now).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::scorer::RuleSet;
    use crate::anomaly::Anomaly;
    use crate::candidate::SkyCoordinates;
    use crate::report::ReportRenderer;
    use chrono::TimeZone;

    fn anomaly(id: &str, score: f64, magnitude: Option<f64>, type_tag: &str, reasons: &[&str]) -> Anomaly {
        Anomaly {
            id: id.to_string(),
            magnitude,
            type_tag: type_tag.to_string(),
            source: "Rochester".to_string(),
            score,
            reasons: reasons.iter().map(ToString::to_string).collect(),
            coordinates: None,
            catalog: None,
        }
    }

    fn rendered(rule_set: RuleSet) -> String {
        let mut lrn = anomaly(
            "AT2025abao",
            8.0,
            Some(15.1),
            "LRN",
            &["Very bright (m=15.1)", "Luminous Red Nova (rare stellar merger)"],
        );
        lrn.coordinates = Some(SkyCoordinates::new("21:42:15.42", "+53:17:43.1"));
        let anomalies = vec![
            lrn,
            anomaly("AT2025abne", 6.0, None, "unknown", &["Unknown classification"]),
            anomaly("AT2025cv", 5.0, Some(15.5), "CV", &["Very bright (m=15.5)"]),
            anomaly("AT2025four", 5.0, Some(19.0), "SLSN", &["Unusual type: SLSN"]),
        ];
        ReportRenderer::new(rule_set).render(&anomalies, "2025-11-06 12:00:00")
    }

    #[test]
    fn test_extract_reads_blocks_in_order() {
        for rule_set in [RuleSet::Baseline, RuleSet::Extended] {
            let found = extract_top_discoveries(&rendered(rule_set), 3);
            let ids: Vec<&str> = found.iter().map(|d| d.id.as_str()).collect();
            assert_eq!(ids, vec!["AT2025abao", "AT2025abne", "AT2025cv"]);

            let lrn = &found[0];
            assert_eq!(lrn.score, 8.0);
            assert_eq!(lrn.magnitude, Some(15.1));
            assert_eq!(lrn.type_tag.as_deref(), Some("LRN"));
            assert_eq!(lrn.position.as_deref(), Some("21:42:15.42 +53:17:43.1"));
            assert_eq!(
                lrn.reasons,
                vec!["Very bright (m=15.1)", "Luminous Red Nova (rare stellar merger)"]
            );

            assert_eq!(found[1].magnitude, None);
        }
    }

    #[test]
    fn test_extract_ignores_follow_up_section() {
        let found = extract_top_discoveries(&rendered(RuleSet::Baseline), 10);
        assert_eq!(found.len(), 4);
    }

    #[test]
    fn test_extract_from_empty_report() {
        let report = ReportRenderer::new(RuleSet::Baseline).render(&[], "now");
        assert!(extract_top_discoveries(&report, 3).is_empty());
        assert!(extract_top_discoveries("not a report", 3).is_empty());
    }

    #[test]
    fn test_package_discoveries() {
        let out = tempfile::tempdir().expect("temp dir");
        let now = Local
            .with_ymd_and_hms(2025, 11, 6, 22, 0, 0)
            .single()
            .expect("valid local time");
        let found = extract_top_discoveries(&rendered(RuleSet::Extended), 2);

        let summary =
            package_discoveries(&found, "astra_extended_report.txt", out.path(), now).expect("package");
        assert_eq!(summary.total_discoveries, 2);
        assert_eq!(summary.packages, vec!["AT2025abao", "AT2025abne"]);

        let dir = out.path().join("AT2025abao");
        let atel = std::fs::read_to_string(dir.join("AT2025abao_ATel_report.txt")).expect("atel");
        assert!(atel.starts_with("ATel #2025: AT2025abao - High Priority Transient Discovery"));
        assert!(atel.contains("- Magnitude: 15.1"));
        assert!(atel.contains("Coordinates: 21:42:15.42 +53:17:43.1"));

        let plan = std::fs::read_to_string(dir.join("AT2025abao_observation_plan.txt")).expect("plan");
        assert!(plan.contains("RA: 21:42:15.42\nDec: +53:17:43.1"));

        let data: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.join("AT2025abao_data.json")).expect("data"),
        )
        .expect("valid json");
        assert_eq!(data["discovery"]["type"], "LRN");
        assert_eq!(data["observation_status"]["spectroscopy"], "pending");
        assert!(dir.join("README.md").is_file());

        let unknown = out.path().join("AT2025abne").join("AT2025abne_ATel_report.txt");
        let atel = std::fs::read_to_string(unknown).expect("atel");
        assert!(atel.contains("- Magnitude: N/A"));
        assert!(atel.contains("Coordinates: [Insert from catalog cross-match when available]"));

        let written: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(out.path().join(SUMMARY_FILE)).expect("summary"),
        )
        .expect("valid json");
        assert_eq!(written["total_discoveries"], 2);
    }

    #[test]
    fn test_package_top_skips_empty_report() {
        let out = tempfile::tempdir().expect("temp dir");
        let target = out.path().join("packaged");
        let report = ReportRenderer::new(RuleSet::Baseline).render(&[], "2025-11-06 12:00:00");

        let summary = package_top_discoveries(&report, "empty.txt", &target, 3, Local::now()).expect("no io");
        assert!(summary.is_none());
        assert!(!target.exists());
    }
}
