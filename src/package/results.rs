use super::{create_dir, write_csv, write_json, write_text, PackageError};
use crate::anomaly::scorer::RuleSet;
use crate::candidate::{CandidateRecord, CrossMatch};
use crate::pipeline::RunBundle;
use crate::report::render_summary;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// `--output auto` resolves to a fresh timestamped run directory
pub const AUTO_OUTPUT: &str = "auto";
pub const LATEST_LINK: &str = "latest_discovery";

/// Paths of the files a run wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultArtifacts {
    pub report: PathBuf,
    pub catalog: PathBuf,
    pub anomalies: PathBuf,
    pub summary: PathBuf,
}

/// Resolve the output directory for a run without touching the filesystem
#[must_use]
pub fn resolve_output_dir(output: &str, base: &Path, rule_set: RuleSet, now: DateTime<Local>) -> PathBuf {
    if output == AUTO_OUTPUT {
        base.join(format!("{rule_set}_run_{}", now.format("%Y%m%d_%H%M%S")))
    } else {
        base.join(output)
    }
}

/// Resolve and create the output directory
pub fn prepare_output_dir(
    output: &str,
    base: &Path,
    rule_set: RuleSet,
    now: DateTime<Local>,
) -> Result<PathBuf, PackageError> {
    let dir = resolve_output_dir(output, base, rule_set, now);
    create_dir(&dir)?;
    Ok(dir)
}

/// One line of the transient catalog CSV
#[derive(Debug, Serialize)]
struct CatalogRow<'a> {
    id: &'a str,
    magnitude: Option<f64>,
    #[serde(rename = "type")]
    type_tag: &'a str,
    ra: Option<&'a str>,
    dec: Option<&'a str>,
    discovered: Option<&'a str>,
    source: &'a str,
    gaia_status: &'static str,
    gaia_pmra: Option<f64>,
    gaia_pmdec: Option<f64>,
    gaia_parallax: Option<f64>,
    gaia_g_mag: Option<f64>,
    gaia_separation_arcsec: Option<f64>,
    gaia_distance_pc: Option<f64>,
    gaia_total_pm: Option<f64>,
    crossmatch_error: Option<&'a str>,
}

impl<'a> From<&'a CandidateRecord> for CatalogRow<'a> {
    fn from(record: &'a CandidateRecord) -> Self {
        let catalog = record.catalog_match();
        let (gaia_status, crossmatch_error) = match &record.cross_match {
            None => ("not_checked", None),
            Some(CrossMatch::Matched(_)) => ("matched", None),
            Some(CrossMatch::Unmatched { error }) => ("unmatched", error.as_deref()),
        };

        Self {
            id: &record.id,
            magnitude: record.known_magnitude(),
            type_tag: &record.type_tag,
            ra: record.coordinates.as_ref().map(|c| c.ra.as_str()),
            dec: record.coordinates.as_ref().map(|c| c.dec.as_str()),
            discovered: record.discovered.as_deref(),
            source: &record.source,
            gaia_status,
            gaia_pmra: catalog.and_then(|c| c.proper_motion_ra),
            gaia_pmdec: catalog.and_then(|c| c.proper_motion_dec),
            gaia_parallax: catalog.and_then(|c| c.parallax),
            gaia_g_mag: catalog.and_then(|c| c.catalog_magnitude),
            gaia_separation_arcsec: catalog.and_then(|c| c.separation_arcsec),
            gaia_distance_pc: catalog.and_then(|c| c.distance_pc()),
            gaia_total_pm: catalog.and_then(|c| c.total_proper_motion()),
            crossmatch_error,
        }
    }
}

/// Write report, catalog, anomaly list and summary for a completed run
pub fn write_results(bundle: &RunBundle, dir: &Path) -> Result<ResultArtifacts, PackageError> {
    let mode = bundle.rule_set.as_str();
    let artifacts = ResultArtifacts {
        report: dir.join(format!("astra_{mode}_report.txt")),
        catalog: dir.join(format!("{mode}_transients_catalog.csv")),
        anomalies: dir.join(format!("{mode}_anomalies.json")),
        summary: dir.join("summary.txt"),
    };

    write_text(&artifacts.report, &bundle.report)?;

    let rows: Vec<CatalogRow<'_>> = bundle.transients.iter().map(CatalogRow::from).collect();
    write_csv(&artifacts.catalog, &rows)?;

    write_json(&artifacts.anomalies, &bundle.anomalies)?;

    let summary = render_summary(bundle.transients.len(), &bundle.anomalies, bundle.rule_set);
    write_text(&artifacts.summary, &summary)?;

    tracing::info!("Results saved to {}", dir.display());
    link_latest(dir);
    Ok(artifacts)
}

/// Point `latest_discovery` next to `dir` at it. Failures are only logged.
#[cfg(unix)]
fn link_latest(dir: &Path) {
    let (Some(parent), Some(name)) = (dir.parent(), dir.file_name()) else {
        return;
    };
    let link = parent.join(LATEST_LINK);

    match std::fs::symlink_metadata(&link) {
        Ok(meta) if meta.file_type().is_symlink() => {
            if let Err(e) = std::fs::remove_file(&link) {
                tracing::warn!("Could not replace {}: {e}", link.display());
                return;
            }
        }
        Ok(_) => {
            tracing::warn!("{} exists and is not a link, leaving it alone", link.display());
            return;
        }
        Err(_) => {}
    }

    if let Err(e) = std::os::unix::fs::symlink(name, &link) {
        tracing::warn!("Could not create {}: {e}", link.display());
    }
}

#[cfg(not(unix))]
fn link_latest(dir: &Path) {
    tracing::debug!("No {LATEST_LINK} link on this platform for {}", dir.display());
}
