use crate::anomaly::scorer::AnomalyScorer;
use crate::candidate::{CandidateRecord, CatalogMatch, SkyCoordinates};
use serde::{Deserialize, Serialize};

/// Follow-up threshold used when the caller has no preference
pub const DEFAULT_THRESHOLD: f64 = 5.0;

/// A candidate that cleared the threshold, with the evidence for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub id: String,
    pub magnitude: Option<f64>,
    pub type_tag: String,
    #[serde(default)]
    pub source: String,
    pub score: f64,
    pub reasons: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<SkyCoordinates>,
    /// Only set for records with an actual catalog match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<CatalogMatch>,
}

impl Anomaly {
    #[must_use]
    pub const fn has_catalog_match(&self) -> bool {
        self.catalog.is_some()
    }
}

/// Score every candidate and keep those with `score >= threshold`, best first.
///
/// The sort is stable, so equal scores keep their input order.
#[must_use]
pub fn select(
    candidates: &[CandidateRecord],
    scorer: &dyn AnomalyScorer,
    threshold: f64,
) -> Vec<Anomaly> {
    let mut anomalies: Vec<Anomaly> = candidates
        .iter()
        .filter_map(|candidate| {
            let card = scorer.score(candidate);
            (card.score >= threshold).then(|| Anomaly {
                id: candidate.id.clone(),
                magnitude: candidate.magnitude,
                type_tag: candidate.type_tag.clone(),
                source: candidate.source.clone(),
                score: card.score,
                reasons: card.reasons,
                coordinates: candidate.coordinates.clone(),
                catalog: candidate.catalog_match().cloned(),
            })
        })
        .collect();

    anomalies.sort_by(|a, b| b.score.total_cmp(&a.score));

    tracing::debug!(
        "Selected {} of {} candidates at threshold {threshold:.1}",
        anomalies.len(),
        candidates.len()
    );

    anomalies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::baseline::BaselineScorer;
    use crate::candidate::CrossMatch;

    #[test]
    fn test_threshold_and_order() {
        let candidates = vec![
            // 8.0
            CandidateRecord::new("AT2025abao", Some(15.1), "LRN"),
            // 3.0
            CandidateRecord::new("AT2025vb", Some(15.5), "Ia"),
            // 5.0
            CandidateRecord::new("AT2025lrn", Some(18.0), "LRN"),
        ];

        let anomalies = select(&candidates, &BaselineScorer::new(), DEFAULT_THRESHOLD);
        let ids: Vec<&str> = anomalies.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["AT2025abao", "AT2025lrn"]);
        assert_eq!(anomalies[0].score, 8.0);
        assert_eq!(anomalies[1].score, 5.0);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let candidates = vec![
            CandidateRecord::new("AT2025first", None, "LRN"),
            CandidateRecord::new("AT2025top", Some(14.0), "LRN"),
            CandidateRecord::new("AT2025second", None, "LRN"),
        ];

        let anomalies = select(&candidates, &BaselineScorer::new(), 5.0);
        let ids: Vec<&str> = anomalies.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["AT2025top", "AT2025first", "AT2025second"]);
    }

    #[test]
    fn test_fields_copied_only_when_present() {
        let with_position = CandidateRecord::new("AT2025pos", Some(13.5), "unknown")
            .with_coordinates("12h30m45s", "+45d30m15s")
            .with_cross_match(CrossMatch::Unmatched { error: None });
        let bare = CandidateRecord::new("AT2025bare", Some(13.0), "unknown");

        let anomalies = select(&[with_position, bare], &BaselineScorer::new(), 5.0);
        assert_eq!(anomalies.len(), 2);

        let pos = anomalies.iter().find(|a| a.id == "AT2025pos").expect("positioned anomaly");
        assert_eq!(pos.coordinates.as_ref().map(|c| c.ra.as_str()), Some("12h30m45s"));
        assert!(!pos.has_catalog_match());

        let bare = anomalies.iter().find(|a| a.id == "AT2025bare").expect("bare anomaly");
        assert!(bare.coordinates.is_none());
    }

    #[test]
    fn test_empty_input() {
        assert!(select(&[], &BaselineScorer::new(), DEFAULT_THRESHOLD).is_empty());
    }
}
