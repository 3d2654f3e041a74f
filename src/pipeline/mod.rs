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

//! One discovery run: FETCH → (ENRICH) → SELECT → RENDER.
//!
//! The pipeline owns its collaborators as trait objects. Whether a catalog
//! cross-match is available is decided by whoever builds the pipeline.

use crate::anomaly::scorer::{AnomalyScorer, RuleSet};
use crate::anomaly::{create_scorer, select, Anomaly, DEFAULT_THRESHOLD};
use crate::candidate::{dedup_by_id, CandidateRecord, CrossMatch};
use crate::crossmatch::{CrossMatchError, CrossMatcher, SkyPosition};
use crate::report::ReportRenderer;
use crate::source::{SourceError, TransientSource};
use indexmap::IndexMap;
use rayon::prelude::*;

/// Everything a completed run produced
#[derive(Debug, Clone)]
pub struct RunBundle {
    pub rule_set: RuleSet,
    /// Full candidate table after dedup and enrichment
    pub transients: Vec<CandidateRecord>,
    /// Flagged candidates, best first
    pub anomalies: Vec<Anomaly>,
    pub report: String,
}

#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    Completed(RunBundle),
    /// Neither the primary nor the fallback source returned any candidates
    NoData,
}

impl PipelineOutcome {
    #[must_use]
    pub fn completed(self) -> Option<RunBundle> {
        match self {
            Self::Completed(bundle) => Some(bundle),
            Self::NoData => None,
        }
    }
}

pub struct Pipeline {
    primary: Box<dyn TransientSource>,
    fallback: Option<Box<dyn TransientSource>>,
    cross_matcher: Option<Box<dyn CrossMatcher>>,
    scorer: Box<dyn AnomalyScorer>,
    renderer: ReportRenderer,
    threshold: f64,
    parallel_enrichment: bool,
}

impl Pipeline {
    pub fn new(primary: Box<dyn TransientSource>, scorer: Box<dyn AnomalyScorer>) -> Self {
        let renderer = ReportRenderer::new(scorer.rule_set());
        Self {
            primary,
            fallback: None,
            cross_matcher: None,
            scorer,
            renderer,
            threshold: DEFAULT_THRESHOLD,
            parallel_enrichment: false,
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: Box<dyn TransientSource>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    #[must_use]
    pub fn with_cross_matcher(mut self, cross_matcher: Box<dyn CrossMatcher>) -> Self {
        self.cross_matcher = Some(cross_matcher);
        self
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_parallel_enrichment(mut self, parallel: bool) -> Self {
        self.parallel_enrichment = parallel;
        self
    }

    #[must_use]
    pub fn with_follow_up_count(mut self, count: usize) -> Self {
        self.renderer = self.renderer.with_follow_up_count(count);
        self
    }

    #[must_use]
    pub fn rule_set(&self) -> RuleSet {
        self.scorer.rule_set()
    }

    /// Run once. Transport failures are returned as is; an empty sky is `NoData`.
    pub fn run(&self, generated_at: &str) -> Result<PipelineOutcome, SourceError> {
        let transients = self.fetch()?;
        if transients.is_empty() {
            tracing::warn!("No transients found in primary or fallback source");
            return Ok(PipelineOutcome::NoData);
        }

        let transients = self.enrich(transients);

        tracing::info!(
            "Scoring {} transients with the {} rule set (threshold {:.1})",
            transients.len(),
            self.rule_set(),
            self.threshold
        );
        let anomalies = select(&transients, self.scorer.as_ref(), self.threshold);
        tracing::info!("Found {} high-priority anomalies", anomalies.len());

        let report = self.renderer.render(&anomalies, generated_at);

        Ok(PipelineOutcome::Completed(RunBundle {
            rule_set: self.rule_set(),
            transients,
            anomalies,
            report,
        }))
    }

    fn fetch(&self) -> Result<Vec<CandidateRecord>, SourceError> {
        tracing::info!("Fetching transients from {}", self.primary.name());
        let records = self.primary.fetch()?;
        if !records.is_empty() {
            return Ok(dedup_by_id(records));
        }

        let Some(fallback) = &self.fallback else {
            return Ok(Vec::new());
        };
        tracing::warn!(
            "{} returned no transients, trying {}",
            self.primary.name(),
            fallback.name()
        );
        Ok(dedup_by_id(fallback.fetch()?))
    }

    fn enrich(&self, transients: Vec<CandidateRecord>) -> Vec<CandidateRecord> {
        let with_coordinates = transients.iter().filter(|t| t.coordinates.is_some()).count();
        if with_coordinates == 0 {
            tracing::debug!("No coordinates on any transient, skipping cross-match");
            return transients;
        }

        let Some(matcher) = self.cross_matcher.as_deref() else {
            tracing::info!(
                "Catalog cross-match unavailable, {with_coordinates} positions left unmatched"
            );
            return transients
                .into_iter()
                .map(|record| record.with_cross_match(CrossMatch::Unmatched { error: None }))
                .collect();
        };

        tracing::info!(
            "Cross-matching {with_coordinates} positions against {}",
            matcher.name()
        );

        let targets: Vec<&CandidateRecord> =
            transients.iter().filter(|t| t.coordinates.is_some()).collect();
        let lookup = |record: &&CandidateRecord| (record.id.clone(), cross_match_one(matcher, record));

        let results: IndexMap<String, CrossMatch> = if self.parallel_enrichment {
            targets.par_iter().map(lookup).collect()
        } else {
            targets.iter().map(lookup).collect()
        };

        let matched = results.values().filter(|m| m.catalog().is_some()).count();
        tracing::info!("{matched} of {with_coordinates} positions have a catalog counterpart");

        transients
            .into_iter()
            .map(|mut record| {
                if let Some(cross_match) = results.get(&record.id) {
                    record.cross_match = Some(cross_match.clone());
                }
                record
            })
            .collect()
    }
}

/// Outcome of the offline self-check for one rule set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfCheck {
    pub rule_set: RuleSet,
    pub anomalies: usize,
    pub passed: bool,
}

/// Score and render three reference candidates at `DEFAULT_THRESHOLD`.
///
/// Passes when the Luminous Red Nova ranks first and appears in the report.
/// Ignores any configured threshold.
#[must_use]
pub fn self_check(rule_set: RuleSet) -> SelfCheck {
    let candidates = [
        CandidateRecord::new("AT2025abao", Some(15.1), "LRN"),
        CandidateRecord::new("AT2025abne", Some(15.8), "unknown"),
        CandidateRecord::new("SN2025abc", Some(18.5), "Ia"),
    ];
    let scorer = create_scorer(rule_set);
    let anomalies = select(&candidates, scorer.as_ref(), DEFAULT_THRESHOLD);
    let report = ReportRenderer::new(rule_set).render(&anomalies, "self-check");

    let top_is_lrn = anomalies.first().is_some_and(|a| a.id == "AT2025abao");
    SelfCheck {
        rule_set,
        anomalies: anomalies.len(),
        passed: top_is_lrn && report.contains("AT2025abao"),
    }
}

/// Cross-match a single record. Failures stay local to this record.
fn cross_match_one(matcher: &dyn CrossMatcher, record: &CandidateRecord) -> CrossMatch {
    let Some(coords) = &record.coordinates else {
        return CrossMatch::Unmatched { error: None };
    };

    let lookup = SkyPosition::from_coordinates(coords)
        .map_err(CrossMatchError::from)
        .and_then(|position| matcher.lookup(&position));

    match lookup {
        Ok(Some(catalog)) => {
            tracing::debug!("{}: catalog counterpart found", record.id);
            CrossMatch::Matched(catalog)
        }
        Ok(None) => CrossMatch::Unmatched { error: None },
        Err(e) => {
            tracing::warn!("Cross-match failed for {}: {e}", record.id);
            CrossMatch::Unmatched {
                error: Some(e.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::CatalogMatch;
    use crate::report::NO_ANOMALIES;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeSource {
        name: &'static str,
        records: Vec<CandidateRecord>,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl FakeSource {
        fn boxed(
            name: &'static str,
            records: Vec<CandidateRecord>,
        ) -> (Box<dyn TransientSource>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let source = Self {
                name,
                records,
                fail: false,
                calls: Arc::clone(&calls),
            };
            (Box::new(source), calls)
        }

        fn failing(name: &'static str) -> (Box<dyn TransientSource>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let source = Self {
                name,
                records: Vec::new(),
                fail: true,
                calls: Arc::clone(&calls),
            };
            (Box::new(source), calls)
        }
    }

    impl TransientSource for FakeSource {
        fn name(&self) -> &str {
            self.name
        }

        fn fetch(&self) -> Result<Vec<CandidateRecord>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SourceError::Status {
                    url: "http://example.invalid".to_string(),
                    status: 503,
                });
            }
            Ok(self.records.clone())
        }
    }

    /// Northern positions match a nearby fast star; southern lookups fail
    struct FakeMatcher {
        calls: Arc<AtomicUsize>,
    }

    impl CrossMatcher for FakeMatcher {
        fn name(&self) -> &str {
            "fake"
        }

        fn lookup(&self, position: &SkyPosition) -> Result<Option<CatalogMatch>, CrossMatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if position.dec_deg < 0.0 {
                return Err(CrossMatchError::Response("catalog timeout".to_string()));
            }
            Ok(Some(CatalogMatch {
                proper_motion_ra: Some(80.0),
                proper_motion_dec: Some(60.0),
                parallax: Some(2.5),
                catalog_magnitude: Some(15.3),
                separation_arcsec: Some(0.4),
            }))
        }
    }

    fn sky() -> Vec<CandidateRecord> {
        vec![
            CandidateRecord::new("AT2025a", Some(15.1), "LRN").with_coordinates("10:00:00", "+10:00:00"),
            CandidateRecord::new("AT2025b", Some(18.0), "Ia").with_coordinates("11:00:00", "-10:00:00"),
            CandidateRecord::new("AT2025c", Some(14.2), "unknown"),
            CandidateRecord::new("AT2025d", Some(19.0), "CV").with_coordinates("xx", "yy"),
            CandidateRecord::new("AT2025a", Some(20.5), "Ia"),
        ]
    }

    fn pipeline(primary: Box<dyn TransientSource>) -> Pipeline {
        Pipeline::new(primary, create_scorer(RuleSet::Baseline))
    }

    fn completed(outcome: PipelineOutcome) -> RunBundle {
        outcome.completed().expect("expected a completed run")
    }

    #[test]
    fn test_primary_success_skips_fallback() {
        let (primary, primary_calls) = FakeSource::boxed("primary", sky());
        let (fallback, fallback_calls) = FakeSource::boxed("fallback", sky());

        let bundle = completed(
            pipeline(primary)
                .with_fallback(fallback)
                .run("2025-11-06 12:00:00")
                .expect("run succeeds"),
        );

        assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
        assert_eq!(bundle.transients.len(), 4, "duplicate id removed");
        assert_eq!(bundle.transients[0].type_tag, "LRN", "first occurrence kept");
    }

    #[test]
    fn test_fallback_attempted_once() {
        let (primary, _) = FakeSource::boxed("primary", Vec::new());
        let (fallback, fallback_calls) =
            FakeSource::boxed("fallback", vec![CandidateRecord::new("AT2025z", Some(14.0), "LRN")]);

        let bundle = completed(
            pipeline(primary)
                .with_fallback(fallback)
                .run("now")
                .expect("run succeeds"),
        );

        assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
        assert_eq!(bundle.anomalies.len(), 1);
        assert_eq!(bundle.anomalies[0].id, "AT2025z");
    }

    #[test]
    fn test_no_data_when_both_sources_empty() {
        let (primary, _) = FakeSource::boxed("primary", Vec::new());
        let (fallback, fallback_calls) = FakeSource::boxed("fallback", Vec::new());

        let outcome = pipeline(primary)
            .with_fallback(fallback)
            .run("now")
            .expect("empty is not an error");

        assert!(matches!(outcome, PipelineOutcome::NoData));
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_data_without_fallback() {
        let (primary, _) = FakeSource::boxed("primary", Vec::new());
        let outcome = pipeline(primary).run("now").expect("empty is not an error");
        assert!(matches!(outcome, PipelineOutcome::NoData));
    }

    #[test]
    fn test_transport_error_propagates() {
        let (primary, _) = FakeSource::failing("primary");
        let (fallback, fallback_calls) = FakeSource::boxed("fallback", sky());

        let result = pipeline(primary).with_fallback(fallback).run("now");

        assert!(matches!(result, Err(SourceError::Status { status: 503, .. })));
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fallback_error_propagates() {
        let (primary, _) = FakeSource::boxed("primary", Vec::new());
        let (fallback, _) = FakeSource::failing("fallback");

        assert!(pipeline(primary).with_fallback(fallback).run("now").is_err());
    }

    #[test]
    fn test_enrichment_isolates_failures() {
        let (primary, _) = FakeSource::boxed("primary", sky());
        let calls = Arc::new(AtomicUsize::new(0));
        let matcher = FakeMatcher {
            calls: Arc::clone(&calls),
        };

        let bundle = completed(
            pipeline(primary)
                .with_cross_matcher(Box::new(matcher))
                .run("now")
                .expect("run succeeds"),
        );

        // malformed coordinates never reach the catalog
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let by_id = |id: &str| {
            bundle
                .transients
                .iter()
                .find(|t| t.id == id)
                .expect("transient present")
        };
        assert!(by_id("AT2025a").is_matched());
        assert!(matches!(
            by_id("AT2025b").cross_match,
            Some(CrossMatch::Unmatched { error: Some(_) })
        ));
        assert_eq!(by_id("AT2025c").cross_match, None);
        assert!(matches!(
            by_id("AT2025d").cross_match,
            Some(CrossMatch::Unmatched { error: Some(_) })
        ));

        let ids: Vec<&str> = bundle.anomalies.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["AT2025a", "AT2025c"]);
        // 3 bright + 5 LRN + 1 match + 3 proper motion + 3 distance
        assert_eq!(bundle.anomalies[0].score, 15.0);
        assert!(bundle.anomalies[0].has_catalog_match());
        assert!(bundle.report.contains("1 with Gaia matches"));
    }

    #[test]
    fn test_self_check_passes_for_both_rule_sets() {
        for rule_set in [RuleSet::Baseline, RuleSet::Extended] {
            let check = self_check(rule_set);
            assert!(check.passed, "{rule_set}");
            assert_eq!(check.anomalies, 2);
        }
    }

    #[test]
    fn test_missing_cross_matcher_marks_all_unmatched() {
        let (primary, _) = FakeSource::boxed("primary", sky());

        let bundle = completed(pipeline(primary).run("now").expect("run succeeds"));

        assert!(bundle
            .transients
            .iter()
            .all(|t| t.cross_match == Some(CrossMatch::Unmatched { error: None })));
        assert!(bundle.anomalies.iter().all(|a| !a.has_catalog_match()));
        // 3 bright + 5 LRN
        assert_eq!(bundle.anomalies[0].score, 8.0);
    }

    #[test]
    fn test_no_coordinates_skips_lookups() {
        let (primary, _) = FakeSource::boxed(
            "primary",
            vec![CandidateRecord::new("AT2025c", Some(14.2), "unknown")],
        );
        let calls = Arc::new(AtomicUsize::new(0));
        let matcher = FakeMatcher {
            calls: Arc::clone(&calls),
        };

        let bundle = completed(
            pipeline(primary)
                .with_cross_matcher(Box::new(matcher))
                .run("now")
                .expect("run succeeds"),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(bundle.transients[0].cross_match, None);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let run = |parallel: bool| {
            let (primary, _) = FakeSource::boxed("primary", sky());
            let matcher = FakeMatcher {
                calls: Arc::new(AtomicUsize::new(0)),
            };
            completed(
                pipeline(primary)
                    .with_cross_matcher(Box::new(matcher))
                    .with_parallel_enrichment(parallel)
                    .run("now")
                    .expect("run succeeds"),
            )
        };

        let sequential = run(false);
        let parallel = run(true);
        assert_eq!(sequential.transients, parallel.transients);
        assert_eq!(sequential.anomalies, parallel.anomalies);
        assert_eq!(sequential.report, parallel.report);
    }

    #[test]
    fn test_threshold_and_empty_report() {
        let (primary, _) = FakeSource::boxed("primary", sky());

        let bundle = completed(
            pipeline(primary)
                .with_threshold(100.0)
                .run("2025-11-06 12:00:00")
                .expect("run succeeds"),
        );

        assert!(bundle.anomalies.is_empty());
        assert!(bundle.report.contains(NO_ANOMALIES));
        assert_eq!(bundle.transients.len(), 4);
    }
}
