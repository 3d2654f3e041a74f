use crate::anomaly::rules::{RuleTable, BASELINE, LRN_WEIGHT};
use crate::anomaly::scorer::{AnomalyScorer, RuleSet, ScoreCard};
use crate::candidate::CandidateRecord;

/// The canonical rubric: brightness, unknown class, LRN, bright CVs and Gaia
/// kinematics.
pub struct BaselineScorer {
    rules: RuleTable,
}

impl BaselineScorer {
    #[must_use]
    pub const fn new() -> Self {
        Self { rules: BASELINE }
    }
}

impl Default for BaselineScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl AnomalyScorer for BaselineScorer {
    fn rule_set(&self) -> RuleSet {
        RuleSet::Baseline
    }

    fn score(&self, candidate: &CandidateRecord) -> ScoreCard {
        let rules = &self.rules;
        let mut card = ScoreCard::default();
        let magnitude = candidate.known_magnitude();

        if let Some(m) = magnitude {
            let b = &rules.brightness;
            if m < b.extreme_below {
                card.add(b.extreme_weight, format!("Extremely bright (m={m:.1})"));
            } else if m < b.bright_below {
                card.add(b.bright_weight, format!("Very bright (m={m:.1})"));
            } else if m > b.faint_above {
                card.add(b.faint_weight, format!("Very faint (m={m:.1})"));
            }
        }

        if candidate.has_unknown_type() {
            card.add(rules.unknown_type_weight, "Unknown classification");
        }

        if candidate.type_tag.contains("LRN") {
            card.add(LRN_WEIGHT, "Luminous Red Nova (rare stellar merger)");
        }

        if candidate.type_tag.contains("CV") && magnitude.is_some_and(|m| m < rules.cv_bright_below) {
            card.add(rules.cv_weight, "CV at unusual brightness");
        }

        if let Some(catalog) = candidate.catalog_match() {
            card.add(rules.catalog_match_weight, "Gaia match (stellar object)");

            if let Some(pm) = catalog.total_proper_motion() {
                if pm > rules.motion.fast_above {
                    card.add(
                        rules.motion.fast_weight,
                        format!("Very high proper motion ({pm:.0} mas/yr)"),
                    );
                } else if pm > rules.motion.high_above {
                    card.add(
                        rules.motion.high_weight,
                        format!("High proper motion ({pm:.0} mas/yr)"),
                    );
                }
            }

            if let Some(distance) = catalog.distance_pc() {
                if distance < rules.distance.very_near_below_pc {
                    card.add(
                        rules.distance.very_near_weight,
                        format!("Very nearby ({distance:.0} pc)"),
                    );
                } else if distance < rules.distance.near_below_pc {
                    card.add(rules.distance.near_weight, format!("Nearby ({distance:.0} pc)"));
                }
            }
        }

        card
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{CatalogMatch, CrossMatch};

    fn matched(catalog: CatalogMatch) -> CandidateRecord {
        CandidateRecord::new("AT2025gaia", Some(18.0), "Ia").with_cross_match(CrossMatch::Matched(catalog))
    }

    #[test]
    fn test_bright_lrn() {
        let card = BaselineScorer::new().score(&CandidateRecord::new("AT2025abao", Some(15.1), "LRN"));
        assert_eq!(card.score, 8.0);
        assert_eq!(
            card.reasons,
            vec![
                "Very bright (m=15.1)".to_string(),
                "Luminous Red Nova (rare stellar merger)".to_string(),
            ]
        );
    }

    #[test]
    fn test_ordinary_supernova_scores_zero() {
        let card = BaselineScorer::new().score(&CandidateRecord::new("SN2025abc", Some(18.5), "Ia"));
        assert_eq!(card.score, 0.0);
        assert!(card.reasons.is_empty());
    }

    #[test]
    fn test_brightness_tiers() {
        let scorer = BaselineScorer::new();
        let score = |m: f64| scorer.score(&CandidateRecord::new("AT", Some(m), "Ia")).score;
        assert_eq!(score(14.99), 4.0);
        assert_eq!(score(15.0), 3.0);
        assert_eq!(score(15.99), 3.0);
        assert_eq!(score(16.0), 0.0);
        assert_eq!(score(20.0), 0.0);
        assert_eq!(score(20.01), 2.0);
    }

    #[test]
    fn test_unknown_sentinels_are_exact() {
        let scorer = BaselineScorer::new();
        assert_eq!(scorer.score(&CandidateRecord::new("AT", None, "unknown")).score, 2.0);
        assert_eq!(scorer.score(&CandidateRecord::new("AT", None, "unk")).score, 2.0);
        assert_eq!(scorer.score(&CandidateRecord::new("AT", None, "Unknown")).score, 0.0);
        assert_eq!(scorer.score(&CandidateRecord::new("AT", None, "")).score, 0.0);
    }

    #[test]
    fn test_cv_needs_known_bright_magnitude() {
        let scorer = BaselineScorer::new();
        let bright = scorer.score(&CandidateRecord::new("AT", Some(15.5), "CV"));
        assert_eq!(bright.score, 7.0);
        assert!(bright.reasons.contains(&"CV at unusual brightness".to_string()));

        assert_eq!(scorer.score(&CandidateRecord::new("AT", None, "CV")).score, 0.0);
        assert_eq!(scorer.score(&CandidateRecord::new("AT", Some(17.0), "CV")).score, 0.0);
    }

    #[test]
    fn test_missing_magnitude_lrn_still_scores() {
        let card = BaselineScorer::new().score(&CandidateRecord::new("AT", None, "LRN"));
        assert_eq!(card.score, 5.0);
    }

    #[test]
    fn test_proper_motion_boundary_is_strict() {
        let card = BaselineScorer::new().score(&matched(CatalogMatch {
            proper_motion_ra: Some(80.0),
            proper_motion_dec: Some(60.0),
            ..CatalogMatch::default()
        }));
        assert_eq!(card.score, 4.0);
        assert_eq!(card.reasons[1], "High proper motion (100 mas/yr)");
    }

    #[test]
    fn test_very_high_proper_motion_and_distance() {
        let card = BaselineScorer::new().score(&matched(CatalogMatch {
            proper_motion_ra: Some(120.0),
            proper_motion_dec: Some(0.0),
            parallax: Some(2.5),
            catalog_magnitude: Some(17.9),
            separation_arcsec: Some(0.4),
        }));
        // match 1 + pm 4 + 400 pc 3
        assert_eq!(card.score, 8.0);
        assert_eq!(card.reasons[2], "Very nearby (400 pc)");
    }

    #[test]
    fn test_nearby_tier_and_missing_component() {
        let card = BaselineScorer::new().score(&matched(CatalogMatch {
            proper_motion_ra: Some(500.0),
            parallax: Some(1.25),
            ..CatalogMatch::default()
        }));
        assert_eq!(card.score, 3.0);
        assert_eq!(card.reasons, vec!["Gaia match (stellar object)", "Nearby (800 pc)"]);
    }

    #[test]
    fn test_unmatched_cross_match_adds_nothing() {
        let record = CandidateRecord::new("AT", Some(18.0), "Ia")
            .with_cross_match(CrossMatch::Unmatched { error: Some("timeout".into()) });
        assert_eq!(BaselineScorer::new().score(&record).score, 0.0);
    }
}
