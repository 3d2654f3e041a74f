use crate::anomaly::rules::{
    first_token_match, RuleTable, COORDINATES_WEIGHT, EXTENDED, RARE_TYPES, UNUSUAL_TYPES,
};
use crate::anomaly::scorer::{AnomalyScorer, RuleSet, ScoreCard};
use crate::candidate::CandidateRecord;

/// Extended rubric: finer class tables (rare vs unusual subtypes), a bonus for
/// a reported position and stricter kinematic tiers. See [`EXTENDED`] for how
/// its thresholds differ from the baseline.
pub struct ExtendedScorer {
    rules: RuleTable,
}

impl ExtendedScorer {
    #[must_use]
    pub const fn new() -> Self {
        Self { rules: EXTENDED }
    }

    fn score_type(&self, candidate: &CandidateRecord, card: &mut ScoreCard) {
        let tag = candidate.type_tag.as_str();

        if candidate.has_unknown_type() {
            card.add(self.rules.unknown_type_weight, "Unclassified transient");
        }

        if let Some((token, weight)) = first_token_match(tag, &RARE_TYPES) {
            card.add(weight, format!("Rare type: {token}"));
        } else if let Some((token, weight)) = first_token_match(tag, &UNUSUAL_TYPES) {
            card.add(weight, format!("Unusual type: {token}"));
        }

        if tag.contains("CV")
            && candidate
                .known_magnitude()
                .is_some_and(|m| m < self.rules.cv_bright_below)
        {
            card.add(self.rules.cv_weight, "CV in unusual outburst");
        }
    }
}

impl Default for ExtendedScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl AnomalyScorer for ExtendedScorer {
    fn rule_set(&self) -> RuleSet {
        RuleSet::Extended
    }

    fn score(&self, candidate: &CandidateRecord) -> ScoreCard {
        let rules = &self.rules;
        let mut card = ScoreCard::default();

        if let Some(m) = candidate.known_magnitude() {
            let b = &rules.brightness;
            if m < b.extreme_below {
                card.add(b.extreme_weight, format!("Exceptionally bright (m={m:.1})"));
            } else if m < b.bright_below {
                card.add(b.bright_weight, format!("Very bright (m={m:.1})"));
            } else if m > b.faint_above {
                card.add(b.faint_weight, format!("Extremely faint (m={m:.1})"));
            }
        }

        self.score_type(candidate, &mut card);

        if candidate.coordinates.is_some() {
            card.add(COORDINATES_WEIGHT, "Precise position reported");
        }

        if let Some(catalog) = candidate.catalog_match() {
            card.add(rules.catalog_match_weight, "Catalog counterpart (stellar object)");

            if let Some(pm) = catalog.total_proper_motion() {
                if pm > rules.motion.fast_above {
                    card.add(
                        rules.motion.fast_weight,
                        format!("Extreme proper motion ({pm:.0} mas/yr)"),
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
                        format!("Within 100 pc ({distance:.0} pc)"),
                    );
                } else if distance < rules.distance.near_below_pc {
                    card.add(rules.distance.near_weight, format!("Nearby ({distance:.0} pc)"));
                }
            }
        }

        card
    }
}
