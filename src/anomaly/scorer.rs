use crate::candidate::CandidateRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which rubric a scorer implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSet {
    #[default]
    Baseline,
    Extended,
}

impl RuleSet {
    /// Lowercase name used for file names and config
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Extended => "extended",
        }
    }

    /// Capitalized name for headings
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Baseline => "Baseline",
            Self::Extended => "Extended",
        }
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "baseline" | "basic" => Ok(Self::Baseline),
            "extended" | "advanced" => Ok(Self::Extended),
            other => Err(format!("unknown rule set '{other}' (expected baseline or extended)")),
        }
    }
}

/// Additive score plus the reasons that produced it, in rule order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub score: f64,
    pub reasons: Vec<String>,
}

impl ScoreCard {
    /// Record a fired rule. Weights are always positive, which keeps
    /// `reasons.is_empty()` equivalent to `score == 0`.
    pub fn add(&mut self, weight: f64, reason: impl Into<String>) {
        debug_assert!(weight > 0.0, "rule weights must be positive");
        self.score += weight;
        self.reasons.push(reason.into());
    }
}

/// A rubric that rates how interesting a transient is.
///
/// Implementations are pure: the same record always yields the same card and
/// missing data simply means fewer rules fire.
pub trait AnomalyScorer: Send + Sync {
    fn rule_set(&self) -> RuleSet;

    fn score(&self, candidate: &CandidateRecord) -> ScoreCard;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_set_from_str() {
        assert_eq!("baseline".parse::<RuleSet>(), Ok(RuleSet::Baseline));
        assert_eq!("Advanced".parse::<RuleSet>(), Ok(RuleSet::Extended));
        assert!("fancy".parse::<RuleSet>().is_err());
    }

    #[test]
    fn test_score_card_accumulates() {
        let mut card = ScoreCard::default();
        card.add(3.0, "Very bright (m=15.1)");
        card.add(5.0, "Luminous Red Nova (rare stellar merger)");
        assert_eq!(card.score, 8.0);
        assert_eq!(card.reasons.len(), 2);
    }
}
