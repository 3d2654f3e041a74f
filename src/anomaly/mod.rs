pub mod baseline;
pub mod extended;
pub mod rules;
pub mod scorer;
pub mod selector;

use baseline::BaselineScorer;
use extended::ExtendedScorer;
use scorer::{AnomalyScorer, RuleSet};

pub use scorer::ScoreCard;
pub use selector::{select, Anomaly, DEFAULT_THRESHOLD};

/// Create the scorer implementing the requested rubric
#[must_use]
pub fn create_scorer(rule_set: RuleSet) -> Box<dyn AnomalyScorer> {
    match rule_set {
        RuleSet::Baseline => Box::new(BaselineScorer::new()),
        RuleSet::Extended => Box::new(ExtendedScorer::new()),
    }
}
