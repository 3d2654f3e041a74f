//! Calibrated thresholds for the two rubrics.
//!
//! The numbers encode domain calibration (magnitude limits, proper motion in
//! mas/yr, parallax distance in parsec). Scorers read them from here and never
//! carry literals of their own, so every divergence between the rubrics is
//! visible side by side.

/// Brightness tiers. Tiers are exclusive and evaluated top to bottom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightnessRules {
    pub extreme_below: f64,
    pub extreme_weight: f64,
    pub bright_below: f64,
    pub bright_weight: f64,
    pub faint_above: f64,
    pub faint_weight: f64,
}

/// Proper motion tiers, strict `>` comparisons in mas/yr
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionRules {
    pub fast_above: f64,
    pub fast_weight: f64,
    pub high_above: f64,
    pub high_weight: f64,
}

/// Parallax distance tiers, strict `<` comparisons in parsec
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceRules {
    pub very_near_below_pc: f64,
    pub very_near_weight: f64,
    pub near_below_pc: f64,
    pub near_weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleTable {
    pub brightness: BrightnessRules,
    pub unknown_type_weight: f64,
    /// A cataclysmic variable only counts when brighter than this
    pub cv_bright_below: f64,
    pub cv_weight: f64,
    pub catalog_match_weight: f64,
    pub motion: MotionRules,
    pub distance: DistanceRules,
}

/// Weight for a "LRN" type tag in the baseline rubric
pub const LRN_WEIGHT: f64 = 5.0;

/// The canonical rubric
pub const BASELINE: RuleTable = RuleTable {
    brightness: BrightnessRules {
        extreme_below: 15.0,
        extreme_weight: 4.0,
        bright_below: 16.0,
        bright_weight: 3.0,
        faint_above: 20.0,
        faint_weight: 2.0,
    },
    unknown_type_weight: 2.0,
    cv_bright_below: 16.0,
    cv_weight: 4.0,
    catalog_match_weight: 1.0,
    motion: MotionRules {
        fast_above: 100.0,
        fast_weight: 4.0,
        high_above: 50.0,
        high_weight: 3.0,
    },
    distance: DistanceRules {
        very_near_below_pc: 500.0,
        very_near_weight: 3.0,
        near_below_pc: 1000.0,
        near_weight: 2.0,
    },
};

/// The extended rubric. Differs from [`BASELINE`] in the brightness cut-offs,
/// the proper motion tiers (200/100 instead of 100/50) and the distance tiers
/// (100/500 pc instead of 500/1000 pc).
pub const EXTENDED: RuleTable = RuleTable {
    brightness: BrightnessRules {
        extreme_below: 14.0,
        extreme_weight: 4.0,
        bright_below: 16.0,
        bright_weight: 3.0,
        faint_above: 21.0,
        faint_weight: 2.5,
    },
    unknown_type_weight: 2.0,
    cv_bright_below: 16.0,
    cv_weight: 4.0,
    catalog_match_weight: 1.0,
    motion: MotionRules {
        fast_above: 200.0,
        fast_weight: 4.0,
        high_above: 100.0,
        high_weight: 3.0,
    },
    distance: DistanceRules {
        very_near_below_pc: 100.0,
        very_near_weight: 3.0,
        near_below_pc: 500.0,
        near_weight: 2.0,
    },
};

/// Rare classes in the extended rubric, first match wins
pub const RARE_TYPES: [(&str, f64); 5] = [
    ("LRN", 5.0),
    ("TDE", 4.0),
    ("Ibn", 4.0),
    ("Icn", 4.0),
    ("FBOT", 4.0),
];

/// Unusual subtypes, only considered when no rare class matched
pub const UNUSUAL_TYPES: [(&str, f64); 5] = [
    ("SLSN", 2.0),
    ("IIn", 1.5),
    ("Iax", 2.0),
    ("Ca-rich", 2.0),
    ("ILRT", 2.0),
];

/// Extended rubric bonus for a reported position
pub const COORDINATES_WEIGHT: f64 = 0.5;

/// First token from `table` that occurs in `type_tag` (case-sensitive)
#[must_use]
pub fn first_token_match(
    type_tag: &str,
    table: &'static [(&'static str, f64)],
) -> Option<(&'static str, f64)> {
    table
        .iter()
        .copied()
        .find(|(token, _)| type_tag.contains(token))
}
