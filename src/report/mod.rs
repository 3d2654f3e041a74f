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

use crate::anomaly::scorer::RuleSet;
use crate::anomaly::Anomaly;

pub const RULE: &str =
    "================================================================================";
pub const SUB_RULE: &str = "----------------------------------------";

/// Heading of the per-object section; the top-discoveries packager looks for it
pub const ANOMALY_SECTION: &str = "HIGH-PRIORITY ANOMALIES";
pub const NO_ANOMALIES: &str = "No high-priority anomalies found.";

/// How many anomalies get a follow-up recommendation
pub const FOLLOW_UP_COUNT: usize = 3;

/// Follow-up priority tier, derived from the score alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 7.0 {
            Self::High
        } else if score >= 5.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }

    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::High => "🔴",
            Self::Medium => "🟡",
            Self::Low => "🟢",
        }
    }

    #[must_use]
    pub const fn instrument(self) -> &'static str {
        match self {
            Self::High | Self::Medium => "Low-res spectrograph",
            Self::Low => "Photometry (monitoring)",
        }
    }

    /// Exposure band for spectroscopy; photometric monitoring has none
    #[must_use]
    pub const fn exposure(self) -> Option<&'static str> {
        match self {
            Self::High => Some("300-600s"),
            Self::Medium => Some("600-900s"),
            Self::Low => None,
        }
    }

    #[must_use]
    pub const fn action(self) -> &'static str {
        match self {
            Self::High => "Immediate spectroscopy required",
            Self::Medium => "Spectroscopic classification needed",
            Self::Low => "Monitor and follow up as needed",
        }
    }
}

/// Broad science case for a type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScienceCategory {
    LuminousRedNova,
    CataclysmicVariable,
    Supernova,
    Unclassified,
}

impl ScienceCategory {
    #[must_use]
    pub fn from_type_tag(type_tag: &str) -> Self {
        if type_tag.contains("LRN") {
            Self::LuminousRedNova
        } else if type_tag.contains("CV") {
            Self::CataclysmicVariable
        } else if ["Ia", "II", "Ib", "Ic"].iter().any(|sn| type_tag.contains(sn)) {
            Self::Supernova
        } else {
            Self::Unclassified
        }
    }

    /// One-line opportunity statement for the extended report
    #[must_use]
    pub const fn opportunity(self) -> &'static str {
        match self {
            Self::LuminousRedNova => {
                "Luminous red novae: catch a stellar merger early, fewer than 20 are known"
            }
            Self::CataclysmicVariable => {
                "Cataclysmic variables: accretion physics from an unusually bright outburst"
            }
            Self::Supernova => "Supernovae: bright events for distance-ladder and progenitor studies",
            Self::Unclassified => {
                "Unclassified transients: spectroscopy may reveal a new or rare class"
            }
        }
    }
}

fn line(out: &mut String, text: &str) {
    out.push_str(text);
    out.push('\n');
}

/// Renders the ranked anomaly list into the plain-text discovery report
pub struct ReportRenderer {
    rule_set: RuleSet,
    follow_up_count: usize,
}

impl ReportRenderer {
    #[must_use]
    pub const fn new(rule_set: RuleSet) -> Self {
        Self {
            rule_set,
            follow_up_count: FOLLOW_UP_COUNT,
        }
    }

    /// Number of top anomalies that get a follow-up recommendation
    #[must_use]
    pub const fn with_follow_up_count(mut self, count: usize) -> Self {
        self.follow_up_count = count;
        self
    }

    const fn title(&self) -> &'static str {
        match self.rule_set {
            RuleSet::Baseline => "ASTRA ENHANCED DISCOVERY REPORT",
            RuleSet::Extended => "ASTRA ADVANCED DISCOVERY REPORT",
        }
    }

    const fn follow_up_heading(&self) -> &'static str {
        match self.rule_set {
            RuleSet::Baseline => "FOLLOW-UP RECOMMENDATIONS",
            RuleSet::Extended => "IMMEDIATE FOLLOW-UP REQUIRED",
        }
    }

    /// Render `anomalies` in the order given. `generated_at` is printed as is.
    #[must_use]
    pub fn render(&self, anomalies: &[Anomaly], generated_at: &str) -> String {
        let mut out = String::new();
        line(&mut out, RULE);
        line(&mut out, self.title());
        line(&mut out, &format!("Generated: {generated_at}"));
        line(&mut out, RULE);
        out.push('\n');

        if anomalies.is_empty() {
            out.push_str(NO_ANOMALIES);
            out.push('\n');
            return out;
        }

        let with_coords = anomalies.iter().filter(|a| a.coordinates.is_some()).count();
        let with_gaia = anomalies.iter().filter(|a| a.has_catalog_match()).count();
        let summary = format!(
            "Summary: {} anomalies, {with_coords} with coordinates, {with_gaia} with Gaia matches",
            anomalies.len()
        );
        line(&mut out, &summary);
        out.push('\n');

        line(&mut out, ANOMALY_SECTION);
        line(&mut out, SUB_RULE);
        out.push('\n');
        for (rank, anomaly) in anomalies.iter().enumerate() {
            render_anomaly(&mut out, rank + 1, anomaly);
        }

        line(&mut out, self.follow_up_heading());
        line(&mut out, SUB_RULE);
        out.push('\n');
        for (rank, anomaly) in anomalies.iter().take(self.follow_up_count).enumerate() {
            self.render_follow_up(&mut out, rank + 1, anomaly);
        }

        if self.rule_set == RuleSet::Extended {
            render_science_opportunities(&mut out, anomalies);
        }

        out
    }

    fn render_follow_up(&self, out: &mut String, rank: usize, anomaly: &Anomaly) {
        let priority = Priority::from_score(anomaly.score);
        line(out, &format!("{rank}. {}:", anomaly.id));
        let priority_line = match self.rule_set {
            RuleSet::Baseline => format!("   Priority: {}", priority.label()),
            RuleSet::Extended => format!("   Priority: {} {}", priority.marker(), priority.label()),
        };
        line(out, &priority_line);
        line(out, &format!("   Instrument: {}", priority.instrument()));
        if let Some(exposure) = priority.exposure() {
            line(out, &format!("   Exposure: {exposure}"));
        }
        line(out, "   Goal: Classification and redshift");
        out.push('\n');
    }
}

fn render_anomaly(out: &mut String, rank: usize, anomaly: &Anomaly) {
    line(out, &format!("{rank}. {} (Score: {:.1}/10.0)", anomaly.id, anomaly.score));
    line(out, &format!("   Magnitude: {}", format_magnitude(anomaly.magnitude)));
    line(out, &format!("   Type: {}", anomaly.type_tag));

    if let Some(coords) = &anomaly.coordinates {
        line(out, &format!("   Position: {} {}", coords.ra, coords.dec));
    }

    line(out, &format!("   Reasons: {}", anomaly.reasons.join(", ")));

    if let Some(catalog) = &anomaly.catalog {
        let gaia = catalog.catalog_magnitude.map_or_else(
            || "   Gaia: matched (no G magnitude)".to_string(),
            |g| format!("   Gaia: G={g:.1}"),
        );
        line(out, &gaia);
        if let Some(distance) = catalog.distance_pc() {
            line(out, &format!("   Distance: ~{distance:.0} pc"));
        }
        if let Some(pm) = catalog.total_proper_motion() {
            line(out, &format!("   Proper Motion: {pm:.0} mas/yr"));
        }
    }

    out.push('\n');
}

fn render_science_opportunities(out: &mut String, anomalies: &[Anomaly]) {
    line(out, "SCIENCE OPPORTUNITIES");
    line(out, SUB_RULE);
    out.push('\n');

    let mut seen = Vec::new();
    for anomaly in anomalies {
        let category = ScienceCategory::from_type_tag(&anomaly.type_tag);
        if !seen.contains(&category) {
            seen.push(category);
            line(out, &format!("- {}", category.opportunity()));
        }
    }
    out.push('\n');
}

/// Magnitude with one decimal, or "unknown"
#[must_use]
pub fn format_magnitude(magnitude: Option<f64>) -> String {
    magnitude
        .filter(|m| m.is_finite())
        .map_or_else(|| "unknown".to_string(), |m| format!("{m:.1}"))
}

/// Short run summary for the console and `summary.txt`
#[must_use]
pub fn render_summary(transient_count: usize, anomalies: &[Anomaly], rule_set: RuleSet) -> String {
    let mut out = String::new();
    line(&mut out, &format!("ASTRA {} Discovery Summary", rule_set.title()));
    line(&mut out, SUB_RULE);
    line(&mut out, &format!("Transients analyzed: {transient_count}"));
    line(&mut out, &format!("High-priority anomalies: {}", anomalies.len()));

    if let Some(top) = anomalies.first() {
        out.push('\n');
        line(&mut out, &format!("Top anomaly: {} (Score: {:.1})", top.id, top.score));
        line(&mut out, &format!("   Magnitude: {}", format_magnitude(top.magnitude)));
        line(&mut out, &format!("   Type: {}", top.type_tag));
        line(&mut out, &format!("   Reasons: {}", top.reasons.join(", ")));
    }

    out
}
