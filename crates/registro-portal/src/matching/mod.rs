//! Requirements coverage for a single candidate.

mod normalizer;

pub use normalizer::normalize_requirement;
pub(crate) use normalizer::fold_diacritics;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::catalog::{GroupRequirements, RequirementsCatalog, DEFAULT_LEVELS};
use crate::records::CandidateRecord;

/// Matched and unmatched items of one checklist category, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub matched: Vec<String>,
    pub unmatched: Vec<String>,
}

impl CategoryBreakdown {
    fn evaluate<'a, I>(items: I, claimed: &HashSet<String>) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut breakdown = Self::default();
        for item in items {
            if claimed.contains(&normalize_requirement(item)) {
                breakdown.matched.push(item.to_string());
            } else {
                breakdown.unmatched.push(item.to_string());
            }
        }
        breakdown
    }

    pub fn total(&self) -> usize {
        self.matched.len() + self.unmatched.len()
    }
}

/// Coverage of a record against its group's checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Catalog title the record resolved to, if any.
    pub group: Option<String>,
    pub obligatorio: CategoryBreakdown,
    pub deseable: CategoryBreakdown,
    pub niveles: CategoryBreakdown,
    /// Whether `niveles` contributes to `matched_count`/`total_items`.
    pub levels_scored: bool,
    pub matched_count: usize,
    pub total_items: usize,
    pub match_percent: u8,
}

/// Cross-references `record.fulfilled` against the catalog entry named by `record.grupo`.
///
/// Unknown or missing groups behave like a group with no requirements. Default experience
/// tiers are reported but only scored when the group configures its own levels.
pub fn evaluate(record: &CandidateRecord, catalog: &RequirementsCatalog) -> MatchResult {
    let claimed: HashSet<String> = record
        .fulfilled
        .iter()
        .map(|item| normalize_requirement(item))
        .filter(|item| !item.is_empty())
        .collect();

    let group = record
        .group_title()
        .and_then(|title| catalog.by_title(title));

    match group {
        Some(group) => evaluate_group(group, &claimed),
        None => MatchResult {
            group: None,
            obligatorio: CategoryBreakdown::default(),
            deseable: CategoryBreakdown::default(),
            niveles: CategoryBreakdown::evaluate(DEFAULT_LEVELS, &claimed),
            levels_scored: false,
            matched_count: 0,
            total_items: 0,
            match_percent: 0,
        },
    }
}

fn evaluate_group(group: &GroupRequirements, claimed: &HashSet<String>) -> MatchResult {
    let obligatorio =
        CategoryBreakdown::evaluate(group.obligatorio.iter().map(String::as_str), claimed);
    let deseable = CategoryBreakdown::evaluate(group.deseable.iter().map(String::as_str), claimed);
    let niveles = CategoryBreakdown::evaluate(group.levels(), claimed);
    let levels_scored = group.has_custom_levels();

    let mut matched_count = obligatorio.matched.len() + deseable.matched.len();
    let mut total_items = obligatorio.total() + deseable.total();
    if levels_scored {
        matched_count += niveles.matched.len();
        total_items += niveles.total();
    }

    MatchResult {
        group: Some(group.title.clone()),
        obligatorio,
        deseable,
        niveles,
        levels_scored,
        matched_count,
        total_items,
        match_percent: percentage(matched_count, total_items),
    }
}

/// `round(matched / total * 100)`, zero for an empty checklist.
pub fn percentage(matched: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (matched as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}
