//! The weighted scoring engine.
//!
//! Pure with respect to the rubric it holds: the same selection set
//! always produces the same rows and aggregates. Aggregates are always
//! recomputed from the full authoritative row set, never incremented in
//! place.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{ApplicationScore, Selection};
use super::rubric::{CategoryId, CriteriaId, Rubric};

/// Derived category and total figures for a set of resolved rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregates {
    pub category_subtotals: BTreeMap<CategoryId, f64>,
    pub category_final_scores: BTreeMap<CategoryId, f64>,
    pub total_score: f64,
}

/// Outcome of scoring one selection batch. Selections that did not
/// resolve against the rubric are surfaced in `skipped` rather than
/// failing the batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub rows: Vec<ApplicationScore>,
    pub skipped: Vec<Selection>,
    pub aggregates: Aggregates,
}

/// Guard a raw batch against the criteria permitted for the current
/// operation. Runs before resolution, so ids unknown to the rubric are
/// rejected here too when supplied out of range. Returns the first
/// offending criterion id.
pub(crate) fn ensure_permitted(
    selections: &[Selection],
    permitted: &BTreeSet<CriteriaId>,
) -> Result<(), CriteriaId> {
    match selections
        .iter()
        .find(|selection| !permitted.contains(&selection.criteria_id))
    {
        Some(selection) => Err(selection.criteria_id),
        None => Ok(()),
    }
}

/// Stateless evaluator applying the rubric to selection batches.
pub struct ScoringEngine {
    rubric: Arc<Rubric>,
}

impl ScoringEngine {
    pub fn new(rubric: Arc<Rubric>) -> Self {
        Self { rubric }
    }

    /// Resolve each selection to a weighted score row. Pairs whose
    /// criterion or option is unknown, or where the option belongs to a
    /// different criterion, are skipped, not fatal.
    pub fn resolve(&self, selections: &[Selection]) -> (Vec<ApplicationScore>, Vec<Selection>) {
        let mut rows = Vec::with_capacity(selections.len());
        let mut skipped = Vec::new();

        for selection in selections {
            let (criterion, option) = match (
                self.rubric.criterion(selection.criteria_id),
                self.rubric.score_option(selection.score_option_id),
            ) {
                (Some(criterion), Some(option)) if option.criteria_id == criterion.id => {
                    (criterion, option)
                }
                _ => {
                    skipped.push(selection.clone());
                    continue;
                }
            };

            let weighted_score = f64::from(option.score) * criterion.weight / 100.0;
            rows.push(ApplicationScore {
                criteria_id: criterion.id,
                score_option_id: option.id,
                raw_score: option.score,
                criteria_weight: criterion.weight,
                weighted_score,
            });
        }

        (rows, skipped)
    }

    /// Recompute all aggregates from the full row set: per-category sum
    /// of weighted scores, category finals, and the total.
    pub fn aggregate(&self, rows: &[ApplicationScore]) -> Aggregates {
        let mut category_subtotals: BTreeMap<CategoryId, f64> = BTreeMap::new();

        for row in rows {
            let Some(criterion) = self.rubric.criterion(row.criteria_id) else {
                continue;
            };
            *category_subtotals
                .entry(criterion.category_id)
                .or_insert(0.0) += row.weighted_score;
        }

        let mut category_final_scores = BTreeMap::new();
        let mut total_score = 0.0;
        for (&category_id, &subtotal) in &category_subtotals {
            let weight = self
                .rubric
                .category(category_id)
                .map(|category| category.weight)
                .unwrap_or(0.0);
            let final_score = subtotal * weight / 100.0;
            debug!(
                %category_id,
                subtotal,
                weight,
                final_score,
                "category aggregate recomputed"
            );
            category_final_scores.insert(category_id, final_score);
            total_score += final_score;
        }

        debug!(rows = rows.len(), total_score, "total score recomputed");

        Aggregates {
            category_subtotals,
            category_final_scores,
            total_score,
        }
    }

    /// Resolve and aggregate one batch in a single pass. An empty or
    /// fully-unresolved batch yields all-zero aggregates; that is not an
    /// error at this layer.
    pub fn compute(&self, selections: &[Selection]) -> ScoreBreakdown {
        let (rows, skipped) = self.resolve(selections);
        let aggregates = self.aggregate(&rows);
        ScoreBreakdown {
            rows,
            skipped,
            aggregates,
        }
    }
}
