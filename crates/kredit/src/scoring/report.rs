//! Per-category assessment report built from an application's stored
//! score rows joined back to the rubric.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::domain::Application;
use super::risk::RiskBand;
use super::rubric::{CategoryId, Rubric};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentReport {
    pub application_number: String,
    pub applicant_name: String,
    pub total_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_category: Option<RiskBand>,
    pub created_at: DateTime<Utc>,
    pub report: Vec<CategoryBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub category_id: CategoryId,
    pub category_name: String,
    pub category_weight: f64,
    pub items: Vec<ReportItem>,
    /// Recomputed from the stored rows, independent of the persisted
    /// subtotals, as a consistency cross-check.
    pub total_weighted_score: f64,
    pub final_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportItem {
    pub criteria_name: String,
    pub criteria_weight: f64,
    pub selected_option: String,
    pub score: i32,
    pub weighted_score: f64,
}

/// Group the stored rows by owning category, ascending by category id.
/// Rows that no longer resolve against the rubric are left out, matching
/// the engine's leniency.
pub fn assessment_report(rubric: &Rubric, application: &Application) -> AssessmentReport {
    let mut by_category: BTreeMap<CategoryId, CategoryBreakdown> = BTreeMap::new();

    for row in &application.scores {
        let Some(criterion) = rubric.criterion(row.criteria_id) else {
            continue;
        };
        let Some(option) = rubric.score_option(row.score_option_id) else {
            continue;
        };
        let Some(category) = rubric.category(criterion.category_id) else {
            continue;
        };

        let breakdown = by_category
            .entry(category.id)
            .or_insert_with(|| CategoryBreakdown {
                category_id: category.id,
                category_name: category.name.clone(),
                category_weight: category.weight,
                items: Vec::new(),
                total_weighted_score: 0.0,
                final_score: 0.0,
            });

        breakdown.items.push(ReportItem {
            criteria_name: criterion.name.clone(),
            criteria_weight: row.criteria_weight,
            selected_option: option.description.clone(),
            score: row.raw_score,
            weighted_score: row.weighted_score,
        });
        breakdown.total_weighted_score += row.weighted_score;
    }

    let report = by_category
        .into_values()
        .map(|mut breakdown| {
            breakdown.final_score =
                breakdown.total_weighted_score * breakdown.category_weight / 100.0;
            breakdown
        })
        .collect();

    AssessmentReport {
        application_number: application.application_number.clone(),
        applicant_name: application.applicant_name.clone(),
        total_score: application.total_score,
        risk_category: application.state.risk(),
        created_at: application.created_at,
        report,
    }
}
