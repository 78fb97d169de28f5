//! Weighted credit scoring: the immutable rubric, the scoring engine,
//! the risk classifier, and the assessment lifecycle around them.

pub mod domain;
pub(crate) mod engine;
pub mod report;
pub mod repository;
pub mod risk;
pub mod router;
pub mod rubric;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Actor, Application, ApplicationId, ApplicationScore, AssessmentState, ManualApplicant, Role,
    Selection, SubjectRef, UserId,
};
pub use engine::{Aggregates, ScoreBreakdown, ScoringEngine};
pub use report::{AssessmentReport, CategoryBreakdown, ReportItem};
pub use repository::{AssessmentRepository, RepositoryError};
pub use risk::RiskBand;
pub use router::assessment_router;
pub use rubric::{
    Category, CategoryId, CategoryView, CriteriaId, Criterion, Rubric, RubricError, ScoreOption,
    ScoreOptionId,
};
pub use service::{
    AssessmentError, AssessmentReceipt, AssessmentService, DeletionReceipt, DraftReceipt,
    OfficerCreateRequest, OfficerReceipt, OfficerUpdateRequest, SubmissionReceipt, UpdateReceipt,
};
