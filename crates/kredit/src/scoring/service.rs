//! The assessment lifecycle: how an application accumulates selections
//! across draft, pending, and assessed stages, and who may move it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    Actor, Application, ApplicationId, AssessmentState, ManualApplicant, Selection, SubjectRef,
    UserId,
};
use super::engine::{ensure_permitted, Aggregates, ScoringEngine};
use super::report::{assessment_report, AssessmentReport};
use super::repository::{AssessmentRepository, RepositoryError};
use super::risk::RiskBand;
use super::rubric::{CategoryView, CriteriaId, Rubric};

/// Failures surfaced by lifecycle operations. All are terminal from the
/// core's perspective; nothing here is retried.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error("scores data required")]
    EmptySelections,
    #[error("criterion {0} is outside the permitted set for this operation")]
    InvalidCriteriaSet(CriteriaId),
    #[error("application not found")]
    NotFound,
    #[error("can only assess draft applications (current state: {current})")]
    InvalidState { current: &'static str },
    #[error("all {expected} rubric criteria must be filled, got {supplied}")]
    IncompleteAssessment { expected: usize, supplied: usize },
    #[error("either a user id or manual applicant data is required, not both")]
    InvalidSubjectRef,
    #[error("role '{0}' is not permitted to perform this operation")]
    Forbidden(&'static str),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Officer one-shot creation payload. Exactly one of `user_id` and
/// `manual_applicant` must be present.
#[derive(Debug, Clone)]
pub struct OfficerCreateRequest {
    pub user_id: Option<UserId>,
    pub manual_applicant: Option<ManualApplicant>,
    pub applicant_name: Option<String>,
    pub selections: Vec<Selection>,
}

#[derive(Debug, Clone)]
pub struct OfficerUpdateRequest {
    pub applicant_name: Option<String>,
    pub selections: Vec<Selection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftReceipt {
    pub application_id: ApplicationId,
    pub application_number: String,
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssessmentReceipt {
    pub application_number: String,
    pub status: &'static str,
    pub total_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub application_number: String,
    pub total_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OfficerReceipt {
    pub application_id: ApplicationId,
    pub application_number: String,
    pub applicant_name: String,
    pub status: &'static str,
    pub total_score: f64,
    pub risk_category: RiskBand,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateReceipt {
    pub application_number: String,
    pub applicant_name: String,
    pub status: &'static str,
    pub total_score: f64,
    pub risk_category: RiskBand,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletionReceipt {
    pub application_id: ApplicationId,
    pub application_number: String,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

fn application_number(subject: &UserId) -> String {
    format!("APP-{}-{}", Utc::now().timestamp_millis(), subject.0)
}

/// Service composing the rubric, the scoring engine, and the repository.
pub struct AssessmentService<R> {
    repository: Arc<R>,
    rubric: Arc<Rubric>,
    engine: ScoringEngine,
}

impl<R> AssessmentService<R>
where
    R: AssessmentRepository + 'static,
{
    pub fn new(repository: Arc<R>, rubric: Arc<Rubric>) -> Self {
        let engine = ScoringEngine::new(rubric.clone());
        Self {
            repository,
            rubric,
            engine,
        }
    }

    /// The full ordered hierarchy for form rendering.
    pub fn rubric(&self) -> Vec<CategoryView> {
        self.rubric.full()
    }

    /// Applicant opens a draft with the early criteria subset. Partial
    /// scores are stored; full-rubric aggregates are deferred until the
    /// officer completes the assessment.
    pub fn submit_early_draft(
        &self,
        actor: &Actor,
        selections: &[Selection],
    ) -> Result<DraftReceipt, AssessmentError> {
        non_empty(selections)?;
        ensure_permitted(selections, &self.rubric.early_criteria())
            .map_err(AssessmentError::InvalidCriteriaSet)?;

        let (rows, skipped) = self.engine.resolve(selections);
        log_skipped("submit_early_draft", &skipped);

        let now = Utc::now();
        let application = Application {
            id: next_application_id(),
            application_number: application_number(&actor.subject),
            subject: SubjectRef::Registered(actor.subject.clone()),
            applicant_name: actor.subject.0.clone(),
            state: AssessmentState::Draft,
            scores: rows,
            category_subtotals: Default::default(),
            category_final_scores: Default::default(),
            total_score: 0.0,
            created_at: now,
            updated_at: now,
        };

        let stored = self.repository.insert(application)?;
        info!(
            application = %stored.application_number,
            "draft application submitted, waiting for officer assessment"
        );

        Ok(DraftReceipt {
            application_id: stored.id,
            application_number: stored.application_number,
            status: AssessmentState::Draft.label(),
        })
    }

    /// Officer supplies the later criteria subset for an existing draft.
    /// Aggregates are recomputed over the union of the draft's rows and
    /// the new ones, and the application becomes assessed.
    pub fn complete_assessment(
        &self,
        actor: &Actor,
        id: &ApplicationId,
        selections: &[Selection],
    ) -> Result<AssessmentReceipt, AssessmentError> {
        ensure_reviewer(actor)?;
        non_empty(selections)?;
        ensure_permitted(selections, &self.rubric.later_criteria())
            .map_err(AssessmentError::InvalidCriteriaSet)?;

        let mut application = self.load(id)?;
        if !matches!(application.state, AssessmentState::Draft) {
            return Err(AssessmentError::InvalidState {
                current: application.state.label(),
            });
        }

        let (rows, skipped) = self.engine.resolve(selections);
        log_skipped("complete_assessment", &skipped);
        application.scores.extend(rows);

        let aggregates = self.engine.aggregate(&application.scores);
        let risk = RiskBand::classify(aggregates.total_score);
        apply_aggregates(&mut application, aggregates);
        application.state = AssessmentState::Assessed { risk };
        application.updated_at = Utc::now();

        let receipt = AssessmentReceipt {
            application_number: application.application_number.clone(),
            status: application.state.label(),
            total_score: application.total_score,
        };
        self.repository.update(application)?;
        info!(
            application = %receipt.application_number,
            total_score = receipt.total_score,
            "assessment completed"
        );
        Ok(receipt)
    }

    /// Applicant one-shot self-assessment over any criteria subset.
    /// Lands in pending without a risk band; an officer's update is the
    /// authoritative path to an assessed state.
    pub fn direct_submit(
        &self,
        actor: &Actor,
        selections: &[Selection],
    ) -> Result<SubmissionReceipt, AssessmentError> {
        non_empty(selections)?;

        let breakdown = self.engine.compute(selections);
        log_skipped("direct_submit", &breakdown.skipped);

        let now = Utc::now();
        let mut application = Application {
            id: next_application_id(),
            application_number: application_number(&actor.subject),
            subject: SubjectRef::Registered(actor.subject.clone()),
            applicant_name: actor.subject.0.clone(),
            state: AssessmentState::Pending,
            scores: breakdown.rows,
            category_subtotals: Default::default(),
            category_final_scores: Default::default(),
            total_score: 0.0,
            created_at: now,
            updated_at: now,
        };
        apply_aggregates(&mut application, breakdown.aggregates);

        let stored = self.repository.insert(application)?;
        Ok(SubmissionReceipt {
            application_number: stored.application_number,
            total_score: stored.total_score,
        })
    }

    /// Officer creates and assesses in one shot. The batch must cover
    /// every rubric criterion.
    pub fn officer_create(
        &self,
        actor: &Actor,
        request: OfficerCreateRequest,
    ) -> Result<OfficerReceipt, AssessmentError> {
        ensure_reviewer(actor)?;

        let subject = match (request.user_id, request.manual_applicant) {
            (Some(user), None) => SubjectRef::Registered(user),
            (None, Some(manual)) => SubjectRef::Manual(manual),
            _ => return Err(AssessmentError::InvalidSubjectRef),
        };

        non_empty(&request.selections)?;
        self.require_full_rubric(&request.selections)?;

        let applicant_name = request
            .applicant_name
            .unwrap_or_else(|| subject_display_name(&subject));

        let breakdown = self.engine.compute(&request.selections);
        log_skipped("officer_create", &breakdown.skipped);
        let risk = RiskBand::classify(breakdown.aggregates.total_score);

        let now = Utc::now();
        let mut application = Application {
            id: next_application_id(),
            application_number: application_number(&actor.subject),
            subject,
            applicant_name,
            state: AssessmentState::Assessed { risk },
            scores: breakdown.rows,
            category_subtotals: Default::default(),
            category_final_scores: Default::default(),
            total_score: 0.0,
            created_at: now,
            updated_at: now,
        };
        apply_aggregates(&mut application, breakdown.aggregates);

        let stored = self.repository.insert(application)?;
        info!(
            application = %stored.application_number,
            total_score = stored.total_score,
            risk = risk.label(),
            "application created and assessed"
        );

        Ok(OfficerReceipt {
            application_id: stored.id,
            application_number: stored.application_number,
            applicant_name: stored.applicant_name,
            status: stored.state.label(),
            total_score: stored.total_score,
            risk_category: risk,
        })
    }

    /// Officer re-assesses an existing application: the full replacement
    /// of every score row, never a merge. The batch must cover every
    /// rubric criterion, and the result is always assessed.
    pub fn officer_update(
        &self,
        actor: &Actor,
        id: &ApplicationId,
        request: OfficerUpdateRequest,
    ) -> Result<UpdateReceipt, AssessmentError> {
        ensure_reviewer(actor)?;
        non_empty(&request.selections)?;
        self.require_full_rubric(&request.selections)?;

        let mut application = self.load(id)?;

        let breakdown = self.engine.compute(&request.selections);
        log_skipped("officer_update", &breakdown.skipped);
        let risk = RiskBand::classify(breakdown.aggregates.total_score);

        application.scores = breakdown.rows;
        apply_aggregates(&mut application, breakdown.aggregates);
        application.state = AssessmentState::Assessed { risk };
        if let Some(name) = request.applicant_name {
            application.applicant_name = name;
        }
        application.updated_at = Utc::now();

        let receipt = UpdateReceipt {
            application_number: application.application_number.clone(),
            applicant_name: application.applicant_name.clone(),
            status: application.state.label(),
            total_score: application.total_score,
            risk_category: risk,
        };
        self.repository.update(application)?;
        Ok(receipt)
    }

    /// Officer removes an application; its score rows go with it.
    pub fn officer_delete(
        &self,
        actor: &Actor,
        id: &ApplicationId,
    ) -> Result<DeletionReceipt, AssessmentError> {
        ensure_reviewer(actor)?;
        let removed = self.repository.remove(id).map_err(|error| match error {
            RepositoryError::NotFound => AssessmentError::NotFound,
            other => AssessmentError::Repository(other),
        })?;
        info!(application = %removed.application_number, "application deleted");
        Ok(DeletionReceipt {
            application_id: removed.id,
            application_number: removed.application_number,
        })
    }

    /// Per-category report for an application. Applicants only see their
    /// own; a foreign id is indistinguishable from a missing one.
    pub fn report(
        &self,
        actor: &Actor,
        id: &ApplicationId,
    ) -> Result<AssessmentReport, AssessmentError> {
        let application = self.load(id)?;
        if !actor.role.can_review() && !application.subject.is_owned_by(&actor.subject) {
            return Err(AssessmentError::NotFound);
        }
        Ok(assessment_report(&self.rubric, &application))
    }

    fn load(&self, id: &ApplicationId) -> Result<Application, AssessmentError> {
        self.repository
            .fetch(id)?
            .ok_or(AssessmentError::NotFound)
    }

    fn require_full_rubric(&self, selections: &[Selection]) -> Result<(), AssessmentError> {
        let expected = self.rubric.criteria_count();
        if selections.len() != expected {
            return Err(AssessmentError::IncompleteAssessment {
                expected,
                supplied: selections.len(),
            });
        }
        Ok(())
    }
}

fn non_empty(selections: &[Selection]) -> Result<(), AssessmentError> {
    if selections.is_empty() {
        return Err(AssessmentError::EmptySelections);
    }
    Ok(())
}

fn ensure_reviewer(actor: &Actor) -> Result<(), AssessmentError> {
    if actor.role.can_review() {
        Ok(())
    } else {
        Err(AssessmentError::Forbidden(actor.role.label()))
    }
}

fn apply_aggregates(application: &mut Application, aggregates: Aggregates) {
    application.category_subtotals = aggregates.category_subtotals;
    application.category_final_scores = aggregates.category_final_scores;
    application.total_score = aggregates.total_score;
}

fn subject_display_name(subject: &SubjectRef) -> String {
    match subject {
        SubjectRef::Registered(user) => user.0.clone(),
        SubjectRef::Manual(manual) => manual.name.clone(),
    }
}

fn log_skipped(operation: &'static str, skipped: &[Selection]) {
    if !skipped.is_empty() {
        warn!(
            operation,
            skipped = skipped.len(),
            "selections did not resolve against the rubric and were not applied"
        );
    }
}
