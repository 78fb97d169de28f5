//! HTTP facade over the assessment service. Identity arrives as the
//! `{subject, role}` pair issued by the external identity provider,
//! carried in headers and resolved into an [`Actor`] exactly once.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Actor, ApplicationId, ManualApplicant, Role, Selection, UserId};
use super::repository::{AssessmentRepository, RepositoryError};
use super::service::{
    AssessmentError, AssessmentService, OfficerCreateRequest, OfficerUpdateRequest,
};

pub(crate) const SUBJECT_HEADER: &str = "x-subject-id";
pub(crate) const ROLE_HEADER: &str = "x-subject-role";

/// Router builder exposing the assessment endpoints.
pub fn assessment_router<R>(service: Arc<AssessmentService<R>>) -> Router
where
    R: AssessmentRepository + 'static,
{
    Router::new()
        .route("/api/v1/scoring-structure", get(structure_handler::<R>))
        .route("/api/v1/applications", post(direct_submit_handler::<R>))
        .route("/api/v1/applications/draft", post(draft_handler::<R>))
        .route(
            "/api/v1/applications/:application_id/assessment",
            post(complete_handler::<R>),
        )
        .route(
            "/api/v1/applications/:application_id/report",
            get(report_handler::<R>),
        )
        .route(
            "/api/v1/officer/applications",
            post(officer_create_handler::<R>),
        )
        .route(
            "/api/v1/officer/applications/:application_id",
            put(officer_update_handler::<R>).delete(officer_delete_handler::<R>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScorePayload {
    #[serde(default)]
    pub(crate) scores: Vec<Selection>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OfficerCreatePayload {
    pub(crate) user_id: Option<String>,
    pub(crate) manual_applicant: Option<ManualApplicant>,
    pub(crate) applicant_name: Option<String>,
    #[serde(default)]
    pub(crate) scores: Vec<Selection>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OfficerUpdatePayload {
    pub(crate) applicant_name: Option<String>,
    #[serde(default)]
    pub(crate) scores: Vec<Selection>,
}

fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, Response> {
    let subject = headers
        .get(SUBJECT_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let role = headers
        .get(ROLE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(Role::parse);

    match (subject, role) {
        (Some(subject), Some(role)) => Ok(Actor {
            subject: UserId(subject.to_string()),
            role,
        }),
        _ => {
            let payload = json!({
                "error": "missing or invalid identity headers",
            });
            Err((StatusCode::UNAUTHORIZED, Json(payload)).into_response())
        }
    }
}

fn error_response(error: AssessmentError) -> Response {
    let status = match &error {
        AssessmentError::NotFound | AssessmentError::Repository(RepositoryError::NotFound) => {
            StatusCode::NOT_FOUND
        }
        AssessmentError::Forbidden(_) => StatusCode::FORBIDDEN,
        AssessmentError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        AssessmentError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::BAD_REQUEST,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}

pub(crate) async fn structure_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    (StatusCode::OK, Json(json!({ "data": service.rubric() }))).into_response()
}

pub(crate) async fn draft_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    headers: HeaderMap,
    Json(payload): Json<ScorePayload>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    match service.submit_early_draft(&actor, &payload.scores) {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn direct_submit_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    headers: HeaderMap,
    Json(payload): Json<ScorePayload>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    match service.direct_submit(&actor, &payload.scores) {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn complete_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    Json(payload): Json<ScorePayload>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let id = ApplicationId(application_id);
    match service.complete_assessment(&actor, &id, &payload.scores) {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn report_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let id = ApplicationId(application_id);
    match service.report(&actor, &id) {
        Ok(report) => (StatusCode::OK, Json(json!({ "data": report }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn officer_create_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    headers: HeaderMap,
    Json(payload): Json<OfficerCreatePayload>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let request = OfficerCreateRequest {
        user_id: payload.user_id.map(UserId),
        manual_applicant: payload.manual_applicant,
        applicant_name: payload.applicant_name,
        selections: payload.scores,
    };
    match service.officer_create(&actor, request) {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn officer_update_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    Json(payload): Json<OfficerUpdatePayload>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let id = ApplicationId(application_id);
    let request = OfficerUpdateRequest {
        applicant_name: payload.applicant_name,
        selections: payload.scores,
    };
    match service.officer_update(&actor, &id, request) {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn officer_delete_handler<R>(
    State(service): State<Arc<AssessmentService<R>>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Response
where
    R: AssessmentRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let id = ApplicationId(application_id);
    match service.officer_delete(&actor, &id) {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}
