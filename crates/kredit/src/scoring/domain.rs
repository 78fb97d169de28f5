use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::risk::RiskBand;
use super::rubric::{CategoryId, CriteriaId, ScoreOptionId};

/// Identifier wrapper for assessed applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Opaque subject identifier handed over by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Caller roles as issued by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Officer,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Officer => "officer",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Role::User),
            "officer" => Some(Role::Officer),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Officers and admins may run assessments and manage applications.
    pub const fn can_review(self) -> bool {
        matches!(self, Role::Officer | Role::Admin)
    }
}

/// Authorization token resolved once at the HTTP boundary and passed into
/// every lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub subject: UserId,
    pub role: Role,
}

/// Applicant data captured by an officer when no registered account exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualApplicant {
    pub name: String,
    pub email: String,
}

/// Who an application is about: a registered user or inline applicant
/// data, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectRef {
    Registered(UserId),
    Manual(ManualApplicant),
}

impl SubjectRef {
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        matches!(self, SubjectRef::Registered(owner) if owner == user)
    }
}

/// One raw answer in a submission batch: a criterion and the chosen option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub criteria_id: CriteriaId,
    pub score_option_id: ScoreOptionId,
}

/// One resolved selection with the values that went into its weighted
/// score. Rows are immutable once created; updates replace the whole set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationScore {
    pub criteria_id: CriteriaId,
    pub score_option_id: ScoreOptionId,
    pub raw_score: i32,
    pub criteria_weight: f64,
    pub weighted_score: f64,
}

/// Lifecycle stage of an application. The assessed variant carries its
/// risk band so an assessed application without one cannot exist.
/// `Approved` and `Rejected` are reserved; no core operation reaches them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AssessmentState {
    Draft,
    Pending,
    Assessed { risk: RiskBand },
    Approved,
    Rejected,
}

impl AssessmentState {
    pub const fn label(&self) -> &'static str {
        match self {
            AssessmentState::Draft => "draft",
            AssessmentState::Pending => "pending",
            AssessmentState::Assessed { .. } => "assessed",
            AssessmentState::Approved => "approved",
            AssessmentState::Rejected => "rejected",
        }
    }

    pub const fn risk(&self) -> Option<RiskBand> {
        match self {
            AssessmentState::Assessed { risk } => Some(*risk),
            _ => None,
        }
    }
}

/// The mutable entity under assessment. Score rows are owned exclusively
/// by their application; the aggregate fields are always derived from
/// them by the engine, never set independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub application_number: String,
    pub subject: SubjectRef,
    pub applicant_name: String,
    pub state: AssessmentState,
    pub scores: Vec<ApplicationScore>,
    pub category_subtotals: BTreeMap<CategoryId, f64>,
    pub category_final_scores: BTreeMap<CategoryId, f64>,
    pub total_score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
