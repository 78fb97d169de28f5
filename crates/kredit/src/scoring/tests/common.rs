use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::scoring::domain::{Actor, Application, ApplicationId, Role, Selection, UserId};
use crate::scoring::repository::{AssessmentRepository, RepositoryError};
use crate::scoring::rubric::{
    Category, CategoryId, CriteriaId, Criterion, Rubric, ScoreOption, ScoreOptionId,
};
use crate::scoring::service::AssessmentService;

/// Compact two-category rubric used by most scenarios:
/// category 1 (weight 40, draft stage) holds criteria 1 (weight 20) and
/// 2 (weight 30); category 2 (weight 60, officer stage) holds criterion
/// 3 (weight 50). Option ids are `criterion * 10 + tier`.
pub(super) fn small_rubric() -> Rubric {
    let categories = vec![
        category(1, "Profile", 40.0, 1),
        category(2, "Financials", 60.0, 2),
    ];
    let criteria = vec![
        criterion(1, 1, "Age bracket", 20.0, 1),
        criterion(2, 1, "Education", 30.0, 2),
        criterion(3, 2, "Income", 50.0, 1),
    ];
    let options = vec![
        option(11, 1, "25-45 years", 80, 1),
        option(12, 1, "Outside 25-45", 40, 2),
        option(21, 2, "Degree", 100, 1),
        option(22, 2, "Secondary", 50, 2),
        option(31, 3, "2-3x installment", 60, 1),
        option(32, 3, "Over 3x installment", 90, 2),
    ];
    Rubric::new(categories, criteria, options, 1).expect("fixture rubric is valid")
}

pub(super) fn category(id: u32, name: &str, weight: f64, order: u32) -> Category {
    Category {
        id: CategoryId(id),
        name: name.to_string(),
        weight,
        order,
    }
}

pub(super) fn criterion(id: u32, cat: u32, name: &str, weight: f64, order: u32) -> Criterion {
    Criterion {
        id: CriteriaId(id),
        category_id: CategoryId(cat),
        name: name.to_string(),
        weight,
        order,
    }
}

pub(super) fn option(id: u32, criteria: u32, description: &str, score: i32, order: u32) -> ScoreOption {
    ScoreOption {
        id: ScoreOptionId(id),
        criteria_id: CriteriaId(criteria),
        description: description.to_string(),
        score,
        order,
    }
}

pub(super) fn selection(criteria: u32, score_option: u32) -> Selection {
    Selection {
        criteria_id: CriteriaId(criteria),
        score_option_id: ScoreOptionId(score_option),
    }
}

pub(super) fn applicant() -> Actor {
    Actor {
        subject: UserId("user-1".to_string()),
        role: Role::User,
    }
}

pub(super) fn other_applicant() -> Actor {
    Actor {
        subject: UserId("user-2".to_string()),
        role: Role::User,
    }
}

pub(super) fn officer() -> Actor {
    Actor {
        subject: UserId("officer-1".to_string()),
        role: Role::Officer,
    }
}

/// All three criteria answered: 80*20/100 + 100*30/100 in category 1,
/// 60*50/100 in category 2, for a total of 36.4.
pub(super) fn full_batch() -> Vec<Selection> {
    vec![selection(1, 11), selection(2, 21), selection(3, 31)]
}

pub(super) fn build_service() -> (
    AssessmentService<MemoryRepository>,
    Arc<MemoryRepository>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let rubric = Arc::new(small_rubric());
    let service = AssessmentService::new(repository.clone(), rubric);
    (service, repository)
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    records: Arc<Mutex<HashMap<ApplicationId, Application>>>,
}

impl MemoryRepository {
    /// Test-only lookup for receipts that carry a number but no id.
    pub(super) fn fetch_by_number(&self, number: &str) -> Option<Application> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        guard
            .values()
            .find(|application| application.application_number == number)
            .cloned()
    }
}

impl AssessmentRepository for MemoryRepository {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(&self, application: Application) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&application.id) {
            guard.insert(application.id.clone(), application);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn remove(&self, id: &ApplicationId) -> Result<Application, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.remove(id).ok_or(RepositoryError::NotFound)
    }
}

pub(super) struct UnavailableRepository;

impl AssessmentRepository for UnavailableRepository {
    fn insert(&self, _application: Application) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _application: Application) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn remove(&self, _id: &ApplicationId) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
