use super::domain::{Application, ApplicationId};

/// Durable storage for applications. A record is the whole
/// [`Application`] including its score rows and aggregates, so each
/// lifecycle write is a single call and implementations only have to
/// serialize writes per application id for the replace-then-recompute
/// sequence to be atomic. A failed call must leave the prior committed
/// record intact.
pub trait AssessmentRepository: Send + Sync {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    /// Whole-record replace of an existing application.
    fn update(&self, application: Application) -> Result<(), RepositoryError>;
    /// Delete and return the record. Score rows are embedded, so the
    /// cascade is implicit.
    fn remove(&self, id: &ApplicationId) -> Result<Application, RepositoryError>;
}

/// Error enumeration for repository failures. The core performs no
/// retries; transient-failure policy belongs to the implementation.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
