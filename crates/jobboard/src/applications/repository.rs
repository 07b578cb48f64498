use super::domain::{Application, ApplicationFilter, ApplicationId};
use crate::store::{Page, PageRequest, RepositoryError};

/// Storage abstraction for applications.
///
/// `insert` is the conditional write behind Apply: it must reject, with
/// `RepositoryError::Conflict`, a record whose (employee, job) pair already
/// has a non-withdrawn application.
///
/// `modify` is the only way to change a stored record. It runs `change`
/// against the current version and persists the result as one step, so a
/// check made inside `change` still holds when the write lands. Nothing is
/// written when `change` fails, and `Ok(None)` means no record has this id.
/// `change` must not call back into the repository.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError>;
    fn modify<F, E>(&self, id: &ApplicationId, change: F) -> Result<Option<Application>, E>
    where
        F: FnOnce(&mut Application) -> Result<(), E>,
        E: From<RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    /// Newest `applied_at` first.
    fn find(
        &self,
        filter: &ApplicationFilter,
        page: PageRequest,
    ) -> Result<Page<Application>, RepositoryError>;
    fn list(&self, filter: &ApplicationFilter) -> Result<Vec<Application>, RepositoryError>;
    fn count(&self, filter: &ApplicationFilter) -> Result<usize, RepositoryError>;
}
