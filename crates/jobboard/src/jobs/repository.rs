use super::domain::{Job, JobId, JobQuery, JobSort};
use crate::store::{Page, PageRequest, RepositoryError};

/// Counters maintained on a posting outside of regular edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobCounter {
    Views,
    Applications,
}

pub trait JobRepository: Send + Sync {
    fn insert(&self, job: Job) -> Result<Job, RepositoryError>;
    fn update(&self, job: Job) -> Result<Job, RepositoryError>;
    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
    fn delete(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
    fn find(
        &self,
        query: &JobQuery,
        sort: JobSort,
        page: PageRequest,
    ) -> Result<Page<Job>, RepositoryError>;
    /// Every match, newest first.
    fn list(&self, query: &JobQuery) -> Result<Vec<Job>, RepositoryError>;
    fn count(&self, query: &JobQuery) -> Result<usize, RepositoryError>;
    /// Atomic increment; `NotFound` when the posting is gone.
    fn increment(&self, id: &JobId, counter: JobCounter) -> Result<(), RepositoryError>;
}
