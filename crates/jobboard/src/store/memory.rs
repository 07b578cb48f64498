use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Page, PageRequest, RepositoryError};
use crate::applications::domain::{Application, ApplicationFilter, ApplicationId};
use crate::applications::repository::ApplicationRepository;
use crate::identity::domain::{normalize_email, Principal, PrincipalId};
use crate::identity::repository::{PrincipalFilter, PrincipalRepository};
use crate::jobs::domain::{Job, JobId, JobQuery, JobSort};
use crate::jobs::repository::{JobCounter, JobRepository};

#[derive(Debug, Default)]
struct Collections {
    principals: HashMap<PrincipalId, Principal>,
    jobs: HashMap<JobId, Job>,
    applications: HashMap<ApplicationId, Application>,
}

/// Process-local store backing every repository trait. Every method takes the
/// lock once; read-modify-write sequences go through `modify` so the check and
/// the write share that single critical section.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    collections: Arc<Mutex<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, RepositoryError> {
        self.collections
            .lock()
            .map_err(|_| RepositoryError::Unavailable("memory store mutex poisoned".to_string()))
    }
}

fn newest_principals_first(a: &Principal, b: &Principal) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

fn newest_jobs_first(a: &Job, b: &Job) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

fn newest_applications_first(a: &Application, b: &Application) -> Ordering {
    b.applied_at
        .cmp(&a.applied_at)
        .then_with(|| a.id.cmp(&b.id))
}

impl PrincipalRepository for MemoryStore {
    fn insert(&self, principal: Principal) -> Result<Principal, RepositoryError> {
        let mut guard = self.lock()?;
        let email = normalize_email(&principal.email);
        if guard.principals.contains_key(&principal.id)
            || guard.principals.values().any(|existing| existing.email == email)
        {
            return Err(RepositoryError::Conflict);
        }
        let principal = Principal { email, ..principal };
        guard
            .principals
            .insert(principal.id.clone(), principal.clone());
        Ok(principal)
    }

    fn modify<F, E>(&self, id: &PrincipalId, change: F) -> Result<Option<Principal>, E>
    where
        F: FnOnce(&mut Principal) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        let mut guard = self.lock()?;
        let Some(current) = guard.principals.get(id) else {
            return Ok(None);
        };
        let mut candidate = current.clone();
        change(&mut candidate)?;
        candidate.id = id.clone();
        candidate.email = normalize_email(&candidate.email);
        if guard
            .principals
            .values()
            .any(|existing| &existing.id != id && existing.email == candidate.email)
        {
            return Err(RepositoryError::Conflict.into());
        }
        guard.principals.insert(id.clone(), candidate.clone());
        Ok(Some(candidate))
    }

    fn fetch(&self, id: &PrincipalId) -> Result<Option<Principal>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.principals.get(id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Principal>, RepositoryError> {
        let guard = self.lock()?;
        let email = normalize_email(email);
        Ok(guard
            .principals
            .values()
            .find(|principal| principal.email == email)
            .cloned())
    }

    fn delete(&self, id: &PrincipalId) -> Result<Option<Principal>, RepositoryError> {
        let mut guard = self.lock()?;
        Ok(guard.principals.remove(id))
    }

    fn list(&self, filter: &PrincipalFilter) -> Result<Vec<Principal>, RepositoryError> {
        let guard = self.lock()?;
        let mut matches: Vec<Principal> = guard
            .principals
            .values()
            .filter(|principal| filter.matches(principal))
            .cloned()
            .collect();
        matches.sort_by(newest_principals_first);
        Ok(matches)
    }

    fn count(&self, filter: &PrincipalFilter) -> Result<usize, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard
            .principals
            .values()
            .filter(|principal| filter.matches(principal))
            .count())
    }
}

impl JobRepository for MemoryStore {
    fn insert(&self, job: Job) -> Result<Job, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.jobs.contains_key(&job.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    fn update(&self, job: Job) -> Result<Job, RepositoryError> {
        let mut guard = self.lock()?;
        match guard.jobs.get_mut(&job.id) {
            Some(slot) => {
                *slot = job.clone();
                Ok(job)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.jobs.get(id).cloned())
    }

    fn delete(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        let mut guard = self.lock()?;
        Ok(guard.jobs.remove(id))
    }

    fn find(
        &self,
        query: &JobQuery,
        sort: JobSort,
        page: PageRequest,
    ) -> Result<Page<Job>, RepositoryError> {
        let mut matches = JobRepository::list(self, query)?;
        if sort == JobSort::Salary {
            matches.sort_by(|a, b| {
                b.salary
                    .max
                    .total_cmp(&a.salary.max)
                    .then_with(|| newest_jobs_first(a, b))
            });
        }
        Ok(page.slice(matches))
    }

    fn list(&self, query: &JobQuery) -> Result<Vec<Job>, RepositoryError> {
        let guard = self.lock()?;
        let mut matches: Vec<Job> = guard
            .jobs
            .values()
            .filter(|job| query.matches(job))
            .cloned()
            .collect();
        matches.sort_by(newest_jobs_first);
        Ok(matches)
    }

    fn count(&self, query: &JobQuery) -> Result<usize, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.jobs.values().filter(|job| query.matches(job)).count())
    }

    fn increment(&self, id: &JobId, counter: JobCounter) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let job = guard.jobs.get_mut(id).ok_or(RepositoryError::NotFound)?;
        match counter {
            JobCounter::Views => job.views_count += 1,
            JobCounter::Applications => job.applications_count += 1,
        }
        Ok(())
    }
}

impl ApplicationRepository for MemoryStore {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut guard = self.lock()?;
        let duplicate = guard.applications.values().any(|existing| {
            existing.is_active()
                && application.is_active()
                && existing.employee_id == application.employee_id
                && existing.job_id == application.job_id
        });
        if duplicate || guard.applications.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard
            .applications
            .insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn modify<F, E>(&self, id: &ApplicationId, change: F) -> Result<Option<Application>, E>
    where
        F: FnOnce(&mut Application) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        let mut guard = self.lock()?;
        let Some(slot) = guard.applications.get_mut(id) else {
            return Ok(None);
        };
        let mut candidate = slot.clone();
        change(&mut candidate)?;
        *slot = candidate.clone();
        Ok(Some(candidate))
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.applications.get(id).cloned())
    }

    fn find(
        &self,
        filter: &ApplicationFilter,
        page: PageRequest,
    ) -> Result<Page<Application>, RepositoryError> {
        let matches = ApplicationRepository::list(self, filter)?;
        Ok(page.slice(matches))
    }

    fn list(&self, filter: &ApplicationFilter) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.lock()?;
        let mut matches: Vec<Application> = guard
            .applications
            .values()
            .filter(|application| filter.matches(application))
            .cloned()
            .collect();
        matches.sort_by(newest_applications_first);
        Ok(matches)
    }

    fn count(&self, filter: &ApplicationFilter) -> Result<usize, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard
            .applications
            .values()
            .filter(|application| filter.matches(application))
            .count())
    }
}
