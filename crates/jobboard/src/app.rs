use std::sync::Arc;

use axum::Router;

use crate::api::auth::Authenticator;
use crate::applications::{application_router, ApplicationRepository, ApplicationService};
use crate::dashboard::{dashboard_router, DashboardService};
use crate::identity::{
    identity_router, user_router, IdentityService, PrincipalRepository, TokenIssuer,
};
use crate::jobs::{job_router, JobRepository, JobService};
use crate::search::{search_router, SearchService};

/// Every service wired over one store, plus the combined HTTP surface.
pub struct JobBoard<S> {
    identity: Arc<IdentityService<S>>,
    jobs: Arc<JobService<S>>,
    applications: Arc<ApplicationService<S, S>>,
    dashboard: Arc<DashboardService<S, S, S>>,
    search: Arc<SearchService<S, S>>,
    secure_cookies: bool,
}

impl<S> JobBoard<S>
where
    S: PrincipalRepository + JobRepository + ApplicationRepository + 'static,
{
    pub fn new(store: Arc<S>, tokens: TokenIssuer, secure_cookies: bool) -> Self {
        Self {
            identity: Arc::new(IdentityService::new(store.clone(), tokens)),
            jobs: Arc::new(JobService::new(store.clone())),
            applications: Arc::new(ApplicationService::new(store.clone(), store.clone())),
            dashboard: Arc::new(DashboardService::new(
                store.clone(),
                store.clone(),
                store.clone(),
            )),
            search: Arc::new(SearchService::new(store.clone(), store)),
            secure_cookies,
        }
    }

    pub fn identity(&self) -> &IdentityService<S> {
        &self.identity
    }

    pub fn jobs(&self) -> &JobService<S> {
        &self.jobs
    }

    pub fn applications(&self) -> &ApplicationService<S, S> {
        &self.applications
    }

    pub fn dashboard(&self) -> &DashboardService<S, S, S> {
        &self.dashboard
    }

    pub fn search(&self) -> &SearchService<S, S> {
        &self.search
    }

    pub fn authenticator(&self) -> Authenticator {
        Authenticator::new(self.identity.clone())
    }

    /// All `/api` routes. Health checks, metrics, and cross-cutting layers are added by the binary.
    pub fn router(&self) -> Router {
        let auth = self.authenticator();
        Router::new()
            .merge(identity_router(
                self.identity.clone(),
                auth.clone(),
                self.secure_cookies,
            ))
            .merge(user_router(self.identity.clone(), auth.clone()))
            .merge(job_router(self.jobs.clone(), auth.clone()))
            .merge(application_router(self.applications.clone(), auth.clone()))
            .merge(dashboard_router(self.dashboard.clone(), auth.clone()))
            .merge(search_router(self.search.clone(), auth))
    }
}
