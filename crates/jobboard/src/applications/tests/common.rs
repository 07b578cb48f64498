use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::api::auth::Authenticator;
use crate::applications::domain::{
    Application, ApplicationFilter, ApplicationId, ApplicationView, ApplyRequest,
};
use crate::applications::repository::ApplicationRepository;
use crate::applications::{application_router, ApplicationService};
use crate::identity::domain::{
    CareerLevel, EducationalStatus, EmployeeProfile, EmployerDetails, EmployerProfile, JobInfo,
    Principal, PrincipalProfile,
};
use crate::identity::repository::PrincipalRepository;
use crate::identity::token::TokenIssuer;
use crate::identity::IdentityService;
use crate::jobs::domain::{Job, JobDraft, JobStatus};
use crate::jobs::repository::JobRepository;
use crate::store::{MemoryStore, Page, PageRequest, RepositoryError};

pub(super) type MemoryApplications = ApplicationService<MemoryStore, MemoryStore>;

/// One shared store behind principals, jobs, and applications.
pub(super) struct Harness {
    pub store: Arc<MemoryStore>,
    pub service: Arc<MemoryApplications>,
    pub tokens: TokenIssuer,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let service = Arc::new(ApplicationService::new(store.clone(), store.clone()));
        Self {
            store,
            service,
            tokens: TokenIssuer::new("applications-test-secret", Duration::from_secs(3600)),
        }
    }

    pub fn employer(&self, company: &str) -> Principal {
        self.register(employer_principal(company))
    }

    pub fn employee(&self, username: &str) -> Principal {
        self.register(employee_principal(username))
    }

    pub fn admin(&self) -> Principal {
        self.register(Principal::new(
            "root@jobboard.test",
            "hash".into(),
            PrincipalProfile::Admin,
        ))
    }

    fn register(&self, principal: Principal) -> Principal {
        PrincipalRepository::insert(self.store.as_ref(), principal).expect("principal stored")
    }

    pub fn post_job(&self, owner: &Principal, status: JobStatus) -> Job {
        let mut job = Job::from_draft(owner.id.clone(), draft("Backend Engineer"));
        job.status = status;
        JobRepository::insert(self.store.as_ref(), job).expect("job stored")
    }

    pub fn apply(&self, employee: &Principal, job: &Job) -> ApplicationView {
        self.service
            .apply(employee, apply_request(job))
            .expect("application submitted")
    }

    pub fn stored(&self, id: &ApplicationId) -> Application {
        ApplicationRepository::fetch(self.store.as_ref(), id)
            .expect("fetch succeeds")
            .expect("application present")
    }

    pub fn stored_job(&self, job: &Job) -> Job {
        JobRepository::fetch(self.store.as_ref(), &job.id)
            .expect("fetch succeeds")
            .expect("job present")
    }

    pub fn router(&self) -> axum::Router {
        let identity = Arc::new(IdentityService::new(self.store.clone(), self.tokens.clone()));
        application_router(self.service.clone(), Authenticator::new(identity))
    }

    pub fn bearer(&self, principal: &Principal) -> String {
        let token = self.tokens.issue(principal).expect("token issued");
        format!("Bearer {token}")
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        principal: Option<&Principal>,
        body: Option<Value>,
    ) -> Response {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(principal) = principal {
            request = request.header(header::AUTHORIZATION, self.bearer(principal));
        }
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&value).expect("json body"))
            }
            None => Body::empty(),
        };
        self.router()
            .oneshot(request.body(body).expect("request builds"))
            .await
            .expect("route executes")
    }
}

pub(super) fn employer_principal(company: &str) -> Principal {
    Principal::new(
        &format!("hr@{company}.test"),
        "hash".into(),
        PrincipalProfile::Employer(EmployerProfile {
            company_name: company.into(),
            phone_number: "+1-555-0100".into(),
            details: EmployerDetails {
                industry: "Software".into(),
                contact_name: "Pat".into(),
                contact_position: "Recruiter".into(),
            },
        }),
    )
}

pub(super) fn employee_principal(username: &str) -> Principal {
    Principal::new(
        &format!("{username}@people.test"),
        "hash".into(),
        PrincipalProfile::Employee(EmployeeProfile {
            username: username.into(),
            first_name: "Dana".into(),
            last_name: "Dev".into(),
            job_info: JobInfo {
                job_title: "Developer".into(),
                skills: vec!["Rust".into()],
                experience_description: None,
                experience_level: CareerLevel::Mid,
                years_of_experience: 4,
                educational_status: EducationalStatus::Graduate,
                last_work: None,
            },
        }),
    )
}

pub(super) fn draft(title: &str) -> JobDraft {
    serde_json::from_value(json!({
        "title": title,
        "description": "Build and run the hiring platform",
        "requirements": ["Three years of backend work"],
        "responsibilities": ["Own the applications service"],
        "type": "Full time",
        "salary": { "min": 60000, "max": 90000 },
        "experience": "Mid",
        "education": "Bachelor",
        "skills": ["Rust", "SQL"],
        "hoursOfWork": "40h/week"
    }))
    .expect("draft deserializes")
}

pub(super) fn apply_request(job: &Job) -> ApplyRequest {
    ApplyRequest {
        job_id: job.id.0.clone(),
        cover_letter: Some("I would love to help.".into()),
        expected_salary: Some(75000.0),
        ..ApplyRequest::default()
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn assert_error(response: Response, status: StatusCode, message: &str) {
    assert_eq!(response.status(), status);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], json!(false));
    assert_eq!(payload["message"], json!(message));
}

/// Repository that has lost its backing store.
pub(super) struct OfflineApplications;

impl ApplicationRepository for OfflineApplications {
    fn insert(&self, _application: Application) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn modify<F, E>(&self, _id: &ApplicationId, _change: F) -> Result<Option<Application>, E>
    where
        F: FnOnce(&mut Application) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        Err(RepositoryError::Unavailable("database offline".to_string()).into())
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find(
        &self,
        _filter: &ApplicationFilter,
        _page: PageRequest,
    ) -> Result<Page<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _filter: &ApplicationFilter) -> Result<Vec<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn count(&self, _filter: &ApplicationFilter) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}
