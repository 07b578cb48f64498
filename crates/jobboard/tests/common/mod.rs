#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use jobboard::identity::TokenIssuer;
use jobboard::store::MemoryStore;
use jobboard::JobBoard;
use serde_json::{json, Value};
use tower::ServiceExt;

pub struct TestApp {
    router: Router,
}

/// A registered principal as seen by an HTTP client.
pub struct Account {
    pub id: String,
    pub token: String,
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        let board = JobBoard::new(
            Arc::new(MemoryStore::new()),
            TokenIssuer::new("integration-secret", Duration::from_secs(3600)),
            false,
        );
        Self {
            router: board.router(),
        }
    }

    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&value).expect("json body"))
            }
            None => Body::empty(),
        };
        let response = self
            .router
            .clone()
            .oneshot(request.body(body).expect("request builds"))
            .await
            .expect("route executes");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), 256 * 1024)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json payload")
        };
        Reply {
            status,
            headers,
            body,
        }
    }

    pub async fn register(&self, payload: Value) -> Account {
        let reply = self
            .call("POST", "/api/auth/register", None, Some(payload))
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        Account {
            id: reply.body["data"]["user"]["id"]
                .as_str()
                .expect("user id")
                .to_string(),
            token: reply.body["data"]["token"]
                .as_str()
                .expect("token")
                .to_string(),
        }
    }

    pub async fn employer(&self, company: &str) -> Account {
        self.register(employer_payload(company)).await
    }

    pub async fn employee(&self, username: &str) -> Account {
        self.register(employee_payload(username)).await
    }

    pub async fn admin(&self) -> Account {
        self.register(json!({
            "userType": "admin",
            "email": "root@jobboard.test",
            "password": "admin-pass"
        }))
        .await
    }

    pub async fn post_job(&self, employer: &Account, title: &str) -> String {
        let reply = self
            .call("POST", "/api/jobs", Some(&employer.token), Some(job_payload(title)))
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        reply.body["data"]["id"]
            .as_str()
            .expect("job id")
            .to_string()
    }
}

pub fn employer_payload(company: &str) -> Value {
    json!({
        "userType": "employer",
        "email": format!("hr@{company}.test"),
        "password": "employer-pass",
        "companyName": company,
        "phoneNumber": "+1-555-0100",
        "details": {
            "industry": "Software",
            "contactName": "Pat",
            "contactPosition": "Recruiter"
        }
    })
}

pub fn employee_payload(username: &str) -> Value {
    json!({
        "userType": "employee",
        "email": format!("{username}@people.test"),
        "password": "employee-pass",
        "username": username,
        "firstName": "Dana",
        "lastName": "Dev",
        "jobInfo": {
            "jobTitle": "Developer",
            "skills": ["Rust"],
            "experienceLevel": "mid",
            "yearsOfExperience": 4,
            "educationalStatus": "graduate"
        }
    })
}

pub fn job_payload(title: &str) -> Value {
    json!({
        "title": title,
        "description": "Build and run the hiring platform",
        "requirements": ["Three years of backend work"],
        "responsibilities": ["Own the applications service"],
        "type": "Full time",
        "salary": { "min": 60000, "max": 90000 },
        "experience": "Mid",
        "education": "Bachelor",
        "skills": ["Rust", "SQL"],
        "hoursOfWork": "40h/week",
        "location": "Des Moines"
    })
}
