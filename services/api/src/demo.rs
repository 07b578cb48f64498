use clap::Args;
use jobboard::applications::{ApplicationView, ApplyRequest, StatusUpdate};
use jobboard::dashboard::DEFAULT_ANALYTICS_DAYS;
use jobboard::error::{ApiError, AppError};
use jobboard::identity::{Principal, RegisterRequest, Session, TokenIssuer};
use jobboard::jobs::{Job, JobDraft};
use jobboard::store::MemoryStore;
use jobboard::JobBoard;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print the final application and the dashboard analytics as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

/// Walks one application from submission through review, withdrawal, and re-application.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let board = JobBoard::new(
        Arc::new(MemoryStore::new()),
        TokenIssuer::new("demo-only-secret", Duration::from_secs(3600)),
        false,
    );

    println!("Job board lifecycle demo");
    let employer = register(&board, employer_payload("acme", "Acme Rockets"))?.principal;
    let rival = register(&board, employer_payload("globex", "Globex"))?.principal;
    let employee = register(&board, employee_payload("dana"))?.principal;
    let admin = register(&board, admin_payload())?.principal;
    println!(
        "- Registered employer {}, rival employer {}, employee {}, admin {}",
        employer.email, rival.email, employee.email, admin.email
    );

    let job = post_job(&board, &employer, "Backend Engineer")?;
    println!("- Posted job {} ({})", job.title, job.id);

    let submitted = board
        .applications()
        .apply(&employee, apply_request(&job))
        .map_err(ApiError::from)?;
    print_application("Employee applied", &submitted);

    match board.applications().apply(&employee, apply_request(&job)) {
        Ok(_) => println!("- Duplicate application unexpectedly accepted"),
        Err(err) => println!("- Duplicate application refused: {}", ApiError::from(err)),
    }

    let shortlisted = board
        .applications()
        .transition_status(&employer, &submitted.application.id, status("Shortlisted"))
        .map_err(ApiError::from)?;
    print_application("Employer reviewed", &shortlisted);

    match board
        .applications()
        .transition_status(&rival, &submitted.application.id, status("Rejected"))
    {
        Ok(_) => println!("- Rival employer unexpectedly changed the status"),
        Err(err) => println!("- Rival employer refused: {}", ApiError::from(err)),
    }

    let withdrawn = board
        .applications()
        .withdraw(&employee, &submitted.application.id)
        .map_err(ApiError::from)?;
    print_application("Employee withdrew", &withdrawn);

    match board
        .applications()
        .withdraw(&employee, &submitted.application.id)
    {
        Ok(_) => println!("- Second withdrawal unexpectedly accepted"),
        Err(err) => println!("- Second withdrawal refused: {}", ApiError::from(err)),
    }

    let reapplied = board
        .applications()
        .apply(&employee, apply_request(&job))
        .map_err(ApiError::from)?;
    print_application("Employee applied again", &reapplied);

    let analytics = board
        .dashboard()
        .application_analytics(DEFAULT_ANALYTICS_DAYS)
        .map_err(ApiError::from)?;
    println!(
        "\nApplications over the last {} days: {} total, {} pending, {}% accepted",
        analytics.period_days,
        analytics.overview.total_applications,
        analytics.overview.pending_applications,
        analytics.overview.acceptance_rate
    );
    for bucket in &analytics.by_status {
        println!("  - {}: {}", bucket.label, bucket.count);
    }
    for top in &analytics.top_jobs {
        println!(
            "  - Top job {}: {} applications",
            top.job_title, top.application_count
        );
    }

    if args.json {
        let final_view = json!({
            "application": reapplied,
            "analytics": analytics,
        });
        match serde_json::to_string_pretty(&final_view) {
            Ok(rendered) => println!("\n{rendered}"),
            Err(err) => println!("\nJSON output unavailable: {err}"),
        }
    }

    Ok(())
}

/// Preloads an admin, an employer with two postings, and an employee for local runs.
pub(crate) fn seed(board: &JobBoard<MemoryStore>) -> Result<(), AppError> {
    let admin = register(board, admin_payload())?.principal;
    let employer = register(board, employer_payload("acme", "Acme Rockets"))?.principal;
    let employee = register(board, employee_payload("dana"))?.principal;

    for title in ["Backend Engineer", "Site Reliability Engineer"] {
        post_job(board, &employer, title)?;
    }

    info!(
        admin = %admin.email,
        employer = %employer.email,
        employee = %employee.email,
        "seeded sample accounts"
    );
    Ok(())
}

fn register(board: &JobBoard<MemoryStore>, payload: Value) -> Result<Session, AppError> {
    let request: RegisterRequest = from_payload(payload)?;
    Ok(board.identity().register(request).map_err(ApiError::from)?)
}

fn post_job(
    board: &JobBoard<MemoryStore>,
    employer: &Principal,
    title: &str,
) -> Result<Job, AppError> {
    let draft: JobDraft = from_payload(job_payload(title))?;
    Ok(board.jobs().create(employer, draft).map_err(ApiError::from)?)
}

fn from_payload<T: DeserializeOwned>(payload: Value) -> Result<T, AppError> {
    serde_json::from_value(payload)
        .map_err(|err| AppError::from(ApiError::bad_request(err.to_string())))
}

fn apply_request(job: &Job) -> ApplyRequest {
    ApplyRequest {
        job_id: job.id.to_string(),
        cover_letter: Some("I have shipped three payment backends in Rust.".to_string()),
        expected_salary: Some(85_000.0),
        ..ApplyRequest::default()
    }
}

fn status(label: &str) -> StatusUpdate {
    StatusUpdate {
        status: label.to_string(),
        employer_notes: Some("Strong systems background".to_string()),
    }
}

fn print_application(step: &str, view: &ApplicationView) {
    let application = &view.application;
    let reviewed = application
        .reviewed_at
        .map(|at| format!(", reviewed {}", at.format("%Y-%m-%d %H:%M")))
        .unwrap_or_default();
    let withdrawn = if application.is_withdrawn {
        ", withdrawn"
    } else {
        ""
    };
    println!(
        "- {step}: application {} is {}{reviewed}{withdrawn}",
        application.id,
        application.status.label()
    );
}

fn admin_payload() -> Value {
    json!({
        "userType": "admin",
        "email": "admin@jobboard.local",
        "password": "change-me-admin"
    })
}

fn employer_payload(slug: &str, company: &str) -> Value {
    json!({
        "userType": "employer",
        "email": format!("hiring@{slug}.example"),
        "password": "change-me-employer",
        "companyName": company,
        "phoneNumber": "+1-515-555-0100",
        "details": {
            "industry": "Software",
            "contactName": "Morgan Lee",
            "contactPosition": "Head of Talent"
        }
    })
}

fn employee_payload(username: &str) -> Value {
    json!({
        "userType": "employee",
        "email": format!("{username}@people.example"),
        "password": "change-me-employee",
        "username": username,
        "firstName": "Dana",
        "lastName": "Rivera",
        "jobInfo": {
            "jobTitle": "Backend Developer",
            "skills": ["Rust", "PostgreSQL"],
            "experienceLevel": "mid",
            "yearsOfExperience": 5,
            "educationalStatus": "graduate"
        }
    })
}

fn job_payload(title: &str) -> Value {
    json!({
        "title": title,
        "description": "Design and operate the services behind our hiring platform.",
        "requirements": ["Production experience with async Rust"],
        "responsibilities": ["Own the applications service end to end"],
        "type": "Full time",
        "salary": { "min": 70000, "max": 110000 },
        "experience": "Mid",
        "education": "Bachelor",
        "skills": ["Rust", "SQL"],
        "hoursOfWork": "40h/week",
        "location": "Des Moines",
        "isRemote": true
    })
}
