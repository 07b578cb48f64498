use super::common::*;
use std::sync::{Arc, Barrier};
use std::thread;

use chrono::Utc;

use crate::applications::domain::{
    ApplicationFilter, ApplicationId, ApplicationStatus, ApplyRequest, StatusUpdate,
    WithdrawalError,
};
use crate::applications::repository::ApplicationRepository;
use crate::applications::{ApplicationService, ApplicationServiceError};
use crate::error::ApiError;
use crate::jobs::domain::{JobId, JobStatus};
use crate::jobs::repository::JobRepository;
use crate::store::{MemoryStore, PageRequest, RepositoryError};

fn shortlist() -> StatusUpdate {
    StatusUpdate {
        status: "Shortlisted".into(),
        employer_notes: Some("Strong systems background".into()),
    }
}

#[test]
fn apply_creates_pending_application_and_counts_it() {
    let harness = Harness::new();
    let employer = harness.employer("acme");
    let employee = harness.employee("dana");
    let job = harness.post_job(&employer, JobStatus::Active);

    let view = harness.apply(&employee, &job);

    assert_eq!(view.application.status, ApplicationStatus::Pending);
    assert!(!view.application.is_withdrawn);
    assert_eq!(view.application.employee_id, employee.id);
    assert_eq!(view.job.as_ref().map(|job| job.title.as_str()), Some("Backend Engineer"));
    assert_eq!(harness.stored_job(&job).applications_count, 1);
}

#[test]
fn apply_twice_is_a_conflict() {
    let harness = Harness::new();
    let employer = harness.employer("acme");
    let employee = harness.employee("dana");
    let job = harness.post_job(&employer, JobStatus::Active);
    harness.apply(&employee, &job);

    let err = harness
        .service
        .apply(&employee, apply_request(&job))
        .expect_err("second application rejected");

    assert!(matches!(err, ApplicationServiceError::AlreadyApplied));
    assert_eq!(err.to_string(), "You have already applied to this job");
    assert_eq!(harness.stored_job(&job).applications_count, 1);
}

#[test]
fn apply_to_inactive_job_is_a_conflict() {
    let harness = Harness::new();
    let employer = harness.employer("acme");
    let employee = harness.employee("dana");
    let job = harness.post_job(&employer, JobStatus::Inactive);

    let err = harness
        .service
        .apply(&employee, apply_request(&job))
        .expect_err("inactive job rejected");

    assert!(matches!(err, ApplicationServiceError::JobNotAccepting));
    assert!(matches!(ApiError::from(err), ApiError::Conflict(_)));
}

#[test]
fn apply_to_missing_job_is_not_found() {
    let harness = Harness::new();
    let employee = harness.employee("dana");
    let request = ApplyRequest {
        job_id: JobId::generate().0,
        ..ApplyRequest::default()
    };

    let err = harness
        .service
        .apply(&employee, request)
        .expect_err("unknown job rejected");
    assert!(matches!(err, ApplicationServiceError::JobNotFound));
}

#[test]
fn only_employees_apply() {
    let harness = Harness::new();
    let employer = harness.employer("acme");
    let job = harness.post_job(&employer, JobStatus::Active);

    let err = harness
        .service
        .apply(&employer, apply_request(&job))
        .expect_err("employer cannot apply");
    match err {
        ApplicationServiceError::Forbidden(denied) => {
            assert_eq!(denied.reason(), "Forbidden - Employee access required")
        }
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[test]
fn racing_applies_leave_one_active_application() {
    let harness = Harness::new();
    let employer = harness.employer("acme");
    let employee = harness.employee("dana");
    let job = harness.post_job(&employer, JobStatus::Active);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&harness.service);
            let employee = employee.clone();
            let request = apply_request(&job);
            thread::spawn(move || service.apply(&employee, request))
        })
        .collect();
    let outcomes: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread joins"))
        .collect();

    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert!(outcomes.iter().all(|outcome| matches!(
        outcome,
        Ok(_) | Err(ApplicationServiceError::AlreadyApplied)
    )));
    let active = ApplicationRepository::count(
        harness.store.as_ref(),
        &ApplicationFilter::for_employee(employee.id.clone()),
    )
    .expect("count");
    assert_eq!(active, 1);
}

#[test]
fn withdrawn_application_allows_reapplying() {
    let harness = Harness::new();
    let employer = harness.employer("acme");
    let employee = harness.employee("dana");
    let job = harness.post_job(&employer, JobStatus::Active);
    let first = harness.apply(&employee, &job);

    harness
        .service
        .withdraw(&employee, &first.application.id)
        .expect("withdrawal succeeds");
    let second = harness.apply(&employee, &job);

    assert_ne!(first.application.id, second.application.id);
}

#[test]
fn owner_transition_sets_review_time() {
    let harness = Harness::new();
    let employer = harness.employer("acme");
    let employee = harness.employee("dana");
    let job = harness.post_job(&employer, JobStatus::Active);
    let submitted = harness.apply(&employee, &job);

    let view = harness
        .service
        .transition_status(&employer, &submitted.application.id, shortlist())
        .expect("owner may transition");

    assert_eq!(view.application.status, ApplicationStatus::Shortlisted);
    let reviewed_at = view.application.reviewed_at.expect("review time set");
    assert!(reviewed_at >= view.application.applied_at);
    assert_eq!(
        view.application.employer_notes.as_deref(),
        Some("Strong systems background")
    );
}

#[test]
fn transition_graph_is_flat() {
    let harness = Harness::new();
    let employer = harness.employer("acme");
    let employee = harness.employee("dana");
    let job = harness.post_job(&employer, JobStatus::Active);
    let id = harness.apply(&employee, &job).application.id;

    for status in ["Rejected", "Pending", "Accepted", "Reviewed"] {
        let view = harness
            .service
            .transition_status(
                &employer,
                &id,
                StatusUpdate {
                    status: status.into(),
                    employer_notes: None,
                },
            )
            .expect("any status reachable");
        assert_eq!(view.application.status.label(), status);
    }
}

#[test]
fn transition_rejects_unknown_status_without_mutating() {
    let harness = Harness::new();
    let employer = harness.employer("acme");
    let employee = harness.employee("dana");
    let job = harness.post_job(&employer, JobStatus::Active);
    let id = harness.apply(&employee, &job).application.id;

    let err = harness
        .service
        .transition_status(
            &employer,
            &id,
            StatusUpdate {
                status: "Hired".into(),
                employer_notes: None,
            },
        )
        .expect_err("unknown status");

    assert_eq!(
        err.to_string(),
        "Invalid status. Must be one of: Pending, Reviewed, Shortlisted, Interviewed, Accepted, Rejected"
    );
    assert!(matches!(ApiError::from(err), ApiError::BadRequest(_)));
    assert_eq!(harness.stored(&id).status, ApplicationStatus::Pending);
}

#[test]
fn missing_application_is_reported_before_authorization() {
    let harness = Harness::new();
    let stranger = harness.employer("globex");

    let err = harness
        .service
        .transition_status(&stranger, &ApplicationId("missing".into()), shortlist())
        .expect_err("missing application");
    assert!(matches!(err, ApplicationServiceError::ApplicationNotFound));
}

#[test]
fn transition_on_deleted_job_needs_admin() {
    let harness = Harness::new();
    let employer = harness.employer("acme");
    let employee = harness.employee("dana");
    let admin = harness.admin();
    let job = harness.post_job(&employer, JobStatus::Active);
    let id = harness.apply(&employee, &job).application.id;
    JobRepository::delete(harness.store.as_ref(), &job.id).expect("job removed");

    let err = harness
        .service
        .transition_status(&employer, &id, shortlist())
        .expect_err("owner gone with the job");
    assert!(matches!(err, ApplicationServiceError::Forbidden(_)));

    let view = harness
        .service
        .transition_status(&admin, &id, shortlist())
        .expect("admin may transition");
    assert!(view.job.is_none());
}

#[test]
fn withdraw_is_effect_idempotent() {
    let harness = Harness::new();
    let employer = harness.employer("acme");
    let employee = harness.employee("dana");
    let job = harness.post_job(&employer, JobStatus::Active);
    let id = harness.apply(&employee, &job).application.id;

    let first = harness
        .service
        .withdraw(&employee, &id)
        .expect("first withdrawal");
    let withdrawn_at = first.application.withdrawn_at.expect("withdrawal time set");

    let err = harness
        .service
        .withdraw(&employee, &id)
        .expect_err("second withdrawal rejected");
    assert!(matches!(
        err,
        ApplicationServiceError::Withdrawal(WithdrawalError::AlreadyWithdrawn)
    ));
    assert_eq!(harness.stored(&id).withdrawn_at, Some(withdrawn_at));
}

#[test]
fn finalized_application_cannot_be_withdrawn() {
    let harness = Harness::new();
    let employer = harness.employer("acme");
    let employee = harness.employee("dana");
    let job = harness.post_job(&employer, JobStatus::Active);
    let id = harness.apply(&employee, &job).application.id;
    harness
        .service
        .transition_status(
            &employer,
            &id,
            StatusUpdate {
                status: "Accepted".into(),
                employer_notes: None,
            },
        )
        .expect("accepted");

    let err = harness
        .service
        .withdraw(&employee, &id)
        .expect_err("accepted applications stay");
    assert_eq!(
        err.to_string(),
        "Cannot withdraw application that has been accepted or rejected"
    );
    assert!(!harness.stored(&id).is_withdrawn);
}

#[test]
fn racing_withdrawals_and_acceptance_never_lose_a_decision() {
    let harness = Harness::new();
    let employer = harness.employer("acme");
    let job = harness.post_job(&employer, JobStatus::Active);

    for round in 0..100 {
        let employee = harness.employee(&format!("racer{round}"));
        let id = harness.apply(&employee, &job).application.id;
        let barrier = Arc::new(Barrier::new(3));

        let withdrawals: Vec<_> = (0..2)
            .map(|_| {
                let service = Arc::clone(&harness.service);
                let barrier = Arc::clone(&barrier);
                let employee = employee.clone();
                let id = id.clone();
                thread::spawn(move || {
                    barrier.wait();
                    service.withdraw(&employee, &id)
                })
            })
            .collect();
        let acceptance = {
            let service = Arc::clone(&harness.service);
            let barrier = Arc::clone(&barrier);
            let employer = employer.clone();
            let id = id.clone();
            thread::spawn(move || {
                barrier.wait();
                service.transition_status(
                    &employer,
                    &id,
                    StatusUpdate {
                        status: "Accepted".into(),
                        employer_notes: None,
                    },
                )
            })
        };

        let outcomes: Vec<_> = withdrawals
            .into_iter()
            .map(|handle| handle.join().expect("thread joins"))
            .collect();
        acceptance
            .join()
            .expect("thread joins")
            .expect("owner may always accept");

        let withdrawn = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
        assert!(withdrawn <= 1, "round {round}: {withdrawn} withdrawals succeeded");
        assert!(outcomes.iter().all(|outcome| matches!(
            outcome,
            Ok(_) | Err(ApplicationServiceError::Withdrawal(_))
        )));
        let stored = harness.stored(&id);
        assert_eq!(stored.status, ApplicationStatus::Accepted, "round {round}");
        assert_eq!(stored.is_withdrawn, withdrawn == 1, "round {round}");
    }
}

#[test]
fn employee_listing_hides_withdrawn_and_filters_status() {
    let harness = Harness::new();
    let employer = harness.employer("acme");
    let employee = harness.employee("dana");
    let first = harness.post_job(&employer, JobStatus::Active);
    let second = harness.post_job(&employer, JobStatus::Active);
    let third = harness.post_job(&employer, JobStatus::Active);
    let kept = harness.apply(&employee, &first).application.id;
    let withdrawn = harness.apply(&employee, &second).application.id;
    let reviewed = harness.apply(&employee, &third).application.id;
    harness
        .service
        .withdraw(&employee, &withdrawn)
        .expect("withdrawn");
    harness
        .service
        .transition_status(&employer, &reviewed, shortlist())
        .expect("shortlisted");

    let all = harness
        .service
        .list_for_employee(&employee, None, PageRequest::default())
        .expect("listing");
    assert_eq!(all.total, 2);
    assert!(all.items.iter().all(|view| view.job.is_some()));

    let pending = harness
        .service
        .list_for_employee(
            &employee,
            Some(ApplicationStatus::Pending),
            PageRequest::default(),
        )
        .expect("filtered listing");
    assert_eq!(pending.total, 1);
    assert_eq!(pending.items[0].application.id, kept);
}

#[test]
fn employer_listing_stays_within_own_jobs() {
    let harness = Harness::new();
    let acme = harness.employer("acme");
    let globex = harness.employer("globex");
    let employee = harness.employee("dana");
    let acme_job = harness.post_job(&acme, JobStatus::Active);
    let globex_job = harness.post_job(&globex, JobStatus::Active);
    harness.apply(&employee, &acme_job);
    harness.apply(&employee, &globex_job);

    let own = harness
        .service
        .list_for_employer(&acme, None, None, PageRequest::default())
        .expect("own listing");
    assert_eq!(own.total, 1);
    assert_eq!(own.items[0].application.job_id, acme_job.id);

    let foreign = harness
        .service
        .list_for_employer(
            &acme,
            None,
            Some(globex_job.id.clone()),
            PageRequest::default(),
        )
        .expect("foreign job filter");
    assert!(foreign.items.is_empty());
    assert_eq!(foreign.total, 0);
}

#[test]
fn employer_listing_paginates_newest_first() {
    let harness = Harness::new();
    let employer = harness.employer("acme");
    let job = harness.post_job(&employer, JobStatus::Active);
    let mut ids = Vec::new();
    for index in 0..3 {
        let employee = harness.employee(&format!("candidate{index}"));
        let id = harness.apply(&employee, &job).application.id;
        ApplicationRepository::modify(harness.store.as_ref(), &id, |stored| {
            stored.applied_at = Utc::now() - chrono::Duration::minutes(10 - index);
            Ok::<_, RepositoryError>(())
        })
        .expect("backdated")
        .expect("application present");
        ids.push(id);
    }

    let page = harness
        .service
        .list_for_employer(&employer, None, Some(job.id.clone()), PageRequest::new(1, 2))
        .expect("first page");
    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages(), 2);
    assert!(page.has_next_page());
    assert_eq!(page.items[0].application.id, ids[2]);
    assert_eq!(page.items[1].application.id, ids[1]);
}

#[test]
fn repository_outage_surfaces_as_internal_error() {
    let harness = Harness::new();
    let employer = harness.employer("acme");
    let employee = harness.employee("dana");
    let job = harness.post_job(&employer, JobStatus::Active);
    let service: ApplicationService<OfflineApplications, MemoryStore> =
        ApplicationService::new(Arc::new(OfflineApplications), harness.store.clone());

    let err = service
        .apply(&employee, apply_request(&job))
        .expect_err("store offline");
    assert!(matches!(
        err,
        ApplicationServiceError::Repository(RepositoryError::Unavailable(_))
    ));
    assert!(matches!(ApiError::from(err), ApiError::Internal(_)));
}
