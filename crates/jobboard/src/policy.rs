//! Authorization rules keyed on principal role and resource ownership.
//!
//! Callers resolve the resource first, so a missing resource is reported as
//! not-found before any of these checks run.

use crate::applications::domain::Application;
use crate::error::ApiError;
use crate::identity::domain::{Principal, PrincipalId, Role};
use crate::jobs::domain::Job;
use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct Denied {
    reason: Cow<'static, str>,
}

impl Denied {
    fn new(reason: impl Into<Cow<'static, str>>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl From<Denied> for ApiError {
    fn from(value: Denied) -> Self {
        ApiError::forbidden(value.reason)
    }
}

/// Gate on role membership, e.g. "Forbidden - Employer or Admin access required".
pub fn require_role(principal: &Principal, allowed: &[Role]) -> Result<(), Denied> {
    if allowed.contains(&principal.role()) {
        return Ok(());
    }
    let roles = allowed
        .iter()
        .map(|role| role.title())
        .collect::<Vec<_>>()
        .join(" or ");
    Err(Denied::new(format!("Forbidden - {roles} access required")))
}

/// Owning employee, the employer who posted the job, or an admin.
pub fn can_read_application(
    principal: &Principal,
    application: &Application,
    job_owner: Option<&PrincipalId>,
) -> Result<(), Denied> {
    let allowed = match principal.role() {
        Role::Admin => true,
        Role::Employee => application.employee_id == principal.id,
        Role::Employer => job_owner == Some(&principal.id),
    };
    if allowed {
        Ok(())
    } else {
        Err(Denied::new("Access denied"))
    }
}

/// Admins, or the employer owning the job. A deleted job has no owner to match.
pub fn can_transition(principal: &Principal, job_owner: Option<&PrincipalId>) -> Result<(), Denied> {
    match principal.role() {
        Role::Admin => Ok(()),
        Role::Employer if job_owner == Some(&principal.id) => Ok(()),
        _ => Err(Denied::new(
            "You can only update applications for your own jobs",
        )),
    }
}

pub fn can_withdraw(principal: &Principal, application: &Application) -> Result<(), Denied> {
    match principal.role() {
        Role::Admin => Ok(()),
        Role::Employee if application.employee_id == principal.id => Ok(()),
        _ => Err(Denied::new("You can only withdraw your own applications")),
    }
}

/// Admins, or the principal acting on their own account.
pub fn can_manage_user(principal: &Principal, target: &PrincipalId) -> Result<(), Denied> {
    if principal.is(Role::Admin) || &principal.id == target {
        Ok(())
    } else {
        Err(Denied::new("Access denied"))
    }
}

/// Nobody, admins included, sets another account's password.
pub fn can_change_password(principal: &Principal, target: &PrincipalId) -> Result<(), Denied> {
    if &principal.id == target {
        Ok(())
    } else {
        Err(Denied::new("You can only change your own password"))
    }
}

pub fn can_mutate_job(principal: &Principal, job: &Job) -> Result<(), Denied> {
    match principal.role() {
        Role::Admin => Ok(()),
        Role::Employer if job.employer_id == principal.id => Ok(()),
        _ => Err(Denied::new("You can only modify your own jobs")),
    }
}
