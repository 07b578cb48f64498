use super::domain::{
    normalize_email, LoginRequest, Principal, PrincipalId, ProfileUpdate, RegisterRequest, Role,
};
use super::password::{self, PasswordError};
use super::repository::PrincipalRepository;
use super::token::TokenIssuer;
use crate::error::ApiError;
use crate::policy::{self, Denied};
use crate::store::RepositoryError;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Search query is required")]
    MissingQuery,
    #[error("Current password is incorrect")]
    IncorrectPassword,
    #[error("Invalid user type")]
    InvalidUserType,
    #[error("Validation failed")]
    Invalid(Vec<String>),
    #[error("User with this email already exists")]
    EmailTaken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Access token required")]
    MissingToken,
    #[error("Invalid or expired token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),
    #[error("User not found")]
    UnknownSubject,
    #[error("User not found")]
    NotFound,
    #[error("Password cannot be updated through this route.")]
    PasswordChangeNotAllowed,
    #[error(transparent)]
    Forbidden(#[from] Denied),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error("failed to issue session token")]
    TokenIssue(#[source] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<IdentityError> for ApiError {
    fn from(value: IdentityError) -> Self {
        match value {
            IdentityError::Invalid(errors) => ApiError::Validation(errors),
            IdentityError::InvalidUserType | IdentityError::PasswordChangeNotAllowed => {
                ApiError::validation(value.to_string())
            }
            IdentityError::EmailTaken => ApiError::conflict(value.to_string()),
            IdentityError::MissingQuery | IdentityError::IncorrectPassword => {
                ApiError::bad_request(value.to_string())
            }
            IdentityError::InvalidCredentials
            | IdentityError::MissingToken
            | IdentityError::InvalidToken(_)
            | IdentityError::UnknownSubject => ApiError::unauthorized(value.to_string()),
            IdentityError::NotFound => ApiError::not_found(value.to_string()),
            IdentityError::Forbidden(denied) => ApiError::forbidden(denied.reason()),
            IdentityError::Password(_) | IdentityError::TokenIssue(_) => {
                ApiError::internal(value.to_string())
            }
            IdentityError::Repository(err) => err.into(),
        }
    }
}

/// A freshly authenticated principal together with its bearer token.
#[derive(Debug, Clone)]
pub struct Session {
    pub principal: Principal,
    pub token: String,
}

/// Registration, credential checks, and profile management for every role.
pub struct IdentityService<P> {
    pub(super) principals: Arc<P>,
    tokens: TokenIssuer,
}

impl<P> IdentityService<P>
where
    P: PrincipalRepository + 'static,
{
    pub fn new(principals: Arc<P>, tokens: TokenIssuer) -> Self {
        Self { principals, tokens }
    }

    pub fn token_ttl(&self) -> Duration {
        self.tokens.ttl()
    }

    pub fn register(&self, request: RegisterRequest) -> Result<Session, IdentityError> {
        let role = Role::parse(&request.user_type).ok_or(IdentityError::InvalidUserType)?;
        let profile = request.profile(role).map_err(IdentityError::Invalid)?;

        if self
            .principals
            .find_by_email(&normalize_email(&request.email))?
            .is_some()
        {
            return Err(IdentityError::EmailTaken);
        }

        let password_hash = password::hash(&request.password)?;
        let principal = Principal::new(&request.email, password_hash, profile);
        let stored = match self.principals.insert(principal) {
            Ok(stored) => stored,
            Err(RepositoryError::Conflict) => return Err(IdentityError::EmailTaken),
            Err(err) => return Err(err.into()),
        };

        info!(principal_id = %stored.id, role = stored.role().label(), "principal registered");
        self.session_for(stored)
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub fn login(&self, credentials: LoginRequest) -> Result<Session, IdentityError> {
        let Some(principal) = self
            .principals
            .find_by_email(&normalize_email(&credentials.email))?
        else {
            return Err(IdentityError::InvalidCredentials);
        };

        if !principal.is_active || !password::verify(&credentials.password, &principal.password_hash)
        {
            return Err(IdentityError::InvalidCredentials);
        }

        let now = Utc::now();
        let principal = match self.principals.modify(&principal.id, |stored| {
            stored.last_login = Some(now);
            Ok::<_, RepositoryError>(())
        }) {
            Ok(Some(updated)) => updated,
            Ok(None) => return Err(IdentityError::InvalidCredentials),
            Err(err) => {
                warn!(principal_id = %principal.id, error = %err, "failed to record last login");
                principal
            }
        };

        info!(principal_id = %principal.id, role = principal.role().label(), "principal logged in");
        self.session_for(principal)
    }

    pub fn profile(&self, id: &PrincipalId) -> Result<Principal, IdentityError> {
        self.principals.fetch(id)?.ok_or(IdentityError::NotFound)
    }

    pub fn update_profile(
        &self,
        principal: &Principal,
        update: ProfileUpdate,
    ) -> Result<Principal, IdentityError> {
        self.apply_profile_update(&principal.id, update)
    }

    pub(super) fn apply_profile_update(
        &self,
        id: &PrincipalId,
        update: ProfileUpdate,
    ) -> Result<Principal, IdentityError> {
        if update.password.is_some() {
            return Err(IdentityError::PasswordChangeNotAllowed);
        }

        self.principals
            .modify(id, |current| -> Result<(), IdentityError> {
                update.apply_to(&mut current.profile);
                current.updated_at = Utc::now();
                Ok(())
            })?
            .ok_or(IdentityError::NotFound)
    }

    pub fn delete_user(
        &self,
        requested_by: &Principal,
        id: &PrincipalId,
    ) -> Result<Principal, IdentityError> {
        policy::require_role(requested_by, &[Role::Admin])?;
        let removed = self.principals.delete(id)?.ok_or(IdentityError::NotFound)?;
        info!(principal_id = %removed.id, deleted_by = %requested_by.id, "principal deleted");
        Ok(removed)
    }

    /// Resolves a bearer token to the live principal it names.
    pub fn authenticate(&self, token: &str) -> Result<Principal, IdentityError> {
        let claims = self.tokens.verify(token).map_err(IdentityError::InvalidToken)?;
        match self.principals.fetch(&PrincipalId(claims.sub))? {
            Some(principal) if principal.is_active => Ok(principal),
            _ => Err(IdentityError::UnknownSubject),
        }
    }

    fn session_for(&self, principal: Principal) -> Result<Session, IdentityError> {
        let token = self
            .tokens
            .issue(&principal)
            .map_err(IdentityError::TokenIssue)?;
        Ok(Session { principal, token })
    }
}
