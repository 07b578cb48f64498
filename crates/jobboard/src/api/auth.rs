use crate::error::ApiError;
use crate::identity::domain::Principal;
use crate::identity::repository::PrincipalRepository;
use crate::identity::service::{IdentityError, IdentityService};
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Name of the session cookie set on login and registration.
pub const TOKEN_COOKIE: &str = "token";

/// Resolves a raw bearer token to a principal.
pub trait Authenticate: Send + Sync {
    fn authenticate(&self, token: &str) -> Result<Principal, IdentityError>;
}

impl<P> Authenticate for IdentityService<P>
where
    P: PrincipalRepository + 'static,
{
    fn authenticate(&self, token: &str) -> Result<Principal, IdentityError> {
        IdentityService::authenticate(self, token)
    }
}

#[derive(Clone)]
pub struct Authenticator(Arc<dyn Authenticate>);

impl Authenticator {
    pub fn new<A>(inner: Arc<A>) -> Self
    where
        A: Authenticate + 'static,
    {
        Self(inner)
    }
}

/// Extracts the authenticated principal, rejecting with 401 when absent or invalid.
pub struct AuthPrincipal(pub Principal);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthPrincipal
where
    Authenticator: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let authenticator = Authenticator::from_ref(state);
        let token = session_token(&parts.headers).ok_or(IdentityError::MissingToken)?;
        let principal = authenticator.0.authenticate(&token)?;
        Ok(Self(principal))
    }
}

/// `Authorization: Bearer` wins over the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
    })
}
