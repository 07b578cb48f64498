use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use super::directory::UserStats;
use super::domain::{
    LoginRequest, PasswordChange, PrincipalId, PrincipalView, ProfileUpdate, RegisterRequest, Role,
};
use super::repository::{PrincipalFilter, PrincipalRepository};
use super::service::{IdentityService, Session};
use crate::api::auth::Authenticator;
use crate::api::{
    offload, page_request, AuthPrincipal, Envelope, QueryParams, RouteState, ValidatedJson,
    TOKEN_COOKIE,
};
use crate::error::{ApiError, ApiResult};

/// Registration, login, and profile endpoints under `/api/auth`.
pub fn identity_router<P>(
    service: Arc<IdentityService<P>>,
    auth: Authenticator,
    secure_cookies: bool,
) -> Router
where
    P: PrincipalRepository + 'static,
{
    Router::new()
        .route("/api/auth/register", post(register_handler::<P>))
        .route("/api/auth/login", post(login_handler::<P>))
        .route("/api/auth/logout", post(logout_handler))
        .route(
            "/api/auth/profile",
            get(profile_handler::<P>).put(update_profile_handler::<P>),
        )
        .route("/api/auth/users/:user_id", delete(delete_user_handler::<P>))
        .with_state(IdentityRoutes {
            inner: RouteState::new(service, auth),
            secure_cookies,
        })
}

struct IdentityRoutes<P> {
    inner: RouteState<IdentityService<P>>,
    secure_cookies: bool,
}

impl<P> Clone for IdentityRoutes<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            secure_cookies: self.secure_cookies,
        }
    }
}

impl<P> axum::extract::FromRef<IdentityRoutes<P>> for Authenticator {
    fn from_ref(state: &IdentityRoutes<P>) -> Self {
        state.inner.auth.clone()
    }
}

#[derive(serde::Serialize)]
struct SessionPayload {
    user: PrincipalView,
    token: String,
}

fn session_response(
    status: StatusCode,
    jar: CookieJar,
    session: Session,
    message: &'static str,
    ttl_secs: u64,
    secure: bool,
) -> Response {
    let cookie = Cookie::build((TOKEN_COOKIE, session.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(time::Duration::seconds(ttl_secs as i64));
    let payload = SessionPayload {
        user: session.principal.view(),
        token: session.token,
    };
    (
        status,
        jar.add(cookie),
        Json(Envelope::new(payload).with_message(message)),
    )
        .into_response()
}

async fn register_handler<P>(
    State(state): State<IdentityRoutes<P>>,
    jar: CookieJar,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> ApiResult<Response>
where
    P: PrincipalRepository + 'static,
{
    let service = Arc::clone(&state.inner.service);
    let ttl = service.token_ttl().as_secs();
    let session = offload(move || service.register(request)).await?;
    Ok(session_response(
        StatusCode::CREATED,
        jar,
        session,
        "User registered successfully",
        ttl,
        state.secure_cookies,
    ))
}

async fn login_handler<P>(
    State(state): State<IdentityRoutes<P>>,
    jar: CookieJar,
    ValidatedJson(credentials): ValidatedJson<LoginRequest>,
) -> ApiResult<Response>
where
    P: PrincipalRepository + 'static,
{
    let service = Arc::clone(&state.inner.service);
    let ttl = service.token_ttl().as_secs();
    let session = offload(move || service.login(credentials)).await?;
    Ok(session_response(
        StatusCode::OK,
        jar,
        session,
        "Login successful",
        ttl,
        state.secure_cookies,
    ))
}

async fn logout_handler(
    AuthPrincipal(principal): AuthPrincipal,
    jar: CookieJar,
) -> impl IntoResponse {
    tracing::info!(principal_id = %principal.id, "principal logged out");
    (
        jar.remove(Cookie::build(TOKEN_COOKIE).path("/")),
        Json(Envelope::message("Logout successful")),
    )
}

async fn profile_handler<P>(
    State(state): State<IdentityRoutes<P>>,
    AuthPrincipal(principal): AuthPrincipal,
) -> ApiResult<Json<Envelope<PrincipalView>>>
where
    P: PrincipalRepository + 'static,
{
    let current = state.inner.service.profile(&principal.id)?;
    Ok(Json(Envelope::new(current.view())))
}

async fn update_profile_handler<P>(
    State(state): State<IdentityRoutes<P>>,
    AuthPrincipal(principal): AuthPrincipal,
    ValidatedJson(update): ValidatedJson<ProfileUpdate>,
) -> ApiResult<Json<Envelope<PrincipalView>>>
where
    P: PrincipalRepository + 'static,
{
    let updated = state.inner.service.update_profile(&principal, update)?;
    Ok(Json(
        Envelope::new(updated.view()).with_message("Profile updated successfully"),
    ))
}

async fn delete_user_handler<P>(
    State(state): State<IdentityRoutes<P>>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Envelope<()>>>
where
    P: PrincipalRepository + 'static,
{
    state
        .inner
        .service
        .delete_user(&principal, &PrincipalId(user_id))?;
    Ok(Json(Envelope::message("User deleted successfully")))
}

type UserState<P> = RouteState<IdentityService<P>>;

/// Account administration under `/api/users`.
pub fn user_router<P>(service: Arc<IdentityService<P>>, auth: Authenticator) -> Router
where
    P: PrincipalRepository + 'static,
{
    Router::new()
        .route("/api/users", get(list_users_handler::<P>))
        .route("/api/users/search", get(search_users_handler::<P>))
        .route("/api/users/stats/overview", get(user_stats_handler::<P>))
        .route(
            "/api/users/:user_id",
            get(user_handler::<P>)
                .put(update_user_handler::<P>)
                .delete(remove_user_handler::<P>),
        )
        .route(
            "/api/users/:user_id/password",
            put(change_password_handler::<P>),
        )
        .with_state(RouteState::new(service, auth))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UserListParams {
    role: Option<String>,
    #[serde(alias = "query")]
    search: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
}

impl UserListParams {
    fn role(&self) -> Result<Option<Role>, ApiError> {
        match self.role.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => Role::parse(raw)
                .map(Some)
                .ok_or_else(|| ApiError::validation("Role must be one of: employee, employer, admin")),
        }
    }

    fn text(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

async fn list_users_handler<P>(
    State(state): State<UserState<P>>,
    AuthPrincipal(principal): AuthPrincipal,
    QueryParams(params): QueryParams<UserListParams>,
) -> ApiResult<Json<Envelope<Vec<PrincipalView>>>>
where
    P: PrincipalRepository + 'static,
{
    let page = page_request(params.page, params.limit)?;
    let filter = PrincipalFilter {
        role: params.role()?,
        text: params.text().map(str::to_string),
        ..PrincipalFilter::default()
    };
    let users = state.service.list_users(&principal, &filter, page)?;
    let views = users.try_map(|user| Ok::<_, ApiError>(user.view()))?;
    Ok(Json(Envelope::page(views)))
}

async fn search_users_handler<P>(
    State(state): State<UserState<P>>,
    AuthPrincipal(principal): AuthPrincipal,
    QueryParams(params): QueryParams<UserListParams>,
) -> ApiResult<Json<Envelope<Vec<PrincipalView>>>>
where
    P: PrincipalRepository + 'static,
{
    let role = params.role()?;
    let users = state
        .service
        .search_users(&principal, params.text().unwrap_or_default(), role)?;
    Ok(Json(Envelope::listing(
        users.iter().map(|user| user.view()).collect(),
    )))
}

async fn user_stats_handler<P>(
    State(state): State<UserState<P>>,
    AuthPrincipal(principal): AuthPrincipal,
) -> ApiResult<Json<Envelope<UserStats>>>
where
    P: PrincipalRepository + 'static,
{
    let stats = state.service.user_stats(&principal)?;
    Ok(Json(Envelope::new(stats)))
}

async fn user_handler<P>(
    State(state): State<UserState<P>>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Envelope<PrincipalView>>>
where
    P: PrincipalRepository + 'static,
{
    let user = state.service.user(&principal, &PrincipalId(user_id))?;
    Ok(Json(Envelope::new(user.view())))
}

async fn update_user_handler<P>(
    State(state): State<UserState<P>>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(user_id): Path<String>,
    ValidatedJson(update): ValidatedJson<ProfileUpdate>,
) -> ApiResult<Json<Envelope<PrincipalView>>>
where
    P: PrincipalRepository + 'static,
{
    let updated = state
        .service
        .update_user(&principal, &PrincipalId(user_id), update)?;
    Ok(Json(
        Envelope::new(updated.view()).with_message("User profile updated successfully"),
    ))
}

async fn change_password_handler<P>(
    State(state): State<UserState<P>>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(user_id): Path<String>,
    ValidatedJson(change): ValidatedJson<PasswordChange>,
) -> ApiResult<Json<Envelope<()>>>
where
    P: PrincipalRepository + 'static,
{
    let service = Arc::clone(&state.service);
    offload(move || service.change_password(&principal, &PrincipalId(user_id), change)).await?;
    Ok(Json(Envelope::message("Password changed successfully")))
}

async fn remove_user_handler<P>(
    State(state): State<UserState<P>>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Envelope<()>>>
where
    P: PrincipalRepository + 'static,
{
    state.service.delete_user(&principal, &PrincipalId(user_id))?;
    Ok(Json(Envelope::message("User deleted successfully")))
}
