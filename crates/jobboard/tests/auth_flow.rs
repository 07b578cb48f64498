mod common;

use axum::http::{header, StatusCode};
use common::{employer_payload, TestApp};
use serde_json::json;

#[tokio::test]
async fn login_sets_http_only_cookie_and_returns_profile() {
    let app = TestApp::new();
    app.register(employer_payload("acme")).await;

    let login = app
        .call(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "HR@acme.test", "password": "employer-pass" })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["message"], json!("Login successful"));
    assert!(login.body["data"]["user"].get("passwordHash").is_none());

    let cookie = login
        .headers
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("session cookie set");
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));

    let token = login.body["data"]["token"].as_str().expect("token");
    let profile = app
        .call("GET", "/api/auth/profile", Some(token), None)
        .await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["data"]["email"], json!("hr@acme.test"));
    assert_eq!(profile.body["data"]["role"], json!("employer"));
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_identical() {
    let app = TestApp::new();
    app.register(employer_payload("acme")).await;

    let wrong_password = app
        .call(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "hr@acme.test", "password": "not-the-one" })),
        )
        .await;
    let unknown_email = app
        .call(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ghost@acme.test", "password": "employer-pass" })),
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_email.body);
    assert_eq!(wrong_password.body["message"], json!("Invalid credentials"));
}

#[tokio::test]
async fn protected_routes_reject_missing_and_forged_tokens() {
    let app = TestApp::new();

    let missing = app.call("GET", "/api/auth/profile", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.body["message"], json!("Access token required"));

    let forged = app
        .call("GET", "/api/auth/profile", Some("not.a.jwt"), None)
        .await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
    assert_eq!(forged.body["message"], json!("Invalid or expired token"));
}

#[tokio::test]
async fn duplicate_registration_and_bad_payloads_are_rejected() {
    let app = TestApp::new();
    app.register(employer_payload("acme")).await;

    let duplicate = app
        .call(
            "POST",
            "/api/auth/register",
            None,
            Some(employer_payload("acme")),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        duplicate.body["message"],
        json!("User with this email already exists")
    );

    let short_password = app
        .call(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "userType": "admin",
                "email": "root@jobboard.test",
                "password": "123"
            })),
        )
        .await;
    assert_eq!(short_password.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        short_password.body["errors"],
        json!(["Password must be at least 6 characters long"])
    );

    let unknown_type = app
        .call(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "userType": "overlord",
                "email": "boss@jobboard.test",
                "password": "secret-pass"
            })),
        )
        .await;
    assert_eq!(unknown_type.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_admins_delete_users() {
    let app = TestApp::new();
    let employer = app.employer("acme").await;
    let employee = app.employee("dana").await;
    let admin = app.admin().await;

    let denied = app
        .call(
            "DELETE",
            &format!("/api/auth/users/{}", employee.id),
            Some(&employer.token),
            None,
        )
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let deleted = app
        .call(
            "DELETE",
            &format!("/api/auth/users/{}", employee.id),
            Some(&admin.token),
            None,
        )
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let stale = app
        .call("GET", "/api/auth/profile", Some(&employee.token), None)
        .await;
    assert_eq!(stale.status, StatusCode::UNAUTHORIZED);
    assert_eq!(stale.body["message"], json!("User not found"));

    let missing = app
        .call(
            "DELETE",
            &format!("/api/auth/users/{}", employee.id),
            Some(&admin.token),
            None,
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_logins_hash_off_the_async_workers() {
    let app = std::sync::Arc::new(TestApp::new());
    app.register(employer_payload("acme")).await;

    let logins: Vec<_> = (0..6)
        .map(|_| {
            let app = std::sync::Arc::clone(&app);
            tokio::spawn(async move {
                app.call(
                    "POST",
                    "/api/auth/login",
                    None,
                    Some(json!({ "email": "hr@acme.test", "password": "employer-pass" })),
                )
                .await
                .status
            })
        })
        .collect();

    for login in logins {
        assert_eq!(login.await.expect("login task joins"), StatusCode::OK);
    }
}
