//! Registration, token and permission gate tests

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{TestApp, PASSWORD};
use kanban_server::auth::TokenMode;
use kanban_server::models::UserPermission;

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "up");
}

#[tokio::test]
async fn test_register_then_login_and_refresh() {
    let app = TestApp::new().await;

    let (status, user) = app
        .send(
            Method::POST,
            "/users",
            None,
            Some(json!({"email": "new@kanban.dev", "password": PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["permission"], "none");
    assert!(user.get("password_hash").is_none());

    let (status, pair) = app
        .send(
            Method::POST,
            "/access",
            None,
            Some(json!({"email": "new@kanban.dev", "password": PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pair["token_type"], "bearer");

    let refresh_token = pair["refresh_token"].as_str().unwrap();
    let (status, fresh) = app
        .send(
            Method::POST,
            "/refresh",
            None,
            Some(json!({ "refresh_token": refresh_token })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fresh["email"], "new@kanban.dev");

    // An access token is not accepted for a refresh
    let access_token = pair["access_token"].as_str().unwrap();
    let (status, _) = app
        .send(
            Method::POST,
            "/refresh",
            None,
            Some(json!({ "refresh_token": access_token })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = TestApp::new().await;
    app.account("user@kanban.dev", UserPermission::User).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/access",
            None,
            Some(json!({"email": "user@kanban.dev", "password": "wrong"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid authorization credentials");

    let (status, _) = app
        .send(
            Method::POST,
            "/access",
            None,
            Some(json!({"email": "ghost@kanban.dev", "password": PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_email_is_bad_request() {
    let app = TestApp::new().await;
    app.account("taken@kanban.dev", UserPermission::None).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/users",
            None,
            Some(json!({"email": "taken@kanban.dev", "password": PASSWORD})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "duplicate");
    assert_eq!(body["detail"], "Key (email)=(taken@kanban.dev) already exists.");
}

#[tokio::test]
async fn test_gates_reject_missing_invalid_and_low_roles() {
    let app = TestApp::new().await;
    let outsider = app.account("none@kanban.dev", UserPermission::None).await;
    let member = app.account("member@kanban.dev", UserPermission::User).await;

    let (status, body) = app.send(Method::GET, "/users", None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Not authenticated");

    let (status, body) = app.get("/users", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, body) = app.get("/users", &outsider.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Don't have permissions");

    let (status, _) = app.get("/users", &member.token).await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/users/{}", outsider.user.id);
    let (status, _) = app.get(&uri, &member.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_refresh_token_is_not_an_access_token() {
    let app = TestApp::new().await;
    let member = app.account("member@kanban.dev", UserPermission::User).await;
    let refresh = app
        .state
        .tokens
        .issue(&member.user.email, TokenMode::RefreshToken)
        .unwrap();

    let (status, _) = app.get("/users/me", &refresh).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_only_admin_grants_permissions() {
    let app = TestApp::new().await;
    let admin = app.account("admin@kanban.dev", UserPermission::Admin).await;
    let moderator = app.account("mod@kanban.dev", UserPermission::Moderator).await;
    let fresh = app.account("fresh@kanban.dev", UserPermission::None).await;
    let uri = format!("/users/{}/permission", fresh.user.id);
    let grant = json!({"permission": "user", "is_verify": true});

    let (status, _) = app
        .send(Method::PUT, &uri, Some(&moderator.token), Some(grant.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, user) = app
        .send(Method::PUT, &uri, Some(&admin.token), Some(grant))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["permission"], "user");
    assert_eq!(user["is_verify"], true);

    let (status, _) = app.get("/users", &fresh.token).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_deactivated_account_loses_access() {
    let app = TestApp::new().await;
    let member = app.account("member@kanban.dev", UserPermission::User).await;

    let (status, body) = app
        .send(Method::DELETE, "/users/me", Some(&member.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "success");

    let (status, _) = app.get("/users/me", &member.token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(
            Method::POST,
            "/access",
            None,
            Some(json!({"email": "member@kanban.dev", "password": PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_route_accepts_trailing_slash() {
    let app = TestApp::new().await;
    let member = app.account("member@kanban.dev", UserPermission::User).await;

    let (status, body) = app.get("/users/me/", &member.token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "member@kanban.dev");
}

#[tokio::test]
async fn test_malformed_uuid_is_bad_request() {
    let app = TestApp::new().await;
    let moderator = app.account("mod@kanban.dev", UserPermission::Moderator).await;

    let (status, body) = app.get("/users/not-a-uuid", &moderator.token).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_password_change_rehashes_for_login() {
    let app = TestApp::new().await;
    let member = app.account("member@kanban.dev", UserPermission::User).await;

    let (status, _) = app
        .send(
            Method::PATCH,
            "/users/me",
            Some(&member.token),
            Some(json!({"password": "battery staple"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    for (password, expected) in [
        ("battery staple", StatusCode::OK),
        (PASSWORD, StatusCode::UNAUTHORIZED),
    ] {
        let (status, _) = app
            .send(
                Method::POST,
                "/access",
                None,
                Some(json!({"email": "member@kanban.dev", "password": password})),
            )
            .await;
        assert_eq!(status, expected, "login with {password:?}");
    }
}

#[tokio::test]
async fn test_moderator_updates_other_account() {
    let app = TestApp::new().await;
    let member = app.account("member@kanban.dev", UserPermission::User).await;
    let moderator = app.account("mod@kanban.dev", UserPermission::Moderator).await;
    let uri = format!("/users/{}", member.user.id);
    let body = json!({"email": "renamed@kanban.dev"});

    let (status, _) = app
        .send(Method::PATCH, &uri, Some(&member.token), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, user) = app
        .send(Method::PATCH, &uri, Some(&moderator.token), Some(body))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["email"], "renamed@kanban.dev");
    assert!(user.get("password_hash").is_none());

    let (status, _) = app
        .send(
            Method::PATCH,
            &uri,
            Some(&moderator.token),
            Some(json!({"email": "not-an-email"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_hard_delete_user() {
    let app = TestApp::new().await;
    let moderator = app.account("mod@kanban.dev", UserPermission::Moderator).await;
    let leaving = app.account("leaving@kanban.dev", UserPermission::User).await;
    let uri = format!("/users/{}", leaving.user.id);

    let (status, _) = app
        .send(Method::DELETE, &uri, Some(&moderator.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get(&uri, &moderator.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Not found");

    let (status, _) = app
        .send(Method::DELETE, &uri, Some(&moderator.token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_with_employee_profile_cannot_be_deleted() {
    let app = TestApp::new().await;
    let moderator = app.account("mod@kanban.dev", UserPermission::Moderator).await;
    let staff = app.account("staff@kanban.dev", UserPermission::User).await;
    let department = app.department("Sales").await;
    app.employee(staff.user.id, department.id, "+7").await;

    let uri = format!("/users/{}", staff.user.id);
    let (status, body) = app
        .send(Method::DELETE, &uri, Some(&moderator.token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, _) = app.get(&uri, &moderator.token).await;
    assert_eq!(status, StatusCode::OK);
}
