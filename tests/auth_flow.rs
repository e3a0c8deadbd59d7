use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use sea_orm::{DatabaseBackend, MockDatabase};
use serde_json::json;
use tower::ServiceExt; // for `oneshot`
use uuid::Uuid;

use mail_relay::{
    auth::{Role, password::hash_password},
    db::entities::{account, user},
    test_helpers::{
        RecordingTransport, fixed_ts, session_bearer, test_router, test_router_with_state,
        test_state, user_model,
    },
};

fn app_with_users(results: Vec<Vec<user::Model>>) -> axum::Router {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(results)
        .into_connection();
    test_router_with_state(test_state(db, RecordingTransport::new()))
}

async fn json_body(res: axum::response::Response) -> serde_json::Value {
    let body = body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let res = test_router()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["data"]["status"], "ok");
}

#[tokio::test]
async fn protected_route_without_token_is_rejected() {
    let res = test_router()
        .oneshot(
            Request::builder()
                .uri("/api/accounts")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let json = json_body(res).await;
    assert_eq!(json["error"], "unauthenticated");
}

#[tokio::test]
async fn garbage_bearer_is_rejected() {
    let res = test_router()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header("authorization", "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_reports_pending_password_change() {
    let hash = hash_password("adminpassword").unwrap();
    let admin = user_model("admin@example.com", Role::Admin, &hash, true);
    // find_by_email, then the last-login update reads and writes the row
    let app = app_with_users(vec![vec![admin.clone()], vec![admin.clone()], vec![admin]]);

    let payload = json!({"email": "Admin@Example.com", "password": "adminpassword"});
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert!(json["data"]["token"].as_str().is_some());
    assert_eq!(json["data"]["tokenType"], "Bearer");
    assert_eq!(json["data"]["role"], "admin");
    assert_eq!(json["data"]["mustChangePassword"], true);
}

#[tokio::test]
async fn login_with_unknown_email_is_unauthorized() {
    let app = app_with_users(vec![vec![]]);

    let payload = json!({"email": "nobody@example.com", "password": "whatever123"});
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let json = json_body(res).await;
    assert_eq!(json["error"], "invalid_credentials");
}

#[tokio::test]
async fn me_returns_the_stored_user() {
    let user = user_model("dev@example.com", Role::Dev, "hash", false);
    let bearer = session_bearer(&user.id, Role::Dev);
    // one read to authenticate, one for the profile itself
    let app = app_with_users(vec![vec![user.clone()], vec![user.clone()]]);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header("authorization", bearer)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["data"]["email"], "dev@example.com");
    assert_eq!(json["data"]["role"], "dev");
    assert_eq!(json["data"]["credential"], "session");
    assert_eq!(json["data"]["id"], user.id.to_string());
}

#[tokio::test]
async fn pending_password_change_blocks_sending() {
    let user = user_model("user@example.com", Role::User, "hash", true);
    let bearer = session_bearer(&user.id, Role::User);
    let app = app_with_users(vec![vec![user]]);

    let payload = json!({
        "from": "team@example.com",
        "to": "someone@example.org",
        "subject": "hi",
        "body": "hello"
    });
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/send")
                .header("authorization", bearer)
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let json = json_body(res).await;
    assert_eq!(json["message"], "Password change required");
}

#[tokio::test]
async fn admin_cannot_delete_self() {
    let admin = user_model("admin@example.com", Role::Admin, "hash", false);
    let bearer = session_bearer(&admin.id, Role::Admin);
    let uri = format!("/api/users/{}", admin.id);
    let app = app_with_users(vec![vec![admin]]);

    let res = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .header("authorization", bearer)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn dev_cannot_read_foreign_private_account() {
    let dev = user_model("dev@example.com", Role::Dev, "hash", false);
    let bearer = session_bearer(&dev.id, Role::Dev);
    let foreign = account::Model {
        id: Uuid::new_v4(),
        created_at: fixed_ts(),
        updated_at: fixed_ts(),
        email: "ops@example.com".to_string(),
        display_name: None,
        password: "smtp-secret".to_string(),
        is_active: true,
        owner_id: Some(Uuid::new_v4()),
        is_public: false,
    };
    let uri = format!("/api/accounts/{}", foreign.id);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![dev]])
        .append_query_results([vec![foreign]])
        .into_connection();
    let app = test_router_with_state(test_state(db, RecordingTransport::new()));

    let res = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .header("authorization", bearer)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn user_role_cannot_manage_users() {
    let user = user_model("user@example.com", Role::User, "hash", false);
    let bearer = session_bearer(&user.id, Role::User);
    let app = app_with_users(vec![vec![user]]);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/users")
                .header("authorization", bearer)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let json = json_body(res).await;
    assert_eq!(json["message"], "Admin role required");
}

#[tokio::test]
async fn malformed_json_gets_the_error_envelope() {
    let res = test_router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = json_body(res).await;
    assert_eq!(json["error"], "validation_error");
}
