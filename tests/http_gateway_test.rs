//! Gateway tests over the assembled router: cookie handling, the
//! undifferentiated 401 contract, and service-key enforcement.

use authgate::auth::{
    IssueSessionResponse, JwtService, MemorySessionStore, RefreshResponse, RuntimeMode,
    ServiceKeyManager, SessionManager,
};
use authgate::error::{ErrorCode, ErrorResponse};
use authgate::http::{routes, HttpServerState};
use authgate::repository::MemoryUserDirectory;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use tower_cookies::CookieManagerLayer;

const SECRET: &str = "gateway-secret-key-32-bytes-long!";
const SERVICE_KEY: &str = "svc-test-key";
const WEEK_SECS: i64 = 7 * 24 * 3600;

async fn test_app() -> Router {
    let jwt = Arc::new(JwtService::new(SECRET, 900).unwrap());
    let store = Arc::new(MemorySessionStore::new());
    let users = Arc::new(MemoryUserDirectory::new());
    users.insert(42, "alice").await;

    let session_manager = Arc::new(SessionManager::new(
        jwt.clone(),
        store,
        users.clone(),
        WEEK_SECS,
        Duration::from_secs(5),
        RuntimeMode::Production,
    ));

    let state = HttpServerState {
        session_manager,
        access_issuer: jwt,
        service_key_manager: Arc::new(ServiceKeyManager::new(SERVICE_KEY.to_string())),
        user_directory: users,
        cookie_secure: false,
    };

    Router::new()
        .merge(routes::create_routes())
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn refresh_request(cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri("/api/auth/refresh");
    if let Some(raw) = cookie {
        builder = builder.header(header::COOKIE, format!("refresh_token={}", raw));
    }
    builder.body(Body::empty()).unwrap()
}

fn admin_request(uri: &str, service_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(key) = service_key {
        builder = builder.header("X-Service-Key", key);
    }
    builder
        .body(Body::from(json!({"user_id": 42}).to_string()))
        .unwrap()
}

#[tokio::test]
async fn refresh_without_cookie_is_401() {
    let app = test_app().await;

    let response = app.oneshot(refresh_request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: ErrorResponse = body_json(response).await;
    assert_eq!(body.code, ErrorCode::Unauthorized);
    assert_eq!(body.message, "invalid refresh credential");
}

#[tokio::test]
async fn absent_and_garbage_cookies_are_indistinguishable() {
    let app = test_app().await;

    let absent = app.clone().oneshot(refresh_request(None)).await.unwrap();
    let garbage = app.oneshot(refresh_request(Some("not.a.jwt"))).await.unwrap();

    assert_eq!(absent.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);

    let absent_body: ErrorResponse = body_json(absent).await;
    let garbage_body: ErrorResponse = body_json(garbage).await;
    assert_eq!(absent_body.code, garbage_body.code);
    assert_eq!(absent_body.message, garbage_body.message);
}

#[tokio::test]
async fn admin_routes_require_the_service_key() {
    let app = test_app().await;

    for uri in ["/api/admin/sessions/issue", "/api/admin/sessions/revoke"] {
        let missing = app.clone().oneshot(admin_request(uri, None)).await.unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        let body: ErrorResponse = body_json(missing).await;
        assert_eq!(body.code, ErrorCode::Unauthorized);

        let wrong = app
            .clone()
            .oneshot(admin_request(uri, Some("wrong-key")))
            .await
            .unwrap();
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }
}

#[tokio::test]
async fn cookie_refresh_flow_rotates_and_bounds_the_cookie() {
    let app = test_app().await;

    // The backend mints the initial session through the admin API.
    let issued = app
        .clone()
        .oneshot(admin_request("/api/admin/sessions/issue", Some(SERVICE_KEY)))
        .await
        .unwrap();
    assert_eq!(issued.status(), StatusCode::OK);
    let issued: IssueSessionResponse = body_json(issued).await;

    // First refresh with the raw credential in the cookie succeeds.
    let response = app
        .clone()
        .oneshot(refresh_request(Some(&issued.refresh_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The rotated cookie's Max-Age tracks the session's remaining
    // lifetime, it is not reset to the full TTL.
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.contains("HttpOnly"));
    let max_age: i64 = set_cookie
        .split(';')
        .find_map(|part| part.trim().strip_prefix("Max-Age="))
        .unwrap()
        .parse()
        .unwrap();
    assert!(max_age <= WEEK_SECS);
    assert!(max_age > WEEK_SECS - 300);

    let refreshed: RefreshResponse = body_json(response).await;
    assert_eq!(refreshed.user_id, 42);
    assert!(!refreshed.token.is_empty());

    // Replaying the pre-rotation credential gets the generic 401.
    let replay = app
        .oneshot(refresh_request(Some(&issued.refresh_token)))
        .await
        .unwrap();
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    let body: ErrorResponse = body_json(replay).await;
    assert_eq!(body.code, ErrorCode::Unauthorized);
    assert_eq!(body.message, "invalid refresh credential");
}

#[tokio::test]
async fn admin_revocation_kills_the_cookie_flow() {
    let app = test_app().await;

    let issued = app
        .clone()
        .oneshot(admin_request("/api/admin/sessions/issue", Some(SERVICE_KEY)))
        .await
        .unwrap();
    let issued: IssueSessionResponse = body_json(issued).await;

    let revoked = app
        .clone()
        .oneshot(admin_request("/api/admin/sessions/revoke", Some(SERVICE_KEY)))
        .await
        .unwrap();
    assert_eq!(revoked.status(), StatusCode::OK);

    let response = app
        .oneshot(refresh_request(Some(&issued.refresh_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
