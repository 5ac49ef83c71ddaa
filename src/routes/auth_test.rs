use axum::Router;
use axum::body::Body;
use axum::http::Request;
use tower::ServiceExt;

use super::*;
use crate::backend::test_helpers::{MockBackend, MockOutcome};
use crate::state::test_helpers::{test_app_state, test_config};

fn app_with(outcome: MockOutcome) -> (Router, std::sync::Arc<MockBackend>) {
    let (state, backend) = test_app_state(outcome);
    (crate::routes::app(state), backend)
}

async fn body_json(resp: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_cookies(resp: &Response) -> Vec<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_owned))
        .collect()
}

fn login_request(username: &str, password: &str) -> Request<Body> {
    Request::post("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::json!({ "username": username, "password": password }).to_string()))
        .unwrap()
}

// =============================================================================
// token_from_headers
// =============================================================================

#[test]
fn token_from_cookie() {
    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, "theme=dark; auth-token=abc".parse().unwrap());
    assert_eq!(token_from_headers(&headers).as_deref(), Some("abc"));
}

#[test]
fn token_from_bearer_header() {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, "Bearer xyz".parse().unwrap());
    assert_eq!(token_from_headers(&headers).as_deref(), Some("xyz"));
}

#[test]
fn cookie_wins_over_bearer() {
    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, "auth-token=from-cookie".parse().unwrap());
    headers.insert(header::AUTHORIZATION, "Bearer from-header".parse().unwrap());
    assert_eq!(token_from_headers(&headers).as_deref(), Some("from-cookie"));
}

#[test]
fn malformed_tokens_are_absent() {
    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, "auth-token=".parse().unwrap());
    headers.insert(header::AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
    assert_eq!(token_from_headers(&headers), None);

    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, "Bearer    ".parse().unwrap());
    assert_eq!(token_from_headers(&headers), None);
}

// =============================================================================
// backend_error_to_status / cookies
// =============================================================================

#[test]
fn backend_error_status_mapping() {
    assert_eq!(
        backend_error_to_status(&BackendError::Rejected { status: 403, message: String::new() }),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(backend_error_to_status(&BackendError::Request("x".into())), StatusCode::BAD_GATEWAY);
    assert_eq!(backend_error_to_status(&BackendError::Parse("x".into())), StatusCode::BAD_GATEWAY);
}

#[test]
fn session_cookie_attributes() {
    let mut config = test_config();
    config.cookie_secure = true;
    config.session_max_age_secs = 60;
    let cookie = session_cookie(&config, "tok".into());
    assert_eq!(cookie.name(), "auth-token");
    assert_eq!(cookie.value(), "tok");
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    assert_eq!(cookie.max_age(), Some(Duration::seconds(60)));
}

#[test]
fn cleared_cookie_expires_immediately() {
    let cookie = cleared_session_cookie(&test_config());
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.max_age(), Some(Duration::ZERO));
}

// =============================================================================
// handlers
// =============================================================================

#[tokio::test]
async fn login_sets_cookie_and_returns_token() {
    let (app, backend) = app_with(MockOutcome::Valid);
    let resp = app.oneshot(login_request("ana", "correct")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let cookies = set_cookies(&resp);
    assert!(cookies.iter().any(|c| c.starts_with("auth-token=token-ana") && c.contains("HttpOnly")));
    let json = body_json(resp).await;
    assert_eq!(json["token"], "token-ana");
    assert_eq!(json["user"]["username"], "ana");
    assert_eq!(backend.issue_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn login_with_bad_password_is_401_without_cookie() {
    let (app, _) = app_with(MockOutcome::Valid);
    let resp = app.oneshot(login_request("ana", "wrong")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&resp).is_empty());
    assert_eq!(body_json(resp).await["error"], "invalid username or password");
}

#[tokio::test]
async fn login_with_unreachable_backend_is_502() {
    let (app, _) = app_with(MockOutcome::Unreachable);
    let resp = app.oneshot(login_request("ana", "correct")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn login_with_blank_fields_skips_backend() {
    let (app, backend) = app_with(MockOutcome::Valid);
    let resp = app.oneshot(login_request("   ", "correct")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(backend.issue_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn logout_expires_cookie() {
    let (app, _) = app_with(MockOutcome::Valid);
    let req = Request::post("/api/auth/logout")
        .header(header::COOKIE, "auth-token=abc")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let cookies = set_cookies(&resp);
    assert!(cookies.iter().any(|c| c.starts_with("auth-token=") && c.contains("Max-Age=0")));
}

#[tokio::test]
async fn me_requires_token() {
    let (app, _) = app_with(MockOutcome::Valid);
    let resp = app
        .oneshot(Request::get("/api/auth/me").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_current_user() {
    let (app, _) = app_with(MockOutcome::Valid);
    let req = Request::get("/api/auth/me")
        .header(header::COOKIE, "auth-token=token-ana")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["username"], "ana");
}

#[tokio::test]
async fn me_with_rejected_token_is_401() {
    let (app, _) = app_with(MockOutcome::Rejected);
    let req = Request::get("/api/auth/me")
        .header(header::AUTHORIZATION, "Bearer stale")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"], "authentication required");
}

#[tokio::test]
async fn validate_reports_valid_token() {
    let (app, _) = app_with(MockOutcome::Valid);
    let req = Request::post("/api/auth/validate")
        .header(header::COOKIE, "auth-token=abc")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["valid"], true);
}

#[tokio::test]
async fn validate_fails_closed() {
    for outcome in [MockOutcome::Rejected, MockOutcome::Unreachable, MockOutcome::Hang] {
        let (app, _) = app_with(outcome);
        let req = Request::post("/api/auth/validate")
            .header(header::COOKIE, "auth-token=abc")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{outcome:?}");
        assert_eq!(body_json(resp).await["valid"], false);
    }
}

#[tokio::test]
async fn validate_without_token_makes_no_call() {
    let (app, backend) = app_with(MockOutcome::Valid);
    let resp = app
        .oneshot(Request::post("/api/auth/validate").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(backend.validate_count(), 0);
}
