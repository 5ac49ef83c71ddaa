use axum::body::Body;
use axum::http::{Request, header};
use axum::response::Response;
use tower::ServiceExt;

use super::*;
use crate::backend::test_helpers::MockOutcome;
use crate::state::test_helpers::test_app_state;

async fn get_page(path: &str, cookie: Option<&str>) -> Response {
    let (state, _) = test_app_state(MockOutcome::Valid);
    let mut req = Request::get(path);
    if let Some(cookie) = cookie {
        req = req.header(header::COOKIE, cookie);
    }
    app(state)
        .oneshot(req.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn location(resp: &Response) -> Option<&str> {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn healthz_ok() {
    let resp = get_page("/healthz", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn share_page_without_cookie_reaches_page_service() {
    let resp = get_page("/share/debt-loan/demo", None).await;
    assert!(location(&resp).is_none());
    // No public dir in tests, so the page service answers 404.
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dashboard_without_cookie_redirects_to_login() {
    let resp = get_page("/dashboard", None).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), Some("/login?redirect=%2Fdashboard"));
}

#[tokio::test]
async fn nested_protected_path_keeps_full_path_in_redirect() {
    let resp = get_page("/transactions/2024/03", None).await;
    assert_eq!(location(&resp), Some("/login?redirect=%2Ftransactions%2F2024%2F03"));
}

#[tokio::test]
async fn register_with_cookie_redirects_to_dashboard() {
    let resp = get_page("/register", Some("auth-token=abc")).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), Some("/dashboard"));
}

#[tokio::test]
async fn login_without_cookie_is_served() {
    let resp = get_page("/login", None).await;
    assert!(location(&resp).is_none());
}

#[tokio::test]
async fn protected_page_with_cookie_is_served_without_validation() {
    let (state, backend) = test_app_state(MockOutcome::Rejected);
    let resp = app(state)
        .oneshot(
            Request::get("/dashboard")
                .header(header::COOKIE, "auth-token=expired")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(location(&resp).is_none());
    assert_eq!(backend.validate_count(), 0);
}

#[tokio::test]
async fn unknown_api_route_is_not_redirected() {
    let resp = get_page("/api/categories", None).await;
    assert!(location(&resp).is_none());
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn api_me_without_cookie_is_401_not_redirect() {
    let resp = get_page("/api/auth/me", None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(location(&resp).is_none());
}
