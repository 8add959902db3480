use crate::helpers::{get_request, json_body, make_test_app};
use axum::http::StatusCode;
use tower::ServiceExt;

#[tokio::test]
async fn health_is_public() {
    let (app, _) = make_test_app().await;

    let response = app.oneshot(get_request("/api/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["data"], "OK");
}
