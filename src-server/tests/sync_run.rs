use axum::{
    body::Body,
    http::{Method, Request},
};
use inboxledger_server::{api::app_router, build_state, config::Config};
use tempfile::tempdir;
use tower::ServiceExt;

#[tokio::test]
async fn sync_run_with_no_authorized_users_reports_zero_counts() {
    let tmp = tempdir().unwrap();
    std::env::set_var("IL_DATA_DIR", tmp.path());
    let config = Config::from_env();
    let state = build_state(&config).await.unwrap();
    let app = app_router(state, &config);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/sync/run")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["imported"], 0);
    assert_eq!(body["skipped"], 0);
}
