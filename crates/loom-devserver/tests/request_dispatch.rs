//! Integration test for the dev server's request dispatch table: builds a
//! real router over a temp-directory fixture and drives it with
//! `tower::ServiceExt::oneshot`, the way axum apps are conventionally
//! tested.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use camino::Utf8Path;
use loom_config::ServeConfig;
use loom_devserver::reload::Subscribers;
use loom_devserver::routes::build_router;
use loom_devserver::state::{AppState, Rebuildable};
use tower::ServiceExt;

fn config_for(root: &Utf8Path) -> ServeConfig {
    ServeConfig {
        pages_dir: root.join("pages"),
        layouts_dir: root.join("layouts"),
        partials_dir: root.join("partials"),
        static_dir: root.join("static"),
        layout_file: "base.html".to_string(),
        index_file: "index".to_string(),
        port: 3000,
        context_files: None,
        entry_file: None,
        data_file: None,
        data_dir: None,
        content_root: None,
        env_prefix: "LOOM_".to_string(),
    }
}

#[tokio::test]
async fn serves_a_convention_page_with_the_reload_script_injected() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8Path::from_path(dir.path()).unwrap();
    std::fs::create_dir_all(root.join("pages")).unwrap();
    std::fs::create_dir_all(root.join("layouts")).unwrap();
    std::fs::create_dir_all(root.join("partials")).unwrap();
    std::fs::write(root.join("pages/index.html"), "<html><body>Home</body></html>").unwrap();

    let config = config_for(root);
    let nav = loom_nav::build_convention(&config.pages_dir, "html", "index").unwrap();
    let state = Arc::new(AppState {
        workspace_root: root.to_path_buf(),
        state: tokio::sync::RwLock::new(Rebuildable { nav, shared_files: Vec::new() }),
        config,
        subscribers: Subscribers::new(),
    });

    let router = build_router(state);
    let response = router.oneshot(Request::builder().uri("/").body(Body::empty()).unwrap()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("Home"));
    assert!(html.contains("/__reload"));
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8Path::from_path(dir.path()).unwrap();
    std::fs::create_dir_all(root.join("pages")).unwrap();
    std::fs::create_dir_all(root.join("layouts")).unwrap();
    std::fs::create_dir_all(root.join("partials")).unwrap();

    let config = config_for(root);
    let nav = loom_nav::build_convention(&config.pages_dir, "html", "index").unwrap();
    let state = Arc::new(AppState {
        workspace_root: root.to_path_buf(),
        state: tokio::sync::RwLock::new(Rebuildable { nav, shared_files: Vec::new() }),
        config,
        subscribers: Subscribers::new(),
    });

    let router = build_router(state);
    let response = router.oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn assets_are_served_from_the_workspace_root_even_without_a_configured_content_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8Path::from_path(dir.path()).unwrap();
    std::fs::create_dir_all(root.join("pages")).unwrap();
    std::fs::create_dir_all(root.join("layouts")).unwrap();
    std::fs::create_dir_all(root.join("partials")).unwrap();
    std::fs::create_dir_all(root.join("assets")).unwrap();
    std::fs::write(root.join("assets/logo.svg"), "<svg></svg>").unwrap();

    let config = config_for(root);
    assert!(config.content_root.is_none());
    let nav = loom_nav::build_convention(&config.pages_dir, "html", "index").unwrap();
    let state = Arc::new(AppState {
        workspace_root: root.to_path_buf(),
        state: tokio::sync::RwLock::new(Rebuildable { nav, shared_files: Vec::new() }),
        config,
        subscribers: Subscribers::new(),
    });

    let router = build_router(state);
    let response = router.oneshot(Request::builder().uri("/assets/logo.svg").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(body.to_vec(), b"<svg></svg>");
}

#[tokio::test]
async fn static_asset_is_served_from_configured_directory() {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8Path::from_path(dir.path()).unwrap();
    std::fs::create_dir_all(root.join("pages")).unwrap();
    std::fs::create_dir_all(root.join("layouts")).unwrap();
    std::fs::create_dir_all(root.join("partials")).unwrap();
    std::fs::create_dir_all(root.join("static")).unwrap();
    std::fs::write(root.join("static/app.css"), "body{color:red}").unwrap();

    let config = config_for(root);
    let nav = loom_nav::build_convention(&config.pages_dir, "html", "index").unwrap();
    let state = Arc::new(AppState {
        workspace_root: root.to_path_buf(),
        state: tokio::sync::RwLock::new(Rebuildable { nav, shared_files: Vec::new() }),
        config,
        subscribers: Subscribers::new(),
    });

    let router = build_router(state);
    let response = router.oneshot(Request::builder().uri("/static/app.css").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(body.to_vec(), b"body{color:red}");
}
