use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::assets;
use crate::reload::{inject_reload_script, reload_handler};
use crate::render::{render_context, render_convention, RenderOutcome};
use crate::state::SharedState;

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/favicon.ico", get(favicon))
        .route("/__reload", get(reload_handler))
        .fallback(dispatch)
        .with_state(state)
}

async fn favicon() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn dispatch(State(state): State<SharedState>, request: Request) -> Response {
    let path = request.uri().path().to_string();
    tracing::debug!(method = %request.method(), path, "request");

    if let Some(rest) = path.strip_prefix("/static/") {
        let root = state.config.content_root.as_ref().unwrap_or(&state.config.static_dir);
        return assets::serve_static(root, rest).await;
    }
    if let Some(rest) = path.strip_prefix("/assets/") {
        let assets_dir = state.workspace_root.join("assets");
        if assets_dir.is_dir() {
            return assets::serve_static(&assets_dir, rest).await;
        }
        return assets::not_found();
    }

    let guard = state.state.read().await;
    let outcome = match &guard.nav {
        loom_nav::NavModel::Convention(_) => render_convention(&state, &guard.nav, &path),
        loom_nav::NavModel::Context(_) => render_context(&state, &guard.nav, &guard.shared_files, &path),
    };
    drop(guard);

    match outcome {
        RenderOutcome::Ok(html) => Html(inject_reload_script(&html)).into_response(),
        RenderOutcome::NotFound => (StatusCode::NOT_FOUND, "Not Found").into_response(),
        RenderOutcome::Error(message) => {
            tracing::warn!(path, error = %message, "render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
        }
    }
}
