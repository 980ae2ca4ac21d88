//! MIME sniffing and static-asset serving for `/static/...` and
//! `/assets/...`.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;
use camino::Utf8Path;

/// Extension-based MIME lookup. Unrecognised extensions fall back to an
/// opaque octet stream rather than guessing.
pub fn mime_from_extension(path: &str) -> &'static str {
    match path.rsplit('.').next() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",
        Some("xml") => "application/xml",
        Some("txt") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}

/// Serves `relative` from under `root`, rejecting any path that escapes
/// `root` once resolved (no `..` traversal).
pub async fn serve_static(root: &Utf8Path, relative: &str) -> Response {
    let relative = relative.trim_start_matches('/');
    if relative.split('/').any(|seg| seg == "..") {
        return not_found();
    }
    let path = root.join(relative);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, mime_from_extension(path.as_str()))
            .body(Body::from(bytes))
            .unwrap(),
        Err(_) => not_found(),
    }
}

pub fn not_found() -> Response {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from("Not Found"))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_common_extensions() {
        assert_eq!(mime_from_extension("style.css"), "text/css; charset=utf-8");
        assert_eq!(mime_from_extension("app.js"), "application/javascript; charset=utf-8");
        assert_eq!(mime_from_extension("logo.svg"), "image/svg+xml");
        assert_eq!(mime_from_extension("data.bin"), "application/octet-stream");
    }

    #[tokio::test]
    async fn traversal_outside_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        std::fs::write(root.join("safe.txt"), "ok").unwrap();

        let ok = serve_static(root, "safe.txt").await;
        assert_eq!(ok.status(), StatusCode::OK);

        let blocked = serve_static(root, "../../etc/passwd").await;
        assert_eq!(blocked.status(), StatusCode::NOT_FOUND);
    }
}
