pub mod assets;
pub mod error;
pub mod listen;
pub mod reload;
pub mod render;
pub mod routes;
pub mod state;
pub mod watch;

pub use error::{DevServerError, Result};

use std::sync::Arc;

use camino::Utf8PathBuf;
use loom_config::ServeConfig;

use state::{AppState, Rebuildable};

fn initial_state(config: &ServeConfig) -> Rebuildable {
    let extension = "html";
    if let Some(entry_path) = &config.entry_file {
        let includes = config
            .context_files
            .as_ref()
            .map(|files| {
                files
                    .iter()
                    .filter_map(|p| std::fs::read_to_string(p).ok().map(|s| (p.clone(), s)))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        match loom_nav::build_context(entry_path, &includes, extension) {
            Ok((nav, shared)) => {
                return Rebuildable {
                    nav,
                    shared_files: shared,
                }
            }
            Err(e) => tracing::warn!("initial context build failed: {e}"),
        }
    }

    match loom_nav::build_convention(&config.pages_dir, extension, &config.index_file) {
        Ok(nav) => Rebuildable {
            nav,
            shared_files: Vec::new(),
        },
        Err(e) => {
            tracing::warn!("initial convention build failed: {e}");
            Rebuildable {
                nav: loom_nav::NavModel::Convention(loom_nav::NavTree {
                    nodes: Vec::new(),
                    root: 0,
                }),
                shared_files: Vec::new(),
            }
        }
    }
}

fn workspace_root_for(config: &ServeConfig) -> Utf8PathBuf {
    config
        .content_root
        .clone()
        .or_else(|| config.entry_file.as_ref().and_then(|p| p.parent().map(|p| p.to_path_buf())))
        .unwrap_or_else(|| config.pages_dir.clone())
}

/// Runs the dev server to completion: binds a port (with fallback),
/// prints `SERVE_READY|port=<n>`, starts the filesystem watcher, and
/// serves requests until the process is terminated.
pub async fn serve(config: ServeConfig) -> Result<()> {
    let workspace_root = workspace_root_for(&config);
    let port = config.port;

    let app_state = Arc::new(AppState {
        state: tokio::sync::RwLock::new(initial_state(&config)),
        config,
        workspace_root,
        subscribers: reload::Subscribers::new(),
    });

    watch::spawn_watcher(app_state.clone())?;

    let listener = listen::bind_with_fallback(port).await?;
    let bound_port = listener.local_addr().map_err(|e| DevServerError::Io {
        path: "listener".to_string(),
        source: e,
    })?.port();

    println!("SERVE_READY|port={bound_port}");

    let router = routes::build_router(app_state);
    axum::serve(listener, router)
        .await
        .map_err(|e| DevServerError::Io {
            path: "server".to_string(),
            source: e,
        })
}
