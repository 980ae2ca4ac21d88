//! Filesystem watcher: rebuilds the navigation model on change and
//! notifies live-reload subscribers afterwards. Change always precedes
//! rebuild, which always precedes notification.

use std::sync::mpsc as std_mpsc;
use std::time::Duration;

use camino::Utf8PathBuf;
use notify::{RecursiveMode, Watcher};

use crate::state::{AppState, Rebuildable};

fn rebuild(state: &AppState) -> Rebuildable {
    let extension = "html";
    if let Some(entry_path) = &state.config.entry_file {
        let entry_source = std::fs::read_to_string(entry_path).unwrap_or_default();
        let includes = gather_context_includes(state);
        match loom_nav::build_context(entry_path, &includes, extension) {
            Ok((nav, shared)) => return Rebuildable { nav, shared_files: shared },
            Err(e) => tracing::warn!("context rebuild failed: {e}"),
        }
        let _ = entry_source;
    }

    match loom_nav::build_convention(&state.config.pages_dir, extension, &state.config.index_file) {
        Ok(nav) => Rebuildable {
            nav,
            shared_files: Vec::new(),
        },
        Err(e) => {
            tracing::warn!("convention rebuild failed: {e}");
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

fn gather_context_includes(state: &AppState) -> Vec<(Utf8PathBuf, String)> {
    let Some(files) = &state.config.context_files else {
        return Vec::new();
    };
    files
        .iter()
        .filter_map(|p| std::fs::read_to_string(p).ok().map(|s| (p.clone(), s)))
        .collect()
}

/// Performs one rebuild-then-notify cycle, holding the writer lock only
/// for the duration of the swap.
pub async fn rebuild_and_notify(state: &crate::state::SharedState, reason: &str) {
    tracing::info!(reason, "rebuilding navigation state");
    let fresh = rebuild(state);
    {
        let mut guard = state.state.write().await;
        *guard = fresh;
    }
    state.subscribers.notify_all();
}

/// Spawns the `notify` watcher on a blocking task and bridges its
/// callback-based events into the async world via a bounded
/// `std::sync::mpsc` channel drained by a dedicated task.
pub fn spawn_watcher(state: crate::state::SharedState) -> crate::error::Result<()> {
    let (tx, rx) = std_mpsc::channel::<notify::Result<notify::Event>>();

    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })
    .map_err(|e| crate::error::DevServerError::Watch {
        path: state.workspace_root.to_string(),
        source: e,
    })?;

    watcher
        .watch(state.workspace_root.as_std_path(), RecursiveMode::Recursive)
        .map_err(|e| crate::error::DevServerError::Watch {
            path: state.workspace_root.to_string(),
            source: e,
        })?;

    // Keep the watcher alive for the process lifetime by leaking it onto
    // a dedicated blocking thread that also drains the channel.
    let rt = tokio::runtime::Handle::current();
    std::thread::spawn(move || {
        let _watcher = watcher;
        loop {
            match rx.recv_timeout(Duration::from_secs(3600)) {
                Ok(Ok(event)) => {
                    let path = event
                        .paths
                        .first()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    let state = state.clone();
                    rt.spawn(async move { rebuild_and_notify(&state, &path).await });
                }
                Ok(Err(e)) => tracing::warn!("watch error: {e}"),
                Err(std_mpsc::RecvTimeoutError::Timeout) => continue,
                Err(std_mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }
    });

    Ok(())
}
