use std::sync::Arc;

use camino::Utf8PathBuf;
use loom_config::ServeConfig;
use loom_nav::NavModel;
use tokio::sync::RwLock;

use crate::reload::Subscribers;

/// Everything the dev server rebuilds on a filesystem change, guarded by
/// a single `RwLock` so readers never see a half-rebuilt navigation model.
pub struct Rebuildable {
    pub nav: NavModel,
    /// Context mode's shared (non-page) include files, re-read on every
    /// render so edits are always reflected.
    pub shared_files: Vec<Utf8PathBuf>,
}

pub struct AppState {
    pub config: ServeConfig,
    pub workspace_root: Utf8PathBuf,
    pub state: RwLock<Rebuildable>,
    pub subscribers: Subscribers,
}

pub type SharedState = Arc<AppState>;
