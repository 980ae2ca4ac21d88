//! The `serve` subcommand's configuration shape, deserialized from the
//! `-config <json>` CLI argument.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

fn default_port() -> u16 {
    3000
}

fn default_index_file() -> String {
    "index".to_string()
}

fn default_env_prefix() -> String {
    "LOOM_".to_string()
}

/// Configuration for the dev server, deserialized from the `serve`
/// subcommand's `-config <json>` argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServeConfig {
    pub pages_dir: Utf8PathBuf,
    pub layouts_dir: Utf8PathBuf,
    pub partials_dir: Utf8PathBuf,
    pub static_dir: Utf8PathBuf,
    pub layout_file: String,
    #[serde(default = "default_index_file")]
    pub index_file: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub context_files: Option<Vec<Utf8PathBuf>>,
    #[serde(default)]
    pub entry_file: Option<Utf8PathBuf>,
    #[serde(default)]
    pub data_file: Option<Utf8PathBuf>,
    #[serde(default)]
    pub data_dir: Option<Utf8PathBuf>,
    #[serde(default)]
    pub content_root: Option<Utf8PathBuf>,
    /// Prefix stripped off process environment variable names before
    /// projecting them into the render data's `Env` map. Defaults to
    /// `LOOM_`.
    #[serde(default = "default_env_prefix")]
    pub env_prefix: String,
}

impl ServeConfig {
    /// Whether this configuration describes context mode (an explicit
    /// entry/include list) rather than convention mode (a pages directory
    /// walk). Context mode is selected whenever an entry file is given.
    pub fn is_context_mode(&self) -> bool {
        self.entry_file.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let json = r#"{
            "pagesDir": "pages",
            "layoutsDir": "layouts",
            "partialsDir": "partials",
            "staticDir": "static",
            "layoutFile": "base.html"
        }"#;
        let config: ServeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.index_file, "index");
        assert!(!config.is_context_mode());
    }

    #[test]
    fn context_mode_detected_from_entry_file() {
        let json = r#"{
            "pagesDir": "pages",
            "layoutsDir": "layouts",
            "partialsDir": "partials",
            "staticDir": "static",
            "layoutFile": "base.html",
            "entryFile": "layout.html",
            "port": 4000
        }"#;
        let config: ServeConfig = serde_json::from_str(json).unwrap();
        assert!(config.is_context_mode());
        assert_eq!(config.port, 4000);
    }
}
