use camino::Utf8PathBuf;
use serde::Deserialize;
use serde_json::Value;

/// The reserved `_templateContext` side-channel: metadata about which
/// template a fixture was authored against. Never passed to rendering.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateContext {
    pub entry_file: Option<String>,
    #[serde(default)]
    pub included_files: Vec<String>,
    pub selected_template: Option<String>,
    pub last_saved: Option<String>,
}

/// A fixture file: its path, its raw data (with `_templateContext`
/// stripped out), and the parsed metadata if present.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub path: Utf8PathBuf,
    pub data: Value,
    pub context: Option<TemplateContext>,
}

#[derive(Debug, Deserialize)]
struct RawFixture {
    #[serde(rename = "_templateContext")]
    template_context: Option<TemplateContext>,
    #[serde(flatten)]
    data: Value,
}

impl Fixture {
    pub(crate) fn from_json(path: Utf8PathBuf, text: &str) -> serde_json::Result<Fixture> {
        let raw: RawFixture = serde_json::from_str(text)?;
        Ok(Fixture {
            path,
            data: raw.data,
            context: raw.template_context,
        })
    }
}
