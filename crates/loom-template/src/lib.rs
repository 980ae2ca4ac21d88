pub mod ast;
pub mod compare;
pub mod error;
pub mod helpers;
pub mod lexer;
pub mod parser;
pub mod render;
pub mod value;

pub use ast::{Definition, Node, NodeKind, ParsedFile};
pub use error::{Result, SourceLocation, SourceSpan, TemplateError, TemplateSource};
pub use render::TemplateSet;
pub use value::{Value, ValueExt};

use camino::Utf8Path;

/// One file to be loaded into a fresh `TemplateSet`, in load order.
pub struct IncludeFile {
    pub path: camino::Utf8PathBuf,
    pub source: String,
}

/// C6's top-level renderer entry point: installs a fresh, namespace-empty
/// template set, loads every include file under its base name, loads the
/// entry file last, then executes the resolved definition against `data`.
pub fn render(
    entry_path: &Utf8Path,
    entry_source: &str,
    includes: &[IncludeFile],
    data: Value,
    target: Option<&str>,
) -> Result<String> {
    let mut set = TemplateSet::new();
    for file in includes {
        let base_name = base_name_of(&file.path);
        set.load_file(&file.source, file.path.as_str(), &base_name)?;
    }
    let entry_base = base_name_of(entry_path);
    set.load_file(entry_source, entry_path.as_str(), &entry_base)?;

    let target_name = target.unwrap_or(&entry_base);
    if !set.has_definition(target_name) {
        return Err(TemplateError::TemplateNotFound(target_name.to_string()));
    }
    set.execute(target_name, data)
}

pub fn base_name_of(path: &Utf8Path) -> String {
    path.file_name().unwrap_or(path.as_str()).to_string()
}
