use std::sync::Arc;

/// Byte offset and length of a span inside a single template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpan {
    pub offset: usize,
    pub len: usize,
}

impl SourceSpan {
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    pub fn point(offset: usize) -> Self {
        Self { offset, len: 0 }
    }
}

/// A named template source: the file's display path plus its full text,
/// kept around so spans can be turned into line:column pairs on demand.
#[derive(Debug, Clone)]
pub struct TemplateSource {
    pub name: String,
    pub source: Arc<String>,
}

impl TemplateSource {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: Arc::new(source.into()),
        }
    }

    /// 1-based (line, column) for a byte offset into `self.source`.
    pub fn offset_to_line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.source.len());
        let mut line = 1usize;
        let mut col = 1usize;
        for ch in self.source[..offset].chars() {
            if ch == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        (line, col)
    }

    pub fn location(&self, offset: usize) -> String {
        let (line, col) = self.offset_to_line_col(offset);
        format!("{}:{}:{}", self.name, line, col)
    }
}

/// A span paired with the source it indexes into, carried by error variants
/// so `Display` can render `file:line:col` without a caller reaching back
/// into the parser.
#[derive(Debug, Clone)]
pub struct SourceLocation {
    pub span: SourceSpan,
    pub src: TemplateSource,
}

impl SourceLocation {
    pub fn new(span: SourceSpan, src: TemplateSource) -> Self {
        Self { span, src }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.src.location(self.span.offset))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("{loc}: syntax error: {message}")]
    Syntax { loc: SourceLocation, message: String },

    #[error("{loc}: field {field:?} not found on value of type {found}")]
    UnknownField {
        loc: SourceLocation,
        field: String,
        found: &'static str,
    },

    #[error("{loc}: type error: {message}")]
    Type { loc: SourceLocation, message: String },

    #[error("{loc}: undefined variable {name:?}")]
    Undefined { loc: SourceLocation, name: String },

    #[error("{loc}: unknown function {name:?}")]
    UnknownFunction { loc: SourceLocation, name: String },

    #[error("no definition named {0:?} in this template set")]
    TemplateNotFound(String),

    #[error("failed to parse file {file}: {source}")]
    FileParse {
        file: String,
        #[source]
        source: Box<TemplateError>,
    },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, TemplateError>;
