#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("{path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: loom_template::TemplateError,
    },
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to walk workspace {root}: {source}")]
    Walk {
        root: String,
        #[source]
        source: ignore::Error,
    },
}

pub type Result<T> = std::result::Result<T, AnalyzeError>;
