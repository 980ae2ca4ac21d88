#[derive(Debug, thiserror::Error)]
pub enum DevServerError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Nav(#[from] loom_nav::NavError),
    #[error(transparent)]
    Fixture(#[from] loom_fixture::FixtureError),
    #[error("no free port found after exhausting the configured range")]
    NoFreePort,
    #[error("failed to watch {path}: {source}")]
    Watch {
        path: String,
        #[source]
        source: notify::Error,
    },
}

pub type Result<T> = std::result::Result<T, DevServerError>;
