//! Top-level error type: wraps every component error plus the CLI's own
//! flag-parsing failures, and carries the exit code `main` should use.

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("unknown flag: {0}")]
    UnknownFlag(String),
    #[error("missing required flag: -{0}")]
    MissingFlag(&'static str),
    #[error("missing subcommand: expected one of inspect, render, serve")]
    MissingSubcommand,
    #[error("unknown subcommand: {0}")]
    UnknownSubcommand(String),
    #[error("-files must be a comma-separated list of paths")]
    BadFileList,
}

#[derive(Debug, thiserror::Error)]
pub enum LoomError {
    #[error(transparent)]
    Cli(#[from] CliError),
    #[error(transparent)]
    Template(#[from] loom_template::TemplateError),
    #[error(transparent)]
    Analyze(#[from] loom_analyze::AnalyzeError),
    #[error(transparent)]
    Config(#[from] serde_json::Error),
    #[error(transparent)]
    DevServer(#[from] loom_devserver::DevServerError),
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl LoomError {
    /// Maps an error to the process exit code its category uses: CLI usage
    /// mistakes exit 2, everything else exits 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoomError::Cli(_) => 2,
            _ => 1,
        }
    }
}
