mod cli;
mod error;

use std::io::Write;

use camino::Utf8PathBuf;
use cli::Command;
use error::LoomError;

/// Logs go to stderr, never stdout: `inspect`/`render` write their
/// payload to stdout and a stray log line would corrupt it.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    use std::io::IsTerminal;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

fn read_file(path: &Utf8PathBuf) -> Result<String, LoomError> {
    std::fs::read_to_string(path).map_err(|e| LoomError::Io {
        path: path.to_string(),
        source: e,
    })
}

/// `inspect -entry <path> -workspace <dir> [-files a,b,c]`
fn run_inspect(entry: Utf8PathBuf, workspace: Option<Utf8PathBuf>, files: Option<Vec<Utf8PathBuf>>) -> Result<i32, LoomError> {
    let entry_source = read_file(&entry)?;

    let base_name = loom_template::base_name_of(&entry);
    if let Err(e) = loom_template::parser::parse_file(&entry_source, entry.as_str(), &base_name) {
        tracing::error!("{entry}: {e}");
        eprintln!("{entry}: {e}");
        return Ok(1);
    }

    if files.is_none() && workspace.is_none() {
        eprintln!("inspect: no workspace given and no explicit -files list; nothing to analyse");
        return Ok(1);
    }

    let includes: Vec<(Utf8PathBuf, String)> = match &files {
        Some(list) => list.iter().filter_map(|p| std::fs::read_to_string(p).ok().map(|s| (p.clone(), s))).collect(),
        None => Vec::new(),
    };

    let mut warnings = Vec::new();
    let result = loom_analyze::analyze(&entry, &entry_source, &includes, workspace.as_deref(), &mut warnings);
    for warning in &warnings {
        tracing::warn!("{warning}");
        eprintln!("{warning}");
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(0)
}

/// `render -entry <path> -data <file|inline-json> -workspace <dir>
/// [-template <name>] [-files a,b,c]`
fn run_render(
    entry: Utf8PathBuf,
    data: String,
    workspace: Option<Utf8PathBuf>,
    template: Option<String>,
    files: Option<Vec<Utf8PathBuf>>,
) -> Result<i32, LoomError> {
    let entry_source = read_file(&entry)?;

    let data_value: serde_json::Value = match std::fs::read_to_string(&data) {
        Ok(text) => serde_json::from_str(&text)?,
        Err(_) => serde_json::from_str(&data)?,
    };

    let includes: Vec<loom_template::IncludeFile> = match &files {
        Some(list) => list
            .iter()
            .filter_map(|p| std::fs::read_to_string(p).ok().map(|source| loom_template::IncludeFile { path: p.clone(), source }))
            .collect(),
        None => match &workspace {
            Some(root) => {
                let mut warnings = Vec::new();
                let found = loom_analyze::walk_workspace_files(root, &mut warnings);
                for warning in &warnings {
                    tracing::warn!("{warning}");
                }
                found
                    .into_iter()
                    .filter(|(path, _)| path != &entry)
                    .map(|(path, source)| loom_template::IncludeFile { path, source })
                    .collect()
            }
            None => Vec::new(),
        },
    };

    let html = loom_template::render(&entry, &entry_source, &includes, data_value, template.as_deref())?;
    std::io::stdout().write_all(html.as_bytes()).map_err(|e| LoomError::Io {
        path: "stdout".to_string(),
        source: e,
    })?;
    Ok(0)
}

/// `serve -config <json>`
async fn run_serve(config_json: String) -> Result<i32, LoomError> {
    let config: loom_config::ServeConfig = serde_json::from_str(&config_json)?;
    loom_devserver::serve(config).await?;
    Ok(0)
}

async fn run() -> Result<i32, LoomError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = cli::parse(&args)?;

    match command {
        Command::Inspect { entry, workspace, files } => run_inspect(entry, workspace, files),
        Command::Render { entry, data, workspace, template, files } => run_render(entry, data, workspace, template, files),
        Command::Serve { config_json } => run_serve(config_json).await,
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("loom: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
