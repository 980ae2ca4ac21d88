//! Hand-rolled single-dash flag parser for the three subcommands.
//! Deliberately not built on a `clap`-style double-dash argument library:
//! the contract is `-entry`, `-workspace`, … verbatim.

use std::collections::HashMap;

use camino::Utf8PathBuf;

use crate::error::CliError;

pub enum Command {
    Inspect {
        entry: Utf8PathBuf,
        workspace: Option<Utf8PathBuf>,
        files: Option<Vec<Utf8PathBuf>>,
    },
    Render {
        entry: Utf8PathBuf,
        data: String,
        workspace: Option<Utf8PathBuf>,
        template: Option<String>,
        files: Option<Vec<Utf8PathBuf>>,
    },
    Serve {
        config_json: String,
    },
}

fn known_flags(subcommand: &str) -> &'static [&'static str] {
    match subcommand {
        "inspect" => &["entry", "workspace", "files"],
        "render" => &["entry", "data", "workspace", "template", "files"],
        "serve" => &["config"],
        _ => &[],
    }
}

fn require(flags: &HashMap<String, String>, name: &'static str) -> Result<String, CliError> {
    flags.get(name).cloned().ok_or(CliError::MissingFlag(name))
}

fn parse_files(flags: &HashMap<String, String>) -> Result<Option<Vec<Utf8PathBuf>>, CliError> {
    match flags.get("files") {
        None => Ok(None),
        Some(raw) => {
            let paths: Vec<Utf8PathBuf> = raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(Utf8PathBuf::from).collect();
            if paths.is_empty() {
                return Err(CliError::BadFileList);
            }
            Ok(Some(paths))
        }
    }
}

/// Parses `argv[1..]` into a [`Command`]. Unknown flags and missing
/// required flags both map to [`CliError`], which `main` turns into exit
/// code 2.
pub fn parse(args: &[String]) -> Result<Command, CliError> {
    let subcommand = args.first().ok_or(CliError::MissingSubcommand)?.as_str();
    let allowed = known_flags(subcommand);
    if allowed.is_empty() {
        return Err(CliError::UnknownSubcommand(subcommand.to_string()));
    }

    let mut flags = HashMap::new();
    let mut rest = args[1..].iter();
    while let Some(token) = rest.next() {
        let name = token.strip_prefix('-').ok_or_else(|| CliError::UnknownFlag(token.clone()))?;
        if !allowed.contains(&name) {
            return Err(CliError::UnknownFlag(token.clone()));
        }
        let value = rest.next().ok_or_else(|| CliError::UnknownFlag(token.clone()))?;
        flags.insert(name.to_string(), value.clone());
    }

    match subcommand {
        "inspect" => Ok(Command::Inspect {
            entry: Utf8PathBuf::from(require(&flags, "entry")?),
            workspace: flags.get("workspace").map(Utf8PathBuf::from),
            files: parse_files(&flags)?,
        }),
        "render" => Ok(Command::Render {
            entry: Utf8PathBuf::from(require(&flags, "entry")?),
            data: require(&flags, "data")?,
            workspace: flags.get("workspace").map(Utf8PathBuf::from),
            template: flags.get("template").cloned(),
            files: parse_files(&flags)?,
        }),
        "serve" => Ok(Command::Serve {
            config_json: require(&flags, "config")?,
        }),
        other => Err(CliError::UnknownSubcommand(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_inspect_with_optional_files() {
        let args: Vec<String> = ["inspect", "-entry", "a.html", "-workspace", "pages", "-files", "a.html,b.html"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        match parse(&args).unwrap() {
            Command::Inspect { entry, workspace, files } => {
                assert_eq!(entry, Utf8PathBuf::from("a.html"));
                assert_eq!(workspace, Some(Utf8PathBuf::from("pages")));
                assert_eq!(files, Some(vec![Utf8PathBuf::from("a.html"), Utf8PathBuf::from("b.html")]));
            }
            _ => panic!("expected Inspect"),
        }
    }

    #[test]
    fn missing_required_flag_is_an_error() {
        let args: Vec<String> = ["render", "-data", "{}"].iter().map(|s| s.to_string()).collect();
        assert!(matches!(parse(&args), Err(CliError::MissingFlag("entry"))));
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let args: Vec<String> = ["serve", "-bogus", "x"].iter().map(|s| s.to_string()).collect();
        assert!(matches!(parse(&args), Err(CliError::UnknownFlag(_))));
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        let args: Vec<String> = ["frobnicate"].iter().map(|s| s.to_string()).collect();
        assert!(matches!(parse(&args), Err(CliError::UnknownSubcommand(_))));
    }

    #[test]
    fn missing_subcommand_is_rejected() {
        assert!(matches!(parse(&[]), Err(CliError::MissingSubcommand)));
    }
}
