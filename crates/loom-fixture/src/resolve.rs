use camino::Utf8Path;

use crate::types::Fixture;

/// Sanitises a workspace-relative path into a collision-avoiding fixture
/// filename by replacing path separators with `--`.
pub fn sanitize_path(relative_path: &str) -> String {
    relative_path.replace(['/', '\\'], "--")
}

fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Resolves the fixture that should supply render data for `template_path`
/// (a workspace-relative path), given every fixture discovered in the
/// fixture directory.
///
/// Matching precedence: a `_templateContext` metadata match (`entryFile`
/// or `includedFiles` base name) always wins over the legacy
/// sanitised-filename convention, even when a fixture only matching by
/// filename would otherwise be picked first.
pub fn resolve_fixture<'a>(template_path: &str, fixtures: &'a [Fixture]) -> Option<&'a Fixture> {
    let target_base = base_name(template_path);

    let by_metadata = fixtures.iter().find(|f| {
        let Some(ctx) = &f.context else { return false };
        let entry_matches = ctx
            .entry_file
            .as_deref()
            .map(|e| base_name(e) == target_base)
            .unwrap_or(false);
        let included_matches = ctx
            .included_files
            .iter()
            .any(|i| base_name(i) == target_base);
        entry_matches || included_matches
    });
    if by_metadata.is_some() {
        return by_metadata;
    }

    let sanitized = sanitize_path(template_path);
    fixtures.iter().find(|f| {
        f.context.is_none()
            && f.path
                .file_stem()
                .map(|stem| stem == sanitized)
                .unwrap_or(false)
    })
}

/// Loads every `.json` fixture file directly inside `fixture_dir`.
pub fn load_fixtures(fixture_dir: &Utf8Path) -> crate::error::Result<Vec<Fixture>> {
    let mut out = Vec::new();
    let entries = match std::fs::read_dir(fixture_dir) {
        Ok(e) => e,
        Err(_) => return Ok(out),
    };
    for entry in entries {
        let entry = entry.map_err(|e| crate::error::FixtureError::Io {
            path: fixture_dir.to_string(),
            source: e,
        })?;
        let Ok(path) = camino::Utf8PathBuf::from_path_buf(entry.path()) else {
            continue;
        };
        if path.extension() != Some("json") {
            continue;
        }
        let text = std::fs::read_to_string(&path).map_err(|e| crate::error::FixtureError::Io {
            path: path.to_string(),
            source: e,
        })?;
        let fixture = Fixture::from_json(path.clone(), &text).map_err(|e| crate::error::FixtureError::Json {
            path: path.to_string(),
            source: e,
        })?;
        out.push(fixture);
    }
    Ok(out)
}
