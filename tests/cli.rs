//! End-to-end exercise of the `inspect` and `render` subcommands against
//! the built `loom` binary.

use std::process::Command;

fn loom() -> Command {
    Command::new(env!("CARGO_BIN_EXE_loom"))
}

#[test]
fn inspect_reports_variables_and_dependencies() {
    let dir = tempfile::tempdir().unwrap();
    let entry = dir.path().join("page.html");
    std::fs::write(&entry, r#"{{if eq .Status "active"}}{{.Name}}{{end}}{{template "footer" .}}"#).unwrap();
    let footer = dir.path().join("footer.html");
    std::fs::write(&footer, r#"{{define "footer"}}bye{{end}}"#).unwrap();

    let output = loom()
        .args(["inspect", "-entry", entry.to_str().unwrap(), "-workspace", dir.path().to_str().unwrap()])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["entryFile"], entry.to_str().unwrap());
    let names: Vec<&str> = json["dependencies"].as_array().unwrap().iter().map(|d| d["name"].as_str().unwrap()).collect();
    assert!(names.contains(&"footer"));
}

#[test]
fn inspect_fails_with_code_one_on_unparsable_entry() {
    let dir = tempfile::tempdir().unwrap();
    let entry = dir.path().join("broken.html");
    std::fs::write(&entry, r#"{{if .Open}}unterminated"#).unwrap();

    let output = loom()
        .args(["inspect", "-entry", entry.to_str().unwrap(), "-workspace", dir.path().to_str().unwrap()])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn render_produces_html_from_inline_json_data() {
    let dir = tempfile::tempdir().unwrap();
    let entry = dir.path().join("page.html");
    std::fs::write(&entry, "Hello {{.Name}}").unwrap();

    let output = loom()
        .args(["render", "-entry", entry.to_str().unwrap(), "-data", r#"{"Name":"Ada"}"#])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "Hello Ada");
}

#[test]
fn missing_required_flag_exits_with_code_two() {
    let output = loom().args(["render", "-data", "{}"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}
