pub mod analyze;
pub mod error;
pub mod extract;
pub mod types;

pub use analyze::{analyze, walk_workspace_files};
pub use error::{AnalyzeError, Result};
pub use types::{
    AnalysisResult, DependencyDescriptor, DependencyKind, HtmxInfo, HttpMethod, HypermediaDescriptor, TemplateInfo,
    VarType, VariableDescriptor,
};

#[cfg(test)]
mod tests {
    use camino::Utf8Path;

    #[test]
    fn range_collection_and_item_fields_are_recorded() {
        let body = loom_template::parser::parse_file(
            r#"{{range .Tags}}{{.Name}}{{end}}"#,
            "page.html",
            "page.html",
        )
        .unwrap();
        let def = &body.definitions[0];
        let vars = crate::extract::extract_variables(&def.body, "page.html");
        let paths: Vec<_> = vars.iter().map(|v| v.path.as_str()).collect();
        assert!(paths.contains(&"Tags"));
        assert!(paths.contains(&"Tags[0].Name"));
        let collection = vars.iter().find(|v| v.path == "Tags").unwrap();
        assert_eq!(collection.context, "range-collection");
        assert_eq!(collection.ty, crate::types::VarType::Array);
    }

    #[test]
    fn eq_string_comparison_is_specialised() {
        let parsed = loom_template::parser::parse_file(
            r#"{{if eq .Status "active"}}on{{end}}"#,
            "page.html",
            "page.html",
        )
        .unwrap();
        let vars = crate::extract::extract_variables(&parsed.definitions[0].body, "page.html");
        let v = vars.iter().find(|v| v.path == "Status").unwrap();
        assert_eq!(v.context, "eq-string");
        assert_eq!(v.suggested, Some(serde_json::json!("active")));
    }

    #[test]
    fn range_without_known_array_path_discards_body_fields() {
        let parsed = loom_template::parser::parse_file(
            r#"{{range seq 1 5}}{{.Name}}{{end}}"#,
            "page.html",
            "page.html",
        )
        .unwrap();
        let vars = crate::extract::extract_variables(&parsed.definitions[0].body, "page.html");
        assert!(!vars.iter().any(|v| v.path == "Name"));
    }

    #[test]
    fn priority_table_prefers_eq_number_over_plain_field() {
        let mut warnings = Vec::new();
        let entry = Utf8Path::new("page.html");
        let source = r#"{{if gt .Count 10}}x{{end}}{{.Count}}"#;
        let result = crate::analyze(entry, source, &[], None, &mut warnings);
        let count = result.variables.iter().find(|v| v.path == "Count").unwrap();
        assert_eq!(count.context, "gt-number");
    }

    #[test]
    fn dependency_descriptor_recorded_for_template_call() {
        let mut warnings = Vec::new();
        let entry = Utf8Path::new("layout.html");
        let includes = vec![(Utf8Path::new("content.html").to_owned(), r#"{{define "content"}}hi{{end}}"#.to_string())];
        let source = r#"{{template "content" .}}"#;
        let result = crate::analyze(entry, source, &includes, None, &mut warnings);
        let dep = result.dependencies.iter().find(|d| d.name == "content").unwrap();
        assert!(dep.satisfied);
        assert!(dep.required);
    }

    #[test]
    fn hypermedia_attributes_are_extracted_with_nearby_siblings() {
        let source = "<button hx-get=\"/api/items\" hx-target=\"#list\" hx-swap=\"outerHTML\">Go</button>";
        let (descriptors, _) = crate::extract::extract_hypermedia(source, "page.html");
        assert_eq!(descriptors.len(), 1);
        let d = &descriptors[0];
        assert_eq!(d.url, "/api/items");
        assert_eq!(d.target.as_deref(), Some("#list"));
        assert_eq!(d.swap.as_deref(), Some("outerHTML"));
    }
}
