use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use loom_template::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarType {
    String,
    Number,
    Bool,
    Object,
    Array,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDescriptor {
    pub path: String,
    #[serde(rename = "type")]
    pub ty: VarType,
    pub context: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Template,
    Block,
    Define,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DependencyKind,
    pub required: bool,
    #[serde(rename = "filePath", skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Per data-model invariant I4: true iff some file in the *included*
    /// set (not just the workspace) defines a matching named definition.
    pub satisfied: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HypermediaDescriptor {
    #[serde(rename = "type")]
    pub method: HttpMethod,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swap: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub line: usize,
    pub context: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmxInfo {
    pub detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub dependencies: Vec<HypermediaDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateInfo {
    pub name: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "isBlock")]
    pub is_block: bool,
    pub calls: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "entryFile")]
    pub entry_file: String,
    pub templates: HashMap<String, TemplateInfo>,
    pub variables: Vec<VariableDescriptor>,
    pub dependencies: Vec<DependencyDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub htmx: Option<HtmxInfo>,
}
