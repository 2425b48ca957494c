//! Parameter declarations read from a Bicep file or a compiled ARM template.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::parser;
use crate::error::{Error, Result};

/// The parameters section of a template, in source order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub parameters: IndexMap<String, TemplateParameter>,
}

/// One declared parameter, in ARM template shape.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateParameter {
    #[serde(rename = "type")]
    pub type_name: String,
    pub default_value: Option<Value>,
    pub allowed_values: Option<Vec<Value>>,
    #[serde(default)]
    pub metadata: ParameterMetadata,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ParameterMetadata {
    pub description: Option<String>,
}

/// Declared parameter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    Int,
    Bool,
    String,
    SecureString,
    Array,
    Object,
    SecureObject,
}

impl ParameterType {
    /// Type names compare case-insensitively, as ARM does.
    pub fn parse(name: &str) -> Option<Self> {
        let kind = match name.to_ascii_lowercase().as_str() {
            "int" => Self::Int,
            "bool" => Self::Bool,
            "string" => Self::String,
            "securestring" => Self::SecureString,
            "array" => Self::Array,
            "object" => Self::Object,
            "secureobject" => Self::SecureObject,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_secure(self) -> bool {
        matches!(self, Self::SecureString | Self::SecureObject)
    }
}

impl Template {
    /// Load a template. `.json` files are read as ARM templates, anything
    /// else as Bicep source.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|err| Error::read(path, err))?;
        let is_arm = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let template = if is_arm {
            Self::from_arm_json(path, &source)?
        } else {
            parser::parse_bicep(path, &source)?
        };
        debug!(
            path = %path.display(),
            parameters = template.parameters.len(),
            "loaded template"
        );
        Ok(template)
    }

    pub fn from_arm_json(path: &Path, source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|err| Error::parse(path, Some(err.line()), err.to_string()))
    }
}
