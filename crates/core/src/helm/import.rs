//! Values document → Schema, inferring every type from the node tag.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use serde_yaml::{Mapping, Value as Yaml};
use tracing::debug;

use super::comments::{head_comments, push_segment};
use crate::error::{Error, Result};
use crate::result::{Diagnostics, SchemaResult, codes};
use crate::schema::{Schema, SchemaType};

/// Import a Helm values file.
pub fn helm_to_schema(path: &Path) -> SchemaResult {
    let imported = std::fs::read_to_string(path)
        .map_err(|err| Error::read(path, err))
        .and_then(|source| import(path, &source));
    imported.unwrap_or_else(|err| SchemaResult::from_error(&err))
}

/// Import values already held in memory; `origin` is only used in messages.
pub fn values_to_schema(origin: &Path, source: &str) -> SchemaResult {
    import(origin, source).unwrap_or_else(|err| SchemaResult::from_error(&err))
}

fn import(origin: &Path, source: &str) -> Result<SchemaResult> {
    let document: Yaml = if has_content(source) {
        serde_yaml::from_str(source).map_err(|err| {
            let line = err.location().map(|loc| loc.line());
            Error::parse(origin, line, err.to_string())
        })?
    } else {
        Yaml::Null
    };

    let mut walker = Walker {
        comments: head_comments(source),
        diags: Diagnostics::default(),
    };
    let mut root = Schema::of_type(SchemaType::Object);
    match Node::of(&document) {
        Node::Null => {}
        Node::Map(map) => walker.mapping(&mut root, map, ""),
        _ => {
            return Err(Error::parse(origin, None, "values document must be a mapping"));
        }
    }
    debug!(properties = root.properties.len(), "imported helm values");

    Ok(SchemaResult {
        schema: root,
        diags: walker.diags.into_vec(),
    })
}

fn has_content(source: &str) -> bool {
    source.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with('#') && line != "---"
    })
}

/// A value classified by its (explicit or inferred) tag.
enum Node<'a> {
    Null,
    Bool(bool),
    Int(Value),
    Float(f64),
    Str(String),
    Seq(&'a [Yaml]),
    Map(&'a Mapping),
}

impl<'a> Node<'a> {
    fn of(value: &'a Yaml) -> Self {
        match value {
            Yaml::Null => Node::Null,
            Yaml::Bool(b) => Node::Bool(*b),
            Yaml::Number(n) if n.is_f64() => Node::Float(n.as_f64().unwrap_or(f64::NAN)),
            Yaml::Number(n) => Node::Int(number_to_json(n)),
            Yaml::String(s) => Node::Str(s.clone()),
            Yaml::Sequence(seq) => Node::Seq(seq),
            Yaml::Mapping(map) => Node::Map(map),
            Yaml::Tagged(tagged) => Self::tagged(&tagged.tag.to_string(), &tagged.value),
        }
    }

    /// Core tags override the inferred type; other tags are transparent.
    fn tagged(tag: &str, inner: &'a Yaml) -> Self {
        let name = tag.trim_start_matches('!');
        let name = name.strip_prefix("tag:yaml.org,2002:").unwrap_or(name);
        match (name, Self::of(inner)) {
            ("null", _) => Node::Null,
            ("str", node) => Node::Str(scalar_text(inner).unwrap_or_else(|| node_text(&node))),
            ("int", Node::Str(text)) => text
                .trim()
                .parse::<i64>()
                .map(|i| Node::Int(Value::from(i)))
                .unwrap_or(Node::Str(text)),
            ("float", Node::Str(text)) => text
                .trim()
                .parse::<f64>()
                .map(Node::Float)
                .unwrap_or(Node::Str(text)),
            ("float", Node::Int(Value::Number(n))) => Node::Float(n.as_f64().unwrap_or(f64::NAN)),
            ("bool", Node::Str(text)) => match text.trim() {
                "true" | "True" | "TRUE" => Node::Bool(true),
                "false" | "False" | "FALSE" => Node::Bool(false),
                _ => Node::Str(text),
            },
            (_, node) => node,
        }
    }
}

fn scalar_text(value: &Yaml) -> Option<String> {
    match value {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Bool(b) => Some(b.to_string()),
        Yaml::Number(n) => Some(n.to_string()),
        Yaml::Null => Some(String::new()),
        _ => None,
    }
}

fn node_text(node: &Node<'_>) -> String {
    match node {
        Node::Str(s) => s.clone(),
        _ => String::new(),
    }
}

fn number_to_json(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::from(i)
    } else if let Some(u) = n.as_u64() {
        Value::from(u)
    } else {
        n.as_f64()
            .and_then(serde_json::Number::from_f64)
            .map_or(Value::Null, Value::Number)
    }
}

/// Plain JSON form of a YAML value, keeping key order. Non-finite floats have
/// no JSON form and become `null`.
pub(crate) fn yaml_to_json(value: &Yaml) -> Value {
    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(*b),
        Yaml::Number(n) => number_to_json(n),
        Yaml::String(s) => Value::String(s.clone()),
        Yaml::Sequence(seq) => Value::Array(seq.iter().map(yaml_to_json).collect()),
        Yaml::Mapping(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (key_text(k), yaml_to_json(v)))
                .collect(),
        ),
        Yaml::Tagged(tagged) => yaml_to_json(&tagged.value),
    }
}

fn key_text(key: &Yaml) -> String {
    match key {
        Yaml::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

struct Walker {
    comments: HashMap<String, String>,
    diags: Diagnostics,
}

impl Walker {
    fn mapping(&mut self, schema: &mut Schema, map: &Mapping, path: &str) {
        schema.schema_type = Some(SchemaType::Object);
        for (key, value) in map {
            let name = key_text(key);
            let mut child_path = path.to_string();
            push_segment(&mut child_path, &name);

            let mut property = Schema {
                title: name.clone(),
                description: self.comments.get(&child_path).cloned().unwrap_or_default(),
                ..Schema::default()
            };
            if self.value(&mut property, value, &name, &child_path) {
                schema.properties.insert(name.clone(), property);
                schema.required.insert(name);
            }
        }
    }

    /// Fill `schema` from `value`. Returns false when the value has no type
    /// and the property must be dropped.
    fn value(&mut self, schema: &mut Schema, value: &Yaml, name: &str, path: &str) -> bool {
        match Node::of(value) {
            Node::Null => {
                self.diags.warn(
                    name,
                    codes::UNKNOWN_TYPE,
                    format!("type of field {name} is indeterminate (null)"),
                );
                return false;
            }
            Node::Bool(b) => {
                schema.schema_type = Some(SchemaType::Boolean);
                schema.default = Some(Value::Bool(b));
            }
            Node::Int(n) => {
                schema.schema_type = Some(SchemaType::Integer);
                schema.default = Some(n);
            }
            Node::Float(f) => {
                schema.schema_type = Some(SchemaType::Number);
                match serde_json::Number::from_f64(f) {
                    Some(n) => schema.default = Some(Value::Number(n)),
                    None => self.diags.warn(
                        name,
                        codes::INVALID_DEFAULT,
                        format!("default {f} of field {name} has no JSON representation"),
                    ),
                }
            }
            Node::Str(s) => {
                schema.schema_type = Some(SchemaType::String);
                schema.default = Some(Value::String(s));
            }
            Node::Map(map) => self.mapping(schema, map, path),
            Node::Seq(seq) => self.sequence(schema, seq, value, name, path),
        }
        true
    }

    fn sequence(&mut self, schema: &mut Schema, seq: &[Yaml], value: &Yaml, name: &str, path: &str) {
        schema.schema_type = Some(SchemaType::Array);
        let mut items_path = path.to_string();
        push_segment(&mut items_path, "[]");

        let items = match seq.first() {
            None => {
                self.diags.warn(
                    name,
                    codes::UNKNOWN_TYPE,
                    format!("array {name} is empty so its element type is unknown"),
                );
                Schema {
                    comment: "schemaport warning: unknown type from empty array".to_string(),
                    ..Schema::default()
                }
            }
            Some(first) => {
                let mut items = Schema::default();
                if self.value(&mut items, first, name, &items_path) {
                    items.default = None;
                    items
                } else {
                    Schema {
                        comment: "schemaport warning: unknown type from null array element"
                            .to_string(),
                        ..Schema::default()
                    }
                }
            }
        };
        schema.items = Some(Box::new(items));
        schema.default = Some(yaml_to_json(value));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::result::Severity;
    use serde_json::json;

    fn import_str(source: &str) -> SchemaResult {
        values_to_schema(Path::new("values.yaml"), source)
    }

    #[test]
    fn test_scalar_types() {
        let result = import_str("name: web\nreplicas: 3\nratio: 0.5\nenabled: true\n");
        assert!(result.diags.is_empty());
        let encoded = serde_json::to_value(&result.schema).unwrap();
        assert_eq!(
            encoded,
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "title": "name", "default": "web"},
                    "replicas": {"type": "integer", "title": "replicas", "default": 3},
                    "ratio": {"type": "number", "title": "ratio", "default": 0.5},
                    "enabled": {"type": "boolean", "title": "enabled", "default": true}
                },
                "required": ["enabled", "name", "ratio", "replicas"]
            })
        );
    }

    #[test]
    fn test_null_value_is_skipped() {
        let result = import_str("nullValue: null\nkept: 1\n");
        assert!(!result.schema.properties.contains_key("nullValue"));
        assert!(!result.schema.required.contains("nullValue"));
        assert_eq!(result.diags.len(), 1);
        let diag = &result.diags[0];
        assert_eq!(diag.path, "nullValue");
        assert_eq!(diag.code, codes::UNKNOWN_TYPE);
        assert_eq!(diag.level, Severity::Warning);
        assert_eq!(diag.message, "type of field nullValue is indeterminate (null)");
    }

    #[test]
    fn test_explicit_null_tag_is_skipped() {
        let result = import_str("nullValue: !!null\n");
        assert!(result.schema.properties.is_empty());
        assert_eq!(result.diags[0].code, codes::UNKNOWN_TYPE);
    }

    #[test]
    fn test_explicit_str_tag() {
        let result = import_str("version: !!str 110\n");
        let version = &result.schema.properties["version"];
        assert!(version.is_type(&SchemaType::String));
        assert_eq!(version.default, Some(json!("110")));
    }

    #[test]
    fn test_empty_array_warns() {
        let result = import_str("emptyArray: []\n");
        let array = &result.schema.properties["emptyArray"];
        assert!(array.is_type(&SchemaType::Array));
        assert_eq!(
            array.items.as_ref().unwrap().comment,
            "schemaport warning: unknown type from empty array"
        );
        assert_eq!(result.diags.len(), 1);
        assert_eq!(result.diags[0].path, "emptyArray");
        assert_eq!(result.diags[0].level, Severity::Warning);
    }

    #[test]
    fn test_array_element_type_from_first_item() {
        let result = import_str("mixed:\n  - 1\n  - two\n  - true\n");
        let mixed = &result.schema.properties["mixed"];
        let items = mixed.items.as_ref().unwrap();
        assert!(items.is_type(&SchemaType::Integer));
        assert_eq!(items.default, None);
        assert_eq!(mixed.default, Some(json!([1, "two", true])));
    }

    #[test]
    fn test_nested_maps_and_comments() {
        let source = "\
# Container image
image:
  # Repository to pull from
  repository: nginx
  tag: \"1.25\"
ports:
  - # Port name
    name: http
    port: 80
";
        let result = import_str(source);
        let image = &result.schema.properties["image"];
        assert_eq!(image.description, "Container image");
        assert!(image.is_type(&SchemaType::Object));
        assert_eq!(image.default, None);
        assert_eq!(image.properties["repository"].description, "Repository to pull from");
        assert_eq!(image.properties["tag"].default, Some(json!("1.25")));
        let names: Vec<&str> = image.required.iter().map(String::as_str).collect();
        assert_eq!(names, ["repository", "tag"]);

        let items = result.schema.properties["ports"].items.as_ref().unwrap();
        assert!(items.is_type(&SchemaType::Object));
        assert_eq!(items.properties["name"].description, "Port name");
        assert_eq!(items.properties["port"].default, Some(json!(80)));
    }

    #[test]
    fn test_property_order_follows_document() {
        let result = import_str("zeta: 1\nalpha: 2\nmid: 3\n");
        let names: Vec<&str> = result.schema.properties.keys().map(String::as_str).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_empty_document() {
        let result = import_str("# only a comment\n");
        assert!(result.diags.is_empty());
        assert!(result.schema.is_type(&SchemaType::Object));
        assert!(result.schema.properties.is_empty());
    }

    #[test]
    fn test_non_mapping_root_is_fatal() {
        let result = import_str("- a\n- b\n");
        assert_eq!(result.schema, Schema::default());
        assert_eq!(result.diags.len(), 1);
        assert_eq!(result.diags[0].code, codes::PARSE_ERROR);
    }

    #[test]
    fn test_invalid_yaml_is_fatal() {
        let result = import_str("a: [1, 2\n");
        assert!(result.has_errors());
        assert_eq!(result.diags[0].code, codes::PARSE_ERROR);
    }

    #[test]
    fn test_non_finite_float() {
        let result = import_str("limit: .inf\n");
        let limit = &result.schema.properties["limit"];
        assert!(limit.is_type(&SchemaType::Number));
        assert_eq!(limit.default, None);
        assert_eq!(result.diags[0].code, codes::INVALID_DEFAULT);
    }
}
