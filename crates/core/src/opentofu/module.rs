//! Loads the `variable` blocks of an OpenTofu/Terraform module directory.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use super::typeexpr::{TypeConstraint, evaluate};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    /// In file-name order, then declaration order.
    pub variables: Vec<Variable>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    /// `None` when the block has no `type` attribute.
    pub type_constraint: Option<TypeConstraint>,
    pub description: String,
    pub default: Option<Value>,
}

/// Read every `*.tf` file in `dir`.
pub fn load_module(dir: &Path) -> Result<Module> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|err| Error::read(dir, err))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "tf"))
        .collect();
    files.sort();

    let mut module = Module::default();
    for file in &files {
        let source = std::fs::read_to_string(file).map_err(|err| Error::read(file, err))?;
        parse_variables(file, &source, &mut module)?;
    }
    debug!(
        dir = %dir.display(),
        files = files.len(),
        variables = module.variables.len(),
        "loaded module"
    );
    Ok(module)
}

/// Append the variables declared in one file's source.
pub fn parse_variables(file: &Path, source: &str, module: &mut Module) -> Result<()> {
    let body = hcl::parse(source).map_err(|err| Error::parse(file, None, err.to_string()))?;

    for block in body.blocks().filter(|b| b.identifier() == "variable") {
        let name = match block.labels() {
            [label] => label.as_str().to_string(),
            _ => {
                return Err(Error::parse(
                    file,
                    None,
                    "variable block requires exactly one name label",
                ));
            }
        };
        if module.variables.iter().any(|v| v.name == name) {
            return Err(Error::parse(file, None, format!("duplicate variable \"{name}\"")));
        }
        let context =
            |message: String| Error::parse(file, None, format!("variable \"{name}\": {message}"));

        let mut variable = Variable {
            name: name.clone(),
            type_constraint: None,
            description: String::new(),
            default: None,
        };
        for attr in block.body().attributes() {
            match attr.key() {
                "type" => {
                    variable.type_constraint =
                        Some(TypeConstraint::from_expr(attr.expr()).map_err(context)?);
                }
                "description" => {
                    variable.description = match evaluate(attr.expr()).map_err(context)? {
                        Some(Value::String(text)) => text,
                        Some(other) => other.to_string(),
                        None => String::new(),
                    };
                }
                "default" => variable.default = evaluate(attr.expr()).map_err(context)?,
                _ => {}
            }
        }
        module.variables.push(variable);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(source: &str) -> Result<Module> {
        let mut module = Module::default();
        parse_variables(Path::new("variables.tf"), source, &mut module)?;
        Ok(module)
    }

    #[test]
    fn test_variables_in_declaration_order() {
        let module = parse(
            r#"
variable "zone" {
  type        = string
  description = "Availability zone"
  default     = "a"
}

resource "null_resource" "noop" {}

variable "count" {
  type = number
}
"#,
        )
        .unwrap();
        let names: Vec<&str> = module.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["zone", "count"]);
        assert_eq!(module.variables[0].description, "Availability zone");
        assert_eq!(module.variables[0].default, Some(json!("a")));
        assert_eq!(module.variables[1].type_constraint, Some(TypeConstraint::Number));
        assert_eq!(module.variables[1].default, None);
    }

    #[test]
    fn test_null_default_is_absent() {
        let module = parse("variable \"x\" {\n  type = string\n  default = null\n}\n").unwrap();
        assert_eq!(module.variables[0].default, None);
    }

    #[test]
    fn test_missing_type_is_none() {
        let module = parse("variable \"x\" {}\n").unwrap();
        assert_eq!(module.variables[0].type_constraint, None);
    }

    #[test]
    fn test_invalid_type_names_the_variable() {
        let err = parse("variable \"x\" {\n  type = optional(string)\n}\n").unwrap_err();
        assert!(err.to_string().contains("variable \"x\""));
    }

    #[test]
    fn test_duplicate_variable() {
        let err = parse("variable \"x\" {}\nvariable \"x\" {}\n").unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_load_module_reads_tf_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.tf"), "variable \"second\" {\n  type = bool\n}\n").unwrap();
        std::fs::write(dir.path().join("a.tf"), "variable \"first\" {\n  type = string\n}\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "variable \"ignored\" {}\n").unwrap();
        let module = load_module(dir.path()).unwrap();
        let names: Vec<&str> = module.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["first", "second"]);
    }

    #[test]
    fn test_missing_directory() {
        let err = load_module(Path::new("does/not/exist")).unwrap_err();
        assert_eq!(err.code(), "read_error");
    }
}
