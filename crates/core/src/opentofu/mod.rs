//! OpenTofu/Terraform modules: `variable` blocks in, `variable` blocks out.

mod export;
mod import;
mod module;
mod typeexpr;

pub use export::{ObjectAttr, TypeExpr, VariableBlock, render_literal, schema_to_opentofu};
pub use import::{module_to_schema, opentofu_to_schema};
pub use module::{Module, Variable, load_module, parse_variables};
pub use typeexpr::{ObjectAttribute, TypeConstraint};
