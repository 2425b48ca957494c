//! Helm values files → Schema. There is no exporter for this direction.

mod comments;
mod import;

pub use import::{helm_to_schema, values_to_schema};
