//! Flattening of composite schemas into one ordered property set.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use indexmap::map::Entry;

use super::Schema;

/// Union of a node's own properties and those reachable through `oneOf`,
/// `anyOf`, `allOf` and `dependencies`, in that order.
///
/// Each branch is expanded recursively before it is merged. The first
/// occurrence of a name wins; later ones are dropped.
pub fn expand_properties(schema: &Schema) -> IndexMap<&str, &Schema> {
    let mut merged = IndexMap::new();
    for (name, prop) in &schema.properties {
        merge(&mut merged, name, prop);
    }

    let branches = schema
        .one_of
        .iter()
        .chain(&schema.any_of)
        .chain(&schema.all_of)
        .chain(schema.dependencies.values());
    for branch in branches {
        for (name, prop) in expand_properties(branch) {
            merge(&mut merged, name, prop);
        }
    }
    merged
}

fn merge<'a>(merged: &mut IndexMap<&'a str, &'a Schema>, name: &'a str, prop: &'a Schema) {
    if let Entry::Vacant(slot) = merged.entry(name) {
        slot.insert(prop);
    }
}

/// Names that stay required after expansion: the node's own `required` plus
/// whatever its `allOf` branches require. Alternatives reached through
/// `oneOf`, `anyOf` or `dependencies` never are.
pub fn required_properties(schema: &Schema) -> BTreeSet<&str> {
    let mut required: BTreeSet<&str> = schema.required.iter().map(String::as_str).collect();
    for branch in &schema.all_of {
        required.extend(required_properties(branch));
    }
    required
}
