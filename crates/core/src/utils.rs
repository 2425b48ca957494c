//! Identifier and string-literal helpers shared by the code emitters.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Literal keywords that cannot stand as a bare name in Bicep or HCL.
pub static LITERAL_KEYWORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| ["true", "false", "null"].into_iter().collect());

/// Keywords that open a for-expression or conditional inside an HCL object.
static HCL_EXPRESSION_KEYWORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| ["for", "if", "in", "endfor", "endif"].into_iter().collect());

/// Names OpenTofu reserves for module meta-arguments; a variable cannot use them.
pub static RESERVED_VARIABLE_NAMES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "source",
        "version",
        "providers",
        "count",
        "for_each",
        "lifecycle",
        "depends_on",
        "locals",
    ]
    .into_iter()
    .collect()
});

/// Check whether a name is a plain identifier.
///
/// Returns false if the name:
/// - Is empty
/// - Doesn't start with a letter or underscore
/// - Contains characters other than alphanumeric or underscore (and `-` when
///   `allow_dash` is set, as HCL does)
pub fn is_identifier(name: &str, allow_dash: bool) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || (allow_dash && c == '-'))
}

/// Escape text for a single-quoted Bicep string.
pub fn escape_bicep_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' => out.push_str("\\$"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text for a double-quoted HCL string.
pub fn escape_hcl_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            // Template sequences would be interpolated.
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Object key for a Bicep literal: bare when it is an identifier, quoted otherwise.
pub fn bicep_key(name: &str) -> String {
    if is_identifier(name, false) && !LITERAL_KEYWORDS.contains(name) {
        name.to_string()
    } else {
        format!("'{}'", escape_bicep_string(name))
    }
}

/// Attribute name for an HCL object type or object literal.
pub fn hcl_key(name: &str) -> String {
    if is_identifier(name, true)
        && !LITERAL_KEYWORDS.contains(name)
        && !HCL_EXPRESSION_KEYWORDS.contains(name)
    {
        name.to_string()
    } else {
        format!("\"{}\"", escape_hcl_string(name))
    }
}

/// Turn an arbitrary name into a valid declaration name.
/// - Replaces invalid characters with `_` (`-` is kept when `allow_dash` is set)
/// - Prepends `_` if it starts with a digit or a dash
/// - Escapes reserved words with a `_` prefix
pub fn sanitize_identifier(name: &str, allow_dash: bool) -> String {
    let mut result: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || (allow_dash && c == '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if result.is_empty() {
        return "_empty".to_string();
    }

    if result.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
        result = format!("_{result}");
    }

    if LITERAL_KEYWORDS.contains(result.as_str()) {
        result = format!("_{result}");
    }

    result
}

/// Claim `ident` in `taken`, appending `_1`, `_2`, ... until it is unused.
/// Returns the claimed name.
pub fn claim_identifier(ident: String, taken: &mut HashSet<String>) -> String {
    let mut candidate = ident.clone();
    let mut n = 1;
    while taken.contains(&candidate) {
        candidate = format!("{ident}_{n}");
        n += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("foo", false));
        assert!(is_identifier("_foo1", false));
        assert!(!is_identifier("", false));
        assert!(!is_identifier("1foo", false));
        assert!(!is_identifier("foo-bar", false));
        assert!(is_identifier("foo-bar", true));
        assert!(!is_identifier("foo.bar", true));
    }

    #[test]
    fn test_escape_bicep_string() {
        assert_eq!(escape_bicep_string("it's"), "it\\'s");
        assert_eq!(escape_bicep_string("a\\b"), "a\\\\b");
        assert_eq!(escape_bicep_string("line\nnext"), "line\\nnext");
        assert_eq!(escape_bicep_string("${x}"), "\\${x}");
    }

    #[test]
    fn test_escape_hcl_string() {
        assert_eq!(escape_hcl_string("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_hcl_string("${var}"), "$${var}");
        assert_eq!(escape_hcl_string("cost $5"), "cost $5");
    }

    #[test]
    fn test_keys() {
        assert_eq!(bicep_key("name"), "name");
        assert_eq!(bicep_key("my-key"), "'my-key'");
        assert_eq!(hcl_key("my-key"), "my-key");
        assert_eq!(hcl_key("my key"), "\"my key\"");
        assert_eq!(hcl_key("null"), "\"null\"");
        assert_eq!(bicep_key("true"), "'true'");
        assert_eq!(hcl_key("for"), "\"for\"");
        assert_eq!(hcl_key("if"), "\"if\"");
        assert_eq!(hcl_key("in"), "\"in\"");
        assert_eq!(hcl_key("format"), "format");
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("storage-account", false), "storage_account");
        assert_eq!(sanitize_identifier("storage-account", true), "storage-account");
        assert_eq!(sanitize_identifier("my var", true), "my_var");
        assert_eq!(sanitize_identifier("1st", false), "_1st");
        assert_eq!(sanitize_identifier("-x", true), "_-x");
        assert_eq!(sanitize_identifier("null", false), "_null");
        assert_eq!(sanitize_identifier("", false), "_empty");
        assert_eq!(sanitize_identifier("location", false), "location");
    }

    #[test]
    fn test_claim_identifier() {
        let mut taken = HashSet::new();
        assert_eq!(claim_identifier("a_b".to_string(), &mut taken), "a_b");
        assert_eq!(claim_identifier("a_b".to_string(), &mut taken), "a_b_1");
        assert_eq!(claim_identifier("a_b".to_string(), &mut taken), "a_b_2");
        assert_eq!(claim_identifier("c".to_string(), &mut taken), "c");
    }
}
