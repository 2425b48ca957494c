//! Recovers head comments from a values document.
//!
//! `serde_yaml` drops comments, so this scans the raw text for block-style
//! keys and remembers the `#` lines directly above each of them. Keys are
//! addressed by dotted path, with `[]` standing for "an item of this list".

use std::collections::HashMap;

#[derive(Debug)]
struct Frame {
    indent: usize,
    segment: String,
}

/// Map of key path → comment text (one line per comment line, `#` stripped).
pub(crate) fn head_comments(source: &str) -> HashMap<String, String> {
    let mut comments = HashMap::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    let mut block_scalar_indent: Option<usize> = None;

    for line in source.lines() {
        let trimmed = line.trim();
        let mut indent = line.len() - line.trim_start_matches(' ').len();

        if let Some(block_indent) = block_scalar_indent {
            if trimmed.is_empty() || indent > block_indent {
                continue;
            }
            block_scalar_indent = None;
        }

        if trimmed.is_empty() {
            pending.clear();
            continue;
        }
        if trimmed.starts_with('#') {
            pending.push(comment_text(trimmed));
            continue;
        }
        if trimmed == "---" || trimmed == "..." {
            stack.clear();
            pending.clear();
            continue;
        }

        let mut content = &line[indent..];
        while content == "-" || content.starts_with("- ") {
            while stack
                .last()
                .is_some_and(|f| f.indent > indent || (f.indent == indent && f.segment == "[]"))
            {
                stack.pop();
            }
            stack.push(Frame {
                indent,
                segment: "[]".to_string(),
            });
            let rest = content[1..].trim_start_matches(' ');
            indent += content.len() - rest.len();
            content = rest;
            // A comment above `- key:` belongs to the item, not the key.
            pending.clear();
        }
        if content.starts_with('#') {
            pending.push(comment_text(content));
            continue;
        }

        if let Some((key, value)) = split_key(content) {
            while stack.last().is_some_and(|f| f.indent >= indent) {
                stack.pop();
            }
            let path = join_path(&stack, &key);
            if !pending.is_empty() {
                comments.entry(path).or_insert_with(|| pending.join("\n"));
            }
            let value = value.trim_start();
            if value.starts_with('|') || value.starts_with('>') {
                block_scalar_indent = Some(indent);
            }
            stack.push(Frame {
                indent,
                segment: key,
            });
        }
        pending.clear();
    }
    comments
}

fn comment_text(comment: &str) -> String {
    comment.trim_start_matches('#').trim().to_string()
}

/// Split `key: value` into its key and the remaining text.
fn split_key(content: &str) -> Option<(String, &str)> {
    let first = content.chars().next()?;
    if first == '"' || first == '\'' {
        let close = content[1..].find(first)? + 1;
        let rest = content[close + 1..].trim_start_matches(' ');
        let value = rest.strip_prefix(':')?;
        return Some((content[1..close].to_string(), value));
    }
    if matches!(first, '{' | '[' | '&' | '*' | '!' | '|' | '>') {
        return None;
    }
    let mut search = 0;
    while let Some(offset) = content[search..].find(':') {
        let idx = search + offset;
        let after = &content[idx + 1..];
        if after.is_empty() || after.starts_with([' ', '\t']) {
            return Some((content[..idx].trim_end().to_string(), after));
        }
        search = idx + 1;
    }
    None
}

fn join_path(stack: &[Frame], key: &str) -> String {
    let mut path = String::new();
    for frame in stack {
        push_segment(&mut path, &frame.segment);
    }
    push_segment(&mut path, key);
    path
}

pub(crate) fn push_segment(path: &mut String, segment: &str) {
    if !path.is_empty() && segment != "[]" {
        path.push('.');
    }
    path.push_str(segment);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_above_key() {
        let comments = head_comments("# How many pods\nreplicas: 3\nname: web\n");
        assert_eq!(comments["replicas"], "How many pods");
        assert!(!comments.contains_key("name"));
    }

    #[test]
    fn test_nested_and_multiline_comments() {
        let source = "\
image:
  # Image repository
  # without the tag
  repository: nginx
  ## Tag to pull
  tag: latest
";
        let comments = head_comments(source);
        assert_eq!(comments["image.repository"], "Image repository\nwithout the tag");
        assert_eq!(comments["image.tag"], "Tag to pull");
    }

    #[test]
    fn test_blank_line_detaches_comment() {
        let comments = head_comments("# Section header\n\nreplicas: 3\n");
        assert!(comments.is_empty());
    }

    #[test]
    fn test_sequence_items() {
        let source = "\
ports:
  - # Port name
    name: http
    # Port number
    port: 80
  - name: https
    port: 443
after: true
";
        let comments = head_comments(source);
        assert_eq!(comments["ports[].name"], "Port name");
        assert_eq!(comments["ports[].port"], "Port number");
        assert_eq!(comments.len(), 2);
    }

    #[test]
    fn test_block_scalars_are_skipped() {
        let source = "\
script: |
  # not a comment
  key: value
# real comment
other: 1
";
        let comments = head_comments(source);
        assert_eq!(comments["other"], "real comment");
        assert!(!comments.contains_key("script.key"));
        assert!(!comments.contains_key("key"));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let source = "\
items:
  # first
  - name: a
  # second
  - name: b
";
        let comments = head_comments(source);
        assert!(!comments.contains_key("items[].name"));

        let source = "list:\n- # first\n  name: a\n- # second\n  name: b\n";
        assert_eq!(head_comments(source)["list[].name"], "first");
    }

    #[test]
    fn test_split_key() {
        assert_eq!(split_key("a: 1"), Some(("a".to_string(), " 1")));
        assert_eq!(split_key("url: http://x"), Some(("url".to_string(), " http://x")));
        assert_eq!(split_key("\"a b\": 1"), Some(("a b".to_string(), " 1")));
        assert_eq!(split_key("plain"), None);
        assert_eq!(split_key("obj:"), Some(("obj".to_string(), "")));
    }
}
