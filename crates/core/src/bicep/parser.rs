//! A reader for the parameter surface of Bicep source.
//!
//! Only top-level `param` declarations and the decorators directly above them
//! are interpreted. Every other statement is skipped with bracket and string
//! tracking so multi-line bodies do not confuse the scan.

use std::path::Path;

use serde_json::{Map, Value};

use super::template::{Template, TemplateParameter};
use crate::error::{Error, Result};

pub(crate) fn parse_bicep(path: &Path, source: &str) -> Result<Template> {
    Parser::new(path, source).parse()
}

#[derive(Debug)]
enum Decorator {
    Description(String),
    Allowed(Vec<Value>),
    MinValue(i64),
    MaxValue(i64),
    MinLength(u64),
    MaxLength(u64),
    Secure,
    Other,
}

struct Parser<'a> {
    path: &'a Path,
    chars: Vec<char>,
    pos: usize,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl<'a> Parser<'a> {
    fn new(path: &'a Path, source: &str) -> Self {
        Self {
            path,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<Template> {
        let mut template = Template::default();
        let mut decorators = Vec::new();
        loop {
            self.skip_trivia();
            let Some(c) = self.peek() else { break };
            if c == '@' {
                self.bump();
                decorators.push(self.parse_decorator()?);
                continue;
            }
            if is_ident_start(c) && self.ident() == "param" {
                let (name, param) = self.parse_param(std::mem::take(&mut decorators))?;
                template.parameters.insert(name, param);
                continue;
            }
            decorators.clear();
            self.skip_balanced(0, true)?;
        }
        Ok(template)
    }

    fn error(&self, message: impl Into<String>) -> Error {
        let line = self.chars[..self.pos.min(self.chars.len())]
            .iter()
            .filter(|c| **c == '\n')
            .count()
            + 1;
        Error::parse(self.path, Some(line), message)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn starts_with(&self, text: &str) -> bool {
        let mut idx = self.pos;
        for expected in text.chars() {
            if self.chars.get(idx) != Some(&expected) {
                return false;
            }
            idx += 1;
        }
        true
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected `{expected}`, found `{c}`"))),
            None => Err(self.error(format!("expected `{expected}`, found end of file"))),
        }
    }

    fn ident(&mut self) -> String {
        let start = self.pos;
        if self.peek().is_some_and(is_ident_start) {
            while self.peek().is_some_and(is_ident_char) {
                self.pos += 1;
            }
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// Skip a `//` or `/* */` comment at the cursor, if any.
    fn skip_comment(&mut self) -> bool {
        if self.starts_with("//") {
            while self.peek().is_some_and(|c| c != '\n') {
                self.pos += 1;
            }
            true
        } else if self.starts_with("/*") {
            self.pos += 2;
            while self.peek().is_some() && !self.starts_with("*/") {
                self.pos += 1;
            }
            self.pos = (self.pos + 2).min(self.chars.len());
            true
        } else {
            false
        }
    }

    /// Whitespace and comments, newlines included.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => self.pos += 1,
                Some('/') if self.skip_comment() => {}
                _ => break,
            }
        }
    }

    /// Whitespace and comments up to, not including, the next newline.
    fn skip_inline_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c != '\n' && c.is_whitespace() => self.pos += 1,
                Some('/') if self.skip_comment() => {}
                _ => break,
            }
        }
    }

    /// Trivia plus the commas that may separate array and object items.
    fn skip_separators(&mut self) {
        loop {
            self.skip_trivia();
            if self.peek() == Some(',') {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn at_line_end(&mut self) -> bool {
        let saved = self.pos;
        self.skip_inline_trivia();
        let done = matches!(self.peek(), None | Some('\n'));
        self.pos = saved;
        done
    }

    fn finish_line(&mut self) -> Result<()> {
        self.skip_inline_trivia();
        match self.peek() {
            None | Some('\n') => Ok(()),
            Some(c) => Err(self.error(format!("unexpected `{c}` after declaration"))),
        }
    }

    /// Advance past balanced text. With `to_line_end` this stops before the
    /// first newline (or comment) reached at depth zero; otherwise it stops
    /// right after the closer that brings `depth` back to zero.
    fn skip_balanced(&mut self, mut depth: usize, to_line_end: bool) -> Result<()> {
        while let Some(c) = self.peek() {
            match c {
                '\n' if depth == 0 && to_line_end => return Ok(()),
                '/' if self.starts_with("//") || self.starts_with("/*") => {
                    if depth == 0 && to_line_end {
                        return Ok(());
                    }
                    self.skip_comment();
                    continue;
                }
                '\'' => {
                    self.skip_string()?;
                    continue;
                }
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => {
                    if depth == 0 {
                        return Err(self.error(format!("unbalanced `{c}`")));
                    }
                    depth -= 1;
                    if depth == 0 && !to_line_end {
                        self.pos += 1;
                        return Ok(());
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
        if depth > 0 {
            return Err(self.error("unexpected end of file inside brackets"));
        }
        Ok(())
    }

    /// Skip any string, interpolations included.
    fn skip_string(&mut self) -> Result<()> {
        if self.starts_with("'''") {
            self.parse_multiline_string()?;
            return Ok(());
        }
        self.expect('\'')?;
        loop {
            let c = self.string_char()?;
            match c {
                '\'' => return Ok(()),
                '\\' => {
                    self.string_char()?;
                }
                '$' if self.peek() == Some('{') => self.skip_balanced(0, false)?,
                _ => {}
            }
        }
    }

    fn parse_decorator(&mut self) -> Result<Decorator> {
        let mut name = self.ident();
        if name == "sys" && self.peek() == Some('.') {
            self.pos += 1;
            name = self.ident();
        }
        if name.is_empty() {
            return Err(self.error("expected decorator name after `@`"));
        }
        self.skip_inline_trivia();
        self.expect('(')?;
        self.skip_trivia();

        let decorator = match name.as_str() {
            "description" => match self.parse_literal()? {
                Value::String(text) => Decorator::Description(text),
                _ => return Err(self.error("@description expects a string")),
            },
            "allowed" => match self.parse_literal()? {
                Value::Array(values) => Decorator::Allowed(values),
                _ => return Err(self.error("@allowed expects an array")),
            },
            "minValue" => Decorator::MinValue(self.parse_int_arg()?),
            "maxValue" => Decorator::MaxValue(self.parse_int_arg()?),
            "minLength" => Decorator::MinLength(self.parse_length_arg()?),
            "maxLength" => Decorator::MaxLength(self.parse_length_arg()?),
            "secure" => Decorator::Secure,
            _ => {
                self.skip_balanced(1, false)?;
                return Ok(Decorator::Other);
            }
        };
        self.skip_trivia();
        self.expect(')')?;
        Ok(decorator)
    }

    /// Next character of a single-line string; the newline is never consumed.
    fn string_char(&mut self) -> Result<char> {
        match self.peek() {
            Some(c) if c != '\n' => {
                self.pos += 1;
                Ok(c)
            }
            _ => Err(self.error("unterminated string")),
        }
    }

    fn parse_int_arg(&mut self) -> Result<i64> {
        match self.parse_literal()? {
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| self.error("expected an integer argument")),
            _ => Err(self.error("expected an integer argument")),
        }
    }

    fn parse_length_arg(&mut self) -> Result<u64> {
        let value = self.parse_int_arg()?;
        u64::try_from(value).map_err(|_| self.error("length must not be negative"))
    }

    fn parse_param(&mut self, decorators: Vec<Decorator>) -> Result<(String, TemplateParameter)> {
        self.skip_inline_trivia();
        let name = self.ident();
        if name.is_empty() {
            return Err(self.error("expected parameter name"));
        }
        self.skip_inline_trivia();
        let (mut type_name, union_values) = self.parse_type()?;
        self.skip_inline_trivia();

        let default_value = if self.peek() == Some('=') {
            self.pos += 1;
            self.skip_inline_trivia();
            Some(self.parse_default()?)
        } else {
            None
        };
        self.finish_line()?;

        let mut param = TemplateParameter {
            default_value,
            allowed_values: (!union_values.is_empty()).then_some(union_values),
            ..TemplateParameter::default()
        };
        let mut secure = false;
        for decorator in decorators {
            match decorator {
                Decorator::Description(text) => param.metadata.description = Some(text),
                Decorator::Allowed(values) => param.allowed_values = Some(values),
                Decorator::MinValue(n) => param.min_value = Some(n),
                Decorator::MaxValue(n) => param.max_value = Some(n),
                Decorator::MinLength(n) => param.min_length = Some(n),
                Decorator::MaxLength(n) => param.max_length = Some(n),
                Decorator::Secure => secure = true,
                Decorator::Other => {}
            }
        }
        if secure {
            match type_name.as_str() {
                "string" => type_name = "secureString".to_string(),
                "object" => type_name = "secureObject".to_string(),
                _ => {}
            }
        }
        param.type_name = type_name;
        Ok((name, param))
    }

    /// Returns the type name plus the members of a string-literal union type.
    fn parse_type(&mut self) -> Result<(String, Vec<Value>)> {
        let mut union = Vec::new();
        let mut type_name = match self.peek() {
            Some('\'') => {
                loop {
                    union.push(Value::String(self.parse_string()?));
                    self.skip_inline_trivia();
                    if self.peek() != Some('|') {
                        break;
                    }
                    self.pos += 1;
                    self.skip_inline_trivia();
                }
                "string".to_string()
            }
            Some('{') => {
                self.skip_balanced(0, false)?;
                "object".to_string()
            }
            _ => {
                let name = self.ident();
                if name.is_empty() {
                    return Err(self.error("expected parameter type"));
                }
                name
            }
        };
        if self.starts_with("[]") {
            self.pos += 2;
            type_name = "array".to_string();
            union.clear();
        }
        if self.peek() == Some('?') {
            self.pos += 1;
        }
        Ok((type_name, union))
    }

    /// A literal default, or the raw text of any other expression wrapped the
    /// way ARM templates write expressions.
    fn parse_default(&mut self) -> Result<Value> {
        let start = self.pos;
        if let Ok(value) = self.parse_literal()
            && self.at_line_end()
        {
            return Ok(value);
        }
        self.pos = start;
        self.skip_balanced(0, true)?;
        let text: String = self.chars[start..self.pos].iter().collect();
        let text = text.trim();
        if text.is_empty() {
            return Err(self.error("expected a default value after `=`"));
        }
        Ok(Value::String(format!("[{text}]")))
    }

    fn parse_literal(&mut self) -> Result<Value> {
        match self.peek() {
            Some('\'') => self.parse_string().map(Value::String),
            Some('[') => self.parse_array(),
            Some('{') => self.parse_object(),
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_int(),
            Some(c) if is_ident_start(c) => {
                let word = self.ident();
                match word.as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" => Ok(Value::Null),
                    _ => Err(self.error(format!("`{word}` is not a literal"))),
                }
            }
            Some(c) => Err(self.error(format!("unexpected `{c}`"))),
            None => Err(self.error("expected a value, found end of file")),
        }
    }

    fn parse_int(&mut self) -> Result<Value> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek().is_some_and(|c| c == '.' || is_ident_char(c)) {
            return Err(self.error("only integer literals are supported"));
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<i64>()
            .map(Value::from)
            .map_err(|_| self.error(format!("invalid integer `{text}`")))
    }

    fn parse_string(&mut self) -> Result<String> {
        if self.starts_with("'''") {
            return self.parse_multiline_string();
        }
        self.expect('\'')?;
        let mut out = String::new();
        loop {
            match self.string_char()? {
                '\'' => return Ok(out),
                '\\' => {
                    let escaped = match self.string_char()? {
                        'n' => '\n',
                        'r' => '\r',
                        't' => '\t',
                        '\\' => '\\',
                        '\'' => '\'',
                        '$' => '$',
                        'u' => self.parse_unicode_escape()?,
                        c => return Err(self.error(format!("unknown escape `\\{c}`"))),
                    };
                    out.push(escaped);
                }
                '$' if self.peek() == Some('{') => {
                    return Err(self.error("interpolated strings are not literals"));
                }
                c => out.push(c),
            }
        }
    }

    fn parse_unicode_escape(&mut self) -> Result<char> {
        self.expect('{')?;
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            self.pos += 1;
        }
        let hex: String = self.chars[start..self.pos].iter().collect();
        self.expect('}')?;
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error(format!("invalid unicode escape `{hex}`")))
    }

    fn parse_multiline_string(&mut self) -> Result<String> {
        self.pos += 3;
        let start = self.pos;
        while !self.starts_with("'''") {
            if self.bump().is_none() {
                return Err(self.error("unterminated multi-line string"));
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        self.pos += 3;
        // A newline right after the opening quotes is not part of the value.
        let text = text
            .strip_prefix("\r\n")
            .or_else(|| text.strip_prefix('\n'))
            .unwrap_or(&text);
        Ok(text.to_string())
    }

    fn parse_array(&mut self) -> Result<Value> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_separators();
            match self.peek() {
                Some(']') => {
                    self.pos += 1;
                    return Ok(Value::Array(items));
                }
                None => return Err(self.error("unterminated array")),
                Some(_) => items.push(self.parse_literal()?),
            }
        }
    }

    fn parse_object(&mut self) -> Result<Value> {
        self.expect('{')?;
        let mut object = Map::new();
        loop {
            self.skip_separators();
            let key = match self.peek() {
                Some('}') => {
                    self.pos += 1;
                    return Ok(Value::Object(object));
                }
                None => return Err(self.error("unterminated object")),
                Some('\'') => self.parse_string()?,
                Some(_) => {
                    let key = self.ident();
                    if key.is_empty() {
                        return Err(self.error("expected an object key"));
                    }
                    key
                }
            };
            self.skip_inline_trivia();
            self.expect(':')?;
            self.skip_inline_trivia();
            let value = self.parse_literal()?;
            object.insert(key, value);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(source: &str) -> Template {
        parse_bicep(Path::new("main.bicep"), source).unwrap()
    }

    #[test]
    fn test_simple_params() {
        let template = parse(
            "param location string = 'eastus'\nparam count int = 3\nparam enabled bool\n",
        );
        let names: Vec<&str> = template.parameters.keys().map(String::as_str).collect();
        assert_eq!(names, ["location", "count", "enabled"]);
        assert_eq!(template.parameters["location"].type_name, "string");
        assert_eq!(template.parameters["location"].default_value, Some(json!("eastus")));
        assert_eq!(template.parameters["count"].default_value, Some(json!(3)));
        assert_eq!(template.parameters["enabled"].default_value, None);
    }

    #[test]
    fn test_decorators() {
        let template = parse(
            r"
@sys.description('Number of nodes')
@minValue(1)
@maxValue(10)
@allowed([
  1
  5
  7
])
param nodes int = 5

@description('Admin password')
@secure()
@minLength(12)
param adminPassword string
",
        );
        let nodes = &template.parameters["nodes"];
        assert_eq!(nodes.metadata.description.as_deref(), Some("Number of nodes"));
        assert_eq!(nodes.min_value, Some(1));
        assert_eq!(nodes.max_value, Some(10));
        assert_eq!(nodes.allowed_values, Some(vec![json!(1), json!(5), json!(7)]));

        let password = &template.parameters["adminPassword"];
        assert_eq!(password.type_name, "secureString");
        assert_eq!(password.min_length, Some(12));
    }

    #[test]
    fn test_object_and_array_literals() {
        let template = parse(
            r"param tags object = {
  env: 'prod'
  'cost-center': 42
  nested: { enabled: true, list: [1, 2] }
}
param zones array = [
  '1'
  '2'
]
",
        );
        assert_eq!(
            template.parameters["tags"].default_value,
            Some(json!({"env": "prod", "cost-center": 42, "nested": {"enabled": true, "list": [1, 2]}}))
        );
        assert_eq!(template.parameters["zones"].default_value, Some(json!(["1", "2"])));
    }

    #[test]
    fn test_expression_default_is_kept_raw() {
        let template = parse("param location string = resourceGroup().location // where\n");
        assert_eq!(
            template.parameters["location"].default_value,
            Some(json!("[resourceGroup().location]"))
        );
    }

    #[test]
    fn test_other_statements_are_skipped() {
        let template = parse(
            r"targetScope = 'resourceGroup'

var prefix = 'app'

@description('The storage account')
resource storage 'Microsoft.Storage/storageAccounts@2023-01-01' = {
  name: '${prefix}-store'
  properties: {
    param: 'not a parameter'
  }
}

/* block
   comment */
param name string = 'x' // trailing

output id string = storage.id
",
        );
        let names: Vec<&str> = template.parameters.keys().map(String::as_str).collect();
        assert_eq!(names, ["name"]);
        assert_eq!(template.parameters["name"].metadata.description, None);
    }

    #[test]
    fn test_string_escapes_and_multiline() {
        let template = parse(
            "param a string = 'it\\'s \\${here}'\nparam b string = '''\nline one\nline two'''\n",
        );
        assert_eq!(template.parameters["a"].default_value, Some(json!("it's ${here}")));
        assert_eq!(
            template.parameters["b"].default_value,
            Some(json!("line one\nline two"))
        );
    }

    #[test]
    fn test_union_type_becomes_allowed_values() {
        let template = parse("param sku 'Basic' | 'Standard' = 'Basic'\nparam ids string[]\n");
        assert_eq!(template.parameters["sku"].type_name, "string");
        assert_eq!(
            template.parameters["sku"].allowed_values,
            Some(vec![json!("Basic"), json!("Standard")])
        );
        assert_eq!(template.parameters["ids"].type_name, "array");
    }

    #[test]
    fn test_secure_object() {
        let template = parse("@secure()\nparam secrets object\n");
        assert_eq!(template.parameters["secrets"].type_name, "secureObject");
    }

    #[test]
    fn test_unterminated_string_reports_line() {
        let err = parse_bicep(Path::new("main.bicep"), "param a int\nparam b string = 'oops\n")
            .unwrap_err();
        assert!(matches!(err, Error::Parse { line: Some(2), .. }), "{err:?}");
    }
}
