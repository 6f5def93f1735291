//! Parsing and navigation of attribute references.
//!
//! Supported forms:
//! - `name`, `$name`, `$.name`: an attribute of the scope
//! - `$activity[task_id].name`: a default output published by another task
//!
//! Any form may be followed by `.field`, `[n]` or `["key"]` segments.

use crate::errors::ResolutionError;
use serde_json::Value;
use std::iter::Peekable;
use std::str::Chars;

const ACTIVITY_PREFIX: &str = "activity[";

/// Where the referenced attribute lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceSource {
    /// The scope being resolved against.
    Scope,
    /// The published outputs of the named task.
    Activity(String),
}

/// One step into a structured value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// An object field.
    Field(String),
    /// An array position.
    Index(usize),
}

/// A parsed attribute reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    source: ReferenceSource,
    attribute: String,
    path: Vec<PathSegment>,
}

impl Reference {
    /// Parses a reference expression.
    ///
    /// # Errors
    ///
    /// Returns `ResolutionError` if the expression is malformed.
    pub fn parse(expression: &str) -> Result<Self, ResolutionError> {
        let fail = |reason: String| ResolutionError::new(expression, reason);
        let trimmed = expression.trim();

        let (source, rest) = match trimmed.strip_prefix('$') {
            None => (ReferenceSource::Scope, trimmed),
            Some(rest) => {
                if let Some(after) = rest.strip_prefix(ACTIVITY_PREFIX) {
                    let (task_id, tail) = after
                        .split_once(']')
                        .ok_or_else(|| fail("unterminated activity reference".to_string()))?;
                    if task_id.trim().is_empty() {
                        return Err(fail("empty task id in activity reference".to_string()));
                    }
                    let tail = tail
                        .strip_prefix('.')
                        .ok_or_else(|| fail("expected '.' after activity reference".to_string()))?;
                    (ReferenceSource::Activity(task_id.trim().to_string()), tail)
                } else {
                    (ReferenceSource::Scope, rest.strip_prefix('.').unwrap_or(rest))
                }
            }
        };

        let (attribute, path) = parse_path(rest).map_err(fail)?;
        Ok(Self {
            source,
            attribute,
            path,
        })
    }

    /// Returns where the attribute lives.
    #[must_use]
    pub const fn source(&self) -> &ReferenceSource {
        &self.source
    }

    /// Returns the referenced attribute name.
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Returns the path into the attribute value.
    #[must_use]
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// Follows the path into `value`.
    ///
    /// # Errors
    ///
    /// Returns a description of the first segment that does not exist.
    pub fn navigate(&self, value: Value) -> Result<Value, String> {
        let mut current = value;
        for segment in &self.path {
            current = match (segment, current) {
                (PathSegment::Field(field), Value::Object(mut map)) => map
                    .remove(field)
                    .ok_or_else(|| format!("field '{field}' not found"))?,
                (PathSegment::Index(index), Value::Array(mut items)) => {
                    if *index >= items.len() {
                        return Err(format!(
                            "index {index} out of bounds for array of length {}",
                            items.len()
                        ));
                    }
                    items.swap_remove(*index)
                }
                (PathSegment::Field(field), other) => {
                    return Err(format!("cannot read field '{field}' of {}", kind(&other)))
                }
                (PathSegment::Index(index), other) => {
                    return Err(format!("cannot index {} with [{index}]", kind(&other)))
                }
            };
        }
        Ok(current)
    }
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn parse_path(input: &str) -> Result<(String, Vec<PathSegment>), String> {
    let mut chars = input.chars().peekable();
    let attribute = take_name(&mut chars);
    if attribute.trim().is_empty() {
        return Err("missing attribute name".to_string());
    }

    let mut path = Vec::new();
    while let Some(c) = chars.next() {
        match c {
            '.' => {
                let field = take_name(&mut chars);
                if field.is_empty() {
                    return Err("empty field name after '.'".to_string());
                }
                path.push(PathSegment::Field(field));
            }
            '[' if chars.peek() == Some(&'"') => {
                chars.next();
                let key = take_until(&mut chars, '"').ok_or("unterminated quoted key")?;
                if chars.next() != Some(']') {
                    return Err(format!("expected ']' after key \"{key}\""));
                }
                path.push(PathSegment::Field(key));
            }
            '[' => {
                let digits = take_until(&mut chars, ']').ok_or("unterminated index")?;
                let index = digits
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| format!("invalid index '{digits}'"))?;
                path.push(PathSegment::Index(index));
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }

    Ok((attribute.trim().to_string(), path))
}

fn take_name(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c == '.' || c == '[' {
            break;
        }
        name.push(c);
        chars.next();
    }
    name
}

fn take_until(chars: &mut Peekable<Chars<'_>>, end: char) -> Option<String> {
    let mut taken = String::new();
    for c in chars.by_ref() {
        if c == end {
            return Some(taken);
        }
        taken.push(c);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_scope_forms() {
        for expr in ["name", "$name", "$.name", "  $.name "] {
            let reference = Reference::parse(expr).unwrap();
            assert_eq!(reference.source(), &ReferenceSource::Scope);
            assert_eq!(reference.attribute(), "name");
            assert!(reference.path().is_empty());
        }
    }

    #[test]
    fn test_parse_activity_form() {
        let reference = Reference::parse("$activity[rest_1].result.items[2]").unwrap();
        assert_eq!(reference.source(), &ReferenceSource::Activity("rest_1".to_string()));
        assert_eq!(reference.attribute(), "result");
        assert_eq!(
            reference.path(),
            &[
                PathSegment::Field("items".to_string()),
                PathSegment::Index(2)
            ]
        );
    }

    #[test]
    fn test_parse_quoted_key() {
        let reference = Reference::parse(r#"$.headers["Content-Type"]"#).unwrap();
        assert_eq!(reference.path(), &[PathSegment::Field("Content-Type".to_string())]);
    }

    #[test]
    fn test_parse_errors() {
        for expr in ["$", "$.", "$activity[x", "$activity[].a", "$activity[x]a", "$.a.", "$.a[x]", "$.a[1"] {
            assert!(Reference::parse(expr).is_err(), "expected error for {expr}");
        }
    }

    #[test]
    fn test_navigate() {
        let reference = Reference::parse("$.doc.items[1].id").unwrap();
        let value = json!({"items": [{"id": 1}, {"id": 2}]});
        assert_eq!(reference.navigate(value).unwrap(), json!(2));
    }

    #[test]
    fn test_navigate_errors() {
        let reference = Reference::parse("$.doc.items[5]").unwrap();
        let err = reference.navigate(json!({"items": []})).unwrap_err();
        assert!(err.contains("out of bounds"));

        let reference = Reference::parse("$.doc.name").unwrap();
        let err = reference.navigate(json!(3)).unwrap_err();
        assert_eq!(err, "cannot read field 'name' of a number");
    }
}
