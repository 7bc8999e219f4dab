//! Front-matter parsing

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use thiserror::Error;

lazy_static! {
    /// A top-level front-matter line: `key:` or `key: value`
    static ref KEY_LINE: Regex = Regex::new(r"^[A-Za-z0-9_-]+:(\s|$)").unwrap();
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrontMatterError {
    #[error("unterminated front matter: no closing `---` delimiter")]
    Unterminated,

    #[error("invalid key syntax on front-matter line {line}: {text:?}")]
    InvalidKey { line: usize, text: String },

    #[error("invalid YAML front matter: {0}")]
    Yaml(String),

    #[error("front matter must be a mapping of keys to values")]
    NotMapping,

    #[error("invalid JSON front matter: {0}")]
    Json(String),
}

/// Front-matter fields of a post or draft, in file order.
///
/// Only a handful of keys are interpreted (see the accessors below); every
/// other key is kept as-is so it survives re-serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrontMatter {
    fields: IndexMap<String, Value>,
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    pub fn parse(content: &str) -> Result<(Self, &str), FrontMatterError> {
        let content = skip_blank_lines(content.trim_start_matches('\u{feff}'));

        // Check for YAML front-matter (---)
        if first_line(content) == "---" {
            return Self::parse_yaml(content);
        }

        // Check for JSON front-matter (;;; or {"key":)
        if content.starts_with(";;;") || content.starts_with('{') {
            return Self::parse_json(content);
        }

        // No front-matter found
        Ok((FrontMatter::default(), content))
    }

    fn parse_yaml(content: &str) -> Result<(Self, &str), FrontMatterError> {
        let mut offset = 0;
        let mut block_start = None;
        let mut block_end = None;

        for line in content.split_inclusive('\n') {
            let start = offset;
            offset += line.len();
            if block_start.is_none() {
                block_start = Some(offset);
                continue;
            }
            let trimmed = line.trim_end();
            if trimmed == "---" || trimmed == "..." {
                block_end = Some((start, offset));
                break;
            }
        }

        let block_start = block_start.unwrap_or(content.len());
        let (yaml_end, body_start) = block_end.ok_or(FrontMatterError::Unterminated)?;
        let yaml_content = &content[block_start..yaml_end];
        let remaining = content[body_start..].trim_start_matches(['\n', '\r']);

        check_key_syntax(yaml_content)?;

        let is_blank = yaml_content
            .lines()
            .all(|l| l.trim().is_empty() || l.trim_start().starts_with('#'));
        if is_blank {
            return Ok((FrontMatter::default(), remaining));
        }

        let value: Value = serde_yaml::from_str(yaml_content)
            .map_err(|e| FrontMatterError::Yaml(e.to_string()))?;

        let fields = match value {
            Value::Null => IndexMap::new(),
            Value::Mapping(mapping) => mapping
                .into_iter()
                .map(|(k, v)| {
                    scalar_string(&k)
                        .map(|key| (key, v))
                        .ok_or(FrontMatterError::NotMapping)
                })
                .collect::<Result<_, _>>()?,
            _ => return Err(FrontMatterError::NotMapping),
        };

        Ok((Self { fields }, remaining))
    }

    fn parse_json(content: &str) -> Result<(Self, &str), FrontMatterError> {
        // JSON front-matter ends with ;;;
        if let Some(rest) = content.strip_prefix(";;;") {
            let end_pos = rest.find(";;;").ok_or(FrontMatterError::Unterminated)?;
            let json_content = &rest[..end_pos];
            let remaining = rest[end_pos + 3..].trim_start_matches(['\n', '\r']);
            return Ok((Self::from_json(json_content)?, remaining));
        }

        // Find matching closing brace of a leading object
        let mut depth = 0;
        let mut in_string = false;
        let mut escaped = false;
        for (i, c) in content.char_indices() {
            if in_string {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match c {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let json_content = &content[..=i];
                        let remaining = content[i + 1..].trim_start_matches(['\n', '\r']);
                        return Ok((Self::from_json(json_content)?, remaining));
                    }
                }
                _ => {}
            }
        }

        Err(FrontMatterError::Unterminated)
    }

    fn from_json(json_content: &str) -> Result<Self, FrontMatterError> {
        let json: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(json_content).map_err(|e| FrontMatterError::Json(e.to_string()))?;

        let fields = json
            .into_iter()
            .map(|(k, v)| {
                serde_yaml::to_value(v)
                    .map(|v| (k, v))
                    .map_err(|e| FrontMatterError::Json(e.to_string()))
            })
            .collect::<Result<_, _>>()?;

        Ok(Self { fields })
    }

    /// Serialize back to a `---` delimited YAML block
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        if self.fields.is_empty() {
            return Ok("---\n---\n".to_string());
        }
        let yaml = serde_yaml::to_string(&self.fields)?;
        Ok(format!("---\n{}---\n", yaml))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Set a key, keeping its position if it already exists
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    /// Remove a key, keeping the order of the others
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn title(&self) -> Option<String> {
        self.string("title")
    }

    pub fn layout(&self) -> Option<String> {
        self.string("layout")
    }

    pub fn summary(&self) -> Option<String> {
        self.string("summary")
    }

    pub fn slug(&self) -> Option<String> {
        self.string("slug")
    }

    pub fn status(&self) -> Option<String> {
        self.string("status")
    }

    /// Raw `date` value as written
    pub fn date(&self) -> Option<String> {
        self.string("date")
    }

    /// Boolean `published` flag, as in `published: false`
    pub fn published(&self) -> Option<bool> {
        self.fields.get("published").and_then(Value::as_bool)
    }

    /// `revision_of`, or its camel-case spelling
    pub fn revision_of(&self) -> Option<String> {
        self.string("revision_of")
            .or_else(|| self.string("revisionOf"))
    }

    pub fn tags(&self) -> Vec<String> {
        self.list("tags")
    }

    /// `category` and `categories` merged
    pub fn categories(&self) -> Vec<String> {
        let mut categories = self.list("category");
        categories.extend(self.list("categories"));
        categories
    }

    fn string(&self, key: &str) -> Option<String> {
        self.fields
            .get(key)
            .and_then(scalar_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// A single string or a list of strings; nested lists are flattened
    fn list(&self, key: &str) -> Vec<String> {
        fn collect(value: &Value, out: &mut Vec<String>) {
            match value {
                Value::Sequence(items) => items.iter().for_each(|item| collect(item, out)),
                other => {
                    if let Some(s) = scalar_string(other) {
                        let s = s.trim();
                        if !s.is_empty() {
                            out.push(s.to_string());
                        }
                    }
                }
            }
        }

        let mut out = Vec::new();
        if let Some(value) = self.fields.get(key) {
            collect(value, &mut out);
        }
        out
    }
}

fn first_line(content: &str) -> &str {
    content.lines().next().unwrap_or("").trim_end()
}

/// Every top-level line must open a `key:` entry; indented lines, list
/// items, comments and blank lines belong to the previous entry.
fn check_key_syntax(yaml_content: &str) -> Result<(), FrontMatterError> {
    for (i, line) in yaml_content.lines().enumerate() {
        let trimmed = line.trim_end();
        if trimmed.is_empty()
            || trimmed.starts_with(char::is_whitespace)
            || trimmed.starts_with('#')
            || trimmed == "-"
            || trimmed.starts_with("- ")
        {
            continue;
        }
        if !KEY_LINE.is_match(trimmed) {
            return Err(FrontMatterError::InvalidKey {
                // +2: the opening delimiter is line 1
                line: i + 2,
                text: trimmed.to_string(),
            });
        }
    }
    Ok(())
}

/// Render a scalar YAML value as a string
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_string(&tagged.value),
        _ => None,
    }
}

/// Drop leading whitespace-only lines, keeping the indentation of the first
/// line with content
fn skip_blank_lines(content: &str) -> &str {
    let mut rest = content;
    while let Some(end) = rest.find('\n') {
        if !rest[..end].trim().is_empty() {
            break;
        }
        rest = &rest[end + 1..];
    }
    rest
}

/// Parse a date string in various formats
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    // RFC 3339 / ISO 8601 with offset; keep the calendar date as written
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.date_naive());
    }

    None
}
