//! Front-matter parsing

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// Line that opens and closes a front-matter block
pub const DELIMITER: &str = "---";

/// YAML document end marker, accepted as an alternative closing line
const DOCUMENT_END: &str = "...";

/// Reasons a front-matter block cannot be used
#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("missing opening `---` delimiter")]
    MissingStart,

    #[error("missing closing `---` delimiter")]
    Unterminated,

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("expected key-value pairs, found {0}")]
    NotAMapping(&'static str),

    #[error("key `{key}` must be {expected}")]
    WrongType { key: String, expected: &'static str },

    #[error("key `{key}` has unrecognized date `{value}`")]
    InvalidDate { key: String, value: String },

    #[error("missing required key `{0}`")]
    MissingKey(&'static str),
}

/// Front-matter data from a post, page or layout.
///
/// Keys keep the order they had in the source file, so serializing the
/// mapping back yields the same pairs in the same order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    data: Mapping,
}

impl FrontMatter {
    /// Create front-matter from an existing mapping
    pub fn from_mapping(data: Mapping) -> Self {
        Self { data }
    }

    /// Whether `content` opens with a front-matter delimiter line
    pub fn is_present(content: &str) -> bool {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        content
            .lines()
            .next()
            .map(|line| line.trim_end() == DELIMITER)
            .unwrap_or(false)
    }

    /// Parse front-matter from content string.
    /// Returns `None` when the content has no front-matter block, otherwise
    /// the front-matter and the remaining body.
    pub fn parse(content: &str) -> Result<Option<(Self, &str)>, FrontMatterError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut lines = content.split_inclusive('\n');

        let opening = match lines.next() {
            Some(line) if line.trim_end() == DELIMITER => line,
            _ => return Ok(None),
        };

        let yaml_start = opening.len();
        let mut offset = yaml_start;
        for line in lines {
            let marker = line.trim_end();
            if marker == DELIMITER || marker == DOCUMENT_END {
                let yaml = &content[yaml_start..offset];
                let body = &content[offset + line.len()..];
                return Ok(Some((Self::parse_yaml(yaml)?, body)));
            }
            offset += line.len();
        }

        Err(FrontMatterError::Unterminated)
    }

    fn parse_yaml(yaml: &str) -> Result<Self, FrontMatterError> {
        // An empty block is an empty mapping
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        match serde_yaml::from_str::<Value>(yaml)? {
            Value::Mapping(data) => Ok(Self { data }),
            Value::Null => Ok(Self::default()),
            other => Err(FrontMatterError::NotAMapping(value_kind(&other))),
        }
    }

    /// Serialize the key-value pairs back to YAML (without delimiters)
    pub fn to_yaml(&self) -> Result<String, FrontMatterError> {
        if self.data.is_empty() {
            return Ok(String::new());
        }
        Ok(serde_yaml::to_string(&self.data)?)
    }

    /// Serialize as a complete document: delimited front-matter then `body`
    pub fn to_document(&self, body: &str) -> Result<String, FrontMatterError> {
        Ok(format!("{}\n{}{}\n{}", DELIMITER, self.to_yaml()?, DELIMITER, body))
    }

    pub fn data(&self) -> &Mapping {
        &self.data
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.data.insert(Value::String(key.to_string()), value.into());
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// A string-valued key; `null` counts as absent
    pub fn get_str(&self, key: &str) -> Result<Option<&str>, FrontMatterError> {
        match self.data.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(FrontMatterError::WrongType {
                key: key.to_string(),
                expected: "a string",
            }),
        }
    }

    /// A list of strings, written either as a YAML sequence or as a single
    /// whitespace-separated string
    pub fn get_list(&self, key: &str) -> Result<Vec<String>, FrontMatterError> {
        let wrong_type = || FrontMatterError::WrongType {
            key: key.to_string(),
            expected: "a string or a list of strings",
        };

        match self.data.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(s.split_whitespace().map(str::to_string).collect()),
            Some(Value::Sequence(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    Value::Number(n) => Ok(n.to_string()),
                    _ => Err(wrong_type()),
                })
                .collect(),
            Some(_) => Err(wrong_type()),
        }
    }

    /// A date-valued key
    pub fn get_date(&self, key: &str) -> Result<Option<DateTime<FixedOffset>>, FrontMatterError> {
        match self.get_str(key)? {
            None => Ok(None),
            Some(s) => parse_date_string(s)
                .map(Some)
                .ok_or_else(|| FrontMatterError::InvalidDate {
                    key: key.to_string(),
                    value: s.to_string(),
                }),
        }
    }

    /// Iterate over string keys and their values in source order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.data
            .iter()
            .filter_map(|(key, value)| key.as_str().map(|key| (key, value)))
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Parse a date string in the formats Jekyll accepts. Dates without an
/// offset are taken as UTC.
pub fn parse_date_string(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }

    let with_offset = ["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M %z", "%Y-%m-%dT%H:%M:%S%z"];
    for fmt in with_offset {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    let utc = FixedOffset::east_opt(0)?;

    let naive = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
    ];
    for fmt in naive {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return utc.from_local_datetime(&dt).single();
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return utc.from_local_datetime(&d.and_hms_opt(0, 0, 0)?).single();
        }
    }

    None
}
