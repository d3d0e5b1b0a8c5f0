//! Front-matter parsing

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

lazy_static! {
    /// A `key: value` or `key:` line, the shape every YAML front-matter block has
    static ref YAML_KEY_LINE: Regex = Regex::new(r"^([A-Za-z0-9_-]+):(\s|$)").unwrap();
}

/// Custom deserializer that reads any scalar (string, number, bool) as a string
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct Scalar;

    impl<'de> Visitor<'de> for Scalar {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a scalar value")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
            Ok(Some(value))
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(Scalar)
}

/// Custom deserializer that handles both a single string and a list of strings
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(vec![value.to_string()])
        }

        fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
            Ok(vec![value])
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                vec.push(item);
            }
            Ok(vec)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// Metadata header of a post
///
/// Every field is optional. Consumers apply their own fallbacks, so a
/// missing key never stops a build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(deserialize_with = "scalar_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub date: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub author: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub excerpt: Option<String>,
    /// Free-form tags; any string is accepted
    #[serde(deserialize_with = "string_or_vec")]
    pub tags: Vec<String>,
    /// Free-form categories; any string is accepted
    #[serde(deserialize_with = "string_or_vec")]
    pub categories: Vec<String>,

    /// Additional custom fields, in the order they were written
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl FrontMatter {
    /// Split content into front-matter and body.
    ///
    /// Never fails: text without a recognisable metadata block, or with one
    /// that cannot be deserialized, yields empty metadata and the whole
    /// text as body.
    pub fn parse(content: &str) -> (Self, &str) {
        let trimmed = content.trim_start();

        if trimmed.starts_with("---") {
            if let Some(parsed) = Self::parse_yaml(trimmed) {
                return parsed;
            }
        } else if trimmed.starts_with("+++") {
            if let Some(parsed) = Self::parse_toml(trimmed) {
                return parsed;
            }
        }

        (FrontMatter::default(), content)
    }

    fn parse_yaml(content: &str) -> Option<(Self, &str)> {
        let (block, body) = split_fenced(content, "---")?;

        if block.trim().is_empty() {
            return Some((FrontMatter::default(), body));
        }

        // A `---` pair can just as well be two horizontal rules around prose
        let has_yaml_structure = block.lines().any(|line| {
            let line = line.trim();
            match YAML_KEY_LINE.captures(line) {
                Some(caps) => !matches!(&caps[1], "http" | "https" | "ftp"),
                None => false,
            }
        });
        if !has_yaml_structure {
            return None;
        }

        match serde_yaml::from_str::<FrontMatter>(block) {
            Ok(fm) => Some((fm, body)),
            Err(e) => {
                tracing::warn!("Failed to parse YAML front-matter, treating as content: {}", e);
                None
            }
        }
    }

    fn parse_toml(content: &str) -> Option<(Self, &str)> {
        let (block, body) = split_fenced(content, "+++")?;

        let table = match block.parse::<toml::Table>() {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!("Failed to parse TOML front-matter, treating as content: {}", e);
                return None;
            }
        };

        let value = toml_to_yaml(toml::Value::Table(table));
        match serde_yaml::from_value::<FrontMatter>(value) {
            Ok(fm) => Some((fm, body)),
            Err(e) => {
                tracing::warn!("Unexpected TOML front-matter shape: {}", e);
                None
            }
        }
    }

    /// Parse the date field, reading naive values in the given time zone
    pub fn parse_date(&self, tz: &Tz) -> Option<DateTime<FixedOffset>> {
        self.date.as_deref().and_then(|s| parse_date_string(s, tz))
    }
}

/// Split `fence\n<block>\nfence\n<body>` into block and body
fn split_fenced<'a>(content: &'a str, fence: &str) -> Option<(&'a str, &'a str)> {
    let first_end = content.find('\n')?;
    if content[..first_end].trim_end() != fence {
        return None;
    }

    let block_start = first_end + 1;
    let mut offset = block_start;
    for line in content[block_start..].split_inclusive('\n') {
        if line.trim_end() == fence {
            let block = &content[block_start..offset];
            let body = &content[offset + line.len()..];
            return Some((block, body));
        }
        offset += line.len();
    }

    None
}

/// TOML values carry native datetimes; everything else maps one to one
fn toml_to_yaml(value: toml::Value) -> serde_yaml::Value {
    use serde_yaml::Value;

    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => Value::Number(f.into()),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Sequence(items.into_iter().map(toml_to_yaml).collect()),
        toml::Value::Table(table) => Value::Mapping(
            table
                .into_iter()
                .map(|(k, v)| (Value::String(k), toml_to_yaml(v)))
                .collect(),
        ),
    }
}

/// Years RFC 2822 and W3C datetimes can represent
const MIN_YEAR: i32 = 0;
const MAX_YEAR: i32 = 9999;

/// Parse a date string in various formats.
///
/// Dates outside years 0 to 9999 count as unparsable.
pub fn parse_date_string(s: &str, tz: &Tz) -> Option<DateTime<FixedOffset>> {
    parse_any_date(s, tz).filter(|dt| (MIN_YEAR..=MAX_YEAR).contains(&dt.year()))
}

fn parse_any_date(s: &str, tz: &Tz) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt);
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in datetime_formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return localize(naive, tz);
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return localize(date.and_hms_opt(0, 0, 0)?, tz);
        }
    }

    None
}

fn localize(naive: NaiveDateTime, tz: &Tz) -> Option<DateTime<FixedOffset>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: "Hello"
date: "2024-01-01"
author: h4shk4t
excerpt: "First post"
tags:
  - rust
  - ctf
categories: writeups
---
# Hi
"#;

        let (fm, body) = FrontMatter::parse(content);
        assert_eq!(fm.title.as_deref(), Some("Hello"));
        assert_eq!(fm.date.as_deref(), Some("2024-01-01"));
        assert_eq!(fm.author.as_deref(), Some("h4shk4t"));
        assert_eq!(fm.excerpt.as_deref(), Some("First post"));
        assert_eq!(fm.tags, vec!["rust", "ctf"]);
        assert_eq!(fm.categories, vec!["writeups"]);
        assert_eq!(body, "# Hi\n");
    }

    #[test]
    fn test_body_is_untouched_after_block() {
        let content = "---\ntitle: T\n---\n\n  indented\n\n---\nrule above\n";
        let (fm, body) = FrontMatter::parse(content);
        assert_eq!(fm.title.as_deref(), Some("T"));
        assert_eq!(body, "\n  indented\n\n---\nrule above\n");
    }

    #[test]
    fn test_no_frontmatter() {
        let content = "# Just markdown\n\nNo metadata here.";
        let (fm, body) = FrontMatter::parse(content);
        assert_eq!(fm, FrontMatter::default());
        assert_eq!(body, content);
    }

    #[test]
    fn test_unclosed_block_is_body() {
        let content = "---\ntitle: Never closed\n\nBody text";
        let (fm, body) = FrontMatter::parse(content);
        assert_eq!(fm.title, None);
        assert_eq!(body, content);
    }

    #[test]
    fn test_malformed_yaml_degrades() {
        let content = "---\ntitle: [unclosed\ndate: 2024-01-01\n---\nbody";
        let (fm, body) = FrontMatter::parse(content);
        assert_eq!(fm, FrontMatter::default());
        assert_eq!(body, content);
    }

    #[test]
    fn test_empty_block() {
        let (fm, body) = FrontMatter::parse("---\n---\nbody");
        assert_eq!(fm, FrontMatter::default());
        assert_eq!(body, "body");
    }

    #[test]
    fn test_scalar_values_become_strings() {
        let content = "---\ntitle: 2024\nexcerpt: true\ndate: 2024-03-05 10:30\n---\n";
        let (fm, _) = FrontMatter::parse(content);
        assert_eq!(fm.title.as_deref(), Some("2024"));
        assert_eq!(fm.excerpt.as_deref(), Some("true"));
        assert_eq!(fm.date.as_deref(), Some("2024-03-05 10:30"));
    }

    #[test]
    fn test_extra_fields_keep_order() {
        let content = "---\ntitle: T\nzeta: 1\nalpha: two\n---\n";
        let (fm, _) = FrontMatter::parse(content);
        let keys: Vec<_> = fm.extra.keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_parse_toml_frontmatter() {
        let content = r#"+++
title = "From TOML"
date = 2024-02-10
tags = ["infra"]
+++
Body
"#;
        let (fm, body) = FrontMatter::parse(content);
        assert_eq!(fm.title.as_deref(), Some("From TOML"));
        assert_eq!(fm.date.as_deref(), Some("2024-02-10"));
        assert_eq!(fm.tags, vec!["infra"]);
        assert_eq!(body, "Body\n");
    }

    #[test]
    fn test_markdown_separator_not_yaml() {
        let content = r#"
---

Some random text with markdown lists:
- Item 1
- Item 2

---
More content here.
"#;

        let (fm, body) = FrontMatter::parse(content);
        assert_eq!(fm.title, None);
        assert!(body.contains("Some random text"));
    }

    #[test]
    fn test_content_with_url_not_yaml() {
        let content = "---\nhttps: //example.com is not a key\n---\nMore content.";
        let (fm, body) = FrontMatter::parse(content);
        assert_eq!(fm.title, None);
        assert!(body.contains("example.com"));
    }

    #[test]
    fn test_parse_date_formats() {
        let tz = Tz::UTC;
        let date_only = parse_date_string("2024-01-01", &tz).unwrap();
        assert_eq!(date_only.to_rfc3339(), "2024-01-01T00:00:00+00:00");

        let with_time = parse_date_string("2024/01/15 10:30:00", &tz).unwrap();
        assert_eq!(with_time.format("%Y-%m-%d %H:%M").to_string(), "2024-01-15 10:30");

        let rfc3339 = parse_date_string("2024-01-15T10:30:00+02:00", &tz).unwrap();
        assert_eq!(rfc3339.offset().local_minus_utc(), 2 * 3600);

        assert!(parse_date_string("Mon, 15 Jan 2024 10:30:00 +0000", &tz).is_some());
        assert!(parse_date_string("yesterday", &tz).is_none());
        assert!(parse_date_string("", &tz).is_none());
    }

    #[test]
    fn test_out_of_range_years_are_rejected() {
        let tz = Tz::UTC;
        assert!(parse_date_string("+10000-01-01", &tz).is_none());
        assert!(parse_date_string("-0001-01-01", &tz).is_none());
        assert!(parse_date_string("9999-12-31", &tz).is_some());
    }

    #[test]
    fn test_naive_date_uses_site_timezone() {
        let tz: Tz = chrono_tz::Asia::Kolkata;
        let dt = parse_date_string("2024-01-01", &tz).unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 5 * 3600 + 1800);
    }
}
