//! Node selection criteria for INCLUDE and EXCLUDE
//!
//! An argument is a list of criteria separated by `,` or `;`; a node must satisfy
//! all of them. Separators inside `<...>` belong to the value.
//!
//! | criterion            | matches                                          |
//! |----------------------|--------------------------------------------------|
//! | `all`, `*`           | every node                                       |
//! | `@self`              | the definition's own node                        |
//! | `@parent`            | the parent of the definition's node              |
//! | `@children`          | the children of the definition's node            |
//! | `key`                | nodes carrying `key`                             |
//! | `key = v`, `key::v`  | some value equals `v` (case-insensitive)         |
//! | `key != v`           | no value equals `v`                              |
//! | `key ? v`            | some value contains `v`                          |
//! | `key < v`, `key > v` | some value orders before / after `v`             |
//!
//! A leading `tag:` is accepted and ignored. Ordering compares timestamps when both
//! sides resolve, numbers when both sides parse, and text otherwise.

use crate::nodetext::config::ParsingSettings;
use crate::nodetext::metadata::{MetadataValue, Timestamp};
use crate::nodetext::node::Node;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;

static COMPARISON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9_#\-]+)\s*(!=|=|\?|<|>)\s*(.*)$").unwrap()
});

/// `<` directly followed by the value, so a spaced `<` operator never opens one
static TIMESTAMP_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>\s][^<>\n]*>").unwrap());

static KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_#\-]+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    Contains,
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criterion {
    All,
    SelfNode,
    Parent,
    Children,
    Has(String),
    Compare {
        key: String,
        operator: Operator,
        value: String,
    },
}

impl Criterion {
    pub fn parse(text: &str) -> Result<Criterion, String> {
        let text = text.trim();
        match text.to_lowercase().as_str() {
            "" => return Err("empty criterion".to_string()),
            "all" | "*" => return Ok(Criterion::All),
            "@self" => return Ok(Criterion::SelfNode),
            "@parent" => return Ok(Criterion::Parent),
            "@children" => return Ok(Criterion::Children),
            _ => {}
        }

        let text = strip_tag_prefix(text);
        if let Some((key, value)) = text.split_once("::") {
            return Ok(Criterion::Compare {
                key: key.trim().to_lowercase(),
                operator: Operator::Equal,
                value: unwrap_value(value),
            });
        }
        if let Some(caps) = COMPARISON.captures(text) {
            let operator = match &caps[2] {
                "!=" => Operator::NotEqual,
                "=" => Operator::Equal,
                "?" => Operator::Contains,
                "<" => Operator::Before,
                _ => Operator::After,
            };
            return Ok(Criterion::Compare {
                key: caps[1].to_lowercase(),
                operator,
                value: unwrap_value(&caps[3]),
            });
        }
        if KEY.is_match(text) {
            return Ok(Criterion::Has(text.to_lowercase()));
        }
        Err(format!("cannot read criterion '{text}'"))
    }

    /// Whether `node` satisfies this criterion; `source` is the definition's node.
    pub fn matches(&self, node: &Node, source: Option<&Node>, settings: &ParsingSettings) -> bool {
        match self {
            Criterion::All => true,
            Criterion::SelfNode | Criterion::Parent | Criterion::Children => {
                self.related(node, source)
            }
            Criterion::Has(key) => has_key(node, key),
            Criterion::Compare {
                key,
                operator,
                value,
            } => compare(node, key, *operator, value, settings),
        }
    }

    /// Whether a change to `node` can change this criterion's result set
    pub fn concerns(&self, node: &Node, source: Option<&Node>) -> bool {
        match self {
            Criterion::All => true,
            Criterion::SelfNode | Criterion::Parent | Criterion::Children => {
                self.related(node, source)
            }
            Criterion::Has(key) | Criterion::Compare { key, .. } => has_key(node, key),
        }
    }

    fn related(&self, node: &Node, source: Option<&Node>) -> bool {
        let Some(source) = source else {
            return false;
        };
        match self {
            Criterion::SelfNode => source.id == node.id,
            Criterion::Parent => source.parent.as_deref() == Some(node.id.as_str()),
            Criterion::Children => node.parent.as_deref() == Some(source.id.as_str()),
            _ => false,
        }
    }
}

fn strip_tag_prefix(text: &str) -> &str {
    let lower = text.to_lowercase();
    for prefix in ["tags:", "tag:"] {
        if lower.starts_with(prefix) && !lower.starts_with(&format!("{prefix}:")) {
            return text[prefix.len()..].trim();
        }
    }
    text
}

/// Trim a value and drop a `<...>` wrapper around it.
fn unwrap_value(value: &str) -> String {
    let value = value.trim();
    value
        .strip_prefix('<')
        .and_then(|v| v.strip_suffix('>'))
        .unwrap_or(value)
        .trim()
        .to_string()
}

fn has_key(node: &Node, key: &str) -> bool {
    key == "id" || key == "title" || node.metadata.has_key(key)
}

/// The comparable texts of `key` on `node`
fn candidates(node: &Node, key: &str) -> Vec<MetadataValue> {
    match key {
        "id" => vec![MetadataValue::from_text(node.id.clone())],
        "title" => vec![MetadataValue::from_text(node.title.clone())],
        _ => node.metadata.get_values(key).into_iter().cloned().collect(),
    }
}

fn value_texts(value: &MetadataValue) -> Vec<&str> {
    let mut texts = Vec::new();
    if let Some(text) = &value.text {
        texts.push(text.as_str());
    }
    if let Some(link) = &value.link {
        texts.push(link.as_str());
    }
    if let Some(ts) = &value.timestamp {
        texts.push(ts.raw.as_str());
    }
    texts
}

fn compare(
    node: &Node,
    key: &str,
    operator: Operator,
    target: &str,
    settings: &ParsingSettings,
) -> bool {
    let values = candidates(node, key);
    let target_lower = target.to_lowercase();
    let equal = |value: &MetadataValue| {
        value_texts(value)
            .iter()
            .any(|text| text.to_lowercase() == target_lower)
    };

    match operator {
        Operator::Equal => values.iter().any(equal),
        Operator::NotEqual => !values.iter().any(equal),
        Operator::Contains => values.iter().any(|value| {
            value_texts(value)
                .iter()
                .any(|text| text.to_lowercase().contains(&target_lower))
        }),
        Operator::Before | Operator::After => {
            let wanted = if operator == Operator::Before {
                Ordering::Less
            } else {
                Ordering::Greater
            };
            let target_ts = Timestamp::parse(target, &settings.timestamp_formats);
            values
                .iter()
                .filter_map(|value| order(value, target, &target_ts))
                .any(|ordering| ordering == wanted)
        }
    }
}

fn order(value: &MetadataValue, target: &str, target_ts: &Timestamp) -> Option<Ordering> {
    if let (Some(ts), Some(other)) = (&value.timestamp, &target_ts.datetime) {
        if let Some(datetime) = &ts.datetime {
            return Some(datetime.cmp(other));
        }
    }
    let text = value
        .text
        .as_deref()
        .or(value.timestamp.as_ref().map(|ts| ts.raw.as_str()))?;
    match (text.parse::<f64>(), target.parse::<f64>()) {
        (Ok(a), Ok(b)) => Some(a.total_cmp(&b)),
        _ => Some(text.to_lowercase().cmp(&target.to_lowercase())),
    }
}

/// Split on `,` and `;` outside of `<...>` timestamp values.
fn split_criteria(argument: &str) -> Vec<&str> {
    let protected: Vec<_> = TIMESTAMP_VALUE
        .find_iter(argument)
        .map(|m| m.range())
        .collect();
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, c) in argument.char_indices() {
        if (c == ',' || c == ';') && !protected.iter().any(|r| r.contains(&i)) {
            parts.push(&argument[start..i]);
            start = i + 1;
        }
    }
    parts.push(&argument[start..]);
    parts
}

/// An intersection of criteria
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub criteria: Vec<Criterion>,
}

impl Query {
    pub fn parse(argument: &str) -> Result<Query, String> {
        let criteria = split_criteria(argument)
            .into_iter()
            .filter(|part| !part.trim().is_empty())
            .map(Criterion::parse)
            .collect::<Result<Vec<_>, _>>()?;
        if criteria.is_empty() {
            return Err("no criteria given".to_string());
        }
        Ok(Query { criteria })
    }

    pub fn matches(&self, node: &Node, source: Option<&Node>, settings: &ParsingSettings) -> bool {
        self.criteria
            .iter()
            .all(|criterion| criterion.matches(node, source, settings))
    }

    pub fn concerns(&self, node: &Node, source: Option<&Node>) -> bool {
        self.criteria
            .iter()
            .any(|criterion| criterion.concerns(node, source))
    }

    pub fn names_self(&self) -> bool {
        self.criteria.contains(&Criterion::SelfNode)
    }
}
