//! SORT
//!
//! `SORT(key [asc|desc], ...)`. Keys compare by timestamp when the value carries a
//! resolved one, numerically when it parses as a number, and as lower-cased text
//! otherwise. Without an explicit direction timestamps sort newest first and
//! everything else ascending. Nodes missing a key sort after those that have it,
//! whatever the direction. The sort is stable.

use crate::nodetext::dynamic::directive::{phase, Accumulator, CompileContext, DirectiveOp, Outcome};
use crate::nodetext::error::DirectiveError;
use crate::nodetext::node::Node;
use chrono::NaiveDateTime;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
    /// Descending for timestamps, ascending otherwise
    Natural,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub key: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Timestamp(NaiveDateTime),
    Number(f64),
    Text(String),
}

impl SortValue {
    fn rank(&self) -> u8 {
        match self {
            SortValue::Timestamp(_) => 0,
            SortValue::Number(_) => 1,
            SortValue::Text(_) => 2,
        }
    }

    fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Timestamp(a), SortValue::Timestamp(b)) => a.cmp(b),
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn is_timestamp(&self) -> bool {
        matches!(self, SortValue::Timestamp(_))
    }
}

fn sort_value(node: &Node, key: &str) -> Option<SortValue> {
    match key {
        "title" => return Some(SortValue::Text(node.title.to_lowercase())),
        "id" => return Some(SortValue::Text(node.id.to_lowercase())),
        "_oldest_timestamp" => {
            return node
                .metadata
                .get_oldest_timestamp()
                .and_then(|ts| ts.datetime)
                .map(SortValue::Timestamp)
        }
        _ => {}
    }

    let values = node.metadata.get_values(key);
    if let Some(datetime) = values
        .iter()
        .find_map(|v| v.timestamp.as_ref().and_then(|ts| ts.datetime))
    {
        return Some(SortValue::Timestamp(datetime));
    }
    let text = values.iter().find_map(|v| {
        v.text
            .clone()
            .or_else(|| v.timestamp.as_ref().map(|ts| ts.raw.clone()))
    })?;
    Some(match text.parse::<f64>() {
        Ok(number) => SortValue::Number(number),
        Err(_) => SortValue::Text(text.to_lowercase()),
    })
}

#[derive(Debug, Clone, Default)]
pub struct Sort {
    keys: Vec<SortKey>,
}

impl Sort {
    pub fn boxed() -> Box<dyn DirectiveOp> {
        Box::<Sort>::default()
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    fn compare(&self, a: &[Option<SortValue>], b: &[Option<SortValue>]) -> Ordering {
        for (i, sort_key) in self.keys.iter().enumerate() {
            let ordering = match (&a[i], &b[i]) {
                (None, None) => Ordering::Equal,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(x), Some(y)) => {
                    let ordering = x.compare(y);
                    match sort_key.direction {
                        Direction::Ascending => ordering,
                        Direction::Descending => ordering.reverse(),
                        Direction::Natural if x.is_timestamp() && y.is_timestamp() => {
                            ordering.reverse()
                        }
                        Direction::Natural => ordering,
                    }
                }
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

impl DirectiveOp for Sort {
    fn name(&self) -> &'static str {
        "SORT"
    }

    fn phase(&self) -> u32 {
        phase::SORT
    }

    fn parse_argument_string(&mut self, argument: &str) -> Result<(), DirectiveError> {
        let invalid = |message: String| DirectiveError::InvalidArgument {
            directive: "SORT".to_string(),
            message,
        };

        let mut keys = Vec::new();
        for part in argument.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let mut words = part.split_whitespace();
            let key = words.next().unwrap_or_default().to_lowercase();
            let direction = match words.next().map(|w| w.to_lowercase()) {
                None => Direction::Natural,
                Some(word) if word == "asc" || word == "ascending" => Direction::Ascending,
                Some(word) if word == "desc" || word == "descending" => Direction::Descending,
                Some(word) => return Err(invalid(format!("unknown direction '{word}'"))),
            };
            if words.next().is_some() {
                return Err(invalid(format!("cannot read sort key '{part}'")));
            }
            keys.push(SortKey { key, direction });
        }
        if keys.is_empty() {
            return Err(invalid("no sort keys given".to_string()));
        }
        self.keys = keys;
        Ok(())
    }

    fn dynamic_output(&self, accumulator: &Accumulator, context: &CompileContext) -> Outcome {
        let mut keyed: Vec<(String, Vec<Option<SortValue>>)> = accumulator
            .nodes
            .iter()
            .map(|id| {
                let values = match context.nodes.get_node(id) {
                    Some(node) => self.keys.iter().map(|k| sort_value(node, &k.key)).collect(),
                    None => vec![None; self.keys.len()],
                };
                (id.clone(), values)
            })
            .collect();
        keyed.sort_by(|(_, a), (_, b)| self.compare(a, b));

        Outcome::Replace(Accumulator {
            nodes: keyed.into_iter().map(|(id, _)| id).collect(),
            text: accumulator.text.clone(),
        })
    }

    fn depends_on(&self, node: &Node, _context: &CompileContext) -> bool {
        self.keys.iter().any(|k| node.metadata.has_key(&k.key))
    }
}
