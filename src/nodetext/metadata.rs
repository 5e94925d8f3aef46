//! Metadata model
//!
//! A node's metadata is an ordered list of entries read from its own text:
//!
//! - `key::value` pairs, terminated by `;` or the end of the line
//! - `*key::value` (tags the node's children) and `**key::value` (tags all descendants)
//! - `#word` shorthand, stored under the configured hash key
//!
//! Keys are lower-cased for lookup while values keep their case. A value is split on
//! `|` into an ordered list (duplicates allowed) unless the whole value is a single
//! link (`| target >`), in which case the entry is node-valued. A `<...>` inside a value
//! is parsed into a [`Timestamp`].

pub mod timestamp;

pub use timestamp::Timestamp;

use crate::nodetext::config::ParsingSettings;
use crate::nodetext::syntax;
use serde::Serialize;

/// One value of an entry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MetadataValue {
    pub text: Option<String>,
    pub timestamp: Option<Timestamp>,
    /// Target id when the value is a link to another node
    pub link: Option<String>,
}

impl MetadataValue {
    pub fn from_text(text: impl Into<String>) -> Self {
        MetadataValue {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn from_link(target: impl Into<String>) -> Self {
        let target = target.into();
        MetadataValue {
            text: Some(target.clone()),
            timestamp: None,
            link: Some(target),
        }
    }

    /// Parse a single (already split) value
    fn parse(raw: &str, settings: &ParsingSettings) -> Self {
        let timestamp = syntax::TIMESTAMP
            .captures(raw)
            .map(|caps| Timestamp::parse(&caps[1], &settings.timestamp_formats));
        let text = syntax::TIMESTAMP.replace_all(raw, "").trim().to_string();

        MetadataValue {
            text: (!text.is_empty()).then_some(text),
            timestamp,
            link: None,
        }
    }
}

/// A key with one or more values
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataEntry {
    pub keyname: String,
    pub values: Vec<MetadataValue>,
    pub is_node_valued: bool,
    /// Byte offset of the entry; relative to the text it was parsed from until the
    /// owning node maps it into buffer coordinates
    pub source_position: usize,
    pub tag_children: bool,
    pub tag_descendants: bool,
}

impl MetadataEntry {
    pub fn new(keyname: &str, values: Vec<MetadataValue>, source_position: usize) -> Self {
        MetadataEntry {
            keyname: keyname.to_lowercase(),
            values,
            is_node_valued: false,
            source_position,
            tag_children: false,
            tag_descendants: false,
        }
    }

    /// Oldest resolved timestamp among this entry's values
    pub fn oldest_timestamp(&self) -> Option<&Timestamp> {
        self.values
            .iter()
            .filter_map(|v| v.timestamp.as_ref())
            .filter(|ts| ts.is_resolved())
            .min()
    }

    /// Split a raw value into its parts. Links are read first, so the `|` that
    /// opens a link is never taken for a separator.
    fn parse_values(raw: &str, settings: &ParsingSettings) -> (Vec<MetadataValue>, bool) {
        let raw = raw.trim();
        let mut values = Vec::new();
        let push_plain = |text: &str, values: &mut Vec<MetadataValue>| {
            values.extend(
                text.split(syntax::METADATA_VALUE_SEPARATOR)
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(|part| MetadataValue::parse(part, settings)),
            );
        };

        let mut last = 0;
        for caps in syntax::LINK.captures_iter(raw) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            push_plain(&raw[last..whole.start()], &mut values);
            values.push(MetadataValue::from_link(caps[1].trim()));
            last = whole.end();
        }
        push_plain(&raw[last..], &mut values);

        let is_node_valued = !values.is_empty() && values.iter().all(|v| v.link.is_some());
        (values, is_node_valued)
    }
}

/// Ordered collection of a node's entries
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Metadata {
    entries: Vec<MetadataEntry>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every entry in `text`, in source order.
    ///
    /// Callers are expected to mask regions that must not be read as metadata
    /// (dynamic definitions, embedded blocks) while keeping byte offsets intact.
    pub fn parse(text: &str, settings: &ParsingSettings) -> Self {
        let mut entries = Vec::new();

        for caps in syntax::METADATA_ENTRY.captures_iter(text) {
            let (Some(key), Some(value)) = (caps.get(3), caps.get(4)) else {
                continue;
            };
            let (values, is_node_valued) = MetadataEntry::parse_values(value.as_str(), settings);
            if values.is_empty() {
                continue;
            }
            let stars = caps.get(2).map(|m| m.as_str().len()).unwrap_or(0);
            let position = caps.get(2).map(|m| m.start()).unwrap_or(key.start());

            let mut entry = MetadataEntry::new(key.as_str(), values, position);
            entry.is_node_valued = is_node_valued;
            entry.tag_children = stars == 1;
            entry.tag_descendants = stars == 2;
            entries.push(entry);
        }

        let masked = syntax::mask(text, &syntax::METADATA_ENTRY);
        for caps in syntax::HASH_TAG.captures_iter(&masked) {
            let Some(tag) = caps.get(2) else { continue };
            entries.push(MetadataEntry::new(
                &settings.hash_key,
                vec![MetadataValue::from_text(tag.as_str())],
                tag.start() - 1,
            ));
        }

        entries.sort_by_key(|entry| entry.source_position);
        Metadata { entries }
    }

    pub fn entries(&self) -> &[MetadataEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct keys in first-seen order
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !keys.contains(&entry.keyname.as_str()) {
                keys.push(&entry.keyname);
            }
        }
        keys
    }

    pub fn has_key(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.entries.iter().any(|e| e.keyname == key)
    }

    pub fn get_entries(&self, key: &str) -> Vec<&MetadataEntry> {
        let key = key.to_lowercase();
        self.entries.iter().filter(|e| e.keyname == key).collect()
    }

    /// All values of `key`, across entries, in source order
    pub fn get_values(&self, key: &str) -> Vec<&MetadataValue> {
        self.get_entries(key)
            .into_iter()
            .flat_map(|entry| entry.values.iter())
            .collect()
    }

    /// Text of the first value of `key`; with `use_timestamp`, the raw text of the
    /// first timestamp instead.
    pub fn get_first_value(&self, key: &str, use_timestamp: bool) -> Option<String> {
        let values = self.get_values(key);
        if use_timestamp {
            values
                .iter()
                .find_map(|v| v.timestamp.as_ref())
                .map(|ts| ts.raw.clone())
        } else {
            values.iter().find_map(|v| v.text.clone())
        }
    }

    pub fn get_first_timestamp(&self, key: &str) -> Option<&Timestamp> {
        self.get_values(key)
            .into_iter()
            .find_map(|v| v.timestamp.as_ref())
    }

    pub fn get_timestamps(&self, key: &str) -> Vec<&Timestamp> {
        self.get_values(key)
            .into_iter()
            .filter_map(|v| v.timestamp.as_ref())
            .collect()
    }

    /// Minimum resolved timestamp across all timestamp-bearing entries
    pub fn get_oldest_timestamp(&self) -> Option<&Timestamp> {
        self.entries.iter().filter_map(|e| e.oldest_timestamp()).min()
    }

    pub fn add_entry(&mut self, entry: MetadataEntry) {
        self.entries.push(entry);
    }

    /// Shift every entry position by `offset` (content -> buffer coordinates)
    pub(crate) fn map_positions<F>(&mut self, map: F)
    where
        F: Fn(usize) -> usize,
    {
        for entry in &mut self.entries {
            entry.source_position = map(entry.source_position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodetext::config::Settings;

    fn parse(text: &str) -> Metadata {
        Metadata::parse(text, &Settings::default().parsing)
    }

    #[test]
    fn test_key_value_entries() {
        let meta = parse("Title\nStatus::Done;\nowner::Ana");
        assert_eq!(meta.keys(), vec!["status", "owner"]);
        assert_eq!(meta.get_first_value("status", false), Some("Done".into()));
        assert_eq!(meta.get_first_value("STATUS", false), Some("Done".into()));
        assert_eq!(meta.get_first_value("owner", false), Some("Ana".into()));
    }

    #[test]
    fn test_semicolon_terminates_value() {
        let meta = parse("a::one; b::two");
        assert_eq!(meta.get_first_value("a", false), Some("one".into()));
        assert_eq!(meta.get_first_value("b", false), Some("two".into()));
    }

    #[test]
    fn test_multi_values_keep_order_and_duplicates() {
        let meta = parse("tags::red | blue | red");
        let values: Vec<_> = meta
            .get_values("tags")
            .iter()
            .filter_map(|v| v.text.clone())
            .collect();
        assert_eq!(values, vec!["red", "blue", "red"]);
    }

    #[test]
    fn test_link_value_is_node_valued() {
        let meta = parse("see::| Other Node >");
        let entry = meta.get_entries("see")[0];
        assert!(entry.is_node_valued);
        assert_eq!(entry.values[0].link.as_deref(), Some("Other Node"));
    }

    #[test]
    fn test_several_links_in_one_value() {
        let meta = parse("see::| Dune > | Emma >");
        let entry = meta.get_entries("see")[0];
        assert!(entry.is_node_valued);
        let links: Vec<_> = entry.values.iter().filter_map(|v| v.link.as_deref()).collect();
        assert_eq!(links, vec!["Dune", "Emma"]);
    }

    #[test]
    fn test_links_mixed_with_plain_values() {
        let meta = parse("refs::draft | | Dune > | final");
        let entry = meta.get_entries("refs")[0];
        assert!(!entry.is_node_valued);
        let texts: Vec<_> = entry.values.iter().filter_map(|v| v.text.as_deref()).collect();
        assert_eq!(texts, vec!["draft", "Dune", "final"]);
        assert_eq!(entry.values[1].link.as_deref(), Some("Dune"));
    }

    #[test]
    fn test_timestamp_values() {
        let meta = parse("due::<2024-05-01>;\ncreated::<2023-01-02> first draft");
        let created = meta.get_values("created")[0];
        assert_eq!(created.text.as_deref(), Some("first draft"));
        assert_eq!(
            meta.get_first_value("created", true),
            Some("2023-01-02".into())
        );
        assert_eq!(meta.get_first_value("due", false), None);
        assert_eq!(meta.get_oldest_timestamp().unwrap().raw, "2023-01-02");
    }

    #[test]
    fn test_unparsable_timestamp_is_not_oldest() {
        let meta = parse("when::<someday>\nthen::<2020-01-01>");
        assert_eq!(meta.get_oldest_timestamp().unwrap().raw, "2020-01-01");
        assert!(!meta.get_first_timestamp("when").unwrap().is_resolved());
    }

    #[test]
    fn test_tag_flags() {
        let meta = parse("*kind::task\n**project::alpha");
        let kind = meta.get_entries("kind")[0];
        assert!(kind.tag_children && !kind.tag_descendants);
        let project = meta.get_entries("project")[0];
        assert!(project.tag_descendants && !project.tag_children);
    }

    #[test]
    fn test_hash_shorthand() {
        let meta = parse("Some note #urgent and #later");
        let values: Vec<_> = meta
            .get_values("#")
            .iter()
            .filter_map(|v| v.text.clone())
            .collect();
        assert_eq!(values, vec!["urgent", "later"]);
    }

    #[test]
    fn test_hash_inside_value_is_not_shorthand() {
        let meta = parse("color::#fff");
        assert!(!meta.has_key("#"));
        assert_eq!(meta.get_first_value("color", false), Some("#fff".into()));
    }

    #[test]
    fn test_empty_value_is_skipped() {
        let meta = parse("empty::\nfull::x");
        assert!(!meta.has_key("empty"));
        assert!(meta.has_key("full"));
    }

    #[test]
    fn test_positions_are_in_source_order() {
        let meta = parse("b::2\na::1");
        let positions: Vec<_> = meta.entries().iter().map(|e| e.source_position).collect();
        assert_eq!(positions, vec![0, 5]);
    }
}
