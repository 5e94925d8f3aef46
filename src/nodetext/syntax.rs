//! Syntax table for the nodetext format
//!
//! All literals the lexer and parser recognize live here, together with the
//! compiled matchers built from them. This module is pure data: nothing in it
//! carries state between calls.
//!
//! | token                        | literal          |
//! |------------------------------|------------------|
//! | node opening wrapper         | `{`              |
//! | node closing wrapper         | `}`              |
//! | pointer suffix               | ` >>`            |
//! | link opening                 | `\| `            |
//! | link closing                 | ` >`             |
//! | dynamic-definition wrapper   | `[[ ... ]]`      |
//! | timestamp wrapper            | `< ... >`        |
//! | metadata assignment          | `::`             |
//! | metadata entry terminator    | `;` or newline   |
//! | compact-node leading bullet  | `•` at line start|
//! | embedded (verbatim) fence    | `%% ... %%`      |

use once_cell::sync::Lazy;
use regex::Regex;

pub const OPENING_WRAPPER: char = '{';
pub const CLOSING_WRAPPER: char = '}';
pub const ESCAPE: char = '\\';
pub const POINTER_SUFFIX: &str = " >>";
pub const LINK_OPENING: &str = "| ";
pub const LINK_CLOSING: &str = " >";
pub const DYNAMIC_DEFINITION_OPENING: &str = "[[";
pub const DYNAMIC_DEFINITION_CLOSING: &str = "]]";
pub const METADATA_ASSIGNER: &str = "::";
pub const METADATA_TERMINATOR: char = ';';
pub const METADATA_VALUE_SEPARATOR: char = '|';
pub const BULLET: char = '•';
pub const EMBEDDED_FENCE: &str = "%%";
pub const UNTITLED: &str = "(untitled)";

/// Text fenced by `%%` pairs. Nothing inside is structurally parsed.
pub static EMBEDDED_REGION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)%%.*?%%").unwrap());

/// A line-leading bullet; group 1 is the node content (rest of the line).
pub static COMPACT_NODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*•[ \t]?([^\n]*)").unwrap());

/// `| target >>` (group 1) or the bare ` >> target` form (group 2).
pub static POINTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\|[ ]([^\n|<>{}\[\]]+?)[ ]>>|[ ]>>[ ]([A-Za-z0-9_.\-]+)").unwrap()
});

/// `| target >`; also matches the pointer form, which callers handle first.
pub static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|[ ]([^\n|<>{}\[\]]+?)[ ]>>?").unwrap());

/// A whole value consisting of a single link.
pub static LINK_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\|[ ]([^\n|<>{}\[\]]+?)[ ]>>?$").unwrap());

/// `[[ ... ]]`; group 1 is the parameter string.
pub static DYNAMIC_DEFINITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[\[(.*?)\]\]").unwrap());

/// `key::value` up to `;` or end of line. Group 1 is the leading separator,
/// group 2 the tag stars, group 3 the key and group 4 the raw value.
pub static METADATA_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(^|[ \t;]|\b)(\*{0,2})([A-Za-z_][A-Za-z0-9_\-]*)::([^\n;]*)(;?)").unwrap()
});

/// `key::` immediately before an opening wrapper makes the node a metadata value.
pub static NODE_VALUED_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z_][A-Za-z0-9_\-]*)::[ \t]*$").unwrap());

/// `#word` shorthand. Group 1 is the leading separator, group 2 the value.
pub static HASH_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(^|[ \t])#([A-Za-z0-9_\-]+)").unwrap());

/// `<...>` inside a metadata value.
pub static TIMESTAMP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<([^<>\n]+)>").unwrap());

/// Replace every match of `pattern` with spaces, keeping byte offsets intact.
pub fn mask(text: &str, pattern: &Regex) -> String {
    let mut masked = String::with_capacity(text.len());
    let mut last = 0;
    for found in pattern.find_iter(text) {
        masked.push_str(&text[last..found.start()]);
        masked.push_str(&" ".repeat(found.as_str().len()));
        last = found.end();
    }
    masked.push_str(&text[last..]);
    masked
}

/// Replace links and pointers with their bare target text.
pub fn strip_links(text: &str) -> String {
    let without_pointers = POINTER.replace_all(text, |caps: &regex::Captures| {
        match (caps.get(1), caps.get(2)) {
            (Some(target), _) => target.as_str().to_string(),
            (None, Some(_)) => String::new(),
            (None, None) => String::new(),
        }
    });
    LINK.replace_all(&without_pointers, "$1").into_owned()
}

/// Remove dynamic definitions and metadata entries, and unwrap links.
///
/// This is the text an external file target receives and the text titles are
/// resolved from.
pub fn strip_markup(text: &str) -> String {
    let without_definitions = DYNAMIC_DEFINITION.replace_all(text, "");
    let without_metadata = METADATA_ENTRY.replace_all(&without_definitions, "$1");
    strip_links(&without_metadata)
}

/// Render a link to `target`.
pub fn link_to(target: &str) -> String {
    format!("{LINK_OPENING}{target}{LINK_CLOSING}")
}

/// Render a pointer to `target`.
pub fn pointer_to(target: &str) -> String {
    format!("{LINK_OPENING}{target}{POINTER_SUFFIX}")
}
