//! Text-producing directives: FORMAT, COUNT and TITLE
//!
//! Show templates substitute placeholders per node:
//!
//! | placeholder   | value                                        |
//! |---------------|----------------------------------------------|
//! | `$title`      | title                                        |
//! | `$id`         | id                                           |
//! | `$link`       | `\| id >`                                    |
//! | `$pointer`    | `\| id >>`                                   |
//! | `$contents`   | own content with markup stripped             |
//! | `$date`       | oldest timestamp, as `<...>`                 |
//! | `$meta:key`   | every value of `key`, comma separated        |
//! | `$key`        | first value of `key`                         |

use crate::nodetext::dynamic::definition::unescape;
use crate::nodetext::dynamic::directive::{phase, Accumulator, CompileContext, DirectiveOp, Outcome};
use crate::nodetext::error::DirectiveError;
use crate::nodetext::metadata::MetadataValue;
use crate::nodetext::node::Node;
use crate::nodetext::syntax;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(meta:[A-Za-z0-9_#\-]+|[A-Za-z_][A-Za-z0-9_]*)").unwrap());

fn value_text(value: &MetadataValue) -> String {
    match (&value.text, &value.timestamp) {
        (Some(text), Some(ts)) => format!("{ts} {text}"),
        (Some(text), None) => text.clone(),
        (None, Some(ts)) => ts.to_string(),
        (None, None) => String::new(),
    }
}

/// Substitute every placeholder of `template` for `node`.
pub fn render(template: &str, node: &Node) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            match name {
                "title" => node.title.clone(),
                "id" => node.id.clone(),
                "link" => node.link(),
                "pointer" => syntax::pointer_to(&node.id),
                "contents" => node.plain_contents(),
                "date" => node
                    .metadata
                    .get_oldest_timestamp()
                    .map(|ts| ts.to_string())
                    .unwrap_or_default(),
                _ => match name.strip_prefix("meta:") {
                    Some(key) => node
                        .metadata
                        .get_values(key)
                        .into_iter()
                        .map(value_text)
                        .collect::<Vec<_>>()
                        .join(", "),
                    None => node
                        .metadata
                        .get_values(name)
                        .first()
                        .map(|value| value_text(value))
                        .unwrap_or_default(),
                },
            }
        })
        .into_owned()
}

fn append(accumulator: &Accumulator, text: &str) -> Outcome {
    let mut next = accumulator.clone();
    next.text.get_or_insert_with(String::new).push_str(text);
    Outcome::Replace(next)
}

/// Renders the selected nodes through a show template
///
/// The template comes from the directive's own argument, else the definition's
/// `SHOW`, else the configured default.
#[derive(Debug, Clone, Default)]
pub struct Format {
    template: Option<String>,
}

impl Format {
    pub fn boxed() -> Box<dyn DirectiveOp> {
        Box::<Format>::default()
    }
}

impl DirectiveOp for Format {
    fn name(&self) -> &'static str {
        "FORMAT"
    }

    fn phase(&self) -> u32 {
        phase::TEXT
    }

    fn parse_argument_string(&mut self, argument: &str) -> Result<(), DirectiveError> {
        self.template = (!argument.trim().is_empty()).then(|| unescape(argument));
        Ok(())
    }

    fn dynamic_output(&self, accumulator: &Accumulator, context: &CompileContext) -> Outcome {
        let template = self
            .template
            .as_deref()
            .or(context.definition.show_template.as_deref())
            .unwrap_or(&context.settings.compile.default_show);

        let rendered: String = accumulator
            .nodes
            .iter()
            .filter_map(|id| context.nodes.get_node(id))
            .map(|node| render(template, node))
            .collect();
        append(accumulator, &rendered)
    }

    fn produces_text(&self) -> bool {
        true
    }
}

/// Renders the number of selected nodes
#[derive(Debug, Clone, Default)]
pub struct Count;

impl Count {
    pub fn boxed() -> Box<dyn DirectiveOp> {
        Box::new(Count)
    }
}

impl DirectiveOp for Count {
    fn name(&self) -> &'static str {
        "COUNT"
    }

    fn phase(&self) -> u32 {
        phase::TEXT
    }

    fn parse_argument_string(&mut self, _argument: &str) -> Result<(), DirectiveError> {
        Ok(())
    }

    fn dynamic_output(&self, accumulator: &Accumulator, _context: &CompileContext) -> Outcome {
        append(accumulator, &format!("{}\n", accumulator.nodes.len()))
    }

    fn produces_text(&self) -> bool {
        true
    }
}

/// Prefixes the output with a title line; without an argument the definition's
/// own node title is used.
#[derive(Debug, Clone, Default)]
pub struct Title {
    title: Option<String>,
}

impl Title {
    pub fn boxed() -> Box<dyn DirectiveOp> {
        Box::<Title>::default()
    }
}

impl DirectiveOp for Title {
    fn name(&self) -> &'static str {
        "TITLE"
    }

    fn phase(&self) -> u32 {
        phase::WRAP
    }

    fn parse_argument_string(&mut self, argument: &str) -> Result<(), DirectiveError> {
        let title = argument.trim();
        self.title = (!title.is_empty()).then(|| title.to_string());
        Ok(())
    }

    fn dynamic_output(&self, accumulator: &Accumulator, context: &CompileContext) -> Outcome {
        let title = match &self.title {
            Some(title) => title.clone(),
            None => match context.source_node() {
                Some(source) => source.title.clone(),
                None => return Outcome::Unchanged,
            },
        };
        let mut next = accumulator.clone();
        let body = next.text.take().unwrap_or_default();
        next.text = Some(format!("{title}\n{body}"));
        Outcome::Replace(next)
    }
}
