//! Buffer parser
//!
//! Turns one file's text into a [`Buffer`]: the lexer produces the symbol map,
//! the [`parser`] state machine builds a raw node arena from it, and
//! [`buffer`] resolves metadata, identity and tree links.
//!
//! Healing
//!
//! A scan that finds unbalanced wrappers produces no tree. Instead it returns a
//! [`healing::HealPlan`]: every stray closing wrapper is deleted and every unclosed
//! opening wrapper is closed at the end of its stream. The plan is applied to the
//! text in one go and the whole lex + parse restarts on the healed text. The loop is
//! bounded by [`healing::HealingAttempts`]; running out yields
//! [`ParseError::HealingExhausted`] and a buffer with `has_errors` set and no root.

pub mod buffer;
pub mod healing;
pub mod parser;

pub use buffer::Buffer;

use crate::nodetext::config::Settings;
use crate::nodetext::dynamic::DirectiveRegistry;
use crate::nodetext::error::ParseError;
use crate::nodetext::lexing::lex;
use healing::{HealPlan, HealingAttempts};
use std::path::Path;
use tracing::{debug, warn};

/// Everything a parse needs besides the text
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub settings: &'a Settings,
    pub registry: &'a DirectiveRegistry,
}

impl<'a> ParseContext<'a> {
    pub fn new(settings: &'a Settings, registry: &'a DirectiveRegistry) -> Self {
        ParseContext { settings, registry }
    }
}

/// Parse `text` as the contents of `filename`.
///
/// Never fails: structural problems that healing cannot fix are reported on the
/// returned buffer (`has_errors`, `errors`) and the original text is kept.
pub fn parse_buffer(filename: &Path, text: &str, context: &ParseContext) -> Buffer {
    let mut current = text.to_string();
    let mut attempts = HealingAttempts::new(context.settings.parsing.max_healing_attempts);

    loop {
        let symbols = lex(&current);
        let mut plan = HealPlan::default();
        let tree = parser::parse(&current, &symbols, &mut plan);

        if plan.is_empty() {
            if let Some(root) = tree.root {
                let healed = current != text;
                return Buffer::build(filename, current, tree.nodes, root, healed, context);
            }
        }

        debug!(
            file = %filename.display(),
            plan = %plan.describe(),
            "healing unbalanced wrappers"
        );
        if let Err(err) = attempts.record(&plan) {
            warn!(file = %filename.display(), error = %err, "buffer left unparsed");
            return Buffer::unparsed(filename, text, err);
        }
        current = plan.apply(&current);
    }
}

/// Parse with built-in settings and directives.
pub fn parse_with_defaults(filename: &Path, text: &str) -> Buffer {
    let settings = Settings::default();
    let registry = DirectiveRegistry::with_defaults();
    parse_buffer(filename, text, &ParseContext::new(&settings, &registry))
}
