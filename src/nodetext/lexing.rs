//! Lexer
//!
//! Scans a buffer's text once and returns an ordered map of byte offset to
//! [`Symbol`]. Four marker classes are recognized: opening wrappers, closing
//! wrappers, pointers and compact nodes. A synthetic `EndOfBuffer` symbol is
//! always emitted at `text.len()` so the parser has a terminating event.
//!
//! Embedded regions (`%% ... %%`) are computed first; any marker starting inside
//! one is discarded. Markers inside a compact-node line are discarded from the
//! outer stream too: the parser re-lexes the compact line on its own. A `}` on a
//! compact line that closes an enclosing node ends the line's content and stays
//! in the outer stream.

pub mod tokens;

use crate::nodetext::syntax;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Range;
use tokens::{tokenize_with_spans, WrapperToken};

/// The kind of a lexed marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SymbolKind {
    OpeningWrapper,
    ClosingWrapper,
    /// Non-owning reference to another node
    Pointer(String),
    /// A bullet line; `content` is the byte range after the bullet up to the line end
    CompactNode { content: Range<usize> },
    EndOfBuffer,
}

/// A marker and the byte span it occupies
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub span: Range<usize>,
}

impl Symbol {
    pub fn new(kind: SymbolKind, span: Range<usize>) -> Self {
        Symbol { kind, span }
    }

    pub fn offset(&self) -> usize {
        self.span.start
    }

    /// The same symbol moved `base` bytes to the right
    pub(crate) fn shifted(&self, base: usize) -> Self {
        let kind = match &self.kind {
            SymbolKind::CompactNode { content } => SymbolKind::CompactNode {
                content: content.start + base..content.end + base,
            },
            other => other.clone(),
        };
        Symbol::new(kind, self.span.start + base..self.span.end + base)
    }
}

/// Ordered map of byte offset to symbol
pub type SymbolMap = BTreeMap<usize, Symbol>;

/// Lex `text` into its ordered symbol map.
pub fn lex(text: &str) -> SymbolMap {
    let embedded: Vec<Range<usize>> = syntax::EMBEDDED_REGION
        .find_iter(text)
        .map(|m| m.range())
        .collect();
    let in_embedded = |offset: usize| embedded.iter().any(|r| r.contains(&offset));

    let mut symbols = SymbolMap::new();

    let mut compact_lines: Vec<Range<usize>> = Vec::new();
    for caps in syntax::COMPACT_NODE.captures_iter(text) {
        let (Some(line), Some(content)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if in_embedded(line.start()) {
            continue;
        }
        let end = compact_end(text, content.range(), &in_embedded);
        compact_lines.push(line.start()..end);
        symbols.insert(
            line.start(),
            Symbol::new(
                SymbolKind::CompactNode {
                    content: content.start()..end,
                },
                line.start()..end,
            ),
        );
    }
    let excluded = |offset: usize| {
        in_embedded(offset) || compact_lines.iter().any(|r| r.contains(&offset))
    };

    for (token, span) in tokenize_with_spans(text) {
        let kind = match token {
            WrapperToken::Opening => SymbolKind::OpeningWrapper,
            WrapperToken::Closing => SymbolKind::ClosingWrapper,
            WrapperToken::Escaped => continue,
        };
        if excluded(span.start) {
            continue;
        }
        symbols.insert(span.start, Symbol::new(kind, span));
    }

    for caps in syntax::POINTER.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if excluded(whole.start()) {
            continue;
        }
        let Some(target) = caps.get(1).or_else(|| caps.get(2)) else {
            continue;
        };
        symbols.insert(
            whole.start(),
            Symbol::new(
                SymbolKind::Pointer(target.as_str().trim().to_string()),
                whole.range(),
            ),
        );
    }

    symbols.insert(
        text.len(),
        Symbol::new(SymbolKind::EndOfBuffer, text.len()..text.len()),
    );

    symbols
}

/// Where a compact line's content ends: at the first `}` closing a wrapper
/// opened before the line, otherwise at the line end.
fn compact_end(text: &str, content: Range<usize>, in_embedded: &dyn Fn(usize) -> bool) -> usize {
    let mut depth = 0usize;
    for (token, span) in tokenize_with_spans(&text[content.clone()]) {
        let offset = content.start + span.start;
        if in_embedded(offset) {
            continue;
        }
        match token {
            WrapperToken::Opening => depth += 1,
            WrapperToken::Closing if depth == 0 => return offset,
            WrapperToken::Closing => depth -= 1,
            WrapperToken::Escaped => {}
        }
    }
    content.end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<(usize, SymbolKind)> {
        lex(text)
            .into_iter()
            .map(|(offset, symbol)| (offset, symbol.kind))
            .collect()
    }

    #[test]
    fn test_wrappers_and_end_of_buffer() {
        assert_eq!(
            kinds("{ a }"),
            vec![
                (0, SymbolKind::OpeningWrapper),
                (4, SymbolKind::ClosingWrapper),
                (5, SymbolKind::EndOfBuffer),
            ]
        );
    }

    #[test]
    fn test_empty_text_has_end_of_buffer() {
        assert_eq!(kinds(""), vec![(0, SymbolKind::EndOfBuffer)]);
    }

    #[test]
    fn test_embedded_region_is_skipped() {
        assert_eq!(
            kinds("%%\n{ not parsed }\n%%{}"),
            vec![
                (20, SymbolKind::OpeningWrapper),
                (21, SymbolKind::ClosingWrapper),
                (22, SymbolKind::EndOfBuffer),
            ]
        );
    }

    #[test]
    fn test_escaped_wrapper_is_skipped() {
        assert_eq!(kinds(r"\{"), vec![(2, SymbolKind::EndOfBuffer)]);
    }

    #[test]
    fn test_pointer_forms() {
        let symbols = kinds("{ a | Target Node >> and >> id_2 }");
        assert_eq!(symbols[1], (4, SymbolKind::Pointer("Target Node".into())));
        assert_eq!(symbols[2], (24, SymbolKind::Pointer("id_2".into())));
    }

    #[test]
    fn test_plain_link_is_not_a_pointer() {
        let symbols = kinds("see | Target >");
        assert_eq!(symbols, vec![(14, SymbolKind::EndOfBuffer)]);
    }

    #[test]
    fn test_compact_node_hides_inner_markers() {
        let text = "root\n• item { x }\nafter";
        let symbols = lex(text);
        let compact = &symbols[&5];
        assert_eq!(compact.kind, SymbolKind::CompactNode { content: 9..19 });
        assert_eq!(&text[9..19], "item { x }");
        assert_eq!(symbols.len(), 2);
    }

    #[test]
    fn test_shifted_symbol() {
        let symbol = Symbol::new(SymbolKind::CompactNode { content: 2..4 }, 0..4);
        let shifted = symbol.shifted(10);
        assert_eq!(shifted.span, 10..14);
        assert_eq!(shifted.kind, SymbolKind::CompactNode { content: 12..14 });
    }

    #[test]
    fn test_compact_line_leaves_enclosing_closer_outside() {
        let text = "{ title\n• item {x} }";
        let symbols = kinds(text);
        assert_eq!(
            symbols,
            vec![
                (0, SymbolKind::OpeningWrapper),
                (8, SymbolKind::CompactNode { content: 12..21 }),
                (21, SymbolKind::ClosingWrapper),
                (22, SymbolKind::EndOfBuffer),
            ]
        );
        assert_eq!(&text[12..21], "item {x} ");
    }
}
