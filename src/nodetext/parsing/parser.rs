//! Wrapper state machine
//!
//! Walks the symbol map once, keeping per-depth bookkeeping:
//!
//! - `ranges`: depth -> own-content ranges collected so far for the open node
//! - `pointers`: depth -> pointer targets seen while that depth was innermost
//! - `child_group`: depth -> nodes closed at that depth, waiting for their parent
//!
//! A node closing at depth `d` takes `child_group[d + 1]` as its children and is
//! itself appended to `child_group[d]`. Compact nodes are scanned by a recursive
//! call over the re-lexed bullet line, whose end-of-stream builds a non-root node.
//!
//! Imbalances are not fixed here. They are recorded on the [`HealPlan`] and the
//! caller discards the resulting tree.

use super::healing::HealPlan;
use crate::nodetext::lexing::{lex, Symbol, SymbolKind, SymbolMap};
use crate::nodetext::syntax;
use std::collections::HashMap;
use std::ops::Range;

/// A node before metadata and identity are resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNode {
    pub ranges: Vec<Range<usize>>,
    pub wrapper_span: Range<usize>,
    pub depth: usize,
    pub is_root: bool,
    pub is_compact: bool,
    /// Arena indices
    pub children: Vec<usize>,
    pub pointers: Vec<String>,
}

/// Arena of raw nodes; `root` is `None` when the scan hit an imbalance
#[derive(Debug, Default)]
pub struct RawTree {
    pub nodes: Vec<RawNode>,
    pub root: Option<usize>,
}

/// Scan `symbols` (lexed from `text`) into a raw node arena.
pub fn parse(text: &str, symbols: &SymbolMap, plan: &mut HealPlan) -> RawTree {
    let mut scanner = Scanner {
        text,
        nodes: Vec::new(),
        plan,
    };
    let root = scanner.scan(symbols.values().cloned().collect(), 0, 0, false);
    RawTree {
        nodes: scanner.nodes,
        root,
    }
}

struct Scanner<'t, 'p> {
    text: &'t str,
    nodes: Vec<RawNode>,
    plan: &'p mut HealPlan,
}

#[derive(Default)]
struct Levels {
    nested: usize,
    ranges: HashMap<usize, Vec<Range<usize>>>,
    openers: HashMap<usize, usize>,
    pointers: HashMap<usize, Vec<String>>,
    child_group: HashMap<usize, Vec<usize>>,
}

impl Levels {
    fn close_range(&mut self, start: usize, end: usize) {
        self.ranges.entry(self.nested).or_default().push(start..end);
    }

    fn take_ranges(&mut self, depth: usize) -> Vec<Range<usize>> {
        self.ranges.remove(&depth).unwrap_or_default()
    }

    fn take_pointers(&mut self, depth: usize) -> Vec<String> {
        self.pointers.remove(&depth).unwrap_or_default()
    }

    fn take_children(&mut self, depth: usize) -> Vec<usize> {
        self.child_group.remove(&depth).unwrap_or_default()
    }
}

impl Scanner<'_, '_> {
    fn push(&mut self, node: RawNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Scan one stream starting at byte `start`. Returns the arena index of the node
    /// built at end-of-stream, or `None` when wrappers were left open.
    fn scan(
        &mut self,
        symbols: Vec<Symbol>,
        start: usize,
        base_depth: usize,
        compact: bool,
    ) -> Option<usize> {
        let mut state = Levels::default();
        let mut last = start;
        let mut last_compact_end = None;

        for symbol in symbols {
            let p = symbol.offset();
            match symbol.kind {
                SymbolKind::OpeningWrapper => {
                    state.close_range(last, p);
                    state.nested += 1;
                    state.openers.insert(state.nested, p);
                    last = p + 1;
                }
                SymbolKind::ClosingWrapper => {
                    if state.nested == 0 {
                        self.plan.delete_stray(p);
                        continue;
                    }
                    state.close_range(last, p);
                    let depth = state.nested;
                    let opened_at = state.openers.remove(&depth).unwrap_or(p);
                    let node = RawNode {
                        ranges: state.take_ranges(depth),
                        wrapper_span: opened_at..p + 1,
                        depth: base_depth + depth,
                        is_root: false,
                        is_compact: false,
                        children: state.take_children(depth + 1),
                        pointers: state.take_pointers(depth),
                    };
                    let index = self.push(node);
                    state.child_group.entry(depth).or_default().push(index);
                    state.nested -= 1;
                    last = p + 1;
                }
                SymbolKind::Pointer(target) => {
                    state.pointers.entry(state.nested).or_default().push(target);
                }
                SymbolKind::CompactNode { content } => {
                    state.close_range(last, p);
                    let line: Vec<Symbol> = lex(&self.text[content.clone()])
                        .values()
                        .map(|s| s.shifted(content.start))
                        .collect();
                    let depth = base_depth + state.nested + 1;
                    if let Some(index) = self.scan(line, content.start, depth, true) {
                        self.nodes[index].wrapper_span = symbol.span.clone();
                        state
                            .child_group
                            .entry(state.nested + 1)
                            .or_default()
                            .push(index);
                    }
                    last = symbol.span.end;
                    last_compact_end = Some(symbol.span.end);
                }
                SymbolKind::EndOfBuffer => {
                    if state.nested > 0 {
                        let on_new_line = !compact && last_compact_end == Some(p);
                        let after_escape = self.text[..p].ends_with(syntax::ESCAPE);
                        self.plan
                            .close_unclosed(p, state.nested, on_new_line, after_escape);
                        return None;
                    }
                    state.close_range(last, p);
                    let node = RawNode {
                        ranges: state.take_ranges(0),
                        wrapper_span: start..p,
                        depth: base_depth,
                        is_root: !compact,
                        is_compact: compact,
                        children: state.take_children(1),
                        pointers: state.take_pointers(0),
                    };
                    return Some(self.push(node));
                }
            }
        }
        None
    }
}
