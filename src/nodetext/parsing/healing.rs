//! Healing plans and the retry counter that bounds them

use crate::nodetext::error::ParseError;
use crate::nodetext::syntax;

/// Text edits that rebalance one scan's wrappers
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HealPlan {
    stray_closers: Vec<usize>,
    insertions: Vec<(usize, String)>,
    unclosed: usize,
}

enum Edit<'a> {
    Delete,
    Insert(&'a str),
}

impl HealPlan {
    /// Record a closing wrapper at `offset` that has no opener.
    pub fn delete_stray(&mut self, offset: usize) {
        self.stray_closers.push(offset);
    }

    /// Record `count` openers still open when the stream ended at `offset`.
    pub fn close_unclosed(
        &mut self,
        offset: usize,
        count: usize,
        on_new_line: bool,
        after_escape: bool,
    ) {
        let mut insert = String::new();
        if on_new_line {
            insert.push('\n');
        } else if after_escape {
            insert.push(' ');
        }
        for _ in 0..count {
            insert.push(syntax::CLOSING_WRAPPER);
        }
        self.insertions.push((offset, insert));
        self.unclosed += count;
    }

    pub fn is_empty(&self) -> bool {
        self.stray_closers.is_empty() && self.insertions.is_empty()
    }

    pub fn has_stray(&self) -> bool {
        !self.stray_closers.is_empty()
    }

    pub fn has_unclosed(&self) -> bool {
        !self.insertions.is_empty()
    }

    /// Apply every edit, last offset first so earlier offsets stay valid.
    pub fn apply(&self, text: &str) -> String {
        let mut edits: Vec<(usize, Edit)> = self
            .stray_closers
            .iter()
            .map(|&offset| (offset, Edit::Delete))
            .chain(
                self.insertions
                    .iter()
                    .map(|(offset, insert)| (*offset, Edit::Insert(insert.as_str()))),
            )
            .collect();
        edits.sort_by(|a, b| b.0.cmp(&a.0));

        let mut healed = text.to_string();
        for (offset, edit) in edits {
            match edit {
                Edit::Delete => healed.replace_range(offset..offset + 1, ""),
                Edit::Insert(insert) => healed.insert_str(offset, insert),
            }
        }
        healed
    }

    pub fn describe(&self) -> String {
        format!(
            "{} stray closing wrapper(s), {} unclosed opening wrapper(s)",
            self.stray_closers.len(),
            self.unclosed
        )
    }
}

/// Allows one heal per imbalance class and at most `max_passes` heal passes.
#[derive(Debug, Clone)]
pub struct HealingAttempts {
    max_passes: usize,
    passes: usize,
    stray_healed: bool,
    unclosed_healed: bool,
}

impl HealingAttempts {
    pub fn new(max_passes: usize) -> Self {
        HealingAttempts {
            max_passes,
            passes: 0,
            stray_healed: false,
            unclosed_healed: false,
        }
    }

    /// Account for applying `plan`; fails when the budget is spent.
    pub fn record(&mut self, plan: &HealPlan) -> Result<(), ParseError> {
        let repeated = (plan.has_stray() && self.stray_healed)
            || (plan.has_unclosed() && self.unclosed_healed);
        if self.passes >= self.max_passes || repeated {
            return Err(ParseError::HealingExhausted {
                attempts: self.passes,
                detail: plan.describe(),
            });
        }
        self.passes += 1;
        self.stray_healed |= plan.has_stray();
        self.unclosed_healed |= plan.has_unclosed();
        Ok(())
    }

    pub fn passes(&self) -> usize {
        self.passes
    }
}
