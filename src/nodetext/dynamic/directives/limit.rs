//! LIMIT

use crate::nodetext::dynamic::directive::{phase, Accumulator, CompileContext, DirectiveOp, Outcome};
use crate::nodetext::error::DirectiveError;

/// Keeps the first N selected nodes
#[derive(Debug, Clone, Default)]
pub struct Limit {
    count: usize,
}

impl Limit {
    pub fn boxed() -> Box<dyn DirectiveOp> {
        Box::<Limit>::default()
    }
}

impl DirectiveOp for Limit {
    fn name(&self) -> &'static str {
        "LIMIT"
    }

    fn phase(&self) -> u32 {
        phase::LIMIT
    }

    fn parse_argument_string(&mut self, argument: &str) -> Result<(), DirectiveError> {
        self.count = argument
            .trim()
            .parse()
            .map_err(|_| DirectiveError::InvalidArgument {
                directive: "LIMIT".to_string(),
                message: format!("expected a count, got '{}'", argument.trim()),
            })?;
        Ok(())
    }

    fn dynamic_output(&self, accumulator: &Accumulator, _context: &CompileContext) -> Outcome {
        if accumulator.nodes.len() <= self.count {
            return Outcome::Unchanged;
        }
        let mut next = accumulator.clone();
        next.nodes.truncate(self.count);
        Outcome::Replace(next)
    }
}
