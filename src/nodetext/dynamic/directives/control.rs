//! FREEZE

use crate::nodetext::dynamic::directive::{phase, Accumulator, CompileContext, DirectiveOp, Outcome};
use crate::nodetext::error::DirectiveError;

/// Stops the pipeline before anything is selected, so the target is left as is
#[derive(Debug, Clone, Default)]
pub struct Freeze;

impl Freeze {
    pub fn boxed() -> Box<dyn DirectiveOp> {
        Box::new(Freeze)
    }
}

impl DirectiveOp for Freeze {
    fn name(&self) -> &'static str {
        "FREEZE"
    }

    fn phase(&self) -> u32 {
        phase::CONTROL
    }

    fn parse_argument_string(&mut self, _argument: &str) -> Result<(), DirectiveError> {
        Ok(())
    }

    fn dynamic_output(&self, _accumulator: &Accumulator, _context: &CompileContext) -> Outcome {
        Outcome::Halt
    }
}
