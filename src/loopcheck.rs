//! Loop Compatibility Checker: enforces that `loop` implies `when` and that
//! `loop` and `scatter` never coexist on the same step.
//!
//! Grounded on `loop_checker`, `is_conditional_step` and
//! `is_all_output_method_loop_step` in the reference checker this crate was
//! extracted from.

use crate::error::{CheckerError, CheckerErrorKind};
use crate::model::Step;

pub fn loop_check(steps: &[Step]) -> Result<(), CheckerError> {
    let mut lines = Vec::new();
    for step in steps {
        if step.has_loop && step.when.is_none() {
            lines.push(step.source_ref.format(
                "The 'when' clause is mandatory when the 'loop' directive is defined.",
                "",
            ));
        }
        if step.has_loop && step.scatter.is_some() {
            lines.push(step.source_ref.format(
                "The 'loop' clause is not compatible with the 'scatter' directive.",
                "",
            ));
        }
    }
    if lines.is_empty() {
        Ok(())
    } else {
        Err(CheckerError::from_lines(CheckerErrorKind::LoopMisuse, lines))
    }
}
