//! Crate error type.
//!
//! Kind plus ordered context lines, rendered as a bulleted block, rather
//! than pulled in from a derive macro: every failure this checker raises
//! needs to carry actionable remediation text, and a hand-written type keeps
//! that text under our control.

use std::fmt;

#[derive(Debug)]
pub struct CheckerError {
    pub kind: CheckerErrorKind,
    pub context: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckerErrorKind {
    TypeMismatch,
    MissingSource,
    UnknownLinkMerge,
    Cycle,
    LoopMisuse,
    RecursionLimit,
}

impl CheckerError {
    pub fn new(kind: CheckerErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            context: vec![msg.into()],
        }
    }

    pub fn from_lines(kind: CheckerErrorKind, lines: Vec<String>) -> Self {
        Self {
            kind,
            context: lines,
        }
    }

    pub fn push_context(mut self, msg: impl Into<String>) -> Self {
        self.context.push(msg.into());
        self
    }
}

impl fmt::Display for CheckerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:?}", self.kind)?;
        for (i, line) in self.context.iter().enumerate() {
            if i == 0 {
                writeln!(f, "- {line}")?;
            } else {
                writeln!(f, "  {line}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for CheckerError {}
