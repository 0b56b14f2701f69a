//! Link-Merge Adapter: wraps the assignability oracle to account for
//! `linkMerge`, `valueFrom` and `pickValue` semantics, producing a
//! pass/warning/exception verdict per edge.
//!
//! Grounded on `check_types` in the reference checker this crate was
//! extracted from.

use crate::assign::{assign, flatten_merge, unwrap};
use crate::error::{CheckerError, CheckerErrorKind};
use crate::model::{LinkMerge, Type};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkMergeOutcome {
    Pass,
    Warning(String),
    Exception(String),
}

/// `check(src, sink, linkMerge, valueFrom)`.
///
/// `unknown_link_merge` carries the raw tag when the sink's declared
/// `linkMerge` value wasn't one this crate recognizes; that is a fatal
/// condition reported separately from the pass/warning/exception triad.
pub fn check(
    src: &Type,
    sink: &Type,
    link_merge: Option<LinkMerge>,
    unknown_link_merge: Option<&str>,
    value_from: bool,
) -> Result<LinkMergeOutcome, CheckerError> {
    if value_from {
        return Ok(LinkMergeOutcome::Pass);
    }

    if let Some(tag) = unknown_link_merge {
        return Err(CheckerError::new(
            CheckerErrorKind::UnknownLinkMerge,
            format!("Unsupported linkMerge value '{tag}'"),
        ));
    }

    match link_merge {
        None => {
            if assign(src, sink, true)? {
                Ok(LinkMergeOutcome::Pass)
            } else if assign(src, sink, false)? {
                Ok(LinkMergeOutcome::Warning(format!(
                    "Source of type '{}' may be incompatible with sink of type '{}'",
                    src, sink
                )))
            } else {
                Ok(LinkMergeOutcome::Exception(format!(
                    "Source of type '{}' is incompatible with sink of type '{}'",
                    src, sink
                )))
            }
        }
        Some(LinkMerge::MergeNested) => {
            let src_nested = Type::array(unwrap(src));
            let sink_unwrapped = unwrap(sink);
            check(&src_nested, &sink_unwrapped, None, None, false)
        }
        Some(LinkMerge::MergeFlattened) => {
            let src_flat = flatten_merge(&unwrap(src));
            let sink_unwrapped = unwrap(sink);
            check(&src_flat, &sink_unwrapped, None, None, false)
        }
    }
}
