// src/lib.rs
//
// =============================================================================
// WFCHECK: LIBRARY ROOT
// =============================================================================
//
// This file declares the module tree and exports public types.

// 1. Declare Modules
pub mod adapter;
pub mod assign;
pub mod cycles;
pub mod diagnostics;
pub mod edges;
pub mod error;
pub mod linkmerge;
pub mod loopcheck;
pub mod model;

// 2. Re-exports (The Public API)
// These allow `use wfcheck::Type` or `use wfcheck::static_check` to work
// without reaching into individual modules.

pub use cycles::cycle_check;
pub use edges::static_check;
pub use error::{CheckerError, CheckerErrorKind};
pub use loopcheck::loop_check;
pub use model::{
    EnumType, FileType, LinkMerge, OutputMethod, Parameter, PickValue, PlainSourceRef, RecordField,
    RecordType, SecondaryFilePattern, SourceIds, SourceRef, Step, StepInputSummary, Type, TypeKind,
};
