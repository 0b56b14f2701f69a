//! Core data model: the type grammar, parameters and steps that the rest of
//! the crate operates over.
//!
//! The type grammar is a closed algebraic type rather than the open tagged
//! map a document loader would hand us (see [`crate::adapter`] for the
//! boundary conversion). Parameters carry their type behind a `RefCell` since
//! the edge enumerator performs well-defined, idempotent in-place promotions
//! (conditional-step nullability widening, `loop`/`all_iterations` array
//! wrapping) that later sink checks on the same source must observe.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// A capability for anchoring diagnostic text at a node's origin.
///
/// Never inspected for content beyond formatting: the checker doesn't care
/// how a host represents source locations, only that it can stamp a message
/// with one.
pub trait SourceRef: fmt::Debug {
    fn format(&self, message: &str, field: &str) -> String;
}

/// A `SourceRef` that just prefixes messages with a plain string tag.
#[derive(Debug, Clone)]
pub struct PlainSourceRef(pub String);

impl SourceRef for PlainSourceRef {
    fn format(&self, message: &str, field: &str) -> String {
        if field.is_empty() {
            format!("{}: {}", self.0, message)
        } else {
            format!("{} ({}): {}", self.0, field, message)
        }
    }
}

/// A type expression node: the structural payload plus the one non-structural
/// marker (`not_connected`) that [`crate::assign::unwrap`] strips.
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub kind: TypeKind,
    pub not_connected: bool,
}

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            not_connected: false,
        }
    }

    pub fn not_connected(mut self) -> Self {
        self.not_connected = true;
        self
    }

    pub fn null() -> Self {
        Self::new(TypeKind::Null)
    }

    pub fn any() -> Self {
        Self::new(TypeKind::Any)
    }

    pub fn array(items: Type) -> Self {
        Self::new(TypeKind::Array(Box::new(items)))
    }

    pub fn union(branches: Vec<Type>) -> Self {
        Self::new(TypeKind::Union(branches))
    }

    pub fn is_union(&self) -> bool {
        matches!(self.kind, TypeKind::Union(_))
    }

    /// True for the structured kinds the oracle recurses into structurally
    /// (array, record, file). Enum is deliberately excluded (see
    /// `DESIGN.md`'s Open Question 2): enums fall back to tag comparison like
    /// any other scalar, matching the system this was ported from.
    pub fn is_structured(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Array(_) | TypeKind::Record(_) | TypeKind::FileT(_)
        )
    }

    /// A short textual tag used for scalar-equality fallback comparisons and
    /// diagnostics. Structured kinds compare equal only to the same
    /// structural kind (callers needing depth compare fields directly).
    pub fn tag(&self) -> String {
        match &self.kind {
            TypeKind::Null => "null".to_string(),
            TypeKind::Boolean => "boolean".to_string(),
            TypeKind::Int => "int".to_string(),
            TypeKind::Long => "long".to_string(),
            TypeKind::Float => "float".to_string(),
            TypeKind::Double => "double".to_string(),
            TypeKind::String => "string".to_string(),
            TypeKind::FileT(_) => "File".to_string(),
            TypeKind::Directory => "Directory".to_string(),
            TypeKind::Any => "Any".to_string(),
            TypeKind::Array(_) => "array".to_string(),
            TypeKind::Record(r) => format!("record:{}", r.name),
            TypeKind::Enum(e) => format!("enum:{}", e.name),
            TypeKind::Union(_) => "union".to_string(),
            TypeKind::Other(name) => format!("other:{name}"),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    String,
    FileT(FileType),
    Directory,
    Any,
    Array(Box<Type>),
    Record(RecordType),
    Enum(EnumType),
    Union(Vec<Type>),
    /// An unrecognized tag seen by the Tagged-Value Adapter. Kept distinct
    /// rather than dropped so that unknown dialects still compare as a
    /// nominal scalar instead of silently matching something they aren't.
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FileType {
    pub secondary_files: Vec<SecondaryFilePattern>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryFilePattern {
    pub pattern: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    pub name: String,
    pub fields: Vec<RecordField>,
}

impl RecordType {
    pub fn field(&self, name: &str) -> Option<&Type> {
        self.fields
            .iter()
            .find(|f| short_name(&f.name) == short_name(name))
            .map(|f| &f.ty)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub symbols: Vec<String>,
}

/// The final path segment of a (possibly `/`-qualified) name, used for
/// record-field and port-name comparisons.
pub fn short_name(name: &str) -> &str {
    name.rsplit(['/', '#']).next().unwrap_or(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMerge {
    MergeNested,
    MergeFlattened,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickValue {
    FirstNonNull,
    TheOnlyNonNull,
    AllNonNull,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceIds {
    Single(String),
    Multiple(Vec<String>),
}

impl SourceIds {
    pub fn as_slice(&self) -> Vec<&str> {
        match self {
            SourceIds::Single(id) => vec![id.as_str()],
            SourceIds::Multiple(ids) => ids.iter().map(|s| s.as_str()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SourceIds::Single(_) => 1,
            SourceIds::Multiple(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A node on either side of an edge: a workflow input, a workflow output, a
/// step input, or a step output.
#[derive(Debug)]
pub struct Parameter {
    pub id: String,
    ty: RefCell<Type>,
    pub source: Option<SourceIds>,
    pub link_merge: Option<LinkMerge>,
    /// Raw `linkMerge` tag that the adapter didn't recognize, if any.
    pub unknown_link_merge: Option<String>,
    pub pick_value: Option<PickValue>,
    pub value_from: Option<String>,
    pub has_default: bool,
    pub used_by_step: bool,
    array_promoted: Cell<bool>,
    null_promoted: Cell<bool>,
    pub source_ref: Rc<dyn SourceRef>,
}

impl Parameter {
    pub fn new(id: impl Into<String>, ty: Type, source_ref: Rc<dyn SourceRef>) -> Self {
        Self {
            id: id.into(),
            ty: RefCell::new(ty),
            source: None,
            link_merge: None,
            unknown_link_merge: None,
            pick_value: None,
            value_from: None,
            has_default: false,
            used_by_step: false,
            array_promoted: Cell::new(false),
            null_promoted: Cell::new(false),
            source_ref,
        }
    }

    pub fn with_source(mut self, source: SourceIds) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_link_merge(mut self, lm: LinkMerge) -> Self {
        self.link_merge = Some(lm);
        self
    }

    pub fn with_unknown_link_merge(mut self, tag: impl Into<String>) -> Self {
        self.unknown_link_merge = Some(tag.into());
        self
    }

    pub fn with_pick_value(mut self, pv: PickValue) -> Self {
        self.pick_value = Some(pv);
        self
    }

    pub fn with_value_from(mut self, expr: impl Into<String>) -> Self {
        self.value_from = Some(expr.into());
        self
    }

    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    pub fn with_used_by_step(mut self, used: bool) -> Self {
        self.used_by_step = used;
        self
    }

    pub fn ty(&self) -> Type {
        self.ty.borrow().clone()
    }

    pub fn set_ty(&self, ty: Type) {
        *self.ty.borrow_mut() = ty;
    }

    /// Widen the parameter's type to include `null` when it doesn't already.
    /// Idempotent: a second call is a no-op and returns `false`.
    pub fn promote_conditional_null(&self) -> bool {
        if self.null_promoted.get() {
            return false;
        }
        let current = self.ty();
        let already_nullable = matches!(&current.kind, TypeKind::Null)
            || matches!(&current.kind, TypeKind::Union(branches) if branches.iter().any(|b| matches!(b.kind, TypeKind::Null)));
        self.null_promoted.set(true);
        if already_nullable {
            return false;
        }
        let widened = match current.kind {
            TypeKind::Union(mut branches) => {
                branches.insert(0, Type::null());
                Type::union(branches)
            }
            _ => Type::union(vec![Type::null(), current]),
        };
        self.set_ty(widened);
        true
    }

    /// Wrap the parameter's type in `array(...)`. Guarded by a flag so that
    /// repeated invocation of the checker against the same inputs stays
    /// idempotent: the ported algorithm this is grounded on re-wraps
    /// unconditionally, which this crate deliberately does not replicate
    /// (see `DESIGN.md`, Open Question 3).
    pub fn promote_loop_array(&self) -> bool {
        if self.array_promoted.get() {
            return false;
        }
        self.array_promoted.set(true);
        let current = self.ty();
        self.set_ty(Type::array(current));
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMethod {
    LastIteration,
    AllIterations,
}

#[derive(Debug, Clone)]
pub struct StepInputSummary {
    pub name: String,
    pub not_connected: bool,
}

/// A step (node) in the workflow graph.
#[derive(Debug)]
pub struct Step {
    pub id: String,
    pub when: Option<String>,
    pub has_loop: bool,
    pub output_method: Option<OutputMethod>,
    pub scatter: Option<Vec<String>>,
    pub inputs: Vec<StepInputSummary>,
    pub run: String,
    pub source_ref: Rc<dyn SourceRef>,
}

impl Step {
    pub fn is_conditional(&self) -> bool {
        self.when.is_some()
    }
}
