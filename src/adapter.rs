//! Tagged-value adapter: converts the open-ended tagged representation a
//! document loader hands the checker (plain scalar strings, `{"kind":
//! "array", "items": ...}` maps, and so on) into the closed [`Type`] algebra.
//!
//! Modeled on the total-mapping-with-fallback idiom this crate's lineage
//! uses for tag dispatch: every tag this adapter doesn't recognize becomes
//! `Other(name)` rather than being dropped or panicking.

use serde_json::Value;

use crate::model::{EnumType, FileType, RecordField, RecordType, SecondaryFilePattern, Type, TypeKind};

impl Type {
    /// Convert a loader-provided tagged value into the closed type algebra.
    ///
    /// Nested unions are flattened one level here, at the adapter boundary,
    /// so that the oracle's recursion depth tracks type nesting rather than
    /// how a particular document happened to declare its union.
    pub fn from_value(value: &Value) -> Type {
        let parsed = parse_kind(value);
        flatten_one_level(parsed)
    }
}

fn flatten_one_level(ty: Type) -> Type {
    match ty.kind {
        TypeKind::Union(branches) => {
            let mut flat = Vec::with_capacity(branches.len());
            for b in branches {
                match b.kind {
                    TypeKind::Union(inner) => flat.extend(inner),
                    other => flat.push(Type {
                        kind: other,
                        not_connected: b.not_connected,
                    }),
                }
            }
            Type {
                kind: TypeKind::Union(flat),
                not_connected: ty.not_connected,
            }
        }
        _ => ty,
    }
}

fn parse_kind(value: &Value) -> Type {
    match value {
        Value::Null => Type::null(),
        Value::Array(branches) => Type::union(branches.iter().map(parse_kind).collect()),
        Value::String(tag) => scalar_from_tag(tag),
        Value::Object(map) => {
            let not_connected = map
                .get("not_connected")
                .and_then(Value::as_bool)
                .unwrap_or(false);

            let kind_tag = map
                .get("kind")
                .or_else(|| map.get("type"))
                .and_then(Value::as_str)
                .unwrap_or("");

            let kind = match kind_tag {
                "array" => {
                    let items = map
                        .get("items")
                        .map(parse_kind)
                        .unwrap_or_else(Type::any);
                    TypeKind::Array(Box::new(items))
                }
                "record" => {
                    let name = map
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string();
                    let fields = map
                        .get("fields")
                        .and_then(Value::as_array)
                        .map(|fs| {
                            fs.iter()
                                .filter_map(|f| {
                                    let f = f.as_object()?;
                                    let fname = f.get("name")?.as_str()?.to_string();
                                    let fty = f.get("type").map(parse_kind).unwrap_or_else(Type::any);
                                    Some(RecordField { name: fname, ty: fty })
                                })
                                .collect()
                        })
                        .unwrap_or_default();
                    TypeKind::Record(RecordType { name, fields })
                }
                "enum" => {
                    let name = map
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string();
                    let symbols = map
                        .get("symbols")
                        .and_then(Value::as_array)
                        .map(|ss| {
                            ss.iter()
                                .filter_map(|s| s.as_str().map(str::to_string))
                                .collect()
                        })
                        .unwrap_or_default();
                    TypeKind::Enum(EnumType { name, symbols })
                }
                "File" => {
                    let secondary_files = map
                        .get("secondaryFiles")
                        .and_then(Value::as_array)
                        .map(|ss| ss.iter().map(parse_secondary_pattern).collect())
                        .unwrap_or_default();
                    TypeKind::FileT(FileType { secondary_files })
                }
                "Directory" => TypeKind::Directory,
                "Any" => TypeKind::Any,
                "" => {
                    return scalar_from_tag("");
                }
                other => TypeKind::Other(other.to_string()),
            };

            Type { kind, not_connected }
        }
        Value::Bool(_) | Value::Number(_) => Type::new(TypeKind::Other(value.to_string())),
    }
}

fn parse_secondary_pattern(value: &Value) -> SecondaryFilePattern {
    match value {
        Value::String(pattern) => SecondaryFilePattern {
            pattern: pattern.clone(),
            required: true,
        },
        Value::Object(map) => {
            let pattern = map
                .get("pattern")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            let required = map.get("required").and_then(Value::as_bool).unwrap_or(true);
            SecondaryFilePattern { pattern, required }
        }
        _ => SecondaryFilePattern {
            pattern: String::new(),
            required: true,
        },
    }
}

fn scalar_from_tag(tag: &str) -> Type {
    let kind = match tag {
        "null" => TypeKind::Null,
        "boolean" => TypeKind::Boolean,
        "int" => TypeKind::Int,
        "long" => TypeKind::Long,
        "float" => TypeKind::Float,
        "double" => TypeKind::Double,
        "string" => TypeKind::String,
        "File" => TypeKind::FileT(FileType::default()),
        "Directory" => TypeKind::Directory,
        "Any" => TypeKind::Any,
        "" => TypeKind::Null,
        other => TypeKind::Other(other.to_string()),
    };
    Type::new(kind)
}
