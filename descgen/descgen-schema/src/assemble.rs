//! Schema assembly: normalized records -> [`Schema`].

use std::collections::HashSet;

use serde_json::Value;

use crate::{
    error::SchemaError,
    idl::{IdlDocument, RawMember, RawRecord},
    index::NodeIndex,
    naming::{Naming, camel_case, upper_snake_case},
    node::{
        DefaultValue, EnumNode, EnumValue, Member, Method, NodeHeader, ObjectNode, SchemaNode,
        StructureNode,
    },
    normalize::{Category, RecordStub, normalize},
    resolver::TypeResolver,
    schema::Schema,
    types::{TypeDescriptor, TypeKind},
};

/// Type names treated as host callbacks unless the IDL declares its own.
pub const DEFAULT_CALLBACK_TYPES: &[&str] = &[
    "error callback",
    "buffer map read callback",
    "buffer map write callback",
    "buffer create mapped callback",
    "fence on completion callback",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaOptions {
    pub naming: Naming,
    /// Extra callback type names; records of category `callback` are
    /// always added.
    pub callback_types: Vec<String>,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            naming: Naming::default(),
            callback_types: DEFAULT_CALLBACK_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Build the immutable [`Schema`] from an IDL document.
pub fn assemble(doc: &IdlDocument, options: &SchemaOptions) -> Result<Schema, SchemaError> {
    let normalized = normalize(doc)?;
    let index = NodeIndex::build(&normalized.stubs, &options.naming)?;
    let callbacks: HashSet<String> = options
        .callback_types
        .iter()
        .chain(&normalized.callbacks)
        .cloned()
        .collect();

    let assembler = Assembler {
        stubs: &normalized.stubs,
        index: &index,
        resolver: TypeResolver {
            index: &index,
            naming: &options.naming,
            callbacks: &callbacks,
        },
    };
    let nodes = normalized
        .stubs
        .iter()
        .map(|stub| assembler.node(stub))
        .collect::<Result<Vec<_>, _>>()?;

    let schema = Schema::new(options.naming.clone(), nodes, index);
    log::info!(
        "assembled schema: {} enums, {} bitmasks, {} objects, {} structures ({} records skipped)",
        schema.enums().count(),
        schema.bitmasks().count(),
        schema.objects().count(),
        schema.structures().count(),
        normalized.skipped,
    );
    Ok(schema)
}

struct Assembler<'a> {
    stubs: &'a [RecordStub],
    index: &'a NodeIndex,
    resolver: TypeResolver<'a>,
}

impl Assembler<'_> {
    fn node(&self, stub: &RecordStub) -> Result<SchemaNode, SchemaError> {
        let naming = self.resolver.naming;
        let header = NodeHeader {
            text_name: stub.text_name.clone(),
            declaration_name: naming.declaration_name(&stub.text_name),
            external_name: naming.external_name(&stub.text_name),
        };
        Ok(match stub.category {
            Category::Enum => SchemaNode::Enum(value_set(header, &stub.record, false)?),
            Category::Bitmask => SchemaNode::Bitmask(value_set(header, &stub.record, true)?),
            Category::Object => SchemaNode::Object(self.object(header, &stub.record)?),
            Category::Structure => SchemaNode::Structure(self.structure(header, &stub.record)?),
        })
    }

    fn object(&self, header: NodeHeader, record: &RawRecord) -> Result<ObjectNode, SchemaError> {
        let owner = header.external_name.as_str();
        let mut methods = Vec::with_capacity(record.methods.len());
        for method in &record.methods {
            let name = camel_case(&method.name);
            let returns = method.returns.as_deref().unwrap_or("void");
            let return_type =
                self.resolver
                    .resolve(owner, &name, &RawMember::of_type(&method.name, returns))?;
            let args = method
                .args
                .iter()
                .map(|arg| self.member(owner, arg))
                .collect::<Result<Vec<_>, _>>()?;
            check_lengths(owner, &args)?;
            methods.push(Method {
                name,
                return_type,
                args,
            });
        }
        Ok(ObjectNode { header, methods })
    }

    fn structure(
        &self,
        header: NodeHeader,
        record: &RawRecord,
    ) -> Result<StructureNode, SchemaError> {
        let owner = header.external_name.as_str();
        let members = record
            .members
            .iter()
            .map(|raw| self.member(owner, raw))
            .collect::<Result<Vec<_>, _>>()?;
        check_lengths(owner, &members)?;
        log::debug!("structure {owner}: {} members", members.len());
        Ok(StructureNode {
            header,
            extensible: record.extensible,
            members,
        })
    }

    fn member(&self, owner: &str, raw: &RawMember) -> Result<Member, SchemaError> {
        let name = camel_case(&raw.name);
        let mut ty = self.resolver.resolve(owner, &name, raw)?;
        let default = match &raw.default {
            Some(value) => self.default_value(owner, &name, raw, &ty, value)?,
            None => None,
        };
        if !ty.is_reference && !ty.is_array {
            ty.initial_value = match ty.kind {
                TypeKind::Number(n) if n.is_float() => Some(default.unwrap_or(DefaultValue::Float(0.0))),
                TypeKind::Number(_) => Some(default.unwrap_or(DefaultValue::Integer(0))),
                TypeKind::Boolean => Some(default.unwrap_or(DefaultValue::Bool(false))),
                _ => None,
            };
        }
        Ok(Member {
            name,
            ty,
            default,
            is_internal_property: raw.is_internal_property,
        })
    }

    fn default_value(
        &self,
        owner: &str,
        member: &str,
        raw: &RawMember,
        ty: &TypeDescriptor,
        value: &Value,
    ) -> Result<Option<DefaultValue>, SchemaError> {
        let text = value.as_str();
        if text == Some("undefined") || (ty.is_reference && text == Some("nullptr")) {
            return Ok(None);
        }
        let invalid = |reason: String| SchemaError::DefaultValue {
            owner: owner.to_string(),
            member: member.to_string(),
            value: value.to_string(),
            reason,
        };
        if ty.is_array || ty.is_reference {
            return Err(invalid("pointer members only take 'undefined' or 'nullptr'".into()));
        }

        match ty.kind {
            TypeKind::Boolean => match value {
                Value::Bool(b) => Ok(Some(DefaultValue::Bool(*b))),
                Value::String(s) if s == "true" || s == "false" => {
                    Ok(Some(DefaultValue::Bool(s == "true")))
                }
                _ => Err(invalid("expected a boolean literal".into())),
            },
            TypeKind::Number(n) => match parse_number(value) {
                Some(DefaultValue::Float(_)) if !n.is_float() => {
                    Err(invalid(format!("'{}' is an integer type", raw.ty)))
                }
                Some(DefaultValue::Integer(v)) if n.is_float() => {
                    Ok(Some(DefaultValue::Float(v as f64)))
                }
                Some(DefaultValue::Integer(v))
                    if n.integer_range().is_some_and(|(lo, hi)| v < lo || v > hi) =>
                {
                    Err(invalid(format!("outside the range of '{}'", raw.ty)))
                }
                Some(literal) => Ok(Some(literal)),
                None => Err(invalid("expected a numeric literal".into())),
            },
            TypeKind::Enum | TypeKind::Bitmask => {
                if let Some(DefaultValue::Integer(v)) = parse_number(value) {
                    return Ok(Some(DefaultValue::Integer(v)));
                }
                let Some(name) = text else {
                    return Err(invalid("expected a value name".into()));
                };
                self.index
                    .get(&raw.ty)
                    .and_then(|entry| self.stubs.get(entry.position))
                    .and_then(|stub| {
                        stub.record
                            .values
                            .iter()
                            .find(|v| v.name == name || upper_snake_case(&v.name) == name)
                    })
                    .map(|v| Some(DefaultValue::Integer(i128::from(v.value))))
                    .ok_or_else(|| invalid(format!("no value named '{name}' in '{}'", raw.ty)))
            }
            kind => Err(invalid(format!("{} members take no default", kind.name()))),
        }
    }
}

fn value_set(header: NodeHeader, record: &RawRecord, bitmask: bool) -> Result<EnumNode, SchemaError> {
    let mut values = Vec::with_capacity(record.values.len());
    for raw in &record.values {
        let value = u32::try_from(raw.value).map_err(|_| SchemaError::ValueRange {
            owner: header.external_name.clone(),
            name: raw.name.clone(),
            value: raw.value,
        })?;
        let name = if bitmask {
            upper_snake_case(&raw.name)
        } else {
            raw.name.clone()
        };
        values.push(EnumValue {
            name,
            text_name: raw.name.clone(),
            value,
        });
    }
    Ok(EnumNode { header, values })
}

/// Every array member needs an integer sibling holding its element count.
fn check_lengths(owner: &str, members: &[Member]) -> Result<(), SchemaError> {
    for member in members.iter().filter(|m| m.ty.is_array) {
        let Some(length) = member.ty.length.as_deref() else {
            return Err(SchemaError::MissingLength {
                owner: owner.to_string(),
                member: member.name.clone(),
            });
        };
        let found = members.iter().any(|m| {
            m.name == length
                && !m.ty.is_reference
                && matches!(m.ty.kind, TypeKind::Number(n) if !n.is_float())
        });
        if !found {
            return Err(SchemaError::UnknownLength {
                owner: owner.to_string(),
                member: member.name.clone(),
                length: length.to_string(),
            });
        }
    }
    Ok(())
}

fn parse_number(value: &Value) -> Option<DefaultValue> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .map(DefaultValue::Integer)
            .or_else(|| n.as_f64().map(DefaultValue::Float)),
        Value::String(s) => parse_number_literal(s.trim()),
        _ => None,
    }
}

/// Decimal, `0x` hex or float literal.
fn parse_number_literal(s: &str) -> Option<DefaultValue> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return i128::from_str_radix(hex, 16).ok().map(DefaultValue::Integer);
    }
    if let Ok(v) = s.parse::<i128>() {
        return Some(DefaultValue::Integer(v));
    }
    if !s.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '.') {
        return None;
    }
    s.parse::<f64>().ok().map(DefaultValue::Float)
}
