//! Type resolution: member descriptions -> [`TypeDescriptor`]s.
//!
//! A member is classified by its type name first:
//!
//! 1. **Primitive**: numeric C types, `bool`, `char` and `void`.
//! 2. **Callback**: names from the configured callback list or records of
//!    category `callback`.
//! 3. **Node**: anything else must name an enum, bitmask, object or
//!    structure in the [`NodeIndex`].
//!
//! The annotation then decides pointer-ness (`*`, `const*`,
//! `const*const*`), and a sibling `length` turns a pointer into an array.
//! Shapes with no marshaling rule at all (fixed-length strings, numeric
//! array sizes) are rejected here; the codec builder rejects the rest.

use std::collections::HashSet;

use serde_json::Value;

use crate::{
    error::SchemaError,
    idl::RawMember,
    index::NodeIndex,
    naming::{Naming, camel_case},
    normalize::Category,
    types::{JsType, NumberType, Ownership, Presence, TypeDescriptor, TypeKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pointer {
    None,
    Mutable,
    Const,
    ConstArrayOfPointers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Length {
    None,
    Member(String),
    Strlen,
}

pub(crate) struct TypeResolver<'a> {
    pub index: &'a NodeIndex,
    pub naming: &'a Naming,
    pub callbacks: &'a HashSet<String>,
}

impl TypeResolver<'_> {
    /// Resolve `raw` as a member of `owner` (an external name). `member` is
    /// the already camel-cased member name used in diagnostics.
    pub fn resolve(
        &self,
        owner: &str,
        member: &str,
        raw: &RawMember,
    ) -> Result<TypeDescriptor, SchemaError> {
        let unsupported = |shape: &str| SchemaError::UnsupportedShape {
            owner: owner.to_string(),
            member: member.to_string(),
            shape: shape.to_string(),
        };

        let (kind, native_type, js_class) = self.classify(owner, member, &raw.ty)?;
        let pointer = parse_annotation(owner, member, raw.annotation.as_deref())?;
        let length = parse_length(raw.length.as_ref()).ok_or_else(|| {
            unsupported("fixed-size arrays are not supported, length must name a member")
        })?;

        let is_reference = pointer != Pointer::None;
        let is_array_of_pointers = pointer == Pointer::ConstArrayOfPointers;
        let mut is_dynamic_length = false;

        if kind == TypeKind::String {
            match length {
                Length::Strlen if is_reference && !is_array_of_pointers => is_dynamic_length = true,
                _ => return Err(unsupported("fixed-length strings are not supported")),
            }
        } else if length == Length::Strlen {
            return Err(unsupported("'strlen' length on a non-string member"));
        }

        let length_member = match length {
            Length::Member(name) => Some(name),
            _ => None,
        };
        let is_array = kind != TypeKind::String
            && (is_array_of_pointers || (is_reference && length_member.is_some()));
        if is_array_of_pointers && length_member.is_none() {
            return Err(SchemaError::MissingLength {
                owner: owner.to_string(),
                member: member.to_string(),
            });
        }

        let raw_type = match pointer {
            Pointer::None => native_type.clone(),
            Pointer::Mutable => format!("{native_type}*"),
            Pointer::Const => format!("const {native_type}*"),
            Pointer::ConstArrayOfPointers => format!("const {native_type}* const *"),
        };
        let js_type = js_type(kind, is_array, is_reference, js_class);
        let ownership = ownership(kind, is_array, is_reference, is_array_of_pointers);
        let presence = if raw.optional || raw.default.is_some() {
            Presence::Optional
        } else {
            Presence::Required
        };

        Ok(TypeDescriptor {
            raw_type,
            kind,
            native_type,
            is_array,
            is_reference,
            is_array_of_pointers,
            is_dynamic_length,
            presence,
            length: if is_array { length_member } else { None },
            js_type,
            initial_value: None,
            ownership,
        })
    }

    /// Kind, native type and wrapper class (objects only) of a type name.
    fn classify(
        &self,
        owner: &str,
        member: &str,
        type_name: &str,
    ) -> Result<(TypeKind, String, Option<String>), SchemaError> {
        if let Some(number) = NumberType::from_c_name(type_name) {
            return Ok((TypeKind::Number(number), type_name.to_string(), None));
        }
        match type_name {
            "bool" => return Ok((TypeKind::Boolean, "bool".to_string(), None)),
            "char" => return Ok((TypeKind::String, "char".to_string(), None)),
            "void" => return Ok((TypeKind::Void, "void".to_string(), None)),
            _ => {}
        }
        if self.callbacks.contains(type_name) {
            let native = self.naming.declaration_name(type_name);
            return Ok((TypeKind::Function, native, None));
        }

        let Some(entry) = self.index.get(type_name) else {
            return Err(SchemaError::Unresolved {
                owner: owner.to_string(),
                member: member.to_string(),
                type_name: type_name.to_string(),
            });
        };
        let kind = match entry.category {
            Category::Enum => TypeKind::Enum,
            Category::Bitmask => TypeKind::Bitmask,
            Category::Object => TypeKind::Object,
            Category::Structure => TypeKind::Structure,
        };
        let class = (kind == TypeKind::Object).then(|| entry.external_name.clone());
        Ok((kind, entry.declaration_name.clone(), class))
    }
}

fn parse_annotation(
    owner: &str,
    member: &str,
    annotation: Option<&str>,
) -> Result<Pointer, SchemaError> {
    match annotation {
        None | Some("") | Some("value") => Ok(Pointer::None),
        Some("*") => Ok(Pointer::Mutable),
        Some("const*") => Ok(Pointer::Const),
        Some("const*const*") => Ok(Pointer::ConstArrayOfPointers),
        Some(other) => Err(SchemaError::Annotation {
            owner: owner.to_string(),
            member: member.to_string(),
            annotation: other.to_string(),
        }),
    }
}

/// `None` for numeric lengths, which have no marshaling rule.
fn parse_length(length: Option<&Value>) -> Option<Length> {
    match length {
        None | Some(Value::Null) => Some(Length::None),
        Some(Value::String(s)) if s == "strlen" => Some(Length::Strlen),
        Some(Value::String(s)) if s.trim().parse::<u64>().is_ok() => None,
        Some(Value::String(s)) => Some(Length::Member(camel_case(s))),
        Some(_) => None,
    }
}

fn js_type(kind: TypeKind, is_array: bool, is_reference: bool, class: Option<String>) -> JsType {
    match kind {
        TypeKind::Number(n) if is_array => JsType::TypedArray(n.typed_array_kind()),
        TypeKind::Number(n) if n.is_wide() => JsType::BigInt,
        TypeKind::Number(_) | TypeKind::Bitmask => JsType::Number,
        TypeKind::Boolean => JsType::Boolean,
        TypeKind::String | TypeKind::Enum => JsType::String,
        TypeKind::Object => JsType::Object(class),
        TypeKind::Structure => JsType::Object(None),
        TypeKind::Function => JsType::Function,
        TypeKind::Void if is_reference => JsType::ArrayBuffer,
        TypeKind::Void => JsType::Undefined,
    }
}

fn ownership(
    kind: TypeKind,
    is_array: bool,
    is_reference: bool,
    is_array_of_pointers: bool,
) -> Ownership {
    match kind {
        TypeKind::Structure if is_array_of_pointers => Ownership::ArrayOfPointersOwned,
        TypeKind::Structure if is_array => Ownership::ArrayOwned,
        TypeKind::Structure if is_reference => Ownership::Owned,
        TypeKind::Structure => Ownership::Embedded,
        TypeKind::Object | TypeKind::Enum | TypeKind::Bitmask if is_array => Ownership::ArrayOwned,
        TypeKind::Object => Ownership::Borrowed,
        TypeKind::Number(_) | TypeKind::Void if is_reference => Ownership::Borrowed,
        TypeKind::String => Ownership::ArrayOwned,
        _ => Ownership::Value,
    }
}
