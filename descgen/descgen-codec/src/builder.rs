//! Plan builder: one [`CodecPlan`] per structure.
//!
//! Each member becomes a guard, a marshaling op, an optional length field
//! and the ownership tag resolved by the schema. Shapes without a
//! marshaling rule are reported as [`SchemaError::UnsupportedShape`] rather
//! than silently dropped.

use descgen_schema::{
    DefaultValue, JsType, Member, Schema, SchemaError, StructureNode, TypeDescriptor, TypeKind,
};

use crate::plan::{CodecPlan, FieldInit, FieldPlan, Guard, LengthField, MarshalOp, MemberPlan};

pub fn build_plan(schema: &Schema, structure: &StructureNode) -> Result<CodecPlan, SchemaError> {
    let owner = structure.header.external_name.as_str();
    let mut members = Vec::with_capacity(structure.members.len());
    let mut fields = Vec::with_capacity(structure.members.len());

    for member in &structure.members {
        let is_length = structure.is_length_member(&member.name);
        fields.push(FieldPlan {
            name: member.name.clone(),
            native_type: member.ty.native_type.clone(),
            init: field_init(owner, member, is_length)?,
        });

        // length members are written by their array
        if member.is_internal_property || is_length {
            continue;
        }

        let op = marshal_op(schema, owner, member)?;
        let length = match &member.ty.length {
            Some(name) if member.ty.is_array => Some(length_field(owner, structure, member, name)?),
            _ => None,
        };
        members.push(MemberPlan {
            name: member.name.clone(),
            guard: if member.ty.is_required() {
                Guard::Required
            } else {
                Guard::Optional
            },
            op,
            ownership: member.ty.ownership,
            length,
            native_type: member.ty.native_type.clone(),
        });
    }

    log::debug!(
        "plan {owner}: {} marshaled members, {} owning",
        members.len(),
        members.iter().filter(|m| m.ownership.releases()).count()
    );
    Ok(CodecPlan {
        structure: structure.header.declaration_name.clone(),
        external_name: structure.header.external_name.clone(),
        extensible: structure.extensible,
        members,
        fields,
    })
}

fn marshal_op(schema: &Schema, owner: &str, member: &Member) -> Result<MarshalOp, SchemaError> {
    let ty = &member.ty;
    let unsupported = |shape: &str| SchemaError::UnsupportedShape {
        owner: owner.to_string(),
        member: member.name.clone(),
        shape: shape.to_string(),
    };
    let scalar_reference = ty.is_reference && !ty.is_array;
    if ty.is_array_of_pointers && ty.kind != TypeKind::Structure {
        return Err(unsupported("arrays of pointers are only supported for structures"));
    }

    Ok(match ty.kind {
        TypeKind::Object if ty.is_array => MarshalOp::UnwrapObjectArray {
            class: external_class(ty),
        },
        TypeKind::Object if scalar_reference => {
            return Err(unsupported("scalar references to objects"));
        }
        TypeKind::Object => MarshalOp::UnwrapObject {
            class: external_class(ty),
        },
        TypeKind::Structure => {
            if schema.structure(&ty.native_type).is_none() {
                return Err(SchemaError::Unresolved {
                    owner: owner.to_string(),
                    member: member.name.clone(),
                    type_name: ty.native_type.clone(),
                });
            }
            if ty.is_array {
                MarshalOp::StructArray {
                    structure: ty.native_type.clone(),
                    of_pointers: ty.is_array_of_pointers,
                }
            } else {
                MarshalOp::Struct {
                    structure: ty.native_type.clone(),
                    reference: ty.is_reference,
                }
            }
        }
        TypeKind::Number(n) if ty.is_array => MarshalOp::Buffer {
            kind: Some(n.typed_array_kind()),
        },
        TypeKind::Number(_) if scalar_reference => {
            return Err(unsupported("scalar references to numbers"));
        }
        TypeKind::Number(n) => MarshalOp::Number(n),
        TypeKind::Boolean if ty.is_array => return Err(unsupported("boolean arrays")),
        TypeKind::Boolean if scalar_reference => {
            return Err(unsupported("scalar references to booleans"));
        }
        TypeKind::Boolean => MarshalOp::Boolean,
        TypeKind::Enum if ty.is_array => MarshalOp::EnumArray {
            enumeration: ty.native_type.clone(),
        },
        TypeKind::Enum if scalar_reference => {
            return Err(unsupported("scalar references to enums"));
        }
        TypeKind::Enum => MarshalOp::Enum {
            enumeration: ty.native_type.clone(),
        },
        TypeKind::Bitmask if ty.is_array => MarshalOp::BitmaskArray,
        TypeKind::Bitmask if scalar_reference => {
            return Err(unsupported("scalar references to bitmasks"));
        }
        TypeKind::Bitmask => MarshalOp::Bitmask,
        TypeKind::String if ty.is_dynamic_length => MarshalOp::DynamicString,
        TypeKind::String => return Err(unsupported("fixed-length strings")),
        TypeKind::Void if ty.is_reference => MarshalOp::Buffer { kind: None },
        TypeKind::Void => return Err(unsupported("void members")),
        TypeKind::Function => return Err(unsupported("function members in structures")),
    })
}

fn external_class(ty: &TypeDescriptor) -> String {
    match &ty.js_type {
        JsType::Object(Some(class)) => class.clone(),
        _ => ty.native_type.clone(),
    }
}

fn length_field(
    owner: &str,
    structure: &StructureNode,
    member: &Member,
    name: &str,
) -> Result<LengthField, SchemaError> {
    structure
        .member(name)
        .and_then(|sibling| sibling.ty.number_type())
        .filter(|n| !n.is_float())
        .map(|ty| LengthField {
            name: name.to_string(),
            ty,
        })
        .ok_or_else(|| SchemaError::UnknownLength {
            owner: owner.to_string(),
            member: member.name.clone(),
            length: name.to_string(),
        })
}

/// `is_length`: the member counts an array, so it resets to 0 alongside the
/// null array pointer whatever its declared default.
fn field_init(owner: &str, member: &Member, is_length: bool) -> Result<FieldInit, SchemaError> {
    let ty = &member.ty;
    if ty.is_reference || ty.is_array {
        return Ok(FieldInit::Null);
    }
    if is_length && let TypeKind::Number(n) = ty.kind {
        return Ok(FieldInit::Number {
            ty: n,
            value: DefaultValue::Integer(0),
        });
    }
    let value_u32 = |value: Option<DefaultValue>| -> Result<u32, SchemaError> {
        match value {
            None => Ok(0),
            Some(DefaultValue::Integer(v)) => {
                u32::try_from(v).map_err(|_| SchemaError::DefaultValue {
                    owner: owner.to_string(),
                    member: member.name.clone(),
                    value: v.to_string(),
                    reason: format!("outside the range of '{}'", ty.native_type),
                })
            }
            Some(other) => Err(SchemaError::DefaultValue {
                owner: owner.to_string(),
                member: member.name.clone(),
                value: other.to_string(),
                reason: "expected an integer".into(),
            }),
        }
    };

    Ok(match ty.kind {
        TypeKind::Number(n) => FieldInit::Number {
            ty: n,
            value: ty.initial_value.unwrap_or(DefaultValue::Integer(0)),
        },
        TypeKind::Boolean => {
            FieldInit::Bool(matches!(ty.initial_value, Some(DefaultValue::Bool(true))))
        }
        TypeKind::Enum => FieldInit::Enum(value_u32(member.default)?),
        TypeKind::Bitmask => FieldInit::Bitmask(value_u32(member.default)?),
        TypeKind::Structure => FieldInit::Embedded(ty.native_type.clone()),
        _ => FieldInit::Null,
    })
}
