//! Ownership-tagged decode/destroy plans.

use descgen_core::TypedArrayKind;
use descgen_schema::{DefaultValue, NumberType, Ownership};

/// How a member's presence is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Absence is a validation error.
    Required,
    /// Absent or null input leaves the reset value in place.
    Optional,
}

/// Marshaling operation for one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarshalOp {
    /// Unwrap a host wrapper of `class` into its native handle.
    UnwrapObject { class: String },
    /// Heap array of unwrapped handles.
    UnwrapObjectArray { class: String },
    /// Nested structure; `reference` means heap-allocated and pointed to.
    Struct { structure: String, reference: bool },
    /// Heap array of nested structures, or of pointers to them.
    StructArray { structure: String, of_pointers: bool },
    Number(NumberType),
    Boolean,
    /// Host string looked up in the enum's name table.
    Enum { enumeration: String },
    EnumArray { enumeration: String },
    /// Host number cast to the bitmask type.
    Bitmask,
    BitmaskArray,
    /// Host string copied into a heap-allocated C string.
    DynamicString,
    /// Zero-copy binding of host memory; `None` for untyped (`void*`) buffers.
    Buffer { kind: Option<TypedArrayKind> },
}

/// Sibling member that receives an array's element count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthField {
    pub name: String,
    pub ty: NumberType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberPlan {
    pub name: String,
    pub guard: Guard,
    pub op: MarshalOp,
    pub ownership: Ownership,
    pub length: Option<LengthField>,
    /// Native element type, e.g. `WGPUBindGroupLayoutEntry` or `uint32_t`.
    pub native_type: String,
}

/// Value a native field holds after reset, before any input is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInit {
    /// Null pointer or handle.
    Null,
    Bool(bool),
    Number { ty: NumberType, value: DefaultValue },
    Enum(u32),
    Bitmask(u32),
    /// Nested structure, reset recursively.
    Embedded(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldPlan {
    pub name: String,
    /// Native type of the field, used when rendering casts.
    pub native_type: String,
    pub init: FieldInit,
}

/// Decode/destroy plan of one structure.
#[derive(Debug, Clone, PartialEq)]
pub struct CodecPlan {
    /// Declaration name, e.g. `WGPUBufferDescriptor`.
    pub structure: String,
    /// External name, e.g. `GPUBufferDescriptor`.
    pub external_name: String,
    pub extensible: bool,
    /// Marshaled members in declaration order. Internal properties and
    /// array length members are not listed.
    pub members: Vec<MemberPlan>,
    /// Every native field, in declaration order.
    pub fields: Vec<FieldPlan>,
}

impl CodecPlan {
    pub fn member(&self, name: &str) -> Option<&MemberPlan> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Members the destructor has to visit.
    pub fn owning_members(&self) -> impl Iterator<Item = &MemberPlan> {
        self.members.iter().filter(|m| m.ownership.releases())
    }
}
