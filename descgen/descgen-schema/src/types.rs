//! Resolved type descriptors.

use std::fmt;

use descgen_core::TypedArrayKind;

use crate::node::DefaultValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberType {
    F32,
    F64,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
}

impl NumberType {
    /// Primitive IDL type name -> number type. `size_t` is treated as 64-bit.
    pub fn from_c_name(name: &str) -> Option<Self> {
        match name {
            "float" => Some(Self::F32),
            "double" => Some(Self::F64),
            "int8_t" => Some(Self::I8),
            "uint8_t" => Some(Self::U8),
            "int16_t" => Some(Self::I16),
            "uint16_t" => Some(Self::U16),
            "int32_t" => Some(Self::I32),
            "uint32_t" => Some(Self::U32),
            "int64_t" => Some(Self::I64),
            "uint64_t" | "size_t" => Some(Self::U64),
            _ => None,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Inclusive bounds of an integer type; `None` for floats.
    pub fn integer_range(self) -> Option<(i128, i128)> {
        match self {
            Self::F32 | Self::F64 => None,
            Self::I8 => Some((i128::from(i8::MIN), i128::from(i8::MAX))),
            Self::U8 => Some((0, i128::from(u8::MAX))),
            Self::I16 => Some((i128::from(i16::MIN), i128::from(i16::MAX))),
            Self::U16 => Some((0, i128::from(u16::MAX))),
            Self::I32 => Some((i128::from(i32::MIN), i128::from(i32::MAX))),
            Self::U32 => Some((0, i128::from(u32::MAX))),
            Self::I64 => Some((i128::from(i64::MIN), i128::from(i64::MAX))),
            Self::U64 => Some((0, i128::from(u64::MAX))),
        }
    }

    /// 64-bit integers travel through the host as BigInt.
    pub fn is_wide(self) -> bool {
        matches!(self, Self::I64 | Self::U64)
    }

    pub fn typed_array_kind(self) -> TypedArrayKind {
        match self {
            Self::F32 => TypedArrayKind::Float32,
            Self::F64 => TypedArrayKind::Float64,
            Self::I8 => TypedArrayKind::Int8,
            Self::U8 => TypedArrayKind::Uint8,
            Self::I16 => TypedArrayKind::Int16,
            Self::U16 => TypedArrayKind::Uint16,
            Self::I32 => TypedArrayKind::Int32,
            Self::U32 => TypedArrayKind::Uint32,
            Self::I64 => TypedArrayKind::BigInt64,
            Self::U64 => TypedArrayKind::BigUint64,
        }
    }
}

/// Exactly one classification per descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Number(NumberType),
    Boolean,
    String,
    Enum,
    Bitmask,
    Object,
    Structure,
    Function,
    /// Untyped pointers and `void` method returns.
    Void,
}

impl TypeKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Enum => "enum",
            Self::Bitmask => "bitmask",
            Self::Object => "object",
            Self::Structure => "structure",
            Self::Function => "function",
            Self::Void => "void",
        }
    }
}

/// Host-side representation of a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsType {
    Undefined,
    Number,
    Boolean,
    String,
    BigInt,
    TypedArray(TypedArrayKind),
    ArrayBuffer,
    /// `Some(class)` for wrapped native objects, `None` for plain objects.
    Object(Option<String>),
    Function,
}

impl fmt::Display for JsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("Undefined"),
            Self::Number => f.write_str("Number"),
            Self::Boolean => f.write_str("Boolean"),
            Self::String => f.write_str("String"),
            Self::BigInt => f.write_str("BigInt"),
            Self::TypedArray(kind) => f.write_str(kind.class_name()),
            Self::ArrayBuffer => f.write_str("ArrayBuffer"),
            Self::Object(Some(class)) => f.write_str(class),
            Self::Object(None) => f.write_str("Object"),
            Self::Function => f.write_str("Function"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

/// What a decoded structure owns through a member, and so what its
/// destructor releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Plain value copied into the structure.
    Value,
    /// Memory owned elsewhere (wrapped handles, host buffers).
    Borrowed,
    /// Nested structure stored in place.
    Embedded,
    /// Single heap allocation.
    Owned,
    /// Heap array, including string buffers.
    ArrayOwned,
    /// Heap array of individually allocated elements.
    ArrayOfPointersOwned,
}

impl Ownership {
    /// True when the destructor has anything to do for this member.
    pub fn releases(self) -> bool {
        !matches!(self, Self::Value | Self::Borrowed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Borrowed => "borrowed",
            Self::Embedded => "embedded",
            Self::Owned => "owned",
            Self::ArrayOwned => "array-owned",
            Self::ArrayOfPointersOwned => "array-of-pointers-owned",
        }
    }
}

/// Fully resolved type of a structure member, method argument or return.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    /// C spelling including pointer annotation, e.g. `const WGPUColor*`.
    pub raw_type: String,
    pub kind: TypeKind,
    /// Declaration name for schema nodes, C type for primitives.
    pub native_type: String,
    pub is_array: bool,
    pub is_reference: bool,
    pub is_array_of_pointers: bool,
    pub is_dynamic_length: bool,
    pub presence: Presence,
    /// Camel-cased sibling member holding the element count.
    pub length: Option<String>,
    pub js_type: JsType,
    /// Declared default or zero, for scalar numbers and booleans.
    pub initial_value: Option<DefaultValue>,
    pub ownership: Ownership,
}

impl TypeDescriptor {
    pub fn is_optional(&self) -> bool {
        self.presence == Presence::Optional
    }

    pub fn is_required(&self) -> bool {
        self.presence == Presence::Required
    }

    pub fn number_type(&self) -> Option<NumberType> {
        match self.kind {
            TypeKind::Number(n) => Some(n),
            _ => None,
        }
    }
}
