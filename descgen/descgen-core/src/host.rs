//! Values as the dynamic host runtime hands them to a generated decoder.

use std::sync::Arc;

use bytes::Bytes;
use indexmap::IndexMap;

/// Opaque native handle held by a wrapped host object (buffer, texture, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(pub u64);

/// Element type of a host typed array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypedArrayKind {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
    BigInt64,
    BigUint64,
}

impl TypedArrayKind {
    pub fn element_size(self) -> usize {
        match self {
            Self::Int8 | Self::Uint8 => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float32 => 4,
            Self::Float64 | Self::BigInt64 | Self::BigUint64 => 8,
        }
    }

    /// Host-side constructor name, e.g. `Float32Array`.
    pub fn class_name(self) -> &'static str {
        match self {
            Self::Int8 => "Int8Array",
            Self::Uint8 => "Uint8Array",
            Self::Int16 => "Int16Array",
            Self::Uint16 => "Uint16Array",
            Self::Int32 => "Int32Array",
            Self::Uint32 => "Uint32Array",
            Self::Float32 => "Float32Array",
            Self::Float64 => "Float64Array",
            Self::BigInt64 => "BigInt64Array",
            Self::BigUint64 => "BigUint64Array",
        }
    }
}

/// A host runtime value.
///
/// Objects keep insertion order. Typed arrays and array buffers share their
/// backing storage through [`Bytes`], so binding them into a native structure
/// never copies.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    BigInt(i128),
    String(Arc<str>),
    Array(Vec<HostValue>),
    Object(IndexMap<String, HostValue>),
    TypedArray { kind: TypedArrayKind, data: Bytes },
    ArrayBuffer(Bytes),
    /// Instance of a native wrapper class, e.g. a `GPUBuffer`.
    Wrapped { class: Arc<str>, handle: NativeHandle },
    Function(Arc<str>),
}

impl HostValue {
    pub fn string(s: impl AsRef<str>) -> Self {
        Self::String(Arc::from(s.as_ref()))
    }

    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, HostValue)>,
    {
        Self::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn wrapped(class: impl AsRef<str>, handle: u64) -> Self {
        Self::Wrapped {
            class: Arc::from(class.as_ref()),
            handle: NativeHandle(handle),
        }
    }

    pub fn typed_array(kind: TypedArrayKind, data: impl Into<Bytes>) -> Self {
        Self::TypedArray {
            kind,
            data: data.into(),
        }
    }

    pub fn uint32_array(values: &[u32]) -> Self {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::typed_array(TypedArrayKind::Uint32, bytes)
    }

    pub fn float32_array(values: &[f32]) -> Self {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::typed_array(TypedArrayKind::Float32, bytes)
    }

    /// Property lookup; `undefined` properties count as absent.
    pub fn get(&self, key: &str) -> Option<&HostValue> {
        match self {
            Self::Object(map) => map.get(key).filter(|v| !matches!(v, Self::Undefined)),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::BigInt(_) => "bigint",
            Self::String(_) => "string",
            Self::Array(_) => "Array",
            Self::Object(_) => "Object",
            Self::TypedArray { kind, .. } => kind.class_name(),
            Self::ArrayBuffer(_) => "ArrayBuffer",
            Self::Wrapped { .. } => "wrapped object",
            Self::Function(_) => "function",
        }
    }
}

impl From<serde_json::Value> for HostValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Boolean(b),
            Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Self::String(Arc::from(s)),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}
