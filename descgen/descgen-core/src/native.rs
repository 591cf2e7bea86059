//! Fixed-layout native structures produced by generated decoders.

use bytes::Bytes;
use indexmap::IndexMap;

use crate::host::{NativeHandle, TypedArrayKind};

/// Identifier of a block in a [`NativeHeap`](crate::NativeHeap); the native
/// side's pointer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AllocId(pub u64);

/// Zero-copy view of host-owned memory bound into a native structure.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferView {
    pub data: Bytes,
    /// `None` for an untyped (`void*`) binding.
    pub kind: Option<TypedArrayKind>,
}

impl BufferView {
    /// Element count for typed bindings, byte length otherwise.
    pub fn len(&self) -> usize {
        match self.kind {
            Some(kind) => self.data.len() / kind.element_size(),
            None => self.data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True when this view points into the same memory as `other`.
    pub fn shares_memory_with(&self, other: &Bytes) -> bool {
        self.data.as_ptr() == other.as_ptr() && self.data.len() == other.len()
    }
}

/// One field slot of a native structure.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    /// Null pointer, null handle.
    Null,
    Bool(bool),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Enum(u32),
    Bitmask(u32),
    Handle(NativeHandle),
    Struct(NativeStruct),
    Pointer(AllocId),
    Buffer(BufferView),
}

impl NativeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integer view of any integral slot.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::U32(v) | Self::Enum(v) | Self::Bitmask(v) => Some(u64::from(*v)),
            Self::U64(v) => Some(*v),
            Self::I32(v) => u64::try_from(*v).ok(),
            Self::I64(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<AllocId> {
        match self {
            Self::Pointer(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&NativeStruct> {
        match self {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }
}

/// A native structure instance: declaration name plus ordered field slots.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeStruct {
    pub type_name: String,
    /// `Some` only for extensible structures, carrying the caller's chain.
    pub next_in_chain: Option<NativeHandle>,
    fields: IndexMap<String, NativeValue>,
}

impl NativeStruct {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            next_in_chain: None,
            fields: IndexMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&NativeValue> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: &str, value: NativeValue) {
        match self.fields.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.fields.insert(name.to_string(), value);
            }
        }
    }

    /// Move a field out, leaving a null slot behind.
    pub fn take(&mut self, name: &str) -> NativeValue {
        self.fields
            .get_mut(name)
            .map(|slot| std::mem::replace(slot, NativeValue::Null))
            .unwrap_or(NativeValue::Null)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &NativeValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}
