//! Decode-time error types.

use crate::{heap::FreeKind, native::AllocId};

/// Shape or type mismatch between a host value and the declared member type.
///
/// Always names the structure that owns the offending member (by its
/// external name) and the member itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostValueTypeError {
    /// The value handed to a structure decoder is not an object.
    #[error("expected an object for '{structure}', got {found}")]
    NotAnObject {
        structure: String,
        found: &'static str,
    },

    /// A required member is absent.
    #[error("missing required member '{structure}'.'{member}'")]
    Missing { structure: String, member: String },

    /// A member has the wrong host type.
    #[error("expected type '{expected}' for '{structure}'.'{member}', got {found}")]
    Mismatch {
        structure: String,
        member: String,
        expected: String,
        found: &'static str,
    },

    /// A string does not name any value of the member's enum.
    #[error("unknown value '{value}' of '{enumeration}' for '{structure}'.'{member}'")]
    UnknownEnumValue {
        structure: String,
        member: String,
        enumeration: String,
        value: String,
    },
}

impl HostValueTypeError {
    pub fn structure(&self) -> &str {
        match self {
            Self::NotAnObject { structure, .. }
            | Self::Missing { structure, .. }
            | Self::Mismatch { structure, .. }
            | Self::UnknownEnumValue { structure, .. } => structure,
        }
    }

    /// Offending member; empty when the structure value itself was wrong.
    pub fn member(&self) -> &str {
        match self {
            Self::NotAnObject { .. } => "",
            Self::Missing { member, .. }
            | Self::Mismatch { member, .. }
            | Self::UnknownEnumValue { member, .. } => member,
        }
    }
}

/// Invalid release observed by the [`NativeHeap`](crate::NativeHeap).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeapFault {
    #[error("release of unknown or already freed allocation {0:?}")]
    UnknownAllocation(AllocId),

    #[error("allocation {id:?} released with {used:?}, expected {expected:?}")]
    MismatchedFree {
        id: AllocId,
        used: FreeKind,
        expected: FreeKind,
    },
}
