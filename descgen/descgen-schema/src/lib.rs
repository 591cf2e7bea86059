//! Schema model for the descriptor generator.
//!
//! A JSON IDL document goes through three passes before any code is
//! generated from it:
//!
//! 1. [`normalize`] drops meta keys and keeps the four node categories
//! 2. the type resolver turns every member description into a
//!    [`TypeDescriptor`], resolving named types through the [`NodeIndex`]
//! 3. [`assemble`] builds the immutable [`Schema`] with its enum, bitmask,
//!    object and structure tables
//!
//! The resulting [`Schema`] is never mutated; every later pass borrows it.

mod assemble;
mod error;
mod format;
pub mod idl;
mod index;
mod naming;
mod node;
mod normalize;
mod resolver;
mod schema;
mod types;

pub use assemble::{DEFAULT_CALLBACK_TYPES, SchemaOptions, assemble};
pub use error::SchemaError;
pub use format::format_schema;
pub use idl::IdlDocument;
pub use index::{IndexEntry, NodeIndex};
pub use naming::{Naming, camel_case, pascal_case, upper_snake_case};
pub use node::{
    DefaultValue, EnumNode, EnumValue, Member, Method, NodeHeader, ObjectNode, SchemaNode,
    StructureNode,
};
pub use normalize::{Category, Normalized, RecordStub, normalize};
pub use schema::Schema;
pub use types::{JsType, NumberType, Ownership, Presence, TypeDescriptor, TypeKind};
