//! Decode/destroy plans for schema structures.
//!
//! [`CodecSet::build`] turns every structure of a [`Schema`](descgen_schema::Schema)
//! into a [`CodecPlan`]: one ownership-tagged [`MemberPlan`] per marshaled
//! member plus the reset layout of the native structure. The same plan is
//! executed in-process by [`StructCodec`] and rendered as C++ by
//! `descgen-cpp`.

mod builder;
mod codec;
mod convert;
mod plan;
mod table;

pub use builder::build_plan;
pub use codec::{CodecSet, StructCodec};
pub use convert::{to_int32, to_uint32};
pub use plan::{CodecPlan, FieldInit, FieldPlan, Guard, LengthField, MarshalOp, MemberPlan};
pub use table::NameTable;
