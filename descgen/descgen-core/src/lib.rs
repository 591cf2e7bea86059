//! Runtime-side types shared by the descgen pipeline.
//!
//! This crate knows nothing about schemas. It provides the two value worlds
//! that generated decoders translate between, plus the bookkeeping needed to
//! prove that a decode/destroy pair is allocation-correct:
//!
//! - [`HostValue`]: a value as handed over by the dynamic host runtime
//! - [`NativeStruct`] / [`NativeValue`]: fixed-layout native structures
//! - [`NativeHeap`]: heap blocks owned by decoded structures, with accounting
//! - [`HostValueTypeError`] / [`OwningContext`]: the decode-time error channel

mod context;
mod error;
mod heap;
mod host;
mod native;

pub use context::{DeviceContext, OwningContext};
pub use error::{HeapFault, HostValueTypeError};
pub use heap::{FreeKind, HeapBlock, HeapStats, NativeHeap};
pub use host::{HostValue, NativeHandle, TypedArrayKind};
pub use native::{AllocId, BufferView, NativeStruct, NativeValue};
