//! C++ rendering of descriptor decoders.
//!
//! [`render`] turns a [`CodecSet`](descgen_codec::CodecSet) into the
//! `DescriptorDecoder.h` / `DescriptorDecoder.cpp` pair of a Node.js
//! binding: one name table per enum and bitmask, and per structure a
//! `Decode<Name>` / `Destroy<Name>` pair written against `Napi::*` and the
//! native `WGPU*` declarations. The functions are rendered from the same
//! [`CodecPlan`](descgen_codec::CodecPlan)s the in-process codec executes,
//! so both sides allocate and release the same members.

mod decode;
mod destroy;
mod source;
mod tables;

pub use source::{CppSources, HEADER_FILE, NAMESPACE, SOURCE_FILE, render};
