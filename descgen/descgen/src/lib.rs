//! Schema-driven generator of host-to-native descriptor decoders.
//!
//! A [`Generator`] reads an IDL document (a JSON object of named records),
//! assembles the schema tables and builds one decode/destroy codec per
//! structure. The resulting [`Bindings`] can decode host values in process
//! through [`codec`] or, with the `cpp` feature, render the equivalent
//! C++ binding sources through [`cpp`].
//!
//! ```no_run
//! use descgen::Generator;
//!
//! let generator = Generator::builder().with_native_prefix("WGPU").build();
//! let bindings = generator.generate_path("dawn.json".as_ref())?;
//! println!("{}", bindings.format_schema()?);
//! # Ok::<(), descgen::GenerateError>(())
//! ```

mod error;
mod generator;

pub use error::GenerateError;
pub use generator::{Bindings, Generator, GeneratorBuilder};

pub use descgen_codec as codec;
pub use descgen_core as core;
#[cfg(feature = "cpp")]
pub use descgen_cpp as cpp;
pub use descgen_schema as schema;
