//! Generator facade: IDL in, schema tables and decode/destroy codecs out.

use std::{fs, path::Path};

use descgen_codec::{CodecSet, StructCodec};
use descgen_schema::{IdlDocument, Naming, Schema, SchemaOptions, assemble, format_schema};

use crate::error::GenerateError;

/// Runs the full pipeline with one set of naming and callback options.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    options: SchemaOptions,
}

/// Builder for configuring [`Generator`].
#[derive(Debug, Clone, Default)]
pub struct GeneratorBuilder {
    options: SchemaOptions,
}

/// Everything generated from one IDL document.
#[derive(Debug, Clone)]
pub struct Bindings {
    pub schema: Schema,
    pub codecs: CodecSet,
}

impl Generator {
    /// Create a builder for [`Generator`].
    pub fn builder() -> GeneratorBuilder {
        GeneratorBuilder::default()
    }

    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    /// Normalize, resolve and assemble the schema tables only.
    pub fn assemble(&self, doc: &IdlDocument) -> Result<Schema, GenerateError> {
        Ok(assemble(doc, &self.options)?)
    }

    /// Assemble the schema and build a codec for every structure.
    pub fn generate(&self, doc: &IdlDocument) -> Result<Bindings, GenerateError> {
        let schema = self.assemble(doc)?;
        let codecs = CodecSet::build(&schema)?;
        Ok(Bindings { schema, codecs })
    }

    /// [`generate`](Self::generate) from IDL JSON text.
    pub fn generate_str(&self, text: &str) -> Result<Bindings, GenerateError> {
        let doc: IdlDocument = text.parse()?;
        self.generate(&doc)
    }

    /// [`generate`](Self::generate) from an IDL JSON file.
    pub fn generate_path(&self, path: &Path) -> Result<Bindings, GenerateError> {
        let text = fs::read_to_string(path).map_err(|source| GenerateError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::debug!("read {} bytes of IDL from {}", text.len(), path.display());
        self.generate_str(&text)
    }
}

impl GeneratorBuilder {
    /// Prefix of native declarations (default: `WGPU`).
    pub fn with_native_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.naming.native_prefix = prefix.into();
        self
    }

    /// Prefix of host-visible names (default: `GPU`).
    pub fn with_external_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.naming.external_prefix = prefix.into();
        self
    }

    pub fn with_naming(mut self, naming: Naming) -> Self {
        self.options.naming = naming;
        self
    }

    /// Treat `name` as a host callback type in addition to the defaults.
    pub fn with_callback_type(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.options.callback_types.contains(&name) {
            self.options.callback_types.push(name);
        }
        self
    }

    /// Build the generator.
    pub fn build(self) -> Generator {
        Generator {
            options: self.options,
        }
    }
}

impl Bindings {
    /// Codec by external or declaration name.
    pub fn codec(&self, name: &str) -> Option<StructCodec<'_>> {
        self.codecs.codec(name)
    }

    /// The assembled tables as readable text.
    pub fn format_schema(&self) -> Result<String, GenerateError> {
        Ok(format_schema(&self.schema)?)
    }

    /// `DescriptorDecoder.h` / `DescriptorDecoder.cpp`.
    #[cfg(feature = "cpp")]
    pub fn render_cpp(&self) -> Result<descgen_cpp::CppSources, GenerateError> {
        Ok(descgen_cpp::render(&self.codecs)?)
    }
}
