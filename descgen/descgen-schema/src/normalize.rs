//! Schema normalizer: keyed records -> ordered record stubs.

use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::SchemaError,
    idl::{IdlDocument, RawRecord},
};

/// Node categories the generator produces code for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Enum,
    Bitmask,
    Object,
    Structure,
}

impl Category {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "enum" => Some(Self::Enum),
            "bitmask" => Some(Self::Bitmask),
            "object" => Some(Self::Object),
            "structure" => Some(Self::Structure),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enum => "enum",
            Self::Bitmask => "bitmask",
            Self::Object => "object",
            Self::Structure => "structure",
        }
    }
}

/// A record that survived normalization, not yet resolved.
#[derive(Debug, Clone)]
pub struct RecordStub {
    pub text_name: String,
    pub category: Category,
    pub record: RawRecord,
}

#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// Input order is preserved.
    pub stubs: Vec<RecordStub>,
    /// Text names of records with category `callback`.
    pub callbacks: Vec<String>,
    /// Number of records set aside (meta keys excluded).
    pub skipped: usize,
}

/// Drop meta keys (`_comment` and any other `_`-prefixed key) and set aside
/// records outside the four node categories.
pub fn normalize(doc: &IdlDocument) -> Result<Normalized, SchemaError> {
    let mut out = Normalized::default();

    for (name, value) in doc.records() {
        if name.starts_with('_') {
            continue;
        }

        let category_name = value.get("category").and_then(Value::as_str).unwrap_or("");
        let Some(category) = Category::parse(category_name) else {
            if category_name == "callback" {
                out.callbacks.push(name.to_string());
            }
            log::debug!("skipping record '{name}' of category '{category_name}'");
            out.skipped += 1;
            continue;
        };

        let record = RawRecord::deserialize(value).map_err(|source| SchemaError::Record {
            name: name.to_string(),
            source,
        })?;
        out.stubs.push(RecordStub {
            text_name: name.to_string(),
            category,
            record,
        });
    }

    Ok(out)
}
