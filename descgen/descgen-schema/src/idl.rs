//! Serde model of the JSON IDL.
//!
//! The document is a keyed collection of records. Only the record kinds the
//! generator understands are deserialized into [`RawRecord`]; everything
//! else stays an untyped [`serde_json::Value`] until the normalizer decides
//! to skip it.

use std::str::FromStr;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::SchemaError;

/// The keyed record collection, in file order.
#[derive(Debug, Clone, Default)]
pub struct IdlDocument {
    records: IndexMap<String, Value>,
}

impl IdlDocument {
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        let records = serde_json::from_value(value).map_err(|source| SchemaError::Parse { source })?;
        Ok(Self { records })
    }

    pub fn records(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromStr for IdlDocument {
    type Err = SchemaError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let records = serde_json::from_str(text).map_err(|source| SchemaError::Parse { source })?;
        Ok(Self { records })
    }
}

/// One enum, bitmask, object or structure record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    pub category: String,
    #[serde(default)]
    pub values: Vec<RawValue>,
    #[serde(default)]
    pub methods: Vec<RawMethod>,
    #[serde(default)]
    pub members: Vec<RawMember>,
    #[serde(default)]
    pub extensible: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawValue {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMethod {
    pub name: String,
    pub returns: Option<String>,
    #[serde(default)]
    pub args: Vec<RawMember>,
}

/// A structure member or method argument.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMember {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub annotation: Option<String>,
    /// Sibling member name, `"strlen"`, or a fixed count.
    pub length: Option<Value>,
    #[serde(default)]
    pub optional: bool,
    pub default: Option<Value>,
    #[serde(default, rename = "isInternalProperty")]
    pub is_internal_property: bool,
}

impl RawMember {
    /// A bare, unannotated member of type `ty`; used for method returns.
    pub fn of_type(name: &str, ty: &str) -> Self {
        Self {
            name: name.to_string(),
            ty: ty.to_string(),
            ..Self::default()
        }
    }
}
