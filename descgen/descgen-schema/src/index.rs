//! Name -> node index, built once per schema.

use std::collections::HashMap;

use crate::{
    error::SchemaError,
    naming::Naming,
    normalize::{Category, RecordStub},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Position in the normalized node list.
    pub position: usize,
    pub category: Category,
    pub declaration_name: String,
    pub external_name: String,
}

/// O(1) lookup by text name and by declaration name.
#[derive(Debug, Clone, Default)]
pub struct NodeIndex {
    by_text_name: HashMap<String, IndexEntry>,
    by_declaration_name: HashMap<String, String>,
}

impl NodeIndex {
    pub fn build(stubs: &[RecordStub], naming: &Naming) -> Result<Self, SchemaError> {
        let mut index = Self::default();
        for (position, stub) in stubs.iter().enumerate() {
            let declaration_name = naming.declaration_name(&stub.text_name);
            if let Some(first) = index.by_declaration_name.get(&declaration_name) {
                return Err(SchemaError::DuplicateName {
                    declaration_name,
                    first: first.clone(),
                    second: stub.text_name.clone(),
                });
            }
            index
                .by_declaration_name
                .insert(declaration_name.clone(), stub.text_name.clone());
            index.by_text_name.insert(
                stub.text_name.clone(),
                IndexEntry {
                    position,
                    category: stub.category,
                    declaration_name,
                    external_name: naming.external_name(&stub.text_name),
                },
            );
        }
        Ok(index)
    }

    pub fn get(&self, text_name: &str) -> Option<&IndexEntry> {
        self.by_text_name.get(text_name)
    }

    pub fn by_declaration_name(&self, declaration_name: &str) -> Option<&IndexEntry> {
        self.by_declaration_name
            .get(declaration_name)
            .and_then(|text_name| self.by_text_name.get(text_name))
    }

    pub fn len(&self) -> usize {
        self.by_text_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_text_name.is_empty()
    }
}
