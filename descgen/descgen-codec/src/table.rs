use std::collections::BTreeMap;

use descgen_schema::EnumNode;
use indexmap::IndexMap;

/// Bidirectional name <-> value table of one enum or bitmask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTable {
    pub external_name: String,
    pub declaration_name: String,
    by_name: IndexMap<String, u32>,
    by_value: BTreeMap<u32, String>,
}

impl NameTable {
    pub fn from_node(node: &EnumNode) -> Self {
        let mut by_name = IndexMap::with_capacity(node.values.len());
        let mut by_value = BTreeMap::new();
        for value in &node.values {
            by_name.insert(value.name.clone(), value.value);
            // aliases: the first name declared for a value wins
            by_value.entry(value.value).or_insert_with(|| value.name.clone());
        }
        Self {
            external_name: node.header.external_name.clone(),
            declaration_name: node.header.declaration_name.clone(),
            by_name,
            by_value,
        }
    }

    pub fn value(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, value: u32) -> Option<&str> {
        self.by_value.get(&value).map(String::as_str)
    }

    /// Entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.by_name.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// One entry per distinct value, ascending, named by its first alias.
    pub fn reverse(&self) -> impl Iterator<Item = (u32, &str)> {
        self.by_value.iter().map(|(v, k)| (*v, k.as_str()))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
