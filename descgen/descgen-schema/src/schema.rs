//! The assembled, immutable schema.

use crate::{
    index::NodeIndex,
    naming::Naming,
    node::{EnumNode, ObjectNode, SchemaNode, StructureNode},
};

/// Four declaration tables over one ordered node list.
#[derive(Debug, Clone)]
pub struct Schema {
    naming: Naming,
    nodes: Vec<SchemaNode>,
    index: NodeIndex,
}

impl Schema {
    pub(crate) fn new(naming: Naming, nodes: Vec<SchemaNode>, index: NodeIndex) -> Self {
        Self {
            naming,
            nodes,
            index,
        }
    }

    pub fn naming(&self) -> &Naming {
        &self.naming
    }

    /// All nodes in input order.
    pub fn nodes(&self) -> &[SchemaNode] {
        &self.nodes
    }

    pub fn index(&self) -> &NodeIndex {
        &self.index
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumNode> {
        self.nodes.iter().filter_map(|node| match node {
            SchemaNode::Enum(e) => Some(e),
            _ => None,
        })
    }

    pub fn bitmasks(&self) -> impl Iterator<Item = &EnumNode> {
        self.nodes.iter().filter_map(|node| match node {
            SchemaNode::Bitmask(b) => Some(b),
            _ => None,
        })
    }

    pub fn objects(&self) -> impl Iterator<Item = &ObjectNode> {
        self.nodes.iter().filter_map(|node| match node {
            SchemaNode::Object(o) => Some(o),
            _ => None,
        })
    }

    pub fn structures(&self) -> impl Iterator<Item = &StructureNode> {
        self.nodes.iter().filter_map(|node| match node {
            SchemaNode::Structure(s) => Some(s),
            _ => None,
        })
    }

    /// Lookup by IDL text name.
    pub fn node(&self, text_name: &str) -> Option<&SchemaNode> {
        let entry = self.index.get(text_name)?;
        self.nodes.get(entry.position)
    }

    /// Lookup by declaration name (`WGPUTextureFormat`).
    pub fn by_declaration_name(&self, declaration_name: &str) -> Option<&SchemaNode> {
        let entry = self.index.by_declaration_name(declaration_name)?;
        self.nodes.get(entry.position)
    }

    pub fn structure(&self, declaration_name: &str) -> Option<&StructureNode> {
        match self.by_declaration_name(declaration_name)? {
            SchemaNode::Structure(s) => Some(s),
            _ => None,
        }
    }

    /// Enum or bitmask by declaration name.
    pub fn value_set(&self, declaration_name: &str) -> Option<&EnumNode> {
        match self.by_declaration_name(declaration_name)? {
            SchemaNode::Enum(e) | SchemaNode::Bitmask(e) => Some(e),
            _ => None,
        }
    }
}
