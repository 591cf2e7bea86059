//! Assembled schema nodes.

use std::fmt;

use crate::{normalize::Category, types::TypeDescriptor};

/// Resolved member default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Bool(bool),
    Integer(i128),
    Float(f64),
}

/// Renders as a C literal.
impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeHeader {
    pub text_name: String,
    pub declaration_name: String,
    pub external_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    /// Host-visible name: as written for enums, upper snake case for bitmasks.
    pub name: String,
    pub text_name: String,
    pub value: u32,
}

/// Enum or bitmask node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumNode {
    pub header: NodeHeader,
    pub values: Vec<EnumValue>,
}

impl EnumNode {
    /// Look a value up by its host name or by its IDL spelling.
    pub fn value_of(&self, name: &str) -> Option<u32> {
        self.values
            .iter()
            .find(|v| v.name == name || v.text_name == name)
            .map(|v| v.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: String,
    pub ty: TypeDescriptor,
    pub default: Option<DefaultValue>,
    /// Internal properties are reset but never marshaled.
    pub is_internal_property: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub return_type: TypeDescriptor,
    pub args: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectNode {
    pub header: NodeHeader,
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureNode {
    pub header: NodeHeader,
    /// Extensible structures carry a `nextInChain` pointer.
    pub extensible: bool,
    pub members: Vec<Member>,
}

impl StructureNode {
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    /// True when `name` is the length member of some array member.
    pub fn is_length_member(&self, name: &str) -> bool {
        self.members
            .iter()
            .any(|m| m.ty.is_array && m.ty.length.as_deref() == Some(name))
    }
}

/// Closed set of node categories.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Enum(EnumNode),
    Bitmask(EnumNode),
    Object(ObjectNode),
    Structure(StructureNode),
}

impl SchemaNode {
    pub fn header(&self) -> &NodeHeader {
        match self {
            Self::Enum(node) | Self::Bitmask(node) => &node.header,
            Self::Object(node) => &node.header,
            Self::Structure(node) => &node.header,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Self::Enum(_) => Category::Enum,
            Self::Bitmask(_) => Category::Bitmask,
            Self::Object(_) => Category::Object,
            Self::Structure(_) => Category::Structure,
        }
    }
}
