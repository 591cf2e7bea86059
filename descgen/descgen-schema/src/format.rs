use std::fmt::{Error, Result, Write as _};

use crate::{
    node::{EnumNode, Member, ObjectNode, SchemaNode, StructureNode},
    schema::Schema,
    types::TypeDescriptor,
};

/// Format the assembled tables in a readable style: one block per node in
/// input order, one line per member.
pub fn format_schema(schema: &Schema) -> std::result::Result<String, Error> {
    let mut out = String::new();
    for node in schema.nodes() {
        match node {
            SchemaNode::Enum(e) => format_value_set("enum", e, &mut out)?,
            SchemaNode::Bitmask(b) => format_value_set("bitmask", b, &mut out)?,
            SchemaNode::Object(o) => format_object(o, &mut out)?,
            SchemaNode::Structure(s) => format_structure(s, &mut out)?,
        }
    }
    Ok(out)
}

fn format_value_set(label: &str, node: &EnumNode, out: &mut String) -> Result {
    writeln!(out, "{label} {}:", node.header.external_name)?;
    writeln!(out, "    declaration: {}", node.header.declaration_name)?;
    writeln!(out, "    values:")?;
    for value in &node.values {
        writeln!(out, "        {}: {}", value.name, value.value)?;
    }
    Ok(())
}

fn format_object(node: &ObjectNode, out: &mut String) -> Result {
    writeln!(out, "object {}:", node.header.external_name)?;
    writeln!(out, "    declaration: {}", node.header.declaration_name)?;
    if node.methods.is_empty() {
        return Ok(());
    }
    writeln!(out, "    methods:")?;
    for method in &node.methods {
        writeln!(out, "        {}:", method.name)?;
        format_labeled_type("returns", &method.return_type, 12, out)?;
        if !method.args.is_empty() {
            writeln!(out, "            args:")?;
            for arg in &method.args {
                format_member(arg, 16, out)?;
            }
        }
    }
    Ok(())
}

fn format_structure(node: &StructureNode, out: &mut String) -> Result {
    writeln!(out, "structure {}:", node.header.external_name)?;
    writeln!(out, "    declaration: {}", node.header.declaration_name)?;
    writeln!(out, "    extensible: {}", node.extensible)?;
    writeln!(out, "    members:")?;
    for member in &node.members {
        format_member(member, 8, out)?;
    }
    Ok(())
}

fn format_member(member: &Member, indent: usize, out: &mut String) -> Result {
    let pad = " ".repeat(indent);
    let ty = &member.ty;
    write!(
        out,
        "{pad}{}: {{ type: {}, js: {}, {}",
        member.name,
        ty.raw_type,
        ty.js_type,
        if ty.is_optional() { "optional" } else { "required" }
    )?;
    if let Some(default) = member.default {
        write!(out, ", default: {default}")?;
    }
    if let Some(length) = &ty.length {
        write!(out, ", length: {length}")?;
    }
    if member.is_internal_property {
        write!(out, ", internal")?;
    }
    writeln!(out, ", ownership: {} }}", ty.ownership.as_str())
}

fn format_labeled_type(label: &str, ty: &TypeDescriptor, indent: usize, out: &mut String) -> Result {
    let pad = " ".repeat(indent);
    writeln!(out, "{pad}{label}: {{ type: {}, js: {} }}", ty.raw_type, ty.js_type)
}
