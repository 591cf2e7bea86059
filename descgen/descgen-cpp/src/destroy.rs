use std::fmt::{Result, Write as _};

use descgen_codec::{CodecPlan, CodecSet, MarshalOp, MemberPlan};
use descgen_schema::Ownership;

use crate::decode::external_name;

pub(crate) fn declare_destroy(plan: &CodecPlan, out: &mut String) -> Result {
    writeln!(
        out,
        "  void Destroy{}({}& descriptor);",
        plan.external_name, plan.structure
    )
}

/// Release exactly the owning members of `plan`; value and borrowed
/// members are never touched.
pub(crate) fn define_destroy(set: &CodecSet, plan: &CodecPlan, out: &mut String) -> Result {
    writeln!(
        out,
        "  void Destroy{}({}& descriptor) {{",
        plan.external_name, plan.structure
    )?;
    for member in plan.owning_members() {
        destroy_member(set, member, out)?;
    }
    writeln!(out, "  }}")?;
    writeln!(out)
}

fn destroy_member(set: &CodecSet, member: &MemberPlan, out: &mut String) -> Result {
    let field = format!("descriptor.{}", member.name);
    let native = &member.native_type;
    let nested = match &member.op {
        MarshalOp::Struct { structure, .. } | MarshalOp::StructArray { structure, .. } => {
            Some(external_name(set, structure)?)
        }
        _ => None,
    };

    match (member.ownership, nested) {
        (Ownership::Embedded, Some(nested)) => writeln!(out, "    Destroy{nested}({field});"),
        (Ownership::Owned, Some(nested)) => {
            writeln!(out, "    if ({field} != nullptr) {{")?;
            writeln!(out, "      auto* element = const_cast<{native}*>({field});")?;
            writeln!(out, "      Destroy{nested}(*element);")?;
            writeln!(out, "      delete element;")?;
            writeln!(out, "      {field} = nullptr;")?;
            writeln!(out, "    }}")
        }
        (Ownership::ArrayOwned, nested) => {
            writeln!(out, "    if ({field} != nullptr) {{")?;
            match (nested, &member.length) {
                (Some(nested), Some(length)) => {
                    writeln!(out, "      auto* data = const_cast<{native}*>({field});")?;
                    writeln!(
                        out,
                        "      for (size_t i = 0; i < static_cast<size_t>(descriptor.{}); ++i) {{",
                        length.name
                    )?;
                    writeln!(out, "        Destroy{nested}(data[i]);")?;
                    writeln!(out, "      }}")?;
                    writeln!(out, "      delete[] data;")?;
                }
                _ => writeln!(out, "      delete[] {field};")?,
            }
            writeln!(out, "      {field} = nullptr;")?;
            writeln!(out, "    }}")
        }
        (Ownership::ArrayOfPointersOwned, Some(nested)) => {
            writeln!(out, "    if ({field} != nullptr) {{")?;
            writeln!(out, "      auto** data = const_cast<{native}**>({field});")?;
            if let Some(length) = &member.length {
                writeln!(
                    out,
                    "      for (size_t i = 0; i < static_cast<size_t>(descriptor.{}); ++i) {{",
                    length.name
                )?;
                writeln!(out, "        if (data[i] != nullptr) {{")?;
                writeln!(out, "          Destroy{nested}(*data[i]);")?;
                writeln!(out, "          delete data[i];")?;
                writeln!(out, "        }}")?;
                writeln!(out, "      }}")?;
            }
            writeln!(out, "      delete[] data;")?;
            writeln!(out, "      {field} = nullptr;")?;
            writeln!(out, "    }}")
        }
        (ownership, _) => {
            log::warn!(
                "member '{}' tagged {} has no release rule; nothing rendered",
                member.name,
                ownership.as_str()
            );
            Ok(())
        }
    }
}
