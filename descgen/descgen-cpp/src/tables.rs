use std::fmt::{Result, Write as _};

use descgen_codec::NameTable;

pub(crate) fn declare_table(table: &NameTable, out: &mut String) -> Result {
    let name = &table.external_name;
    writeln!(out, "  extern std::unordered_map<std::string, uint32_t> {name};")?;
    writeln!(
        out,
        "  std::string {name}ToString({} value);",
        table.declaration_name
    )
}

/// Forward map as an initialized `unordered_map`, reverse map as a switch.
pub(crate) fn define_table(table: &NameTable, out: &mut String) -> Result {
    let name = &table.external_name;
    writeln!(out, "  std::unordered_map<std::string, uint32_t> {name} = {{")?;
    for (key, value) in table.iter() {
        writeln!(out, "    {{ \"{key}\", {value} }},")?;
    }
    writeln!(out, "  }};")?;
    writeln!(out)?;

    writeln!(
        out,
        "  std::string {name}ToString({} value) {{",
        table.declaration_name
    )?;
    writeln!(out, "    switch (static_cast<uint32_t>(value)) {{")?;
    for (value, key) in table.reverse() {
        writeln!(out, "      case {value}: return \"{key}\";")?;
    }
    writeln!(out, "    }}")?;
    writeln!(out, "    return \"\";")?;
    writeln!(out, "  }}")?;
    writeln!(out)
}
