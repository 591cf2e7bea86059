use std::{
    collections::BTreeSet,
    fmt::{Error, Write as _},
};

use descgen_codec::{CodecPlan, CodecSet, MarshalOp};
use rayon::prelude::*;

use crate::{
    decode::{declare_decode, declare_internal, define_decode, define_fill, define_reset},
    destroy::{declare_destroy, define_destroy},
    tables::{declare_table, define_table},
};

pub const HEADER_FILE: &str = "DescriptorDecoder.h";
pub const SOURCE_FILE: &str = "DescriptorDecoder.cpp";
pub const NAMESPACE: &str = "DescriptorDecoder";

const HELPERS: &str = r#"  static bool Fail(GPUDevice* device, Napi::Env env, const std::string& message) {
    Napi::String type = Napi::String::New(env, "Type");
    device->throwCallbackError(type, Napi::String::New(env, message));
    return false;
  }

  static std::string Where(const std::string& root, const std::string& member) {
    return "'" + root + "'.'" + member + "'";
  }

  static bool IsPresent(const Napi::Object& obj, const char* name) {
    return obj.Has(name) && !obj.Get(name).IsUndefined();
  }

  static bool IsSet(const Napi::Object& obj, const char* name) {
    return IsPresent(obj, name) && !obj.Get(name).IsNull();
  }

  static char* CopyString(const Napi::String& value) {
    std::string text = value.Utf8Value();
    char* out = new char[text.size() + 1];
    memcpy(out, text.c_str(), text.size() + 1);
    return out;
  }
"#;

/// Rendered `DescriptorDecoder.h` and `DescriptorDecoder.cpp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CppSources {
    pub header: String,
    pub source: String,
}

impl CppSources {
    /// `(file name, contents)` pairs.
    pub fn files(&self) -> [(&'static str, &str); 2] {
        [(HEADER_FILE, self.header.as_str()), (SOURCE_FILE, self.source.as_str())]
    }
}

/// Render every name table and structure of `set`.
///
/// Structure bodies are rendered in parallel and concatenated in
/// declaration order, so the output is deterministic.
pub fn render(set: &CodecSet) -> Result<CppSources, Error> {
    let plans: Vec<&CodecPlan> = set.plans().collect();
    let bodies = plans
        .par_iter()
        .map(|plan| render_structure(set, plan))
        .collect::<Result<Vec<_>, Error>>()?;

    let header = render_header(set, &plans)?;

    let mut source = String::new();
    writeln!(source, "#include \"{HEADER_FILE}\"")?;
    writeln!(source)?;
    writeln!(source, "#include \"GPUDevice.h\"")?;
    for class in wrapper_classes(&plans) {
        writeln!(source, "#include \"{class}.h\"")?;
    }
    writeln!(source)?;
    writeln!(source, "#include <cstring>")?;
    writeln!(source)?;
    writeln!(source, "namespace {NAMESPACE} {{")?;
    writeln!(source)?;
    source.push_str(HELPERS);
    writeln!(source)?;
    for table in set.tables() {
        define_table(table, &mut source)?;
    }
    for plan in &plans {
        declare_internal(plan, &mut source)?;
    }
    writeln!(source)?;
    for body in &bodies {
        source.push_str(body);
    }
    writeln!(source, "}}")?;

    log::info!(
        "rendered {} name tables and {} decode/destroy pairs",
        set.tables().count(),
        plans.len()
    );
    Ok(CppSources { header, source })
}

fn render_header(set: &CodecSet, plans: &[&CodecPlan]) -> Result<String, Error> {
    let mut out = String::new();
    writeln!(out, "#ifndef __DESCRIPTOR_DECODER_H__")?;
    writeln!(out, "#define __DESCRIPTOR_DECODER_H__")?;
    writeln!(out)?;
    writeln!(out, "#include <napi.h>")?;
    writeln!(out, "#include <webgpu/webgpu.h>")?;
    writeln!(out)?;
    writeln!(out, "#include <optional>")?;
    writeln!(out, "#include <string>")?;
    writeln!(out, "#include <unordered_map>")?;
    writeln!(out)?;
    writeln!(out, "class GPUDevice;")?;
    writeln!(out)?;
    writeln!(out, "namespace {NAMESPACE} {{")?;
    writeln!(out)?;
    for table in set.tables() {
        declare_table(table, &mut out)?;
    }
    if set.tables().next().is_some() {
        writeln!(out)?;
    }
    for plan in plans {
        declare_decode(plan, &mut out)?;
        declare_destroy(plan, &mut out)?;
    }
    writeln!(out)?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(out, "#endif")?;
    Ok(out)
}

fn render_structure(set: &CodecSet, plan: &CodecPlan) -> Result<String, Error> {
    let mut out = String::new();
    define_reset(set, plan, &mut out)?;
    define_fill(set, plan, &mut out)?;
    define_decode(plan, &mut out)?;
    define_destroy(set, plan, &mut out)?;
    log::debug!("rendered {} ({} bytes)", plan.external_name, out.len());
    Ok(out)
}

/// Wrapper classes unwrapped anywhere, for the include list.
fn wrapper_classes<'a>(plans: &[&'a CodecPlan]) -> BTreeSet<&'a str> {
    plans
        .iter()
        .copied()
        .flat_map(|plan| &plan.members)
        .filter_map(|member| match &member.op {
            MarshalOp::UnwrapObject { class } | MarshalOp::UnwrapObjectArray { class } => {
                Some(class.as_str())
            }
            _ => None,
        })
        .collect()
}
