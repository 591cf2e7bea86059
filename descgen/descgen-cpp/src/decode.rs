//! `Reset`, `Fill` and `Decode` functions of one structure.
//!
//! `Fill<Name>` writes straight into a reset structure. Every heap block is
//! stored into its field (and the length field written) before elements are
//! decoded, so when a fill returns `false` the caller can always hand the
//! partial structure to `Destroy<Name>`.

use std::fmt::{Error, Result, Write as _};

use descgen_codec::{CodecPlan, CodecSet, FieldInit, Guard, MarshalOp, MemberPlan};
use descgen_core::TypedArrayKind;
use descgen_schema::{DefaultValue, NumberType};

const MEMBER_PAD: &str = "      ";
const ELEMENT_PAD: &str = "        ";

pub(crate) fn declare_decode(plan: &CodecPlan, out: &mut String) -> Result {
    writeln!(
        out,
        "  std::optional<{}> Decode{}({});",
        plan.structure,
        plan.external_name,
        parameters(plan, true)
    )
}

/// Static prototypes, so structures may refer to each other in any order.
pub(crate) fn declare_internal(plan: &CodecPlan, out: &mut String) -> Result {
    let (ext, native) = (&plan.external_name, &plan.structure);
    writeln!(out, "  static void Reset{ext}({native}& descriptor);")?;
    writeln!(
        out,
        "  static bool Fill{ext}(GPUDevice* device, const Napi::Object& obj, {native}& descriptor, const std::string& root, const std::string& path);"
    )
}

pub(crate) fn define_reset(set: &CodecSet, plan: &CodecPlan, out: &mut String) -> Result {
    writeln!(
        out,
        "  static void Reset{}({}& descriptor) {{",
        plan.external_name, plan.structure
    )?;
    if plan.extensible {
        writeln!(out, "    descriptor.nextInChain = nullptr;")?;
    }
    for field in &plan.fields {
        let name = &field.name;
        match &field.init {
            FieldInit::Null => writeln!(out, "    descriptor.{name} = nullptr;")?,
            FieldInit::Bool(b) => writeln!(out, "    descriptor.{name} = {b};")?,
            FieldInit::Number { ty, value } => {
                writeln!(out, "    descriptor.{name} = {};", number_literal(*ty, *value))?
            }
            FieldInit::Enum(v) | FieldInit::Bitmask(v) => writeln!(
                out,
                "    descriptor.{name} = static_cast<{}>({v});",
                field.native_type
            )?,
            FieldInit::Embedded(structure) => writeln!(
                out,
                "    Reset{}(descriptor.{name});",
                external_name(set, structure)?
            )?,
        }
    }
    writeln!(out, "  }}")?;
    writeln!(out)
}

pub(crate) fn define_fill(set: &CodecSet, plan: &CodecPlan, out: &mut String) -> Result {
    writeln!(
        out,
        "  static bool Fill{}(GPUDevice* device, const Napi::Object& obj, {}& descriptor, const std::string& root, const std::string& path) {{",
        plan.external_name, plan.structure
    )?;
    if !plan.members.is_empty() {
        writeln!(out, "    Napi::Env env = obj.Env();")?;
    }
    for member in &plan.members {
        fill_member(set, plan, member, out)?;
    }
    writeln!(out, "    return true;")?;
    writeln!(out, "  }}")?;
    writeln!(out)
}

pub(crate) fn define_decode(plan: &CodecPlan, out: &mut String) -> Result {
    let (ext, native) = (&plan.external_name, &plan.structure);
    writeln!(
        out,
        "  std::optional<{native}> Decode{ext}({}) {{",
        parameters(plan, false)
    )?;
    writeln!(out, "    {native} descriptor;")?;
    writeln!(out, "    Reset{ext}(descriptor);")?;
    if plan.extensible {
        writeln!(
            out,
            "    descriptor.nextInChain = reinterpret_cast<const WGPUChainedStruct*>(nextInChain);"
        )?;
    }
    writeln!(out, "    if (!value.IsObject()) {{")?;
    writeln!(
        out,
        "      Fail(device, value.Env(), \"expected an object for '{ext}'\");"
    )?;
    writeln!(out, "      return std::nullopt;")?;
    writeln!(out, "    }}")?;
    writeln!(
        out,
        "    if (!Fill{ext}(device, value.As<Napi::Object>(), descriptor, \"{ext}\", \"\")) {{"
    )?;
    writeln!(out, "      Destroy{ext}(descriptor);")?;
    writeln!(out, "      return std::nullopt;")?;
    writeln!(out, "    }}")?;
    writeln!(out, "    return descriptor;")?;
    writeln!(out, "  }}")?;
    writeln!(out)
}

fn parameters(plan: &CodecPlan, header: bool) -> String {
    let mut params = String::from("GPUDevice* device, const Napi::Value& value");
    if plan.extensible {
        params.push_str(if header {
            ", void* nextInChain = nullptr"
        } else {
            ", void* nextInChain"
        });
    }
    params
}

fn fill_member(set: &CodecSet, plan: &CodecPlan, member: &MemberPlan, out: &mut String) -> Result {
    let name = &member.name;
    let location = format!("Where(root, path + \"{name}\")");
    match member.guard {
        Guard::Required => {
            writeln!(out, "    {{")?;
            writeln!(out, "      if (!IsPresent(obj, \"{name}\")) {{")?;
            writeln!(
                out,
                "        return Fail(device, env, \"missing required member \" + {location});"
            )?;
            writeln!(out, "      }}")?;
        }
        Guard::Optional => writeln!(out, "    if (IsSet(obj, \"{name}\")) {{")?,
    }
    writeln!(out, "{MEMBER_PAD}Napi::Value value = obj.Get(\"{name}\");")?;

    let pad = MEMBER_PAD;
    let target = format!("descriptor.{name}");
    let element_location = format!("Where(root, path + \"{name}[\" + std::to_string(i) + \"]\")");
    match &member.op {
        MarshalOp::UnwrapObject { class } => {
            unwrap_object(out, pad, class, "value", &target, &location)?;
        }
        MarshalOp::UnwrapObjectArray { class } => {
            open_array(plan, member, &member.native_type, &location, out)?;
            unwrap_object(out, ELEMENT_PAD, class, "item", "data[i]", &element_location)?;
            close_array(out)?;
        }
        MarshalOp::Struct {
            structure,
            reference,
        } => {
            let nested = external_name(set, structure)?;
            require(out, pad, "value.IsObject()", nested, &location)?;
            let prefix = format!("path + \"{name}.\"");
            if *reference {
                writeln!(out, "{pad}auto* element = new {structure}{{}};")?;
                writeln!(out, "{pad}{target} = element;")?;
                writeln!(out, "{pad}Reset{nested}(*element);")?;
                fill_nested(out, pad, nested, "value", "*element", &prefix)?;
            } else {
                fill_nested(out, pad, nested, "value", &target, &prefix)?;
            }
        }
        MarshalOp::StructArray {
            structure,
            of_pointers,
        } => {
            let nested = external_name(set, structure)?;
            let element_type = if *of_pointers {
                format!("{structure}*")
            } else {
                structure.clone()
            };
            open_array(plan, member, &element_type, &location, out)?;
            let pad = ELEMENT_PAD;
            require(out, pad, "item.IsObject()", nested, &element_location)?;
            let prefix = format!("path + \"{name}[\" + std::to_string(i) + \"].\"");
            if *of_pointers {
                writeln!(out, "{pad}auto* element = new {structure}{{}};")?;
                writeln!(out, "{pad}data[i] = element;")?;
                writeln!(out, "{pad}Reset{nested}(*element);")?;
                fill_nested(out, pad, nested, "item", "*element", &prefix)?;
            } else {
                writeln!(out, "{pad}Reset{nested}(data[i]);")?;
                fill_nested(out, pad, nested, "item", "data[i]", &prefix)?;
            }
            close_array(out)?;
        }
        MarshalOp::Number(ty) => {
            number(out, pad, *ty, &member.native_type, "value", &target, &location)?;
        }
        MarshalOp::Boolean => {
            require(out, pad, "value.IsBoolean()", "Boolean", &location)?;
            writeln!(out, "{pad}{target} = value.As<Napi::Boolean>().Value();")?;
        }
        MarshalOp::Enum { enumeration } => {
            let native = &member.native_type;
            enum_value(set, out, pad, enumeration, native, "value", &target, &location)?;
        }
        MarshalOp::EnumArray { enumeration } => {
            let native = &member.native_type;
            open_array(plan, member, native, &location, out)?;
            let (source, element) = ("item", "data[i]");
            enum_value(set, out, ELEMENT_PAD, enumeration, native, source, element, &element_location)?;
            close_array(out)?;
        }
        MarshalOp::Bitmask => {
            bitmask(out, pad, &member.native_type, "value", &target, &location)?;
        }
        MarshalOp::BitmaskArray => {
            open_array(plan, member, &member.native_type, &location, out)?;
            bitmask(out, ELEMENT_PAD, &member.native_type, "item", "data[i]", &element_location)?;
            close_array(out)?;
        }
        MarshalOp::DynamicString => {
            require(out, pad, "value.IsString()", "String", &location)?;
            writeln!(out, "{pad}{target} = CopyString(value.As<Napi::String>());")?;
        }
        MarshalOp::Buffer { kind } => buffer(plan, member, *kind, &location, out)?,
    }
    writeln!(out, "    }}")
}

/// Allocate a value-initialized array, attach it and write its length,
/// then open the element loop.
fn open_array(
    plan: &CodecPlan,
    member: &MemberPlan,
    element_type: &str,
    location: &str,
    out: &mut String,
) -> Result {
    let pad = MEMBER_PAD;
    require(out, pad, "value.IsArray()", "Array", location)?;
    writeln!(out, "{pad}Napi::Array array = value.As<Napi::Array>();")?;
    writeln!(out, "{pad}uint32_t length = array.Length();")?;
    writeln!(out, "{pad}auto* data = new {element_type}[length]();")?;
    writeln!(out, "{pad}descriptor.{} = data;", member.name)?;
    write_length(plan, member, "length", out)?;
    writeln!(out, "{pad}for (uint32_t i = 0; i < length; ++i) {{")?;
    writeln!(out, "{pad}  Napi::Value item = array.Get(i);")
}

fn close_array(out: &mut String) -> Result {
    writeln!(out, "{MEMBER_PAD}}}")
}

fn write_length(plan: &CodecPlan, member: &MemberPlan, count: &str, out: &mut String) -> Result {
    let Some(length) = &member.length else {
        return Ok(());
    };
    let native = plan
        .fields
        .iter()
        .find(|f| f.name == length.name)
        .map_or("uint32_t", |f| f.native_type.as_str());
    writeln!(
        out,
        "{MEMBER_PAD}descriptor.{} = static_cast<{native}>({count});",
        length.name
    )
}

fn require(out: &mut String, pad: &str, check: &str, expected: &str, location: &str) -> Result {
    let negated = if check.contains(' ') {
        format!("!({check})")
    } else {
        format!("!{check}")
    };
    writeln!(out, "{pad}if ({negated}) {{")?;
    writeln!(
        out,
        "{pad}  return Fail(device, env, \"expected type '{expected}' for \" + {location});"
    )?;
    writeln!(out, "{pad}}}")
}

fn fill_nested(
    out: &mut String,
    pad: &str,
    nested: &str,
    source: &str,
    target: &str,
    prefix: &str,
) -> Result {
    writeln!(
        out,
        "{pad}if (!Fill{nested}(device, {source}.As<Napi::Object>(), {target}, root, {prefix})) {{"
    )?;
    writeln!(out, "{pad}  return false;")?;
    writeln!(out, "{pad}}}")
}

fn unwrap_object(
    out: &mut String,
    pad: &str,
    class: &str,
    source: &str,
    target: &str,
    location: &str,
) -> Result {
    let check = format!(
        "{source}.IsObject() && {source}.As<Napi::Object>().InstanceOf({class}::constructor.Value())"
    );
    require(out, pad, &check, class, location)?;
    writeln!(
        out,
        "{pad}{target} = Napi::ObjectWrap<{class}>::Unwrap({source}.As<Napi::Object>())->instance;"
    )
}

#[allow(clippy::too_many_arguments)]
fn enum_value(
    set: &CodecSet,
    out: &mut String,
    pad: &str,
    enumeration: &str,
    native: &str,
    source: &str,
    target: &str,
    location: &str,
) -> Result {
    let map = set
        .table(enumeration)
        .map(|t| t.external_name.as_str())
        .ok_or_else(|| {
            log::error!("no name table for enum '{enumeration}'");
            Error
        })?;
    require(out, pad, &format!("{source}.IsString()"), "String", location)?;
    writeln!(
        out,
        "{pad}auto found = {map}.find({source}.As<Napi::String>().Utf8Value());"
    )?;
    writeln!(out, "{pad}if (found == {map}.end()) {{")?;
    writeln!(
        out,
        "{pad}  return Fail(device, env, \"unknown value of '{map}' for \" + {location});"
    )?;
    writeln!(out, "{pad}}}")?;
    writeln!(out, "{pad}{target} = static_cast<{native}>(found->second);")
}

fn bitmask(
    out: &mut String,
    pad: &str,
    native: &str,
    source: &str,
    target: &str,
    location: &str,
) -> Result {
    require(out, pad, &format!("{source}.IsNumber()"), "Number", location)?;
    writeln!(
        out,
        "{pad}{target} = static_cast<{native}>({source}.As<Napi::Number>().Uint32Value());"
    )
}

fn number(
    out: &mut String,
    pad: &str,
    ty: NumberType,
    native: &str,
    source: &str,
    target: &str,
    location: &str,
) -> Result {
    if ty.is_wide() {
        let getter = if ty == NumberType::I64 {
            "Int64Value"
        } else {
            "Uint64Value"
        };
        writeln!(out, "{pad}if ({source}.IsBigInt()) {{")?;
        writeln!(out, "{pad}  bool lossless;")?;
        writeln!(
            out,
            "{pad}  {target} = {source}.As<Napi::BigInt>().{getter}(&lossless);"
        )?;
        writeln!(out, "{pad}  if (!lossless) {{")?;
        writeln!(
            out,
            "{pad}    return Fail(device, env, \"expected type 'BigInt within {native}' for \" + {location});"
        )?;
        writeln!(out, "{pad}  }}")?;
        writeln!(out, "{pad}}} else if ({source}.IsNumber()) {{")?;
        writeln!(
            out,
            "{pad}  {target} = static_cast<{native}>({source}.As<Napi::Number>().DoubleValue());"
        )?;
        writeln!(out, "{pad}}} else {{")?;
        writeln!(
            out,
            "{pad}  return Fail(device, env, \"expected type 'BigInt' for \" + {location});"
        )?;
        return writeln!(out, "{pad}}}");
    }

    let getter = match ty {
        NumberType::F32 => "FloatValue",
        NumberType::F64 => "DoubleValue",
        NumberType::I8 | NumberType::I16 | NumberType::I32 => "Int32Value",
        _ => "Uint32Value",
    };
    require(out, pad, &format!("{source}.IsNumber()"), "Number", location)?;
    writeln!(
        out,
        "{pad}{target} = static_cast<{native}>({source}.As<Napi::Number>().{getter}());"
    )
}

/// Zero-copy binding of host memory plus its element or byte count.
fn buffer(
    plan: &CodecPlan,
    member: &MemberPlan,
    kind: Option<TypedArrayKind>,
    location: &str,
    out: &mut String,
) -> Result {
    let pad = MEMBER_PAD;
    let name = &member.name;
    match kind {
        Some(kind) => {
            let check = format!(
                "value.IsTypedArray() && value.As<Napi::TypedArray>().TypedArrayType() == {}",
                napi_array_type(kind)
            );
            require(out, pad, &check, kind.class_name(), location)?;
            writeln!(out, "{pad}Napi::TypedArray array = value.As<Napi::TypedArray>();")?;
            writeln!(
                out,
                "{pad}uint8_t* bytes = static_cast<uint8_t*>(array.ArrayBuffer().Data()) + array.ByteOffset();"
            )?;
            writeln!(
                out,
                "{pad}descriptor.{name} = reinterpret_cast<const {}*>(bytes);",
                member.native_type
            )?;
            write_length(plan, member, "array.ElementLength()", out)
        }
        None => {
            require(out, pad, "value.IsArrayBuffer()", "ArrayBuffer", location)?;
            writeln!(out, "{pad}Napi::ArrayBuffer buffer = value.As<Napi::ArrayBuffer>();")?;
            writeln!(out, "{pad}descriptor.{name} = buffer.Data();")?;
            write_length(plan, member, "buffer.ByteLength()", out)
        }
    }
}

fn napi_array_type(kind: TypedArrayKind) -> &'static str {
    match kind {
        TypedArrayKind::Int8 => "napi_int8_array",
        TypedArrayKind::Uint8 => "napi_uint8_array",
        TypedArrayKind::Int16 => "napi_int16_array",
        TypedArrayKind::Uint16 => "napi_uint16_array",
        TypedArrayKind::Int32 => "napi_int32_array",
        TypedArrayKind::Uint32 => "napi_uint32_array",
        TypedArrayKind::Float32 => "napi_float32_array",
        TypedArrayKind::Float64 => "napi_float64_array",
        TypedArrayKind::BigInt64 => "napi_bigint64_array",
        TypedArrayKind::BigUint64 => "napi_biguint64_array",
    }
}

fn number_literal(ty: NumberType, value: DefaultValue) -> String {
    match (ty, value) {
        (NumberType::F32, DefaultValue::Float(v)) => format!("{v:?}f"),
        (NumberType::F32, DefaultValue::Integer(v)) => format!("{v}.0f"),
        (NumberType::F64, DefaultValue::Integer(v)) => format!("{v}.0"),
        (NumberType::U64, DefaultValue::Integer(v)) => format!("{v}ull"),
        (NumberType::I64, DefaultValue::Integer(v)) => format!("{v}ll"),
        (_, value) => value.to_string(),
    }
}

/// External name of a structure, by declaration name.
pub(crate) fn external_name<'a>(set: &'a CodecSet, structure: &str) -> std::result::Result<&'a str, Error> {
    set.plan(structure)
        .map(|p| p.external_name.as_str())
        .ok_or_else(|| {
            log::error!("no plan for structure '{structure}'");
            Error
        })
}
