use descgen_codec::CodecSet;
use descgen_cpp::{CppSources, HEADER_FILE, SOURCE_FILE, render};
use descgen_schema::{IdlDocument, SchemaOptions, assemble};
use serde_json::{Value, json};

fn sources(idl: Value) -> CppSources {
    let doc = IdlDocument::from_value(idl).expect("idl");
    let schema = assemble(&doc, &SchemaOptions::default()).expect("schema");
    let set = CodecSet::build(&schema).expect("codecs");
    render(&set).expect("render")
}

fn tiny() -> Value {
    json!({
        "texture format": {
            "category": "enum",
            "values": [{ "name": "rgba8unorm", "value": 1 }]
        },
        "size descriptor": {
            "category": "structure",
            "members": [{ "name": "size", "type": "uint32_t" }]
        }
    })
}

fn descriptors() -> Value {
    json!({
        "texture format": {
            "category": "enum",
            "values": [
                { "name": "rgba8unorm", "value": 1 },
                { "name": "bgra8unorm", "value": 2 }
            ]
        },
        "buffer usage": {
            "category": "bitmask",
            "values": [{ "name": "map read", "value": 1 }]
        },
        "buffer": { "category": "object" },
        "texture view": { "category": "object" },
        "extent 3D": {
            "category": "structure",
            "members": [
                { "name": "width", "type": "uint32_t" },
                { "name": "height", "type": "uint32_t", "default": 1 }
            ]
        },
        "origin 3D": {
            "category": "structure",
            "members": [{ "name": "x", "type": "uint32_t", "default": 0 }]
        },
        "texture descriptor": {
            "category": "structure",
            "extensible": true,
            "members": [
                { "name": "label", "type": "char", "annotation": "const*", "length": "strlen", "optional": true },
                { "name": "usage", "type": "buffer usage" },
                { "name": "size", "type": "extent 3D" },
                { "name": "format", "type": "texture format" },
                { "name": "view format count", "type": "uint32_t", "default": 0 },
                { "name": "view formats", "type": "texture format", "annotation": "const*", "length": "view format count", "optional": true }
            ]
        },
        "bind group entry": {
            "category": "structure",
            "members": [
                { "name": "binding", "type": "uint32_t" },
                { "name": "buffer", "type": "buffer", "optional": true },
                { "name": "size", "type": "uint64_t" }
            ]
        },
        "bind group descriptor": {
            "category": "structure",
            "members": [
                { "name": "entry count", "type": "uint32_t" },
                { "name": "entries", "type": "bind group entry", "annotation": "const*", "length": "entry count" }
            ]
        },
        "color attachment": {
            "category": "structure",
            "members": [{ "name": "view", "type": "texture view" }]
        },
        "render pass descriptor": {
            "category": "structure",
            "members": [
                { "name": "color attachment count", "type": "uint32_t" },
                { "name": "color attachments", "type": "color attachment", "annotation": "const*const*", "length": "color attachment count" },
                { "name": "depth origin", "type": "origin 3D", "annotation": "const*", "optional": true }
            ]
        },
        "vertex state": {
            "category": "structure",
            "members": [
                { "name": "attribute count", "type": "uint32_t" },
                { "name": "attributes", "type": "float", "annotation": "const*", "length": "attribute count" }
            ]
        }
    })
}

/// Definition (not prototype) of the function starting with `signature`.
fn function<'a>(source: &'a str, signature: &str) -> &'a str {
    let start = source
        .match_indices(signature)
        .map(|(i, _)| i)
        .find(|&i| {
            let line = source[i..].lines().next().unwrap_or_default();
            line.ends_with('{')
        })
        .unwrap_or_else(|| panic!("'{signature}' not rendered"));
    let rest = &source[start..];
    let end = rest.find("\n  }\n").expect("function end");
    &rest[..end]
}

// ── layout ───────────────────────────────────────────────────────────────────

#[test]
fn header_declares_tables_and_pairs() {
    let cpp = sources(tiny());
    let expected = "\
#ifndef __DESCRIPTOR_DECODER_H__
#define __DESCRIPTOR_DECODER_H__

#include <napi.h>
#include <webgpu/webgpu.h>

#include <optional>
#include <string>
#include <unordered_map>

class GPUDevice;

namespace DescriptorDecoder {

  extern std::unordered_map<std::string, uint32_t> GPUTextureFormat;
  std::string GPUTextureFormatToString(WGPUTextureFormat value);

  std::optional<WGPUSizeDescriptor> DecodeGPUSizeDescriptor(GPUDevice* device, const Napi::Value& value);
  void DestroyGPUSizeDescriptor(WGPUSizeDescriptor& descriptor);

}

#endif
";
    assert_eq!(cpp.header, expected);
}

#[test]
fn name_table_renders_both_directions() {
    let cpp = sources(tiny());
    let expected = "  std::unordered_map<std::string, uint32_t> GPUTextureFormat = {
    { \"rgba8unorm\", 1 },
  };

  std::string GPUTextureFormatToString(WGPUTextureFormat value) {
    switch (static_cast<uint32_t>(value)) {
      case 1: return \"rgba8unorm\";
    }
    return \"\";
  }
";
    assert!(cpp.source.contains(expected), "{}", cpp.source);
}

#[test]
fn required_number_member_is_validated_then_converted() {
    let cpp = sources(tiny());
    let expected = "  static bool FillGPUSizeDescriptor(GPUDevice* device, const Napi::Object& obj, WGPUSizeDescriptor& descriptor, const std::string& root, const std::string& path) {
    Napi::Env env = obj.Env();
    {
      if (!IsPresent(obj, \"size\")) {
        return Fail(device, env, \"missing required member \" + Where(root, path + \"size\"));
      }
      Napi::Value value = obj.Get(\"size\");
      if (!value.IsNumber()) {
        return Fail(device, env, \"expected type 'Number' for \" + Where(root, path + \"size\"));
      }
      descriptor.size = static_cast<uint32_t>(value.As<Napi::Number>().Uint32Value());
    }
    return true;
  }
";
    assert!(cpp.source.contains(expected), "{}", cpp.source);
    assert!(cpp.source.contains("    descriptor.size = 0;\n"));
}

#[test]
fn every_structure_gets_a_decode_and_destroy() {
    let cpp = sources(descriptors());
    for name in [
        "GPUExtent3D",
        "GPUOrigin3D",
        "GPUTextureDescriptor",
        "GPUBindGroupEntry",
        "GPUBindGroupDescriptor",
        "GPUColorAttachment",
        "GPURenderPassDescriptor",
        "GPUVertexState",
    ] {
        assert!(cpp.header.contains(&format!(" Decode{name}(")), "{name}");
        assert!(cpp.header.contains(&format!("void Destroy{name}(")), "{name}");
        assert!(cpp.source.contains(&format!(" Decode{name}(GPUDevice* device")), "{name}");
        assert!(cpp.source.contains(&format!("  void Destroy{name}(")), "{name}");
    }
    assert!(!cpp.header.contains("DecodeGPUBuffer("), "objects have no decoder");
}

#[test]
fn only_extensible_structures_take_a_chain() {
    let cpp = sources(descriptors());
    assert!(cpp.header.contains(
        "DecodeGPUTextureDescriptor(GPUDevice* device, const Napi::Value& value, void* nextInChain = nullptr);"
    ));
    assert!(
        cpp.header
            .contains("DecodeGPUExtent3D(GPUDevice* device, const Napi::Value& value);")
    );
    let reset = function(&cpp.source, "static void ResetGPUTextureDescriptor(");
    assert!(reset.contains("descriptor.nextInChain = nullptr;"));
}

#[test]
fn wrapper_headers_are_included_once() {
    let cpp = sources(descriptors());
    assert_eq!(cpp.source.matches("#include \"GPUBuffer.h\"").count(), 1);
    assert!(cpp.source.contains("#include \"GPUTextureView.h\""));
    assert!(cpp.source.starts_with(&format!("#include \"{HEADER_FILE}\"")));
}

#[test]
fn files_pair_names_with_contents() {
    let cpp = sources(tiny());
    let files = cpp.files();
    assert_eq!(files[0].0, HEADER_FILE);
    assert_eq!(files[1].0, SOURCE_FILE);
    assert_eq!(files[1].1, cpp.source);
}

#[test]
fn rendering_is_deterministic() {
    assert_eq!(sources(descriptors()), sources(descriptors()));
}

// ── decode bodies ────────────────────────────────────────────────────────────

#[test]
fn decode_destroys_partial_output_on_failure() {
    let cpp = sources(descriptors());
    let decode = function(
        &cpp.source,
        "std::optional<WGPUTextureDescriptor> DecodeGPUTextureDescriptor(",
    );
    assert!(decode.contains("ResetGPUTextureDescriptor(descriptor);"));
    assert!(decode.contains(
        "descriptor.nextInChain = reinterpret_cast<const WGPUChainedStruct*>(nextInChain);"
    ));
    assert!(decode.contains(
        "if (!FillGPUTextureDescriptor(device, value.As<Napi::Object>(), descriptor, \"GPUTextureDescriptor\", \"\")) {\n      DestroyGPUTextureDescriptor(descriptor);\n      return std::nullopt;"
    ));
}

#[test]
fn arrays_are_attached_before_elements_are_decoded() {
    let cpp = sources(descriptors());
    let fill = function(&cpp.source, "static bool FillGPUBindGroupDescriptor(");
    let attach = fill
        .find("descriptor.entries = data;")
        .expect("array attached");
    let count = fill
        .find("descriptor.entryCount = static_cast<uint32_t>(length);")
        .expect("count written");
    let element = fill
        .find("FillGPUBindGroupEntry(device, item.As<Napi::Object>(), data[i], root, path + \"entries[\" + std::to_string(i) + \"].\")")
        .expect("element decoded");
    assert!(fill.contains("auto* data = new WGPUBindGroupEntry[length]();"));
    assert!(attach < element && count < element);
}

#[test]
fn optional_members_skip_null_and_undefined() {
    let cpp = sources(descriptors());
    let fill = function(&cpp.source, "static bool FillGPUTextureDescriptor(");
    assert!(fill.contains("if (IsSet(obj, \"label\")) {"));
    assert!(fill.contains("descriptor.label = CopyString(value.As<Napi::String>());"));
    assert!(fill.contains("if (IsSet(obj, \"viewFormats\")) {"));
    assert!(!fill.contains("\"viewFormatCount\""), "length members are not read");
}

#[test]
fn enums_are_looked_up_and_bitmasks_cast() {
    let cpp = sources(descriptors());
    let fill = function(&cpp.source, "static bool FillGPUTextureDescriptor(");
    assert!(fill.contains("auto found = GPUTextureFormat.find(value.As<Napi::String>().Utf8Value());"));
    assert!(fill.contains("\"unknown value of 'GPUTextureFormat' for \""));
    assert!(fill.contains("descriptor.format = static_cast<WGPUTextureFormat>(found->second);"));
    assert!(fill.contains(
        "descriptor.usage = static_cast<WGPUBufferUsage>(value.As<Napi::Number>().Uint32Value());"
    ));
    assert!(fill.contains("data[i] = static_cast<WGPUTextureFormat>(found->second);"));
}

#[test]
fn objects_are_unwrapped_after_an_instance_check() {
    let cpp = sources(descriptors());
    let fill = function(&cpp.source, "static bool FillGPUBindGroupEntry(");
    assert!(fill.contains(
        "if (!(value.IsObject() && value.As<Napi::Object>().InstanceOf(GPUBuffer::constructor.Value()))) {"
    ));
    assert!(fill.contains(
        "descriptor.buffer = Napi::ObjectWrap<GPUBuffer>::Unwrap(value.As<Napi::Object>())->instance;"
    ));
    assert!(fill.contains("Uint64Value(&lossless)"));
    assert!(fill.contains("if (!lossless) {"));
    assert!(fill.contains("expected type 'BigInt within uint64_t' for "));
}

#[test]
fn typed_arrays_bind_host_memory() {
    let cpp = sources(descriptors());
    let fill = function(&cpp.source, "static bool FillGPUVertexState(");
    assert!(fill.contains("TypedArrayType() == napi_float32_array"));
    assert!(fill.contains("descriptor.attributes = reinterpret_cast<const float*>(bytes);"));
    assert!(fill.contains(
        "descriptor.attributeCount = static_cast<uint32_t>(array.ElementLength());"
    ));
    assert!(!fill.contains("new "), "buffers are never copied");
}

// ── destroy bodies ───────────────────────────────────────────────────────────

#[test]
fn destroy_releases_exactly_the_owned_members() {
    let cpp = sources(descriptors());
    let destroy = function(
        &cpp.source,
        "void DestroyGPUTextureDescriptor(WGPUTextureDescriptor& descriptor) {",
    );
    assert!(destroy.contains("delete[] descriptor.label;"));
    assert!(destroy.contains("DestroyGPUExtent3D(descriptor.size);"));
    assert!(destroy.contains("delete[] descriptor.viewFormats;"));
    assert!(!destroy.contains("descriptor.format"));
    assert!(!destroy.contains("descriptor.usage"));

    let entry = function(
        &cpp.source,
        "void DestroyGPUBindGroupEntry(WGPUBindGroupEntry& descriptor) {",
    );
    assert!(!entry.contains("delete"), "borrowed handles are not released");
}

#[test]
fn destroy_walks_struct_arrays_and_pointer_arrays() {
    let cpp = sources(descriptors());
    let group = function(
        &cpp.source,
        "void DestroyGPUBindGroupDescriptor(WGPUBindGroupDescriptor& descriptor) {",
    );
    assert!(group.contains("auto* data = const_cast<WGPUBindGroupEntry*>(descriptor.entries);"));
    assert!(group.contains("DestroyGPUBindGroupEntry(data[i]);"));
    assert!(group.contains("delete[] data;"));

    let pass = function(
        &cpp.source,
        "void DestroyGPURenderPassDescriptor(WGPURenderPassDescriptor& descriptor) {",
    );
    assert!(pass.contains("auto** data = const_cast<WGPUColorAttachment**>(descriptor.colorAttachments);"));
    assert!(pass.contains("i < static_cast<size_t>(descriptor.colorAttachmentCount)"));
    assert!(pass.contains("delete data[i];"));
    assert!(pass.contains("auto* element = const_cast<WGPUOrigin3D*>(descriptor.depthOrigin);"));
    assert!(pass.contains("delete element;"));
    assert_eq!(pass.matches("delete[]").count(), 1);
}
