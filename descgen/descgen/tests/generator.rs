use std::path::Path;

use descgen::{GenerateError, Generator, core::DeviceContext, core::HostValue, schema::SchemaError};
use serde_json::{Value, json};

fn idl() -> Value {
    json!({
        "texture format": {
            "category": "enum",
            "values": [
                { "name": "rgba8unorm", "value": 1 },
                { "name": "bgra8unorm", "value": 2 }
            ]
        },
        "extent 3D": {
            "category": "structure",
            "members": [
                { "name": "width", "type": "uint32_t" },
                { "name": "height", "type": "uint32_t", "default": 1 }
            ]
        },
        "texture descriptor": {
            "category": "structure",
            "extensible": true,
            "members": [
                { "name": "label", "type": "char", "annotation": "const*", "length": "strlen", "optional": true },
                { "name": "size", "type": "extent 3D" },
                { "name": "format", "type": "texture format" }
            ]
        }
    })
}

// ── naming ───────────────────────────────────────────────────────────────────

#[test]
fn default_prefixes_name_declarations_and_external_classes() {
    let bindings = Generator::new()
        .generate_str(&idl().to_string())
        .expect("generate");
    let codec = bindings.codec("GPUTextureDescriptor").expect("codec");
    assert_eq!(codec.plan().structure, "WGPUTextureDescriptor");
    assert!(bindings.codec("WGPUExtent3D").is_some());
}

#[test]
fn builder_prefixes_replace_the_defaults() {
    let generator = Generator::builder()
        .with_native_prefix("Dawn")
        .with_external_prefix("Js")
        .build();
    assert_eq!(generator.options().naming.native_prefix, "Dawn");

    let bindings = generator.generate_str(&idl().to_string()).expect("generate");
    let codec = bindings.codec("JsTextureDescriptor").expect("codec");
    assert_eq!(codec.plan().structure, "DawnTextureDescriptor");
    assert!(bindings.codec("GPUTextureDescriptor").is_none());
}

#[test]
fn callback_types_are_not_duplicated() {
    let generator = Generator::builder()
        .with_callback_type("error callback")
        .with_callback_type("error callback")
        .build();
    let count = generator
        .options()
        .callback_types
        .iter()
        .filter(|name| *name == "error callback")
        .count();
    assert_eq!(count, 1);
}

// ── errors ───────────────────────────────────────────────────────────────────

#[test]
fn malformed_text_is_a_parse_error() {
    let err = Generator::new()
        .generate_str("[1, 2")
        .expect_err("not JSON");
    assert!(matches!(
        err,
        GenerateError::Schema(SchemaError::Parse { .. })
    ));
}

#[test]
fn unknown_member_type_is_unresolved() {
    let doc = json!({
        "buffer descriptor": {
            "category": "structure",
            "members": [{ "name": "usage", "type": "buffer usage" }]
        }
    });
    let err = Generator::new()
        .generate_str(&doc.to_string())
        .expect_err("unresolved");
    match err {
        GenerateError::Schema(SchemaError::Unresolved {
            owner, type_name, ..
        }) => {
            assert_eq!(owner, "GPUBufferDescriptor");
            assert_eq!(type_name, "buffer usage");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_file_names_the_path() {
    let err = Generator::new()
        .generate_path(Path::new("/nonexistent/descgen/dawn.json"))
        .expect_err("no such file");
    assert!(matches!(err, GenerateError::Io { ref path, .. } if path.ends_with("dawn.json")));
    assert!(err.to_string().contains("/nonexistent/descgen/dawn.json"));
}

// ── outputs ──────────────────────────────────────────────────────────────────

#[test]
fn bindings_decode_and_release_through_the_codec() {
    let bindings = Generator::new()
        .generate_str(&idl().to_string())
        .expect("generate");
    let codec = bindings.codec("GPUTextureDescriptor").expect("codec");
    let mut ctx = DeviceContext::new();

    let input = HostValue::from(json!({
        "label": "color",
        "size": { "width": 4 },
        "format": "bgra8unorm"
    }));
    let out = codec.decode(&mut ctx, &input, None).expect("decode");
    assert_eq!(ctx.heap_ref().live(), 1);

    codec.destroy(&mut ctx, out);
    assert_eq!(ctx.heap_ref().live(), 0);
    assert!(ctx.errors().is_empty());
}

#[test]
fn schema_text_lists_every_structure() {
    let bindings = Generator::new()
        .generate_str(&idl().to_string())
        .expect("generate");
    let text = bindings.format_schema().expect("format");
    assert!(text.contains("WGPUExtent3D"));
    assert!(text.contains("WGPUTextureDescriptor"));
    assert!(text.contains("WGPUTextureFormat"));
}

#[cfg(feature = "cpp")]
#[test]
fn cpp_sources_cover_every_structure() {
    let bindings = Generator::new()
        .generate_str(&idl().to_string())
        .expect("generate");
    let sources = bindings.render_cpp().expect("render");
    for name in ["GPUExtent3D", "GPUTextureDescriptor"] {
        assert!(sources.header.contains(&format!("Decode{name}(")));
        assert!(sources.source.contains(&format!("void Destroy{name}(")));
    }
    assert_eq!(sources.files()[0].0, descgen::cpp::HEADER_FILE);
}
