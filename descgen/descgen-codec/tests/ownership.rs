
use descgen_core::{DeviceContext, HeapBlock, HostValue, HostValueTypeError, NativeHandle, NativeValue};
use serde_json::json;
use test_helpers::*;

fn entry(binding: u32) -> serde_json::Value {
    json!({ "binding": binding, "size": 256 })
}

fn attachment(view: u64, label: &str) -> HostValue {
    HostValue::object([
        ("view", HostValue::wrapped("GPUTextureView", view)),
        ("label", HostValue::string(label)),
    ])
}

// ── arrays of structures ─────────────────────────────────────────────────────

#[test]
fn struct_array_is_one_allocation_with_its_count() {
    let set = codecs();
    let codec = set.codec("GPUBindGroupDescriptor").expect("codec");
    let mut ctx = DeviceContext::new();

    let input = host(json!({ "entries": [entry(0), entry(1), entry(2)] }));
    let out = codec.decode(&mut ctx, &input, None).expect("decode");
    assert_eq!(out.get("entryCount"), Some(&NativeValue::U32(3)));
    assert_eq!(ctx.heap_ref().live(), 1);

    let id = out.get("entries").and_then(NativeValue::as_pointer).expect("entries");
    let Some(HeapBlock::Array(items)) = ctx.heap_ref().get(id) else {
        panic!("entries is not an array block");
    };
    let bindings: Vec<_> = items
        .iter()
        .filter_map(NativeValue::as_struct)
        .map(|s| s.get("binding").cloned())
        .collect();
    assert_eq!(
        bindings,
        vec![
            Some(NativeValue::U32(0)),
            Some(NativeValue::U32(1)),
            Some(NativeValue::U32(2)),
        ]
    );

    codec.destroy(&mut ctx, out);
    assert_heap_clean(&ctx);
}

#[test]
fn empty_array_still_writes_a_zero_count() {
    let set = codecs();
    let codec = set.codec("GPUBindGroupDescriptor").expect("codec");
    let mut ctx = DeviceContext::new();

    let out = codec
        .decode(&mut ctx, &host(json!({ "entries": [] })), None)
        .expect("decode");
    assert_eq!(out.get("entryCount"), Some(&NativeValue::U32(0)));

    codec.destroy(&mut ctx, out);
    assert_heap_clean(&ctx);
}

#[test]
fn failing_element_releases_everything() {
    let set = codecs();
    let codec = set.codec("GPUBindGroupDescriptor").expect("codec");
    let mut ctx = DeviceContext::new();

    let input = host(json!({
        "label": "group",
        "entries": [entry(0), { "size": 4 }, entry(2)]
    }));
    let err = codec.decode(&mut ctx, &input, None).expect_err("binding missing");
    assert_eq!(
        err,
        HostValueTypeError::Missing {
            structure: "GPUBindGroupDescriptor".into(),
            member: "entries[1].binding".into(),
        }
    );
    assert_eq!(ctx.heap_ref().stats().allocations, 2);
    assert_heap_clean(&ctx);
}

#[test]
fn non_object_element_is_a_mismatch() {
    let set = codecs();
    let codec = set.codec("GPUBindGroupDescriptor").expect("codec");
    let mut ctx = DeviceContext::new();

    let err = codec
        .decode(&mut ctx, &host(json!({ "entries": [1] })), None)
        .expect_err("number element");
    assert_eq!(
        err,
        HostValueTypeError::Mismatch {
            structure: "GPUBindGroupDescriptor".into(),
            member: "entries[0]".into(),
            expected: "GPUBindGroupEntry".into(),
            found: "number",
        }
    );
    assert_heap_clean(&ctx);
}

#[test]
fn non_array_is_a_mismatch() {
    let set = codecs();
    let codec = set.codec("GPUBindGroupDescriptor").expect("codec");
    let mut ctx = DeviceContext::new();

    let err = codec
        .decode(&mut ctx, &host(json!({ "entries": {} })), None)
        .expect_err("object");
    assert!(matches!(
        err,
        HostValueTypeError::Mismatch { ref expected, found: "Object", .. } if expected == "Array"
    ));
    assert_eq!(ctx.heap_ref().stats().allocations, 0);
}

#[test]
fn internal_property_is_never_read() {
    let set = codecs();
    let codec = set.codec("GPUBindGroupDescriptor").expect("codec");
    let mut ctx = DeviceContext::new();

    let input = with(
        host(json!({ "entries": [] })),
        "layout",
        HostValue::wrapped("GPUBuffer", 3),
    );
    let out = codec.decode(&mut ctx, &input, None).expect("decode");
    assert_eq!(out.get("layout"), Some(&NativeValue::Null));

    codec.destroy(&mut ctx, out);
    assert_heap_clean(&ctx);
}

// ── arrays of pointers ───────────────────────────────────────────────────────

#[test]
fn array_of_pointers_allocates_each_element() {
    let set = codecs();
    let codec = set.codec("GPURenderPassDescriptor").expect("codec");
    let mut ctx = DeviceContext::new();

    let input = HostValue::object([(
        "colorAttachments",
        HostValue::Array(vec![attachment(1, "first"), attachment(2, "second")]),
    )]);
    let out = codec.decode(&mut ctx, &input, None).expect("decode");
    assert_eq!(out.get("colorAttachmentCount"), Some(&NativeValue::U32(2)));
    // pointer array + 2 elements + 2 labels
    assert_eq!(ctx.heap_ref().live(), 5);

    let id = out
        .get("colorAttachments")
        .and_then(NativeValue::as_pointer)
        .expect("pointer array");
    let Some(HeapBlock::Array(items)) = ctx.heap_ref().get(id) else {
        panic!("colorAttachments is not an array block");
    };
    let element = items[1].as_pointer().expect("element pointer");
    let Some(HeapBlock::Single(NativeValue::Struct(second))) = ctx.heap_ref().get(element) else {
        panic!("element is not a single struct block");
    };
    assert_eq!(second.get("view"), Some(&NativeValue::Handle(NativeHandle(2))));

    codec.destroy(&mut ctx, out);
    assert_heap_clean(&ctx);
}

#[test]
fn failure_inside_pointed_element_releases_everything() {
    let set = codecs();
    let codec = set.codec("GPURenderPassDescriptor").expect("codec");
    let mut ctx = DeviceContext::new();

    let bad = HostValue::object([
        ("label", HostValue::string("broken")),
        ("view", HostValue::wrapped("GPUBuffer", 9)),
    ]);
    let input = HostValue::object([(
        "colorAttachments",
        HostValue::Array(vec![attachment(1, "first"), bad]),
    )]);
    let err = codec.decode(&mut ctx, &input, None).expect_err("wrong class");
    assert_eq!(err.member(), "colorAttachments[1].view");
    assert_heap_clean(&ctx);
}

// ── optional references ──────────────────────────────────────────────────────

#[test]
fn omitted_optional_reference_stays_null() {
    let set = codecs();
    let codec = set.codec("GPURenderPassDescriptor").expect("codec");
    let mut ctx = DeviceContext::new();

    for input in [
        host(json!({ "colorAttachments": [] })),
        host(json!({ "colorAttachments": [], "depthOrigin": null })),
    ] {
        let out = codec.decode(&mut ctx, &input, None).expect("decode");
        assert_eq!(out.get("depthOrigin"), Some(&NativeValue::Null));
        codec.destroy(&mut ctx, out);
    }
    assert_heap_clean(&ctx);
}

#[test]
fn present_optional_reference_is_one_allocation() {
    let set = codecs();
    let codec = set.codec("GPURenderPassDescriptor").expect("codec");
    let mut ctx = DeviceContext::new();

    let input = host(json!({ "colorAttachments": [], "depthOrigin": { "x": 4 } }));
    let out = codec.decode(&mut ctx, &input, None).expect("decode");
    assert_eq!(ctx.heap_ref().live(), 2);

    let id = out.get("depthOrigin").and_then(NativeValue::as_pointer).expect("origin");
    let Some(HeapBlock::Single(NativeValue::Struct(origin))) = ctx.heap_ref().get(id) else {
        panic!("depthOrigin is not a single struct block");
    };
    assert_eq!(origin.get("x"), Some(&NativeValue::U32(4)));
    assert_eq!(origin.get("y"), Some(&NativeValue::U32(0)));

    codec.destroy(&mut ctx, out);
    assert_heap_clean(&ctx);
}

// ── bitmask and object arrays ────────────────────────────────────────────────

#[test]
fn bitmask_and_object_arrays() {
    let set = codecs();
    let codec = set.codec("GPUUsageList").expect("codec");
    let mut ctx = DeviceContext::new();

    let input = HostValue::object([
        ("usages", HostValue::Array(vec![HostValue::Number(1.0), HostValue::Number(32.0)])),
        (
            "buffers",
            HostValue::Array(vec![HostValue::wrapped("GPUBuffer", 1), HostValue::wrapped("GPUBuffer", 2)]),
        ),
    ]);
    let out = codec.decode(&mut ctx, &input, None).expect("decode");
    assert_eq!(out.get("usageCount"), Some(&NativeValue::U32(2)));
    assert_eq!(out.get("bufferCount"), Some(&NativeValue::U32(2)));

    let usages = out.get("usages").and_then(NativeValue::as_pointer).expect("usages");
    assert_eq!(
        ctx.heap_ref().get(usages),
        Some(&HeapBlock::Array(vec![NativeValue::Bitmask(1), NativeValue::Bitmask(32)]))
    );
    let buffers = out.get("buffers").and_then(NativeValue::as_pointer).expect("buffers");
    assert_eq!(
        ctx.heap_ref().get(buffers),
        Some(&HeapBlock::Array(vec![
            NativeValue::Handle(NativeHandle(1)),
            NativeValue::Handle(NativeHandle(2)),
        ]))
    );

    codec.destroy(&mut ctx, out);
    assert_heap_clean(&ctx);
}

#[test]
fn omitted_optional_array_leaves_count_zero() {
    let set = codecs();
    let codec = set.codec("GPUUsageList").expect("codec");
    let mut ctx = DeviceContext::new();

    let out = codec
        .decode(&mut ctx, &host(json!({ "usages": [] })), None)
        .expect("decode");
    assert_eq!(out.get("buffers"), Some(&NativeValue::Null));
    assert_eq!(out.get("bufferCount"), Some(&NativeValue::U32(0)));

    codec.destroy(&mut ctx, out);
    assert_heap_clean(&ctx);
}

#[test]
fn wrong_object_inside_array_releases_the_array() {
    let set = codecs();
    let codec = set.codec("GPUUsageList").expect("codec");
    let mut ctx = DeviceContext::new();

    let input = HostValue::object([
        ("usages", HostValue::Array(vec![])),
        (
            "buffers",
            HostValue::Array(vec![HostValue::wrapped("GPUBuffer", 1), HostValue::Null]),
        ),
    ]);
    let err = codec.decode(&mut ctx, &input, None).expect_err("null element");
    assert_eq!(err.member(), "buffers[1]");
    assert_heap_clean(&ctx);
}

// ── repeated use ─────────────────────────────────────────────────────────────

#[test]
fn decodes_are_independent() {
    let set = codecs();
    let codec = set.codec("GPUBindGroupDescriptor").expect("codec");
    let mut ctx = DeviceContext::new();

    let first = codec
        .decode(&mut ctx, &host(json!({ "label": "a", "entries": [entry(0)] })), None)
        .expect("first");
    let second = codec
        .decode(&mut ctx, &host(json!({ "label": "b", "entries": [entry(1)] })), None)
        .expect("second");
    assert_eq!(ctx.heap_ref().live(), 4);

    codec.destroy(&mut ctx, first);
    assert_eq!(ctx.heap_ref().live(), 2);
    codec.destroy(&mut ctx, second);
    assert_heap_clean(&ctx);
}
