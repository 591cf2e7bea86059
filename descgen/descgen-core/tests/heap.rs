use descgen_core::{FreeKind, HeapBlock, HeapFault, NativeHeap, NativeValue};

#[test]
fn alloc_and_free_are_counted() {
    let mut heap = NativeHeap::new();
    let a = heap.alloc(HeapBlock::Single(NativeValue::U32(1)));
    let b = heap.alloc(HeapBlock::Array(vec![NativeValue::Null; 3]));
    assert_eq!(heap.live(), 2);

    heap.free(a, FreeKind::Delete).expect("single block frees with delete");
    heap.free(b, FreeKind::DeleteArray)
        .expect("array block frees with delete[]");

    assert_eq!(heap.live(), 0);
    assert_eq!(heap.stats().allocations, 2);
    assert_eq!(heap.stats().frees, 2);
    assert!(heap.faults().is_empty());
}

#[test]
fn double_free_is_recorded() {
    let mut heap = NativeHeap::new();
    let id = heap.alloc_c_string("label");
    heap.free(id, FreeKind::DeleteArray).unwrap();

    let err = heap
        .free(id, FreeKind::DeleteArray)
        .expect_err("second release must fail");
    assert_eq!(err, HeapFault::UnknownAllocation(id));
    assert_eq!(heap.faults().len(), 1);
    assert_eq!(heap.stats().frees, 1);
}

#[test]
fn mismatched_free_is_recorded_and_releases_block() {
    let mut heap = NativeHeap::new();
    let id = heap.alloc(HeapBlock::Array(vec![]));

    let err = heap.free(id, FreeKind::Delete).expect_err("delete on array");
    assert!(matches!(
        err,
        HeapFault::MismatchedFree {
            used: FreeKind::Delete,
            expected: FreeKind::DeleteArray,
            ..
        }
    ));
    assert_eq!(heap.live(), 0);
}

#[test]
fn c_string_is_nul_terminated() {
    let mut heap = NativeHeap::new();
    let id = heap.alloc_c_string("main");
    match heap.get(id) {
        Some(HeapBlock::CString(bytes)) => assert_eq!(bytes.as_slice(), b"main\0"),
        other => panic!("unexpected block: {other:?}"),
    }
    assert_eq!(heap.c_string(id), Some("main"));
}

#[test]
fn store_element_writes_into_array_block() {
    let mut heap = NativeHeap::new();
    let id = heap.alloc(HeapBlock::Array(vec![NativeValue::Null; 2]));
    heap.store_element(id, 1, NativeValue::Enum(7));
    heap.store_element(id, 5, NativeValue::Enum(9));

    assert_eq!(
        heap.get(id),
        Some(&HeapBlock::Array(vec![NativeValue::Null, NativeValue::Enum(7)]))
    );
}
