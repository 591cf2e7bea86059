//! In-process execution of decode/destroy plans.
//!
//! Decode follows an attach-then-fill discipline: every heap block is
//! attached to the output structure (arrays zero-initialized, length field
//! written) before anything that can fail runs. A failing decode therefore
//! always leaves a structure the destructor can walk, and
//! [`StructCodec::decode`] runs it before returning the error.

use std::collections::HashMap;

use descgen_core::{
    AllocId, BufferView, FreeKind, HeapBlock, HostValue, HostValueTypeError, NativeHandle, NativeHeap,
    NativeStruct, NativeValue, OwningContext,
};
use descgen_schema::{DefaultValue, NumberType, Ownership, Schema, SchemaError};
use indexmap::IndexMap;
use rayon::prelude::*;

use crate::{
    builder::build_plan,
    convert::{to_int32, to_uint32},
    plan::{CodecPlan, FieldInit, Guard, MarshalOp, MemberPlan},
    table::NameTable,
};

/// Plans and name tables for every structure, enum and bitmask of a schema.
#[derive(Debug, Clone, Default)]
pub struct CodecSet {
    plans: IndexMap<String, CodecPlan>,
    tables: IndexMap<String, NameTable>,
    by_external: HashMap<String, String>,
}

impl CodecSet {
    /// Build every structure plan; plans are built in parallel and kept in
    /// declaration order.
    pub fn build(schema: &Schema) -> Result<Self, SchemaError> {
        let structures: Vec<_> = schema.structures().collect();
        let plans = structures
            .par_iter()
            .map(|structure| build_plan(schema, structure))
            .collect::<Result<Vec<_>, _>>()?;

        let mut set = Self::default();
        for node in schema.enums().chain(schema.bitmasks()) {
            let table = NameTable::from_node(node);
            set.by_external
                .insert(table.external_name.clone(), table.declaration_name.clone());
            set.tables.insert(table.declaration_name.clone(), table);
        }
        for plan in plans {
            set.by_external
                .insert(plan.external_name.clone(), plan.structure.clone());
            set.plans.insert(plan.structure.clone(), plan);
        }
        check_embedding(&set.plans)?;
        log::info!(
            "built {} structure codecs and {} name tables",
            set.plans.len(),
            set.tables.len()
        );
        Ok(set)
    }

    /// Codec by external (`GPUBufferDescriptor`) or declaration name.
    pub fn codec(&self, name: &str) -> Option<StructCodec<'_>> {
        let plan = self.plan(name)?;
        Some(StructCodec { set: self, plan })
    }

    pub fn codecs(&self) -> impl Iterator<Item = StructCodec<'_>> {
        self.plans.values().map(|plan| StructCodec { set: self, plan })
    }

    /// Plan by external or declaration name.
    pub fn plan(&self, name: &str) -> Option<&CodecPlan> {
        let declaration = self.by_external.get(name).map_or(name, String::as_str);
        self.plans.get(declaration)
    }

    pub fn plans(&self) -> impl Iterator<Item = &CodecPlan> {
        self.plans.values()
    }

    /// Name table by external or declaration name.
    pub fn table(&self, name: &str) -> Option<&NameTable> {
        let declaration = self.by_external.get(name).map_or(name, String::as_str);
        self.tables.get(declaration)
    }

    pub fn tables(&self) -> impl Iterator<Item = &NameTable> {
        self.tables.values()
    }

    /// A native structure holding only declared defaults: null pointers,
    /// zero numbers, and nested structures reset recursively.
    pub fn reset(&self, plan: &CodecPlan) -> NativeStruct {
        let mut out = NativeStruct::new(&plan.structure);
        for field in &plan.fields {
            let value = match &field.init {
                FieldInit::Null => NativeValue::Null,
                FieldInit::Bool(b) => NativeValue::Bool(*b),
                FieldInit::Number { ty, value } => number_literal(*ty, *value),
                FieldInit::Enum(v) => NativeValue::Enum(*v),
                FieldInit::Bitmask(v) => NativeValue::Bitmask(*v),
                FieldInit::Embedded(structure) => match self.plans.get(structure) {
                    Some(nested) => NativeValue::Struct(self.reset(nested)),
                    None => NativeValue::Null,
                },
            };
            out.set(&field.name, value);
        }
        out
    }

    fn release_struct(&self, heap: &mut NativeHeap, plan: &CodecPlan, native: &mut NativeStruct) {
        for member in plan.owning_members() {
            let slot = native.take(&member.name);
            if !slot.is_null() {
                self.release_member(heap, member, slot);
            }
        }
    }

    fn release_member(&self, heap: &mut NativeHeap, member: &MemberPlan, slot: NativeValue) {
        let nested = match &member.op {
            MarshalOp::Struct { structure, .. } | MarshalOp::StructArray { structure, .. } => {
                self.plans.get(structure)
            }
            _ => None,
        };

        match (member.ownership, slot) {
            (Ownership::Embedded, NativeValue::Struct(mut value)) => {
                if let Some(plan) = nested {
                    self.release_struct(heap, plan, &mut value);
                }
            }
            (Ownership::Owned, NativeValue::Pointer(id)) => {
                if let Ok(HeapBlock::Single(NativeValue::Struct(mut value))) =
                    heap.free(id, FreeKind::Delete)
                    && let Some(plan) = nested
                {
                    self.release_struct(heap, plan, &mut value);
                }
            }
            (Ownership::ArrayOwned, NativeValue::Pointer(id)) => {
                let Ok(block) = heap.free(id, FreeKind::DeleteArray) else {
                    return;
                };
                if let (HeapBlock::Array(items), Some(plan)) = (block, nested) {
                    for item in items {
                        if let NativeValue::Struct(mut value) = item {
                            self.release_struct(heap, plan, &mut value);
                        }
                    }
                }
            }
            (Ownership::ArrayOfPointersOwned, NativeValue::Pointer(id)) => {
                let Ok(HeapBlock::Array(items)) = heap.free(id, FreeKind::DeleteArray) else {
                    return;
                };
                for item in items {
                    let NativeValue::Pointer(element) = item else {
                        continue;
                    };
                    if let Ok(HeapBlock::Single(NativeValue::Struct(mut value))) =
                        heap.free(element, FreeKind::Delete)
                        && let Some(plan) = nested
                    {
                        self.release_struct(heap, plan, &mut value);
                    }
                }
            }
            (ownership, slot) => {
                log::warn!(
                    "member '{}' tagged {} holds {slot:?}; nothing released",
                    member.name,
                    ownership.as_str()
                );
            }
        }
    }
}

/// Decode/destroy pair of one structure.
#[derive(Debug, Clone, Copy)]
pub struct StructCodec<'a> {
    set: &'a CodecSet,
    plan: &'a CodecPlan,
}

impl<'a> StructCodec<'a> {
    pub fn plan(&self) -> &'a CodecPlan {
        self.plan
    }

    pub fn external_name(&self) -> &'a str {
        &self.plan.external_name
    }

    /// Decode a host object into a native structure.
    ///
    /// On failure the error is reported through `ctx`, everything allocated
    /// so far is released, and the error is returned; no partial structure
    /// ever escapes.
    pub fn decode(
        &self,
        ctx: &mut dyn OwningContext,
        value: &HostValue,
        next_in_chain: Option<NativeHandle>,
    ) -> Result<NativeStruct, HostValueTypeError> {
        if !value.is_object() {
            let error = HostValueTypeError::NotAnObject {
                structure: self.plan.external_name.clone(),
                found: value.type_name(),
            };
            ctx.report_error(&error);
            return Err(error);
        }

        let mut out = self.set.reset(self.plan);
        if self.plan.extensible {
            out.next_in_chain = next_in_chain;
        }
        let decoder = Decoder {
            set: self.set,
            root: &self.plan.external_name,
        };
        match decoder.fill_struct(ctx, self.plan, value, &mut out, "") {
            Ok(()) => Ok(out),
            Err(error) => {
                ctx.report_error(&error);
                self.destroy(ctx, out);
                Err(error)
            }
        }
    }

    /// Release everything `decode` allocated for `native`.
    pub fn destroy(&self, ctx: &mut dyn OwningContext, mut native: NativeStruct) {
        self.set.release_struct(ctx.heap(), self.plan, &mut native);
    }
}

struct Decoder<'a> {
    set: &'a CodecSet,
    /// External name of the structure being decoded, for diagnostics.
    root: &'a str,
}

impl Decoder<'_> {
    fn fill_struct(
        &self,
        ctx: &mut dyn OwningContext,
        plan: &CodecPlan,
        value: &HostValue,
        out: &mut NativeStruct,
        path: &str,
    ) -> Result<(), HostValueTypeError> {
        for member in &plan.members {
            let member_path = if path.is_empty() {
                member.name.clone()
            } else {
                format!("{path}.{}", member.name)
            };
            let input = value
                .get(&member.name)
                .filter(|v| member.guard == Guard::Required || !matches!(v, HostValue::Null));
            let Some(input) = input else {
                match member.guard {
                    Guard::Optional => continue,
                    Guard::Required => {
                        return Err(HostValueTypeError::Missing {
                            structure: self.root.to_string(),
                            member: member_path,
                        });
                    }
                }
            };
            self.fill_member(ctx, member, input, out, &member_path)?;
        }
        Ok(())
    }

    fn fill_member(
        &self,
        ctx: &mut dyn OwningContext,
        member: &MemberPlan,
        input: &HostValue,
        out: &mut NativeStruct,
        path: &str,
    ) -> Result<(), HostValueTypeError> {
        let name = member.name.as_str();
        match &member.op {
            MarshalOp::UnwrapObject { class } => {
                let handle = self.unwrap_handle(class, input, path)?;
                out.set(name, NativeValue::Handle(handle));
            }
            MarshalOp::UnwrapObjectArray { class } => {
                let items = self.array(input, path)?;
                let id = self.attach_array(ctx, member, out, vec![NativeValue::Null; items.len()]);
                for (i, item) in items.iter().enumerate() {
                    let handle = self.unwrap_handle(class, item, &format!("{path}[{i}]"))?;
                    ctx.heap().store_element(id, i, NativeValue::Handle(handle));
                }
            }
            MarshalOp::Struct {
                structure,
                reference: false,
            } => {
                let nested = self.nested(structure, input, path)?;
                let mut value = match out.take(name) {
                    NativeValue::Struct(value) => value,
                    _ => self.set.reset(nested),
                };
                let result = self.fill_struct(ctx, nested, input, &mut value, path);
                out.set(name, NativeValue::Struct(value));
                result?;
            }
            MarshalOp::Struct {
                structure,
                reference: true,
            } => {
                let nested = self.nested(structure, input, path)?;
                let mut value = self.set.reset(nested);
                let id = ctx
                    .heap()
                    .alloc(HeapBlock::Single(NativeValue::Struct(value.clone())));
                out.set(name, NativeValue::Pointer(id));
                let result = self.fill_struct(ctx, nested, input, &mut value, path);
                ctx.heap().store(id, NativeValue::Struct(value));
                result?;
            }
            MarshalOp::StructArray {
                structure,
                of_pointers,
            } => {
                let Some(nested) = self.set.plans.get(structure) else {
                    return Err(self.mismatch(path, structure, input));
                };
                let items = self.array(input, path)?;
                let zeroed = if *of_pointers {
                    vec![NativeValue::Null; items.len()]
                } else {
                    vec![NativeValue::Struct(self.set.reset(nested)); items.len()]
                };
                let id = self.attach_array(ctx, member, out, zeroed);
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{path}[{i}]");
                    if !item.is_object() {
                        return Err(self.mismatch(&item_path, &nested.external_name, item));
                    }
                    let mut value = self.set.reset(nested);
                    let slot = if *of_pointers {
                        let element = ctx
                            .heap()
                            .alloc(HeapBlock::Single(NativeValue::Struct(value.clone())));
                        ctx.heap()
                            .store_element(id, i, NativeValue::Pointer(element));
                        Some(element)
                    } else {
                        None
                    };
                    let result = self.fill_struct(ctx, nested, item, &mut value, &item_path);
                    match slot {
                        Some(element) => ctx.heap().store(element, NativeValue::Struct(value)),
                        None => ctx.heap().store_element(id, i, NativeValue::Struct(value)),
                    }
                    result?;
                }
            }
            MarshalOp::Number(ty) => {
                let value = self.number(*ty, input, path)?;
                out.set(name, value);
            }
            MarshalOp::Boolean => match input {
                HostValue::Boolean(b) => out.set(name, NativeValue::Bool(*b)),
                other => return Err(self.mismatch(path, "Boolean", other)),
            },
            MarshalOp::Enum { enumeration } => {
                let value = self.enum_value(enumeration, input, path)?;
                out.set(name, NativeValue::Enum(value));
            }
            MarshalOp::EnumArray { enumeration } => {
                let items = self.array(input, path)?;
                let id = self.attach_array(ctx, member, out, vec![NativeValue::Enum(0); items.len()]);
                for (i, item) in items.iter().enumerate() {
                    let value = self.enum_value(enumeration, item, &format!("{path}[{i}]"))?;
                    ctx.heap().store_element(id, i, NativeValue::Enum(value));
                }
            }
            MarshalOp::Bitmask => {
                let value = self.bitmask(input, path)?;
                out.set(name, NativeValue::Bitmask(value));
            }
            MarshalOp::BitmaskArray => {
                let items = self.array(input, path)?;
                let id = self.attach_array(ctx, member, out, vec![NativeValue::Bitmask(0); items.len()]);
                for (i, item) in items.iter().enumerate() {
                    let value = self.bitmask(item, &format!("{path}[{i}]"))?;
                    ctx.heap().store_element(id, i, NativeValue::Bitmask(value));
                }
            }
            MarshalOp::DynamicString => match input {
                HostValue::String(s) => {
                    let id = ctx.heap().alloc_c_string(s);
                    out.set(name, NativeValue::Pointer(id));
                }
                other => return Err(self.mismatch(path, "String", other)),
            },
            MarshalOp::Buffer { kind } => {
                let view = match (kind, input) {
                    (Some(expected), HostValue::TypedArray { kind, data }) if kind == expected => {
                        BufferView {
                            data: data.clone(),
                            kind: Some(*kind),
                        }
                    }
                    (None, HostValue::ArrayBuffer(data)) => BufferView {
                        data: data.clone(),
                        kind: None,
                    },
                    (Some(expected), other) => {
                        return Err(self.mismatch(path, expected.class_name(), other));
                    }
                    (None, other) => return Err(self.mismatch(path, "ArrayBuffer", other)),
                };
                let count = view.len();
                out.set(name, NativeValue::Buffer(view));
                set_length(member, out, count);
            }
        }
        Ok(())
    }

    /// Allocate a zeroed array, attach it and write its length field.
    fn attach_array(
        &self,
        ctx: &mut dyn OwningContext,
        member: &MemberPlan,
        out: &mut NativeStruct,
        zeroed: Vec<NativeValue>,
    ) -> AllocId {
        let count = zeroed.len();
        let id = ctx.heap().alloc(HeapBlock::Array(zeroed));
        out.set(&member.name, NativeValue::Pointer(id));
        set_length(member, out, count);
        id
    }

    fn nested(
        &self,
        structure: &str,
        input: &HostValue,
        path: &str,
    ) -> Result<&CodecPlan, HostValueTypeError> {
        match self.set.plans.get(structure) {
            Some(plan) if input.is_object() => Ok(plan),
            Some(plan) => Err(self.mismatch(path, &plan.external_name, input)),
            None => Err(self.mismatch(path, structure, input)),
        }
    }

    fn array<'v>(&self, input: &'v HostValue, path: &str) -> Result<&'v [HostValue], HostValueTypeError> {
        match input {
            HostValue::Array(items) => Ok(items),
            other => Err(self.mismatch(path, "Array", other)),
        }
    }

    fn unwrap_handle(&self, class: &str, input: &HostValue, path: &str) -> Result<NativeHandle, HostValueTypeError> {
        match input {
            HostValue::Wrapped { class: actual, handle } if actual.as_ref() == class => Ok(*handle),
            other => Err(self.mismatch(path, class, other)),
        }
    }

    fn enum_value(&self, enumeration: &str, input: &HostValue, path: &str) -> Result<u32, HostValueTypeError> {
        let HostValue::String(s) = input else {
            return Err(self.mismatch(path, "String", input));
        };
        let table = self.set.tables.get(enumeration);
        table.and_then(|t| t.value(s)).ok_or_else(|| HostValueTypeError::UnknownEnumValue {
            structure: self.root.to_string(),
            member: path.to_string(),
            enumeration: table.map_or(enumeration, |t| t.external_name.as_str()).to_string(),
            value: s.to_string(),
        })
    }

    fn bitmask(&self, input: &HostValue, path: &str) -> Result<u32, HostValueTypeError> {
        match input {
            HostValue::Number(x) => Ok(to_uint32(*x)),
            other => Err(self.mismatch(path, "Number", other)),
        }
    }

    fn number(&self, ty: NumberType, input: &HostValue, path: &str) -> Result<NativeValue, HostValueTypeError> {
        match (ty, input) {
            // BigInts must convert losslessly
            (NumberType::I64, HostValue::BigInt(v)) => i64::try_from(*v)
                .map(NativeValue::I64)
                .map_err(|_| self.mismatch(path, "BigInt within int64_t", input)),
            (NumberType::U64, HostValue::BigInt(v)) => u64::try_from(*v)
                .map(NativeValue::U64)
                .map_err(|_| self.mismatch(path, "BigInt within uint64_t", input)),
            (_, HostValue::Number(x)) => Ok(self.number_from_double(ty, *x, path)),
            (ty, other) => Err(self.mismatch(path, if ty.is_wide() { "BigInt" } else { "Number" }, other)),
        }
    }

    fn number_from_double(&self, ty: NumberType, x: f64, path: &str) -> NativeValue {
        if ty.is_wide() && (x.fract() != 0.0 || x.abs() > 9_007_199_254_740_992.0) {
            log::warn!("{}.{path}: {x} loses precision as a 64-bit integer", self.root);
        }
        match ty {
            NumberType::F32 => NativeValue::F32(x as f32),
            NumberType::F64 => NativeValue::F64(x),
            NumberType::I8 => NativeValue::I32(i32::from(to_int32(x) as i8)),
            NumberType::I16 => NativeValue::I32(i32::from(to_int32(x) as i16)),
            NumberType::I32 => NativeValue::I32(to_int32(x)),
            NumberType::U8 => NativeValue::U32(u32::from(to_uint32(x) as u8)),
            NumberType::U16 => NativeValue::U32(u32::from(to_uint32(x) as u16)),
            NumberType::U32 => NativeValue::U32(to_uint32(x)),
            NumberType::I64 => NativeValue::I64(x as i64),
            NumberType::U64 => NativeValue::U64(x as u64),
        }
    }

    fn mismatch(&self, path: &str, expected: &str, found: &HostValue) -> HostValueTypeError {
        HostValueTypeError::Mismatch {
            structure: self.root.to_string(),
            member: path.to_string(),
            expected: expected.to_string(),
            found: found.type_name(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Open,
    Done,
}

/// Structures nested by value must form a tree: a by-value cycle has no
/// finite native layout and would make reset recurse forever. Cycles through
/// a pointer are fine.
fn check_embedding(plans: &IndexMap<String, CodecPlan>) -> Result<(), SchemaError> {
    let mut visits = HashMap::new();
    for plan in plans.values() {
        visit_embedded(plans, plan, &mut visits)?;
    }
    Ok(())
}

fn visit_embedded<'a>(
    plans: &'a IndexMap<String, CodecPlan>,
    plan: &'a CodecPlan,
    visits: &mut HashMap<&'a str, Visit>,
) -> Result<(), SchemaError> {
    if visits.contains_key(plan.structure.as_str()) {
        return Ok(());
    }
    visits.insert(plan.structure.as_str(), Visit::Open);
    for field in &plan.fields {
        let FieldInit::Embedded(nested) = &field.init else {
            continue;
        };
        match visits.get(nested.as_str()) {
            Some(Visit::Open) => {
                return Err(SchemaError::UnsupportedShape {
                    owner: plan.external_name.clone(),
                    member: field.name.clone(),
                    shape: "structure embeds itself by value".into(),
                });
            }
            Some(Visit::Done) => {}
            None => {
                if let Some(next) = plans.get(nested) {
                    visit_embedded(plans, next, visits)?;
                }
            }
        }
    }
    visits.insert(plan.structure.as_str(), Visit::Done);
    Ok(())
}

fn set_length(member: &MemberPlan, out: &mut NativeStruct, count: usize) {
    if let Some(length) = &member.length {
        out.set(&length.name, count_value(length.ty, count));
    }
}

fn count_value(ty: NumberType, count: usize) -> NativeValue {
    match ty {
        NumberType::I8 | NumberType::I16 | NumberType::I32 => NativeValue::I32(count as i32),
        NumberType::U8 | NumberType::U16 | NumberType::U32 => NativeValue::U32(count as u32),
        NumberType::I64 => NativeValue::I64(count as i64),
        NumberType::U64 => NativeValue::U64(count as u64),
        NumberType::F32 => NativeValue::F32(count as f32),
        NumberType::F64 => NativeValue::F64(count as f64),
    }
}

fn number_literal(ty: NumberType, value: DefaultValue) -> NativeValue {
    let (int, float) = match value {
        DefaultValue::Integer(v) => (v, v as f64),
        DefaultValue::Float(v) => (v as i128, v),
        DefaultValue::Bool(b) => (i128::from(b), f64::from(u8::from(b))),
    };
    match ty {
        NumberType::F32 => NativeValue::F32(float as f32),
        NumberType::F64 => NativeValue::F64(float),
        NumberType::I8 | NumberType::I16 | NumberType::I32 => NativeValue::I32(int as i32),
        NumberType::U8 | NumberType::U16 | NumberType::U32 => NativeValue::U32(int as u32),
        NumberType::I64 => NativeValue::I64(int as i64),
        NumberType::U64 => NativeValue::U64(int as u64),
    }
}
