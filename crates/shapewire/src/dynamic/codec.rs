// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptor-driven encoder, decoder and deallocator for [`Value`] trees.

use super::Value;
use crate::alloc::{charge, credit, Allocator, NoAlloc};
use crate::config::{DecodeLimits, ERROR_UNION_ERROR, ERROR_UNION_PAYLOAD};
use crate::descriptor::{FloatType, TypeDescriptor};
use crate::error::{Error, Result, Unsupported};
use crate::fingerprint::Fingerprint;
use crate::shape::invalid_discriminant;
use crate::wire::{reserve_vec, WireReader, WireWriter};
use std::alloc::Layout;
use std::io::{self, Read, Write};

/// Encode `value` as a frame for `desc`.
///
/// The value is checked against the descriptor before anything is written,
/// so a `ValueMismatch` leaves the sink untouched.
pub fn encode<W: Write>(sink: W, desc: &TypeDescriptor, value: &Value) -> Result<()> {
    desc.validate()?;
    encode_value(&mut WireWriter::new(io::sink()), desc, value)?;

    let mut w = WireWriter::new(sink);
    w.write_fingerprint(Fingerprint::compute(desc))?;
    encode_value(&mut w, desc, value)
}

/// Encode `value` as a frame for `desc` into a new buffer.
pub fn to_vec(desc: &TypeDescriptor, value: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    encode(&mut out, desc, value)?;
    Ok(out)
}

/// Decode a frame of a non-allocating `desc`.
///
/// Descriptors holding pointer or slice nodes are refused before any I/O.
pub fn decode<R: Read>(source: R, desc: &TypeDescriptor) -> Result<Value> {
    desc.validate()?;
    if desc.requires_allocation() {
        return Err(Unsupported::AllocationRequired.into());
    }
    decode_with(source, desc, DecodeLimits::default(), &NoAlloc)
}

/// Decode a frame of any `desc`, charging pointer and slice nodes to `alloc`.
pub fn decode_owned<R: Read, A: Allocator + ?Sized>(
    source: R,
    desc: &TypeDescriptor,
    alloc: &A,
) -> Result<Value> {
    decode_owned_with_limits(source, desc, DecodeLimits::default(), alloc)
}

/// [`decode_owned`] with explicit limits.
pub fn decode_owned_with_limits<R: Read, A: Allocator + ?Sized>(
    source: R,
    desc: &TypeDescriptor,
    limits: DecodeLimits,
    alloc: &A,
) -> Result<Value> {
    desc.validate()?;
    decode_with(source, desc, limits, alloc)
}

/// Return every pointer and slice charge held by `value` to `alloc`.
pub fn release<A: Allocator + ?Sized>(alloc: &A, desc: &TypeDescriptor, value: Value) {
    if desc.requires_allocation() {
        release_value(alloc, desc, value);
    }
}

fn decode_with<R: Read, A: Allocator + ?Sized>(
    source: R,
    desc: &TypeDescriptor,
    limits: DecodeLimits,
    alloc: &A,
) -> Result<Value> {
    let mut r = WireReader::with_limits(source, limits);
    r.expect_fingerprint(Fingerprint::compute(desc))?;
    decode_value(&mut r, desc, alloc)
}

fn mismatch(desc: &TypeDescriptor, value: &Value) -> Error {
    Error::ValueMismatch {
        expected: desc.kind().name(),
        found: value.kind_name(),
    }
}

fn fits_unsigned(bits: u16, value: u128) -> bool {
    bits >= 128 || value < 1u128 << bits
}

fn write_error<W: Write>(w: &mut WireWriter<W>, names: &[String], name: &str) -> Result<()> {
    let index = names
        .binary_search_by(|probe| probe.as_str().cmp(name))
        .map_err(|_| Error::ValueMismatch {
            expected: "member of the error set",
            found: "unknown error name",
        })?;
    w.write_u16(index as u16)
}

fn read_error<R: Read>(r: &mut WireReader<R>, names: &[String]) -> Result<String> {
    let index = r.read_u16()?;
    names
        .get(usize::from(index))
        .cloned()
        .ok_or_else(|| invalid_discriminant("error set", index))
}

fn encode_value<W: Write>(
    w: &mut WireWriter<W>,
    desc: &TypeDescriptor,
    value: &Value,
) -> Result<()> {
    match (desc, value) {
        (TypeDescriptor::Void, Value::Void) => Ok(()),
        (TypeDescriptor::Bool, Value::Bool(b)) => w.write_bool(*b),
        (TypeDescriptor::Int(int), Value::UInt(v)) if !int.signed && fits_unsigned(int.bits, *v) => {
            w.write_raw(int.bits, *v)
        }
        (TypeDescriptor::Int(int), Value::SInt(v)) if int.signed && int.contains(*v) => {
            w.write_int(*int, *v)
        }
        (TypeDescriptor::Float(FloatType { bits: 32 }), Value::F32(v)) => w.write_f32(*v),
        (TypeDescriptor::Float(FloatType { bits: 64 }), Value::F64(v)) => w.write_f64(*v),
        (TypeDescriptor::Pointer(child), Value::Pointer(inner)) => encode_value(w, child, inner),
        (TypeDescriptor::Slice(child), Value::Slice(items)) => {
            w.write_u64(items.len() as u64)?;
            items.iter().try_for_each(|item| encode_value(w, child, item))
        }
        (TypeDescriptor::Array { len, child }, Value::Array(items))
        | (TypeDescriptor::Vector { len, child }, Value::Vector(items))
            if items.len() as u64 == *len =>
        {
            items.iter().try_for_each(|item| encode_value(w, child, item))
        }
        (TypeDescriptor::Struct(fields), Value::Struct(items)) if fields.len() == items.len() => {
            fields
                .iter()
                .zip(items)
                .try_for_each(|(field, item)| encode_value(w, field, item))
        }
        (TypeDescriptor::Optional(_), Value::Optional(None)) => w.write_u8(0),
        (TypeDescriptor::Optional(child), Value::Optional(Some(inner))) => {
            w.write_u8(1)?;
            encode_value(w, child, inner)
        }
        (TypeDescriptor::ErrorSet(names), Value::Error(name)) => write_error(w, names, name),
        (TypeDescriptor::ErrorUnion { payload, .. }, Value::ErrorUnion(Ok(inner))) => {
            w.write_u8(ERROR_UNION_PAYLOAD)?;
            encode_value(w, payload, inner)
        }
        (TypeDescriptor::ErrorUnion { set, .. }, Value::ErrorUnion(Err(name))) => {
            w.write_u8(ERROR_UNION_ERROR)?;
            write_error(w, set, name)
        }
        (TypeDescriptor::Enum { tag, values }, Value::Enum(v)) if values.contains(v) => {
            w.write_int(*tag, *v)
        }
        (
            TypeDescriptor::TaggedUnion { tag, variants },
            Value::Union {
                tag: active,
                payload,
            },
        ) => {
            let Some(variant) = usize::try_from(*active)
                .ok()
                .and_then(|i| variants.get(i))
            else {
                return Err(mismatch(desc, value));
            };
            w.write_raw(tag.bits, u128::from(*active))?;
            encode_value(w, variant, payload)
        }
        _ => Err(mismatch(desc, value)),
    }
}

/// Decode `count` items of `child`, releasing the decoded prefix on failure.
fn decode_items<R: Read, A: Allocator + ?Sized>(
    r: &mut WireReader<R>,
    child: &TypeDescriptor,
    count: usize,
    alloc: &A,
) -> Result<Vec<Value>> {
    let mut items = reserve_vec::<Value>(count)?;
    for _ in 0..count {
        let next = if items.len() == items.capacity() {
            items.try_reserve(1).map_err(|_| Error::OutOfMemory)
        } else {
            Ok(())
        }
        .and_then(|()| decode_value(r, child, alloc));

        match next {
            Ok(item) => items.push(item),
            Err(e) => {
                log::trace!(
                    "[DECODE] {} failed at element {}/{}, releasing",
                    child,
                    items.len(),
                    count
                );
                for item in items {
                    release_value(alloc, child, item);
                }
                return Err(e);
            }
        }
    }
    Ok(items)
}

fn decode_value<R: Read, A: Allocator + ?Sized>(
    r: &mut WireReader<R>,
    desc: &TypeDescriptor,
    alloc: &A,
) -> Result<Value> {
    match desc {
        TypeDescriptor::Void => Ok(Value::Void),
        TypeDescriptor::Bool => r.read_bool().map(Value::Bool),
        TypeDescriptor::Int(int) if int.signed => r.read_int(*int).map(Value::SInt),
        TypeDescriptor::Int(int) => r.read_raw(int.bits).map(Value::UInt),
        TypeDescriptor::Float(FloatType { bits: 32 }) => r.read_f32().map(Value::F32),
        TypeDescriptor::Float(_) => r.read_f64().map(Value::F64),
        TypeDescriptor::Pointer(child) => {
            let layout = Layout::new::<Value>();
            charge(alloc, layout)?;
            match decode_value(r, child, alloc) {
                Ok(inner) => Ok(Value::pointer(inner)),
                Err(e) => {
                    credit(alloc, layout);
                    Err(e)
                }
            }
        }
        TypeDescriptor::Slice(child) => {
            let (count, layout) = r.read_slice_len::<Value, A>(alloc)?;
            charge(alloc, layout)?;
            match decode_items(r, child, count, alloc) {
                Ok(items) => Ok(Value::Slice(items)),
                Err(e) => {
                    credit(alloc, layout);
                    Err(e)
                }
            }
        }
        TypeDescriptor::Array { len, child } | TypeDescriptor::Vector { len, child } => {
            let count = usize::try_from(*len).map_err(|_| Error::InvalidLength { len: *len })?;
            let items = decode_items(r, child, count, alloc)?;
            Ok(match desc {
                TypeDescriptor::Array { .. } => Value::Array(items),
                _ => Value::Vector(items),
            })
        }
        TypeDescriptor::Struct(fields) => {
            let mut items = reserve_vec::<Value>(fields.len())?;
            for field in fields {
                match decode_value(r, field, alloc) {
                    Ok(item) => items.push(item),
                    Err(e) => {
                        log::trace!("[DECODE] struct field {} failed, releasing", items.len());
                        for (field, item) in fields.iter().zip(items) {
                            release_value(alloc, field, item);
                        }
                        return Err(e);
                    }
                }
            }
            Ok(Value::Struct(items))
        }
        TypeDescriptor::Optional(child) => match r.read_u8()? {
            0 => Ok(Value::none()),
            1 => decode_value(r, child, alloc).map(Value::some),
            other => Err(invalid_discriminant("optional", other)),
        },
        TypeDescriptor::ErrorSet(names) => read_error(r, names).map(Value::Error),
        TypeDescriptor::ErrorUnion { set, payload } => match r.read_u8()? {
            ERROR_UNION_PAYLOAD => {
                decode_value(r, payload, alloc).map(|v| Value::ErrorUnion(Ok(Box::new(v))))
            }
            ERROR_UNION_ERROR => read_error(r, set).map(|name| Value::ErrorUnion(Err(name))),
            other => Err(invalid_discriminant("error union", other)),
        },
        TypeDescriptor::Enum { tag, values } => {
            let v = r.read_int(*tag)?;
            if values.contains(&v) {
                Ok(Value::Enum(v))
            } else {
                Err(invalid_discriminant("enum", v))
            }
        }
        TypeDescriptor::TaggedUnion { tag, variants } => {
            let raw = r.read_raw(tag.bits)?;
            let Some((active, variant)) = u64::try_from(raw)
                .ok()
                .and_then(|t| Some((t, variants.get(usize::try_from(t).ok()?)?)))
            else {
                return Err(invalid_discriminant("union", raw as i128));
            };
            decode_value(r, variant, alloc).map(|payload| Value::union(active, payload))
        }
    }
}

fn release_value<A: Allocator + ?Sized>(alloc: &A, desc: &TypeDescriptor, value: Value) {
    match (desc, value) {
        (TypeDescriptor::Pointer(child), Value::Pointer(inner)) => {
            release_value(alloc, child, *inner);
            credit(alloc, Layout::new::<Value>());
        }
        (TypeDescriptor::Slice(child), Value::Slice(items)) => {
            let layout = Layout::array::<Value>(items.len());
            for item in items {
                release_value(alloc, child, item);
            }
            if let Ok(layout) = layout {
                credit(alloc, layout);
            }
        }
        (TypeDescriptor::Array { child, .. }, Value::Array(items))
        | (TypeDescriptor::Vector { child, .. }, Value::Vector(items)) => {
            for item in items {
                release_value(alloc, child, item);
            }
        }
        (TypeDescriptor::Struct(fields), Value::Struct(items)) => {
            for (field, item) in fields.iter().zip(items) {
                release_value(alloc, field, item);
            }
        }
        (TypeDescriptor::Optional(child), Value::Optional(Some(inner))) => {
            release_value(alloc, child, *inner);
        }
        (TypeDescriptor::ErrorUnion { payload, .. }, Value::ErrorUnion(Ok(inner))) => {
            release_value(alloc, payload, *inner);
        }
        (TypeDescriptor::TaggedUnion { variants, .. }, Value::Union { tag, payload }) => {
            if let Some(variant) = usize::try_from(tag).ok().and_then(|i| variants.get(i)) {
                release_value(alloc, variant, *payload);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::Budget;
    use crate::descriptor::IntType;

    fn sample_desc() -> TypeDescriptor {
        TypeDescriptor::Struct(vec![
            TypeDescriptor::Int(IntType::U32),
            TypeDescriptor::slice(TypeDescriptor::Int(IntType::U8)),
        ])
    }

    fn sample_value() -> Value {
        Value::Struct(vec![
            Value::UInt(7),
            Value::Slice(vec![Value::UInt(1), Value::UInt(2), Value::UInt(3)]),
        ])
    }

    #[test]
    fn test_dynamic_frame_layout() {
        let frame = to_vec(&sample_desc(), &sample_value()).expect("encode");
        assert_eq!(frame.len(), 8 + 4 + 8 + 3);
        assert_eq!(&frame[..8], Fingerprint::compute(&sample_desc()).as_bytes());
        assert_eq!(&frame[8..12], &7u32.to_le_bytes());
        assert_eq!(&frame[12..20], &3u64.to_le_bytes());
        assert_eq!(&frame[20..], &[1, 2, 3]);
    }

    #[test]
    fn test_dynamic_owned_roundtrip_balances_budget() {
        let budget = Budget::unbounded();
        let frame = to_vec(&sample_desc(), &sample_value()).expect("encode");
        let back = decode_owned(frame.as_slice(), &sample_desc(), &budget).expect("decode");
        assert_eq!(back, sample_value());
        assert_eq!(budget.live_allocations(), 1);
        release(&budget, &sample_desc(), back);
        assert_eq!(budget.live_allocations(), 0);
    }

    #[test]
    fn test_forged_void_slice_length_is_bounded() {
        let desc = TypeDescriptor::slice(TypeDescriptor::Void);
        let mut frame = to_vec(&desc, &Value::Slice(vec![Value::Void; 2])).expect("encode");
        assert_eq!(frame.len(), 16);
        frame[8..16].copy_from_slice(&4_000_000u64.to_le_bytes());

        let budget = Budget::with_capacity(64 * 1024);
        assert!(matches!(
            decode_owned(frame.as_slice(), &desc, &budget),
            Err(Error::InvalidLength { len: 4_000_000 })
        ));
        assert_eq!(budget.stats().total_allocations, 0);

        let limits = DecodeLimits::unlimited().max_slice_len(1000);
        assert!(matches!(
            decode_owned_with_limits(frame.as_slice(), &desc, limits, &Budget::unbounded()),
            Err(Error::InvalidLength { len: 4_000_000 })
        ));
    }

    #[test]
    fn test_void_slice_grows_past_prealloc() {
        let desc = TypeDescriptor::slice(TypeDescriptor::Void);
        let count = crate::config::PREALLOC_LIMIT_BYTES / std::mem::size_of::<Value>() + 5;
        let value = Value::Slice(vec![Value::Void; count]);
        let frame = to_vec(&desc, &value).expect("encode");
        let budget = Budget::unbounded();
        let back = decode_owned(frame.as_slice(), &desc, &budget).expect("decode");
        assert_eq!(back, value);
        release(&budget, &desc, back);
        assert_eq!(budget.live_bytes(), 0);
    }

    #[test]
    fn test_non_allocating_decode_refuses_slices_before_io() {
        let err = decode(&[0u8; 0][..], &sample_desc()).expect_err("refused");
        assert!(matches!(
            err,
            Error::UnsupportedType(Unsupported::AllocationRequired)
        ));
    }

    #[test]
    fn test_mismatch_writes_nothing() {
        let mut out = Vec::new();
        let bad = Value::Struct(vec![Value::SInt(7), Value::Slice(vec![])]);
        let err = encode(&mut out, &sample_desc(), &bad).expect_err("mismatch");
        assert!(matches!(
            err,
            Error::ValueMismatch {
                expected: "int",
                found: "signed integer"
            }
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_out_of_range_int_is_mismatch() {
        let desc = TypeDescriptor::Int(IntType::U8);
        assert!(to_vec(&desc, &Value::UInt(255)).is_ok());
        assert!(matches!(
            to_vec(&desc, &Value::UInt(256)),
            Err(Error::ValueMismatch { .. })
        ));
        let desc = TypeDescriptor::Int(IntType::I8);
        assert!(to_vec(&desc, &Value::SInt(-128)).is_ok());
        assert!(to_vec(&desc, &Value::SInt(128)).is_err());
    }

    #[test]
    fn test_unknown_error_name_is_mismatch() {
        let desc = TypeDescriptor::error_set(["Busy", "Closed"]);
        assert!(matches!(
            to_vec(&desc, &Value::Error("Gone".into())),
            Err(Error::ValueMismatch { .. })
        ));
        let frame = to_vec(&desc, &Value::Error("Closed".into())).expect("encode");
        assert_eq!(&frame[8..], &1u16.to_le_bytes());
        assert_eq!(
            decode(frame.as_slice(), &desc).expect("decode"),
            Value::Error("Closed".into())
        );
    }

    #[test]
    fn test_union_tag_out_of_range() {
        let desc = TypeDescriptor::TaggedUnion {
            tag: IntType::U8,
            variants: vec![TypeDescriptor::Void, TypeDescriptor::Bool],
        };
        let mut frame = to_vec(&desc, &Value::union(1, Value::Bool(true))).expect("encode");
        frame[8] = 2;
        assert!(matches!(
            decode(frame.as_slice(), &desc),
            Err(Error::InvalidDiscriminant {
                shape: "union",
                value: 2
            })
        ));
    }

    #[test]
    fn test_invalid_descriptor_rejected() {
        let desc = TypeDescriptor::Int(IntType::new(24, false));
        assert!(matches!(
            to_vec(&desc, &Value::UInt(1)),
            Err(Error::UnsupportedType(Unsupported::IntWidth(24)))
        ));
    }
}
