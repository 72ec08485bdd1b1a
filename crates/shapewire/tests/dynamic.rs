// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic

//! Interchange between the typed path and runtime descriptors.

use shapewire::dynamic::{self, Value};
use shapewire::{classify, Budget, Error, IntType, Shape, TypeDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Shape)]
enum Color {
    Red = 1,
    Green = 2,
    Blue = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Shape)]
#[shape(error_set)]
enum LookupError {
    Missing,
    Forbidden,
}

#[derive(Debug, PartialEq, Shape)]
enum Body {
    Nothing,
    Scalar(i32),
    Colors(Vec<Color>),
}

#[derive(Debug, PartialEq, Shape)]
struct Message {
    id: u64,
    flags: [bool; 2],
    body: Body,
    result: Result<Box<f32>, LookupError>,
    color: Option<Color>,
}

fn message() -> Message {
    Message {
        id: 99,
        flags: [true, false],
        body: Body::Colors(vec![Color::Blue, Color::Red]),
        result: Ok(Box::new(0.5)),
        color: Some(Color::Green),
    }
}

fn message_value() -> Value {
    Value::Struct(vec![
        Value::UInt(99),
        Value::Array(vec![Value::Bool(true), Value::Bool(false)]),
        Value::union(2, Value::Slice(vec![Value::Enum(4), Value::Enum(1)])),
        Value::ErrorUnion(Ok(Box::new(Value::pointer(Value::F32(0.5))))),
        Value::some(Value::Enum(2)),
    ])
}

#[test]
fn test_classified_descriptor_shape() {
    let desc = classify::<Message>().expect("classify");
    let TypeDescriptor::Struct(fields) = &desc else {
        panic!("expected struct, got {}", desc);
    };
    assert_eq!(fields.len(), 5);
    assert_eq!(
        fields[2],
        TypeDescriptor::TaggedUnion {
            tag: IntType::U8,
            variants: vec![
                TypeDescriptor::Void,
                TypeDescriptor::Int(IntType::I32),
                TypeDescriptor::slice(TypeDescriptor::enumeration(IntType::U8, [1, 2, 4])),
            ],
        }
    );
    assert_eq!(
        fields[3],
        TypeDescriptor::error_union(
            ["Missing", "Forbidden"],
            TypeDescriptor::pointer(TypeDescriptor::Float(shapewire::FloatType::F32))
        )
    );
    assert!(desc.requires_allocation());
}

#[test]
fn test_typed_frame_decodes_dynamically() {
    let desc = classify::<Message>().expect("classify");
    let frame = shapewire::to_vec(&message()).expect("encode");

    let budget = Budget::unbounded();
    let value = dynamic::decode_owned(frame.as_slice(), &desc, &budget).expect("decode");
    assert_eq!(value, message_value());
    // colors slice plus the boxed float
    assert_eq!(budget.live_allocations(), 2);
    dynamic::release(&budget, &desc, value);
    assert_eq!(budget.live_allocations(), 0);
    assert_eq!(budget.live_bytes(), 0);
}

#[test]
fn test_dynamic_frame_decodes_typed() {
    let desc = classify::<Message>().expect("classify");
    let frame = dynamic::to_vec(&desc, &message_value()).expect("encode");
    assert_eq!(frame, shapewire::to_vec(&message()).expect("encode"));

    let budget = Budget::unbounded();
    let back: Message = shapewire::decode_owned(frame.as_slice(), &budget).expect("decode");
    assert_eq!(back, message());
    shapewire::release(&budget, back);
    assert_eq!(budget.live_allocations(), 0);
}

#[test]
fn test_error_arm_by_name() {
    let desc = classify::<Result<u16, LookupError>>().expect("classify");
    let missing = Value::ErrorUnion(Err("Missing".into()));
    let frame = dynamic::to_vec(&desc, &missing).expect("encode");
    let typed: Result<u16, LookupError> = shapewire::decode(frame.as_slice()).expect("decode");
    assert_eq!(typed, Err(LookupError::Missing));

    let gone = Value::ErrorUnion(Err("Gone".into()));
    let err = dynamic::to_vec(&desc, &gone).expect_err("unknown");
    assert!(matches!(err, Error::ValueMismatch { .. }));

    let err = dynamic::to_vec(&desc, &Value::Error("Missing".into())).expect_err("bare error");
    assert!(matches!(
        err,
        Error::ValueMismatch {
            expected: "error union",
            found: "error"
        }
    ));
}

#[test]
fn test_enum_outside_domain_is_mismatch() {
    let desc = classify::<Color>().expect("classify");
    assert!(matches!(
        dynamic::to_vec(&desc, &Value::Enum(3)),
        Err(Error::ValueMismatch {
            expected: "enum",
            found: "enum"
        })
    ));
}

#[test]
fn test_flat_dynamic_decode_without_allocator() {
    let desc = classify::<(i8, Option<Color>, [u16; 2])>().expect("classify");
    let frame = shapewire::to_vec(&(-3i8, None::<Color>, [7u16, 8])).expect("encode");
    let value = dynamic::decode(frame.as_slice(), &desc).expect("decode");
    assert_eq!(
        value,
        Value::Struct(vec![
            Value::SInt(-3),
            Value::none(),
            Value::Array(vec![Value::UInt(7), Value::UInt(8)]),
        ])
    );
}

#[test]
fn test_dynamic_decode_refuses_allocating_descriptor() {
    let desc = classify::<Message>().expect("classify");
    let frame = shapewire::to_vec(&message()).expect("encode");
    assert!(matches!(
        dynamic::decode(frame.as_slice(), &desc),
        Err(Error::UnsupportedType(shapewire::Unsupported::AllocationRequired))
    ));
}

#[test]
fn test_dynamic_truncation_releases_partial_tree() {
    let desc = classify::<Message>().expect("classify");
    let frame = shapewire::to_vec(&message()).expect("encode");
    for cut in 8..frame.len() {
        let budget = Budget::unbounded();
        let err = dynamic::decode_owned(&frame[..cut], &desc, &budget).expect_err("short");
        assert!(matches!(err, Error::UnexpectedEndOfStream), "cut at {}", cut);
        assert_eq!(budget.live_allocations(), 0, "cut at {}", cut);
    }
}

#[test]
fn test_dynamic_limits() {
    let desc = TypeDescriptor::slice(TypeDescriptor::Bool);
    let value = Value::Slice(vec![Value::Bool(true); 5]);
    let frame = dynamic::to_vec(&desc, &value).expect("encode");
    let budget = Budget::unbounded();
    let limits = shapewire::DecodeLimits::unlimited().max_slice_len(4);
    assert!(matches!(
        dynamic::decode_owned_with_limits(frame.as_slice(), &desc, limits, &budget),
        Err(Error::InvalidLength { len: 5 })
    ));
}
