// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::float_cmp)] // Test assertions with constants
#![allow(clippy::unreadable_literal)] // Large test constants
#![allow(clippy::cast_possible_truncation)] // Test parameters
#![allow(clippy::items_after_statements)] // Test helpers

//! Round-trip tests for every shape kind, typed path.

use shapewire::{Budget, ErrorSet, Shape, Vector};
use std::fmt::Debug;
use std::marker::PhantomData;

fn roundtrip_flat<T: Shape + PartialEq + Debug>(value: &T) {
    let frame = shapewire::to_vec(value).expect("encode");
    let back: T = shapewire::decode(frame.as_slice()).expect("decode");
    assert_eq!(&back, value);
}

fn roundtrip_owned<T: Shape + PartialEq + Debug>(value: &T) {
    let budget = Budget::unbounded();
    let frame = shapewire::to_vec(value).expect("encode");
    let back: T = shapewire::decode_owned(frame.as_slice(), &budget).expect("decode");
    assert_eq!(&back, value);
    shapewire::release(&budget, back);
    assert_eq!(budget.live_allocations(), 0, "leaked charges");
    assert_eq!(budget.live_bytes(), 0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Shape)]
enum Mode {
    Idle,
    Active = 5,
    Faulted = 200,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Shape)]
#[repr(i16)]
enum Level {
    Low = -300,
    High = 300,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Shape)]
#[shape(error_set)]
enum IoFailure {
    Timeout,
    Closed,
    #[shape(rename = "Busy")]
    ResourceBusy,
}

#[derive(Debug, PartialEq, Shape)]
struct Header {
    seq: u64,
    stamp: (u32, u32),
    mode: Mode,
}

#[derive(Debug, PartialEq, Shape)]
struct Pixel(u8, u8, u8);

#[derive(Debug, PartialEq, Shape)]
struct Marker;

#[derive(Debug, PartialEq, Shape)]
struct Flat {
    header: Header,
    pixels: [Pixel; 2],
    lanes: Vector<f32, 4>,
    level: Option<Level>,
    outcome: Result<i16, IoFailure>,
    marker: Marker,
    width: usize,
    _tag: PhantomData<String>,
}

#[derive(Debug, PartialEq, Shape)]
enum Command {
    Stop,
    Move(i32),
    Paint { color: Pixel, strokes: Vec<(u16, u16)> },
}

#[derive(Debug, PartialEq, Shape)]
struct Envelope<T> {
    id: u32,
    body: T,
}

#[derive(Debug, PartialEq, Shape)]
struct Leaf {
    label: u8,
    weight: Option<Box<u64>>,
}

#[derive(Debug, PartialEq, Shape)]
struct Branch {
    label: u8,
    leaves: Vec<Leaf>,
}

#[derive(Debug, PartialEq, Shape)]
struct Forest {
    name: Vec<u8>,
    branches: Vec<Branch>,
}

#[test]
fn test_primitives_roundtrip() {
    roundtrip_flat(&());
    roundtrip_flat(&true);
    roundtrip_flat(&u8::MAX);
    roundtrip_flat(&i8::MIN);
    roundtrip_flat(&0xBEEFu16);
    roundtrip_flat(&-123_456i32);
    roundtrip_flat(&u64::MAX);
    roundtrip_flat(&i64::MIN);
    roundtrip_flat(&u128::MAX);
    roundtrip_flat(&i128::MIN);
    roundtrip_flat(&usize::MAX);
    roundtrip_flat(&isize::MIN);
    roundtrip_flat(&1.5f32);
    roundtrip_flat(&-0.0f64);
}

#[test]
fn test_float_bit_patterns_survive() {
    for bits in [0x7FC0_0001u32, 0xFFC0_0000, 0x7F80_0000, 0x0000_0001] {
        let frame = shapewire::to_vec(&f32::from_bits(bits)).expect("encode");
        let back: f32 = shapewire::decode(frame.as_slice()).expect("decode");
        assert_eq!(back.to_bits(), bits);
    }
    let nan = f64::from_bits(0x7FF8_0000_DEAD_BEEF);
    let frame = shapewire::to_vec(&[nan, -nan]).expect("encode");
    let back: [f64; 2] = shapewire::decode(frame.as_slice()).expect("decode");
    assert_eq!(back[0].to_bits(), nan.to_bits());
    assert_eq!(back[1].to_bits(), (-nan).to_bits());
}

#[test]
fn test_flat_struct_roundtrip() {
    let value = Flat {
        header: Header {
            seq: 42,
            stamp: (1_700_000_000, 999),
            mode: Mode::Faulted,
        },
        pixels: [Pixel(1, 2, 3), Pixel(4, 5, 6)],
        lanes: Vector([0.5, -1.0, f32::MAX, f32::MIN_POSITIVE]),
        level: Some(Level::Low),
        outcome: Err(IoFailure::ResourceBusy),
        marker: Marker,
        width: 640,
        _tag: PhantomData,
    };
    roundtrip_flat(&value);
    assert!(!<Flat as Shape>::REQUIRES_ALLOCATION);

    let ok = Flat {
        outcome: Ok(-7),
        level: None,
        ..value
    };
    roundtrip_flat(&ok);
}

#[test]
fn test_enums_roundtrip() {
    for mode in [Mode::Idle, Mode::Active, Mode::Faulted] {
        roundtrip_flat(&mode);
    }
    roundtrip_flat(&Level::High);
    for failure in [IoFailure::Timeout, IoFailure::Closed, IoFailure::ResourceBusy] {
        roundtrip_flat(&failure);
    }
}

#[test]
fn test_error_set_indices_are_sorted_names() {
    assert_eq!(IoFailure::NAMES, &["Busy", "Closed", "Timeout"]);
    assert_eq!(IoFailure::ResourceBusy.name(), "Busy");
    let frame = shapewire::to_vec(&IoFailure::Timeout).expect("encode");
    assert_eq!(&frame[8..], &2u16.to_le_bytes());
}

#[test]
fn test_enum_tag_width() {
    // Mode fits u8, Level is repr(i16).
    assert_eq!(shapewire::to_vec(&Mode::Faulted).expect("encode")[8..], [200]);
    assert_eq!(
        shapewire::to_vec(&Level::Low).expect("encode")[8..],
        (-300i16).to_le_bytes()
    );
}

#[test]
fn test_tagged_union_roundtrip() {
    roundtrip_owned(&Command::Stop);
    roundtrip_owned(&Command::Move(-9));
    roundtrip_owned(&Command::Paint {
        color: Pixel(9, 8, 7),
        strokes: vec![(1, 2), (3, 4), (5, 6)],
    });

    let frame = shapewire::to_vec(&Command::Move(1)).expect("encode");
    assert_eq!(frame[8], 1, "positional tag");
    assert_eq!(&frame[9..], &1i32.to_le_bytes());
}

#[test]
fn test_generic_struct_roundtrip() {
    roundtrip_flat(&Envelope { id: 1, body: 3.25f64 });
    roundtrip_owned(&Envelope {
        id: 2,
        body: vec![Some(1u8), None, Some(3)],
    });
    assert!(!<Envelope<u8> as Shape>::REQUIRES_ALLOCATION);
    assert!(<Envelope<Vec<u8>> as Shape>::REQUIRES_ALLOCATION);
}

#[test]
fn test_owned_containers_roundtrip() {
    roundtrip_owned(&Box::new(17u16));
    roundtrip_owned(&Box::new(Box::new(-1i8)));
    roundtrip_owned(&Vec::<u32>::new());
    roundtrip_owned(&vec![vec![1u8], vec![], vec![2, 3]]);
    roundtrip_owned(&Some(vec![Box::new(())]));
    roundtrip_owned(&[Some(Box::new(1u64)), None]);
    roundtrip_owned(&(Box::new(true), vec![0.25f32; 3], ()));
}

#[test]
fn test_nested_forest_roundtrip() {
    let forest = Forest {
        name: b"north".to_vec(),
        branches: vec![
            Branch {
                label: 1,
                leaves: vec![
                    Leaf {
                        label: 2,
                        weight: Some(Box::new(10)),
                    },
                    Leaf {
                        label: 3,
                        weight: None,
                    },
                ],
            },
            Branch {
                label: 4,
                leaves: vec![],
            },
        ],
    };
    let budget = Budget::unbounded();
    let frame = shapewire::to_vec(&forest).expect("encode");
    let back: Forest = shapewire::decode_owned(frame.as_slice(), &budget).expect("decode");
    assert_eq!(back, forest);
    // name, branches, the non-empty leaf slice, one boxed weight
    assert_eq!(budget.live_allocations(), 4);
    shapewire::release(&budget, back);
    assert_eq!(budget.live_allocations(), 0);
}

#[test]
fn test_randomized_roundtrips() {
    let mut rng = fastrand::Rng::with_seed(0x5EED);
    for _ in 0..200 {
        let len = rng.usize(0..32);
        let bytes: Vec<u8> = (0..len).map(|_| rng.u8(..)).collect();
        let words: Vec<i64> = (0..rng.usize(0..8)).map(|_| rng.i64(..)).collect();
        let value = (
            rng.u32(..),
            bytes,
            if rng.bool() { Some(rng.i16(..)) } else { None },
            words,
            f64::from_bits(rng.u64(..)),
        );

        let budget = Budget::unbounded();
        let frame = shapewire::to_vec(&value).expect("encode");
        let back: (u32, Vec<u8>, Option<i16>, Vec<i64>, f64) =
            shapewire::decode_owned(frame.as_slice(), &budget).expect("decode");
        assert_eq!(back.0, value.0);
        assert_eq!(back.1, value.1);
        assert_eq!(back.2, value.2);
        assert_eq!(back.3, value.3);
        assert_eq!(back.4.to_bits(), value.4.to_bits());
        shapewire::release(&budget, back);
        assert_eq!(budget.live_allocations(), 0);
    }
}
