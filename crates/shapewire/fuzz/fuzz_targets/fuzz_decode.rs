// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fuzz target for typed frame decoding
//!
//! Treats the input as a payload behind a valid fingerprint so the decoder
//! gets past the header. Decoding must never panic, and every charge made by
//! a failed decode must be returned.

#![no_main]

use libfuzzer_sys::fuzz_target;
use shapewire::{Budget, Schema, Shape, Vector};

#[derive(Debug, Clone, Copy, PartialEq, Shape)]
#[shape(error_set)]
enum Fault {
    Busy,
    Closed,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Shape)]
enum Level {
    Low = 1,
    High = 9,
}

#[derive(Debug, PartialEq, Shape)]
enum Body {
    Empty,
    Word(u32),
    Bytes(Vec<u8>),
    Nested { inner: Box<Option<i16>>, list: Vec<Vec<u16>> },
}

#[derive(Debug, PartialEq, Shape)]
struct Envelope {
    level: Level,
    lanes: Vector<f32, 2>,
    outcome: Result<[bool; 3], Fault>,
    body: Body,
    tail: Option<Box<u64>>,
}

fn framed<T: Shape>(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(8 + payload.len());
    if let Ok(schema) = Schema::<T>::new() {
        frame.extend_from_slice(schema.fingerprint().as_bytes());
    }
    frame.extend_from_slice(payload);
    frame
}

fn check_owned<T: Shape>(payload: &[u8]) {
    let frame = framed::<T>(payload);
    let budget = Budget::with_capacity(1 << 16);
    if let Ok(value) = shapewire::decode_owned::<T, _, _>(frame.as_slice(), &budget) {
        shapewire::release(&budget, value);
    }
    assert_eq!(budget.live_allocations(), 0);
}

fuzz_target!(|data: &[u8]| {
    // ----------------------------------------------------------------
    // 1. Raw input as a whole frame - almost always a schema mismatch
    // ----------------------------------------------------------------
    let _ = shapewire::decode::<u64, _>(data);

    // ----------------------------------------------------------------
    // 2. Non-allocating shapes - must not panic
    // ----------------------------------------------------------------
    let _ = shapewire::decode::<bool, _>(framed::<bool>(data).as_slice());
    let _ = shapewire::decode::<Level, _>(framed::<Level>(data).as_slice());
    let _ = shapewire::decode::<Fault, _>(framed::<Fault>(data).as_slice());
    let _ = shapewire::decode::<(Option<i8>, Result<u16, Fault>), _>(
        framed::<(Option<i8>, Result<u16, Fault>)>(data).as_slice(),
    );

    // ----------------------------------------------------------------
    // 3. Allocating shapes - must not panic, must balance the budget
    // ----------------------------------------------------------------
    check_owned::<Vec<u8>>(data);
    check_owned::<Vec<Vec<u32>>>(data);
    check_owned::<Body>(data);
    check_owned::<Envelope>(data);
});
