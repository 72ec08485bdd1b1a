// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fuzz target for descriptor-driven decoding
//!
//! Whatever the dynamic decoder accepts must re-encode to the same bytes.

#![no_main]

use libfuzzer_sys::fuzz_target;
use shapewire::dynamic;
use shapewire::{Budget, FloatType, IntType, TypeDescriptor};

fn descriptor() -> TypeDescriptor {
    TypeDescriptor::Struct(vec![
        TypeDescriptor::enumeration(IntType::I8, [-1, 0, 7]),
        TypeDescriptor::optional(TypeDescriptor::Float(FloatType::F64)),
        TypeDescriptor::slice(TypeDescriptor::TaggedUnion {
            tag: IntType::U8,
            variants: vec![
                TypeDescriptor::Void,
                TypeDescriptor::Int(IntType::U16),
                TypeDescriptor::error_union(["Closed", "Busy"], TypeDescriptor::Bool),
            ],
        }),
        TypeDescriptor::pointer(TypeDescriptor::vector(2, TypeDescriptor::Int(IntType::I128))),
    ])
}

fuzz_target!(|data: &[u8]| {
    let desc = descriptor();
    let mut frame = shapewire::fingerprint(&desc).as_bytes().to_vec();
    frame.extend_from_slice(data);

    let budget = Budget::with_capacity(1 << 16);
    if let Ok(value) = dynamic::decode_owned(frame.as_slice(), &desc, &budget) {
        let again = dynamic::to_vec(&desc, &value).expect("decoded value re-encodes");
        assert_eq!(again.as_slice(), &frame[..again.len()]);
        dynamic::release(&budget, &desc, value);
    }
    assert_eq!(budget.live_allocations(), 0);
});
