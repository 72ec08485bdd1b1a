// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Tuples are anonymous structs.

use super::Shape;
use crate::alloc::Allocator;
use crate::classify::Classifier;
use crate::descriptor::TypeDescriptor;
use crate::error::Result;
use crate::wire::{WireReader, WireWriter};
use std::io::{Read, Write};

/// Decode fields in order; a failing field releases the ones before it.
macro_rules! decode_fields {
    ($r:ident, $alloc:ident; [$($done:ident)*];) => {};
    ($r:ident, $alloc:ident; [$($done:ident)*]; $next:ident: $type:ident $(, $rest:ident: $rest_type:ident)*) => {
        let $next = match <$type as Shape>::decode_payload($r, $alloc) {
            Ok(value) => value,
            Err(e) => {
                $( $done.release_payload($alloc); )*
                return Err(e);
            }
        };
        decode_fields!($r, $alloc; [$($done)* $next]; $($rest: $rest_type),*);
    };
}

macro_rules! impl_shape_tuple {
    ($($type:ident $var:ident),+) => {
        impl<$($type: Shape),+> Shape for ($($type,)+) {
            const REQUIRES_ALLOCATION: bool = $($type::REQUIRES_ALLOCATION)||+;

            fn classify(cx: &mut Classifier) -> Result<TypeDescriptor> {
                Ok(TypeDescriptor::Struct(vec![$($type::classify(cx)?),+]))
            }

            fn encode_payload<W: Write>(&self, w: &mut WireWriter<W>) -> Result<()> {
                let ($($var,)+) = self;
                $( $var.encode_payload(w)?; )+
                Ok(())
            }

            fn decode_payload<R: Read, A: Allocator + ?Sized>(
                r: &mut WireReader<R>,
                alloc: &A,
            ) -> Result<Self> {
                decode_fields!(r, alloc; []; $($var: $type),+);
                Ok(($($var,)+))
            }

            fn release_payload<A: Allocator + ?Sized>(self, alloc: &A) {
                let ($($var,)+) = self;
                $( $var.release_payload(alloc); )+
            }
        }
    };
}

impl_shape_tuple!(T0 t0);
impl_shape_tuple!(T0 t0, T1 t1);
impl_shape_tuple!(T0 t0, T1 t1, T2 t2);
impl_shape_tuple!(T0 t0, T1 t1, T2 t2, T3 t3);
impl_shape_tuple!(T0 t0, T1 t1, T2 t2, T3 t3, T4 t4);
impl_shape_tuple!(T0 t0, T1 t1, T2 t2, T3 t3, T4 t4, T5 t5);
impl_shape_tuple!(T0 t0, T1 t1, T2 t2, T3 t3, T4 t4, T5 t5, T6 t6);
impl_shape_tuple!(T0 t0, T1 t1, T2 t2, T3 t3, T4 t4, T5 t5, T6 t6, T7 t7);
