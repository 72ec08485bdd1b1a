// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::Shape;
use crate::alloc::Allocator;
use crate::classify::Classifier;
use crate::descriptor::{FloatType, IntType, TypeDescriptor};
use crate::error::{Error, Result};
use crate::wire::{WireReader, WireWriter};
use std::io::{Read, Write};
use std::marker::PhantomData;

macro_rules! impl_shape_int {
    ($($type:ty => $int:ident, $write:ident, $read:ident);+ $(;)?) => {
        $(
            impl Shape for $type {
                const REQUIRES_ALLOCATION: bool = false;

                fn classify(_cx: &mut Classifier) -> Result<TypeDescriptor> {
                    Ok(TypeDescriptor::Int(IntType::$int))
                }

                fn encode_payload<W: Write>(&self, w: &mut WireWriter<W>) -> Result<()> {
                    w.$write(*self)
                }

                fn decode_payload<R: Read, A: Allocator + ?Sized>(
                    r: &mut WireReader<R>,
                    _alloc: &A,
                ) -> Result<Self> {
                    r.$read()
                }
            }
        )+
    };
}

impl_shape_int! {
    u8 => U8, write_u8, read_u8;
    u16 => U16, write_u16, read_u16;
    u32 => U32, write_u32, read_u32;
    u64 => U64, write_u64, read_u64;
    u128 => U128, write_u128, read_u128;
    i8 => I8, write_i8, read_i8;
    i16 => I16, write_i16, read_i16;
    i32 => I32, write_i32, read_i32;
    i64 => I64, write_i64, read_i64;
    i128 => I128, write_i128, read_i128;
}

// Platform-width integers travel as their 64-bit canonical form.
impl Shape for usize {
    const REQUIRES_ALLOCATION: bool = false;

    fn classify(_cx: &mut Classifier) -> Result<TypeDescriptor> {
        Ok(TypeDescriptor::Int(IntType::U64))
    }

    fn encode_payload<W: Write>(&self, w: &mut WireWriter<W>) -> Result<()> {
        w.write_u64(*self as u64)
    }

    fn decode_payload<R: Read, A: Allocator + ?Sized>(
        r: &mut WireReader<R>,
        _alloc: &A,
    ) -> Result<Self> {
        let raw = r.read_u64()?;
        usize::try_from(raw).map_err(|_| Error::InvalidLength { len: raw })
    }
}

impl Shape for isize {
    const REQUIRES_ALLOCATION: bool = false;

    fn classify(_cx: &mut Classifier) -> Result<TypeDescriptor> {
        Ok(TypeDescriptor::Int(IntType::I64))
    }

    fn encode_payload<W: Write>(&self, w: &mut WireWriter<W>) -> Result<()> {
        w.write_i64(*self as i64)
    }

    fn decode_payload<R: Read, A: Allocator + ?Sized>(
        r: &mut WireReader<R>,
        _alloc: &A,
    ) -> Result<Self> {
        let raw = r.read_i64()?;
        isize::try_from(raw).map_err(|_| Error::InvalidLength { len: raw as u64 })
    }
}

impl Shape for f32 {
    const REQUIRES_ALLOCATION: bool = false;

    fn classify(_cx: &mut Classifier) -> Result<TypeDescriptor> {
        Ok(TypeDescriptor::Float(FloatType::F32))
    }

    fn encode_payload<W: Write>(&self, w: &mut WireWriter<W>) -> Result<()> {
        w.write_f32(*self)
    }

    fn decode_payload<R: Read, A: Allocator + ?Sized>(
        r: &mut WireReader<R>,
        _alloc: &A,
    ) -> Result<Self> {
        r.read_f32()
    }
}

impl Shape for f64 {
    const REQUIRES_ALLOCATION: bool = false;

    fn classify(_cx: &mut Classifier) -> Result<TypeDescriptor> {
        Ok(TypeDescriptor::Float(FloatType::F64))
    }

    fn encode_payload<W: Write>(&self, w: &mut WireWriter<W>) -> Result<()> {
        w.write_f64(*self)
    }

    fn decode_payload<R: Read, A: Allocator + ?Sized>(
        r: &mut WireReader<R>,
        _alloc: &A,
    ) -> Result<Self> {
        r.read_f64()
    }
}

impl Shape for bool {
    const REQUIRES_ALLOCATION: bool = false;

    fn classify(_cx: &mut Classifier) -> Result<TypeDescriptor> {
        Ok(TypeDescriptor::Bool)
    }

    fn encode_payload<W: Write>(&self, w: &mut WireWriter<W>) -> Result<()> {
        w.write_bool(*self)
    }

    fn decode_payload<R: Read, A: Allocator + ?Sized>(
        r: &mut WireReader<R>,
        _alloc: &A,
    ) -> Result<Self> {
        r.read_bool()
    }
}

impl Shape for () {
    const REQUIRES_ALLOCATION: bool = false;

    fn classify(_cx: &mut Classifier) -> Result<TypeDescriptor> {
        Ok(TypeDescriptor::Void)
    }

    fn encode_payload<W: Write>(&self, _w: &mut WireWriter<W>) -> Result<()> {
        Ok(())
    }

    fn decode_payload<R: Read, A: Allocator + ?Sized>(
        _r: &mut WireReader<R>,
        _alloc: &A,
    ) -> Result<Self> {
        Ok(())
    }
}

impl<T: ?Sized + 'static> Shape for PhantomData<T> {
    const REQUIRES_ALLOCATION: bool = false;

    fn classify(_cx: &mut Classifier) -> Result<TypeDescriptor> {
        Ok(TypeDescriptor::Void)
    }

    fn encode_payload<W: Write>(&self, _w: &mut WireWriter<W>) -> Result<()> {
        Ok(())
    }

    fn decode_payload<R: Read, A: Allocator + ?Sized>(
        _r: &mut WireReader<R>,
        _alloc: &A,
    ) -> Result<Self> {
        Ok(PhantomData)
    }
}
