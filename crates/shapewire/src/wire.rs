// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Little-endian wire readers and writers over blocking byte streams.

use crate::alloc::Allocator;
use crate::config::{DecodeLimits, FINGERPRINT_LEN, PREALLOC_LIMIT_BYTES};
use crate::descriptor::IntType;
use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use std::alloc::Layout;
use std::io::{Read, Write};

/// Generate fixed-width little-endian write methods.
macro_rules! impl_write_le {
    ($($name:ident: $type:ty),+ $(,)?) => {
        $(
            pub fn $name(&mut self, value: $type) -> Result<()> {
                self.write_bytes(&value.to_le_bytes())
            }
        )+
    };
}

/// Generate fixed-width little-endian read methods.
macro_rules! impl_read_le {
    ($($name:ident: $type:ty),+ $(,)?) => {
        $(
            pub fn $name(&mut self) -> Result<$type> {
                Ok(<$type>::from_le_bytes(self.read_array()?))
            }
        )+
    };
}

/// Payload writer over a byte sink.
#[derive(Debug)]
pub struct WireWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> WireWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.inner.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    impl_write_le!(
        write_u8: u8,
        write_u16: u16,
        write_u32: u32,
        write_u64: u64,
        write_u128: u128,
        write_i8: i8,
        write_i16: i16,
        write_i32: i32,
        write_i64: i64,
        write_i128: i128,
    );

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(u8::from(value))
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.write_u32(value.to_bits())
    }

    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.write_u64(value.to_bits())
    }

    /// Write the low `bits / 8` bytes of `raw`, little-endian.
    pub fn write_raw(&mut self, bits: u16, raw: u128) -> Result<()> {
        let len = usize::from(bits / 8).min(16);
        self.write_bytes(&raw.to_le_bytes()[..len])
    }

    /// Write `value` at the width of `int` (two's complement when signed).
    pub fn write_int(&mut self, int: IntType, value: i128) -> Result<()> {
        self.write_raw(int.bits, value as u128)
    }

    pub fn write_fingerprint(&mut self, fingerprint: Fingerprint) -> Result<()> {
        self.write_bytes(fingerprint.as_bytes())
    }

    /// Bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Payload reader over a byte source.
#[derive(Debug)]
pub struct WireReader<R> {
    inner: R,
    consumed: u64,
    limits: DecodeLimits,
}

impl<R: Read> WireReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_limits(inner, DecodeLimits::default())
    }

    pub fn with_limits(inner: R, limits: DecodeLimits) -> Self {
        Self {
            inner,
            consumed: 0,
            limits,
        }
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_into(&mut buf)?;
        Ok(buf)
    }

    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buf)?;
        self.consumed += buf.len() as u64;
        Ok(())
    }

    impl_read_le!(
        read_u8: u8,
        read_u16: u16,
        read_u32: u32,
        read_u64: u64,
        read_u128: u128,
        read_i8: i8,
        read_i16: i16,
        read_i32: i32,
        read_i64: i64,
        read_i128: i128,
    );

    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::InvalidDiscriminant {
                shape: "bool",
                value: i128::from(other),
            }),
        }
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Read `bits / 8` little-endian bytes, zero-extended.
    pub fn read_raw(&mut self, bits: u16) -> Result<u128> {
        let len = usize::from(bits / 8).min(16);
        let mut buf = [0u8; 16];
        self.read_into(&mut buf[..len])?;
        Ok(u128::from_le_bytes(buf))
    }

    /// Read an integer of width `int`, sign-extending signed values.
    pub fn read_int(&mut self, int: IntType) -> Result<i128> {
        let raw = self.read_raw(int.bits)?;
        if int.signed && int.bits < 128 {
            let shift = 128 - u32::from(int.bits);
            Ok(((raw << shift) as i128) >> shift)
        } else {
            Ok(raw as i128)
        }
    }

    pub fn read_fingerprint(&mut self) -> Result<Fingerprint> {
        Ok(Fingerprint::from_bytes(self.read_array::<FINGERPRINT_LEN>()?))
    }

    /// Read the frame fingerprint and compare it with `expected`.
    pub fn expect_fingerprint(&mut self, expected: Fingerprint) -> Result<()> {
        let found = self.read_fingerprint()?;
        if found != expected {
            log::debug!(
                "[DECODE] schema mismatch: expected {}, found {}",
                expected,
                found
            );
            return Err(Error::SchemaMismatch { expected, found });
        }
        Ok(())
    }

    /// Read a slice length prefix for elements of type `T` and validate it
    /// against the limits and the allocator's capacity.
    ///
    /// Returns the element count and the layout to charge.
    pub fn read_slice_len<T, A: Allocator + ?Sized>(
        &mut self,
        alloc: &A,
    ) -> Result<(usize, Layout)> {
        let len = self.read_u64()?;
        let invalid = Error::InvalidLength { len };
        if !self.limits.admits(len) {
            return Err(invalid);
        }
        let Ok(count) = usize::try_from(len) else {
            return Err(invalid);
        };
        // Layout::array rejects size overflow and sizes beyond isize::MAX.
        let Ok(layout) = Layout::array::<T>(count) else {
            return Err(invalid);
        };
        // Zero-sized elements still cost one byte each against the capacity.
        let Some(cost) = count.checked_mul(std::mem::size_of::<T>().max(1)) else {
            return Err(invalid);
        };
        if alloc.capacity().is_some_and(|cap| cost > cap) {
            return Err(invalid);
        }
        Ok((count, layout))
    }

    /// Bytes consumed so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn limits(&self) -> DecodeLimits {
        self.limits
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Elements of `T` worth reserving before any of them has been read.
pub(crate) fn prealloc_count<T>(count: usize) -> usize {
    let size = std::mem::size_of::<T>().max(1);
    count.min(PREALLOC_LIMIT_BYTES / size)
}

/// Create a vector for `count` elements, reserving at most the prealloc limit.
pub(crate) fn reserve_vec<T>(count: usize) -> Result<Vec<T>> {
    let mut out = Vec::new();
    out.try_reserve_exact(prealloc_count::<T>(count))
        .map_err(|_| Error::OutOfMemory)?;
    Ok(out)
}
