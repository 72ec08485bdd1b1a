// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Framed encode, decode and release for statically typed values.
//!
//! A frame is the 8-byte fingerprint of the value's shape followed by its
//! payload. Decoding checks the fingerprint before touching the payload.

use crate::alloc::{Allocator, NoAlloc};
use crate::cache::{FingerprintCache, Prepared};
use crate::config::DecodeLimits;
use crate::descriptor::TypeDescriptor;
use crate::error::Result;
use crate::fingerprint::Fingerprint;
use crate::shape::Shape;
use crate::wire::{WireReader, WireWriter};
use std::io::{Read, Write};
use std::marker::PhantomData;
use std::sync::Arc;

/// Compile-time refusal of non-allocating decodes for allocating shapes.
struct NonAllocating<T>(PhantomData<T>);

impl<T: Shape> NonAllocating<T> {
    const OK: () = assert!(
        !T::REQUIRES_ALLOCATION,
        "shape contains pointer or slice nodes; use decode_owned"
    );
}

/// Prepared shape of `T`: descriptor and fingerprint, computed once.
#[derive(Debug)]
pub struct Schema<T> {
    prepared: Arc<Prepared>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Schema<T> {
    fn clone(&self) -> Self {
        Self {
            prepared: Arc::clone(&self.prepared),
            _marker: PhantomData,
        }
    }
}

impl<T: Shape> Schema<T> {
    /// Classify `T` (through the global cache).
    pub fn new() -> Result<Self> {
        Ok(Self {
            prepared: FingerprintCache::global().get_or_classify::<T>()?,
            _marker: PhantomData,
        })
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.prepared.descriptor
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.prepared.fingerprint
    }

    pub fn requires_allocation(&self) -> bool {
        self.prepared.requires_allocation
    }

    /// Write the frame for `value` to `sink`.
    pub fn encode<W: Write>(&self, sink: W, value: &T) -> Result<()> {
        let mut w = WireWriter::new(sink);
        w.write_fingerprint(self.fingerprint())?;
        value.encode_payload(&mut w)
    }

    /// Frame `value` into a fresh buffer.
    pub fn to_vec(&self, value: &T) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.encode(&mut out, value)?;
        Ok(out)
    }

    /// Decode a shape without pointer or slice nodes.
    ///
    /// Calling this for an allocating shape fails to compile.
    pub fn decode<R: Read>(&self, source: R) -> Result<T> {
        #[allow(clippy::let_unit_value)]
        let () = NonAllocating::<T>::OK;
        self.decode_with(source, DecodeLimits::default(), &NoAlloc)
    }

    /// Decode any shape, charging pointer and slice nodes to `alloc`.
    pub fn decode_owned<R: Read, A: Allocator + ?Sized>(&self, source: R, alloc: &A) -> Result<T> {
        self.decode_with(source, DecodeLimits::default(), alloc)
    }

    /// Return every charge held by `value` to `alloc`.
    pub fn release<A: Allocator + ?Sized>(&self, alloc: &A, value: T) {
        value.release_payload(alloc);
    }

    fn decode_with<R: Read, A: Allocator + ?Sized>(
        &self,
        source: R,
        limits: DecodeLimits,
        alloc: &A,
    ) -> Result<T> {
        let mut r = WireReader::with_limits(source, limits);
        r.expect_fingerprint(self.fingerprint())?;
        T::decode_payload(&mut r, alloc)
    }
}

/// Decoder carrying limits for untrusted input.
///
/// ```
/// use shapewire::{Budget, DecodeLimits, Decoder, Error};
///
/// let frame = shapewire::to_vec(&vec![0u8; 32]).unwrap();
/// let decoder = Decoder::new(DecodeLimits::unlimited().max_slice_len(16));
/// let budget = Budget::unbounded();
/// let err = decoder.decode_owned::<Vec<u8>, _, _>(frame.as_slice(), &budget).unwrap_err();
/// assert!(matches!(err, Error::InvalidLength { len: 32 }));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder {
    limits: DecodeLimits,
}

impl Decoder {
    pub fn new(limits: DecodeLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> DecodeLimits {
        self.limits
    }

    /// See [`decode`].
    pub fn decode<T: Shape, R: Read>(&self, source: R) -> Result<T> {
        #[allow(clippy::let_unit_value)]
        let () = NonAllocating::<T>::OK;
        Schema::<T>::new()?.decode_with(source, self.limits, &NoAlloc)
    }

    /// See [`decode_owned`].
    pub fn decode_owned<T: Shape, R: Read, A: Allocator + ?Sized>(
        &self,
        source: R,
        alloc: &A,
    ) -> Result<T> {
        Schema::<T>::new()?.decode_with(source, self.limits, alloc)
    }
}

/// Encode `value` as a frame into `sink`.
pub fn encode<T: Shape, W: Write>(sink: W, value: &T) -> Result<()> {
    Schema::<T>::new()?.encode(sink, value)
}

/// Encode `value` as a frame into a new buffer.
pub fn to_vec<T: Shape>(value: &T) -> Result<Vec<u8>> {
    Schema::<T>::new()?.to_vec(value)
}

/// Decode a frame of a non-allocating shape from `source`.
///
/// Only available for shapes without pointer or slice nodes; the check
/// happens at compile time.
pub fn decode<T: Shape, R: Read>(source: R) -> Result<T> {
    Decoder::default().decode(source)
}

/// Decode a frame of any shape, charging allocations to `alloc`.
///
/// On error, every charge made while decoding has already been returned.
pub fn decode_owned<T: Shape, R: Read, A: Allocator + ?Sized>(source: R, alloc: &A) -> Result<T> {
    Decoder::default().decode_owned(source, alloc)
}

/// Return every pointer and slice charge held by `value` to `alloc`.
pub fn release<T: Shape, A: Allocator + ?Sized>(alloc: &A, value: T) {
    value.release_payload(alloc);
}

/// Fingerprint of `T`'s shape.
pub fn fingerprint_of<T: Shape>() -> Result<Fingerprint> {
    Ok(FingerprintCache::global().get_or_classify::<T>()?.fingerprint)
}
