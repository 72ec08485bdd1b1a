// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The `Shape` trait and its implementations for built-in Rust types.
//!
//! `Shape` is the compile-time shape derivation step: every supported type
//! knows its descriptor, whether it holds pointer or slice nodes, and how to
//! encode, decode and release its payload. User types get an implementation
//! from `#[derive(Shape)]`.
//!
//! # Example
//!
//! ```
//! use shapewire::{Shape, TypeDescriptor, IntType};
//!
//! #[derive(Debug, PartialEq, Shape)]
//! struct Sample {
//!     id: u32,
//!     data: Vec<u8>,
//! }
//!
//! let desc = shapewire::classify::<Sample>().unwrap();
//! assert_eq!(
//!     desc,
//!     TypeDescriptor::Struct(vec![
//!         TypeDescriptor::Int(IntType::U32),
//!         TypeDescriptor::slice(TypeDescriptor::Int(IntType::U8)),
//!     ])
//! );
//! assert!(<Sample as Shape>::REQUIRES_ALLOCATION);
//! ```

mod containers;
mod primitives;
mod tuples;

use crate::alloc::Allocator;
use crate::classify::Classifier;
use crate::descriptor::TypeDescriptor;
use crate::error::{Error, Result};
use crate::wire::{WireReader, WireWriter};
use std::io::{Read, Write};
use std::ops::{Deref, DerefMut};

/// A type with a fixed, tree-shaped wire layout.
pub trait Shape: Sized + 'static {
    /// True iff the shape holds a pointer or slice node anywhere.
    ///
    /// Gates [`crate::decode`] at compile time.
    const REQUIRES_ALLOCATION: bool;

    /// Describe the shape. Nominal types go through [`Classifier::enter`].
    fn classify(cx: &mut Classifier) -> Result<TypeDescriptor>;

    /// Write the payload (no fingerprint).
    fn encode_payload<W: Write>(&self, w: &mut WireWriter<W>) -> Result<()>;

    /// Read the payload (no fingerprint), charging pointer and slice nodes to
    /// `alloc`. On failure every charge made by this call has been returned.
    fn decode_payload<R: Read, A: Allocator + ?Sized>(
        r: &mut WireReader<R>,
        alloc: &A,
    ) -> Result<Self>;

    /// Return every charge held by this value to `alloc`.
    fn release_payload<A: Allocator + ?Sized>(self, alloc: &A) {
        let _ = alloc;
    }
}

/// An error set: a fieldless enum identified by variant names.
///
/// Implemented by `#[derive(Shape)]` with `#[shape(error_set)]`.
pub trait ErrorSet: Shape {
    /// Variant names, sorted by bytes. The wire index is the position here.
    const NAMES: &'static [&'static str];

    /// Name of this error.
    fn name(&self) -> &'static str;

    /// Wire index of this error.
    fn index(&self) -> u16 {
        // NAMES always contains name(); the fallback is never taken.
        Self::NAMES
            .binary_search(&self.name())
            .map_or(u16::MAX, |i| i as u16)
    }
}

/// Fixed-length SIMD-style vector. Same wire layout as an array, different
/// fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Vector<T, const N: usize>(pub [T; N]);

impl<T, const N: usize> From<[T; N]> for Vector<T, N> {
    fn from(lanes: [T; N]) -> Self {
        Self(lanes)
    }
}

impl<T, const N: usize> Deref for Vector<T, N> {
    type Target = [T; N];

    fn deref(&self) -> &[T; N] {
        &self.0
    }
}

impl<T, const N: usize> DerefMut for Vector<T, N> {
    fn deref_mut(&mut self) -> &mut [T; N] {
        &mut self.0
    }
}

/// Error for a tag outside its declared domain.
#[doc(hidden)]
pub fn invalid_discriminant(shape: &'static str, value: impl Into<i128>) -> Error {
    Error::InvalidDiscriminant {
        shape,
        value: value.into(),
    }
}
