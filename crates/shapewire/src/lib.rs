// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # shapewire - fingerprinted binary serialization
//!
//! Encodes tree-shaped Rust values into a compact little-endian layout and
//! decodes them back, refusing bytes produced for any other shape.
//!
//! ## Quick Start
//!
//! ```rust
//! use shapewire::{Budget, Shape};
//!
//! #[derive(Debug, PartialEq, Shape)]
//! struct Sample {
//!     a: u32,
//!     b: Vec<u8>,
//! }
//!
//! let value = Sample { a: 7, b: vec![1, 2, 3] };
//! let frame = shapewire::to_vec(&value).unwrap();
//! assert_eq!(frame.len(), 8 + 4 + 8 + 3);
//!
//! let budget = Budget::unbounded();
//! let back: Sample = shapewire::decode_owned(frame.as_slice(), &budget).unwrap();
//! assert_eq!(back, value);
//! shapewire::release(&budget, back);
//! assert_eq!(budget.live_allocations(), 0);
//! ```
//!
//! ## Frame
//!
//! ```text
//! +----------------------+------------------------------------------+
//! | fingerprint (8 bytes)| payload (shape-directed, no padding)     |
//! +----------------------+------------------------------------------+
//! ```
//!
//! The fingerprint is a truncated MD5 of the shape's canonical descriptor.
//! Field and variant names never enter it; error-set names do.
//!
//! ## Type Mapping
//!
//! | Rust | Descriptor |
//! |------|------------|
//! | `()`, `PhantomData<T>` | `Void` |
//! | `bool` | `Bool` |
//! | `u8`..`u128`, `i8`..`i128`, `usize`, `isize` | `Int` (`usize` as `u64`) |
//! | `f32`, `f64` | `Float` |
//! | `Box<T>` | `Pointer` |
//! | `Vec<T>` | `Slice` |
//! | `[T; N]` / [`Vector<T, N>`] | `Array` / `Vector` |
//! | `Option<T>` | `Optional` |
//! | tuples, derived structs | `Struct` |
//! | derived fieldless enums | `Enum` |
//! | derived `#[shape(error_set)]` enums | `ErrorSet` |
//! | `Result<T, E: ErrorSet>` | `ErrorUnion` |
//! | derived enums with data | `TaggedUnion` |
//!
//! ## Allocation
//!
//! [`decode`] only accepts shapes without `Pointer` or `Slice` nodes; asking
//! it for anything else is a compile error. [`decode_owned`] handles every
//! shape and charges each pointer and slice node to an [`Allocator`];
//! [`release`] hands the charges back.
//!
//! ## Modules Overview
//!
//! - [`descriptor`] - canonical type descriptors
//! - [`fingerprint`] - 8-byte shape digests
//! - [`schema`] - framed encode/decode/release
//! - [`dynamic`] - the same operations over runtime descriptors

// Allow the derive macro to work inside this crate's tests
extern crate self as shapewire;

/// Allocator interface charged by the allocating decoder.
pub mod alloc;
/// Memo of classified shapes and their fingerprints.
pub mod cache;
/// Shape classification (in-progress tracking, recursion rejection).
pub mod classify;
/// Wire constants and decode limits.
pub mod config;
/// Canonical type descriptors.
pub mod descriptor;
/// Descriptor-driven values for shapes known only at runtime.
pub mod dynamic;
/// Error types.
pub mod error;
/// Shape fingerprints.
pub mod fingerprint;
/// Descriptor kind tags.
pub mod kind;
/// Framed encode, decode and release.
pub mod schema;
/// The `Shape` trait and built-in implementations.
pub mod shape;
/// Little-endian stream readers and writers.
pub mod wire;

pub use alloc::{AllocError, Allocator, Budget, BudgetStats, Heap};
pub use cache::{FingerprintCache, Prepared};
pub use classify::{classify, requires_allocation, Classifier};
pub use config::DecodeLimits;
pub use descriptor::{FloatType, IntType, TypeDescriptor};
pub use error::{Error, Result, Unsupported};
pub use fingerprint::{fingerprint, Fingerprint};
pub use kind::ShapeKind;
pub use schema::{
    decode, decode_owned, encode, fingerprint_of, release, to_vec, Decoder, Schema,
};
pub use shape::{ErrorSet, Shape, Vector};
// Derive macro (for #[derive(shapewire::Shape)])
pub use shapewire_codegen::Shape;

/// shapewire version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
