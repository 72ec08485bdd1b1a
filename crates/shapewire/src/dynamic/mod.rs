// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime shapes.
//!
//! The typed path knows its shape at compile time. This module drives the
//! same encode, decode and release operations from a [`crate::TypeDescriptor`]
//! chosen at runtime, over a [`Value`] tree. Frames are interchangeable with
//! the typed path whenever the descriptors are equal.
//!
//! # Example
//!
//! ```
//! use shapewire::dynamic::{self, Value};
//! use shapewire::{IntType, TypeDescriptor};
//!
//! let desc = TypeDescriptor::Struct(vec![
//!     TypeDescriptor::Int(IntType::U16),
//!     TypeDescriptor::Bool,
//! ]);
//! let value = Value::Struct(vec![Value::UInt(300), Value::Bool(true)]);
//!
//! let frame = dynamic::to_vec(&desc, &value).unwrap();
//! let typed: (u16, bool) = shapewire::decode(frame.as_slice()).unwrap();
//! assert_eq!(typed, (300, true));
//! ```
//!
//! Pointer and slice nodes are charged to the allocator like on the typed
//! path, with `Value` as the element layout.

mod codec;
mod value;

pub use codec::{decode, decode_owned, decode_owned_with_limits, encode, release, to_vec};
pub use value::Value;
