// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shape kind tags.
//!
//! Every descriptor node is prefixed with its tag when fingerprinted, so these
//! values are part of the wire contract and must never be renumbered.

/// Closed set of shape kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(non_camel_case_types)]
pub enum ShapeKind {
    // --- Primitive shapes (0x00-0x0F) ---
    /// Zero-sized value
    SK_VOID = 0x00,

    /// Boolean (1 byte on the wire)
    SK_BOOL = 0x01,

    /// Fixed-width integer
    SK_INT = 0x02,

    /// IEEE floating point
    SK_FLOAT = 0x03,

    // --- Indirections (0x10-0x1F) ---
    /// Single owned pointee
    SK_POINTER = 0x10,

    /// Length-prefixed run of elements
    SK_SLICE = 0x11,

    /// Presence byte + child
    SK_OPTIONAL = 0x12,

    // --- Aggregates (0x20-0x2F) ---
    /// Fixed-length run of elements
    SK_ARRAY = 0x20,

    /// Fixed-length SIMD-style run of elements
    SK_VECTOR = 0x21,

    /// Ordered fields
    SK_STRUCT = 0x22,

    // --- Discriminated shapes (0x30-0x3F) ---
    /// Fieldless enumeration
    SK_ENUM = 0x30,

    /// Enumeration with per-variant payloads
    SK_TAGGED_UNION = 0x31,

    /// Name-identified error values
    SK_ERROR_SET = 0x32,

    /// Error or payload
    SK_ERROR_UNION = 0x33,
}

impl ShapeKind {
    /// Return the canonical u8 representation for this kind.
    pub const fn to_u8(self) -> u8 {
        match self {
            ShapeKind::SK_VOID => 0x00,
            ShapeKind::SK_BOOL => 0x01,
            ShapeKind::SK_INT => 0x02,
            ShapeKind::SK_FLOAT => 0x03,
            ShapeKind::SK_POINTER => 0x10,
            ShapeKind::SK_SLICE => 0x11,
            ShapeKind::SK_OPTIONAL => 0x12,
            ShapeKind::SK_ARRAY => 0x20,
            ShapeKind::SK_VECTOR => 0x21,
            ShapeKind::SK_STRUCT => 0x22,
            ShapeKind::SK_ENUM => 0x30,
            ShapeKind::SK_TAGGED_UNION => 0x31,
            ShapeKind::SK_ERROR_SET => 0x32,
            ShapeKind::SK_ERROR_UNION => 0x33,
        }
    }

    /// Short lowercase name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            ShapeKind::SK_VOID => "void",
            ShapeKind::SK_BOOL => "bool",
            ShapeKind::SK_INT => "int",
            ShapeKind::SK_FLOAT => "float",
            ShapeKind::SK_POINTER => "pointer",
            ShapeKind::SK_SLICE => "slice",
            ShapeKind::SK_OPTIONAL => "optional",
            ShapeKind::SK_ARRAY => "array",
            ShapeKind::SK_VECTOR => "vector",
            ShapeKind::SK_STRUCT => "struct",
            ShapeKind::SK_ENUM => "enum",
            ShapeKind::SK_TAGGED_UNION => "tagged union",
            ShapeKind::SK_ERROR_SET => "error set",
            ShapeKind::SK_ERROR_UNION => "error union",
        }
    }
}
