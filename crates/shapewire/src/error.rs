// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy shared by classification, encoding, decoding and release.

use crate::fingerprint::Fingerprint;
use std::fmt;
use std::io;

/// Why a shape was refused at classification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unsupported {
    /// The type transitively contains itself (only tree-shaped data is supported).
    Recursive { type_name: &'static str },
    /// A non-allocating decode was requested for a shape holding pointer/slice nodes.
    AllocationRequired,
    /// Integer width outside 8/16/32/64/128.
    IntWidth(u16),
    /// Float width outside 32/64.
    FloatWidth(u16),
    /// More error names than a 16-bit index can address.
    ErrorSetTooLarge(usize),
    /// Hand-built error set whose names are not sorted and distinct.
    UnsortedErrorSet,
    /// A tag domain does not fit the declared tag width.
    TagOverflow { bits: u16, variants: usize },
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unsupported::Recursive { type_name } => {
                write!(f, "recursive type {} (only tree-shaped data)", type_name)
            }
            Unsupported::AllocationRequired => {
                write!(f, "shape contains pointer or slice nodes; use decode_owned")
            }
            Unsupported::IntWidth(bits) => write!(f, "integer width {} bits", bits),
            Unsupported::FloatWidth(bits) => write!(f, "float width {} bits", bits),
            Unsupported::ErrorSetTooLarge(n) => write!(f, "error set with {} names", n),
            Unsupported::UnsortedErrorSet => write!(f, "error names not sorted and distinct"),
            Unsupported::TagOverflow { bits, variants } => {
                write!(f, "{} variants do not fit a {}-bit tag", variants, bits)
            }
        }
    }
}

/// Errors surfaced by every public operation.
#[derive(Debug)]
pub enum Error {
    /// Shape rejected before any I/O.
    UnsupportedType(Unsupported),
    /// Stream was produced for a structurally different shape.
    SchemaMismatch {
        expected: Fingerprint,
        found: Fingerprint,
    },
    /// Source ran dry in the middle of a read.
    UnexpectedEndOfStream,
    /// Enum, union or error-union tag outside its declared domain.
    InvalidDiscriminant { shape: &'static str, value: i128 },
    /// Implausible or overflowing length.
    InvalidLength { len: u64 },
    /// Allocator refused a charge, or the heap could not reserve.
    OutOfMemory,
    /// A dynamic value does not match the descriptor it is encoded against.
    ValueMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// Underlying sink/source failure, passed through unchanged.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedType(why) => write!(f, "Unsupported type: {}", why),
            Error::SchemaMismatch { expected, found } => write!(
                f,
                "Schema mismatch: expected fingerprint {}, found {}",
                expected, found
            ),
            Error::UnexpectedEndOfStream => write!(f, "Unexpected end of stream"),
            Error::InvalidDiscriminant { shape, value } => {
                write!(f, "Invalid {} discriminant: {}", shape, value)
            }
            Error::InvalidLength { len } => write!(f, "Invalid length: {}", len),
            Error::OutOfMemory => write!(f, "Out of memory"),
            Error::ValueMismatch { expected, found } => write!(
                f,
                "Value does not match descriptor: expected {}, found {}",
                expected, found
            ),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::UnexpectedEndOfStream
        } else {
            Error::Io(e)
        }
    }
}

impl From<Unsupported> for Error {
    fn from(why: Unsupported) -> Self {
        Error::UnsupportedType(why)
    }
}

/// Convenient alias for results using the crate `Error` type.
pub type Result<T> = core::result::Result<T, Error>;
