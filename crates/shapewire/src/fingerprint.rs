// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema fingerprints.
//!
//! A `Fingerprint` is an 8-byte digest of a [`TypeDescriptor`], written at the
//! head of every frame. It is a cheap compatibility token, not an integrity
//! check.
//!
//! # Hashing rules
//!
//! The descriptor tree is walked depth-first and fed into a streaming MD5:
//!
//! 1. every node contributes its [`ShapeKind`] tag byte first;
//! 2. counts and lengths are hashed as little-endian `u64`;
//! 3. struct fields and union variants are hashed in declared order;
//! 4. error names are hashed sorted by bytes, length-prefixed.
//!
//! Union variants are positional and error names are not: reordering variants
//! changes the fingerprint, reordering error declarations does not.

use crate::descriptor::{IntType, TypeDescriptor};
use crate::kind::ShapeKind;
use md5::{Digest, Md5};
use std::fmt;

/// 8-byte canonical digest of a shape.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fingerprint([u8; 8]);

impl Fingerprint {
    /// Create from raw 8-byte array
    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Get the raw 8-byte array
    pub const fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Compute the fingerprint of `descriptor`.
    ///
    /// MD5 (16 bytes) over the canonical traversal, truncated to 8 bytes.
    pub fn compute(descriptor: &TypeDescriptor) -> Self {
        let mut hasher = Md5::new();
        hash_node(&mut hasher, descriptor);
        let digest = hasher.finalize();

        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        Self(bytes)
    }
}

fn hash_tag(hasher: &mut Md5, kind: ShapeKind) {
    hasher.update([kind.to_u8()]);
}

fn hash_len(hasher: &mut Md5, len: u64) {
    hasher.update(len.to_le_bytes());
}

fn hash_int(hasher: &mut Md5, int: IntType) {
    hasher.update(int.bits.to_le_bytes());
    hasher.update([u8::from(int.signed)]);
}

fn hash_names(hasher: &mut Md5, names: &[String]) {
    let mut sorted: Vec<&str> = names.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();
    hash_tag(hasher, ShapeKind::SK_ERROR_SET);
    hash_len(hasher, sorted.len() as u64);
    for name in sorted {
        hash_len(hasher, name.len() as u64);
        hasher.update(name.as_bytes());
    }
}

fn hash_node(hasher: &mut Md5, node: &TypeDescriptor) {
    match node {
        TypeDescriptor::ErrorSet(names) => hash_names(hasher, names),
        _ => hash_tag(hasher, node.kind()),
    }
    match node {
        TypeDescriptor::Void | TypeDescriptor::Bool | TypeDescriptor::ErrorSet(_) => {}
        TypeDescriptor::Int(int) => hash_int(hasher, *int),
        TypeDescriptor::Float(float) => hasher.update(float.bits.to_le_bytes()),
        TypeDescriptor::Pointer(child)
        | TypeDescriptor::Slice(child)
        | TypeDescriptor::Optional(child) => hash_node(hasher, child),
        TypeDescriptor::Array { len, child } | TypeDescriptor::Vector { len, child } => {
            hash_len(hasher, *len);
            hash_node(hasher, child);
        }
        TypeDescriptor::Struct(fields) => {
            hash_len(hasher, fields.len() as u64);
            for field in fields {
                hash_node(hasher, field);
            }
        }
        TypeDescriptor::ErrorUnion { set, payload } => {
            hash_names(hasher, set);
            hash_node(hasher, payload);
        }
        TypeDescriptor::Enum { tag, values } => {
            hash_int(hasher, *tag);
            let mut sorted = values.clone();
            sorted.sort_unstable();
            sorted.dedup();
            hash_len(hasher, sorted.len() as u64);
            for value in sorted {
                hasher.update(value.to_le_bytes());
            }
        }
        TypeDescriptor::TaggedUnion { tag, variants } => {
            hash_int(hasher, *tag);
            hash_len(hasher, variants.len() as u64);
            for variant in variants {
                hash_node(hasher, variant);
            }
        }
    }
}

/// Compute the fingerprint of `descriptor`.
pub fn fingerprint(descriptor: &TypeDescriptor) -> Fingerprint {
    Fingerprint::compute(descriptor)
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint(")?;
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl From<[u8; 8]> for Fingerprint {
    fn from(bytes: [u8; 8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl AsRef<[u8]> for Fingerprint {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_t() -> TypeDescriptor {
        TypeDescriptor::Int(IntType::U32)
    }

    fn u8_t() -> TypeDescriptor {
        TypeDescriptor::Int(IntType::U8)
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let desc = TypeDescriptor::Struct(vec![u32_t(), TypeDescriptor::slice(u8_t())]);
        assert_eq!(fingerprint(&desc), fingerprint(&desc.clone()));
        assert_eq!(fingerprint(&desc).as_bytes().len(), 8);
    }

    #[test]
    fn test_field_order_matters() {
        let a = TypeDescriptor::Struct(vec![u32_t(), u8_t()]);
        let b = TypeDescriptor::Struct(vec![u8_t(), u32_t()]);
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_nesting_is_not_flattened() {
        let flat = TypeDescriptor::Struct(vec![u8_t(), u8_t()]);
        let nested = TypeDescriptor::Struct(vec![TypeDescriptor::Struct(vec![u8_t()]), u8_t()]);
        assert_ne!(fingerprint(&flat), fingerprint(&nested));
    }

    #[test]
    fn test_error_names_order_insensitive() {
        let a = TypeDescriptor::ErrorSet(vec!["Closed".into(), "Busy".into()]);
        let b = TypeDescriptor::error_set(["Busy", "Closed"]);
        assert_eq!(fingerprint(&a), fingerprint(&b));
        let c = TypeDescriptor::error_set(["Busy", "Shut"]);
        assert_ne!(fingerprint(&b), fingerprint(&c));
    }

    #[test]
    fn test_union_variants_are_positional() {
        let a = TypeDescriptor::TaggedUnion {
            tag: IntType::U8,
            variants: vec![u8_t(), u32_t()],
        };
        let b = TypeDescriptor::TaggedUnion {
            tag: IntType::U8,
            variants: vec![u32_t(), u8_t()],
        };
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_array_length_and_kind_matter() {
        let a = TypeDescriptor::array(3, u8_t());
        let b = TypeDescriptor::array(4, u8_t());
        let v = TypeDescriptor::vector(3, u8_t());
        assert_ne!(fingerprint(&a), fingerprint(&b));
        assert_ne!(fingerprint(&a), fingerprint(&v));
    }

    #[test]
    fn test_signedness_matters() {
        assert_ne!(
            fingerprint(&TypeDescriptor::Int(IntType::U64)),
            fingerprint(&TypeDescriptor::Int(IntType::I64))
        );
    }

    #[test]
    fn test_fingerprint_debug_display() {
        let fp = Fingerprint::from_bytes([0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef]);
        assert_eq!(format!("{:?}", fp), "Fingerprint(0123456789abcdef)");
        assert_eq!(format!("{}", fp), "0123456789abcdef");
        let slice: &[u8] = fp.as_ref();
        assert_eq!(slice, &[0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef]);
    }
}
