// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Canonical type descriptors.
//!
//! A `TypeDescriptor` is the closed-taxonomy description of a value's shape.
//! It carries no names for fields or variants; only error-set names survive,
//! because error identity is name-based.

use crate::error::Unsupported;
use crate::kind::ShapeKind;
use std::fmt;

/// Fixed-width integer shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntType {
    pub bits: u16,
    pub signed: bool,
}

impl IntType {
    pub const U8: Self = Self::new(8, false);
    pub const U16: Self = Self::new(16, false);
    pub const U32: Self = Self::new(32, false);
    pub const U64: Self = Self::new(64, false);
    pub const U128: Self = Self::new(128, false);
    pub const I8: Self = Self::new(8, true);
    pub const I16: Self = Self::new(16, true);
    pub const I32: Self = Self::new(32, true);
    pub const I64: Self = Self::new(64, true);
    pub const I128: Self = Self::new(128, true);

    pub const fn new(bits: u16, signed: bool) -> Self {
        Self { bits, signed }
    }

    /// Encoded size in bytes.
    pub const fn byte_len(self) -> usize {
        (self.bits / 8) as usize
    }

    pub(crate) fn validate(self) -> Result<(), Unsupported> {
        match self.bits {
            8 | 16 | 32 | 64 | 128 => Ok(()),
            other => Err(Unsupported::IntWidth(other)),
        }
    }

    /// Whether `value` is representable at this width and signedness.
    pub fn contains(self, value: i128) -> bool {
        if self.bits >= 128 {
            return self.signed || value >= 0;
        }
        if self.signed {
            let half = 1i128 << (self.bits - 1);
            (-half..half).contains(&value)
        } else {
            (0..(1i128 << self.bits)).contains(&value)
        }
    }

    /// Smallest width holding every value in `values`; unsigned unless a value
    /// is negative.
    pub const fn fitting(values: &[i128]) -> Self {
        let mut min = 0i128;
        let mut max = 0i128;
        let mut i = 0;
        while i < values.len() {
            if values[i] < min {
                min = values[i];
            }
            if values[i] > max {
                max = values[i];
            }
            i += 1;
        }

        let signed = min < 0;
        let mut bits = 8u16;
        while bits < 128 {
            let fits = if signed {
                let half = 1i128 << (bits - 1);
                min >= -half && max < half
            } else {
                max < 1i128 << bits
            };
            if fits {
                break;
            }
            bits *= 2;
        }
        Self::new(bits, signed)
    }

    /// Smallest unsigned width able to index `count` positional tags.
    pub const fn positional(count: usize) -> Self {
        if count <= 1 << 8 {
            Self::U8
        } else if count <= 1 << 16 {
            Self::U16
        } else {
            Self::U32
        }
    }
}

impl fmt::Display for IntType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", if self.signed { 'i' } else { 'u' }, self.bits)
    }
}

/// IEEE floating point shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FloatType {
    pub bits: u16,
}

impl FloatType {
    pub const F32: Self = Self { bits: 32 };
    pub const F64: Self = Self { bits: 64 };
}

/// Shape of a value, see the crate docs for the Rust type mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeDescriptor {
    Void,
    Bool,
    Int(IntType),
    Float(FloatType),
    /// Exactly one owned pointee.
    Pointer(Box<TypeDescriptor>),
    /// Runtime-length run of elements.
    Slice(Box<TypeDescriptor>),
    Array {
        len: u64,
        child: Box<TypeDescriptor>,
    },
    Vector {
        len: u64,
        child: Box<TypeDescriptor>,
    },
    /// Field shapes in declared order.
    Struct(Vec<TypeDescriptor>),
    Optional(Box<TypeDescriptor>),
    /// Sorted, distinct error names.
    ErrorSet(Vec<String>),
    ErrorUnion {
        set: Vec<String>,
        payload: Box<TypeDescriptor>,
    },
    /// Fieldless enum: tag width plus the ascending discriminant domain.
    Enum { tag: IntType, values: Vec<i128> },
    /// Variant payload shapes in declared order; tags are positional.
    TaggedUnion {
        tag: IntType,
        variants: Vec<TypeDescriptor>,
    },
}

impl TypeDescriptor {
    pub fn pointer(child: TypeDescriptor) -> Self {
        TypeDescriptor::Pointer(Box::new(child))
    }

    pub fn slice(child: TypeDescriptor) -> Self {
        TypeDescriptor::Slice(Box::new(child))
    }

    pub fn array(len: u64, child: TypeDescriptor) -> Self {
        TypeDescriptor::Array {
            len,
            child: Box::new(child),
        }
    }

    pub fn vector(len: u64, child: TypeDescriptor) -> Self {
        TypeDescriptor::Vector {
            len,
            child: Box::new(child),
        }
    }

    pub fn optional(child: TypeDescriptor) -> Self {
        TypeDescriptor::Optional(Box::new(child))
    }

    /// Build an error set; names are sorted by bytes and deduplicated.
    pub fn error_set<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TypeDescriptor::ErrorSet(canonical_names(names))
    }

    /// Build an error union over `names` (canonicalized like [`Self::error_set`]).
    pub fn error_union<I, S>(names: I, payload: TypeDescriptor) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TypeDescriptor::ErrorUnion {
            set: canonical_names(names),
            payload: Box::new(payload),
        }
    }

    /// Build a fieldless enum; the domain is sorted and deduplicated.
    pub fn enumeration(tag: IntType, values: impl IntoIterator<Item = i128>) -> Self {
        let mut values: Vec<i128> = values.into_iter().collect();
        values.sort_unstable();
        values.dedup();
        TypeDescriptor::Enum { tag, values }
    }

    /// Kind tag of this node.
    pub fn kind(&self) -> ShapeKind {
        match self {
            TypeDescriptor::Void => ShapeKind::SK_VOID,
            TypeDescriptor::Bool => ShapeKind::SK_BOOL,
            TypeDescriptor::Int(_) => ShapeKind::SK_INT,
            TypeDescriptor::Float(_) => ShapeKind::SK_FLOAT,
            TypeDescriptor::Pointer(_) => ShapeKind::SK_POINTER,
            TypeDescriptor::Slice(_) => ShapeKind::SK_SLICE,
            TypeDescriptor::Array { .. } => ShapeKind::SK_ARRAY,
            TypeDescriptor::Vector { .. } => ShapeKind::SK_VECTOR,
            TypeDescriptor::Struct(_) => ShapeKind::SK_STRUCT,
            TypeDescriptor::Optional(_) => ShapeKind::SK_OPTIONAL,
            TypeDescriptor::ErrorSet(_) => ShapeKind::SK_ERROR_SET,
            TypeDescriptor::ErrorUnion { .. } => ShapeKind::SK_ERROR_UNION,
            TypeDescriptor::Enum { .. } => ShapeKind::SK_ENUM,
            TypeDescriptor::TaggedUnion { .. } => ShapeKind::SK_TAGGED_UNION,
        }
    }

    /// True iff any reachable node is a pointer or a slice.
    pub fn requires_allocation(&self) -> bool {
        match self {
            TypeDescriptor::Pointer(_) | TypeDescriptor::Slice(_) => true,
            TypeDescriptor::Void
            | TypeDescriptor::Bool
            | TypeDescriptor::Int(_)
            | TypeDescriptor::Float(_)
            | TypeDescriptor::ErrorSet(_)
            | TypeDescriptor::Enum { .. } => false,
            TypeDescriptor::Array { child, .. }
            | TypeDescriptor::Vector { child, .. }
            | TypeDescriptor::Optional(child)
            | TypeDescriptor::ErrorUnion { payload: child, .. } => child.requires_allocation(),
            TypeDescriptor::Struct(fields) => fields.iter().any(Self::requires_allocation),
            TypeDescriptor::TaggedUnion { variants, .. } => {
                variants.iter().any(Self::requires_allocation)
            }
        }
    }

    /// Check a hand-built descriptor against the invariants that classified
    /// descriptors satisfy by construction.
    pub fn validate(&self) -> Result<(), Unsupported> {
        match self {
            TypeDescriptor::Void | TypeDescriptor::Bool => Ok(()),
            TypeDescriptor::Int(int) => int.validate(),
            TypeDescriptor::Float(float) => match float.bits {
                32 | 64 => Ok(()),
                other => Err(Unsupported::FloatWidth(other)),
            },
            TypeDescriptor::Pointer(child)
            | TypeDescriptor::Slice(child)
            | TypeDescriptor::Optional(child)
            | TypeDescriptor::Array { child, .. }
            | TypeDescriptor::Vector { child, .. } => child.validate(),
            TypeDescriptor::Struct(fields) => fields.iter().try_for_each(Self::validate),
            TypeDescriptor::ErrorSet(names) => validate_names(names),
            TypeDescriptor::ErrorUnion { set, payload } => {
                validate_names(set)?;
                payload.validate()
            }
            TypeDescriptor::Enum { tag, values } => {
                tag.validate()?;
                if values.iter().all(|v| tag.contains(*v)) {
                    Ok(())
                } else {
                    Err(Unsupported::TagOverflow {
                        bits: tag.bits,
                        variants: values.len(),
                    })
                }
            }
            TypeDescriptor::TaggedUnion { tag, variants } => {
                tag.validate()?;
                let last = variants.len().saturating_sub(1);
                if !variants.is_empty() && !tag.contains(last as i128) {
                    return Err(Unsupported::TagOverflow {
                        bits: tag.bits,
                        variants: variants.len(),
                    });
                }
                variants.iter().try_for_each(Self::validate)
            }
        }
    }
}

fn canonical_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
    // String ordering is byte-lexicographic.
    names.sort_unstable();
    names.dedup();
    names
}

fn validate_names(names: &[String]) -> Result<(), Unsupported> {
    if names.len() > usize::from(u16::MAX) + 1 {
        return Err(Unsupported::ErrorSetTooLarge(names.len()));
    }
    if !names.windows(2).all(|pair| pair[0] < pair[1]) {
        return Err(Unsupported::UnsortedErrorSet);
    }
    Ok(())
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Void => write!(f, "void"),
            TypeDescriptor::Bool => write!(f, "bool"),
            TypeDescriptor::Int(int) => write!(f, "{}", int),
            TypeDescriptor::Float(float) => write!(f, "f{}", float.bits),
            TypeDescriptor::Pointer(child) => write!(f, "*{}", child),
            TypeDescriptor::Slice(child) => write!(f, "[]{}", child),
            TypeDescriptor::Array { len, child } => write!(f, "[{}]{}", len, child),
            TypeDescriptor::Vector { len, child } => write!(f, "@Vector({}, {})", len, child),
            TypeDescriptor::Optional(child) => write!(f, "?{}", child),
            TypeDescriptor::Struct(fields) => {
                write!(f, "struct {{ ")?;
                write_list(f, fields)?;
                write!(f, " }}")
            }
            TypeDescriptor::ErrorSet(names) => write!(f, "error{{{}}}", names.join(",")),
            TypeDescriptor::ErrorUnion { set, payload } => {
                write!(f, "error{{{}}}!{}", set.join(","), payload)
            }
            TypeDescriptor::Enum { tag, values } => {
                write!(f, "enum({}) {{ {} values }}", tag, values.len())
            }
            TypeDescriptor::TaggedUnion { tag, variants } => {
                write!(f, "union({}) {{ ", tag)?;
                write_list(f, variants)?;
                write!(f, " }}")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[TypeDescriptor]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
