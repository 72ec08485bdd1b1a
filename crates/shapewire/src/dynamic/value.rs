// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic value tree.

/// A value of any shape, interpreted against a [`crate::TypeDescriptor`].
///
/// Floats compare by bit pattern, so NaN payloads round-trip as equal.
#[derive(Debug, Clone)]
pub enum Value {
    Void,
    Bool(bool),
    /// Unsigned integer of any width.
    UInt(u128),
    /// Signed integer of any width.
    SInt(i128),
    F32(f32),
    F64(f64),
    Pointer(Box<Value>),
    Slice(Vec<Value>),
    Array(Vec<Value>),
    Vector(Vec<Value>),
    Struct(Vec<Value>),
    Optional(Option<Box<Value>>),
    /// Member of an error set, by name.
    Error(String),
    ErrorUnion(Result<Box<Value>, String>),
    /// Fieldless enum discriminant.
    Enum(i128),
    /// Tagged union: positional tag and active payload.
    Union { tag: u64, payload: Box<Value> },
}

impl Value {
    /// `Optional` holding `value`.
    pub fn some(value: Value) -> Self {
        Self::Optional(Some(Box::new(value)))
    }

    pub fn none() -> Self {
        Self::Optional(None)
    }

    pub fn pointer(value: Value) -> Self {
        Self::Pointer(Box::new(value))
    }

    pub fn union(tag: u64, payload: Value) -> Self {
        Self::Union {
            tag,
            payload: Box::new(payload),
        }
    }

    /// Short name of the variant, reported as `found` in `ValueMismatch`.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Bool(_) => "bool",
            Self::UInt(_) => "unsigned integer",
            Self::SInt(_) => "signed integer",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Pointer(_) => "pointer",
            Self::Slice(_) => "slice",
            Self::Array(_) => "array",
            Self::Vector(_) => "vector",
            Self::Struct(_) => "struct",
            Self::Optional(_) => "optional",
            Self::Error(_) => "error",
            Self::ErrorUnion(_) => "error union",
            Self::Enum(_) => "enum",
            Self::Union { .. } => "union",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u128(&self) -> Option<u128> {
        match self {
            Self::UInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Self::SInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Elements of a slice, array, vector or struct.
    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Self::Slice(items) | Self::Array(items) | Self::Vector(items) | Self::Struct(items) => {
                Some(items)
            }
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Void, Self::Void) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::UInt(a), Self::UInt(b)) => a == b,
            (Self::SInt(a), Self::SInt(b)) => a == b,
            (Self::F32(a), Self::F32(b)) => a.to_bits() == b.to_bits(),
            (Self::F64(a), Self::F64(b)) => a.to_bits() == b.to_bits(),
            (Self::Pointer(a), Self::Pointer(b)) => a == b,
            (Self::Slice(a), Self::Slice(b))
            | (Self::Array(a), Self::Array(b))
            | (Self::Vector(a), Self::Vector(b))
            | (Self::Struct(a), Self::Struct(b)) => a == b,
            (Self::Optional(a), Self::Optional(b)) => a == b,
            (Self::Error(a), Self::Error(b)) => a == b,
            (Self::ErrorUnion(a), Self::ErrorUnion(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (
                Self::Union {
                    tag: ta,
                    payload: pa,
                },
                Self::Union {
                    tag: tb,
                    payload: pb,
                },
            ) => ta == tb && pa == pb,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

macro_rules! impl_from_int {
    ($variant:ident: $($type:ty),+) => {
        $(
            impl From<$type> for Value {
                fn from(v: $type) -> Self {
                    Self::$variant(v.into())
                }
            }
        )+
    };
}

impl_from_int!(UInt: u8, u16, u32, u64, u128);
impl_from_int!(SInt: i8, i16, i32, i64, i128);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_equality_is_bitwise() {
        let nan = f64::from_bits(0x7FF8_0000_0000_0001);
        assert_eq!(Value::F64(nan), Value::F64(nan));
        assert_ne!(Value::F64(0.0), Value::F64(-0.0));
    }

    #[test]
    fn test_variants_do_not_cross_compare() {
        assert_ne!(Value::Array(vec![]), Value::Slice(vec![]));
        assert_ne!(Value::from(1u8), Value::from(1i8));
        assert_eq!(Value::from(7u16), Value::UInt(7));
    }

    #[test]
    fn test_accessors() {
        let s = Value::Struct(vec![Value::from(true), Value::none()]);
        assert_eq!(s.as_items().map(<[Value]>::len), Some(2));
        assert_eq!(s.as_items().and_then(|f| f[0].as_bool()), Some(true));
        assert_eq!(Value::from(-3i32).as_i128(), Some(-3));
        assert_eq!(Value::from(3u64).as_u128(), Some(3));
        assert_eq!(Value::union(1, Value::Void).kind_name(), "union");
    }
}
