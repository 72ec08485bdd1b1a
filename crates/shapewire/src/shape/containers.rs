// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{invalid_discriminant, ErrorSet, Shape, Vector};
use crate::alloc::{charge, credit, Allocator};
use crate::classify::Classifier;
use crate::config::{ERROR_UNION_ERROR, ERROR_UNION_PAYLOAD};
use crate::descriptor::TypeDescriptor;
use crate::error::{Error, Result};
use crate::wire::{reserve_vec, WireReader, WireWriter};
use std::alloc::Layout;
use std::io::{Read, Write};

impl<T: Shape> Shape for Option<T> {
    const REQUIRES_ALLOCATION: bool = T::REQUIRES_ALLOCATION;

    fn classify(cx: &mut Classifier) -> Result<TypeDescriptor> {
        Ok(TypeDescriptor::optional(T::classify(cx)?))
    }

    fn encode_payload<W: Write>(&self, w: &mut WireWriter<W>) -> Result<()> {
        match self {
            None => w.write_u8(0),
            Some(value) => {
                w.write_u8(1)?;
                value.encode_payload(w)
            }
        }
    }

    fn decode_payload<R: Read, A: Allocator + ?Sized>(
        r: &mut WireReader<R>,
        alloc: &A,
    ) -> Result<Self> {
        match r.read_u8()? {
            0 => Ok(None),
            1 => T::decode_payload(r, alloc).map(Some),
            other => Err(invalid_discriminant("optional", other)),
        }
    }

    fn release_payload<A: Allocator + ?Sized>(self, alloc: &A) {
        if let Some(value) = self {
            value.release_payload(alloc);
        }
    }
}

impl<T: Shape> Shape for Box<T> {
    const REQUIRES_ALLOCATION: bool = true;

    fn classify(cx: &mut Classifier) -> Result<TypeDescriptor> {
        Ok(TypeDescriptor::pointer(T::classify(cx)?))
    }

    fn encode_payload<W: Write>(&self, w: &mut WireWriter<W>) -> Result<()> {
        (**self).encode_payload(w)
    }

    fn decode_payload<R: Read, A: Allocator + ?Sized>(
        r: &mut WireReader<R>,
        alloc: &A,
    ) -> Result<Self> {
        let layout = Layout::new::<T>();
        charge(alloc, layout)?;
        match T::decode_payload(r, alloc) {
            Ok(value) => Ok(Box::new(value)),
            Err(e) => {
                log::trace!("[DECODE] pointee failed, returning {} bytes", layout.size());
                credit(alloc, layout);
                Err(e)
            }
        }
    }

    fn release_payload<A: Allocator + ?Sized>(self, alloc: &A) {
        (*self).release_payload(alloc);
        credit(alloc, Layout::new::<T>());
    }
}

impl<T: Shape> Shape for Vec<T> {
    const REQUIRES_ALLOCATION: bool = true;

    fn classify(cx: &mut Classifier) -> Result<TypeDescriptor> {
        Ok(TypeDescriptor::slice(T::classify(cx)?))
    }

    fn encode_payload<W: Write>(&self, w: &mut WireWriter<W>) -> Result<()> {
        w.write_u64(self.len() as u64)?;
        self.iter().try_for_each(|item| item.encode_payload(w))
    }

    fn decode_payload<R: Read, A: Allocator + ?Sized>(
        r: &mut WireReader<R>,
        alloc: &A,
    ) -> Result<Self> {
        let (count, layout) = r.read_slice_len::<T, A>(alloc)?;
        charge(alloc, layout)?;
        let mut out = match reserve_vec::<T>(count) {
            Ok(out) => out,
            Err(e) => {
                credit(alloc, layout);
                return Err(e);
            }
        };

        for _ in 0..count {
            let next = if out.len() == out.capacity() {
                out.try_reserve(1).map_err(|_| Error::OutOfMemory)
            } else {
                Ok(())
            }
            .and_then(|()| T::decode_payload(r, alloc));

            match next {
                Ok(item) => out.push(item),
                Err(e) => {
                    log::trace!(
                        "[DECODE] slice failed at element {}/{}, releasing",
                        out.len(),
                        count
                    );
                    for item in out {
                        item.release_payload(alloc);
                    }
                    credit(alloc, layout);
                    return Err(e);
                }
            }
        }
        Ok(out)
    }

    fn release_payload<A: Allocator + ?Sized>(self, alloc: &A) {
        let layout = Layout::array::<T>(self.len());
        for item in self {
            item.release_payload(alloc);
        }
        if let Ok(layout) = layout {
            credit(alloc, layout);
        }
    }
}

/// Decode `N` consecutive elements, releasing the decoded prefix on failure.
fn decode_elements<T: Shape, R: Read, A: Allocator + ?Sized, const N: usize>(
    r: &mut WireReader<R>,
    alloc: &A,
) -> Result<[T; N]> {
    let mut failure = None;
    let slots: [Option<T>; N] = std::array::from_fn(|_| {
        if failure.is_some() {
            return None;
        }
        match T::decode_payload(r, alloc) {
            Ok(item) => Some(item),
            Err(e) => {
                failure = Some(e);
                None
            }
        }
    });

    if let Some(e) = failure {
        log::trace!("[DECODE] array failed, releasing decoded prefix");
        for item in slots.into_iter().flatten() {
            item.release_payload(alloc);
        }
        return Err(e);
    }
    Ok(slots.map(|slot| match slot {
        Some(item) => item,
        None => unreachable!("every slot decoded"),
    }))
}

impl<T: Shape, const N: usize> Shape for [T; N] {
    const REQUIRES_ALLOCATION: bool = T::REQUIRES_ALLOCATION;

    fn classify(cx: &mut Classifier) -> Result<TypeDescriptor> {
        Ok(TypeDescriptor::array(N as u64, T::classify(cx)?))
    }

    fn encode_payload<W: Write>(&self, w: &mut WireWriter<W>) -> Result<()> {
        self.iter().try_for_each(|item| item.encode_payload(w))
    }

    fn decode_payload<R: Read, A: Allocator + ?Sized>(
        r: &mut WireReader<R>,
        alloc: &A,
    ) -> Result<Self> {
        decode_elements(r, alloc)
    }

    fn release_payload<A: Allocator + ?Sized>(self, alloc: &A) {
        for item in self {
            item.release_payload(alloc);
        }
    }
}

impl<T: Shape, const N: usize> Shape for Vector<T, N> {
    const REQUIRES_ALLOCATION: bool = T::REQUIRES_ALLOCATION;

    fn classify(cx: &mut Classifier) -> Result<TypeDescriptor> {
        Ok(TypeDescriptor::vector(N as u64, T::classify(cx)?))
    }

    fn encode_payload<W: Write>(&self, w: &mut WireWriter<W>) -> Result<()> {
        self.0.encode_payload(w)
    }

    fn decode_payload<R: Read, A: Allocator + ?Sized>(
        r: &mut WireReader<R>,
        alloc: &A,
    ) -> Result<Self> {
        decode_elements(r, alloc).map(Vector)
    }

    fn release_payload<A: Allocator + ?Sized>(self, alloc: &A) {
        self.0.release_payload(alloc);
    }
}

impl<T: Shape, E: ErrorSet> Shape for core::result::Result<T, E> {
    const REQUIRES_ALLOCATION: bool = T::REQUIRES_ALLOCATION;

    fn classify(cx: &mut Classifier) -> Result<TypeDescriptor> {
        Ok(TypeDescriptor::error_union(
            E::NAMES.iter().copied(),
            T::classify(cx)?,
        ))
    }

    fn encode_payload<W: Write>(&self, w: &mut WireWriter<W>) -> Result<()> {
        match self {
            Ok(value) => {
                w.write_u8(ERROR_UNION_PAYLOAD)?;
                value.encode_payload(w)
            }
            Err(error) => {
                w.write_u8(ERROR_UNION_ERROR)?;
                error.encode_payload(w)
            }
        }
    }

    fn decode_payload<R: Read, A: Allocator + ?Sized>(
        r: &mut WireReader<R>,
        alloc: &A,
    ) -> Result<Self> {
        match r.read_u8()? {
            ERROR_UNION_PAYLOAD => T::decode_payload(r, alloc).map(Ok),
            ERROR_UNION_ERROR => E::decode_payload(r, alloc).map(Err),
            other => Err(invalid_discriminant("error union", other)),
        }
    }

    fn release_payload<A: Allocator + ?Sized>(self, alloc: &A) {
        if let Ok(value) = self {
            value.release_payload(alloc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::{Budget, Heap};

    fn payload<T: Shape>(value: &T) -> Vec<u8> {
        let mut w = WireWriter::new(Vec::new());
        value.encode_payload(&mut w).expect("encode");
        w.into_inner()
    }

    #[test]
    fn test_option_presence_byte() {
        assert_eq!(payload(&None::<u16>), vec![0]);
        assert_eq!(payload(&Some(0x0201u16)), vec![1, 0x01, 0x02]);

        let mut r = WireReader::new(&[7u8][..]);
        assert!(matches!(
            Option::<u8>::decode_payload(&mut r, &Heap),
            Err(Error::InvalidDiscriminant {
                shape: "optional",
                value: 7
            })
        ));
    }

    #[test]
    fn test_slice_has_length_prefix() {
        let bytes = payload(&vec![1u8, 2, 3]);
        assert_eq!(&bytes[..8], &3u64.to_le_bytes());
        assert_eq!(&bytes[8..], &[1, 2, 3]);
    }

    #[test]
    fn test_array_has_no_prefix() {
        assert_eq!(payload(&[1u8, 2, 3]), vec![1, 2, 3]);
        assert_eq!(payload(&Vector([1u8, 2, 3])), vec![1, 2, 3]);
    }

    #[test]
    fn test_vec_charges_and_releases() {
        let budget = Budget::unbounded();
        let bytes = payload(&vec![Box::new(5u32), Box::new(6u32)]);
        let mut r = WireReader::new(bytes.as_slice());
        let decoded = Vec::<Box<u32>>::decode_payload(&mut r, &budget).expect("decode");
        assert_eq!(decoded.iter().map(|b| **b).collect::<Vec<_>>(), vec![5, 6]);
        // One slice node plus two pointees.
        assert_eq!(budget.live_allocations(), 3);

        decoded.release_payload(&budget);
        assert_eq!(budget.live_allocations(), 0);
        assert_eq!(budget.live_bytes(), 0);
    }

    #[test]
    fn test_truncated_slice_releases_prefix() {
        let budget = Budget::unbounded();
        let mut bytes = payload(&vec![Box::new(1u64), Box::new(2u64), Box::new(3u64)]);
        bytes.truncate(bytes.len() - 4);
        let mut r = WireReader::new(bytes.as_slice());
        assert!(matches!(
            Vec::<Box<u64>>::decode_payload(&mut r, &budget),
            Err(Error::UnexpectedEndOfStream)
        ));
        assert_eq!(budget.live_allocations(), 0);
        assert!(budget.stats().total_allocations >= 3);
    }

    #[test]
    fn test_array_failure_releases_prefix() {
        let budget = Budget::unbounded();
        let mut bytes = payload(&[Box::new(1u16), Box::new(2u16)]);
        bytes.pop();
        let mut r = WireReader::new(bytes.as_slice());
        assert!(<[Box<u16>; 2]>::decode_payload(&mut r, &budget).is_err());
        assert_eq!(budget.live_allocations(), 0);
    }

    #[test]
    fn test_pointer_refused_by_budget() {
        let budget = Budget::with_capacity(2);
        let bytes = payload(&Box::new(9u32));
        let mut r = WireReader::new(bytes.as_slice());
        assert!(matches!(
            Box::<u32>::decode_payload(&mut r, &budget),
            Err(Error::OutOfMemory)
        ));
        assert_eq!(budget.stats().refused, 1);
    }
}
