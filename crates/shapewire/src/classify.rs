// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shape classification.
//!
//! Nominal types (everything produced by `#[derive(Shape)]`) classify through
//! [`Classifier::enter`], which tracks the types currently being described.
//! Re-entering a type that is still in progress means the type contains
//! itself, which is rejected instead of recursing forever.

use crate::descriptor::TypeDescriptor;
use crate::error::{Result, Unsupported};
use crate::shape::Shape;
use std::any::TypeId;

/// Classification context carrying the in-progress type stack.
#[derive(Debug, Default)]
pub struct Classifier {
    in_progress: Vec<(TypeId, &'static str)>,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Describe nominal type `T` with `build`, rejecting self-reference.
    pub fn enter<T, F>(&mut self, build: F) -> Result<TypeDescriptor>
    where
        T: 'static,
        F: FnOnce(&mut Self) -> Result<TypeDescriptor>,
    {
        let id = TypeId::of::<T>();
        let type_name = std::any::type_name::<T>();
        if self.in_progress.iter().any(|(seen, _)| *seen == id) {
            log::debug!(
                "[CLASSIFY] rejecting recursive type {} (path: {})",
                type_name,
                self.path()
            );
            return Err(Unsupported::Recursive { type_name }.into());
        }

        self.in_progress.push((id, type_name));
        let described = build(self);
        self.in_progress.pop();
        described
    }

    /// Number of nominal types currently being described.
    pub fn depth(&self) -> usize {
        self.in_progress.len()
    }

    fn path(&self) -> String {
        self.in_progress
            .iter()
            .map(|(_, name)| *name)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

/// Classify `T` into its canonical descriptor.
pub fn classify<T: Shape>() -> Result<TypeDescriptor> {
    T::classify(&mut Classifier::new())
}

/// True iff any node reachable from `descriptor` is a pointer or slice.
pub fn requires_allocation(descriptor: &TypeDescriptor) -> bool {
    descriptor.requires_allocation()
}
