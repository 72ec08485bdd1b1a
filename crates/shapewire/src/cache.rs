// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Concurrent, append-only memo of classified shapes.
//!
//! Classification and hashing happen once per Rust type; later lookups are
//! served from a dashmap keyed by `TypeId`. Entries are never evicted or
//! replaced, so concurrent callers racing on the same type all observe the
//! first published entry.

use crate::classify::classify;
use crate::descriptor::TypeDescriptor;
use crate::error::Result;
use crate::fingerprint::Fingerprint;
use crate::shape::Shape;
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::{Arc, OnceLock};

/// A classified shape together with its fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    pub descriptor: TypeDescriptor,
    pub fingerprint: Fingerprint,
    pub requires_allocation: bool,
}

impl Prepared {
    pub fn new(descriptor: TypeDescriptor) -> Self {
        Self {
            fingerprint: Fingerprint::compute(&descriptor),
            requires_allocation: descriptor.requires_allocation(),
            descriptor,
        }
    }
}

/// Memo of `(descriptor, fingerprint)` per Rust type.
#[derive(Debug, Default)]
pub struct FingerprintCache {
    entries: DashMap<TypeId, Arc<Prepared>>,
}

impl FingerprintCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache used by the free functions and [`crate::Schema`].
    pub fn global() -> &'static FingerprintCache {
        static GLOBAL: OnceLock<FingerprintCache> = OnceLock::new();
        GLOBAL.get_or_init(FingerprintCache::new)
    }

    /// Return the prepared shape of `T`, classifying it on first use.
    ///
    /// Classification failures are returned, not cached.
    pub fn get_or_classify<T: Shape>(&self) -> Result<Arc<Prepared>> {
        let id = TypeId::of::<T>();
        if let Some(hit) = self.entries.get(&id) {
            return Ok(Arc::clone(hit.value()));
        }

        let prepared = Arc::new(Prepared::new(classify::<T>()?));
        log::debug!(
            "[FINGERPRINT] {} => {} ({})",
            std::any::type_name::<T>(),
            prepared.fingerprint,
            prepared.descriptor
        );
        let entry = self.entries.entry(id).or_insert(prepared);
        Ok(Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
