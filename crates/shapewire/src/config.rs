// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire constants and decoder limits.

/// Length of the fingerprint that prefixes every frame.
pub const FINGERPRINT_LEN: usize = 8;

/// Length of the `u64` element count written before slice payloads.
pub const SLICE_LEN_PREFIX: usize = 8;

/// Length of an encoded error-set index.
pub const ERROR_INDEX_LEN: usize = 2;

/// Error-union discriminant for the payload arm.
pub const ERROR_UNION_PAYLOAD: u8 = 0;

/// Error-union discriminant for the error arm.
pub const ERROR_UNION_ERROR: u8 = 1;

/// Upper bound on bytes reserved up front for a slice read from the stream.
///
/// Larger slices still decode, their backing storage grows as elements arrive,
/// so a forged length cannot reserve memory the stream never fills.
pub const PREALLOC_LIMIT_BYTES: usize = 64 * 1024;

/// Limits applied while decoding untrusted streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeLimits {
    /// Maximum element count accepted for any single slice.
    pub max_slice_len: Option<u64>,
}

impl DecodeLimits {
    /// No limits beyond those imposed by the allocator.
    pub const fn unlimited() -> Self {
        Self {
            max_slice_len: None,
        }
    }

    /// Reject slices longer than `len` elements with `InvalidLength`.
    #[must_use]
    pub const fn max_slice_len(mut self, len: u64) -> Self {
        self.max_slice_len = Some(len);
        self
    }

    pub(crate) fn admits(&self, len: u64) -> bool {
        self.max_slice_len.map_or(true, |max| len <= max)
    }
}
