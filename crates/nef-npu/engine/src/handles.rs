// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Opaque handles into the builder's arenas.
//!
//! A handle is an index into one arena of one builder. Handles stay valid in the
//! built `Network` (same index order); a handle from a different builder is
//! reported as a dangling reference at build time.

use core::fmt;

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            pub(crate) fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($kind, " #{}"), self.0)
            }
        }
    };
}

define_handle!(
    /// Handle to a declared ensemble
    EnsembleId,
    "ensemble"
);
define_handle!(
    /// Handle to a declared node
    NodeId,
    "node"
);
define_handle!(
    /// Handle to a declared connection
    ConnectionId,
    "connection"
);
define_handle!(
    /// Handle to a declared probe
    ProbeId,
    "probe"
);
