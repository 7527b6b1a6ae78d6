// SPDX-License-Identifier: MIT

//! Compilation settings.
//!
//! All settings are plain values handed to the compiler by the caller, there
//! is no process-wide state. [CompileOptions] is what a user configures,
//! [ComposeContext] is what the module constructors read while the tree is
//! being built.

use crate::usage::UsageTable;
use crate::{DescriptorError, Result, MAX_FIELD_BITS};
use core::num::NonZeroU32;

/// The byte multiple every field's bit width is rounded up to.
///
/// Without packing ([PackingPolicy::none()]) fields keep their natural
/// bit width. With e.g. [`PackingPolicy::bytes(1)`](PackingPolicy::bytes)
/// a 3-bit field occupies 8 bits on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PackingPolicy {
    bytes: Option<NonZeroU32>,
}

impl PackingPolicy {
    /// Fields are bit-packed at their natural size
    pub const fn none() -> PackingPolicy {
        PackingPolicy { bytes: None }
    }

    /// Round every field up to a multiple of `bytes` bytes.
    pub fn bytes(bytes: u32) -> Result<PackingPolicy> {
        match NonZeroU32::new(bytes) {
            Some(bytes) => Ok(PackingPolicy { bytes: Some(bytes) }),
            None => Err(DescriptorError::OutOfRange {
                what: "packing granularity",
                value: 0,
                min: 1,
                max: i64::from(u32::MAX),
            }),
        }
    }

    /// The packing granularity in bytes, if any
    pub fn granularity(&self) -> Option<u32> {
        self.bytes.map(NonZeroU32::get)
    }

    /// Round the given bit width up to this policy.
    ///
    /// The result never exceeds the 32-bit field size limit, a
    /// granularity that would push a field past 32 bits yields 32.
    pub fn round_up(&self, bits: u32) -> u32 {
        match self.bytes {
            None => bits,
            Some(bytes) => {
                let step = u64::from(bytes.get()) * 8;
                let rounded = u64::from(bits).div_ceil(step) * step;
                rounded.min(u64::from(MAX_FIELD_BITS)) as u32
            }
        }
    }
}

/// Options for one descriptor compilation.
///
/// ```
/// # use hidcompose::{CompileOptions, PackingPolicy};
/// # fn main() -> Result<(), hidcompose::DescriptorError> {
/// let options = CompileOptions::new()
///     .packing(PackingPolicy::bytes(1)?)
///     .optimize(true);
/// assert!(options.is_optimized());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompileOptions {
    packing: PackingPolicy,
    optimize: bool,
    elide_redundant_globals: bool,
}

impl CompileOptions {
    /// Bit-packed fields, no optimization
    pub fn new() -> CompileOptions {
        CompileOptions::default()
    }

    pub fn packing(mut self, packing: PackingPolicy) -> Self {
        self.packing = packing;
        self
    }

    /// Merge identical sibling fields into one main item where possible.
    pub fn optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    /// Skip global items that would re-state the current global value.
    pub fn elide_redundant_globals(mut self, elide: bool) -> Self {
        self.elide_redundant_globals = elide;
        self
    }

    pub fn packing_policy(&self) -> PackingPolicy {
        self.packing
    }

    pub fn is_optimized(&self) -> bool {
        self.optimize
    }

    pub fn elides_redundant_globals(&self) -> bool {
        self.elide_redundant_globals
    }
}

/// Read-only context threaded through module construction.
#[derive(Clone, Copy)]
pub struct ComposeContext<'a> {
    packing: PackingPolicy,
    usages: &'a dyn UsageTable,
}

impl<'a> ComposeContext<'a> {
    pub fn new(options: &CompileOptions, usages: &'a dyn UsageTable) -> ComposeContext<'a> {
        ComposeContext {
            packing: options.packing_policy(),
            usages,
        }
    }

    pub fn packing(&self) -> PackingPolicy {
        self.packing
    }

    pub fn usages(&self) -> &'a dyn UsageTable {
        self.usages
    }
}

impl core::fmt::Debug for ComposeContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ComposeContext")
            .field("packing", &self.packing)
            .finish_non_exhaustive()
    }
}
