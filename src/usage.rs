// SPDX-License-Identifier: MIT

//! Resolved usage references and the usage table seam.
//!
//! The composition engine never interprets a usage beyond its numeric
//! (page, id) value. Name lookup and usage-kind policy belong to whoever
//! produces the [ElementSpec](crate::ElementSpec)s, the engine only needs to
//! know whether a usage exists at all (for [Array](crate::ElementKind::Array)
//! ranges) and that is answered by a [UsageTable].

use crate::{DescriptorError, Result};
use core::cmp::Ordering;
use hidreport::{Usage, UsageId, UsagePage};

/// The kind of a usage as listed in the HID Usage Tables, Section 3.4.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum UsageKind {
    LinearControl = 1 << 0,
    OnOffControl = 1 << 1,
    MomentaryControl = 1 << 2,
    OneShotControl = 1 << 3,
    ReTriggerControl = 1 << 4,
    Selector = 1 << 5,
    StaticValue = 1 << 6,
    StaticFlag = 1 << 7,
    DynamicValue = 1 << 8,
    DynamicFlag = 1 << 9,
    NamedArray = 1 << 10,
    CollectionApplication = 1 << 11,
    CollectionLogical = 1 << 12,
    CollectionPhysical = 1 << 13,
    UsageSwitch = 1 << 14,
    UsageModifier = 1 << 15,
    BufferedBytes = 1 << 16,
}

/// A set of [UsageKind]s a usage is documented to support.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UsageKinds(u32);

impl UsageKinds {
    pub const fn empty() -> Self {
        UsageKinds(0)
    }

    /// Add a kind to this set
    pub const fn with(self, kind: UsageKind) -> Self {
        UsageKinds(self.0 | kind as u32)
    }

    pub const fn contains(&self, kind: UsageKind) -> bool {
        self.0 & kind as u32 != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl From<UsageKind> for UsageKinds {
    fn from(kind: UsageKind) -> Self {
        UsageKinds::empty().with(kind)
    }
}

impl FromIterator<UsageKind> for UsageKinds {
    fn from_iter<I: IntoIterator<Item = UsageKind>>(iter: I) -> Self {
        iter.into_iter().fold(UsageKinds::empty(), UsageKinds::with)
    }
}

/// A usage that has already been resolved and validated by the front-end.
///
/// Equality and ordering only consider the numeric (page, id) value, the
/// [UsageKinds] are informational.
#[derive(Clone, Copy, Debug)]
pub struct UsageRef {
    usage: Usage,
    kinds: UsageKinds,
}

impl UsageRef {
    /// Create a reference from a numeric usage page and usage id
    pub fn new(page: u16, id: u16) -> UsageRef {
        UsageRef {
            usage: Usage::from_page_and_id(UsagePage::from(page), UsageId::from(id)),
            kinds: UsageKinds::empty(),
        }
    }

    /// Attach the usage kinds this usage supports
    pub fn with_kinds(mut self, kinds: impl Into<UsageKinds>) -> UsageRef {
        self.kinds = kinds.into();
        self
    }

    pub fn page(&self) -> u16 {
        u16::from(self.usage.usage_page)
    }

    pub fn id(&self) -> u16 {
        u16::from(self.usage.usage_id)
    }

    /// The 32-bit extended usage, i.e. `page << 16 | id`
    pub fn value(&self) -> u32 {
        u32::from(&self.usage)
    }

    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn kinds(&self) -> UsageKinds {
        self.kinds
    }
}

impl From<Usage> for UsageRef {
    fn from(usage: Usage) -> UsageRef {
        UsageRef {
            usage,
            kinds: UsageKinds::empty(),
        }
    }
}

impl From<u32> for UsageRef {
    fn from(value: u32) -> UsageRef {
        UsageRef::from(Usage::from(value))
    }
}

impl PartialEq for UsageRef {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl Eq for UsageRef {}

impl PartialOrd for UsageRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UsageRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value().cmp(&other.value())
    }
}

impl core::fmt::Display for UsageRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#06x}:{:#06x}", self.page(), self.id())
    }
}

/// A contiguous range of usages on one usage page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UsageRange {
    start: UsageRef,
    end: UsageRef,
}

impl UsageRange {
    /// Create a new range. Both ends must be on the same usage page and
    /// `start` must be strictly less than `end`.
    pub fn new(start: UsageRef, end: UsageRef) -> Result<UsageRange> {
        if start.page() != end.page() {
            return Err(DescriptorError::InvalidUsage(format!(
                "usage range {start}..{end} spans two usage pages"
            )));
        }
        if start.id() >= end.id() {
            return Err(DescriptorError::InvalidUsage(format!(
                "usage range start {start} must be less than its end {end}"
            )));
        }
        Ok(UsageRange { start, end })
    }

    pub fn start(&self) -> UsageRef {
        self.start
    }

    pub fn end(&self) -> UsageRef {
        self.end
    }

    pub fn page(&self) -> u16 {
        self.start.page()
    }

    /// The number of usages in this range, ends inclusive
    pub fn count(&self) -> u32 {
        u32::from(self.end.id()) - u32::from(self.start.id()) + 1
    }

    /// Check that every usage in this range exists in the given table
    pub fn ensure_populated(&self, table: &dyn UsageTable) -> Result<()> {
        let page = self.page();
        match (self.start.id()..=self.end.id()).find(|id| !table.contains(page, *id)) {
            Some(id) => Err(DescriptorError::InvalidUsage(format!(
                "usage {} in range {}..{} is not a known usage",
                UsageRef::new(page, id),
                self.start,
                self.end
            ))),
            None => Ok(()),
        }
    }
}

/// Lookup of known usages, supplied by the caller for one compilation.
pub trait UsageTable {
    /// Returns true if the given usage exists.
    fn contains(&self, page: u16, id: u16) -> bool;
}

/// A [UsageTable] that accepts every usage, e.g. for vendor-defined pages.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnyUsage;

impl UsageTable for AnyUsage {
    fn contains(&self, _page: u16, _id: u16) -> bool {
        true
    }
}

/// A [UsageTable] backed by the HID Usage Tables of the [hut] crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct HutUsageTable;

impl UsageTable for HutUsageTable {
    fn contains(&self, page: u16, id: u16) -> bool {
        hut::Usage::new_from_page_and_id(page, id).is_ok()
    }
}
