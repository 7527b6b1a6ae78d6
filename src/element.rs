// SPDX-License-Identifier: MIT

//! The input description of a single leaf field.
//!
//! An [ElementSpec] is what a front-end hands over for each field of a
//! report. It may carry any combination of settings, whether that
//! combination makes sense is decided when the spec is turned into a
//! [LeafModule](crate::LeafModule).
//!
//! ```
//! # use hidcompose::{ElementSpec, UsageRef};
//! // An 8-bit X axis with the default range of [-128, 127]
//! let x = ElementSpec::variable(UsageRef::new(0x01, 0x30)).size_in_bits(8);
//! // Three buttons, one bit each
//! let buttons = ElementSpec::variable_range(UsageRef::new(0x09, 1), UsageRef::new(0x09, 3))
//!     .logical_range(0, 1);
//! // Five bits of padding
//! let pad = ElementSpec::padding(5);
//! ```

use crate::flags::DataFlags;
use crate::unit::{Unit, UnitExponent};
use crate::usage::UsageRef;

/// The kind of leaf field requested
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    /// One usage, one or more values
    Variable,
    /// A contiguous usage range, one value per usage
    VariableRange,
    /// An index selecting one usage out of a contiguous usage range
    Array,
    /// Constant bits without meaning
    Padding,
}

/// A logical range given as the maximum range of the field's size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeSentinel {
    /// `[-2^(n-1), 2^(n-1) - 1]`
    MaxSigned,
    /// `[0, 2^n - 1]`, capped to `[0, 2^31 - 1]` for 32-bit fields
    MaxUnsigned,
}

/// The description of one leaf field.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementSpec {
    pub(crate) kind: ElementKind,
    pub(crate) name: Option<String>,
    pub(crate) usage: Option<UsageRef>,
    pub(crate) usage_range: Option<(UsageRef, UsageRef)>,
    pub(crate) size_in_bits: Option<u32>,
    pub(crate) logical_range: Option<(i32, i32)>,
    pub(crate) logical_sentinel: Option<RangeSentinel>,
    pub(crate) physical_range: Option<(i32, i32)>,
    pub(crate) count: Option<u32>,
    pub(crate) flags: Option<DataFlags>,
    pub(crate) unit: Option<Unit>,
    pub(crate) unit_exponent: Option<UnitExponent>,
}

impl ElementSpec {
    /// An empty spec of the given kind
    pub fn new(kind: ElementKind) -> ElementSpec {
        ElementSpec {
            kind,
            name: None,
            usage: None,
            usage_range: None,
            size_in_bits: None,
            logical_range: None,
            logical_sentinel: None,
            physical_range: None,
            count: None,
            flags: None,
            unit: None,
            unit_exponent: None,
        }
    }

    /// A variable field for the given usage
    pub fn variable(usage: UsageRef) -> ElementSpec {
        ElementSpec::new(ElementKind::Variable).usage(usage)
    }

    /// A variable field with one value for each usage in `start..=end`
    pub fn variable_range(start: UsageRef, end: UsageRef) -> ElementSpec {
        ElementSpec::new(ElementKind::VariableRange).usage_range(start, end)
    }

    /// An array field selecting one of the usages in `start..=end`
    pub fn array(start: UsageRef, end: UsageRef) -> ElementSpec {
        ElementSpec::new(ElementKind::Array).usage_range(start, end)
    }

    /// Padding of the given size
    pub fn padding(size_in_bits: u32) -> ElementSpec {
        ElementSpec::new(ElementKind::Padding).size_in_bits(size_in_bits)
    }

    /// A name used in error messages only
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn usage(mut self, usage: UsageRef) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn usage_range(mut self, start: UsageRef, end: UsageRef) -> Self {
        self.usage_range = Some((start, end));
        self
    }

    pub fn size_in_bits(mut self, size_in_bits: u32) -> Self {
        self.size_in_bits = Some(size_in_bits);
        self
    }

    /// Set an explicit logical range. The field size is derived from this
    /// range and must not be given as well.
    pub fn logical_range(mut self, minimum: i32, maximum: i32) -> Self {
        self.logical_range = Some((minimum, maximum));
        self
    }

    /// Use the full signed range of the field's (explicit) size
    pub fn logical_max_signed(mut self) -> Self {
        self.logical_sentinel = Some(RangeSentinel::MaxSigned);
        self
    }

    /// Use the full unsigned range of the field's (explicit) size
    pub fn logical_max_unsigned(mut self) -> Self {
        self.logical_sentinel = Some(RangeSentinel::MaxUnsigned);
        self
    }

    pub fn physical_range(mut self, minimum: i32, maximum: i32) -> Self {
        self.physical_range = Some((minimum, maximum));
        self
    }

    /// The number of values (Variable) or simultaneous selections (Array)
    pub fn count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn flags(mut self, flags: DataFlags) -> Self {
        self.flags = Some(flags);
        self
    }

    pub fn unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn unit_exponent(mut self, exponent: UnitExponent) -> Self {
        self.unit_exponent = Some(exponent);
        self
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn element_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
