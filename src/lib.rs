// SPDX-License-Identifier: MIT

//! A HID Report Descriptor compiler.
//!
//! This crate turns a tree of fields into the binary HID Report Descriptor
//! a device hands to its host. The caller describes each field, the crate
//! works out field sizes and logical ranges, fixes up the bit layout of
//! every report and serializes the tree as HID short items. The items can
//! also be inspected, see [ShortItem] and [Descriptor::summary].
//!
//! ## Fields
//!
//! Each field is described by an [ElementSpec] and turned into a
//! [LeafModule] for a specific report kind:
//!
//! - a *Variable* has one usage and one or more values,
//! - a *VariableRange* has one value for each usage in a usage range,
//! - an *Array* is an index into a usage range, e.g. the currently pressed
//!   keys of a keyboard,
//! - *Padding* is a number of constant bits.
//!
//! A Variable's size and logical range are derived from each other: give
//! either a size (the logical range is the full signed range of that size),
//! a logical range (the size is the smallest that holds it) or a size plus
//! [ElementSpec::logical_max_signed] / [ElementSpec::logical_max_unsigned].
//!
//! ## Reports and collections
//!
//! A [ReportModule] owns its fields, optionally grouped in Physical or
//! Logical [CollectionModule]s. When a report is created its layout is
//! corrected: no field may extend more than 32 bits past the start of the
//! byte it starts in, the report is padded to whole bytes and adjacent
//! padding is merged. Reports live in an [ApplicationCollectionModule],
//! one or more of those make up a [Descriptor].
//!
//! ## Compile options
//!
//! [CompileOptions] select the [PackingPolicy] (e.g. round every field up
//! to whole bytes), whether identical sibling fields are combined into one
//! main item and whether redundant global items are dropped.
//!
//! # Example
//!
//! This example shows how to build a HID Report Descriptor for a typical
//! 3-button mouse.
//! ```
//! # use hidcompose::{
//! #     ApplicationCollectionModule, CollectionModule, CompileOptions, ComposeContext, DataFlags,
//! #     Descriptor, ElementSpec, HutUsageTable, LeafModule, Relation, ReportKind, ReportModule,
//! #     UsageRef,
//! # };
//! # fn main() -> Result<(), hidcompose::DescriptorError> {
//! let options = CompileOptions::new().optimize(true);
//! let ctx = ComposeContext::new(&options, &HutUsageTable);
//! let field = |spec| LeafModule::new(spec, ReportKind::Input, &ctx);
//!
//! // One bit per button
//! let buttons = field(
//!     ElementSpec::variable_range(UsageRef::new(0x09, 1), UsageRef::new(0x09, 3))
//!         .logical_range(0, 1),
//! )?;
//! // x and y only differ in their usage, with optimization they share
//! // one Input item
//! let axis = |id| {
//!     ElementSpec::variable(UsageRef::new(0x01, id))
//!         .logical_range(-127, 127)
//!         .flags(DataFlags::new().relation(Relation::Relative))
//! };
//! let x = field(axis(0x30))?;
//! let y = field(axis(0x31))?;
//!
//! let pointer = CollectionModule::physical(
//!     UsageRef::new(0x01, 0x01),
//!     vec![buttons.into(), x.into(), y.into()],
//! )?;
//! let report = ReportModule::new(ReportKind::Input, 1, vec![pointer.into()])?;
//! // report id, then 3 + 8 + 8 bits of data padded to 3 bytes
//! assert_eq!(report.size_in_bytes(), 4);
//!
//! let mouse = ApplicationCollectionModule::new(UsageRef::new(0x01, 0x02), vec![report])?;
//! let rdesc: Vec<u8> = Descriptor::new(vec![mouse])?.to_bytes(&options);
//! assert_eq!(&rdesc[..4], &[0x05, 0x01, 0x09, 0x02]);
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

mod config;
mod descriptor;
mod element;
mod emit;
mod flags;
mod item;
mod module;
mod unit;
mod usage;

pub use config::{CompileOptions, ComposeContext, PackingPolicy};
pub use descriptor::Descriptor;
pub use element::{ElementKind, ElementSpec, RangeSentinel};
pub use emit::Emitter;
pub use flags::{
    ContingentKind, DataFlags, Grouping, Linearity, MeaningfulData, Modification,
    PreferenceState, Relation, Volatility, Wrapping,
};
pub use item::{
    truncate_signed, truncate_unsigned, ItemCategory, ItemKind, ItemValue, ShortItem,
    COLLECTION_APPLICATION, COLLECTION_LOGICAL, COLLECTION_PHYSICAL,
};
pub use module::{
    minimal_bits, signed_range, unsigned_range, ApplicationCollectionModule, ArrayModule,
    CollectionKind, CollectionModule, DataField, FieldSize, LeafModule, Module, Node,
    PaddingModule, ReportKind, ReportModule, VariableModule, VariableRangeModule,
    MAX_REPORT_COUNT, UNDEFINED_PHYSICAL,
};
pub use unit::{
    exponent_code, exponent_from_code, Unit, UnitExponent, UnitExponents, UnitSystem,
    MAX_EXPONENT, MIN_EXPONENT,
};
pub use usage::{AnyUsage, HutUsageTable, UsageKind, UsageKinds, UsageRange, UsageRef, UsageTable};

/// The largest size of a single field value in bits
pub const MAX_FIELD_BITS: u32 = 32;

#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("{what} {value} is outside [{min}, {max}]")]
    OutOfRange {
        what: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("Conflicting settings: {0}")]
    Conflict(&'static str),
    #[error("Missing {0}")]
    Missing(&'static str),
    #[error("Invalid usage: {0}")]
    InvalidUsage(String),
    #[error("The {flag} attribute is not allowed for this field in {kind} reports")]
    FlagNotAllowed {
        flag: &'static str,
        kind: ReportKind,
    },
    #[error("A {0} must contain at least one field that is not padding")]
    OnlyPadding(&'static str),
    #[error("Duplicate {kind} report id {id}")]
    DuplicateReportId { kind: ReportKind, id: u8 },
    #[error("Invalid unit: {0}")]
    InvalidUnit(String),
    #[error("{name}: {source}")]
    Named {
        name: String,
        source: Box<DescriptorError>,
    },
}

pub type Result<T> = core::result::Result<T, DescriptorError>;

/// Route `log` output of a test through the test harness
#[cfg(test)]
pub(crate) fn init_logging() {
    use env_logger::{Builder, Env};
    let _ = Builder::from_env(Env::default().default_filter_or("trace"))
        .is_test(true)
        .try_init();
}
