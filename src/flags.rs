// SPDX-License-Identifier: MIT

//! Attribute flags of Input, Output and Feature main items
//! (HID 1.11 Section 6.2.2.5).
//!
//! Every attribute is optional. An unset attribute encodes as a zero bit,
//! which is the HID default for that attribute.

use crate::module::ReportKind;
use crate::{DescriptorError, Result};

/// Data / Constant
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Modification {
    Data,
    Constant,
}

/// Absolute / Relative
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relation {
    Absolute,
    Relative,
}

/// No Wrap / Wrap
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wrapping {
    NoWrap,
    Wrap,
}

/// Linear / Non Linear
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Linearity {
    Linear,
    NonLinear,
}

/// Preferred State / No Preferred
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreferenceState {
    Preferred,
    NoPreferred,
}

/// No Null position / Null state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeaningfulData {
    NoNullPosition,
    NullState,
}

/// Non Volatile / Volatile. Not applicable to Input items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Volatility {
    NonVolatile,
    Volatile,
}

/// Bit Field / Buffered Bytes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContingentKind {
    BitField,
    BufferedBytes,
}

/// Array / Variable. This is decided by the kind of element, not by the
/// user, and is therefore not part of [DataFlags].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grouping {
    Array,
    Variable,
}

/// The set of user-selectable attributes of a data field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DataFlags {
    modification: Option<Modification>,
    relation: Option<Relation>,
    wrapping: Option<Wrapping>,
    linearity: Option<Linearity>,
    preference: Option<PreferenceState>,
    meaningful_data: Option<MeaningfulData>,
    volatility: Option<Volatility>,
    contingent: Option<ContingentKind>,
}

impl DataFlags {
    /// No attribute set, i.e. Data, Absolute, No Wrap, Linear, etc.
    pub fn new() -> DataFlags {
        DataFlags::default()
    }

    /// The fixed attributes of a padding field
    pub(crate) fn padding() -> DataFlags {
        DataFlags::new()
            .modification(Modification::Constant)
            .relation(Relation::Absolute)
            .wrapping(Wrapping::NoWrap)
            .linearity(Linearity::Linear)
            .preference(PreferenceState::Preferred)
            .meaningful_data(MeaningfulData::NoNullPosition)
            .contingent(ContingentKind::BitField)
    }

    pub fn modification(mut self, value: Modification) -> Self {
        self.modification = Some(value);
        self
    }

    pub fn relation(mut self, value: Relation) -> Self {
        self.relation = Some(value);
        self
    }

    pub fn wrapping(mut self, value: Wrapping) -> Self {
        self.wrapping = Some(value);
        self
    }

    pub fn linearity(mut self, value: Linearity) -> Self {
        self.linearity = Some(value);
        self
    }

    pub fn preference(mut self, value: PreferenceState) -> Self {
        self.preference = Some(value);
        self
    }

    pub fn meaningful_data(mut self, value: MeaningfulData) -> Self {
        self.meaningful_data = Some(value);
        self
    }

    pub fn volatility(mut self, value: Volatility) -> Self {
        self.volatility = Some(value);
        self
    }

    pub fn contingent(mut self, value: ContingentKind) -> Self {
        self.contingent = Some(value);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == DataFlags::default()
    }

    /// Names of the attributes that are set, in bit order
    fn set_attributes(&self) -> impl Iterator<Item = &'static str> {
        [
            self.modification.map(|_| "modification"),
            self.relation.map(|_| "relation"),
            self.wrapping.map(|_| "wrapping"),
            self.linearity.map(|_| "linearity"),
            self.preference.map(|_| "preference state"),
            self.meaningful_data.map(|_| "meaningful data"),
            self.volatility.map(|_| "volatility"),
            self.contingent.map(|_| "contingent kind"),
        ]
        .into_iter()
        .flatten()
    }

    /// Check these flags are applicable to a field of the given grouping in
    /// a report of the given kind.
    pub fn validate(&self, kind: ReportKind, grouping: Grouping) -> Result<()> {
        if kind != ReportKind::Input {
            return Ok(());
        }
        if self.volatility.is_some() {
            return Err(DescriptorError::FlagNotAllowed {
                flag: "volatility",
                kind,
            });
        }
        if grouping == Grouping::Array {
            // An index into a set of usages can only be data/constant and
            // absolute/relative, the remaining attributes describe a value.
            let disallowed = self
                .set_attributes()
                .find(|name| !matches!(*name, "modification" | "relation"));
            if let Some(flag) = disallowed {
                return Err(DescriptorError::FlagNotAllowed { flag, kind });
            }
        }
        Ok(())
    }

    /// The main item data bits for these flags
    pub fn bits(&self, grouping: Grouping) -> u32 {
        let mut bits = 0;
        let mut set = |on: bool, bit: u32| {
            if on {
                bits |= 1 << bit;
            }
        };
        set(self.modification == Some(Modification::Constant), 0);
        set(grouping == Grouping::Variable, 1);
        set(self.relation == Some(Relation::Relative), 2);
        set(self.wrapping == Some(Wrapping::Wrap), 3);
        set(self.linearity == Some(Linearity::NonLinear), 4);
        set(self.preference == Some(PreferenceState::NoPreferred), 5);
        set(self.meaningful_data == Some(MeaningfulData::NullState), 6);
        set(self.volatility == Some(Volatility::Volatile), 7);
        set(self.contingent == Some(ContingentKind::BufferedBytes), 8);
        bits
    }
}

/// Human-readable attribute names for the given main item data bits, as
/// used by the diagnostic form of main items.
pub(crate) fn describe_bits(bits: u32, kind: ReportKind) -> Vec<&'static str> {
    let pick = |bit: u32, off: &'static str, on: &'static str| {
        if bits & (1 << bit) != 0 {
            on
        } else {
            off
        }
    };
    let mut names = vec![
        pick(0, "Data", "Cnst"),
        pick(1, "Arr", "Var"),
        pick(2, "Abs", "Rel"),
    ];
    let optional = [
        (3, "Wrap"),
        (4, "NLin"),
        (5, "NPrf"),
        (6, "Null"),
        (7, "Vol"),
        (8, "Buf"),
    ];
    for (bit, name) in optional {
        if bit == 7 && kind == ReportKind::Input {
            continue;
        }
        if bits & (1 << bit) != 0 {
            names.push(name);
        }
    }
    names
}
