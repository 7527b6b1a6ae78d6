// SPDX-License-Identifier: MIT

//! HID short items (HID 1.11 Section 6.2.2.2).
//!
//! A short item is one prefix byte followed by 0, 1, 2 or 4 data bytes:
//!
//! ```text
//! bit    7 6 5 4   3 2    1 0
//!        tag       type   size
//! ```
//!
//! Values are stored in as few bytes as possible. Since three data bytes
//! cannot be expressed, a three-byte value is extended to four.

use crate::flags::describe_bits;
use crate::module::ReportKind;
use core::fmt;

/// The type field of a short item prefix
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ItemCategory {
    Main = 0,
    Global = 1,
    Local = 2,
}

/// Every short item this crate knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemKind {
    Input,
    Output,
    Feature,
    Collection,
    EndCollection,
    UsagePage,
    LogicalMinimum,
    LogicalMaximum,
    PhysicalMinimum,
    PhysicalMaximum,
    UnitExponent,
    Unit,
    ReportSize,
    ReportId,
    ReportCount,
    Push,
    Pop,
    Usage,
    UsageMinimum,
    UsageMaximum,
    DesignatorIndex,
    DesignatorMinimum,
    DesignatorMaximum,
    StringIndex,
    StringMinimum,
    StringMaximum,
    Delimiter,
}

impl ItemKind {
    pub const ALL: [ItemKind; 27] = [
        ItemKind::Input,
        ItemKind::Output,
        ItemKind::Feature,
        ItemKind::Collection,
        ItemKind::EndCollection,
        ItemKind::UsagePage,
        ItemKind::LogicalMinimum,
        ItemKind::LogicalMaximum,
        ItemKind::PhysicalMinimum,
        ItemKind::PhysicalMaximum,
        ItemKind::UnitExponent,
        ItemKind::Unit,
        ItemKind::ReportSize,
        ItemKind::ReportId,
        ItemKind::ReportCount,
        ItemKind::Push,
        ItemKind::Pop,
        ItemKind::Usage,
        ItemKind::UsageMinimum,
        ItemKind::UsageMaximum,
        ItemKind::DesignatorIndex,
        ItemKind::DesignatorMinimum,
        ItemKind::DesignatorMaximum,
        ItemKind::StringIndex,
        ItemKind::StringMinimum,
        ItemKind::StringMaximum,
        ItemKind::Delimiter,
    ];

    /// The (type, tag) pair of this item's prefix byte
    pub const fn prefix_fields(self) -> (ItemCategory, u8) {
        use ItemCategory::*;
        match self {
            ItemKind::Input => (Main, 0x8),
            ItemKind::Output => (Main, 0x9),
            ItemKind::Feature => (Main, 0xB),
            ItemKind::Collection => (Main, 0xA),
            ItemKind::EndCollection => (Main, 0xC),
            ItemKind::UsagePage => (Global, 0x0),
            ItemKind::LogicalMinimum => (Global, 0x1),
            ItemKind::LogicalMaximum => (Global, 0x2),
            ItemKind::PhysicalMinimum => (Global, 0x3),
            ItemKind::PhysicalMaximum => (Global, 0x4),
            ItemKind::UnitExponent => (Global, 0x5),
            ItemKind::Unit => (Global, 0x6),
            ItemKind::ReportSize => (Global, 0x7),
            ItemKind::ReportId => (Global, 0x8),
            ItemKind::ReportCount => (Global, 0x9),
            ItemKind::Push => (Global, 0xA),
            ItemKind::Pop => (Global, 0xB),
            ItemKind::Usage => (Local, 0x0),
            ItemKind::UsageMinimum => (Local, 0x1),
            ItemKind::UsageMaximum => (Local, 0x2),
            ItemKind::DesignatorIndex => (Local, 0x3),
            ItemKind::DesignatorMinimum => (Local, 0x4),
            ItemKind::DesignatorMaximum => (Local, 0x5),
            ItemKind::StringIndex => (Local, 0x7),
            ItemKind::StringMinimum => (Local, 0x8),
            ItemKind::StringMaximum => (Local, 0x9),
            ItemKind::Delimiter => (Local, 0xA),
        }
    }

    pub const fn category(self) -> ItemCategory {
        self.prefix_fields().0
    }

    pub const fn tag(self) -> u8 {
        self.prefix_fields().1
    }

    /// Logical and physical extents are two's complement, everything else
    /// is unsigned.
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            ItemKind::LogicalMinimum
                | ItemKind::LogicalMaximum
                | ItemKind::PhysicalMinimum
                | ItemKind::PhysicalMaximum
        )
    }

    /// False for the items that never carry data
    pub const fn has_data(self) -> bool {
        !matches!(self, ItemKind::EndCollection | ItemKind::Push | ItemKind::Pop)
    }

    /// Look up the item kind of a prefix byte, ignoring its size bits.
    pub fn from_prefix(prefix: u8) -> Option<ItemKind> {
        let category = (prefix >> 2) & 0x3;
        let tag = prefix >> 4;
        ItemKind::ALL.into_iter().find(|kind| {
            let (c, t) = kind.prefix_fields();
            c as u8 == category && t == tag
        })
    }

    fn name(self) -> &'static str {
        match self {
            ItemKind::Input => "Input",
            ItemKind::Output => "Output",
            ItemKind::Feature => "Feature",
            ItemKind::Collection => "Collection",
            ItemKind::EndCollection => "End Collection",
            ItemKind::UsagePage => "Usage Page",
            ItemKind::LogicalMinimum => "Logical Minimum",
            ItemKind::LogicalMaximum => "Logical Maximum",
            ItemKind::PhysicalMinimum => "Physical Minimum",
            ItemKind::PhysicalMaximum => "Physical Maximum",
            ItemKind::UnitExponent => "Unit Exponent",
            ItemKind::Unit => "Unit",
            ItemKind::ReportSize => "Report Size",
            ItemKind::ReportId => "Report ID",
            ItemKind::ReportCount => "Report Count",
            ItemKind::Push => "Push",
            ItemKind::Pop => "Pop",
            ItemKind::Usage => "Usage",
            ItemKind::UsageMinimum => "Usage Minimum",
            ItemKind::UsageMaximum => "Usage Maximum",
            ItemKind::DesignatorIndex => "Designator Index",
            ItemKind::DesignatorMinimum => "Designator Minimum",
            ItemKind::DesignatorMaximum => "Designator Maximum",
            ItemKind::StringIndex => "String Index",
            ItemKind::StringMinimum => "String Minimum",
            ItemKind::StringMaximum => "String Maximum",
            ItemKind::Delimiter => "Delimiter",
        }
    }
}

/// Collection item data values
pub const COLLECTION_PHYSICAL: u32 = 0x00;
pub const COLLECTION_APPLICATION: u32 = 0x01;
pub const COLLECTION_LOGICAL: u32 = 0x02;

/// The data of a short item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemValue {
    None,
    Unsigned(u32),
    Signed(i32),
}

/// Little-endian bytes of `value` with high zero bytes removed. Zero is a
/// single byte, three bytes are extended to four.
pub fn truncate_unsigned(value: u32) -> Vec<u8> {
    let mut bytes = value.to_le_bytes().to_vec();
    while bytes.len() > 1 && bytes.last() == Some(&0x00) {
        bytes.pop();
    }
    if bytes.len() == 3 {
        bytes.push(0x00);
    }
    bytes
}

/// Little-endian two's complement bytes of `value` with high sign bytes
/// removed as long as the remaining top byte still carries the sign.
/// Three bytes are sign-extended to four.
pub fn truncate_signed(value: i32) -> Vec<u8> {
    let (fill, sign) = if value < 0 { (0xFF, 0x80) } else { (0x00, 0x00) };
    let mut bytes = value.to_le_bytes().to_vec();
    while bytes.len() > 1
        && bytes[bytes.len() - 1] == fill
        && bytes[bytes.len() - 2] & 0x80 == sign
    {
        bytes.pop();
    }
    if bytes.len() == 3 {
        bytes.push(fill);
    }
    bytes
}

/// A single short item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShortItem {
    kind: ItemKind,
    value: ItemValue,
}

impl ShortItem {
    /// An item without data, i.e. End Collection, Push or Pop
    pub fn empty(kind: ItemKind) -> ShortItem {
        debug_assert!(!kind.has_data());
        ShortItem {
            kind,
            value: ItemValue::None,
        }
    }

    pub fn unsigned(kind: ItemKind, value: u32) -> ShortItem {
        debug_assert!(kind.has_data() && !kind.is_signed());
        ShortItem {
            kind,
            value: ItemValue::Unsigned(value),
        }
    }

    pub fn signed(kind: ItemKind, value: i32) -> ShortItem {
        debug_assert!(kind.is_signed());
        ShortItem {
            kind,
            value: ItemValue::Signed(value),
        }
    }

    /// The Input, Output or Feature item of a report kind
    pub fn main(report: ReportKind, bits: u32) -> ShortItem {
        let kind = match report {
            ReportKind::Input => ItemKind::Input,
            ReportKind::Output => ItemKind::Output,
            ReportKind::Feature => ItemKind::Feature,
        };
        ShortItem::unsigned(kind, bits)
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn value(&self) -> ItemValue {
        self.value
    }

    /// The data bytes following the prefix
    pub fn data_bytes(&self) -> Vec<u8> {
        match self.value {
            ItemValue::None => Vec::new(),
            ItemValue::Unsigned(v) => truncate_unsigned(v),
            ItemValue::Signed(v) => truncate_signed(v),
        }
    }

    /// The prefix byte followed by the data bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let data = self.data_bytes();
        let size_code = match data.len() {
            0 => 0,
            1 => 1,
            2 => 2,
            4 => 3,
            n => panic!("{n} data bytes cannot be encoded in a short item"),
        };
        let (category, tag) = self.kind.prefix_fields();
        let mut bytes = Vec::with_capacity(1 + data.len());
        bytes.push(size_code | (category as u8) << 2 | tag << 4);
        bytes.extend(data);
        bytes
    }

    /// Parse the first item of `bytes`, returning the item and the number
    /// of bytes it occupies. Long items and unknown tags yield `None`.
    pub fn decode(bytes: &[u8]) -> Option<(ShortItem, usize)> {
        let prefix = *bytes.first()?;
        let kind = ItemKind::from_prefix(prefix)?;
        let len = [0, 1, 2, 4][usize::from(prefix & 0x3)];
        let data = bytes.get(1..1 + len)?;

        let value = if len == 0 && !kind.has_data() {
            ItemValue::None
        } else if kind.is_signed() {
            let negative = data.last().is_some_and(|b| b & 0x80 != 0);
            let mut buf = if negative { [0xFF; 4] } else { [0x00; 4] };
            buf[..len].copy_from_slice(data);
            ItemValue::Signed(i32::from_le_bytes(buf))
        } else {
            let mut buf = [0x00; 4];
            buf[..len].copy_from_slice(data);
            ItemValue::Unsigned(u32::from_le_bytes(buf))
        };
        Some((ShortItem { kind, value }, 1 + len))
    }
}

impl fmt::Display for ShortItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.kind.name();
        let value = match self.value {
            ItemValue::None => return write!(f, "{name}"),
            ItemValue::Signed(v) => return write!(f, "{name} ({v})"),
            ItemValue::Unsigned(v) => v,
        };
        match self.kind {
            ItemKind::Input | ItemKind::Output | ItemKind::Feature => {
                let report = match self.kind {
                    ItemKind::Input => ReportKind::Input,
                    ItemKind::Output => ReportKind::Output,
                    _ => ReportKind::Feature,
                };
                write!(f, "{name} ({})", describe_bits(value, report).join(", "))
            }
            ItemKind::Collection => match value {
                COLLECTION_PHYSICAL => write!(f, "{name} (Physical)"),
                COLLECTION_APPLICATION => write!(f, "{name} (Application)"),
                COLLECTION_LOGICAL => write!(f, "{name} (Logical)"),
                other => write!(f, "{name} ({other:#04x})"),
            },
            ItemKind::UsagePage
            | ItemKind::Usage
            | ItemKind::UsageMinimum
            | ItemKind::UsageMaximum
            | ItemKind::Unit => write!(f, "{name} ({value:#06x})"),
            ItemKind::UnitExponent => {
                let exponent = crate::unit::exponent_from_code(value as u8);
                write!(f, "{name} ({exponent})")
            }
            _ => write!(f, "{name} ({value})"),
        }
    }
}
