// SPDX-License-Identifier: MIT

//! Leaf element modules: the fields that make up a report.

use super::{Module, ReportKind};
use crate::config::{ComposeContext, PackingPolicy};
use crate::element::{ElementKind, ElementSpec, RangeSentinel};
use crate::emit::{Emitter, FieldUsages};
use crate::flags::{DataFlags, Grouping};
use crate::unit::{Unit, UnitExponent};
use crate::usage::{UsageRange, UsageRef};
use crate::{DescriptorError, Result, MAX_FIELD_BITS};

/// The largest report count of a single field
pub const MAX_REPORT_COUNT: u32 = u16::MAX as u32;

/// The value both physical extents hold while the physical range is
/// undefined. HID defines a physical range of `[0, 0]` as "same as the
/// logical range".
pub const UNDEFINED_PHYSICAL: i32 = 0;

pub(crate) fn check_range(what: &'static str, value: i64, min: i64, max: i64) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(DescriptorError::OutOfRange {
            what,
            value,
            min,
            max,
        })
    }
}

/// The full signed range of a field of `bits` bits (1..=32).
pub fn signed_range(bits: u32) -> (i32, i32) {
    debug_assert!((1..=MAX_FIELD_BITS).contains(&bits));
    let half = 1i64 << (bits - 1);
    ((-half) as i32, (half - 1) as i32)
}

/// The full unsigned range of a field of `bits` bits (1..=32).
///
/// Logical values are signed 32-bit quantities for the consumers of the
/// descriptor, a 32-bit unsigned field therefore gets the 31-bit range
/// `[0, 2^31 - 1]`.
pub fn unsigned_range(bits: u32) -> (i32, i32) {
    debug_assert!((1..=MAX_FIELD_BITS).contains(&bits));
    let bits = bits.min(31);
    (0, ((1i64 << bits) - 1) as i32)
}

/// The smallest field size whose range holds both `minimum` and `maximum`.
/// The range is signed if `minimum` is negative, unsigned otherwise.
pub fn minimal_bits(minimum: i32, maximum: i32) -> u32 {
    let (minimum, maximum) = (i64::from(minimum), i64::from(maximum));
    let fits = |bits: u32| {
        if minimum < 0 {
            let half = 1i64 << (bits - 1);
            -half <= minimum && maximum < half
        } else {
            maximum < (1i64 << bits)
        }
    };
    (1..=MAX_FIELD_BITS).find(|bits| fits(*bits)).unwrap_or(MAX_FIELD_BITS)
}

/// The bit width of a field before and after packing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSize {
    requested: u32,
    packing: PackingPolicy,
}

impl FieldSize {
    pub(crate) fn new(requested: u32, packing: PackingPolicy) -> Result<FieldSize> {
        check_range(
            "field size in bits",
            i64::from(requested),
            1,
            i64::from(MAX_FIELD_BITS),
        )?;
        Ok(FieldSize { requested, packing })
    }

    /// The size the field asked for
    pub fn requested(&self) -> u32 {
        self.requested
    }

    /// The size the field occupies on the wire
    pub fn adjusted(&self) -> u32 {
        self.packing.round_up(self.requested)
    }

    pub(crate) fn with_requested(self, requested: u32) -> FieldSize {
        FieldSize { requested, ..self }
    }
}

/// Everything a data-carrying field shares, regardless of its usages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataField {
    size: FieldSize,
    logical_minimum: i32,
    logical_maximum: i32,
    physical: Option<(i32, i32)>,
    unit: Option<Unit>,
    unit_exponent: Option<UnitExponent>,
    flags: DataFlags,
    report_kind: ReportKind,
}

impl DataField {
    pub fn size(&self) -> FieldSize {
        self.size
    }

    pub fn logical_minimum(&self) -> i32 {
        self.logical_minimum
    }

    pub fn logical_maximum(&self) -> i32 {
        self.logical_maximum
    }

    pub fn physical_is_undefined(&self) -> bool {
        self.physical.is_none()
    }

    pub fn physical_minimum(&self) -> i32 {
        self.physical.map_or(UNDEFINED_PHYSICAL, |(min, _)| min)
    }

    pub fn physical_maximum(&self) -> i32 {
        self.physical.map_or(UNDEFINED_PHYSICAL, |(_, max)| max)
    }

    /// The physical range a host will apply: the logical range while both
    /// physical extents sit at their undefined value.
    pub fn interpreted_physical(&self) -> (i32, i32) {
        let (min, max) = (self.physical_minimum(), self.physical_maximum());
        if min == UNDEFINED_PHYSICAL && max == UNDEFINED_PHYSICAL {
            (self.logical_minimum, self.logical_maximum)
        } else {
            (min, max)
        }
    }

    pub fn unit(&self) -> Option<Unit> {
        self.unit
    }

    pub fn unit_exponent(&self) -> Option<UnitExponent> {
        self.unit_exponent
    }

    pub fn flags(&self) -> DataFlags {
        self.flags
    }

    pub fn report_kind(&self) -> ReportKind {
        self.report_kind
    }

    /// Resolve size and ranges of a Variable or VariableRange field.
    fn resolve(
        spec: &ElementSpec,
        report_kind: ReportKind,
        grouping: Grouping,
        packing: PackingPolicy,
    ) -> Result<DataField> {
        let (size, logical_minimum, logical_maximum) = match (
            spec.size_in_bits,
            spec.logical_range,
            spec.logical_sentinel,
        ) {
            (_, Some(_), Some(_)) => {
                return Err(DescriptorError::Conflict(
                    "a logical range cannot be combined with a maximum-range logical range",
                ))
            }
            (Some(_), Some(_), None) => {
                return Err(DescriptorError::Conflict(
                    "the size of a field with a logical range is derived from that range",
                ))
            }
            (None, None, Some(_)) => {
                return Err(DescriptorError::Missing(
                    "size in bits for a maximum-range logical range",
                ))
            }
            (None, None, None) => return Err(DescriptorError::Missing("size or logical range")),
            (Some(bits), None, None) => {
                let size = FieldSize::new(bits, packing)?;
                let (min, max) = signed_range(bits);
                (size, min, max)
            }
            (None, Some((min, max)), None) => {
                check_range(
                    "logical maximum",
                    i64::from(max),
                    i64::from(min),
                    i64::from(i32::MAX),
                )?;
                let size = FieldSize::new(minimal_bits(min, max), packing)?;
                (size, min, max)
            }
            (Some(bits), None, Some(sentinel)) => {
                let size = FieldSize::new(bits, packing)?;
                let (min, max) = match sentinel {
                    RangeSentinel::MaxSigned => signed_range(bits),
                    RangeSentinel::MaxUnsigned => unsigned_range(bits),
                };
                (size, min, max)
            }
        };

        if let Some((min, max)) = spec.physical_range {
            check_range(
                "physical maximum",
                i64::from(max),
                i64::from(min),
                i64::from(i32::MAX),
            )?;
        }

        let flags = spec.flags.unwrap_or_default();
        flags.validate(report_kind, grouping)?;

        Ok(DataField {
            size,
            logical_minimum,
            logical_maximum,
            physical: spec.physical_range,
            unit: spec.unit,
            unit_exponent: spec.unit_exponent,
            flags,
            report_kind,
        })
    }

    pub(crate) fn grow_to(&mut self, requested: u32) {
        self.size = self.size.with_requested(requested);
    }
}

fn resolve_count(spec: &ElementSpec) -> Result<u32> {
    let count = spec.count.unwrap_or(1);
    check_range("report count", i64::from(count), 1, i64::from(MAX_REPORT_COUNT))?;
    Ok(count)
}

fn usage_range_of(spec: &ElementSpec) -> Result<UsageRange> {
    if spec.usage.is_some() {
        return Err(DescriptorError::Conflict(
            "a usage range field cannot also have a single usage",
        ));
    }
    match spec.usage_range {
        Some((start, end)) => UsageRange::new(start, end),
        None => Err(DescriptorError::Missing("usage range")),
    }
}

/// A field with a single usage, repeated `count` times.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableModule {
    usage: UsageRef,
    count: u32,
    field: DataField,
}

impl VariableModule {
    fn new(spec: &ElementSpec, report_kind: ReportKind, ctx: &ComposeContext) -> Result<Self> {
        if spec.usage_range.is_some() {
            return Err(DescriptorError::Conflict(
                "a variable takes a single usage, not a usage range",
            ));
        }
        let usage = spec.usage.ok_or(DescriptorError::Missing("usage"))?;
        let count = resolve_count(spec)?;
        let field = DataField::resolve(spec, report_kind, Grouping::Variable, ctx.packing())?;
        Ok(VariableModule {
            usage,
            count,
            field,
        })
    }

    pub fn usage(&self) -> UsageRef {
        self.usage
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn field(&self) -> &DataField {
        &self.field
    }

    /// True if `other` can share one main item with this field, i.e. the
    /// two differ in nothing but their usage id.
    pub fn combinable_with(&self, other: &VariableModule) -> bool {
        let (a, b) = (&self.field, &other.field);
        self.count == 1
            && other.count == 1
            && self.usage.page() == other.usage.page()
            && a.size.adjusted() == b.size.adjusted()
            && a.logical_minimum == b.logical_minimum
            && a.logical_maximum == b.logical_maximum
            && a.physical_minimum() == b.physical_minimum()
            && a.physical_maximum() == b.physical_maximum()
            && a.physical_is_undefined() == b.physical_is_undefined()
            && a.interpreted_physical() == b.interpreted_physical()
            && a.unit == b.unit
            && a.unit_exponent == b.unit_exponent
            && a.report_kind == b.report_kind
            && a.flags == b.flags
    }
}

/// A field with one value per usage of a contiguous usage range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableRangeModule {
    usages: UsageRange,
    field: DataField,
}

impl VariableRangeModule {
    fn new(spec: &ElementSpec, report_kind: ReportKind, ctx: &ComposeContext) -> Result<Self> {
        let usages = usage_range_of(spec)?;
        if spec.count.is_some() {
            return Err(DescriptorError::Conflict(
                "the count of a usage range variable is implied by its usage range",
            ));
        }
        check_range(
            "report count",
            i64::from(usages.count()),
            1,
            i64::from(MAX_REPORT_COUNT),
        )?;
        let field = DataField::resolve(spec, report_kind, Grouping::Variable, ctx.packing())?;
        Ok(VariableRangeModule { usages, field })
    }

    pub fn usages(&self) -> UsageRange {
        self.usages
    }

    pub fn count(&self) -> u32 {
        self.usages.count()
    }

    pub fn field(&self) -> &DataField {
        &self.field
    }
}

/// An index into a contiguous usage range, `0` meaning "nothing selected".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayModule {
    usages: UsageRange,
    count: u32,
    field: DataField,
}

impl ArrayModule {
    fn new(spec: &ElementSpec, report_kind: ReportKind, ctx: &ComposeContext) -> Result<Self> {
        let usages = usage_range_of(spec)?;
        if spec.size_in_bits.is_some()
            || spec.logical_range.is_some()
            || spec.logical_sentinel.is_some()
        {
            return Err(DescriptorError::Conflict(
                "the size and logical range of an array are derived from its usage range",
            ));
        }
        if spec.physical_range.is_some() || spec.unit.is_some() || spec.unit_exponent.is_some() {
            return Err(DescriptorError::Conflict(
                "an array index has no physical range or unit",
            ));
        }
        usages.ensure_populated(ctx.usages())?;
        let count = resolve_count(spec)?;

        let range_count = usages.count();
        let bits = u32::BITS - range_count.leading_zeros();
        let flags = spec.flags.unwrap_or_default();
        flags.validate(report_kind, Grouping::Array)?;

        let field = DataField {
            size: FieldSize::new(bits, ctx.packing())?,
            logical_minimum: 1,
            logical_maximum: range_count as i32,
            physical: None,
            unit: None,
            unit_exponent: None,
            flags,
            report_kind,
        };
        Ok(ArrayModule {
            usages,
            count,
            field,
        })
    }

    pub fn usages(&self) -> UsageRange {
        self.usages
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn field(&self) -> &DataField {
        &self.field
    }
}

/// Constant bits. Padding is never packed, it exists to reach an exact
/// bit position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaddingModule {
    size: FieldSize,
}

impl PaddingModule {
    pub(crate) fn new(size_in_bits: u32) -> Result<PaddingModule> {
        Ok(PaddingModule {
            size: FieldSize::new(size_in_bits, PackingPolicy::none())?,
        })
    }

    fn from_spec(spec: &ElementSpec) -> Result<PaddingModule> {
        let extras = spec.usage.is_some()
            || spec.usage_range.is_some()
            || spec.logical_range.is_some()
            || spec.logical_sentinel.is_some()
            || spec.physical_range.is_some()
            || spec.flags.is_some()
            || spec.unit.is_some()
            || spec.unit_exponent.is_some();
        if extras {
            return Err(DescriptorError::Conflict("padding takes nothing but a size"));
        }
        if let Some(count) = spec.count {
            check_range("padding count", i64::from(count), 1, 1)?;
        }
        let bits = spec
            .size_in_bits
            .ok_or(DescriptorError::Missing("padding size in bits"))?;
        PaddingModule::new(bits)
    }

    pub fn size_in_bits(&self) -> u32 {
        self.size.requested()
    }

    pub fn flags(&self) -> DataFlags {
        DataFlags::padding()
    }
}

/// A leaf of the module tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeafModule {
    Variable(VariableModule),
    VariableRange(VariableRangeModule),
    Array(ArrayModule),
    Padding(PaddingModule),
}

impl LeafModule {
    /// Build a leaf for a report of the given kind.
    ///
    /// Errors are wrapped with the element's name, if it has one.
    pub fn new(spec: ElementSpec, report_kind: ReportKind, ctx: &ComposeContext) -> Result<LeafModule> {
        let leaf = match spec.kind {
            ElementKind::Variable => {
                VariableModule::new(&spec, report_kind, ctx).map(LeafModule::Variable)
            }
            ElementKind::VariableRange => {
                VariableRangeModule::new(&spec, report_kind, ctx).map(LeafModule::VariableRange)
            }
            ElementKind::Array => ArrayModule::new(&spec, report_kind, ctx).map(LeafModule::Array),
            ElementKind::Padding => PaddingModule::from_spec(&spec).map(LeafModule::Padding),
        };
        leaf.map_err(|err| match spec.name {
            Some(name) => DescriptorError::Named {
                name,
                source: Box::new(err),
            },
            None => err,
        })
    }

    pub(crate) fn padding(size_in_bits: u32) -> Result<LeafModule> {
        PaddingModule::new(size_in_bits).map(LeafModule::Padding)
    }

    pub fn is_padding(&self) -> bool {
        matches!(self, LeafModule::Padding(_))
    }

    /// The number of values of this field
    pub fn count(&self) -> u32 {
        match self {
            LeafModule::Variable(v) => v.count(),
            LeafModule::VariableRange(v) => v.count(),
            LeafModule::Array(a) => a.count(),
            LeafModule::Padding(_) => 1,
        }
    }

    /// The size of a single value of this field
    pub fn size(&self) -> FieldSize {
        match self {
            LeafModule::Variable(v) => v.field.size,
            LeafModule::VariableRange(v) => v.field.size,
            LeafModule::Array(a) => a.field.size,
            LeafModule::Padding(p) => p.size,
        }
    }

    /// The report kind this leaf was built for. Padding fits any report.
    pub fn report_kind(&self) -> Option<ReportKind> {
        match self {
            LeafModule::Variable(v) => Some(v.field.report_kind),
            LeafModule::VariableRange(v) => Some(v.field.report_kind),
            LeafModule::Array(a) => Some(a.field.report_kind),
            LeafModule::Padding(_) => None,
        }
    }

    /// Change the requested size of a single value. Used by the layout
    /// engine only, `requested` is within 1..=32.
    pub(crate) fn set_requested_size(&mut self, requested: u32) {
        match self {
            LeafModule::Variable(v) => v.field.grow_to(requested),
            LeafModule::VariableRange(v) => v.field.grow_to(requested),
            LeafModule::Array(a) => a.field.grow_to(requested),
            LeafModule::Padding(p) => p.size = p.size.with_requested(requested),
        }
    }
}

impl Module for LeafModule {
    fn total_size_bits(&self) -> u32 {
        self.count() * self.size().adjusted()
    }

    fn total_nonadjusted_size_bits(&self) -> u32 {
        self.count() * self.size().requested()
    }

    fn emit(&self, out: &mut Emitter) {
        match self {
            LeafModule::Variable(v) => out.data_field(
                FieldUsages::List(core::slice::from_ref(&v.usage)),
                &v.field,
                v.count,
                Grouping::Variable,
            ),
            LeafModule::VariableRange(v) => out.data_field(
                FieldUsages::Range(v.usages),
                &v.field,
                v.count(),
                Grouping::Variable,
            ),
            LeafModule::Array(a) => {
                out.data_field(FieldUsages::Range(a.usages), &a.field, a.count, Grouping::Array)
            }
            LeafModule::Padding(p) => out.padding(p.size_in_bits()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompileOptions;
    use crate::flags::{Relation, Volatility, Wrapping};
    use crate::item::{ItemKind, ShortItem};
    use crate::module::ReportModule;
    use crate::usage::{AnyUsage, UsageTable};

    fn x() -> UsageRef {
        UsageRef::new(0x01, 0x30)
    }

    fn leaf(spec: ElementSpec) -> Result<LeafModule> {
        let options = CompileOptions::new();
        let ctx = ComposeContext::new(&options, &AnyUsage);
        LeafModule::new(spec, ReportKind::Input, &ctx)
    }

    fn variable(spec: ElementSpec) -> VariableModule {
        match leaf(spec).unwrap() {
            LeafModule::Variable(v) => v,
            other => panic!("expected a variable, got {other:?}"),
        }
    }

    #[test]
    fn test_signed_and_unsigned_ranges() {
        assert_eq!(signed_range(1), (-1, 0));
        assert_eq!(signed_range(8), (-128, 127));
        assert_eq!(signed_range(32), (i32::MIN, i32::MAX));
        assert_eq!(unsigned_range(1), (0, 1));
        assert_eq!(unsigned_range(8), (0, 255));
        assert_eq!(unsigned_range(31), (0, i32::MAX));
        assert_eq!(unsigned_range(32), (0, i32::MAX));
    }

    #[test]
    fn test_minimal_bits() {
        assert_eq!(minimal_bits(0, 0), 1);
        assert_eq!(minimal_bits(0, 1), 1);
        assert_eq!(minimal_bits(0, 100), 7);
        assert_eq!(minimal_bits(0, 255), 8);
        assert_eq!(minimal_bits(0, 256), 9);
        assert_eq!(minimal_bits(-1, 0), 1);
        assert_eq!(minimal_bits(-128, 127), 8);
        assert_eq!(minimal_bits(-1, 128), 9);
        assert_eq!(minimal_bits(-129, 0), 9);
        assert_eq!(minimal_bits(0, i32::MAX), 31);
        assert_eq!(minimal_bits(i32::MIN, i32::MAX), 32);
    }

    #[test]
    fn test_explicit_size_defaults_to_signed_range() {
        let v = variable(ElementSpec::variable(x()).size_in_bits(8));
        assert_eq!(v.field().size().requested(), 8);
        assert_eq!(v.field().logical_minimum(), -128);
        assert_eq!(v.field().logical_maximum(), 127);
        assert_eq!(v.count(), 1);
    }

    #[test]
    fn test_decimal_range_resolves_size() {
        let v = variable(ElementSpec::variable(x()).logical_range(0, 100));
        assert_eq!(v.field().size().requested(), 7);
        assert_eq!(v.field().logical_minimum(), 0);
        assert_eq!(v.field().logical_maximum(), 100);

        let v = variable(ElementSpec::variable(x()).logical_range(-100, 100));
        assert_eq!(v.field().size().requested(), 8);
    }

    #[test]
    fn test_decimal_range_under_byte_packing() {
        let options = CompileOptions::new().packing(PackingPolicy::bytes(1).unwrap());
        let ctx = ComposeContext::new(&options, &AnyUsage);
        let spec = ElementSpec::variable(x()).logical_range(0, 100);
        let leaf = LeafModule::new(spec, ReportKind::Input, &ctx).unwrap();
        assert_eq!(leaf.size().requested(), 7);
        assert_eq!(leaf.size().adjusted(), 8);
        assert_eq!(leaf.total_size_bits(), 8);
        assert_eq!(leaf.total_nonadjusted_size_bits(), 7);
    }

    #[test]
    fn test_sentinel_ranges() {
        let v = variable(ElementSpec::variable(x()).size_in_bits(8).logical_max_unsigned());
        assert_eq!((v.field().logical_minimum(), v.field().logical_maximum()), (0, 255));

        let v = variable(ElementSpec::variable(x()).size_in_bits(4).logical_max_signed());
        assert_eq!((v.field().logical_minimum(), v.field().logical_maximum()), (-8, 7));

        let v = variable(ElementSpec::variable(x()).size_in_bits(32).logical_max_unsigned());
        assert_eq!((v.field().logical_minimum(), v.field().logical_maximum()), (0, i32::MAX));
    }

    #[test]
    fn test_conflicting_modes() {
        let both = ElementSpec::variable(x()).size_in_bits(8).logical_range(0, 10);
        assert!(matches!(leaf(both), Err(DescriptorError::Conflict(_))));

        let mixed = ElementSpec::variable(x()).logical_range(0, 10).logical_max_signed();
        assert!(matches!(leaf(mixed), Err(DescriptorError::Conflict(_))));

        let sentinel_only = ElementSpec::variable(x()).logical_max_unsigned();
        assert!(matches!(leaf(sentinel_only), Err(DescriptorError::Missing(_))));

        let nothing = ElementSpec::variable(x());
        assert!(matches!(leaf(nothing), Err(DescriptorError::Missing(_))));

        let two_usages = ElementSpec::variable(x())
            .usage_range(UsageRef::new(0x09, 1), UsageRef::new(0x09, 2))
            .size_in_bits(1);
        assert!(matches!(leaf(two_usages), Err(DescriptorError::Conflict(_))));
    }

    #[test]
    fn test_out_of_range_values() {
        for bits in [0, 33] {
            let spec = ElementSpec::variable(x()).size_in_bits(bits);
            assert!(matches!(leaf(spec), Err(DescriptorError::OutOfRange { .. })));
        }
        for count in [0, MAX_REPORT_COUNT + 1] {
            let spec = ElementSpec::variable(x()).size_in_bits(8).count(count);
            assert!(matches!(leaf(spec), Err(DescriptorError::OutOfRange { .. })));
        }
        let inverted = ElementSpec::variable(x()).logical_range(10, 0);
        assert!(matches!(leaf(inverted), Err(DescriptorError::OutOfRange { .. })));

        let inverted = ElementSpec::variable(x()).size_in_bits(8).physical_range(10, 0);
        assert!(matches!(leaf(inverted), Err(DescriptorError::OutOfRange { .. })));
    }

    #[test]
    fn test_physical_range_interpretation() {
        let v = variable(ElementSpec::variable(x()).logical_range(-127, 127));
        assert!(v.field().physical_is_undefined());
        assert_eq!(v.field().physical_minimum(), UNDEFINED_PHYSICAL);
        assert_eq!(v.field().interpreted_physical(), (-127, 127));

        let v = variable(ElementSpec::variable(x()).logical_range(0, 255).physical_range(0, 360));
        assert!(!v.field().physical_is_undefined());
        assert_eq!(v.field().interpreted_physical(), (0, 360));

        // An explicit [0, 0] is indistinguishable from an undefined range
        let v = variable(ElementSpec::variable(x()).logical_range(0, 255).physical_range(0, 0));
        assert!(!v.field().physical_is_undefined());
        assert_eq!(v.field().interpreted_physical(), (0, 255));
    }

    #[test]
    fn test_variable_range() {
        let spec = ElementSpec::variable_range(UsageRef::new(0x09, 1), UsageRef::new(0x09, 5))
            .logical_range(0, 1);
        let buttons = leaf(spec).unwrap();
        assert_eq!(buttons.count(), 5);
        assert_eq!(buttons.size().requested(), 1);
        assert_eq!(buttons.total_size_bits(), 5);

        let counted = ElementSpec::variable_range(UsageRef::new(0x09, 1), UsageRef::new(0x09, 5))
            .logical_range(0, 1)
            .count(5);
        assert!(matches!(leaf(counted), Err(DescriptorError::Conflict(_))));
    }

    #[test]
    fn test_array_sizing() {
        let spec = ElementSpec::array(UsageRef::new(0x09, 1), UsageRef::new(0x09, 3));
        let LeafModule::Array(array) = leaf(spec).unwrap() else {
            panic!("expected an array");
        };
        assert_eq!(array.field().size().requested(), 2);
        assert_eq!(array.field().logical_minimum(), 1);
        assert_eq!(array.field().logical_maximum(), 3);
        assert_eq!(array.count(), 1);

        let spec = ElementSpec::array(UsageRef::new(0x07, 0), UsageRef::new(0x07, 0xFF)).count(6);
        let keys = leaf(spec).unwrap();
        assert_eq!(keys.size().requested(), 9);
        assert_eq!(keys.total_size_bits(), 54);
    }

    #[test]
    fn test_array_rejects_explicit_size() {
        let spec = ElementSpec::array(UsageRef::new(0x09, 1), UsageRef::new(0x09, 3)).size_in_bits(8);
        assert!(matches!(leaf(spec), Err(DescriptorError::Conflict(_))));
    }

    #[test]
    fn test_array_input_flags() {
        let range = (UsageRef::new(0x09, 1), UsageRef::new(0x09, 3));
        let ok = ElementSpec::array(range.0, range.1)
            .flags(DataFlags::new().relation(Relation::Relative));
        assert!(leaf(ok).is_ok());

        let wrapped = ElementSpec::array(range.0, range.1)
            .flags(DataFlags::new().wrapping(Wrapping::Wrap));
        assert!(matches!(leaf(wrapped), Err(DescriptorError::FlagNotAllowed { .. })));

        let options = CompileOptions::new();
        let ctx = ComposeContext::new(&options, &AnyUsage);
        let wrapped = ElementSpec::array(range.0, range.1)
            .flags(DataFlags::new().wrapping(Wrapping::Wrap));
        assert!(LeafModule::new(wrapped, ReportKind::Feature, &ctx).is_ok());
    }

    struct NoButtonTwo;

    impl UsageTable for NoButtonTwo {
        fn contains(&self, page: u16, id: u16) -> bool {
            !(page == 0x09 && id == 2)
        }
    }

    #[test]
    fn test_array_requires_populated_range() {
        let options = CompileOptions::new();
        let ctx = ComposeContext::new(&options, &NoButtonTwo);
        let spec = ElementSpec::array(UsageRef::new(0x09, 1), UsageRef::new(0x09, 3));
        assert!(matches!(
            LeafModule::new(spec, ReportKind::Input, &ctx),
            Err(DescriptorError::InvalidUsage(_))
        ));
    }

    #[test]
    fn test_volatile_input_rejected() {
        let spec = ElementSpec::variable(x())
            .size_in_bits(8)
            .flags(DataFlags::new().volatility(Volatility::Volatile));
        assert!(matches!(leaf(spec), Err(DescriptorError::FlagNotAllowed { .. })));
    }

    #[test]
    fn test_padding() {
        let pad = leaf(ElementSpec::padding(5)).unwrap();
        assert!(pad.is_padding());
        assert_eq!(pad.total_size_bits(), 5);
        assert_eq!(pad.report_kind(), None);

        assert!(leaf(ElementSpec::padding(5).count(1)).is_ok());
        assert!(leaf(ElementSpec::padding(5).count(2)).is_err());
        assert!(leaf(ElementSpec::padding(5).usage(x())).is_err());
        assert!(leaf(ElementSpec::padding(0)).is_err());
        assert!(leaf(ElementSpec::new(ElementKind::Padding)).is_err());
    }

    #[test]
    fn test_padding_ignores_packing() {
        let options = CompileOptions::new().packing(PackingPolicy::bytes(1).unwrap());
        let ctx = ComposeContext::new(&options, &AnyUsage);
        let pad = LeafModule::new(ElementSpec::padding(3), ReportKind::Input, &ctx).unwrap();
        assert_eq!(pad.total_size_bits(), 3);
    }

    #[test]
    fn test_named_errors() {
        let spec = ElementSpec::variable(x()).size_in_bits(40).name("x axis");
        match leaf(spec) {
            Err(DescriptorError::Named { name, source }) => {
                assert_eq!(name, "x axis");
                assert!(matches!(*source, DescriptorError::OutOfRange { .. }));
            }
            other => panic!("expected a named error, got {other:?}"),
        }
    }

    #[test]
    fn test_combinable() {
        let a = variable(ElementSpec::variable(x()).size_in_bits(8));
        let b = variable(ElementSpec::variable(UsageRef::new(0x01, 0x31)).size_in_bits(8));
        let c = variable(ElementSpec::variable(UsageRef::new(0x01, 0x32)).size_in_bits(16));
        let d = variable(ElementSpec::variable(UsageRef::new(0x01, 0x33)).size_in_bits(8).count(2));
        let e = variable(ElementSpec::variable(UsageRef::new(0x02, 0x33)).size_in_bits(8));
        assert!(a.combinable_with(&b));
        assert!(!a.combinable_with(&c));
        assert!(!a.combinable_with(&d));
        assert!(!a.combinable_with(&e));
    }

    #[test]
    fn test_combinable_requires_identical_fields() {
        let y = || ElementSpec::variable(UsageRef::new(0x01, 0x31)).size_in_bits(8);
        let plain = variable(ElementSpec::variable(x()).size_in_bits(8));
        assert!(plain.combinable_with(&variable(y())));

        let differing = [
            y().physical_range(0, 100),
            y().physical_range(0, 0),
            y().unit(Unit::centimeter()),
            y().unit_exponent(UnitExponent::new(-2).unwrap()),
            y().flags(DataFlags::new().relation(Relation::Relative)),
        ];
        for spec in differing {
            let other = variable(spec);
            assert!(!plain.combinable_with(&other), "{other:?}");
            assert!(!other.combinable_with(&plain), "{other:?}");
        }
    }

    #[test]
    fn test_variable_emits_single_usage() {
        let field = leaf(ElementSpec::variable(x()).size_in_bits(8).count(2)).unwrap();
        let report = ReportModule::new(ReportKind::Input, 1, vec![field.into()]).unwrap();
        let mut out = Emitter::new(&CompileOptions::new());
        report.emit(&mut out);
        let items = out.finish();

        let usages: Vec<&ShortItem> = items
            .iter()
            .filter(|item| item.kind() == ItemKind::Usage)
            .collect();
        assert_eq!(usages, vec![&ShortItem::unsigned(ItemKind::Usage, 0x30)]);
        assert!(items.contains(&ShortItem::unsigned(ItemKind::UsagePage, 0x01)));
        assert!(items.contains(&ShortItem::unsigned(ItemKind::ReportCount, 2)));
        assert_eq!(items.last(), Some(&ShortItem::main(ReportKind::Input, 0x02)));
    }
}
