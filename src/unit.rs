// SPDX-License-Identifier: MIT

//! Units and unit exponents (HID 1.11 Section 6.2.2.7).
//!
//! A [Unit] is a system plus one signed exponent per base dimension, each
//! packed as a 4-bit two's complement nibble into one 32-bit word:
//!
//! | nibble | 0      | 1      | 2    | 3    | 4           | 5       | 6                  |
//! |--------|--------|--------|------|------|-------------|---------|--------------------|
//! | value  | system | length | mass | time | temperature | current | luminous intensity |
//!
//! The [UnitExponent] is the separate base-10 multiplier of a field value
//! and uses the same nibble code.

use crate::{DescriptorError, Result};

/// The smallest exponent a nibble can hold
pub const MIN_EXPONENT: i8 = -8;
/// The largest exponent a nibble can hold
pub const MAX_EXPONENT: i8 = 7;

/// Convert an exponent into its 4-bit wire code.
///
/// The exponent must be within [MIN_EXPONENT]..=[MAX_EXPONENT].
pub fn exponent_code(exponent: i8) -> u8 {
    debug_assert!((MIN_EXPONENT..=MAX_EXPONENT).contains(&exponent));
    (exponent as u8) & 0x0F
}

/// Convert a 4-bit wire code back into the exponent it represents.
pub fn exponent_from_code(code: u8) -> i8 {
    let code = code & 0x0F;
    if code >= 8 {
        code as i8 - 16
    } else {
        code as i8
    }
}

fn check_exponent(what: &str, exponent: i32) -> Result<i8> {
    if (i32::from(MIN_EXPONENT)..=i32::from(MAX_EXPONENT)).contains(&exponent) {
        Ok(exponent as i8)
    } else {
        Err(DescriptorError::InvalidUnit(format!(
            "{what} exponent {exponent} is outside [{MIN_EXPONENT}, {MAX_EXPONENT}]"
        )))
    }
}

/// The unit system of a [Unit]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum UnitSystem {
    #[default]
    None = 0x0,
    SiLinear = 0x1,
    SiRotation = 0x2,
    EnglishLinear = 0x3,
    EnglishRotation = 0x4,
    Vendor = 0xF,
}

/// The exponent of each base dimension of a [Unit]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UnitExponents {
    pub length: i8,
    pub mass: i8,
    pub time: i8,
    pub temperature: i8,
    pub current: i8,
    pub luminous_intensity: i8,
}

/// A validated HID unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Unit {
    system: UnitSystem,
    exponents: UnitExponents,
}

impl Unit {
    /// Create a unit, all exponents must fit into a 4-bit nibble.
    pub fn new(system: UnitSystem, exponents: UnitExponents) -> Result<Unit> {
        let dimensions = [
            ("length", exponents.length),
            ("mass", exponents.mass),
            ("time", exponents.time),
            ("temperature", exponents.temperature),
            ("current", exponents.current),
            ("luminous intensity", exponents.luminous_intensity),
        ];
        for (name, exponent) in dimensions {
            check_exponent(name, i32::from(exponent))?;
        }
        Ok(Unit { system, exponents })
    }

    const fn base(system: UnitSystem, exponents: UnitExponents) -> Unit {
        Unit { system, exponents }
    }

    const fn dimension(
        length: i8,
        mass: i8,
        time: i8,
        temperature: i8,
        current: i8,
        luminous_intensity: i8,
    ) -> UnitExponents {
        UnitExponents {
            length,
            mass,
            time,
            temperature,
            current,
            luminous_intensity,
        }
    }

    /// No unit. Encodes as `0`.
    pub const fn none() -> Unit {
        Unit::base(UnitSystem::None, Unit::dimension(0, 0, 0, 0, 0, 0))
    }

    pub const fn centimeter() -> Unit {
        Unit::base(UnitSystem::SiLinear, Unit::dimension(1, 0, 0, 0, 0, 0))
    }

    pub const fn inch() -> Unit {
        Unit::base(UnitSystem::EnglishLinear, Unit::dimension(1, 0, 0, 0, 0, 0))
    }

    pub const fn radian() -> Unit {
        Unit::base(UnitSystem::SiRotation, Unit::dimension(1, 0, 0, 0, 0, 0))
    }

    pub const fn degree() -> Unit {
        Unit::base(UnitSystem::EnglishRotation, Unit::dimension(1, 0, 0, 0, 0, 0))
    }

    pub const fn second() -> Unit {
        Unit::base(UnitSystem::SiLinear, Unit::dimension(0, 0, 1, 0, 0, 0))
    }

    pub const fn gram() -> Unit {
        Unit::base(UnitSystem::SiLinear, Unit::dimension(0, 1, 0, 0, 0, 0))
    }

    pub const fn kelvin() -> Unit {
        Unit::base(UnitSystem::SiLinear, Unit::dimension(0, 0, 0, 1, 0, 0))
    }

    pub const fn fahrenheit() -> Unit {
        Unit::base(UnitSystem::EnglishLinear, Unit::dimension(0, 0, 0, 1, 0, 0))
    }

    pub const fn ampere() -> Unit {
        Unit::base(UnitSystem::SiLinear, Unit::dimension(0, 0, 0, 0, 1, 0))
    }

    pub const fn candela() -> Unit {
        Unit::base(UnitSystem::SiLinear, Unit::dimension(0, 0, 0, 0, 0, 1))
    }

    pub fn system(&self) -> UnitSystem {
        self.system
    }

    pub fn exponents(&self) -> UnitExponents {
        self.exponents
    }

    /// The packed 32-bit unit value
    pub fn packed(&self) -> u32 {
        let e = &self.exponents;
        let nibbles = [
            self.system as u8,
            exponent_code(e.length),
            exponent_code(e.mass),
            exponent_code(e.time),
            exponent_code(e.temperature),
            exponent_code(e.current),
            exponent_code(e.luminous_intensity),
        ];
        nibbles
            .iter()
            .enumerate()
            .fold(0u32, |acc, (idx, nibble)| acc | u32::from(*nibble) << (4 * idx))
    }
}

/// The base-10 exponent applied to a field's value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UnitExponent(i8);

impl UnitExponent {
    pub fn new(exponent: i32) -> Result<UnitExponent> {
        check_exponent("unit", exponent).map(UnitExponent)
    }

    /// Derive the exponent from a decimal multiplier, e.g. `0.001` is `-3`.
    /// The multiplier must be an exact power of ten.
    pub fn from_multiplier(multiplier: f64) -> Result<UnitExponent> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(DescriptorError::InvalidUnit(format!(
                "unit multiplier {multiplier} is not a positive power of ten"
            )));
        }
        let exponent = multiplier.log10().round();
        let expected = 10f64.powi(exponent as i32);
        if (expected - multiplier).abs() > multiplier * 1e-9 {
            return Err(DescriptorError::InvalidUnit(format!(
                "unit multiplier {multiplier} is not a power of ten"
            )));
        }
        UnitExponent::new(exponent as i32)
    }

    pub fn value(&self) -> i8 {
        self.0
    }

    /// The 4-bit wire code of this exponent
    pub fn code(&self) -> u8 {
        exponent_code(self.0)
    }
}
