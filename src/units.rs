// [[file:../psi4.note::*header][header:1]]
//! Unit-tagged values for computed properties
//!
//! Psi4 works in atomic units internally. Values leaving the model carry
//! their unit so callers can convert them explicitly:
//!
//! ```ignore
//! let e = computed.get_energy().unwrap();
//! let e_ev = e.convert_to(Unit::ElectronVolt)?;
//! ```
// header:1 ends here

// [[file:../psi4.note::8a1f0c2e][8a1f0c2e]]
use crate::core::*;

use serde::{Deserialize, Serialize};
use std::fmt;
// 8a1f0c2e ends here

// [[file:../psi4.note::*constants][constants:1]]
/// CODATA 2014, the same set Psi4 uses.
pub const BOHR_TO_ANGSTROM: f64 = 0.52917721067;
pub const HARTREE_TO_EV: f64 = 27.21138602;
/// e·a0 to Debye
pub const AU_TO_DEBYE: f64 = 2.541746451895025;
pub const HARTREE_TO_WAVENUMBER: f64 = 219474.6313702;
// constants:1 ends here

// [[file:../psi4.note::4d07b9e3][4d07b9e3]]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dimension {
    Energy,
    Length,
    Force,
    ForceConstant,
    Dipole,
    Quadrupole,
    Potential,
    Charge,
    Dimensionless,
}

/// Physical units attached to computed properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Hartree,
    ElectronVolt,
    /// cm^-1, used for vibrational frequencies
    Wavenumber,
    Bohr,
    Angstrom,
    HartreePerBohr,
    ElectronVoltPerAngstrom,
    HartreePerBohr2,
    ElectronVoltPerAngstrom2,
    /// e·a0
    AtomicDipole,
    Debye,
    /// e·a0^2
    AtomicQuadrupole,
    DebyeAngstrom,
    /// Electrostatic potential in Hartree per elementary charge
    HartreePerCharge,
    ElementaryCharge,
    Dimensionless,
}

impl Unit {
    fn dimension(&self) -> Dimension {
        use Unit::*;

        match self {
            Hartree | ElectronVolt | Wavenumber => Dimension::Energy,
            Bohr | Angstrom => Dimension::Length,
            HartreePerBohr | ElectronVoltPerAngstrom => Dimension::Force,
            HartreePerBohr2 | ElectronVoltPerAngstrom2 => Dimension::ForceConstant,
            AtomicDipole | Debye => Dimension::Dipole,
            AtomicQuadrupole | DebyeAngstrom => Dimension::Quadrupole,
            HartreePerCharge => Dimension::Potential,
            ElementaryCharge => Dimension::Charge,
            Dimensionless => Dimension::Dimensionless,
        }
    }

    // how many atomic units in one of this unit
    fn atomic_units(&self) -> f64 {
        use Unit::*;

        match self {
            ElectronVolt => 1.0 / HARTREE_TO_EV,
            Wavenumber => 1.0 / HARTREE_TO_WAVENUMBER,
            Angstrom => 1.0 / BOHR_TO_ANGSTROM,
            ElectronVoltPerAngstrom => BOHR_TO_ANGSTROM / HARTREE_TO_EV,
            ElectronVoltPerAngstrom2 => BOHR_TO_ANGSTROM * BOHR_TO_ANGSTROM / HARTREE_TO_EV,
            Debye => 1.0 / AU_TO_DEBYE,
            DebyeAngstrom => 1.0 / (AU_TO_DEBYE * BOHR_TO_ANGSTROM),
            _ => 1.0,
        }
    }

    /// Return the factor converting a value in `self` into `other`, or None
    /// if the two units measure different things.
    pub fn factor_to(&self, other: Unit) -> Option<f64> {
        if self.dimension() == other.dimension() {
            Some(self.atomic_units() / other.atomic_units())
        } else {
            None
        }
    }

    pub fn symbol(&self) -> &'static str {
        use Unit::*;

        match self {
            Hartree => "hartree",
            ElectronVolt => "eV",
            Wavenumber => "cm^-1",
            Bohr => "bohr",
            Angstrom => "Å",
            HartreePerBohr => "hartree/bohr",
            ElectronVoltPerAngstrom => "eV/Å",
            HartreePerBohr2 => "hartree/bohr^2",
            ElectronVoltPerAngstrom2 => "eV/Å^2",
            AtomicDipole => "e·bohr",
            Debye => "debye",
            AtomicQuadrupole => "e·bohr^2",
            DebyeAngstrom => "debye·Å",
            HartreePerCharge => "hartree/e",
            ElementaryCharge => "e",
            Dimensionless => "",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
// 4d07b9e3 ends here

// [[file:../psi4.note::c5e2b719][c5e2b719]]
/// Values that can be rescaled element-wise.
pub trait Scale {
    fn scale(self, factor: f64) -> Self;
}

impl Scale for f64 {
    fn scale(self, factor: f64) -> Self {
        self * factor
    }
}

impl<const N: usize> Scale for [f64; N] {
    fn scale(mut self, factor: f64) -> Self {
        self.iter_mut().for_each(|x| *x *= factor);
        self
    }
}

impl<T: Scale> Scale for Vec<T> {
    fn scale(self, factor: f64) -> Self {
        self.into_iter().map(|x| x.scale(factor)).collect()
    }
}

/// A value tagged with its physical unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity<T> {
    pub value: T,
    pub unit: Unit,
}

impl<T> Quantity<T> {
    pub fn new(value: T, unit: Unit) -> Self {
        Self { value, unit }
    }
}

impl<T: Scale> Quantity<T> {
    /// Convert into `unit`. Fails when `unit` measures a different quantity.
    pub fn convert_to(self, unit: Unit) -> Result<Self> {
        let factor = self
            .unit
            .factor_to(unit)
            .ok_or_else(|| format_err!("cannot convert {:?} into {:?}", self.unit, unit))?;
        Ok(Self {
            value: self.value.scale(factor),
            unit,
        })
    }
}

impl fmt::Display for Quantity<f64> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}
// c5e2b719 ends here

// [[file:../psi4.note::e93b5d40][e93b5d40]]
#[test]
fn test_unit_conversion() -> Result<()> {
    use approx::assert_relative_eq;

    let e = Quantity::new(-1.0, Unit::Hartree).convert_to(Unit::ElectronVolt)?;
    assert_relative_eq!(e.value, -27.21138602, epsilon = 1e-8);

    let e = e.convert_to(Unit::Hartree)?;
    assert_relative_eq!(e.value, -1.0, epsilon = 1e-12);

    let f = Quantity::new(vec![[0.1, 0.0, -0.1]], Unit::HartreePerBohr).convert_to(Unit::ElectronVoltPerAngstrom)?;
    assert_relative_eq!(f.value[0][0], 5.1422067, epsilon = 1e-6);
    assert_eq!(f.value[0][1], 0.0);

    let d = Quantity::new([1.0, 0.0, 0.0], Unit::AtomicDipole).convert_to(Unit::Debye)?;
    assert_relative_eq!(d.value[0], 2.5417464, epsilon = 1e-6);

    // different dimensions
    assert!(Quantity::new(1.0, Unit::Hartree).convert_to(Unit::Angstrom).is_err());

    Ok(())
}
// e93b5d40 ends here
