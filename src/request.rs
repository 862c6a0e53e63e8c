// [[file:../psi4.note::*header][header:1]]
//! Requested properties and how they select a Psi4 computation
// header:1 ends here

// [[file:../psi4.note::2b6c91d4][2b6c91d4]]
use crate::core::*;

use serde::{Deserialize, Serialize};
use std::str::FromStr;
// 2b6c91d4 ends here

// [[file:../psi4.note::7f31a0b8][7f31a0b8]]
/// Property names recognized by the Psi4 model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Request {
    PotentialEnergy,
    Energy,
    Forces,
    ElectronicGradient,
    Hessian,
    Frequencies,
    OptimizedGeometry,
    Dipole,
    Quadrupole,
    EspAtNuclei,
    Mulliken,
    Lowdin,
    WibergLowdinIndices,
    MayerIndices,
    NaturalOrbitalOccupations,
}

impl FromStr for Request {
    type Err = gut::prelude::Error;

    fn from_str(s: &str) -> Result<Self> {
        use Request::*;

        let r = match s {
            "potential_energy" => PotentialEnergy,
            "energy" => Energy,
            "forces" => Forces,
            "electronic_gradient" => ElectronicGradient,
            "hessian" => Hessian,
            "vibrational_frequencies" | "freq" | "frequency" | "frequencies" => Frequencies,
            "optimized_geometry" | "opt" | "optimize" => OptimizedGeometry,
            "dipole" => Dipole,
            "quadrupole" => Quadrupole,
            "electrostatic_potential_at_nuclei" => EspAtNuclei,
            "mulliken" => Mulliken,
            "lowdin" => Lowdin,
            "wiberg_lowdin_indices" => WibergLowdinIndices,
            "mayer_indices" => MayerIndices,
            "natural_orbital_occupations" => NaturalOrbitalOccupations,
            _ => bail!("unknown property request: {}", s),
        };
        Ok(r)
    }
}

impl Request {
    /// Parse property names, dropping the ones outside the vocabulary.
    pub fn parse_all<S: AsRef<str>>(names: &[S]) -> Vec<Request> {
        names
            .iter()
            .filter_map(|name| {
                let name = name.as_ref();
                match name.parse() {
                    Ok(r) => Some(r),
                    Err(_) => {
                        debug!("ignored property request: {:?}", name);
                        None
                    }
                }
            })
            .collect()
    }

    /// The computation this request asks for, if any.
    fn run_kind(&self) -> Option<RunKind> {
        use Request::*;

        match self {
            Frequencies => RunKind::Frequency.into(),
            OptimizedGeometry => RunKind::Optimize.into(),
            PotentialEnergy | Energy => RunKind::Energy.into(),
            Forces | ElectronicGradient => RunKind::Gradient.into(),
            Hessian => RunKind::Hessian.into(),
            _ => None,
        }
    }

    /// The Psi4 one-electron property this request reads, if any.
    pub fn oeprop(&self) -> Option<&'static str> {
        use Request::*;

        let p = match self {
            Dipole => "DIPOLE",
            Quadrupole => "QUADRUPOLE",
            EspAtNuclei => "ESP_AT_NUCLEI",
            Mulliken => "MULLIKEN_CHARGES",
            Lowdin => "LOWDIN_CHARGES",
            WibergLowdinIndices => "WIBERG_LOWDIN_INDICES",
            MayerIndices => "MAYER_INDICES",
            NaturalOrbitalOccupations => "NO_OCCUPATIONS",
            _ => return None,
        };
        Some(p)
    }

    /// Property name used in computed results.
    pub fn name(&self) -> &'static str {
        use Request::*;

        match self {
            PotentialEnergy => "potential_energy",
            Energy => "energy",
            Forces => "forces",
            ElectronicGradient => "electronic_gradient",
            Hessian => "hessian",
            Frequencies => "vibrational_frequencies",
            OptimizedGeometry => "optimized_geometry",
            Dipole => "dipole",
            Quadrupole => "quadrupole",
            EspAtNuclei => "electrostatic_potential_at_nuclei",
            Mulliken => "mulliken",
            Lowdin => "lowdin",
            WibergLowdinIndices => "wiberg_lowdin_indices",
            MayerIndices => "mayer_indices",
            NaturalOrbitalOccupations => "natural_orbital_occupations",
        }
    }
}
// 7f31a0b8 ends here

// [[file:../psi4.note::a04e5c17][a04e5c17]]
/// The Psi4 driver function a job calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
    Energy,
    Gradient,
    Hessian,
    Frequency,
    Optimize,
}

impl Default for RunKind {
    fn default() -> Self {
        RunKind::Energy
    }
}

impl RunKind {
    /// Select one computation for `requests`: the first request naming a
    /// computation wins. `potential_energy` never decides, and energy is the
    /// fallback.
    pub fn select(requests: &[Request]) -> Self {
        requests
            .iter()
            .filter(|r| **r != Request::PotentialEnergy)
            .find_map(|r| r.run_kind())
            .unwrap_or_else(|| {
                debug!("no computation requested, defaults to energy");
                RunKind::Energy
            })
    }

    /// Return true if the engine reports per-step history for this kind.
    pub fn has_history(&self) -> bool {
        *self == RunKind::Optimize
    }
}
// a04e5c17 ends here

// [[file:../psi4.note::59c0ad6e][59c0ad6e]]
#[test]
fn test_run_kind_select() {
    let select = |names: &[&str]| RunKind::select(&Request::parse_all(names));

    assert_eq!(select(&["potential_energy"]), RunKind::Energy);
    assert_eq!(select(&[]), RunKind::Energy);
    assert_eq!(select(&["potential_energy", "forces"]), RunKind::Gradient);
    assert_eq!(select(&["freq"]), RunKind::Frequency);
    assert_eq!(select(&["frequencies", "forces"]), RunKind::Frequency);
    assert_eq!(select(&["dipole", "mulliken", "hessian"]), RunKind::Hessian);
    assert_eq!(select(&["no such thing", "optimize"]), RunKind::Optimize);
    assert_eq!(select(&["electronic_gradient"]), RunKind::Gradient);
    assert_eq!(select(&["energy", "hessian"]), RunKind::Energy);
}

#[test]
fn test_request_parse() {
    let requests = Request::parse_all(&["dipole", "bogus", "vibrational_frequencies"]);
    assert_eq!(requests, vec![Request::Dipole, Request::Frequencies]);
    assert_eq!(Request::Dipole.oeprop(), Some("DIPOLE"));
    assert_eq!(Request::Forces.oeprop(), None);
    assert_eq!(Request::Mulliken.name(), "mulliken");
}
// 59c0ad6e ends here
