// [[file:../psi4.note::b456354a][b456354a]]
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use super::*;
use crate::engine::EngineOutput;
use crate::units::{Quantity, Unit};

use gchemol::prelude::*;
use gchemol::Molecule;
use serde::{Deserialize, Serialize};
// b456354a ends here

// [[file:../psi4.note::7de724a0][7de724a0]]
const MODEL_PROPERTIES_FORMAT_VERSION: &str = "0.1";

/// The computed model properties by Psi4
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Computed {
    potential_energy: Option<Quantity<f64>>,
    forces: Option<Quantity<Vec<[f64; 3]>>>,
    hessian: Option<Quantity<Vec<Vec<f64>>>>,
    nuclear_repulsion: Option<Quantity<f64>>,
    dipole_moment: Option<Quantity<f64>>,
    dipole: Option<Quantity<[f64; 3]>>,
    /// XX, XY, XZ, YY, YZ, ZZ
    quadrupole: Option<Quantity<[f64; 6]>>,
    electrostatic_potential_at_nuclei: Option<Quantity<Vec<f64>>>,
    mulliken: Option<Quantity<Vec<f64>>>,
    lowdin: Option<Quantity<Vec<f64>>>,
    wiberg_lowdin_indices: Option<Vec<Vec<f64>>>,
    mayer_indices: Option<Vec<Vec<f64>>>,
    natural_orbital_occupations: Option<Vec<f64>>,
    /// in ascending order, imaginary ones negative
    vibrational_frequencies: Option<Quantity<Vec<f64>>>,
    normal_modes: Option<Quantity<Vec<Vec<[f64; 3]>>>>,
    /// Psi4 scalar variables
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    variables: BTreeMap<String, f64>,

    // electronic state reported by Psi4
    charge: Option<isize>,
    multiplicity: Option<usize>,

    #[serde(skip_deserializing, skip_serializing)]
    molecule: Option<Molecule>,
    #[serde(skip_deserializing, skip_serializing)]
    psi4_output: Option<EngineOutput>,
}
// 7de724a0 ends here

// [[file:../psi4.note::3b493716][3b493716]]
#[derive(Debug, Clone)]
struct Header {
    name: String,
    unit_factor: f64,
}

impl FromStr for Header {
    type Err = gut::prelude::Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(s) = s.strip_prefix('@') {
            let mut unit_factor = 1.0;
            let parts: Vec<_> = s.split_whitespace().collect();
            if parts.is_empty() {
                bail!("empty model properties section header");
            }
            let name = parts[0].into();
            for p in &parts[1..] {
                if let Some((k, v)) = p.split_once('=') {
                    if k == "unit_factor" {
                        unit_factor = v.parse::<f64>()?;
                    }
                }
            }
            Ok(Self { name, unit_factor })
        } else {
            bail!("invalid model properties section header: {}", s);
        }
    }
}

#[test]
fn test_header() {
    let s = "@forces ";
    let h: Header = s.parse().unwrap();
    assert_eq!(h.name, "forces");
    assert_eq!(h.unit_factor, 1.0);

    let s = "@forces unit_factor=1";
    let h: Header = s.parse().unwrap();
    assert_eq!(h.unit_factor, 1.0);

    let s = "@forces unit_factor=-1 test=2";
    let h: Header = s.parse().unwrap();
    assert_eq!(h.unit_factor, -1.0);

    assert!("forces".parse::<Header>().is_err());
}
// 3b493716 ends here

// [[file:../psi4.note::37f15603][37f15603]]
impl Computed {
    /// Parse mulitple entries of Computed from string slice
    pub fn parse_all(output: &str) -> Result<Vec<Computed>> {
        parse_model_results(output)
    }

    /// Return true if there is no useful properties
    pub fn is_empty(&self) -> bool {
        self.potential_energy.is_none() && self.forces.is_none()
    }
}

impl fmt::Display for Computed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut txt = format!("@model_properties_format_version {}\n", MODEL_PROPERTIES_FORMAT_VERSION);

        // structure
        if let Some(mol) = &self.molecule {
            match mol.format_as("text/pxyz") {
                Ok(coords) => {
                    txt.push_str("@structure\n");
                    txt.push_str(&coords);
                }
                Err(e) => warn!("structure not formatted: {:?}", e),
            }
        }
        // energy in Hartree
        if let Some(energy) = &self.potential_energy {
            txt.push_str("@energy\n");
            txt.push_str(&format!("{:-20.12E}\n", energy.value));
        }
        // forces in Hartree/Bohr
        if let Some(forces) = &self.forces {
            txt.push_str("@forces\n");
            for [fx, fy, fz] in &forces.value {
                let line = format!("{:-20.12E} {:-20.12E} {:-20.12E}\n", fx, fy, fz);
                txt.push_str(&line);
            }
        }
        // dipole moments in Debye
        if let Some(d) = &self.dipole {
            let d = d.value;
            txt.push_str("@dipole\n");
            let line = format!("{:-20.12E} {:-20.12E} {:-20.12E}\n", d[0], d[1], d[2]);
            txt.push_str(&line);
        }

        write!(f, "{}", txt)
    }
}

impl FromStr for Computed {
    type Err = gut::prelude::Error;

    fn from_str(s: &str) -> Result<Self> {
        let all = parse_model_results(s)?;

        let n = all.len();
        if n == 0 {
            bail!("no valid results found from:\n {s:?}!");
        }

        Ok(all[n - 1].clone())
    }
}

fn parse_xyz(line: &str, unit_factor: f64) -> Result<[f64; 3]> {
    let parts: Vec<_> = line.split_whitespace().collect();
    if parts.len() != 3 {
        bail!("expect xyz values: {}", line);
    }
    let x = parts[0].parse::<f64>()? * unit_factor;
    let y = parts[1].parse::<f64>()? * unit_factor;
    let z = parts[2].parse::<f64>()? * unit_factor;
    Ok([x, y, z])
}

// parse a single entry of Computed
fn parse_model_results_single(part: &[&str]) -> Result<Computed> {
    // collect records as header separated lines
    // blank lines are ignored
    let mut records: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut header = None;
    for line in part {
        let line = line.trim();
        if line.starts_with('@') {
            header = Some(line);
        } else if let Some(k) = header {
            records.entry(k).or_insert_with(Vec::new).push(line);
        }
    }

    if records.is_empty() {
        warn!("Collected no results. Please check if the stream is clean!");
        warn!("suspicious part: {:?}", part);
    }

    let mut results = Computed::default();
    for (k, lines) in records {
        let header: Header = k.parse()?;
        let unit_factor = header.unit_factor;
        match header.name.as_str() {
            "energy" => {
                if lines.len() != 1 {
                    bail!("expect one line containing energy: {:?}", lines);
                }
                let energy = lines[0].trim().parse::<f64>()? * unit_factor;
                results.set_energy(energy);
            }
            "forces" => {
                let forces = lines.iter().map(|line| parse_xyz(line, unit_factor)).collect::<Result<Vec<_>>>()?;
                results.set_forces(forces);
            }
            "structure" => {
                let mut s = lines.join("\n");
                s.push_str("\n\n");
                let mol = Molecule::from_str(&s, "text/pxyz")?;
                results.molecule = Some(mol);
            }
            "dipole" => {
                if lines.len() != 1 {
                    bail!("expect one line containing dipole moment: {:?}", lines);
                }
                let d = parse_xyz(lines[0], unit_factor)?;
                results.set_dipole(d);
            }
            _ => {
                warn!("ignored record: {:?}", k);
            }
        }
    }

    Ok(results)
}

fn parse_model_results(stream: &str) -> Result<Vec<Computed>> {
    if stream.trim().is_empty() {
        bail!("Attemp to parse empty string!");
    }

    // ignore commenting lines or blank lines
    let lines: Vec<_> = stream
        .lines()
        .filter(|l| {
            let l = l.trim();
            !l.starts_with('#') && !l.is_empty()
        })
        .collect();

    let parts = lines.split(|l| l.starts_with("@model_properties_format_version"));

    let mut all_results = vec![];
    for part in parts {
        // ignore empty part
        if part.is_empty() {
            continue;
        } else {
            let mp = parse_model_results_single(part)?;
            all_results.push(mp);
        }
    }

    Ok(all_results)
}
// 37f15603 ends here

// [[file:../psi4.note::5d2e7a61][5d2e7a61]]
impl Computed {
    /// Set potential energy in Hartree.
    pub fn set_energy(&mut self, e: f64) {
        self.potential_energy = Quantity::new(e, Unit::Hartree).into();
    }

    /// Set forces in Hartree/Bohr.
    pub fn set_forces(&mut self, f: Vec<[f64; 3]>) {
        self.forces = Quantity::new(f, Unit::HartreePerBohr).into();
    }

    /// Set dipole moment vector in Debye.
    pub fn set_dipole(&mut self, d: [f64; 3]) {
        self.dipole = Quantity::new(d, Unit::Debye).into();
    }

    /// Set item Molecule.
    pub fn set_molecule(&mut self, m: Molecule) {
        self.molecule = Some(m);
    }

    /// Set Hessian matrix in Hartree/Bohr^2.
    pub fn set_hessian(&mut self, h: Vec<Vec<f64>>) {
        self.hessian = Quantity::new(h, Unit::HartreePerBohr2).into();
    }

    pub(crate) fn set_nuclear_repulsion(&mut self, e: f64) {
        self.nuclear_repulsion = Quantity::new(e, Unit::Hartree).into();
    }

    pub(crate) fn set_dipole_moment(&mut self, d: f64) {
        self.dipole_moment = Quantity::new(d, Unit::Debye).into();
    }

    pub(crate) fn set_quadrupole(&mut self, q: [f64; 6]) {
        self.quadrupole = Quantity::new(q, Unit::DebyeAngstrom).into();
    }

    pub(crate) fn set_esp_at_nuclei(&mut self, esp: Vec<f64>) {
        self.electrostatic_potential_at_nuclei = Quantity::new(esp, Unit::HartreePerCharge).into();
    }

    pub(crate) fn set_mulliken_charges(&mut self, q: Vec<f64>) {
        self.mulliken = Quantity::new(q, Unit::ElementaryCharge).into();
    }

    pub(crate) fn set_lowdin_charges(&mut self, q: Vec<f64>) {
        self.lowdin = Quantity::new(q, Unit::ElementaryCharge).into();
    }

    pub(crate) fn set_wiberg_lowdin_indices(&mut self, w: Vec<Vec<f64>>) {
        self.wiberg_lowdin_indices = w.into();
    }

    pub(crate) fn set_mayer_indices(&mut self, m: Vec<Vec<f64>>) {
        self.mayer_indices = m.into();
    }

    pub(crate) fn set_natural_orbital_occupations(&mut self, occ: Vec<f64>) {
        self.natural_orbital_occupations = occ.into();
    }

    /// Set harmonic frequencies in cm^-1. Imaginary frequencies are given as
    /// negative values.
    pub(crate) fn set_vibrational_frequencies(&mut self, freqs: Vec<f64>) {
        self.vibrational_frequencies = Quantity::new(freqs, Unit::Wavenumber).into();
    }

    /// Set Cartesian displacements of normal modes in Å, one per frequency.
    pub(crate) fn set_normal_modes(&mut self, modes: Vec<Vec<[f64; 3]>>) {
        self.normal_modes = Quantity::new(modes, Unit::Angstrom).into();
    }

    pub(crate) fn set_variables(&mut self, vars: BTreeMap<String, f64>) {
        self.variables = vars;
    }

    pub(crate) fn set_electronic_state(&mut self, charge: isize, multiplicity: usize) {
        self.charge = charge.into();
        self.multiplicity = multiplicity.into();
    }

    pub(crate) fn set_psi4_output(&mut self, out: EngineOutput) {
        self.psi4_output = out.into();
    }
}

impl Computed {
    /// Get potential energy.
    pub fn get_energy(&self) -> Option<&Quantity<f64>> {
        self.potential_energy.as_ref()
    }

    /// Get forces component.
    pub fn get_forces(&self) -> Option<&Quantity<Vec<[f64; 3]>>> {
        self.forces.as_ref()
    }

    /// Get dipole moment vector.
    pub fn get_dipole(&self) -> Option<&Quantity<[f64; 3]>> {
        self.dipole.as_ref()
    }

    /// Get dipole moment magnitude.
    pub fn get_dipole_moment(&self) -> Option<&Quantity<f64>> {
        self.dipole_moment.as_ref()
    }

    /// Get molecule structure.
    pub fn get_molecule(&self) -> Option<&Molecule> {
        self.molecule.as_ref()
    }

    pub fn get_hessian(&self) -> Option<&Quantity<Vec<Vec<f64>>>> {
        self.hessian.as_ref()
    }

    pub fn get_nuclear_repulsion(&self) -> Option<&Quantity<f64>> {
        self.nuclear_repulsion.as_ref()
    }

    /// Quadrupole components XX, XY, XZ, YY, YZ, ZZ.
    pub fn get_quadrupole(&self) -> Option<&Quantity<[f64; 6]>> {
        self.quadrupole.as_ref()
    }

    /// Electrostatic potential at each nucleus, in atom order.
    pub fn get_esp_at_nuclei(&self) -> Option<&Quantity<Vec<f64>>> {
        self.electrostatic_potential_at_nuclei.as_ref()
    }

    /// Mulliken charges in atom order.
    pub fn get_mulliken_charges(&self) -> Option<&Quantity<Vec<f64>>> {
        self.mulliken.as_ref()
    }

    /// Löwdin charges in atom order.
    pub fn get_lowdin_charges(&self) -> Option<&Quantity<Vec<f64>>> {
        self.lowdin.as_ref()
    }

    pub fn get_wiberg_lowdin_indices(&self) -> Option<&Vec<Vec<f64>>> {
        self.wiberg_lowdin_indices.as_ref()
    }

    pub fn get_mayer_indices(&self) -> Option<&Vec<Vec<f64>>> {
        self.mayer_indices.as_ref()
    }

    pub fn get_natural_orbital_occupations(&self) -> Option<&Vec<f64>> {
        self.natural_orbital_occupations.as_ref()
    }

    /// Harmonic frequencies of vibrational modes.
    pub fn get_vibrational_frequencies(&self) -> Option<&Quantity<Vec<f64>>> {
        self.vibrational_frequencies.as_ref()
    }

    /// Cartesian displacements of each vibrational mode.
    pub fn get_normal_modes(&self) -> Option<&Quantity<Vec<Vec<[f64; 3]>>>> {
        self.normal_modes.as_ref()
    }

    /// Psi4 scalar variables, such as "CURRENT ENERGY".
    pub fn get_variables(&self) -> &BTreeMap<String, f64> {
        &self.variables
    }

    /// Molecular charge reported by Psi4.
    pub fn get_charge(&self) -> Option<isize> {
        self.charge
    }

    /// Spin multiplicity reported by Psi4.
    pub fn get_multiplicity(&self) -> Option<usize> {
        self.multiplicity
    }

    /// The raw results read back from Psi4.
    pub fn get_psi4_output(&self) -> Option<&EngineOutput> {
        self.psi4_output.as_ref()
    }

    /// Names of available properties.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = vec![];
        let mut add = |name, present: bool| {
            if present {
                names.push(name);
            }
        };
        add("potential_energy", self.potential_energy.is_some());
        add("forces", self.forces.is_some());
        add("hessian", self.hessian.is_some());
        add("nuclear_repulsion", self.nuclear_repulsion.is_some());
        add("dipole_moment", self.dipole_moment.is_some());
        add("dipole", self.dipole.is_some());
        add("quadrupole", self.quadrupole.is_some());
        add(
            "electrostatic_potential_at_nuclei",
            self.electrostatic_potential_at_nuclei.is_some(),
        );
        add("mulliken", self.mulliken.is_some());
        add("lowdin", self.lowdin.is_some());
        add("wiberg_lowdin_indices", self.wiberg_lowdin_indices.is_some());
        add("mayer_indices", self.mayer_indices.is_some());
        add("natural_orbital_occupations", self.natural_orbital_occupations.is_some());
        add("vibrational_frequencies", self.vibrational_frequencies.is_some());
        add("normal_modes", self.normal_modes.is_some());
        add("psi4_variables", !self.variables.is_empty());
        add("optimized_geometry", self.molecule.is_some());
        add("psi4_output", self.psi4_output.is_some());
        names
    }
}
// 5d2e7a61 ends here

// [[file:../psi4.note::6d51755f][6d51755f]]
#[test]
fn test_model_parse_results() -> Result<()> {
    use approx::*;

    let txt = gut::fs::read_file("tests/files/water.txt")?;
    let r: Computed = txt.parse()?;

    // serializing
    let serialized = serde_json::to_string(&r)?;
    // and deserializing
    let _: Computed = serde_json::from_str(&serialized)?;

    // reformat
    let txt = format!("{}", r);

    // parse again
    let r: Computed = txt.parse()?;

    let mol = r.get_molecule().expect("structure");
    assert_eq!(3, mol.natoms());
    let e = r.get_energy().expect("model result: energy");
    assert_eq!(e.unit, Unit::Hartree);
    assert_relative_eq!(-74.962985, e.value, epsilon = 1e-6);

    let f = r.get_forces().expect("model result: forces");
    assert_eq!(f.value.len(), 3);
    assert_relative_eq!(f.value[1][1], -0.0123, epsilon = 1e-8);

    Ok(())
}

#[test]
fn test_model_parse_results_unit_factor() -> Result<()> {
    let txt = "@model_properties_format_version 0.1
@energy unit_factor=2.0
-1.5
@forces unit_factor=-1
0.1 0.0 0.0
@model_properties_format_version 0.1
@energy
-2.0
";
    let all = Computed::parse_all(txt)?;
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].get_energy().unwrap().value, -3.0);
    assert_eq!(all[0].get_forces().unwrap().value[0][0], -0.1);
    assert!(all[1].get_forces().is_none());

    let last: Computed = txt.parse()?;
    assert_eq!(last.get_energy().unwrap().value, -2.0);
    assert!(!last.is_empty());
    assert!(Computed::default().is_empty());

    Ok(())
}

#[test]
fn test_computed_names() {
    let mut r = Computed::default();
    r.set_energy(-1.0);
    r.set_psi4_output(EngineOutput::default());
    assert_eq!(r.names(), vec!["potential_energy", "psi4_output"]);

    r.set_mulliken_charges(vec![0.1, -0.1]);
    r.set_electronic_state(0, 1);
    assert_eq!(r.names(), vec!["potential_energy", "mulliken", "psi4_output"]);
    assert_eq!(r.get_charge(), Some(0));
}
// 6d51755f ends here
