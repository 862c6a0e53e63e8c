// [[file:../psi4.note::*header][header:1]]
//! Psi4 as a chemical model
//!
//! # Usage
//!
//! ```ignore
//! use gosh_psi4::*;
//!
//! // initialize from model directory having a .env file
//! let mut psi4 = Psi4::from_dir("/share/apps/psi4/hf-sto3g")?;
//!
//! // energy, forces, and Mulliken charges
//! let mp = psi4.calculate(&mol, &["forces", "mulliken"])?;
//!
//! // geometry optimization
//! let traj = psi4.minimize(&mol, &["optimize"])?;
//! ```
// header:1 ends here

// [[file:../psi4.note::c3765387][c3765387]]
use std::path::Path;

use super::*;
use crate::engine::{Engine, EngineOutput, Job, Psi4Process, Session};
use crate::geometry::{molecule_name, render_psi4_molecule};
use crate::params::{Psi4Params, Setup};
use crate::request::{Request, RunKind};
use crate::trajectory::Trajectory;
use crate::units::AU_TO_DEBYE;
use crate::units::BOHR_TO_ANGSTROM;
use crate::units::{Quantity, Unit};

use gchemol::Molecule;
use serde_json::Value;
use vecfx::*;
// c3765387 ends here

// [[file:../psi4.note::*base][base:1]]
pub struct Psi4Model<E: Engine> {
    params: Psi4Params,

    /// parameters in Psi4 vocabulary
    setup: Setup,

    engine: E,

    /// Record the number of potential evalulations.
    ncalls: usize,
}

impl<E: Engine> Psi4Model<E> {
    /// Construct Psi4 model calling `engine`. Parameters are resolved here
    /// once for all calculations.
    pub fn new(params: Psi4Params, engine: E) -> Result<Self> {
        let setup = Setup::resolve(&params)?;
        debug!("psi4 setup: {:?}", setup);
        Ok(Self {
            params,
            setup,
            engine,
            ncalls: 0,
        })
    }

    /// The parameters in Psi4 vocabulary.
    pub fn setup(&self) -> &Setup {
        &self.setup
    }

    /// The engine running Psi4 calculations.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Return the number of potentail evaluations
    pub fn number_of_evaluations(&self) -> usize {
        self.ncalls
    }
}

impl Psi4Model<Psi4Process> {
    /// Construct Psi4 model from `.env` file in model directory.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let params = Psi4Params::from_dir(dir).context("Initialize Psi4 model failure.")?;
        let engine = Psi4Process::from_dir(dir)?;
        Self::new(params, engine)
    }
}
// base:1 ends here

// [[file:../psi4.note::2e8f6b1c][2e8f6b1c]]
impl<E: Engine> Psi4Model<E> {
    /// Return true if detailed properties can be extracted.
    fn has_basis(&self) -> bool {
        self.setup.basis.is_some()
    }

    /// Build the Psi4 job computing `requests` for `mol`.
    pub fn prepare_job(&self, mol: &Molecule, requests: &[Request], kind: RunKind) -> Result<Job> {
        let setup = &self.setup;

        let molecule = render_psi4_molecule(
            mol,
            self.params.dimer_partner.as_ref(),
            setup.charge,
            setup.multiplicity,
        )?;

        let mut options = setup.options.clone();
        if kind == RunKind::Frequency {
            options.insert("molden_write".into(), Value::Bool(true));
            options.insert("normal_modes_write".into(), Value::Bool(true));
        }

        // Psi4 fills in the other one when only one of them is set
        let (charge, multiplicity) = match (setup.charge, setup.multiplicity) {
            (Some(_), Some(_)) => (None, None),
            state => state,
        };

        // dipole is always needed for dipole moment
        let mut oeprops = vec![];
        if self.has_basis() {
            oeprops.push("DIPOLE".to_string());
            for p in requests.iter().filter_map(|r| r.oeprop()) {
                if !oeprops.iter().any(|x| x == p) {
                    oeprops.push(p.to_string());
                }
            }
        }

        let job = Job {
            name: molecule_name(mol),
            kind,
            method: setup.method.clone(),
            molecule,
            basis_block: setup.basis_block.clone(),
            options,
            memory: setup.memory.clone(),
            output: setup.output.clone(),
            dertype: setup.dertype_for(kind),
            charge,
            multiplicity,
            return_history: kind.has_history(),
            oeprops,
        };

        Ok(job)
    }

    // run one job in a fresh engine session
    fn run_job(&mut self, job: &Job) -> Result<EngineOutput> {
        let out = {
            let mut session = Session::open(&mut self.engine);
            session.run(job)?
        };
        self.ncalls += 1;
        Ok(out)
    }
}
// 2e8f6b1c ends here

// [[file:../psi4.note::a7d9e2c4][a7d9e2c4]]
/// Read one-electron properties from Psi4 results, attaching units.
mod oeprops {
    use super::*;

    fn missing(name: &str) -> gut::prelude::Error {
        format_err!("psi4 reported no {}", name)
    }

    fn check_natoms<T>(values: &[T], natoms: usize, name: &str) -> Result<()> {
        if values.len() != natoms {
            bail!("psi4 reported {} {} for {} atoms", values.len(), name, natoms);
        }
        Ok(())
    }

    /// Dipole vector in Debye.
    pub fn dipole(out: &EngineOutput) -> Result<[f64; 3]> {
        let [x, y, z] = out.dipole.ok_or_else(|| missing("dipole"))?;
        Ok([x * AU_TO_DEBYE, y * AU_TO_DEBYE, z * AU_TO_DEBYE])
    }

    /// Quadrupole XX, XY, XZ, YY, YZ, ZZ in Debye·Å.
    pub fn quadrupole(out: &EngineOutput) -> Result<[f64; 6]> {
        let q = out.quadrupole.ok_or_else(|| missing("quadrupole"))?;
        let f = AU_TO_DEBYE * BOHR_TO_ANGSTROM;
        Ok([q[0][0] * f, q[0][1] * f, q[0][2] * f, q[1][1] * f, q[1][2] * f, q[2][2] * f])
    }

    /// Electrostatic potential at nuclei in Hartree/e.
    pub fn esp_at_nuclei(out: &EngineOutput, natoms: usize) -> Result<Vec<f64>> {
        let esp = out.esp_at_nuclei.clone().ok_or_else(|| missing("ESP at nuclei"))?;
        check_natoms(&esp, natoms, "ESP values")?;
        Ok(esp)
    }

    pub fn mulliken_charges(out: &EngineOutput, natoms: usize) -> Result<Vec<f64>> {
        let q = out.mulliken_charges.clone().ok_or_else(|| missing("Mulliken charges"))?;
        check_natoms(&q, natoms, "Mulliken charges")?;
        Ok(q)
    }

    pub fn lowdin_charges(out: &EngineOutput, natoms: usize) -> Result<Vec<f64>> {
        let q = out.lowdin_charges.clone().ok_or_else(|| missing("Lowdin charges"))?;
        check_natoms(&q, natoms, "Lowdin charges")?;
        Ok(q)
    }

    fn bond_indices(m: Option<&Vec<Vec<f64>>>, natoms: usize, name: &str) -> Result<Vec<Vec<f64>>> {
        let m = m.ok_or_else(|| missing(name))?;
        check_natoms(m, natoms, name)?;
        for row in m {
            check_natoms(row, natoms, name)?;
        }
        Ok(m.clone())
    }

    pub fn wiberg_lowdin_indices(out: &EngineOutput, natoms: usize) -> Result<Vec<Vec<f64>>> {
        bond_indices(out.wiberg_lowdin_indices.as_ref(), natoms, "Wiberg-Lowdin indices")
    }

    pub fn mayer_indices(out: &EngineOutput, natoms: usize) -> Result<Vec<Vec<f64>>> {
        bond_indices(out.mayer_indices.as_ref(), natoms, "Mayer indices")
    }

    pub fn no_occupations(out: &EngineOutput) -> Result<Vec<f64>> {
        out.no_occupations.clone().ok_or_else(|| missing("natural orbital occupations"))
    }
}

impl<E: Engine> Psi4Model<E> {
    // read requested one-electron properties into `mp`
    fn collect_oeprops(&self, requests: &[Request], out: &EngineOutput, natoms: usize, mp: &mut Computed) -> Result<()> {
        for r in requests {
            match r {
                Request::Dipole => mp.set_dipole(oeprops::dipole(out)?),
                Request::Quadrupole => mp.set_quadrupole(oeprops::quadrupole(out)?),
                Request::EspAtNuclei => mp.set_esp_at_nuclei(oeprops::esp_at_nuclei(out, natoms)?),
                Request::Mulliken => mp.set_mulliken_charges(oeprops::mulliken_charges(out, natoms)?),
                Request::Lowdin => mp.set_lowdin_charges(oeprops::lowdin_charges(out, natoms)?),
                Request::WibergLowdinIndices => mp.set_wiberg_lowdin_indices(oeprops::wiberg_lowdin_indices(out, natoms)?),
                Request::MayerIndices => mp.set_mayer_indices(oeprops::mayer_indices(out, natoms)?),
                Request::NaturalOrbitalOccupations => mp.set_natural_orbital_occupations(oeprops::no_occupations(out)?),
                _ => {}
            }
        }
        Ok(())
    }

    /// Collect properties from Psi4 results.
    fn get_properties(&self, mol: &Molecule, requests: &[Request], kind: RunKind, out: EngineOutput) -> Result<Computed> {
        let natoms = self.total_atoms(mol);
        let mut mp = Computed::default();
        mp.set_electronic_state(out.charge, out.multiplicity);
        mp.set_energy(out.energy);
        mp.set_nuclear_repulsion(out.nuclear_repulsion_energy);
        let [x, y, z] = oeprops::dipole(&out)?;
        mp.set_dipole_moment((x * x + y * y + z * z).sqrt());
        mp.set_variables(out.variables.clone());
        self.collect_oeprops(requests, &out, natoms, &mut mp)?;

        match kind {
            RunKind::Frequency => {
                let modes = out.normal_modes.clone().ok_or_else(|| format_err!("psi4 reported no normal modes"))?;
                let modes = Quantity::new(modes, Unit::Bohr).convert_to(Unit::Angstrom)?;
                mp.set_normal_modes(modes.value);
                if let Some(freqs) = out.frequencies.clone() {
                    mp.set_vibrational_frequencies(freqs);
                }
            }
            RunKind::Gradient => {
                let gradient = out.gradient.as_ref().ok_or_else(|| format_err!("psi4 reported no gradient"))?;
                if gradient.len() != natoms {
                    bail!("psi4 gradient has {} atoms, expect {}", gradient.len(), natoms);
                }
                let forces: Vec<_> = gradient.iter().map(|[x, y, z]| [-x, -y, -z]).collect();
                debug!("force norm: {:.6}", forces.as_flat().as_vector_slice().norm());
                mp.set_forces(forces);
            }
            RunKind::Hessian => {
                let hessian = out.hessian.clone().ok_or_else(|| format_err!("psi4 reported no hessian"))?;
                mp.set_hessian(hessian);
            }
            RunKind::Optimize => {
                if let Some(coords) = &out.geometry {
                    mp.set_molecule(self.molecule_at(mol, coords, None)?);
                }
            }
            RunKind::Energy => {}
        }

        mp.set_psi4_output(out);
        Ok(mp)
    }

    /// Energy and raw results only, used when no basis set applies.
    fn advanced_user_props(&self, out: EngineOutput) -> Computed {
        warn!("Returning potential_energy and psi4_output only. Please employ Psi4 directly for advanced features.");
        let mut mp = Computed::default();
        mp.set_energy(out.energy);
        mp.set_electronic_state(out.charge, out.multiplicity);
        mp.set_psi4_output(out);
        mp
    }

    fn total_atoms(&self, mol: &Molecule) -> usize {
        mol.natoms() + self.params.dimer_partner.as_ref().map_or(0, |m| m.natoms())
    }

    /// A copy of `mol` at `coords` in Bohr. Dimer partner atoms are ignored.
    pub(crate) fn molecule_at(&self, mol: &Molecule, coords: &[[f64; 3]], title: Option<&str>) -> Result<Molecule> {
        if coords.len() < mol.natoms() {
            bail!("psi4 geometry has {} atoms, expect {}", coords.len(), mol.natoms());
        }
        let positions: Vec<[f64; 3]> = coords
            .iter()
            .take(mol.natoms())
            .map(|[x, y, z]| [x * BOHR_TO_ANGSTROM, y * BOHR_TO_ANGSTROM, z * BOHR_TO_ANGSTROM])
            .collect();
        let mut step = mol.clone();
        step.set_positions(positions);
        if let Some(title) = title {
            step.set_title(title);
        }
        Ok(step)
    }
}
// a7d9e2c4 ends here

// [[file:../psi4.note::5ff4e3f1][5ff4e3f1]]
impl<E: Engine> Psi4Model<E> {
    /// Compute `requests` for `mol`. Unknown property names are ignored.
    pub fn calculate<S: AsRef<str>>(&mut self, mol: &Molecule, requests: &[S]) -> Result<Computed> {
        let requests = Request::parse_all(requests);
        let kind = RunKind::select(&requests);
        self.calculate_as(mol, &requests, kind)
    }

    fn calculate_as(&mut self, mol: &Molecule, requests: &[Request], kind: RunKind) -> Result<Computed> {
        let job = self.prepare_job(mol, requests, kind)?;
        let out = self.run_job(&job)?;
        info!("psi4 {:?} done: energy = {:-18.10} hartree", kind, out.energy);

        if self.has_basis() {
            self.get_properties(mol, requests, kind, out)
        } else {
            Ok(self.advanced_user_props(out))
        }
    }

    /// Optimize geometry of `mol`, returning every optimization step.
    pub fn minimize<S: AsRef<str>>(&mut self, mol: &Molecule, requests: &[S]) -> Result<Trajectory> {
        let requests = Request::parse_all(requests);
        let mp = self.calculate_as(mol, &requests, RunKind::Optimize)?;

        let out = mp.get_psi4_output().ok_or_else(|| format_err!("no psi4 results"))?;
        let history = out.history.as_ref().ok_or_else(|| format_err!("psi4 reported no optimization history"))?;
        let name = molecule_name(mol);
        let traj = Trajectory::from_history(&name, history, out.nuclear_repulsion_energy, |coords, title| {
            self.molecule_at(mol, coords, Some(title))
        })?;
        info!("psi4 optimization finished in {} steps.", traj.len());

        Ok(traj.with_properties(mp))
    }
}

impl<E: Engine> ChemicalModel for Psi4Model<E> {
    fn compute(&mut self, mol: &Molecule) -> Result<Computed> {
        let mp = self.calculate(mol, &["potential_energy", "forces"])?;

        // sanity checking: the forces should have the same number of atoms
        debug_assert!({
            let n = self.total_atoms(mol);
            mp.get_forces().map_or(true, |f| f.value.len() == n)
        });

        Ok(mp)
    }
}
// 5ff4e3f1 ends here

// [[file:../psi4.note::*test][test:1]]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mock::MockEngine;
    use crate::geometry::water;
    use crate::params::Basis;
    use approx::assert_relative_eq;

    fn water_output() -> EngineOutput {
        let txt = gut::fs::read_file("tests/files/water-freq.json").expect("water-freq.json");
        serde_json::from_str(&txt).expect("water output")
    }

    fn hf_sto3g() -> Psi4Params {
        let mut params = Psi4Params::default();
        params.basis = Basis::Name("sto-3g".into()).into();
        params
    }

    #[test]
    fn test_frequency_job() -> Result<()> {
        let model = Psi4Model::new(hf_sto3g(), MockEngine::default())?;
        let mol = water();
        let requests = Request::parse_all(&["potential_energy", "frequencies", "mulliken"]);
        let kind = RunKind::select(&requests);
        assert_eq!(kind, RunKind::Frequency);

        let job = model.prepare_job(&mol, &requests, kind)?;
        assert_eq!(job.dertype, Some(1));
        assert_eq!(job.options["molden_write"], true);
        assert_eq!(job.options["normal_modes_write"], true);
        assert_eq!(job.method, "hf");
        assert_eq!(job.name, "water");
        assert_eq!(job.oeprops, vec!["DIPOLE", "MULLIKEN_CHARGES"]);
        assert!(!job.return_history);

        Ok(())
    }

    #[test]
    fn test_calculate_frequency() -> Result<()> {
        let mut model = Psi4Model::new(hf_sto3g(), MockEngine::new(water_output()))?;
        let mol = water();
        let mp = model.calculate(&mol, &["frequencies", "mulliken", "dipole"])?;

        let e = mp.get_energy().unwrap();
        assert_relative_eq!(e.value, -74.96590119, epsilon = 1e-8);
        let modes = mp.get_normal_modes().unwrap();
        assert_eq!(modes.value.len(), 3);
        // displacements reported in Bohr
        assert_eq!(modes.unit, Unit::Angstrom);
        assert_relative_eq!(modes.value[0][1][1], -0.4285 * BOHR_TO_ANGSTROM, epsilon = 1e-8);
        assert_eq!(mp.get_vibrational_frequencies().unwrap().value.len(), 3);
        assert!(mp.get_forces().is_none());
        assert!(mp.get_hessian().is_none());

        let q = mp.get_mulliken_charges().unwrap();
        assert_eq!(q.value.len(), 3);
        assert_relative_eq!(q.value.iter().sum::<f64>(), 0.0, epsilon = 1e-6);

        let d = mp.get_dipole().unwrap().value;
        let dm = mp.get_dipole_moment().unwrap().value;
        assert_relative_eq!(dm, d[2].abs(), epsilon = 1e-8);
        assert_relative_eq!(dm, 0.6781 * AU_TO_DEBYE, epsilon = 1e-6);

        assert_eq!(mp.get_charge(), Some(0));
        assert_eq!(mp.get_multiplicity(), Some(1));
        assert!(mp.get_variables().contains_key("CURRENT ENERGY"));
        assert!(mp.names().contains(&"psi4_output"));

        // engine was reset after the run
        assert_eq!(model.engine_mut().nresets, 1);
        assert_eq!(model.number_of_evaluations(), 1);

        Ok(())
    }

    #[test]
    fn test_calculate_forces() -> Result<()> {
        let mut out = water_output();
        out.gradient = Some(vec![[0.0, 0.0, 0.01], [0.0, 0.02, -0.005], [0.0, -0.02, -0.005]]);
        out.charge = 1;
        out.multiplicity = 2;
        let mut model = Psi4Model::new(hf_sto3g(), MockEngine::new(out))?;
        let mol = water();
        let mp = model.compute(&mol)?;

        let f = mp.get_forces().unwrap();
        assert_eq!(f.unit, Unit::HartreePerBohr);
        assert_eq!(f.value[0], [0.0, 0.0, -0.01]);
        assert_eq!(f.value[1], [0.0, -0.02, 0.005]);
        assert_eq!(model.engine_mut().last_job().kind, RunKind::Gradient);

        // electronic state follows what psi4 reports
        assert_eq!(mp.get_charge(), Some(1));
        assert_eq!(mp.get_multiplicity(), Some(2));

        Ok(())
    }

    #[test]
    fn test_calculate_without_basis() -> Result<()> {
        let mut model = Psi4Model::new(Psi4Params::default(), MockEngine::new(water_output()))?;
        let mol = water();
        let mp = model.calculate(&mol, &["forces", "mulliken"])?;
        assert_eq!(mp.names(), vec!["potential_energy", "psi4_output"]);
        assert!(model.engine_mut().last_job().oeprops.is_empty());

        // bracket basis is part of the method, leaving no basis
        let mut params = Psi4Params::default();
        params.theory = "mp2".into();
        params.basis = Basis::Name("cc-pv[dt]z".into()).into();
        let mut model = Psi4Model::new(params, MockEngine::new(water_output()))?;
        let mp = model.calculate(&mol, &["potential_energy"])?;
        assert_eq!(mp.names(), vec!["potential_energy", "psi4_output"]);
        let job = model.engine_mut().last_job();
        assert_eq!(job.method, "mp2/cc-pv[dt]z");
        assert_eq!(job.kind, RunKind::Energy);

        Ok(())
    }

    #[test]
    fn test_calculate_failure() -> Result<()> {
        let mut model = Psi4Model::new(hf_sto3g(), MockEngine::failing())?;
        let mol = water();
        assert!(model.calculate(&mol, &["energy"]).is_err());
        // reset even when psi4 failed
        assert_eq!(model.engine_mut().nresets, 1);
        assert_eq!(model.number_of_evaluations(), 0);

        // missing one-electron results
        let mut model = Psi4Model::new(hf_sto3g(), MockEngine::new(water_output()))?;
        assert!(model.calculate(&mol, &["mayer_indices"]).is_err());

        Ok(())
    }

    #[test]
    fn test_dimer_job() -> Result<()> {
        let mol = water();
        let params = hf_sto3g().with_dimer_partner(water());
        let model = Psi4Model::new(params, MockEngine::default())?;
        let job = model.prepare_job(&mol, &[], RunKind::Energy)?;
        assert!(job.molecule.contains("--\n"));
        assert_eq!(model.total_atoms(&mol), 6);

        Ok(())
    }

    #[test]
    fn test_job_dertype_and_electronic_state() -> Result<()> {
        let mol = water();
        let mut params = hf_sto3g();
        params.theory = "casscf".into();
        params.charge = Some(1);
        let model = Psi4Model::new(params, MockEngine::default())?;

        // Psi4 picks the derivative level unless asked
        for kind in [RunKind::Gradient, RunKind::Hessian, RunKind::Optimize] {
            let job = model.prepare_job(&mol, &[], kind)?;
            assert_eq!(job.dertype, None);
        }
        let job = model.prepare_job(&mol, &[], RunKind::Frequency)?;
        assert_eq!(job.dertype, Some(1));

        // charge only: Psi4 decides the multiplicity
        assert!(job.molecule.starts_with("O "));
        assert_eq!(job.charge, Some(1));
        assert_eq!(job.multiplicity, None);

        let mut params = hf_sto3g();
        params.dertype = Some(crate::params::DerivativeType::Energy);
        params.charge = Some(1);
        params.multiplicity = Some(2);
        let model = Psi4Model::new(params, MockEngine::default())?;
        let job = model.prepare_job(&mol, &[], RunKind::Hessian)?;
        assert_eq!(job.dertype, Some(0));
        assert!(job.molecule.starts_with("1 2\n"));
        assert_eq!(job.charge, None);
        assert_eq!(job.multiplicity, None);

        Ok(())
    }

    #[test]
    fn test_calculate_imaginary_frequency() -> Result<()> {
        let mut out = water_output();
        out.frequencies = Some(vec![-512.3, 4140.001, 4391.297]);
        let mut model = Psi4Model::new(hf_sto3g(), MockEngine::new(out))?;
        let mp = model.calculate(&water(), &["frequencies"])?;
        let freqs = mp.get_vibrational_frequencies().unwrap();
        assert_eq!(freqs.unit, Unit::Wavenumber);
        assert_eq!(freqs.value[0], -512.3);

        Ok(())
    }

    #[test]
    fn test_calculate_hessian() -> Result<()> {
        let mut out = water_output();
        let hessian: Vec<Vec<f64>> = (0..9).map(|i| (0..9).map(|j| if i == j { 0.5 } else { 0.01 }).collect()).collect();
        out.hessian = Some(hessian);
        let mut model = Psi4Model::new(hf_sto3g(), MockEngine::new(out))?;
        let mp = model.calculate(&water(), &["hessian"])?;
        assert_eq!(model.engine_mut().last_job().kind, RunKind::Hessian);

        let h = mp.get_hessian().unwrap();
        assert_eq!(h.unit, Unit::HartreePerBohr2);
        assert_eq!(h.value.len(), 9);
        assert_eq!(h.value[4][4], 0.5);
        assert_eq!(h.value[4][5], 0.01);
        assert!(mp.get_forces().is_none());
        assert!(mp.get_normal_modes().is_none());

        Ok(())
    }

    #[test]
    fn test_calculate_oeprops() -> Result<()> {
        let mut out = water_output();
        out.quadrupole = Some([[-7.0, 0.1, 0.2], [0.1, -4.0, 0.3], [0.2, 0.3, -6.0]]);
        out.esp_at_nuclei = Some(vec![-22.3, -1.1, -1.1]);
        out.lowdin_charges = Some(vec![-0.2, 0.1, 0.1]);
        out.wiberg_lowdin_indices = Some(vec![vec![0.0, 0.95, 0.95], vec![0.95, 0.0, 0.01], vec![0.95, 0.01, 0.0]]);
        out.no_occupations = Some(vec![2.0, 1.98, 0.02]);
        let mut model = Psi4Model::new(hf_sto3g(), MockEngine::new(out))?;
        let requests = [
            "energy",
            "quadrupole",
            "electrostatic_potential_at_nuclei",
            "lowdin",
            "wiberg_lowdin_indices",
            "natural_orbital_occupations",
        ];
        let mp = model.calculate(&water(), &requests)?;
        assert_eq!(
            model.engine_mut().last_job().oeprops,
            vec!["DIPOLE", "QUADRUPOLE", "ESP_AT_NUCLEI", "LOWDIN_CHARGES", "WIBERG_LOWDIN_INDICES", "NO_OCCUPATIONS"]
        );

        // XX XY XZ YY YZ ZZ
        let q = mp.get_quadrupole().unwrap();
        assert_eq!(q.unit, Unit::DebyeAngstrom);
        let f = AU_TO_DEBYE * BOHR_TO_ANGSTROM;
        assert_relative_eq!(q.value[0], -7.0 * f, epsilon = 1e-8);
        assert_relative_eq!(q.value[3], -4.0 * f, epsilon = 1e-8);
        assert_relative_eq!(q.value[4], 0.3 * f, epsilon = 1e-8);
        assert_relative_eq!(q.value[5], -6.0 * f, epsilon = 1e-8);

        let esp = mp.get_esp_at_nuclei().unwrap();
        assert_eq!(esp.unit, Unit::HartreePerCharge);
        assert_eq!(esp.value, vec![-22.3, -1.1, -1.1]);

        let q = mp.get_lowdin_charges().unwrap();
        assert_eq!(q.unit, Unit::ElementaryCharge);
        assert_eq!(q.value, vec![-0.2, 0.1, 0.1]);

        let w = mp.get_wiberg_lowdin_indices().unwrap();
        assert_eq!(w.len(), 3);
        assert_eq!(w[0][1], 0.95);

        assert_eq!(mp.get_natural_orbital_occupations(), Some(&vec![2.0, 1.98, 0.02]));

        // per-atom values must match the number of atoms
        let mut out = water_output();
        out.esp_at_nuclei = Some(vec![-22.3, -1.1]);
        let mut model = Psi4Model::new(hf_sto3g(), MockEngine::new(out))?;
        assert!(model.calculate(&water(), &["electrostatic_potential_at_nuclei"]).is_err());

        let mut out = water_output();
        out.wiberg_lowdin_indices = Some(vec![vec![0.0, 0.95], vec![0.95, 0.0], vec![0.95, 0.01]]);
        let mut model = Psi4Model::new(hf_sto3g(), MockEngine::new(out))?;
        assert!(model.calculate(&water(), &["wiberg_lowdin_indices"]).is_err());

        Ok(())
    }

    #[test]
    fn test_dimer_forces() -> Result<()> {
        let mol = water();
        let params = hf_sto3g().with_dimer_partner(water());

        // gradient of the monomer only
        let mut out = water_output();
        out.gradient = Some(vec![[0.0, 0.0, 0.01]; 3]);
        let mut model = Psi4Model::new(params.clone(), MockEngine::new(out))?;
        assert!(model.calculate(&mol, &["forces"]).is_err());

        let mut out = water_output();
        out.gradient = Some(vec![[0.0, 0.0, 0.01]; 6]);
        out.mulliken_charges = Some(vec![-0.33, 0.165, 0.165, -0.33, 0.165, 0.165]);
        let mut model = Psi4Model::new(params, MockEngine::new(out))?;
        let mp = model.calculate(&mol, &["forces", "mulliken"])?;
        assert_eq!(mp.get_forces().unwrap().value.len(), 6);
        assert_eq!(mp.get_forces().unwrap().value[5], [0.0, 0.0, -0.01]);
        assert_eq!(mp.get_mulliken_charges().unwrap().value.len(), 6);

        Ok(())
    }

    #[test]
    fn test_minimize() -> Result<()> {
        let mut out = water_output();
        out.history = Some(crate::engine::History {
            energy: vec![-74.90, -74.95, -74.96],
            coordinates: vec![
                vec![[0.0, 0.0, 0.2], [0.0, 1.4, -0.9], [0.0, -1.4, -0.9]],
                vec![[0.0, 0.0, 0.21], [0.0, 1.43, -0.88], [0.0, -1.43, -0.88]],
                vec![[0.0, 0.0, 0.22], [0.0, 1.43, -0.87], [0.0, -1.43, -0.87]],
            ],
        });
        out.geometry = Some(vec![[0.0, 0.0, 0.22], [0.0, 1.43, -0.87], [0.0, -1.43, -0.87]]);

        let mut model = Psi4Model::new(hf_sto3g(), MockEngine::new(out))?;
        let mol = water();
        let traj = model.minimize(&mol, &["potential_energy"])?;
        let job = model.engine_mut().last_job();
        assert_eq!(job.kind, RunKind::Optimize);
        assert!(job.return_history);

        assert_eq!(traj.len(), 3);
        assert_eq!(traj.energies(), vec![-74.90, -74.95, -74.96]);
        let last = traj.frames.last().unwrap();
        assert_eq!(last.molecule.title(), "water2");
        let (_, o) = last.molecule.atoms().next().unwrap();
        assert_relative_eq!(o.position()[2], 0.22 * BOHR_TO_ANGSTROM, epsilon = 1e-8);
        assert_relative_eq!(traj.nuclear_repulsion_energy.value, 9.1681932964, epsilon = 1e-8);

        let final_mol = traj.properties.get_molecule().expect("optimized geometry");
        assert_eq!(final_mol.natoms(), 3);

        Ok(())
    }
}
// test:1 ends here
