// [[file:../psi4.note::*header][header:1]]
//! The boundary with Psi4 engine
//!
//! A [`Job`] describes one Psi4 driver call, and an [`EngineOutput`] collects
//! everything the model reads back from it. Engine state is released by
//! [`Session`] when it goes out of scope, whether the call succeeded or not.
// header:1 ends here

// [[file:../psi4.note::1d9c4e70][1d9c4e70]]
use crate::core::*;
use crate::request::RunKind;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

mod process;

pub use process::Psi4Process;
// 1d9c4e70 ends here

// [[file:../psi4.note::6a3e08f9][6a3e08f9]]
/// One call into Psi4 driver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Job {
    /// Title for Psi4 variables
    pub name: String,
    pub kind: RunKind,
    /// Method string for Psi4 driver, e.g. "scf" or "mp2/cc-pv[dt]z".
    pub method: String,
    /// Body of Psi4 molecule block
    pub molecule: String,
    /// Psi4 basis block with per-atom assignments
    pub basis_block: Option<String>,
    pub options: BTreeMap<String, Value>,
    pub memory: Option<String>,
    pub output: Option<PathBuf>,
    /// Derivative level for finite differences. Psi4 decides if unset.
    pub dertype: Option<usize>,
    /// Molecular charge when not given in the molecule block
    pub charge: Option<isize>,
    /// Spin multiplicity when not given in the molecule block
    pub multiplicity: Option<usize>,
    pub return_history: bool,
    /// Psi4 one-electron properties to evaluate on the returned wavefunction.
    pub oeprops: Vec<String>,
}

/// Per-step history of geometry optimization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    /// Energy in Hartree
    pub energy: Vec<f64>,
    /// Cartesian coordinates in Bohr
    pub coordinates: Vec<Vec<[f64; 3]>>,
}

/// Results read back from Psi4, in atomic units.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOutput {
    /// CURRENT ENERGY
    pub energy: f64,
    pub nuclear_repulsion_energy: f64,
    /// charge of Psi4 molecule after the run
    pub charge: isize,
    pub multiplicity: usize,

    pub gradient: Option<Vec<[f64; 3]>>,
    /// 3N x 3N
    pub hessian: Option<Vec<Vec<f64>>>,
    /// Harmonic frequencies in cm^-1, ascending. Imaginary ones are negative.
    pub frequencies: Option<Vec<f64>>,
    /// Cartesian displacements of each normal mode in Bohr, in the order of
    /// `frequencies`
    pub normal_modes: Option<Vec<Vec<[f64; 3]>>>,

    /// e·a0
    pub dipole: Option<[f64; 3]>,
    /// e·a0^2, as 3x3 tensor
    pub quadrupole: Option<[[f64; 3]; 3]>,
    pub esp_at_nuclei: Option<Vec<f64>>,
    pub mulliken_charges: Option<Vec<f64>>,
    pub lowdin_charges: Option<Vec<f64>>,
    pub wiberg_lowdin_indices: Option<Vec<Vec<f64>>>,
    pub mayer_indices: Option<Vec<Vec<f64>>>,
    pub no_occupations: Option<Vec<f64>>,

    pub history: Option<History>,
    /// Final geometry in Bohr
    pub geometry: Option<Vec<[f64; 3]>>,

    /// Scalar Psi4 variables after the run
    pub variables: BTreeMap<String, f64>,
}
// 6a3e08f9 ends here

// [[file:../psi4.note::47bd2c0a][47bd2c0a]]
/// The external quantum chemistry engine.
pub trait Engine {
    /// Run `job` and wait for its results.
    fn run(&mut self, job: &Job) -> Result<EngineOutput>;

    /// Clear engine state and options left by previous runs.
    fn reset(&mut self) -> Result<()>;
}

/// Scoped use of an engine: reset is called on drop.
pub struct Session<'a, E: Engine + ?Sized> {
    engine: &'a mut E,
}

impl<'a, E: Engine + ?Sized> Session<'a, E> {
    pub fn open(engine: &'a mut E) -> Self {
        Self { engine }
    }

    pub fn run(&mut self, job: &Job) -> Result<EngineOutput> {
        debug!("run psi4 job {:?}: {:?} with {}", job.name, job.kind, job.method);
        self.engine.run(job)
    }
}

impl<'a, E: Engine + ?Sized> Drop for Session<'a, E> {
    fn drop(&mut self) {
        trace!("reset psi4 engine.");
        if let Err(e) = self.engine.reset() {
            error!("psi4 engine reset failure: {:?}", e);
        }
    }
}
// 47bd2c0a ends here

// [[file:../psi4.note::f2c8b5d1][f2c8b5d1]]
/// An engine replaying a prepared output, for testing the model.
#[cfg(test)]
pub(crate) mod mock {
    use super::*;

    #[derive(Default)]
    pub struct MockEngine {
        pub output: Option<EngineOutput>,
        pub jobs: Vec<Job>,
        pub nresets: usize,
    }

    impl MockEngine {
        pub fn new(output: EngineOutput) -> Self {
            Self {
                output: Some(output),
                ..Default::default()
            }
        }

        /// An engine whose every run fails.
        pub fn failing() -> Self {
            Self::default()
        }

        pub fn last_job(&self) -> &Job {
            self.jobs.last().expect("no job submitted")
        }
    }

    impl Engine for MockEngine {
        fn run(&mut self, job: &Job) -> Result<EngineOutput> {
            self.jobs.push(job.clone());
            self.output.clone().ok_or_else(|| format_err!("psi4 exited abnormally"))
        }

        fn reset(&mut self) -> Result<()> {
            self.nresets += 1;
            Ok(())
        }
    }
}

#[test]
fn test_session_reset() -> Result<()> {
    let mut engine = mock::MockEngine::failing();
    {
        let mut session = Session::open(&mut engine);
        assert!(session.run(&Job::default()).is_err());
    }
    assert_eq!(engine.nresets, 1);
    assert_eq!(engine.jobs.len(), 1);

    Ok(())
}

#[test]
fn test_engine_output_json() -> Result<()> {
    let txt = gut::fs::read_file("tests/files/water-freq.json")?;
    let out: EngineOutput = serde_json::from_str(&txt)?;
    assert_eq!(out.charge, 0);
    assert_eq!(out.multiplicity, 1);
    assert_eq!(out.frequencies.as_ref().map(|f| f.len()), Some(3));
    assert_eq!(out.normal_modes.as_ref().map(|m| m[0].len()), Some(3));
    assert!(out.gradient.is_none());
    assert!(out.variables.contains_key("CURRENT ENERGY"));

    Ok(())
}
// f2c8b5d1 ends here
