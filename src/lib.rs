// [[file:../psi4.note::*common][common:1]]
pub(crate) mod core {
    pub use gut::prelude::*;
}
// common:1 ends here

// [[file:../psi4.note::*mods][mods:1]]
mod model_properties;

mod engine;
mod geometry;
mod params;
mod psi4;
mod request;
mod trajectory;

pub mod units;
// mods:1 ends here

// [[file:../psi4.note::bf8cc73b][bf8cc73b]]
use crate::core::*;

use gchemol::prelude::*;
use gchemol::Molecule;

/// Trait for chemical calculations
pub trait ChemicalModel {
    /// Define how to compute molecular properties, such as energy, forces, or
    /// structure ...
    fn compute(&mut self, mol: &Molecule) -> Result<Computed>;

    /// Define how to compute the properties of a bunch of molecules, mainly for
    /// reduce IO costs of small molecule calculations.
    fn compute_bunch(&mut self, mols: &[Molecule]) -> Result<Vec<Computed>> {
        mols.iter().map(|mol| self.compute(mol)).collect()
    }
}
// bf8cc73b ends here

// [[file:../psi4.note::*pub][pub:1]]
pub use crate::engine::{Engine, EngineOutput, History, Job, Psi4Process, Session};
pub use crate::model_properties::*;
pub use crate::params::{Basis, DerivativeType, Psi4Params, Setup};
pub use crate::psi4::Psi4Model;
pub use crate::request::{Request, RunKind};
pub use crate::trajectory::{Frame, Trajectory};

pub type Psi4 = Psi4Model<Psi4Process>;
// pub:1 ends here
