// [[file:../psi4.note::*header][header:1]]
//! Optimization steps recorded by Psi4
// header:1 ends here

// [[file:../psi4.note::0c6b3f8e][0c6b3f8e]]
use crate::core::*;
use crate::engine::History;
use crate::units::{Quantity, Unit};
use crate::Computed;

use gchemol::Molecule;
// 0c6b3f8e ends here

// [[file:../psi4.note::93d1e7a5][93d1e7a5]]
/// One step of geometry optimization.
#[derive(Debug, Clone)]
pub struct Frame {
    pub molecule: Molecule,
    pub energy: Quantity<f64>,
}

/// Geometry optimization path.
#[derive(Debug, Clone)]
pub struct Trajectory {
    pub frames: Vec<Frame>,
    /// Nuclear repulsion energy of the final structure.
    pub nuclear_repulsion_energy: Quantity<f64>,
    /// Properties computed at the final structure.
    pub properties: Computed,
}

impl Trajectory {
    /// Build from Psi4 optimization history. `molecule_at` creates the
    /// molecule for each step from coordinates in Bohr and a title.
    pub(crate) fn from_history<F>(name: &str, history: &History, enuc: f64, mut molecule_at: F) -> Result<Self>
    where
        F: FnMut(&[[f64; 3]], &str) -> Result<Molecule>,
    {
        let n = history.energy.len();
        if history.coordinates.len() != n {
            bail!(
                "psi4 history has {} energies but {} geometries",
                n,
                history.coordinates.len()
            );
        }

        let mut frames = Vec::with_capacity(n);
        for (step, (coords, energy)) in history.coordinates.iter().zip(&history.energy).enumerate() {
            let title = format!("{}{}", name, step);
            let molecule = molecule_at(coords, &title)?;
            frames.push(Frame {
                molecule,
                energy: Quantity::new(*energy, Unit::Hartree),
            });
        }

        let traj = Self {
            frames,
            nuclear_repulsion_energy: Quantity::new(enuc, Unit::Hartree),
            properties: Computed::default(),
        };
        Ok(traj)
    }

    pub(crate) fn with_properties(mut self, properties: Computed) -> Self {
        self.properties = properties;
        self
    }

    /// The number of optimization steps
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Energies of all steps in Hartree.
    pub fn energies(&self) -> Vec<f64> {
        self.frames.iter().map(|f| f.energy.value).collect()
    }

    /// The structure of the last step.
    pub fn last_molecule(&self) -> Option<&Molecule> {
        self.frames.last().map(|f| &f.molecule)
    }
}
// 93d1e7a5 ends here

// [[file:../psi4.note::*test][test:1]]
#[test]
fn test_trajectory_from_history() -> Result<()> {
    let history = History {
        energy: vec![-1.0, -1.1],
        coordinates: vec![vec![[0.0; 3]], vec![[1.0, 0.0, 0.0]]],
    };

    let mut titles = vec![];
    let traj = Trajectory::from_history("h", &history, 0.5, |coords, title| {
        titles.push(title.to_owned());
        let atoms = coords.iter().map(|p| gchemol::Atom::new("H", *p));
        Ok(Molecule::from_atoms(atoms))
    })?;
    assert_eq!(titles, vec!["h0", "h1"]);
    assert_eq!(traj.len(), 2);
    assert_eq!(traj.energies(), vec![-1.0, -1.1]);
    assert_eq!(traj.nuclear_repulsion_energy.value, 0.5);
    assert!(traj.last_molecule().is_some());
    assert!(traj.properties.is_empty());

    // inconsistent history
    let history = History {
        energy: vec![-1.0],
        coordinates: vec![],
    };
    assert!(Trajectory::from_history("h", &history, 0.0, |_, _| bail!("unreachable")).is_err());

    Ok(())
}
// test:1 ends here
