// [[file:../../psi4.note::*cli][cli:1]]
use std::path::PathBuf;

use clap::Parser;
use gchemol::prelude::*;
use gchemol::Molecule;
use gut::prelude::*;

use gosh_psi4::Psi4;

/// Compute molecular properties with Psi4.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The molecule to compute.
    molecule: PathBuf,

    /// Model directory containing .env file with PSI4_ parameters.
    #[arg(long, short = 'd', default_value = ".")]
    model_dir: PathBuf,

    /// Properties to compute, such as forces, hessian, frequencies, mulliken.
    #[arg(long, short = 'p', default_values = ["potential_energy", "forces"])]
    properties: Vec<String>,

    /// Optimize the geometry and print energies of each step.
    #[arg(long)]
    minimize: bool,

    /// Keep scratch files for inspection.
    #[arg(long)]
    keep: bool,
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = Cli::parse();
    let mol = Molecule::from_file(&args.molecule).with_context(|| format!("read molecule from {:?}", args.molecule))?;
    let mut psi4 = Psi4::from_dir(&args.model_dir)?;
    psi4.engine_mut().keep_scratch_files(args.keep);

    if args.minimize {
        let traj = psi4.minimize(&mol, &args.properties)?;
        for (i, e) in traj.energies().iter().enumerate() {
            println!("{:5} {:-20.10}", i, e);
        }
        print!("{}", traj.properties);
    } else {
        let mp = psi4.calculate(&mol, &args.properties)?;
        print!("{}", mp);
        if let Some(d) = mp.get_dipole_moment() {
            info!("dipole moment: {}", d);
        }
    }

    Ok(())
}
// cli:1 ends here
