// [[file:../psi4.note::*header][header:1]]
//! Molecule in Psi4 input syntax
// header:1 ends here

// [[file:../psi4.note::50e2d8b4][50e2d8b4]]
use crate::core::*;

use gchemol::prelude::*;
use gchemol::Molecule;
// 50e2d8b4 ends here

// [[file:../psi4.note::b7a0e6f3][b7a0e6f3]]
fn render_fragment(mol: &Molecule, txt: &mut String) -> Result<()> {
    for (i, a) in mol.atoms() {
        let [x, y, z] = a.position();
        if [x, y, z].iter().any(|v| v.is_nan()) {
            error!("Invalid position of atom {}: {:?}", i, a.position());
            bail!("Molecule has invalid data in positions.");
        }
        let line = format!("{:<4} {:-18.10} {:-18.10} {:-18.10}\n", a.symbol(), x, y, z);
        txt.push_str(&line);
    }
    Ok(())
}

/// Render `mol` as the body of Psi4 `molecule {...}` block. With `partner`
/// the two molecules are separate fragments of a dimer.
///
/// The charge/multiplicity line is written only when both are known.
/// Coordinates are in Å, and Psi4 is told to keep the input frame, so that
/// gradients come back in the same atom order and orientation.
pub(crate) fn render_psi4_molecule(
    mol: &Molecule,
    partner: Option<&Molecule>,
    charge: Option<isize>,
    multiplicity: Option<usize>,
) -> Result<String> {
    if mol.natoms() == 0 {
        bail!("Molecule has no atoms.");
    }

    // Psi4 requires both on the same line
    let mut txt = String::new();
    if let (Some(c), Some(m)) = (charge, multiplicity) {
        txt.push_str(&format!("{} {}\n", c, m));
    }
    render_fragment(mol, &mut txt)?;
    if let Some(partner) = partner {
        txt.push_str("--\n");
        render_fragment(partner, &mut txt)?;
    }
    txt.push_str("units angstrom\nno_reorient\nno_com\n");

    Ok(txt)
}

/// A name for Psi4 variables and files, derived from molecule title.
pub(crate) fn molecule_name(mol: &Molecule) -> String {
    let name: String = mol
        .title()
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if name.is_empty() {
        "molecule".to_owned()
    } else {
        name
    }
}
// b7a0e6f3 ends here

// [[file:../psi4.note::0f5a92ce][0f5a92ce]]
#[cfg(test)]
pub(crate) fn water() -> Molecule {
    use gchemol::Atom;

    let atoms = vec![
        Atom::new("O", [0.0, 0.0, 0.1173]),
        Atom::new("H", [0.0, 0.7572, -0.4692]),
        Atom::new("H", [0.0, -0.7572, -0.4692]),
    ];
    let mut mol = Molecule::from_atoms(atoms);
    mol.set_title("water");
    mol
}

#[test]
fn test_render_psi4_molecule() -> Result<()> {
    let mol = water();
    let txt = render_psi4_molecule(&mol, None, Some(0), Some(1))?;
    let lines: Vec<_> = txt.lines().collect();
    assert_eq!(lines[0], "0 1");
    assert!(lines[1].starts_with("O "));
    assert_eq!(lines.len(), 7);
    assert!(txt.ends_with("no_com\n"));

    // charge only: no charge/multiplicity line
    let txt = render_psi4_molecule(&mol, None, Some(1), None)?;
    assert!(txt.lines().next().unwrap().starts_with("O "));
    assert_eq!(txt.lines().count(), 6);
    let txt = render_psi4_molecule(&mol, None, None, Some(3))?;
    assert!(txt.lines().next().unwrap().starts_with("O "));

    let txt = render_psi4_molecule(&mol, Some(&mol), None, None)?;
    assert_eq!(txt.lines().filter(|l| *l == "--").count(), 1);
    assert_eq!(txt.lines().count(), 10);

    assert_eq!(molecule_name(&mol), "water");
    let mut mol = mol;
    mol.set_title("water dimer #1");
    assert_eq!(molecule_name(&mol), "water_dimer__1");

    Ok(())
}
// 0f5a92ce ends here
