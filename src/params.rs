// [[file:../psi4.note::*header][header:1]]
//! Parameters for Psi4 calculations
//!
//! A model directory contains a `.env` file like:
//!
//! ```text
//! PSI4_THEORY=uhf
//! PSI4_BASIS=6-31g*
//! PSI4_OPTIONS={"scf_type": "df", "frozen_core": true}
//! PSI4_MEMORY=2 GB
//! ```
// header:1 ends here

// [[file:../psi4.note::6e0b27c1][6e0b27c1]]
use crate::core::*;
use crate::request::RunKind;

use gchemol::Molecule;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
// 6e0b27c1 ends here

// [[file:../psi4.note::*tables][tables:1]]
// toolkit theory names that Psi4 spells differently
const THEORIES: &[(&str, &str)] = &[
    ("rhf", "hf"),
    ("mp2", "mp2"),
    ("uhf", "hf"),
    ("dft", "b3lyp"),
    ("casscf", "casscf"),
];

// toolkit option keys that Psi4 spells differently
const NATIVE_OPTIONS: &[(&str, &str)] = &[("frozen_core", "freeze_core"), ("mdt_frozen_core", "freeze_core")];
// tables:1 ends here

// [[file:../psi4.note::3c9d2a55][3c9d2a55]]
/// Basis set specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Basis {
    /// One basis set for all atoms, such as "cc-pvdz", or a Psi4 extrapolation
    /// scheme like "cc-pv[dt]z".
    Name(String),
    /// Basis set by element symbol or atom label. Key "*" sets the default.
    PerAtom(BTreeMap<String, String>),
}

impl Basis {
    /// Render per-atom assignments as Psi4 basis block lines.
    fn render_block(map: &BTreeMap<String, String>) -> String {
        // the default assignment must come first
        let mut lines = vec![];
        if let Some(default) = map.get("*") {
            lines.push(format!("assign {}", default));
        }
        for (k, v) in map.iter().filter(|(k, _)| k.as_str() != "*") {
            lines.push(format!("assign {} {}", k, v));
        }
        lines.join("\n")
    }
}

/// The derivative level Psi4 uses for finite differences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DerivativeType {
    Energy,
    Gradient,
    Hessian,
}

impl DerivativeType {
    /// Psi4's integer code
    pub fn order(&self) -> usize {
        match self {
            DerivativeType::Energy => 0,
            DerivativeType::Gradient => 1,
            DerivativeType::Hessian => 2,
        }
    }

    fn parse(s: &str) -> Result<Self> {
        let t = match s.trim().to_lowercase().as_str() {
            "0" | "energy" | "none" => DerivativeType::Energy,
            "1" | "gradient" | "first" => DerivativeType::Gradient,
            "2" | "hessian" | "second" => DerivativeType::Hessian,
            _ => bail!("invalid derivative type: {:?}", s),
        };
        Ok(t)
    }
}

/// User parameters of the Psi4 model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Psi4Params {
    /// Level of theory, such as "rhf", "uhf", "mp2", "b3lyp".
    pub theory: String,

    /// Basis set. Without a basis set the model only reports the energy.
    pub basis: Option<Basis>,

    /// Psi4 options. Toolkit spelled keys are renamed.
    pub options: BTreeMap<String, Value>,

    /// Memory for Psi4, such as "2 GB".
    pub memory: Option<String>,

    /// Psi4 output file. Defaults to a file in scratch directory.
    pub output: Option<PathBuf>,

    /// Derivative type for finite differences. Psi4 picks the highest
    /// analytic level available if unset.
    pub dertype: Option<DerivativeType>,

    /// Molecular charge. Psi4 guesses it if unset.
    pub charge: Option<isize>,

    /// Spin multiplicity. Psi4 guesses it if unset.
    pub multiplicity: Option<usize>,

    /// The other fragment when computing a dimer.
    #[serde(skip)]
    pub dimer_partner: Option<Molecule>,
}

impl Default for Psi4Params {
    fn default() -> Self {
        Self {
            theory: "rhf".into(),
            basis: None,
            options: BTreeMap::new(),
            memory: None,
            output: None,
            dertype: None,
            charge: None,
            multiplicity: None,
            dimer_partner: None,
        }
    }
}
// 3c9d2a55 ends here

// [[file:../psi4.note::9b27f6ea][9b27f6ea]]
/// Parameters with every default resolved.
#[derive(Debug, Clone)]
pub struct Setup {
    /// The method string passed to Psi4 driver, such as "hf" or "mp2/cc-pv[dt]z".
    pub method: String,
    /// The basis set name, or None when no basis set applies.
    pub basis: Option<String>,
    /// Psi4 basis block for per-atom assignments
    pub basis_block: Option<String>,
    pub options: BTreeMap<String, Value>,
    pub memory: Option<String>,
    pub output: Option<PathBuf>,
    /// Derivative type set by user. Frequency runs use gradient regardless.
    pub dertype: Option<DerivativeType>,
    pub charge: Option<isize>,
    pub multiplicity: Option<usize>,
}

impl Setup {
    /// Translate user parameters into Psi4 vocabulary.
    pub fn resolve(params: &Psi4Params) -> Result<Self> {
        let theory = params.theory.trim().to_lowercase();
        if theory.is_empty() {
            bail!("no theory specified");
        }

        let mut options: BTreeMap<String, Value> = params
            .options
            .iter()
            .map(|(k, v)| {
                let key = NATIVE_OPTIONS
                    .iter()
                    .find(|(toolkit, _)| toolkit == k)
                    .map(|(_, native)| native.to_string())
                    .unwrap_or_else(|| k.to_owned());
                (key, v.clone())
            })
            .collect();

        if theory == "uhf" {
            options.insert("reference".into(), "uhf".into());
        }

        let mut method = THEORIES
            .iter()
            .find(|(t, _)| *t == theory)
            .map(|(_, m)| m.to_string())
            .unwrap_or(theory);

        let mut basis = None;
        let mut basis_block = None;
        match &params.basis {
            Some(Basis::Name(name)) if name.contains('[') && name.contains(']') => {
                method = format!("{}/{}", method, name);
            }
            Some(Basis::Name(name)) => {
                options.insert("basis".into(), name.as_str().into());
                basis = Some(name.to_owned());
            }
            Some(Basis::PerAtom(map)) => {
                if map.is_empty() {
                    bail!("empty per-atom basis set assignments");
                }
                basis_block = Some(Basis::render_block(map));
                basis = Some("gosh_basis".into());
            }
            None => {}
        }

        let setup = Self {
            method,
            basis,
            basis_block,
            options,
            memory: params.memory.clone(),
            output: params.output.clone(),
            dertype: params.dertype,
            charge: params.charge,
            multiplicity: params.multiplicity,
        };

        Ok(setup)
    }

    /// The derivative level sent to Psi4 for `kind`, or None to let Psi4
    /// decide.
    pub fn dertype_for(&self, kind: RunKind) -> Option<usize> {
        match kind {
            RunKind::Frequency => Some(DerivativeType::Gradient.order()),
            RunKind::Energy => None,
            _ => self.dertype.map(|d| d.order()),
        }
    }
}
// 9b27f6ea ends here

// [[file:../psi4.note::e07c4a19][e07c4a19]]
mod env {
    use super::*;

    // all values as plain strings, as they appear in .env file
    #[derive(Debug, Default, Deserialize)]
    pub(super) struct RawEnv {
        pub theory: Option<String>,
        pub basis: Option<String>,
        pub options: Option<String>,
        pub memory: Option<String>,
        pub output: Option<String>,
        pub dertype: Option<String>,
        pub charge: Option<isize>,
        pub multiplicity: Option<usize>,
        pub python: Option<String>,
        pub scr_dir: Option<String>,
    }

    impl RawEnv {
        pub(super) fn from_dotenv(dir: &Path) -> Result<Self> {
            let envfile = dir.join(".env");
            let vars: Vec<(String, String)> = dotenv::from_path_iter(&envfile)
                .with_context(|| format!("read env file: {:?}", envfile))?
                .collect::<std::result::Result<_, _>>()
                .with_context(|| format!("parse env file: {:?}", envfile))?;
            for (key, value) in &vars {
                info!("found env var from {:?}: {}={}", envfile, key, value);
            }

            let raw = envy::prefixed("PSI4_")
                .from_iter(vars)
                .with_context(|| format!("invalid PSI4_ vars in {:?}", envfile))?;
            Ok(raw)
        }
    }

    pub(super) fn parse_basis(s: &str) -> Result<Basis> {
        let s = s.trim();
        if s.starts_with('{') {
            let map = serde_json::from_str(s).with_context(|| format!("invalid per-atom basis: {}", s))?;
            Ok(Basis::PerAtom(map))
        } else {
            Ok(Basis::Name(s.to_owned()))
        }
    }

    pub(super) fn parse_options(s: &str) -> Result<BTreeMap<String, Value>> {
        let options = serde_json::from_str(s).with_context(|| format!("PSI4_OPTIONS is not a JSON object: {}", s))?;
        Ok(options)
    }
}

impl Psi4Params {
    /// Read parameters from `.env` file in `dir`. Relative output path is
    /// resolved against `dir`.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let raw = env::RawEnv::from_dotenv(dir)?;
        Self::from_raw_env(raw, dir)
    }

    fn from_raw_env(raw: env::RawEnv, dir: &Path) -> Result<Self> {
        let mut params = Psi4Params::default();
        if let Some(theory) = raw.theory {
            params.theory = theory;
        }
        params.basis = raw.basis.as_deref().map(env::parse_basis).transpose()?;
        if let Some(options) = raw.options.as_deref() {
            params.options = env::parse_options(options)?;
        }
        params.memory = raw.memory;
        params.output = raw.output.map(|p| dir.join(p));
        params.dertype = raw.dertype.as_deref().map(DerivativeType::parse).transpose()?;
        params.charge = raw.charge;
        params.multiplicity = raw.multiplicity;

        Ok(params)
    }

    /// Compute the molecule together with `partner` as a dimer.
    pub fn with_dimer_partner(mut self, partner: Molecule) -> Self {
        self.dimer_partner = Some(partner);
        self
    }
}

/// Engine settings found in a model directory: python interpreter and
/// scratch root.
pub(crate) fn engine_settings(dir: &Path) -> Result<(Option<String>, Option<PathBuf>)> {
    let raw = env::RawEnv::from_dotenv(dir)?;
    Ok((raw.python, raw.scr_dir.map(PathBuf::from)))
}
// e07c4a19 ends here

// [[file:../psi4.note::d1f84b63][d1f84b63]]
#[test]
fn test_setup_dertype() -> Result<()> {
    // Psi4 chooses analytic or finite-difference derivatives by default
    let setup = Setup::resolve(&Psi4Params::default())?;
    assert_eq!(setup.dertype_for(RunKind::Gradient), None);
    assert_eq!(setup.dertype_for(RunKind::Hessian), None);
    assert_eq!(setup.dertype_for(RunKind::Optimize), None);
    assert_eq!(setup.dertype_for(RunKind::Frequency), Some(1));

    let mut params = Psi4Params::default();
    params.dertype = Some(DerivativeType::Energy);
    let setup = Setup::resolve(&params)?;
    assert_eq!(setup.dertype_for(RunKind::Gradient), Some(0));
    assert_eq!(setup.dertype_for(RunKind::Hessian), Some(0));
    assert_eq!(setup.dertype_for(RunKind::Frequency), Some(1));
    assert_eq!(setup.dertype_for(RunKind::Energy), None);

    Ok(())
}

#[test]
fn test_setup_uhf() -> Result<()> {
    let mut params = Psi4Params::default();
    params.theory = "UHF".into();
    params.basis = Basis::Name("sto-3g".into()).into();

    let setup = Setup::resolve(&params)?;
    assert_eq!(setup.method, "hf");
    assert_eq!(setup.options["reference"], "uhf");
    assert_eq!(setup.options["basis"], "sto-3g");
    assert_eq!(setup.basis.as_deref(), Some("sto-3g"));
    assert_eq!(setup.dertype, None);

    Ok(())
}

#[test]
fn test_setup_bracket_basis() -> Result<()> {
    let mut params = Psi4Params::default();
    params.theory = "mp2".into();
    params.basis = Basis::Name("cc-pv[dt]z".into()).into();

    let setup = Setup::resolve(&params)?;
    assert_eq!(setup.method, "mp2/cc-pv[dt]z");
    assert_eq!(setup.basis, None);
    assert!(!setup.options.contains_key("basis"));

    Ok(())
}

#[test]
fn test_setup_options() -> Result<()> {
    let mut params = Psi4Params::default();
    params.theory = "DFT".into();
    params.options.insert("frozen_core".into(), true.into());
    params.options.insert("scf_type".into(), "df".into());
    params.dertype = Some(DerivativeType::Energy);

    let setup = Setup::resolve(&params)?;
    assert_eq!(setup.method, "b3lyp");
    assert_eq!(setup.options["freeze_core"], true);
    assert_eq!(setup.options["scf_type"], "df");
    assert!(!setup.options.contains_key("frozen_core"));
    assert!(!setup.options.contains_key("reference"));
    assert_eq!(setup.dertype, Some(DerivativeType::Energy));

    // the older toolkit spelling
    let mut params = Psi4Params::default();
    params.options.insert("mdt_frozen_core".into(), false.into());
    let setup = Setup::resolve(&params)?;
    assert_eq!(setup.options["freeze_core"], false);
    assert!(!setup.options.contains_key("mdt_frozen_core"));

    // unknown theory passes through
    params.theory = "CCSD(T)".into();
    assert_eq!(Setup::resolve(&params)?.method, "ccsd(t)");

    Ok(())
}

#[test]
fn test_setup_per_atom_basis() -> Result<()> {
    let mut params = Psi4Params::default();
    let mut map = BTreeMap::new();
    map.insert("H".to_string(), "sto-3g".to_string());
    map.insert("*".to_string(), "cc-pvdz".to_string());
    params.basis = Basis::PerAtom(map).into();

    let setup = Setup::resolve(&params)?;
    assert_eq!(setup.basis_block.as_deref(), Some("assign cc-pvdz\nassign H sto-3g"));
    assert!(setup.basis.is_some());

    Ok(())
}

#[test]
fn test_params_from_dir() -> Result<()> {
    let params = Psi4Params::from_dir("tests/files/psi4-model")?;
    assert_eq!(params.theory, "uhf");
    assert_eq!(params.basis, Some(Basis::Name("6-31g*".into())));
    assert_eq!(params.options["scf_type"], "df");
    assert_eq!(params.memory.as_deref(), Some("500 MB"));
    assert_eq!(params.dertype, Some(DerivativeType::Gradient));
    assert_eq!(params.multiplicity, Some(2));

    let (python, scr_dir) = engine_settings("tests/files/psi4-model".as_ref())?;
    assert_eq!(python.as_deref(), Some("python3"));
    assert_eq!(scr_dir, None);

    Ok(())
}

#[test]
fn test_parse_per_atom_basis() -> Result<()> {
    let basis = env::parse_basis(r#"{"O": "cc-pvtz", "*": "cc-pvdz"}"#)?;
    match basis {
        Basis::PerAtom(map) => assert_eq!(map["O"], "cc-pvtz"),
        _ => panic!("expect per-atom basis"),
    }
    assert!(env::parse_options("not json").is_err());
    assert!(DerivativeType::parse("hessian").is_ok());
    assert!(DerivativeType::parse("third").is_err());

    Ok(())
}
// d1f84b63 ends here
