// [[file:../../psi4.note::*imports][imports:1]]
use super::*;

use std::path::Path;
use tempfile::TempDir;
// imports:1 ends here

// [[file:../../psi4.note::8c51f3a2][8c51f3a2]]
// Python driver calling Psi4 module: reads job.json, writes result.json
const PSI4_DRIVER: &str = include_str!("driver.py");

/// Psi4 running as a python child process.
pub struct Psi4Process {
    /// Python interpreter having psi4 module.
    python: String,

    /// Set the root directory for scratch files.
    scr_dir: Option<PathBuf>,

    /// unique temporary working directory
    temp_dir: Option<TempDir>,

    /// keep scratch files on reset
    keep_scratch: bool,

    /// Record the number of engine calls.
    ncalls: usize,
}

impl Default for Psi4Process {
    fn default() -> Self {
        Self {
            python: "python3".into(),
            scr_dir: None,
            temp_dir: None,
            keep_scratch: false,
            ncalls: 0,
        }
    }
}
// 8c51f3a2 ends here

// [[file:../../psi4.note::6cc8ead1][6cc8ead1]]
mod env {
    use super::*;
    use tempfile::{tempdir, tempdir_in};

    /// Return a temporary directory under `scr_root` for safe calculation.
    pub(super) fn new_scratch_directory(scr_root: Option<&Path>) -> Result<TempDir> {
        // create leading directories
        if let Some(d) = &scr_root {
            if !d.exists() {
                std::fs::create_dir_all(d).context("create scratch root dir")?;
            }
        }
        scr_root.map_or_else(
            || tempdir().context("create temp scratch dir"),
            |d| tempdir_in(d).with_context(|| format!("create temp scratch dir under {:?}", d)),
        )
    }

    impl Psi4Process {
        /// Create a temporary working directory with the driver script in it
        pub(super) fn prepare_compute_env(&mut self) -> Result<PathBuf> {
            if let Some(tdir) = &self.temp_dir {
                return Ok(tdir.path().to_owned());
            }

            let tdir = new_scratch_directory(self.scr_dir.as_deref())?;
            info!("psi4 scratching directory: {:?}", tdir);
            gut::fs::write_to_file(tdir.path().join("driver.py"), PSI4_DRIVER)?;
            let path = tdir.path().to_owned();
            self.temp_dir = tdir.into();

            Ok(path)
        }
    }

    #[test]
    fn test_env() -> Result<()> {
        let root = tempfile::tempdir()?;
        let d = new_scratch_directory(Some(root.path().join("scratch").as_path()))?;
        assert!(d.path().exists());
        let d = new_scratch_directory(None)?;
        assert!(d.path().exists());
        Ok(())
    }
}
// 6cc8ead1 ends here

// [[file:../../psi4.note::50a738a3][50a738a3]]
impl Psi4Process {
    /// Call the driver script with `job` written into scratch directory, and
    /// wait for its result file.
    fn submit_job(&mut self, job: &Job) -> Result<EngineOutput> {
        let wrk_dir = self.prepare_compute_env()?;

        let job_file = wrk_dir.join("job.json");
        let result_file = wrk_dir.join("result.json");
        // remove stale results from previous calls
        if result_file.exists() {
            std::fs::remove_file(&result_file).context("remove old result file")?;
        }
        let txt = serde_json::to_string_pretty(job)?;
        gut::fs::write_to_file(&job_file, &txt)?;

        debug!("submit cmdline: {} driver.py job.json result.json", self.python);
        let output = duct::cmd!(&self.python, "driver.py", "job.json", "result.json")
            .dir(&wrk_dir)
            .env("PSI_SCRATCH", &wrk_dir)
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()
            .with_context(|| format!("Failed to run psi4 driver with {:?}", self.python))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!("psi4 driver stdout:\n{}", stdout);
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("psi4 driver stderr:\n{}", stderr);
            bail!("psi4 calculation failed with {}", output.status);
        }

        let txt = gut::fs::read_file(&result_file).context("read psi4 driver results")?;
        let out = serde_json::from_str(&txt).with_context(|| format!("invalid psi4 driver results: {:?}", result_file))?;

        self.ncalls += 1;
        Ok(out)
    }
}
// 50a738a3 ends here

// [[file:../../psi4.note::*pub/methods][pub/methods:1]]
impl Psi4Process {
    /// Construct with python interpreter and scratch root found in model
    /// directory's `.env` file (PSI4_PYTHON, PSI4_SCR_DIR).
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let (python, scr_dir) = crate::params::engine_settings(dir.as_ref()).context("Initialize Psi4Process failure.")?;
        let mut engine = Self::default();
        if let Some(python) = python {
            engine.python = python;
        }
        engine.scr_dir = scr_dir;
        Ok(engine)
    }

    /// Set the python interpreter used to import psi4.
    pub fn with_python(mut self, python: &str) -> Self {
        self.python = python.into();
        self
    }

    /// keep scratch files for user inspection of failure.
    pub fn keep_scratch_files(&mut self, keep: bool) {
        self.keep_scratch = keep;
    }

    /// Return the number of engine calls
    pub fn number_of_evaluations(&self) -> usize {
        self.ncalls
    }
}

impl Engine for Psi4Process {
    fn run(&mut self, job: &Job) -> Result<EngineOutput> {
        self.submit_job(job)
    }

    fn reset(&mut self) -> Result<()> {
        if let Some(tdir) = self.temp_dir.take() {
            if self.keep_scratch {
                let path = tdir.into_path();
                info!("Directory for scratch files: {}", path.display());
            } else {
                trace!("remove scratch directory: {:?}", tdir.path());
                tdir.close().context("remove psi4 scratch directory")?;
            }
        }
        Ok(())
    }
}
// pub/methods:1 ends here

// [[file:../../psi4.note::*test][test:1]]
#[test]
fn test_psi4_process() -> Result<()> {
    let mut engine = Psi4Process::from_dir("tests/files/psi4-model")?;
    assert_eq!(engine.python, "python3");

    let wrk_dir = engine.prepare_compute_env()?;
    assert!(wrk_dir.join("driver.py").exists());
    // reuse the same directory until reset
    assert_eq!(wrk_dir, engine.prepare_compute_env()?);

    engine.reset()?;
    assert!(!wrk_dir.exists());
    assert!(engine.temp_dir.is_none());

    Ok(())
}

#[test]
fn test_psi4_process_failure() -> Result<()> {
    // `false` exits with failure status
    let mut engine = Psi4Process::default().with_python("false");
    let job = Job::default();
    assert!(engine.run(&job).is_err());
    assert_eq!(engine.number_of_evaluations(), 0);
    engine.reset()?;

    Ok(())
}
// test:1 ends here
