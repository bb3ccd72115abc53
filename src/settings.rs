use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::error;

use crate::error::PipelineResult;

const CONFIG_FILE: &str = "qguide";
const ENV_PREFIX: &str = "QGUIDE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// One `.html` file per page in `raw_dir`
    Dir,
    /// Single SQLite database at `sqlite_path`
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub workers: i64,
    pub catalog: PathBuf,
    pub store: StoreKind,
    pub raw_dir: PathBuf,
    pub sqlite_path: PathBuf,
    pub output: PathBuf,
    pub attempt_timeout_secs: u64,
}

/// Values passed on the command line; each one wins over file and env.
#[derive(Debug, Default)]
pub struct Overrides {
    pub workers: Option<i64>,
    pub store: Option<StoreKind>,
    pub output: Option<PathBuf>,
}

impl Settings {
    /// Defaults, then `qguide.toml` (optional), then `QGUIDE_*` env vars, then CLI overrides.
    pub fn load(overrides: &Overrides) -> PipelineResult<Self> {
        let store = overrides.store.map(|s| match s {
            StoreKind::Dir => "dir",
            StoreKind::Sqlite => "sqlite",
        });
        let output = overrides
            .output
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());

        let settings = Config::builder()
            .set_default("workers", WorkerCount::DEFAULT as i64)?
            .set_default("catalog", "courses.csv")?
            .set_default("store", "dir")?
            .set_default("raw_dir", "raw_data/qguides")?
            .set_default("sqlite_path", "raw_data/qguides.sqlite")?
            .set_default("output", "courses_data.csv")?
            .set_default("attempt_timeout_secs", 60)?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .set_override_option("workers", overrides.workers)?
            .set_override_option("store", store)?
            .set_override_option("output", output)?
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn worker_count(&self) -> WorkerCount {
        WorkerCount::new(self.workers)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }
}

/// Fetch pool size, always within `MIN..=MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerCount(usize);

impl WorkerCount {
    pub const MIN: usize = 5;
    pub const MAX: usize = 15;
    pub const DEFAULT: usize = 5;

    /// Out-of-range requests log an error and fall back to `DEFAULT`.
    pub fn new(requested: i64) -> Self {
        match usize::try_from(requested) {
            Ok(n) if (Self::MIN..=Self::MAX).contains(&n) => WorkerCount(n),
            _ => {
                error!(
                    "Invalid worker count {} (expected {}-{}). Continuing with {} workers.",
                    requested,
                    Self::MIN,
                    Self::MAX,
                    Self::DEFAULT
                );
                WorkerCount(Self::DEFAULT)
            }
        }
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for WorkerCount {
    fn default() -> Self {
        WorkerCount(Self::DEFAULT)
    }
}

// ── Tests ──
