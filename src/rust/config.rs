use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use log::warn;
use serde::Serialize;

use crate::classifier::DEFAULT_ALPHA;

/// Base directory for every relative pipeline path.
pub const HOME_ENV: &str = "SPAMGUARD_HOME";
/// Overrides the artifact location.
pub const MODEL_PATH_ENV: &str = "SPAMGUARD_MODEL_PATH";
/// Overrides the prediction service bind address.
pub const BIND_ENV: &str = "SPAMGUARD_BIND";

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_TEST_RATIO: f64 = 0.2;
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_PROBE: &str = "Invest in Bitcoin today for huge returns. Crypto is the future.";

/// Fixed paths and hyperparameters shared by every pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineConfig {
    pub raw_data_path: PathBuf,
    pub processed_dir: PathBuf,
    pub model_path: PathBuf,
    pub metrics_path: PathBuf,
    /// Where the training report is written, if anywhere.
    pub report_path: Option<PathBuf>,
    pub seed: u64,
    pub test_ratio: f64,
    pub validation_ratio: f64,
    pub alpha: f64,
    pub bind_addr: SocketAddr,
    /// Phrases classified and logged after training.
    pub probe_phrases: Vec<String>,
    /// Terms whose frequency in the training data is logged before fitting.
    pub check_terms: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_data_path: PathBuf::from("data/spam.csv"),
            processed_dir: PathBuf::from("data/processed"),
            model_path: PathBuf::from("models/model.bin"),
            metrics_path: PathBuf::from("metrics.json"),
            report_path: None,
            seed: DEFAULT_SEED,
            test_ratio: DEFAULT_TEST_RATIO,
            validation_ratio: DEFAULT_TEST_RATIO,
            alpha: DEFAULT_ALPHA,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            probe_phrases: vec![DEFAULT_PROBE.to_string()],
            check_terms: vec!["bitcoin".to_string()],
        }
    }
}

impl PipelineConfig {
    /// Default configuration with environment overrides applied.
    ///
    /// 1. `SPAMGUARD_HOME` re-roots every relative path
    /// 2. `SPAMGUARD_MODEL_PATH` replaces the artifact path
    /// 3. `SPAMGUARD_BIND` replaces the bind address (ignored with a warning if unparsable)
    pub fn from_env() -> Self {
        Self::from_env_with_home(None)
    }

    /// Like [`from_env`](Self::from_env), but an explicit `home` takes precedence over `SPAMGUARD_HOME`.
    pub fn from_env_with_home(home: Option<&Path>) -> Self {
        let mut config = Self::default();

        let home = home.map(Path::to_path_buf).or_else(|| env::var(HOME_ENV).ok().map(PathBuf::from));
        if let Some(home) = home {
            config = config.with_base_dir(home);
        }
        if let Ok(path) = env::var(MODEL_PATH_ENV) {
            config.model_path = PathBuf::from(path);
        }
        if let Ok(addr) = env::var(BIND_ENV) {
            match addr.parse() {
                Ok(addr) => config.bind_addr = addr,
                Err(e) => warn!("Ignoring {}={:?}: {}", BIND_ENV, addr, e),
            }
        }

        config
    }

    /// Resolves every relative path against `base`.
    pub fn with_base_dir<P: AsRef<Path>>(mut self, base: P) -> Self {
        let base = base.as_ref();
        let rebase = |p: &Path| if p.is_relative() { base.join(p) } else { p.to_path_buf() };
        self.raw_data_path = rebase(&self.raw_data_path);
        self.processed_dir = rebase(&self.processed_dir);
        self.model_path = rebase(&self.model_path);
        self.metrics_path = rebase(&self.metrics_path);
        self.report_path = self.report_path.as_deref().map(rebase);
        self
    }

    pub fn train_path(&self) -> PathBuf {
        self.processed_dir.join("train.csv")
    }

    pub fn test_path(&self) -> PathBuf {
        self.processed_dir.join("test.csv")
    }
}
