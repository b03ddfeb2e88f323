//! Runtime settings

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Settings file looked up in the working directory.
pub const CONFIG_FILE: &str = "bigmart.toml";

/// Prefix of the environment overrides, e.g. `BIGMART_MODEL_PATH`.
pub const ENV_PREFIX: &str = "BIGMART_";

/// File locations used by the train and test runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub train_input: PathBuf,
    pub test_input: PathBuf,
    pub train_prepared: PathBuf,
    pub test_prepared: PathBuf,
    pub predictions: PathBuf,
    pub model_path: PathBuf,
    /// Log to this file instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            train_input: PathBuf::from("data/Train_BigMart.csv"),
            test_input: PathBuf::from("data/Test_BigMart.csv"),
            train_prepared: PathBuf::from("data/Transformed/Train_BigMart_Prepared.csv"),
            test_prepared: PathBuf::from("data/Transformed/Test_BigMart_Prepared.csv"),
            predictions: PathBuf::from("data/Test_BigMart_Predictions.csv"),
            model_path: PathBuf::from("model/model.json"),
            log_file: None,
        }
    }
}

impl Settings {
    /// Defaults, then `bigmart.toml` from the working directory, then `BIGMART_*`.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(config_file: &Path) -> Result<Self, Box<figment::Error>> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if config_file.exists() {
            figment = figment.merge(Toml::file(config_file));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX));
        figment.extract().map_err(Box::new)
    }

    /// Relocates every relative path under `root`.
    pub fn rooted_at(mut self, root: &Path) -> Self {
        for path in [
            &mut self.train_input,
            &mut self.test_input,
            &mut self.train_prepared,
            &mut self.test_prepared,
            &mut self.predictions,
            &mut self.model_path,
        ] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
        if let Some(log_file) = self.log_file.as_mut() {
            if log_file.is_relative() {
                *log_file = root.join(&*log_file);
            }
        }
        self
    }
}
