use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    #[serde(default)]
    pub worker: WorkerSettings,
    #[serde(default)]
    pub ledger: LedgerSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "ledgerflow.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
            worker: WorkerSettings::default(),
            ledger: LedgerSettings::default(),
        }
    }
}

/// Recovery worker settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorkerSettings {
    pub scan_interval_secs: u64,
    pub stale_threshold_secs: u64,
    pub batch_size: usize,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            scan_interval_secs: 30,
            stale_threshold_secs: 60,
            batch_size: 100,
        }
    }
}

/// Demo mock-ledger settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LedgerSettings {
    /// Seed for the mock ledger's outcome distribution.
    pub seed: u64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        serde_yaml::from_str(&content).expect("Failed to parse config yaml")
    }

    /// Like [`load`], but falls back to defaults when no config file
    /// exists for the environment.
    ///
    /// [`load`]: AppConfig::load
    pub fn load_or_default(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        match fs::read_to_string(&config_path) {
            Ok(content) => serde_yaml::from_str(&content).expect("Failed to parse config yaml"),
            Err(_) => Self::default(),
        }
    }
}
