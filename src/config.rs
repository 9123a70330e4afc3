use std::path::PathBuf;

use crate::practice::weighting::WeightingConfig;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub log_level: String,
    /// Daily log files go here when set.
    pub log_dir: Option<PathBuf>,
    pub data_dir: PathBuf,
    pub user_id: String,
    /// Fixed RNG seed for reproducible sessions.
    pub seed: Option<u64>,
    /// Strategy key for a remedial session.
    pub focus: Option<String>,
    pub weighting: WeightingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
            data_dir: default_data_dir(),
            user_id: "local".to_string(),
            seed: None,
            focus: None,
            weighting: WeightingConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let log_level = std::env::var("RUST_LOG").unwrap_or(defaults.log_level);

        let data_dir = std::env::var("MATH_DRILL_DATA_DIR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        // file logs default to a folder beside the profiles
        let log_dir = file_logging_enabled().then(|| {
            std::env::var("LOG_DIR")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join("logs"))
        });

        let user_id = std::env::var("MATH_DRILL_USER")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.user_id);

        let seed = std::env::var("MATH_DRILL_SEED")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok());

        let focus = std::env::var("MATH_DRILL_FOCUS")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Self {
            log_level,
            log_dir,
            data_dir,
            user_id,
            seed,
            focus,
            weighting: defaults.weighting,
        }
    }
}

fn file_logging_enabled() -> bool {
    std::env::var("ENABLE_FILE_LOGS")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("mental-math-drill"))
        .unwrap_or_else(|| PathBuf::from("./data"))
}
