pub mod app_config;
mod config;
pub mod record;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use record::{column_order, FieldValue, Record, BASE_COLUMNS, DETAIL_COLUMNS, IDENTITY_FIELD};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
