//! Process-level plumbing shared by the server binary and modules:
//! layered configuration, logging, home directory resolution and
//! OS signal handling.

pub mod config;
pub mod home_dir;
pub mod logging;
pub mod shutdown;

pub use config::{
    default_logging_config, AppConfig, CliArgs, DatabaseConfig, LoggingConfig, Section,
    ServerConfig,
};
pub use shutdown::wait_for_shutdown;
