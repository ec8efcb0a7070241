//! Application configuration

use clap::Args;

use crate::config::{api::ApiConfig, checkout::CheckoutConfig, logging::LoggingConfig};

pub mod api;
pub mod checkout;
pub mod logging;

/// Tiffin application configuration, read from flags, the environment and
/// an optional `.env` file.
#[derive(Debug, Args)]
pub struct AppConfig {
    /// Backend connection settings.
    #[command(flatten)]
    pub api: ApiConfig,

    /// Checkout behaviour settings.
    #[command(flatten)]
    pub checkout: CheckoutConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}
