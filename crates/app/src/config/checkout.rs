//! Checkout Config

use std::time::Duration;

use clap::Args;

use crate::checkout::CheckoutSettings;

/// Checkout behaviour settings.
#[derive(Debug, Args)]
pub struct CheckoutConfig {
    /// How long to wait for a shipping fee before charging the default fee,
    /// in milliseconds.
    #[arg(
        long,
        env = "TIFFIN_SHIPPING_TIMEOUT_MS",
        default_value_t = 5_000_u64,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub shipping_timeout_ms: u64,
}

impl From<&CheckoutConfig> for CheckoutSettings {
    fn from(config: &CheckoutConfig) -> Self {
        Self {
            shipping_timeout: Duration::from_millis(config.shipping_timeout_ms),
        }
    }
}
