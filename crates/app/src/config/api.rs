//! Backend API Config

use std::time::Duration;

use clap::Args;

/// Backend connection settings.
#[derive(Debug, Args)]
pub struct ApiConfig {
    /// Backend base URL
    #[arg(long, env = "TIFFIN_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Bearer token from a previous `login`
    #[arg(long, env = "TIFFIN_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Per-request HTTP timeout in seconds.
    #[arg(
        long,
        env = "TIFFIN_HTTP_TIMEOUT_SECONDS",
        default_value_t = 30_u64,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub http_timeout_seconds: u64,
}

impl ApiConfig {
    /// HTTP request timeout.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }
}
