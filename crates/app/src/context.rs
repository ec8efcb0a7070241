//! App Context

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use crate::{
    api::{ApiError, CheckoutApi, HttpCheckoutApi},
    checkout::CheckoutSettings,
    config::AppConfig,
    session::Session,
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to build HTTP client")]
    Http(#[source] ApiError),
}

#[derive(Debug, Clone)]
pub struct AppContext {
    pub api: Arc<HttpCheckoutApi>,
    pub settings: CheckoutSettings,
}

impl AppContext {
    /// Build application context from configuration.
    ///
    /// The session is authenticated when a token is configured.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppInitError> {
        let session = match config.api.api_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => {
                Session::authenticated(config.api.api_url.as_str(), token.to_string(), None)
            }
            _ => Session::anonymous(config.api.api_url.as_str()),
        };

        let api = HttpCheckoutApi::new(Arc::new(RwLock::new(session)), config.api.http_timeout())
            .map_err(AppInitError::Http)?;

        Ok(Self {
            api: Arc::new(api),
            settings: CheckoutSettings::from(&config.checkout),
        })
    }

    /// The gateway as a [`CheckoutApi`] trait object.
    pub fn checkout_api(&self) -> Arc<dyn CheckoutApi> {
        self.api.clone()
    }
}
