//! Session context
//!
//! The bearer token and role are set at login, read by every authenticated
//! request, and cleared at logout or when the backend answers 401/403. The
//! session is passed explicitly to the HTTP gateway rather than read from
//! ambient storage.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Account role as reported by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Ordering customer
    Customer,

    /// Restaurant owner
    Merchant,

    /// Platform administrator
    Admin,
}

/// An authenticated (or signed-out) API session.
#[derive(Clone)]
pub struct Session {
    base_url: String,
    token: Option<Zeroizing<String>>,
    role: Option<Role>,
}

impl Session {
    /// A signed-out session against `base_url`.
    #[must_use]
    pub fn anonymous(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            token: None,
            role: None,
        }
    }

    /// A session authenticated with `token`.
    #[must_use]
    pub fn authenticated(base_url: impl Into<String>, token: String, role: Option<Role>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            token: Some(Zeroizing::new(token)),
            role,
        }
    }

    /// Backend base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bearer token, if signed in
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().map(String::as_str)
    }

    /// Role, if known
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Whether a token is held.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Forget the token and role. The token memory is zeroed on drop.
    pub fn clear(&mut self) {
        self.token = None;
        self.role = None;
    }

    /// Join `path` onto the base URL.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("role", &self.role)
            .finish()
    }
}

fn normalize_base_url(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }

    url
}
