//! Tiffin checkout application: backend gateway, checkout session,
//! configuration and logging.

pub mod api;
pub mod checkout;
pub mod config;
pub mod context;
pub mod logging;
pub mod session;

#[cfg(test)]
mod test;
