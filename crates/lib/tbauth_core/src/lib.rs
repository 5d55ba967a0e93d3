//! # tbauth_core
//!
//! Authentication core for the tbauth login gateway: key set cache, token
//! verification, identity resolution, user lookup and session minting.

pub mod auth;
pub mod db;
pub mod models;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
