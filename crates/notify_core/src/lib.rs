//! notify_core - Shared configuration for the site-check notifier
//!
//! This crate provides the pieces every other crate in the workspace needs:
//! - `config` - endpoint URLs, credentials, token file location
//! - `paths` - default file locations

pub mod config;
pub mod paths;

pub use config::Config;
