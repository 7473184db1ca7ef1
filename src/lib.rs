//! Settings Resolver Library
//!
//! Merges packaged defaults, user settings and environment-substituted
//! overrides into one immutable [`config::Settings`] value.

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
