//! Utilities Module
//!
//! Structured logging and crate configuration.

pub mod config;
pub mod logging;

pub use config::{ChainSettings, LoggingSettings, NativeAsset, ResourceSettings, SigningSettings, TxKitConfig};
