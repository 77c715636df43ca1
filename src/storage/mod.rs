//! Storage layer for sqlr-cli
//!
//! Handles configuration profiles (TOML) and bearer-token persistence in the
//! OS keyring.

use crate::error::StorageError;

pub mod config;
pub mod credentials;

type Result<T> = std::result::Result<T, StorageError>;
