//! Storeman Core - Shared types and configuration for the bridge ops tooling
//!
//! This crate provides:
//! - The error taxonomy every tool and SDK maps into
//! - Explicit analyzer configuration (networks, keyword tables, endpoints)
//! - Small domain helpers (absent sentinel, query time ranges)

pub mod config;
pub mod domain;
pub mod error;

pub use config::{
    AnalyzerConfig, ChainSide, KeywordSets, LogSearchConfig, NetworkConfig, ResolverConfig,
};
pub use domain::*;
pub use error::{Result, StoremanError};
