//! Core types, configuration, and error handling for Vigil.
//!
//! This crate provides the shared foundation used by the review pipeline:
//! - [`VigilError`] — unified error type using `thiserror`
//! - [`VigilConfig`] — configuration loaded from `.vigil.toml`
//! - Shared types: [`ChangedFile`], [`FileStatus`], [`Finding`],
//!   [`AnchorMode`], [`Strategy`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{GithubConfig, ModelConfig, ReviewConfig, VigilConfig};
pub use error::VigilError;
pub use types::{AnchorMode, ChangedFile, FileStatus, Finding, OutputFormat, Strategy};

/// A convenience `Result` type for Vigil operations.
pub type Result<T> = std::result::Result<T, VigilError>;
