//! lookport - export and import Looks between BI instances
//!
//! This crate provides the core functionality for the `lookport` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`content`] - Field projection, palette rewriting, identity resolution
//!   and upsert reconciliation
//! - [`api`] - Remote content store (trait, HTTP client, error decoration)
//! - [`model`] - Attribute mappings and field helpers
//! - [`output`] - Operator messages and JSON file output
//! - [`config`] - Connection settings
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod model;
pub mod output;

pub use error::{Error, Result};
