//! Core types and definitions for the overwatch terrain engine.
//!
//! This crate defines the vocabulary shared across all other crates:
//! geometric types, overlay records, result records, configuration,
//! errors, and constants. It performs no terrain math of its own.

pub mod components;
pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod state;
pub mod types;

pub use error::{Result, TerrainError};
