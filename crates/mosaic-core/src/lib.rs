//! # mosaic-core
//!
//! Core library for the Mosaic extension host providing:
//! - Type definitions for extensions, blocks, and settings schemas
//! - The shared error taxonomy with stable numeric codes
//!
//! The executable host behavior (registry, dependency resolution, lifecycle
//! orchestration, migration) lives in `mosaic-extensions`.

pub mod error;
pub mod types;

pub use error::{Error, Result, ERROR_CIRCULAR_REQUIREMENT, ERROR_UNAVAILABLE_EXTENSION};
