//! Common test utilities for mosaic-extensions
//!
//! Shared infrastructure for the integration suites:
//! - Metadata builders for wiring dependency graphs
//! - Recording extensions and loaders that log every hook call
//! - Assertion helpers over load plans and call logs

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod assertions;
pub mod builders;
pub mod test_extensions;

pub use assertions::*;
pub use builders::*;
pub use test_extensions::*;
