//! Type definitions for Mosaic extensions, blocks, and settings

mod block_types;
mod extension_types;
mod settings_types;

pub use block_types::*;
pub use extension_types::*;
pub use settings_types::*;
