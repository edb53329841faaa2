//! Block, category, and parameter prototypes
//!
//! These are the data shapes an extension hands to the host during `on_init`
//! to register UI-visible blocks. Rendering and execution of blocks belong to
//! the block editor and the VM; the host only carries the declarations.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Shape of a block as it appears in the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Command = 1,
    Reporter = 2,
    Boolean = 3,
    Branch = 4,
    Hat = 5,
}

/// Parameter slot types accepted by blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    Number = 1,
    String = 2,
    Boolean = 3,
    Color = 5,
    Matrix = 6,
    Note = 7,
    Angle = 8,
    Image = 99,
}

/// A block declaration registered by an extension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockPrototype {
    /// Globally unique opcode, conventionally `<extension id>.<name>`
    pub opcode: String,

    /// Block shape
    #[serde(rename = "type")]
    pub block_type: BlockType,

    /// Optional display flags
    #[serde(default)]
    pub option: Option<BlockOption>,

    /// Named parameter slots
    #[serde(default)]
    pub param: HashMap<String, ParameterPrototype>,

    /// Localization key for the block's label
    pub message_id: String,

    /// Category the block is listed under
    pub category_id: String,
}

/// Display flags for a block
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BlockOption {
    /// Block terminates its stack (no connection below)
    #[serde(default)]
    pub terminal: bool,

    /// Reporter value can be shown on the stage as a monitor
    #[serde(default)]
    pub monitor: bool,
}

/// A parameter slot declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterPrototype {
    /// Slot type
    #[serde(rename = "type")]
    pub parameter_type: ParameterType,

    /// Default value shown in the slot
    #[serde(default)]
    pub default: Option<serde_json::Value>,

    /// Dropdown menu items, if the slot is a menu
    #[serde(default)]
    pub menu: Option<Vec<MenuItemPrototype>>,

    /// Render as an inline field rather than an input socket
    #[serde(default)]
    pub field: bool,

    /// Shadow block shown when the slot is empty
    #[serde(default)]
    pub shadow: Option<ShadowPrototype>,
}

/// One entry of a dropdown menu
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemPrototype {
    /// Localization key for the entry's label
    pub message_id: String,

    /// Value reported when the entry is selected
    pub value: serde_json::Value,
}

/// Shadow block declaration for an empty parameter slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowPrototype {
    /// Shadow block type, e.g. `math_number`
    #[serde(rename = "type")]
    pub shadow_type: String,

    /// Field inside the shadow block holding the value
    pub field_name: String,
}

impl ShadowPrototype {
    fn well_known(shadow_type: &str, field_name: &str) -> Self {
        Self {
            shadow_type: shadow_type.to_string(),
            field_name: field_name.to_string(),
        }
    }

    pub fn angle() -> Self {
        Self::well_known("math_angle", "NUM")
    }

    pub fn color() -> Self {
        Self::well_known("colour_picker", "COLOUR")
    }

    pub fn number() -> Self {
        Self::well_known("math_number", "NUM")
    }

    pub fn string() -> Self {
        Self::well_known("text", "TEXT")
    }

    pub fn matrix() -> Self {
        Self::well_known("matrix", "MATRIX")
    }

    pub fn note() -> Self {
        Self::well_known("note", "NOTE")
    }
}

/// A block category registered by an extension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPrototype {
    /// Unique category id
    pub category_id: String,

    /// Localization key for the category's label
    pub message_id: String,

    /// Category color as a CSS hex string
    pub color: String,
}
