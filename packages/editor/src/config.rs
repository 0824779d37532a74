//! Drag engine configuration
//!
//! Every field has a default, so a partial `folio.config.json` only needs
//! the values it overrides.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DragConfig {
    /// Drop indicator thickness before view scaling
    pub indicator_thickness: f64,

    /// Left inset of the "nest into list item" indicator
    pub nest_indent: f64,

    /// Height of the auto-scroll band at the top and bottom of the scroll container
    pub scroll_edge_band: f64,

    /// Auto-scroll distance per tick with the pointer at (or past) the edge
    pub scroll_max_speed: f64,

    /// Size of a note synthesized by a canvas drop
    pub note_width: f64,
    pub note_height: f64,

    /// Offset of a synthesized note's origin from the drop point
    pub drop_offset_x: f64,
    pub drop_offset_y: f64,

    /// Image size used when the image carries no intrinsic size
    pub image_fallback_size: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            indicator_thickness: 3.0,
            nest_indent: 26.0,
            scroll_edge_band: 50.0,
            scroll_max_speed: 20.0,
            note_width: 800.0,
            note_height: 92.0,
            drop_offset_x: 30.0,
            drop_offset_y: 40.0,
            image_fallback_size: 100.0,
        }
    }
}
