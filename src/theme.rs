//! Centralized color theme for the application.
//!
//! This module provides all colors used by the map overlays and the egui UI.
//! Modify values here to change the application's color scheme.

use bevy::prelude::Color;
use bevy_egui::egui;

// ============================================================================
// Map Background
// ============================================================================

/// Clear color behind the graticule
pub const MAP_BACKGROUND: Color = Color::srgb(0.11, 0.13, 0.16);

/// Semi-transparent grey graticule lines
pub const GRATICULE_COLOR: Color = Color::srgba(0.5, 0.5, 0.5, 0.3);

/// Equator and prime meridian
pub const GRATICULE_MAJOR_COLOR: Color = Color::srgba(0.6, 0.6, 0.6, 0.6);

/// Center crosshair shown in center-follow mode
pub const CROSSHAIR_COLOR: Color = Color::srgba(1.0, 1.0, 1.0, 0.9);

// ============================================================================
// Drawing Colors
// ============================================================================

/// Orange dashed line for the refuge being drawn
pub const DRAWING_LINE: Color = Color::srgb(1.0, 0.596, 0.0);

/// Orange fill for the closed-ring preview
pub const DRAWING_PREVIEW_FILL: Color = Color::srgba(1.0, 0.596, 0.0, 0.25);

/// Marker on the first vertex
pub const FIRST_VERTEX_MARKER: Color = Color::srgb(1.0, 0.596, 0.0);

/// White rim around the first vertex marker
pub const FIRST_VERTEX_RIM: Color = Color::WHITE;

// ============================================================================
// Saved Refuge Colors
// ============================================================================

/// Green outline for persisted refuges
pub const SAVED_REFUGE_OUTLINE: Color = Color::srgb(0.298, 0.686, 0.314);

/// Light green fill for persisted refuges
pub const SAVED_REFUGE_FILL: Color = Color::srgba(0.298, 0.686, 0.314, 0.2);

/// Pathlines loaded from the store
pub const PATHLINE: Color = Color::srgb(0.129, 0.588, 0.953);

// ============================================================================
// UI Colors (egui)
// ============================================================================

pub mod ui {
    use bevy_egui::egui;

    /// Orange "DRAWING" status indicator
    pub const DRAWING_ACTIVE: egui::Color32 = egui::Color32::from_rgb(255, 152, 0);

    /// Dark grey panel background (toolbar)
    pub const PANEL_BACKGROUND: egui::Color32 = egui::Color32::from_rgb(45, 45, 48);

    /// Light grey for label text
    pub const LABEL_TEXT: egui::Color32 = egui::Color32::LIGHT_GRAY;

    /// Grey for help/hint text
    pub const HINT_TEXT: egui::Color32 = egui::Color32::GRAY;

    /// Red for error messages
    pub const ERROR_TEXT: egui::Color32 = egui::Color32::RED;

    /// Semi-transparent black behind refuge labels
    pub const LABEL_BACKGROUND: egui::Color32 = egui::Color32::from_black_alpha(160);
}

// ============================================================================
// Color Conversion Utilities
// ============================================================================

/// Convert a Bevy Color to egui Color32 (preserving alpha)
pub fn bevy_to_egui(color: Color) -> egui::Color32 {
    let srgba = color.to_srgba();
    egui::Color32::from_rgba_unmultiplied(
        (srgba.red * 255.0) as u8,
        (srgba.green * 255.0) as u8,
        (srgba.blue * 255.0) as u8,
        (srgba.alpha * 255.0) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bevy_to_egui_preserves_alpha() {
        let c = bevy_to_egui(Color::srgba(1.0, 0.0, 0.0, 0.5));
        assert_eq!(c.to_srgba_unmultiplied(), [255, 0, 0, 127]);
    }

    #[test]
    fn test_drawing_line_is_orange() {
        let c = bevy_to_egui(DRAWING_LINE);
        assert_eq!(c, egui::Color32::from_rgb(255, 151, 0));
    }
}
