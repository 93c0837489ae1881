//! Running inside an embedding host (kiosk shell, mobile wrapper).
//!
//! An embedded host places vertices with a fixed center crosshair instead of
//! taps, owns double-tap for its own "select center" action, and never lets
//! the map zoom on double click. The drawing session borrows double-tap
//! through the shared [`GestureClaim`].

use bevy::math::DVec2;
use bevy::prelude::*;

use super::input::MapInput;
use super::view::{MapEventKind, MapView};
use super::MapCanvas;
use crate::config::{AppConfig, InputModePreference};
use crate::constants::{CENTER_SELECTION_PRECISION, ENV_HOST_EMBEDDED};
use crate::drawing::{GestureClaim, InputMode};
use crate::geo::Vertex;

#[derive(Resource, Debug, Clone)]
pub struct HostEnvironment {
    pub embedded: bool,
    /// Shared with every drawing session
    pub gestures: GestureClaim,
}

impl HostEnvironment {
    pub fn new(embedded: bool) -> Self {
        Self {
            embedded,
            gestures: GestureClaim::new(),
        }
    }

    /// Resolve the configured placement preference against this host
    pub fn input_mode(&self, preference: InputModePreference) -> InputMode {
        match preference {
            InputModePreference::Tap => InputMode::Tap,
            InputModePreference::CenterFollow => InputMode::CenterFollow,
            InputModePreference::Auto if self.embedded => InputMode::CenterFollow,
            InputModePreference::Auto => InputMode::Tap,
        }
    }
}

/// Interpret the embedding environment variable
pub fn is_embedded_value(value: Option<&str>) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) => !v.is_empty() && v != "0" && v != "false",
        None => false,
    }
}

/// The host's double-tap action fired: the map zoomed in on its center
#[derive(Message, Debug, Clone, Copy)]
pub struct CenterDoubleTap {
    pub at: Vertex,
    /// Container pixel of `at`
    pub pixel: DVec2,
}

/// Coordinate currently under the crosshair
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct CenterSelection {
    pub selected: Option<Vertex>,
}

impl CenterSelection {
    pub fn rounded(&self) -> Option<Vertex> {
        self.selected
            .map(|v| v.rounded(CENTER_SELECTION_PRECISION))
    }
}

/// Startup: apply the home view and detect the host
pub fn detect_host_environment(
    mut commands: Commands,
    config: Res<AppConfig>,
    mut canvas: ResMut<MapCanvas>,
) {
    let home = config.data.home_view;
    canvas.set_view(Vertex::new(home.lat, home.lng), home.zoom);

    let embedded = is_embedded_value(std::env::var(ENV_HOST_EMBEDDED).ok().as_deref());
    if embedded {
        canvas.set_double_click_zoom(false);
    }

    let host = HostEnvironment::new(embedded);
    info!(
        "Host environment: embedded={}, placement={}",
        embedded,
        host.input_mode(config.data.input_mode).display_name()
    );
    commands.insert_resource(host);
}

/// The host's own double-tap handler. Skipped while a drawing session
/// claims double-tap.
pub fn host_center_double_action(
    mut inputs: MessageReader<MapInput>,
    host: Res<HostEnvironment>,
    mut canvas: ResMut<MapCanvas>,
    mut taps: MessageWriter<CenterDoubleTap>,
) {
    for input in inputs.read() {
        if input.kind() != MapEventKind::DoubleClick {
            continue;
        }
        if host.gestures.is_claimed() {
            debug!("Double tap claimed by drawing session");
            continue;
        }

        canvas.zoom_by(1.0);
        let at = canvas.center();
        taps.write(CenterDoubleTap {
            at,
            pixel: canvas.latlng_to_container_point(at),
        });
    }
}

pub fn log_center_double_taps(mut taps: MessageReader<CenterDoubleTap>) {
    for tap in taps.read() {
        info!(
            "Center selected at {} (pixel {:.0}, {:.0})",
            tap.at.rounded(CENTER_SELECTION_PRECISION),
            tap.pixel.x,
            tap.pixel.y
        );
    }
}

pub fn update_center_selection(canvas: Res<MapCanvas>, mut selection: ResMut<CenterSelection>) {
    let center = canvas.center();
    if selection.selected != Some(center) {
        selection.selected = Some(center);
    }
}

/// Return to the configured home view
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct ResetViewRequest;

pub fn reset_view_system(
    config: Res<AppConfig>,
    mut canvas: ResMut<MapCanvas>,
    mut inputs: MessageWriter<MapInput>,
) {
    let home = config.data.home_view;
    canvas.set_view(Vertex::new(home.lat, home.lng), home.zoom);
    inputs.write(MapInput::Moved);
    inputs.write(MapInput::ZoomEnd);
}

/// Run condition for host-only systems
pub fn host_is_embedded(host: Option<Res<HostEnvironment>>) -> bool {
    host.is_some_and(|h| h.embedded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_values() {
        assert!(!is_embedded_value(None));
        assert!(!is_embedded_value(Some("")));
        assert!(!is_embedded_value(Some("0")));
        assert!(!is_embedded_value(Some("False")));
        assert!(is_embedded_value(Some("1")));
        assert!(is_embedded_value(Some("true")));
    }

    #[test]
    fn test_input_mode_resolution() {
        let host = HostEnvironment::new(true);
        let desktop = HostEnvironment::new(false);

        assert_eq!(host.input_mode(InputModePreference::Auto), InputMode::CenterFollow);
        assert_eq!(desktop.input_mode(InputModePreference::Auto), InputMode::Tap);
        assert_eq!(host.input_mode(InputModePreference::Tap), InputMode::Tap);
        assert_eq!(
            desktop.input_mode(InputModePreference::CenterFollow),
            InputMode::CenterFollow
        );
    }

    #[test]
    fn test_center_selection_rounding() {
        let selection = CenterSelection {
            selected: Some(Vertex::new(20.123456789, 78.987654321)),
        };
        assert_eq!(selection.rounded(), Some(Vertex::new(20.123457, 78.987654)));
        assert_eq!(CenterSelection::default().rounded(), None);
    }
}
