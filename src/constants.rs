//! Centralized constants used across the application.
//!
//! This module contains magic numbers and configuration values that are used
//! in multiple places or would benefit from being named constants.

/// Default window width in pixels (also the initial viewport width)
pub const DEFAULT_WINDOW_WIDTH: f32 = 1600.0;

/// Default window height in pixels (also the initial viewport height)
pub const DEFAULT_WINDOW_HEIGHT: f32 = 900.0;

// Map view

/// Initial map center (India) and zoom
pub const DEFAULT_HOME_LAT: f64 = 20.5937;
pub const DEFAULT_HOME_LNG: f64 = 78.9629;
pub const DEFAULT_HOME_ZOOM: f64 = 5.0;

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 19.0;

/// Pixel-unit wheel scroll needed for one zoom level (touchpads)
pub const WHEEL_PIXELS_PER_ZOOM_LEVEL: f32 = 120.0;

// Pointer input

/// A press that moves further than this is a drag, not a click
pub const CLICK_DRAG_TOLERANCE_PX: f32 = 4.0;

/// Second click within this window counts as a double click
pub const DOUBLE_CLICK_WINDOW_SECS: f64 = 0.3;

/// Second click within this distance of the first counts as a double click
pub const DOUBLE_CLICK_RADIUS_PX: f32 = 8.0;

/// Hit radius for interactive markers
pub const MARKER_HIT_RADIUS_PX: f32 = 10.0;

// Drawing

/// Close gestures within this distance of the first vertex close the ring
pub const DEFAULT_CLOSE_THRESHOLD_METERS: f64 = 25.0;

/// Precision used when reporting the selected map center to a host
pub const CENTER_SELECTION_PRECISION: i32 = 6;

// Store

pub const DEFAULT_REFUGE_TABLE: &str = "refuges";
pub const DEFAULT_INSERT_FUNCTION: &str = "insert_refuge";
pub const DEFAULT_PATHLINES_TABLE: &str = "pathlines";

/// Environment overrides for the REST backend
pub const ENV_STORE_URL: &str = "REFUGEMAP_STORE_URL";
pub const ENV_STORE_KEY: &str = "REFUGEMAP_STORE_KEY";

/// Set (to anything but `0`/`false`) when running inside an embedding host
pub const ENV_HOST_EMBEDDED: &str = "REFUGEMAP_HOST_EMBEDDED";
