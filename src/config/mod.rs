use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_CLOSE_THRESHOLD_METERS, DEFAULT_HOME_LAT, DEFAULT_HOME_LNG, DEFAULT_HOME_ZOOM,
    DEFAULT_INSERT_FUNCTION, DEFAULT_PATHLINES_TABLE, DEFAULT_REFUGE_TABLE, ENV_STORE_KEY, ENV_STORE_URL,
};
use crate::store::DEFAULT_QUERY_LIMIT;

/// System set for config loading (other plugins can run after this)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigLoaded;

/// Which backend stores refuges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Disabled,
    #[default]
    Local,
    Rest,
}

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Base url of the REST backend (e.g. `https://xyz.supabase.co`)
    #[serde(default)]
    pub url: Option<String>,
    /// Anonymous API key sent as `apikey` and bearer token
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_table")]
    pub table: String,
    /// RPC that converts GeoJSON into the geometry column on insert
    #[serde(default = "default_insert_function")]
    pub insert_function: String,
    /// Table of LineString pathlines drawn under the refuges
    #[serde(default = "default_pathlines_table")]
    pub pathlines_table: String,
    /// File used by the local backend (defaults to `{data_dir}/refuges.json`)
    #[serde(default)]
    pub local_path: Option<PathBuf>,
    /// Values taken from the environment. Never written to `config.json`.
    #[serde(skip)]
    pub(crate) overrides: StoreOverrides,
}

/// Connection values supplied through the environment
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct StoreOverrides {
    url: Option<String>,
    api_key: Option<String>,
}

fn default_table() -> String {
    DEFAULT_REFUGE_TABLE.to_string()
}

fn default_insert_function() -> String {
    DEFAULT_INSERT_FUNCTION.to_string()
}

fn default_pathlines_table() -> String {
    DEFAULT_PATHLINES_TABLE.to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: None,
            api_key: None,
            table: default_table(),
            insert_function: default_insert_function(),
            pathlines_table: default_pathlines_table(),
            local_path: None,
            overrides: StoreOverrides::default(),
        }
    }
}

impl StoreSettings {
    pub fn local_file(&self) -> PathBuf {
        self.local_path
            .clone()
            .unwrap_or_else(crate::paths::local_store_file)
    }

    /// Remember `REFUGEMAP_STORE_URL` / `REFUGEMAP_STORE_KEY` for this run.
    /// They only take effect through [`StoreSettings::resolved`].
    pub(crate) fn apply_env_overrides(&mut self, url: Option<String>, key: Option<String>) {
        self.overrides = StoreOverrides { url, api_key: key };
    }

    /// Settings the store is opened with: environment values win over the
    /// file, and a complete url/key pair switches the backend to REST.
    pub fn resolved(&self) -> StoreSettings {
        let mut settings = self.clone();
        if let Some(url) = settings.overrides.url.take() {
            settings.url = Some(url);
        }
        if let Some(key) = settings.overrides.api_key.take() {
            settings.api_key = Some(key);
        }
        if settings.url.is_some()
            && settings.api_key.is_some()
            && settings.backend != StoreBackend::Disabled
        {
            settings.backend = StoreBackend::Rest;
        }
        settings
    }
}

/// How vertices are placed. `Auto` asks the host environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputModePreference {
    #[default]
    Auto,
    Tap,
    CenterFollow,
}

impl InputModePreference {
    pub fn display_name(&self) -> &'static str {
        match self {
            InputModePreference::Auto => "Auto",
            InputModePreference::Tap => "Tap",
            InputModePreference::CenterFollow => "Center crosshair",
        }
    }

    pub fn all() -> &'static [InputModePreference] {
        &[
            InputModePreference::Auto,
            InputModePreference::Tap,
            InputModePreference::CenterFollow,
        ]
    }
}

/// What happens to the drawn vertices when saving fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveFailurePolicy {
    /// Keep drawing with the same vertices so the operator can close again
    #[default]
    Retain,
    /// Drop the session entirely
    Discard,
}

/// Initial map position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HomeView {
    pub lat: f64,
    pub lng: f64,
    pub zoom: f64,
}

impl Default for HomeView {
    fn default() -> Self {
        Self {
            lat: DEFAULT_HOME_LAT,
            lng: DEFAULT_HOME_LNG,
            zoom: DEFAULT_HOME_ZOOM,
        }
    }
}

fn default_close_threshold() -> f64 {
    DEFAULT_CLOSE_THRESHOLD_METERS
}

fn default_query_limit() -> usize {
    DEFAULT_QUERY_LIMIT
}

/// Application configuration persisted to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfigData {
    #[serde(default)]
    pub store: StoreSettings,

    /// A close gesture within this many meters of the first vertex closes the ring
    #[serde(default = "default_close_threshold")]
    pub close_threshold_meters: f64,

    /// Page size when listing saved refuges
    #[serde(default = "default_query_limit")]
    pub query_limit: usize,

    #[serde(default)]
    pub input_mode: InputModePreference,

    #[serde(default)]
    pub save_failure: SaveFailurePolicy,

    #[serde(default)]
    pub home_view: HomeView,
}

impl Default for AppConfigData {
    fn default() -> Self {
        Self {
            store: StoreSettings::default(),
            close_threshold_meters: default_close_threshold(),
            query_limit: default_query_limit(),
            input_mode: InputModePreference::default(),
            save_failure: SaveFailurePolicy::default(),
            home_view: HomeView::default(),
        }
    }
}

/// Runtime configuration resource
#[derive(Resource)]
pub struct AppConfig {
    /// The persisted configuration data
    pub data: AppConfigData,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Whether config needs to be saved (dirty flag)
    pub dirty: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: AppConfigData::default(),
            config_path: get_config_path(),
            dirty: false,
        }
    }
}

/// Resource to notify user when config was reset to defaults
#[derive(Resource, Default)]
pub struct ConfigResetNotification {
    /// Whether to show the notification dialog
    pub show: bool,
    /// The reason for the reset (parse error, read error, etc.)
    pub reason: Option<String>,
}

/// Message to trigger config save
#[derive(Message)]
pub struct SaveConfigRequest;

/// Message to change the vertex placement preference
#[derive(Message)]
pub struct SetInputModeRequest {
    pub preference: InputModePreference,
}

/// Get the path to the config file (platform-appropriate location)
fn get_config_path() -> PathBuf {
    crate::paths::config_file()
}

/// Result of loading config from disk
struct LoadConfigResult {
    config: AppConfig,
    /// Error message if config was reset to defaults due to an error
    reset_reason: Option<String>,
}

/// Parse config text, falling back to defaults with a reason on failure
fn parse_config(json: &str) -> (AppConfigData, Option<String>) {
    match serde_json::from_str(json) {
        Ok(data) => (data, None),
        Err(e) => {
            warn!("Failed to parse config file: {}", e);
            (
                AppConfigData::default(),
                Some(format!("Configuration file was corrupted: {}", e)),
            )
        }
    }
}

/// Load configuration from disk
fn load_config() -> LoadConfigResult {
    let config_path = get_config_path();

    let (mut data, reset_reason) = if config_path.exists() {
        match std::fs::read_to_string(&config_path) {
            Ok(json) => {
                let parsed = parse_config(&json);
                if parsed.1.is_none() {
                    info!("Loaded config from {:?}", config_path);
                }
                parsed
            }
            Err(e) => {
                warn!("Failed to read config file: {}", e);
                (
                    AppConfigData::default(),
                    Some(format!("Could not read configuration file: {}", e)),
                )
            }
        }
    } else {
        info!("No config file found, using defaults");
        (AppConfigData::default(), None)
    };

    data.store.apply_env_overrides(
        std::env::var(ENV_STORE_URL).ok(),
        std::env::var(ENV_STORE_KEY).ok(),
    );

    LoadConfigResult {
        config: AppConfig {
            data,
            config_path,
            dirty: false,
        },
        reset_reason,
    }
}

/// Save configuration to disk
fn save_config(config: &AppConfig) {
    match serde_json::to_string_pretty(&config.data) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&config.config_path, json) {
                error!("Failed to save config: {}", e);
            } else {
                info!("Config saved to {:?}", config.config_path);
            }
        }
        Err(e) => {
            error!("Failed to serialize config: {}", e);
        }
    }
}

/// Startup system to load config from disk into the existing resource
fn load_config_system(
    mut config: ResMut<AppConfig>,
    mut reset_notification: ResMut<ConfigResetNotification>,
) {
    let result = load_config();
    config.data = result.config.data;
    config.config_path = result.config.config_path;
    config.dirty = result.config.dirty;

    // Set notification if config was reset due to an error
    if let Some(reason) = result.reset_reason {
        reset_notification.show = true;
        reset_notification.reason = Some(reason);
    }
}

/// System to save config when requested
fn save_config_system(
    mut events: MessageReader<SaveConfigRequest>,
    mut config: ResMut<AppConfig>,
) {
    for _ in events.read() {
        if config.dirty {
            save_config(&config);
            config.dirty = false;
        }
    }
}

/// System to update the placement preference
fn set_input_mode_system(
    mut events: MessageReader<SetInputModeRequest>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) {
    for event in events.read() {
        if config.data.input_mode == event.preference {
            continue;
        }
        config.data.input_mode = event.preference;
        config.dirty = true;
        save_events.write(SaveConfigRequest);
        info!("Input mode preference set to {:?}", event.preference);
    }
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AppConfig>()
            .init_resource::<ConfigResetNotification>()
            .add_message::<SaveConfigRequest>()
            .add_message::<SetInputModeRequest>()
            .add_systems(Startup, load_config_system.in_set(ConfigLoaded))
            .add_systems(
                Update,
                (
                    save_config_system.run_if(on_message::<SaveConfigRequest>),
                    set_input_mode_system.run_if(on_message::<SetInputModeRequest>),
                ),
            );
    }
}
