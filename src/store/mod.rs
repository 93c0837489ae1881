//! Backend storage for saved refuges.
//!
//! The drawing core only talks to [`GeometryStore`]; which backend sits behind
//! it is decided from config at startup.
//!
//! ## Module Structure
//!
//! - [`gateway`] - `PersistenceGateway`: save, load-and-render-all, pathlines
//! - [`rest`] - PostgREST/Supabase-compatible HTTP backend (ureq)
//! - [`local`] - JSON file backend for offline use
//! - [`tasks`] - Bevy task components and polling systems

pub mod gateway;
pub mod local;
pub mod rest;
pub mod tasks;

#[cfg(test)]
pub mod memory;

pub use gateway::{PersistenceGateway, SavedRefugesRendered};
pub use tasks::{spawn_save_task, ReloadRefugesRequest, SaveRefugeTask};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use bevy::prelude::*;

use crate::config::{AppConfig, ConfigLoaded, StoreBackend, StoreSettings};
use crate::geo::{GeometryError, LineStringGeometry, PolygonGeometry};

/// Default page size when listing saved refuges
pub const DEFAULT_QUERY_LIMIT: usize = 500;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no refuge store is configured")]
    NotConfigured,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("store answered {code}: {body}")]
    Status { code: u16, body: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Identifier assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RefugeId {
    Serial(i64),
    Uuid(String),
}

impl std::fmt::Display for RefugeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefugeId::Serial(id) => write!(f, "{}", id),
            RefugeId::Uuid(id) => f.write_str(id),
        }
    }
}

/// One saved refuge as the store returns it.
///
/// The geometry may arrive as GeoJSON text computed by the database
/// (`geom_geojson`) or as the raw JSON column (`geom_json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefugeRecord {
    pub id: RefugeId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geom_geojson: Option<String>,
    #[serde(default)]
    pub geom_json: Option<serde_json::Value>,
}

impl RefugeRecord {
    /// Resolve the polygon, preferring the computed GeoJSON text and falling
    /// back to the raw JSON column.
    pub fn geometry(&self) -> Result<PolygonGeometry, GeometryError> {
        let from_text = self
            .geom_geojson
            .as_deref()
            .map(PolygonGeometry::from_geojson_str);

        match (from_text, self.geom_json.as_ref()) {
            (Some(Ok(geometry)), _) => Ok(geometry),
            (Some(Err(_)), Some(raw)) | (None, Some(raw)) => PolygonGeometry::from_json_value(raw),
            (Some(Err(e)), None) => Err(e),
            (None, None) => Err(GeometryError::MissingGeometry),
        }
    }

    /// Label shown next to the rendered polygon
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => "Unnamed refuge",
        }
    }
}

/// One pathline row. Pathlines are read-only reference lines drawn under
/// the refuges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathlineRecord {
    pub id: RefugeId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geom_geojson: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geom_json: Option<serde_json::Value>,
}

impl PathlineRecord {
    pub fn geometry(&self) -> Result<LineStringGeometry, GeometryError> {
        match (self.geom_geojson.as_deref(), self.geom_json.as_ref()) {
            (Some(text), _) => LineStringGeometry::from_geojson_str(text),
            (None, Some(raw)) => LineStringGeometry::from_json_value(raw),
            (None, None) => Err(GeometryError::MissingGeometry),
        }
    }
}

/// Listing parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefugeQuery {
    pub limit: usize,
}

impl Default for RefugeQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

/// Remote or local storage for refuge polygons.
///
/// Calls block; callers run them on the IO task pool.
pub trait GeometryStore: Send + Sync {
    fn insert(
        &self,
        geometry: &PolygonGeometry,
        name: Option<&str>,
    ) -> Result<RefugeId, StoreError>;

    fn query(&self, query: &RefugeQuery) -> Result<Vec<RefugeRecord>, StoreError>;

    /// LineString pathlines, up to the same limit as refuges
    fn query_pathlines(&self, query: &RefugeQuery) -> Result<Vec<PathlineRecord>, StoreError>;

    /// Short label for the status bar
    fn describe(&self) -> String;
}

/// Backend used when nothing is configured: every call fails.
#[derive(Debug, Default)]
pub struct DisabledStore;

impl GeometryStore for DisabledStore {
    fn insert(&self, _: &PolygonGeometry, _: Option<&str>) -> Result<RefugeId, StoreError> {
        Err(StoreError::NotConfigured)
    }

    fn query(&self, _: &RefugeQuery) -> Result<Vec<RefugeRecord>, StoreError> {
        Err(StoreError::NotConfigured)
    }

    fn query_pathlines(&self, _: &RefugeQuery) -> Result<Vec<PathlineRecord>, StoreError> {
        Err(StoreError::NotConfigured)
    }

    fn describe(&self) -> String {
        "no store".to_string()
    }
}

/// Build the backend selected in config, with environment overrides applied.
pub fn open_store(settings: &StoreSettings) -> Arc<dyn GeometryStore> {
    let settings = settings.resolved();
    match settings.backend {
        StoreBackend::Rest => match rest::RestGeometryStore::from_settings(&settings) {
            Some(store) => Arc::new(store),
            None => {
                warn!("REST store selected but url or api key is missing");
                Arc::new(DisabledStore)
            }
        },
        StoreBackend::Local => Arc::new(local::LocalGeometryStore::new(settings.local_file())),
        StoreBackend::Disabled => Arc::new(DisabledStore),
    }
}

/// Open the configured backend and queue the first load
fn setup_gateway(
    mut commands: Commands,
    config: Res<AppConfig>,
    mut reload: MessageWriter<ReloadRefugesRequest>,
) {
    let store = open_store(&config.data.store);
    info!("Refuge store: {}", store.describe());
    commands.insert_resource(PersistenceGateway::new(store, config.data.query_limit));
    reload.write(ReloadRefugesRequest);
}

pub struct StorePlugin;

impl Plugin for StorePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SavedRefugesRendered>()
            .init_resource::<tasks::RefugeLoads>()
            .add_message::<ReloadRefugesRequest>()
            .add_systems(Startup, setup_gateway.after(ConfigLoaded))
            .add_systems(
                Update,
                (
                    tasks::reload_refuges_system.run_if(on_message::<ReloadRefugesRequest>),
                    tasks::poll_load_tasks,
                )
                    .chain(),
            );
    }
}
