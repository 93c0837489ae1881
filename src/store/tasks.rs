//! Store calls on the IO task pool.
//!
//! Each call becomes an entity holding the task; polling systems pick up the
//! result on a later frame and despawn the entity. Loads carry a generation
//! so a slow listing cannot overwrite a newer one.

use bevy::prelude::*;
use bevy::tasks::{IoTaskPool, Task};
use futures_lite::future;

use super::gateway::{LoadedLayers, PersistenceGateway, SavedRefugesRendered};
use super::{RefugeId, StoreError};
use crate::drawing::PendingSave;
use crate::map::view::MapView;
use crate::map::MapCanvas;

/// Request to re-fetch and redraw saved refuges
#[derive(Message)]
pub struct ReloadRefugesRequest;

/// In-flight insert, tagged with the session generation that issued it
#[derive(Component)]
pub struct SaveRefugeTask {
    pub generation: u64,
    pub task: Task<Result<RefugeId, StoreError>>,
}

/// In-flight listing of refuges and pathlines
#[derive(Component)]
pub struct LoadRefugesTask {
    pub generation: u64,
    pub task: Task<LoadedLayers>,
}

/// Generations of issued and applied loads
#[derive(Resource, Debug, Default)]
pub struct RefugeLoads {
    issued: u64,
    applied: u64,
}

impl RefugeLoads {
    /// Tag for a new load
    pub fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Whether a newer load has already been applied
    pub fn is_stale(&self, generation: u64) -> bool {
        generation <= self.applied
    }

    /// Render a finished load unless a newer one has landed first.
    ///
    /// A failed refuge query leaves the layer as it was and does not count as
    /// applied. Returns false for stale results.
    pub fn apply(
        &mut self,
        generation: u64,
        layers: LoadedLayers,
        map: &mut dyn MapView,
        rendered: &mut SavedRefugesRendered,
    ) -> bool {
        if self.is_stale(generation) {
            debug!(
                "Dropping refuge load {} (load {} already shown)",
                generation, self.applied
            );
            return false;
        }

        match layers.refuges {
            Ok(records) => {
                rendered.count = PersistenceGateway::render_all(&records, map);
                rendered.last_error = None;
                self.applied = generation;
                info!("Loaded {} saved refuges", rendered.count);
            }
            Err(e) => {
                warn!("Failed to load saved refuges: {}", e);
                rendered.last_error = Some(e.to_string());
            }
        }

        match layers.pathlines {
            Ok(records) => {
                let count = PersistenceGateway::render_pathlines(&records, map);
                debug!("Rendered {} pathlines", count);
            }
            Err(e) => debug!("Pathlines unavailable: {}", e),
        }
        true
    }
}

pub fn spawn_save_task(commands: &mut Commands, gateway: &PersistenceGateway, pending: PendingSave) {
    let gateway = gateway.clone();
    let PendingSave {
        generation,
        geometry,
        name,
    } = pending;

    let task = IoTaskPool::get().spawn(async move { gateway.save(&geometry, name.as_deref()) });
    commands.spawn(SaveRefugeTask { generation, task });
}

pub fn spawn_load_task(commands: &mut Commands, gateway: &PersistenceGateway, generation: u64) {
    let gateway = gateway.clone();
    let task = IoTaskPool::get().spawn(async move { gateway.fetch_layers() });
    commands.spawn(LoadRefugesTask { generation, task });
}

/// Start a reload for each request
pub fn reload_refuges_system(
    mut commands: Commands,
    mut events: MessageReader<ReloadRefugesRequest>,
    gateway: Res<PersistenceGateway>,
    mut loads: ResMut<RefugeLoads>,
) {
    // Several requests in one frame need only one fetch
    if events.read().count() == 0 {
        return;
    }
    let generation = loads.begin();
    debug!("Reloading saved refuges from {} (load {})", gateway.describe(), generation);
    spawn_load_task(&mut commands, &gateway, generation);
}

/// Render finished listings in the order they were issued.
pub fn poll_load_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut LoadRefugesTask)>,
    mut loads: ResMut<RefugeLoads>,
    mut canvas: ResMut<MapCanvas>,
    mut rendered: ResMut<SavedRefugesRendered>,
) {
    for (entity, mut load) in tasks.iter_mut() {
        let Some(layers) = future::block_on(future::poll_once(&mut load.task)) else {
            continue;
        };
        loads.apply(load.generation, layers, &mut *canvas, &mut rendered);
        commands.entity(entity).despawn();
    }
}
