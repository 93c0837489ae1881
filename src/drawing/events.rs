use bevy::prelude::*;

use crate::geo::{PolygonGeometry, Vertex};

/// Input the drawing session reacts to, already filtered to its subscriptions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    /// Single click/tap. `at` is the tapped coordinate when known.
    VertexPlaced { at: Option<Vertex> },
    /// The map center moved
    ViewportMoved,
    /// Double click. `precise` when it hit the first-vertex marker.
    CloseAttempted { precise: bool, at: Option<Vertex> },
}

/// A closed ring waiting to be written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSave {
    pub generation: u64,
    pub geometry: PolygonGeometry,
    pub name: Option<String>,
}

/// Side effects the host runs on behalf of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    /// Ask the operator for an optional refuge name
    PromptForName,
    Persist(PendingSave),
    /// Reload saved refuges from the store
    ReloadSaved,
    /// Show a blocking failure notice
    NotifyFailure(String),
}

/// Request to begin a new refuge
#[derive(Message)]
pub struct StartDrawingRequest;

/// Request to abandon the active refuge
#[derive(Message)]
pub struct CancelDrawingRequest;

/// Result of the name prompt; `None` when skipped
#[derive(Message)]
pub struct NameSubmitted {
    pub name: Option<String>,
}
