//! Drawing session lifecycle.
//!
//! `Idle -> Drawing -> Committing -> Idle`, with cancel possible from any
//! active phase. The machine never performs IO: it mutates the map through
//! [`MapView`] and returns [`SessionEffect`]s for the host to run. Every
//! exit path goes through [`DrawingStateMachine::teardown`].

use bevy::prelude::*;

use super::closure::{CloseDecision, CloseGesture, ClosureDetector};
use super::collector::{InputMode, VertexCollector};
use super::events::{PendingSave, SessionEffect, SessionEvent};
use super::gesture::GestureClaim;
use super::renderer::LiveRenderer;
use crate::config::SaveFailurePolicy;
use crate::geo::{encode_closed_polygon, PolygonGeometry, Vertex};
use crate::map::view::{MapView, OverlayId};
use crate::store::{RefugeId, StoreError};

/// Coarse state for the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Drawing,
    Committing,
}

#[derive(Debug, Clone, PartialEq)]
enum SessionPhase {
    Drawing,
    /// Ring closed, waiting for the operator to name it
    AwaitingName { geometry: PolygonGeometry },
    /// Handed to the store, waiting for the result
    Saving,
}

/// One refuge being captured.
#[derive(Debug)]
struct DrawingSession {
    generation: u64,
    phase: SessionPhase,
    collector: VertexCollector,
    renderer: LiveRenderer,
    gestures: GestureClaim,
    /// Double-click zoom setting to put back on teardown
    restore_double_click_zoom: bool,
}

impl DrawingSession {
    fn place_vertex(&mut self, tapped: Option<Vertex>, map: &mut dyn MapView) {
        let center = map.center();
        let vertex = self.collector.place_vertex_at_current_target(tapped, center);
        debug!(
            "Session {}: vertex {} at {}",
            self.generation,
            self.collector.len(),
            vertex
        );
        self.redraw(map);
    }

    fn redraw(&mut self, map: &mut dyn MapView) {
        let aim = self.collector.aim_point(map.center());
        self.renderer.redraw(map, self.collector.vertices(), aim);
    }

    fn begin_commit(&mut self, map: &mut dyn MapView) -> Vec<SessionEffect> {
        match encode_closed_polygon(self.collector.vertices()) {
            Ok(geometry) => {
                self.renderer.show_preview(map, self.collector.vertices());
                self.phase = SessionPhase::AwaitingName { geometry };
                info!(
                    "Session {}: ring closed with {} vertices",
                    self.generation,
                    self.collector.len()
                );
                vec![SessionEffect::PromptForName]
            }
            Err(e) => {
                debug!("Session {}: close ignored: {}", self.generation, e);
                Vec::new()
            }
        }
    }

    /// Back to drawing with the same vertices after a failed save.
    fn resume_drawing(&mut self, map: &mut dyn MapView) {
        self.renderer.clear_preview(map);
        self.phase = SessionPhase::Drawing;
        self.redraw(map);
    }
}

/// Blank names are stored as no name.
fn normalize_name(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

/// Owns at most one drawing session at a time.
#[derive(Resource, Debug)]
pub struct DrawingStateMachine {
    session: Option<DrawingSession>,
    next_generation: u64,
    gestures: GestureClaim,
    detector: ClosureDetector,
    input_mode: InputMode,
    save_failure: SaveFailurePolicy,
}

impl DrawingStateMachine {
    pub fn new(
        gestures: GestureClaim,
        detector: ClosureDetector,
        input_mode: InputMode,
        save_failure: SaveFailurePolicy,
    ) -> Self {
        Self {
            session: None,
            next_generation: 0,
            gestures,
            detector,
            input_mode,
            save_failure,
        }
    }

    pub fn state(&self) -> SessionState {
        match self.session.as_ref().map(|s| &s.phase) {
            None => SessionState::Idle,
            Some(SessionPhase::Drawing) => SessionState::Drawing,
            Some(_) => SessionState::Committing,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn vertices(&self) -> &[Vertex] {
        self.session
            .as_ref()
            .map(|s| s.collector.vertices())
            .unwrap_or_default()
    }

    /// Generation of the active session
    pub fn generation(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.generation)
    }

    /// Mode used by the active session, or by the next one when idle
    pub fn input_mode(&self) -> InputMode {
        self.session
            .as_ref()
            .map(|s| s.collector.mode())
            .unwrap_or(self.input_mode)
    }

    /// Takes effect when the next session starts.
    pub fn set_input_mode(&mut self, mode: InputMode) {
        self.input_mode = mode;
    }

    /// The marker whose double click closes the ring
    pub fn close_target(&self) -> Option<OverlayId> {
        self.session
            .as_ref()
            .and_then(|s| s.renderer.first_vertex_marker())
    }

    /// Begin a new session. Returns false if one is already active.
    pub fn start_drawing(&mut self, map: &mut dyn MapView) -> bool {
        if let Some(session) = &self.session {
            debug!("Drawing already active (session {})", session.generation);
            return false;
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        let mode = self.input_mode;

        for kind in mode.subscriptions() {
            map.subscribe(*kind);
        }
        let restore_double_click_zoom = map.double_click_zoom();
        map.set_double_click_zoom(false);

        let gestures = self.gestures.clone();
        gestures.claim();

        self.session = Some(DrawingSession {
            generation,
            phase: SessionPhase::Drawing,
            collector: VertexCollector::new(mode),
            renderer: LiveRenderer::default(),
            gestures,
            restore_double_click_zoom,
        });

        info!(
            "Refuge drawing started (session {}, {} mode)",
            generation,
            mode.display_name()
        );
        true
    }

    /// Feed one map event. Input is ignored while idle or committing.
    pub fn handle(&mut self, event: SessionEvent, map: &mut dyn MapView) -> Vec<SessionEffect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.phase != SessionPhase::Drawing {
            debug!(
                "Session {}: ignoring {:?} while committing",
                session.generation, event
            );
            return Vec::new();
        }

        match event {
            SessionEvent::VertexPlaced { at } => {
                session.place_vertex(at, map);
                Vec::new()
            }
            SessionEvent::ViewportMoved => {
                // nothing to trail from yet
                if session.collector.mode().follows_center() && !session.collector.is_empty() {
                    session.redraw(map);
                }
                Vec::new()
            }
            SessionEvent::CloseAttempted { precise, at } => {
                let gesture = if precise {
                    CloseGesture::FirstVertexMarker
                } else {
                    CloseGesture::Proximity {
                        target: session.collector.current_target(at, map.center()),
                    }
                };

                match self
                    .detector
                    .classify(session.collector.vertices(), gesture, &*map)
                {
                    CloseDecision::Commit => session.begin_commit(map),
                    CloseDecision::PlaceVertex => {
                        session.place_vertex(at, map);
                        Vec::new()
                    }
                    CloseDecision::Ignore => {
                        debug!(
                            "Session {}: close needs at least 3 vertices, have {}",
                            session.generation,
                            session.collector.len()
                        );
                        Vec::new()
                    }
                }
            }
        }
    }

    /// Answer to the name prompt. `None` or a blank name saves without one.
    pub fn provide_name(&mut self, name: Option<String>) -> Vec<SessionEffect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };

        match std::mem::replace(&mut session.phase, SessionPhase::Saving) {
            SessionPhase::AwaitingName { geometry } => {
                let name = normalize_name(name);
                debug!(
                    "Session {}: saving refuge {:?}",
                    session.generation, name
                );
                vec![SessionEffect::Persist(PendingSave {
                    generation: session.generation,
                    geometry,
                    name,
                })]
            }
            other => {
                session.phase = other;
                Vec::new()
            }
        }
    }

    /// Result of a [`SessionEffect::Persist`]. Results for a session that is
    /// no longer saving are dropped.
    pub fn complete_save(
        &mut self,
        generation: u64,
        result: Result<RefugeId, StoreError>,
        map: &mut dyn MapView,
    ) -> Vec<SessionEffect> {
        let Some(session) = self
            .session
            .as_mut()
            .filter(|s| s.generation == generation && s.phase == SessionPhase::Saving)
        else {
            debug!("Discarding save result of stale session {}", generation);
            return Vec::new();
        };

        match result {
            Ok(id) => {
                info!("Refuge {} saved (session {})", id, generation);
                self.teardown(map);
                vec![SessionEffect::ReloadSaved]
            }
            Err(e) => {
                warn!("Failed to save refuge (session {}): {}", generation, e);
                let message = format!("Failed to save refuge: {}", e);
                match self.save_failure {
                    SaveFailurePolicy::Retain => session.resume_drawing(map),
                    SaveFailurePolicy::Discard => self.teardown(map),
                }
                vec![SessionEffect::NotifyFailure(message)]
            }
        }
    }

    /// Abandon the active session. Returns false when idle.
    pub fn cancel(&mut self, map: &mut dyn MapView) -> bool {
        let Some(generation) = self.generation() else {
            return false;
        };
        self.teardown(map);
        info!("Refuge drawing cancelled (session {})", generation);
        true
    }

    /// Unsubscribe, clear overlays, give back gestures and zoom behavior.
    fn teardown(&mut self, map: &mut dyn MapView) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        for kind in session.collector.mode().subscriptions() {
            map.unsubscribe(*kind);
        }
        session.renderer.clear(map);
        map.set_double_click_zoom(session.restore_double_click_zoom);
        session.gestures.release();
        debug!("Session {} torn down", session.generation);
    }
}
