//! Bevy wiring for the drawing state machine: requests in, effects out.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_egui::EguiContexts;
use futures_lite::future;

use super::closure::ClosureDetector;
use super::events::{
    CancelDrawingRequest, NameSubmitted, SessionEffect, SessionEvent, StartDrawingRequest,
};
use super::session::DrawingStateMachine;
use crate::config::{AppConfig, SetInputModeRequest};
use crate::map::{is_cursor_over_ui, HostEnvironment, MapCanvas, MapInput, OverlayId};
use crate::store::{spawn_save_task, PersistenceGateway, ReloadRefugesRequest, SaveRefugeTask};
use crate::ui::DialogState;

/// Name prompt shown after a ring closes
#[derive(Resource, Default)]
pub struct NamePrompt {
    pub open: bool,
    pub text: String,
}

impl NamePrompt {
    pub fn open(&mut self) {
        self.open = true;
        self.text.clear();
    }

    pub fn close(&mut self) {
        self.open = false;
        self.text.clear();
    }
}

/// Last save failure, shown until dismissed
#[derive(Resource, Default)]
pub struct SaveFailure {
    pub message: Option<String>,
}

/// Everything a [`SessionEffect`] can touch
#[derive(SystemParam)]
pub struct EffectSinks<'w, 's> {
    commands: Commands<'w, 's>,
    gateway: Res<'w, PersistenceGateway>,
    name_prompt: ResMut<'w, NamePrompt>,
    save_failure: ResMut<'w, SaveFailure>,
    reloads: MessageWriter<'w, ReloadRefugesRequest>,
}

impl EffectSinks<'_, '_> {
    pub fn apply(&mut self, effects: Vec<SessionEffect>) {
        for effect in effects {
            match effect {
                SessionEffect::PromptForName => self.name_prompt.open(),
                SessionEffect::Persist(pending) => {
                    debug!(
                        "Saving refuge to {} (session {})",
                        self.gateway.describe(),
                        pending.generation
                    );
                    spawn_save_task(&mut self.commands, &self.gateway, pending);
                }
                SessionEffect::ReloadSaved => {
                    self.reloads.write(ReloadRefugesRequest);
                }
                SessionEffect::NotifyFailure(message) => {
                    self.save_failure.message = Some(message);
                }
            }
        }
    }
}

/// Build the state machine once config and host are known
pub fn setup_drawing_machine(
    mut commands: Commands,
    config: Res<AppConfig>,
    host: Res<HostEnvironment>,
) {
    let data = &config.data;
    let detector = ClosureDetector::new(data.close_threshold_meters);
    debug!(
        "Drawing ready: close within {} m, {} placement",
        detector.threshold_meters(),
        host.input_mode(data.input_mode).display_name()
    );
    let machine = DrawingStateMachine::new(
        host.gestures.clone(),
        detector,
        host.input_mode(data.input_mode),
        data.save_failure,
    );
    commands.insert_resource(machine);
}

pub fn start_drawing_system(
    mut requests: MessageReader<StartDrawingRequest>,
    mut machine: ResMut<DrawingStateMachine>,
    mut canvas: ResMut<MapCanvas>,
) {
    if requests.read().count() > 0 {
        machine.start_drawing(&mut *canvas);
    }
}

pub fn cancel_drawing_system(
    mut requests: MessageReader<CancelDrawingRequest>,
    mut machine: ResMut<DrawingStateMachine>,
    mut canvas: ResMut<MapCanvas>,
    mut name_prompt: ResMut<NamePrompt>,
) {
    if requests.read().count() == 0 {
        return;
    }
    if machine.cancel(&mut *canvas) {
        name_prompt.close();
    }
}

/// Escape or right click abandons the refuge being drawn
pub fn handle_cancel_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    machine: Res<DrawingStateMachine>,
    dialog_state: Res<DialogState>,
    mut contexts: EguiContexts,
    mut cancel: MessageWriter<CancelDrawingRequest>,
) {
    if !machine.is_active() || dialog_state.any_modal_open {
        return;
    }

    let escape = keyboard.just_pressed(KeyCode::Escape);
    let right_click =
        mouse_button.just_pressed(MouseButton::Right) && !is_cursor_over_ui(&mut contexts);
    if escape || right_click {
        cancel.write(CancelDrawingRequest);
    }
}

/// Turn a map input into a session event. `close_target` is the session's
/// own first-vertex marker.
///
/// Double clicks keep their position, but in center-follow mode the session
/// measures proximity from the map center (the crosshair), not from where
/// the double click landed.
pub fn session_event(input: MapInput, close_target: Option<OverlayId>) -> SessionEvent {
    match input {
        MapInput::Click { at } => SessionEvent::VertexPlaced { at: Some(at) },
        MapInput::DoubleClick { at } => SessionEvent::CloseAttempted {
            precise: false,
            at: Some(at),
        },
        MapInput::MarkerDoubleClick { marker, at } => SessionEvent::CloseAttempted {
            precise: close_target == Some(marker),
            at: Some(at),
        },
        MapInput::Moved | MapInput::ZoomEnd => SessionEvent::ViewportMoved,
    }
}

/// Forward subscribed map input to the active session
pub fn dispatch_map_input(
    mut inputs: MessageReader<MapInput>,
    mut machine: ResMut<DrawingStateMachine>,
    mut canvas: ResMut<MapCanvas>,
    mut sinks: EffectSinks,
) {
    for input in inputs.read() {
        if !machine.is_active() || !canvas.is_subscribed(input.kind()) {
            continue;
        }
        let event = session_event(*input, machine.close_target());
        let effects = machine.handle(event, &mut *canvas);
        sinks.apply(effects);
    }
}

pub fn name_submitted_system(
    mut submissions: MessageReader<NameSubmitted>,
    mut machine: ResMut<DrawingStateMachine>,
    mut sinks: EffectSinks,
) {
    for submission in submissions.read() {
        let effects = machine.provide_name(submission.name.clone());
        sinks.apply(effects);
    }
}

/// Hand finished inserts back to the machine
pub fn poll_save_tasks(
    mut tasks: Query<(Entity, &mut SaveRefugeTask)>,
    mut machine: ResMut<DrawingStateMachine>,
    mut canvas: ResMut<MapCanvas>,
    mut sinks: EffectSinks,
) {
    for (entity, mut save) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut save.task)) else {
            continue;
        };

        let effects = machine.complete_save(save.generation, result, &mut *canvas);
        sinks.apply(effects);
        sinks.commands.entity(entity).despawn();
    }
}

/// New placement preference applies from the next session on
pub fn apply_input_mode_preference(
    mut requests: MessageReader<SetInputModeRequest>,
    host: Res<HostEnvironment>,
    mut machine: ResMut<DrawingStateMachine>,
) {
    for request in requests.read() {
        let mode = host.input_mode(request.preference);
        machine.set_input_mode(mode);
        info!("Placement mode set to {}", mode.display_name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Vertex;

    #[test]
    fn test_marker_double_click_on_close_target_is_precise() {
        let at = Vertex::new(1.0, 2.0);
        let event = session_event(
            MapInput::MarkerDoubleClick {
                marker: OverlayId(4),
                at,
            },
            Some(OverlayId(4)),
        );
        assert_eq!(
            event,
            SessionEvent::CloseAttempted {
                precise: true,
                at: Some(at)
            }
        );
    }

    #[test]
    fn test_foreign_marker_double_click_is_proximity() {
        let at = Vertex::new(1.0, 2.0);
        let event = session_event(
            MapInput::MarkerDoubleClick {
                marker: OverlayId(9),
                at,
            },
            Some(OverlayId(4)),
        );
        assert_eq!(
            event,
            SessionEvent::CloseAttempted {
                precise: false,
                at: Some(at)
            }
        );
    }

    #[test]
    fn test_click_places_vertex() {
        let at = Vertex::new(3.0, 4.0);
        assert_eq!(
            session_event(MapInput::Click { at }, None),
            SessionEvent::VertexPlaced { at: Some(at) }
        );
        assert_eq!(session_event(MapInput::Moved, None), SessionEvent::ViewportMoved);
    }

    #[test]
    fn test_name_prompt_open_clears_text() {
        let mut prompt = NamePrompt {
            open: false,
            text: "old".to_string(),
        };
        prompt.open();
        assert!(prompt.open);
        assert!(prompt.text.is_empty());
    }
}
