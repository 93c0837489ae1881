//! Interactive capture of refuge polygons.
//!
//! [`DrawingStateMachine`] is plain Rust driven through the [`MapView`]
//! trait; [`systems`] connects it to map input, the store and the UI.
//!
//! [`MapView`]: crate::map::view::MapView

mod closure;
mod collector;
mod events;
mod gesture;
mod renderer;
mod session;
mod systems;


pub use closure::ClosureDetector;
pub use collector::InputMode;
pub use events::{
    CancelDrawingRequest, NameSubmitted, PendingSave, SessionEffect, SessionEvent,
    StartDrawingRequest,
};
pub use gesture::GestureClaim;
pub use session::{DrawingStateMachine, SessionState};
pub use systems::{NamePrompt, SaveFailure};

use bevy::prelude::*;

use crate::config::SetInputModeRequest;
use crate::map::{HostDetected, MapInputSet};

pub struct DrawingPlugin;

impl Plugin for DrawingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NamePrompt>()
            .init_resource::<SaveFailure>()
            .add_message::<StartDrawingRequest>()
            .add_message::<CancelDrawingRequest>()
            .add_message::<NameSubmitted>()
            .add_systems(Startup, systems::setup_drawing_machine.after(HostDetected))
            .add_systems(
                Update,
                (
                    systems::handle_cancel_shortcuts,
                    systems::cancel_drawing_system.run_if(on_message::<CancelDrawingRequest>),
                    systems::start_drawing_system.run_if(on_message::<StartDrawingRequest>),
                    systems::apply_input_mode_preference.run_if(on_message::<SetInputModeRequest>),
                    systems::dispatch_map_input,
                    systems::name_submitted_system.run_if(on_message::<NameSubmitted>),
                    systems::poll_save_tasks,
                )
                    .chain()
                    .after(MapInputSet),
            );
    }
}
