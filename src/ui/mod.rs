mod dialogs;
mod toolbar;

use bevy::prelude::*;
use bevy_egui::EguiPrimaryContextPass;

use crate::config::ConfigResetNotification;
use crate::drawing::{NamePrompt, SaveFailure};

/// Resource that tracks whether any modal dialog is currently open.
/// Map input handlers check this so clicks on a dialog never reach the map.
#[derive(Resource, Default)]
pub struct DialogState {
    /// True when any modal dialog is open that should block map input
    pub any_modal_open: bool,
}

/// Aggregate all dialog open states into a single resource.
/// Runs in First schedule before input handlers.
fn update_dialog_state(
    name_prompt: Res<NamePrompt>,
    save_failure: Res<SaveFailure>,
    config_reset: Res<ConfigResetNotification>,
    mut dialog_state: ResMut<DialogState>,
) {
    dialog_state.any_modal_open =
        name_prompt.open || save_failure.message.is_some() || config_reset.show;
}

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DialogState>()
            .add_systems(EguiPrimaryContextPass, toolbar::toolbar_ui)
            .add_systems(
                EguiPrimaryContextPass,
                (
                    dialogs::name_prompt_ui,
                    dialogs::save_failure_dialog_ui,
                    dialogs::config_reset_notification_ui,
                )
                    .after(toolbar::toolbar_ui),
            )
            // Update dialog state at the start of each frame
            .add_systems(First, update_dialog_state);
    }
}
