use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::config::ConfigResetNotification;
use crate::drawing::{NamePrompt, NameSubmitted, SaveFailure};
use crate::theme;

/// Optional name for a closed refuge. Both buttons save; Skip saves unnamed.
pub fn name_prompt_ui(
    mut contexts: EguiContexts,
    mut prompt: ResMut<NamePrompt>,
    mut submissions: MessageWriter<NameSubmitted>,
) -> Result {
    if !prompt.open {
        return Ok(());
    }

    let mut submitted: Option<Option<String>> = None;

    egui::Window::new("Save Refuge")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.label("Enter a name for this refuge:");
            let response = ui.text_edit_singleline(&mut prompt.text);
            let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Save").clicked() || enter {
                    submitted = Some(Some(prompt.text.clone()));
                }
                if ui.button("Skip").clicked() {
                    submitted = Some(None);
                }
            });
        });

    if let Some(name) = submitted {
        prompt.close();
        submissions.write(NameSubmitted { name });
    }

    Ok(())
}

pub fn save_failure_dialog_ui(
    mut contexts: EguiContexts,
    mut failure: ResMut<SaveFailure>,
) -> Result {
    let Some(message) = failure.message.clone() else {
        return Ok(());
    };

    egui::Window::new("Save Failed")
        .collapsible(false)
        .resizable(true)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            egui::ScrollArea::vertical().max_height(200.0).show(ui, |ui| {
                ui.colored_label(theme::ui::ERROR_TEXT, message);
            });
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                failure.message = None;
            }
        });

    Ok(())
}

/// Shown once when config.json could not be read and defaults were used
pub fn config_reset_notification_ui(
    mut contexts: EguiContexts,
    mut notification: ResMut<ConfigResetNotification>,
) -> Result {
    if !notification.show {
        return Ok(());
    }

    egui::Window::new("Settings Reset")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.label("The configuration file could not be read. Defaults are in use.");
            if let Some(reason) = &notification.reason {
                ui.add_space(5.0);
                ui.label(egui::RichText::new(reason).weak());
            }
            ui.add_space(10.0);
            if ui.button("OK").clicked() {
                notification.show = false;
            }
        });

    Ok(())
}
