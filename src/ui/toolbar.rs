use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::config::{AppConfig, InputModePreference, SetInputModeRequest};
use crate::drawing::{
    CancelDrawingRequest, DrawingStateMachine, InputMode, SessionState, StartDrawingRequest,
};
use crate::map::{CenterSelection, ResetViewRequest};
use crate::store::{PersistenceGateway, ReloadRefugesRequest, SavedRefugesRendered};
use crate::theme;

/// Guidance for the operator in the current state
pub fn status_hint(state: SessionState, mode: InputMode, vertex_count: usize) -> &'static str {
    match (state, mode) {
        (SessionState::Idle, _) => "Press Refuge Area to outline a new refuge",
        (SessionState::Committing, _) => "Saving refuge...",
        (SessionState::Drawing, InputMode::Tap) if vertex_count < 3 => {
            "Click to add vertices"
        }
        (SessionState::Drawing, InputMode::Tap) => {
            "Double-click the first vertex (or near it) to close"
        }
        (SessionState::Drawing, InputMode::CenterFollow) if vertex_count < 3 => {
            "Move the map and tap to add the crosshair position"
        }
        (SessionState::Drawing, InputMode::CenterFollow) => {
            "Bring the crosshair to the first vertex and double-tap to close"
        }
    }
}

/// Bundled toolbar actions
#[derive(SystemParam)]
pub struct ToolbarActions<'w> {
    start: MessageWriter<'w, StartDrawingRequest>,
    cancel: MessageWriter<'w, CancelDrawingRequest>,
    reload: MessageWriter<'w, ReloadRefugesRequest>,
    reset_view: MessageWriter<'w, ResetViewRequest>,
    input_mode: MessageWriter<'w, SetInputModeRequest>,
}

/// Main toolbar: drawing controls and status
pub fn toolbar_ui(
    mut contexts: EguiContexts,
    machine: Res<DrawingStateMachine>,
    config: Res<AppConfig>,
    gateway: Res<PersistenceGateway>,
    rendered: Res<SavedRefugesRendered>,
    selection: Res<CenterSelection>,
    mut actions: ToolbarActions,
) -> Result {
    let state = machine.state();
    let vertex_count = machine.vertices().len();

    egui::TopBottomPanel::top("main_toolbar")
        .frame(
            egui::Frame::side_top_panel(&contexts.ctx_mut()?.style())
                .fill(theme::ui::PANEL_BACKGROUND)
                .inner_margin(egui::Margin::symmetric(12, 8)),
        )
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 4.0;

                let drawing = state != SessionState::Idle;
                let start = egui::Button::new(
                    egui::RichText::new("Refuge Area").size(14.0).strong(),
                )
                .min_size(egui::vec2(0.0, 28.0))
                .selected(drawing);
                if ui
                    .add_enabled(!drawing, start)
                    .on_hover_text("Start outlining a new refuge")
                    .clicked()
                {
                    actions.start.write(StartDrawingRequest);
                }

                if drawing
                    && ui
                        .add(egui::Button::new("Discard").min_size(egui::vec2(0.0, 28.0)))
                        .on_hover_text("Discard the refuge being drawn (Esc)")
                        .clicked()
                {
                    actions.cancel.write(CancelDrawingRequest);
                }

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                if ui.button("Reload").on_hover_text("Reload saved refuges").clicked() {
                    actions.reload.write(ReloadRefugesRequest);
                }
                if ui.button("Center").on_hover_text("Return to the home view").clicked() {
                    actions.reset_view.write(ResetViewRequest);
                }

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                let current = config.data.input_mode;
                let mut selected = current;
                ui.label("Placement:");
                egui::ComboBox::from_id_salt("placement_mode")
                    .selected_text(selected.display_name())
                    .show_ui(ui, |ui| {
                        for preference in InputModePreference::all() {
                            ui.selectable_value(
                                &mut selected,
                                *preference,
                                preference.display_name(),
                            );
                        }
                    });
                if selected != current {
                    actions.input_mode.write(SetInputModeRequest {
                        preference: selected,
                    });
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        egui::RichText::new(gateway.describe()).color(theme::ui::HINT_TEXT),
                    );
                    ui.separator();
                    match &rendered.last_error {
                        Some(error) => {
                            ui.colored_label(theme::ui::ERROR_TEXT, "Saved refuges unavailable")
                                .on_hover_text(error);
                        }
                        None => {
                            ui.label(format!("{} saved", rendered.count));
                        }
                    }
                    if let Some(center) = selection.rounded() {
                        ui.separator();
                        ui.label(
                            egui::RichText::new(center.to_string())
                                .monospace()
                                .color(theme::ui::LABEL_TEXT),
                        );
                    }
                });
            });

            ui.horizontal(|ui| {
                if state != SessionState::Idle {
                    ui.colored_label(
                        theme::ui::DRAWING_ACTIVE,
                        egui::RichText::new(format!("{} vertices", vertex_count)).strong(),
                    );
                }
                ui.label(
                    egui::RichText::new(status_hint(state, machine.input_mode(), vertex_count))
                        .color(theme::ui::HINT_TEXT),
                );
            });
        });
    Ok(())
}
