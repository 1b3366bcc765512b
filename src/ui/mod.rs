//! User interface using egui.
//!
//! Side panel with camera readout, movement state, layer load status and
//! a controls legend.

use egui::{Color32, Context};

use crate::app::Viewer;
use crate::renderer::RenderMode;
use crate::scene::LayerStatus;

/// UI state and rendering.
pub struct Ui {
    /// Whether the side panel is visible
    pub panel_visible: bool,
}

impl Ui {
    pub fn new() -> Self {
        Self {
            panel_visible: true,
        }
    }

    /// Render the UI and report requested actions.
    pub fn render(
        &mut self,
        ctx: &Context,
        viewer: &mut Viewer,
        render_mode: &mut RenderMode,
        fps: f32,
    ) -> UiResponse {
        let mut response = UiResponse::default();

        // Toggle panel with Tab key
        if ctx.input(|i| i.key_pressed(egui::Key::Tab)) {
            self.panel_visible = !self.panel_visible;
        }

        if !self.panel_visible {
            return response;
        }

        egui::SidePanel::left("controls")
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("hmv");
                ui.separator();

                ui.label(format!("FPS: {:.1}", fps));
                ui.separator();

                ui.collapsing("Camera", |ui| {
                    let distance_range = viewer.orbit.config.distance_range(&viewer.camera);
                    let camera = &mut viewer.camera;
                    let p = camera.position();
                    ui.label(format!("Position: {:.0}, {:.0}, {:.0}", p.x, p.y, p.z));
                    ui.label(format!(
                        "Target: {:.0}, {:.0}, {:.0}",
                        camera.target.x, camera.target.y, camera.target.z
                    ));

                    ui.horizontal(|ui| {
                        ui.label("Distance:");
                        ui.add(
                            egui::DragValue::new(&mut camera.distance)
                                .speed(10.0)
                                .range(distance_range),
                        );
                    });

                    ui.horizontal(|ui| {
                        ui.label("FOV:");
                        ui.add(
                            egui::DragValue::new(&mut camera.fov)
                                .speed(1.0)
                                .suffix("°")
                                .range(10.0..=120.0),
                        );
                    });

                    if ui.button("Reset Camera").clicked() {
                        response.reset_camera = true;
                    }
                });

                ui.collapsing("Movement", |ui| {
                    let flags = viewer.walker.flags;
                    ui.label(if flags.any() { "Moving" } else { "Idle" });
                    ui.horizontal(|ui| {
                        for (label, active) in [
                            ("W", flags.forward),
                            ("A", flags.left),
                            ("S", flags.backward),
                            ("D", flags.right),
                            ("R", flags.up),
                            ("F", flags.down),
                        ] {
                            let color = if active {
                                Color32::LIGHT_GREEN
                            } else {
                                Color32::GRAY
                            };
                            ui.colored_label(color, label);
                        }
                    });
                    ui.checkbox(&mut viewer.walker.auto_forward, "Auto forward");
                });

                ui.collapsing("Render", |ui| {
                    ui.radio_value(render_mode, RenderMode::Solid, "Solid");
                    ui.radio_value(render_mode, RenderMode::Wireframe, "Wireframe");
                    ui.radio_value(render_mode, RenderMode::Both, "Both");
                });

                ui.collapsing("Layers", |ui| {
                    for status in &viewer.scene.status {
                        let label = status.kind().label();
                        match status {
                            LayerStatus::Loaded(_) => {
                                ui.label(format!("{}: loaded", label));
                            }
                            LayerStatus::Untextured(_, reason) => {
                                ui.colored_label(Color32::YELLOW, format!("{}: no texture", label))
                                    .on_hover_text(reason.as_str());
                            }
                            LayerStatus::Failed(_, reason) => {
                                ui.colored_label(Color32::LIGHT_RED, format!("{}: failed", label))
                                    .on_hover_text(reason.as_str());
                            }
                        }
                    }
                });

                ui.separator();

                ui.collapsing("Controls", |ui| {
                    ui.label("W/S: Forward / Back");
                    ui.label("A/D: Left / Right");
                    ui.label("R/F: Up / Down");
                    ui.label("Left Drag: Rotate");
                    ui.label("Scroll: Zoom");
                    ui.label("Shift+Drag: Pan");
                    ui.label("Middle Drag: Pan");
                    ui.label("Home: Reset Camera");
                    ui.label("Tab: Toggle Panel");
                    ui.label("ESC: Quit");
                });
            });

        response
    }
}

impl Default for Ui {
    fn default() -> Self {
        Self::new()
    }
}

/// Response from UI indicating what actions to take.
#[derive(Default)]
pub struct UiResponse {
    pub reset_camera: bool,
}
