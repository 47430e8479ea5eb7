//! UI shell: egui presentation over the controller and snapshot service.
//!
//! Pure wiring. Control enablement mirrors controller state (start enabled
//! iff bound and idle, stop/capture iff bound and running, device selector
//! locked while running) and every action routes straight to the controller
//! or the snapshot service. Session events drained each frame provide the
//! async half of the feedback loop.

use std::time::{Duration, Instant};

use eframe::egui;

use crate::controller::CameraController;
use crate::session::{ImageFormat, SessionEvent};
use crate::snapshot::{SnapshotError, SnapshotService};

/// How often to re-query the registry for hot-plug while preview is stopped.
const DEVICE_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Modal notification, dismissed with OK.
struct Notice {
    title: &'static str,
    message: String,
}

pub struct CamshotApp {
    controller: CameraController,
    snapshots: SnapshotService,
    requested_format: ImageFormat,
    /// Editable copy of the snapshot directory, applied on focus loss.
    output_dir_input: String,
    texture: Option<egui::TextureHandle>,
    status: String,
    notice: Option<Notice>,
    last_device_poll: Instant,
}

impl CamshotApp {
    pub fn new(mut controller: CameraController, snapshots: SnapshotService) -> Self {
        let status = match controller.refresh_devices() {
            Ok(()) if controller.devices().is_empty() => "No cameras detected".to_string(),
            Ok(()) => match controller.selected_device() {
                Some(dev) => format!("Selected: {}", dev.name),
                None => "Idle".to_string(),
            },
            Err(e) => format!("Error: {}", e),
        };

        let output_dir_input = match snapshots.output_dir() {
            Some(dir) => dir.display().to_string(),
            None => crate::snapshot::pictures_dir().display().to_string(),
        };

        Self {
            controller,
            snapshots,
            requested_format: ImageFormat::Jpeg,
            output_dir_input,
            texture: None,
            status,
            notice: None,
            last_device_poll: Instant::now(),
        }
    }

    fn notify(&mut self, title: &'static str, message: String) {
        self.status = format!("Error: {}", message);
        self.notice = Some(Notice { title, message });
    }

    fn handle_events(&mut self) {
        for event in self.controller.poll_events() {
            match event {
                SessionEvent::Saved { path, .. } => {
                    self.status = format!("Saved: {}", path.display());
                }
                SessionEvent::SaveError { message, .. } => {
                    self.notify("Capture error", message);
                }
                SessionEvent::CameraError { message } => {
                    self.status = format!("Camera error: {}", message);
                    self.notice = Some(Notice {
                        title: "Camera error",
                        message,
                    });
                }
            }
        }
    }

    fn poll_hotplug(&mut self) {
        if self.controller.is_running() || self.last_device_poll.elapsed() < DEVICE_POLL_INTERVAL {
            return;
        }
        self.last_device_poll = Instant::now();

        match self.controller.check_hotplug() {
            Ok(true) => {
                self.status = match self.controller.selected_device() {
                    Some(dev) => format!("Selected: {}", dev.name),
                    None => "No cameras detected".to_string(),
                };
            }
            Ok(false) => {}
            Err(e) => log::warn!("Device re-query failed: {}", e),
        }
    }

    fn on_start(&mut self) {
        match self.controller.start() {
            Ok(()) => {
                // Permission denial leaves the controller stopped; say nothing
                if self.controller.is_running() {
                    self.status = "Preview running…".to_string();
                }
            }
            Err(e) => self.notify("Camera", e.to_string()),
        }
    }

    fn on_stop(&mut self) {
        self.controller.stop();
        self.texture = None;
        self.status = "Stopped".to_string();
    }

    fn on_capture(&mut self) {
        let format = self.requested_format;
        match self
            .snapshots
            .capture(self.controller.session_mut(), None, format)
        {
            Ok((_id, _path)) => self.status = "Capturing…".to_string(),
            Err(SnapshotError::NotRunning) => {
                self.notice = Some(Notice {
                    title: "Capture",
                    message: "Camera is not running.".to_string(),
                });
            }
            Err(e) => self.notify("Capture", e.to_string()),
        }
    }

    fn on_select(&mut self, index: usize) {
        if let Err(e) = self.controller.select_device(index) {
            self.notify("Camera", e.to_string());
            return;
        }
        if let Some(dev) = self.controller.selected_device() {
            self.status = format!("Selected: {}", dev.name);
        }
    }

    fn update_preview_texture(&mut self, ctx: &egui::Context) {
        if !self.controller.is_running() {
            return;
        }
        if let Some(frame) = self.controller.latest_frame() {
            let image = egui::ColorImage::from_rgb(
                [frame.width as usize, frame.height as usize],
                &frame.data,
            );
            match &mut self.texture {
                Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                None => {
                    self.texture = Some(ctx.load_texture(
                        "preview",
                        image,
                        egui::TextureOptions::LINEAR,
                    ));
                }
            }
        }
    }

    fn show_notice(&mut self, ctx: &egui::Context) {
        let Some(notice) = &self.notice else { return };

        let mut dismissed = false;
        egui::Window::new(notice.title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(&notice.message);
                ui.vertical_centered(|ui| {
                    if ui.button("OK").clicked() {
                        dismissed = true;
                    }
                });
            });
        if dismissed {
            self.notice = None;
        }
    }
}

impl eframe::App for CamshotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_events();
        self.poll_hotplug();
        self.update_preview_texture(ctx);

        let bound = self.controller.is_bound();
        let running = self.controller.is_running();

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Camera:");

                let names: Vec<String> = self
                    .controller
                    .devices()
                    .iter()
                    .map(|d| d.name.clone())
                    .collect();
                let mut selected = self.controller.selected_index();
                let selected_text = names
                    .get(selected)
                    .cloned()
                    .unwrap_or_else(|| "No cameras".to_string());

                ui.add_enabled_ui(!running, |ui| {
                    egui::ComboBox::from_id_source("device")
                        .width(240.0)
                        .selected_text(selected_text)
                        .show_ui(ui, |ui| {
                            for (i, name) in names.iter().enumerate() {
                                ui.selectable_value(&mut selected, i, name);
                            }
                        });
                });
                if selected != self.controller.selected_index() {
                    self.on_select(selected);
                }

                ui.separator();

                if ui.add_enabled(bound && !running, egui::Button::new("Start")).clicked() {
                    self.on_start();
                }
                if ui.add_enabled(bound && running, egui::Button::new("Stop")).clicked() {
                    self.on_stop();
                }
                if ui.add_enabled(bound && running, egui::Button::new("Capture")).clicked() {
                    self.on_capture();
                }

                ui.separator();
                ui.radio_value(&mut self.requested_format, ImageFormat::Jpeg, "JPEG");
                ui.radio_value(&mut self.requested_format, ImageFormat::Png, "PNG");
            });

            ui.horizontal(|ui| {
                ui.label("Save to:");
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.output_dir_input)
                        .desired_width(f32::INFINITY),
                );
                if response.lost_focus() {
                    let trimmed = self.output_dir_input.trim();
                    let dir = if trimmed.is_empty() {
                        None
                    } else {
                        Some(std::path::PathBuf::from(trimmed))
                    };
                    self.snapshots.set_output_dir(dir);
                }
            });
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.label(&self.status);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            match (&self.texture, running) {
                (Some(texture), true) => {
                    let available = ui.available_size();
                    ui.centered_and_justified(|ui| {
                        ui.add(egui::Image::new(texture).fit_to_exact_size(available));
                    });
                }
                _ => {
                    ui.centered_and_justified(|ui| {
                        ui.label(if running {
                            "Waiting for frames…"
                        } else {
                            "Preview stopped"
                        });
                    });
                }
            }
        });

        self.show_notice(ctx);

        // Keep the preview moving; slow refresh is enough for hot-plug polling
        if running {
            ctx.request_repaint_after(Duration::from_millis(33));
        } else {
            ctx.request_repaint_after(Duration::from_millis(500));
        }
    }
}
