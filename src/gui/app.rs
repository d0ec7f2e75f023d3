use eframe::egui;
use log::{error, info, warn};
use rfd::FileDialog;
use std::path::Path;
use std::time::Instant;

use animpal::config::ExportSettings;
use animpal::encoder::FfmpegEncoder;
use animpal::export::{ensure_mp4_extension, ExportSession, ExportStep};
use animpal::playback::{Playback, TickClock};
use animpal::sequence::{ImageSequence, SequenceLoader};
use animpal::settings::{AppSettings, WindowGeometry};

use crate::controls::{keyboard_action, transport_bar, TransportAction};
use crate::panels::{image_list, settings_bar};
use crate::preview::{show_preview, PreviewCache};

/// Long-running work stepped once per UI frame behind a modal window.
enum Task {
    Loading(SequenceLoader),
    Exporting {
        session: ExportSession,
        encoding_shown: bool,
    },
}

pub struct AnimPalApp {
    settings: AppSettings,
    sequence: ImageSequence,
    playback: Playback,
    clock: TickClock,
    preview: PreviewCache,
    encoder: FfmpegEncoder,
    task: Option<Task>,
    cancel_requested: bool,
    error_message: Option<String>,
    status_message: String,
    window: Option<WindowGeometry>,
}

impl AnimPalApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: AppSettings) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let mut playback = Playback::new();
        playback.set_direction(settings.export.direction);
        playback.set_frame_hold(settings.export.frame_hold);

        Self {
            sequence: ImageSequence::new(settings.export.resolution),
            clock: TickClock::new(settings.export.fps, Instant::now()),
            playback,
            preview: PreviewCache::default(),
            encoder: FfmpegEncoder::new(),
            task: None,
            cancel_requested: false,
            error_message: None,
            status_message: "Ready".to_string(),
            window: settings.window,
            settings,
        }
    }

    fn is_busy(&self) -> bool {
        self.task.is_some() || self.error_message.is_some()
    }

    fn save_settings(&self) {
        if let Err(e) = self.settings.save() {
            warn!("Failed to save settings: {}", e);
        }
    }

    fn apply_settings(&mut self, previous: ExportSettings) {
        let current = self.settings.export;
        if current == previous {
            return;
        }

        if current.resolution != previous.resolution {
            self.sequence.set_resolution(current.resolution);
            self.preview.invalidate();
        }
        if current.fps != previous.fps {
            self.clock.reset(current.fps, Instant::now());
        }
        self.playback.set_direction(current.direction);
        if current.frame_hold != previous.frame_hold {
            self.playback.set_frame_hold(current.frame_hold);
        }

        self.save_settings();
    }

    fn apply_transport(&mut self, action: TransportAction) {
        let was_playing = self.playback.is_playing();
        match action {
            TransportAction::GotoStart => {
                self.playback.goto_start();
            }
            TransportAction::StepBack => {
                self.playback.step_back();
            }
            TransportAction::PlayReverse => self.playback.play_reverse(),
            TransportAction::Bounce => self.playback.toggle_bounce(),
            TransportAction::Stop => self.playback.stop(),
            TransportAction::PlayForward => self.playback.play_forward(),
            TransportAction::StepForward => {
                self.playback.step_forward();
            }
            TransportAction::GotoEnd => {
                self.playback.goto_end();
            }
            TransportAction::ToggleLoop => {
                let looping = self.playback.toggle_loop();
                self.status_message = format!("Looping {}", if looping { "on" } else { "off" });
            }
        }
        if !was_playing && self.playback.is_playing() {
            self.clock.reset(self.settings.export.fps, Instant::now());
        }
    }

    fn add_images(&mut self) {
        let files = FileDialog::new()
            .set_title("Select Images")
            .set_directory(self.settings.image_dir())
            .add_filter("Image Files", &["png", "jpg", "bmp", "tif"])
            .pick_files();

        let Some(files) = files.filter(|files| !files.is_empty()) else {
            return;
        };

        if let Some(dir) = files[0].parent() {
            self.settings.last_image_dir = Some(dir.to_path_buf());
            self.save_settings();
        }

        let loader = SequenceLoader::new(&files);
        if loader.total() == 0 {
            self.status_message = "No supported image files selected".to_string();
            return;
        }
        info!("Loading {} images", loader.total());
        self.cancel_requested = false;
        self.task = Some(Task::Loading(loader));
    }

    fn save_video(&mut self) {
        if self.sequence.is_empty() {
            return;
        }

        let path = FileDialog::new()
            .set_title("Save Video")
            .set_directory(self.settings.video_dir())
            .add_filter("MP4 Files", &["mp4"])
            .save_file();
        let Some(path) = path else {
            return;
        };

        if let Some(dir) = path.parent() {
            self.settings.last_video_dir = Some(dir.to_path_buf());
            self.save_settings();
        }

        self.start_export(&ensure_mp4_extension(&path));
    }

    fn start_export(&mut self, output: &Path) {
        self.playback.stop();
        if let Err(e) = self.encoder.ensure_available() {
            self.report_export_error(&e);
            return;
        }
        match ExportSession::new(&self.sequence, self.settings.export, output) {
            Ok(session) => {
                self.cancel_requested = false;
                self.task = Some(Task::Exporting {
                    session,
                    encoding_shown: false,
                });
            }
            Err(e) => self.report_export_error(&e),
        }
    }

    fn report_export_error(&mut self, e: &dyn std::error::Error) {
        error!("Export failed: {}", e);
        self.error_message = Some(format!(
            "An error occurred while saving the video: {}",
            e
        ));
        self.status_message = "Export failed".to_string();
    }

    fn new_project(&mut self) {
        self.sequence.clear();
        self.playback.set_total(0);
        self.preview.invalidate();
        self.status_message = "New project".to_string();
    }

    fn finish_loading(&mut self) {
        self.playback.set_total(self.sequence.len());
        self.playback.goto_start();
        self.status_message = format!("{} images loaded", self.sequence.len());
    }

    /// Advance the running task by one unit of work.
    fn run_task(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };

        match task {
            Task::Loading(mut loader) => {
                if self.cancel_requested {
                    loader.cancel();
                }
                if loader.step(&mut self.sequence).is_some() {
                    self.task = Some(Task::Loading(loader));
                } else {
                    self.finish_loading();
                }
            }
            Task::Exporting {
                mut session,
                encoding_shown,
            } => {
                if self.cancel_requested {
                    session.cancel();
                    self.status_message = "Export cancelled".to_string();
                    return;
                }
                // show the encoding message for one frame before blocking on the encoder
                if session.is_encoding_next() && !encoding_shown {
                    self.task = Some(Task::Exporting {
                        session,
                        encoding_shown: true,
                    });
                    return;
                }
                match session.step(&self.encoder) {
                    Ok(ExportStep::Progress { .. }) => {
                        self.task = Some(Task::Exporting {
                            session,
                            encoding_shown,
                        });
                    }
                    Ok(ExportStep::Finished(path)) => {
                        self.status_message = format!("Saved {}", display_name(&path));
                    }
                    Err(e) => self.report_export_error(&e),
                }
            }
        }
    }

    fn show_task_window(&mut self, ctx: &egui::Context) {
        let Some(task) = &self.task else {
            return;
        };

        let (title, label, fraction) = match task {
            Task::Loading(loader) => {
                (
                    "Loading Images",
                    "Loading images...".to_string(),
                    loader.done() as f32 / loader.total().max(1) as f32,
                )
            }
            Task::Exporting {
                session,
                encoding_shown,
            } => {
                let label = if *encoding_shown {
                    "Encoding video...".to_string()
                } else {
                    "Saving video. Please wait.".to_string()
                };
                (
                    "Saving Video",
                    label,
                    session.done() as f32 / session.total().max(1) as f32,
                )
            }
        };

        let mut cancel = false;
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(label);
                ui.add(egui::ProgressBar::new(fraction).show_percentage());
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });
        if cancel {
            self.cancel_requested = true;
        }
    }

    fn show_error_window(&mut self, ctx: &egui::Context) {
        let Some(message) = &self.error_message else {
            return;
        };

        let mut dismissed = false;
        egui::Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        if dismissed {
            self.error_message = None;
        }
    }

    fn advance_playback(&mut self, ctx: &egui::Context) {
        if !self.playback.is_playing() || self.task.is_some() {
            return;
        }

        let now = Instant::now();
        for _ in 0..self.clock.due_ticks(now) {
            self.playback.tick();
        }
        if self.playback.is_playing() {
            ctx.request_repaint_after(self.clock.until_next(now));
        }
    }

    fn track_window(&mut self, ctx: &egui::Context) {
        let geometry = ctx.input(|i| {
            let viewport = i.viewport();
            match (viewport.outer_rect, viewport.inner_rect) {
                (Some(outer), Some(inner)) => Some(WindowGeometry {
                    x: outer.min.x,
                    y: outer.min.y,
                    width: inner.width(),
                    height: inner.height(),
                }),
                _ => None,
            }
        });
        if geometry.is_some() {
            self.window = geometry;
        }

        if ctx.input(|i| i.viewport().close_requested()) {
            self.settings.remember_window(self.window);
            self.save_settings();
        }
    }
}

impl eframe::App for AnimPalApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.track_window(ctx);
        self.advance_playback(ctx);

        let busy = self.is_busy();

        egui::TopBottomPanel::top("settings").show(ctx, |ui| {
            ui.add_enabled_ui(!busy, |ui| {
                let previous = self.settings.export;
                let response = settings_bar(ui, &mut self.settings.export);
                self.apply_settings(previous);

                if response.add_images {
                    self.add_images();
                }
                if response.save_video {
                    self.save_video();
                }
                if response.new_project {
                    self.new_project();
                }
            });
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.label(&self.status_message);
        });

        egui::TopBottomPanel::bottom("transport").show(ctx, |ui| {
            ui.add_enabled_ui(!busy, |ui| {
                if let Some(action) = transport_bar(ui, &self.playback) {
                    self.apply_transport(action);
                }
            });
        });

        egui::SidePanel::left("image_list")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.add_enabled_ui(!busy, |ui| {
                    if let Some(index) = image_list(ui, &self.sequence, self.playback.cursor()) {
                        self.playback.goto(index);
                    }
                });
            });

        let texture = self
            .preview
            .texture(ctx, &self.sequence, self.playback.cursor());
        egui::CentralPanel::default().show(ctx, |ui| {
            show_preview(ui, texture.as_ref());
        });

        if !busy {
            if let Some(action) = keyboard_action(ctx, &self.playback) {
                self.apply_transport(action);
            }
        }

        self.show_task_window(ctx);
        self.show_error_window(ctx);

        if self.task.is_some() {
            self.run_task();
            ctx.request_repaint();
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
