use eframe::egui;

use animpal::config::{Direction, ExportSettings, FrameHold, FrameRate, Resolution};
use animpal::sequence::ImageSequence;

/// Buttons pressed in the settings bar this frame.
#[derive(Debug, Default)]
pub struct SettingsBarResponse {
    pub add_images: bool,
    pub save_video: bool,
    pub new_project: bool,
}

/// Top bar: add images, export settings, save and new.
pub fn settings_bar(ui: &mut egui::Ui, settings: &mut ExportSettings) -> SettingsBarResponse {
    let mut response = SettingsBarResponse::default();

    ui.horizontal(|ui| {
        if ui
            .button("📁 Add Images")
            .on_hover_text("Add images to the list")
            .clicked()
        {
            response.add_images = true;
        }

        ui.separator();

        ui.group(|ui| {
            ui.label("Direction");
            egui::ComboBox::from_id_source("direction")
                .selected_text(settings.direction.label())
                .show_ui(ui, |ui| {
                    for direction in Direction::ALL {
                        ui.selectable_value(&mut settings.direction, direction, direction.label());
                    }
                });
        });

        ui.group(|ui| {
            ui.label("fps");
            egui::ComboBox::from_id_source("fps")
                .selected_text(settings.fps.to_string())
                .show_ui(ui, |ui| {
                    for fps in FrameRate::ALL {
                        ui.selectable_value(&mut settings.fps, fps, fps.to_string());
                    }
                });
        });

        ui.group(|ui| {
            ui.label("Resolution");
            egui::ComboBox::from_id_source("resolution")
                .selected_text(settings.resolution.label())
                .show_ui(ui, |ui| {
                    for resolution in Resolution::ALL {
                        ui.selectable_value(
                            &mut settings.resolution,
                            resolution,
                            resolution.label(),
                        );
                    }
                });
        });

        ui.group(|ui| {
            ui.label("Framehold");
            let mut hold = settings.frame_hold.get();
            ui.add(egui::Slider::new(&mut hold, FrameHold::MIN..=FrameHold::MAX));
            settings.frame_hold = FrameHold::clamped(i64::from(hold));
            if ui
                .button("↺")
                .on_hover_text("Reset framehold to '1'")
                .clicked()
            {
                settings.frame_hold = FrameHold::default();
            }
        });

        ui.separator();

        if ui
            .button("💾 Save Video")
            .on_hover_text("Save the video file")
            .clicked()
        {
            response.save_video = true;
        }

        if ui
            .button("🗋 New")
            .on_hover_text("Clear the image list and start a new project")
            .clicked()
        {
            response.new_project = true;
        }
    });

    response
}

/// File list with name and folder columns. Returns the clicked row.
pub fn image_list(ui: &mut egui::Ui, sequence: &ImageSequence, current: usize) -> Option<usize> {
    let mut clicked = None;

    ui.heading("Images");
    ui.separator();

    if sequence.is_empty() {
        ui.label("No images loaded");
        return None;
    }

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            egui::Grid::new("image_list")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui| {
                    ui.strong("File Name");
                    ui.strong("Folder");
                    ui.end_row();

                    for (index, frame) in sequence.frames().iter().enumerate() {
                        if ui
                            .selectable_label(index == current, frame.file_name())
                            .clicked()
                        {
                            clicked = Some(index);
                        }
                        ui.label(frame.folder_name());
                        ui.end_row();
                    }
                });
        });

    clicked
}
