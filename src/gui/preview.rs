use eframe::egui;

use animpal::composite::composite_rgb;
use animpal::sequence::ImageSequence;

/// Size the preview is rendered at, independent of the export resolution.
pub const PREVIEW_SIZE: [u32; 2] = [1280, 720];

/// Lazily uploaded preview textures, one per frame.
#[derive(Default)]
pub struct PreviewCache {
    textures: Vec<Option<egui::TextureHandle>>,
}

impl PreviewCache {
    pub fn invalidate(&mut self) {
        self.textures.clear();
    }

    pub fn texture(
        &mut self,
        ctx: &egui::Context,
        sequence: &ImageSequence,
        index: usize,
    ) -> Option<egui::TextureHandle> {
        let frame = sequence.frame(index)?;
        if self.textures.len() != sequence.len() {
            self.textures.resize(sequence.len(), None);
        }

        let slot = &mut self.textures[index];
        if slot.is_none() {
            let [width, height] = PREVIEW_SIZE;
            let scaled = composite_rgb(&frame.image, width, height);
            let colour_image = egui::ColorImage::from_rgb(
                [scaled.width() as usize, scaled.height() as usize],
                scaled.as_raw(),
            );
            *slot = Some(ctx.load_texture(
                format!("preview_{}", index),
                colour_image,
                egui::TextureOptions::LINEAR,
            ));
        }
        slot.clone()
    }
}

/// Draw the preview area: black 16:9 box with the current frame on top.
pub fn show_preview(ui: &mut egui::Ui, texture: Option<&egui::TextureHandle>) {
    let available = ui.available_size();
    let aspect = PREVIEW_SIZE[0] as f32 / PREVIEW_SIZE[1] as f32;
    let width = available.x.min(available.y * aspect).min(PREVIEW_SIZE[0] as f32);
    let size = egui::vec2(width, width / aspect);

    ui.centered_and_justified(|ui| {
        let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
        ui.painter().rect_filled(rect, 0.0, egui::Color32::BLACK);
        if let Some(texture) = texture {
            ui.painter().image(
                texture.id(),
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
    });
}
