use eframe::egui;

use animpal::playback::{Playback, PlaybackMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportAction {
    GotoStart,
    StepBack,
    PlayReverse,
    Bounce,
    Stop,
    PlayForward,
    StepForward,
    GotoEnd,
    ToggleLoop,
}

struct TransportButton {
    action: TransportAction,
    label: &'static str,
    tooltip: &'static str,
}

const BUTTONS: [TransportButton; 9] = [
    TransportButton {
        action: TransportAction::GotoStart,
        label: "⏮",
        tooltip: "Go to frame 1",
    },
    TransportButton {
        action: TransportAction::StepBack,
        label: "⏪",
        tooltip: "Step back one frame",
    },
    TransportButton {
        action: TransportAction::PlayReverse,
        label: "◀",
        tooltip: "Play in reverse",
    },
    TransportButton {
        action: TransportAction::Bounce,
        label: "↔",
        tooltip: "Bounce play - forward, then back, repeat",
    },
    TransportButton {
        action: TransportAction::Stop,
        label: "⏹",
        tooltip: "Stop",
    },
    TransportButton {
        action: TransportAction::PlayForward,
        label: "▶",
        tooltip: "Play forward",
    },
    TransportButton {
        action: TransportAction::StepForward,
        label: "⏩",
        tooltip: "Advance one frame",
    },
    TransportButton {
        action: TransportAction::GotoEnd,
        label: "⏭",
        tooltip: "Go to last frame",
    },
    TransportButton {
        action: TransportAction::ToggleLoop,
        label: "🔁",
        tooltip: "Turn looping on or off",
    },
];

fn is_active(action: TransportAction, playback: &Playback) -> bool {
    match action {
        TransportAction::PlayForward => playback.mode() == PlaybackMode::Forward,
        TransportAction::PlayReverse => playback.mode() == PlaybackMode::Reverse,
        TransportAction::Bounce => playback.mode() == PlaybackMode::Bounce,
        TransportAction::ToggleLoop => playback.is_looping(),
        _ => false,
    }
}

/// Row of transport buttons under the preview.
pub fn transport_bar(ui: &mut egui::Ui, playback: &Playback) -> Option<TransportAction> {
    let mut clicked = None;

    ui.horizontal(|ui| {
        let button_width = 48.0;
        let spacing = ui.spacing().item_spacing.x;
        let row_width = BUTTONS.len() as f32 * (button_width + spacing);
        ui.add_space(((ui.available_width() - row_width) / 2.0).max(0.0));

        for button in &BUTTONS {
            let text = egui::RichText::new(button.label).size(24.0);
            let widget = egui::Button::new(text)
                .selected(is_active(button.action, playback))
                .min_size(egui::vec2(button_width, button_width));
            if ui.add(widget).on_hover_text(button.tooltip).clicked() {
                clicked = Some(button.action);
            }
        }
    });

    if playback.total() > 0 {
        ui.vertical_centered(|ui| {
            ui.label(format!(
                "Frame {} of {}",
                playback.cursor() + 1,
                playback.total()
            ));
        });
    }

    clicked
}

/// Arrow keys step, Home/End jump, space toggles forward play.
pub fn keyboard_action(ctx: &egui::Context, playback: &Playback) -> Option<TransportAction> {
    ctx.input(|i| {
        if i.key_pressed(egui::Key::ArrowLeft) {
            Some(TransportAction::StepBack)
        } else if i.key_pressed(egui::Key::ArrowRight) {
            Some(TransportAction::StepForward)
        } else if i.key_pressed(egui::Key::Home) {
            Some(TransportAction::GotoStart)
        } else if i.key_pressed(egui::Key::End) {
            Some(TransportAction::GotoEnd)
        } else if i.key_pressed(egui::Key::Space) {
            if playback.is_playing() {
                Some(TransportAction::Stop)
            } else {
                Some(TransportAction::PlayForward)
            }
        } else {
            None
        }
    })
}
