use crate::stroke::ToolKind;
use egui::{Color32, Rect, RichText, Vec2};

/// Fixed annotation palette; color selection applies to the next stroke only.
pub const PALETTE: [Color32; 6] = [
    Color32::from_rgb(0xe5, 0x39, 0x35), // red
    Color32::from_rgb(0xfb, 0x8c, 0x00), // orange
    Color32::from_rgb(0xfd, 0xd8, 0x35), // yellow
    Color32::from_rgb(0x43, 0xa0, 0x47), // green
    Color32::from_rgb(0x1e, 0x88, 0xe5), // blue
    Color32::from_rgb(0x21, 0x21, 0x21), // near-black
];

pub fn palette_color(index: usize) -> Color32 {
    PALETTE[index.min(PALETTE.len() - 1)]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarCommand {
    SelectTool(ToolKind),
    SelectColor(usize),
    Undo,
    Redo,
    ClearAll,
    Close,
}

#[derive(Debug, Default)]
pub struct ToolbarResponse {
    pub commands: Vec<ToolbarCommand>,
    /// Screen rect of the toolbar window, registered with the target index so
    /// pointer events over it are never captured for drawing.
    pub rect: Option<Rect>,
}

/// Floating toolbar window. History buttons stay enabled even when their
/// source stack is empty; the operations tolerate the no-op.
pub fn toolbar_window(
    ctx: &egui::Context,
    active_tool: ToolKind,
    color_index: usize,
    undo_len: usize,
    redo_len: usize,
) -> ToolbarResponse {
    let mut response = ToolbarResponse::default();

    let window = egui::Window::new("Annotate")
        .resizable(false)
        .collapsible(false)
        // Always above the ink canvas, which paints at Order::Middle.
        .order(egui::Order::Foreground)
        .default_pos(egui::pos2(24.0, 64.0))
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                for tool in [ToolKind::Pen, ToolKind::Highlighter, ToolKind::Eraser] {
                    if ui
                        .selectable_label(active_tool == tool, tool.label())
                        .clicked()
                    {
                        log::info!("tool selected from toolbar: {}", tool.label());
                        response.commands.push(ToolbarCommand::SelectTool(tool));
                    }
                }
            });

            ui.horizontal(|ui| {
                for (index, color) in PALETTE.iter().enumerate() {
                    let selected = index == color_index;
                    let swatch = egui::Button::new(RichText::new(" ").monospace())
                        .fill(*color)
                        .min_size(Vec2::splat(20.0))
                        .stroke(if selected {
                            egui::Stroke::new(2.0, ui.visuals().strong_text_color())
                        } else {
                            egui::Stroke::NONE
                        });
                    if ui.add(swatch).clicked() {
                        response.commands.push(ToolbarCommand::SelectColor(index));
                    }
                }
            });

            ui.separator();

            ui.horizontal(|ui| {
                if ui.button("Undo").clicked() {
                    response.commands.push(ToolbarCommand::Undo);
                }
                if ui.button("Redo").clicked() {
                    response.commands.push(ToolbarCommand::Redo);
                }
                if ui.button("Clear").clicked() {
                    response.commands.push(ToolbarCommand::ClearAll);
                }
                if ui.button("Close").clicked() {
                    response.commands.push(ToolbarCommand::Close);
                }
            });

            ui.horizontal(|ui| {
                ui.small(format!("Strokes: {undo_len}"));
                ui.small(format!("Undone: {redo_len}"));
            });
        });

    response.rect = window.map(|w| w.response.rect);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_lookup_clamps_out_of_range_index() {
        assert_eq!(palette_color(0), PALETTE[0]);
        assert_eq!(palette_color(PALETTE.len() + 5), PALETTE[PALETTE.len() - 1]);
    }

    #[test]
    fn palette_entries_are_distinct_and_opaque() {
        for (i, color) in PALETTE.iter().enumerate() {
            assert_eq!(color.a(), 255, "palette entry {i} is not opaque");
            for other in &PALETTE[i + 1..] {
                assert_ne!(color, other, "palette entry {i} is duplicated");
            }
        }
    }
}
