use crate::input::TargetIndex;
use crate::overlay::{AnnotationOverlay, OverlayPrefs};
use egui::{Pos2, Rect, Vec2};

/// Demo host page: a scrollable case-review form standing in for the page the
/// overlay annotates. Its interactive widgets register themselves with the
/// target index every frame so drawing mode leaves them clickable.
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct OverlayApp {
    client_name: String,
    advisor_notes: String,
    coverage_target: f32,
    include_spouse: bool,
    prefs: OverlayPrefs,
    // Session state never persists; a fresh overlay is built on startup.
    #[serde(skip)]
    overlay: AnnotationOverlay,
}

impl Default for OverlayApp {
    fn default() -> Self {
        Self {
            client_name: String::new(),
            advisor_notes: String::new(),
            coverage_target: 250_000.0,
            include_spouse: false,
            prefs: OverlayPrefs::default(),
            overlay: AnnotationOverlay::new(OverlayPrefs::default()),
        }
    }
}

impl OverlayApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        if let Some(storage) = cc.storage {
            let mut app: OverlayApp = eframe::get_value(storage, eframe::APP_KEY).unwrap_or_default();
            app.overlay = AnnotationOverlay::new(app.prefs);
            return app;
        }
        Default::default()
    }
}

impl eframe::App for OverlayApp {
    /// Persists toolbar preferences (tool/color), nothing else.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        self.prefs = self.overlay.prefs();
        eframe::set_value(storage, eframe::APP_KEY, self);
    }

    /// Capture-phase interception point: consumed drawing events are removed
    /// here, before egui distributes input to the widgets below.
    fn raw_input_hook(&mut self, ctx: &egui::Context, raw_input: &mut egui::RawInput) {
        self.overlay.handle_raw_input(ctx, raw_input);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut targets = TargetIndex::new();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Case review");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let label = if self.overlay.is_active() {
                        "Stop annotating"
                    } else {
                        "Annotate"
                    };
                    let response = ui.button(label);
                    if response.clicked() {
                        if self.overlay.is_active() {
                            self.overlay.deactivate();
                        } else {
                            self.overlay.activate();
                        }
                    }
                    targets.register_interactive(response.rect);
                });
            });
        });

        let mut scroll = Vec2::ZERO;
        egui::CentralPanel::default().show(ctx, |ui| {
            let output = egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Discovery summary");
                ui.label(
                    "Review the captured client profile below. Toggle Annotate to \
                     mark up this page; form fields stay editable while drawing \
                     mode is on.",
                );
                ui.separator();

                egui::Grid::new("client_profile")
                    .num_columns(2)
                    .spacing([24.0, 8.0])
                    .show(ui, |ui| {
                        ui.label("Client name");
                        let response = ui.text_edit_singleline(&mut self.client_name);
                        targets.register_interactive(response.rect);
                        ui.end_row();

                        ui.label("Coverage target");
                        let response = ui.add(
                            egui::Slider::new(&mut self.coverage_target, 50_000.0..=2_000_000.0)
                                .step_by(10_000.0),
                        );
                        targets.register_interactive(response.rect);
                        ui.end_row();

                        ui.label("Include spouse");
                        let response = ui.checkbox(&mut self.include_spouse, "");
                        targets.register_interactive(response.rect);
                        ui.end_row();
                    });

                ui.separator();
                ui.label("Advisor notes");
                let response = ui.text_edit_multiline(&mut self.advisor_notes);
                targets.register_interactive(response.rect);

                ui.separator();
                for section in 1..=8 {
                    ui.heading(format!("Needs analysis, section {section}"));
                    for _ in 0..6 {
                        ui.label(
                            "Projected liabilities and income replacement figures \
                             derived from the interview responses appear here. \
                             Annotations drawn over this text stay anchored to it \
                             while the page scrolls.",
                        );
                    }
                    ui.add_space(12.0);
                }
            });
            scroll = output.state.offset;

            // The scroll gutter is host machinery, not drawable page area.
            targets.register_interactive(scrollbar_gutter(
                ui.max_rect(),
                &ui.spacing().scroll,
                ui.style().interaction.interact_radius,
            ));
        });

        let response = self.overlay.show(ctx, scroll, &mut targets);
        if response.close_requested {
            log::debug!("overlay closed from keyboard or toolbar");
        }
    }
}

/// Screen strip occupied by the vertical scrollbar, widened by `hit_slop` so
/// near misses still reach the bar instead of leaving ink over it.
fn scrollbar_gutter(panel: Rect, style: &egui::style::ScrollStyle, hit_slop: f32) -> Rect {
    let bar = if style.floating {
        style.floating_width
    } else {
        style.bar_width
    };
    let width = bar + style.bar_inner_margin + style.bar_outer_margin + hit_slop;
    Rect::from_min_max(
        Pos2::new(panel.right() - width, panel.top()),
        panel.right_bottom(),
    )
}
