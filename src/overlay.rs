use crate::input::{
    InputRouter, PointerDevice, PointerEvent, PointerPhase, TargetClass, TargetIndex,
};
use crate::panels::toolbar::{self, ToolbarCommand};
use crate::renderer::{Renderer, Viewport};
use crate::scheduler::RepaintScheduler;
use crate::session::OverlaySession;
use crate::stroke::ToolKind;
use egui::{Color32, Key, Modifiers, Pos2, Rect, TextureOptions, Vec2};
use std::time::{Duration, Instant};

/// Delay between activation and the first draw, letting the host page's
/// layout and scroll position settle before coordinates are sampled.
const SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Toolbar selections that survive restarts through eframe storage. Stroke
/// data is session state and is never persisted.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OverlayPrefs {
    pub tool: ToolKind,
    pub color_index: usize,
}

impl Default for OverlayPrefs {
    fn default() -> Self {
        Self {
            tool: ToolKind::Pen,
            color_index: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct OverlayResponse {
    /// Set when Escape or the toolbar's close button was pressed this frame.
    /// The overlay has already deactivated itself; the host uses this to sync
    /// its own toggle state.
    pub close_requested: bool,
}

/// The annotation overlay: a drawing surface layered over the host page,
/// driven by an activation flag. All session state lives and dies with one
/// activation.
pub struct AnnotationOverlay {
    session: OverlaySession,
    renderer: Renderer,
    scheduler: RepaintScheduler,
    router: InputRouter,
    prefs: OverlayPrefs,
    texture: Option<egui::TextureHandle>,
    activated_at: Option<Instant>,
    last_viewport: Option<Viewport>,
    // Last frame's layout snapshot, used by the raw-input pass to classify
    // pointer events before egui processes them.
    targets: TargetIndex,
    scroll: Vec2,
    // Latest touch force seen this activation; classifies subsequent
    // synthesized pointer events as stylus input.
    touch_force: Option<f32>,
    active: bool,
}

impl Default for AnnotationOverlay {
    fn default() -> Self {
        Self::new(OverlayPrefs::default())
    }
}

impl AnnotationOverlay {
    pub fn new(prefs: OverlayPrefs) -> Self {
        Self {
            session: OverlaySession::new(),
            renderer: Renderer::new(),
            scheduler: RepaintScheduler::new(),
            router: InputRouter::new(),
            prefs,
            texture: None,
            activated_at: None,
            last_viewport: None,
            targets: TargetIndex::new(),
            scroll: Vec2::ZERO,
            touch_force: None,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn prefs(&self) -> OverlayPrefs {
        self.prefs
    }

    pub fn session(&self) -> &OverlaySession {
        &self.session
    }

    pub fn activate(&mut self) {
        if self.active {
            return;
        }
        self.active = true;
        self.session.reset();
        self.activated_at = Some(Instant::now());
        self.scheduler.request();
        log::info!("annotation overlay activated");
    }

    /// Detaches the overlay and discards all session state; reactivation
    /// starts from an empty canvas.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.session.reset();
        self.scheduler.cancel();
        self.renderer.release();
        self.texture = None;
        self.activated_at = None;
        self.last_viewport = None;
        self.targets = TargetIndex::new();
        self.scroll = Vec2::ZERO;
        self.touch_force = None;
        log::info!("annotation overlay deactivated");
    }

    /// Per-frame drive. The host has already laid out its page and registered
    /// its interactive widget rects in `targets`; `scroll` is the host page's
    /// current scroll offset.
    pub fn show(
        &mut self,
        ctx: &egui::Context,
        scroll: Vec2,
        targets: &mut TargetIndex,
    ) -> OverlayResponse {
        if !self.active {
            return OverlayResponse::default();
        }
        let mut close_requested = false;

        // Redo is checked first: it is the stricter chord of the two.
        let redo = ctx.input_mut(|i| i.consume_key(Modifiers::COMMAND | Modifiers::SHIFT, Key::Z));
        let undo = ctx.input_mut(|i| i.consume_key(Modifiers::COMMAND, Key::Z));
        if ctx.input_mut(|i| i.consume_key(Modifiers::NONE, Key::Escape)) {
            close_requested = true;
        }
        if redo {
            self.session.redo();
            self.scheduler.request();
        } else if undo {
            self.session.undo();
            self.scheduler.request();
        }

        // The toolbar registers its rect into `targets`, which the end-of-frame
        // snapshot hands to the next raw-input pass.
        let toolbar = toolbar::toolbar_window(
            ctx,
            self.prefs.tool,
            self.prefs.color_index,
            self.session.completed_strokes().len(),
            self.session.redo_len(),
        );
        if let Some(rect) = toolbar.rect {
            targets.register_toolbar(rect);
        }
        for command in toolbar.commands {
            match command {
                ToolbarCommand::SelectTool(tool) => self.prefs.tool = tool,
                ToolbarCommand::SelectColor(index) => self.prefs.color_index = index,
                ToolbarCommand::Undo => {
                    self.session.undo();
                    self.scheduler.request();
                }
                ToolbarCommand::Redo => {
                    self.session.redo();
                    self.scheduler.request();
                }
                ToolbarCommand::ClearAll => {
                    self.session.clear_all();
                    self.scheduler.request();
                }
                ToolbarCommand::Close => close_requested = true,
            }
        }

        // Scroll, resize and zoom all invalidate the page-to-surface
        // transform, so any viewport change forces a redraw.
        let viewport = Viewport::new(scroll, ctx.screen_rect().size(), ctx.pixels_per_point());
        if self.last_viewport != Some(viewport) {
            self.scheduler.request();
        }
        if self.renderer.resize(&viewport) {
            self.scheduler.request();
        }
        self.last_viewport = Some(viewport);

        let settled = self
            .activated_at
            .is_none_or(|at| at.elapsed() >= SETTLE_DELAY);
        if !settled {
            // Keep the frame loop alive until the settle window elapses.
            ctx.request_repaint_after(SETTLE_DELAY);
        } else if self.scheduler.take() {
            self.renderer.render(&self.session, &viewport);
            if let Some(surface) = self.renderer.surface() {
                let image = surface.to_color_image();
                match &mut self.texture {
                    Some(texture) => texture.set(image, TextureOptions::LINEAR),
                    None => {
                        self.texture =
                            Some(ctx.load_texture("ink-overlay-canvas", image, TextureOptions::LINEAR));
                    }
                }
            }
        }

        self.paint_canvas(ctx);

        if self.session.is_drawing() {
            ctx.set_cursor_icon(egui::CursorIcon::Crosshair);
        }

        // Snapshot for the next raw-input pass: pointer events are classified
        // against the layout of the frame they interrupt.
        self.targets = targets.clone();
        self.scroll = scroll;

        if close_requested {
            self.deactivate();
        }
        OverlayResponse { close_requested }
    }

    /// Pre-frame input pass, wired to `eframe::App::raw_input_hook`. Drawing
    /// events are routed into the session and stripped from the raw input so
    /// host widgets never see them, the capture-phase `preventDefault`
    /// equivalent; events over interactive targets pass through untouched.
    /// Classification runs against the previous frame's layout, the same data
    /// egui's own hit testing uses.
    pub fn handle_raw_input(&mut self, ctx: &egui::Context, raw: &mut egui::RawInput) {
        if !self.active {
            return;
        }
        let color = toolbar::palette_color(self.prefs.color_index);
        let mut events = std::mem::take(&mut raw.events);
        events.retain(|event| {
            if let egui::Event::Touch { force, phase, .. } = event {
                self.touch_force = match phase {
                    egui::TouchPhase::End | egui::TouchPhase::Cancel => None,
                    _ => *force,
                };
            }
            let Some(pointer) = self.pointer_event_from(ctx, event) else {
                return true;
            };
            let consumed = self.router.route(
                &mut self.session,
                &mut self.scheduler,
                self.prefs.tool,
                color,
                &pointer,
            );
            !consumed
        });
        raw.events = events;
    }

    /// Maps raw egui events onto the overlay's pointer model. Touch contacts
    /// are already synthesized into pointer events by egui, so only the
    /// pointer stream is routed; touch events just contribute force.
    fn pointer_event_from(&self, ctx: &egui::Context, event: &egui::Event) -> Option<PointerEvent> {
        let device = match self.touch_force {
            Some(pressure) => PointerDevice::Stylus { pressure },
            None => PointerDevice::Mouse,
        };
        match event {
            egui::Event::PointerButton {
                pos,
                button: egui::PointerButton::Primary,
                pressed,
                ..
            } => Some(PointerEvent {
                phase: if *pressed {
                    PointerPhase::Down
                } else {
                    PointerPhase::Up
                },
                pos: *pos + self.scroll,
                device,
                target: self.classify_at(ctx, *pos),
            }),
            egui::Event::PointerMoved(pos) => Some(PointerEvent {
                phase: PointerPhase::Move,
                pos: *pos + self.scroll,
                device,
                target: self.classify_at(ctx, *pos),
            }),
            // The pointer left the window mid-gesture: finalize what exists.
            egui::Event::PointerGone => Some(PointerEvent {
                phase: PointerPhase::Cancel,
                pos: Pos2::ZERO,
                device,
                target: TargetClass::Drawable,
            }),
            _ => None,
        }
    }

    /// Registered rects are checked first; any other interactable floating
    /// layer (host dialogs, menus, popups) counts as Interactive. Widgets
    /// nobody registered fail open instead of being captured for ink; the
    /// cost of a missed stroke is lower than a blocked control.
    fn classify_at(&self, ctx: &egui::Context, pos: Pos2) -> TargetClass {
        match self.targets.classify(pos) {
            TargetClass::Drawable if ctx.layer_id_at(pos).is_some() => TargetClass::Interactive,
            class => class,
        }
    }

    fn paint_canvas(&self, ctx: &egui::Context) {
        let Some(texture) = &self.texture else {
            return;
        };
        egui::Area::new(egui::Id::new("ink_overlay_canvas"))
            .order(egui::Order::Middle)
            .fixed_pos(Pos2::ZERO)
            .interactable(false)
            .show(ctx, |ui| {
                let rect = ctx.screen_rect();
                let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
                ui.painter().image(texture.id(), rect, uv, Color32::WHITE);
            });
    }
}
