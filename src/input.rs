use crate::scheduler::RepaintScheduler;
use crate::session::OverlaySession;
use crate::stroke::{StrokePoint, ToolKind};
use egui::{Color32, Pos2, Rect};

/// Pen width for mouse/touch input, in points.
pub const MOUSE_PEN_WIDTH: f32 = 3.0;
/// Width of a full-pressure stylus pen stroke, in points.
pub const MAX_STYLUS_WIDTH: f32 = 8.0;
/// Pressure floor so a zero-pressure stylus tap still leaves visible ink.
pub const MIN_STYLUS_PRESSURE: f32 = 0.15;

// Move samples closer than this to the last recorded point are dropped so
// slow gestures do not balloon point lists.
const MIN_POINT_DISTANCE: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerDevice {
    Mouse,
    Touch,
    Stylus { pressure: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// Drawing-surface classification of the element under the pointer, decided
/// per event before any stroke mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetClass {
    /// Free page area: the overlay consumes the event and draws.
    Drawable,
    /// Form controls and other host widgets: the event passes through
    /// untouched so the page stays operable under the overlay.
    Interactive,
    /// The overlay's own toolbar, excluded so its buttons stay clickable.
    Toolbar,
}

/// One pointer event as seen by the overlay. `pos` is in page space (scroll
/// offset already applied by the host shell).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub pos: Pos2,
    pub device: PointerDevice,
    pub target: TargetClass,
}

/// Per-frame registry of screen rects that must never capture drawing input.
/// The host page registers its interactive widget rects; the toolbar registers
/// its window rect. The allowlist fails open: anything registered here wins
/// over drawing.
#[derive(Debug, Clone, Default)]
pub struct TargetIndex {
    interactive: Vec<Rect>,
    toolbar: Option<Rect>,
}

impl TargetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_interactive(&mut self, rect: Rect) {
        self.interactive.push(rect);
    }

    pub fn register_toolbar(&mut self, rect: Rect) {
        self.toolbar = Some(rect);
    }

    /// Classifies a screen-space position. Toolbar containment is checked
    /// first so toolbar buttons keep working even when a host widget sits
    /// underneath the floating window.
    pub fn classify(&self, pos: Pos2) -> TargetClass {
        if self.toolbar.is_some_and(|rect| rect.contains(pos)) {
            return TargetClass::Toolbar;
        }
        if self.interactive.iter().any(|rect| rect.contains(pos)) {
            return TargetClass::Interactive;
        }
        TargetClass::Drawable
    }
}

/// Translates classified pointer events into session mutations.
///
/// A consumed event is the `preventDefault` analog: the host shell must not
/// let the underlying page react to it. Events over interactive targets are
/// never consumed.
#[derive(Debug, Default)]
pub struct InputRouter;

impl InputRouter {
    pub fn new() -> Self {
        Self
    }

    /// Routes one event. Returns true when the overlay consumed it.
    pub fn route(
        &self,
        session: &mut OverlaySession,
        scheduler: &mut RepaintScheduler,
        tool: ToolKind,
        color: Color32,
        event: &PointerEvent,
    ) -> bool {
        match event.phase {
            PointerPhase::Down => {
                if event.target != TargetClass::Drawable {
                    return false;
                }
                session.begin_stroke(tool, color, self.sample_point(tool, event));
                scheduler.request();
                true
            }
            PointerPhase::Move => {
                if !session.is_drawing() {
                    return false;
                }
                if let Some(active) = session.active_stroke() {
                    let last = active.last_point();
                    if last.pos().distance(event.pos) < MIN_POINT_DISTANCE {
                        // Still part of the gesture, just not worth recording.
                        return true;
                    }
                }
                session.append_point(self.sample_point(tool, event));
                scheduler.request();
                true
            }
            // Cancel finalizes whatever was drawn so far rather than dropping
            // it: partial ink is still meaningful.
            PointerPhase::Up | PointerPhase::Cancel => {
                if !session.is_drawing() {
                    return false;
                }
                session.finish_stroke();
                scheduler.request();
                true
            }
        }
    }

    /// Width sampling applies to the pen tool only; highlighter and eraser
    /// render at fixed widths regardless of input device.
    fn sample_point(&self, tool: ToolKind, event: &PointerEvent) -> StrokePoint {
        if tool != ToolKind::Pen {
            return StrokePoint::new(event.pos);
        }
        let width = match event.device {
            PointerDevice::Stylus { pressure } => {
                pressure.clamp(MIN_STYLUS_PRESSURE, 1.0) * MAX_STYLUS_WIDTH
            }
            PointerDevice::Mouse | PointerDevice::Touch => MOUSE_PEN_WIDTH,
        };
        StrokePoint::with_width(event.pos, width)
    }
}
