use crate::stroke::{ActiveStroke, StrokePoint, StrokeRef, ToolKind};
use egui::Color32;

/// In-memory drawing state for one overlay activation.
///
/// Two stacks drive undo/redo: `completed` (oldest first, render order =
/// z-order) and `redo_stack` (most recently undone last). The session is
/// created on activation and wiped on deactivation; nothing here persists.
#[derive(Debug, Default)]
pub struct OverlaySession {
    completed: Vec<StrokeRef>,
    active: Option<ActiveStroke>,
    redo_stack: Vec<StrokeRef>,
    is_drawing: bool,
    revision: u64,
}

impl OverlaySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed_strokes(&self) -> &[StrokeRef] {
        &self.completed
    }

    pub fn active_stroke(&self) -> Option<&ActiveStroke> {
        self.active.as_ref()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn is_drawing(&self) -> bool {
        self.is_drawing
    }

    pub fn can_undo(&self) -> bool {
        !self.completed.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Low-frequency change counter for UI that depends on the stack contents
    /// (toolbar enablement labels). Point appends during a gesture do not bump
    /// it; stack mutations do.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Starts a new stroke seeded with one point. Any pointer-down discards
    /// the previously undone branch (linear-history semantics).
    pub fn begin_stroke(&mut self, tool: ToolKind, color: Color32, first: StrokePoint) {
        self.redo_stack.clear();
        self.active = Some(ActiveStroke::new(tool, color, first));
        self.is_drawing = true;
        self.revision += 1;
    }

    /// Appends a point to the active stroke; no-op outside a gesture.
    pub fn append_point(&mut self, point: StrokePoint) {
        if !self.is_drawing {
            return;
        }
        if let Some(active) = &mut self.active {
            active.append(point);
        }
    }

    /// Finalizes the active stroke into the completed list. Cancellation is
    /// handled identically: partial ink is still meaningful to the user.
    pub fn finish_stroke(&mut self) {
        if let Some(active) = self.active.take() {
            log::debug!(
                "stroke {} finished with {} points",
                active.id(),
                active.points().len()
            );
            self.completed.push(active.into_stroke_ref());
            self.revision += 1;
        }
        self.is_drawing = false;
    }

    /// Moves the newest completed stroke onto the redo stack. No-op when
    /// there is nothing to undo.
    pub fn undo(&mut self) {
        if let Some(stroke) = self.completed.pop() {
            self.redo_stack.push(stroke);
            self.revision += 1;
        }
    }

    /// Moves the most recently undone stroke back onto the completed list.
    /// No-op when the redo stack is empty.
    pub fn redo(&mut self) {
        if let Some(stroke) = self.redo_stack.pop() {
            self.completed.push(stroke);
            self.revision += 1;
        }
    }

    /// Removes every completed stroke, seeding the redo stack with the
    /// reversed list so repeated redo restores strokes in creation order.
    pub fn clear_all(&mut self) {
        if self.completed.is_empty() {
            return;
        }
        let mut cleared = std::mem::take(&mut self.completed);
        cleared.reverse();
        self.redo_stack = cleared;
        self.revision += 1;
    }

    /// Deactivation wipe: no stroke data survives the overlay being closed.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::Pos2;

    fn complete_stroke(session: &mut OverlaySession, seed: f32) {
        session.begin_stroke(
            ToolKind::Pen,
            Color32::RED,
            StrokePoint::new(Pos2::new(seed, seed)),
        );
        session.append_point(StrokePoint::new(Pos2::new(seed + 5.0, seed + 5.0)));
        session.finish_stroke();
    }

    #[test]
    fn undo_redo_inverse_law() {
        let mut session = OverlaySession::new();
        for i in 0..4 {
            complete_stroke(&mut session, i as f32 * 10.0);
        }
        let original: Vec<_> = session
            .completed_strokes()
            .iter()
            .map(|s| s.id())
            .collect();

        for _ in 0..4 {
            session.undo();
        }
        assert!(session.completed_strokes().is_empty());
        assert_eq!(session.redo_len(), 4);

        for _ in 0..4 {
            session.redo();
        }
        let restored: Vec<_> = session
            .completed_strokes()
            .iter()
            .map(|s| s.id())
            .collect();
        assert_eq!(restored, original);
    }

    #[test]
    fn undo_on_empty_session_is_a_noop() {
        let mut session = OverlaySession::new();
        session.undo();
        session.redo();
        assert!(session.completed_strokes().is_empty());
        assert_eq!(session.redo_len(), 0);
    }

    #[test]
    fn new_stroke_invalidates_redo_stack() {
        let mut session = OverlaySession::new();
        complete_stroke(&mut session, 0.0);
        complete_stroke(&mut session, 20.0);
        session.undo();
        assert_eq!(session.redo_len(), 1);

        complete_stroke(&mut session, 40.0);
        assert_eq!(session.redo_len(), 0);
        assert_eq!(session.completed_strokes().len(), 2);
    }

    #[test]
    fn clear_then_redo_all_restores_creation_order() {
        let mut session = OverlaySession::new();
        for i in 0..3 {
            complete_stroke(&mut session, i as f32);
        }
        let original: Vec<_> = session
            .completed_strokes()
            .iter()
            .map(|s| s.id())
            .collect();

        session.clear_all();
        assert!(session.completed_strokes().is_empty());
        assert_eq!(session.redo_len(), 3);

        for _ in 0..3 {
            session.redo();
        }
        let restored: Vec<_> = session
            .completed_strokes()
            .iter()
            .map(|s| s.id())
            .collect();
        assert_eq!(restored, original);
    }

    #[test]
    fn clear_on_empty_session_keeps_redo_stack() {
        let mut session = OverlaySession::new();
        complete_stroke(&mut session, 0.0);
        session.undo();
        assert_eq!(session.redo_len(), 1);

        // Nothing to clear: the undone branch must not be discarded.
        session.clear_all();
        assert_eq!(session.redo_len(), 1);
    }

    #[test]
    fn append_outside_gesture_is_ignored() {
        let mut session = OverlaySession::new();
        session.append_point(StrokePoint::new(Pos2::new(1.0, 1.0)));
        assert!(session.active_stroke().is_none());
    }

    #[test]
    fn finish_without_active_stroke_clears_drawing_flag() {
        let mut session = OverlaySession::new();
        session.finish_stroke();
        assert!(!session.is_drawing());
        assert!(session.completed_strokes().is_empty());
    }

    #[test]
    fn reset_discards_everything() {
        let mut session = OverlaySession::new();
        complete_stroke(&mut session, 0.0);
        session.undo();
        session.begin_stroke(
            ToolKind::Highlighter,
            Color32::YELLOW,
            StrokePoint::new(Pos2::ZERO),
        );

        session.reset();
        assert!(session.completed_strokes().is_empty());
        assert!(session.active_stroke().is_none());
        assert_eq!(session.redo_len(), 0);
        assert!(!session.is_drawing());
    }

    #[test]
    fn revision_tracks_stack_mutations_not_point_appends() {
        let mut session = OverlaySession::new();
        session.begin_stroke(ToolKind::Pen, Color32::RED, StrokePoint::new(Pos2::ZERO));
        let after_begin = session.revision();
        session.append_point(StrokePoint::new(Pos2::new(1.0, 1.0)));
        session.append_point(StrokePoint::new(Pos2::new(2.0, 2.0)));
        assert_eq!(session.revision(), after_begin);

        session.finish_stroke();
        assert!(session.revision() > after_begin);
    }
}
