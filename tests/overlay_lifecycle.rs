use egui::{Key, Modifiers, Pos2, Rect, Vec2};
use ink_overlay::{AnnotationOverlay, OverlayPrefs, OverlayResponse, TargetIndex};

fn pointer_down(x: f32, y: f32) -> egui::Event {
    egui::Event::PointerButton {
        pos: Pos2::new(x, y),
        button: egui::PointerButton::Primary,
        pressed: true,
        modifiers: Modifiers::NONE,
    }
}

fn pointer_up(x: f32, y: f32) -> egui::Event {
    egui::Event::PointerButton {
        pos: Pos2::new(x, y),
        button: egui::PointerButton::Primary,
        pressed: false,
        modifiers: Modifiers::NONE,
    }
}

fn key_press(key: Key, modifiers: Modifiers) -> egui::Event {
    egui::Event::Key {
        key,
        physical_key: None,
        pressed: true,
        repeat: false,
        modifiers,
    }
}

fn raw_input(events: Vec<egui::Event>) -> egui::RawInput {
    egui::RawInput {
        screen_rect: Some(Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0))),
        events,
        ..Default::default()
    }
}

/// Drives one headless frame through the overlay: the raw-input pass first
/// (as `raw_input_hook` would), then the frame itself.
fn frame(
    ctx: &egui::Context,
    overlay: &mut AnnotationOverlay,
    events: Vec<egui::Event>,
    register: impl Fn(&mut TargetIndex),
) -> OverlayResponse {
    let mut raw = raw_input(events);
    overlay.handle_raw_input(ctx, &mut raw);
    let mut response = OverlayResponse::default();
    let _ = ctx.run(raw, |ctx| {
        let mut targets = TargetIndex::new();
        register(&mut targets);
        response = overlay.show(ctx, Vec2::ZERO, &mut targets);
    });
    response
}

fn gesture(x: f32, y: f32) -> Vec<egui::Event> {
    vec![
        pointer_down(x, y),
        egui::Event::PointerMoved(Pos2::new(x + 20.0, y + 10.0)),
        egui::Event::PointerMoved(Pos2::new(x + 40.0, y)),
        pointer_up(x + 40.0, y),
    ]
}

#[test]
fn drawing_gesture_completes_one_stroke() {
    let ctx = egui::Context::default();
    let mut overlay = AnnotationOverlay::new(OverlayPrefs::default());
    overlay.activate();

    frame(&ctx, &mut overlay, gesture(400.0, 300.0), |_| {});
    assert_eq!(overlay.session().completed_strokes().len(), 1);
    assert!(overlay.session().active_stroke().is_none());
}

#[test]
fn inactive_overlay_ignores_pointer_input() {
    let ctx = egui::Context::default();
    let mut overlay = AnnotationOverlay::new(OverlayPrefs::default());

    frame(&ctx, &mut overlay, gesture(400.0, 300.0), |_| {});
    assert!(overlay.session().completed_strokes().is_empty());
}

#[test]
fn pointer_down_on_interactive_widget_never_draws() {
    let ctx = egui::Context::default();
    let mut overlay = AnnotationOverlay::new(OverlayPrefs::default());
    overlay.activate();

    let field = Rect::from_min_size(Pos2::new(380.0, 280.0), Vec2::new(200.0, 40.0));
    let register = |targets: &mut TargetIndex| targets.register_interactive(field);
    // Layout frame: the host registers its widget rects.
    frame(&ctx, &mut overlay, vec![], register);
    frame(
        &ctx,
        &mut overlay,
        vec![pointer_down(400.0, 300.0), pointer_up(400.0, 300.0)],
        register,
    );
    assert!(overlay.session().completed_strokes().is_empty());
    assert!(overlay.session().active_stroke().is_none());
}

#[test]
fn consumed_drawing_events_are_stripped_from_host_input() {
    let ctx = egui::Context::default();
    let mut overlay = AnnotationOverlay::new(OverlayPrefs::default());
    overlay.activate();

    let field = Rect::from_min_size(Pos2::new(100.0, 100.0), Vec2::new(120.0, 30.0));
    frame(&ctx, &mut overlay, vec![], |targets| {
        targets.register_interactive(field);
    });

    // Drawing events over free page area never reach the host widgets.
    let mut raw = raw_input(vec![
        pointer_down(600.0, 400.0),
        egui::Event::PointerMoved(Pos2::new(620.0, 410.0)),
        pointer_up(620.0, 410.0),
    ]);
    overlay.handle_raw_input(&ctx, &mut raw);
    assert!(raw.events.is_empty(), "consumed events must be removed");
    assert_eq!(overlay.session().completed_strokes().len(), 1);

    // Events over a registered widget pass through untouched.
    let mut raw = raw_input(vec![pointer_down(110.0, 110.0), pointer_up(110.0, 110.0)]);
    overlay.handle_raw_input(&ctx, &mut raw);
    assert_eq!(raw.events.len(), 2);
    assert_eq!(overlay.session().completed_strokes().len(), 1);
}

#[test]
fn pointer_down_over_unregistered_floating_window_passes_through() {
    let ctx = egui::Context::default();
    let mut overlay = AnnotationOverlay::new(OverlayPrefs::default());
    overlay.activate();

    // A host dialog nobody registered with the target index.
    let mut run = |events: Vec<egui::Event>| {
        let mut raw = raw_input(events);
        overlay.handle_raw_input(&ctx, &mut raw);
        let passed_through = raw.events.len();
        let _ = ctx.run(raw, |ctx| {
            egui::Window::new("Export case file")
                .fixed_pos(Pos2::new(500.0, 400.0))
                .show(ctx, |ui| {
                    let _ = ui.button("Confirm");
                });
            let mut targets = TargetIndex::new();
            overlay.show(ctx, Vec2::ZERO, &mut targets);
        });
        passed_through
    };

    run(vec![]); // dialog lays out; its layer becomes hit-testable
    let passed_through = run(vec![pointer_down(510.0, 410.0), pointer_up(510.0, 410.0)]);
    assert_eq!(passed_through, 2, "dialog clicks must reach the dialog");
    assert!(overlay.session().completed_strokes().is_empty());
    assert!(overlay.session().active_stroke().is_none());
}

#[test]
fn escape_closes_and_reactivation_starts_empty() {
    let ctx = egui::Context::default();
    let mut overlay = AnnotationOverlay::new(OverlayPrefs::default());
    overlay.activate();

    frame(&ctx, &mut overlay, gesture(400.0, 300.0), |_| {});
    assert_eq!(overlay.session().completed_strokes().len(), 1);

    let response = frame(
        &ctx,
        &mut overlay,
        vec![key_press(Key::Escape, Modifiers::NONE)],
        |_| {},
    );
    assert!(response.close_requested);
    assert!(!overlay.is_active());
    assert!(overlay.session().completed_strokes().is_empty());

    overlay.activate();
    assert!(overlay.session().completed_strokes().is_empty());
    assert_eq!(overlay.session().redo_len(), 0);
    assert!(overlay.session().active_stroke().is_none());
}

#[test]
fn undo_redo_keyboard_shortcuts() {
    let ctx = egui::Context::default();
    let mut overlay = AnnotationOverlay::new(OverlayPrefs::default());
    overlay.activate();

    frame(&ctx, &mut overlay, gesture(400.0, 300.0), |_| {});
    assert_eq!(overlay.session().completed_strokes().len(), 1);

    frame(
        &ctx,
        &mut overlay,
        vec![key_press(Key::Z, Modifiers::COMMAND)],
        |_| {},
    );
    assert!(overlay.session().completed_strokes().is_empty());
    assert_eq!(overlay.session().redo_len(), 1);

    frame(
        &ctx,
        &mut overlay,
        vec![key_press(Key::Z, Modifiers::COMMAND | Modifiers::SHIFT)],
        |_| {},
    );
    assert_eq!(overlay.session().completed_strokes().len(), 1);
    assert_eq!(overlay.session().redo_len(), 0);
}

#[test]
fn deactivation_discards_undo_history_too() {
    let ctx = egui::Context::default();
    let mut overlay = AnnotationOverlay::new(OverlayPrefs::default());
    overlay.activate();

    frame(&ctx, &mut overlay, gesture(200.0, 200.0), |_| {});
    frame(&ctx, &mut overlay, gesture(300.0, 300.0), |_| {});
    frame(
        &ctx,
        &mut overlay,
        vec![key_press(Key::Z, Modifiers::COMMAND)],
        |_| {},
    );
    assert_eq!(overlay.session().redo_len(), 1);

    overlay.deactivate();
    assert_eq!(overlay.session().redo_len(), 0);
    assert!(overlay.session().completed_strokes().is_empty());
}
