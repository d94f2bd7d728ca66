#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod error;
pub mod input;
pub mod overlay;
pub mod panels;
pub mod renderer;
pub mod scheduler;
pub mod session;
pub mod stroke;

pub use app::OverlayApp;
pub use error::OverlayError;
pub use input::{InputRouter, PointerDevice, PointerEvent, PointerPhase, TargetClass, TargetIndex};
pub use overlay::{AnnotationOverlay, OverlayPrefs, OverlayResponse};
pub use renderer::{CanvasSurface, Renderer, Viewport};
pub use scheduler::RepaintScheduler;
pub use session::OverlaySession;
pub use stroke::{ActiveStroke, Stroke, StrokePoint, StrokeRef, ToolKind};
