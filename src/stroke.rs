use egui::{Color32, Pos2};
use std::sync::Arc;
use uuid::Uuid;

/// One sampled point of a stroke, in page coordinates (scroll offset included),
/// so strokes stay anchored to page content as the host page scrolls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokePoint {
    pub x: f32,
    pub y: f32,
    /// Per-point width sample. Recorded for the pen tool (pressure-derived for
    /// stylus input, constant for mouse/touch); `None` for tools that render
    /// at a fixed width.
    pub width: Option<f32>,
}

impl StrokePoint {
    pub fn new(pos: Pos2) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            width: None,
        }
    }

    pub fn with_width(pos: Pos2, width: f32) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            width: Some(width),
        }
    }

    pub fn pos(&self) -> Pos2 {
        Pos2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum ToolKind {
    #[default]
    Pen,
    Highlighter,
    Eraser,
}

impl ToolKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pen => "Pen",
            Self::Highlighter => "Highlighter",
            Self::Eraser => "Eraser",
        }
    }
}

// Immutable stroke for sharing between the history stacks and the renderer.
#[derive(Debug, Clone)]
pub struct Stroke {
    id: Uuid,
    tool: ToolKind,
    color: Color32,
    points: Vec<StrokePoint>,
}

// Completed strokes are shared, never cloned point-by-point.
pub type StrokeRef = Arc<Stroke>;

impl Stroke {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn points(&self) -> &[StrokePoint] {
        &self.points
    }
}

/// The stroke currently being drawn. Append-only between pointer-down and
/// pointer-up; converts into an immutable [`StrokeRef`] when the gesture ends.
#[derive(Debug)]
pub struct ActiveStroke {
    id: Uuid,
    tool: ToolKind,
    color: Color32,
    points: Vec<StrokePoint>,
}

impl ActiveStroke {
    /// Starts a stroke with its seed point, upholding the "at least one point"
    /// invariant from creation.
    pub fn new(tool: ToolKind, color: Color32, first: StrokePoint) -> Self {
        Self {
            id: Uuid::new_v4(),
            tool,
            color,
            points: vec![first],
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn points(&self) -> &[StrokePoint] {
        &self.points
    }

    pub fn last_point(&self) -> StrokePoint {
        *self.points.last().expect("active stroke is never empty")
    }

    pub fn append(&mut self, point: StrokePoint) {
        self.points.push(point);
    }

    pub fn into_stroke_ref(self) -> StrokeRef {
        Arc::new(Stroke {
            id: self.id,
            tool: self.tool,
            color: self.color,
            points: self.points,
        })
    }
}
