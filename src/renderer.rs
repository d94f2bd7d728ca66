use crate::error::OverlayError;
use crate::input::MOUSE_PEN_WIDTH;
use crate::session::OverlaySession;
use crate::stroke::{StrokePoint, ToolKind};
use egui::{Color32, Pos2, Vec2};

/// Fixed highlighter width in points; width samples on the points are ignored.
pub const HIGHLIGHTER_WIDTH: f32 = 14.0;
/// Fixed circular eraser footprint in points.
pub const ERASER_WIDTH: f32 = 22.0;
/// Global alpha applied to highlighter strokes (translucent marker effect).
pub const HIGHLIGHTER_ALPHA: f32 = 0.4;

// Segments per flattened quadratic curve.
const CURVE_STEPS: usize = 8;

/// Snapshot of the host view used to map page coordinates onto the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Host page scroll offset, in points.
    pub scroll: Vec2,
    /// Visible size, in points.
    pub size: Vec2,
    /// Device pixel ratio: surface pixels per point.
    pub pixels_per_point: f32,
}

impl Viewport {
    pub fn new(scroll: Vec2, size: Vec2, pixels_per_point: f32) -> Self {
        Self {
            scroll,
            size,
            pixels_per_point,
        }
    }

    /// Backing-store size: viewport size times the device pixel ratio, so
    /// strokes stay crisp at any pixel density.
    pub fn surface_size(&self) -> (u32, u32) {
        (
            (self.size.x * self.pixels_per_point).round() as u32,
            (self.size.y * self.pixels_per_point).round() as u32,
        )
    }

    /// Page space to surface pixels: subtract scroll, scale by the DPR.
    pub fn page_to_surface(&self, pos: Pos2) -> Pos2 {
        Pos2::new(
            (pos.x - self.scroll.x) * self.pixels_per_point,
            (pos.y - self.scroll.y) * self.pixels_per_point,
        )
    }
}

/// RGBA8 backing store the stroke lists are composited into each redraw.
#[derive(Debug, Clone)]
pub struct CanvasSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl CanvasSurface {
    pub fn new(width: u32, height: u32) -> Result<Self, OverlayError> {
        if width == 0 || height == 0 {
            return Err(OverlayError::EmptySurface { width, height });
        }
        Ok(Self {
            width,
            height,
            pixels: vec![0; (width as usize) * (height as usize) * 4],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Reads one pixel as straight-alpha RGBA.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) out of bounds for {}x{} surface",
            self.width,
            self.height
        );
        let idx = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.pixel(x, y)[3]
    }

    pub fn to_color_image(&self) -> egui::ColorImage {
        egui::ColorImage::from_rgba_unmultiplied(
            [self.width as usize, self.height as usize],
            &self.pixels,
        )
    }

    /// Source-over blend of `color` (alpha scaled by `alpha`) wherever the
    /// mask has coverage.
    fn blend_masked(&mut self, mask: &CoverageMask, color: Color32, alpha: f32) {
        let sa = (color.a() as f32 / 255.0) * alpha;
        if sa <= 0.0 {
            return;
        }
        mask.for_each_covered(|x, y| {
            let idx = ((y * self.width + x) * 4) as usize;
            let px = &mut self.pixels[idx..idx + 4];
            let da = px[3] as f32 / 255.0;
            let out_a = sa + da * (1.0 - sa);
            if out_a <= f32::EPSILON {
                px.fill(0);
                return;
            }
            let blend = |s: u8, d: u8| -> u8 {
                (((s as f32 * sa) + (d as f32 * da * (1.0 - sa))) / out_a)
                    .round()
                    .clamp(0.0, 255.0) as u8
            };
            px[0] = blend(color.r(), px[0]);
            px[1] = blend(color.g(), px[1]);
            px[2] = blend(color.b(), px[2]);
            px[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        });
    }

    /// Destination-out: knock existing pixels back to transparent wherever
    /// the mask has coverage.
    fn erase_masked(&mut self, mask: &CoverageMask) {
        mask.for_each_covered(|x, y| {
            let idx = ((y * self.width + x) * 4) as usize;
            self.pixels[idx..idx + 4].fill(0);
        });
    }
}

/// Binary coverage for one stroke. Each stroke is rasterized into the mask
/// first and composited onto the surface in a single pass, so a translucent
/// highlighter does not darken where its own path overlaps itself.
#[derive(Debug, Default)]
struct CoverageMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
    // Dirty bounds, inclusive; x0 > x1 means empty.
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl CoverageMask {
    fn reset(&mut self, width: u32, height: u32) {
        let len = (width as usize) * (height as usize);
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.data = vec![0; len];
        } else if self.x0 <= self.x1 {
            for y in self.y0..=self.y1 {
                let row = (y * self.width) as usize;
                self.data[row + self.x0 as usize..=row + self.x1 as usize].fill(0);
            }
        }
        self.x0 = u32::MAX;
        self.y0 = u32::MAX;
        self.x1 = 0;
        self.y1 = 0;
    }

    fn fill_disc(&mut self, center: Pos2, radius: f32) {
        let r = radius.max(0.5);
        let min_x = ((center.x - r).floor().max(0.0)) as i64;
        let max_x = ((center.x + r).ceil()) as i64;
        let min_y = ((center.y - r).floor().max(0.0)) as i64;
        let max_y = ((center.y + r).ceil()) as i64;
        let r_sq = r * r;
        for y in min_y..=max_y {
            if y < 0 || y >= self.height as i64 {
                continue;
            }
            for x in min_x..=max_x {
                if x < 0 || x >= self.width as i64 {
                    continue;
                }
                let dx = x as f32 + 0.5 - center.x;
                let dy = y as f32 + 0.5 - center.y;
                if dx * dx + dy * dy <= r_sq {
                    self.data[(y as u32 * self.width + x as u32) as usize] = 1;
                    self.x0 = self.x0.min(x as u32);
                    self.y0 = self.y0.min(y as u32);
                    self.x1 = self.x1.max(x as u32);
                    self.y1 = self.y1.max(y as u32);
                }
            }
        }
    }

    /// Stamps discs along a segment, linearly interpolating the radius.
    fn stamp_segment(&mut self, a: Pos2, b: Pos2, radius_a: f32, radius_b: f32) {
        let dist = a.distance(b);
        let step = (radius_a.min(radius_b) * 0.5).max(0.75);
        let steps = (dist / step).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let center = a + (b - a) * t;
            self.fill_disc(center, radius_a + (radius_b - radius_a) * t);
        }
    }

    fn for_each_covered(&self, mut f: impl FnMut(u32, u32)) {
        if self.x0 > self.x1 {
            return;
        }
        for y in self.y0..=self.y1 {
            for x in self.x0..=self.x1 {
                if self.data[(y * self.width + x) as usize] != 0 {
                    f(x, y);
                }
            }
        }
    }
}

/// Full-frame render pipeline: every redraw recomputes the whole surface from
/// the authoritative stroke lists, so redraw requests are idempotent and need
/// no frame-ordering logic.
#[derive(Debug, Default)]
pub struct Renderer {
    surface: Option<CanvasSurface>,
    mask: CoverageMask,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)creates the backing store when the viewport size or pixel ratio
    /// changed. Returns true when the surface was replaced.
    pub fn resize(&mut self, viewport: &Viewport) -> bool {
        let (width, height) = viewport.surface_size();
        if self
            .surface
            .as_ref()
            .is_some_and(|s| s.width() == width && s.height() == height)
        {
            return false;
        }
        match CanvasSurface::new(width, height) {
            Ok(surface) => {
                log::debug!("canvas surface resized to {width}x{height}");
                self.surface = Some(surface);
                true
            }
            Err(err) => {
                // Transient startup condition (layout not settled yet).
                log::debug!("canvas surface unavailable: {err}");
                self.surface = None;
                false
            }
        }
    }

    pub fn surface(&self) -> Option<&CanvasSurface> {
        self.surface.as_ref()
    }

    /// Drops the backing store; used on deactivation.
    pub fn release(&mut self) {
        self.surface = None;
    }

    /// Full redraw: clear, then composite every completed stroke in order,
    /// then the active stroke on top. Silently skips when no surface exists.
    pub fn render(&mut self, session: &OverlaySession, viewport: &Viewport) {
        let Some(mut surface) = self.surface.take() else {
            return;
        };
        surface.clear();
        for stroke in session.completed_strokes() {
            paint_stroke(
                &mut surface,
                &mut self.mask,
                viewport,
                stroke.tool(),
                stroke.color(),
                stroke.points(),
            );
        }
        if let Some(active) = session.active_stroke() {
            paint_stroke(
                &mut surface,
                &mut self.mask,
                viewport,
                active.tool(),
                active.color(),
                active.points(),
            );
        }
        self.surface = Some(surface);
    }
}

fn paint_stroke(
    surface: &mut CanvasSurface,
    mask: &mut CoverageMask,
    viewport: &Viewport,
    tool: ToolKind,
    color: Color32,
    points: &[StrokePoint],
) {
    if points.is_empty() {
        return;
    }
    mask.reset(surface.width(), surface.height());
    let scale = viewport.pixels_per_point;

    match tool {
        // Variable-width freehand ink: segment by segment, each end using its
        // point's recorded width.
        ToolKind::Pen => {
            let radius = |p: &StrokePoint| p.width.unwrap_or(MOUSE_PEN_WIDTH) * scale / 2.0;
            let first = &points[0];
            if points.len() == 1 {
                mask.fill_disc(viewport.page_to_surface(first.pos()), radius(first));
            } else {
                for pair in points.windows(2) {
                    mask.stamp_segment(
                        viewport.page_to_surface(pair[0].pos()),
                        viewport.page_to_surface(pair[1].pos()),
                        radius(&pair[0]),
                        radius(&pair[1]),
                    );
                }
            }
            surface.blend_masked(mask, color, 1.0);
        }
        ToolKind::Highlighter => {
            let radius = HIGHLIGHTER_WIDTH * scale / 2.0;
            stamp_smoothed_path(mask, viewport, points, radius);
            surface.blend_masked(mask, color, HIGHLIGHTER_ALPHA);
        }
        ToolKind::Eraser => {
            let radius = ERASER_WIDTH * scale / 2.0;
            stamp_smoothed_path(mask, viewport, points, radius);
            surface.erase_masked(mask);
        }
    }
}

fn stamp_smoothed_path(
    mask: &mut CoverageMask,
    viewport: &Viewport,
    points: &[StrokePoint],
    radius: f32,
) {
    let path: Vec<Pos2> = points
        .iter()
        .map(|p| viewport.page_to_surface(p.pos()))
        .collect();
    let smoothed = smooth_path(&path);
    if smoothed.len() == 1 {
        mask.fill_disc(smoothed[0], radius);
        return;
    }
    for pair in smoothed.windows(2) {
        mask.stamp_segment(pair[0], pair[1], radius, radius);
    }
}

/// Midpoint quadratic smoothing, shared by highlighter and eraser: for three
/// or more points, consecutive midpoints are connected with quadratic curves
/// using the intermediate point as control, avoiding visible polygon joints.
/// Two points degrade to a straight line, one to a dot.
fn smooth_path(points: &[Pos2]) -> Vec<Pos2> {
    match points {
        [] => Vec::new(),
        [only] => vec![*only],
        [a, b] => vec![*a, *b],
        _ => {
            let mut out = Vec::with_capacity(points.len() * CURVE_STEPS);
            let mut start = points[0];
            out.push(start);
            for i in 1..points.len() - 1 {
                let control = points[i];
                let end = midpoint(points[i], points[i + 1]);
                for step in 1..=CURVE_STEPS {
                    let t = step as f32 / CURVE_STEPS as f32;
                    out.push(quadratic_point(start, control, end, t));
                }
                start = end;
            }
            out.push(points[points.len() - 1]);
            out
        }
    }
}

fn midpoint(a: Pos2, b: Pos2) -> Pos2 {
    Pos2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

fn quadratic_point(start: Pos2, control: Pos2, end: Pos2, t: f32) -> Pos2 {
    let u = 1.0 - t;
    Pos2::new(
        u * u * start.x + 2.0 * u * t * control.x + t * t * end.x,
        u * u * start.y + 2.0 * u * t * control.y + t * t * end.y,
    )
}
