//! An in-memory drawing context.
//!
//! [`RecordingContext`] keeps the same state a real 2D canvas keeps (current
//! transform, styles, a save/restore stack, the path under construction) and
//! records every paint operation as a [`DrawCommand`] in device coordinates.
//! It backs the test suites and is handy for inspecting what a scene would
//! paint without a window.

use crate::surface::{DrawingContext, LineCap};
use crate::transform::Transform;

/// Axis-aligned bounds in device coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    fn point(x: f64, y: f64) -> Self {
        Self::new(x, y, x, y)
    }

    fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn approx_eq(&self, other: &Bounds, epsilon: f64) -> bool {
        (self.min_x - other.min_x).abs() <= epsilon
            && (self.min_y - other.min_y).abs() <= epsilon
            && (self.max_x - other.max_x).abs() <= epsilon
            && (self.max_y - other.max_y).abs() <= epsilon
    }
}

/// One path segment. Points are already mapped through the transform that
/// was current when the segment was added.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    CubicTo {
        ctrl1: (f64, f64),
        ctrl2: (f64, f64),
        to: (f64, f64),
    },
    /// Circular arc; `radius` stays in the local units of the caller.
    Arc {
        center: (f64, f64),
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        ccw: bool,
    },
    Close,
}

/// Bounds of a path's points. Bezier control points count as points, which
/// is exact for the straight-edged and rounded-rect paths the shapes emit.
pub fn path_bounds(path: &[PathSegment]) -> Option<Bounds> {
    let mut bounds: Option<Bounds> = None;
    let mut add = |x: f64, y: f64| {
        bounds = Some(match bounds {
            Some(mut b) => {
                b.include(x, y);
                b
            }
            None => Bounds::point(x, y),
        });
    };
    for segment in path {
        match *segment {
            PathSegment::MoveTo(x, y) | PathSegment::LineTo(x, y) => add(x, y),
            PathSegment::CubicTo { ctrl1, ctrl2, to } => {
                add(ctrl1.0, ctrl1.1);
                add(ctrl2.0, ctrl2.1);
                add(to.0, to.1);
            }
            PathSegment::Arc { center, radius, .. } => {
                add(center.0 - radius, center.1 - radius);
                add(center.0 + radius, center.1 + radius);
            }
            PathSegment::Close => {}
        }
    }
    bounds
}

/// A paint operation as the recording context saw it.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Area cleared, in device coordinates.
    Clear { bounds: Bounds },
    Fill {
        path: Vec<PathSegment>,
        style: String,
        transform: Transform,
    },
    Stroke {
        path: Vec<PathSegment>,
        style: String,
        line_width: f64,
        line_cap: LineCap,
        transform: Transform,
    },
}

impl DrawCommand {
    pub fn path(&self) -> &[PathSegment] {
        match self {
            DrawCommand::Clear { .. } => &[],
            DrawCommand::Fill { path, .. } | DrawCommand::Stroke { path, .. } => path,
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            DrawCommand::Clear { bounds } => Some(*bounds),
            _ => path_bounds(self.path()),
        }
    }

    pub fn is_fill(&self) -> bool {
        matches!(self, DrawCommand::Fill { .. })
    }

    pub fn is_stroke(&self) -> bool {
        matches!(self, DrawCommand::Stroke { .. })
    }
}

/// Style state captured by `save`.
#[derive(Debug, Clone, PartialEq)]
struct DrawState {
    transform: Transform,
    fill_style: String,
    stroke_style: String,
    line_width: f64,
    line_cap: LineCap,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Transform::IDENTITY,
            fill_style: "#000000".to_string(),
            stroke_style: "#000000".to_string(),
            line_width: 1.0,
            line_cap: LineCap::Butt,
        }
    }
}

/// A [`DrawingContext`] that records instead of rasterizing.
#[derive(Debug, Clone)]
pub struct RecordingContext {
    width: f64,
    height: f64,
    state: DrawState,
    stack: Vec<DrawState>,
    path: Vec<PathSegment>,
    commands: Vec<DrawCommand>,
}

impl RecordingContext {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            state: DrawState::default(),
            stack: Vec::new(),
            path: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Commands painted since the last full clear.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Fill and stroke commands only.
    pub fn paint_commands(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| !matches!(c, DrawCommand::Clear { .. }))
    }

    pub fn fill_style(&self) -> &str {
        &self.state.fill_style
    }

    pub fn stroke_style(&self) -> &str {
        &self.state.stroke_style
    }

    pub fn line_width(&self) -> f64 {
        self.state.line_width
    }

    pub fn line_cap(&self) -> LineCap {
        self.state.line_cap
    }

    /// Number of unmatched `save` calls.
    pub fn save_depth(&self) -> usize {
        self.stack.len()
    }

    /// The path under construction.
    pub fn current_path(&self) -> &[PathSegment] {
        &self.path
    }

    fn map(&self, x: f64, y: f64) -> (f64, f64) {
        self.state.transform.transform_point(x, y)
    }

    fn covers_surface(&self, bounds: &Bounds) -> bool {
        bounds.min_x <= 0.0
            && bounds.min_y <= 0.0
            && bounds.max_x >= self.width
            && bounds.max_y >= self.height
    }
}

impl DrawingContext for RecordingContext {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn current_transform(&self) -> Transform {
        self.state.transform
    }

    fn set_transform(&mut self, transform: Transform) {
        self.state.transform = transform;
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        // Unbalanced restore is ignored, as on a real canvas.
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let (x0, y0) = self.map(x, y);
        let (x1, y1) = self.map(x + width, y + height);
        let bounds = Bounds::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1));
        if self.covers_surface(&bounds) {
            self.commands.clear();
        }
        self.commands.push(DrawCommand::Clear { bounds });
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        let (x, y) = self.map(x, y);
        self.path.push(PathSegment::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        let (x, y) = self.map(x, y);
        self.path.push(PathSegment::LineTo(x, y));
    }

    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        let segment = PathSegment::CubicTo {
            ctrl1: self.map(cp1x, cp1y),
            ctrl2: self.map(cp2x, cp2y),
            to: self.map(x, y),
        };
        self.path.push(segment);
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64, ccw: bool) {
        let segment = PathSegment::Arc {
            center: self.map(x, y),
            radius,
            start_angle,
            end_angle,
            ccw,
        };
        self.path.push(segment);
    }

    fn close_path(&mut self) {
        self.path.push(PathSegment::Close);
    }

    fn fill(&mut self) {
        if self.path.is_empty() {
            return;
        }
        self.commands.push(DrawCommand::Fill {
            path: self.path.clone(),
            style: self.state.fill_style.clone(),
            transform: self.state.transform,
        });
    }

    fn stroke(&mut self) {
        if self.path.is_empty() {
            return;
        }
        self.commands.push(DrawCommand::Stroke {
            path: self.path.clone(),
            style: self.state.stroke_style.clone(),
            line_width: self.state.line_width,
            line_cap: self.state.line_cap,
            transform: self.state.transform,
        });
    }

    fn set_fill_style(&mut self, style: &str) {
        self.state.fill_style = style.to_string();
    }

    fn set_stroke_style(&mut self, style: &str) {
        self.state.stroke_style = style.to_string();
    }

    fn set_line_width(&mut self, width: f64) {
        // Canvas ignores non-positive and non-finite widths.
        if width.is_finite() && width > 0.0 {
            self.state.line_width = width;
        }
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.state.line_cap = cap;
    }
}
