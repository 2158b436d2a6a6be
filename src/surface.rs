//! The imperative drawing surface the scene is painted onto.
//!
//! [`DrawingContext`] is the stateful 2D API (current transform, styles,
//! path under construction) that enter/exit callbacks drive. The canvas
//! never owns a concrete rasterizer; it borrows one from a [`SurfaceHost`]
//! for the duration of a render pass.

use crate::transform::Transform;

/// Line cap style for stroked paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl LineCap {
    /// Parse an SVG/canvas keyword. `inherit` and unknown keywords yield `None`.
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "butt" => Some(LineCap::Butt),
            "round" => Some(LineCap::Round),
            "square" => Some(LineCap::Square),
            _ => None,
        }
    }
}

/// Stateful immediate-mode 2D drawing API.
///
/// Transform operations post-multiply the current matrix, so
/// `translate(10, 0)` followed by `translate(0, 5)` leaves the context at
/// `translate(10, 5)`.
pub trait DrawingContext {
    /// Drawing area size in device pixels.
    fn size(&self) -> (f64, f64);

    // Transform state
    fn current_transform(&self) -> Transform;
    fn set_transform(&mut self, transform: Transform);
    fn transform(&mut self, transform: Transform) {
        let current = self.current_transform();
        self.set_transform(current.then(&transform));
    }
    fn translate(&mut self, x: f64, y: f64) {
        self.transform(Transform::translate(x, y));
    }
    fn rotate(&mut self, radians: f64) {
        self.transform(Transform::rotate(radians));
    }
    fn scale(&mut self, sx: f64, sy: f64) {
        self.transform(Transform::scale_xy(sx, sy));
    }

    /// Push the full drawing state (transform and styles).
    fn save(&mut self);
    /// Pop the state pushed by the matching [`save`](Self::save).
    fn restore(&mut self);

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    // Paths
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64, ccw: bool);
    fn close_path(&mut self);
    fn fill(&mut self);
    fn stroke(&mut self);

    // Styles
    fn set_fill_style(&mut self, style: &str);
    fn set_stroke_style(&mut self, style: &str);
    fn set_line_width(&mut self, width: f64);
    fn set_line_cap(&mut self, cap: LineCap);
}

/// Something that may or may not currently provide a drawing context.
///
/// A host without a context (not yet attached, torn down) is an expected
/// transient state; render passes are simply skipped while it lasts.
pub trait SurfaceHost {
    fn context(&mut self) -> Option<&mut dyn DrawingContext>;

    fn has_context(&mut self) -> bool {
        self.context().is_some()
    }
}

/// A host that never has a surface.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSurface;

impl SurfaceHost for NoSurface {
    fn context(&mut self) -> Option<&mut dyn DrawingContext> {
        None
    }
}

impl<C: DrawingContext> SurfaceHost for Option<C> {
    fn context(&mut self) -> Option<&mut dyn DrawingContext> {
        self.as_mut().map(|ctx| ctx as &mut dyn DrawingContext)
    }
}
