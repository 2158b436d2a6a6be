/// A 2D affine transformation matrix in canvas order.
///
/// Maps a point as
/// ```text
/// | a  c  e |   | x |
/// | b  d  f | * | y |
/// | 0  0  1 |   | 1 |
/// ```
/// which is the same layout a 2D canvas `setTransform(a, b, c, d, e, f)` takes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Transform {
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translate(x: f64, y: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, x, y)
    }

    /// Rotation by `radians`. Positive angles turn clockwise on screen since
    /// the canvas y axis points down.
    pub fn rotate(radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    pub fn scale(factor: f64) -> Self {
        Self::scale_xy(factor, factor)
    }

    pub fn scale_xy(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// `self` post-multiplied by `step`: points go through `step` first.
    ///
    /// A canvas `translate`/`rotate`/`scale` call replaces its current matrix
    /// with `current.then(&step)`.
    pub fn then(&self, step: &Transform) -> Transform {
        Transform {
            a: self.a * step.a + self.c * step.b,
            b: self.b * step.a + self.d * step.b,
            c: self.a * step.c + self.c * step.d,
            d: self.b * step.c + self.d * step.d,
            e: self.a * step.e + self.c * step.f + self.e,
            f: self.b * step.e + self.d * step.f + self.f,
        }
    }

    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
