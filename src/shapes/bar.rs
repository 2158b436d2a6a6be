use crate::binder::CanvasComponent;
use crate::children::AcceptsParent;
use crate::registry::{NodeType, RegistryEntry};
use crate::surface::DrawingContext;
use crate::tree::NodeId;
use crate::value::{Attributes, Value};

use super::{apply_stroke_styles, reset_styles};

pub const BAR: NodeType = NodeType::new("BAR");

/// Bezier handle length that approximates a quarter circle.
const KAPPA: f64 = 4.0 * ((std::f64::consts::SQRT_2 - 1.0) / 3.0);

/// A rectangle with optionally rounded corners.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bar {
    attributes: Attributes,
    canvas_parent: Option<NodeId>,
}

impl Bar {
    pub fn new() -> Self {
        Self::default()
    }

    attribute_setters! {
        x => "x",
        y => "y",
        width => "width",
        height => "height",
        rx => "rx",
        ry => "ry",
        fill => "fill",
        stroke => "stroke",
        stroke_width => "strokeWidth",
        stroke_linecap => "strokeLinecap",
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.set(key, value);
        self
    }

    pub fn canvas_parent(&self) -> Option<NodeId> {
        self.canvas_parent
    }

    pub fn parent(mut self, parent: NodeId) -> Self {
        self.canvas_parent = Some(parent);
        self
    }
}

impl AcceptsParent for Bar {
    fn set_canvas_parent(&mut self, parent: NodeId) {
        self.canvas_parent = Some(parent);
    }
}

impl CanvasComponent for Bar {
    fn entry() -> RegistryEntry {
        RegistryEntry::new(BAR, draw).with_exit(|ctx, _| reset_styles(ctx))
    }

    fn attributes(&self) -> Attributes {
        self.attributes.clone()
    }
}

fn draw(ctx: &mut dyn DrawingContext, attributes: &Attributes) {
    reset_styles(ctx);

    let x = attributes.property("x").pixels();
    let y = attributes.property("y").pixels();
    let width = attributes.property("width").pixels();
    let height = attributes.property("height").pixels();

    let rx_attr = attributes.property("rx");
    let ry_attr = attributes.property("ry");
    let mut rx = rx_attr.pixels();
    let mut ry = ry_attr.pixels();
    // A single radius rounds both directions.
    if rx_attr.has_value(false) && !ry_attr.has_value(false) {
        ry = rx;
    }
    if ry_attr.has_value(false) && !rx_attr.has_value(false) {
        rx = ry;
    }
    let rx = rx.min(width / 2.0);
    let ry = ry.min(height / 2.0);

    // Always start a fresh path so an empty bar never refills the last one.
    ctx.begin_path();
    if width > 0.0 && height > 0.0 {
        trace_rounded_rect(ctx, x, y, width, height, rx, ry);
    }

    let fill = attributes.property("fill");
    if fill.has_value(false) {
        ctx.set_fill_style(&fill.color());
    }
    apply_stroke_styles(ctx, attributes);

    ctx.fill();
    ctx.stroke();
}

fn trace_rounded_rect(
    ctx: &mut dyn DrawingContext,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    rx: f64,
    ry: f64,
) {
    let right = x + width;
    let bottom = y + height;

    ctx.move_to(x + rx, y);
    ctx.line_to(right - rx, y);
    ctx.bezier_curve_to(
        right - rx + KAPPA * rx,
        y,
        right,
        y + ry - KAPPA * ry,
        right,
        y + ry,
    );
    ctx.line_to(right, bottom - ry);
    ctx.bezier_curve_to(
        right,
        bottom - ry + KAPPA * ry,
        right - rx + KAPPA * rx,
        bottom,
        right - rx,
        bottom,
    );
    ctx.line_to(x + rx, bottom);
    ctx.bezier_curve_to(
        x + rx - KAPPA * rx,
        bottom,
        x,
        bottom - ry + KAPPA * ry,
        x,
        bottom - ry,
    );
    ctx.line_to(x, y + ry);
    ctx.bezier_curve_to(x, y + ry - KAPPA * ry, x + rx - KAPPA * rx, y, x + rx, y);
}
