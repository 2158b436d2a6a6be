use std::f64::consts::TAU;

use crate::binder::CanvasComponent;
use crate::children::AcceptsParent;
use crate::registry::{NodeType, RegistryEntry};
use crate::surface::DrawingContext;
use crate::tree::NodeId;
use crate::value::{Attributes, Value};

use super::{apply_stroke_styles, reset_styles, DEFAULT_STROKE};

pub const CIRCLE: NodeType = NodeType::new("CIRCLE");

const TRANSPARENT: &str = "rgba(0,0,0,0)";

/// A circle centered on `cx`, `cy`. Stroked with a 1px black line and left
/// unfilled unless told otherwise.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Circle {
    attributes: Attributes,
    canvas_parent: Option<NodeId>,
}

impl Circle {
    pub fn new() -> Self {
        Self::default()
    }

    attribute_setters! {
        cx => "cx",
        cy => "cy",
        r => "r",
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

impl AcceptsParent for Circle {
    fn set_canvas_parent(&mut self, parent: NodeId) {
        self.canvas_parent = Some(parent);
    }
}

impl CanvasComponent for Circle {
    fn entry() -> RegistryEntry {
        RegistryEntry::new(CIRCLE, draw).with_exit(|ctx, _| reset_styles(ctx))
    }

    fn attributes(&self) -> Attributes {
        self.attributes.clone()
    }
}

fn draw(ctx: &mut dyn DrawingContext, attributes: &Attributes) {
    ctx.set_line_width(1.0);
    ctx.set_stroke_style(DEFAULT_STROKE);
    ctx.set_fill_style(TRANSPARENT);

    let cx = attributes.property("cx").number();
    let cy = attributes.property("cy").number();
    let r = attributes.property("r").number();

    ctx.begin_path();
    if r > 0.0 {
        ctx.arc(cx, cy, r, 0.0, TAU, false);
        ctx.close_path();
    }

    let fill = attributes.property("fill");
    if fill.has_value(false) {
        ctx.set_fill_style(&fill.color());
    }
    apply_stroke_styles(ctx, attributes);

    ctx.fill();
    ctx.stroke();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs;
    use crate::recording::{Bounds, DrawCommand, PathSegment, RecordingContext};

    fn paint(attributes: Attributes) -> RecordingContext {
        let mut ctx = RecordingContext::new(100.0, 100.0);
        Circle::entry().enter(&mut ctx, &attributes);
        ctx
    }

    #[test]
    fn test_default_styles() {
        let ctx = paint(attrs! { "cx" => 10, "cy" => 10, "r" => 5 });
        let commands = ctx.commands();
        assert_eq!(commands.len(), 2);
        assert!(matches!(&commands[0], DrawCommand::Fill { style, .. } if style == TRANSPARENT));
        assert!(matches!(
            &commands[1],
            DrawCommand::Stroke { style, line_width, .. } if style == "#000" && *line_width == 1.0
        ));
        let bounds = commands[1].bounds().unwrap();
        assert!(bounds.approx_eq(&Bounds::new(5.0, 5.0, 15.0, 15.0), 1e-9));
    }

    #[test]
    fn test_full_arc() {
        let ctx = paint(attrs! { "r" => "2" });
        let PathSegment::Arc {
            center,
            radius,
            start_angle,
            end_angle,
            ccw,
        } = ctx.commands()[0].path()[0]
        else {
            panic!("arc expected");
        };
        assert_eq!(center, (0.0, 0.0));
        assert_eq!(radius, 2.0);
        assert_eq!((start_angle, end_angle, ccw), (0.0, TAU, false));
        assert_eq!(ctx.commands()[0].path()[1], PathSegment::Close);
    }

    #[test]
    fn test_zero_radius_draws_nothing() {
        let ctx = paint(attrs! { "cx" => 3, "r" => 0, "stroke" => "red" });
        assert!(ctx.commands().is_empty());
    }

    #[test]
    fn test_fill_and_stroke_overrides() {
        let ctx = paint(attrs! {
            "r" => 1,
            "fill" => "rgb(10.4, 20.6, 30)",
            "stroke" => "green",
        });
        assert!(matches!(
            &ctx.commands()[0],
            DrawCommand::Fill { style, .. } if style == "rgb(10, 21, 30)"
        ));
        assert!(matches!(
            &ctx.commands()[1],
            DrawCommand::Stroke { style, .. } if style == "green"
        ));
    }
}
