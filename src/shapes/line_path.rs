use crate::binder::CanvasComponent;
use crate::children::AcceptsParent;
use crate::registry::{NodeType, RegistryEntry};
use crate::surface::DrawingContext;
use crate::tree::NodeId;
use crate::value::{Attributes, Value};

use super::{apply_stroke_styles, reset_styles};

pub const LINE_PATH: NodeType = NodeType::new("LINE_PATH");

/// A polyline through `points`.
///
/// Points are `{x, y}` maps or `[x, y]` pairs. A point that is missing a
/// coordinate or has a non-finite one is undefined: the line stops there
/// and starts again at the next defined point.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinePath {
    attributes: Attributes,
    canvas_parent: Option<NodeId>,
}

impl LinePath {
    pub fn new() -> Self {
        Self::default()
    }

    attribute_setters! {
        fill => "fill",
        stroke => "stroke",
        stroke_width => "strokeWidth",
        stroke_linecap => "strokeLinecap",
    }

    /// Set the points from coordinate pairs.
    pub fn points(mut self, points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let points: Vec<Value> = points
            .into_iter()
            .map(|(x, y)| Value::from(vec![x, y]))
            .collect();
        self.attributes.set("points", points);
        self
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

impl AcceptsParent for LinePath {
    fn set_canvas_parent(&mut self, parent: NodeId) {
        self.canvas_parent = Some(parent);
    }
}

impl CanvasComponent for LinePath {
    fn entry() -> RegistryEntry {
        RegistryEntry::new(LINE_PATH, draw).with_exit(|ctx, _| reset_styles(ctx))
    }

    fn attributes(&self) -> Attributes {
        self.attributes.clone()
    }
}

fn draw(ctx: &mut dyn DrawingContext, attributes: &Attributes) {
    reset_styles(ctx);

    ctx.begin_path();
    let points = attributes
        .get("points")
        .and_then(Value::as_list)
        .unwrap_or_default();
    let mut pen_down = false;
    for point in points {
        match defined_point(point) {
            Some((x, y)) if pen_down => ctx.line_to(x, y),
            Some((x, y)) => {
                ctx.move_to(x, y);
                pen_down = true;
            }
            None => pen_down = false,
        }
    }

    ctx.set_fill_style(&attributes.property("fill").color_or("transparent"));
    apply_stroke_styles(ctx, attributes);

    ctx.fill();
    ctx.stroke();
}

fn defined_point(point: &Value) -> Option<(f64, f64)> {
    let (x, y) = match point {
        Value::Map(_) => (point.get("x")?.as_f64()?, point.get("y")?.as_f64()?),
        Value::List(pair) => match pair.as_slice() {
            [x, y] => (x.as_f64()?, y.as_f64()?),
            _ => return None,
        },
        _ => return None,
    };
    (x.is_finite() && y.is_finite()).then_some((x, y))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::attrs;
    use crate::recording::{DrawCommand, PathSegment, RecordingContext};
    use crate::surface::LineCap;

    fn paint(attributes: Attributes) -> RecordingContext {
        let mut ctx = RecordingContext::new(100.0, 100.0);
        LinePath::entry().enter(&mut ctx, &attributes);
        ctx
    }

    fn map_point(x: f64, y: f64) -> Value {
        let mut map = BTreeMap::new();
        map.insert("x".to_string(), Value::from(x));
        map.insert("y".to_string(), Value::from(y));
        Value::Map(map)
    }

    #[test]
    fn test_polyline_through_pairs() {
        let line = LinePath::new().points([(0.0, 0.0), (5.0, 5.0), (10.0, 0.0)]).stroke("red");
        let ctx = paint(line.attributes());
        assert_eq!(
            ctx.commands()[1].path(),
            &[
                PathSegment::MoveTo(0.0, 0.0),
                PathSegment::LineTo(5.0, 5.0),
                PathSegment::LineTo(10.0, 0.0),
            ]
        );
        let DrawCommand::Stroke { style, line_cap, .. } = &ctx.commands()[1] else {
            panic!("stroke expected");
        };
        assert_eq!(style, "red");
        assert_eq!(*line_cap, LineCap::Round);
    }

    #[test]
    fn test_map_points_and_gaps() {
        let points = vec![
            map_point(1.0, 1.0),
            map_point(2.0, 2.0),
            map_point(f64::NAN, 3.0),
            Value::Null,
            map_point(4.0, 4.0),
            map_point(5.0, 5.0),
        ];
        let ctx = paint(attrs! { "points" => points });
        assert_eq!(
            ctx.commands()[0].path(),
            &[
                PathSegment::MoveTo(1.0, 1.0),
                PathSegment::LineTo(2.0, 2.0),
                PathSegment::MoveTo(4.0, 4.0),
                PathSegment::LineTo(5.0, 5.0),
            ]
        );
    }

    #[test]
    fn test_fill_defaults_to_transparent() {
        let ctx = paint(LinePath::new().points([(0.0, 0.0), (1.0, 1.0)]).attributes());
        assert!(matches!(
            &ctx.commands()[0],
            DrawCommand::Fill { style, .. } if style == "transparent"
        ));

        let ctx = paint(
            LinePath::new()
                .points([(0.0, 0.0), (1.0, 1.0)])
                .fill("blue")
                .attributes(),
        );
        assert!(matches!(&ctx.commands()[0], DrawCommand::Fill { style, .. } if style == "blue"));
    }

    #[test]
    fn test_no_points_draws_nothing() {
        assert!(paint(Attributes::new()).commands().is_empty());
        assert!(paint(attrs! { "points" => "nonsense" }).commands().is_empty());
    }
}
