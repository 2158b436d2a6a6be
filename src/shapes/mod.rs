//! Built-in canvas components.
//!
//! Each shape is a builder over its attributes. Mounting a [`Shape`] binds
//! it to a node on the canvas; a [`Group`] also mounts its children beneath
//! its own node so its translation applies to them.
//!
//! Shapes share the canvas' drawing state, so every shape starts from known
//! styles and puts the defaults back in its exit callback.

use crate::binder::{CanvasComponent, NodeBinder};
use crate::canvas::CanvasContext;
use crate::children::{AcceptsParent, Child};
use crate::surface::{DrawingContext, LineCap};
use crate::tree::NodeId;
use crate::value::Attributes;

/// Builder setters that store their argument as a named attribute.
macro_rules! attribute_setters {
    ($($method:ident => $key:literal),* $(,)?) => {
        $(
            pub fn $method(mut self, value: impl Into<$crate::value::Value>) -> Self {
                self.attributes.set($key, value);
                self
            }
        )*
    };
}

mod bar;
mod circle;
mod group;
mod line_path;

pub use bar::{Bar, BAR};
pub use circle::{Circle, CIRCLE};
pub use group::{Group, GROUP};
pub use line_path::{LinePath, LINE_PATH};

/// Smallest line width a surface accepts; used where "no line" is meant.
pub const PSEUDO_ZERO: f64 = 1e-6;

pub const DEFAULT_STROKE: &str = "#000";
pub const DEFAULT_FILL: &str = "black";

/// Put the shared drawing styles back to their defaults.
pub fn reset_styles(ctx: &mut dyn DrawingContext) {
    ctx.set_line_width(PSEUDO_ZERO);
    ctx.set_stroke_style(DEFAULT_STROKE);
    ctx.set_fill_style(DEFAULT_FILL);
}

/// Apply `stroke`, `strokeWidth` and `strokeLinecap`.
///
/// The cap is round unless a concrete cap is given.
pub fn apply_stroke_styles(ctx: &mut dyn DrawingContext, attributes: &Attributes) {
    let stroke = attributes.property("stroke");
    if stroke.has_value(false) {
        ctx.set_stroke_style(&stroke.color());
    }
    let width = attributes.property("strokeWidth");
    if width.has_value(false) {
        ctx.set_line_width(width.number());
    }
    // `inherit` and unknown keywords parse to None
    let cap = LineCap::parse(&attributes.property("strokeLinecap").string());
    ctx.set_line_cap(cap.unwrap_or(LineCap::Round));
}

/// Any built-in component.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Group(Group),
    Bar(Bar),
    Circle(Circle),
    LinePath(LinePath),
}

impl Shape {
    pub fn canvas_parent(&self) -> Option<NodeId> {
        match self {
            Shape::Group(group) => group.canvas_parent(),
            Shape::Bar(bar) => bar.canvas_parent(),
            Shape::Circle(circle) => circle.canvas_parent(),
            Shape::LinePath(path) => path.canvas_parent(),
        }
    }

    /// Bind this shape (and any children) to nodes on `ctx`'s canvas.
    pub fn mount(self, ctx: &CanvasContext) -> MountedShape {
        match self {
            Shape::Group(group) => group.mount(ctx),
            Shape::Bar(bar) => MountedShape::leaf(ctx, bar.canvas_parent(), &bar),
            Shape::Circle(circle) => MountedShape::leaf(ctx, circle.canvas_parent(), &circle),
            Shape::LinePath(path) => MountedShape::leaf(ctx, path.canvas_parent(), &path),
        }
    }
}

impl AcceptsParent for Shape {
    fn set_canvas_parent(&mut self, parent: NodeId) {
        match self {
            Shape::Group(group) => group.set_canvas_parent(parent),
            Shape::Bar(bar) => bar.set_canvas_parent(parent),
            Shape::Circle(circle) => circle.set_canvas_parent(parent),
            Shape::LinePath(path) => path.set_canvas_parent(parent),
        }
    }
}

macro_rules! impl_shape_from {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Shape {
                fn from(shape: $variant) -> Self {
                    Shape::$variant(shape)
                }
            }

            impl From<$variant> for Child<Shape> {
                fn from(shape: $variant) -> Self {
                    Child::Element(Shape::$variant(shape))
                }
            }
        )*
    };
}

impl_shape_from!(Group, Bar, Circle, LinePath);

impl From<Shape> for Child<Shape> {
    fn from(shape: Shape) -> Self {
        Child::Element(shape)
    }
}

/// A mounted shape and its mounted children. Dropping it removes the nodes.
#[derive(Debug)]
pub struct MountedShape {
    // Children go first so they are removed before their parent.
    children: Vec<MountedShape>,
    binder: NodeBinder,
    parent: Option<NodeId>,
}

impl MountedShape {
    fn leaf<C: CanvasComponent>(
        ctx: &CanvasContext,
        parent: Option<NodeId>,
        component: &C,
    ) -> Self {
        let mut binder = NodeBinder::for_component::<C>(ctx.clone());
        binder.sync_component(parent, component);
        Self {
            children: Vec::new(),
            binder,
            parent,
        }
    }

    pub fn node_id(&self) -> Option<NodeId> {
        self.binder.node_id()
    }

    pub fn children(&self) -> &[MountedShape] {
        &self.children
    }

    /// Mutable access to the mounted children, so nested shapes can be
    /// updated in place without remounting.
    pub fn children_mut(&mut self) -> &mut [MountedShape] {
        &mut self.children
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut MountedShape> {
        self.children.get_mut(index)
    }

    /// Push new attributes for this shape's node.
    pub fn update(&mut self, attributes: Attributes) {
        self.binder.sync(self.parent, attributes);
    }
}
