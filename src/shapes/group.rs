use crate::binder::{CanvasComponent, NodeBinder};
use crate::canvas::CanvasContext;
use crate::children::{AcceptsParent, Child};
use crate::registry::{NodeType, RegistryEntry};
use crate::surface::DrawingContext;
use crate::tree::NodeId;
use crate::value::{Attributes, Value};

use super::{MountedShape, Shape};

pub const GROUP: NodeType = NodeType::new("GROUP");

/// Translates its children by `left` + `x` horizontally and `top` + `y`
/// vertically. The surface state is saved on enter and restored on exit, so
/// the transform after the group is bit-for-bit the one before it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Group {
    attributes: Attributes,
    children: Vec<Child<Shape>>,
    canvas_parent: Option<NodeId>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    attribute_setters! {
        top => "top",
        left => "left",
        x => "x",
        y => "y",
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.set(key, value);
        self
    }

    pub fn child(mut self, child: impl Into<Child<Shape>>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Child<Shape>>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn canvas_parent(&self) -> Option<NodeId> {
        self.canvas_parent
    }

    pub fn parent(mut self, parent: NodeId) -> Self {
        self.canvas_parent = Some(parent);
        self
    }

    /// Mount the group, then its children beneath it.
    pub fn mount(self, ctx: &CanvasContext) -> MountedShape {
        let mut binder = NodeBinder::for_component::<Group>(ctx.clone());
        binder.sync_component(self.canvas_parent, &self);

        let Group {
            children,
            canvas_parent,
            ..
        } = self;
        let children = Child::Fragment(children);
        let children = match binder.child_parent() {
            Some(parent) => ctx.tag_children(children, parent).unwrap_or_default(),
            None => children,
        };
        let children = children
            .into_elements()
            .into_iter()
            .map(|shape| shape.mount(ctx))
            .collect();

        MountedShape {
            children,
            binder,
            parent: canvas_parent,
        }
    }
}

impl AcceptsParent for Group {
    fn set_canvas_parent(&mut self, parent: NodeId) {
        self.canvas_parent = Some(parent);
    }
}

impl CanvasComponent for Group {
    fn entry() -> RegistryEntry {
        RegistryEntry::new(GROUP, |ctx, attributes| {
            let (dx, dy) = offset(attributes);
            ctx.save();
            ctx.translate(dx, dy);
        })
        .with_exit(|ctx, _| ctx.restore())
    }

    fn attributes(&self) -> Attributes {
        self.attributes.clone()
    }
}

/// Total translation; values that are not numbers contribute nothing.
fn offset(attributes: &Attributes) -> (f64, f64) {
    let component = |key: &str| attributes.property(key).try_number().unwrap_or(0.0);
    (
        component("x") + component("left"),
        component("y") + component("top"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs;
    use crate::recording::RecordingContext;
    use crate::transform::Transform;

    #[test]
    fn test_enter_and_exit_cancel_out() {
        let entry = Group::entry();
        let attributes = attrs! { "left" => 10, "top" => 5, "x" => "2", "y" => "junk" };
        let mut ctx = RecordingContext::new(100.0, 100.0);

        entry.enter(&mut ctx, &attributes);
        assert_eq!(ctx.current_transform(), Transform::translate(12.0, 5.0));

        entry.exit(&mut ctx, &attributes);
        assert!(ctx.current_transform().is_identity());
    }

    #[test]
    fn test_offset_composes_with_existing_transform() {
        let entry = Group::entry();
        let attributes = attrs! { "left" => 3 };
        let mut ctx = RecordingContext::new(100.0, 100.0);
        ctx.scale(2.0, 2.0);

        entry.enter(&mut ctx, &attributes);
        assert_eq!(ctx.current_transform().transform_point(0.0, 0.0), (6.0, 0.0));
        entry.exit(&mut ctx, &attributes);
        assert_eq!(ctx.current_transform(), Transform::scale(2.0));
    }

    #[test]
    fn test_fractional_offset_restores_exactly() {
        let entry = Group::entry();
        let mut ctx = RecordingContext::new(100.0, 100.0);
        ctx.scale(3.0, 3.0);
        ctx.translate(0.1, 0.7);
        ctx.rotate(0.3);
        let before = ctx.current_transform();

        for (left, top) in [(0.1, 0.2), (1e-7, 3.3), (0.7, 1e9)] {
            let attributes = attrs! { "left" => left, "top" => top };
            entry.enter(&mut ctx, &attributes);
            assert_ne!(ctx.current_transform(), before);
            entry.exit(&mut ctx, &attributes);
        }
        assert_eq!(ctx.current_transform(), before);
        assert_eq!(ctx.save_depth(), 0);
    }

    #[test]
    fn test_builder_collects_attributes_and_children() {
        let group = Group::new()
            .left(4)
            .attr("opacity", 0.5)
            .child(Group::new())
            .child("caption");
        let attributes = group.attributes();
        assert_eq!(attributes.property("left").number(), 4.0);
        assert_eq!(attributes.property("opacity").number(), 0.5);
        assert_eq!(group.children.len(), 2);
    }
}
