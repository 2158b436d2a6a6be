//! Binding a declarative component instance to one tree node.
//!
//! A [`NodeBinder`] walks a small state machine:
//!
//! ```text
//! Detached --sync--> Active(id) --deactivate/drop--> Removed
//! ```
//!
//! The first [`sync`](NodeBinder::sync) registers the component's entry and
//! inserts its node. Later syncs push only changed attributes. Deactivation
//! removes the node (and its subtree) exactly once; dropping the binder
//! deactivates it.

use std::fmt;

use crate::canvas::CanvasContext;
use crate::registry::RegistryEntry;
use crate::tree::NodeId;
use crate::value::Attributes;

/// Lifecycle of a [`NodeBinder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinderState {
    /// Not yet inserted.
    Detached,
    /// Owns the node with this id.
    Active(NodeId),
    /// Removed; further syncs are ignored.
    Removed,
}

/// A component that paints on a canvas.
pub trait CanvasComponent {
    /// Paint callbacks for this component's node type.
    fn entry() -> RegistryEntry
    where
        Self: Sized;

    /// Attributes describing the current instance.
    fn attributes(&self) -> Attributes;
}

pub struct NodeBinder {
    context: CanvasContext,
    entry: RegistryEntry,
    state: BinderState,
    parent: Option<NodeId>,
    attributes: Attributes,
}

impl NodeBinder {
    pub fn new(context: CanvasContext, entry: RegistryEntry) -> Self {
        Self {
            context,
            entry,
            state: BinderState::Detached,
            parent: None,
            attributes: Attributes::new(),
        }
    }

    pub fn for_component<C: CanvasComponent>(context: CanvasContext) -> Self {
        Self::new(context, C::entry())
    }

    pub fn state(&self) -> BinderState {
        self.state
    }

    pub fn node_id(&self) -> Option<NodeId> {
        match self.state {
            BinderState::Active(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, BinderState::Active(_))
    }

    /// The id children of this component should attach under.
    ///
    /// The component's own node while active, otherwise the parent it was
    /// given, so children of a component that never made it into the tree
    /// still land in a sensible place.
    pub fn child_parent(&self) -> Option<NodeId> {
        self.node_id().or(self.parent)
    }

    pub fn context(&self) -> &CanvasContext {
        &self.context
    }

    /// Bring the node in line with `attributes`.
    ///
    /// The parent is only used when the node is first inserted; an active
    /// node stays where it is.
    pub fn sync(&mut self, parent: Option<NodeId>, attributes: Attributes) {
        match self.state {
            BinderState::Detached => {
                self.parent = parent;
                if !self.context.has_surface() {
                    return;
                }
                self.context.register(self.entry.clone());
                if let Some(id) = self
                    .context
                    .insert(parent, self.entry.node_type(), attributes.clone())
                {
                    self.state = BinderState::Active(id);
                }
                self.attributes = attributes;
            }
            BinderState::Active(id) => {
                if parent != self.parent {
                    log::debug!(
                        "{} {} asked to move to {:?}, keeping current parent",
                        self.entry.node_type(),
                        id,
                        parent
                    );
                }
                if attributes != self.attributes {
                    self.context.update(id, &attributes);
                    self.attributes = attributes;
                }
            }
            BinderState::Removed => {
                log::debug!(
                    "Ignoring sync of removed {} binder",
                    self.entry.node_type()
                );
            }
        }
    }

    pub fn sync_component<C: CanvasComponent>(&mut self, parent: Option<NodeId>, component: &C) {
        self.sync(parent, component.attributes());
    }

    /// Remove the node. Idempotent.
    pub fn deactivate(&mut self) {
        if let BinderState::Active(id) = self.state {
            self.context.remove(Some(id));
        }
        self.state = BinderState::Removed;
    }
}

impl Drop for NodeBinder {
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl fmt::Debug for NodeBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeBinder")
            .field("node_type", &self.entry.node_type())
            .field("state", &self.state)
            .field("parent", &self.parent)
            .finish()
    }
}

/// A component instance kept in sync with its node.
#[derive(Debug)]
pub struct Mounted<C: CanvasComponent> {
    component: C,
    parent: Option<NodeId>,
    binder: NodeBinder,
}

impl<C: CanvasComponent> Mounted<C> {
    pub fn mount(context: &CanvasContext, parent: Option<NodeId>, component: C) -> Self {
        let mut binder = NodeBinder::for_component::<C>(context.clone());
        binder.sync_component(parent, &component);
        Self {
            component,
            parent,
            binder,
        }
    }

    pub fn node_id(&self) -> Option<NodeId> {
        self.binder.node_id()
    }

    pub fn child_parent(&self) -> Option<NodeId> {
        self.binder.child_parent()
    }

    pub fn component(&self) -> &C {
        &self.component
    }

    pub fn state(&self) -> BinderState {
        self.binder.state()
    }

    /// Replace the component and push its attributes.
    pub fn set(&mut self, component: C) {
        self.component = component;
        self.binder.sync_component(self.parent, &self.component);
    }

    /// Edit the component in place and push its attributes.
    pub fn update(&mut self, edit: impl FnOnce(&mut C)) {
        edit(&mut self.component);
        self.binder.sync_component(self.parent, &self.component);
    }

    /// Move to a new parent by removing the node and inserting a fresh one.
    pub fn reparent(&mut self, parent: Option<NodeId>) {
        if parent == self.parent {
            return;
        }
        let context = self.binder.context().clone();
        self.parent = parent;
        // Assigning drops the old binder, which removes the old node.
        self.binder = NodeBinder::for_component::<C>(context);
        self.binder.sync_component(self.parent, &self.component);
    }

    /// Remove the node and hand back the component.
    pub fn unmount(mut self) -> C
    where
        C: Default,
    {
        self.binder.deactivate();
        std::mem::take(&mut self.component)
    }
}
