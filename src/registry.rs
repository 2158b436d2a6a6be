//! Node types and the enter/exit callbacks that paint them.
//!
//! ## Storage
//!
//! Uses a `Vec<RegistryEntry>` with linear scan. A chart registers a handful
//! of types (root, group, a few shapes), so a scan over a short vector beats
//! hashing and keeps registration order visible when debugging.
//!
//! ## Idempotence
//!
//! Every instance of a component registers its type on mount. Only the first
//! registration of a type is kept; later ones are ignored. All instances of
//! one type are expected to supply behaviorally equivalent callbacks; this
//! is a caller contract and is not checked.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::surface::DrawingContext;
use crate::transform::Transform;
use crate::value::Attributes;

/// Root attribute carrying the output density (device pixels per unit).
pub const DENSITY_ATTR: &str = "density";

thread_local! {
    static INTERNED: RefCell<HashSet<&'static str>> = RefCell::new(HashSet::new());
}

/// Interned identifier of a node type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeType(&'static str);

impl NodeType {
    /// The implicit tree root. Its entry clears the surface.
    pub const ROOT: NodeType = NodeType("ROOT");

    pub const fn new(name: &'static str) -> Self {
        NodeType(name)
    }

    /// Intern a type name only known at runtime.
    ///
    /// Each distinct name is leaked once and reused afterwards, so the set
    /// of allocations is bounded by the number of distinct types.
    pub fn intern(name: &str) -> Self {
        INTERNED.with(|interned| {
            let mut interned = interned.borrow_mut();
            if let Some(existing) = interned.get(name) {
                return NodeType(*existing);
            }
            let leaked: &'static str = Box::leak(name.to_owned().into_boxed_str());
            interned.insert(leaked);
            NodeType(leaked)
        })
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    pub fn is_root(&self) -> bool {
        *self == Self::ROOT
    }
}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeType({})", self.0)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Paint callback invoked with the surface and the node's attributes.
pub type DrawFn = Rc<dyn Fn(&mut dyn DrawingContext, &Attributes)>;

/// The enter/exit pair registered for one node type.
#[derive(Clone)]
pub struct RegistryEntry {
    node_type: NodeType,
    enter: DrawFn,
    exit: Option<DrawFn>,
}

impl RegistryEntry {
    pub fn new(
        node_type: NodeType,
        enter: impl Fn(&mut dyn DrawingContext, &Attributes) + 'static,
    ) -> Self {
        Self {
            node_type,
            enter: Rc::new(enter),
            exit: None,
        }
    }

    /// Add the callback run after all children have been painted.
    pub fn with_exit(
        mut self,
        exit: impl Fn(&mut dyn DrawingContext, &Attributes) + 'static,
    ) -> Self {
        self.exit = Some(Rc::new(exit));
        self
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn has_exit(&self) -> bool {
        self.exit.is_some()
    }

    pub fn enter(&self, ctx: &mut dyn DrawingContext, attributes: &Attributes) {
        (self.enter)(ctx, attributes);
    }

    pub fn exit(&self, ctx: &mut dyn DrawingContext, attributes: &Attributes) {
        if let Some(exit) = &self.exit {
            exit(ctx, attributes);
        }
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("node_type", &self.node_type)
            .field("has_exit", &self.has_exit())
            .finish()
    }
}

/// Entry for the implicit root: reset, clear, then apply output density.
pub fn root_entry() -> RegistryEntry {
    RegistryEntry::new(NodeType::ROOT, |ctx, attributes| {
        ctx.set_transform(Transform::IDENTITY);
        let (width, height) = ctx.size();
        ctx.clear_rect(0.0, 0.0, width, height);

        let density = attributes.property(DENSITY_ATTR).number_or(1.0);
        if density.is_finite() && density > 0.0 && density != 1.0 {
            ctx.scale(density, density);
        }
    })
}

/// Type-to-callbacks table owned by one canvas.
///
/// Cloning is cheap: entries share their callbacks.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
}

impl Registry {
    /// A registry with only the root entry.
    pub fn new() -> Self {
        Self {
            entries: vec![root_entry()],
        }
    }

    /// Register `entry` unless its type is already present.
    ///
    /// Returns `true` when the entry was added.
    pub fn register(&mut self, entry: RegistryEntry) -> bool {
        if self.contains(entry.node_type) {
            log::debug!(
                "Ignoring duplicate registration for node type {}",
                entry.node_type
            );
            return false;
        }
        log::debug!("Registered node type {}", entry.node_type);
        self.entries.push(entry);
        true
    }

    pub fn resolve(&self, node_type: NodeType) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.node_type == node_type)
    }

    pub fn contains(&self, node_type: NodeType) -> bool {
        self.resolve(node_type).is_some()
    }

    /// Registered types in registration order.
    pub fn types(&self) -> impl Iterator<Item = NodeType> + '_ {
        self.entries.iter().map(|e| e.node_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs;
    use crate::recording::{DrawCommand, RecordingContext};

    fn tagging_entry(
        ty: NodeType,
        log: Rc<RefCell<Vec<&'static str>>>,
        tag: &'static str,
    ) -> RegistryEntry {
        let exit_log = log.clone();
        RegistryEntry::new(ty, move |_, _| log.borrow_mut().push(tag))
            .with_exit(move |_, _| exit_log.borrow_mut().push(tag))
    }

    #[test]
    fn test_first_registration_wins() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let ty = NodeType::new("T");
        let mut registry = Registry::new();

        assert!(registry.register(tagging_entry(ty, log.clone(), "A")));
        assert!(!registry.register(tagging_entry(ty, log.clone(), "B")));

        let mut ctx = RecordingContext::new(1.0, 1.0);
        let entry = registry.resolve(ty).unwrap();
        entry.enter(&mut ctx, &Attributes::new());
        entry.exit(&mut ctx, &Attributes::new());
        assert_eq!(*log.borrow(), vec!["A", "A"]);
    }

    #[test]
    fn test_root_is_preregistered() {
        let registry = Registry::new();
        assert!(registry.contains(NodeType::ROOT));
        assert!(!registry.resolve(NodeType::ROOT).unwrap().has_exit());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_root_entry_resets_and_clears() {
        let mut ctx = RecordingContext::new(20.0, 10.0);
        ctx.translate(5.0, 5.0);
        root_entry().enter(&mut ctx, &Attributes::new());

        assert!(ctx.current_transform().is_identity());
        assert!(matches!(ctx.commands(), [DrawCommand::Clear { .. }]));
    }

    #[test]
    fn test_root_entry_applies_density() {
        let mut ctx = RecordingContext::new(20.0, 10.0);
        root_entry().enter(&mut ctx, &attrs! { DENSITY_ATTR => 2 });
        assert_eq!(ctx.current_transform(), Transform::scale(2.0));

        root_entry().enter(&mut ctx, &attrs! { DENSITY_ATTR => -1 });
        assert!(ctx.current_transform().is_identity());
    }

    #[test]
    fn test_intern_returns_equal_types() {
        let a = NodeType::intern("DYNAMIC");
        let b = NodeType::intern(&String::from("DYNAMIC"));
        assert_eq!(a, b);
        assert!(std::ptr::eq(a.as_str(), b.as_str()));
        assert_eq!(a, NodeType::new("DYNAMIC"));
    }

    #[test]
    fn test_missing_exit_is_noop() {
        let entry = RegistryEntry::new(NodeType::new("LEAF"), |_, _| {});
        let mut ctx = RecordingContext::new(1.0, 1.0);
        entry.exit(&mut ctx, &Attributes::new());
        assert!(ctx.commands().is_empty());
    }
}
