//! The canvas host: owns one draw tree, its registry and a surface.
//!
//! Components never see the [`Canvas`] itself. They get a [`CanvasContext`],
//! a cheap handle exposing the tree mutations they need. The host decides
//! when to paint: every mutation raises [`ChangeFlags::NEEDS_PAINT`] and the
//! next [`Canvas::render`] repaints the whole tree.
//!
//! # Example
//!
//! ```
//! use canvas_scene::prelude::*;
//!
//! let surface = RecordingContext::new(100.0, 100.0);
//! let mut canvas = Canvas::new(CanvasConfig::default(), Some(surface));
//! let ctx = canvas.context();
//!
//! let group = Group::new().left(10).top(5).child(Bar::new().width(4).height(4));
//! let _mounted = Shape::from(group).mount(&ctx);
//!
//! assert!(matches!(canvas.render(), RenderOutcome::Painted(_)));
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;

use crate::children::{tag_children, AcceptsParent, Child};
use crate::executor::{execute, PassStats};
use crate::registry::{NodeType, Registry, RegistryEntry, DENSITY_ATTR};
use crate::surface::SurfaceHost;
use crate::tree::{DrawTree, NodeId, Snapshot};
use crate::value::Attributes;

bitflags! {
    /// What changed since the last render pass.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ChangeFlags: u8 {
        /// Nodes were inserted or removed
        const STRUCTURE   = 0b00001;
        /// Node attributes changed
        const ATTRIBUTES  = 0b00010;
        /// A node type was registered
        const REGISTRY    = 0b00100;
        /// The output density changed
        const DENSITY     = 0b01000;
        /// The surface needs repainting
        const NEEDS_PAINT = 0b10000;
    }
}

pub struct CanvasConfig {
    /// Output density applied by the root before any node paints.
    pub density: f64,
    /// Name used in log lines, to tell several canvases apart.
    pub label: String,
    /// Skip render passes when nothing changed since the last one.
    pub skip_unchanged: bool,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            density: 1.0,
            label: "canvas".to_string(),
            skip_unchanged: true,
        }
    }
}

impl CanvasConfig {
    pub fn density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn skip_unchanged(mut self, skip: bool) -> Self {
        self.skip_unchanged = skip;
        self
    }
}

/// Shared state behind a canvas and all its contexts.
struct Scene {
    tree: DrawTree,
    registry: Registry,
    flags: ChangeFlags,
}

impl Scene {
    fn mark(&mut self, flags: ChangeFlags) {
        self.flags |= flags | ChangeFlags::NEEDS_PAINT;
    }
}

/// Result of a [`Canvas::render`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The tree was painted.
    Painted(PassStats),
    /// Nothing changed since the last pass.
    Unchanged,
    /// The host has no drawing context yet; the pass will run once it does.
    NoSurface,
}

/// The capability handed to canvas-aware components.
///
/// A context is either attached to a canvas or detached. Detached contexts
/// (no canvas upstream) accept every call and do nothing, and
/// [`has_surface`](Self::has_surface) tells components to take their
/// non-canvas path instead.
#[derive(Clone, Default)]
pub struct CanvasContext {
    scene: Option<Rc<RefCell<Scene>>>,
}

impl CanvasContext {
    /// The context seen by components rendered outside any canvas.
    pub fn detached() -> Self {
        Self { scene: None }
    }

    pub fn has_surface(&self) -> bool {
        self.scene.is_some()
    }

    /// Register paint callbacks for a node type. The first registration of
    /// a type wins.
    pub fn register(&self, entry: RegistryEntry) -> bool {
        let Some(scene) = &self.scene else {
            return false;
        };
        let mut scene = scene.borrow_mut();
        let added = scene.registry.register(entry);
        if added {
            scene.mark(ChangeFlags::REGISTRY);
        }
        added
    }

    /// Insert a node and return its id.
    ///
    /// `None` when detached or when the tree refused the node.
    pub fn insert(
        &self,
        parent: Option<NodeId>,
        node_type: NodeType,
        attributes: Attributes,
    ) -> Option<NodeId> {
        let scene = self.scene.as_ref()?;
        let mut scene = scene.borrow_mut();
        match scene.tree.insert(parent, node_type, attributes) {
            Ok(id) => {
                scene.mark(ChangeFlags::STRUCTURE);
                Some(id)
            }
            Err(err) => {
                log::warn!("Refused to insert node: {}", err);
                None
            }
        }
    }

    /// Merge `attributes` into a node. Stale ids are ignored.
    pub fn update(&self, id: NodeId, attributes: &Attributes) {
        let Some(scene) = &self.scene else {
            return;
        };
        let mut scene = scene.borrow_mut();
        if scene.tree.update(id, attributes) {
            scene.mark(ChangeFlags::ATTRIBUTES);
        }
    }

    /// Remove a node and its subtree. `None` and stale ids are ignored.
    pub fn remove(&self, id: Option<NodeId>) {
        let Some(scene) = &self.scene else {
            return;
        };
        let mut scene = scene.borrow_mut();
        if scene.tree.remove(id) {
            scene.mark(ChangeFlags::STRUCTURE);
        }
    }

    /// Tag every component in `children` with `parent` so nested instances
    /// attach under it. Primitive children are dropped.
    pub fn tag_children<E: AcceptsParent>(
        &self,
        children: Child<E>,
        parent: NodeId,
    ) -> Option<Child<E>> {
        tag_children(children, parent)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.scene
            .as_ref()
            .is_some_and(|scene| scene.borrow().tree.contains(id))
    }

    /// Current tree, or `None` when detached.
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.scene.as_ref().map(|scene| scene.borrow().tree.snapshot())
    }
}

impl fmt::Debug for CanvasContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanvasContext")
            .field("has_surface", &self.has_surface())
            .finish()
    }
}

/// A draw tree bound to a drawing surface.
pub struct Canvas<H: SurfaceHost> {
    config: CanvasConfig,
    host: H,
    scene: Rc<RefCell<Scene>>,
    passes: u64,
    last_stats: Option<PassStats>,
}

impl<H: SurfaceHost> Canvas<H> {
    pub fn new(config: CanvasConfig, host: H) -> Self {
        let density = sanitize_density(config.density).unwrap_or(1.0);
        log::info!("Creating {} with density {}", config.label, density);

        let root_attributes = Attributes::new().with(DENSITY_ATTR, density);
        let scene = Scene {
            tree: DrawTree::with_root_attributes(root_attributes),
            registry: Registry::new(),
            flags: ChangeFlags::NEEDS_PAINT,
        };
        Self {
            config,
            host,
            scene: Rc::new(RefCell::new(scene)),
            passes: 0,
            last_stats: None,
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// A handle for components to mutate this canvas' tree.
    pub fn context(&self) -> CanvasContext {
        CanvasContext {
            scene: Some(self.scene.clone()),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn snapshot(&self) -> Snapshot {
        self.scene.borrow().tree.snapshot()
    }

    pub fn flags(&self) -> ChangeFlags {
        self.scene.borrow().flags
    }

    pub fn needs_paint(&self) -> bool {
        self.flags().contains(ChangeFlags::NEEDS_PAINT)
    }

    /// Force the next [`render`](Self::render) to paint.
    pub fn invalidate(&self) {
        self.scene.borrow_mut().flags |= ChangeFlags::NEEDS_PAINT;
    }

    pub fn is_registered(&self, node_type: NodeType) -> bool {
        self.scene.borrow().registry.contains(node_type)
    }

    /// Completed render passes.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn last_stats(&self) -> Option<PassStats> {
        self.last_stats
    }

    /// Current output density.
    pub fn density(&self) -> f64 {
        self.scene
            .borrow()
            .tree
            .snapshot()
            .root()
            .attributes()
            .property(DENSITY_ATTR)
            .number_or(1.0)
    }

    /// Record a new output density on the root node.
    ///
    /// Repeated notifications of the current density are coalesced: they
    /// change nothing and do not schedule a pass. Non-positive and
    /// non-finite densities are ignored. Returns whether the density changed.
    pub fn set_density(&mut self, density: f64) -> bool {
        let Some(density) = sanitize_density(density) else {
            log::warn!("Ignoring invalid density {} for {}", density, self.config.label);
            return false;
        };
        let previous = self.density();
        if previous == density {
            return false;
        }

        let mut scene = self.scene.borrow_mut();
        let root = scene.tree.root_id();
        if scene
            .tree
            .update(root, &Attributes::new().with(DENSITY_ATTR, density))
        {
            scene.mark(ChangeFlags::DENSITY);
        }
        log::info!(
            "Density of {} changed: {} -> {}",
            self.config.label,
            previous,
            density
        );
        true
    }

    /// Remove every node; registrations and density are kept.
    pub fn reset(&mut self) {
        let mut scene = self.scene.borrow_mut();
        scene.tree.reset();
        scene.mark(ChangeFlags::STRUCTURE);
    }

    /// Repaint the whole tree if anything changed.
    pub fn render(&mut self) -> RenderOutcome {
        let (snapshot, registry, flags) = {
            let scene = self.scene.borrow();
            if self.config.skip_unchanged && !scene.flags.contains(ChangeFlags::NEEDS_PAINT) {
                return RenderOutcome::Unchanged;
            }
            (scene.tree.snapshot(), scene.registry.clone(), scene.flags)
        };

        let Some(ctx) = self.host.context() else {
            log::debug!("No drawing context for {}, skipping pass", self.config.label);
            return RenderOutcome::NoSurface;
        };

        // Cleared before painting: anything a callback changes during the
        // pass is picked up by the next one.
        self.scene.borrow_mut().flags = ChangeFlags::empty();

        let stats = execute(ctx, &snapshot, &registry);
        self.passes += 1;
        self.last_stats = Some(stats);
        log::debug!(
            "Painted {} (pass {}, version {}, {:?}): {} nodes",
            self.config.label,
            self.passes,
            snapshot.version(),
            flags,
            stats.visited
        );
        RenderOutcome::Painted(stats)
    }
}

impl<H: SurfaceHost> fmt::Debug for Canvas<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canvas")
            .field("label", &self.config.label)
            .field("passes", &self.passes)
            .field("flags", &self.flags())
            .finish()
    }
}

fn sanitize_density(density: f64) -> Option<f64> {
    (density.is_finite() && density > 0.0).then_some(density)
}
