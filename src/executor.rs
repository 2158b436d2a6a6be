//! Bracketed render pass over a tree snapshot.
//!
//! Every pass repaints from scratch: the root's entry clears the surface,
//! then each node is visited pre-order. A node's `enter` runs before its
//! children and its `exit` after them, so a transform pushed by a group is
//! in effect exactly while its descendants paint and is undone before its
//! next sibling starts.

use crate::registry::Registry;
use crate::surface::DrawingContext;
use crate::tree::{DrawNode, Snapshot};

/// Counters for one render pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassStats {
    /// Nodes visited, root included.
    pub visited: usize,
    /// Nodes whose type resolved to a registry entry.
    pub drawn: usize,
    /// Nodes of unregistered types (children still visited).
    pub skipped: usize,
    /// Deepest level reached; the root is depth 0.
    pub max_depth: usize,
}

/// Paint `snapshot` onto `ctx` using the callbacks in `registry`.
pub fn execute(
    ctx: &mut dyn DrawingContext,
    snapshot: &Snapshot,
    registry: &Registry,
) -> PassStats {
    let mut stats = PassStats::default();
    visit(ctx, snapshot.root(), registry, 0, &mut stats);
    log::trace!(
        "Render pass for version {}: {} visited, {} drawn, {} skipped",
        snapshot.version(),
        stats.visited,
        stats.drawn,
        stats.skipped
    );
    stats
}

fn visit(
    ctx: &mut dyn DrawingContext,
    node: &DrawNode,
    registry: &Registry,
    depth: usize,
    stats: &mut PassStats,
) {
    stats.visited += 1;
    stats.max_depth = stats.max_depth.max(depth);

    // An unregistered type only loses its own drawing, never its subtree.
    let entry = registry.resolve(node.node_type());
    match entry {
        Some(entry) => {
            stats.drawn += 1;
            entry.enter(ctx, node.attributes());
        }
        None => {
            stats.skipped += 1;
            log::trace!(
                "No entry for node type {} ({}), visiting children only",
                node.node_type(),
                node.id()
            );
        }
    }

    for child in node.children() {
        visit(ctx, child, registry, depth + 1, stats);
    }

    if let Some(entry) = entry {
        entry.exit(ctx, node.attributes());
    }
}
