pub mod binder;
pub mod canvas;
pub mod children;
pub mod executor;
pub mod property;
pub mod recording;
pub mod registry;
pub mod shapes;
pub mod surface;
pub mod transform;
pub mod tree;
pub mod util;
pub mod value;

pub mod prelude {
    pub use crate::binder::{BinderState, CanvasComponent, Mounted, NodeBinder};
    pub use crate::canvas::{Canvas, CanvasConfig, CanvasContext, ChangeFlags, RenderOutcome};
    pub use crate::children::{AcceptsParent, Child};
    pub use crate::executor::PassStats;
    pub use crate::property::{Property, PropertyError};
    pub use crate::recording::{DrawCommand, RecordingContext};
    pub use crate::registry::{NodeType, RegistryEntry};
    pub use crate::shapes::{Bar, Circle, Group, LinePath, MountedShape, Shape};
    pub use crate::surface::{DrawingContext, LineCap, NoSurface, SurfaceHost};
    pub use crate::transform::Transform;
    pub use crate::tree::{NodeId, Snapshot};
    pub use crate::value::{Attributes, Value};
    pub use crate::attrs;
}

pub use canvas::{Canvas, CanvasConfig, CanvasContext, RenderOutcome};
pub use tree::{DrawTree, NodeId};
