//! InkShare Core Library
//!
//! Shared drawing surfaces for several participants: local pointer gestures become
//! lines, rectangles and circles, painted on a two-layer surface and relayed to every
//! other participant as live previews and committed shapes.

pub mod document;
pub mod input;
pub mod registry;
pub mod session;
pub mod shapes;
pub mod surface;
pub mod sync;
pub mod tools;

pub use document::{DocumentHandle, PageLayout, PageRender};
pub use input::{PointerEvent, PointerPhase, Viewport};
pub use registry::{SurfaceId, SurfaceRegistry};
pub use session::{Session, SessionConfig, SessionEvent};
pub use shapes::{CircleShape, RectangleShape, Shape, ShapeKind, StrokeSegment};
pub use surface::{Layer, StrokeStyle, SurfacePair};
pub use sync::{ConnectionState, Phase, PlatformWebSocket, SyncError, SyncEvent, WireMessage};
pub use tools::{ToolBox, ToolState};
