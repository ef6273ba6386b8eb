//! Shape event synchronization over a shared bidirectional channel.
//!
//! ## Protocol
//!
//! Every frame is a JSON text message naming one event from a fixed vocabulary:
//! ```json
//! { "event": "rectangle-live", "data": { "x": 10, "y": 10, "width": 40, "height": 20 } }
//! { "event": "circle-live", "data": { "x": 100, "y": 100, "radius": 30, "surfaceId": "1" } }
//! { "event": "line-committed", "data": { "x1": 0, "y1": 0, "x2": 5, "y2": 5 } }
//! { "event": "document-shared", "data": { "url": "/uploads/1700000000000.pdf" } }
//! ```
//! `surfaceId` is omitted by single-surface sessions.

mod channel;
mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod native;

#[cfg(target_arch = "wasm32")]
mod wasm;

pub use channel::{Inbound, SyncChannel};
pub use memory::{MemoryHub, MemoryTransport};

#[cfg(not(target_arch = "wasm32"))]
pub use native::NativeWebSocket;

#[cfg(target_arch = "wasm32")]
pub use wasm::WasmWebSocket;

use crate::document::DocumentHandle;
use crate::registry::SurfaceId;
use crate::shapes::{CircleShape, RectangleShape, Shape, ShapeKind, StrokeSegment};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sync errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Not connected")]
    NotConnected,
    #[error("Already connected")]
    AlreadyConnected,
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Lifecycle phase of a shape event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// In-progress shape: replaces the receiver's preview, or for a line segment is
    /// appended to its committed layer.
    Live,
    /// Finished shape: painted permanently.
    Committed,
}

/// Channel event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    Shape(ShapeKind, Phase),
    DocumentShared,
}

impl EventName {
    /// Every shape event name.
    pub fn shape_events() -> impl Iterator<Item = EventName> {
        ShapeKind::ALL.into_iter().flat_map(|kind| {
            [Phase::Live, Phase::Committed]
                .into_iter()
                .map(move |phase| EventName::Shape(kind, phase))
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventName::Shape(ShapeKind::Line, Phase::Live) => "line-live",
            EventName::Shape(ShapeKind::Line, Phase::Committed) => "line-committed",
            EventName::Shape(ShapeKind::Rectangle, Phase::Live) => "rectangle-live",
            EventName::Shape(ShapeKind::Rectangle, Phase::Committed) => "rectangle-committed",
            EventName::Shape(ShapeKind::Circle, Phase::Live) => "circle-live",
            EventName::Shape(ShapeKind::Circle, Phase::Committed) => "circle-committed",
            EventName::DocumentShared => "document-shared",
        }
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A shape payload together with the surface it targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Addressed<T> {
    #[serde(flatten)]
    pub payload: T,
    #[serde(rename = "surfaceId", default, skip_serializing_if = "Option::is_none")]
    pub surface_id: Option<SurfaceId>,
}

/// A frame on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum WireMessage {
    #[serde(rename = "line-live")]
    LineLive(Addressed<StrokeSegment>),
    #[serde(rename = "line-committed")]
    LineCommitted(Addressed<StrokeSegment>),
    #[serde(rename = "rectangle-live")]
    RectangleLive(Addressed<RectangleShape>),
    #[serde(rename = "rectangle-committed")]
    RectangleCommitted(Addressed<RectangleShape>),
    #[serde(rename = "circle-live")]
    CircleLive(Addressed<CircleShape>),
    #[serde(rename = "circle-committed")]
    CircleCommitted(Addressed<CircleShape>),
    #[serde(rename = "document-shared")]
    DocumentShared(DocumentHandle),
}

impl WireMessage {
    /// The event name this frame is sent under.
    pub fn name(&self) -> EventName {
        match self {
            WireMessage::LineLive(_) => EventName::Shape(ShapeKind::Line, Phase::Live),
            WireMessage::LineCommitted(_) => EventName::Shape(ShapeKind::Line, Phase::Committed),
            WireMessage::RectangleLive(_) => EventName::Shape(ShapeKind::Rectangle, Phase::Live),
            WireMessage::RectangleCommitted(_) => {
                EventName::Shape(ShapeKind::Rectangle, Phase::Committed)
            }
            WireMessage::CircleLive(_) => EventName::Shape(ShapeKind::Circle, Phase::Live),
            WireMessage::CircleCommitted(_) => {
                EventName::Shape(ShapeKind::Circle, Phase::Committed)
            }
            WireMessage::DocumentShared(_) => EventName::DocumentShared,
        }
    }

    /// The shape event carried by this frame, if it is one.
    pub fn shape_event(&self) -> Option<SyncEvent> {
        let EventName::Shape(_, phase) = self.name() else {
            return None;
        };
        let (shape, surface_id): (Shape, &Option<SurfaceId>) = match self {
            WireMessage::LineLive(a) | WireMessage::LineCommitted(a) => {
                (a.payload.into(), &a.surface_id)
            }
            WireMessage::RectangleLive(a) | WireMessage::RectangleCommitted(a) => {
                (a.payload.into(), &a.surface_id)
            }
            WireMessage::CircleLive(a) | WireMessage::CircleCommitted(a) => {
                (a.payload.into(), &a.surface_id)
            }
            WireMessage::DocumentShared(_) => return None,
        };
        Some(SyncEvent::new(phase, shape, surface_id.clone()))
    }
}

/// A shape event: one phase of one shape on one surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncEvent {
    pub phase: Phase,
    pub shape: Shape,
    pub surface_id: Option<SurfaceId>,
}

impl SyncEvent {
    pub fn new(phase: Phase, shape: impl Into<Shape>, surface_id: Option<SurfaceId>) -> Self {
        Self {
            phase,
            shape: shape.into(),
            surface_id,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    pub fn name(&self) -> EventName {
        EventName::Shape(self.kind(), self.phase)
    }
}

impl From<SyncEvent> for WireMessage {
    fn from(event: SyncEvent) -> Self {
        let surface_id = event.surface_id;
        match (event.shape, event.phase) {
            (Shape::Stroke(payload), Phase::Live) => {
                WireMessage::LineLive(Addressed { payload, surface_id })
            }
            (Shape::Stroke(payload), Phase::Committed) => {
                WireMessage::LineCommitted(Addressed { payload, surface_id })
            }
            (Shape::Rectangle(payload), Phase::Live) => {
                WireMessage::RectangleLive(Addressed { payload, surface_id })
            }
            (Shape::Rectangle(payload), Phase::Committed) => {
                WireMessage::RectangleCommitted(Addressed { payload, surface_id })
            }
            (Shape::Circle(payload), Phase::Live) => {
                WireMessage::CircleLive(Addressed { payload, surface_id })
            }
            (Shape::Circle(payload), Phase::Committed) => {
                WireMessage::CircleCommitted(Addressed { payload, surface_id })
            }
        }
    }
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Events produced by a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Connected to the relay
    Connected,
    /// Disconnected from the relay
    Disconnected,
    /// A text frame from another participant
    Message(String),
    /// Error occurred
    Error { message: String },
}

/// A bidirectional, already-established event channel to the other participants.
///
/// Implementations deliver each sent frame at most once to every other participant
/// and keep frames from one sender in order. Events are collected internally and
/// handed out by `poll`, which never blocks.
pub trait Transport {
    /// Send one text frame.
    fn send(&self, text: &str) -> SyncResult<()>;

    /// Drain pending events (non-blocking).
    fn poll(&mut self) -> Vec<TransportEvent>;

    /// Current connection state.
    fn state(&self) -> ConnectionState;

    /// Check if connected.
    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}

/// Apply a transport event to a tracked connection state.
pub(crate) fn next_state(current: ConnectionState, event: &TransportEvent) -> ConnectionState {
    match event {
        TransportEvent::Connected => ConnectionState::Connected,
        TransportEvent::Disconnected => ConnectionState::Disconnected,
        TransportEvent::Error { .. } => ConnectionState::Error,
        TransportEvent::Message(_) => current,
    }
}

// ============================================================================
// Platform type alias
// ============================================================================

/// Platform-specific WebSocket transport type.
#[cfg(target_arch = "wasm32")]
pub type PlatformWebSocket = WasmWebSocket;

#[cfg(not(target_arch = "wasm32"))]
pub type PlatformWebSocket = NativeWebSocket;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let names: Vec<&str> = EventName::shape_events().map(EventName::as_str).collect();
        assert_eq!(
            names,
            vec![
                "line-live",
                "line-committed",
                "rectangle-live",
                "rectangle-committed",
                "circle-live",
                "circle-committed",
            ]
        );
    }

    #[test]
    fn test_rectangle_committed_wire_format() {
        let event = SyncEvent::new(
            Phase::Committed,
            RectangleShape::new(10.0, 10.0, 40.0, 20.0),
            Some(SurfaceId::from("p1")),
        );
        let json = serde_json::to_value(WireMessage::from(event)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "event": "rectangle-committed",
                "data": { "x": 10.0, "y": 10.0, "width": 40.0, "height": 20.0, "surfaceId": "p1" }
            })
        );
    }

    #[test]
    fn test_surface_id_omitted_when_absent() {
        let event = SyncEvent::new(Phase::Live, StrokeSegment::new(0.0, 0.0, 1.0, 1.0), None);
        let json = serde_json::to_string(&WireMessage::from(event)).unwrap();
        assert!(json.contains("\"line-live\""));
        assert!(!json.contains("surfaceId"));
    }

    #[test]
    fn test_parse_integer_coordinates() {
        let json =
            r#"{"event":"circle-live","data":{"x":100,"y":100,"radius":30,"surfaceId":"2"}}"#;
        let msg: WireMessage = serde_json::from_str(json).unwrap();
        let event = msg.shape_event().unwrap();
        assert_eq!(event.name(), EventName::Shape(ShapeKind::Circle, Phase::Live));
        assert_eq!(event.surface_id, Some(SurfaceId::from("2")));
        assert_eq!(event.shape, Shape::Circle(CircleShape::new(100.0, 100.0, 30.0)));
    }

    #[test]
    fn test_unknown_event_rejected() {
        let json = r#"{"event":"triangle-live","data":{"x":1}}"#;
        assert!(serde_json::from_str::<WireMessage>(json).is_err());
    }

    #[test]
    fn test_document_shared() {
        let json = r#"{"event":"document-shared","data":{"url":"/uploads/1.pdf"}}"#;
        let msg: WireMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.name(), EventName::DocumentShared);
        assert!(msg.shape_event().is_none());
    }
}
