//! Event-name keyed emission and subscription on top of a [`Transport`].

use super::{
    ConnectionState, EventName, SyncEvent, SyncResult, Transport, TransportEvent, WireMessage,
};
use std::collections::HashSet;

/// Something received from the channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A frame under a subscribed event name.
    Message(WireMessage),
    /// The transport changed state.
    Connection(ConnectionState),
}

/// The session's channel to the other participants.
///
/// Owns its transport. Frames arriving under event names nobody subscribed to are
/// dropped in [`SyncChannel::poll`], as are frames that do not parse.
pub struct SyncChannel<T: Transport> {
    transport: T,
    subscriptions: HashSet<EventName>,
}

impl<T: Transport> SyncChannel<T> {
    /// Wrap a transport with no subscriptions.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            subscriptions: HashSet::new(),
        }
    }

    /// Start delivering frames sent under `name`.
    pub fn on(&mut self, name: EventName) {
        self.subscriptions.insert(name);
    }

    /// Stop delivering frames sent under `name`.
    pub fn off(&mut self, name: EventName) {
        self.subscriptions.remove(&name);
    }

    pub fn is_subscribed(&self, name: EventName) -> bool {
        self.subscriptions.contains(&name)
    }

    /// Send a frame to every other participant.
    pub fn emit(&self, message: &WireMessage) -> SyncResult<()> {
        let json = serde_json::to_string(message)?;
        self.transport.send(&json)
    }

    /// Send a shape event to every other participant.
    pub fn emit_shape(&self, event: SyncEvent) -> SyncResult<()> {
        self.emit(&WireMessage::from(event))
    }

    /// Drain everything received since the last poll (non-blocking).
    pub fn poll(&mut self) -> Vec<Inbound> {
        let mut inbound = Vec::new();
        for event in self.transport.poll() {
            match event {
                TransportEvent::Message(text) => {
                    let message = match serde_json::from_str::<WireMessage>(&text) {
                        Ok(message) => message,
                        Err(e) => {
                            log::debug!("Ignoring unrecognized frame ({}): {}", e, preview(&text));
                            continue;
                        }
                    };
                    if self.subscriptions.contains(&message.name()) {
                        inbound.push(Inbound::Message(message));
                    } else {
                        log::debug!("Ignoring unsubscribed event {}", message.name());
                    }
                }
                TransportEvent::Connected => {
                    log::info!("Channel connected");
                    inbound.push(Inbound::Connection(ConnectionState::Connected));
                }
                TransportEvent::Disconnected => {
                    log::info!("Channel disconnected");
                    inbound.push(Inbound::Connection(ConnectionState::Disconnected));
                }
                TransportEvent::Error { message } => {
                    log::warn!("Channel error: {}", message);
                    inbound.push(Inbound::Connection(ConnectionState::Error));
                }
            }
        }
        inbound
    }

    pub fn state(&self) -> ConnectionState {
        self.transport.state()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

fn preview(text: &str) -> &str {
    let mut end = text.len().min(100);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{RectangleShape, ShapeKind};
    use crate::sync::{MemoryHub, Phase};

    fn rect_live() -> SyncEvent {
        SyncEvent::new(Phase::Live, RectangleShape::new(1.0, 2.0, 3.0, 4.0), None)
    }

    #[test]
    fn test_emit_reaches_subscribed_peer() {
        let hub = MemoryHub::new();
        let a = SyncChannel::new(hub.connect());
        let mut b = SyncChannel::new(hub.connect());
        b.on(EventName::Shape(ShapeKind::Rectangle, Phase::Live));
        b.poll(); // connection event

        a.emit_shape(rect_live()).unwrap();
        let inbound = b.poll();
        assert_eq!(inbound, vec![Inbound::Message(WireMessage::from(rect_live()))]);
    }

    #[test]
    fn test_unsubscribed_events_dropped() {
        let hub = MemoryHub::new();
        let a = SyncChannel::new(hub.connect());
        let mut b = SyncChannel::new(hub.connect());
        b.on(EventName::Shape(ShapeKind::Rectangle, Phase::Committed));
        b.poll();

        a.emit_shape(rect_live()).unwrap();
        assert!(b.poll().is_empty());

        b.on(EventName::Shape(ShapeKind::Rectangle, Phase::Live));
        b.off(EventName::Shape(ShapeKind::Rectangle, Phase::Live));
        a.emit_shape(rect_live()).unwrap();
        assert!(b.poll().is_empty());
    }

    #[test]
    fn test_malformed_frames_dropped() {
        let hub = MemoryHub::new();
        let raw = hub.connect();
        let mut b = SyncChannel::new(hub.connect());
        for name in EventName::shape_events() {
            b.on(name);
        }
        b.poll();

        raw.send("not json").unwrap();
        raw.send(r#"{"event":"rectangle-live","data":{"x":"left"}}"#).unwrap();
        assert!(b.poll().is_empty());
    }

    #[test]
    fn test_connection_state_reported() {
        let hub = MemoryHub::new();
        let mut a = SyncChannel::new(hub.connect());
        assert_eq!(a.poll(), vec![Inbound::Connection(ConnectionState::Connected)]);
        assert_eq!(a.state(), ConnectionState::Connected);
    }
}
