//! In-process transport with relay semantics, for tests and local sessions.

use super::{ConnectionState, SyncError, SyncResult, Transport, TransportEvent};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct HubState {
    next_id: u64,
    inboxes: HashMap<u64, VecDeque<TransportEvent>>,
}

/// An in-process stand-in for the broadcast relay.
///
/// Every frame sent by one connected transport is queued for every other connected
/// transport, never for the sender. Nothing is replayed to late joiners.
#[derive(Clone, Default)]
pub struct MemoryHub {
    state: Arc<Mutex<HubState>>,
}

impl MemoryHub {
    /// Create a new hub with no participants.
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a new participant.
    pub fn connect(&self) -> MemoryTransport {
        let id = match self.state.lock() {
            Ok(mut state) => {
                let id = state.next_id;
                state.next_id += 1;
                state
                    .inboxes
                    .insert(id, VecDeque::from([TransportEvent::Connected]));
                Some(id)
            }
            Err(e) => {
                log::warn!("Memory hub lock error: {}", e);
                None
            }
        };
        MemoryTransport {
            hub: self.clone(),
            id,
            state: ConnectionState::Connecting,
        }
    }

    /// Number of connected participants.
    pub fn peer_count(&self) -> usize {
        self.state.lock().map(|s| s.inboxes.len()).unwrap_or(0)
    }

    fn broadcast(&self, from: u64, text: &str) -> SyncResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| SyncError::Transport(format!("Lock error: {}", e)))?;
        for (id, inbox) in state.inboxes.iter_mut() {
            if *id != from {
                inbox.push_back(TransportEvent::Message(text.to_string()));
            }
        }
        Ok(())
    }

    fn drain(&self, id: u64) -> Vec<TransportEvent> {
        match self.state.lock() {
            Ok(mut state) => state
                .inboxes
                .get_mut(&id)
                .map(|inbox| inbox.drain(..).collect())
                .unwrap_or_default(),
            Err(e) => {
                log::warn!("Memory hub lock error: {}", e);
                Vec::new()
            }
        }
    }

    fn leave(&self, id: u64) {
        if let Ok(mut state) = self.state.lock() {
            state.inboxes.remove(&id);
        }
    }
}

/// One participant's connection to a [`MemoryHub`].
pub struct MemoryTransport {
    hub: MemoryHub,
    /// `None` once disconnected.
    id: Option<u64>,
    state: ConnectionState,
}

impl MemoryTransport {
    /// Leave the hub. Frames sent to this participant afterwards are lost.
    pub fn disconnect(&mut self) {
        if let Some(id) = self.id.take() {
            self.hub.leave(id);
        }
        self.state = ConnectionState::Disconnected;
    }
}

impl Transport for MemoryTransport {
    fn send(&self, text: &str) -> SyncResult<()> {
        match self.id {
            Some(id) => self.hub.broadcast(id, text),
            None => Err(SyncError::NotConnected),
        }
    }

    fn poll(&mut self) -> Vec<TransportEvent> {
        let Some(id) = self.id else {
            return Vec::new();
        };
        let events = self.hub.drain(id);
        for event in &events {
            self.state = super::next_state(self.state, event);
        }
        events
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(events: Vec<TransportEvent>) -> Vec<String> {
        events
            .into_iter()
            .filter_map(|e| match e {
                TransportEvent::Message(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_fan_out_excludes_sender() {
        let hub = MemoryHub::new();
        let mut peers: Vec<MemoryTransport> = (0..4).map(|_| hub.connect()).collect();
        assert_eq!(hub.peer_count(), 4);

        peers[1].send("hello").unwrap();
        let received: Vec<Vec<String>> = peers.iter_mut().map(|p| messages(p.poll())).collect();

        assert!(received[1].is_empty());
        for (i, got) in received.iter().enumerate() {
            if i != 1 {
                assert_eq!(got, &vec!["hello".to_string()]);
            }
        }
    }

    #[test]
    fn test_order_preserved_per_sender() {
        let hub = MemoryHub::new();
        let a = hub.connect();
        let mut b = hub.connect();
        for i in 0..5 {
            a.send(&i.to_string()).unwrap();
        }
        assert_eq!(messages(b.poll()), vec!["0", "1", "2", "3", "4"]);
    }

    #[test]
    fn test_late_joiner_gets_nothing_retroactively() {
        let hub = MemoryHub::new();
        let a = hub.connect();
        a.send("early").unwrap();
        let mut late = hub.connect();
        assert!(messages(late.poll()).is_empty());
        assert_eq!(late.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_disconnected_send_fails() {
        let hub = MemoryHub::new();
        let mut a = hub.connect();
        let _b = hub.connect();
        a.disconnect();
        assert!(matches!(a.send("x"), Err(SyncError::NotConnected)));
        assert_eq!(hub.peer_count(), 1);
        assert!(a.poll().is_empty());
        assert!(!a.is_connected());
    }

    #[test]
    fn test_drop_leaves_hub() {
        let hub = MemoryHub::new();
        {
            let _a = hub.connect();
            assert_eq!(hub.peer_count(), 1);
        }
        assert_eq!(hub.peer_count(), 0);
    }
}
