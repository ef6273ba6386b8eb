//! Broadcast relay: every frame a connection sends goes to every other connection.
//!
//! Frames are forwarded verbatim. The relay keeps no history and has no notion of
//! rooms, so a connection only ever sees frames sent after it joined.

use axum::{
    extract::{
        State,
        ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::AppState;

/// One relayed WebSocket frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Text(Utf8Bytes),
    Binary(Bytes),
}

impl From<Frame> for Message {
    fn from(frame: Frame) -> Self {
        match frame {
            Frame::Text(text) => Message::Text(text),
            Frame::Binary(data) => Message::Binary(data),
        }
    }
}

/// Fan-out hub shared by all connections.
pub struct Relay {
    tx: broadcast::Sender<(String, Frame)>,
    /// Connected peer ids and when they joined.
    peers: DashMap<String, Instant>,
}

impl Relay {
    /// `capacity` frames are buffered per connection; a reader further behind loses
    /// the oldest ones.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            peers: DashMap::new(),
        }
    }

    /// Register a new connection.
    pub fn join(&self) -> Peer {
        let id = Uuid::new_v4().to_string();
        self.peers.insert(id.clone(), Instant::now());
        Peer {
            rx: self.tx.subscribe(),
            id,
        }
    }

    /// Forget a connection.
    pub fn leave(&self, peer_id: &str) {
        if let Some((_, joined)) = self.peers.remove(peer_id) {
            info!(
                "Peer {} left after {:.1}s ({} remaining)",
                peer_id,
                joined.elapsed().as_secs_f64(),
                self.peers.len()
            );
        }
    }

    /// Forward `frame` to every connection except `from`.
    pub fn publish(&self, from: &str, frame: Frame) {
        // Err only means nobody is subscribed.
        if self.tx.send((from.to_string(), frame)).is_err() {
            debug!("No peers to relay to");
        }
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }
}

/// A connection's view of the relay.
pub struct Peer {
    id: String,
    rx: broadcast::Receiver<(String, Frame)>,
}

impl Peer {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Next frame sent by someone else, or `None` once the relay is gone.
    pub async fn recv(&mut self) -> Option<Frame> {
        loop {
            match self.rx.recv().await {
                Ok((from, _)) if from == self.id => continue,
                Ok((_, frame)) => return Some(frame),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Peer {} lagged, dropped {} frames", self.id, skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Pump one connection until either side goes away.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let relay = &state.relay;
    let mut peer = relay.join();
    let peer_id = peer.id().to_string();
    info!("New connection: {} ({} connected)", peer_id, relay.peer_count());

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => relay.publish(&peer_id, Frame::Text(text)),
                    Some(Ok(Message::Binary(data))) => relay.publish(&peer_id, Frame::Binary(data)),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // Ignore ping/pong
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", peer_id, e);
                        break;
                    }
                }
            }

            frame = peer.recv() => {
                match frame {
                    Some(frame) => {
                        if sender.send(frame.into()).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    relay.leave(&peer_id);
}
