//! WebSocket transport for native platforms.

use super::{ConnectionState, SyncError, SyncResult, Transport, TransportEvent};
use std::io::ErrorKind;
use std::net::TcpStream;
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket, connect};
use url::Url;

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Commands sent to the socket thread.
enum WsCommand {
    Send(String),
    Close,
}

/// WebSocket transport for native platforms.
///
/// The socket lives on a background thread; `poll` drains what it has seen.
pub struct NativeWebSocket {
    state: ConnectionState,
    cmd_tx: Option<Sender<WsCommand>>,
    event_rx: Option<Receiver<TransportEvent>>,
    _thread: Option<JoinHandle<()>>,
}

impl NativeWebSocket {
    /// Create a new disconnected transport.
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            cmd_tx: None,
            event_rx: None,
            _thread: None,
        }
    }

    /// Connect to the relay. Fails while a previous connection is still live.
    pub fn connect(&mut self, url: &str) -> SyncResult<()> {
        if self.cmd_tx.is_some() {
            return Err(SyncError::AlreadyConnected);
        }

        let parsed = Url::parse(url).map_err(|e| SyncError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(SyncError::InvalidUrl(format!(
                "unsupported scheme: {}",
                parsed.scheme()
            )));
        }

        let (cmd_tx, cmd_rx) = channel();
        let (event_tx, event_rx) = channel();
        let url = parsed.to_string();
        let handle = thread::spawn(move || run_socket(&url, cmd_rx, event_tx));

        self.state = ConnectionState::Connecting;
        self.cmd_tx = Some(cmd_tx);
        self.event_rx = Some(event_rx);
        self._thread = Some(handle);
        Ok(())
    }

    /// Drop the handles to a socket thread that has finished or been told to close.
    fn release(&mut self) {
        self.cmd_tx = None;
        self.event_rx = None;
        self._thread = None;
    }

    /// Disconnect from the relay.
    pub fn disconnect(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(WsCommand::Close);
        }
        self.release();
        self.state = ConnectionState::Disconnected;
    }
}

/// Body of the socket thread: connect, then alternate between queued outgoing frames
/// and at most one incoming frame until either side ends the connection.
fn run_socket(url: &str, commands: Receiver<WsCommand>, events: Sender<TransportEvent>) {
    log::info!("Connecting to relay at {}", url);
    let mut socket = match connect(url) {
        Ok((socket, response)) => {
            log::info!("Relay connection open, status: {}", response.status());
            socket
        }
        Err(e) => {
            log::error!("Relay connection failed: {}", e);
            let _ = events.send(TransportEvent::Error {
                message: format!("Connection failed: {}", e),
            });
            return;
        }
    };
    let _ = events.send(TransportEvent::Connected);

    // A quiet socket must not starve outgoing frames.
    if let MaybeTlsStream::Plain(tcp) = socket.get_mut() {
        let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
        let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
    }

    while flush_outgoing(&mut socket, &commands) && read_incoming(&mut socket, &events) {}

    log::info!("Relay connection closed");
    let _ = events.send(TransportEvent::Disconnected);
}

/// Send every queued frame. Returns false once the connection should end.
fn flush_outgoing(socket: &mut Socket, commands: &Receiver<WsCommand>) -> bool {
    loop {
        match commands.try_recv() {
            Ok(WsCommand::Send(text)) => {
                if let Err(e) = socket.send(Message::Text(text)) {
                    log::error!("Relay send failed: {}", e);
                    return false;
                }
            }
            Ok(WsCommand::Close) => {
                let _ = socket.close(None);
                return false;
            }
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Disconnected) => return false,
        }
    }
}

/// Wait briefly for one frame. Returns false once the connection should end.
fn read_incoming(socket: &mut Socket, events: &Sender<TransportEvent>) -> bool {
    match socket.read() {
        Ok(Message::Text(text)) => events.send(TransportEvent::Message(text)).is_ok(),
        Ok(Message::Close(_)) => false,
        // Pings are answered by tungstenite; binary frames carry nothing for us.
        Ok(_) => true,
        Err(tungstenite::Error::Io(e))
            if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
        {
            true
        }
        Err(e) => {
            log::warn!("Relay read failed: {}", e);
            false
        }
    }
}

impl Transport for NativeWebSocket {
    fn send(&self, text: &str) -> SyncResult<()> {
        if self.state != ConnectionState::Connected {
            return Err(SyncError::NotConnected);
        }
        match self.cmd_tx {
            Some(ref tx) => tx
                .send(WsCommand::Send(text.to_string()))
                .map_err(|e| SyncError::Transport(e.to_string())),
            None => Err(SyncError::NotConnected),
        }
    }

    fn poll(&mut self) -> Vec<TransportEvent> {
        let events: Vec<TransportEvent> = match &self.event_rx {
            Some(rx) => rx.try_iter().collect(),
            None => return Vec::new(),
        };
        self.state = events.iter().fold(self.state, super::next_state);
        if matches!(self.state, ConnectionState::Disconnected | ConnectionState::Error) {
            self.release();
        }
        events
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}

impl Default for NativeWebSocket {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NativeWebSocket {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_websocket_url() {
        let mut ws = NativeWebSocket::new();
        assert!(matches!(
            ws.connect("http://localhost:4000/ws"),
            Err(SyncError::InvalidUrl(_))
        ));
        assert!(matches!(ws.connect("not a url"), Err(SyncError::InvalidUrl(_))));
        assert_eq!(ws.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_send_before_connect_fails() {
        let ws = NativeWebSocket::new();
        assert!(matches!(ws.send("{}"), Err(SyncError::NotConnected)));
    }

    #[test]
    fn test_reconnect_after_connection_ends() {
        let mut ws = NativeWebSocket::new();
        // Nothing listens on port 1, so the socket thread reports an error and exits.
        ws.connect("ws://127.0.0.1:1/ws").unwrap();
        assert!(matches!(
            ws.connect("ws://127.0.0.1:1/ws"),
            Err(SyncError::AlreadyConnected)
        ));

        let mut events = Vec::new();
        for _ in 0..200 {
            events.extend(ws.poll());
            if ws.state() == ConnectionState::Error {
                break;
            }
            thread::sleep(Duration::from_millis(25));
        }
        assert!(matches!(events.last(), Some(TransportEvent::Error { .. })));
        assert_eq!(ws.state(), ConnectionState::Error);
        assert!(ws.poll().is_empty());

        ws.connect("ws://127.0.0.1:1/ws").unwrap();
        assert_eq!(ws.state(), ConnectionState::Connecting);
        ws.disconnect();
    }
}
