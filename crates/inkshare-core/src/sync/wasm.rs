//! WebSocket transport for the browser.

use super::{ConnectionState, SyncError, SyncResult, Transport, TransportEvent};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CloseEvent, ErrorEvent, MessageEvent, WebSocket};

/// WebSocket transport for WASM.
///
/// Events are collected by the socket callbacks and handed out by `poll`.
pub struct WasmWebSocket {
    ws: Option<WebSocket>,
    state: ConnectionState,
    events: Rc<RefCell<Vec<TransportEvent>>>,
    // Closures must outlive the socket callbacks.
    _on_open: Option<Closure<dyn Fn()>>,
    _on_message: Option<Closure<dyn Fn(MessageEvent)>>,
    _on_close: Option<Closure<dyn Fn(CloseEvent)>>,
    _on_error: Option<Closure<dyn Fn(ErrorEvent)>>,
}

impl WasmWebSocket {
    /// Create a new disconnected transport.
    pub fn new() -> Self {
        Self {
            ws: None,
            state: ConnectionState::Disconnected,
            events: Rc::new(RefCell::new(Vec::new())),
            _on_open: None,
            _on_message: None,
            _on_close: None,
            _on_error: None,
        }
    }

    /// Connect to the relay.
    pub fn connect(&mut self, url: &str) -> SyncResult<()> {
        if self.ws.is_some() {
            return Err(SyncError::AlreadyConnected);
        }

        let ws = WebSocket::new(url).map_err(|e| SyncError::InvalidUrl(format!("{:?}", e)))?;
        ws.set_binary_type(web_sys::BinaryType::Arraybuffer);

        self.state = ConnectionState::Connecting;

        let events_open = self.events.clone();
        let on_open = Closure::wrap(Box::new(move || {
            events_open.borrow_mut().push(TransportEvent::Connected);
        }) as Box<dyn Fn()>);
        ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));

        let events_msg = self.events.clone();
        let on_message = Closure::wrap(Box::new(move |e: MessageEvent| {
            if let Ok(txt) = e.data().dyn_into::<js_sys::JsString>() {
                events_msg.borrow_mut().push(TransportEvent::Message(txt.into()));
            }
        }) as Box<dyn Fn(MessageEvent)>);
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

        let events_close = self.events.clone();
        let on_close = Closure::wrap(Box::new(move |_e: CloseEvent| {
            events_close.borrow_mut().push(TransportEvent::Disconnected);
        }) as Box<dyn Fn(CloseEvent)>);
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        let events_err = self.events.clone();
        let on_error = Closure::wrap(Box::new(move |_e: ErrorEvent| {
            events_err.borrow_mut().push(TransportEvent::Error {
                message: "WebSocket error".to_string(),
            });
        }) as Box<dyn Fn(ErrorEvent)>);
        ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        self.ws = Some(ws);
        self._on_open = Some(on_open);
        self._on_message = Some(on_message);
        self._on_close = Some(on_close);
        self._on_error = Some(on_error);

        Ok(())
    }

    /// Disconnect from the relay.
    pub fn disconnect(&mut self) {
        if let Some(ws) = self.ws.take() {
            let _ = ws.close();
        }
        self.state = ConnectionState::Disconnected;
        self._on_open = None;
        self._on_message = None;
        self._on_close = None;
        self._on_error = None;
    }
}

impl Transport for WasmWebSocket {
    fn send(&self, text: &str) -> SyncResult<()> {
        match self.ws {
            Some(ref ws) if self.state == ConnectionState::Connected => ws
                .send_with_str(text)
                .map_err(|e| SyncError::Transport(format!("{:?}", e))),
            _ => Err(SyncError::NotConnected),
        }
    }

    fn poll(&mut self) -> Vec<TransportEvent> {
        let events = std::mem::take(&mut *self.events.borrow_mut());
        for event in &events {
            self.state = super::next_state(self.state, event);
        }
        events
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}

impl Default for WasmWebSocket {
    fn default() -> Self {
        Self::new()
    }
}
