//! A participant's drawing session.
//!
//! Ties the channel, the surfaces and their tool machines together. The host feeds
//! pointer input through [`Session::handle_pointer`] and calls [`Session::poll`] once
//! per frame; everything else happens in those two calls.

use crate::document::{DocumentHandle, PageLayout, PageRender};
use crate::input::{PointerEvent, Viewport};
use crate::registry::{SurfaceId, SurfaceKey, SurfaceRegistry};
use crate::shapes::ShapeKind;
use crate::surface::{Layer, StrokeStyle, SurfacePair};
use crate::sync::{
    ConnectionState, EventName, Inbound, SyncChannel, SyncEvent, SyncResult, Transport,
    WireMessage,
};
use crate::tools::{self, ToolBox};
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::mpsc::{Receiver, TryRecvError};

/// Per-session settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Style for every surface created by the session.
    #[serde(default)]
    pub stroke: StrokeStyle,
    /// Sizing of document page surfaces.
    #[serde(default)]
    pub page_layout: PageLayout,
}

impl SessionConfig {
    /// Parse a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Something the host should react to after [`Session::poll`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Another participant announced a document.
    DocumentShared(DocumentHandle),
    /// The channel changed state.
    Connection(ConnectionState),
}

pub struct Session<T: Transport> {
    config: SessionConfig,
    channel: SyncChannel<T>,
    registry: SurfaceRegistry,
    tools: HashMap<SurfaceKey, ToolBox>,
    viewports: HashMap<SurfaceKey, Viewport>,
    active_tool: Option<ShapeKind>,
    pages: Vec<Receiver<PageRender>>,
}

impl<T: Transport> Session<T> {
    /// Start a session over `transport`, listening for every shape event and for
    /// document announcements.
    pub fn new(transport: T, config: SessionConfig) -> Self {
        let mut channel = SyncChannel::new(transport);
        for name in EventName::shape_events() {
            channel.on(name);
        }
        channel.on(EventName::DocumentShared);

        Self {
            config,
            channel,
            registry: SurfaceRegistry::new(),
            tools: HashMap::new(),
            viewports: HashMap::new(),
            active_tool: None,
            pages: Vec::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Register a mounted surface. Re-registering an id starts it over blank.
    pub fn add_surface(&mut self, id: Option<SurfaceId>, width: u32, height: u32) {
        let pair = SurfacePair::new(width, height, self.config.stroke);
        self.registry.register(id.clone(), pair);
        self.tools.insert(id, ToolBox::new());
    }

    /// Forget a surface, its tools and its viewport.
    pub fn remove_surface(&mut self, id: Option<&SurfaceId>) -> bool {
        let key = id.cloned();
        self.tools.remove(&key);
        self.viewports.remove(&key);
        self.registry.unregister(id).is_some()
    }

    /// Set where a surface sits on the page, for pointer scaling.
    pub fn set_viewport(&mut self, id: Option<&SurfaceId>, viewport: Viewport) {
        self.viewports.insert(id.cloned(), viewport);
    }

    /// Change a surface's backing-store size, keeping its committed artwork.
    pub fn resize_surface(&mut self, id: Option<&SurfaceId>, width: u32, height: u32) {
        let Some(pair) = self.registry.resolve_mut(id) else {
            log::debug!("Resize for unknown surface {:?}", id);
            return;
        };
        pair.resize(width, height);
        if let Some(viewport) = self.viewports.get_mut(&id.cloned()) {
            viewport.backing_size = Size::new(width as f64, height as f64);
        }
    }

    pub fn active_tool(&self) -> Option<ShapeKind> {
        self.active_tool
    }

    /// Switch tools. Any gesture in progress is abandoned; a rectangle or circle preview
    /// is cleared, while line segments already drawn stay.
    pub fn set_active_tool(&mut self, tool: Option<ShapeKind>) {
        if tool == self.active_tool {
            return;
        }
        let previous = self.active_tool;
        for (key, toolbox) in self.tools.iter_mut() {
            // Line segments are already committed; only a shape preview is left behind.
            let abandoned = previous
                .is_some_and(|kind| kind != ShapeKind::Line && toolbox.is_drawing(kind));
            toolbox.cancel_all();
            if abandoned {
                if let Some(pair) = self.registry.resolve_mut(key.as_ref()) {
                    pair.clear_preview();
                }
            }
        }
        log::debug!("Active tool {:?} -> {:?}", previous, tool);
        self.active_tool = tool;
    }

    /// Feed one pointer sample for a surface, in page coordinates.
    ///
    /// Ignored when no tool is active or the surface is unknown.
    pub fn handle_pointer(&mut self, id: Option<&SurfaceId>, event: PointerEvent) {
        let Some(kind) = self.active_tool else {
            return;
        };
        let key = id.cloned();
        let (Some(pair), Some(toolbox)) =
            (self.registry.resolve_mut(id), self.tools.get_mut(&key))
        else {
            log::debug!("Pointer input for unknown surface {:?}", id);
            return;
        };
        let at = match self.viewports.get(&key) {
            Some(viewport) => viewport.to_surface(event.position),
            None => event.position,
        };

        if let Some(outgoing) = toolbox.handle_pointer(kind, event.phase, at, pair, id) {
            self.emit(outgoing);
        }
    }

    fn emit(&self, event: SyncEvent) {
        let name = event.name();
        if let Err(e) = self.channel.emit_shape(event) {
            log::debug!("Dropping {}: {}", name, e);
        }
    }

    /// Announce an uploaded document to the other participants.
    pub fn share_document(&self, url: impl Into<String>) -> SyncResult<()> {
        self.channel
            .emit(&WireMessage::DocumentShared(DocumentHandle::new(url)))
    }

    /// Process everything that arrived since the last poll.
    ///
    /// Remote shape events are painted onto their surfaces; events for surfaces this
    /// participant does not have are dropped. Decoded pages are taken in as well.
    pub fn poll(&mut self) -> Vec<SessionEvent> {
        self.poll_documents();

        let mut events = Vec::new();
        for inbound in self.channel.poll() {
            match inbound {
                Inbound::Message(WireMessage::DocumentShared(handle)) => {
                    events.push(SessionEvent::DocumentShared(handle));
                }
                Inbound::Message(message) => {
                    if let Some(event) = message.shape_event() {
                        self.apply_remote(&event);
                    }
                }
                Inbound::Connection(state) => events.push(SessionEvent::Connection(state)),
            }
        }
        events
    }

    fn apply_remote(&mut self, event: &SyncEvent) {
        match self.registry.resolve_mut(event.surface_id.as_ref()) {
            Some(pair) => tools::apply_remote(event, pair),
            None => log::debug!(
                "Dropping {} for unknown surface {:?}",
                event.name(),
                event.surface_id
            ),
        }
    }

    /// Take decoded pages from `receiver` on future polls.
    pub fn attach_pages(&mut self, receiver: Receiver<PageRender>) {
        self.pages.push(receiver);
    }

    /// Take in every decoded page that is ready, without blocking.
    ///
    /// Returns how many pages were painted. Exhausted receivers are dropped.
    pub fn poll_documents(&mut self) -> usize {
        let mut ready = Vec::new();
        self.pages.retain(|receiver| loop {
            match receiver.try_recv() {
                Ok(page) => ready.push(page),
                Err(TryRecvError::Empty) => break true,
                Err(TryRecvError::Disconnected) => break false,
            }
        });

        let count = ready.len();
        for page in ready {
            self.paint_page(page);
        }
        count
    }

    fn paint_page(&mut self, page: PageRender) {
        let (width, height) = page.dimensions();
        let id = Some(&page.surface);
        if self.registry.contains(id) {
            self.resize_surface(id, width, height);
        } else {
            log::info!("New page surface {} ({}x{})", page.surface, width, height);
            self.add_surface(Some(page.surface.clone()), width, height);
            let resolution = self.config.page_layout.resolution.max(f64::EPSILON);
            self.viewports.insert(
                Some(page.surface.clone()),
                Viewport {
                    origin: kurbo::Point::ZERO,
                    display_size: Size::new(width as f64 / resolution, height as f64 / resolution),
                    backing_size: Size::new(width as f64, height as f64),
                },
            );
        }
        if let Some(pair) = self.registry.resolve_mut(id) {
            pair.paint_background(&page.pixels);
        }
    }

    pub fn surface(&self, id: Option<&SurfaceId>) -> Option<&SurfacePair> {
        self.registry.resolve(id)
    }

    pub fn surface_mut(&mut self, id: Option<&SurfaceId>) -> Option<&mut SurfacePair> {
        self.registry.resolve_mut(id)
    }

    /// The committed layer of a surface, for display or export.
    pub fn committed_layer(&self, id: Option<&SurfaceId>) -> Option<&Layer> {
        self.registry.resolve(id).and_then(SurfacePair::committed)
    }

    pub fn viewport(&self, id: Option<&SurfaceId>) -> Option<&Viewport> {
        self.viewports.get(&id.cloned())
    }

    pub fn registry(&self) -> &SurfaceRegistry {
        &self.registry
    }

    pub fn channel(&self) -> &SyncChannel<T> {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut SyncChannel<T> {
        &mut self.channel
    }
}
