//! Lookup of surfaces by the token carried on shape events.

use crate::surface::SurfacePair;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque token identifying one drawable surface within a session (e.g. a page number).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceId(String);

impl SurfaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SurfaceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SurfaceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u32> for SurfaceId {
    fn from(page: u32) -> Self {
        Self(page.to_string())
    }
}

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registry key: `None` is the single unnamed surface of a one-surface session.
pub type SurfaceKey = Option<SurfaceId>;

/// Owns the live surfaces of a session, keyed by [`SurfaceKey`].
#[derive(Debug, Default)]
pub struct SurfaceRegistry {
    surfaces: HashMap<SurfaceKey, SurfacePair>,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a surface, returning the one it replaced, if any.
    pub fn register(&mut self, id: SurfaceKey, pair: SurfacePair) -> Option<SurfacePair> {
        log::debug!("Registering surface {:?}", id);
        self.surfaces.insert(id, pair)
    }

    /// Remove a surface.
    pub fn unregister(&mut self, id: Option<&SurfaceId>) -> Option<SurfacePair> {
        log::debug!("Unregistering surface {:?}", id);
        self.surfaces.remove(&id.cloned())
    }

    /// Find the surface an event addressed to `id` belongs to.
    ///
    /// An id this registry does not know resolves to nothing. Events naming a
    /// surface the receiver never mounted (or already removed) are dropped this way.
    pub fn resolve(&self, id: Option<&SurfaceId>) -> Option<&SurfacePair> {
        self.surfaces.get(&id.cloned())
    }

    /// Mutable variant of [`SurfaceRegistry::resolve`].
    pub fn resolve_mut(&mut self, id: Option<&SurfaceId>) -> Option<&mut SurfacePair> {
        self.surfaces.get_mut(&id.cloned())
    }

    pub fn contains(&self, id: Option<&SurfaceId>) -> bool {
        self.surfaces.contains_key(&id.cloned())
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Registered keys, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &SurfaceKey> {
        self.surfaces.keys()
    }
}
