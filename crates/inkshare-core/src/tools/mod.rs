//! Per-shape-kind interaction state machines.
//!
//! One [`ToolMachine`] exists per shape kind and per surface. A machine only sees
//! pointer input while its kind is the active tool; switching tools cancels every
//! in-progress gesture, which is then never committed.

use crate::input::PointerPhase;
use crate::registry::SurfaceId;
use crate::shapes::{CircleShape, RectangleShape, Shape, ShapeGeometry, ShapeKind, StrokeSegment};
use crate::surface::SurfacePair;
use crate::sync::{Phase, SyncEvent};
use kurbo::Point;
use std::marker::PhantomData;

/// State of a tool interaction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ToolState {
    /// Waiting for a pointer-down.
    #[default]
    Idle,
    /// A gesture is in progress.
    Drawing {
        /// Where the current shape is measured from.
        anchor: Point,
    },
}

/// Interaction logic for one shape kind, bound to whichever surface the caller passes in.
///
/// Painting happens on the surface; the returned [`SyncEvent`] is what the caller
/// should broadcast.
#[derive(Debug)]
pub struct ToolMachine<G: ShapeGeometry> {
    state: ToolState,
    _geometry: PhantomData<G>,
}

impl<G: ShapeGeometry> Default for ToolMachine<G> {
    fn default() -> Self {
        Self {
            state: ToolState::Idle,
            _geometry: PhantomData,
        }
    }
}

impl<G: ShapeGeometry> ToolMachine<G> {
    /// Create an idle machine.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(&self) -> ShapeKind {
        G::KIND
    }

    pub fn state(&self) -> ToolState {
        self.state
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, ToolState::Drawing { .. })
    }

    /// Begin a gesture at `at`.
    pub fn pointer_down(&mut self, at: Point) {
        self.state = ToolState::Drawing { anchor: at };
    }

    /// Preview the shape for the current pointer position.
    pub fn pointer_move(
        &mut self,
        at: Point,
        pair: &mut SurfacePair,
        surface: Option<&SurfaceId>,
    ) -> Option<SyncEvent> {
        let ToolState::Drawing { anchor } = self.state else {
            return None;
        };
        if !pair.is_mounted() {
            return None;
        }

        let shape: Shape = G::from_drag(anchor, at).into();
        pair.paint_preview(&shape);
        if G::CONTINUOUS {
            self.state = ToolState::Drawing { anchor: at };
        }
        Some(SyncEvent::new(Phase::Live, shape, surface.cloned()))
    }

    /// Finish the gesture at `at`, committing the shape.
    pub fn pointer_up(
        &mut self,
        at: Point,
        pair: &mut SurfacePair,
        surface: Option<&SurfaceId>,
    ) -> Option<SyncEvent> {
        let ToolState::Drawing { anchor } = self.state else {
            return None;
        };
        self.state = ToolState::Idle;
        if !pair.is_mounted() {
            return None;
        }

        let shape: Shape = G::from_drag(anchor, at).into();
        pair.commit(&shape);
        Some(SyncEvent::new(Phase::Committed, shape, surface.cloned()))
    }

    /// Abandon the current gesture without committing it.
    pub fn cancel(&mut self) {
        self.state = ToolState::Idle;
    }

    /// Route one pointer sample.
    pub fn handle(
        &mut self,
        phase: PointerPhase,
        at: Point,
        pair: &mut SurfacePair,
        surface: Option<&SurfaceId>,
    ) -> Option<SyncEvent> {
        match phase {
            PointerPhase::Down => {
                self.pointer_down(at);
                None
            }
            PointerPhase::Move => self.pointer_move(at, pair, surface),
            PointerPhase::Up => self.pointer_up(at, pair, surface),
        }
    }
}

/// Paint a shape event received from another participant.
///
/// Remote events never touch local tool state.
pub fn apply_remote(event: &SyncEvent, pair: &mut SurfacePair) {
    match event.phase {
        Phase::Live => pair.paint_preview(&event.shape),
        Phase::Committed => pair.commit(&event.shape),
    }
}

/// The three tool machines bound to one surface.
#[derive(Debug, Default)]
pub struct ToolBox {
    line: ToolMachine<StrokeSegment>,
    rectangle: ToolMachine<RectangleShape>,
    circle: ToolMachine<CircleShape>,
}

impl ToolBox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a pointer sample to the machine for `active`.
    pub fn handle_pointer(
        &mut self,
        active: ShapeKind,
        phase: PointerPhase,
        at: Point,
        pair: &mut SurfacePair,
        surface: Option<&SurfaceId>,
    ) -> Option<SyncEvent> {
        match active {
            ShapeKind::Line => self.line.handle(phase, at, pair, surface),
            ShapeKind::Rectangle => self.rectangle.handle(phase, at, pair, surface),
            ShapeKind::Circle => self.circle.handle(phase, at, pair, surface),
        }
    }

    /// Whether the machine for `kind` is mid-gesture.
    pub fn is_drawing(&self, kind: ShapeKind) -> bool {
        match kind {
            ShapeKind::Line => self.line.is_drawing(),
            ShapeKind::Rectangle => self.rectangle.is_drawing(),
            ShapeKind::Circle => self.circle.is_drawing(),
        }
    }

    /// Abandon every in-progress gesture.
    pub fn cancel_all(&mut self) {
        self.line.cancel();
        self.rectangle.cancel();
        self.circle.cancel();
    }
}
