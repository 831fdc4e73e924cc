//! Drag-to-rotate with momentum and a constant idle spin.
//!
//! Several emblems share one [`DragArbiter`]; whoever claims it on pointer
//! down owns the gesture until pointer up. Everyone else ignores the
//! pointer meanwhile.

use glam::{EulerRot, Quat, Vec2};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Pointer travel, in pixels, that turns a press into a drag.
pub const DRAG_THRESHOLD: f32 = 5.0;
/// Radians per pixel of pointer travel.
pub const SENSITIVITY: f32 = 0.01;
/// Per-frame velocity retention after release.
pub const MOMENTUM_DAMPING: f32 = 0.92;
/// Velocities below this snap to zero.
pub const MOMENTUM_STOP: f32 = 0.001;
/// Idle spin about Y, radians per second.
pub const IDLE_SPIN: f32 = 0.1;
/// Moves smaller than this on both axes are ignored while dragging.
const JITTER: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EmblemId(u32);

impl fmt::Display for EmblemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "emblem#{}", self.0)
    }
}

#[derive(Debug, Default)]
struct ArbiterState {
    owner: Cell<Option<EmblemId>>,
    next_id: Cell<u32>,
}

/// The drag token: at most one emblem owns the current pointer gesture.
///
/// Cloning shares the same token.
#[derive(Clone, Debug, Default)]
pub struct DragArbiter {
    state: Rc<ArbiterState>,
}

impl DragArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self) -> EmblemId {
        let id = self.state.next_id.get();
        self.state.next_id.set(id + 1);
        EmblemId(id)
    }

    pub fn owner(&self) -> Option<EmblemId> {
        self.state.owner.get()
    }

    pub fn is_owned_by(&self, id: EmblemId) -> bool {
        self.owner() == Some(id)
    }

    /// Claims the token if it is free or already ours.
    pub fn try_claim(&self, id: EmblemId) -> bool {
        match self.owner() {
            None => {
                self.state.owner.set(Some(id));
                true
            }
            Some(current) => current == id,
        }
    }

    /// Releases the token if `id` holds it. Returns whether it did.
    pub fn release(&self, id: EmblemId) -> bool {
        if self.is_owned_by(id) {
            self.state.owner.set(None);
            true
        } else {
            false
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Button down, token claimed, threshold not reached yet.
    Armed,
    Dragging,
    /// Released after a drag; momentum is decaying.
    Coasting,
}

type DragListener = Box<dyn FnMut(bool)>;

pub struct RotationController {
    id: EmblemId,
    arbiter: DragArbiter,
    reverse: bool,
    phase: Phase,
    /// Accumulated (x, y) rotation in radians.
    rotation: Vec2,
    /// Last applied per-move delta, reused as momentum.
    velocity: Vec2,
    anchor: Vec2,
    listeners: Vec<DragListener>,
}

impl RotationController {
    pub fn new(arbiter: DragArbiter, reverse: bool) -> Self {
        let id = arbiter.register();
        Self {
            id,
            arbiter,
            reverse,
            phase: Phase::Idle,
            rotation: Vec2::ZERO,
            velocity: Vec2::ZERO,
            anchor: Vec2::ZERO,
            listeners: Vec::new(),
        }
    }

    pub fn id(&self) -> EmblemId {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_dragging(&self) -> bool {
        self.phase == Phase::Dragging
    }

    pub fn rotation(&self) -> Vec2 {
        self.rotation
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, 0.0)
    }

    pub fn set_reverse(&mut self, reverse: bool) {
        self.reverse = reverse;
    }

    /// Registers an observer called with `true` when a drag starts and
    /// `false` when it ends. Plain clicks never trigger it.
    pub fn on_drag_change(&mut self, f: impl FnMut(bool) + 'static) {
        self.listeners.push(Box::new(f));
    }

    fn notify(&mut self, dragging: bool) {
        log::trace!("{} drag {}", self.id, if dragging { "start" } else { "end" });
        for f in &mut self.listeners {
            f(dragging);
        }
    }

    fn sign(&self) -> f32 {
        if self.reverse {
            -1.0
        } else {
            1.0
        }
    }

    /// Returns `false` when another emblem owns the gesture.
    pub fn pointer_down(&mut self, pos: Vec2) -> bool {
        if !self.arbiter.try_claim(self.id) {
            return false;
        }
        self.phase = Phase::Armed;
        self.velocity = Vec2::ZERO;
        self.anchor = pos;
        true
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        if !self.arbiter.is_owned_by(self.id) {
            return;
        }
        let delta = pos - self.anchor;

        if self.phase == Phase::Armed && delta.length() > DRAG_THRESHOLD {
            self.phase = Phase::Dragging;
            self.notify(true);
        }
        if self.phase != Phase::Dragging {
            return;
        }
        if delta.x.abs() < JITTER && delta.y.abs() < JITTER {
            return;
        }

        let s = SENSITIVITY * self.sign();
        let step = Vec2::new(-delta.y * s, delta.x * s);
        self.rotation += step;
        self.velocity = step;
        self.anchor = pos;
    }

    pub fn pointer_up(&mut self) {
        if !self.arbiter.release(self.id) {
            return;
        }
        let was_dragging = self.phase == Phase::Dragging;
        if was_dragging {
            self.phase = Phase::Coasting;
            self.notify(false);
        } else {
            self.phase = Phase::Idle;
        }
    }

    /// Per-frame update: momentum and idle spin, skipped while dragging.
    pub fn tick(&mut self, dt: f32) {
        if self.phase == Phase::Dragging {
            return;
        }

        self.velocity *= MOMENTUM_DAMPING;
        self.rotation += self.velocity * dt * 60.0;
        if self.velocity.x.abs() < MOMENTUM_STOP {
            self.velocity.x = 0.0;
        }
        if self.velocity.y.abs() < MOMENTUM_STOP {
            self.velocity.y = 0.0;
        }
        if self.phase == Phase::Coasting && self.velocity == Vec2::ZERO {
            self.phase = Phase::Idle;
        }

        self.rotation.y += IDLE_SPIN * self.sign() * dt;
    }
}

impl Drop for RotationController {
    fn drop(&mut self) {
        if self.arbiter.release(self.id) {
            log::debug!("{} released the drag token on teardown", self.id);
        }
    }
}
