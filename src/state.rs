// Shared control state: written by the receiver, read by the sender.
//
// The lock is only held for the in-memory read or update; callers never
// keep a guard across I/O or a sleep.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::messages::Turn;

/// Commanded motion
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlState {
    /// Degrees in [-180, 180]; 0 = forward, positive = right
    pub direction: f32,
    /// Fraction of maximum speed in [0, 1]
    pub velocity: f32,
    /// Snap-turn override, takes precedence over direction/velocity
    pub turning: Option<Turn>,
}

#[derive(Debug, Default)]
struct Inner {
    control: ControlState,
    // Bumped by every snap-turn so stale reversions can be ignored
    snapturn_generation: u64,
}

/// Cloneable handle to the single control state
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<RwLock<Inner>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current control state
    pub async fn snapshot(&self) -> ControlState {
        self.inner.read().await.control
    }

    /// Set velocity and direction together; turning is untouched
    pub async fn set_motion(&self, velocity: f32, direction: f32) {
        let mut inner = self.inner.write().await;
        inner.control.velocity = velocity;
        inner.control.direction = direction;
    }

    /// Zero velocity, leaving direction and turning as they are
    pub async fn stop(&self) {
        self.inner.write().await.control.velocity = 0.0;
    }

    /// Start (or extend) a snap-turn, returning its generation
    pub async fn begin_snapturn(&self, turn: Turn) -> u64 {
        let mut inner = self.inner.write().await;
        inner.snapturn_generation = inner.snapturn_generation.wrapping_add(1);
        inner.control.turning = Some(turn);
        inner.snapturn_generation
    }

    /// Clear the override if no newer snap-turn has started since `generation`
    ///
    /// Returns true if the override was cleared.
    pub async fn end_snapturn(&self, generation: u64) -> bool {
        let mut inner = self.inner.write().await;
        if inner.snapturn_generation != generation {
            return false;
        }
        inner.control.turning = None;
        true
    }
}
