// Fixed-rate sender with damping
//
// Each tick maps the control state to a target ("virtual") speed, limits
// how far it may move from the previously emitted speed, and writes the
// resulting frame.

use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::config::Config;
use crate::error::RuntimeError;
use crate::motor::{control_to_speed, MotorSpeed};
use crate::state::SharedState;

pub struct Sender {
    interval: Duration,
    max_change_amount: i32,
    state: SharedState,
    current: MotorSpeed,
}

impl Sender {
    pub fn new(config: &Config, state: SharedState) -> Self {
        Self {
            interval: config.interval,
            max_change_amount: config.max_change_amount,
            state,
            current: MotorSpeed::ZERO,
        }
    }

    /// Last emitted speed
    pub fn current(&self) -> MotorSpeed {
        self.current
    }

    /// Emit a frame every interval until writing fails
    pub async fn send<W>(&mut self, output: &mut W) -> Result<(), RuntimeError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut tick = interval(self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tick.tick().await;
            self.tick(output).await?;
        }
    }

    /// Compute, damp and write one frame
    pub async fn tick<W>(&mut self, output: &mut W) -> Result<MotorSpeed, RuntimeError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let snapshot = self.state.snapshot().await;
        let target = control_to_speed(&snapshot);
        self.current = damp(target, self.current, self.max_change_amount);

        debug!("Sending {:?} (target {:?})", self.current, target);
        write_frame(output, self.current).await?;
        Ok(self.current)
    }
}

/// Move from `previous` toward `target` by at most `max_change` per channel
///
/// The change vector keeps its direction: the channel with the largest
/// difference moves by exactly `max_change`, the others proportionally
/// less (truncated toward zero).
pub fn damp(target: MotorSpeed, previous: MotorSpeed, max_change: i32) -> MotorSpeed {
    let dist = target.combine(previous, |t, p| t - p);
    let max_dist = dist.max_abs();

    if max_dist <= max_change {
        return target;
    }

    // Integer scaling so the leading channel lands on max_change exactly
    let step = dist.map(|d| (d as i64 * max_change as i64 / max_dist as i64) as i32);

    previous.combine(step, |p, s| p + s).limit()
}

/// Serialize `speed` and flush it to `output`
pub async fn write_frame<W>(output: &mut W, speed: MotorSpeed) -> Result<(), RuntimeError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    output
        .write_all(speed.serialize().as_bytes())
        .await
        .map_err(RuntimeError::Output)?;
    output.flush().await.map_err(RuntimeError::Output)
}
