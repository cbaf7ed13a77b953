// Control law: commanded direction/velocity/snap-turn -> motor speed
//
// Direction is split into four 90 degree arcs. Each arc blends linearly
// between two fully engaged states, then scales by velocity. A snap-turn
// override replaces the whole computation with half-strength rotation.

use super::speed::MotorSpeed;
use crate::messages::Turn;
use crate::state::ControlState;

/// Gain applied to the snap-turn vectors
pub const SNAPTURN_GAIN: f32 = 0.5;

/// Target motor speed for a control state snapshot, clamped to range
pub fn control_to_speed(state: &ControlState) -> MotorSpeed {
    let speed = match state.turning {
        Some(Turn::Right) => MotorSpeed::SNAPTURN_RIGHT.gain(SNAPTURN_GAIN),
        Some(Turn::Left) => MotorSpeed::SNAPTURN_LEFT.gain(SNAPTURN_GAIN),
        None => direction_to_speed(state.direction).gain(state.velocity),
    };
    speed.limit()
}

/// Full-velocity blend for a direction in [-180, 180]
///
/// Arcs (0 = forward, positive = right):
/// - [-180, -90): left -> back
/// - [-90, 0): forward -> left
/// - [0, 90): forward -> right
/// - [90, 180]: right -> back
pub fn direction_to_speed(direction: f32) -> MotorSpeed {
    if direction < -90.0 {
        MotorSpeed::MOVE_LEFT.lerp(MotorSpeed::MOVE_BACK, (-direction - 90.0) / 90.0)
    } else if direction < 0.0 {
        MotorSpeed::MOVE_FORWARD.lerp(MotorSpeed::MOVE_LEFT, -direction / 90.0)
    } else if direction < 90.0 {
        MotorSpeed::MOVE_FORWARD.lerp(MotorSpeed::MOVE_RIGHT, direction / 90.0)
    } else {
        MotorSpeed::MOVE_RIGHT.lerp(MotorSpeed::MOVE_BACK, (direction - 90.0) / 90.0)
    }
}
