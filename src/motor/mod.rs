// Motor side of the translator
//
// Provides:
// - Four-channel motor speed value and its text wire format
// - Control law mapping direction/velocity/snap-turn to motor speed
// - Serial port output sink

pub mod kinematics;
mod serial;
pub mod speed;

pub use kinematics::{control_to_speed, direction_to_speed};
pub use serial::SerialSink;
pub use speed::MotorSpeed;
