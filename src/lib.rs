// ctl2mctl: translates line-oriented motion commands into damped
// four-channel motor speed frames.

pub mod config;
pub mod error;
pub mod messages;
pub mod motor;
pub mod receiver;
pub mod runtime;
pub mod sender;
pub mod state;
