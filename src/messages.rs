// Message types for the translator: input commands and receiver health

use std::fmt;

use crate::error::CommandError;

/// Snap-turn override direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Left,
    Right,
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Turn::Left => f.write_str("left"),
            Turn::Right => f.write_str("right"),
        }
    }
}

/// A validated command line from the operator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// `move <velocity> <direction>`
    Move { velocity: f32, direction: f32 },
    /// `snapturn left|right`
    SnapTurn(Turn),
}

impl Command {
    /// Parse one input line (without its newline)
    ///
    /// Grammar:
    /// - `move V D`: V is one digit with an optional fraction, D an optionally
    ///   negative decimal; 0 <= V <= 1 and -180 <= D <= 180
    /// - `snapturn left` / `snapturn right`
    ///
    /// Out-of-range values are rejected, never clamped.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let unsupported = || CommandError::Unsupported(line.to_string());

        if let Some(args) = line.strip_prefix("move ") {
            let (vel, dir) = args.split_once(' ').ok_or_else(unsupported)?;
            if !is_velocity_literal(vel) || !is_direction_literal(dir) {
                return Err(unsupported());
            }

            let velocity = parse_number(vel, line)?;
            if !(0.0..=1.0).contains(&velocity) {
                return Err(CommandError::InvalidVelocity(velocity));
            }

            let direction = parse_number(dir, line)?;
            if !(-180.0..=180.0).contains(&direction) {
                return Err(CommandError::InvalidDirection(direction));
            }

            return Ok(Command::Move {
                velocity,
                direction,
            });
        }

        match line {
            "snapturn left" => Ok(Command::SnapTurn(Turn::Left)),
            "snapturn right" => Ok(Command::SnapTurn(Turn::Right)),
            _ => Err(unsupported()),
        }
    }
}

// Literals are grammar-checked first, so a failure here means the grammar
// and f32 parsing disagree; treat it like any other unsupported line.
fn parse_number(text: &str, line: &str) -> Result<f32, CommandError> {
    text.parse::<f32>()
        .map_err(|_| CommandError::Unsupported(line.to_string()))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Optional `.` followed by at least one digit
fn is_fraction(s: &str) -> bool {
    s.is_empty() || s.strip_prefix('.').is_some_and(is_digits)
}

/// `\d(\.\d+)?`
fn is_velocity_literal(s: &str) -> bool {
    match s.as_bytes().first() {
        Some(b) if b.is_ascii_digit() => is_fraction(&s[1..]),
        _ => false,
    }
}

/// `-?\d+(\.\d+)?`
fn is_direction_literal(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    let int_len = s.bytes().take_while(u8::is_ascii_digit).count();
    int_len > 0 && is_fraction(&s[int_len..])
}

/// Receiver health, driven by the safety timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Health {
    Ok,
    /// No line within the safety timeout; velocity has been zeroed
    #[default]
    CmdStale,
}
