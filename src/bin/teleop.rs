// Keyboard teleop: WASD move, Q/E snap-turn, R/F speed, Space stop, Esc quit
//
// Prints line-protocol commands on stdout, e.g.
//   cargo run --bin teleop | cargo run --bin ctl2mctl
use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use tracing::info;

const SPEEDS: [f32; 3] = [0.25, 0.5, 1.0];
const INPUT_TIMEOUT_MS: u64 = 100; // Send zero velocity after this much time with no input
const POLL_MS: u64 = 20; // 50Hz

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_writer(io::stderr)
        .init();

    info!("Controls: WASD=move, Q/E=snap-turn, R/F=speed, Space=stop, Esc=quit");
    print_speed(0);

    enable_raw_mode()?;
    let result = run_teleop(&mut io::stdout().lock());
    disable_raw_mode()?;

    result
}

fn run_teleop(out: &mut impl Write) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut speed_idx: usize = 0;

    // Persistent command state
    let mut velocity = 0.0f32;
    let mut direction = 0.0f32;
    let mut last_movement_input = Instant::now();

    loop {
        if event::poll(Duration::from_millis(POLL_MS))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;

                match code {
                    _ if !pressed => {}

                    // Movement - set heading and refresh timestamp
                    KeyCode::Char(c @ ('w' | 'a' | 's' | 'd')) => {
                        direction = heading(c);
                        velocity = SPEEDS[speed_idx];
                        last_movement_input = Instant::now();
                    }

                    KeyCode::Char('q') => writeln!(out, "snapturn left")?,
                    KeyCode::Char('e') => writeln!(out, "snapturn right")?,

                    KeyCode::Char(' ') => velocity = 0.0,

                    // Speed control
                    KeyCode::Char('r') => {
                        speed_idx = (speed_idx + 1).min(SPEEDS.len() - 1);
                        print_speed(speed_idx);
                    }
                    KeyCode::Char('f') => {
                        speed_idx = speed_idx.saturating_sub(1);
                        print_speed(speed_idx);
                    }

                    KeyCode::Esc => break,

                    _ => {}
                }
            }
        }

        if last_movement_input.elapsed() > Duration::from_millis(INPUT_TIMEOUT_MS) {
            velocity = 0.0;
        }

        // Always send at ~50Hz so the translator's safety timeout stays armed
        writeln!(out, "move {} {}", format_velocity(velocity), direction)?;
        out.flush()?;
    }

    Ok(())
}

/// Direction in degrees for a WASD key
fn heading(key: char) -> f32 {
    match key {
        'd' => 90.0,
        's' => 180.0,
        'a' => -90.0,
        _ => 0.0,
    }
}

/// One integer digit and a fraction, as the move grammar requires
fn format_velocity(velocity: f32) -> String {
    format!("{:.2}", velocity.clamp(0.0, 1.0))
}

fn print_speed(idx: usize) {
    info!("Speed: {}", SPEEDS[idx]);
}
