// Timeouts, tick rate, damping and output configuration
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use crate::error::ConfigError;

// Safety timeout: velocity is zeroed if no line arrives within this window
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(250);

// How long a snap-turn override lasts after the last snapturn command
pub const DEFAULT_SNAPTURN_DURATION: Duration = Duration::from_millis(250);

// Output tick (20Hz)
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(50);

// Largest per-tick change of any single channel
pub const DEFAULT_MAX_CHANGE_AMOUNT: i32 = 10;

// Serial output settings
pub const DEFAULT_BAUDRATE: u32 = 115_200;

/// Where motor frames are written
#[derive(Debug, Clone, PartialEq, Default)]
pub enum OutputTarget {
    #[default]
    Stdout,
    Serial { port: String, baudrate: u32 },
}

/// Effective runtime configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub timeout: Duration,
    pub snapturn_duration: Duration,
    pub interval: Duration,
    pub max_change_amount: i32,
    pub output: OutputTarget,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            snapturn_duration: DEFAULT_SNAPTURN_DURATION,
            interval: DEFAULT_INTERVAL,
            max_change_amount: DEFAULT_MAX_CHANGE_AMOUNT,
            output: OutputTarget::Stdout,
        }
    }
}

/// Optional settings shared by the JSON config file and the command line
#[derive(Debug, Clone, Default, PartialEq, clap::Args, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Overrides {
    /// Safety timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Snap-turn decay in milliseconds
    #[arg(long)]
    pub snapturn_ms: Option<u64>,

    /// Output tick interval in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Maximum per-tick change of a motor channel
    #[arg(long)]
    pub max_change: Option<i32>,

    /// Write frames to this serial port instead of stdout
    #[arg(long)]
    pub serial_port: Option<String>,

    /// Baudrate for --serial-port
    #[arg(long)]
    pub baudrate: Option<u32>,
}

/// Command line of the ctl2mctl binary
#[derive(Debug, Parser)]
#[command(
    name = "ctl2mctl",
    version,
    about = "Translate motion commands on stdin into damped motor speed frames"
)]
pub struct Cli {
    /// JSON config file; command line flags take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,
}

impl Config {
    /// Build the configuration from defaults, the optional config file and flags
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = &cli.config {
            config.apply(&read_overrides(path)?);
        }
        config.apply(&cli.overrides);

        config.validate()?;
        Ok(config)
    }

    /// Apply every setting present in `overrides`
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(ms) = overrides.timeout_ms {
            self.timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = overrides.snapturn_ms {
            self.snapturn_duration = Duration::from_millis(ms);
        }
        if let Some(ms) = overrides.interval_ms {
            self.interval = Duration::from_millis(ms);
        }
        if let Some(amount) = overrides.max_change {
            self.max_change_amount = amount;
        }

        if let Some(port) = &overrides.serial_port {
            let current = match &self.output {
                OutputTarget::Serial { baudrate, .. } => *baudrate,
                OutputTarget::Stdout => DEFAULT_BAUDRATE,
            };
            self.output = OutputTarget::Serial {
                port: port.clone(),
                baudrate: overrides.baudrate.unwrap_or(current),
            };
        } else if let (OutputTarget::Serial { baudrate, .. }, Some(b)) =
            (&mut self.output, overrides.baudrate)
        {
            *baudrate = b;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid("timeout must be non-zero".into()));
        }
        if self.snapturn_duration.is_zero() {
            return Err(ConfigError::Invalid(
                "snap-turn duration must be non-zero".into(),
            ));
        }
        if self.interval.is_zero() {
            return Err(ConfigError::Invalid("interval must be non-zero".into()));
        }
        if self.max_change_amount < 1 {
            return Err(ConfigError::Invalid(format!(
                "max change amount must be at least 1, got {}",
                self.max_change_amount
            )));
        }
        if let OutputTarget::Serial { baudrate: 0, .. } = self.output {
            return Err(ConfigError::Invalid("baudrate must be non-zero".into()));
        }
        Ok(())
    }
}

fn read_overrides(path: &Path) -> Result<Overrides, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
