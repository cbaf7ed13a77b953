// Process wiring: stdin -> receiver -> control state -> sender -> motor driver
// Note: the receiver's safety timeout is the watchdog. If the operator stops
// sending lines the platform is stopped even though frames keep flowing.

use tokio::io::{AsyncWrite, BufReader};
use tracing::info;

use crate::config::{Config, OutputTarget};
use crate::error::RuntimeError;
use crate::motor::{MotorSpeed, SerialSink};
use crate::receiver::Receiver;
use crate::sender::{write_frame, Sender};
use crate::state::SharedState;

type Output = Box<dyn AsyncWrite + Send + Unpin>;

fn open_output(target: &OutputTarget) -> Result<Output, RuntimeError> {
    match target {
        OutputTarget::Stdout => Ok(Box::new(tokio::io::stdout())),
        OutputTarget::Serial { port, baudrate } => Ok(Box::new(SerialSink::open(port, *baudrate)?)),
    }
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() -> Result<(), RuntimeError> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate()).map_err(RuntimeError::Signal)?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res.map_err(RuntimeError::Signal)?,
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await.map_err(RuntimeError::Signal)?;

    Ok(())
}

/// Run the translator until a signal arrives or a stream fails
pub async fn run(config: Config) -> Result<(), RuntimeError> {
    let mut output = open_output(&config.output)?;
    let input = BufReader::new(tokio::io::stdin());

    let state = SharedState::new();
    let mut receiver = Receiver::new(&config, state.clone());
    let mut sender = Sender::new(&config, state);

    info!(
        "Translator started: {}ms tick, {}ms safety timeout, {}ms snap-turn, max change {}",
        config.interval.as_millis(),
        config.timeout.as_millis(),
        config.snapturn_duration.as_millis(),
        config.max_change_amount
    );
    info!("Writing frames to {:?}", config.output);

    let result = tokio::select! {
        res = receiver.receive(input) => res,
        res = sender.send(&mut output) => res,
        res = shutdown_signal() => {
            info!("Shutdown requested");
            res
        }
    };

    // Leave the driver stopped on a clean shutdown
    if result.is_ok() {
        write_frame(&mut output, MotorSpeed::ZERO).await?;
    }

    result
}
