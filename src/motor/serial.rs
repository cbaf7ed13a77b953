// Serial output sink for the motor driver
//
// The port is blocking (bounded by its write timeout). On a multi-thread
// runtime each write runs under block_in_place so the worker's other tasks
// move to another thread while the frame goes out.

use std::io::Write;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use serialport::{DataBits, Parity, SerialPort, StopBits};
use tokio::io::AsyncWrite;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::info;

/// Write timeout for the serial port
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

/// Motor driver connected over a serial port (8N1)
pub struct SerialSink {
    port: Box<dyn SerialPort>,
}

impl SerialSink {
    /// Open the port at the given baudrate
    pub fn open(port_name: &str, baudrate: u32) -> Result<Self, serialport::Error> {
        info!("Opening motor driver port {} at {} baud", port_name, baudrate);
        let port = serialport::new(port_name, baudrate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;

        Ok(Self { port })
    }
}

/// Run a short blocking call without stalling other tasks on this worker
///
/// block_in_place panics on a current-thread runtime, so there (and outside
/// any runtime) the call just runs inline.
fn blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current().map(|h| h.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(f),
        _ => f(),
    }
}

impl AsyncWrite for SerialSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        let port = &mut self.get_mut().port;
        Poll::Ready(blocking(|| port.write(buf)))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        let port = &mut self.get_mut().port;
        Poll::Ready(blocking(|| port.flush()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        self.poll_flush(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocking_outside_runtime() {
        assert_eq!(blocking(|| 7), 7);
    }

    #[tokio::test]
    async fn test_blocking_on_current_thread_runtime() {
        assert_eq!(blocking(|| "inline"), "inline");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_blocking_keeps_other_tasks_running() {
        let (tx, rx) = std::sync::mpsc::channel();
        tokio::spawn(async move {
            let _ = tx.send(());
        });

        // Stands in for a slow serial write; the spawned task still completes
        let done = blocking(move || rx.recv_timeout(Duration::from_secs(5)).is_ok());
        assert!(done);
    }
}
