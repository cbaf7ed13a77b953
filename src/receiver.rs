// Line receiver with safety timeout
//
// Every line (valid or not) re-arms the timeout. If it fires, velocity is
// forced to zero so a lost operator stops the platform; direction and any
// snap-turn override are left alone.
//
// Lines are read as raw bytes. Invalid UTF-8 and over-long lines are
// rejected like any other bad command; only I/O errors and EOF are fatal.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{CommandError, RuntimeError};
use crate::messages::{Command, Health, Turn};
use crate::state::SharedState;

/// Longest accepted input line, newline excluded
pub const MAX_LINE_LEN: usize = 256;

/// Splits a byte stream into newline-terminated lines of bounded length
pub struct LineReader<R> {
    input: R,
    buf: Vec<u8>,
    // Set while skipping the rest of an over-long line
    overlong: bool,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            buf: Vec::with_capacity(MAX_LINE_LEN + 1),
            overlong: false,
        }
    }

    /// Next line without its `\n`/`\r\n`, decoded lossily; `None` at end of stream
    ///
    /// Cancel safe: bytes already read stay buffered for the next call.
    pub async fn next_line(&mut self) -> io::Result<Option<Result<String, CommandError>>> {
        loop {
            // buf never holds more than MAX_LINE_LEN bytes here, so limit >= 1
            let limit = (MAX_LINE_LEN + 1 - self.buf.len()) as u64;
            let n = (&mut self.input)
                .take(limit)
                .read_until(b'\n', &mut self.buf)
                .await?;

            if self.buf.last() == Some(&b'\n') {
                let mut line = std::mem::take(&mut self.buf);
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }

                if std::mem::take(&mut self.overlong) {
                    return Ok(Some(Err(CommandError::TooLong(MAX_LINE_LEN))));
                }
                return Ok(Some(Ok(String::from_utf8_lossy(&line).into_owned())));
            }

            if n == 0 {
                return Ok(None);
            }

            if self.buf.len() > MAX_LINE_LEN {
                self.overlong = true;
                self.buf.clear();
            }
        }
    }
}

pub struct Receiver {
    timeout: Duration,
    snapturn_duration: Duration,
    state: SharedState,
    health: Health,
}

impl Receiver {
    pub fn new(config: &Config, state: SharedState) -> Self {
        Self {
            timeout: config.timeout,
            snapturn_duration: config.snapturn_duration,
            state,
            health: Health::CmdStale, // Start stale until first line
        }
    }

    pub fn health(&self) -> Health {
        self.health
    }

    /// Read lines until the input fails
    ///
    /// Only returns on a fatal input error; end of stream is
    /// `RuntimeError::InputClosed`.
    pub async fn receive<R>(&mut self, input: R) -> Result<(), RuntimeError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = LineReader::new(input);

        loop {
            // next_line is cancel safe, so losing the race to the timer drops nothing
            tokio::select! {
                line = lines.next_line() => match line.map_err(RuntimeError::Input)? {
                    Some(Ok(line)) => self.on_line(&line).await,
                    Some(Err(e)) => self.on_rejected(e),
                    None => return Err(RuntimeError::InputClosed),
                },
                _ = sleep(self.timeout) => self.on_timeout().await,
            }
        }
    }

    /// Handle one received line
    pub async fn on_line(&mut self, line: &str) {
        match Command::parse(line) {
            Ok(cmd) => {
                self.mark_received();
                self.apply(cmd).await
            }
            Err(e) => self.on_rejected(e),
        }
    }

    /// A line arrived but could not be used
    fn on_rejected(&mut self, e: CommandError) {
        self.mark_received();
        warn!("Rejected command: {}", e);
    }

    fn mark_received(&mut self) {
        if self.health != Health::Ok {
            info!("Receiving commands, resuming");
        }
        self.health = Health::Ok;
    }

    async fn apply(&self, cmd: Command) {
        debug!("Received command: {:?}", &cmd);

        match cmd {
            Command::Move {
                velocity,
                direction,
            } => self.state.set_motion(velocity, direction).await,
            Command::SnapTurn(turn) => self.snapturn(turn).await,
        }
    }

    async fn snapturn(&self, turn: Turn) {
        let generation = self.state.begin_snapturn(turn).await;
        let state = self.state.clone();
        let duration = self.snapturn_duration;

        tokio::spawn(async move {
            sleep(duration).await;
            if state.end_snapturn(generation).await {
                debug!("Snap-turn {} expired", turn);
            }
        });
    }

    async fn on_timeout(&mut self) {
        if self.health != Health::CmdStale {
            warn!(
                "No command for {}ms, stopping",
                self.timeout.as_millis()
            );
        }
        self.health = Health::CmdStale;
        self.state.stop().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncWriteExt, BufReader};

    fn receiver(state: &SharedState) -> Receiver {
        Receiver::new(&Config::default(), state.clone())
    }

    #[tokio::test]
    async fn test_move_updates_state() {
        let state = SharedState::new();
        let mut rx = receiver(&state);

        rx.on_line("move 0.5 45").await;

        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.velocity, 0.5);
        assert_eq!(snapshot.direction, 45.0);
        assert_eq!(snapshot.turning, None);
        assert_eq!(rx.health(), Health::Ok);
    }

    #[tokio::test]
    async fn test_rejected_move_leaves_state() {
        let state = SharedState::new();
        let mut rx = receiver(&state);

        rx.on_line("move 0.3 -60").await;
        rx.on_line("move 1.5 0").await;
        rx.on_line("move 0.5 181").await;
        rx.on_line("jump").await;

        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.velocity, 0.3);
        assert_eq!(snapshot.direction, -60.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapturn_expires() {
        let state = SharedState::new();
        let mut rx = receiver(&state);

        rx.on_line("snapturn left").await;
        assert_eq!(state.snapshot().await.turning, Some(Turn::Left));

        sleep(Duration::from_millis(200)).await;
        assert_eq!(state.snapshot().await.turning, Some(Turn::Left));

        sleep(Duration::from_millis(100)).await;
        assert_eq!(state.snapshot().await.turning, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_snapturn_extends_override() {
        let state = SharedState::new();
        let mut rx = receiver(&state);

        rx.on_line("snapturn left").await;
        sleep(Duration::from_millis(150)).await;
        rx.on_line("snapturn right").await;

        // First reversion (t=250) must not clear the newer override
        sleep(Duration::from_millis(150)).await;
        assert_eq!(state.snapshot().await.turning, Some(Turn::Right));

        // Second reversion fires at t=400
        sleep(Duration::from_millis(150)).await;
        assert_eq!(state.snapshot().await.turning, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_safety_timeout_zeroes_velocity() {
        let state = SharedState::new();
        let mut rx = receiver(&state);
        let (mut tx, input) = tokio::io::duplex(64);

        let task = tokio::spawn(async move { rx.receive(BufReader::new(input)).await });

        tx.write_all(b"move 0.8 120\n").await.unwrap();
        sleep(Duration::from_millis(100)).await;
        assert_eq!(state.snapshot().await.velocity, 0.8);

        // Any line, even an invalid one, re-arms the timeout
        tx.write_all(b"hello\n").await.unwrap();
        sleep(Duration::from_millis(200)).await;
        assert_eq!(state.snapshot().await.velocity, 0.8);

        sleep(Duration::from_millis(100)).await;
        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.velocity, 0.0);
        assert_eq!(snapshot.direction, 120.0);

        drop(tx);
        let result = task.await.unwrap();
        assert!(matches!(result, Err(RuntimeError::InputClosed)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_utf8_line_is_rejected() {
        let state = SharedState::new();
        let mut rx = receiver(&state);
        let (mut tx, input) = tokio::io::duplex(64);

        let task = tokio::spawn(async move { rx.receive(BufReader::new(input)).await });

        tx.write_all(b"move \xff 10\nmove 0.5 45\n").await.unwrap();
        sleep(Duration::from_millis(50)).await;

        assert!(!task.is_finished());
        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.velocity, 0.5);
        assert_eq!(snapshot.direction, 45.0);

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlong_line_is_rejected() {
        let state = SharedState::new();
        let mut rx = receiver(&state);
        let (mut tx, input) = tokio::io::duplex(4096);

        let task = tokio::spawn(async move { rx.receive(BufReader::new(input)).await });

        let mut junk = vec![b'a'; 3 * MAX_LINE_LEN];
        junk.push(b'\n');
        tx.write_all(&junk).await.unwrap();
        tx.write_all(b"move 0.7 -30\n").await.unwrap();
        sleep(Duration::from_millis(50)).await;

        assert!(!task.is_finished());
        assert_eq!(state.snapshot().await.velocity, 0.7);

        task.abort();
    }

    #[tokio::test]
    async fn test_line_reader_splits_and_bounds_lines() {
        let mut long = vec![b'x'; MAX_LINE_LEN + 1];
        long.push(b'\n');
        let exact = [vec![b'y'; MAX_LINE_LEN], b"\n".to_vec()].concat();
        let input = [
            b"snapturn left\r\n".to_vec(),
            long,
            exact,
            b"caf\xc3\xa9\n".to_vec(),
            b"partial".to_vec(),
        ]
        .concat();
        let mut lines = LineReader::new(&input[..]);

        assert_eq!(lines.next_line().await.unwrap(), Some(Ok("snapturn left".into())));
        assert_eq!(
            lines.next_line().await.unwrap(),
            Some(Err(CommandError::TooLong(MAX_LINE_LEN)))
        );
        assert_eq!(
            lines.next_line().await.unwrap(),
            Some(Ok("y".repeat(MAX_LINE_LEN)))
        );
        assert_eq!(lines.next_line().await.unwrap(), Some(Ok("café".into())));
        // Unterminated trailing bytes are dropped at end of stream
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_keeps_snapturn() {
        let state = SharedState::new();
        let config = Config {
            timeout: Duration::from_millis(100),
            snapturn_duration: Duration::from_millis(500),
            ..Config::default()
        };
        let mut rx = Receiver::new(&config, state.clone());
        let (mut tx, input) = tokio::io::duplex(64);

        let task = tokio::spawn(async move { rx.receive(BufReader::new(input)).await });

        tx.write_all(b"move 1 0\nsnapturn right\n").await.unwrap();
        sleep(Duration::from_millis(250)).await;

        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.velocity, 0.0);
        assert_eq!(snapshot.turning, Some(Turn::Right));

        task.abort();
    }
}
