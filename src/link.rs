//! The serial link to the actuator. The session only ever asks "is there an
//! open sink right now"; opening, noticing failures and reopening with a
//! backoff all live here.

use crate::config::BackoffConfig;
use crate::error::BridgeError;
use crate::sink::ByteSink;

use log::{info, warn};
use serial2::SerialPort;
use std::{
    io::{self, Write},
    path::PathBuf,
    thread::sleep,
    time::{Duration, Instant},
};

/// Linear backoff: `initial`, `initial + step`, ... up to `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    step: Duration,
    max: Duration,
    next: Duration,
}

impl Backoff {
    /// Starts at `initial`, which is itself capped at `max`.
    pub fn new(initial: Duration, step: Duration, max: Duration) -> Self {
        Self {
            initial,
            step,
            max,
            next: initial.min(max),
        }
    }

    /// The delay to wait before the upcoming retry.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next + self.step).min(self.max);
        delay
    }

    /// Back to `initial`, after a successful open.
    pub fn reset(&mut self) {
        self.next = self.initial.min(self.max);
    }
}

impl From<&BackoffConfig> for Backoff {
    fn from(cfg: &BackoffConfig) -> Self {
        Self::new(
            Duration::from_secs(cfg.initial_secs),
            Duration::from_secs(cfg.step_secs),
            Duration::from_secs(cfg.max_secs),
        )
    }
}

/// Open errors that retrying can't fix: the settings themselves are wrong.
/// Anything else (missing device, busy, permissions still being applied
/// after a replug) might clear up on its own.
pub fn is_fatal_open_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData | io::ErrorKind::Unsupported
    )
}

/// Knows how to open the device behind a link.
pub trait Connector {
    /// What an open connection writes through.
    type Sink: ByteSink;

    /// One attempt at opening, never retried here.
    fn connect(&mut self) -> io::Result<Self::Sink>;

    /// Human readable name for logs
    fn describe(&self) -> String;
}

/// An open serial port. It stays open until a write fails.
pub struct SerialSink {
    port: SerialPort,
}

impl ByteSink for SerialSink {
    fn is_open_for_writing(&self) -> bool {
        true
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        Write::write_all(&mut self.port, bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(&mut self.port)
    }
}

/// Opens a serial port with fixed settings.
#[derive(Debug, Clone)]
pub struct SerialConnector {
    /// e.g. `/dev/ttyACM0` or `COM3`
    pub device: PathBuf,
    #[allow(missing_docs)]
    pub baud_rate: u32,
    /// How long a write may block before it counts as failed
    pub write_timeout: Duration,
}

impl Connector for SerialConnector {
    type Sink = SerialSink;

    fn connect(&mut self) -> io::Result<SerialSink> {
        let mut port = SerialPort::open(&self.device, self.baud_rate)?;
        port.set_write_timeout(self.write_timeout)?;
        Ok(SerialSink { port })
    }

    fn describe(&self) -> String {
        format!("{} @ {} baud", self.device.display(), self.baud_rate)
    }
}

/// Keeps a link open, reopening it after failures.
pub struct LinkWriter<C: Connector> {
    connector: C,
    sink: Option<C::Sink>,
    backoff: Backoff,
    retry_at: Option<Instant>,
}

impl<C: Connector> LinkWriter<C> {
    /// Starts disconnected; nothing is opened until asked to.
    pub fn new(connector: C, backoff: Backoff) -> Self {
        Self {
            connector,
            sink: None,
            backoff,
            retry_at: None,
        }
    }

    #[allow(missing_docs)]
    pub fn is_connected(&self) -> bool {
        self.sink.is_some()
    }

    /// One attempt at opening the device. `Ok(false)` means try again later.
    fn try_connect(&mut self) -> Result<bool, BridgeError> {
        match self.connector.connect() {
            Ok(sink) => {
                info!("Link : opened {}", self.connector.describe());
                self.sink = Some(sink);
                self.backoff.reset();
                self.retry_at = None;
                Ok(true)
            }
            Err(e) if is_fatal_open_error(&e) => Err(BridgeError::FatalLink(e)),
            Err(e) => {
                warn!("Link : failed to open {}: {}", self.connector.describe(), e);
                Ok(false)
            }
        }
    }

    /// Keeps trying until the device opens. Only returns early on errors that
    /// retrying can't fix.
    pub fn connect_blocking(&mut self) -> Result<(), BridgeError> {
        while !self.try_connect()? {
            let delay = self.backoff.next_delay();
            info!("Link : retrying in {:.1}s", delay.as_secs_f32());
            sleep(delay);
        }
        Ok(())
    }

    /// Called every cycle. If the link is down and the backoff has run out,
    /// makes one attempt at reopening it. Never sleeps.
    pub fn maintain(&mut self, now: Instant) -> Result<(), BridgeError> {
        if self.sink.is_some() {
            return Ok(());
        }
        if self.retry_at.is_some_and(|at| now < at) {
            return Ok(());
        }
        if !self.try_connect()? {
            self.retry_at = Some(now + self.backoff.next_delay());
        }
        Ok(())
    }

    /// The open sink, if there is one.
    pub fn sink(&mut self) -> Option<&mut dyn ByteSink> {
        self.sink.as_mut().map(|s| s as &mut dyn ByteSink)
    }

    /// Drops the device after a failed write. The next [`LinkWriter::maintain`]
    /// tries to reopen it straight away.
    pub fn close(&mut self, reason: &io::Error) {
        if self.sink.take().is_some() {
            warn!("Link : {} closed: {}", self.connector.describe(), reason);
        }
        self.retry_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use std::collections::VecDeque;

    /// Plays back a fixed list of open results, then keeps failing.
    struct ScriptedConnector {
        script: VecDeque<io::Result<MemorySink>>,
        attempts: usize,
    }

    impl ScriptedConnector {
        fn new(script: Vec<io::Result<MemorySink>>) -> Self {
            Self {
                script: script.into(),
                attempts: 0,
            }
        }
    }

    impl Connector for ScriptedConnector {
        type Sink = MemorySink;

        fn connect(&mut self) -> io::Result<MemorySink> {
            self.attempts += 1;
            self.script
                .pop_front()
                .unwrap_or_else(|| Err(io::ErrorKind::NotFound.into()))
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    fn busy() -> io::Result<MemorySink> {
        Err(io::Error::new(io::ErrorKind::ResourceBusy, "busy"))
    }

    fn quick_backoff() -> Backoff {
        Backoff::new(
            Duration::from_millis(1),
            Duration::from_millis(1),
            Duration::from_millis(3),
        )
    }

    #[test]
    fn test_backoff_is_linear_and_capped() {
        let mut backoff = Backoff::from(&BackoffConfig::default());
        let delays: Vec<u64> = (0..12).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 10]);

        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_error_classification() {
        assert!(is_fatal_open_error(&io::ErrorKind::InvalidInput.into()));
        assert!(is_fatal_open_error(&io::ErrorKind::Unsupported.into()));
        assert!(!is_fatal_open_error(&io::ErrorKind::NotFound.into()));
        assert!(!is_fatal_open_error(&io::ErrorKind::PermissionDenied.into()));
        assert!(!is_fatal_open_error(&io::ErrorKind::ResourceBusy.into()));
    }

    #[test]
    fn test_connect_blocking_retries_transient() {
        let connector = ScriptedConnector::new(vec![busy(), busy(), Ok(MemorySink::new())]);
        let mut link = LinkWriter::new(connector, quick_backoff());

        link.connect_blocking().unwrap();
        assert!(link.is_connected());
        assert_eq!(link.connector.attempts, 3);
    }

    #[test]
    fn test_connect_blocking_gives_up_on_fatal() {
        let connector = ScriptedConnector::new(vec![
            busy(),
            Err(io::Error::new(io::ErrorKind::InvalidInput, "bad baud rate")),
        ]);
        let mut link = LinkWriter::new(connector, quick_backoff());

        assert!(matches!(
            link.connect_blocking(),
            Err(BridgeError::FatalLink(_))
        ));
        assert!(!link.is_connected());
    }

    #[test]
    fn test_maintain_respects_backoff() {
        let connector = ScriptedConnector::new(vec![busy(), busy(), Ok(MemorySink::new())]);
        let mut link = LinkWriter::new(connector, quick_backoff());
        let start = Instant::now();

        link.maintain(start).unwrap();
        assert_eq!(link.connector.attempts, 1);
        // Still inside the 1 ms backoff
        link.maintain(start).unwrap();
        assert_eq!(link.connector.attempts, 1);

        link.maintain(start + Duration::from_millis(1)).unwrap();
        assert_eq!(link.connector.attempts, 2);
        assert!(link.sink().is_none());

        // Second delay is 2 ms
        link.maintain(start + Duration::from_millis(2)).unwrap();
        assert_eq!(link.connector.attempts, 2);
        link.maintain(start + Duration::from_millis(3)).unwrap();
        assert_eq!(link.connector.attempts, 3);
        assert!(link.sink().is_some());

        // Connected links are left alone
        link.maintain(start + Duration::from_secs(1)).unwrap();
        assert_eq!(link.connector.attempts, 3);
    }

    #[test]
    fn test_close_reconnects_immediately() {
        let connector = ScriptedConnector::new(vec![Ok(MemorySink::new()), Ok(MemorySink::new())]);
        let mut link = LinkWriter::new(connector, quick_backoff());
        let start = Instant::now();

        link.maintain(start).unwrap();
        link.sink().unwrap().write_all(b"|").unwrap();
        link.close(&io::ErrorKind::BrokenPipe.into());
        assert!(!link.is_connected());

        link.maintain(start).unwrap();
        assert!(link.is_connected());
        assert_eq!(link.connector.attempts, 2);
    }
}
