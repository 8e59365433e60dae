//! The outbound byte sink that frames are written to. In production this is
//! the serial port to the actuator (see [`crate::link`]); the in-memory and
//! logging sinks here are for tests and the hardware-free monitor.

use log::debug;
use std::io;
use std::time::Instant;

/// Something frames can be written to.
pub trait ByteSink {
    /// Whether a write right now has any chance of reaching the device.
    fn is_open_for_writing(&self) -> bool;

    /// Queues all of `bytes`; may not reach the device until [`ByteSink::flush`].
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Pushes everything written so far out to the device.
    fn flush(&mut self) -> io::Result<()>;
}

/// Collects everything written into a `Vec`, remembering when each flush
/// happened. Can be toggled closed to act like a missing device.
#[derive(Debug)]
pub struct MemorySink {
    /// Bytes written so far, in order.
    pub bytes: Vec<u8>,
    /// When each flush happened.
    pub flushes: Vec<Instant>,
    /// Whether the sink reports itself as open.
    pub open: bool,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySink {
    /// An empty sink that reports itself open.
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            flushes: Vec::new(),
            open: true,
        }
    }

    /// An empty sink standing in for an unplugged device.
    pub fn closed() -> Self {
        Self {
            open: false,
            ..Self::new()
        }
    }
}

impl ByteSink for MemorySink {
    fn is_open_for_writing(&self) -> bool {
        self.open
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.bytes.extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes.push(Instant::now());
        Ok(())
    }
}

/// A sink with no device behind it that logs each flushed frame at debug
/// level.
#[derive(Debug, Default)]
pub struct LogSink {
    pending: Vec<u8>,
}

impl LogSink {
    #[allow(missing_docs)]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ByteSink for LogSink {
    fn is_open_for_writing(&self) -> bool {
        true
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.pending.extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        debug!("LogSink : {:?}", self.pending);
        self.pending.clear();
        Ok(())
    }
}
