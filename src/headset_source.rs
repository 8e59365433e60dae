//! Where [`HeadsetEvent`]s come from. Each headset streams OSC to its own UDP
//! port, so there is one source per player.

use crate::config::OscPaths;
use crate::headset_event::HeadsetEvent;
use crate::osc_decoder::decode_packet;
use crate::player::PlayerId;

use log::{trace, warn};
use std::{
    collections::VecDeque,
    io,
    net::{SocketAddr, UdpSocket},
};

/// Large enough for any datagram the headset software sends.
const MAX_DATAGRAM: usize = 65_536;

/// How many datagrams one drain pass reads before handing control back, so a
/// flooded port cannot starve the other headset or the serial writer.
pub const DEFAULT_DRAIN_BUDGET: usize = 64;

/// `HeadsetSource`
///
/// An iterator over whatever events one headset has produced since it was
/// last drained. Iterating must never block: once nothing is immediately
/// available, `next()` returns `None`, and a later call may yield more.
pub trait HeadsetSource: Iterator<Item = HeadsetEvent> {
    /// The player this headset belongs to.
    fn player(&self) -> PlayerId;
}

/// Listens for one headset's OSC datagrams on a non-blocking UDP socket.
#[derive(Debug)]
pub struct HeadsetListener {
    player: PlayerId,
    socket: UdpSocket,
    paths: OscPaths,
    pending: VecDeque<HeadsetEvent>,
    buf: Vec<u8>,
    drain_budget: usize,
    budget_left: usize,
}

impl HeadsetListener {
    /// Binds to `port` on all interfaces.
    pub fn bind(player: PlayerId, port: u16, paths: OscPaths) -> io::Result<Self> {
        Self::bind_addr(player, SocketAddr::from(([0, 0, 0, 0], port)), paths)
    }

    /// Binds to a specific address, e.g. loopback with an ephemeral port.
    pub fn bind_addr(player: PlayerId, addr: SocketAddr, paths: OscPaths) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        Ok(Self {
            player,
            socket,
            paths,
            pending: VecDeque::new(),
            buf: vec![0; MAX_DATAGRAM],
            drain_budget: DEFAULT_DRAIN_BUDGET,
            budget_left: DEFAULT_DRAIN_BUDGET,
        })
    }

    /// Caps how many datagrams a single drain pass reads. Anything left on
    /// the socket is picked up by the next pass.
    pub fn with_drain_budget(mut self, datagrams: usize) -> Self {
        let datagrams = datagrams.max(1);
        self.drain_budget = datagrams;
        self.budget_left = datagrams;
        self
    }

    /// The address the socket is actually bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Reads at most one datagram into `pending`. Returns `false` once the
    /// socket has nothing more to give right now.
    fn receive_one(&mut self) -> bool {
        let (len, from) = match self.socket.recv_from(&mut self.buf) {
            Ok(received) => received,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return false,
            // A previous send to us bounced (Windows reports this on UDP),
            // the socket itself is fine
            Err(e) if e.kind() == io::ErrorKind::ConnectionReset => return true,
            Err(e) => {
                warn!("Player {} : error reading from socket: {}", self.player, e);
                return false;
            }
        };

        match decode_packet(&self.buf[..len]) {
            Ok(messages) => {
                for msg in messages {
                    match HeadsetEvent::from_message(&msg, &self.paths) {
                        Some(event) => self.pending.push_back(event),
                        None => trace!("Player {} : ignoring {}", self.player, msg.address),
                    }
                }
            }
            Err(e) => warn!("Player {} : dropped datagram from {}: {}", self.player, from, e),
        }
        true
    }
}

impl Iterator for HeadsetListener {
    type Item = HeadsetEvent;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pending.is_empty() {
            if self.budget_left == 0 || !self.receive_one() {
                // End of this pass, the next one starts with a full budget
                self.budget_left = self.drain_budget;
                return None;
            }
            self.budget_left -= 1;
        }
        self.pending.pop_front()
    }
}

impl HeadsetSource for HeadsetListener {
    fn player(&self) -> PlayerId {
        self.player
    }
}
