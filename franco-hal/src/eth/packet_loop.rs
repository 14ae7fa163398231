//! Edge-triggered packet exchange loop.
//!
//! The loop samples [Ethernet::is_receiving] and reacts on its transitions:
//!
//! - Rising edge: a frame started to arrive. The loop queues its own outbound frame.
//! - Falling edge: the frame is complete. The loop reads the RX descriptor, drains the frame
//!   and logs a [FrameReport].
//!
//! ## Polling rate
//!
//! Edges are only seen if `is_receiving` is sampled faster than the shortest frame is
//! received. A frame with the minimum payload of 42 bytes plus the header takes roughly
//! 5.8 us on a 100 Mbps link. [PacketLoop::run_until] does no work between two samples
//! unless an edge fires, and the exit condition must be cheap to evaluate.
use core::fmt;

use super::{
    CRC_LEN, EthError, Ethernet, MAX_FRAME_BUFFER_LEN, ReceivedFrame, RegisterSurface,
    descr::{Descriptor, MacAddress},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxEdge {
    /// The RX engine became busy.
    Arriving,
    /// The RX engine became idle again.
    Done,
}

/// Level to edge conversion of the RX engine state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EdgeDetector {
    previous: bool,
    current: bool,
}

impl EdgeDetector {
    #[inline]
    pub const fn new() -> Self {
        Self {
            previous: false,
            current: false,
        }
    }

    #[inline]
    pub const fn previous(&self) -> bool {
        self.previous
    }

    #[inline]
    pub const fn current(&self) -> bool {
        self.current
    }

    /// Feeds the next sample. The previous sample is always replaced.
    pub fn update(&mut self, sample: bool) -> Option<RxEdge> {
        self.previous = self.current;
        self.current = sample;
        match (self.previous, self.current) {
            (false, true) => Some(RxEdge::Arriving),
            (true, false) => Some(RxEdge::Done),
            _ => None,
        }
    }
}

/// Outcome of one loop iteration with an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    Sent,
    SendFailed(EthError),
    Received {
        descriptor: Descriptor,
        frame: ReceivedFrame,
    },
    ReceiveFailed(EthError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopStats {
    pub frames_sent: u32,
    pub frames_received: u32,
    pub tx_errors: u32,
    pub rx_errors: u32,
}

/// Human readable dump of a received frame.
pub struct FrameReport<'buf> {
    pub source: MacAddress,
    pub frame: ReceivedFrame,
    pub buffer: &'buf [u8],
}

impl fmt::Display for FrameReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (payload, crc) = self.frame.split(self.buffer);
        writeln!(f, "Source MAC: {}", self.source)?;
        writeln!(f, "Length: {}", self.frame.length)?;
        if let Some(ether_type) = self.frame.ether_type {
            writeln!(f, "EtherType: {:#06x}", ether_type)?;
        }
        write!(f, "Payload:")?;
        for byte in payload {
            write!(f, " {:02x}", byte)?;
        }
        write!(f, "\nCRC:")?;
        for byte in crc {
            write!(f, " {:02x}", byte)?;
        }
        Ok(())
    }
}

/// Packet exchange loop. The outbound frame is sent once per arriving frame.
pub struct PacketLoop<'payload> {
    detector: EdgeDetector,
    payload: &'payload [u8],
    destination: MacAddress,
    ether_type: Option<u16>,
    buffer: [u8; MAX_FRAME_BUFFER_LEN],
    last_len: Option<usize>,
    stats: LoopStats,
}

impl<'payload> PacketLoop<'payload> {
    pub const fn new(payload: &'payload [u8], destination: MacAddress) -> Self {
        Self {
            detector: EdgeDetector::new(),
            payload,
            destination,
            ether_type: None,
            buffer: [0; MAX_FRAME_BUFFER_LEN],
            last_len: None,
            stats: LoopStats {
                frames_sent: 0,
                frames_received: 0,
                tx_errors: 0,
                rx_errors: 0,
            },
        }
    }

    /// Outbound frames carry the given EtherType in
    /// [FrameMode::EthernetII](super::FrameMode::EthernetII).
    pub const fn with_ether_type(mut self, ether_type: u16) -> Self {
        self.ether_type = Some(ether_type);
        self
    }

    #[inline]
    pub const fn stats(&self) -> LoopStats {
        self.stats
    }

    #[inline]
    pub fn detector(&self) -> &EdgeDetector {
        &self.detector
    }

    /// Payload and CRC of the last received frame.
    pub fn last_frame(&self) -> &[u8] {
        let len = self.last_len.map(|len| len + CRC_LEN).unwrap_or(0);
        &self.buffer[..len]
    }

    /// Takes one sample of the RX engine state and handles an edge if there is one.
    pub fn poll_once<R: RegisterSurface>(&mut self, eth: &mut Ethernet<R>) -> Option<LoopEvent> {
        let edge = self.detector.update(eth.is_receiving())?;
        Some(match edge {
            RxEdge::Arriving => self.transmit(eth),
            RxEdge::Done => self.receive(eth),
        })
    }

    /// Runs the loop until `exit` returns true.
    pub fn run_until<R: RegisterSurface>(
        &mut self,
        eth: &mut Ethernet<R>,
        mut exit: impl FnMut() -> bool,
    ) -> LoopStats {
        while !exit() {
            self.poll_once(eth);
        }
        self.stats
    }

    fn transmit<R: RegisterSurface>(&mut self, eth: &mut Ethernet<R>) -> LoopEvent {
        let result = match self.ether_type {
            Some(ether_type) => {
                eth.send_frame_ethernet_ii(self.payload, self.destination, ether_type)
            }
            None => eth.send_frame(self.payload, self.destination),
        };
        match result {
            Ok(()) => {
                self.stats.frames_sent += 1;
                LoopEvent::Sent
            }
            Err(e) => {
                self.stats.tx_errors += 1;
                log::warn!("sending frame failed: {}", e);
                LoopEvent::SendFailed(e)
            }
        }
    }

    fn receive<R: RegisterSurface>(&mut self, eth: &mut Ethernet<R>) -> LoopEvent {
        match eth.receive_next_frame(&mut self.buffer) {
            Ok((descriptor, frame)) => {
                self.stats.frames_received += 1;
                self.last_len = Some(frame.length);
                log::info!(
                    "{}",
                    FrameReport {
                        source: descriptor.address(),
                        frame,
                        buffer: &self.buffer,
                    }
                );
                LoopEvent::Received { descriptor, frame }
            }
            Err(e) => {
                self.stats.rx_errors += 1;
                log::warn!("receiving frame failed: {}", e);
                LoopEvent::ReceiveFailed(e)
            }
        }
    }
}
