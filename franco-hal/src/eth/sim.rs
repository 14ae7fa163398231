//! In-memory register surface.
//!
//! [SimSurface] models the Ethernet peripheral well enough to run the driver on a host: a PHY
//! register file with self-clearing reset and restart bits, the MAC control bits, a TX frame
//! log and an RX frame queue. Tests can force FIFO and engine states which are hard to
//! provoke on real hardware.
use arbitrary_int::u5;
use franco::eth::{MacInterruptPending, PHY_WINDOW_LEN};
use heapless::{Deque, Vec};

use super::{
    CRC_LEN, MAX_FRAME_BUFFER_LEN, MAX_PAYLOAD_LENGTH,
    descr::{Descriptor, MacAddress},
    ll::{MacControl, MacGeneration, RegisterSurface},
    phy::{BasicControl, BasicStatus, PhyRegister},
};

/// Number of committed TX frames kept in the log.
pub const TX_LOG_DEPTH: usize = 8;
/// Depth of the RX frame queue.
pub const RX_QUEUE_DEPTH: usize = 4;

const PHY_ID1_LAN8720A: u16 = 0x0007;
const PHY_ID2_LAN8720A: u16 = 0xC0F1;
/// 10/100 half/full duplex capable, auto-negotiation able, extended capabilities.
const BASIC_STATUS_RESET: u16 = 0x7809;

/// TX frame as seen by the framer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimTxFrame {
    pub descriptor: Descriptor,
    /// EtherType written since the previous descriptor commit.
    pub ether_type: Option<u16>,
    /// Payload bytes including the padding.
    pub payload: Vec<u8, MAX_PAYLOAD_LENGTH>,
}

/// RX frame waiting in the receive queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimRxFrame {
    pub descriptor: Descriptor,
    pub ether_type: u16,
    /// Payload bytes followed by the CRC.
    pub bytes: Vec<u8, MAX_FRAME_BUFFER_LEN>,
}

pub struct SimSurface {
    generation: MacGeneration,
    phy: [u16; PHY_WINDOW_LEN],
    phy_writes: usize,
    phy_resets: usize,
    auto_negotiation_restarts: usize,
    control: MacControl,
    interrupt_pending: MacInterruptPending,
    pending_tx: Vec<u8, MAX_PAYLOAD_LENGTH>,
    pending_ether_type: Option<u16>,
    tx_frames: Vec<SimTxFrame, TX_LOG_DEPTH>,
    tx_byte_writes: usize,
    tx_overflows: usize,
    rx_frames: Deque<SimRxFrame, RX_QUEUE_DEPTH>,
    rx_cursor: usize,
    rx_byte_reads: usize,
    tx_packet_full: bool,
    tx_busy: bool,
    rx_busy: bool,
    tx_full_polls: u32,
    rx_empty_polls: u32,
}

impl Default for SimSurface {
    fn default() -> Self {
        Self::new(MacGeneration::default())
    }
}

impl SimSurface {
    pub fn new(generation: MacGeneration) -> Self {
        let mut phy = [0; PHY_WINDOW_LEN];
        phy[PhyRegister::BasicStatus as usize] = BASIC_STATUS_RESET;
        phy[PhyRegister::Identifier1 as usize] = PHY_ID1_LAN8720A;
        phy[PhyRegister::Identifier2 as usize] = PHY_ID2_LAN8720A;
        phy[PhyRegister::AutoNegAdvertisement as usize] = 0x01E1;
        Self {
            generation,
            phy,
            phy_writes: 0,
            phy_resets: 0,
            auto_negotiation_restarts: 0,
            control: generation.decode_status(0).control,
            interrupt_pending: MacInterruptPending::DEFAULT,
            pending_tx: Vec::new(),
            pending_ether_type: None,
            tx_frames: Vec::new(),
            tx_byte_writes: 0,
            tx_overflows: 0,
            rx_frames: Deque::new(),
            rx_cursor: 0,
            rx_byte_reads: 0,
            tx_packet_full: false,
            tx_busy: false,
            rx_busy: false,
            tx_full_polls: 0,
            rx_empty_polls: 0,
        }
    }

    #[inline]
    pub const fn generation(&self) -> MacGeneration {
        self.generation
    }

    /// Raw PHY register value without going through the PHY window.
    #[inline]
    pub fn phy_value(&self, reg: PhyRegister) -> u16 {
        self.phy[reg as usize]
    }

    #[inline]
    pub fn phy_file(&self) -> &[u16; PHY_WINDOW_LEN] {
        &self.phy
    }

    pub fn set_link(&mut self, up: bool) {
        let reg = &mut self.phy[PhyRegister::BasicStatus as usize];
        if up {
            *reg |= 1 << 2;
        } else {
            *reg &= !(1 << 2);
        }
    }

    #[inline]
    pub const fn phy_writes(&self) -> usize {
        self.phy_writes
    }

    #[inline]
    pub const fn phy_resets(&self) -> usize {
        self.phy_resets
    }

    #[inline]
    pub const fn auto_negotiation_restarts(&self) -> usize {
        self.auto_negotiation_restarts
    }

    #[inline]
    pub const fn control(&self) -> MacControl {
        self.control
    }

    /// Committed TX frames, oldest first.
    #[inline]
    pub fn tx_frames(&self) -> &[SimTxFrame] {
        &self.tx_frames
    }

    /// Bytes pushed since the last descriptor commit.
    #[inline]
    pub fn pending_tx_bytes(&self) -> &[u8] {
        &self.pending_tx
    }

    #[inline]
    pub const fn pending_tx_ether_type(&self) -> Option<u16> {
        self.pending_ether_type
    }

    /// Total number of writes to the TX payload port.
    #[inline]
    pub const fn tx_byte_writes(&self) -> usize {
        self.tx_byte_writes
    }

    /// Total number of reads from the RX payload port.
    #[inline]
    pub const fn rx_byte_reads(&self) -> usize {
        self.rx_byte_reads
    }

    pub fn clear_tx_log(&mut self) {
        self.tx_frames.clear();
    }

    /// Queues a received frame. `crc` is appended to the payload as the hardware does.
    ///
    /// Returns `false` if the queue is full or the payload exceeds the maximum length.
    pub fn queue_rx_frame(
        &mut self,
        source: MacAddress,
        ether_type: u16,
        payload: &[u8],
        crc: [u8; CRC_LEN],
    ) -> bool {
        if payload.len() > MAX_PAYLOAD_LENGTH {
            return false;
        }
        let mut bytes = Vec::new();
        if bytes.extend_from_slice(payload).is_err() || bytes.extend_from_slice(&crc).is_err() {
            return false;
        }
        let frame = SimRxFrame {
            descriptor: Descriptor::new(payload.len() as u16, source),
            ether_type,
            bytes,
        };
        self.rx_frames.push_back(frame).is_ok()
    }

    #[inline]
    pub fn rx_frames_queued(&self) -> usize {
        self.rx_frames.len()
    }

    #[inline]
    pub fn set_tx_packet_full(&mut self, full: bool) {
        self.tx_packet_full = full;
    }

    /// The TX engine reports busy while set.
    #[inline]
    pub fn set_tx_busy(&mut self, busy: bool) {
        self.tx_busy = busy;
    }

    /// The RX engine reports busy while set.
    #[inline]
    pub fn set_rx_busy(&mut self, busy: bool) {
        self.rx_busy = busy;
    }

    /// The TX payload FIFO reports full for the next `polls` status reads.
    #[inline]
    pub fn stall_tx_payload(&mut self, polls: u32) {
        self.tx_full_polls = polls;
    }

    /// The RX payload FIFO reports empty for the next `polls` status reads.
    #[inline]
    pub fn stall_rx_payload(&mut self, polls: u32) {
        self.rx_empty_polls = polls;
    }

    pub fn raise_interrupt(&mut self, pending: MacInterruptPending) {
        self.interrupt_pending = MacInterruptPending::new_with_raw_value(
            self.interrupt_pending.raw_value() | pending.raw_value(),
        );
    }

    fn rx_bytes_left(&self) -> usize {
        self.rx_frames
            .front()
            .map(|frame| frame.bytes.len() - self.rx_cursor)
            .unwrap_or(0)
    }

    fn status_bits(&mut self) -> u32 {
        let tx_payload_full = self.tx_full_polls > 0;
        self.tx_full_polls = self.tx_full_polls.saturating_sub(1);
        let rx_payload_empty = self.rx_empty_polls > 0 || self.rx_bytes_left() == 0;
        self.rx_empty_polls = self.rx_empty_polls.saturating_sub(1);
        let tx_payload_empty = self.pending_tx.is_empty() && !tx_payload_full;
        match self.generation {
            MacGeneration::SingleFifo => franco::eth::CtrlStatusSingleFifo::DEFAULT
                .with_rx_empty(rx_payload_empty)
                .with_rx_full(self.rx_frames.is_full())
                .with_tx_empty(tx_payload_empty && !self.tx_packet_full)
                .with_tx_full(tx_payload_full || self.tx_packet_full)
                .with_rx_idle(!self.rx_busy)
                .with_tx_idle(!self.tx_busy)
                .raw_value(),
            MacGeneration::SplitFifo => franco::eth::CtrlStatusSplitFifo::DEFAULT
                .with_rx_payload_empty(rx_payload_empty)
                .with_rx_payload_full(self.rx_bytes_left() > MAX_PAYLOAD_LENGTH)
                .with_tx_payload_empty(tx_payload_empty)
                .with_tx_payload_full(tx_payload_full)
                .with_rx_packet_empty(self.rx_frames.is_empty())
                .with_rx_packet_full(self.rx_frames.is_full())
                .with_tx_packet_empty(!self.tx_packet_full)
                .with_tx_packet_full(self.tx_packet_full)
                .with_rx_idle(!self.rx_busy)
                .with_tx_idle(!self.tx_busy)
                .raw_value(),
        }
    }
}

impl RegisterSurface for SimSurface {
    fn phy_register(&mut self, reg: u5) -> u16 {
        let index = usize::from(reg.value());
        let value = self.phy[index];
        // Pending PHY interrupt events are cleared by reading them.
        if index == PhyRegister::InterruptSource as usize {
            self.phy[index] = 0;
        }
        value
    }

    fn set_phy_register(&mut self, reg: u5, value: u16) {
        self.phy_writes += 1;
        let index = usize::from(reg.value());
        if index == PhyRegister::BasicControl as usize {
            let ctrl = BasicControl::new_with_raw_value(value);
            if ctrl.reset() {
                self.phy_resets += 1;
            }
            if ctrl.restart_auto_negotiation() {
                self.auto_negotiation_restarts += 1;
            }
            let settled = ctrl
                .with_reset(false)
                .with_restart_auto_negotiation(false);
            self.phy[index] = settled.raw_value();
            // Auto-negotiation completes instantly once it is enabled.
            let status = &mut self.phy[PhyRegister::BasicStatus as usize];
            if settled.auto_negotiation_enable() && !settled.power_down() {
                *status |= 1 << 5;
            } else {
                *status &= !(1 << 5);
            }
            return;
        }
        self.phy[index] = value;
    }

    fn ctrl_status(&mut self) -> u32 {
        let status = self.status_bits();
        self.generation.encode_control(status, self.control)
    }

    fn set_ctrl_status(&mut self, raw: u32) {
        self.control = self.generation.decode_status(raw).control;
    }

    fn push_tx_byte(&mut self, byte: u8) {
        self.tx_byte_writes += 1;
        if self.pending_tx.push(byte).is_err() {
            self.tx_overflows += 1;
        }
    }

    fn commit_tx_descriptor(&mut self, raw: u64) {
        let frame = SimTxFrame {
            descriptor: Descriptor::new_with_raw_value(raw),
            ether_type: self.pending_ether_type.take(),
            payload: core::mem::take(&mut self.pending_tx),
        };
        if self.tx_frames.is_full() {
            self.tx_frames.remove(0);
        }
        // Cannot fail, one slot was freed above.
        let _ = self.tx_frames.push(frame);
    }

    fn pop_rx_byte(&mut self) -> u8 {
        self.rx_byte_reads += 1;
        let Some(frame) = self.rx_frames.front() else {
            return 0;
        };
        let byte = frame.bytes[self.rx_cursor];
        self.rx_cursor += 1;
        if self.rx_cursor == frame.bytes.len() {
            self.rx_frames.pop_front();
            self.rx_cursor = 0;
        }
        byte
    }

    fn rx_descriptor(&mut self) -> u64 {
        self.rx_frames
            .front()
            .map(|frame| frame.descriptor.raw())
            .unwrap_or(0)
    }

    fn interrupt_pending(&mut self) -> MacInterruptPending {
        self.interrupt_pending
    }

    fn set_interrupt_pending(&mut self, value: MacInterruptPending) {
        self.interrupt_pending = value;
    }

    fn set_tx_ether_type(&mut self, ether_type: u16) {
        self.pending_ether_type = Some(ether_type);
    }

    fn rx_ether_type(&mut self) -> u16 {
        self.rx_frames
            .front()
            .map(|frame| frame.ether_type)
            .unwrap_or(0)
    }

    #[inline]
    fn fixed_generation(&self) -> Option<MacGeneration> {
        Some(self.generation)
    }
}

impl SimSurface {
    /// Number of TX bytes which did not fit into the pending frame buffer.
    #[inline]
    pub const fn tx_overflows(&self) -> usize {
        self.tx_overflows
    }

    #[inline]
    pub fn basic_status(&self) -> BasicStatus {
        BasicStatus::new_with_raw_value(self.phy_value(PhyRegister::BasicStatus))
    }
}
