//! # Ethernet module
//!
//! Driver for the on-chip 10/100 Mbps Ethernet MAC and the external LAN8720A PHY.
//!
//! The MAC has no DMA. Frames are moved byte by byte through the TX and RX payload ports, and
//! a 64-bit [descriptor](descr::Descriptor) per frame carries the payload length and the
//! station address. All register accesses go through a [RegisterSurface], which is either
//! the memory-mapped register block or the [simulated surface](sim::SimSurface).
//!
//! The driver is fully polled. Operations which wait on a FIFO state spin without a timeout
//! and may not return if the hardware stalls.
use arbitrary_int::u4;
use franco::eth::MacInterruptPending;
use num_enum::TryFromPrimitive;

pub use descr::{Descriptor, MacAddress};
pub use franco::eth::{FrameMode, LinkSpeed};
pub use ll::{EthernetLowLevel, MacControl, MacGeneration, MacStatus, RegisterSurface};
pub use phy::{Channel, Duplex, InterruptSource, Phy, PhyEvent, PhyRegister};

pub mod descr;
pub mod ll;
pub mod packet_loop;
pub mod phy;
pub mod sim;

pub const MAX_PAYLOAD_LENGTH: usize = 1500;
/// Shorter payloads are zero-padded on transmission.
pub const MIN_PAYLOAD_LENGTH: usize = 42;
/// The MAC appends the frame check sequence to every received payload.
pub const CRC_LEN: usize = 4;
/// Required RX buffer length for a frame with the maximum payload length.
pub const MAX_FRAME_BUFFER_LEN: usize = MAX_PAYLOAD_LENGTH + CRC_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EthError {
    #[error("TX packet queue is full")]
    TxFull,
    #[error("no RX frame queued")]
    RxEmpty,
    #[error("payload length {length} exceeds the maximum payload length")]
    LengthExceeded { length: usize },
    #[error("payload length {length} is below the minimum payload length")]
    LengthSubceeded { length: usize },
    #[error("index {index} out of range, maximum is {max}")]
    IndexOutOfRange { index: u8, max: u8 },
    #[error("buffer with {available} bytes too small, {required} bytes required")]
    BufferTooSmall { required: usize, available: usize },
    #[error("frames require an EtherType in Ethernet II mode")]
    MissingEtherType,
}

/// MAC interrupt event. The value is the index used by [Ethernet::set_mac_interrupt].
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum MacEvent {
    PhyInterrupt = 0,
    TxDone = 1,
    RxDone = 2,
    RxError = 3,
}

/// Combined interrupt state of the PHY and the MAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthInterrupt {
    pub phy: InterruptSource,
    pub mac: MacInterruptPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthConfig {
    pub generation: MacGeneration,
    pub speed: LinkSpeed,
    pub duplex: Duplex,
    pub auto_negotiation: bool,
    pub frame_mode: FrameMode,
}

impl EthConfig {
    pub const fn new(
        generation: MacGeneration,
        speed: LinkSpeed,
        duplex: Duplex,
        auto_negotiation: bool,
        frame_mode: FrameMode,
    ) -> Self {
        Self {
            generation,
            speed,
            duplex,
            auto_negotiation,
            frame_mode,
        }
    }
}

impl Default for EthConfig {
    fn default() -> Self {
        Self::new(
            MacGeneration::SplitFifo,
            LinkSpeed::Mbps100,
            Duplex::Full,
            true,
            FrameMode::Ieee8023,
        )
    }
}

/// Result of a successful [Ethernet::receive_frame] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceivedFrame {
    /// Payload length. The buffer holds `length + CRC_LEN` valid bytes.
    pub length: usize,
    /// Only available in [FrameMode::EthernetII].
    pub ether_type: Option<u16>,
}

impl ReceivedFrame {
    /// Splits the receive buffer into the payload and the CRC.
    pub fn split<'buf>(&self, buffer: &'buf [u8]) -> (&'buf [u8], &'buf [u8]) {
        let end = (self.length + CRC_LEN).min(buffer.len());
        let (payload, crc) = buffer[..end].split_at(self.length.min(end));
        (payload, crc)
    }
}

/// Higher-level Ethernet abstraction.
///
/// Creating the driver resets and wakes up the PHY and disables all MAC interrupts. Dropping
/// it resets the PHY and puts it to sleep.
pub struct Ethernet<R: RegisterSurface> {
    ll: EthernetLowLevel<R>,
}

impl<R: RegisterSurface> Ethernet<R> {
    pub fn new(regs: R, generation: MacGeneration) -> Self {
        debug_assert!(
            regs.fixed_generation().is_none_or(|fixed| fixed == generation),
            "register surface implements a different MAC generation"
        );
        let mut eth = Self {
            ll: EthernetLowLevel::new(regs, generation),
        };
        eth.phy().reset();
        eth.phy().wake_up();
        eth.ll.set_interrupt_enable(u4::new(0));
        eth.ll.clear_interrupts();
        eth
    }

    /// Creates the driver and applies the given configuration with
    /// [Self::init_with_frame_mode].
    pub fn new_with_config(regs: R, config: EthConfig) -> Self {
        let mut eth = Self::new(regs, config.generation);
        eth.init_with_frame_mode(
            config.speed,
            config.duplex,
            config.auto_negotiation,
            config.frame_mode,
        );
        eth
    }

    /// Configures the MAC speed and the PHY. Can be called again to reconfigure.
    pub fn init(&mut self, speed: LinkSpeed, duplex: Duplex, auto_negotiation: bool) {
        self.ll.set_speed(speed);
        let mut phy = self.phy();
        phy.wake_up();
        phy.configure(speed, duplex);
        phy.set_auto_negotiation(auto_negotiation);
    }

    /// Same as [Self::init], but also selects the framing format.
    pub fn init_with_frame_mode(
        &mut self,
        speed: LinkSpeed,
        duplex: Duplex,
        auto_negotiation: bool,
        frame_mode: FrameMode,
    ) {
        self.ll.set_frame_mode(frame_mode);
        self.init(speed, duplex, auto_negotiation);
    }

    #[inline]
    pub fn set_frame_mode(&mut self, frame_mode: FrameMode) {
        self.ll.set_frame_mode(frame_mode);
    }

    /// PHY controller borrowing the register surface of the driver.
    #[inline]
    pub fn phy(&mut self) -> Phy<&mut R> {
        Phy::new(&mut self.ll.regs)
    }

    #[inline]
    pub fn ll(&mut self) -> &mut EthernetLowLevel<R> {
        &mut self.ll
    }

    #[inline]
    pub fn regs(&self) -> &R {
        &self.ll.regs
    }

    #[inline]
    pub fn regs_mut(&mut self) -> &mut R {
        &mut self.ll.regs
    }

    #[inline]
    pub fn status(&mut self) -> MacStatus {
        self.ll.status()
    }

    #[inline]
    pub fn link_speed(&mut self) -> LinkSpeed {
        self.status().control.speed
    }

    #[inline]
    pub fn frame_mode(&mut self) -> FrameMode {
        self.status().control.frame_mode
    }

    /// The TX engine is busy.
    #[inline]
    pub fn is_sending(&mut self) -> bool {
        !self.status().tx_idle
    }

    /// The RX engine is busy. A frame is currently arriving.
    #[inline]
    pub fn is_receiving(&mut self) -> bool {
        !self.status().rx_idle
    }

    #[inline]
    pub fn is_empty_payload_tx(&mut self) -> bool {
        self.status().tx_payload_empty
    }

    #[inline]
    pub fn is_full_payload_tx(&mut self) -> bool {
        self.status().tx_payload_full
    }

    #[inline]
    pub fn is_empty_payload_rx(&mut self) -> bool {
        self.status().rx_payload_empty
    }

    #[inline]
    pub fn is_full_payload_rx(&mut self) -> bool {
        self.status().rx_payload_full
    }

    #[inline]
    pub fn is_empty_packet_tx(&mut self) -> bool {
        self.status().tx_packet_empty
    }

    #[inline]
    pub fn is_full_packet_tx(&mut self) -> bool {
        self.status().tx_packet_full
    }

    #[inline]
    pub fn is_empty_packet_rx(&mut self) -> bool {
        self.status().rx_packet_empty
    }

    #[inline]
    pub fn is_full_packet_rx(&mut self) -> bool {
        self.status().rx_packet_full
    }

    /// Enables or disables the MAC interrupt with the given [MacEvent] index.
    ///
    /// Returns [EthError::IndexOutOfRange] without touching the mask for `index > 3`.
    pub fn set_mac_interrupt(&mut self, index: u8, enable: bool) -> Result<(), EthError> {
        let event = MacEvent::try_from(index).map_err(|_| {
            log::warn!("MAC interrupt index {} out of range", index);
            EthError::IndexOutOfRange {
                index,
                max: MacEvent::RxError as u8,
            }
        })?;
        self.set_mac_event_interrupt(event, enable);
        Ok(())
    }

    pub fn set_mac_event_interrupt(&mut self, event: MacEvent, enable: bool) {
        self.ll.modify_control(|mut ctrl| {
            let bit = 1 << event as u8;
            let mask = if enable {
                ctrl.interrupt_enable.value() | bit
            } else {
                ctrl.interrupt_enable.value() & !bit
            };
            ctrl.interrupt_enable = u4::new(mask);
            ctrl
        });
    }

    /// Snapshot of the PHY interrupt source register and the MAC interrupt pending word.
    pub fn interrupt(&mut self) -> EthInterrupt {
        let phy = self.phy().interrupt_source();
        EthInterrupt {
            phy,
            mac: self.ll.regs.interrupt_pending(),
        }
    }

    #[inline]
    pub fn clear_mac_interrupts(&mut self) {
        self.ll.clear_interrupts();
    }

    /// Descriptor of the oldest received frame. The frame stays queued.
    #[inline]
    pub fn rx_descriptor(&mut self) -> Descriptor {
        Descriptor::new_with_raw_value(self.ll.regs.rx_descriptor())
    }

    /// Queues a frame for transmission.
    ///
    /// Returns [EthError::MissingEtherType] in [FrameMode::EthernetII], use
    /// [Self::send_frame_ethernet_ii] instead. Payloads shorter than [MIN_PAYLOAD_LENGTH] are zero-padded. The function returns once
    /// the descriptor was written and does not wait for the transmission to complete. It
    /// spins while the TX payload FIFO is full, which may not return if the MAC stalls.
    pub fn send_frame(&mut self, payload: &[u8], destination: MacAddress) -> Result<(), EthError> {
        self.transmit(payload, destination, None)
    }

    /// Queues a frame with the given EtherType.
    ///
    /// The EtherType is only written in [FrameMode::EthernetII]. Otherwise this is the same
    /// as [Self::send_frame].
    pub fn send_frame_ethernet_ii(
        &mut self,
        payload: &[u8],
        destination: MacAddress,
        ether_type: u16,
    ) -> Result<(), EthError> {
        self.transmit(payload, destination, Some(ether_type))
    }

    /// Calls [Self::send_frame] up to `attempts` times as long as the TX packet queue is full.
    pub fn send_frame_with_retries(
        &mut self,
        payload: &[u8],
        destination: MacAddress,
        attempts: u32,
    ) -> Result<(), EthError> {
        let mut result = Err(EthError::TxFull);
        for _ in 0..attempts.max(1) {
            result = self.send_frame(payload, destination);
            if result != Err(EthError::TxFull) {
                break;
            }
        }
        result
    }

    fn transmit(
        &mut self,
        payload: &[u8],
        destination: MacAddress,
        ether_type: Option<u16>,
    ) -> Result<(), EthError> {
        let descriptor = Descriptor::for_payload(payload.len(), destination).ok_or_else(|| {
            log::warn!("TX payload with {} bytes rejected", payload.len());
            EthError::LengthExceeded {
                length: payload.len(),
            }
        })?;
        let status = self.ll.status();
        let ethernet_ii = status.control.frame_mode == FrameMode::EthernetII;
        if ethernet_ii && ether_type.is_none() {
            log::warn!("TX frame without EtherType rejected in Ethernet II mode");
            return Err(EthError::MissingEtherType);
        }
        if status.tx_packet_full {
            return Err(EthError::TxFull);
        }
        for &byte in payload {
            self.ll.wait_tx_payload_not_full();
            self.ll.regs.push_tx_byte(byte);
        }
        for _ in 0..descr::padding_len(payload.len()) {
            self.ll.wait_tx_payload_not_full();
            self.ll.regs.push_tx_byte(0);
        }
        if let Some(ether_type) = ether_type.filter(|_| ethernet_ii) {
            self.ll.regs.set_tx_ether_type(ether_type);
        }
        // Hands the frame over to the framer, so it must come last.
        self.ll.regs.commit_tx_descriptor(descriptor.raw());
        log::debug!(
            "TX frame with {} bytes to {}",
            descriptor.length(),
            destination
        );
        Ok(())
    }

    /// Drains the oldest received frame with a payload of `length` bytes into `buffer`.
    ///
    /// `length` is usually the length of the [Self::rx_descriptor]. The buffer receives the
    /// payload followed by the [CRC_LEN] CRC bytes. The function spins while the RX payload
    /// FIFO is empty, which may not return if fewer bytes than announced arrive.
    pub fn receive_frame(
        &mut self,
        buffer: &mut [u8],
        length: usize,
    ) -> Result<ReceivedFrame, EthError> {
        if length > MAX_PAYLOAD_LENGTH {
            log::warn!("RX length {} rejected", length);
            return Err(EthError::LengthExceeded { length });
        }
        if length < MIN_PAYLOAD_LENGTH {
            log::warn!("RX length {} rejected", length);
            return Err(EthError::LengthSubceeded { length });
        }
        let required = length + CRC_LEN;
        if buffer.len() < required {
            return Err(EthError::BufferTooSmall {
                required,
                available: buffer.len(),
            });
        }
        let status = self.ll.status();
        if status.rx_packet_empty {
            return Err(EthError::RxEmpty);
        }
        // The side channel belongs to the frame at the head of the queue.
        let ether_type = if status.control.frame_mode == FrameMode::EthernetII {
            Some(self.ll.regs.rx_ether_type())
        } else {
            None
        };
        for slot in &mut buffer[..required] {
            self.ll.wait_rx_payload_not_empty();
            *slot = self.ll.regs.pop_rx_byte();
        }
        log::debug!("RX frame with {} bytes", length);
        Ok(ReceivedFrame { length, ether_type })
    }

    /// Reads the RX descriptor and drains the frame it describes.
    pub fn receive_next_frame(
        &mut self,
        buffer: &mut [u8],
    ) -> Result<(Descriptor, ReceivedFrame), EthError> {
        if self.status().rx_packet_empty {
            return Err(EthError::RxEmpty);
        }
        let descriptor = self.rx_descriptor();
        let frame = self.receive_frame(buffer, usize::from(descriptor.length()))?;
        Ok((descriptor, frame))
    }

    delegate::delegate! {
        to self.phy() {
            #[inline]
            pub fn read_register(&mut self, addr: arbitrary_int::u5) -> u16;

            #[inline]
            pub fn write_register(&mut self, addr: arbitrary_int::u5, value: u16);

            /// PHY software reset. The caller must wait for the reset to complete.
            #[inline]
            pub fn reset(&mut self);

            #[inline]
            pub fn power_down(&mut self);

            #[inline]
            pub fn wake_up(&mut self);

            #[inline]
            pub fn configure(&mut self, speed: LinkSpeed, duplex: Duplex);

            #[inline]
            pub fn set_auto_negotiation(&mut self, enable: bool);

            #[inline]
            pub fn set_test_mode(&mut self, enable: bool);

            #[inline]
            pub fn set_heartbeat_test(&mut self, enable: bool);

            #[inline]
            pub fn set_channel(&mut self, channel: Channel);

            #[inline]
            pub fn channel(&mut self) -> Channel;

            #[inline]
            pub fn set_phy_interrupt(&mut self, index: u8, enable: bool) -> Result<(), EthError>;

            #[inline]
            pub fn is_linked(&mut self) -> bool;

            #[inline]
            pub fn energy_on(&mut self) -> bool;

            #[inline]
            pub fn error_count(&mut self) -> u16;

            #[inline]
            pub fn wait_for_link(&mut self, max_polls: u32) -> bool;

            #[inline]
            pub fn wait_for_link_blocking(&mut self);
        }
    }
}

impl<R: RegisterSurface> Drop for Ethernet<R> {
    fn drop(&mut self) {
        let mut phy = self.phy();
        phy.reset();
        phy.power_down();
        self.ll.set_interrupt_enable(u4::new(0));
        self.ll.clear_interrupts();
    }
}
