//! # Ethernet MAC register module.
//!
//! The Ethernet peripheral exposes the register file of the external PHY through a window of
//! 32 words, followed by the MAC control/status word, the packet descriptor registers and the
//! single byte FIFO ports for the frame payload.
//!
//! Two generations of the MAC exist which only differ in the layout of the control/status
//! word: [CtrlStatusSingleFifo] for the MAC with one combined payload FIFO per direction and
//! [CtrlStatusSplitFifo] for the MAC with separate payload and packet descriptor FIFOs.
use arbitrary_int::u4;

pub const ETH_BASE_ADDR: usize = super::MMIO_BASE_ADDR + 8 * super::PERIPHERAL_INTERLEAVE;

/// Number of words of the PHY register window.
pub const PHY_WINDOW_LEN: usize = 32;

/// MAC side speed selection.
#[bitbybit::bitenum(u1, exhaustive = true)]
#[derive(Debug, PartialEq, Eq)]
pub enum LinkSpeed {
    Mbps10 = 0,
    Mbps100 = 1,
}

/// Framing format used by the MAC framer.
#[bitbybit::bitenum(u1, exhaustive = true)]
#[derive(Debug, PartialEq, Eq)]
pub enum FrameMode {
    /// The 2 bytes after the source address carry the payload length (802.3/LLC).
    Ieee8023 = 0,
    /// The 2 bytes after the source address carry the EtherType.
    EthernetII = 1,
}

/// Control/status word of the single FIFO MAC generation.
///
/// The status bits are driven by the hardware, writes to them are ignored.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
#[derive(PartialEq, Eq)]
pub struct CtrlStatusSingleFifo {
    #[bit(11, rw)]
    frame_mode: FrameMode,
    #[bit(10, rw)]
    speed: LinkSpeed,
    /// One enable bit per [MacInterruptPending] event.
    #[bits(6..=9, rw)]
    interrupt_enable: u4,
    #[bit(5, rw)]
    tx_idle: bool,
    #[bit(4, rw)]
    rx_idle: bool,
    #[bit(3, rw)]
    tx_full: bool,
    #[bit(2, rw)]
    tx_empty: bool,
    #[bit(1, rw)]
    rx_full: bool,
    #[bit(0, rw)]
    rx_empty: bool,
}

/// Control/status word of the split FIFO MAC generation.
///
/// The payload FIFOs hold the frame bytes, the packet FIFOs hold the descriptors of the
/// queued frames. The status bits are driven by the hardware, writes to them are ignored.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
#[derive(PartialEq, Eq)]
pub struct CtrlStatusSplitFifo {
    #[bit(15, rw)]
    frame_mode: FrameMode,
    #[bit(14, rw)]
    speed: LinkSpeed,
    /// One enable bit per [MacInterruptPending] event.
    #[bits(10..=13, rw)]
    interrupt_enable: u4,
    #[bit(9, rw)]
    tx_idle: bool,
    #[bit(8, rw)]
    rx_idle: bool,
    #[bit(7, rw)]
    tx_packet_full: bool,
    #[bit(6, rw)]
    tx_packet_empty: bool,
    #[bit(5, rw)]
    rx_packet_full: bool,
    #[bit(4, rw)]
    rx_packet_empty: bool,
    #[bit(3, rw)]
    tx_payload_full: bool,
    #[bit(2, rw)]
    tx_payload_empty: bool,
    #[bit(1, rw)]
    rx_payload_full: bool,
    #[bit(0, rw)]
    rx_payload_empty: bool,
}

/// MAC interrupt pending word. Writing 0 clears all pending events.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
#[derive(PartialEq, Eq)]
pub struct MacInterruptPending {
    #[bit(3, rw)]
    rx_error: bool,
    #[bit(2, rw)]
    rx_done: bool,
    #[bit(1, rw)]
    tx_done: bool,
    /// Interrupt line of the external PHY.
    #[bit(0, rw)]
    phy_interrupt: bool,
}

/// EtherType side channel register used in [FrameMode::EthernetII].
#[bitbybit::bitfield(u32, default = 0x0, debug)]
#[derive(PartialEq, Eq)]
pub struct EtherTypeRegister {
    #[bits(0..=15, rw)]
    value: u16,
}

/// Ethernet MAC register access.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct Ethernet {
    /// PHY register N is mapped to word N. Only the lower 16 bits are used.
    phy_window: [u32; PHY_WINDOW_LEN],
    /// Raw control/status word. The layout depends on the MAC generation.
    ctrl_status: u32,
    tx_descr_low: u32,
    /// Writing the upper descriptor word hands the frame over to the framer.
    tx_descr_high: u32,
    /// Byte wide TX payload port. Only byte accesses should be used.
    #[mmio(Write)]
    tx_payload: u32,
    #[mmio(PureRead)]
    rx_descr_low: u32,
    #[mmio(PureRead)]
    rx_descr_high: u32,
    /// Byte wide RX payload port. Each read pops one byte.
    #[mmio(Read)]
    rx_payload: u32,
    interrupt_pending: MacInterruptPending,
    tx_ether_type: EtherTypeRegister,
    #[mmio(PureRead)]
    rx_ether_type: EtherTypeRegister,
}

static_assertions::const_assert_eq!(core::mem::size_of::<Ethernet>(), 0xA8);

impl Ethernet {
    /// Create a new Ethernet MMIO instance at the fixed address [ETH_BASE_ADDR].
    ///
    /// # Safety
    ///
    /// This API can be used to potentially create a driver to the same peripheral structure
    /// from multiple threads. The user must ensure that concurrent accesses are safe and do not
    /// interfere with each other.
    #[inline]
    pub const unsafe fn new_mmio_fixed() -> MmioEthernet<'static> {
        unsafe { Self::new_mmio_at(ETH_BASE_ADDR) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_offsets() {
        assert_eq!(core::mem::offset_of!(Ethernet, ctrl_status), 32 * 4);
        assert_eq!(core::mem::offset_of!(Ethernet, tx_descr_low), 33 * 4);
        assert_eq!(core::mem::offset_of!(Ethernet, tx_payload), 35 * 4);
        assert_eq!(core::mem::offset_of!(Ethernet, rx_descr_low), 36 * 4);
        assert_eq!(core::mem::offset_of!(Ethernet, rx_payload), 38 * 4);
        assert_eq!(core::mem::offset_of!(Ethernet, interrupt_pending), 39 * 4);
        assert_eq!(core::mem::offset_of!(Ethernet, tx_ether_type), 40 * 4);
    }

    #[test]
    fn single_fifo_control_fields_are_isolated() {
        let status = CtrlStatusSingleFifo::new_with_raw_value(0b11_1111);
        for mask in 0..16u8 {
            let modified = status.with_interrupt_enable(u4::new(mask));
            assert_eq!(modified.interrupt_enable().value(), mask);
            assert_eq!(modified.raw_value() & 0b11_1111, 0b11_1111);
            assert_eq!(modified.speed(), LinkSpeed::Mbps10);
            assert_eq!(modified.frame_mode(), FrameMode::Ieee8023);
        }
        let modified = status.with_speed(LinkSpeed::Mbps100);
        assert_eq!(modified.raw_value(), 0b100_0011_1111);
        let modified = status.with_frame_mode(FrameMode::EthernetII);
        assert_eq!(modified.raw_value(), 0b1000_0011_1111);
    }

    #[test]
    fn single_fifo_status_bits() {
        let status = CtrlStatusSingleFifo::DEFAULT
            .with_rx_empty(true)
            .with_tx_full(true)
            .with_tx_idle(true);
        assert_eq!(status.raw_value(), 0b10_1001);
        assert!(status.rx_empty());
        assert!(!status.rx_full());
        assert!(!status.tx_empty());
        assert!(status.tx_full());
        assert!(!status.rx_idle());
        assert!(status.tx_idle());
    }

    #[test]
    fn split_fifo_control_fields_are_isolated() {
        let status = CtrlStatusSplitFifo::new_with_raw_value(0x3FF);
        for mask in 0..16u8 {
            let modified = status.with_interrupt_enable(u4::new(mask));
            assert_eq!(modified.interrupt_enable().value(), mask);
            assert_eq!(modified.raw_value() & 0x3FF, 0x3FF);
        }
        let modified = status
            .with_speed(LinkSpeed::Mbps100)
            .with_frame_mode(FrameMode::EthernetII);
        assert_eq!(modified.raw_value(), 0xC3FF);
        assert_eq!(modified.with_speed(LinkSpeed::Mbps10).raw_value(), 0x83FF);
    }

    #[test]
    fn split_fifo_status_bits() {
        let status = CtrlStatusSplitFifo::DEFAULT
            .with_rx_payload_empty(true)
            .with_tx_payload_full(true)
            .with_rx_packet_empty(true)
            .with_tx_packet_full(true)
            .with_rx_idle(true);
        assert_eq!(status.raw_value(), 0b1_1001_1001);
        assert!(status.rx_payload_empty());
        assert!(status.tx_payload_full());
        assert!(status.rx_packet_empty());
        assert!(status.tx_packet_full());
        assert!(!status.tx_packet_empty());
        assert!(status.rx_idle());
        assert!(!status.tx_idle());
    }

    #[test]
    fn interrupt_pending_bits() {
        let pending = MacInterruptPending::new_with_raw_value(0b0110);
        assert!(!pending.phy_interrupt());
        assert!(pending.tx_done());
        assert!(pending.rx_done());
        assert!(!pending.rx_error());
        assert_eq!(pending.with_rx_error(true).raw_value(), 0b1110);
    }

    #[test]
    fn ether_type_register_masks_upper_bits() {
        let reg = EtherTypeRegister::new_with_raw_value(0xDEAD_0800);
        assert_eq!(reg.value(), 0x0800);
        assert_eq!(EtherTypeRegister::DEFAULT.with_value(0x86DD).raw_value(), 0x86DD);
    }
}
