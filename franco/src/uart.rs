//! # UART register module.
use arbitrary_int::{u5, u15};

/// Number of data bits per UART frame.
#[bitbybit::bitenum(u2, exhaustive = true)]
#[derive(Debug, PartialEq, Eq)]
pub enum DataBits {
    Five = 0,
    Six = 1,
    Seven = 2,
    Eight = 3,
}

#[bitbybit::bitenum(u1, exhaustive = true)]
#[derive(Debug, PartialEq, Eq)]
pub enum StopBits {
    One = 0,
    Two = 1,
}

#[bitbybit::bitenum(u1, exhaustive = true)]
#[derive(Debug, PartialEq, Eq)]
pub enum Parity {
    Even = 0,
    Odd = 1,
}

/// Combined configuration and FIFO status register.
#[bitbybit::bitfield(u32, default = 0x0, debug)]
#[derive(PartialEq, Eq)]
pub struct Status {
    /// Baud rate divider: `f_sys / (16 * baud) - 1`.
    #[bits(17..=31, rw)]
    clock_divider: u15,
    /// CTS/RTS flow control.
    #[bit(16, rw)]
    flow_control: bool,
    #[bits(14..=15, rw)]
    data_bits: DataBits,
    #[bit(13, rw)]
    stop_bits: StopBits,
    #[bit(12, rw)]
    parity_mode: Parity,
    #[bit(11, rw)]
    parity_enable: bool,
    #[bit(10, rw)]
    tx_enable: bool,
    #[bit(9, rw)]
    rx_enable: bool,
    /// One enable bit per [Event].
    #[bits(4..=8, rw)]
    interrupt_enable: u5,
    #[bit(3, r)]
    tx_full: bool,
    #[bit(2, r)]
    tx_empty: bool,
    #[bit(1, r)]
    rx_full: bool,
    #[bit(0, r)]
    rx_empty: bool,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
#[derive(PartialEq, Eq)]
pub struct Event {
    #[bit(5, r)]
    parity_error: bool,
    #[bit(4, r)]
    tx_empty: bool,
    #[bit(3, r)]
    rx_full: bool,
    #[bit(2, r)]
    data_tx: bool,
    #[bit(1, r)]
    data_rx: bool,
}

/// UART register access.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct Uart {
    status: Status,
    /// Only the lower byte is used.
    #[mmio(Write)]
    tx_buffer: u32,
    /// Each read pops one byte. Only the lower byte is used.
    #[mmio(Read)]
    rx_buffer: u32,
    #[mmio(PureRead)]
    event: Event,
}

static_assertions::const_assert_eq!(core::mem::size_of::<Uart>(), 0x10);

impl Uart {
    /// Create a new UART MMIO instance at the fixed address [super::UART_BASE_ADDR].
    ///
    /// # Safety
    ///
    /// This API can be used to potentially create a driver to the same peripheral structure
    /// from multiple threads. The user must ensure that concurrent accesses are safe and do not
    /// interfere with each other.
    #[inline]
    pub const unsafe fn new_mmio_fixed() -> MmioUart<'static> {
        unsafe { Self::new_mmio_at(super::UART_BASE_ADDR) }
    }
}
