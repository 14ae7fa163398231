//! # Timer register module.
//!
//! 64-bit up-counter running at the system clock. The threshold and value registers are
//! split into two words, low word first.

#[bitbybit::bitenum(u1, exhaustive = true)]
#[derive(Debug, PartialEq, Eq)]
pub enum TimerMode {
    /// Keeps counting after the threshold was reached.
    FreeRunning = 0,
    /// Stops and sets [Config::halted] once the threshold is reached.
    OneShot = 1,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
#[derive(PartialEq, Eq)]
pub struct Config {
    #[bit(3, r)]
    halted: bool,
    #[bit(2, rw)]
    interrupt_enable: bool,
    #[bit(1, rw)]
    mode: TimerMode,
    #[bit(0, rw)]
    enable: bool,
}

/// Timer register access.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct Timer {
    threshold_low: u32,
    threshold_high: u32,
    value_low: u32,
    value_high: u32,
    config: Config,
}

static_assertions::const_assert_eq!(core::mem::size_of::<Timer>(), 0x14);

impl Timer {
    /// Create a new timer MMIO instance at the fixed address [super::TIMER_BASE_ADDR].
    ///
    /// # Safety
    ///
    /// This API can be used to potentially create a driver to the same peripheral structure
    /// from multiple threads. The user must ensure that concurrent accesses are safe and do not
    /// interfere with each other.
    #[inline]
    pub const unsafe fn new_mmio_fixed() -> MmioTimer<'static> {
        unsafe { Self::new_mmio_at(super::TIMER_BASE_ADDR) }
    }
}
