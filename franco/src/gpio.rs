//! # GPIO register module.
//!
//! One group of [PIN_COUNT] pins. Every register holds one bit per pin in its lower byte.

pub const PIN_COUNT: u8 = 8;

/// GPIO register access.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct Gpio {
    /// Pin level. Writes only affect output pins.
    value: u32,
    /// 1 configures the pin as input.
    direction: u32,
    interrupt_enable: u32,
    /// 1 triggers on the rising edge, 0 on the falling edge.
    trigger_level: u32,
}

static_assertions::const_assert_eq!(core::mem::size_of::<Gpio>(), 0x10);

impl Gpio {
    /// Create a new GPIO MMIO instance at the fixed address [super::GPIO_BASE_ADDR].
    ///
    /// # Safety
    ///
    /// This API can be used to potentially create a driver to the same peripheral structure
    /// from multiple threads. The user must ensure that concurrent accesses are safe and do not
    /// interfere with each other.
    #[inline]
    pub const unsafe fn new_mmio_fixed() -> MmioGpio<'static> {
        unsafe { Self::new_mmio_at(super::GPIO_BASE_ADDR) }
    }
}
