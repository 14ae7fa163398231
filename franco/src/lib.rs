//! # Rust peripheral access crate (PAC) for the Franco SoC
//!
//! This crate contains the raw register definitions of the on-chip peripherals which are
//! driven by the [HAL crate](../franco_hal/index.html). The register blocks are defined with
//! [derive_mmio] and the register fields with [bitbybit].
//!
//! All peripherals live inside a single memory-mapped region starting at [MMIO_BASE_ADDR].
#![no_std]

use core::sync::atomic::{AtomicBool, Ordering};

pub mod eth;
pub mod gpio;
pub mod timer;
pub mod uart;

/// Start of the memory-mapped peripheral region.
pub const MMIO_BASE_ADDR: usize = 0x0000_0800;
/// Address distance between two consecutive peripheral slots.
pub const PERIPHERAL_INTERLEAVE: usize = 128;

pub const UART_BASE_ADDR: usize = MMIO_BASE_ADDR;
pub const TIMER_BASE_ADDR: usize = MMIO_BASE_ADDR + PERIPHERAL_INTERLEAVE;
pub const GPIO_BASE_ADDR: usize = MMIO_BASE_ADDR + 2 * PERIPHERAL_INTERLEAVE;

/// Core system frequency in Hz.
pub const SYSTEM_FREQUENCY_HZ: u32 = 100_000_000;

static PERIPHERALS_TAKEN: AtomicBool = AtomicBool::new(false);

/// Owned peripheral register blocks.
pub struct Peripherals {
    pub uart: uart::MmioUart<'static>,
    pub timer: timer::MmioTimer<'static>,
    pub gpio: gpio::MmioGpio<'static>,
    pub eth: eth::MmioEthernet<'static>,
}

impl Peripherals {
    /// Returns the peripheral singleton once. Subsequent calls return [None].
    pub fn take() -> Option<Self> {
        if PERIPHERALS_TAKEN.swap(true, Ordering::Relaxed) {
            return None;
        }
        Some(unsafe { Self::steal() })
    }

    /// # Safety
    ///
    /// Circumvents the ownership guarantees of [Self::take]. The user must ensure that the
    /// register blocks are not accessed concurrently.
    pub unsafe fn steal() -> Self {
        Self {
            uart: unsafe { uart::Uart::new_mmio_fixed() },
            timer: unsafe { timer::Timer::new_mmio_fixed() },
            gpio: unsafe { gpio::Gpio::new_mmio_fixed() },
            eth: unsafe { eth::Ethernet::new_mmio_fixed() },
        }
    }
}
