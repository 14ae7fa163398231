//! Ethernet packet loop on the Franco board.
//!
//! Logs to the UART at 115200 baud. Pull GPIO pin 4 high to advance to the next pass.
#![no_std]
#![no_main]

use core::panic::PanicInfo;

use ethernet_demo::{DemoConfig, EXIT_PIN};
use franco::Peripherals;
use franco_hal::{
    eth::{Ethernet, MacGeneration},
    gpio::Input,
    log::sink_blocking,
    timer::Timer,
    uart::{Uart, UartConfig},
};
use log::{LevelFilter, error, info};
use static_cell::StaticCell;

const BAUD: u32 = 115_200;

static UART: StaticCell<Uart> = StaticCell::new();

/// Interrupts are only masked in machine mode, the board runs a single hart.
struct SingleHartCriticalSection;
critical_section::set_impl!(SingleHartCriticalSection);

unsafe impl critical_section::Impl for SingleHartCriticalSection {
    unsafe fn acquire() -> critical_section::RawRestoreState {
        let mstatus: usize;
        // Clears MIE and returns the previous mstatus.
        unsafe { core::arch::asm!("csrrci {}, mstatus, 0b1000", out(reg) mstatus) };
        mstatus & 0b1000 != 0
    }

    unsafe fn release(was_enabled: critical_section::RawRestoreState) {
        if was_enabled {
            unsafe { core::arch::asm!("csrsi mstatus, 0b1000") };
        }
    }
}

/// Entry point (called by the board startup code)
#[unsafe(no_mangle)]
pub extern "C" fn main() -> ! {
    let Some(dp) = Peripherals::take() else {
        panic!("peripherals already taken");
    };
    let uart = match Uart::new(dp.uart, UartConfig::new_with_baud(BAUD)) {
        Ok(uart) => uart,
        Err(e) => panic!("{}", e),
    };
    if sink_blocking::init_with_locks(UART.init(uart), LevelFilter::Info).is_err() {
        panic!("logger already installed");
    }
    let mut timer = Timer::new(dp.timer);
    let mut exit_pin = match Input::new(dp.gpio, EXIT_PIN) {
        Ok(pin) => pin,
        Err(e) => panic!("{}", e),
    };
    let mut eth = Ethernet::new(dp.eth, MacGeneration::SplitFifo);

    let stats = ethernet_demo::run(&mut eth, &mut timer, &mut exit_pin, &DemoConfig::default());
    info!("-- All passes done: {:?} --", stats);
    drop(eth);
    loop {
        core::hint::spin_loop();
    }
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    error!("Panic: {info:?}");
    loop {}
}
