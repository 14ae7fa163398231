//! # Timer driver
//!
//! The timer provides the [DelayNs] implementation: each delay runs the timer in one-shot
//! mode and spins until it halts.
use embedded_hal::delay::DelayNs;
use franco::{
    SYSTEM_FREQUENCY_HZ,
    timer::{Config, MmioTimer, TimerMode},
};

/// Timer ticks per millisecond.
pub const TICKS_PER_MS: u64 = SYSTEM_FREQUENCY_HZ as u64 / 1000;

/// Converts nanoseconds to timer ticks, rounding up.
#[inline]
pub const fn ns_to_ticks(ns: u32) -> u64 {
    (ns as u64 * TICKS_PER_MS).div_ceil(1_000_000)
}

pub struct Timer {
    regs: MmioTimer<'static>,
}

impl Timer {
    /// Stops the timer and disables its interrupt.
    pub fn new(mut regs: MmioTimer<'static>) -> Self {
        regs.write_config(Config::DEFAULT);
        Self { regs }
    }

    /// Current counter value.
    pub fn value(&mut self) -> u64 {
        loop {
            let high = self.regs.read_value_high();
            let low = self.regs.read_value_low();
            if self.regs.read_value_high() == high {
                return (u64::from(high) << 32) | u64::from(low);
            }
        }
    }

    pub fn set_value(&mut self, value: u64) {
        self.regs.write_value_low(value as u32);
        self.regs.write_value_high((value >> 32) as u32);
    }

    pub fn set_threshold(&mut self, threshold: u64) {
        self.regs.write_threshold_low(threshold as u32);
        self.regs.write_threshold_high((threshold >> 32) as u32);
    }

    #[inline]
    pub fn start(&mut self, mode: TimerMode) {
        self.regs
            .modify_config(|config| config.with_mode(mode).with_enable(true));
    }

    #[inline]
    pub fn stop(&mut self) {
        self.regs.modify_config(|config| config.with_enable(false));
    }

    /// Spins for `ticks` system clock cycles.
    pub fn delay_ticks(&mut self, ticks: u64) {
        if ticks == 0 {
            return;
        }
        self.stop();
        self.set_value(0);
        self.set_threshold(ticks);
        self.start(TimerMode::OneShot);
        while !self.regs.read_config().halted() {}
    }

    #[inline]
    pub fn release(self) -> MmioTimer<'static> {
        self.regs
    }
}

impl DelayNs for Timer {
    fn delay_ns(&mut self, ns: u32) {
        self.delay_ticks(ns_to_ticks(ns));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay_ticks(u64::from(ms) * TICKS_PER_MS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_conversion() {
        assert_eq!(TICKS_PER_MS, 100_000);
        assert_eq!(ns_to_ticks(0), 0);
        assert_eq!(ns_to_ticks(10), 1);
        assert_eq!(ns_to_ticks(11), 2);
        assert_eq!(ns_to_ticks(1_000_000), TICKS_PER_MS);
        assert_eq!(ns_to_ticks(u32::MAX), 429_496_730);
    }
}
