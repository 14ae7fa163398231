//! # UART driver
//!
//! Blocking transmit-only driver used as the log sink. Reception is not supported.
use core::convert::Infallible;

use arbitrary_int::{Number, u15};
use franco::{
    SYSTEM_FREQUENCY_HZ,
    uart::{DataBits, MmioUart, Parity, Status, StopBits},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("baud rate {baud} can not be generated from the system clock")]
pub struct InvalidBaudRate {
    pub baud: u32,
}

/// Calculates the value of [Status::clock_divider] for the given baud rate.
pub const fn calculate_clock_divider(ref_clk_hz: u32, baud: u32) -> Result<u15, InvalidBaudRate> {
    if baud == 0 || baud > ref_clk_hz / 16 {
        return Err(InvalidBaudRate { baud });
    }
    let divider = ref_clk_hz / (16 * baud) - 1;
    if divider > u15::MAX.value() as u32 {
        return Err(InvalidBaudRate { baud });
    }
    Ok(u15::new(divider as u16))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartConfig {
    pub baud: u32,
    /// [None] disables the parity bit.
    pub parity: Option<Parity>,
    pub stop_bits: StopBits,
    pub data_bits: DataBits,
}

impl UartConfig {
    /// 8N1 configuration with the given baud rate.
    pub const fn new_with_baud(baud: u32) -> Self {
        Self {
            baud,
            parity: None,
            stop_bits: StopBits::One,
            data_bits: DataBits::Eight,
        }
    }

    pub fn status(&self) -> Result<Status, InvalidBaudRate> {
        let divider = calculate_clock_divider(SYSTEM_FREQUENCY_HZ, self.baud)?;
        Ok(Status::DEFAULT
            .with_clock_divider(divider)
            .with_data_bits(self.data_bits)
            .with_stop_bits(self.stop_bits)
            .with_parity_enable(self.parity.is_some())
            .with_parity_mode(self.parity.unwrap_or(Parity::Even))
            .with_tx_enable(true))
    }
}

pub struct Uart {
    regs: MmioUart<'static>,
}

// The driver owns the register block.
unsafe impl Send for Uart {}

impl Uart {
    /// Configures the UART and enables the transmitter. All UART interrupts are disabled.
    pub fn new(mut regs: MmioUart<'static>, config: UartConfig) -> Result<Self, InvalidBaudRate> {
        regs.write_status(config.status()?);
        Ok(Self { regs })
    }

    /// Spins while the TX buffer is full, then writes the byte.
    #[inline]
    pub fn write_byte_blocking(&mut self, byte: u8) {
        while self.regs.read_status().tx_full() {}
        self.regs.write_tx_buffer(u32::from(byte));
    }

    #[inline]
    pub fn release(self) -> MmioUart<'static> {
        self.regs
    }
}

impl embedded_io::ErrorType for Uart {
    type Error = Infallible;
}

impl embedded_io::Write for Uart {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        for &byte in buf {
            self.write_byte_blocking(byte);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        while !self.regs.read_status().tx_empty() {}
        Ok(())
    }
}
