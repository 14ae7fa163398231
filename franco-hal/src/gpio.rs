//! # GPIO driver
use core::convert::Infallible;

use franco::gpio::{MmioGpio, PIN_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid GPIO pin {0}, the group has {PIN_COUNT} pins")]
pub struct InvalidPin(pub u8);

/// Single input pin. Owns the GPIO group.
pub struct Input {
    regs: MmioGpio<'static>,
    mask: u32,
}

impl Input {
    /// Configures `pin` as input with its interrupt disabled.
    pub fn new(mut regs: MmioGpio<'static>, pin: u8) -> Result<Self, InvalidPin> {
        let mask = pin_mask(pin)?;
        regs.modify_interrupt_enable(|enable| enable & !mask);
        regs.modify_direction(|direction| direction | mask);
        Ok(Self { regs, mask })
    }

    #[inline]
    pub fn is_high(&mut self) -> bool {
        self.regs.read_value() & self.mask != 0
    }

    #[inline]
    pub fn release(self) -> MmioGpio<'static> {
        self.regs
    }
}

#[inline]
pub const fn pin_mask(pin: u8) -> Result<u32, InvalidPin> {
    if pin >= PIN_COUNT {
        return Err(InvalidPin(pin));
    }
    Ok(1 << pin)
}

impl embedded_hal::digital::ErrorType for Input {
    type Error = Infallible;
}

impl embedded_hal::digital::InputPin for Input {
    #[inline]
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(Input::is_high(self))
    }

    #[inline]
    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!Input::is_high(self))
    }
}
