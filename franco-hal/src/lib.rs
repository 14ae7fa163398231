//! # HAL for the Franco SoC
//!
//! This crate contains the **H**ardware **A**bstraction **L**ayer (HAL), which is an additional
//! hardware abstraction on top of the [peripheral access API](franco).
//!
//! The main component is the [Ethernet driver](eth), which drives the on-chip MAC and the
//! external 10/100 Mbps PHY without DMA: every frame byte passes through a byte-wide FIFO
//! port under software control. The [UART](uart), [timer](timer) and [GPIO](gpio) drivers
//! provide the log sink, the delay and the input pins used next to it.
#![no_std]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod eth;
pub mod gpio;
pub mod log;
pub mod timer;
pub mod uart;

pub use franco as pac;
