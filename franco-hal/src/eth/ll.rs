//! Low-level register access for the Ethernet peripheral.
//!
//! All driver code talks to the hardware through the [RegisterSurface] trait. It is implemented
//! for the memory-mapped register block [franco::eth::MmioEthernet] and for the in-memory
//! [SimSurface](super::sim::SimSurface), which allows running the driver on a host.
use arbitrary_int::{u4, u5};
use franco::eth::{
    CtrlStatusSingleFifo, CtrlStatusSplitFifo, FrameMode, LinkSpeed, MacInterruptPending,
    MmioEthernet,
};

/// Primitive register operations of the Ethernet peripheral.
///
/// None of the operations block. Waiting on the FIFO status is done by the driver on top of
/// this trait.
pub trait RegisterSurface {
    /// Reads PHY register `reg`. Every call is a new transaction on the PHY window.
    fn phy_register(&mut self, reg: u5) -> u16;

    fn set_phy_register(&mut self, reg: u5, value: u16);

    /// Raw MAC control/status word. Use [MacGeneration] to decode it.
    fn ctrl_status(&mut self) -> u32;

    fn set_ctrl_status(&mut self, raw: u32);

    /// Pushes one byte into the TX payload FIFO.
    fn push_tx_byte(&mut self, byte: u8);

    /// Writes the TX descriptor, which hands the queued payload over to the framer.
    fn commit_tx_descriptor(&mut self, raw: u64);

    /// Pops one byte from the RX payload FIFO.
    fn pop_rx_byte(&mut self) -> u8;

    /// Descriptor of the oldest queued RX frame. The read has no side effects.
    fn rx_descriptor(&mut self) -> u64;

    fn interrupt_pending(&mut self) -> MacInterruptPending;

    fn set_interrupt_pending(&mut self, value: MacInterruptPending);

    fn set_tx_ether_type(&mut self, ether_type: u16);

    fn rx_ether_type(&mut self) -> u16;

    /// MAC generation the surface is built for, if the surface knows it. The memory-mapped
    /// block cannot tell the generations apart.
    #[inline]
    fn fixed_generation(&self) -> Option<MacGeneration> {
        None
    }
}

impl<T: RegisterSurface + ?Sized> RegisterSurface for &mut T {
    #[inline]
    fn phy_register(&mut self, reg: u5) -> u16 {
        (**self).phy_register(reg)
    }

    #[inline]
    fn set_phy_register(&mut self, reg: u5, value: u16) {
        (**self).set_phy_register(reg, value)
    }

    #[inline]
    fn ctrl_status(&mut self) -> u32 {
        (**self).ctrl_status()
    }

    #[inline]
    fn set_ctrl_status(&mut self, raw: u32) {
        (**self).set_ctrl_status(raw)
    }

    #[inline]
    fn push_tx_byte(&mut self, byte: u8) {
        (**self).push_tx_byte(byte)
    }

    #[inline]
    fn commit_tx_descriptor(&mut self, raw: u64) {
        (**self).commit_tx_descriptor(raw)
    }

    #[inline]
    fn pop_rx_byte(&mut self) -> u8 {
        (**self).pop_rx_byte()
    }

    #[inline]
    fn rx_descriptor(&mut self) -> u64 {
        (**self).rx_descriptor()
    }

    #[inline]
    fn interrupt_pending(&mut self) -> MacInterruptPending {
        (**self).interrupt_pending()
    }

    #[inline]
    fn set_interrupt_pending(&mut self, value: MacInterruptPending) {
        (**self).set_interrupt_pending(value)
    }

    #[inline]
    fn set_tx_ether_type(&mut self, ether_type: u16) {
        (**self).set_tx_ether_type(ether_type)
    }

    #[inline]
    fn rx_ether_type(&mut self) -> u16 {
        (**self).rx_ether_type()
    }

    #[inline]
    fn fixed_generation(&self) -> Option<MacGeneration> {
        (**self).fixed_generation()
    }
}

impl RegisterSurface for MmioEthernet<'_> {
    #[inline]
    fn phy_register(&mut self, reg: u5) -> u16 {
        // The PHY window is the first field of the register block.
        let window = unsafe { self.ptr() } as *const u32;
        let raw = unsafe { core::ptr::read_volatile(window.add(usize::from(reg.value()))) };
        (raw & 0xFFFF) as u16
    }

    #[inline]
    fn set_phy_register(&mut self, reg: u5, value: u16) {
        let window = unsafe { self.ptr() } as *mut u32;
        unsafe {
            core::ptr::write_volatile(window.add(usize::from(reg.value())), u32::from(value))
        };
    }

    #[inline]
    fn ctrl_status(&mut self) -> u32 {
        self.read_ctrl_status()
    }

    #[inline]
    fn set_ctrl_status(&mut self, raw: u32) {
        self.write_ctrl_status(raw);
    }

    #[inline]
    fn push_tx_byte(&mut self, byte: u8) {
        // Byte access, a word write would push the full word into the FIFO.
        unsafe { core::ptr::write_volatile(self.pointer_to_tx_payload() as *mut u8, byte) };
    }

    #[inline]
    fn commit_tx_descriptor(&mut self, raw: u64) {
        self.write_tx_descr_low(raw as u32);
        self.write_tx_descr_high((raw >> 32) as u32);
    }

    #[inline]
    fn pop_rx_byte(&mut self) -> u8 {
        unsafe { core::ptr::read_volatile(self.pointer_to_rx_payload() as *const u8) }
    }

    #[inline]
    fn rx_descriptor(&mut self) -> u64 {
        let low = self.read_rx_descr_low();
        let high = self.read_rx_descr_high();
        (u64::from(high) << 32) | u64::from(low)
    }

    #[inline]
    fn interrupt_pending(&mut self) -> MacInterruptPending {
        self.read_interrupt_pending()
    }

    #[inline]
    fn set_interrupt_pending(&mut self, value: MacInterruptPending) {
        self.write_interrupt_pending(value);
    }

    #[inline]
    fn set_tx_ether_type(&mut self, ether_type: u16) {
        self.write_tx_ether_type(franco::eth::EtherTypeRegister::DEFAULT.with_value(ether_type));
    }

    #[inline]
    fn rx_ether_type(&mut self) -> u16 {
        self.read_rx_ether_type().value()
    }
}

/// Hardware generation of the MAC.
///
/// Both generations share the register map and only differ in the layout of the
/// control/status word.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MacGeneration {
    /// One combined FIFO per direction. The packet queue flags mirror the payload FIFO flags.
    SingleFifo,
    /// Separate payload and packet descriptor FIFOs per direction.
    #[default]
    SplitFifo,
}

/// Generation independent snapshot of the MAC control/status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacStatus {
    pub tx_payload_empty: bool,
    pub tx_payload_full: bool,
    pub rx_payload_empty: bool,
    pub rx_payload_full: bool,
    pub tx_packet_empty: bool,
    pub tx_packet_full: bool,
    pub rx_packet_empty: bool,
    pub rx_packet_full: bool,
    pub tx_idle: bool,
    pub rx_idle: bool,
    pub control: MacControl,
}

/// Software controlled fields of the MAC control/status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacControl {
    pub interrupt_enable: u4,
    pub speed: LinkSpeed,
    pub frame_mode: FrameMode,
}

impl MacGeneration {
    pub fn decode_status(&self, raw: u32) -> MacStatus {
        match self {
            MacGeneration::SingleFifo => {
                let reg = CtrlStatusSingleFifo::new_with_raw_value(raw);
                MacStatus {
                    tx_payload_empty: reg.tx_empty(),
                    tx_payload_full: reg.tx_full(),
                    rx_payload_empty: reg.rx_empty(),
                    rx_payload_full: reg.rx_full(),
                    tx_packet_empty: reg.tx_empty(),
                    tx_packet_full: reg.tx_full(),
                    rx_packet_empty: reg.rx_empty(),
                    rx_packet_full: reg.rx_full(),
                    tx_idle: reg.tx_idle(),
                    rx_idle: reg.rx_idle(),
                    control: MacControl {
                        interrupt_enable: reg.interrupt_enable(),
                        speed: reg.speed(),
                        frame_mode: reg.frame_mode(),
                    },
                }
            }
            MacGeneration::SplitFifo => {
                let reg = CtrlStatusSplitFifo::new_with_raw_value(raw);
                MacStatus {
                    tx_payload_empty: reg.tx_payload_empty(),
                    tx_payload_full: reg.tx_payload_full(),
                    rx_payload_empty: reg.rx_payload_empty(),
                    rx_payload_full: reg.rx_payload_full(),
                    tx_packet_empty: reg.tx_packet_empty(),
                    tx_packet_full: reg.tx_packet_full(),
                    rx_packet_empty: reg.rx_packet_empty(),
                    rx_packet_full: reg.rx_packet_full(),
                    tx_idle: reg.tx_idle(),
                    rx_idle: reg.rx_idle(),
                    control: MacControl {
                        interrupt_enable: reg.interrupt_enable(),
                        speed: reg.speed(),
                        frame_mode: reg.frame_mode(),
                    },
                }
            }
        }
    }

    /// Returns `raw` with the control fields replaced by `control`. All other bits are kept.
    pub fn encode_control(&self, raw: u32, control: MacControl) -> u32 {
        match self {
            MacGeneration::SingleFifo => CtrlStatusSingleFifo::new_with_raw_value(raw)
                .with_interrupt_enable(control.interrupt_enable)
                .with_speed(control.speed)
                .with_frame_mode(control.frame_mode)
                .raw_value(),
            MacGeneration::SplitFifo => CtrlStatusSplitFifo::new_with_raw_value(raw)
                .with_interrupt_enable(control.interrupt_enable)
                .with_speed(control.speed)
                .with_frame_mode(control.frame_mode)
                .raw_value(),
        }
    }
}

/// Ethernet low-level interface.
///
/// Basic building block for higher-level abstraction. It binds a [RegisterSurface] to the
/// [MacGeneration] used to interpret the control/status word.
pub struct EthernetLowLevel<R> {
    generation: MacGeneration,
    /// Register surface. Direct public access is allowed to allow low-level operations.
    pub regs: R,
}

impl<R: RegisterSurface> EthernetLowLevel<R> {
    #[inline]
    pub const fn new(regs: R, generation: MacGeneration) -> Self {
        Self { generation, regs }
    }

    #[inline]
    pub const fn generation(&self) -> MacGeneration {
        self.generation
    }

    #[inline]
    pub fn status(&mut self) -> MacStatus {
        self.generation.decode_status(self.regs.ctrl_status())
    }

    /// Read-modify-write of the control fields of the control/status word.
    pub fn modify_control(&mut self, f: impl FnOnce(MacControl) -> MacControl) {
        let raw = self.regs.ctrl_status();
        let control = self.generation.decode_status(raw).control;
        let raw = self.generation.encode_control(raw, f(control));
        self.regs.set_ctrl_status(raw);
    }

    pub fn set_speed(&mut self, speed: LinkSpeed) {
        self.modify_control(|mut ctrl| {
            ctrl.speed = speed;
            ctrl
        });
    }

    pub fn set_frame_mode(&mut self, frame_mode: FrameMode) {
        self.modify_control(|mut ctrl| {
            ctrl.frame_mode = frame_mode;
            ctrl
        });
    }

    pub fn set_interrupt_enable(&mut self, mask: u4) {
        self.modify_control(|mut ctrl| {
            ctrl.interrupt_enable = mask;
            ctrl
        });
    }

    /// Clears all pending MAC interrupt events.
    #[inline]
    pub fn clear_interrupts(&mut self) {
        self.regs
            .set_interrupt_pending(MacInterruptPending::new_with_raw_value(0));
    }

    /// Spins until the TX payload FIFO can accept a byte.
    ///
    /// This call may not return if the hardware never drains the FIFO.
    #[inline]
    pub fn wait_tx_payload_not_full(&mut self) {
        while self.status().tx_payload_full {}
    }

    /// Spins until the RX payload FIFO holds a byte.
    ///
    /// This call may not return if the hardware never fills the FIFO.
    #[inline]
    pub fn wait_rx_payload_not_empty(&mut self) {
        while self.status().rx_payload_empty {}
    }
}
