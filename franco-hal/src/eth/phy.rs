//! # PHY controller
//!
//! Driver for the LAN8720A class 10/100 Mbps PHY attached to the MAC. The PHY registers are
//! mapped into the first 32 words of the Ethernet register block, so every access is a single
//! register transaction. Nothing is cached in software.
//!
//! State changes like the reset or the auto-negotiation process take time to settle inside the
//! PHY. The driver never waits for them: callers poll [Phy::is_linked] or insert a delay.
use arbitrary_int::{u2, u3, u4, u5, u6, u7};
use franco::eth::LinkSpeed;
use num_enum::TryFromPrimitive;

use super::{EthError, ll::RegisterSurface};

/// Populated PHY register addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PhyRegister {
    BasicControl = 0,
    BasicStatus = 1,
    Identifier1 = 2,
    Identifier2 = 3,
    AutoNegAdvertisement = 4,
    AutoNegLinkPartnerAbility = 5,
    AutoNegExpansion = 6,
    ModeControlStatus = 17,
    SpecialModes = 18,
    SymbolErrorCounter = 26,
    SpecialControlStatusIndications = 27,
    InterruptSource = 29,
    InterruptMask = 30,
    SpecialControlStatus = 31,
}

impl PhyRegister {
    pub const ALL: [PhyRegister; 14] = [
        PhyRegister::BasicControl,
        PhyRegister::BasicStatus,
        PhyRegister::Identifier1,
        PhyRegister::Identifier2,
        PhyRegister::AutoNegAdvertisement,
        PhyRegister::AutoNegLinkPartnerAbility,
        PhyRegister::AutoNegExpansion,
        PhyRegister::ModeControlStatus,
        PhyRegister::SpecialModes,
        PhyRegister::SymbolErrorCounter,
        PhyRegister::SpecialControlStatusIndications,
        PhyRegister::InterruptSource,
        PhyRegister::InterruptMask,
        PhyRegister::SpecialControlStatus,
    ];

    #[inline]
    pub const fn addr(&self) -> u5 {
        u5::new(*self as u8)
    }

    pub const fn name(&self) -> &'static str {
        match self {
            PhyRegister::BasicControl => "BASIC CONTROL",
            PhyRegister::BasicStatus => "BASIC STATUS",
            PhyRegister::Identifier1 => "PHY IDENTIFIER 1",
            PhyRegister::Identifier2 => "PHY IDENTIFIER 2",
            PhyRegister::AutoNegAdvertisement => "AUTO NEGOTIATION ADVERTISEMENT",
            PhyRegister::AutoNegLinkPartnerAbility => "AUTO NEGOTIATION LINK PARTNER ABILITY",
            PhyRegister::AutoNegExpansion => "AUTO NEGOTIATION EXPANSION",
            PhyRegister::ModeControlStatus => "MODE CONTROL/STATUS",
            PhyRegister::SpecialModes => "SPECIAL MODES",
            PhyRegister::SymbolErrorCounter => "SYMBOL ERROR COUNTER",
            PhyRegister::SpecialControlStatusIndications => {
                "SPECIAL CONTROL/STATUS INDICATIONS"
            }
            PhyRegister::InterruptSource => "INTERRUPT SOURCE",
            PhyRegister::InterruptMask => "INTERRUPT MASK",
            PhyRegister::SpecialControlStatus => "PHY SPECIAL CONTROL/STATUS",
        }
    }
}

#[bitbybit::bitenum(u1, exhaustive = true)]
#[derive(Debug, PartialEq, Eq)]
pub enum Duplex {
    Half = 0,
    Full = 1,
}

/// Cable crossover mode.
#[bitbybit::bitenum(u1, exhaustive = true)]
#[derive(Debug, PartialEq, Eq)]
pub enum Channel {
    Mdi = 0,
    MdiX = 1,
}

/// Register 0.
#[bitbybit::bitfield(u16, default = 0x0, debug)]
#[derive(PartialEq, Eq)]
pub struct BasicControl {
    /// Self-clearing.
    #[bit(15, rw)]
    reset: bool,
    /// Near-end loopback, TX is redirected to RX.
    #[bit(14, rw)]
    loopback: bool,
    /// Ignored if auto-negotiation is enabled.
    #[bit(13, rw)]
    speed_select: LinkSpeed,
    #[bit(12, rw)]
    auto_negotiation_enable: bool,
    /// Auto-negotiation enable must be cleared before setting this bit.
    #[bit(11, rw)]
    power_down: bool,
    /// Electrical isolation of the PHY from the RMII.
    #[bit(10, rw)]
    isolate: bool,
    /// Self-clearing.
    #[bit(9, rw)]
    restart_auto_negotiation: bool,
    /// Ignored if auto-negotiation is enabled.
    #[bit(8, rw)]
    duplex: Duplex,
    #[bit(7, rw)]
    collision_test: bool,
}

/// Register 1.
#[bitbybit::bitfield(u16, default = 0x0, debug)]
#[derive(PartialEq, Eq)]
pub struct BasicStatus {
    #[bit(15, r)]
    base100_t4: bool,
    #[bit(14, r)]
    base100_tx_full_duplex: bool,
    #[bit(13, r)]
    base100_tx_half_duplex: bool,
    #[bit(12, r)]
    base10_t_full_duplex: bool,
    #[bit(11, r)]
    base10_t_half_duplex: bool,
    #[bit(10, r)]
    base100_t2_full_duplex: bool,
    #[bit(9, r)]
    base100_t2_half_duplex: bool,
    #[bit(8, r)]
    extended_status: bool,
    #[bit(5, r)]
    auto_negotiation_complete: bool,
    #[bit(4, r)]
    remote_fault: bool,
    #[bit(3, r)]
    auto_negotiation_ability: bool,
    #[bit(2, r)]
    link_status: bool,
    #[bit(1, r)]
    jabber_detect: bool,
    #[bit(0, r)]
    extended_capabilities: bool,
}

/// Register 3. Register 2 holds bits 3 to 18 of the OUI.
#[bitbybit::bitfield(u16, default = 0x0, debug)]
#[derive(PartialEq, Eq)]
pub struct Identifier2 {
    /// Bits 19 to 24 of the OUI.
    #[bits(10..=15, r)]
    oui_low: u6,
    #[bits(4..=9, r)]
    model: u6,
    #[bits(0..=3, r)]
    revision: u4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhyIdentifier {
    /// Bits 3 to 24 of the organizationally unique identifier.
    pub oui: u32,
    pub model: u6,
    pub revision: u4,
}

impl PhyIdentifier {
    /// Model number of the LAN8720A.
    pub const LAN8720A_MODEL: u8 = 0x0F;

    pub fn new(id1: u16, id2: u16) -> Self {
        let id2 = Identifier2::new_with_raw_value(id2);
        Self {
            oui: (u32::from(id1) << 6) | u32::from(id2.oui_low().value()),
            model: id2.model(),
            revision: id2.revision(),
        }
    }
}

/// Registers 4 and 5. The advertisement register holds the local abilities, the link
/// partner ability register the abilities received from the link partner.
#[bitbybit::bitfield(u16, default = 0x0, debug)]
#[derive(PartialEq, Eq)]
pub struct AutoNegAbility {
    #[bit(15, rw)]
    next_page: bool,
    /// Only used by the link partner ability register.
    #[bit(14, rw)]
    acknowledge: bool,
    #[bit(13, rw)]
    remote_fault: bool,
    #[bits(10..=11, rw)]
    pause: u2,
    #[bit(8, rw)]
    base100_tx_full_duplex: bool,
    #[bit(7, rw)]
    base100_tx: bool,
    #[bit(6, rw)]
    base10_t_full_duplex: bool,
    #[bit(5, rw)]
    base10_t: bool,
    /// Always 0b00001 for IEEE 802.3.
    #[bits(0..=4, rw)]
    selector: u5,
}

/// Register 6.
#[bitbybit::bitfield(u16, default = 0x0, debug)]
#[derive(PartialEq, Eq)]
pub struct AutoNegExpansion {
    #[bit(4, r)]
    parallel_detection_fault: bool,
    #[bit(3, r)]
    link_partner_next_page_able: bool,
    #[bit(2, r)]
    next_page_able: bool,
    #[bit(1, r)]
    page_received: bool,
    #[bit(0, r)]
    link_partner_auto_negotiation_able: bool,
}

/// Register 17.
#[bitbybit::bitfield(u16, default = 0x0, debug)]
#[derive(PartialEq, Eq)]
pub struct ModeControlStatus {
    #[bit(13, rw)]
    energy_detect_power_down: bool,
    #[bit(9, rw)]
    far_loopback: bool,
    #[bit(6, rw)]
    alternate_interrupt_mode: bool,
    /// Energy detected on the line.
    #[bit(1, r)]
    energy_on: bool,
}

/// Register 18.
#[bitbybit::bitfield(u16, default = 0x0, debug)]
#[derive(PartialEq, Eq)]
pub struct SpecialModes {
    #[bits(5..=7, rw)]
    mode: u3,
    #[bits(0..=4, rw)]
    phy_address: u5,
}

/// Register 27.
#[bitbybit::bitfield(u16, default = 0x0, debug)]
#[derive(PartialEq, Eq)]
pub struct SpecialControlStatusIndications {
    /// Auto-MDIX is disabled and [Self::channel_select] is used when set.
    #[bit(15, rw)]
    manual_mdix: bool,
    #[bit(13, rw)]
    channel_select: Channel,
    /// Disables the SQE (heartbeat) test.
    #[bit(11, rw)]
    sqe_off: bool,
    /// 10BASE-T polarity is reversed.
    #[bit(4, r)]
    polarity_reversed: bool,
}

/// Register 29. Reading the register clears the pending events, see [Phy::interrupt_source].
#[bitbybit::bitfield(u16, default = 0x0, debug)]
#[derive(PartialEq, Eq)]
pub struct InterruptSource {
    #[bit(7, rw)]
    energy_on: bool,
    #[bit(6, rw)]
    auto_negotiation_complete: bool,
    #[bit(5, rw)]
    remote_fault: bool,
    #[bit(4, rw)]
    link_down: bool,
    #[bit(3, rw)]
    auto_negotiation_lp_acknowledge: bool,
    #[bit(2, rw)]
    parallel_detection_fault: bool,
    #[bit(1, rw)]
    auto_negotiation_page_received: bool,
}

/// Register 30. Same bit positions as [InterruptSource].
#[bitbybit::bitfield(u16, default = 0x0, debug)]
#[derive(PartialEq, Eq)]
pub struct InterruptMask {
    /// One bit per [PhyEvent], starting with [PhyEvent::AutoNegPageReceived].
    #[bits(1..=7, rw)]
    mask: u7,
}

/// PHY interrupt event. The value is the index used by [Phy::set_phy_interrupt].
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum PhyEvent {
    AutoNegPageReceived = 0,
    ParallelDetectionFault = 1,
    AutoNegLpAcknowledge = 2,
    LinkDown = 3,
    RemoteFault = 4,
    AutoNegComplete = 5,
    EnergyOn = 6,
}

/// Resolved speed and duplex after auto-negotiation or forcing.
#[bitbybit::bitenum(u3, exhaustive = false)]
#[derive(Debug, PartialEq, Eq)]
pub enum SpeedIndication {
    HalfDuplex10 = 0b001,
    FullDuplex10 = 0b101,
    HalfDuplex100 = 0b010,
    FullDuplex100 = 0b110,
}

impl SpeedIndication {
    pub const fn speed(&self) -> LinkSpeed {
        match self {
            SpeedIndication::HalfDuplex10 | SpeedIndication::FullDuplex10 => LinkSpeed::Mbps10,
            SpeedIndication::HalfDuplex100 | SpeedIndication::FullDuplex100 => LinkSpeed::Mbps100,
        }
    }

    pub const fn duplex(&self) -> Duplex {
        match self {
            SpeedIndication::HalfDuplex10 | SpeedIndication::HalfDuplex100 => Duplex::Half,
            SpeedIndication::FullDuplex10 | SpeedIndication::FullDuplex100 => Duplex::Full,
        }
    }
}

/// Register 31.
#[bitbybit::bitfield(u16, default = 0x0, debug)]
#[derive(PartialEq, Eq)]
pub struct SpecialControlStatus {
    #[bit(12, r)]
    auto_done: bool,
    #[bits(2..=4, r)]
    speed_indication: Option<SpeedIndication>,
}

/// PHY controller.
///
/// The controller borrows or owns a [RegisterSurface]. A `Phy<&mut R>` can be created from
/// the [Ethernet](super::Ethernet) driver with [Ethernet::phy](super::Ethernet::phy).
pub struct Phy<R> {
    regs: R,
}

impl<R: RegisterSurface> Phy<R> {
    #[inline]
    pub const fn new(regs: R) -> Self {
        Self { regs }
    }

    #[inline]
    pub fn release(self) -> R {
        self.regs
    }

    #[inline]
    pub fn read_register(&mut self, addr: u5) -> u16 {
        self.regs.phy_register(addr)
    }

    #[inline]
    pub fn write_register(&mut self, addr: u5, value: u16) {
        self.regs.set_phy_register(addr, value);
    }

    #[inline]
    pub fn read(&mut self, reg: PhyRegister) -> u16 {
        self.read_register(reg.addr())
    }

    #[inline]
    pub fn write(&mut self, reg: PhyRegister, value: u16) {
        self.write_register(reg.addr(), value);
    }

    #[inline]
    pub fn basic_control(&mut self) -> BasicControl {
        BasicControl::new_with_raw_value(self.read(PhyRegister::BasicControl))
    }

    #[inline]
    pub fn write_basic_control(&mut self, value: BasicControl) {
        self.write(PhyRegister::BasicControl, value.raw_value());
    }

    pub fn modify_basic_control(&mut self, f: impl FnOnce(BasicControl) -> BasicControl) {
        let value = self.basic_control();
        self.write_basic_control(f(value));
    }

    #[inline]
    pub fn basic_status(&mut self) -> BasicStatus {
        BasicStatus::new_with_raw_value(self.read(PhyRegister::BasicStatus))
    }

    pub fn identifier(&mut self) -> PhyIdentifier {
        let id1 = self.read(PhyRegister::Identifier1);
        let id2 = self.read(PhyRegister::Identifier2);
        PhyIdentifier::new(id1, id2)
    }

    #[inline]
    pub fn advertisement(&mut self) -> AutoNegAbility {
        AutoNegAbility::new_with_raw_value(self.read(PhyRegister::AutoNegAdvertisement))
    }

    #[inline]
    pub fn set_advertisement(&mut self, value: AutoNegAbility) {
        self.write(PhyRegister::AutoNegAdvertisement, value.raw_value());
    }

    #[inline]
    pub fn link_partner_ability(&mut self) -> AutoNegAbility {
        AutoNegAbility::new_with_raw_value(self.read(PhyRegister::AutoNegLinkPartnerAbility))
    }

    #[inline]
    pub fn auto_negotiation_expansion(&mut self) -> AutoNegExpansion {
        AutoNegExpansion::new_with_raw_value(self.read(PhyRegister::AutoNegExpansion))
    }

    #[inline]
    pub fn mode_control_status(&mut self) -> ModeControlStatus {
        ModeControlStatus::new_with_raw_value(self.read(PhyRegister::ModeControlStatus))
    }

    #[inline]
    pub fn special_modes(&mut self) -> SpecialModes {
        SpecialModes::new_with_raw_value(self.read(PhyRegister::SpecialModes))
    }

    #[inline]
    pub fn special_status(&mut self) -> SpecialControlStatus {
        SpecialControlStatus::new_with_raw_value(self.read(PhyRegister::SpecialControlStatus))
    }

    /// The read clears the pending events.
    #[inline]
    pub fn interrupt_source(&mut self) -> InterruptSource {
        InterruptSource::new_with_raw_value(self.read(PhyRegister::InterruptSource))
    }

    /// Sets the software reset bit. The bit clears itself once the reset is complete.
    pub fn reset(&mut self) {
        self.modify_basic_control(|val| val.with_reset(true));
    }

    /// Puts the PHY to sleep.
    ///
    /// Auto-negotiation is disabled with a separate write first, the PHY ignores the
    /// power-down bit otherwise.
    pub fn power_down(&mut self) {
        self.modify_basic_control(|val| val.with_auto_negotiation_enable(false));
        self.modify_basic_control(|val| val.with_power_down(true));
    }

    pub fn wake_up(&mut self) {
        self.modify_basic_control(|val| val.with_power_down(false));
    }

    /// Forces speed and duplex mode. Has no effect while auto-negotiation is enabled.
    pub fn configure(&mut self, speed: LinkSpeed, duplex: Duplex) {
        self.modify_basic_control(|val| val.with_speed_select(speed).with_duplex(duplex));
    }

    /// Enables or disables auto-negotiation. Enabling it also restarts the process.
    pub fn set_auto_negotiation(&mut self, enable: bool) {
        self.modify_basic_control(|val| {
            val.with_auto_negotiation_enable(enable)
                .with_restart_auto_negotiation(enable)
        });
    }

    /// Near-end loopback test mode.
    pub fn set_test_mode(&mut self, enable: bool) {
        self.modify_basic_control(|val| val.with_loopback(enable));
    }

    /// Enables or disables the SQE (heartbeat) test.
    pub fn set_heartbeat_test(&mut self, enable: bool) {
        let value = self.special_indications().with_sqe_off(!enable);
        self.write(
            PhyRegister::SpecialControlStatusIndications,
            value.raw_value(),
        );
    }

    /// Disables auto-MDIX and forces the given crossover mode.
    pub fn set_channel(&mut self, channel: Channel) {
        let value = self
            .special_indications()
            .with_manual_mdix(true)
            .with_channel_select(channel);
        self.write(
            PhyRegister::SpecialControlStatusIndications,
            value.raw_value(),
        );
    }

    #[inline]
    pub fn channel(&mut self) -> Channel {
        self.special_indications().channel_select()
    }

    /// Single raw sample of the link status bit.
    #[inline]
    pub fn is_linked(&mut self) -> bool {
        self.basic_status().link_status()
    }

    #[inline]
    pub fn energy_on(&mut self) -> bool {
        self.mode_control_status().energy_on()
    }

    /// Symbol error counter.
    #[inline]
    pub fn error_count(&mut self) -> u16 {
        self.read(PhyRegister::SymbolErrorCounter)
    }

    /// Enables or disables the PHY interrupt with the given [PhyEvent] index.
    ///
    /// Returns [EthError::IndexOutOfRange] without touching the mask for `index > 6`.
    pub fn set_phy_interrupt(&mut self, index: u8, enable: bool) -> Result<(), EthError> {
        let event = PhyEvent::try_from(index).map_err(|_| EthError::IndexOutOfRange {
            index,
            max: PhyEvent::EnergyOn as u8,
        })?;
        self.set_phy_event_interrupt(event, enable);
        Ok(())
    }

    pub fn set_phy_event_interrupt(&mut self, event: PhyEvent, enable: bool) {
        let reg = InterruptMask::new_with_raw_value(self.read(PhyRegister::InterruptMask));
        let bit = 1 << event as u8;
        let mask = if enable {
            reg.mask().value() | bit
        } else {
            reg.mask().value() & !bit
        };
        self.write(
            PhyRegister::InterruptMask,
            reg.with_mask(u7::new(mask)).raw_value(),
        );
    }

    /// Spins until the link is up.
    ///
    /// This call may not return if no link partner is connected.
    pub fn wait_for_link_blocking(&mut self) {
        while !self.is_linked() {}
    }

    /// Polls the link status at most `max_polls` times. Returns whether the link is up.
    pub fn wait_for_link(&mut self, max_polls: u32) -> bool {
        (0..max_polls).any(|_| self.is_linked())
    }

    #[inline]
    fn special_indications(&mut self) -> SpecialControlStatusIndications {
        SpecialControlStatusIndications::new_with_raw_value(
            self.read(PhyRegister::SpecialControlStatusIndications),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eth::sim::SimSurface;

    fn phy() -> Phy<SimSurface> {
        Phy::new(SimSurface::default())
    }

    #[test]
    fn register_addresses() {
        assert_eq!(PhyRegister::BasicControl.addr().value(), 0);
        assert_eq!(PhyRegister::ModeControlStatus.addr().value(), 17);
        assert_eq!(PhyRegister::SpecialControlStatusIndications.addr().value(), 27);
        assert_eq!(PhyRegister::SpecialControlStatus.addr().value(), 31);
        assert_eq!(PhyRegister::ALL.len(), 14);
    }

    #[test]
    fn basic_control_fields() {
        let reg = BasicControl::DEFAULT
            .with_speed_select(LinkSpeed::Mbps100)
            .with_duplex(Duplex::Full);
        assert_eq!(reg.raw_value(), 0x2100);
        let reg = reg.with_auto_negotiation_enable(true);
        assert_eq!(reg.raw_value(), 0x3100);
        assert_eq!(reg.with_power_down(true).raw_value(), 0x3900);
        assert_eq!(reg.with_reset(true).raw_value(), 0xB100);
        assert_eq!(reg.with_restart_auto_negotiation(true).raw_value(), 0x3300);
        assert_eq!(
            BasicControl::new_with_raw_value(0xFFFF)
                .with_loopback(false)
                .raw_value(),
            0xBFFF
        );
        assert_eq!(
            BasicControl::new_with_raw_value(0xFFFF)
                .with_isolate(false)
                .raw_value(),
            0xFBFF
        );
    }

    #[test]
    fn basic_status_fields() {
        let status = BasicStatus::new_with_raw_value(0x782D);
        assert!(status.base100_tx_full_duplex());
        assert!(status.base100_tx_half_duplex());
        assert!(status.base10_t_full_duplex());
        assert!(status.base10_t_half_duplex());
        assert!(!status.base100_t4());
        assert!(status.auto_negotiation_complete());
        assert!(status.auto_negotiation_ability());
        assert!(status.link_status());
        assert!(!status.jabber_detect());
        assert!(status.extended_capabilities());
    }

    #[test]
    fn identifier_decoding() {
        let id = PhyIdentifier::new(0x0007, 0xC0F1);
        assert_eq!(id.oui, (0x0007 << 6) | 0x30);
        assert_eq!(id.model.value(), PhyIdentifier::LAN8720A_MODEL);
        assert_eq!(id.revision.value(), 1);
    }

    #[test]
    fn special_status_speed_indication() {
        let status = SpecialControlStatus::new_with_raw_value((1 << 12) | (0b110 << 2));
        assert!(status.auto_done());
        let indication = status.speed_indication().unwrap();
        assert_eq!(indication, SpeedIndication::FullDuplex100);
        assert_eq!(indication.speed(), LinkSpeed::Mbps100);
        assert_eq!(indication.duplex(), Duplex::Full);
        let status = SpecialControlStatus::new_with_raw_value(0b001 << 2);
        assert!(!status.auto_done());
        assert_eq!(
            status.speed_indication().unwrap(),
            SpeedIndication::HalfDuplex10
        );
        let status = SpecialControlStatus::new_with_raw_value(0b111 << 2);
        assert!(status.speed_indication().is_err());
    }

    #[test]
    fn interrupt_mask_matches_source_bits() {
        let mask = InterruptMask::DEFAULT.with_mask(u7::new(0b100_0001));
        assert_eq!(mask.raw_value(), 0b1000_0010);
        let source = InterruptSource::new_with_raw_value(mask.raw_value());
        assert!(source.energy_on());
        assert!(source.auto_negotiation_page_received());
        assert!(!source.link_down());
        assert!(!source.auto_negotiation_complete());
    }

    #[test]
    fn interrupt_source_read_clears_events() {
        let mut phy = phy();
        phy.write(PhyRegister::InterruptSource, 0b0101_0000);
        let source = phy.interrupt_source();
        assert!(source.link_down());
        assert!(source.auto_negotiation_complete());
        assert_eq!(phy.interrupt_source().raw_value(), 0);
    }

    #[test]
    fn reset_is_read_modify_write() {
        let mut phy = phy();
        phy.write(PhyRegister::BasicControl, 0x2100);
        phy.reset();
        // The reset bit clears itself, the other bits survive.
        assert_eq!(phy.read(PhyRegister::BasicControl), 0x2100);
        assert_eq!(phy.release().phy_resets(), 1);
    }

    #[test]
    fn power_down_clears_auto_negotiation_first() {
        let mut phy = phy();
        phy.set_auto_negotiation(true);
        let writes_before = phy.regs.phy_writes();
        phy.power_down();
        let ctrl = phy.basic_control();
        assert!(ctrl.power_down());
        assert!(!ctrl.auto_negotiation_enable());
        assert_eq!(phy.regs.phy_writes() - writes_before, 2);
        phy.wake_up();
        assert!(!phy.basic_control().power_down());
    }

    #[test]
    fn configure_writes_speed_and_duplex() {
        let mut phy = phy();
        phy.configure(LinkSpeed::Mbps100, Duplex::Full);
        let ctrl = phy.basic_control();
        assert_eq!(ctrl.speed_select(), LinkSpeed::Mbps100);
        assert_eq!(ctrl.duplex(), Duplex::Full);
        phy.configure(LinkSpeed::Mbps10, Duplex::Half);
        let ctrl = phy.basic_control();
        assert_eq!(ctrl.speed_select(), LinkSpeed::Mbps10);
        assert_eq!(ctrl.duplex(), Duplex::Half);
    }

    #[test]
    fn auto_negotiation_sets_enable_and_restart() {
        let mut phy = phy();
        phy.set_auto_negotiation(true);
        assert!(phy.basic_control().auto_negotiation_enable());
        assert_eq!(phy.regs.auto_negotiation_restarts(), 1);
        phy.set_auto_negotiation(false);
        assert!(!phy.basic_control().auto_negotiation_enable());
        assert_eq!(phy.regs.auto_negotiation_restarts(), 1);
    }

    #[test]
    fn test_mode_toggles_loopback() {
        let mut phy = phy();
        phy.set_test_mode(true);
        assert!(phy.basic_control().loopback());
        phy.set_test_mode(false);
        assert!(!phy.basic_control().loopback());
    }

    #[test]
    fn channel_selection_disables_auto_mdix() {
        let mut phy = phy();
        phy.set_channel(Channel::MdiX);
        let reg = phy.special_indications();
        assert!(reg.manual_mdix());
        assert_eq!(phy.channel(), Channel::MdiX);
        phy.set_channel(Channel::Mdi);
        assert_eq!(phy.channel(), Channel::Mdi);
        assert!(phy.special_indications().manual_mdix());
    }

    #[test]
    fn heartbeat_test_inverts_sqe_off() {
        let mut phy = phy();
        phy.set_heartbeat_test(false);
        assert!(phy.special_indications().sqe_off());
        phy.set_heartbeat_test(true);
        assert!(!phy.special_indications().sqe_off());
    }

    #[test]
    fn phy_interrupt_index_bounds() {
        let mut phy = phy();
        phy.set_phy_interrupt(0, true).unwrap();
        phy.set_phy_interrupt(6, true).unwrap();
        assert_eq!(phy.read(PhyRegister::InterruptMask), 0b1000_0010);
        let writes = phy.regs.phy_writes();
        assert_eq!(
            phy.set_phy_interrupt(7, true),
            Err(EthError::IndexOutOfRange { index: 7, max: 6 })
        );
        assert_eq!(phy.regs.phy_writes(), writes);
        assert_eq!(phy.read(PhyRegister::InterruptMask), 0b1000_0010);
        phy.set_phy_interrupt(0, false).unwrap();
        assert_eq!(phy.read(PhyRegister::InterruptMask), 0b1000_0000);
    }

    #[test]
    fn link_status_and_counters() {
        let mut phy = phy();
        assert!(!phy.is_linked());
        assert!(!phy.wait_for_link(10));
        phy.regs.set_link(true);
        assert!(phy.is_linked());
        assert!(phy.wait_for_link(1));
        phy.wait_for_link_blocking();
        phy.write(PhyRegister::SymbolErrorCounter, 17);
        assert_eq!(phy.error_count(), 17);
        phy.write(PhyRegister::ModeControlStatus, 1 << 1);
        assert!(phy.energy_on());
    }
}
