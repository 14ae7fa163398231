//! Ethernet packet loop program for the Franco SoC.
//!
//! Dumps the PHY register file, then runs the [PacketLoop] once per framing format and link
//! speed. A pass ends when the exit pin (GPIO pin [EXIT_PIN] on the board) reads high.
//!
//! [run] is generic over the register surface, the delay and the exit pin. The `ethernet`
//! binary (feature `board`) runs it on the hardware, the tests run it on the simulated surface.
#![no_std]

use embedded_hal::{delay::DelayNs, digital::InputPin};
use franco_hal::eth::{
    Duplex, Ethernet, FrameMode, LinkSpeed, MacAddress, PhyRegister, RegisterSurface,
    packet_loop::{LoopStats, PacketLoop},
};

/// MAC address of the host on the other end of the cable.
pub const HOST_MAC: MacAddress = MacAddress([0x16, 0xAA, 0x57, 0xC1, 0xBB, 0xD8]);

/// EtherType carried by outbound frames in Ethernet II mode.
pub const TX_ETHER_TYPE: u16 = 1600;

/// GPIO pin which ends the current pass.
pub const EXIT_PIN: u8 = 4;

pub const TX_PAYLOAD: &[u8] = b"[FRAME START]\n\n\
Franco SoC Ethernet packet loop.\n\
One frame is sent for every frame received.\n\n\
[FRAME END]";

pub const STARTUP_DELAY_MS: u32 = 10_000;
pub const LINK_SETTLE_DELAY_MS: u32 = 1000;

/// One pass of the packet loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestPass {
    pub name: &'static str,
    pub frame_mode: FrameMode,
    pub speed: LinkSpeed,
}

pub const TEST_PASSES: [TestPass; 4] = [
    TestPass {
        name: "IEEE 802.3 100Mbps",
        frame_mode: FrameMode::Ieee8023,
        speed: LinkSpeed::Mbps100,
    },
    TestPass {
        name: "IEEE 802.3 10Mbps",
        frame_mode: FrameMode::Ieee8023,
        speed: LinkSpeed::Mbps10,
    },
    TestPass {
        name: "Ethernet II 100Mbps",
        frame_mode: FrameMode::EthernetII,
        speed: LinkSpeed::Mbps100,
    },
    TestPass {
        name: "Ethernet II 10Mbps",
        frame_mode: FrameMode::EthernetII,
        speed: LinkSpeed::Mbps10,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoConfig {
    pub destination: MacAddress,
    /// Wait for the PHY to come up and for a link partner before every pass. Disable this
    /// when no cable is connected.
    pub wait_for_link: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            destination: HOST_MAC,
            wait_for_link: true,
        }
    }
}

/// Reads every documented PHY register and logs it in binary.
pub fn dump_phy_registers<R: RegisterSurface>(
    eth: &mut Ethernet<R>,
) -> [(PhyRegister, u16); PhyRegister::ALL.len()] {
    let mut dump = [(PhyRegister::BasicControl, 0); PhyRegister::ALL.len()];
    for (entry, reg) in dump.iter_mut().zip(PhyRegister::ALL) {
        let value = eth.read_register(reg.addr());
        log::info!("[{}] {} REGISTER: {:016b}", reg.addr().value(), reg.name(), value);
        *entry = (reg, value);
    }
    dump
}

/// Blocks until the link is up, with a settle delay on both sides.
pub fn wait_for_link<R: RegisterSurface, D: DelayNs>(eth: &mut Ethernet<R>, delay: &mut D) {
    delay.delay_ms(LINK_SETTLE_DELAY_MS);
    log::info!("[LINK STATUS] Linking...");
    eth.wait_for_link_blocking();
    log::info!("[LINK STATUS] Established");
    delay.delay_ms(LINK_SETTLE_DELAY_MS);
}

/// Runs all [TEST_PASSES] and returns the loop statistics of each pass.
///
/// A failing pin read ends the current pass.
pub fn run<R: RegisterSurface, D: DelayNs, P: InputPin>(
    eth: &mut Ethernet<R>,
    delay: &mut D,
    exit_pin: &mut P,
    config: &DemoConfig,
) -> [LoopStats; TEST_PASSES.len()] {
    log::info!("-- Franco Ethernet packet loop --");
    eth.init_with_frame_mode(LinkSpeed::Mbps100, Duplex::Full, false, FrameMode::Ieee8023);
    if config.wait_for_link {
        delay.delay_ms(STARTUP_DELAY_MS);
    }
    log::info!("Reading PHY registers");
    dump_phy_registers(eth);

    let mut stats = [LoopStats::default(); TEST_PASSES.len()];
    for (pass, pass_stats) in TEST_PASSES.iter().zip(stats.iter_mut()) {
        log::info!("-- {} --", pass.name);
        eth.init_with_frame_mode(pass.speed, Duplex::Full, false, pass.frame_mode);
        if config.wait_for_link {
            wait_for_link(eth, delay);
        }
        let mut packet_loop = PacketLoop::new(TX_PAYLOAD, config.destination);
        if pass.frame_mode == FrameMode::EthernetII {
            packet_loop = packet_loop.with_ether_type(TX_ETHER_TYPE);
        }
        *pass_stats = packet_loop.run_until(eth, || exit_pin.is_high().unwrap_or(true));
        log::info!(
            "{} done, {} sent, {} received, {} errors",
            pass.name,
            pass_stats.frames_sent,
            pass_stats.frames_received,
            pass_stats.tx_errors + pass_stats.rx_errors
        );
    }
    stats
}

#[cfg(test)]
mod tests {
    use core::convert::Infallible;

    use embedded_hal::digital::{ErrorType, ErrorKind};
    use franco_hal::eth::{MacGeneration, sim::SimSurface};

    use super::*;

    #[derive(Default)]
    struct CountingDelay {
        total_ms: u64,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ms += u64::from(ns) / 1_000_000;
        }

        fn delay_ms(&mut self, ms: u32) {
            self.total_ms += u64::from(ms);
        }
    }

    /// Reads high every `period` polls, like a button pressed once per pass.
    struct PeriodicPin {
        period: u32,
        polls: u32,
        presses: u32,
    }

    impl PeriodicPin {
        fn new(period: u32) -> Self {
            Self {
                period,
                polls: 0,
                presses: 0,
            }
        }
    }

    impl ErrorType for PeriodicPin {
        type Error = Infallible;
    }

    impl InputPin for PeriodicPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            self.polls += 1;
            if self.polls == self.period {
                self.polls = 0;
                self.presses += 1;
                return Ok(true);
            }
            Ok(false)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            self.is_high().map(|high| !high)
        }
    }

    struct BrokenPin;

    impl ErrorType for BrokenPin {
        type Error = ErrorKind;
    }

    impl InputPin for BrokenPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Err(ErrorKind::Other)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Err(ErrorKind::Other)
        }
    }

    #[test]
    fn register_dump_covers_documented_registers() {
        let mut sim = SimSurface::default();
        let mut eth = Ethernet::new(&mut sim, MacGeneration::SplitFifo);
        let dump = dump_phy_registers(&mut eth);
        assert_eq!(dump.len(), 14);
        assert_eq!(dump[2], (PhyRegister::Identifier1, 0x0007));
        assert_eq!(dump[3], (PhyRegister::Identifier2, 0xC0F1));
        assert_eq!(dump[13].0, PhyRegister::SpecialControlStatus);
        core::mem::forget(eth);
    }

    #[test]
    fn every_pass_runs_until_exit_pin() {
        let mut sim = SimSurface::default();
        sim.set_link(true);
        let mut eth = Ethernet::new(&mut sim, MacGeneration::SplitFifo);
        let mut delay = CountingDelay::default();
        let mut pin = PeriodicPin::new(5);
        let stats = run(&mut eth, &mut delay, &mut pin, &DemoConfig::default());
        assert_eq!(pin.presses, 4);
        assert_eq!(stats, [LoopStats::default(); 4]);
        assert_eq!(
            delay.total_ms,
            u64::from(STARTUP_DELAY_MS) + 8 * u64::from(LINK_SETTLE_DELAY_MS)
        );
        // The last pass leaves the MAC in Ethernet II at 10 Mbps.
        assert_eq!(eth.frame_mode(), FrameMode::EthernetII);
        assert_eq!(eth.link_speed(), LinkSpeed::Mbps10);
        core::mem::forget(eth);
    }

    #[test]
    fn pin_error_ends_passes_without_waiting() {
        let mut sim = SimSurface::new(MacGeneration::SingleFifo);
        let mut eth = Ethernet::new(&mut sim, MacGeneration::SingleFifo);
        let mut delay = CountingDelay::default();
        let config = DemoConfig {
            wait_for_link: false,
            ..DemoConfig::default()
        };
        let stats = run(&mut eth, &mut delay, &mut BrokenPin, &config);
        assert_eq!(stats, [LoopStats::default(); 4]);
        assert_eq!(delay.total_ms, 0);
        assert!(eth.regs().tx_frames().is_empty());
        core::mem::forget(eth);
    }

    #[test]
    fn payload_fits_a_single_frame() {
        assert!(TX_PAYLOAD.len() >= franco_hal::eth::MIN_PAYLOAD_LENGTH);
        assert!(TX_PAYLOAD.len() <= franco_hal::eth::MAX_PAYLOAD_LENGTH);
    }
}
