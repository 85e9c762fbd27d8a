use crate::config::RangingConfig;
use super::burst::BurstGenerator;
use super::echo::{EchoCapture, Edge};
use super::guard::TimeoutGuard;
use super::hw::Hardware;
use super::session::{Fsm, Measurement, Phase, Session};

/// Ranging controller
///
/// Owns the hardware and the single ranging session. Interrupt handlers call
/// the `on_*` methods, the application triggers cycles and polls results.
/// All methods take `&mut self`, so when shared between interrupts it must be
/// accessed from within a critical section (e.g. RTIC resource lock).
pub struct Ranging<H> {
    hw: H,
    fsm: Fsm,
    burst: BurstGenerator,
    echo: EchoCapture,
    guard: TimeoutGuard,
}

impl<H: Hardware> Ranging<H> {
    pub fn new(hw: H, config: &RangingConfig) -> Self {
        Self {
            hw,
            fsm: Fsm::idle(),
            burst: BurstGenerator::new(config.transmit_periods, config.listen_periods),
            echo: EchoCapture::new(config.reject_ticks),
            guard: TimeoutGuard::new(config.guard_ticks),
        }
    }

    /// Tear down any session in flight
    fn reset(&mut self) {
        if self.fsm.abort(&mut self.hw) {
            defmt::debug!("Previous session aborted");
        }
    }

    /// Start a full ranging cycle, aborting any unresolved one
    pub fn trigger_ranging(&mut self) {
        self.reset();
        self.burst.start(&mut self.fsm, &mut self.hw, true);
    }

    /// Start a raw burst without echo detection, aborting any unresolved cycle
    pub fn trigger_burst(&mut self) {
        self.reset();
        self.burst.start(&mut self.fsm, &mut self.hw, false);
    }

    /// Counting channel period callback
    pub fn on_counting_period(&mut self) {
        if self.burst.on_counting_period(&mut self.fsm, &mut self.hw) {
            self.guard.arm(&mut self.fsm, &mut self.hw);
        }
    }

    /// Drive channel period callback
    pub fn on_drive_period(&mut self) {
        self.burst.on_drive_period(&mut self.fsm, &mut self.hw);
    }

    /// Echo line rising edge callback
    pub fn on_edge(&mut self) -> Edge {
        self.echo.handle_edge(&mut self.fsm, &mut self.hw)
    }

    /// Range timer deadline callback
    pub fn on_expire(&mut self) -> bool {
        self.guard.on_expire(&mut self.fsm, &mut self.hw)
    }

    /// Most recently resolved measurement, even if a new cycle is in flight
    pub fn read_last_measurement(&self) -> Option<Measurement> {
        self.fsm.session().last_measurement()
    }

    pub fn phase(&self) -> Phase {
        self.fsm.phase()
    }

    pub fn session(&self) -> &Session {
        self.fsm.session()
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    /// Access hardware, e.g. to clear interrupt flags
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }
}
