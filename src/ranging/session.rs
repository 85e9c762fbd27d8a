use defmt::Format;
use smlang::statemachine;

use super::hw::Hardware;

pub type Fsm = StateMachine<Session>;

/// Raw value reported when no echo has been observed before the deadline
pub const SENTINEL: u16 = 0xFFFF;

/// Result of a resolved ranging cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Format)]
pub enum Measurement {
    /// Round-trip time in range timer ticks
    Echo(u16),
    /// Deadline expired without a valid echo
    NoTarget,
}

impl Measurement {
    /// Raw tick value, [`SENTINEL`] for [`Measurement::NoTarget`]
    pub fn ticks(&self) -> u16 {
        match self {
            Self::Echo(ticks) => *ticks,
            Self::NoTarget => SENTINEL,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::NoTarget)
    }
}

/// Ranging cycle phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Format)]
pub enum Phase {
    Idle,
    Transmitting,
    Listening,
    Resolved,
}

statemachine! {
    temporary_context: &mut dyn Hardware,
    transitions: {
        *Idle + Trigger / start_ranging = Transmitting,
        Idle + Burst / start_burst = Transmitting,

        // End of the guard interval after transmission
        Transmitting + ListenWindow / arm_listening = Listening,
        Transmitting + BurstDone / finish_burst = Idle,

        // Whichever comes first wins, the other one is an invalid event in Resolved
        Listening + Echo [representable] / resolve_echo = Resolved,
        Listening + Timeout / resolve_timeout = Resolved,

        // Re-trigger always goes through Idle
        Transmitting + Abort / teardown = Idle,
        Listening + Abort / teardown = Idle,
        Resolved + Abort / teardown = Idle,
    }
}

/// State of a single ranging cycle
///
/// Lives inside the state machine as its context, so there is exactly one
/// session which is re-armed on each trigger. Only `last` survives re-arming.
pub struct Session {
    cycle_count: u32,
    measurement: Option<Measurement>,
    diag_snapshot_a: Option<u32>,
    diag_snapshot_b: Option<u32>,
    drive_active: bool,
    detect: bool,
    // Counter value latched by the edge handler for the Echo event
    latched: u32,
    last: Option<Measurement>,
}

impl Session {
    const fn new() -> Self {
        Self {
            cycle_count: 0,
            measurement: None,
            diag_snapshot_a: None,
            diag_snapshot_b: None,
            drive_active: false,
            detect: false,
            latched: 0,
            last: None,
        }
    }

    fn rearm(&mut self, detect: bool) {
        self.cycle_count = 0;
        self.measurement = None;
        self.diag_snapshot_a = None;
        self.diag_snapshot_b = None;
        self.drive_active = true;
        self.detect = detect;
        self.latched = 0;
    }

    fn resolve(&mut self, measurement: Measurement) {
        debug_assert!(self.measurement.is_none(), "Session resolved twice");
        self.measurement = Some(measurement);
        self.last = Some(measurement);
    }

    /// Waveform periods elapsed since trigger
    pub fn cycle_count(&self) -> u32 {
        self.cycle_count
    }

    /// Result of this session, `None` until resolved
    pub fn measurement(&self) -> Option<Measurement> {
        self.measurement
    }

    /// Result of the most recently resolved session
    pub fn last_measurement(&self) -> Option<Measurement> {
        self.last
    }

    /// Counter value when transmission stopped
    pub fn diag_snapshot_a(&self) -> Option<u32> {
        self.diag_snapshot_a
    }

    /// Counter value when listening started
    pub fn diag_snapshot_b(&self) -> Option<u32> {
        self.diag_snapshot_b
    }

    /// Drive channels are still running
    pub fn drive_active(&self) -> bool {
        self.drive_active
    }

    /// Session will listen for an echo after the burst
    pub fn detect(&self) -> bool {
        self.detect
    }

    /// Advance cycle counter, returns the new value
    pub fn count_period(&mut self) -> u32 {
        self.cycle_count = self.cycle_count.saturating_add(1);
        self.cycle_count
    }

    /// Stop drive channels recording the end of transmission, false if already stopped
    pub fn stop_drive(&mut self, hw: &mut dyn Hardware) -> bool {
        if !self.drive_active {
            return false;
        }
        hw.disable_drive();
        self.drive_active = false;
        self.diag_snapshot_a = Some(hw.ticks());
        true
    }

    fn start_hardware(hw: &mut dyn Hardware) {
        hw.set_no_target(false);
        hw.start();
        hw.enable_drive();
        hw.enable_counting();
    }
}

impl StateMachineContext for Session {
    fn start_ranging(&mut self, hw: &mut dyn Hardware) {
        defmt::debug!("Start ranging");
        self.rearm(true);
        Self::start_hardware(hw);
    }

    fn start_burst(&mut self, hw: &mut dyn Hardware) {
        defmt::debug!("Start raw burst");
        self.rearm(false);
        Self::start_hardware(hw);
    }

    fn arm_listening(&mut self, hw: &mut dyn Hardware) {
        // Normally already stopped by the drive channel callback
        self.stop_drive(hw);
        hw.disable_counting();
        self.diag_snapshot_b = Some(hw.ticks());
        hw.enable_edge();
        defmt::trace!("Listening at {=u32}", hw.ticks());
    }

    fn finish_burst(&mut self, hw: &mut dyn Hardware) {
        self.stop_drive(hw);
        hw.disable_counting();
        self.diag_snapshot_b = Some(hw.ticks());
        hw.stop();
        defmt::debug!("Raw burst done");
    }

    fn representable(&mut self, _hw: &mut dyn Hardware) -> Result<(), ()> {
        if self.latched < SENTINEL as u32 { Ok(()) } else { Err(()) }
    }

    fn resolve_echo(&mut self, hw: &mut dyn Hardware) {
        // Stopping the timer also cancels the deadline
        hw.stop();
        hw.disable_edge();
        hw.set_no_target(false);
        self.resolve(Measurement::Echo(self.latched as u16));
        defmt::info!("Echo at {=u32}", self.latched);
    }

    fn resolve_timeout(&mut self, hw: &mut dyn Hardware) {
        hw.disable_edge();
        hw.stop();
        hw.set_no_target(true);
        self.resolve(Measurement::NoTarget);
        defmt::info!("No target");
    }

    fn teardown(&mut self, hw: &mut dyn Hardware) {
        hw.disable_edge();
        hw.stop();
        hw.disable_drive();
        hw.disable_counting();
        self.drive_active = false;
        defmt::debug!("Session torn down");
    }
}

impl StateMachine<Session> {
    /// New state machine in [`Phase::Idle`] with nothing measured yet
    pub fn idle() -> Self {
        Self::new(Session::new())
    }

    pub fn phase(&self) -> Phase {
        match self.state() {
            States::Idle => Phase::Idle,
            States::Transmitting => Phase::Transmitting,
            States::Listening => Phase::Listening,
            States::Resolved => Phase::Resolved,
        }
    }

    pub fn session(&self) -> &Session {
        &self.context
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.context
    }

    /// Start a new session from [`Phase::Idle`], with or without echo detection
    pub fn trigger(&mut self, hw: &mut dyn Hardware, detect: bool) -> bool {
        let event = if detect { Events::Trigger } else { Events::Burst };
        self.process_event(hw, event).is_ok()
    }

    /// Tear down the current session, returns false if already idle
    pub fn abort(&mut self, hw: &mut dyn Hardware) -> bool {
        self.process_event(hw, Events::Abort).is_ok()
    }

    /// End of the listen-arming window; either starts listening or ends a raw burst
    pub fn end_window(&mut self, hw: &mut dyn Hardware) -> bool {
        let event = if self.context.detect { Events::ListenWindow } else { Events::BurstDone };
        self.process_event(hw, event).is_ok()
    }

    /// Try to resolve with an echo at given counter value
    pub fn echo(&mut self, hw: &mut dyn Hardware, ticks: u32) -> bool {
        self.context.latched = ticks;
        match self.process_event(hw, Events::Echo) {
            Ok(_) => true,
            Err(_) => {
                defmt::debug!("Echo at {=u32} rejected in {}", ticks, self.phase());
                false
            },
        }
    }

    /// Try to resolve as timed out
    pub fn timeout(&mut self, hw: &mut dyn Hardware) -> bool {
        match self.process_event(hw, Events::Timeout) {
            Ok(_) => true,
            Err(_) => {
                defmt::debug!("Stale timeout in {}", self.phase());
                false
            },
        }
    }
}
