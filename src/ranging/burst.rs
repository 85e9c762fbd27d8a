use super::hw::Hardware;
use super::session::{Fsm, Phase};

/// Carrier burst sequencing
///
/// Counts waveform periods on the counting channel and decides when to stop
/// driving the transducer (`transmit_periods`) and when the ringing has died
/// out enough to start listening for an echo (`listen_periods`).
pub struct BurstGenerator {
    transmit_periods: u32,
    listen_periods: u32,
}

impl BurstGenerator {
    pub const fn new(transmit_periods: u32, listen_periods: u32) -> Self {
        assert!(transmit_periods < listen_periods, "Transmission must end before listening");
        Self { transmit_periods, listen_periods }
    }

    /// Start a new burst, the state machine must be idle
    pub fn start(&self, fsm: &mut Fsm, hw: &mut dyn Hardware, detect: bool) -> bool {
        fsm.trigger(hw, detect)
    }

    /// Counting channel callback, returns true when listening has just started
    pub fn on_counting_period(&self, fsm: &mut Fsm, hw: &mut dyn Hardware) -> bool {
        if fsm.phase() != Phase::Transmitting {
            defmt::trace!("Stale counting period in {}", fsm.phase());
            return false;
        }

        let count = fsm.session_mut().count_period();
        if count > self.listen_periods {
            fsm.end_window(hw) && fsm.phase() == Phase::Listening
        } else {
            false
        }
    }

    /// Drive channel callback, returns true when transmission has just been stopped
    pub fn on_drive_period(&self, fsm: &mut Fsm, hw: &mut dyn Hardware) -> bool {
        let session = fsm.session();
        let transmitting = fsm.phase() == Phase::Transmitting && session.drive_active();
        if !transmitting || session.cycle_count() <= self.transmit_periods {
            return false;
        }

        let stopped = fsm.session_mut().stop_drive(hw);
        defmt::trace!("Transmission done after {=u32} periods", self.transmit_periods);
        stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranging::mock::{Mock, Op};

    fn started(detect: bool) -> (BurstGenerator, Fsm, Mock) {
        let burst = BurstGenerator::new(8, 160);
        let mut fsm = Fsm::idle();
        let mut hw = Mock::new();
        assert!(burst.start(&mut fsm, &mut hw, detect));
        hw.take_ops();
        (burst, fsm, hw)
    }

    #[test]
    fn drive_stops_after_transmit_periods() {
        let (burst, mut fsm, mut hw) = started(true);
        for _ in 0..8 {
            burst.on_counting_period(&mut fsm, &mut hw);
            assert!(!burst.on_drive_period(&mut fsm, &mut hw));
        }
        assert!(hw.drive);
        burst.on_counting_period(&mut fsm, &mut hw);
        hw.ticks = 123;
        assert!(burst.on_drive_period(&mut fsm, &mut hw));
        assert!(!hw.drive);
        assert_eq!(fsm.session().diag_snapshot_a(), Some(123));
        assert_eq!(fsm.phase(), Phase::Transmitting);
    }

    #[test]
    fn drive_cutoff_only_once() {
        let (burst, mut fsm, mut hw) = started(true);
        for _ in 0..20 {
            burst.on_counting_period(&mut fsm, &mut hw);
        }
        assert!(burst.on_drive_period(&mut fsm, &mut hw));
        hw.ticks = 999;
        assert!(!burst.on_drive_period(&mut fsm, &mut hw));
        assert_eq!(fsm.session().diag_snapshot_a(), Some(0));
        assert_eq!(hw.take_ops().iter().filter(|op| **op == Op::DriveOff).count(), 1);
    }

    #[test]
    fn listening_after_listen_periods() {
        let (burst, mut fsm, mut hw) = started(true);
        for i in 1..=160 {
            assert!(!burst.on_counting_period(&mut fsm, &mut hw), "period {}", i);
        }
        assert_eq!(fsm.phase(), Phase::Transmitting);
        hw.ticks = 1440;
        assert!(burst.on_counting_period(&mut fsm, &mut hw));
        assert_eq!(fsm.phase(), Phase::Listening);
        assert_eq!(fsm.session().cycle_count(), 161);
        assert_eq!(fsm.session().diag_snapshot_b(), Some(1440));
        assert!(!hw.counting);
        assert!(hw.edge);
    }

    #[test]
    fn counting_ignored_when_not_transmitting() {
        let (burst, mut fsm, mut hw) = started(true);
        for _ in 0..161 {
            burst.on_counting_period(&mut fsm, &mut hw);
        }
        assert!(!burst.on_counting_period(&mut fsm, &mut hw));
        assert_eq!(fsm.session().cycle_count(), 161);
    }

    #[test]
    fn raw_burst_never_listens() {
        let (burst, mut fsm, mut hw) = started(false);
        for _ in 0..200 {
            assert!(!burst.on_counting_period(&mut fsm, &mut hw));
            burst.on_drive_period(&mut fsm, &mut hw);
        }
        assert_eq!(fsm.phase(), Phase::Idle);
        assert!(!hw.edge);
        assert!(hw.quiet());
        assert_eq!(fsm.session().last_measurement(), None);
    }

    #[test]
    #[should_panic(expected = "Transmission must end before listening")]
    fn thresholds_in_order() {
        BurstGenerator::new(160, 8);
    }
}
