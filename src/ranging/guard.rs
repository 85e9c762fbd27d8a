use super::hw::Hardware;
use super::session::{Fsm, SENTINEL};

/// Bounds the time spent waiting for an echo
pub struct TimeoutGuard {
    deadline_ticks: u32,
}

impl TimeoutGuard {
    /// Deadline in range timer ticks counted from the trigger
    ///
    /// Must be below [`SENTINEL`] so that any echo before the deadline can be reported.
    pub const fn new(deadline_ticks: u32) -> Self {
        assert!(deadline_ticks < SENTINEL as u32, "Deadline collides with the sentinel");
        Self { deadline_ticks }
    }

    pub const fn deadline(&self) -> u32 {
        self.deadline_ticks
    }

    /// Arm the deadline, must be called right after the echo line has been armed
    ///
    /// If the counter is already past the deadline the session is resolved
    /// immediately and true is returned.
    pub fn arm(&self, fsm: &mut Fsm, hw: &mut dyn Hardware) -> bool {
        hw.arm_deadline(self.deadline_ticks);
        if hw.ticks() >= self.deadline_ticks {
            defmt::warn!("Deadline passed before listening started");
            self.on_expire(fsm, hw)
        } else {
            false
        }
    }

    /// Deadline expiry callback, returns true if it resolved the session
    pub fn on_expire(&self, fsm: &mut Fsm, hw: &mut dyn Hardware) -> bool {
        fsm.timeout(hw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranging::mock::{Mock, Op};
    use crate::ranging::session::{Measurement, Phase};

    fn listening() -> (TimeoutGuard, Fsm, Mock) {
        let mut fsm = Fsm::idle();
        let mut hw = Mock::new();
        fsm.trigger(&mut hw, true);
        fsm.end_window(&mut hw);
        hw.take_ops();
        (TimeoutGuard::new(0xfff0), fsm, hw)
    }

    #[test]
    fn arm_sets_deadline() {
        let (guard, mut fsm, mut hw) = listening();
        hw.ticks = 1441;
        assert!(!guard.arm(&mut fsm, &mut hw));
        assert_eq!(hw.take_ops(), [Op::Deadline(0xfff0)]);
        assert_eq!(fsm.phase(), Phase::Listening);
    }

    #[test]
    fn expiry_resolves_as_no_target() {
        let (guard, mut fsm, mut hw) = listening();
        guard.arm(&mut fsm, &mut hw);
        hw.take_ops();
        assert!(guard.on_expire(&mut fsm, &mut hw));
        assert_eq!(fsm.phase(), Phase::Resolved);
        assert_eq!(fsm.session().measurement(), Some(Measurement::NoTarget));
        assert_eq!(fsm.session().measurement().map(|m| m.ticks()), Some(0xffff));
        assert_eq!(hw.take_ops(), [Op::EdgeOff, Op::TimerStop, Op::NoTarget(true)]);
        assert!(hw.no_target);
    }

    #[test]
    fn already_past_deadline() {
        let (guard, mut fsm, mut hw) = listening();
        hw.ticks = 0xfff0;
        assert!(guard.arm(&mut fsm, &mut hw));
        assert_eq!(fsm.session().measurement(), Some(Measurement::NoTarget));
    }

    #[test]
    fn stale_expiry_is_noop() {
        let (guard, mut fsm, mut hw) = listening();
        fsm.echo(&mut hw, 2000);
        hw.take_ops();
        assert!(!guard.on_expire(&mut fsm, &mut hw));
        assert!(hw.take_ops().is_empty());
        assert_eq!(fsm.session().measurement(), Some(Measurement::Echo(2000)));
    }

    #[test]
    fn expiry_before_listening_is_noop() {
        let guard = TimeoutGuard::new(0xfff0);
        let mut fsm = Fsm::idle();
        let mut hw = Mock::new();
        fsm.trigger(&mut hw, true);
        assert!(!guard.on_expire(&mut fsm, &mut hw));
        assert_eq!(fsm.phase(), Phase::Transmitting);
    }

    #[test]
    #[should_panic(expected = "Deadline collides with the sentinel")]
    fn deadline_below_sentinel() {
        TimeoutGuard::new(0xffff);
    }
}
