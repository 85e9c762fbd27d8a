use defmt::Format;

use super::hw::Hardware;
use super::session::{Fsm, Phase};

/// What happened to an edge delivered by the echo line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Format)]
pub enum Edge {
    /// Not listening, e.g. a late interrupt from a torn down session
    Stale,
    /// Too early, most likely transducer ringing after transmission
    Ringing(u32),
    /// Counter value cannot be stored as a measurement
    OutOfRange(u32),
    /// Session resolved with this echo
    Echo(u16),
}

/// Rising edge interpretation
pub struct EchoCapture {
    reject_ticks: u32,
}

impl EchoCapture {
    /// Edges at or below `reject_ticks` are ignored
    pub const fn new(reject_ticks: u32) -> Self {
        Self { reject_ticks }
    }

    pub fn handle_edge(&self, fsm: &mut Fsm, hw: &mut dyn Hardware) -> Edge {
        let ticks = hw.ticks();

        if fsm.phase() != Phase::Listening {
            defmt::trace!("Stale edge at {=u32} in {}", ticks, fsm.phase());
            return Edge::Stale;
        }

        // Line stays armed and the timer keeps running
        if ticks <= self.reject_ticks {
            defmt::trace!("Ringing at {=u32}", ticks);
            return Edge::Ringing(ticks);
        }

        if fsm.echo(hw, ticks) {
            Edge::Echo(ticks as u16)
        } else {
            Edge::OutOfRange(ticks)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranging::mock::{Mock, Op};
    use crate::ranging::session::Measurement;

    fn listening() -> (EchoCapture, Fsm, Mock) {
        let mut fsm = Fsm::idle();
        let mut hw = Mock::new();
        fsm.trigger(&mut hw, true);
        fsm.end_window(&mut hw);
        hw.take_ops();
        (EchoCapture::new(1500), fsm, hw)
    }

    #[test]
    fn valid_echo_resolves() {
        let (echo, mut fsm, mut hw) = listening();
        hw.ticks = 2000;
        assert_eq!(echo.handle_edge(&mut fsm, &mut hw), Edge::Echo(2000));
        assert_eq!(fsm.phase(), Phase::Resolved);
        assert_eq!(fsm.session().measurement(), Some(Measurement::Echo(2000)));
        assert_eq!(hw.take_ops(), [Op::TimerStop, Op::EdgeOff, Op::NoTarget(false)]);
    }

    #[test]
    fn ringing_keeps_listening() {
        let (echo, mut fsm, mut hw) = listening();
        for ticks in [0, 800, 1500] {
            hw.ticks = ticks;
            assert_eq!(echo.handle_edge(&mut fsm, &mut hw), Edge::Ringing(ticks));
        }
        assert_eq!(fsm.phase(), Phase::Listening);
        assert!(hw.take_ops().is_empty());
        assert!(hw.edge && hw.running);

        hw.ticks = 1501;
        assert_eq!(echo.handle_edge(&mut fsm, &mut hw), Edge::Echo(1501));
    }

    #[test]
    fn edges_outside_listening_are_stale() {
        let echo = EchoCapture::new(1500);
        let mut fsm = Fsm::idle();
        let mut hw = Mock::new();
        hw.ticks = 3000;
        assert_eq!(echo.handle_edge(&mut fsm, &mut hw), Edge::Stale);

        fsm.trigger(&mut hw, true);
        hw.ticks = 3000;
        assert_eq!(echo.handle_edge(&mut fsm, &mut hw), Edge::Stale);
        assert_eq!(fsm.phase(), Phase::Transmitting);
        assert_eq!(fsm.session().measurement(), None);
    }

    #[test]
    fn second_edge_after_resolution() {
        let (echo, mut fsm, mut hw) = listening();
        hw.ticks = 2500;
        echo.handle_edge(&mut fsm, &mut hw);
        hw.ticks = 2600;
        assert_eq!(echo.handle_edge(&mut fsm, &mut hw), Edge::Stale);
        assert_eq!(fsm.session().measurement(), Some(Measurement::Echo(2500)));
    }

    #[test]
    fn counter_beyond_sentinel() {
        let (echo, mut fsm, mut hw) = listening();
        hw.ticks = 70_000;
        assert_eq!(echo.handle_edge(&mut fsm, &mut hw), Edge::OutOfRange(70_000));
        assert_eq!(fsm.phase(), Phase::Listening);
    }
}
