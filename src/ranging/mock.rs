//! Recording hardware mock for host tests

use std::vec::Vec;

use super::hw::{Waveform, RangeTimer, EchoLine, Indicator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    DriveOn,
    DriveOff,
    CountingOn,
    CountingOff,
    TimerStart,
    Deadline(u32),
    TimerStop,
    EdgeOn,
    EdgeOff,
    NoTarget(bool),
}

/// Hardware mock that records all calls and tracks what is currently armed
pub struct Mock {
    ops: Vec<Op>,
    pub ticks: u32,
    pub drive: bool,
    pub counting: bool,
    pub running: bool,
    pub deadline: Option<u32>,
    pub edge: bool,
    pub no_target: bool,
}

impl Mock {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            ticks: 0,
            drive: false,
            counting: false,
            running: false,
            deadline: None,
            edge: false,
            no_target: false,
        }
    }

    pub fn take_ops(&mut self) -> Vec<Op> {
        core::mem::take(&mut self.ops)
    }

    /// Nothing is left running that could fire a callback
    pub fn quiet(&self) -> bool {
        !self.drive && !self.counting && !self.running && self.deadline.is_none() && !self.edge
    }
}

impl Waveform for Mock {
    fn enable_drive(&mut self) {
        self.drive = true;
        self.ops.push(Op::DriveOn);
    }

    fn disable_drive(&mut self) {
        self.drive = false;
        self.ops.push(Op::DriveOff);
    }

    fn enable_counting(&mut self) {
        self.counting = true;
        self.ops.push(Op::CountingOn);
    }

    fn disable_counting(&mut self) {
        self.counting = false;
        self.ops.push(Op::CountingOff);
    }
}

impl RangeTimer for Mock {
    fn start(&mut self) {
        self.ticks = 0;
        self.running = true;
        self.deadline = None;
        self.ops.push(Op::TimerStart);
    }

    fn arm_deadline(&mut self, ticks: u32) {
        self.deadline = Some(ticks);
        self.ops.push(Op::Deadline(ticks));
    }

    fn ticks(&self) -> u32 {
        self.ticks
    }

    fn stop(&mut self) {
        self.running = false;
        self.deadline = None;
        self.ops.push(Op::TimerStop);
    }
}

impl EchoLine for Mock {
    fn enable_edge(&mut self) {
        self.edge = true;
        self.ops.push(Op::EdgeOn);
    }

    fn disable_edge(&mut self) {
        self.edge = false;
        self.ops.push(Op::EdgeOff);
    }
}

impl Indicator for Mock {
    fn set_no_target(&mut self, on: bool) {
        self.no_target = on;
        self.ops.push(Op::NoTarget(on));
    }
}
