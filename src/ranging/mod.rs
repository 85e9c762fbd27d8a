//! Ultrasonic time-of-flight ranging
//!
//! A ranging cycle drives the transducer with a short carrier burst, waits
//! for the ringing to die out and then listens for the first echo edge until
//! a deadline. Timing is measured on a single range timer started together
//! with the burst, so the result is the round-trip time in timer ticks.
//!
//! The logic in this module is hardware-agnostic, everything it needs from
//! the MCU is expressed by the traits in [`hw`].

pub mod hw;

mod burst;
mod controller;
mod echo;
mod guard;
mod session;

#[cfg(test)]
mod mock;

pub use burst::BurstGenerator;
pub use controller::Ranging;
pub use echo::{EchoCapture, Edge};
pub use guard::TimeoutGuard;
pub use session::{Fsm, Measurement, Phase, Session, SENTINEL};
