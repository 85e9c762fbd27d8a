//! Board support package
//!
//! Code that builds on top of MCU-specific HAL (hal and hal_ext) to implement
//! support for the board and the peripherals located on it.

pub mod leds;
pub mod trace;
pub mod transducer;

use crate::hal::gpio;

pub type PushPullPin = gpio::Pin<gpio::Output<gpio::PushPull>>;
