//! Tracing of interrupt tasks on GPIOs
//!
//! With the `debug-tasks` feature PA2 and PA3 become push-pull outputs that
//! can be watched with a logic analyzer:
//! * PA3 is high while any task is running
//! * PA2 marks arbitrary code sections, e.g. the burst window
//!
//! Without the feature all functions compile to nothing.

use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicBool, Ordering};
use cortex_m::interrupt;
use static_assertions as sa;

use crate::{hal, utils::InfallibleResult};
use hal::{gpio, prelude::*};

pub type MarkPin = gpio::gpioa::PA2<gpio::Input<gpio::Floating>>;
pub type TaskPin = gpio::gpioa::PA3<gpio::Input<gpio::Floating>>;

type MarkOut = gpio::gpioa::PA2<gpio::Output<gpio::PushPull>>;
type TaskOut = gpio::gpioa::PA3<gpio::Output<gpio::PushPull>>;
type Pin = gpio::Pin<gpio::Output<gpio::PushPull>>;

static INIT: AtomicBool = AtomicBool::new(false);
static PENDING: AtomicBool = AtomicBool::new(false);

/// Grant GPIOs to this module
pub fn init((mark, task): (MarkPin, TaskPin)) {
    if cfg!(feature = "debug-tasks") {
        interrupt::free(|cs| {
            mark.into_push_pull_output_hs(cs);
            task.into_push_pull_output_hs(cs);
            INIT.store(true, Ordering::SeqCst);
        })
    }
}

#[inline(always)]
fn ensure_init() {
    if !INIT.load(Ordering::SeqCst) {
        panic!("init() never called");
    }
}

// Pins are zero-sized and owned by this module after init()
#[inline(always)]
fn mark_pin() -> Pin {
    sa::const_assert_eq!(core::mem::size_of::<MarkOut>(), 0);
    let pin: MarkOut = unsafe { MaybeUninit::uninit().assume_init() };
    pin.downgrade()
}

#[inline(always)]
fn task_pin() -> Pin {
    sa::const_assert_eq!(core::mem::size_of::<TaskOut>(), 0);
    let pin: TaskOut = unsafe { MaybeUninit::uninit().assume_init() };
    pin.downgrade()
}

/// To be called on task enter
#[inline(always)]
pub fn enter() {
    if cfg!(feature = "debug-tasks") {
        ensure_init();
        PENDING.store(true, Ordering::SeqCst);
        // Always a 0-to-1 transition, so preemption is visible as 111101111...
        task_pin().set_low().infallible();
        task_pin().set_high().infallible();
    }
}

/// To be called on all task exit points
#[inline(always)]
pub fn exit() {
    if cfg!(feature = "debug-tasks") {
        ensure_init();
        task_pin().set_high().infallible();
        task_pin().set_low().infallible();
        // Preempted task is still running
        if PENDING.load(Ordering::SeqCst) {
            task_pin().set_high().infallible();
        }
    }
}

/// Call in idle task to indicate that no tasks are pending
#[inline(always)]
pub fn idle() {
    if cfg!(feature = "debug-tasks") {
        task_pin().set_low().infallible();
        PENDING.store(false, Ordering::SeqCst);
    }
}

/// Set mark pin
#[inline(always)]
pub fn mark(on: bool) {
    if cfg!(feature = "debug-tasks") {
        ensure_init();
        if on {
            mark_pin().set_high().infallible();
        } else {
            mark_pin().set_low().infallible();
        }
    }
}
