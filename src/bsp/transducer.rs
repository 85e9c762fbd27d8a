use embedded_hal::digital::v2::OutputPin;
use crate::hal_ext::{exti::EdgeLine, gpt::GpTimer, pwm::{BurstPwm, PwmEvents}};
use crate::ranging::hw::{Waveform, RangeTimer, EchoLine, Indicator};
use crate::utils::InfallibleResult;
use super::{PushPullPin, leds::Led};

/// Ultrasonic transducer front-end
///
/// Transducer is driven differentially through an RS-232 line driver (the
/// driver enable is active low) and the receiver comparator output is connected
/// to the echo line. The "no target" LED reports the result of the last cycle.
pub struct Transducer {
    pwm: BurstPwm,
    timer: GpTimer,
    echo: EdgeLine,
    driver_en: PushPullPin,
    no_target: Led,
}

impl Transducer {
    pub fn new(
        pwm: BurstPwm,
        timer: GpTimer,
        echo: EdgeLine,
        driver_en: PushPullPin,
        no_target: PushPullPin,
    ) -> Self {
        let mut t = Self { pwm, timer, echo, driver_en, no_target: Led::new(no_target) };
        t.set_driver_enabled(false);
        t
    }

    /// Power the line driver, bursts are silent when disabled
    pub fn set_driver_enabled(&mut self, enabled: bool) {
        if enabled {
            self.driver_en.set_low().infallible();
        } else {
            self.driver_en.set_high().infallible();
        }
    }

    pub fn take_waveform_events(&mut self) -> PwmEvents {
        self.pwm.take_events()
    }

    pub fn take_expired(&mut self) -> bool {
        self.timer.take_expired()
    }

    pub fn take_edge(&mut self) -> bool {
        self.echo.take_pending()
    }
}

impl Waveform for Transducer {
    fn enable_drive(&mut self) {
        self.pwm.enable_drive();
    }

    fn disable_drive(&mut self) {
        self.pwm.disable_drive();
    }

    fn enable_counting(&mut self) {
        self.pwm.enable_counting();
    }

    fn disable_counting(&mut self) {
        self.pwm.disable_counting();
    }
}

impl RangeTimer for Transducer {
    fn start(&mut self) {
        self.timer.start();
    }

    fn arm_deadline(&mut self, ticks: u32) {
        self.timer.arm_deadline(ticks);
    }

    fn ticks(&self) -> u32 {
        self.timer.ticks()
    }

    fn stop(&mut self) {
        self.timer.stop();
    }
}

impl EchoLine for Transducer {
    fn enable_edge(&mut self) {
        self.echo.enable();
    }

    fn disable_edge(&mut self) {
        self.echo.disable();
    }
}

impl Indicator for Transducer {
    fn set_no_target(&mut self, on: bool) {
        self.no_target.set(on);
    }
}
