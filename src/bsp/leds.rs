use crate::utils::InfallibleResult;
use embedded_hal::digital::v2::OutputPin;
use super::PushPullPin;

/// Single LED with active-high drive
pub struct Led {
    pin: PushPullPin,
    on: bool,
}

impl Led {
    pub fn new(pin: PushPullPin) -> Self {
        let mut led = Self { pin, on: true };
        led.set(false);
        led
    }

    pub fn set(&mut self, on: bool) {
        if on == self.on {
            return;
        }
        if on {
            self.pin.set_high().infallible();
        } else {
            self.pin.set_low().infallible();
        }
        self.on = on;
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

/// Heartbeat LED toggled periodically to show that the firmware is alive
pub struct StatusLed(Led);

impl StatusLed {
    pub fn new(pin: PushPullPin) -> Self {
        Self(Led::new(pin))
    }

    pub fn toggle(&mut self) {
        let on = !self.0.is_on();
        self.0.set(on);
    }
}
