//! Ranging configuration

use static_assertions as sa;

/// Compile-time firmware configuration
///
/// Waveform values are in waveform timer ticks, range values in range timer
/// ticks, task intervals in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangingConfig {
    /// Waveform timer counter clock
    pub pwm_clock_hz: u32,
    /// Carrier period
    pub period_ticks: u16,
    /// Drive channels compare value, half of the period gives 50% duty
    pub duty_ticks: u16,
    /// Counting channel compare value
    pub counting_compare: u16,
    /// Periods after which the drive channels are stopped
    pub transmit_periods: u32,
    /// Periods after which listening starts
    pub listen_periods: u32,
    /// Echo edges at or below this value are treated as ringing
    pub reject_ticks: u32,
    /// Range timer counter clock
    pub timer_hz: u32,
    /// No-target deadline
    pub guard_ticks: u32,
    pub trigger_interval_ms: u32,
    pub report_interval_ms: u32,
    pub blink_interval_ms: u32,
}

impl RangingConfig {
    /// Carrier frequency
    pub const fn carrier_hz(&self) -> u32 {
        self.pwm_clock_hz / self.period_ticks as u32
    }

    /// Range timer ticks per carrier period
    pub const fn ticks_per_period(&self) -> u32 {
        self.timer_hz / self.carrier_hz()
    }

    /// Range timer value at which listening starts
    pub const fn listen_ticks(&self) -> u32 {
        (self.listen_periods + 1) * self.ticks_per_period()
    }

    /// Deadline duration rounded up to milliseconds
    pub const fn guard_ms(&self) -> u32 {
        (self.guard_ticks * 1000 + self.timer_hz - 1) / self.timer_hz
    }
}

pub const CONFIG: RangingConfig = RangingConfig {
    pwm_clock_hz: 2_000_000,
    period_ticks: 50,
    duty_ticks: 25,
    counting_compare: 40,
    transmit_periods: 8,
    listen_periods: 160,
    reject_ticks: 1500,
    timer_hz: 360_000,
    guard_ticks: 0xfff0,
    trigger_interval_ms: 200,
    report_interval_ms: 200,
    blink_interval_ms: 500,
};

sa::const_assert_eq!(CONFIG.carrier_hz(), 40_000);
sa::const_assert!(CONFIG.duty_ticks < CONFIG.period_ticks);
sa::const_assert!(CONFIG.counting_compare < CONFIG.period_ticks);
sa::const_assert!(CONFIG.transmit_periods < CONFIG.listen_periods);
sa::const_assert!(CONFIG.guard_ticks < crate::ranging::SENTINEL as u32);
sa::const_assert!(CONFIG.listen_ticks() < CONFIG.guard_ticks);
// A cycle should resolve on its own before the next trigger
sa::const_assert!(CONFIG.guard_ms() < CONFIG.trigger_interval_ms);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_timing() {
        assert_eq!(CONFIG.ticks_per_period(), 9);
        assert_eq!(CONFIG.listen_ticks(), 1449);
        assert_eq!(CONFIG.guard_ms(), 182);
    }

    #[test]
    fn ringing_rejected_only_while_listening() {
        // Reject threshold should only hide the first few hundred microseconds of listening
        assert!(CONFIG.reject_ticks > CONFIG.listen_ticks() / 2);
        assert!(CONFIG.reject_ticks < 2 * CONFIG.listen_ticks());
    }
}
