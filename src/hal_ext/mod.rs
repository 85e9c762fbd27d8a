//! Hardware Abstraction Layer
//!
//! This module is an extension to `stm32f0xx_hal` that covers the timer and
//! EXTI features needed for ranging, which the HAL does not expose (compare
//! interrupts per channel, one-pulse deadlines, masking a single EXTI line).

pub mod exti;
pub mod gpt;
pub mod pwm;

use crate::hal;

/// Counter clock of APB timers
///
/// Timer clock is doubled whenever the APB prescaler is not 1.
pub fn timer_clock(rcc: &hal::rcc::Rcc) -> u32 {
    let (hclk, pclk) = (rcc.clocks.hclk().0, rcc.clocks.pclk().0);
    if hclk == pclk { pclk } else { 2 * pclk }
}

/// Prescaler register value for given counter frequency
fn get_prescaler(timer_clk: u32, counter_hz: u32) -> u16 {
    // Be exact, else panic
    match (timer_clk / counter_hz, timer_clk % counter_hz) {
        (_, rem) if rem != 0 => panic!("Unreachable timer frequency"),
        (div, _) if div == 0 || div > 1 << 16 => panic!("Timer prescaler out of range"),
        (div, _) => (div - 1) as u16,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prescaler_exact() {
        assert_eq!(get_prescaler(36_000_000, 2_000_000), 17);
        assert_eq!(get_prescaler(36_000_000, 360_000), 99);
        assert_eq!(get_prescaler(48_000_000, 1_000), 47_999);
        assert_eq!(get_prescaler(8_000_000, 8_000_000), 0);
    }

    #[test]
    #[should_panic(expected = "Unreachable")]
    fn prescaler_unreachable() {
        get_prescaler(48_000_000, 360_000);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn prescaler_too_slow() {
        get_prescaler(48_000_000, 500);
    }
}
