//! Hardware services consumed by the ranging state machine
//!
//! All methods are called from interrupt context with the ranging resource
//! locked, so implementations must be plain register writes and never block.

/// Multi-channel waveform generator
///
/// Two drive channels output the carrier with complementary polarity, the
/// counting channel has no output and only generates a callback each period.
/// Which timer channels play which role is up to the implementation.
pub trait Waveform {
    /// Start both drive channels
    fn enable_drive(&mut self);
    /// Stop both drive channels, outputs go to their idle level
    fn disable_drive(&mut self);
    /// Start period callbacks on the counting channel
    fn enable_counting(&mut self);
    /// Stop period callbacks on the counting channel
    fn disable_counting(&mut self);
}

/// Free-running range counter with a one-shot deadline
pub trait RangeTimer {
    /// Restart counting from 0 with no deadline armed
    fn start(&mut self);
    /// Arm expiry callback when the counter reaches `ticks` (counted from [`Self::start`])
    fn arm_deadline(&mut self, ticks: u32);
    /// Current counter value
    fn ticks(&self) -> u32;
    /// Stop counting and cancel any armed deadline
    fn stop(&mut self);
}

/// Single-line edge interrupt on the echo detector output
pub trait EchoLine {
    /// Clear any stale pending edge and unmask the rising edge interrupt
    fn enable_edge(&mut self);
    /// Mask the edge interrupt
    fn disable_edge(&mut self);
}

/// Diagnostic output signalling that the last cycle saw no target
pub trait Indicator {
    fn set_no_target(&mut self, on: bool);
}

/// Everything the ranging state machine needs
pub trait Hardware: Waveform + RangeTimer + EchoLine + Indicator {}

impl<T: Waveform + RangeTimer + EchoLine + Indicator> Hardware for T {}
