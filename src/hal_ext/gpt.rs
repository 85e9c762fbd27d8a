use crate::hal;

type Tim = hal::pac::TIM2;

/// Free-running range counter with a one-shot deadline on TIM2
///
/// TIM2 has a 32-bit counter. The counter is started from 0 with the auto-reload
/// at its maximum, so it only overflows when a deadline has been written to the
/// auto-reload register. One-pulse mode stops the counter on that overflow and
/// the update interrupt signals the expiry.
pub struct GpTimer {
    tim: Tim,
}

impl GpTimer {
    pub fn new<F>(tim: Tim, freq: F, rcc: &mut hal::rcc::Rcc) -> Self
    where
        F: Into<hal::time::Hertz>,
    {
        // Need to access some registers outside of HAL type system (field `regs` is private)
        let rcc_regs = unsafe { &*hal::pac::RCC::ptr() };

        rcc_regs.apb1enr.modify(|_, w| w.tim2en().enabled());
        rcc_regs.apb1rstr.modify(|_, w| w.tim2rst().set_bit());
        rcc_regs.apb1rstr.modify(|_, w| w.tim2rst().clear_bit());

        let psc = super::get_prescaler(super::timer_clock(rcc), freq.into().0);
        tim.psc.write(|w| unsafe { w.psc().bits(psc) });
        tim.arr.write(|w| unsafe { w.bits(u32::MAX) });

        // Update only on overflow, so that UG does not trigger the interrupt
        tim.cr1.write(|w| w.opm().set_bit().urs().set_bit());
        tim.egr.write(|w| w.ug().set_bit());
        tim.sr.write(|w| unsafe { w.bits(0) });
        tim.dier.write(|w| unsafe { w.bits(0) });

        Self { tim }
    }

    /// Restart counting from 0, cancelling the deadline
    pub fn start(&mut self) {
        self.tim.cr1.modify(|_, w| w.cen().clear_bit());
        self.tim.dier.modify(|_, w| w.uie().clear_bit());
        self.tim.arr.write(|w| unsafe { w.bits(u32::MAX) });
        self.tim.cnt.write(|w| unsafe { w.bits(0) });
        self.tim.sr.modify(|_, w| w.uif().clear_bit());
        self.tim.cr1.modify(|_, w| w.cen().set_bit());
    }

    /// Expire when the counter reaches `ticks`
    ///
    /// If the counter is already past `ticks` it will not expire before wrapping
    /// around, so the caller has to check [`Self::ticks`] after arming.
    pub fn arm_deadline(&mut self, ticks: u32) {
        self.tim.arr.write(|w| unsafe { w.bits(ticks) });
        self.tim.sr.modify(|_, w| w.uif().clear_bit());
        self.tim.dier.modify(|_, w| w.uie().set_bit());
    }

    pub fn ticks(&self) -> u32 {
        self.tim.cnt.read().bits()
    }

    pub fn stop(&mut self) {
        self.tim.cr1.modify(|_, w| w.cen().clear_bit());
        self.tim.dier.modify(|_, w| w.uie().clear_bit());
        self.tim.sr.modify(|_, w| w.uif().clear_bit());
    }

    /// Check and clear deadline expiry, to be called from the interrupt
    pub fn take_expired(&mut self) -> bool {
        let expired = self.tim.sr.read().uif().bit_is_set()
            && self.tim.dier.read().uie().bit_is_set();
        self.tim.sr.modify(|_, w| w.uif().clear_bit());
        expired
    }
}
