use crate::hal;
use hal::gpio::{gpiob, Alternate, AF1};

type Tim = hal::pac::TIM3;

/// Active-high drive output, TIM3_CH3
pub type DrivePin = gpiob::PB0<Alternate<AF1>>;
/// Active-low drive output, TIM3_CH4
pub type DriveInvPin = gpiob::PB1<Alternate<AF1>>;

// Output compare mode bits in CCMRx
const OC_PWM1: u32 = 0b110;
const OC1M: u32 = 4;
const OC3M: u32 = 4;
const OC4M: u32 = 12;

// Interrupt flags cleared by writing 0, all other bits written as 1
const SR_RC_W0: u32 = 0x1e5f;
const SR_CC1IF: u32 = 1 << 1;
const SR_CC3IF: u32 = 1 << 3;

/// Compare events that happened since the last call to [`BurstPwm::take_events`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct PwmEvents {
    pub counting: bool,
    pub drive: bool,
}

/// Carrier burst generator on TIM3
///
/// The timer runs continuously, the channels are switched on and off:
/// * CH1 counts periods: no output, compare interrupt once per period
/// * CH3/CH4 drive the transducer with opposite polarity, CH3 compare
///   interrupt once per period while driving
///
/// Drive is stopped by setting compare to 0 which keeps both outputs at
/// their inactive level (CH3 low, CH4 high).
pub struct BurstPwm {
    tim: Tim,
    duty: u16,
}

impl BurstPwm {
    pub fn new<F>(
        tim: Tim,
        _pins: (DrivePin, DriveInvPin),
        freq: F,
        period: u16,
        duty: u16,
        counting_compare: u16,
        rcc: &mut hal::rcc::Rcc,
    ) -> Self
    where
        F: Into<hal::time::Hertz>,
    {
        assert!(duty < period && counting_compare < period);

        // Need to access some registers outside of HAL type system (field `regs` is private)
        let rcc_regs = unsafe { &*hal::pac::RCC::ptr() };

        // Enable timer clock & reset it
        rcc_regs.apb1enr.modify(|_, w| w.tim3en().enabled());
        rcc_regs.apb1rstr.modify(|_, w| w.tim3rst().set_bit());
        rcc_regs.apb1rstr.modify(|_, w| w.tim3rst().clear_bit());

        let psc = super::get_prescaler(super::timer_clock(rcc), freq.into().0);
        tim.psc.write(|w| unsafe { w.psc().bits(psc) });
        tim.arr.write(|w| unsafe { w.bits(period as u32 - 1) });

        // PWM mode 1 without preload, so that compare changes apply within the current period
        tim.ccmr1_output().write(|w| unsafe { w.bits(OC_PWM1 << OC1M) });
        tim.ccmr2_output().write(|w| unsafe { w.bits((OC_PWM1 << OC3M) | (OC_PWM1 << OC4M)) });

        tim.ccr1.write(|w| unsafe { w.bits(counting_compare as u32) });
        tim.ccr3.write(|w| unsafe { w.bits(0) });
        tim.ccr4.write(|w| unsafe { w.bits(0) });

        // CH1 is never connected to a pin
        tim.ccer.write(|w| w.cc3e().set_bit().cc4e().set_bit().cc4p().set_bit());

        // Load prescaler, then drop the flags generated by the update
        tim.egr.write(|w| w.ug().set_bit());
        tim.sr.write(|w| unsafe { w.bits(0) });
        tim.dier.write(|w| unsafe { w.bits(0) });

        tim.cr1.modify(|_, w| w.cen().set_bit());

        Self { tim, duty }
    }

    pub fn enable_drive(&mut self) {
        self.clear(SR_CC3IF);
        self.tim.ccr3.write(|w| unsafe { w.bits(self.duty as u32) });
        self.tim.ccr4.write(|w| unsafe { w.bits(self.duty as u32) });
        self.tim.dier.modify(|_, w| w.cc3ie().set_bit());
    }

    pub fn disable_drive(&mut self) {
        self.tim.ccr3.write(|w| unsafe { w.bits(0) });
        self.tim.ccr4.write(|w| unsafe { w.bits(0) });
        self.tim.dier.modify(|_, w| w.cc3ie().clear_bit());
    }

    pub fn enable_counting(&mut self) {
        self.clear(SR_CC1IF);
        self.tim.dier.modify(|_, w| w.cc1ie().set_bit());
    }

    pub fn disable_counting(&mut self) {
        self.tim.dier.modify(|_, w| w.cc1ie().clear_bit());
    }

    /// Read and clear compare flags of the enabled channels, to be called from the interrupt
    pub fn take_events(&mut self) -> PwmEvents {
        let sr = self.tim.sr.read().bits();
        let dier = self.tim.dier.read().bits();
        let pending = sr & dier & (SR_CC1IF | SR_CC3IF);
        self.clear(pending);
        PwmEvents {
            counting: pending & SR_CC1IF != 0,
            drive: pending & SR_CC3IF != 0,
        }
    }

    fn clear(&mut self, flags: u32) {
        self.tim.sr.write(|w| unsafe { w.bits(SR_RC_W0 & !flags) });
    }
}
