use crate::hal;
use hal::gpio::{gpiob, Input, Floating};

/// Echo detector output
pub type EchoPin = gpiob::PB6<Input<Floating>>;

const LINE: u32 = 6;
const MASK: u32 = 1 << LINE;
// EXTI6 source selection in SYSCFG_EXTICR2
const EXTICR_SHIFT: u32 = 4 * (LINE % 4);
const EXTICR_PORTB: u32 = 0b0001;

/// Rising edge interrupt on a single EXTI line (PB6)
///
/// The line is configured once and then only masked/unmasked, so enabling
/// it is a couple of register writes and can be done from any interrupt.
pub struct EdgeLine {
    exti: hal::pac::EXTI,
}

impl EdgeLine {
    pub fn new(
        exti: hal::pac::EXTI,
        syscfg: &mut hal::pac::SYSCFG,
        _pin: EchoPin,
        _rcc: &mut hal::rcc::Rcc,
    ) -> Self {
        let rcc_regs = unsafe { &*hal::pac::RCC::ptr() };
        rcc_regs.apb2enr.modify(|_, w| w.syscfgen().enabled());

        syscfg.exticr2.modify(|r, w| unsafe {
            w.bits((r.bits() & !(0xf << EXTICR_SHIFT)) | (EXTICR_PORTB << EXTICR_SHIFT))
        });

        exti.imr.modify(|r, w| unsafe { w.bits(r.bits() & !MASK) });
        exti.rtsr.modify(|r, w| unsafe { w.bits(r.bits() | MASK) });
        exti.ftsr.modify(|r, w| unsafe { w.bits(r.bits() & !MASK) });
        exti.pr.write(|w| unsafe { w.bits(MASK) });

        Self { exti }
    }

    /// Drop any edge latched while masked, then unmask
    pub fn enable(&mut self) {
        self.exti.pr.write(|w| unsafe { w.bits(MASK) });
        self.exti.imr.modify(|r, w| unsafe { w.bits(r.bits() | MASK) });
    }

    pub fn disable(&mut self) {
        self.exti.imr.modify(|r, w| unsafe { w.bits(r.bits() & !MASK) });
    }

    /// Check and clear pending edge, to be called from the interrupt
    pub fn take_pending(&mut self) -> bool {
        let pending = self.exti.pr.read().bits() & MASK != 0;
        if pending {
            self.exti.pr.write(|w| unsafe { w.bits(MASK) });
        }
        pending
    }
}
