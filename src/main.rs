#![no_main]
#![no_std]

use panic_probe as _;
use defmt_rtt as _;
use stm32f0xx_hal as hal;
use sonar_fw as lib;

#[rtic::app(device = crate::hal::pac, dispatchers = [CEC_CAN, USART3_4])]
mod app {
    use cortex_m::interrupt::free as ifree;
    use systick_monotonic::ExtU64;
    use super::hal;
    use hal::prelude::*;

    use super::lib;
    use lib::bsp::{trace, leds::StatusLed, transducer::Transducer};
    use lib::config::CONFIG;
    use lib::hal_ext::{exti::EdgeLine, gpt::GpTimer, pwm::BurstPwm};
    use lib::ranging::{Measurement, Phase, Ranging};

    #[shared]
    struct Shared {
        ranging: Ranging<Transducer>,
    }

    #[local]
    struct Local {
        status: StatusLed,
    }

    #[monotonic(binds = SysTick, default = true)]
    type Mono = systick_monotonic::Systick<MONO_HZ>;
    pub const MONO_HZ: u32 = 1000;

    #[init]
    fn init(cx: init::Context) -> (Shared, Local, init::Monotonics) {
        let core = cx.core;
        let mut dev = cx.device;

        // 36 MHz gives exact prescalers for both the 2 MHz waveform and the 360 kHz range timer
        let sysclk: hal::time::Hertz = 36.mhz().into();
        let pclk: hal::time::Hertz = 36.mhz().into();
        let mut rcc = dev.RCC
            .configure()
            .sysclk(sysclk)
            .pclk(pclk)
            .freeze(&mut dev.FLASH);

        // Pinout
        let gpioa = dev.GPIOA.split(&mut rcc);
        let gpiob = dev.GPIOB.split(&mut rcc);
        let gpioc = dev.GPIOC.split(&mut rcc);

        trace::init((gpioa.pa2, gpioa.pa3));

        let drive = ifree(|cs| (gpiob.pb0.into_alternate_af1(cs), gpiob.pb1.into_alternate_af1(cs)));
        let echo_pin = ifree(|cs| gpiob.pb6.into_floating_input(cs));
        let driver_en = ifree(|cs| gpiob.pb12.into_push_pull_output(cs).downgrade());
        let no_target_led = ifree(|cs| gpioc.pc9.into_push_pull_output(cs).downgrade());
        let status_led = ifree(|cs| gpioc.pc6.into_push_pull_output(cs).downgrade());

        let pwm = BurstPwm::new(
            dev.TIM3,
            drive,
            hal::time::Hertz(CONFIG.pwm_clock_hz),
            CONFIG.period_ticks,
            CONFIG.duty_ticks,
            CONFIG.counting_compare,
            &mut rcc,
        );
        let timer = GpTimer::new(dev.TIM2, hal::time::Hertz(CONFIG.timer_hz), &mut rcc);
        let echo = EdgeLine::new(dev.EXTI, &mut dev.SYSCFG, echo_pin, &mut rcc);

        let mut transducer = Transducer::new(pwm, timer, echo, driver_en, no_target_led);
        transducer.set_driver_enabled(true);

        let ranging = Ranging::new(transducer, &CONFIG);

        defmt::info!("Liftoff! v{=str} ({=str})",
            lib::build_info::PKG_VERSION,
            lib::build_info::GIT_VERSION.unwrap_or("unknown"),
        );
        defmt::debug!("Carrier {=u32} Hz, listening at {=u32} ticks, deadline {=u32} ms",
            CONFIG.carrier_hz(), CONFIG.listen_ticks(), CONFIG.guard_ms());

        let mono = systick_monotonic::Systick::new(core.SYST, sysclk.0);

        if trigger::spawn().is_err() {
            defmt::error!("Spawn failed: trigger");
        }
        if report::spawn_after((CONFIG.report_interval_ms as u64).millis()).is_err() {
            defmt::error!("Spawn failed: report");
        }
        if blink::spawn().is_err() {
            defmt::error!("Spawn failed: blink");
        }

        let shared = Shared { ranging };
        let local = Local { status: StatusLed::new(status_led) };

        (shared, local, init::Monotonics(mono))
    }

    /// Waveform timer compare interrupts
    #[task(binds = TIM3, priority = 3, shared = [ranging])]
    fn waveform(mut cx: waveform::Context) {
        trace::enter();
        cx.shared.ranging.lock(|r| {
            let events = r.hardware_mut().take_waveform_events();
            if events.counting {
                r.on_counting_period();
            }
            if events.drive {
                r.on_drive_period();
            }
            trace::mark(r.phase() == Phase::Transmitting && r.session().drive_active());
        });
        trace::exit();
    }

    /// Echo detector rising edge
    #[task(binds = EXTI4_15, priority = 3, shared = [ranging])]
    fn echo_edge(mut cx: echo_edge::Context) {
        trace::enter();
        cx.shared.ranging.lock(|r| {
            if r.hardware_mut().take_edge() {
                let edge = r.on_edge();
                defmt::trace!("Edge: {}", edge);
            }
        });
        trace::exit();
    }

    /// Range timer deadline
    #[task(binds = TIM2, priority = 3, shared = [ranging])]
    fn deadline(mut cx: deadline::Context) {
        trace::enter();
        cx.shared.ranging.lock(|r| {
            if r.hardware_mut().take_expired() {
                r.on_expire();
            }
        });
        trace::exit();
    }

    /// Start a new cycle periodically, the previous one is aborted if still running
    #[task(priority = 1, shared = [ranging])]
    fn trigger(mut cx: trigger::Context) {
        cx.shared.ranging.lock(|r| {
            if cfg!(feature = "raw-burst") {
                r.trigger_burst();
            } else {
                r.trigger_ranging();
            }
        });
        if trigger::spawn_after((CONFIG.trigger_interval_ms as u64).millis()).is_err() {
            defmt::error!("Spawn failed: trigger");
        }
    }

    #[task(priority = 1, shared = [ranging])]
    fn report(mut cx: report::Context) {
        let (last, a, b) = cx.shared.ranging.lock(|r| {
            let session = r.session();
            (r.read_last_measurement(), session.diag_snapshot_a(), session.diag_snapshot_b())
        });
        match last {
            // Half of the round trip
            Some(Measurement::Echo(ticks)) => defmt::info!("M: {=u16} ({=u16}) T1: {} T2: {}",
                ticks, ticks / 2, a, b),
            Some(Measurement::NoTarget) => defmt::info!("M: no target T1: {} T2: {}", a, b),
            None => defmt::info!("M: none yet T1: {} T2: {}", a, b),
        }
        if report::spawn_after((CONFIG.report_interval_ms as u64).millis()).is_err() {
            defmt::error!("Spawn failed: report");
        }
    }

    #[task(priority = 1, local = [status])]
    fn blink(cx: blink::Context) {
        cx.local.status.toggle();
        if blink::spawn_after((CONFIG.blink_interval_ms as u64).millis()).is_err() {
            defmt::error!("Spawn failed: blink");
        }
    }

    #[idle]
    fn idle(_cx: idle::Context) -> ! {
        loop {
            trace::idle();
            if cfg!(feature = "idle-sleep") {
                rtic::export::wfi();
            } else {
                rtic::export::nop();
            }
        }
    }
}
