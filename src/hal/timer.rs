//! Output Timer
//!
//! TIM3 paces the output. In square mode channel 1 runs in PWM mode 1 and
//! drives the output pin directly; for table waveforms the channel is
//! disconnected and the update interrupt steps the sample bank instead.

use critical_section::CriticalSection;
use embassy_stm32::interrupt::{self, InterruptExt};
use embassy_stm32::pac;
use embassy_stm32::peripherals::TIM3;
use embassy_stm32::timer::low_level::{OutputCompareMode, Timer};
use embassy_stm32::timer::simple_pwm::PwmPin;
use embassy_stm32::timer::{Channel, Ch1};

use crate::platform::{OutputPort, RegisterWrite};

/// TIM3 as the generator's output port
pub struct OutputTimer<'d> {
    timer: Timer<'d, TIM3>,
    _pin: PwmPin<'d, TIM3, Ch1>,
    last: Option<RegisterWrite>,
}

impl<'d> OutputTimer<'d> {
    /// Take over TIM3 with channel 1 on `pin`
    ///
    /// The timer is left stopped until the first [`OutputPort::apply`].
    #[must_use]
    pub fn new(timer: Timer<'d, TIM3>, pin: PwmPin<'d, TIM3, Ch1>) -> Self {
        timer.stop();
        timer.set_output_compare_mode(Channel::Ch1, OutputCompareMode::PwmMode1);
        timer.enable_update_interrupt(false);

        interrupt::TIM3.unpend();
        // SAFETY: the TIM3 handler only touches the sample bank and the DAC,
        // both of which are behind critical sections.
        #[allow(unsafe_code)]
        unsafe {
            interrupt::TIM3.enable();
        }

        Self {
            timer,
            _pin: pin,
            last: None,
        }
    }

    /// Registers loaded by the last apply
    #[must_use]
    pub const fn last(&self) -> Option<RegisterWrite> {
        self.last
    }

    /// Acknowledge the update interrupt; called from the TIM3 handler
    pub fn clear_update_flag() {
        pac::TIM3.sr().modify(|w| w.set_uif(false));
    }
}

impl OutputPort for OutputTimer<'_> {
    fn apply(&mut self, _cs: CriticalSection<'_>, write: RegisterWrite) {
        let regs = self.timer.regs_gp16();
        let top = u16::try_from(write.period_register).unwrap_or(u16::MAX);
        let compare = u16::try_from(write.compare_register).unwrap_or(u16::MAX);

        regs.cr1().modify(|w| w.set_cen(false));
        regs.psc().write_value(write.prescaler_bits);
        regs.arr().write(|w| w.set_arr(top));
        regs.ccr(0).write(|w| w.set_ccr(compare));
        regs.ccer()
            .modify(|w| w.set_cce(0, write.enabled && write.square));
        // Latch PSC/ARR now instead of at the next overflow
        regs.egr().write(|w| w.set_ug(true));
        regs.sr().modify(|w| w.set_uif(false));
        regs.dier()
            .modify(|w| w.set_uie(write.enabled && !write.square));
        regs.cr1().modify(|w| w.set_cen(write.enabled));

        self.last = Some(write);
        debug!("TIM3 <- {}", write);
    }
}
