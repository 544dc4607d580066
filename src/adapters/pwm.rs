//! `IndicatorHal` implementations over `embedded-hal` 1.0 traits.
//!
//! - [`PwmIndicator`]: a single dimmable LED on one PWM channel.
//!   Off is duty 0, on is the stored brightness.
//! - [`GpioIndicator`]: a plain on/off LED on a push-pull pin.
//!   Brightness is fixed at 100 %.
//!
//! Neither has a colour channel; colour calls report
//! [`HalError::Unsupported`] and the indicator logs and carries on.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

use crate::app::ports::{Color, IndicatorHal};
use crate::error::HalError;

// ── PWM ───────────────────────────────────────────────────────

pub struct PwmIndicator<P> {
    name: String,
    pwm: P,
    brightness: u8,
    on: bool,
}

impl<P: SetDutyCycle> PwmIndicator<P> {
    pub fn new(name: &str, pwm: P, brightness: u8) -> Self {
        Self {
            name: name.to_owned(),
            pwm,
            brightness: brightness.min(100),
            on: false,
        }
    }

    fn apply(&mut self) -> Result<(), HalError> {
        let result = if self.on {
            self.pwm.set_duty_cycle_percent(self.brightness)
        } else {
            self.pwm.set_duty_cycle_fully_off()
        };
        result.map_err(|_| HalError::WriteFailed)
    }
}

impl<P: SetDutyCycle + Send> IndicatorHal for PwmIndicator<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_state(&mut self, on: bool) -> Result<(), HalError> {
        self.on = on;
        self.apply()
    }

    fn set_brightness(&mut self, percent: u8, _persist: bool) -> Result<(), HalError> {
        self.brightness = percent.min(100);
        if self.on { self.apply() } else { Ok(()) }
    }

    fn set_color(&mut self, _color: Color, _persist: bool) -> Result<(), HalError> {
        Err(HalError::Unsupported)
    }

    fn brightness(&self) -> Result<u8, HalError> {
        Ok(self.brightness)
    }

    fn color(&self) -> Result<Color, HalError> {
        Err(HalError::Unsupported)
    }

    fn state(&self) -> Result<bool, HalError> {
        Ok(self.on)
    }
}

// ── GPIO ──────────────────────────────────────────────────────

pub struct GpioIndicator<P> {
    name: String,
    pin: P,
    active_low: bool,
    on: bool,
}

impl<P: OutputPin> GpioIndicator<P> {
    pub fn new(name: &str, pin: P, active_low: bool) -> Self {
        Self {
            name: name.to_owned(),
            pin,
            active_low,
            on: false,
        }
    }
}

impl<P: OutputPin + Send> IndicatorHal for GpioIndicator<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_state(&mut self, on: bool) -> Result<(), HalError> {
        let result = if on != self.active_low {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        result.map_err(|_| HalError::WriteFailed)?;
        self.on = on;
        Ok(())
    }

    fn set_brightness(&mut self, _percent: u8, _persist: bool) -> Result<(), HalError> {
        Err(HalError::Unsupported)
    }

    fn set_color(&mut self, _color: Color, _persist: bool) -> Result<(), HalError> {
        Err(HalError::Unsupported)
    }

    fn brightness(&self) -> Result<u8, HalError> {
        Ok(100)
    }

    fn color(&self) -> Result<Color, HalError> {
        Err(HalError::Unsupported)
    }

    fn state(&self) -> Result<bool, HalError> {
        Ok(self.on)
    }
}
