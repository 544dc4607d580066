//! ESP32 LEDC front-panel indicator.
//!
//! One RGB indicator on three LEDC channels sharing one 8-bit timer.
//! Each component's duty is `component * brightness / 100` while the
//! indicator is on and zero while it is off.

use esp_idf_svc::sys::*;
use log::info;

use crate::app::ports::{Color, IndicatorHal};
use crate::error::HalError;

/// PWM frequency for the front-panel LEDs.
const LED_PWM_FREQ_HZ: u32 = 1000;

pub struct LedcIndicator {
    name: String,
    channels: [ledc_channel_t; 3],
    color: Color,
    brightness: u8,
    on: bool,
}

impl LedcIndicator {
    /// Configure `timer` and the three channels, then start dark.
    ///
    /// `pins` are `(channel, gpio)` pairs for red, green and blue.
    pub fn new(
        name: &str,
        timer: ledc_timer_t,
        pins: [(ledc_channel_t, i32); 3],
        color: Color,
        brightness: u8,
    ) -> Result<Self, HalError> {
        let timer_cfg = ledc_timer_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            timer_num: timer,
            duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
            freq_hz: LED_PWM_FREQ_HZ,
            clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
            ..Default::default()
        };
        // SAFETY: plain config structs passed by reference; the driver copies them.
        esp_check(unsafe { ledc_timer_config(&timer_cfg) })?;

        for &(channel, gpio) in &pins {
            let channel_cfg = ledc_channel_config_t {
                speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
                channel,
                timer_sel: timer,
                gpio_num: gpio,
                duty: 0,
                hpoint: 0,
                ..Default::default()
            };
            // SAFETY: as above.
            esp_check(unsafe { ledc_channel_config(&channel_cfg) })?;
        }
        info!("ledc: {} on channels {:?}", name, pins.map(|(c, _)| c));

        Ok(Self {
            name: name.to_owned(),
            channels: pins.map(|(c, _)| c),
            color,
            brightness: brightness.min(100),
            on: false,
        })
    }

    fn apply(&self) -> Result<(), HalError> {
        let components = [(self.color >> 16) & 0xff, (self.color >> 8) & 0xff, self.color & 0xff];
        for (&channel, component) in self.channels.iter().zip(components) {
            let duty = if self.on {
                component * u32::from(self.brightness) / 100
            } else {
                0
            };
            // SAFETY: channel was configured in `new`; only the owning
            // indicator (behind its mutex) writes to it.
            unsafe {
                esp_check(ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, duty))
                    .map_err(|_| HalError::WriteFailed)?;
                esp_check(ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel))
                    .map_err(|_| HalError::WriteFailed)?;
            }
        }
        Ok(())
    }
}

impl IndicatorHal for LedcIndicator {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_state(&mut self, on: bool) -> Result<(), HalError> {
        self.on = on;
        self.apply()
    }

    fn set_brightness(&mut self, percent: u8, _persist: bool) -> Result<(), HalError> {
        self.brightness = percent.min(100);
        self.apply()
    }

    fn set_color(&mut self, color: Color, _persist: bool) -> Result<(), HalError> {
        self.color = color & 0x00ff_ffff;
        self.apply()
    }

    fn brightness(&self) -> Result<u8, HalError> {
        Ok(self.brightness)
    }

    fn color(&self) -> Result<Color, HalError> {
        Ok(self.color)
    }

    fn state(&self) -> Result<bool, HalError> {
        Ok(self.on)
    }
}

fn esp_check(rc: esp_err_t) -> Result<(), HalError> {
    if rc == ESP_OK as esp_err_t {
        Ok(())
    } else {
        log::error!("ledc: driver call failed (rc={})", rc);
        Err(HalError::WriteFailed)
    }
}
