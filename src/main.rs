//! LedMgr firmware entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  Platform event bus (outside this image)             │
//! │        │ LedEvent                                    │
//! │        ▼                                             │
//! │  dispatch() ──▶ IndicatorPolicy ──▶ LedManager       │
//! │                                      │               │
//! │                 esp_timer ◀───────── Indicator ──▶ LEDC
//! └──────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use esp_idf_svc::sys::{
    ledc_channel_t_LEDC_CHANNEL_0, ledc_channel_t_LEDC_CHANNEL_1, ledc_channel_t_LEDC_CHANNEL_2,
    ledc_timer_t_LEDC_TIMER_0,
};

use ledmgr::adapters::esp_timer::EspOneShotTimer;
use ledmgr::adapters::ledc::LedcIndicator;
use ledmgr::app::ports::IndicatorHal;
use ledmgr::config::ManagerConfig;
use ledmgr::{Error, IndicatorState, LedManager};

/// Front-panel RGB pins (R, G, B).
const POWER_LED_GPIOS: [i32; 3] = [38, 39, 40];

/// Warm white.
const POWER_LED_COLOR: u32 = 0x00ff_c080;

fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("ledmgr v{} is running", env!("CARGO_PKG_VERSION"));

    let config = ManagerConfig::default();
    let timer = Arc::new(EspOneShotTimer::new().context("esp_timer service")?);

    let manager = LedManager::from_config(timer, &config, |name| {
        let pins = [
            (ledc_channel_t_LEDC_CHANNEL_0, POWER_LED_GPIOS[0]),
            (ledc_channel_t_LEDC_CHANNEL_1, POWER_LED_GPIOS[1]),
            (ledc_channel_t_LEDC_CHANNEL_2, POWER_LED_GPIOS[2]),
        ];
        let hal = LedcIndicator::new(
            name,
            ledc_timer_t_LEDC_TIMER_0,
            pins,
            POWER_LED_COLOR,
            100,
        )
        .map_err(Error::from)?;
        Ok(Box::new(hal) as Box<dyn IndicatorHal>)
    })
    .map_err(|e| anyhow::anyhow!("manager init failed: {e}"))?;

    manager.diagnostics();
    manager
        .get_indicator("Power")
        .and_then(|power| power.set_state(IndicatorState::SteadyOn))
        .map_err(|e| anyhow::anyhow!("power indicator: {e}"))?;

    // Timer callbacks drive everything from here; the bus adapter holds
    // `manager` and calls `dispatch` as events arrive.
    loop {
        std::thread::park();
    }
}
