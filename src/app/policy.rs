//! Event-handler extension points.
//!
//! Which pattern a given system event should show is a product decision,
//! so it lives behind [`IndicatorPolicy`].  [`dispatch`] routes every bus
//! event to the right hook after applying the manager-level bookkeeping
//! (power flag) that every product shares.
//!
//! [`NoopPolicy`] is the reference vendor layer: it tracks the gateway
//! error bit and reports transitions but leaves the indicators alone.

use log::{debug, info};

use crate::error::Result;
use crate::manager::LedManager;

use super::events::{LedEvent, PowerEvent};

/// Error bit for a lost gateway connection.
pub const GATEWAY_CONNECTION_ERROR: u32 = 0;

/// System mode value for normal operation.
pub const MODE_NORMAL: u32 = 0;

/// Hooks a product implements to map system events onto indicators.
pub trait IndicatorPolicy {
    fn handle_mode_change(&mut self, mgr: &LedManager, mode: u32) -> Result<()>;

    fn handle_gateway_connection_event(
        &mut self,
        mgr: &LedManager,
        state: u32,
        error: u32,
    ) -> Result<()>;

    fn handle_cdl_event(&mut self, mgr: &LedManager, state: u32) -> Result<()>;

    fn handle_key_press(&mut self, mgr: &LedManager, code: i32, kind: i32) -> Result<()>;

    fn handle_device_reset(&mut self, mgr: &LedManager, sequence_step: u32) -> Result<()>;

    fn handle_device_reset_abort(&mut self, mgr: &LedManager) -> Result<()>;
}

/// Route one bus event to the manager and the policy.
pub fn dispatch(mgr: &LedManager, policy: &mut impl IndicatorPolicy, event: LedEvent) -> Result<()> {
    debug!("dispatch: {:?}", event);
    match event {
        LedEvent::Power(PowerEvent::ModeChanged { powered_on }) => {
            mgr.set_power_state(powered_on);
            Ok(())
        }
        LedEvent::Power(PowerEvent::ResetSequence { progress }) => match u32::try_from(progress) {
            Ok(step) => {
                info!("Reset sequence {}", step);
                policy.handle_device_reset(mgr, step)
            }
            Err(_) => {
                info!("Exit reset sequence");
                policy.handle_device_reset_abort(mgr)
            }
        },
        LedEvent::ModeChange { mode } => policy.handle_mode_change(mgr, mode),
        LedEvent::GatewayConnection { state, error } => {
            policy.handle_gateway_connection_event(mgr, state, error)
        }
        LedEvent::FirmwareDownload { state } => policy.handle_cdl_event(mgr, state),
        LedEvent::KeyPress { code, kind } => policy.handle_key_press(mgr, code, kind),
    }
}

/// Reference policy: error tracking only, no indicator changes.
#[derive(Debug, Default)]
pub struct NoopPolicy {
    /// Number of 0↔non-zero error transitions observed.
    pub error_transitions: u32,
}

impl IndicatorPolicy for NoopPolicy {
    fn handle_mode_change(&mut self, mgr: &LedManager, mode: u32) -> Result<()> {
        if !mgr.power_state() {
            return Ok(());
        }
        if mode == MODE_NORMAL {
            info!("Detected mode change to NORMAL");
        }
        Ok(())
    }

    fn handle_gateway_connection_event(
        &mut self,
        mgr: &LedManager,
        state: u32,
        _error: u32,
    ) -> Result<()> {
        match state {
            0 => {
                info!("Detected gateway disconnect");
                if mgr.set_error(GATEWAY_CONNECTION_ERROR, true)? {
                    self.error_transitions += 1;
                }
            }
            1 => {
                info!("Detected gateway connection");
                if mgr.set_error(GATEWAY_CONNECTION_ERROR, false)? {
                    self.error_transitions += 1;
                }
            }
            other => debug!("gateway state {} ignored", other),
        }
        Ok(())
    }

    fn handle_cdl_event(&mut self, _mgr: &LedManager, _state: u32) -> Result<()> {
        Ok(())
    }

    fn handle_key_press(&mut self, _mgr: &LedManager, _code: i32, _kind: i32) -> Result<()> {
        Ok(())
    }

    fn handle_device_reset(&mut self, _mgr: &LedManager, _sequence_step: u32) -> Result<()> {
        Ok(())
    }

    fn handle_device_reset_abort(&mut self, _mgr: &LedManager) -> Result<()> {
        Ok(())
    }
}
