//! Event dispatch into the reference and a recording policy.

use ledmgr::Result;
use ledmgr::app::events::{LedEvent, PowerEvent};
use ledmgr::app::policy::{GATEWAY_CONNECTION_ERROR, IndicatorPolicy, NoopPolicy, dispatch};
use ledmgr::config::ManagerConfig;
use ledmgr::LedManager;

use crate::mock_hw::ManualTimer;

fn manager() -> LedManager {
    LedManager::new(ManualTimer::new(), &ManagerConfig::default())
}

#[derive(Debug, PartialEq, Eq)]
enum Hook {
    Mode(u32),
    Gateway(u32, u32),
    Cdl(u32),
    Key(i32, i32),
    Reset(u32),
    ResetAbort,
}

#[derive(Default)]
struct Recorder {
    hooks: Vec<Hook>,
}

impl IndicatorPolicy for Recorder {
    fn handle_mode_change(&mut self, _mgr: &LedManager, mode: u32) -> Result<()> {
        self.hooks.push(Hook::Mode(mode));
        Ok(())
    }

    fn handle_gateway_connection_event(
        &mut self,
        _mgr: &LedManager,
        state: u32,
        error: u32,
    ) -> Result<()> {
        self.hooks.push(Hook::Gateway(state, error));
        Ok(())
    }

    fn handle_cdl_event(&mut self, _mgr: &LedManager, state: u32) -> Result<()> {
        self.hooks.push(Hook::Cdl(state));
        Ok(())
    }

    fn handle_key_press(&mut self, _mgr: &LedManager, code: i32, kind: i32) -> Result<()> {
        self.hooks.push(Hook::Key(code, kind));
        Ok(())
    }

    fn handle_device_reset(&mut self, _mgr: &LedManager, sequence_step: u32) -> Result<()> {
        self.hooks.push(Hook::Reset(sequence_step));
        Ok(())
    }

    fn handle_device_reset_abort(&mut self, _mgr: &LedManager) -> Result<()> {
        self.hooks.push(Hook::ResetAbort);
        Ok(())
    }
}

#[test]
fn power_mode_updates_manager_only() {
    let mgr = manager();
    let mut policy = Recorder::default();

    dispatch(&mgr, &mut policy, LedEvent::Power(PowerEvent::ModeChanged { powered_on: true }))
        .unwrap();
    assert!(mgr.power_state());
    dispatch(&mgr, &mut policy, LedEvent::Power(PowerEvent::ModeChanged { powered_on: false }))
        .unwrap();
    assert!(!mgr.power_state());
    assert!(policy.hooks.is_empty());
}

#[test]
fn events_reach_their_hooks() {
    let mgr = manager();
    let mut policy = Recorder::default();
    let events = [
        LedEvent::ModeChange { mode: 2 },
        LedEvent::GatewayConnection { state: 0, error: 7 },
        LedEvent::FirmwareDownload { state: 3 },
        LedEvent::KeyPress { code: 0x41, kind: 1 },
        LedEvent::Power(PowerEvent::ResetSequence { progress: 0 }),
        LedEvent::Power(PowerEvent::ResetSequence { progress: 2 }),
        LedEvent::Power(PowerEvent::ResetSequence { progress: -1 }),
    ];
    for event in events {
        dispatch(&mgr, &mut policy, event).unwrap();
    }
    assert_eq!(
        policy.hooks,
        vec![
            Hook::Mode(2),
            Hook::Gateway(0, 7),
            Hook::Cdl(3),
            Hook::Key(0x41, 1),
            Hook::Reset(0),
            Hook::Reset(2),
            Hook::ResetAbort,
        ]
    );
}

#[test]
fn key_press_forwarded_while_powered_off() {
    let mgr = manager();
    let mut policy = Recorder::default();
    assert!(!mgr.power_state());

    dispatch(&mgr, &mut policy, LedEvent::KeyPress { code: 0x20, kind: 0 }).unwrap();
    assert_eq!(policy.hooks, vec![Hook::Key(0x20, 0)]);
}

#[test]
fn noop_policy_tracks_gateway_error_bit() {
    let mgr = manager();
    let mut policy = NoopPolicy::default();
    let disconnect = LedEvent::GatewayConnection { state: 0, error: 1 };
    let connect = LedEvent::GatewayConnection { state: 1, error: 0 };

    dispatch(&mgr, &mut policy, disconnect).unwrap();
    assert_eq!(mgr.error_flags(), 1 << GATEWAY_CONNECTION_ERROR);
    assert_eq!(policy.error_transitions, 1);

    // Repeated disconnects are not new transitions.
    dispatch(&mgr, &mut policy, disconnect).unwrap();
    assert_eq!(policy.error_transitions, 1);

    dispatch(&mgr, &mut policy, connect).unwrap();
    assert_eq!(mgr.error_flags(), 0);
    assert_eq!(policy.error_transitions, 2);
}

#[test]
fn noop_policy_ignores_unknown_gateway_states() {
    let mgr = manager();
    let mut policy = NoopPolicy::default();
    dispatch(&mgr, &mut policy, LedEvent::GatewayConnection { state: 9, error: 0 }).unwrap();
    assert_eq!(mgr.error_flags(), 0);
    assert_eq!(policy.error_transitions, 0);
}

#[test]
fn noop_policy_accepts_everything_else() {
    let mgr = manager();
    let mut policy = NoopPolicy::default();
    for event in [
        LedEvent::ModeChange { mode: 0 },
        LedEvent::FirmwareDownload { state: 1 },
        LedEvent::KeyPress { code: 1, kind: 0 },
        LedEvent::Power(PowerEvent::ResetSequence { progress: 1 }),
        LedEvent::Power(PowerEvent::ResetSequence { progress: -1 }),
    ] {
        assert_eq!(dispatch(&mgr, &mut policy, event), Ok(()));
    }
    assert_eq!(mgr.error_flags(), 0);
}
