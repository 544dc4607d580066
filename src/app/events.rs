//! Inbound platform events.
//!
//! The bus transport that delivers these is outside this crate; an adapter
//! translates each bus message into a [`LedEvent`] and hands it to
//! [`dispatch`](super::policy::dispatch).

/// Events delivered by the platform event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedEvent {
    /// Power manager reported a change.
    Power(PowerEvent),

    /// System mode changed (normal, warehouse, EAS, ...).
    ModeChange { mode: u32 },

    /// Gateway connectivity changed.  `state == 0` is disconnected,
    /// `state == 1` is connected.
    GatewayConnection { state: u32, error: u32 },

    /// Firmware download (CDL) progress.
    FirmwareDownload { state: u32 },

    /// Remote-control key.
    KeyPress { code: i32, kind: i32 },
}

/// Power manager sub-events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerEvent {
    /// Device power state changed; `true` means fully on.
    ModeChanged { powered_on: bool },

    /// Factory-reset key sequence progress.  Negative means the sequence
    /// was abandoned.
    ResetSequence { progress: i32 },
}
