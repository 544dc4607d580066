//! Application boundary: ports, inbound events and the policy hooks.
//!
//! The indicator core in [`crate::indicator`] and [`crate::manager`] only
//! talks to the outside world through the traits in [`ports`], keeping it
//! testable on the host without a HAL or a reactor.

pub mod events;
pub mod policy;
pub mod ports;
