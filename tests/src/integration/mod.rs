//! Integration tests across subsystems.

pub mod gateway_flows;
pub mod list_flows;
pub mod live_flows;
