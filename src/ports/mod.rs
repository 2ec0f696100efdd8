//! Port traits for the external collaborators of the backtest core.

pub mod config_port;
pub mod data_port;
pub mod report_port;
