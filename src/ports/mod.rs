//! Port traits the boundary layers implement.

pub mod config_port;
pub mod observation_port;
pub mod report_port;
