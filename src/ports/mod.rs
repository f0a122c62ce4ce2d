//! Traits at the external seams.

pub mod candidate_gate;
pub mod config_port;
pub mod data_port;
pub mod report_port;
