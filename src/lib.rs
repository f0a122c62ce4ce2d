//! regimetrader: regime-aware momentum backtester over daily bars.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], and a thin front-end in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
