//! Core domain types and logic.

pub mod backtest;
pub mod breadth;
pub mod config_validation;
pub mod error;
pub mod features;
pub mod gate_features;
pub mod indicator;
pub mod metrics;
pub mod ohlcv;
pub mod portfolio;
pub mod position;
pub mod ranker;
pub mod regime;
pub mod risk;
pub mod series;
pub mod universe;
