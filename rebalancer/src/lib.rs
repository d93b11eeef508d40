//! restonks-rebalancer: command-line front end for the restonks engine.
//!
//! Reads a config file, a target weights file and a market snapshot, then
//! prints how to spend new cash toward the targets. Nothing is ever sent to
//! a broker.

pub mod config;
pub mod error;
pub mod execution;
pub mod report;
pub mod snapshot;
pub mod weights;
