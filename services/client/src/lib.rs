//! services/client/src/lib.rs

pub mod adapters;
pub mod cli;
pub mod config;
pub mod error;
pub mod state;
