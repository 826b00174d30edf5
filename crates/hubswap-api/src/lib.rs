//! hubswap-api: HTTP API layer for Hubswap
//!
//! Exposes same-chain best-route quoting and cross-chain planning.

pub mod dto;
pub mod routes;
pub mod server;
pub mod state;

pub use server::*;
pub use state::AppState;
