//! hubswap-core: Shared types, errors, decimal math and configuration
//!
//! This crate provides the foundational types used across the Hubswap workspace.

pub mod cache;
pub mod chains;
pub mod config;
pub mod context;
pub mod decimal;
pub mod errors;
pub mod retry;
pub mod types;

pub use cache::CacheService;
pub use chains::*;
pub use config::*;
pub use context::RequestContext;
pub use decimal::{Decimal, DEFAULT_DIV_PRECISION};
pub use errors::*;
pub use retry::{retry_async, RetryPolicy};
pub use types::*;
