//! Shared service utilities

pub mod rate_limiter;

pub use rate_limiter::{RateLimitConfig, RateLimitedClient, RetryConfig, retry_async};
