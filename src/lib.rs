//! http-sender: resilient outbound HTTP dispatch
//!
//! A library for sending HTTP requests through a shared pipeline that
//! refuses unsafe destinations, retries transient failures with exponential
//! backoff and reuses pooled connections.

pub mod config;
pub mod dispatch;
pub mod pipeline;
pub mod time;
