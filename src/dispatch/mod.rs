//! Fluent request building and dispatch.
//!
//! This module provides types for:
//! - Describing one request with chained calls ([`RequestSpec`], [`HeaderInput`])
//! - Sending it through a shared pipeline ([`Dispatcher`])
//! - Inspecting what happened ([`DispatchResult`], [`Outcome`], [`OutcomeKind`])

mod dispatcher;
mod error;
mod headers;
mod request;
mod result;

#[cfg(test)]
mod dispatcher_tests;

pub use dispatcher::Dispatcher;
pub use error::{DispatchError, RequestError};
pub use headers::HeaderInput;
pub use request::{RequestSnapshot, RequestSpec};
pub use result::{DispatchResult, Failure, Outcome, OutcomeKind};
