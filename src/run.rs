//! Application execution logic.
//!
//! This module builds the standard pipeline from the validated configuration,
//! sends the configured request once and prints what came back.

use std::io::Write;
use std::sync::Arc;

use thiserror::Error;
use tokio::signal;

use http_sender::config::ValidatedConfig;
use http_sender::dispatch::{DispatchError, DispatchResult, Dispatcher, OutcomeKind, RequestSpec};
use http_sender::pipeline::{HttpError, Pipeline};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// Failed to create the pooled transport.
    #[error("Failed to create HTTP transport: {0}")]
    Transport(#[source] HttpError),

    /// The response body could not be read.
    #[error("Failed to read response body: {0}")]
    Body(#[source] DispatchError),

    /// Writing the result to the output failed.
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Executes one send with the configured request.
///
/// This function:
/// 1. Creates the standard pipeline (URL safety filter, retry, pooled transport)
/// 2. Sends the request, cancelling on Ctrl+C
/// 3. Prints the status line and body to stdout
///
/// Returns the classification of the result so the caller can pick an exit
/// code.
///
/// # Errors
///
/// Returns an error if the transport cannot be created, the body cannot be
/// read, or stdout cannot be written.
///
/// # Coverage Note
///
/// This function is excluded from coverage because it requires real network
/// access and signal handling.
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig) -> Result<OutcomeKind, RunError> {
    let pipeline = Pipeline::standard(config.filter, config.retry_policy, config.transport)
        .map_err(RunError::Transport)?;
    tracing::debug!("Pipeline ready: {:?}", pipeline.stage_names());

    let dispatcher = Dispatcher::new(Arc::new(pipeline));
    let mut stdout = std::io::stdout();

    send_and_print(&dispatcher, config.request, shutdown_signal(), &mut stdout).await
}

/// Sends `request` and writes the outcome to `out`.
///
/// A completed response prints its status line followed by the body; a
/// failure prints the error.
async fn send_and_print<F, W>(
    dispatcher: &Dispatcher,
    request: RequestSpec,
    cancel: F,
    out: &mut W,
) -> Result<OutcomeKind, RunError>
where
    F: Future<Output = ()>,
    W: Write,
{
    let result = dispatcher.send_with_cancel(request, cancel).await;
    let kind = result.kind();
    print_result(result, out).await?;
    Ok(kind)
}

async fn print_result<W: Write>(result: DispatchResult, out: &mut W) -> Result<(), RunError> {
    let duration = result.duration();

    match result.status() {
        Some(status) => {
            writeln!(out, "{status} ({duration:?})")?;
            let body = result.text().await.map_err(RunError::Body)?;
            if !body.is_empty() {
                writeln!(out, "{body}")?;
            }
        }
        None => {
            if let Some(failure) = result.failure() {
                writeln!(out, "Request failed after {duration:?}: {}", failure.error)?;
            }
        }
    }

    Ok(())
}

/// Returns a future that completes when Ctrl+C is pressed.
///
/// If the handler cannot be installed the future never completes, so the
/// request runs to the end.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::warn!("Failed to install Ctrl+C handler: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Cancellation requested, stopping...");
}
