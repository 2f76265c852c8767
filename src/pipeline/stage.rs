//! Chain-of-responsibility plumbing: stages, continuations and the pipeline.
//!
//! A [`Pipeline`] is an ordered list of [`Stage`]s in front of a terminal
//! [`HttpClient`]. The first stage added is the outermost: it sees the request
//! first and the response last. Each stage receives a [`Next`] continuation
//! and decides whether to call it (possibly more than once) or answer the
//! request itself.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use super::{
    HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestTransport, RetryPolicy, RetryStage,
    TransportConfig, UrlSafetyFilter,
};

/// Boxed future returned by stages and continuations.
pub type StageFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;

/// A composable unit of the request pipeline.
///
/// # Example
///
/// ```ignore
/// use http_sender::pipeline::{HttpRequest, Next, Stage, StageFuture};
///
/// struct Tag;
///
/// impl Stage for Tag {
///     fn name(&self) -> &'static str {
///         "tag"
///     }
///
///     fn handle<'a>(&'a self, mut request: HttpRequest, next: Next<'a>) -> StageFuture<'a> {
///         request.headers.insert("x-tag", http::HeaderValue::from_static("1"));
///         next.run(request)
///     }
/// }
/// ```
pub trait Stage: Send + Sync {
    /// Short identifier used in logs and debug output.
    fn name(&self) -> &'static str;

    /// Handles a request, forwarding to `next` or short-circuiting.
    fn handle<'a>(&'a self, request: HttpRequest, next: Next<'a>) -> StageFuture<'a>;
}

/// Object-safe view of an [`HttpClient`].
trait Terminal: Send + Sync {
    fn call(&self, request: HttpRequest) -> StageFuture<'_>;
}

impl<C: HttpClient> Terminal for C {
    fn call(&self, request: HttpRequest) -> StageFuture<'_> {
        Box::pin(self.request(request))
    }
}

/// Continuation to the remaining stages and the terminal client.
///
/// `Next` is `Copy`, so a stage can invoke it repeatedly (the retry stage
/// does exactly that).
#[derive(Clone, Copy)]
pub struct Next<'a> {
    stages: &'a [Box<dyn Stage>],
    terminal: &'a dyn Terminal,
}

impl<'a> Next<'a> {
    /// Passes the request to the next stage, or to the terminal client when
    /// no stages remain.
    pub fn run(self, request: HttpRequest) -> StageFuture<'a> {
        match self.stages.split_first() {
            Some((stage, rest)) => stage.handle(
                request,
                Next {
                    stages: rest,
                    terminal: self.terminal,
                },
            ),
            None => self.terminal.call(request),
        }
    }

    /// Number of stages left before the terminal client.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.stages.len()
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("stages", &stage_names(self.stages))
            .finish_non_exhaustive()
    }
}

/// An ordered stage list in front of a terminal client.
///
/// Pipelines are built once and shared (typically behind an `Arc`) by every
/// caller that sends requests; all state they hold is internally synchronized.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    terminal: Box<dyn Terminal>,
}

impl Pipeline {
    /// Starts building a pipeline.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Creates the standard chain: URL safety filter, then retry, then a
    /// pooled [`ReqwestTransport`].
    ///
    /// The filter sits outside the retry stage, so local rejections are
    /// never retried.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::ClientBuild`] if the transport cannot be created.
    pub fn standard(
        filter: UrlSafetyFilter,
        policy: RetryPolicy,
        transport: TransportConfig,
    ) -> Result<Self, HttpError> {
        Ok(Self::builder()
            .stage(filter)
            .stage(RetryStage::new(policy))
            .client(ReqwestTransport::new(transport)?))
    }

    /// Creates a pipeline without stages: requests go straight to `client`.
    #[must_use]
    pub fn direct<C: HttpClient + 'static>(client: C) -> Self {
        Self::builder().client(client)
    }

    /// Sends a request through every stage and the terminal client.
    ///
    /// # Errors
    ///
    /// Returns whatever [`HttpError`] escaped the stages.
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.entry().run(request).await
    }

    /// Names of the stages, outermost first.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        stage_names(&self.stages)
    }

    fn entry(&self) -> Next<'_> {
        Next {
            stages: &self.stages,
            terminal: self.terminal.as_ref(),
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<Box<dyn Stage>>,
}

impl PipelineBuilder {
    /// Appends a stage. Stages run in the order they are added.
    #[must_use]
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Finishes the pipeline with its terminal client.
    #[must_use]
    pub fn client<C: HttpClient + 'static>(self, client: C) -> Pipeline {
        Pipeline {
            stages: self.stages,
            terminal: Box::new(client),
        }
    }
}

impl fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("stages", &stage_names(&self.stages))
            .finish()
    }
}

fn stage_names(stages: &[Box<dyn Stage>]) -> Vec<&'static str> {
    stages.iter().map(|stage| stage.name()).collect()
}
