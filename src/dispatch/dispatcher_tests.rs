//! Tests for `Dispatcher`.

use std::sync::Arc;
use std::time::Duration;

use http::{Method, StatusCode};

use super::{DispatchError, Dispatcher, HeaderInput, Outcome, OutcomeKind, RequestError, RequestSpec};
use crate::pipeline::test_fixtures::MockClient;
use crate::pipeline::{
    INSECURE_URL_MESSAGE, Pipeline, Rejection, RetryPolicy, RetryStage, UrlSafetyFilter,
};
use crate::time::InstantSleeper;

/// Filter, retry without delays, then `client`.
fn chain(client: Arc<MockClient>) -> Arc<Pipeline> {
    Arc::new(
        Pipeline::builder()
            .stage(UrlSafetyFilter::new())
            .stage(RetryStage::new(RetryPolicy::default()).with_sleeper(InstantSleeper))
            .client(client),
    )
}

/// Same as [`chain`] but backoff waits on the tokio clock.
fn timed_chain(client: Arc<MockClient>) -> Arc<Pipeline> {
    Arc::new(
        Pipeline::builder()
            .stage(UrlSafetyFilter::new())
            .stage(RetryStage::new(RetryPolicy::default()))
            .client(client),
    )
}

fn get(uri: &str) -> RequestSpec {
    RequestSpec::new().with_uri(uri).unwrap()
}

mod scenarios {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn successful_get_reports_status_body_and_duration() {
        let client = MockClient::success("hello")
            .with_latency(Duration::from_millis(40))
            .shared();
        let dispatcher = Dispatcher::new(chain(client.clone()));

        let result = dispatcher.send(get("https://example.com/api")).await;

        assert_eq!(result.kind(), OutcomeKind::Success);
        assert_eq!(result.status(), Some(StatusCode::OK));
        assert!(result.duration() >= Duration::from_millis(40));
        assert_eq!(client.calls(), 1);
        assert_eq!(result.text().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn insecure_url_is_rejected_without_network() {
        let client = MockClient::success("ok").shared();
        let dispatcher = Dispatcher::new(chain(client.clone()));

        let result = dispatcher.send(get("http://example.com/api")).await;

        assert_eq!(client.calls(), 0);
        assert_eq!(result.kind(), OutcomeKind::Rejected(Rejection::InsecureScheme));
        assert_eq!(result.status(), Some(StatusCode::FORBIDDEN));
        assert_eq!(result.text().await.unwrap(), INSECURE_URL_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_503_is_returned_after_four_attempts() {
        let client = MockClient::always_status(StatusCode::SERVICE_UNAVAILABLE, "busy").shared();
        let dispatcher = Dispatcher::new(timed_chain(client.clone()));

        let result = dispatcher.send(get("https://example.com/api")).await;

        assert_eq!(client.calls(), 4);
        assert_eq!(
            result.kind(),
            OutcomeKind::NonSuccessStatus(StatusCode::SERVICE_UNAVAILABLE)
        );
        // 2s + 4s + 8s of backoff
        assert!(result.duration() >= Duration::from_secs(14));
    }

    #[tokio::test]
    async fn missing_headers_fail_before_sending() {
        let client = MockClient::success("ok").shared();
        let _dispatcher = Dispatcher::new(chain(client.clone()));

        let err = get("https://example.com/api")
            .with_headers(None, true)
            .unwrap_err();

        assert!(matches!(err, RequestError::MissingHeaders));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn connection_failures_become_a_failed_result() {
        let client = MockClient::always_failing().shared();
        let dispatcher = Dispatcher::new(chain(client.clone()));

        let result = dispatcher.send(get("https://example.com/api")).await;

        assert_eq!(client.calls(), 4);
        assert_eq!(result.kind(), OutcomeKind::TransientNetwork);
        let failure = result.failure().unwrap();
        assert_eq!(
            failure.request.url.as_ref().map(url::Url::as_str),
            Some("https://example.com/api")
        );
    }
}

mod cancellation {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn cancel_during_backoff_stops_retrying() {
        let client = MockClient::always_failing().shared();
        let dispatcher = Dispatcher::new(timed_chain(client.clone()));

        // Attempts run at 0s and 2s; the next one would be at 6s
        let result = dispatcher
            .send_with_cancel(
                get("https://example.com/api"),
                tokio::time::sleep(Duration::from_secs(3)),
            )
            .await;

        assert_eq!(result.kind(), OutcomeKind::Cancelled);
        assert_eq!(client.calls(), 2);
        assert!(result.duration() >= Duration::from_secs(3));
        assert!(result.duration() < Duration::from_secs(6));

        // Nothing keeps running after cancellation
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_attempt_drops_it() {
        let client = MockClient::success("late")
            .with_latency(Duration::from_secs(10))
            .shared();
        let dispatcher = Dispatcher::new(chain(client.clone()));

        let result = dispatcher
            .send_with_cancel(
                get("https://example.com/api"),
                tokio::time::sleep(Duration::from_secs(1)),
            )
            .await;

        assert!(matches!(
            result.into_outcome(),
            Outcome::Failed(failure) if matches!(failure.error, DispatchError::Cancelled)
        ));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn signal_that_never_fires_lets_request_finish() {
        let client = MockClient::success("ok").shared();
        let dispatcher = Dispatcher::new(chain(client));

        let result = dispatcher
            .send_with_cancel(get("https://example.com/api"), std::future::pending())
            .await;

        assert!(result.is_success());
    }
}

mod endpoints {
    use super::*;

    #[tokio::test]
    async fn use_client_overrides_default_endpoint() {
        let default_client = MockClient::success("default").shared();
        let custom_client = MockClient::success("custom").shared();
        let dispatcher = Dispatcher::new(chain(default_client.clone()));

        let spec = RequestSpec::new()
            .use_client(Arc::new(Pipeline::direct(custom_client.clone())), false)
            .with_uri("http://plain.example.com/")
            .unwrap();
        let result = dispatcher.send(spec).await;

        // A direct endpoint has no filter, so plain http goes through
        assert!(result.is_success());
        assert_eq!(custom_client.calls(), 1);
        assert_eq!(default_client.calls(), 0);
        assert_eq!(result.text().await.unwrap(), "custom");
    }

    #[test]
    fn default_endpoint_is_shared_by_clones() {
        let dispatcher = Dispatcher::new(chain(MockClient::success("ok").shared()));
        let copy = dispatcher.clone();

        assert!(Arc::ptr_eq(dispatcher.default_endpoint(), copy.default_endpoint()));
    }
}

mod isolation {
    use super::*;

    #[tokio::test]
    async fn spec_without_uri_fails_without_network() {
        let client = MockClient::success("ok").shared();
        let dispatcher = Dispatcher::new(chain(client.clone()));

        let result = dispatcher.send(RequestSpec::new()).await;

        assert_eq!(result.kind(), OutcomeKind::InvalidRequest);
        assert_eq!(result.duration(), Duration::ZERO);
        assert_eq!(client.calls(), 0);
        assert!(result.failure().unwrap().request.url.is_none());
    }

    #[tokio::test]
    async fn consecutive_sends_share_nothing() {
        let client = MockClient::success("ok").shared();
        let dispatcher = Dispatcher::new(chain(client.clone()));

        let first = RequestSpec::new()
            .use_method(Method::POST)
            .with_uri("https://example.com/first")
            .unwrap()
            .with_headers(HeaderInput::flat([("X-Only-First", "1")]), true)
            .unwrap()
            .with_content("first body");
        dispatcher.send(first).await;
        dispatcher.send(get("https://example.com/second")).await;

        let captured = client.captured_requests();
        assert_eq!(captured.len(), 2);
        let second = &captured[1];
        assert_eq!(second.method, Method::GET);
        assert!(second.headers.get("x-only-first").is_none());
        assert!(second.body.is_none());
    }

    #[tokio::test]
    async fn concurrent_sends_each_get_one_result() {
        let client = MockClient::success("ok").shared();
        let dispatcher = Dispatcher::new(chain(client.clone()));

        let sends = (0..8).map(|i| {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                dispatcher
                    .send(get(&format!("https://example.com/{i}")))
                    .await
                    .is_success()
            })
        });
        let mut successes = 0;
        for handle in sends.collect::<Vec<_>>() {
            if handle.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, 8);
        assert_eq!(client.calls(), 8);
    }
}
