use async_trait::async_trait;
use httpmock::prelude::*;
use isoreach::core::provider::RequestToken;
use isoreach::domain::ports::IsochroneSource;
use isoreach::{
    IsochroneProvider, IsochroneRequest, IsochroneSet, OpenRouteClient, Origin, RequestState,
    RingSource, SyntheticIsochroneGenerator, TravelMode,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const KEY: &str = "5b3ce3597851110001cf6248a1b2c3d4e5f6a7b8";

fn berlin_walk() -> IsochroneRequest {
    IsochroneRequest::with_default_thresholds(Origin::new(52.52, 13.405), TravelMode::Walk)
}

/// Answers with synthetic-shaped rings tagged as live, after a delay.
struct SlowSource {
    delay: Duration,
}

#[async_trait]
impl IsochroneSource for SlowSource {
    async fn fetch(&self, request: &IsochroneRequest, _: &str) -> isoreach::Result<IsochroneSet> {
        tokio::time::sleep(self.delay).await;
        let rings = SyntheticIsochroneGenerator::default()
            .generate(request)
            .into_rings()
            .into_iter()
            .map(|mut ring| {
                ring.source = RingSource::Live;
                ring.speed_kmh = None;
                ring.distance_km = None;
                ring
            })
            .collect();
        Ok(IsochroneSet::new(request.origin, request.mode, rings))
    }
}

fn ten_minute_response() -> serde_json::Value {
    json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": { "value": 600 },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [13.39, 52.51], [13.42, 52.51], [13.42, 52.53], [13.39, 52.53], [13.39, 52.51]
                ]]
            }
        }]
    })
}

#[tokio::test]
async fn test_live_rings_are_used_when_service_answers() {
    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v2/isochrones/foot-walking")
                .header("authorization", KEY);
            then.status(200).json_body(ten_minute_response());
        })
        .await;

    let provider = IsochroneProvider::new(OpenRouteClient::new(
        server.url("/v2/isochrones"),
        Duration::from_secs(2),
    ));
    let request = IsochroneRequest::new(Origin::new(52.52, 13.405), TravelMode::Walk, &[10]);
    let set = provider.get_isochrones(&request, Some(KEY)).await;

    api_mock.assert_async().await;
    assert_eq!(set.source(), Some(RingSource::Live));
    assert_eq!(set.thresholds_minutes(), vec![10]);
}

#[tokio::test]
async fn test_partial_answer_falls_back_to_synthetic() {
    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v2/isochrones/foot-walking");
            then.status(200).json_body(ten_minute_response());
        })
        .await;

    let provider = IsochroneProvider::new(OpenRouteClient::new(
        server.url("/v2/isochrones"),
        Duration::from_secs(2),
    ));
    let set = provider.get_isochrones(&berlin_walk(), Some(KEY)).await;

    api_mock.assert_async().await;
    assert_eq!(set.source(), Some(RingSource::Synthetic));
    assert_eq!(set.thresholds_minutes(), vec![20, 15, 10, 5]);
    assert_eq!(set, provider.generator().generate(&berlin_walk()));
}

#[tokio::test]
async fn test_rejected_credential_falls_back_to_synthetic() {
    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(403).json_body(json!({ "error": "forbidden" }));
        })
        .await;

    let provider = IsochroneProvider::new(OpenRouteClient::new(
        server.url("/v2/isochrones"),
        Duration::from_secs(2),
    ));
    let set = provider.get_isochrones(&berlin_walk(), Some(KEY)).await;

    api_mock.assert_async().await;
    assert_eq!(set.source(), Some(RingSource::Synthetic));
    assert_eq!(set.thresholds_minutes(), vec![20, 15, 10, 5]);
    assert_eq!(set, provider.generator().generate(&berlin_walk()));
}

#[tokio::test]
async fn test_missing_credential_never_calls_service() {
    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200);
        })
        .await;

    let provider = IsochroneProvider::new(OpenRouteClient::new(
        server.url("/v2/isochrones"),
        Duration::from_secs(2),
    ));
    let set = provider.get_isochrones(&berlin_walk(), None).await;

    assert_eq!(api_mock.hits_async().await, 0);
    assert_eq!(set.source(), Some(RingSource::Synthetic));
    assert_eq!(set.len(), 4);
}

#[tokio::test]
async fn test_provider_timeout_bounds_slow_source() {
    let provider = IsochroneProvider::new(SlowSource {
        delay: Duration::from_secs(5),
    })
    .with_timeout(Duration::from_millis(50));

    let started = std::time::Instant::now();
    let set = provider.get_isochrones(&berlin_walk(), Some(KEY)).await;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(set.source(), Some(RingSource::Synthetic));
}

#[tokio::test]
async fn test_newer_request_supersedes_pending_one() {
    let provider = Arc::new(
        IsochroneProvider::new(SlowSource {
            delay: Duration::from_millis(300),
        })
        .with_timeout(Duration::from_secs(2)),
    );
    let mut states = provider.subscribe();

    let first = {
        let provider = Arc::clone(&provider);
        tokio::spawn(async move { provider.submit(&berlin_walk(), Some(KEY)).await })
    };

    // wait until the first request is in flight
    states
        .wait_for(|state| matches!(state, RequestState::Pending(_)))
        .await
        .unwrap();

    let taxi = IsochroneRequest::new(Origin::new(52.52, 13.405), TravelMode::Taxi, &[10]);
    let second = provider.submit(&taxi, Some(KEY)).await;

    assert!(first.await.unwrap().is_none());
    let second = second.expect("latest request resolves");
    assert_eq!(second.mode(), TravelMode::Taxi);
    assert_eq!(second.source(), Some(RingSource::Live));

    match provider.state() {
        RequestState::Resolved { token, source } => {
            assert_eq!(token.value(), 2);
            assert_eq!(source, RingSource::Live);
        }
        other => panic!("expected resolved state, got {other:?}"),
    }
}

#[tokio::test]
async fn test_state_starts_unrequested() {
    let provider = IsochroneProvider::new(SlowSource {
        delay: Duration::ZERO,
    });
    assert_eq!(provider.state(), RequestState::NotRequested);
    assert_eq!(provider.state().token(), None::<RequestToken>);

    provider.submit(&berlin_walk(), None).await;
    assert!(matches!(
        provider.state(),
        RequestState::Resolved {
            source: RingSource::Synthetic,
            ..
        }
    ));
}
