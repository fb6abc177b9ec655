use httpmock::prelude::*;
use isoreach::domain::ports::IsochroneSource;
use isoreach::{IsochroneError, IsochroneRequest, OpenRouteClient, Origin, RingSource, TravelMode};
use serde_json::{json, Value};
use std::time::Duration;

const KEY: &str = "5b3ce3597851110001cf6248a1b2c3d4e5f6a7b8";

fn berlin() -> Origin {
    Origin::new(52.52, 13.405)
}

fn square(half: f64) -> Value {
    json!([[
        [13.405 - half, 52.52 - half],
        [13.405 + half, 52.52 - half],
        [13.405 + half, 52.52 + half],
        [13.405 - half, 52.52 + half],
        [13.405 - half, 52.52 - half]
    ]])
}

/// Features in ascending order, the way the service usually answers.
fn isochrone_response(seconds: &[u32]) -> Value {
    let features: Vec<Value> = seconds
        .iter()
        .enumerate()
        .map(|(i, value)| {
            json!({
                "type": "Feature",
                "properties": { "group_index": 0, "value": value, "center": [13.405, 52.52] },
                "geometry": { "type": "Polygon", "coordinates": square(0.002 * (i + 1) as f64) }
            })
        })
        .collect();
    json!({ "type": "FeatureCollection", "bbox": [13.3, 52.4, 13.5, 52.6], "features": features })
}

fn client(server: &MockServer) -> OpenRouteClient {
    OpenRouteClient::new(server.url("/v2/isochrones"), Duration::from_secs(2))
}

#[tokio::test]
async fn test_fetch_sends_expected_request_and_sorts_rings() {
    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v2/isochrones/foot-walking")
                .header("authorization", KEY)
                .header("content-type", "application/json")
                .json_body(json!({
                    "locations": [[13.405, 52.52]],
                    "range": [300, 600, 900, 1200],
                    "range_type": "time",
                    "smoothing": 0.9
                }));
            then.status(200)
                .header("Content-Type", "application/geo+json")
                .json_body(isochrone_response(&[300, 600, 900, 1200]));
        })
        .await;

    let request = IsochroneRequest::with_default_thresholds(berlin(), TravelMode::Walk);
    let set = client(&server).fetch(&request, KEY).await.unwrap();

    api_mock.assert_async().await;
    assert_eq!(set.thresholds_minutes(), vec![20, 15, 10, 5]);
    assert_eq!(set.source(), Some(RingSource::Live));
    assert!(set.rings().iter().all(|r| r.mode == TravelMode::Walk));
    assert!(set.rings().iter().all(|r| r.speed_kmh.is_none()));
    assert_eq!(set.ring_for_minutes(5).unwrap().opacity, 0.40);
}

#[tokio::test]
async fn test_transit_uses_driving_profile() {
    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v2/isochrones/driving-car");
            then.status(200).json_body(isochrone_response(&[600]));
        })
        .await;

    let request = IsochroneRequest::new(berlin(), TravelMode::Transit, &[10]);
    let set = client(&server).fetch(&request, KEY).await.unwrap();

    api_mock.assert_async().await;
    assert_eq!(set.mode(), TravelMode::Transit);
    assert_eq!(set.len(), 1);
}

#[tokio::test]
async fn test_auth_and_quota_statuses_are_rejections() {
    for status in [401u16, 403, 429] {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/isochrones/driving-car");
                then.status(status)
                    .json_body(json!({ "error": "Access to this API has been disallowed" }));
            })
            .await;

        let request = IsochroneRequest::new(berlin(), TravelMode::Taxi, &[10]);
        let result = client(&server).fetch(&request, KEY).await;
        match result {
            Err(IsochroneError::RemoteRejected { status: got }) => assert_eq!(got, status),
            other => panic!("status {status}: expected RemoteRejected, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_server_error_is_unavailable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(503);
        })
        .await;

    let request = IsochroneRequest::with_default_thresholds(berlin(), TravelMode::Walk);
    let result = client(&server).fetch(&request, KEY).await;
    assert!(matches!(result, Err(IsochroneError::RemoteUnavailable { .. })));
}

#[tokio::test]
async fn test_empty_and_garbled_payloads_are_malformed() {
    let bodies = [
        String::new(),
        "<html>maintenance</html>".to_string(),
        json!({ "type": "FeatureCollection", "features": [] }).to_string(),
    ];

    for body in bodies {
        let server = MockServer::start_async().await;
        let payload = body.clone();
        server
            .mock_async(move |when, then| {
                when.method(POST);
                then.status(200).body(payload);
            })
            .await;

        let request = IsochroneRequest::with_default_thresholds(berlin(), TravelMode::Walk);
        let result = client(&server).fetch(&request, KEY).await;
        assert!(
            matches!(result, Err(IsochroneError::RemoteMalformed { .. })),
            "body {body:?} gave {result:?}"
        );
    }
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(200)
                .delay(Duration::from_millis(1500))
                .json_body(isochrone_response(&[300]));
        })
        .await;

    let client = OpenRouteClient::new(server.url("/v2/isochrones"), Duration::from_millis(100));
    let request = IsochroneRequest::new(berlin(), TravelMode::Walk, &[5]);
    let result = client.fetch(&request, KEY).await;
    assert!(matches!(result, Err(IsochroneError::RemoteUnavailable { .. })));
}

#[tokio::test]
async fn test_connection_refused_is_unavailable() {
    let client = OpenRouteClient::new("http://127.0.0.1:1/v2/isochrones", Duration::from_secs(1));
    let request = IsochroneRequest::new(berlin(), TravelMode::Walk, &[5]);
    let result = client.fetch(&request, KEY).await;
    assert!(matches!(result, Err(IsochroneError::RemoteUnavailable { .. })));
}
