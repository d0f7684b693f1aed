//! Integration tests for `ZippopotamClient` and `ZipResolver` using wiremock
//! HTTP mocks.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use storeloc_db::{KvStore, MemoryKvStore};
use storeloc_geocode::{GeocodeError, GeocodeSource, Resolution, ZipResolver, ZippopotamClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> ZippopotamClient {
    ZippopotamClient::with_base_url(1, base_url).expect("client construction should not fail")
}

fn beverly_hills_body() -> serde_json::Value {
    json!({
        "post code": "90210",
        "country": "United States",
        "country abbreviation": "US",
        "places": [{
            "place name": "Beverly Hills",
            "longitude": "-118.4065",
            "state": "California",
            "state abbreviation": "CA",
            "latitude": "34.0901"
        }]
    })
}

async fn mount_90210(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/us/90210"))
        .respond_with(ResponseTemplate::new(200).set_body_json(beverly_hills_body()))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn lookup_parses_first_place() {
    let server = MockServer::start().await;
    mount_90210(&server, 1).await;

    let client = test_client(&format!("{}/us", server.uri()));
    let coordinate = client.lookup("90210").await.expect("should resolve");

    assert!((coordinate.lat - 34.0901).abs() < 1e-9);
    assert!((coordinate.lon + 118.4065).abs() < 1e-9);
    assert_eq!(coordinate.city.as_deref(), Some("Beverly Hills"));
    assert_eq!(coordinate.state.as_deref(), Some("CA"));
}

#[tokio::test]
async fn lookup_maps_404_to_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/us/00000"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = test_client(&format!("{}/us", server.uri()));
    let err = client.lookup("00000").await.unwrap_err();
    assert!(matches!(err, GeocodeError::Status { status: 404, .. }));
}

#[tokio::test]
async fn lookup_rejects_empty_places() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/us/99999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"places": []})))
        .mount(&server)
        .await;

    let client = test_client(&format!("{}/us", server.uri()));
    let err = client.lookup("99999").await.unwrap_err();
    assert!(matches!(err, GeocodeError::NoPlaces(ref zip) if zip == "99999"));
}

#[tokio::test]
async fn lookup_rejects_non_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/us/90210"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = test_client(&format!("{}/us", server.uri()));
    let err = client.lookup("90210").await.unwrap_err();
    assert!(matches!(err, GeocodeError::Deserialize { .. }));
}

#[tokio::test]
async fn lookup_times_out_as_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/us/90210"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(beverly_hills_body())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = test_client(&format!("{}/us", server.uri()));
    let err = client.lookup("90210").await.unwrap_err();
    assert!(matches!(err, GeocodeError::Http(ref e) if e.is_timeout()));
}

#[tokio::test]
async fn resolver_calls_geocoder_once_per_zip() {
    let server = MockServer::start().await;
    mount_90210(&server, 1).await;

    let kv = Arc::new(MemoryKvStore::new());
    let resolver = ZipResolver::new(
        Arc::new(test_client(&format!("{}/us", server.uri()))),
        kv.clone(),
    );

    assert!(matches!(resolver.resolve("90210").await, Resolution::Fetched(_)));
    assert!(matches!(resolver.resolve("90210").await, Resolution::Cached(_)));
    assert!(kv.get("zip:90210").await.unwrap().is_some());
    // MockServer verifies `expect(1)` on drop.
}

#[tokio::test]
async fn resolver_falls_back_once_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/us/10001"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let kv = Arc::new(MemoryKvStore::new());
    kv.set(
        "zip:10001",
        json!({"lat": 40.7506, "lon": -73.9972, "city": "New York", "state": "NY"}),
    )
    .await
    .unwrap();
    let resolver = ZipResolver::new(Arc::new(test_client(&format!("{}/us", server.uri()))), kv);

    let resolution = resolver.resolve("10001").await;
    assert!(matches!(resolution, Resolution::Fallback(_)));
    assert_eq!(
        resolution.coordinate().and_then(|c| c.state.as_deref()),
        Some("NY")
    );
}

#[tokio::test]
async fn resolver_reports_not_found_for_unknown_zip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/us/00000"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({})))
        .mount(&server)
        .await;

    let resolver = ZipResolver::new(
        Arc::new(test_client(&format!("{}/us", server.uri()))),
        Arc::new(MemoryKvStore::new()),
    );
    assert_eq!(resolver.resolve("00000").await, Resolution::NotFound);
}
