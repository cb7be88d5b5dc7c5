use crate::api::{app, AppState};
use crate::model::UserId;
use crate::tests::utils::{raw_offer, test_service, StubSource};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn router(source: StubSource) -> Router {
    let service = Arc::new(test_service(Arc::new(source)));
    app(AppState::new(service, UserId::new("johndoe")))
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn offer_body(price: f64) -> Value {
    json!({
        "offer": {
            "id": "tok-1",
            "airlineName": "British Airways",
            "flightNumber": "304",
            "carrierCode": "BA",
            "departureAirport": "LHR",
            "arrivalAirport": "CDG",
            "departureTime": "2024-06-01T10:00:00",
            "arrivalTime": "2024-06-01T12:15:00",
            "durationText": "2h 15m",
            "price": price,
            "currency": "GBP"
        }
    })
}

#[tokio::test]
async fn health_is_ok() {
    let (status, body) = send(&router(StubSource::default()), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn search_returns_normalized_offers() {
    let app = router(StubSource::with_offers(vec![
        raw_offer("BA", "2024-06-01T10:00:00", 250),
        raw_offer("AF", "2024-06-01T09:00:00", 120),
    ]));
    let (status, body) = send(
        &app,
        Method::GET,
        "/flights/search?origin=LHR&destination=CDG&date=2024-06-01&order=cheapest",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let offers = body.as_array().unwrap();
    assert_eq!(offers.len(), 2);
    assert_eq!(offers[0]["carrierCode"], "AF");
    assert_eq!(offers[0]["price"], 120.0);
    assert_eq!(offers[0]["departureAirport"], "LHR");
}

#[tokio::test]
async fn search_without_required_params_is_bad_request() {
    let (status, body) = send(
        &router(StubSource::default()),
        Method::GET,
        "/flights/search?origin=LHR",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required query parameters: origin, destination, date");
}

#[tokio::test]
async fn upstream_failure_is_bad_gateway() {
    let (status, body) = send(
        &router(StubSource::failing(429)),
        Method::GET,
        "/flights/search?origin=LHR&destination=CDG&date=2024-06-01",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Flight search failed");
}

#[tokio::test]
async fn multi_search_rejects_bad_legs() {
    let (status, body) = send(
        &router(StubSource::default()),
        Method::GET,
        "/flights/search/multi?legs=oops",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid JSON for legs parameter");
}

#[tokio::test]
async fn saved_flight_lifecycle() {
    let app = router(StubSource::default());

    let (status, saved) = send(&app, Method::POST, "/flights", Some(offer_body(129.0))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(saved["airline"], "British Airways");
    assert_eq!(saved["notifications"], false);
    assert_eq!(saved["trend"].as_array().unwrap().len(), 8);
    let id = saved["id"].as_str().unwrap().to_string();

    let (status, list) = send(&app, Method::GET, "/flights", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["id"], id.as_str());
    assert!(list[0]["suggestion"].is_string());

    let uri = format!("/flights/{id}");
    let (status, updated) = send(&app, Method::PUT, &uri, Some(json!({ "notifications": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["notifications"], true);

    let (status, one) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(one["notifications"], true);

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Flight deleted");

    let (status, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Flight not found");
}

#[tokio::test]
async fn unknown_flight_is_not_found() {
    let app = router(StubSource::default());
    let (status, _) = send(&app, Method::GET, "/flights/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::PUT, "/flights/nope", Some(json!({ "notifications": false }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn negative_price_is_bad_request() {
    let (status, _) = send(
        &router(StubSource::default()),
        Method::POST,
        "/flights",
        Some(offer_body(-5.0)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_body_is_json_bad_request() {
    let app = router(StubSource::default());

    let (status, body) = send(&app, Method::POST, "/flights", Some(json!({ "nope": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));

    let (status, body) = send(&app, Method::PUT, "/flights/abc", Some(json!({ "notifications": "yes" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_query_is_json_bad_request() {
    let source = Arc::new(StubSource::default());
    let service = Arc::new(test_service(source.clone()));
    let flights_app = app(AppState::new(service, UserId::new("johndoe")));

    let (status, body) = send(
        &flights_app,
        Method::GET,
        "/flights/search?origin=LHR&destination=CDG&date=2024-06-01&adults=abc",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid query parameters"));
    assert!(source.searches.lock().unwrap().is_empty());
}
