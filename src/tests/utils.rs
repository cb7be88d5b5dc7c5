use crate::analyzer::SyntheticTrend;
use crate::fetcher::FlightSource;
use crate::model::{FetchError, MultiLegQuery, SearchQuery};
use crate::parser::RawOffer;
use crate::service::FlightService;
use crate::storage::SqliteStorage;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Upstream stand-in: records queries and replays a canned response.
#[derive(Default)]
pub struct StubSource {
    pub offers: Vec<Value>,
    pub fail_with: Option<u16>,
    pub searches: Mutex<Vec<SearchQuery>>,
    pub multi_searches: Mutex<Vec<MultiLegQuery>>,
}

impl StubSource {
    pub fn with_offers(offers: Vec<Value>) -> Self {
        Self {
            offers,
            ..Default::default()
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_with: Some(status),
            ..Default::default()
        }
    }

    fn respond(&self) -> Result<Vec<RawOffer>, FetchError> {
        match self.fail_with {
            Some(status) => Err(FetchError::Status(status)),
            None => Ok(self.offers.iter().cloned().map(RawOffer::from_value).collect()),
        }
    }
}

#[async_trait::async_trait]
impl FlightSource for StubSource {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawOffer>, FetchError> {
        self.searches.lock().unwrap().push(query.clone());
        self.respond()
    }

    async fn search_multi(&self, query: &MultiLegQuery) -> Result<Vec<RawOffer>, FetchError> {
        self.multi_searches.lock().unwrap().push(query.clone());
        self.respond()
    }
}

/// A one-segment Booking offer departing LHR for CDG.
pub fn raw_offer(carrier: &str, departure: &str, price: u32) -> Value {
    json!({
        "token": format!("{carrier}-{price}"),
        "segments": [{
            "departureAirport": { "code": "LHR" },
            "arrivalAirport": { "code": "CDG" },
            "departureTime": departure,
            "arrivalTime": "2024-06-01T23:00:00",
            "legs": [{ "flightInfo": { "flightNumber": 1, "carrierInfo": { "marketingCarrier": carrier } } }]
        }],
        "priceBreakdown": { "total": { "units": price, "currencyCode": "GBP" } }
    })
}

/// Service over an in-memory database and a seeded trend source.
pub fn test_service(source: Arc<StubSource>) -> FlightService {
    let storage = Arc::new(tokio::sync::Mutex::new(
        SqliteStorage::open_in_memory().unwrap_or_else(|e| panic!("in-memory db failed: {e}")),
    ));
    FlightService::new(source, storage, Arc::new(SyntheticTrend::seeded(3)), "BEST")
}
