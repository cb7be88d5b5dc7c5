use crate::config::UpstreamConfig;
use crate::fetcher::traits::FlightSource;
use crate::model::{FetchError, MultiLegQuery, SearchQuery};
use crate::parser::{parse_offers, RawOffer};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

const SEARCH_PATH: &str = "/api/v1/flights/searchFlights";
const MULTI_PATH: &str = "/api/v1/flights/searchFlightsMultiStops";

/// Booking.com flights search through RapidAPI.
pub struct BookingClient {
    client: Client,
    config: UpstreamConfig,
}

impl BookingClient {
    pub fn new(config: UpstreamConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("FareSniper/0.1")
            .build()?;

        Ok(Self { client, config })
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Query string of a one-way or return search.
    pub fn search_params(&self, query: &SearchQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("fromId", airport_id(&query.origin)),
            ("toId", airport_id(&query.destination)),
            ("departDate", query.depart_date.to_string()),
        ];
        if let Some(return_date) = query.return_date {
            params.push(("returnDate", return_date.to_string()));
        }
        params.extend([
            ("pageNo", query.page_no.to_string()),
            ("adults", query.adults.to_string()),
            ("sort", query.sort.clone()),
            ("cabinClass", self.config.cabin_class.clone()),
            ("currency_code", self.config.currency_code.clone()),
        ]);
        params
    }

    /// Query string of a multi-city search; legs travel as a JSON array.
    pub fn multi_params(&self, query: &MultiLegQuery) -> Vec<(&'static str, String)> {
        let legs: Vec<Value> = query
            .legs
            .iter()
            .map(|leg| {
                json!({
                    "fromId": airport_id(&leg.from_id),
                    "toId": airport_id(&leg.to_id),
                    "date": leg.date.to_string(),
                })
            })
            .collect();

        vec![
            ("legs", Value::Array(legs).to_string()),
            ("pageNo", query.page_no.to_string()),
            ("adults", query.adults.to_string()),
            ("children", query.children.clone()),
            ("sort", query.sort.clone()),
            ("cabinClass", self.config.cabin_class.clone()),
            ("currency_code", self.config.currency_code.clone()),
        ]
    }

    async fn fetch(&self, path: &str, params: &[(&'static str, String)]) -> Result<Vec<RawOffer>, FetchError> {
        let url = self.build_url(path);
        info!("Requesting {}", url);

        let response = self
            .client
            .get(&url)
            .query(params)
            .header("x-rapidapi-key", &self.config.api_key)
            .header("x-rapidapi-host", &self.config.host)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "unknown".into());
            warn!("Flights API responded [{}]: {}", status, body);
            return Err(FetchError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;
        let offers = parse_offers(&body)?;
        info!("Flights API returned {} offers", offers.len());
        Ok(offers)
    }
}

/// Booking identifies airports as `LHR.AIRPORT`.
fn airport_id(code: &str) -> String {
    let code = code.trim().to_uppercase();
    if code.contains('.') {
        code
    } else {
        format!("{}.AIRPORT", code)
    }
}

#[async_trait::async_trait]
impl FlightSource for BookingClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawOffer>, FetchError> {
        self.fetch(SEARCH_PATH, &self.search_params(query)).await
    }

    async fn search_multi(&self, query: &MultiLegQuery) -> Result<Vec<RawOffer>, FetchError> {
        self.fetch(MULTI_PATH, &self.multi_params(query)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QueryLeg;
    use chrono::NaiveDate;

    fn client() -> BookingClient {
        BookingClient::new(UpstreamConfig::default()).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[test]
    fn search_params_carry_airports_and_dates() {
        let query = SearchQuery {
            origin: "lhr".into(),
            destination: "CDG".into(),
            depart_date: date(1),
            return_date: Some(date(8)),
            adults: 2,
            sort: "BEST".into(),
            page_no: 1,
        };
        let params = client().search_params(&query);
        let get = |key: &str| params.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str());

        assert_eq!(get("fromId"), Some("LHR.AIRPORT"));
        assert_eq!(get("toId"), Some("CDG.AIRPORT"));
        assert_eq!(get("departDate"), Some("2024-06-01"));
        assert_eq!(get("returnDate"), Some("2024-06-08"));
        assert_eq!(get("adults"), Some("2"));
        assert_eq!(get("cabinClass"), Some("ECONOMY"));
        assert_eq!(get("currency_code"), Some("GBP"));
    }

    #[test]
    fn one_way_search_has_no_return_date() {
        let query = SearchQuery {
            origin: "LHR".into(),
            destination: "CDG".into(),
            depart_date: date(1),
            return_date: None,
            adults: 1,
            sort: "BEST".into(),
            page_no: 1,
        };
        assert!(client().search_params(&query).iter().all(|(k, _)| *k != "returnDate"));
    }

    #[test]
    fn multi_params_serialize_legs() {
        let query = MultiLegQuery {
            legs: vec![
                QueryLeg { from_id: "LHR".into(), to_id: "CDG".into(), date: date(1) },
                QueryLeg { from_id: "CDG".into(), to_id: "FCO.AIRPORT".into(), date: date(4) },
            ],
            adults: 1,
            children: "0".into(),
            sort: "BEST".into(),
            page_no: 1,
        };
        let params = client().multi_params(&query);
        let legs: Value = serde_json::from_str(&params[0].1).unwrap();

        assert_eq!(params[0].0, "legs");
        assert_eq!(legs[0]["fromId"], "LHR.AIRPORT");
        assert_eq!(legs[1]["toId"], "FCO.AIRPORT");
        assert_eq!(legs[1]["date"], "2024-06-04");
    }

    #[test]
    fn base_url_joins_without_double_slash() {
        let mut config = UpstreamConfig::default();
        config.base_url = "http://localhost:9000/".into();
        let client = BookingClient::new(config).unwrap();
        assert_eq!(client.build_url(SEARCH_PATH), "http://localhost:9000/api/v1/flights/searchFlights");
    }
}
