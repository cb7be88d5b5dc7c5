// Core structs: NormalizedOffer, TrendPoint, SavedFlight and the error enums
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Placeholder shown wherever upstream data could not be resolved.
pub const SENTINEL: &str = "N/A";
pub const DEFAULT_CURRENCY: &str = "GBP";

/// Identity every saved-flight operation is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One flat, comparable flight card built from a raw search offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedOffer {
    pub id: String,
    pub airline_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airline_logo_url: Option<String>,
    pub flight_number: String,
    pub carrier_code: String,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub departure_time: String,
    pub arrival_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_text: Option<String>,
    pub price: f64,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_leg: Option<ReturnLeg>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnLeg {
    pub flight_number: String,
    pub carrier_code: String,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub departure_time: String,
    pub arrival_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Snapshot of one direction of a saved journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegSnapshot {
    pub time: String,
    pub arrive: String,
    #[serde(default)]
    pub duration: Option<String>,
    pub from: String,
    pub to: String,
}

impl LegSnapshot {
    pub fn outbound(offer: &NormalizedOffer) -> Self {
        Self {
            time: offer.departure_time.clone(),
            arrive: offer.arrival_time.clone(),
            duration: offer.duration_text.clone(),
            from: offer.departure_airport.clone(),
            to: offer.arrival_airport.clone(),
        }
    }

    pub fn inbound(leg: &ReturnLeg) -> Self {
        Self {
            time: leg.departure_time.clone(),
            arrive: leg.arrival_time.clone(),
            duration: leg.duration_text.clone(),
            from: leg.departure_airport.clone(),
            to: leg.arrival_airport.clone(),
        }
    }
}

/// A tracked flight as stored for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFlight {
    pub id: String,
    pub user: UserId,
    pub airline: String,
    pub price: f64,
    pub currency: String,
    pub depart: LegSnapshot,
    #[serde(rename = "return", default, skip_serializing_if = "Option::is_none")]
    pub return_leg: Option<LegSnapshot>,
    pub trend: Vec<TrendPoint>,
    pub notifications: bool,
    pub created_at: DateTime<Utc>,
}

/// Parameters of a one-way or return search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub origin: String,
    pub destination: String,
    pub depart_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub adults: u32,
    pub sort: String,
    pub page_no: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryLeg {
    pub from_id: String,
    pub to_id: String,
    pub date: NaiveDate,
}

/// Parameters of a multi-city search.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiLegQuery {
    pub legs: Vec<QueryLeg>,
    pub adults: u32,
    pub children: String,
    pub sort: String,
    pub page_no: u32,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream responded with status {0}")]
    Status(u16),
    #[error("upstream response is malformed: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("stored trend is not valid json: {0}")]
    Encoding(#[from] serde_json::Error),
}
