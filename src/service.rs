// Search / save / track operations behind the HTTP layer
use crate::analyzer::{suggest, Suggestion, TrendSource};
use crate::fetcher::FlightSource;
use crate::model::{
    FetchError, LegSnapshot, MultiLegQuery, NormalizedOffer, QueryLeg, SavedFlight, SearchQuery,
    StorageError, TrendPoint, UserId,
};
use crate::normalizer::{normalize_all, sort_offers, SortOrder};
use crate::parser::RawOffer;
use crate::storage::SqliteStorage;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("search failed: {0}")]
    SearchFailed(#[from] FetchError),
    #[error("flight not found")]
    NotFound,
    #[error("operation failed: {0}")]
    Storage(#[from] StorageError),
}

/// One-way or return search as it arrives from the client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub date: Option<String>,
    pub return_date: Option<String>,
    pub adults: Option<u32>,
    pub sort: Option<String>,
    pub page_no: Option<u32>,
    /// `cheapest`, `fastest` or `departure`; anything else keeps upstream order.
    pub order: Option<String>,
}

/// Multi-city search; `legs` is a JSON array of `{fromId, toId, date}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSearchParams {
    pub legs: Option<String>,
    pub adults: Option<u32>,
    pub children: Option<String>,
    pub sort: Option<String>,
    pub page_no: Option<u32>,
    pub order: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveFlightRequest {
    pub offer: NormalizedOffer,
    /// Known price history; generated when absent.
    #[serde(default)]
    pub trend: Option<Vec<TrendPoint>>,
}

/// A saved flight together with its buy/wait suggestion.
#[derive(Debug, Clone, Serialize)]
pub struct FlightView {
    #[serde(flatten)]
    pub flight: SavedFlight,
    pub suggestion: Suggestion,
}

pub struct FlightService {
    source: Arc<dyn FlightSource>,
    storage: Arc<Mutex<SqliteStorage>>,
    trends: Arc<dyn TrendSource>,
    default_sort: String,
}

impl FlightService {
    pub fn new(
        source: Arc<dyn FlightSource>,
        storage: Arc<Mutex<SqliteStorage>>,
        trends: Arc<dyn TrendSource>,
        default_sort: impl Into<String>,
    ) -> Self {
        Self {
            source,
            storage,
            trends,
            default_sort: default_sort.into(),
        }
    }

    /// Validates the query, asks upstream and returns deduplicated, sorted
    /// offers. Nothing is sent upstream when validation fails.
    pub async fn search(&self, params: SearchParams) -> Result<Vec<NormalizedOffer>, ServiceError> {
        let (origin, destination, date) = match (&params.origin, &params.destination, &params.date) {
            (Some(o), Some(d), Some(t)) if !o.trim().is_empty() && !d.trim().is_empty() && !t.trim().is_empty() => {
                (o, d, t)
            }
            _ => {
                return Err(ServiceError::Validation(
                    "Missing required query parameters: origin, destination, date".into(),
                ));
            }
        };

        let origin = iata_code(origin)?;
        let destination = iata_code(destination)?;
        if origin == destination {
            return Err(ServiceError::Validation(
                "Origin and destination airports cannot be the same".into(),
            ));
        }

        let depart_date = parse_date("date", date)?;
        let return_date = match params.return_date.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(parse_date("returnDate", raw)?),
            _ => None,
        };
        if return_date.is_some_and(|r| r < depart_date) {
            return Err(ServiceError::Validation("returnDate is before date".into()));
        }

        let query = SearchQuery {
            origin,
            destination,
            depart_date,
            return_date,
            adults: adults(params.adults)?,
            sort: params.sort.unwrap_or_else(|| self.default_sort.clone()),
            page_no: params.page_no.unwrap_or(1).max(1),
        };

        info!(
            "Searching flights {} -> {} on {} (return: {:?})",
            query.origin, query.destination, query.depart_date, query.return_date
        );
        let raw = self.source.search(&query).await.inspect_err(|e| {
            warn!("Flight search failed: {}", e);
        })?;
        Ok(Self::prepare(&raw, params.order.as_deref()))
    }

    pub async fn search_multi(&self, params: MultiSearchParams) -> Result<Vec<NormalizedOffer>, ServiceError> {
        let raw_legs = params
            .legs
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .ok_or_else(|| ServiceError::Validation("Missing required query parameter: legs".into()))?;

        let legs: Vec<QueryLeg> = serde_json::from_str(raw_legs)
            .map_err(|_| ServiceError::Validation("Invalid JSON for legs parameter".into()))?;
        if legs.is_empty() {
            return Err(ServiceError::Validation(
                "Invalid legs format: must be a non-empty array".into(),
            ));
        }
        if legs.iter().any(|leg| leg.from_id.trim().is_empty() || leg.to_id.trim().is_empty()) {
            return Err(ServiceError::Validation("Every leg needs fromId and toId".into()));
        }

        let query = MultiLegQuery {
            legs,
            adults: adults(params.adults)?,
            children: params.children.unwrap_or_else(|| "0".into()),
            sort: params.sort.unwrap_or_else(|| self.default_sort.clone()),
            page_no: params.page_no.unwrap_or(1).max(1),
        };

        info!("Searching multi-city flights over {} legs", query.legs.len());
        let raw = self.source.search_multi(&query).await.inspect_err(|e| {
            warn!("Multi-city search failed: {}", e);
        })?;
        Ok(Self::prepare(&raw, params.order.as_deref()))
    }

    fn prepare(raw: &[RawOffer], order: Option<&str>) -> Vec<NormalizedOffer> {
        let mut offers = normalize_all(raw);
        let order = order
            .map(|o| o.parse().unwrap_or(SortOrder::Unsorted))
            .unwrap_or_default();
        sort_offers(&mut offers, order);
        info!("{} raw offers -> {} unique ({:?})", raw.len(), offers.len(), order);
        offers
    }

    /// Stores a snapshot of `offer` for `user`.
    pub async fn save(&self, user: &UserId, request: SaveFlightRequest) -> Result<SavedFlight, ServiceError> {
        let SaveFlightRequest { offer, trend } = request;
        if !offer.price.is_finite() || offer.price < 0.0 {
            return Err(ServiceError::Validation("price must be a non-negative number".into()));
        }

        let trend = trend.unwrap_or_else(|| self.trends.history(offer.price, Utc::now().date_naive()));
        let flight = SavedFlight {
            id: Uuid::new_v4().to_string(),
            user: user.clone(),
            airline: offer.airline_name.clone(),
            price: offer.price,
            currency: offer.currency.clone(),
            depart: LegSnapshot::outbound(&offer),
            return_leg: offer.return_leg.as_ref().map(LegSnapshot::inbound),
            trend,
            notifications: false,
            created_at: Utc::now(),
        };

        self.storage.lock().await.insert_flight(&flight)?;
        info!("Saved flight {} ({} {:.2}) for {}", flight.id, flight.airline, flight.price, user);
        Ok(flight)
    }

    pub async fn list(&self, user: &UserId) -> Result<Vec<FlightView>, ServiceError> {
        let flights = self.storage.lock().await.find_all_by_user(user)?;
        Ok(flights.into_iter().map(|f| self.view(f)).collect())
    }

    pub async fn get(&self, user: &UserId, id: &str) -> Result<FlightView, ServiceError> {
        let flight = self
            .storage
            .lock()
            .await
            .find_by_id(user, id)?
            .ok_or(ServiceError::NotFound)?;
        Ok(self.view(flight))
    }

    pub async fn delete(&self, user: &UserId, id: &str) -> Result<(), ServiceError> {
        if !self.storage.lock().await.delete_flight(user, id)? {
            return Err(ServiceError::NotFound);
        }
        info!("Deleted flight {} for {}", id, user);
        Ok(())
    }

    /// Sets the notifications flag to `enabled` and returns the updated flight.
    pub async fn set_notifications(
        &self,
        user: &UserId,
        id: &str,
        enabled: bool,
    ) -> Result<SavedFlight, ServiceError> {
        let flight = self
            .storage
            .lock()
            .await
            .set_notifications(user, id, enabled)?
            .ok_or(ServiceError::NotFound)?;
        info!("Notifications for flight {} set to {}", id, enabled);
        Ok(flight)
    }

    /// Flights saved without history get a generated one for display.
    fn view(&self, mut flight: SavedFlight) -> FlightView {
        if flight.trend.is_empty() {
            flight.trend = self.trends.history(flight.price, Utc::now().date_naive());
        }
        let suggestion = suggest(&flight.trend);
        FlightView { flight, suggestion }
    }
}

fn iata_code(raw: &str) -> Result<String, ServiceError> {
    let code = raw.trim().to_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code)
    } else {
        Err(ServiceError::Validation(format!("'{}' is not a valid airport code", raw.trim())))
    }
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ServiceError::Validation(format!("{} must be formatted YYYY-MM-DD", field)))
}

fn adults(value: Option<u32>) -> Result<u32, ServiceError> {
    match value.unwrap_or(1) {
        0 => Err(ServiceError::Validation("adults must be at least 1".into())),
        n => Ok(n),
    }
}
