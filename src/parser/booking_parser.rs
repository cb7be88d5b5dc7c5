// Booking.com flights payload: raw offer shapes and lenient extraction
use crate::model::FetchError;
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Deserializes a field without failing the surrounding struct: a value of
/// the wrong shape becomes `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOffer {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub token: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub segments: Option<Vec<RawSegment>>,
    #[serde(default, deserialize_with = "lenient")]
    pub price_breakdown: Option<RawPriceBreakdown>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSegment {
    #[serde(default, deserialize_with = "lenient")]
    pub departure_airport: Option<RawAirport>,
    #[serde(default, deserialize_with = "lenient")]
    pub arrival_airport: Option<RawAirport>,
    #[serde(default, deserialize_with = "lenient")]
    pub departure_time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub arrival_time: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub legs: Option<Vec<RawLeg>>,
    #[serde(default, deserialize_with = "lenient")]
    pub carriers_data: Option<Vec<RawCarrier>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLeg {
    #[serde(default, deserialize_with = "lenient")]
    pub flight_info: Option<RawFlightInfo>,
    #[serde(default, deserialize_with = "lenient")]
    pub carriers_data: Option<Vec<RawCarrier>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFlightInfo {
    /// Number or string depending on the carrier.
    #[serde(default)]
    pub flight_number: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub carrier_info: Option<RawCarrierInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCarrierInfo {
    #[serde(default, deserialize_with = "lenient")]
    pub marketing_carrier: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCarrier {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAirport {
    #[serde(default, deserialize_with = "lenient")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPriceBreakdown {
    #[serde(default, deserialize_with = "lenient")]
    pub total: Option<RawMoney>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMoney {
    /// Number or numeric string.
    #[serde(default)]
    pub units: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub currency_code: Option<String>,
}

impl RawOffer {
    /// Reads one list element; anything that is not an offer object becomes
    /// an empty offer so it still shows up downstream.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_else(|e| {
            warn!("Malformed flight offer, keeping it with sentinel fields: {}", e);
            Self::default()
        })
    }

    pub fn segment(&self, index: usize) -> Option<&RawSegment> {
        self.segments.as_ref()?.get(index)
    }
}

impl RawSegment {
    pub fn first_leg(&self) -> Option<&RawLeg> {
        self.legs.as_ref()?.first()
    }

    pub fn carrier(&self) -> Option<&RawCarrier> {
        self.carriers_data.as_ref()?.first()
    }

    pub fn departure_code(&self) -> Option<String> {
        self.departure_airport.as_ref()?.code.clone()
    }

    pub fn arrival_code(&self) -> Option<String> {
        self.arrival_airport.as_ref()?.code.clone()
    }
}

impl RawLeg {
    pub fn carrier(&self) -> Option<&RawCarrier> {
        self.carriers_data.as_ref()?.first()
    }

    pub fn flight_number(&self) -> Option<String> {
        match self.flight_info.as_ref()?.flight_number.as_ref()? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn marketing_carrier(&self) -> Option<String> {
        self.flight_info
            .as_ref()?
            .carrier_info
            .as_ref()?
            .marketing_carrier
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(String::from)
    }
}

/// Pulls `data.flightOffers` out of a search response body.
///
/// A body without a `data` object is rejected; `data` without offers means
/// the route simply has no results.
pub fn parse_offers(body: &Value) -> Result<Vec<RawOffer>, FetchError> {
    let data = body
        .get("data")
        .filter(|d| d.is_object())
        .ok_or_else(|| FetchError::InvalidResponse("missing `data` object".into()))?;

    let offers = match data.get("flightOffers") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().cloned().map(RawOffer::from_value).collect(),
        Some(other) => {
            return Err(FetchError::InvalidResponse(format!(
                "`flightOffers` is not a list: {}",
                other
            )));
        }
    };

    Ok(offers)
}
