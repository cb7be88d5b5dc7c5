use crate::model::{NormalizedOffer, ReturnLeg, DEFAULT_CURRENCY, SENTINEL};
use crate::parser::booking_parser::{RawLeg, RawOffer, RawSegment};
use crate::utils::{first_match, flight_duration, format_duration, parse_datetime};
use chrono::Duration;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;

/// Flattens a batch of raw offers and keeps the cheapest offer per
/// `(carrier code, departure time)`, in first-seen key order.
pub fn normalize_all(offers: &[RawOffer]) -> Vec<NormalizedOffer> {
    let normalized = offers
        .iter()
        .enumerate()
        .map(|(idx, raw)| normalize_offer(raw, idx));
    dedup_cheapest(normalized)
}

/// Builds one flight card. Missing upstream fields fall back to sentinels.
pub fn normalize_offer(raw: &RawOffer, idx: usize) -> NormalizedOffer {
    let segment = raw.segment(0);
    let leg = segment.and_then(RawSegment::first_leg);

    let flight_number = leg.and_then(RawLeg::flight_number);
    let carrier_code = leg.and_then(RawLeg::marketing_carrier);

    let airline_name = first_match::<String>(&[
        &|| leg.and_then(RawLeg::carrier).and_then(|c| non_blank(&c.name)),
        &|| segment.and_then(RawSegment::carrier).and_then(|c| non_blank(&c.name)),
        &|| non_blank(&carrier_code),
    ])
    .unwrap_or_else(|| SENTINEL.to_string());
    let airline_logo_url = first_match::<String>(&[
        &|| leg.and_then(RawLeg::carrier).and_then(|c| non_blank(&c.logo)),
        &|| segment.and_then(RawSegment::carrier).and_then(|c| non_blank(&c.logo)),
    ]);

    let departure_time = or_sentinel(segment.and_then(|s| s.departure_time.clone()));
    let arrival_time = or_sentinel(segment.and_then(|s| s.arrival_time.clone()));
    let duration_text = flight_duration(&departure_time, &arrival_time).map(format_duration);

    let total = raw.price_breakdown.as_ref().and_then(|p| p.total.as_ref());
    let price = total.and_then(|t| t.units.as_ref()).map_or(0.0, coerce_price);
    let currency = total
        .and_then(|t| t.currency_code.clone())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    NormalizedOffer {
        id: raw
            .id
            .clone()
            .or_else(|| raw.token.clone())
            .unwrap_or_else(|| idx.to_string()),
        airline_name,
        airline_logo_url,
        flight_number: or_sentinel(flight_number),
        carrier_code: or_sentinel(carrier_code),
        departure_airport: or_sentinel(segment.and_then(RawSegment::departure_code)),
        arrival_airport: or_sentinel(segment.and_then(RawSegment::arrival_code)),
        departure_time,
        arrival_time,
        duration_text,
        price,
        currency,
        return_leg: raw.segment(1).map(return_leg),
    }
}

fn return_leg(segment: &RawSegment) -> ReturnLeg {
    let leg = segment.first_leg();
    let departure_time = or_sentinel(segment.departure_time.clone());
    let arrival_time = or_sentinel(segment.arrival_time.clone());
    ReturnLeg {
        flight_number: or_sentinel(leg.and_then(RawLeg::flight_number)),
        carrier_code: or_sentinel(leg.and_then(RawLeg::marketing_carrier)),
        departure_airport: or_sentinel(segment.departure_code()),
        arrival_airport: or_sentinel(segment.arrival_code()),
        duration_text: flight_duration(&departure_time, &arrival_time).map(format_duration),
        departure_time,
        arrival_time,
    }
}

/// Blank strings count as missing so the next lookup gets its turn.
fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

fn or_sentinel(value: Option<String>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| SENTINEL.to_string())
}

/// Numeric coercion of `units`; anything unusable or negative is `0`.
fn coerce_price(units: &Value) -> f64 {
    let parsed = match units {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|p| p.is_finite() && *p >= 0.0).unwrap_or(0.0)
}

/// Keeps the lowest-priced offer per dedup key. A later offer replaces the
/// current one only when strictly cheaper.
pub fn dedup_cheapest(offers: impl IntoIterator<Item = NormalizedOffer>) -> Vec<NormalizedOffer> {
    let mut slots: HashMap<(String, String), usize> = HashMap::new();
    let mut unique: Vec<NormalizedOffer> = Vec::new();

    for offer in offers {
        let key = (offer.carrier_code.clone(), offer.departure_time.clone());
        match slots.get(&key) {
            Some(&slot) => {
                if offer.price < unique[slot].price {
                    unique[slot] = offer;
                }
            }
            None => {
                slots.insert(key, unique.len());
                unique.push(offer);
            }
        }
    }

    unique
}

/// Caller-selected ordering for a result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Cheapest,
    Fastest,
    Departure,
    /// Leave the list as it is.
    Unsorted,
}

impl FromStr for SortOrder {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "cheapest" => Self::Cheapest,
            "fastest" => Self::Fastest,
            "departure" => Self::Departure,
            _ => Self::Unsorted,
        })
    }
}

/// Stable sort. `Fastest` compares the raw timestamp span, so inverted
/// times rank first; unparseable timestamps go last for `Fastest` and
/// `Departure`.
pub fn sort_offers(offers: &mut [NormalizedOffer], order: SortOrder) {
    match order {
        SortOrder::Cheapest => offers.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortOrder::Fastest => offers.sort_by(|a, b| missing_last(signed_span(a), signed_span(b))),
        SortOrder::Departure => offers.sort_by(|a, b| {
            missing_last(parse_datetime(&a.departure_time), parse_datetime(&b.departure_time))
        }),
        SortOrder::Unsorted => {}
    }
}

/// Arrival minus departure, negative when the timestamps are inverted.
fn signed_span(offer: &NormalizedOffer) -> Option<Duration> {
    Some(parse_datetime(&offer.arrival_time)? - parse_datetime(&offer.departure_time)?)
}

fn missing_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
