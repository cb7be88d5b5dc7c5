use crate::model::TrendPoint;
use serde::{Serialize, Serializer};
use std::fmt;

/// Number of most recent points the regression looks at.
pub const WINDOW: usize = 5;
/// Slope (price units per point) separating "stable" from "trending".
pub const SLOPE_THRESHOLD: f64 = 0.2;

/// Buy/wait recommendation derived from a price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suggestion {
    BuyNow,
    Wait,
    Stable,
    InsufficientData,
}

impl Suggestion {
    pub fn message(&self) -> &'static str {
        match self {
            Self::BuyNow => "prices trending up, recommend buying now",
            Self::Wait => "prices trending down, recommend waiting",
            Self::Stable => "prices stable, no urgency",
            Self::InsufficientData => "insufficient data for a suggestion",
        }
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl Serialize for Suggestion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.message())
    }
}

/// Least-squares slope of `values` against their index.
/// A zero denominator yields a slope of 0.
pub fn regression_slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let sum_x: f64 = (0..values.len()).map(|i| i as f64).sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(i, &y)| i as f64 * y).sum();
    let sum_x2: f64 = (0..values.len()).map(|i| (i as f64).powi(2)).sum();

    let denominator = n * sum_x2 - sum_x.powi(2);
    if denominator == 0.0 {
        return 0.0;
    }
    (n * sum_xy - sum_x * sum_y) / denominator
}

/// Maps the slope of the last [`WINDOW`] points to a suggestion.
pub fn suggest(points: &[TrendPoint]) -> Suggestion {
    if points.len() < 2 {
        return Suggestion::InsufficientData;
    }

    let recent = &points[points.len().saturating_sub(WINDOW)..];
    let prices: Vec<f64> = recent.iter().map(|p| p.price).collect();
    let slope = regression_slope(&prices);

    if slope > SLOPE_THRESHOLD {
        Suggestion::BuyNow
    } else if slope < -SLOPE_THRESHOLD {
        Suggestion::Wait
    } else {
        Suggestion::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};

    fn series(prices: &[f64]) -> Vec<TrendPoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| TrendPoint {
                date: start + Days::new(i as u64),
                price,
            })
            .collect()
    }

    #[test]
    fn rising_prices_suggest_buying() {
        let points = series(&[100.0, 102.0, 104.0, 106.0, 108.0]);
        assert_eq!(regression_slope(&[100.0, 102.0, 104.0, 106.0, 108.0]), 2.0);
        assert_eq!(suggest(&points), Suggestion::BuyNow);
        assert_eq!(suggest(&points).to_string(), "prices trending up, recommend buying now");
    }

    #[test]
    fn falling_prices_suggest_waiting() {
        let points = series(&[120.0, 115.0, 110.0, 105.0]);
        assert_eq!(suggest(&points), Suggestion::Wait);
        assert_eq!(Suggestion::Wait.message(), "prices trending down, recommend waiting");
    }

    #[test]
    fn flat_prices_are_stable() {
        let points = series(&[100.0; 5]);
        assert_eq!(regression_slope(&[100.0; 5]), 0.0);
        assert_eq!(suggest(&points), Suggestion::Stable);
        assert_eq!(Suggestion::Stable.message(), "prices stable, no urgency");
    }

    #[test]
    fn short_series_is_insufficient() {
        assert_eq!(suggest(&[]), Suggestion::InsufficientData);
        assert_eq!(suggest(&series(&[100.0])), Suggestion::InsufficientData);
        assert_eq!(suggest(&series(&[100.0, 101.0])), Suggestion::BuyNow);
    }

    #[test]
    fn small_slopes_stay_stable() {
        assert_eq!(suggest(&series(&[100.0, 100.125])), Suggestion::Stable);
        assert_eq!(suggest(&series(&[100.0, 99.875])), Suggestion::Stable);
        assert_eq!(suggest(&series(&[100.0, 100.25])), Suggestion::BuyNow);
        assert_eq!(suggest(&series(&[100.0, 99.75])), Suggestion::Wait);
    }

    #[test]
    fn slope_of_exactly_the_threshold_is_stable() {
        assert_eq!(regression_slope(&[0.0, 0.2]), SLOPE_THRESHOLD);
        assert_eq!(regression_slope(&[0.2, 0.0]), -SLOPE_THRESHOLD);
        assert_eq!(suggest(&series(&[0.0, 0.2])), Suggestion::Stable);
        assert_eq!(suggest(&series(&[0.2, 0.0])), Suggestion::Stable);
    }

    #[test]
    fn only_last_five_points_count() {
        // a steep early drop followed by a steady climb
        let points = series(&[500.0, 400.0, 300.0, 100.0, 101.0, 102.0, 103.0, 104.0]);
        assert_eq!(suggest(&points), Suggestion::BuyNow);
    }

    #[test]
    fn degenerate_input_has_zero_slope() {
        assert_eq!(regression_slope(&[]), 0.0);
        assert_eq!(regression_slope(&[42.0]), 0.0);
    }
}
