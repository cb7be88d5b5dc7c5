use crate::model::TrendPoint;
use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Days of made-up history placed before today.
pub const HISTORY_DAYS: u64 = 7;
/// Maximum absolute deviation of a made-up price.
pub const NOISE: f64 = 10.0;

/// Supplies the price history stored alongside a saved flight.
pub trait TrendSource: Send + Sync {
    fn history(&self, current_price: f64, today: NaiveDate) -> Vec<TrendPoint>;
}

/// Stand-in history: noisy prices around the current one.
pub struct SyntheticTrend {
    rng: Mutex<StdRng>,
}

impl SyntheticTrend {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }
}

impl TrendSource for SyntheticTrend {
    fn history(&self, current_price: f64, today: NaiveDate) -> Vec<TrendPoint> {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        generate_trend(current_price, today, &mut *rng)
    }
}

/// Eight points ending at `today`: seven noisy days rounded to whole units
/// (never below zero), then today at exactly `current_price`.
pub fn generate_trend<R: Rng>(current_price: f64, today: NaiveDate, rng: &mut R) -> Vec<TrendPoint> {
    let mut trend: Vec<TrendPoint> = (1..=HISTORY_DAYS)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .map(|date| TrendPoint {
            date,
            price: (current_price + rng.random_range(-NOISE..=NOISE)).round().max(0.0),
        })
        .collect();

    trend.push(TrendPoint {
        date: today,
        price: current_price,
    });
    trend
}
