// Utility functions
use chrono::{DateTime, Duration, NaiveDateTime, Utc};

/// Преобразует строку в `DateTime<Utc>`, если возможно.
///
/// Принимает RFC 3339 и формат без зоны `2024-01-01T10:00:00`, который отдаёт
/// API рейсов; время без зоны считается UTC.
pub fn parse_datetime(date_str: &str) -> Option<DateTime<Utc>> {
    let trimmed = date_str.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Длительность перелёта, только если прилёт строго позже вылета.
pub fn flight_duration(departure: &str, arrival: &str) -> Option<Duration> {
    let dep = parse_datetime(departure)?;
    let arr = parse_datetime(arrival)?;
    let span = arr - dep;
    (span > Duration::zero()).then_some(span)
}

/// Форматирует длительность как часы и минуты, например `2h 30m`.
pub fn format_duration(duration: Duration) -> String {
    let minutes = duration.num_minutes();
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Перебирает источники по порядку и возвращает первое найденное значение.
/// Следующие источники после успеха не вызываются.
pub fn first_match<T>(lookups: &[&dyn Fn() -> Option<T>]) -> Option<T> {
    lookups.iter().find_map(|lookup| lookup())
}
