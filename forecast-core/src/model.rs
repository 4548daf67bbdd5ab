use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;

#[derive(Debug, Clone)]
pub struct WeatherRequest {
    pub city: String,
}

impl WeatherRequest {
    pub fn new(city: impl Into<String>) -> Self {
        Self { city: city.into() }
    }
}

/// Time zone of the searched location.
///
/// WeatherAPI.com reports an IANA name, OpenWeather only a UTC offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocalZone {
    Named(Tz),
    Offset(FixedOffset),
}

impl LocalZone {
    /// Resolve an IANA name, falling back to UTC for unknown names.
    pub fn from_tz_id(tz_id: &str) -> Self {
        match tz_id.parse::<Tz>() {
            Ok(tz) => LocalZone::Named(tz),
            Err(_) => {
                tracing::debug!(tz_id, "unknown time zone, using UTC");
                LocalZone::Named(Tz::UTC)
            }
        }
    }

    pub fn from_offset_secs(secs: i32) -> Self {
        FixedOffset::east_opt(secs)
            .map(LocalZone::Offset)
            .unwrap_or(LocalZone::Named(Tz::UTC))
    }

    pub fn localize(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            LocalZone::Named(tz) => instant.with_timezone(tz).fixed_offset(),
            LocalZone::Offset(offset) => instant.with_timezone(offset),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocationInfo {
    pub name: String,
    pub country: String,
    pub zone: LocalZone,
}

/// Current conditions, normalized to metric units regardless of provider.
#[derive(Debug, Clone)]
pub struct CurrentConditions {
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub cloud_pct: u8,
    pub wind_kph: f64,
    pub pressure_mb: f64,
    /// Not every provider reports visibility.
    pub visibility_km: Option<f64>,
    pub condition: String,
    pub icon_url: String,
}

#[derive(Debug, Clone)]
pub struct DailyForecast {
    /// Start of the forecast day, unix seconds.
    pub date_epoch: i64,
    pub min_temp_c: f64,
    pub max_temp_c: f64,
    pub condition: String,
    pub icon_url: String,
    pub chance_of_rain_pct: f64,
}

/// Everything one provider call yields for a city.
#[derive(Debug, Clone)]
pub struct ProviderForecast {
    pub provider: &'static str,
    pub location: LocationInfo,
    pub current: CurrentConditions,
    pub days: Vec<DailyForecast>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn named_zone_applies_dst() {
        let zone = LocalZone::from_tz_id("Europe/London");
        let summer = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();
        let winter = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

        assert_eq!(zone.localize(summer).hour(), 13);
        assert_eq!(zone.localize(winter).hour(), 12);
    }

    #[test]
    fn unknown_zone_falls_back_to_utc() {
        assert_eq!(LocalZone::from_tz_id("Mars/Olympus"), LocalZone::Named(Tz::UTC));
    }

    #[test]
    fn offset_zone_shifts_clock() {
        let zone = LocalZone::from_offset_secs(19_800);
        let instant = Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap();
        let local = zone.localize(instant);

        assert_eq!((local.hour(), local.minute()), (1, 30));
    }
}
