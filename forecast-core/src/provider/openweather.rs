use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Timelike, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{ForecastError, Result},
    model::{
        CurrentConditions, DailyForecast, LocalZone, LocationInfo, ProviderForecast,
        WeatherRequest,
    },
    provider::{ProviderId, fetch_json},
};

use super::WeatherProvider;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
const PROVIDER: &str = "openweather";

/// OpenWeather free tier: current weather plus the 5-day / 3-hour forecast,
/// folded into one daily entry per local calendar day.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_http(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    async fn fetch_current(&self, city: &str) -> Result<OwCurrentResponse> {
        let url = format!("{}/data/2.5/weather", self.base_url);
        fetch_json(
            &self.http,
            &url,
            &[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")],
            PROVIDER,
            "current",
        )
        .await
    }

    async fn fetch_forecast(&self, city: &str) -> Result<OwForecastResponse> {
        let url = format!("{}/data/2.5/forecast", self.base_url);
        fetch_json(
            &self.http,
            &url,
            &[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")],
            PROVIDER,
            "forecast",
        )
        .await
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp_min: f64,
    temp_max: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    /// m/s with `units=metric`.
    speed: f64,
}

#[derive(Debug, Deserialize, Default)]
struct OwClouds {
    all: u8,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    #[serde(default)]
    timezone: i32,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    clouds: OwClouds,
    /// Metres; absent for some stations.
    #[serde(default)]
    visibility: Option<f64>,
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    weather: Vec<OwWeather>,
    #[serde(default)]
    pop: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

struct DayAccumulator {
    min: f64,
    max: f64,
    pop: f64,
    /// (distance from local noon in hours, weather) of the most representative slot.
    representative: Option<(u32, OwWeather)>,
}

fn fold_daily(entries: &[OwForecastEntry], zone: LocalZone) -> Result<Vec<DailyForecast>> {
    let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();

    for entry in entries {
        let instant = DateTime::<Utc>::from_timestamp(entry.dt, 0)
            .ok_or_else(|| ForecastError::parse(PROVIDER, format!("bad timestamp {}", entry.dt)))?;
        let local = zone.localize(instant);

        let acc = days.entry(local.date_naive()).or_insert(DayAccumulator {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            pop: 0.0,
            representative: None,
        });
        acc.min = acc.min.min(entry.main.temp_min);
        acc.max = acc.max.max(entry.main.temp_max);
        acc.pop = acc.pop.max(entry.pop);

        let distance = local.hour().abs_diff(12);
        if let Some(weather) = entry.weather.first() {
            if acc.representative.as_ref().is_none_or(|(d, _)| distance < *d) {
                acc.representative = Some((distance, weather.clone()));
            }
        }
    }

    days.into_iter()
        .map(|(date, acc)| {
            let midnight = date
                .and_hms_opt(0, 0, 0)
                .and_then(|naive| naive.and_local_timezone(zone_offset(zone, naive)).single())
                .ok_or_else(|| ForecastError::parse(PROVIDER, format!("bad local date {date}")))?;
            let (condition, icon_url) = match acc.representative {
                Some((_, w)) => (w.description, icon_url(&w.icon)),
                None => ("Unknown".to_string(), String::new()),
            };

            Ok(DailyForecast {
                date_epoch: midnight.timestamp(),
                min_temp_c: acc.min,
                max_temp_c: acc.max,
                condition,
                icon_url,
                chance_of_rain_pct: (acc.pop * 100.0).round(),
            })
        })
        .collect()
}

/// Offset in effect at a local wall-clock time; OpenWeather zones are always fixed.
fn zone_offset(zone: LocalZone, naive: chrono::NaiveDateTime) -> chrono::FixedOffset {
    match zone {
        LocalZone::Offset(offset) => offset,
        LocalZone::Named(_) => zone.localize(naive.and_utc()).offset().to_owned(),
    }
}

fn icon_url(icon: &str) -> String {
    format!("https://openweathermap.org/img/wn/{icon}@2x.png")
}

fn assemble(current: OwCurrentResponse, forecast: OwForecastResponse) -> Result<ProviderForecast> {
    let zone = LocalZone::from_offset_secs(current.timezone);
    let days = fold_daily(&forecast.list, zone)?;

    if days.is_empty() {
        return Err(ForecastError::parse(PROVIDER, "forecast response contained no data"));
    }

    let (condition, icon) = current
        .weather
        .first()
        .map(|w| (w.description.clone(), icon_url(&w.icon)))
        .unwrap_or_else(|| ("Unknown".to_string(), String::new()));

    Ok(ProviderForecast {
        provider: PROVIDER,
        location: LocationInfo { name: current.name, country: current.sys.country, zone },
        current: CurrentConditions {
            temperature_c: current.main.temp,
            feels_like_c: current.main.feels_like,
            humidity_pct: current.main.humidity,
            cloud_pct: current.clouds.all,
            wind_kph: current.wind.speed * 3.6,
            pressure_mb: current.main.pressure,
            visibility_km: current.visibility.map(|metres| metres / 1000.0),
            condition,
            icon_url: icon,
        },
        days,
    })
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    async fn get_forecast(&self, request: &WeatherRequest) -> Result<ProviderForecast> {
        let (current, forecast) = tokio::try_join!(
            self.fetch_current(&request.city),
            self.fetch_forecast(&request.city),
        )?;

        assemble(current, forecast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::WeatherContext;
    use chrono::{TimeZone, Utc};

    fn entry(dt: i64, min: f64, max: f64, pop: f64, description: &str) -> OwForecastEntry {
        OwForecastEntry {
            dt,
            main: OwForecastMain { temp_min: min, temp_max: max },
            weather: vec![OwWeather { description: description.into(), icon: "10d".into() }],
            pop,
        }
    }

    #[test]
    fn folds_three_hour_slots_into_local_days() {
        // 2024-03-01T00:00Z .. 2024-03-02T21:00Z, UTC zone.
        let start = 1_709_251_200;
        let entries: Vec<_> = (0..16)
            .map(|i| {
                let t = i as f64;
                entry(start + i * 3 * 3600, t, t + 1.0, if i == 3 { 0.8 } else { 0.1 }, "x")
            })
            .collect();

        let days = fold_daily(&entries, LocalZone::from_offset_secs(0)).unwrap();

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date_epoch, start);
        assert_eq!((days[0].min_temp_c, days[0].max_temp_c), (0.0, 8.0));
        assert_eq!(days[0].chance_of_rain_pct, 80.0);
        assert_eq!((days[1].min_temp_c, days[1].max_temp_c), (8.0, 16.0));
        assert_eq!(days[1].date_epoch, start + 86_400);
    }

    #[test]
    fn grouping_uses_local_calendar_day() {
        // 22:00Z is already the next day at UTC+3.
        let entries = [entry(1_709_330_400, 1.0, 2.0, 0.0, "late")];
        let days = fold_daily(&entries, LocalZone::from_offset_secs(3 * 3600)).unwrap();

        assert_eq!(days.len(), 1);
        // Local midnight of 2024-03-02 at UTC+3.
        assert_eq!(days[0].date_epoch, 1_709_326_800);
    }

    #[test]
    fn representative_condition_is_closest_to_noon() {
        let start = 1_709_251_200;
        let entries = [
            entry(start + 3 * 3600, 1.0, 2.0, 0.0, "night"),
            entry(start + 12 * 3600, 1.0, 2.0, 0.0, "midday"),
            entry(start + 18 * 3600, 1.0, 2.0, 0.0, "evening"),
        ];

        let days = fold_daily(&entries, LocalZone::from_offset_secs(0)).unwrap();
        assert_eq!(days[0].condition, "midday");
        assert_eq!(days[0].icon_url, "https://openweathermap.org/img/wn/10d@2x.png");
    }

    fn current(visibility: Option<u32>) -> OwCurrentResponse {
        let mut json = serde_json::json!({
            "name": "Reykjavik",
            "timezone": 0,
            "main": { "temp": 3.2, "feels_like": -1.0, "humidity": 70, "pressure": 1001 },
            "weather": [{ "description": "mist", "icon": "50d" }],
            "wind": { "speed": 2.0 },
            "sys": { "country": "IS" }
        });
        if let Some(metres) = visibility {
            json["visibility"] = metres.into();
        }
        serde_json::from_value(json).unwrap()
    }

    fn slots(pop: f64) -> OwForecastResponse {
        OwForecastResponse { list: vec![entry(1_709_294_400, 1.0, 4.0, pop, "mist")] }
    }

    #[test]
    fn rain_chance_is_a_whole_percentage() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        for (pop, expected) in [(0.29, 29i32), (0.57, 57), (0.58, 58), (1.0, 100), (0.0, 0)] {
            let forecast = assemble(current(Some(10_000)), slots(pop)).unwrap();
            assert_eq!(forecast.days[0].chance_of_rain_pct, f64::from(expected));

            let ctx = WeatherContext::assemble(&forecast, Vec::new(), now).unwrap();
            assert_eq!(ctx.rain_prediction, Some(i64::from(expected)), "pop {pop}");
        }
    }

    #[test]
    fn missing_visibility_is_not_reported_as_zero() {
        let forecast = assemble(current(None), slots(0.0)).unwrap();
        assert_eq!(forecast.current.visibility_km, None);

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let ctx = WeatherContext::assemble(&forecast, Vec::new(), now).unwrap();
        let value = serde_json::to_value(&ctx).unwrap();
        assert_eq!(value["visibility"], "--");

        let forecast = assemble(current(Some(6_500)), slots(0.0)).unwrap();
        assert_eq!(forecast.current.visibility_km, Some(6.5));
    }
}
