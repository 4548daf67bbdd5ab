//! Full search pipeline: mocked WeatherAPI.com plus a CSV-trained model.

use std::{fmt::Write as _, path::Path, sync::Arc};

use chrono::{DateTime, TimeZone, Utc};
use forecast_core::{
    ForecastService, ModelCache, WeatherContext, provider::weatherapi::WeatherApiProvider,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_weatherapi() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "location": { "name": "Sydney", "country": "Australia", "tz_id": "Australia/Sydney" },
            "current": {
                "temp_c": 22.7, "feelslike_c": 24.9, "humidity": 64, "cloud": 0,
                "wind_kph": 14.4, "pressure_mb": 1018.0, "vis_km": 10.0,
                "condition": { "text": "Sunny", "icon": "//cdn.weatherapi.com/weather/64x64/day/113.png" }
            },
            "forecast": { "forecastday": [{
                "date_epoch": 1709251200,
                "day": {
                    "maxtemp_c": 27.3, "mintemp_c": 19.8, "daily_chance_of_rain": 0,
                    "condition": { "text": "Sunny", "icon": "//cdn.weatherapi.com/weather/64x64/day/113.png" }
                }
            }]}
        })))
        .mount(&server)
        .await;

    server
}

fn write_history(path: &Path) {
    let mut csv = String::from("MinTemp,MaxTemp,Temp,Humidity\n");
    for i in 0..48 {
        let temp = 18.0 + (i % 12) as f64 * 0.8;
        writeln!(csv, "0,0,{temp:.1},{}", 55 + i % 10).unwrap();
    }
    std::fs::write(path, csv).unwrap();
}

fn now() -> DateTime<Utc> {
    // 2024-03-01 10:15 in Sydney (UTC+11).
    Utc.with_ymd_and_hms(2024, 2, 29, 23, 15, 0).unwrap()
}

#[tokio::test]
async fn absent_history_still_renders_current_weather() {
    let server = mock_weatherapi().await;
    let dir = tempfile::tempdir().unwrap();

    let provider = WeatherApiProvider::new("KEY".into()).with_base_url(server.uri());
    let models = ModelCache::new(dir.path().join("weather.csv"));
    let service = ForecastService::new(Arc::new(provider), Arc::new(models), 8);

    let ctx = service.handle_at(Some("Sydney"), now()).await;

    assert_eq!(ctx.city, "Sydney");
    assert_eq!(ctx.temperature, Some(22));
    assert_eq!(ctx.localtime, "10:15");
    assert_eq!(ctx.date, "01 March, 2024");
    assert!(ctx.hourly_forecast.is_empty());
    assert_eq!(ctx.hourly_forecast_json, "[]");
}

#[tokio::test]
async fn trained_history_adds_eight_hourly_points() {
    let server = mock_weatherapi().await;
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("weather.csv");
    write_history(&csv);

    let provider = WeatherApiProvider::new("KEY".into()).with_base_url(server.uri());
    let models = Arc::new(ModelCache::new(&csv));
    let service = ForecastService::new(Arc::new(provider), models.clone(), 8);

    let ctx = service.handle_at(Some("Sydney"), now()).await;

    assert!(models.is_trained());
    assert_eq!(ctx.hourly_forecast.len(), 8);
    assert_eq!(ctx.hourly_forecast[0].time, "11:00");
    assert_eq!(ctx.hourly_forecast[7].time, "18:00");
    for point in &ctx.hourly_forecast {
        assert!((17..=28).contains(&point.temp), "implausible {point:?}");
    }

    let parsed: serde_json::Value = serde_json::from_str(&ctx.hourly_forecast_json).unwrap();
    assert_eq!(parsed.as_array().map(Vec::len), Some(8));

    // The cached model survives the file disappearing.
    std::fs::remove_file(&csv).unwrap();
    let again = service.handle_at(Some("Sydney"), now()).await;
    assert_eq!(again.hourly_forecast, ctx.hourly_forecast);
}

#[tokio::test]
async fn provider_failure_replaces_whole_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": { "code": 1006, "message": "No matching location found." }
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("weather.csv");
    write_history(&csv);

    let provider = WeatherApiProvider::new("KEY".into()).with_base_url(server.uri());
    let service = ForecastService::new(Arc::new(provider), Arc::new(ModelCache::new(&csv)), 8);

    let ctx = service.handle_at(Some("Nowhere"), now()).await;

    assert_eq!(ctx, WeatherContext::failure(now()));
}
