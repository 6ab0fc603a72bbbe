//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! HTTP resolver tests against a mock provider

use serde_json::json;
use skycache_service::{
    ConnectionHandler, FetchError, Listener, OpenWeatherResolver, RemoteResolver, ResolverConfig,
    ServerConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WEATHER_PATH: &str = "/data/2.5/weather";

fn resolver_for(server: &MockServer) -> OpenWeatherResolver {
    let config = ResolverConfig::new("test-key")
        .with_base_url(format!("{}{}", server.uri(), WEATHER_PATH))
        .with_timeout(Some(Duration::from_secs(5)));
    OpenWeatherResolver::new(config).unwrap()
}

fn bucharest() -> serde_json::Value {
    json!({
        "name": "Bucharest",
        "main": {"temp": 20.5, "feels_like": 19.8, "pressure": 1012, "humidity": 55},
        "wind": {"speed": 3.5, "deg": 240}
    })
}

#[tokio::test]
async fn test_fetch_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(WEATHER_PATH))
        .and(query_param("q", "Bucharest"))
        .and(query_param("appid", "test-key"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bucharest()))
        .expect(1)
        .mount(&server)
        .await;

    let record = resolver_for(&server).fetch("Bucharest").await.unwrap();
    assert_eq!(record.temperature(), "20.5");
    assert_eq!(record.wind_speed(), "3.5");
    assert_eq!(record.pressure(), "1012");
    assert_eq!(record.humidity(), "55");
}

#[tokio::test]
async fn test_fetch_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(WEATHER_PATH))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"cod": "404", "message": "city not found"})),
        )
        .mount(&server)
        .await;

    let result = resolver_for(&server).fetch("Atlantis").await;
    assert!(matches!(result, Err(FetchError::Status(404))));
}

#[tokio::test]
async fn test_fetch_missing_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(WEATHER_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"main": {"temp": 1, "pressure": 2, "humidity": 3}})),
        )
        .mount(&server)
        .await;

    let result = resolver_for(&server).fetch("Nowhere").await;
    assert!(matches!(result, Err(FetchError::MissingField("wind.speed"))));
}

#[tokio::test]
async fn test_fetch_unreachable() {
    let config = ResolverConfig::new("test-key").with_base_url("http://127.0.0.1:1/weather");
    let result = OpenWeatherResolver::new(config).unwrap().fetch("Paris").await;
    assert!(matches!(result, Err(FetchError::Network(_))));
}

#[tokio::test]
async fn test_end_to_end_through_listener() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(WEATHER_PATH))
        .and(query_param("q", "Bucharest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bucharest()))
        .expect(1)
        .mount(&server)
        .await;

    let handler = Arc::new(ConnectionHandler::new(Arc::new(resolver_for(&server))));
    let listener = Listener::start(ServerConfig::new("127.0.0.1:0".parse().unwrap()), handler)
        .await
        .unwrap();

    for _ in 0..3 {
        let mut stream = TcpStream::connect(listener.local_addr()).await.unwrap();
        stream.write_all(b"Bucharest\nall\n").await.unwrap();
        let mut reply = String::new();
        stream.read_to_string(&mut reply).await.unwrap();
        assert_eq!(
            reply,
            "Temp: 20.5°C, Wind: 3.5 m/s, Pressure: 1012 hPa, Humidity: 55%\n"
        );
    }

    listener.stop().await;
    // MockServer verifies the single expected provider call on drop
}
