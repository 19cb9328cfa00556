//! IP-based geolocation via ip-api.com (free, no key).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::AppError;

pub const DEFAULT_GEO_URL: &str = "http://ip-api.com/json/";

const GEO_FIELDS: &str = "status,message,lat,lon,city,country,timezone";

/// A location detected from the caller's public IP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub timezone: String,
}

/// Detects the caller's location. Implemented by [`IpApiClient`].
pub trait GeoLocator {
    async fn detect(&self) -> Result<DetectedLocation, AppError>;
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    lat: f64,
    #[serde(default)]
    lon: f64,
    #[serde(default)]
    city: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    timezone: String,
}

#[derive(Debug, Clone)]
pub struct IpApiClient {
    client: reqwest::Client,
    url: String,
}

impl IpApiClient {
    pub fn new(url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            url: url.to_string(),
        }
    }
}

impl GeoLocator for IpApiClient {
    async fn detect(&self) -> Result<DetectedLocation, AppError> {
        tracing::debug!("Detecting location via {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .query(&[("fields", GEO_FIELDS)])
            .send()
            .await
            .map_err(|e| AppError::FetchFailed(format!("geolocation request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::FetchFailed(format!(
                "geolocation API returned status {}",
                response.status()
            )));
        }

        let body: IpApiResponse = response.json().await.map_err(|e| {
            AppError::FetchFailed(format!("failed to decode geolocation response: {}", e))
        })?;

        if body.status != "success" {
            return Err(AppError::FetchFailed(format!(
                "geolocation failed: {}",
                body.message
            )));
        }

        Ok(DetectedLocation {
            latitude: body.lat,
            longitude: body.lon,
            city: body.city,
            country: body.country,
            timezone: body.timezone,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> IpApiClient {
        IpApiClient::new(&format!("{}/json/", server.uri()), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_detect_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json/"))
            .and(query_param("fields", GEO_FIELDS))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "lat": 21.4225,
                "lon": 39.8262,
                "city": "Mecca",
                "country": "Saudi Arabia",
                "timezone": "Asia/Riyadh"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let loc = client_for(&server).detect().await.unwrap();
        assert_eq!(loc.latitude, 21.4225);
        assert_eq!(loc.longitude, 39.8262);
        assert_eq!(loc.city, "Mecca");
        assert_eq!(loc.timezone, "Asia/Riyadh");
    }

    #[tokio::test]
    async fn test_detect_fail_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "fail",
                "message": "reserved range"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).detect().await.unwrap_err();
        assert!(err.to_string().contains("reserved range"), "got {}", err);
    }

    #[tokio::test]
    async fn test_detect_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = client_for(&server).detect().await.unwrap_err();
        assert!(err.to_string().contains("429"), "got {}", err);
    }

    #[tokio::test]
    async fn test_detect_invalid_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        assert!(matches!(
            client_for(&server).detect().await,
            Err(AppError::FetchFailed(_))
        ));
    }
}
