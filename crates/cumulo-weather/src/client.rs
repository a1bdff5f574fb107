use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::WeatherError;
use crate::types::{ForecastEntry, GeoLocation};

/// HTTP client for the two weather endpoints: free-text location search and
/// the daily forecast. Both use basic credentials supplied out of band.
#[derive(Debug, Clone)]
pub struct WeatherApi {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl WeatherApi {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Resolves a free-text place name. Only the first returned address is
    /// used, regardless of ranking; an empty address list is
    /// `LocationNotFound`.
    pub async fn search_location(&self, query: &str) -> Result<GeoLocation, WeatherError> {
        let url = format!(
            "{}/v3/location/search?query={}&locationType=city&language=en-US",
            self.base_url,
            urlencoding::encode(query)
        );
        let resp = self
            .client
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            let text = resp.text().await.unwrap_or_default();
            return Err(WeatherError::UnexpectedPayload(format!(
                "location search returned {status}: {text}"
            )));
        }

        let body: LocationSearchResponse = resp.json().await?;
        let Some(cols) = body.location else {
            return Err(WeatherError::LocationNotFound);
        };
        if cols.address.is_empty() {
            return Err(WeatherError::LocationNotFound);
        }

        // The search payload is columnar: parallel arrays indexed together.
        let latitude = cols.latitude.first().copied().ok_or_else(|| {
            WeatherError::UnexpectedPayload("latitude column shorter than address".into())
        })?;
        let longitude = cols.longitude.first().copied().ok_or_else(|| {
            WeatherError::UnexpectedPayload("longitude column shorter than address".into())
        })?;
        let postal_prefix = cols
            .postal_key
            .first()
            .map(|key| key.split(':').next().unwrap_or_default().to_string())
            .unwrap_or_default();

        Ok(GeoLocation {
            latitude,
            longitude,
            city: cols.city.first().cloned().unwrap_or_default(),
            admin_district: cols.admin_district.first().cloned().unwrap_or_default(),
            postal_prefix,
        })
    }

    /// Fetches the ordered daily forecast for the sized window (3/5/7/10
    /// days) at the resolved coordinates.
    pub async fn daily_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        days: u8,
    ) -> Result<Vec<ForecastEntry>, WeatherError> {
        let url = format!(
            "{}/v1/geocode/{latitude}/{longitude}/forecast/daily/{days}day.json",
            self.base_url
        );
        let resp = self
            .client
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            let text = resp.text().await.unwrap_or_default();
            return Err(WeatherError::UnexpectedPayload(format!(
                "daily forecast returned {status}: {text}"
            )));
        }

        let body: ForecastResponse = resp.json().await?;
        Ok(body.forecasts)
    }
}

#[derive(Debug, Deserialize)]
struct LocationSearchResponse {
    #[serde(default)]
    location: Option<LocationColumns>,
}

#[derive(Debug, Deserialize)]
struct LocationColumns {
    #[serde(default)]
    address: Vec<String>,
    #[serde(default)]
    latitude: Vec<f64>,
    #[serde(default)]
    longitude: Vec<f64>,
    #[serde(default)]
    city: Vec<String>,
    #[serde(default, rename = "adminDistrict")]
    admin_district: Vec<String>,
    #[serde(default, rename = "postalKey")]
    postal_key: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    forecasts: Vec<ForecastEntry>,
}
