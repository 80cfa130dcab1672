use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::Coordinates;

/// Errors that can occur when resolving an address
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeocodingError {
    #[error("no location found for '{0}'")]
    NotFound(String),

    #[error("geocoding request failed: {0}")]
    Transient(String),

    #[error("invalid geocoding response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for GeocodingError {
    fn from(err: reqwest::Error) -> Self {
        GeocodingError::Transient(err.to_string())
    }
}

/// A free-text location resolved to a position
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: String,
}

impl From<ResolvedLocation> for Coordinates {
    fn from(location: ResolvedLocation) -> Self {
        Coordinates::new(location.latitude, location.longitude)
            .with_address(location.formatted_address)
    }
}

/// Turns free-text locations into coordinates
#[async_trait]
pub trait AddressResolver: Send + Sync {
    async fn resolve(&self, location: &str) -> Result<ResolvedLocation, GeocodingError>;
}

/// Resolver used when geocoding is switched off; every lookup is a miss
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledResolver;

#[async_trait]
impl AddressResolver for DisabledResolver {
    async fn resolve(&self, location: &str) -> Result<ResolvedLocation, GeocodingError> {
        Err(GeocodingError::NotFound(location.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

/// Nominatim search client
///
/// Successful lookups are memoised in a bounded in-memory cache with a TTL;
/// misses and failures are not cached so they can be retried upstream.
pub struct NominatimResolver {
    base_url: String,
    user_agent: String,
    client: Client,
    cache: moka::future::Cache<String, ResolvedLocation>,
}

impl NominatimResolver {
    pub fn new(
        base_url: String,
        user_agent: String,
        timeout: Duration,
        cache_capacity: u64,
        cache_ttl: Duration,
    ) -> Result<Self, GeocodingError> {
        let client = Client::builder().timeout(timeout).build()?;

        let cache = moka::future::CacheBuilder::new(cache_capacity)
            .time_to_live(cache_ttl)
            .build();

        Ok(Self {
            base_url,
            user_agent,
            client,
            cache,
        })
    }

    pub fn cached_entries(&self) -> u64 {
        self.cache.entry_count()
    }

    async fn search(&self, query: &str) -> Result<ResolvedLocation, GeocodingError> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));

        tracing::debug!("Geocoding '{}' via {}", query, url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GeocodingError::NotFound(query.to_string()));
        }
        if !status.is_success() {
            return Err(GeocodingError::Transient(format!("geocoder returned {}", status)));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| GeocodingError::InvalidResponse(e.to_string()))?;

        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| GeocodingError::NotFound(query.to_string()))?;

        let latitude = parse_degrees(&place.lat)?;
        let longitude = parse_degrees(&place.lon)?;
        let coordinates = Coordinates::new(latitude, longitude);
        if !coordinates.is_valid() {
            return Err(GeocodingError::InvalidResponse(format!(
                "coordinates out of range: ({}, {})",
                latitude, longitude
            )));
        }

        Ok(ResolvedLocation {
            latitude,
            longitude,
            formatted_address: place.display_name.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl AddressResolver for NominatimResolver {
    async fn resolve(&self, location: &str) -> Result<ResolvedLocation, GeocodingError> {
        let query = location.trim();
        if query.is_empty() {
            return Err(GeocodingError::NotFound(location.to_string()));
        }

        let key = query.to_lowercase();
        if let Some(hit) = self.cache.get(&key).await {
            tracing::trace!("Geocoding cache hit: {}", key);
            return Ok(hit);
        }

        let resolved = self.search(query).await?;
        self.cache.insert(key, resolved.clone()).await;
        Ok(resolved)
    }
}

fn parse_degrees(raw: &str) -> Result<f64, GeocodingError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| GeocodingError::InvalidResponse(format!("non-numeric coordinate '{}'", raw)))
}
