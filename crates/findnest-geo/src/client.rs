//! HTTP client for the FindNest location and AI search endpoints.
//!
//! Wraps `reqwest` with bearer-token auth, typed responses and not-found
//! mapping. Search and routing retry transient failures; geocoding and
//! reverse-geocoding are single-shot because the reconciler supersedes them
//! with newer input instead.

use std::time::Duration;

use findnest_core::search::LatLng;
use findnest_core::{AddressDraft, AppConfig, Coordinates, SearchResponse};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use crate::error::GeoError;
use crate::retry::retry_with_backoff;
use crate::types::{GeocodeResponse, ReverseGeocodeResponse, Route, RouteResponse, SearchRequest};

/// Connection settings for [`FindNestApiClient`].
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl ApiClientConfig {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_owned(),
            token: None,
            timeout_secs: 30,
            user_agent: "findnest/0.1 (location-core)".to_owned(),
            max_retries: 2,
            backoff_base_ms: 500,
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            token: config.api_token.clone(),
            timeout_secs: config.http_timeout_secs,
            user_agent: config.user_agent.clone(),
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        }
    }
}

/// Client for the FindNest API.
///
/// Use [`FindNestApiClient::new`] with a config pointed at production or at a
/// wiremock server in tests.
pub struct FindNestApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl FindNestApiClient {
    /// # Errors
    ///
    /// Returns [`GeoError::Http`] if the underlying `reqwest::Client` cannot be
    /// constructed, or [`GeoError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(config: &ApiClientConfig) -> Result<Self, GeoError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.as_str())
            .build()?;

        // Exactly one trailing slash so relative joins append instead of
        // replacing the last path segment.
        let normalised = format!("{}/", config.base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| GeoError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            token: config.token.clone(),
            max_retries: config.max_retries,
            backoff_base_ms: config.backoff_base_ms,
        })
    }

    /// Resolves a free-text address to coordinates.
    ///
    /// # Errors
    ///
    /// - [`GeoError::NotFound`] on 404 or a `null` body.
    /// - [`GeoError::InvalidPayload`] if the returned point is not a valid coordinate.
    /// - [`GeoError::Http`] / [`GeoError::UnexpectedStatus`] on transport failures.
    pub async fn geocode(&self, address: &str) -> Result<Coordinates, GeoError> {
        let url = self.endpoint("location/geocode", &[("address", address)])?;
        let response = self.authorized(self.client.get(url)).send().await?;
        let body: Option<GeocodeResponse> =
            Self::read_json(Self::check_status(response, address)?, "geocode").await?;
        let point = body.ok_or_else(|| GeoError::NotFound {
            query: address.to_owned(),
        })?;
        Coordinates::new(point.latitude, point.longitude).map_err(|e| GeoError::InvalidPayload {
            context: "geocode".to_owned(),
            reason: e.to_string(),
        })
    }

    /// Resolves a point to a structured address.
    ///
    /// # Errors
    ///
    /// - [`GeoError::NotFound`] on 404, a `null` body, or an all-blank address.
    /// - [`GeoError::Http`] / [`GeoError::UnexpectedStatus`] on transport failures.
    pub async fn reverse_geocode(&self, at: Coordinates) -> Result<AddressDraft, GeoError> {
        let lat = at.latitude().to_string();
        let lng = at.longitude().to_string();
        let url = self.endpoint("location/reverse-geocode", &[("lat", &lat), ("lng", &lng)])?;
        let query = at.to_string();
        let response = self.authorized(self.client.get(url)).send().await?;
        let body: Option<ReverseGeocodeResponse> =
            Self::read_json(Self::check_status(response, &query)?, "reverse-geocode").await?;
        let address: AddressDraft = body
            .map(AddressDraft::from)
            .ok_or_else(|| GeoError::NotFound {
                query: query.clone(),
            })?;
        if address.is_blank() {
            return Err(GeoError::NotFound { query });
        }
        Ok(address)
    }

    /// Runs the natural-language listing search around `origin`.
    ///
    /// # Errors
    ///
    /// - [`GeoError::Http`] / [`GeoError::UnexpectedStatus`] after retries.
    /// - [`GeoError::Deserialize`] if the body does not match the expected shape.
    pub async fn search(
        &self,
        query: &str,
        origin: Coordinates,
    ) -> Result<SearchResponse, GeoError> {
        let url = self.endpoint("ai/search", &[])?;
        let request = SearchRequest {
            query,
            location: LatLng::from(origin),
        };
        let request = &request;
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self
                    .authorized(self.client.post(url).json(request))
                    .send()
                    .await?;
                Self::read_json(Self::check_status(response, query)?, "ai-search").await
            }
        })
        .await
    }

    /// Fetches a driving route between two points.
    ///
    /// # Errors
    ///
    /// - [`GeoError::NotFound`] if no route exists.
    /// - [`GeoError::InvalidPayload`] if the geometry is not a `LineString`.
    /// - [`GeoError::Http`] / [`GeoError::UnexpectedStatus`] after retries.
    pub async fn route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<Route, GeoError> {
        let from = format!("{},{}", origin.latitude(), origin.longitude());
        let to = format!("{},{}", destination.latitude(), destination.longitude());
        let url = self.endpoint("location/route", &[("origin", &from), ("destination", &to)])?;
        let query = format!("{from} -> {to}");
        let query = query.as_str();

        let body: RouteResponse = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self.authorized(self.client.get(url)).send().await?;
                Self::read_json(Self::check_status(response, query)?, "route").await
            }
        })
        .await?;

        if !matches!(
            body.geometry,
            findnest_core::Geometry::LineString { .. }
        ) {
            return Err(GeoError::InvalidPayload {
                context: "route".to_owned(),
                reason: "geometry is not a LineString".to_owned(),
            });
        }

        Ok(Route {
            geometry: body.geometry,
            distance_km: body.distance_km,
            duration_sec: body.duration_sec,
        })
    }

    /// Joins `path` onto the base URL and appends percent-encoded query pairs.
    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, GeoError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| GeoError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Maps 404 to [`GeoError::NotFound`] and any other non-2xx to
    /// [`GeoError::UnexpectedStatus`].
    fn check_status(response: Response, query: &str) -> Result<Response, GeoError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(GeoError::NotFound {
                query: query.to_owned(),
            });
        }
        if !status.is_success() {
            return Err(GeoError::UnexpectedStatus {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }
        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(
        response: Response,
        context: &str,
    ) -> Result<T, GeoError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| GeoError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}
