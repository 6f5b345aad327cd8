//! Map style documents and the baked-in raster fallback.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::GeoError;
use crate::retry::retry_with_backoff;

pub const FALLBACK_STYLE_NAME: &str = "findnest-osm-raster";

/// Where the style in use came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleOrigin {
    Remote,
    Fallback,
}

/// A map style document (MapLibre style JSON).
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDocument {
    pub name: String,
    pub body: serde_json::Value,
}

impl StyleDocument {
    /// Checks the minimum shape a renderer needs: an object with `version`,
    /// `sources` and a `layers` array.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidPayload`] describing the first missing piece.
    pub fn from_json(body: serde_json::Value) -> Result<Self, GeoError> {
        let invalid = |reason: &str| GeoError::InvalidPayload {
            context: "style".to_owned(),
            reason: reason.to_owned(),
        };
        let obj = body.as_object().ok_or_else(|| invalid("not an object"))?;
        if !obj.get("version").is_some_and(serde_json::Value::is_number) {
            return Err(invalid("missing numeric version"));
        }
        if !obj.get("sources").is_some_and(serde_json::Value::is_object) {
            return Err(invalid("missing sources"));
        }
        if !obj.get("layers").is_some_and(serde_json::Value::is_array) {
            return Err(invalid("missing layers array"));
        }
        let name = obj
            .get("name")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unnamed")
            .to_owned();
        Ok(Self { name, body })
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.name == FALLBACK_STYLE_NAME
    }
}

/// OpenStreetMap raster tiles; needs no style server and no API key.
#[must_use]
pub fn fallback_raster_style() -> StyleDocument {
    StyleDocument {
        name: FALLBACK_STYLE_NAME.to_owned(),
        body: serde_json::json!({
            "version": 8,
            "name": FALLBACK_STYLE_NAME,
            "sources": {
                "osm": {
                    "type": "raster",
                    "tiles": ["https://tile.openstreetmap.org/{z}/{x}/{y}.png"],
                    "tileSize": 256,
                    "attribution": "© OpenStreetMap contributors"
                }
            },
            "layers": [
                { "id": "osm", "type": "raster", "source": "osm" }
            ]
        }),
    }
}

/// Fetches the configured vector style document.
pub struct StyleClient {
    client: Client,
    url: Option<Url>,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl StyleClient {
    /// `style_url = None` makes every fetch fail over to the fallback style.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidBaseUrl`] for an unparsable URL, or
    /// [`GeoError::Http`] if the HTTP client cannot be built.
    pub fn new(
        style_url: Option<&str>,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, GeoError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let url = style_url
            .map(|raw| {
                Url::parse(raw).map_err(|e| GeoError::InvalidBaseUrl {
                    url: raw.to_owned(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;
        Ok(Self {
            client,
            url,
            max_retries,
            backoff_base_ms,
        })
    }

    /// # Errors
    ///
    /// - [`GeoError::NotFound`] when no style URL is configured or the server returns 404.
    /// - [`GeoError::InvalidPayload`] if the document is not a usable style.
    /// - [`GeoError::Http`] / [`GeoError::UnexpectedStatus`] after retries.
    pub async fn fetch(&self) -> Result<StyleDocument, GeoError> {
        let Some(url) = &self.url else {
            return Err(GeoError::NotFound {
                query: "map style (no URL configured)".to_owned(),
            });
        };

        let body: serde_json::Value =
            retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
                let url = url.clone();
                async move {
                    let response = self.client.get(url.clone()).send().await?;
                    let status = response.status();
                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(GeoError::NotFound {
                            query: url.to_string(),
                        });
                    }
                    if !status.is_success() {
                        return Err(GeoError::UnexpectedStatus {
                            status: status.as_u16(),
                            url: url.to_string(),
                        });
                    }
                    let text = response.text().await?;
                    serde_json::from_str(&text).map_err(|e| GeoError::Deserialize {
                        context: "style".to_owned(),
                        source: e,
                    })
                }
            })
            .await?;

        StyleDocument::from_json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_style_is_valid() {
        let fallback = fallback_raster_style();
        let reparsed = StyleDocument::from_json(fallback.body.clone()).unwrap();
        assert_eq!(reparsed.name, FALLBACK_STYLE_NAME);
        assert!(reparsed.is_fallback());
    }

    #[test]
    fn style_without_layers_is_rejected() {
        let err = StyleDocument::from_json(serde_json::json!({
            "version": 8,
            "sources": {}
        }))
        .unwrap_err();
        assert!(matches!(err, GeoError::InvalidPayload { .. }));
    }

    #[tokio::test]
    async fn missing_url_fails_fetch() {
        let client = StyleClient::new(None, 5, 0, 0).unwrap();
        assert!(matches!(
            client.fetch().await,
            Err(GeoError::NotFound { .. })
        ));
    }
}
