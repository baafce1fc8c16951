//! Reconciliation against the authoritative pricing/stock service.
//!
//! The cart sends what it holds as `(product_id, quantity, [(type, option_id)])`
//! tuples and receives canonical line items back. The service may change
//! prices, lower quantities, or drop lines and options entirely.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use strand_core::{ProductId, ProductSnapshot, VariantOption, VariantOptionId};
use thiserror::Error;
use url::Url;

use crate::line_item::CartLineItem;

/// Path of the refresh endpoint, relative to the service base URL.
const REFRESH_PATH: &str = "cart/refresh";

/// Errors that can occur during reconciliation.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Service did not answer in time.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// No pricing service is reachable or configured.
    #[error("Pricing service unavailable: {0}")]
    Unavailable(String),
}

/// A chosen option as sent to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileVariant {
    #[serde(rename = "type")]
    pub variant_type: String,
    pub option_id: VariantOptionId,
}

/// A line item as sent to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub variants: Vec<ReconcileVariant>,
}

impl From<&CartLineItem> for ReconcileLine {
    fn from(item: &CartLineItem) -> Self {
        Self {
            product_id: item.product.id,
            quantity: item.quantity,
            variants: item
                .variants
                .iter()
                .map(|(variant_type, option)| ReconcileVariant {
                    variant_type: variant_type.clone(),
                    option_id: option.id,
                })
                .collect(),
        }
    }
}

/// A chosen option as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledVariant {
    #[serde(rename = "type")]
    pub variant_type: String,
    pub option: VariantOption,
}

/// A canonical line item returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledLine {
    pub product: ProductSnapshot,
    pub quantity: u32,
    #[serde(default)]
    pub variants: Vec<ReconciledVariant>,
}

/// The returned options become the line's selection.
impl From<ReconciledLine> for CartLineItem {
    fn from(line: ReconciledLine) -> Self {
        let variants = line
            .variants
            .into_iter()
            .map(|v| (v.variant_type, v.option))
            .collect();
        Self {
            product: line.product,
            selection: Self::selection_from_variants(&variants),
            variants,
            quantity: line.quantity,
            added_at: chrono::Utc::now(),
        }
    }
}

/// Authoritative pricing/stock collaborator.
pub trait PricingService: Send + Sync {
    /// Return the canonical view of `lines`.
    fn reconcile(
        &self,
        lines: &[ReconcileLine],
    ) -> impl Future<Output = Result<Vec<ReconciledLine>, ReconcileError>> + Send;
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    items: &'a [ReconcileLine],
}

#[derive(Deserialize)]
struct RefreshResponse {
    items: Vec<ReconciledLine>,
}

/// Pricing service reached over HTTP.
///
/// Sends `POST {base_url}/cart/refresh` with `{"items": [...]}` and expects
/// `{"items": [...]}` back.
#[derive(Debug, Clone)]
pub struct HttpPricingService {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpPricingService {
    /// Create a new pricing service client.
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint URL cannot be built, the token is not a
    /// valid header value, or the HTTP client fails to build.
    pub fn new(
        base_url: &Url,
        token: Option<&SecretString>,
        timeout: Duration,
    ) -> Result<Self, ReconcileError> {
        let endpoint = endpoint_url(base_url)?;

        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            let value = format!("Bearer {}", token.expose_secret());
            let mut value = HeaderValue::from_str(&value)
                .map_err(|e| ReconcileError::Parse(format!("Invalid API token format: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, endpoint })
    }

    /// URL the refresh request is sent to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Join the refresh path onto `base_url`, treating the base as a directory.
fn endpoint_url(base_url: &Url) -> Result<Url, ReconcileError> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(REFRESH_PATH)
        .map_err(|e| ReconcileError::Parse(format!("Invalid pricing service URL: {e}")))
}

impl PricingService for HttpPricingService {
    async fn reconcile(
        &self,
        lines: &[ReconcileLine],
    ) -> Result<Vec<ReconciledLine>, ReconcileError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&RefreshRequest { items: lines })
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ReconcileError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| ReconcileError::Parse(e.to_string()))?;

        Ok(body.items)
    }
}

/// Pricing service used when none is configured; every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflinePricingService;

impl PricingService for OfflinePricingService {
    async fn reconcile(
        &self,
        _lines: &[ReconcileLine],
    ) -> Result<Vec<ReconciledLine>, ReconcileError> {
        Err(ReconcileError::Unavailable(
            "no pricing service configured".to_string(),
        ))
    }
}
