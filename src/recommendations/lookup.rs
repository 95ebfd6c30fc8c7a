//! Recommendation Lookup
//!
//! Client for the external recommender: a category list and a
//! name + category → greener alternative query.

use async_trait::async_trait;
use mockall::automock;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::products::{ImpactVector, Product, ProductError};

/// Default recommender address.
pub const DEFAULT_RECOMMENDER_URL: &str = "http://localhost:5000";

/// Errors that can occur when talking to the recommender.
#[derive(Debug, Error)]
pub enum RecommendationError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The recommender returned a non-2xx response or unexpected body.
    #[error("unexpected response from recommender: {0}")]
    UnexpectedResponse(String),
}

/// Body of a recommendation query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationRequest {
    /// Product the shopper wants to buy
    #[serde(rename = "product")]
    pub product_name: String,

    /// Category the product belongs to
    pub category: String,
}

impl RecommendationRequest {
    /// Create a request.
    pub fn new(product_name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            category: category.into(),
        }
    }
}

/// A greener alternative returned by the recommender.
#[derive(Debug, Clone, PartialEq)]
pub struct GreenerAlternative {
    /// Alternative product name
    pub name: String,

    /// Sustainability score
    pub eco_score: Decimal,

    /// Unit price
    pub price: Decimal,
}

impl GreenerAlternative {
    /// Turn the alternative into a cart-ready product in `category`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProductError`] if the name is blank or the price negative.
    pub fn into_product(self, category: impl Into<String>) -> Result<Product, ProductError> {
        let impact = ImpactVector::from_score(self.eco_score);

        Ok(
            Product::new(self.name.clone(), self.name, category, self.price)?
                .with_sustainable(true)
                .with_impact(impact),
        )
    }
}

/// Result of a recommendation query.
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationOutcome {
    /// The recommender found an alternative.
    Alternative(GreenerAlternative),

    /// No alternative exists; informational, not a failure.
    NoAlternative {
        /// Message from the recommender
        message: String,
    },
}

#[derive(Debug, Deserialize)]
struct RecommendResponse {
    #[serde(default)]
    greener_alternative: Option<String>,

    #[serde(default)]
    eco_score: Option<Decimal>,

    #[serde(default)]
    price: Option<Decimal>,

    #[serde(default)]
    message: Option<String>,
}

impl TryFrom<RecommendResponse> for RecommendationOutcome {
    type Error = RecommendationError;

    fn try_from(response: RecommendResponse) -> Result<Self, Self::Error> {
        match response {
            RecommendResponse {
                greener_alternative: Some(name),
                eco_score,
                price: Some(price),
                ..
            } if !name.is_empty() => Ok(Self::Alternative(GreenerAlternative {
                name,
                eco_score: eco_score.unwrap_or_default(),
                price,
            })),
            RecommendResponse {
                greener_alternative: Some(name),
                price: None,
                ..
            } if !name.is_empty() => Err(RecommendationError::UnexpectedResponse(format!(
                "alternative {name} has no price"
            ))),
            RecommendResponse {
                message: Some(message),
                ..
            } => Ok(Self::NoAlternative { message }),
            _ => Err(RecommendationError::UnexpectedResponse(
                "response has neither an alternative nor a message".to_string(),
            )),
        }
    }
}

/// External recommendation service.
#[automock]
#[async_trait]
pub trait RecommendationService: Send + Sync {
    /// Ordered category names for the selector.
    async fn categories(&self) -> Result<Vec<String>, RecommendationError>;

    /// Look up a greener alternative.
    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationOutcome, RecommendationError>;
}

/// HTTP client for the recommender.
#[derive(Debug, Clone)]
pub struct HttpRecommendationService {
    base_url: String,
    http: Client,
}

impl HttpRecommendationService {
    /// Create a client for the recommender at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Recommender address without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn check(
        response: reqwest::Response,
        what: &str,
    ) -> Result<reqwest::Response, RecommendationError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        Err(RecommendationError::UnexpectedResponse(format!(
            "{what} request failed with status {status}: {text}"
        )))
    }
}

#[async_trait]
impl RecommendationService for HttpRecommendationService {
    #[tracing::instrument(name = "recommender.categories", skip(self), err)]
    async fn categories(&self) -> Result<Vec<String>, RecommendationError> {
        let url = format!("{}/categories", self.base_url);

        let response = self.http.get(&url).send().await?;
        let categories: Vec<String> = Self::check(response, "categories").await?.json().await?;

        debug!(count = categories.len(), "loaded categories");

        Ok(categories)
    }

    #[tracing::instrument(
        name = "recommender.recommend",
        skip(self, request),
        fields(product = %request.product_name, category = %request.category),
        err
    )]
    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationOutcome, RecommendationError> {
        let url = format!("{}/recommend", self.base_url);

        let response = self.http.post(&url).json(request).send().await?;
        let parsed: RecommendResponse = Self::check(response, "recommend").await?.json().await?;

        RecommendationOutcome::try_from(parsed)
    }
}
