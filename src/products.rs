//! Products

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while constructing a product.
#[derive(Debug, Error, PartialEq)]
pub enum ProductError {
    /// The identity was empty or whitespace.
    #[error("product identity must not be empty")]
    EmptyIdentity,

    /// The display name was empty or whitespace.
    #[error("product {0} has an empty name")]
    EmptyName(ProductId),

    /// The price was below zero (identity, price).
    #[error("product {0} has a negative price: {1}")]
    NegativePrice(ProductId, Decimal),
}

/// Stable product identity, used as the de-duplication key for cart lines and favorites.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a new identity from the given string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Environmental impact of buying one unit of a product.
///
/// Values are signed: a non-sustainable product carries negative values, so
/// buying it pulls the running totals down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImpactVector {
    /// Plastic saved, in kilograms
    pub plastic_kg: Decimal,

    /// Water saved, in litres
    pub water_l: Decimal,

    /// CO₂ reduced, in kilograms
    pub co2_kg: Decimal,

    /// Eco score contribution
    pub score: Decimal,
}

impl ImpactVector {
    /// Impact vector carrying only an eco score.
    #[must_use]
    pub fn from_score(score: Decimal) -> Self {
        Self {
            score,
            ..Self::default()
        }
    }
}

/// Product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ProductRecord")]
pub struct Product {
    id: ProductId,
    name: String,
    category: String,
    price: Decimal,
    sustainable: bool,
    impact: ImpactVector,
}

impl Product {
    /// Create a new product with no impact that is not flagged sustainable.
    ///
    /// # Errors
    ///
    /// Returns a [`ProductError`] if the identity or name is blank, or the price is negative.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        category: impl Into<String>,
        price: Decimal,
    ) -> Result<Self, ProductError> {
        let id = id.into();
        let name = name.into();

        if id.as_str().trim().is_empty() {
            return Err(ProductError::EmptyIdentity);
        }

        if name.trim().is_empty() {
            return Err(ProductError::EmptyName(id));
        }

        if price.is_sign_negative() && !price.is_zero() {
            return Err(ProductError::NegativePrice(id, price));
        }

        Ok(Self {
            id,
            name,
            category: category.into(),
            price,
            sustainable: false,
            impact: ImpactVector::default(),
        })
    }

    /// Set the sustainability flag.
    #[must_use]
    pub fn with_sustainable(mut self, sustainable: bool) -> Self {
        self.sustainable = sustainable;
        self
    }

    /// Set the per-unit impact vector.
    #[must_use]
    pub fn with_impact(mut self, impact: ImpactVector) -> Self {
        self.impact = impact;
        self
    }

    /// Product identity
    pub fn id(&self) -> &ProductId {
        &self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Category name
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Unit price
    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Whether the product is flagged as sustainable
    pub fn is_sustainable(&self) -> bool {
        self.sustainable
    }

    /// Per-unit impact vector
    pub fn impact(&self) -> &ImpactVector {
        &self.impact
    }
}

/// Unvalidated wire shape of a product.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductRecord {
    id: ProductId,
    name: String,
    #[serde(default)]
    category: String,
    price: Decimal,
    #[serde(default)]
    sustainable: bool,
    #[serde(default)]
    impact: ImpactVector,
}

impl TryFrom<ProductRecord> for Product {
    type Error = ProductError;

    fn try_from(record: ProductRecord) -> Result<Self, Self::Error> {
        Ok(Product::new(record.id, record.name, record.category, record.price)?
            .with_sustainable(record.sustainable)
            .with_impact(record.impact))
    }
}
