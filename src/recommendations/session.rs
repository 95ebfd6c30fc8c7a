//! Recommendation Session
//!
//! Transient state for browsing the catalog, selecting a product, and
//! reviewing the greener alternatives suggested for it.

use jiff::{SignedDuration, Timestamp};
use rust_decimal::Decimal;
use smallvec::SmallVec;
use thiserror::Error;
use tracing::debug;

use crate::{
    products::{Product, ProductId},
    recommendations::catalog::Catalog,
    schedule::Debounced,
};

/// Quiet period applied to search input before it filters the product list.
pub const SEARCH_DEBOUNCE: SignedDuration = SignedDuration::from_millis(300);

/// Session errors
#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    /// The selected product is not in the catalog.
    #[error("Product not found: {0}")]
    UnknownProduct(ProductId),

    /// No product is selected, so there are no alternatives.
    #[error("No product selected")]
    NothingSelected,

    /// The alternative index is out of range.
    #[error("No alternative at position {0}")]
    NoSuchAlternative(usize),
}

/// Browsing predicates. All of them must hold for a product to be listed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrowseFilter {
    /// Case-insensitive substring matched against name or category
    pub search: String,

    /// Exact category, if any
    pub category: Option<String>,

    /// Maximum unit price, if any
    pub max_price: Option<Decimal>,
}

impl BrowseFilter {
    /// Whether `product` satisfies every predicate.
    pub fn matches(&self, product: &Product) -> bool {
        self.matches_search(product) && self.matches_category(product) && self.within_ceiling(product)
    }

    /// Whether `product` is priced at or below the ceiling.
    pub fn within_ceiling(&self, product: &Product) -> bool {
        self.max_price.is_none_or(|max| product.price() <= max)
    }

    /// Whether no predicate is set.
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty() && self.category.is_none() && self.max_price.is_none()
    }

    fn matches_search(&self, product: &Product) -> bool {
        let needle = self.search.trim().to_lowercase();

        needle.is_empty()
            || product.name().to_lowercase().contains(&needle)
            || product.category().to_lowercase().contains(&needle)
    }

    fn matches_category(&self, product: &Product) -> bool {
        self.category
            .as_deref()
            .is_none_or(|category| category.eq_ignore_ascii_case(product.category()))
    }
}

/// A candidate alternative with its justification.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    /// The alternative product
    pub product: Product,

    /// Why it is the greener choice
    pub reason: String,
}

/// The selected product and the alternatives shown for it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationSuggestion {
    source: Product,
    alternatives: SmallVec<[Suggestion; 4]>,
}

impl RecommendationSuggestion {
    /// The product the user selected
    pub fn source(&self) -> &Product {
        &self.source
    }

    /// Alternatives within the budget ceiling
    pub fn alternatives(&self) -> &[Suggestion] {
        &self.alternatives
    }
}

/// Session state
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    /// Nothing browsed yet
    #[default]
    Idle,

    /// The product list is being filtered
    Browsing,

    /// A product is selected and its alternatives are shown
    AlternativesShown(RecommendationSuggestion),
}

/// Browse → select → accept/reject state machine.
#[derive(Debug, Clone)]
pub struct RecommendationSession {
    state: SessionState,
    search: Debounced<String>,
    category: Option<String>,
    max_price: Option<Decimal>,
}

impl Default for RecommendationSession {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

impl RecommendationSession {
    /// Create an idle session applying search input after `quiet`.
    pub fn new(quiet: SignedDuration) -> Self {
        Self {
            state: SessionState::Idle,
            search: Debounced::new(String::new(), quiet),
            category: None,
            max_price: None,
        }
    }

    /// Current state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The alternatives currently shown, if any.
    pub fn current(&self) -> Option<&RecommendationSuggestion> {
        match &self.state {
            SessionState::AlternativesShown(suggestion) => Some(suggestion),
            SessionState::Idle | SessionState::Browsing => None,
        }
    }

    /// The applied filter.
    pub fn filter(&self) -> BrowseFilter {
        BrowseFilter {
            search: self.search.applied().clone(),
            category: self.category.clone(),
            max_price: self.max_price,
        }
    }

    /// Record search input at `now`; it is applied once the quiet period passes.
    pub fn type_search(&mut self, text: impl Into<String>, now: Timestamp) {
        self.search.input(text.into(), now);
        self.start_browsing();
    }

    /// Apply debounced search input that is due at `now`. Returns `true` if the filter changed.
    pub fn tick(&mut self, now: Timestamp) -> bool {
        self.search.poll(now)
    }

    /// Apply pending search input immediately.
    pub fn flush_search(&mut self) -> bool {
        self.search.flush()
    }

    /// Restrict browsing to `category`.
    pub fn set_category(&mut self, category: Option<String>) {
        self.category = category.filter(|category| !category.trim().is_empty());
        self.start_browsing();
    }

    /// Restrict browsing and alternatives to products priced at or below `max_price`.
    pub fn set_max_price(&mut self, max_price: Option<Decimal>) {
        self.max_price = max_price;
        self.start_browsing();
    }

    /// Clear every filter input and drop any shown alternatives.
    pub fn clear_filters(&mut self) {
        self.search.reset(String::new());
        self.category = None;
        self.max_price = None;
        self.state = SessionState::Browsing;
    }

    /// Products matching the applied filter, in catalog order.
    pub fn visible<'c>(&self, catalog: &'c Catalog) -> Vec<&'c Product> {
        let filter = self.filter();

        catalog
            .products()
            .iter()
            .filter(|product| filter.matches(product))
            .collect()
    }

    /// Select a product and show its alternatives within the price ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownProduct`] if `id` is not in the catalog.
    pub fn select(
        &mut self,
        catalog: &Catalog,
        id: &ProductId,
    ) -> Result<&RecommendationSuggestion, SessionError> {
        let source = catalog
            .product(id)
            .ok_or_else(|| SessionError::UnknownProduct(id.clone()))?;

        let filter = self.filter();

        let alternatives: SmallVec<[Suggestion; 4]> = catalog
            .alternatives_for(source.name())
            .filter(|alternative| filter.within_ceiling(alternative.product))
            .map(|alternative| Suggestion {
                product: alternative.product.clone(),
                reason: alternative.reason.to_string(),
            })
            .collect();

        debug!(
            product = %id,
            alternatives = alternatives.len(),
            "showing alternatives"
        );

        self.state = SessionState::AlternativesShown(RecommendationSuggestion {
            source: source.clone(),
            alternatives,
        });

        self.current().ok_or(SessionError::NothingSelected)
    }

    /// The alternative at `index` among those shown.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NothingSelected`] if no alternatives are shown, or
    /// [`SessionError::NoSuchAlternative`] if `index` is out of range.
    pub fn suggestion(&self, index: usize) -> Result<&Suggestion, SessionError> {
        self.current()
            .ok_or(SessionError::NothingSelected)?
            .alternatives
            .get(index)
            .ok_or(SessionError::NoSuchAlternative(index))
    }

    /// Accept the alternative at `index`, returning to browsing.
    ///
    /// # Errors
    ///
    /// Same as [`RecommendationSession::suggestion`]; the state is unchanged on error.
    pub fn accept(&mut self, index: usize) -> Result<Product, SessionError> {
        let product = self.suggestion(index)?.product.clone();

        self.state = SessionState::Browsing;

        Ok(product)
    }

    /// Dismiss the shown alternatives, returning to browsing.
    pub fn reject(&mut self) {
        if matches!(self.state, SessionState::AlternativesShown(_)) {
            self.state = SessionState::Browsing;
        }
    }

    /// Navigation away: drop alternatives and pending input, keep the filter.
    pub fn leave(&mut self) {
        self.search.flush();
        self.state = SessionState::Idle;
    }

    fn start_browsing(&mut self) {
        if matches!(self.state, SessionState::Idle) {
            self.state = SessionState::Browsing;
        }
    }
}
