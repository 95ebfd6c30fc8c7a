//! Product Entry
//!
//! The typed-in lookup flow: the shopper enters a product name and picks a
//! category, the recommender is queried, and the answer is shown until the
//! shopper adds it to the cart or navigates away.
//!
//! Each request carries a generation ticket. Only the reply holding the
//! current ticket is applied; anything older, or anything arriving after the
//! flow was reset, is discarded.

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    notifications::Notice,
    products::{Product, ProductError},
    recommendations::lookup::{
        GreenerAlternative, RecommendationError, RecommendationOutcome, RecommendationRequest,
        RecommendationService,
    },
};

/// Shown when a lookup fails.
pub const LOOKUP_FAILED: &str = "Error fetching greener alternative.";

/// Toast text for a failed lookup.
pub const LOOKUP_FAILED_TOAST: &str = "Error during recommendation.";

/// Toast text for a found alternative.
pub const ALTERNATIVE_FOUND: &str = "Greener alternative found!";

/// Shown when the category list cannot be loaded.
pub const CATEGORIES_FAILED: &str = "Failed to load categories.";

/// Product entry errors
#[derive(Debug, Error, PartialEq)]
pub enum LookupError {
    /// Name or category left blank.
    #[error("Please provide both product name and category.")]
    MissingInput,

    /// There is no alternative to add.
    #[error("No greener alternative to add.")]
    NoAlternative,

    /// The alternative could not be turned into a product.
    #[error(transparent)]
    Product(#[from] ProductError),
}

/// What the flow is currently showing.
#[derive(Debug, Clone, PartialEq)]
pub enum EntrySuggestion {
    /// An alternative for the requested category
    Alternative {
        /// The alternative
        alternative: GreenerAlternative,

        /// Category it was requested for
        category: String,
    },

    /// The recommender's "nothing found" message
    Message(String),
}

/// An issued lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    generation: u64,
    request: RecommendationRequest,
}

impl LookupTicket {
    /// The request to send.
    pub fn request(&self) -> &RecommendationRequest {
        &self.request
    }

    /// Send the request to `service`.
    pub async fn resolve<S>(self, service: &S) -> LookupReply
    where
        S: RecommendationService + ?Sized,
    {
        let result = service.recommend(&self.request).await;

        LookupReply {
            ticket: self,
            result,
        }
    }
}

/// A completed lookup, ready to hand back to the flow that issued it.
#[derive(Debug)]
pub struct LookupReply {
    /// Ticket the request was issued with
    pub ticket: LookupTicket,

    /// Recommender answer
    pub result: Result<RecommendationOutcome, RecommendationError>,
}

/// How a reply was handled.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The reply was current; show this toast.
    Applied(Notice),

    /// The reply was superseded and ignored.
    Stale,
}

/// State of the product-entry lookup flow.
#[derive(Debug, Clone, Default)]
pub struct ProductEntry {
    product_name: String,
    category: String,
    categories: Vec<String>,
    generation: u64,
    pending: Option<u64>,
    suggestion: Option<EntrySuggestion>,
    error: Option<String>,
}

impl ProductEntry {
    /// Set the product name input.
    pub fn set_product_name(&mut self, name: impl Into<String>) {
        self.product_name = name.into();
    }

    /// Set the category input.
    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = category.into();
    }

    /// Product name input
    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    /// Category input
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Categories available for selection.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Apply the result of loading the category list.
    pub fn load_categories(&mut self, result: Result<Vec<String>, RecommendationError>) {
        match result {
            Ok(categories) => self.categories = categories,
            Err(error) => {
                warn!(%error, "failed to load categories");
                self.error = Some(CATEGORIES_FAILED.to_string());
            }
        }
    }

    /// Start a lookup with the current inputs.
    ///
    /// A new lookup supersedes any still in flight. The suggestion on show is
    /// kept until a reply replaces it.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::MissingInput`] if either input is blank.
    pub fn begin(&mut self) -> Result<LookupTicket, LookupError> {
        self.error = None;

        if self.product_name.trim().is_empty() || self.category.trim().is_empty() {
            self.error = Some(LookupError::MissingInput.to_string());

            return Err(LookupError::MissingInput);
        }

        self.generation = self.generation.wrapping_add(1);
        self.pending = Some(self.generation);

        debug!(generation = self.generation, "lookup started");

        Ok(LookupTicket {
            generation: self.generation,
            request: RecommendationRequest::new(
                self.product_name.trim(),
                self.category.trim(),
            ),
        })
    }

    /// Apply a reply if it belongs to the lookup currently in flight.
    pub fn complete(&mut self, reply: LookupReply) -> Completion {
        let LookupReply { ticket, result } = reply;

        if self.pending != Some(ticket.generation) {
            debug!(
                generation = ticket.generation,
                current = self.generation,
                "discarding stale lookup reply"
            );

            return Completion::Stale;
        }

        self.pending = None;

        match result {
            Ok(RecommendationOutcome::Alternative(alternative)) => {
                self.suggestion = Some(EntrySuggestion::Alternative {
                    alternative,
                    category: ticket.request.category,
                });

                Completion::Applied(Notice::success(ALTERNATIVE_FOUND))
            }
            Ok(RecommendationOutcome::NoAlternative { message }) => {
                self.suggestion = Some(EntrySuggestion::Message(message.clone()));

                Completion::Applied(Notice::info(message))
            }
            Err(error) => {
                warn!(%error, "recommendation lookup failed");

                self.error = Some(LOOKUP_FAILED.to_string());

                Completion::Applied(Notice::error(LOOKUP_FAILED_TOAST))
            }
        }
    }

    /// Whether a lookup is in flight.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// The suggestion on show.
    pub fn suggestion(&self) -> Option<&EntrySuggestion> {
        self.suggestion.as_ref()
    }

    /// Inline error message.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The shown alternative as a cart-ready product.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NoAlternative`] if no alternative is shown.
    pub fn alternative_product(&self) -> Result<Product, LookupError> {
        match &self.suggestion {
            Some(EntrySuggestion::Alternative {
                alternative,
                category,
            }) => Ok(alternative.clone().into_product(category.as_str())?),
            Some(EntrySuggestion::Message(_)) | None => Err(LookupError::NoAlternative),
        }
    }

    /// Navigation away: forget inputs and results, and orphan any lookup in flight.
    pub fn reset(&mut self) {
        let categories = std::mem::take(&mut self.categories);
        let generation = self.generation.wrapping_add(1);

        *self = Self {
            categories,
            generation,
            ..Self::default()
        };
    }
}
