//! Recommendations
//!
//! Two ways to find a greener product: browsing the bundled catalog, whose
//! alternatives come from a static mapping, and typing a product into the
//! entry flow, which asks the external recommender.

pub mod catalog;
pub mod entry;
pub mod lookup;
pub mod session;

pub use catalog::{Alternative, Catalog, CatalogError};
pub use entry::{Completion, EntrySuggestion, LookupError, LookupReply, LookupTicket, ProductEntry};
pub use lookup::{
    GreenerAlternative, HttpRecommendationService, RecommendationError, RecommendationOutcome,
    RecommendationRequest, RecommendationService,
};
pub use session::{
    BrowseFilter, RecommendationSession, RecommendationSuggestion, SessionError, SessionState,
    Suggestion,
};
