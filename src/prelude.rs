//! Greencart prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    auth::{Account, AuthError, AuthProvider, Credentials, SignUpForm},
    budget::{Budget, BudgetError, OverspendMonitor},
    cart::{CartLedger, CartLine},
    dashboard::{Dashboard, DashboardError},
    favorites::Favorites,
    impact::ImpactTotals,
    navigation::{Navigator, Screen},
    notifications::{Notice, NoticeKind, Toasts},
    persistence::{FileStore, KeyValueStore, MemoryStore, StorageKey, StoreError},
    products::{ImpactVector, Product, ProductError, ProductId},
    recommendations::{
        Catalog, CatalogError, Completion, HttpRecommendationService, ProductEntry,
        RecommendationError, RecommendationOutcome, RecommendationService, RecommendationSession,
        SessionError,
    },
    storefront::{Storefront, StorefrontError, StorefrontSettings},
};
