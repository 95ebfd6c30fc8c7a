//! Storefront
//!
//! The single store object owning the cart, budget, impact totals and
//! favorites for one shopper. It is opened from persisted snapshots and every
//! mutation writes its new snapshot before the in-memory value is replaced, so
//! memory never runs ahead of what a reload would see.

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    budget::{Budget, BudgetError, DEFAULT_WEEKLY_ALLOWANCE, OverspendMonitor, parse_top_up},
    cart::{CartLedger, CartLine},
    favorites::Favorites,
    impact::ImpactTotals,
    notifications::Notice,
    persistence::{KeyValueStore, Persistence, StorageKey, StoreError},
    products::{Product, ProductId},
    recommendations::{
        entry::{LookupError, ProductEntry},
        session::{RecommendationSession, SessionError},
    },
};

/// Warning shown when spending passes the overspend tolerance.
pub const OVERSPEND_WARNING: &str = "Uh oh! Your spending has significantly exceeded your budget.";

/// Notice shown after the cart is emptied.
pub const CART_CLEARED: &str = "Cart cleared.";

/// Storefront errors
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// A snapshot could not be written; in-memory state is unchanged.
    #[error("Failed to save {key}: {source}")]
    Persistence {
        /// Storage key being written
        key: &'static str,

        /// Underlying store error
        #[source]
        source: StoreError,
    },

    /// Budget input was rejected.
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// A recommendation session operation was invalid.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The product-entry flow had nothing to add.
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

impl StorefrontError {
    fn persisting(key: StorageKey) -> impl FnOnce(StoreError) -> Self {
        move |source| StorefrontError::Persistence {
            key: key.as_str(),
            source,
        }
    }

    /// Whether the error was caused by bad user input rather than a failure.
    pub fn is_validation(&self) -> bool {
        match self {
            StorefrontError::Budget(error) => error.is_validation(),
            StorefrontError::Lookup(LookupError::MissingInput) => true,
            StorefrontError::Persistence { .. }
            | StorefrontError::Session(_)
            | StorefrontError::Lookup(_) => false,
        }
    }
}

/// Storefront settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorefrontSettings {
    /// Allowance granted at each weekly reset
    pub weekly_allowance: Decimal,
}

impl Default for StorefrontSettings {
    fn default() -> Self {
        Self {
            weekly_allowance: DEFAULT_WEEKLY_ALLOWANCE,
        }
    }
}

/// Cart, budget, impact and favorites for one shopper.
#[derive(Debug)]
pub struct Storefront<S> {
    persistence: Persistence<S>,
    settings: StorefrontSettings,
    cart: CartLedger,
    budget: Budget,
    impact: ImpactTotals,
    favorites: Favorites,
    overspend: OverspendMonitor,
    notices: Vec<Notice>,
}

impl<S: KeyValueStore> Storefront<S> {
    /// Open the storefront from `store` with default settings.
    pub fn open(store: S, now: Timestamp) -> Self {
        Self::open_with(store, now, StorefrontSettings::default())
    }

    /// Open the storefront from `store`.
    ///
    /// Missing or malformed snapshots fall back to defaults. The budget is
    /// reset if its window has elapsed, and the overspend check runs once.
    pub fn open_with(store: S, now: Timestamp, settings: StorefrontSettings) -> Self {
        let mut persistence = Persistence::new(store);

        let cart: CartLedger = persistence.load(StorageKey::Cart).unwrap_or_default();
        let impact: ImpactTotals = persistence.load(StorageKey::ImpactTotals).unwrap_or_default();
        let favorites: Favorites = persistence.load(StorageKey::Favorites).unwrap_or_default();

        let (budget, origin) = Budget::restore(
            persistence.load(StorageKey::WeeklyBudget),
            persistence.load(StorageKey::LastReset),
            settings.weekly_allowance,
            now,
        );

        if origin.needs_persisting()
            && let Err(source) = save_budget(&mut persistence, &budget)
        {
            error!("failed to persist restored budget: {source}");
        }

        debug!(
            lines = cart.len(),
            favorites = favorites.len(),
            budget = %budget.amount(),
            ?origin,
            "storefront opened"
        );

        let mut storefront = Self {
            persistence,
            settings,
            cart,
            budget,
            impact,
            favorites,
            overspend: OverspendMonitor::default(),
            notices: Vec::new(),
        };

        storefront.check_overspend();

        storefront
    }

    /// Add one unit of `product` to the cart and record its impact.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Persistence`] if a snapshot cannot be
    /// written; neither the cart nor the impact totals change.
    pub fn add_to_cart(&mut self, product: Product) -> Result<&CartLedger, StorefrontError> {
        let mut impact = self.impact;
        impact.record(product.impact());

        let mut cart = self.cart.clone();
        let id = product.id().clone();
        let quantity = cart.add(product);

        self.persist(StorageKey::Cart, &cart)?;

        if let Err(err) = self.persist(StorageKey::ImpactTotals, &impact) {
            let previous = self.cart.clone();

            if let Err(rollback) = self.persist(StorageKey::Cart, &previous) {
                error!("failed to roll back cart snapshot: {rollback}");
            }

            return Err(err);
        }

        self.cart = cart;
        self.impact = impact;

        debug!(product = %id, quantity, "added to cart");

        self.check_overspend();

        Ok(&self.cart)
    }

    /// Remove the line for `id`. Removing an absent line is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Persistence`] if the snapshot cannot be written.
    pub fn remove_from_cart(&mut self, id: &ProductId) -> Result<Option<CartLine>, StorefrontError> {
        let mut cart = self.cart.clone();

        let Some(removed) = cart.remove(id) else {
            return Ok(None);
        };

        self.commit_cart(cart)?;

        debug!(product = %id, "removed from cart");

        Ok(Some(removed))
    }

    /// Change the quantity of the line for `id` by `delta`, never below one.
    ///
    /// Returns the new quantity, or `None` if there is no such line.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Persistence`] if the snapshot cannot be written.
    pub fn update_quantity(
        &mut self,
        id: &ProductId,
        delta: i64,
    ) -> Result<Option<u32>, StorefrontError> {
        let mut cart = self.cart.clone();

        let Some(quantity) = cart.update_quantity(id, delta) else {
            return Ok(None);
        };

        self.commit_cart(cart)?;

        debug!(product = %id, quantity, "quantity updated");

        Ok(Some(quantity))
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Persistence`] if the snapshot cannot be written.
    pub fn clear_cart(&mut self) -> Result<&CartLedger, StorefrontError> {
        self.commit_cart(CartLedger::new())?;

        info!("cart cleared");

        self.notices.push(Notice::info(CART_CLEARED));

        Ok(&self.cart)
    }

    /// Parse `raw` and add it to the budget, returning the new amount.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Budget`] for invalid input, or
    /// [`StorefrontError::Persistence`] if the amount cannot be written. The
    /// budget is unchanged on error.
    pub fn increase_budget(&mut self, raw: &str) -> Result<Decimal, StorefrontError> {
        let extra = parse_top_up(raw)?;

        let mut budget = self.budget;
        let amount = budget.increase(extra)?;

        self.persist(StorageKey::WeeklyBudget, &amount)?;
        self.budget = budget;

        info!(%extra, %amount, "budget increased");

        self.check_overspend();

        Ok(amount)
    }

    /// Re-run the rolling reset for a long-lived session. Returns `true` if the budget was reset.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Persistence`] if the reset budget cannot be written.
    pub fn refresh_budget(&mut self, now: Timestamp) -> Result<bool, StorefrontError> {
        if !self.budget.is_due_for_reset(now) {
            return Ok(false);
        }

        let budget = Budget::new(self.settings.weekly_allowance, now);

        save_budget(&mut self.persistence, &budget)?;
        self.budget = budget;

        info!(amount = %budget.amount(), "weekly budget reset");

        self.check_overspend();

        Ok(true)
    }

    /// Flip favorite membership for `product`. Returns `true` if it is now a favorite.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Persistence`] if the snapshot cannot be written.
    pub fn toggle_favorite(&mut self, product: &Product) -> Result<bool, StorefrontError> {
        let mut favorites = self.favorites.clone();
        let added = favorites.toggle(product);

        self.persist(StorageKey::Favorites, &favorites)?;
        self.favorites = favorites;

        debug!(product = %product.id(), added, "favorite toggled");

        Ok(added)
    }

    /// Whether `id` is a favorite.
    pub fn is_favorite(&self, id: &ProductId) -> bool {
        self.favorites.is_favorite(id)
    }

    /// Accept the alternative at `index` shown by `session`: add it to the
    /// cart and return the session to browsing.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Session`] if there is no such alternative, or
    /// [`StorefrontError::Persistence`] if the cart cannot be written. The
    /// session keeps showing its alternatives on error.
    pub fn accept_suggestion(
        &mut self,
        session: &mut RecommendationSession,
        index: usize,
    ) -> Result<Product, StorefrontError> {
        let product = session.suggestion(index)?.product.clone();

        self.add_to_cart(product)?;

        Ok(session.accept(index)?)
    }

    /// Add the alternative shown by the product-entry flow to the cart.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Lookup`] if no alternative is shown, or
    /// [`StorefrontError::Persistence`] if the cart cannot be written.
    pub fn add_entry_alternative(&mut self, entry: &ProductEntry) -> Result<Product, StorefrontError> {
        let product = entry.alternative_product()?;

        self.add_to_cart(product.clone())?;

        Ok(product)
    }

    /// Zero the impact totals and remove their snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Persistence`] if the snapshot cannot be removed.
    pub fn reset_impact(&mut self) -> Result<&ImpactTotals, StorefrontError> {
        let key = StorageKey::ImpactTotals;

        self.persistence
            .clear(key)
            .map_err(StorefrontError::persisting(key))?;

        self.impact = ImpactTotals::default();

        info!("impact totals reset");

        Ok(&self.impact)
    }

    /// Budget amount minus cart total. May be negative.
    pub fn remaining(&self) -> Decimal {
        self.budget.remaining(self.cart.total())
    }

    /// Cart total
    pub fn spent(&self) -> Decimal {
        self.cart.total()
    }

    /// When the budget next resets.
    pub fn next_reset(&self) -> Option<Timestamp> {
        self.budget.next_reset()
    }

    /// Whether spending is currently past the overspend tolerance.
    pub fn is_overspent(&self) -> bool {
        self.overspend.is_overspent()
    }

    /// Cart ledger
    pub fn cart(&self) -> &CartLedger {
        &self.cart
    }

    /// Weekly budget
    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    /// Impact totals
    pub fn impact(&self) -> &ImpactTotals {
        &self.impact
    }

    /// Favorites
    pub fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    /// Drain notices raised since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Borrow the underlying store.
    pub fn store(&self) -> &S {
        self.persistence.store()
    }

    /// Close the storefront, returning the underlying store.
    pub fn into_store(self) -> S {
        self.persistence.into_inner()
    }

    fn commit_cart(&mut self, cart: CartLedger) -> Result<(), StorefrontError> {
        self.persist(StorageKey::Cart, &cart)?;
        self.cart = cart;

        self.check_overspend();

        Ok(())
    }

    fn persist<T: Serialize + ?Sized>(
        &mut self,
        key: StorageKey,
        value: &T,
    ) -> Result<(), StorefrontError> {
        self.persistence.save(key, value).map_err(|source| {
            error!(key = key.as_str(), "failed to persist snapshot: {source}");

            StorefrontError::persisting(key)(source)
        })
    }

    fn check_overspend(&mut self) {
        let remaining = self.remaining();

        if self.overspend.observe(remaining) {
            warn!(%remaining, "spending exceeded budget");

            self.notices.push(Notice::warning(OVERSPEND_WARNING));
        }
    }
}

fn save_budget<S: KeyValueStore>(
    persistence: &mut Persistence<S>,
    budget: &Budget,
) -> Result<(), StorefrontError> {
    persistence
        .save(StorageKey::WeeklyBudget, &budget.amount())
        .map_err(StorefrontError::persisting(StorageKey::WeeklyBudget))?;

    persistence
        .save(StorageKey::LastReset, &budget.last_reset())
        .map_err(StorefrontError::persisting(StorageKey::LastReset))
}
