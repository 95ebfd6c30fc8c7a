//! Weekly Budget
//!
//! A spending allowance that resets to the default once more than seven days
//! have passed since the last reset, plus manual top-ups and the overspend
//! signal derived from the remaining balance.

use jiff::{SignedDuration, Timestamp};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

/// Allowance granted at every reset.
pub const DEFAULT_WEEKLY_ALLOWANCE: Decimal = Decimal::ONE_HUNDRED;

/// Length of the rolling budget window.
pub const RESET_PERIOD: SignedDuration = SignedDuration::from_hours(7 * 24);

/// How far below zero the remaining balance may go before the overspend signal fires.
pub const OVERSPEND_TOLERANCE: Decimal = Decimal::TEN;

/// Errors raised by budget operations.
#[derive(Debug, Error, PartialEq)]
pub enum BudgetError {
    /// The top-up input was not a number.
    #[error("Please enter a valid positive number.")]
    InvalidAmount(String),

    /// The top-up amount was zero or negative.
    #[error("Please enter a valid positive number.")]
    NonPositiveAmount(Decimal),

    /// The top-up would overflow the budget amount.
    #[error("budget amount overflowed")]
    Overflow,
}

impl BudgetError {
    /// Whether the error was caused by bad user input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BudgetError::InvalidAmount(_) | BudgetError::NonPositiveAmount(_)
        )
    }
}

/// How a budget came to be when a session started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetOrigin {
    /// No usable budget was stored; a new one was created.
    Created,

    /// The stored budget was older than the reset period and was reset.
    Reset,

    /// The stored budget was still current and was loaded unchanged.
    Loaded,
}

impl BudgetOrigin {
    /// Whether the budget differs from what was stored and must be written back.
    pub fn needs_persisting(self) -> bool {
        !matches!(self, BudgetOrigin::Loaded)
    }
}

/// Weekly budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    amount: Decimal,
    last_reset: Timestamp,
}

impl Budget {
    /// Create a budget holding `allowance`, reset at `now`.
    #[must_use]
    pub fn new(allowance: Decimal, now: Timestamp) -> Self {
        Self {
            amount: allowance,
            last_reset: now,
        }
    }

    /// Restore a budget from stored parts, applying the rolling reset.
    ///
    /// Either part missing, or a last reset more than [`RESET_PERIOD`] before
    /// `now`, yields a fresh budget holding `allowance`.
    #[must_use]
    pub fn restore(
        amount: Option<Decimal>,
        last_reset: Option<Timestamp>,
        allowance: Decimal,
        now: Timestamp,
    ) -> (Self, BudgetOrigin) {
        let (Some(amount), Some(last_reset)) = (amount, last_reset) else {
            info!("no stored budget, starting with {allowance}");

            return (Self::new(allowance, now), BudgetOrigin::Created);
        };

        let stored = Self { amount, last_reset };

        if stored.is_due_for_reset(now) {
            info!(%last_reset, "weekly budget window elapsed, resetting to {allowance}");

            return (Self::new(allowance, now), BudgetOrigin::Reset);
        }

        (stored, BudgetOrigin::Loaded)
    }

    /// Whether more than [`RESET_PERIOD`] has passed since the last reset.
    pub fn is_due_for_reset(&self, now: Timestamp) -> bool {
        now.duration_since(self.last_reset) > RESET_PERIOD
    }

    /// Add `extra` to the amount.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetError::NonPositiveAmount`] if `extra` is not above zero, or
    /// [`BudgetError::Overflow`] if the sum cannot be represented.
    pub fn increase(&mut self, extra: Decimal) -> Result<Decimal, BudgetError> {
        if extra <= Decimal::ZERO {
            return Err(BudgetError::NonPositiveAmount(extra));
        }

        self.amount = self
            .amount
            .checked_add(extra)
            .ok_or(BudgetError::Overflow)?;

        Ok(self.amount)
    }

    /// Amount minus `spent`. May be negative.
    pub fn remaining(&self, spent: Decimal) -> Decimal {
        self.amount.saturating_sub(spent)
    }

    /// Instant at which the next rolling reset becomes due.
    pub fn next_reset(&self) -> Option<Timestamp> {
        self.last_reset.checked_add(RESET_PERIOD).ok()
    }

    /// Current amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Instant of the last reset
    pub fn last_reset(&self) -> Timestamp {
        self.last_reset
    }
}

/// Parse raw top-up input into a positive amount.
///
/// # Errors
///
/// Returns [`BudgetError::InvalidAmount`] if the input is not a decimal
/// number, or [`BudgetError::NonPositiveAmount`] if it is zero or negative.
pub fn parse_top_up(raw: &str) -> Result<Decimal, BudgetError> {
    let trimmed = raw.trim();

    let amount = trimmed
        .parse::<Decimal>()
        .map_err(|_err| BudgetError::InvalidAmount(raw.to_string()))?;

    if amount <= Decimal::ZERO {
        return Err(BudgetError::NonPositiveAmount(amount));
    }

    Ok(amount)
}

/// Edge detector for the overspend signal.
///
/// Fires once when the remaining balance crosses below
/// `-OVERSPEND_TOLERANCE`, and re-arms once it climbs back to or above it.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverspendMonitor {
    overspent: bool,
}

impl OverspendMonitor {
    /// Observe the latest remaining balance. Returns `true` on a crossing.
    pub fn observe(&mut self, remaining: Decimal) -> bool {
        let overspent = remaining < -OVERSPEND_TOLERANCE;
        let crossed = overspent && !self.overspent;

        self.overspent = overspent;

        crossed
    }

    /// Whether the last observed balance was beyond the tolerance.
    pub fn is_overspent(&self) -> bool {
        self.overspent
    }
}
