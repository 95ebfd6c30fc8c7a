//! Cart Ledger

use std::num::NonZeroU32;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::products::{Product, ProductId};

/// Errors raised while restoring a ledger.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// Two lines carry the same product identity.
    #[error("cart holds more than one line for {0}")]
    DuplicateLine(ProductId),
}

/// A product in the cart together with its quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    product: Product,
    quantity: NonZeroU32,
}

impl CartLine {
    /// Create a line holding a single unit of `product`.
    #[must_use]
    pub fn new(product: Product) -> Self {
        Self {
            product,
            quantity: NonZeroU32::MIN,
        }
    }

    /// The product on this line
    pub fn product(&self) -> &Product {
        &self.product
    }

    /// Number of units, always at least one
    pub fn quantity(&self) -> u32 {
        self.quantity.get()
    }

    /// Unit price multiplied by quantity
    pub fn line_total(&self) -> Decimal {
        self.product
            .price()
            .saturating_mul(Decimal::from(self.quantity.get()))
    }

    fn increment(&mut self) {
        self.quantity = self.quantity.saturating_add(1);
    }

    fn adjust(&mut self, delta: i64) {
        let adjusted = i64::from(self.quantity.get()).saturating_add(delta);
        let clamped = u32::try_from(adjusted.max(1)).unwrap_or(u32::MAX);

        self.quantity = NonZeroU32::new(clamped).unwrap_or(NonZeroU32::MIN);
    }
}

/// Ordered collection of cart lines, at most one per product identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartLine>", into = "Vec<CartLine>")]
pub struct CartLedger {
    lines: Vec<CartLine>,
}

impl TryFrom<Vec<CartLine>> for CartLedger {
    type Error = CartError;

    fn try_from(lines: Vec<CartLine>) -> Result<Self, Self::Error> {
        for (index, line) in lines.iter().enumerate() {
            let id = line.product.id();

            if lines
                .iter()
                .take(index)
                .any(|earlier| earlier.product.id() == id)
            {
                return Err(CartError::DuplicateLine(id.clone()));
            }
        }

        Ok(Self { lines })
    }
}

impl From<CartLedger> for Vec<CartLine> {
    fn from(ledger: CartLedger) -> Self {
        ledger.lines
    }
}

impl CartLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of `product`. A product already in the ledger has its
    /// quantity incremented; otherwise a new line is appended.
    ///
    /// Returns the resulting quantity for the product.
    pub fn add(&mut self, product: Product) -> u32 {
        if let Some(line) = self.line_mut(product.id()) {
            line.increment();

            return line.quantity();
        }

        self.lines.push(CartLine::new(product));

        1
    }

    /// Remove the line for `id`, returning it if it was present.
    pub fn remove(&mut self, id: &ProductId) -> Option<CartLine> {
        let position = self
            .lines
            .iter()
            .position(|line| line.product.id() == id)?;

        Some(self.lines.remove(position))
    }

    /// Change the quantity of the line for `id` by `delta`, never going below one.
    ///
    /// Returns the new quantity, or `None` if no line matches.
    pub fn update_quantity(&mut self, id: &ProductId, delta: i64) -> Option<u32> {
        let line = self.line_mut(id)?;

        line.adjust(delta);

        Some(line.quantity())
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of price × quantity over all lines.
    pub fn total(&self) -> Decimal {
        self.lines
            .iter()
            .fold(Decimal::ZERO, |acc, line| acc.saturating_add(line.line_total()))
    }

    /// Sum of quantities over all lines.
    pub fn item_count(&self) -> u64 {
        self.lines
            .iter()
            .map(|line| u64::from(line.quantity()))
            .sum()
    }

    /// Look up the line for `id`.
    pub fn line(&self, id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product.id() == id)
    }

    /// Iterate over the lines in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.iter()
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the ledger has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn line_mut(&mut self, id: &ProductId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.product.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;
    use testresult::TestResult;

    use super::*;

    fn bottle() -> Result<Product, crate::products::ProductError> {
        Product::new("bottle", "Reusable Bottle", "Kitchen", dec!(10))
    }

    fn bag() -> Result<Product, crate::products::ProductError> {
        Product::new("bag", "Jute Bag", "Bags", dec!(2.50))
    }

    #[test]
    fn repeated_add_aggregates_into_one_line() -> TestResult {
        let mut ledger = CartLedger::new();

        for _ in 0..5 {
            ledger.add(bottle()?);
        }

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.line(&"bottle".into()).map(CartLine::quantity), Some(5));

        Ok(())
    }

    #[test]
    fn add_keeps_insertion_order() -> TestResult {
        let mut ledger = CartLedger::new();

        ledger.add(bottle()?);
        ledger.add(bag()?);
        ledger.add(bottle()?);

        let ids: Vec<&str> = ledger
            .iter()
            .map(|line| line.product().id().as_str())
            .collect();

        assert_eq!(ids, vec!["bottle", "bag"]);

        Ok(())
    }

    #[test]
    fn remove_is_idempotent() -> TestResult {
        let mut ledger = CartLedger::new();
        ledger.add(bottle()?);

        let id = ProductId::new("bottle");

        assert!(ledger.remove(&id).is_some());
        assert!(ledger.remove(&id).is_none());
        assert!(ledger.is_empty());

        Ok(())
    }

    #[test]
    fn update_quantity_never_drops_below_one() -> TestResult {
        let mut ledger = CartLedger::new();
        ledger.add(bottle()?);
        ledger.add(bottle()?);

        let id = ProductId::new("bottle");

        assert_eq!(ledger.update_quantity(&id, 3), Some(5));
        assert_eq!(ledger.update_quantity(&id, -1), Some(4));
        assert_eq!(ledger.update_quantity(&id, -100), Some(1));
        assert_eq!(ledger.update_quantity(&id, i64::MIN), Some(1));

        Ok(())
    }

    #[test]
    fn update_quantity_on_missing_line_is_noop() -> TestResult {
        let mut ledger = CartLedger::new();
        ledger.add(bag()?);

        assert_eq!(ledger.update_quantity(&ProductId::new("bottle"), 1), None);
        assert_eq!(ledger.item_count(), 1);

        Ok(())
    }

    #[test]
    fn total_sums_price_times_quantity() -> TestResult {
        let mut ledger = CartLedger::new();

        ledger.add(bottle()?);
        ledger.add(bottle()?);
        ledger.add(bag()?);

        assert_eq!(ledger.total(), dec!(22.50));
        assert_eq!(ledger.item_count(), 3);

        Ok(())
    }

    #[test]
    fn empty_ledger_totals_zero() {
        let ledger = CartLedger::new();

        assert_eq!(ledger.total(), Decimal::ZERO);
        assert_eq!(ledger.item_count(), 0);
    }

    #[test]
    fn clear_empties_the_ledger() -> TestResult {
        let mut ledger = CartLedger::new();
        ledger.add(bottle()?);
        ledger.add(bag()?);

        ledger.clear();

        assert!(ledger.is_empty());
        assert_eq!(ledger.total(), Decimal::ZERO);

        Ok(())
    }

    #[test]
    fn snapshot_with_zero_quantity_is_rejected() {
        let json = r#"[{ "product": { "id": "bag", "name": "Jute Bag", "price": "2" }, "quantity": 0 }]"#;

        assert!(serde_json::from_str::<CartLedger>(json).is_err());
    }

    #[test]
    fn snapshot_with_repeated_product_is_rejected() {
        let json = r#"[
            { "product": { "id": "bag", "name": "Jute Bag", "price": "2" }, "quantity": 1 },
            { "product": { "id": "bag", "name": "Jute Bag", "price": "2" }, "quantity": 3 }
        ]"#;

        let result = serde_json::from_str::<CartLedger>(json);

        assert!(
            result
                .as_ref()
                .is_err_and(|error| error.to_string().contains("bag")),
            "unexpected {result:?}"
        );
    }

    #[test]
    fn snapshot_round_trips_as_a_list() -> TestResult {
        let mut ledger = CartLedger::new();
        ledger.add(Product::new("bag", "Jute Bag", "Bags", dec!(2))?);
        ledger.add(Product::new("bar", "Shampoo Bar", "Personal Care", dec!(6))?);

        let json = serde_json::to_string(&ledger)?;

        assert!(json.starts_with('['), "{json}");
        assert_eq!(serde_json::from_str::<CartLedger>(&json)?, ledger);

        Ok(())
    }
}
