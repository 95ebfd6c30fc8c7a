//! Favorites

use serde::{Deserialize, Serialize};

use crate::products::{Product, ProductId};

/// Liked products, kept as full snapshots so they can be shown without a lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Favorites {
    items: Vec<Product>,
}

impl Favorites {
    /// Flip membership of `product`. Returns `true` if it is now a favorite.
    pub fn toggle(&mut self, product: &Product) -> bool {
        if let Some(position) = self.position(product.id()) {
            self.items.remove(position);

            return false;
        }

        self.items.push(product.clone());

        true
    }

    /// Whether the product with `id` is a favorite.
    pub fn is_favorite(&self, id: &ProductId) -> bool {
        self.position(id).is_some()
    }

    /// Iterate over favorites in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.items.iter()
    }

    /// Number of favorites.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no favorites.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, id: &ProductId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn toggle_twice_restores_membership() -> TestResult {
        let product = Product::new("bag", "Jute Bag", "Bags", dec!(3))?;
        let mut favorites = Favorites::default();

        assert!(favorites.toggle(&product));
        assert!(favorites.is_favorite(product.id()));

        assert!(!favorites.toggle(&product));
        assert!(!favorites.is_favorite(product.id()));
        assert!(favorites.is_empty());

        Ok(())
    }

    #[test]
    fn toggle_stores_full_snapshot() -> TestResult {
        let product = Product::new("bag", "Jute Bag", "Bags", dec!(3))?.with_sustainable(true);
        let mut favorites = Favorites::default();

        favorites.toggle(&product);

        assert_eq!(favorites.iter().next(), Some(&product));

        Ok(())
    }
}
