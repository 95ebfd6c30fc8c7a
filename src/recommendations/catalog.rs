//! Product Catalog

use std::{fs, path::Path};

use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;

use crate::products::{Product, ProductId};

const BUILTIN_CATALOG: &str = include_str!("../../fixtures/catalog.yml");

/// Catalog loading errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading the catalog file
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Two products share an identity
    #[error("Duplicate product: {0}")]
    DuplicateProduct(ProductId),

    /// An alternative references a product that is not in the catalog
    #[error("Alternative for {for_name} references unknown product {product}")]
    UnknownAlternative {
        /// Name of the product the alternative is listed for
        for_name: String,

        /// Identity that could not be found
        product: ProductId,
    },
}

#[derive(Debug, Deserialize)]
struct CatalogFixture {
    products: Vec<Product>,

    #[serde(default)]
    alternatives: FxHashMap<String, Vec<AlternativeFixture>>,
}

#[derive(Debug, Deserialize)]
struct AlternativeFixture {
    product: ProductId,
    reason: String,
}

/// A greener alternative listed in the catalog, with its justification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alternative<'c> {
    /// The alternative product
    pub product: &'c Product,

    /// Why it is the greener choice
    pub reason: &'c str,
}

#[derive(Debug, Clone)]
struct AlternativeEntry {
    product: usize,
    reason: String,
}

/// Static product list plus the alternatives mapping, keyed by product name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    index: FxHashMap<ProductId, usize>,
    alternatives: FxHashMap<String, Vec<AlternativeEntry>>,
}

impl Catalog {
    /// The catalog bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the bundled document is invalid.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the file cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }

    /// Parse a catalog from a YAML document.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the document cannot be parsed, contains a
    /// duplicate identity, or lists an alternative that is not a known product.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let fixture: CatalogFixture = serde_norway::from_str(yaml)?;

        let mut index = FxHashMap::default();

        for (position, product) in fixture.products.iter().enumerate() {
            if index.insert(product.id().clone(), position).is_some() {
                return Err(CatalogError::DuplicateProduct(product.id().clone()));
            }
        }

        let mut alternatives = FxHashMap::default();

        for (for_name, entries) in fixture.alternatives {
            let mut resolved = Vec::with_capacity(entries.len());

            for entry in entries {
                let Some(&product) = index.get(&entry.product) else {
                    return Err(CatalogError::UnknownAlternative {
                        for_name,
                        product: entry.product,
                    });
                };

                resolved.push(AlternativeEntry {
                    product,
                    reason: entry.reason,
                });
            }

            alternatives.insert(for_name, resolved);
        }

        Ok(Self {
            products: fixture.products,
            index,
            alternatives,
        })
    }

    /// All products, in catalog order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a product by identity.
    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.index
            .get(id)
            .and_then(|&position| self.products.get(position))
    }

    /// Alternatives listed for the product called `name`.
    pub fn alternatives_for<'c>(&'c self, name: &str) -> impl Iterator<Item = Alternative<'c>> {
        self.alternatives
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(|entry| {
                self.products.get(entry.product).map(|product| Alternative {
                    product,
                    reason: &entry.reason,
                })
            })
    }

    /// Distinct category names, sorted.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self
            .products
            .iter()
            .map(Product::category)
            .filter(|category| !category.is_empty())
            .collect();

        categories.sort_unstable();
        categories.dedup();

        categories
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn builtin_catalog_loads() -> TestResult {
        let catalog = Catalog::builtin()?;

        assert!(!catalog.is_empty());
        assert!(catalog.product(&ProductId::new("reusable-bottle")).is_some());

        Ok(())
    }

    #[test]
    fn alternatives_resolve_to_products() -> TestResult {
        let catalog = Catalog::builtin()?;

        let names: Vec<&str> = catalog
            .alternatives_for("Plastic Water Bottle")
            .map(|alternative| alternative.product.name())
            .collect();

        assert_eq!(names, vec!["Reusable Bottle", "Glass Bottle"]);

        Ok(())
    }

    #[test]
    fn unknown_name_has_no_alternatives() -> TestResult {
        let catalog = Catalog::builtin()?;

        assert_eq!(catalog.alternatives_for("Rocket").count(), 0);

        Ok(())
    }

    #[test]
    fn categories_are_sorted_and_distinct() -> TestResult {
        let catalog = Catalog::builtin()?;

        assert_eq!(
            catalog.categories(),
            vec!["Bags", "Cleaning", "Kitchen", "Personal Care"]
        );

        Ok(())
    }

    #[test]
    fn duplicate_identity_is_rejected() {
        let yaml = r#"
products:
  - { id: a, name: A, category: X, price: "1" }
  - { id: a, name: B, category: X, price: "2" }
"#;

        let result = Catalog::from_yaml_str(yaml);

        assert!(
            matches!(result, Err(CatalogError::DuplicateProduct(ref id)) if id.as_str() == "a"),
            "expected DuplicateProduct, got {result:?}"
        );
    }

    #[test]
    fn dangling_alternative_is_rejected() {
        let yaml = r#"
products:
  - { id: a, name: A, category: X, price: "1" }
alternatives:
  A:
    - { product: missing, reason: nothing }
"#;

        let result = Catalog::from_yaml_str(yaml);

        assert!(
            matches!(result, Err(CatalogError::UnknownAlternative { .. })),
            "expected UnknownAlternative, got {result:?}"
        );
    }
}
