//! Command Runner
//!
//! Executes one [`Command`] against the persisted storefront and writes its
//! output. Each invocation opens the store, applies a single action, and
//! reports any notices it raised.

use std::io;

use jiff::Timestamp;
use rusty_money::iso::Currency;
use thiserror::Error;
use tracing::info;

use crate::{
    config::{
        BrowseArgs, BudgetAction, CartAction, Command, Config, FavoritesAction, ImpactAction,
        SuggestArgs,
    },
    cart::CartLine,
    dashboard::{
        Dashboard, DashboardError, format_money, write_alternatives, write_cart,
        write_impact, write_products, write_tips,
    },
    notifications::{Notice, NoticeKind},
    persistence::{FileStore, KeyValueStore, StoreError},
    products::{Product, ProductId},
    recommendations::{
        catalog::{Catalog, CatalogError},
        entry::{Completion, EntrySuggestion, ProductEntry},
        lookup::{HttpRecommendationService, RecommendationService},
        session::{RecommendationSession, SessionError},
    },
    storefront::{Storefront, StorefrontError, StorefrontSettings},
};

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// The catalog could not be loaded.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The data file could not be opened.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A storefront operation failed.
    #[error(transparent)]
    Storefront(#[from] StorefrontError),

    /// A browsing operation failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Output could not be rendered.
    #[error(transparent)]
    Dashboard(#[from] DashboardError),

    /// Output could not be written.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),

    /// No product with the given id.
    #[error("Product not found: {0}")]
    UnknownProduct(ProductId),
}

/// Run the configured command against the data file at `now`.
///
/// # Errors
///
/// Returns a [`CliError`] if the catalog or data file cannot be opened, or
/// the command fails for a reason other than invalid input.
pub async fn run(config: &Config, now: Timestamp, out: &mut impl io::Write) -> Result<(), CliError> {
    let catalog = match &config.catalog {
        Some(path) => Catalog::load(path)?,
        None => Catalog::builtin()?,
    };

    let store = FileStore::open(&config.data_file)?;
    let service = HttpRecommendationService::new(config.recommender_url.as_str());

    let settings = StorefrontSettings {
        weekly_allowance: config.weekly_allowance,
    };

    let mut storefront = Storefront::open_with(store, now, settings);

    let runner = Runner {
        catalog: &catalog,
        currency: config.currency,
        now,
    };

    runner
        .execute(&config.command, &mut storefront, &service, out)
        .await
}

/// Catalog, currency and clock shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct Runner<'c> {
    /// Product catalog
    pub catalog: &'c Catalog,

    /// Display currency
    pub currency: &'static Currency,

    /// Current instant
    pub now: Timestamp,
}

impl Runner<'_> {
    /// Execute `command` and write its output followed by any notices.
    ///
    /// # Errors
    ///
    /// Returns a [`CliError`] if the command fails for a reason other than
    /// invalid input, which is reported inline instead.
    pub async fn execute<S, R>(
        &self,
        command: &Command,
        storefront: &mut Storefront<S>,
        service: &R,
        out: &mut impl io::Write,
    ) -> Result<(), CliError>
    where
        S: KeyValueStore,
        R: RecommendationService + ?Sized,
    {
        let result = match command {
            Command::Cart { action } => self.cart(storefront, action.as_ref(), out),
            Command::Budget { action } => self.budget(storefront, action.as_ref(), out),
            Command::Favorites { action } => self.favorites(storefront, action.as_ref(), out),
            Command::Impact { action } => impact(storefront, action.as_ref(), out),
            Command::Browse(args) => self.browse(storefront, args, out),
            Command::Suggest(args) => self.suggest(storefront, service, args, out).await,
            Command::Categories => categories(service, out).await,
            Command::Dashboard => {
                Dashboard::new(storefront, self.currency, self.now).write_to(&mut *out)?;

                Ok(())
            }
            Command::Tips => write_tips(&mut *out).map_err(CliError::from),
        };

        let result = match result {
            Err(CliError::Storefront(error)) if error.is_validation() => {
                writeln!(out, "{error}")?;

                Ok(())
            }
            other => other,
        };

        for notice in storefront.take_notices() {
            write_notice(out, &notice)?;
        }

        result
    }

    fn cart<S: KeyValueStore>(
        &self,
        storefront: &mut Storefront<S>,
        action: Option<&CartAction>,
        out: &mut impl io::Write,
    ) -> Result<(), CliError> {
        match action {
            None | Some(CartAction::Show) => {}
            Some(CartAction::Add { id }) => {
                let product = self.find_product(storefront, id)?;

                storefront.add_to_cart(product)?;
            }
            Some(CartAction::Remove { id }) => {
                if storefront.remove_from_cart(&ProductId::new(id.as_str()))?.is_none() {
                    writeln!(out, "{id} is not in the cart.")?;
                }
            }
            Some(CartAction::Inc { id }) => step_quantity(storefront, id, 1, out)?,
            Some(CartAction::Dec { id }) => step_quantity(storefront, id, -1, out)?,
            Some(CartAction::Clear) => {
                storefront.clear_cart()?;
            }
        }

        write_cart(&mut *out, storefront.cart(), self.currency)?;

        writeln!(
            out,
            "Remaining: {}",
            format_money(storefront.remaining(), self.currency)
        )?;

        Ok(())
    }

    fn budget<S: KeyValueStore>(
        &self,
        storefront: &mut Storefront<S>,
        action: Option<&BudgetAction>,
        out: &mut impl io::Write,
    ) -> Result<(), CliError> {
        if let Some(BudgetAction::TopUp { amount }) = action {
            let total = storefront.increase_budget(amount)?;

            writeln!(
                out,
                "Budget increased to {}.",
                format_money(total, self.currency)
            )?;
        }

        Dashboard::new(storefront, self.currency, self.now).write_to(&mut *out)?;

        Ok(())
    }

    fn favorites<S: KeyValueStore>(
        &self,
        storefront: &mut Storefront<S>,
        action: Option<&FavoritesAction>,
        out: &mut impl io::Write,
    ) -> Result<(), CliError> {
        if let Some(FavoritesAction::Toggle { id }) = action {
            let product = self.find_product(storefront, id)?;

            if storefront.toggle_favorite(&product)? {
                writeln!(out, "Saved {}.", product.name())?;
            } else {
                writeln!(out, "Removed {} from saved items.", product.name())?;
            }
        }

        if storefront.favorites().is_empty() {
            writeln!(out, "No saved items yet.")?;

            return Ok(());
        }

        write_products(&mut *out, storefront.favorites().iter(), self.currency, |_| true)?;

        Ok(())
    }

    fn browse<S: KeyValueStore>(
        &self,
        storefront: &mut Storefront<S>,
        args: &BrowseArgs,
        out: &mut impl io::Write,
    ) -> Result<(), CliError> {
        let mut session = RecommendationSession::default();

        session.type_search(args.search.as_str(), self.now);
        session.flush_search();
        session.set_category(args.category.clone());
        session.set_max_price(args.max_price);

        let Some(id) = &args.select else {
            write_products(
                &mut *out,
                session.visible(self.catalog),
                self.currency,
                |product| storefront.is_favorite(product.id()),
            )?;

            return Ok(());
        };

        let suggestion = session.select(self.catalog, &ProductId::new(id.as_str()))?;

        write_alternatives(&mut *out, suggestion, self.currency)?;

        if let Some(index) = args.accept {
            let product = storefront.accept_suggestion(&mut session, index)?;

            info!(product = %product.id(), "suggestion accepted");

            writeln!(out, "Added {} to cart.", product.name())?;
        }

        Ok(())
    }

    async fn suggest<S, R>(
        &self,
        storefront: &mut Storefront<S>,
        service: &R,
        args: &SuggestArgs,
        out: &mut impl io::Write,
    ) -> Result<(), CliError>
    where
        S: KeyValueStore,
        R: RecommendationService + ?Sized,
    {
        let mut entry = ProductEntry::default();

        entry.set_product_name(args.product.as_str());
        entry.set_category(args.category.as_str());

        let ticket = match entry.begin() {
            Ok(ticket) => ticket,
            Err(error) => {
                writeln!(out, "{error}")?;

                return Ok(());
            }
        };

        let reply = ticket.resolve(service).await;

        if let Completion::Applied(notice) = entry.complete(reply) {
            write_notice(out, &notice)?;
        }

        if let Some(EntrySuggestion::Alternative { alternative, .. }) = entry.suggestion() {
            writeln!(out, "Alternative: {}", alternative.name)?;
            writeln!(out, "Eco Score: {}", alternative.eco_score.normalize())?;
            writeln!(
                out,
                "Price: {}",
                format_money(alternative.price, self.currency)
            )?;

            if args.add {
                let product = storefront.add_entry_alternative(&entry)?;

                writeln!(out, "Added {} to cart.", product.name())?;
            }
        }

        Ok(())
    }

    fn find_product<S: KeyValueStore>(
        &self,
        storefront: &Storefront<S>,
        id: &str,
    ) -> Result<Product, CliError> {
        let id = ProductId::new(id);

        self.catalog
            .product(&id)
            .or_else(|| storefront.cart().line(&id).map(CartLine::product))
            .or_else(|| storefront.favorites().iter().find(|product| product.id() == &id))
            .cloned()
            .ok_or(CliError::UnknownProduct(id))
    }
}

fn step_quantity<S: KeyValueStore>(
    storefront: &mut Storefront<S>,
    id: &str,
    delta: i64,
    out: &mut impl io::Write,
) -> Result<(), CliError> {
    if storefront
        .update_quantity(&ProductId::new(id), delta)?
        .is_none()
    {
        writeln!(out, "{id} is not in the cart.")?;
    }

    Ok(())
}

fn impact<S: KeyValueStore>(
    storefront: &mut Storefront<S>,
    action: Option<&ImpactAction>,
    out: &mut impl io::Write,
) -> Result<(), CliError> {
    if let Some(ImpactAction::Reset) = action {
        storefront.reset_impact()?;

        writeln!(out, "Impact totals reset.")?;
    }

    write_impact(&mut *out, storefront.impact())?;

    Ok(())
}

async fn categories<R>(service: &R, out: &mut impl io::Write) -> Result<(), CliError>
where
    R: RecommendationService + ?Sized,
{
    let mut entry = ProductEntry::default();

    entry.load_categories(service.categories().await);

    if let Some(error) = entry.error() {
        writeln!(out, "{error}")?;

        return Ok(());
    }

    for category in entry.categories() {
        writeln!(out, "{category}")?;
    }

    Ok(())
}

fn write_notice(out: &mut impl io::Write, notice: &Notice) -> Result<(), CliError> {
    let marker = match notice.kind {
        NoticeKind::Success => "✔",
        NoticeKind::Info => "ℹ",
        NoticeKind::Warning => "⚠",
        NoticeKind::Error => "✘",
    };

    writeln!(out, "{marker} {notice}")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;
    use rusty_money::iso;
    use testresult::TestResult;

    use super::*;
    use crate::{
        persistence::MemoryStore,
        recommendations::lookup::{
            GreenerAlternative, MockRecommendationService, RecommendationError,
            RecommendationOutcome,
        },
    };

    fn now() -> Result<Timestamp, jiff::Error> {
        "2026-10-19T12:00:00Z".parse()
    }

    async fn execute(
        catalog: &Catalog,
        storefront: &mut Storefront<MemoryStore>,
        service: &MockRecommendationService,
        command: Command,
    ) -> Result<String, Box<dyn std::error::Error>> {
        let runner = Runner {
            catalog,
            currency: iso::INR,
            now: now()?,
        };

        let mut out = Vec::new();

        runner.execute(&command, storefront, service, &mut out).await?;

        Ok(String::from_utf8(out)?)
    }

    #[tokio::test]
    async fn cart_add_shows_line_and_remaining() -> TestResult {
        let catalog = Catalog::builtin()?;
        let service = MockRecommendationService::new();
        let mut storefront = Storefront::open(MemoryStore::default(), now()?);

        let output = execute(
            &catalog,
            &mut storefront,
            &service,
            Command::Cart {
                action: Some(CartAction::Add {
                    id: "reusable-bottle".to_string(),
                }),
            },
        )
        .await?;

        assert!(output.contains("Reusable Bottle"));
        assert!(output.contains(&format!("Remaining: {}", format_money(dec!(90), iso::INR))));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_product_is_an_error() -> TestResult {
        let catalog = Catalog::builtin()?;
        let service = MockRecommendationService::new();
        let mut storefront = Storefront::open(MemoryStore::default(), now()?);

        let result = execute(
            &catalog,
            &mut storefront,
            &service,
            Command::Cart {
                action: Some(CartAction::Add {
                    id: "rocket".to_string(),
                }),
            },
        )
        .await;

        assert!(result.is_err(), "expected error, got {result:?}");

        Ok(())
    }

    #[tokio::test]
    async fn invalid_top_up_is_reported_inline() -> TestResult {
        let catalog = Catalog::builtin()?;
        let service = MockRecommendationService::new();
        let mut storefront = Storefront::open(MemoryStore::default(), now()?);

        let output = execute(
            &catalog,
            &mut storefront,
            &service,
            Command::Budget {
                action: Some(BudgetAction::TopUp {
                    amount: "abc".to_string(),
                }),
            },
        )
        .await?;

        assert!(output.contains("Please enter a valid positive number."));
        assert_eq!(storefront.budget().amount(), dec!(100));

        Ok(())
    }

    #[tokio::test]
    async fn overspend_warning_is_printed() -> TestResult {
        let catalog = Catalog::builtin()?;
        let service = MockRecommendationService::new();
        let mut storefront = Storefront::open(MemoryStore::default(), now()?);

        for _ in 0..7 {
            storefront.add_to_cart(
                catalog
                    .product(&ProductId::new("glass-bottle"))
                    .cloned()
                    .ok_or("missing glass bottle")?,
            )?;
        }

        storefront.take_notices();

        let output = execute(
            &catalog,
            &mut storefront,
            &service,
            Command::Cart {
                action: Some(CartAction::Inc {
                    id: "glass-bottle".to_string(),
                }),
            },
        )
        .await?;

        assert!(output.contains(crate::storefront::OVERSPEND_WARNING));

        Ok(())
    }

    #[tokio::test]
    async fn browse_accept_adds_alternative() -> TestResult {
        let catalog = Catalog::builtin()?;
        let service = MockRecommendationService::new();
        let mut storefront = Storefront::open(MemoryStore::default(), now()?);

        let output = execute(
            &catalog,
            &mut storefront,
            &service,
            Command::Browse(BrowseArgs {
                search: String::new(),
                category: None,
                max_price: None,
                select: Some("plastic-carry-bag".to_string()),
                accept: Some(1),
            }),
        )
        .await?;

        assert!(output.contains("Biodegradable fibre"));
        assert!(output.contains("Added Organic Cotton Tote to cart."));
        assert_eq!(storefront.cart().item_count(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn suggest_add_puts_alternative_in_cart() -> TestResult {
        let catalog = Catalog::builtin()?;
        let mut service = MockRecommendationService::new();
        let mut storefront = Storefront::open(MemoryStore::default(), now()?);

        service.expect_recommend().times(1).returning(|request| {
            assert_eq!(request.category, "Kitchen");

            Ok(RecommendationOutcome::Alternative(GreenerAlternative {
                name: "Steel Bottle".to_string(),
                eco_score: dec!(8),
                price: dec!(12),
            }))
        });

        let output = execute(
            &catalog,
            &mut storefront,
            &service,
            Command::Suggest(SuggestArgs {
                product: "Plastic Water Bottle".to_string(),
                category: "Kitchen".to_string(),
                add: true,
            }),
        )
        .await?;

        assert!(output.contains("Greener alternative found!"));
        assert!(output.contains("Added Steel Bottle to cart."));
        assert_eq!(storefront.impact().eco_score, dec!(8));

        Ok(())
    }

    #[tokio::test]
    async fn suggest_without_category_never_calls_service() -> TestResult {
        let catalog = Catalog::builtin()?;
        let mut service = MockRecommendationService::new();
        let mut storefront = Storefront::open(MemoryStore::default(), now()?);

        service.expect_recommend().never();

        let output = execute(
            &catalog,
            &mut storefront,
            &service,
            Command::Suggest(SuggestArgs {
                product: "Plastic Water Bottle".to_string(),
                category: String::new(),
                add: false,
            }),
        )
        .await?;

        assert!(output.contains("Please provide both product name and category."));

        Ok(())
    }

    #[tokio::test]
    async fn category_failure_is_reported() -> TestResult {
        let catalog = Catalog::builtin()?;
        let mut service = MockRecommendationService::new();
        let mut storefront = Storefront::open(MemoryStore::default(), now()?);

        service
            .expect_categories()
            .times(1)
            .returning(|| Err(RecommendationError::UnexpectedResponse("down".to_string())));

        let output = execute(&catalog, &mut storefront, &service, Command::Categories).await?;

        assert_eq!(output, "Failed to load categories.\n");

        Ok(())
    }

    #[tokio::test]
    async fn impact_reset_zeroes_totals() -> TestResult {
        let catalog = Catalog::builtin()?;
        let service = MockRecommendationService::new();
        let mut storefront = Storefront::open(MemoryStore::default(), now()?);

        storefront.add_to_cart(
            catalog
                .product(&ProductId::new("jute-bag"))
                .cloned()
                .ok_or("missing jute bag")?,
        )?;

        let output = execute(
            &catalog,
            &mut storefront,
            &service,
            Command::Impact {
                action: Some(ImpactAction::Reset),
            },
        )
        .await?;

        assert!(output.contains("Impact totals reset."));
        assert!(storefront.impact().is_zero());
        assert!(!storefront.store().contains("impactTotals"));

        Ok(())
    }

    #[tokio::test]
    async fn favorites_toggle_lists_saved_items() -> TestResult {
        let catalog = Catalog::builtin()?;
        let service = MockRecommendationService::new();
        let mut storefront = Storefront::open(MemoryStore::default(), now()?);

        let output = execute(
            &catalog,
            &mut storefront,
            &service,
            Command::Favorites {
                action: Some(FavoritesAction::Toggle {
                    id: "shampoo-bar".to_string(),
                }),
            },
        )
        .await?;

        assert!(output.contains("Saved Shampoo Bar."));
        assert!(storefront.is_favorite(&ProductId::new("shampoo-bar")));

        Ok(())
    }
}
