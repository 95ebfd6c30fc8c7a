//! Dashboard
//!
//! Read-only views of the storefront rendered as tables: budget and spending,
//! cart lines, impact totals, product listings and the sustainability tips.

use std::io;

use humanize_duration::{Truncate, prelude::DurationExt};
use jiff::{SignedDuration, Timestamp};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    cart::CartLedger,
    impact::ImpactTotals,
    persistence::KeyValueStore,
    products::Product,
    recommendations::session::RecommendationSuggestion,
    storefront::Storefront,
};

/// A sustainability tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tip {
    /// Headline
    pub title: &'static str,

    /// Advice
    pub description: &'static str,
}

/// Tips shown on the tips screen.
pub const TIPS: [Tip; 8] = [
    Tip {
        title: "Use Reusable Shopping Bags",
        description: "Avoid plastic bags by carrying your own cloth or jute bags.",
    },
    Tip {
        title: "Choose Biodegradable Packaging",
        description: "Opt for products with eco-friendly packaging that breaks down naturally.",
    },
    Tip {
        title: "Buy Local and Seasonal Products",
        description: "Reduce carbon footprint by supporting local farmers and seasonal goods.",
    },
    Tip {
        title: "Reduce Food Waste",
        description: "Plan meals ahead and use leftovers creatively.",
    },
    Tip {
        title: "Conserve Water",
        description: "Fix leaky taps and use water-saving appliances.",
    },
    Tip {
        title: "Recycle and Compost",
        description: "Separate recyclables and compost organic waste to reduce landfill pollution.",
    },
    Tip {
        title: "Switch to LED Lighting",
        description: "Energy-efficient LED bulbs last longer and reduce electricity consumption.",
    },
    Tip {
        title: "Unplug Electronics",
        description: "Avoid 'vampire' energy drain by unplugging chargers and devices when not in use.",
    },
];

/// Errors that can occur when rendering.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Output could not be written.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Snapshot of budget, spending and impact at one instant.
#[derive(Debug, Clone)]
pub struct Dashboard<'s> {
    currency: &'static Currency,
    budget: Decimal,
    spent: Decimal,
    remaining: Decimal,
    overspent: bool,
    next_reset: Option<Timestamp>,
    resets_in: Option<SignedDuration>,
    cart: &'s CartLedger,
    impact: ImpactTotals,
}

impl<'s> Dashboard<'s> {
    /// Capture the dashboard for `storefront` at `now`.
    pub fn new<S: KeyValueStore>(
        storefront: &'s Storefront<S>,
        currency: &'static Currency,
        now: Timestamp,
    ) -> Self {
        let next_reset = storefront.next_reset();

        Self {
            currency,
            budget: storefront.budget().amount(),
            spent: storefront.spent(),
            remaining: storefront.remaining(),
            overspent: storefront.is_overspent(),
            next_reset,
            resets_in: next_reset.map(|next| next.duration_since(now)),
            cart: storefront.cart(),
            impact: *storefront.impact(),
        }
    }

    /// Budget amount
    pub fn budget(&self) -> Decimal {
        self.budget
    }

    /// Cart total
    pub fn spent(&self) -> Decimal {
        self.spent
    }

    /// Budget minus cart total
    pub fn remaining(&self) -> Decimal {
        self.remaining
    }

    /// Next reset instant
    pub fn next_reset(&self) -> Option<Timestamp> {
        self.next_reset
    }

    /// Render the full dashboard.
    ///
    /// # Errors
    ///
    /// Returns a [`DashboardError`] if the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), DashboardError> {
        self.write_budget(&mut out)?;

        write_cart(&mut out, self.cart, self.currency)?;
        write_impact(&mut out, &self.impact)?;

        Ok(())
    }

    fn write_budget(&self, out: &mut impl io::Write) -> Result<(), DashboardError> {
        let mut builder = Builder::default();

        builder.push_record(["Weekly Budget", "Spent", "Remaining", "Next Reset"]);
        builder.push_record([
            format_money(self.budget, self.currency),
            format_money(self.spent, self.currency),
            format_money(self.remaining, self.currency),
            self.reset_text(),
        ]);

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(0..3), Alignment::right());

        if self.remaining.is_sign_negative() {
            table.modify((1, 2), Color::FG_RED);
        }

        writeln!(out, "{table}")?;

        if self.overspent {
            writeln!(
                out,
                "Add more budget if you really need to buy something essential."
            )?;
        }

        Ok(())
    }

    fn reset_text(&self) -> String {
        let Some(next) = self.next_reset else {
            return "-".to_string();
        };

        let date = next.strftime("%Y-%m-%d");

        match self.resets_in.map(format_countdown) {
            Some(countdown) => format!("{date} ({countdown})"),
            None => date.to_string(),
        }
    }
}

/// Render cart lines with line totals and the cart total.
///
/// # Errors
///
/// Returns a [`DashboardError`] if the output cannot be written.
pub fn write_cart(
    mut out: impl io::Write,
    cart: &CartLedger,
    currency: &'static Currency,
) -> Result<(), DashboardError> {
    if cart.is_empty() {
        writeln!(out, "Your cart is empty.")?;

        return Ok(());
    }

    let mut builder = Builder::default();

    builder.push_record(["Item", "Category", "Price", "Qty", "Line Total"]);

    for line in cart.iter() {
        let product = line.product();

        builder.push_record([
            product.name().to_string(),
            product.category().to_string(),
            format_money(product.price(), currency),
            line.quantity().to_string(),
            format_money(line.line_total(), currency),
        ]);
    }

    builder.push_record([
        "Total".to_string(),
        String::new(),
        String::new(),
        cart.item_count().to_string(),
        format_money(cart.total(), currency),
    ]);

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Rows::last(), Color::BOLD);
    table.modify(Columns::new(2..5), Alignment::right());

    writeln!(out, "{table}")?;

    Ok(())
}

/// Render the impact totals.
///
/// # Errors
///
/// Returns a [`DashboardError`] if the output cannot be written.
pub fn write_impact(mut out: impl io::Write, impact: &ImpactTotals) -> Result<(), DashboardError> {
    let mut builder = Builder::default();

    builder.push_record(["Plastic Saved (kg)", "Water Saved (L)", "CO₂ Reduced (kg)", "Eco Score"]);
    builder.push_record([
        impact.plastic_kg.normalize().to_string(),
        impact.water_l.normalize().to_string(),
        impact.co2_kg.normalize().to_string(),
        impact.eco_score.normalize().to_string(),
    ]);

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(0..4), Alignment::right());

    writeln!(out, "{table}")?;

    Ok(())
}

/// Render a product listing, marking favorites with a star.
///
/// # Errors
///
/// Returns a [`DashboardError`] if the output cannot be written.
pub fn write_products<'p>(
    mut out: impl io::Write,
    products: impl IntoIterator<Item = &'p Product>,
    currency: &'static Currency,
    is_favorite: impl Fn(&Product) -> bool,
) -> Result<(), DashboardError> {
    let mut products = products.into_iter().peekable();

    if products.peek().is_none() {
        writeln!(out, "No products found.")?;

        return Ok(());
    }

    let mut builder = Builder::default();

    builder.push_record(["", "Id", "Name", "Category", "Price", "Eco"]);

    for product in products {
        builder.push_record([
            if is_favorite(product) { "★" } else { "" }.to_string(),
            product.id().to_string(),
            product.name().to_string(),
            product.category().to_string(),
            format_money(product.price(), currency),
            if product.is_sustainable() { "yes" } else { "no" }.to_string(),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(4..5), Alignment::right());

    writeln!(out, "{table}")?;

    Ok(())
}

/// Render the alternatives shown for a selected product.
///
/// # Errors
///
/// Returns a [`DashboardError`] if the output cannot be written.
pub fn write_alternatives(
    mut out: impl io::Write,
    suggestion: &RecommendationSuggestion,
    currency: &'static Currency,
) -> Result<(), DashboardError> {
    let source = suggestion.source();

    writeln!(
        out,
        "Greener alternatives for {} ({}):",
        source.name(),
        format_money(source.price(), currency)
    )?;

    if suggestion.alternatives().is_empty() {
        writeln!(out, "No greener alternatives within budget.")?;

        return Ok(());
    }

    let mut builder = Builder::default();

    builder.push_record(["#", "Alternative", "Price", "Why"]);

    for (index, alternative) in suggestion.alternatives().iter().enumerate() {
        builder.push_record([
            index.to_string(),
            alternative.product.name().to_string(),
            format_money(alternative.product.price(), currency),
            alternative.reason.clone(),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(2..3), Alignment::right());

    writeln!(out, "{table}")?;

    Ok(())
}

/// Render the sustainability tips.
///
/// # Errors
///
/// Returns a [`DashboardError`] if the output cannot be written.
pub fn write_tips(mut out: impl io::Write) -> Result<(), DashboardError> {
    writeln!(out, "Sustainability Tips")?;

    for tip in TIPS {
        writeln!(out, "\n  {}\n    {}", tip.title, tip.description)?;
    }

    Ok(())
}

/// Format `amount` in `currency`, rounded half away from zero to its minor unit.
pub fn format_money(amount: Decimal, currency: &'static Currency) -> String {
    let minor = 10_i64
        .checked_pow(currency.exponent)
        .map(Decimal::from)
        .and_then(|scale| amount.checked_mul(scale))
        .and_then(|scaled| {
            scaled
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
        });

    match minor {
        Some(minor) => Money::from_minor(minor, currency).to_string(),
        None => format!("{amount} {}", currency.iso_alpha_code),
    }
}

/// Format the time left until a reset, or "due" if it has passed.
pub fn format_countdown(left: SignedDuration) -> String {
    if left.is_negative() || left.is_zero() {
        return "due".to_string();
    }

    match std::time::Duration::try_from(left) {
        Ok(left) if left.as_secs() < 60 => "in < 1m".to_string(),
        Ok(left) => format!("in {}", left.human(Truncate::Minute)),
        Err(_err) => "due".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use rust_decimal::dec;
    use rusty_money::iso;
    use testresult::TestResult;

    use super::*;
    use crate::persistence::MemoryStore;

    fn now() -> Result<Timestamp, jiff::Error> {
        "2026-10-19T12:00:00Z".parse()
    }

    fn bottle() -> Result<Product, crate::products::ProductError> {
        Product::new("reusable-bottle", "Reusable Bottle", "Kitchen", dec!(10))
    }

    #[test]
    fn money_uses_currency_minor_units() {
        assert_eq!(
            format_money(dec!(12.5), iso::GBP),
            Money::from_minor(1250, iso::GBP).to_string()
        );
        assert_eq!(
            format_money(dec!(0.005), iso::USD),
            Money::from_minor(1, iso::USD).to_string()
        );
        assert_eq!(
            format_money(dec!(-15), iso::INR),
            Money::from_minor(-1500, iso::INR).to_string()
        );
    }

    #[test]
    fn half_minor_units_round_away_from_zero() {
        assert_eq!(
            format_money(dec!(2.345), iso::INR),
            Money::from_minor(235, iso::INR).to_string()
        );
        assert_eq!(
            format_money(dec!(0.015), iso::USD),
            Money::from_minor(2, iso::USD).to_string()
        );
        assert_eq!(
            format_money(dec!(-0.005), iso::USD),
            Money::from_minor(-1, iso::USD).to_string()
        );
    }

    #[test]
    fn countdown_reports_due_and_remaining() {
        assert_eq!(format_countdown(SignedDuration::from_secs(-5)), "due");
        assert_eq!(format_countdown(SignedDuration::ZERO), "due");
        assert_eq!(format_countdown(SignedDuration::from_secs(30)), "in < 1m");
        assert!(format_countdown(SignedDuration::from_hours(50)).starts_with("in "));
    }

    #[test]
    fn dashboard_reflects_storefront() -> TestResult {
        let now = now()?;
        let mut storefront = Storefront::open(MemoryStore::default(), now);

        storefront.add_to_cart(bottle()?)?;

        let dashboard = Dashboard::new(&storefront, iso::INR, now);

        assert_eq!(dashboard.budget(), dec!(100));
        assert_eq!(dashboard.spent(), dec!(10));
        assert_eq!(dashboard.remaining(), dec!(90));
        assert_eq!(
            dashboard.next_reset(),
            Some(now.checked_add(SignedDuration::from_hours(7 * 24))?)
        );

        let mut out = Vec::new();
        dashboard.write_to(&mut out)?;

        let output = String::from_utf8(out)?;

        assert!(output.contains("Weekly Budget"));
        assert!(output.contains("Reusable Bottle"));
        assert!(output.contains(&format_money(dec!(90), iso::INR)));
        assert!(output.contains("2026-10-26"));
        assert!(output.contains("Eco Score"));

        Ok(())
    }

    #[test]
    fn empty_cart_is_reported() -> TestResult {
        let mut out = Vec::new();

        write_cart(&mut out, &CartLedger::new(), iso::INR)?;

        assert_eq!(String::from_utf8(out)?, "Your cart is empty.\n");

        Ok(())
    }

    #[test]
    fn product_listing_marks_favorites() -> TestResult {
        let product = bottle()?;
        let mut out = Vec::new();

        write_products(&mut out, [&product], iso::GBP, |_| true)?;

        let output = String::from_utf8(out)?;

        assert!(output.contains('★'));
        assert!(output.contains("reusable-bottle"));

        Ok(())
    }

    #[test]
    fn empty_listing_is_reported() -> TestResult {
        let mut out = Vec::new();

        write_products(&mut out, [], iso::GBP, |_| false)?;

        assert_eq!(String::from_utf8(out)?, "No products found.\n");

        Ok(())
    }

    #[test]
    fn tips_are_listed() -> TestResult {
        let mut out = Vec::new();

        write_tips(&mut out)?;

        let output = String::from_utf8(out)?;

        for tip in TIPS {
            assert!(output.contains(tip.title), "missing tip {}", tip.title);
        }

        Ok(())
    }
}
