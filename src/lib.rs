//! Greencart
//!
//! A shopping cart that steers shoppers towards greener products. It keeps a
//! cart ledger, a rolling weekly budget, running environmental impact totals
//! and a favorites list, all persisted to a key-value store after every
//! change, and suggests greener alternatives from a bundled catalog or an
//! external recommender.

pub mod auth;
pub mod budget;
pub mod cart;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod favorites;
pub mod impact;
pub mod navigation;
pub mod notifications;
pub mod observability;
pub mod persistence;
pub mod prelude;
pub mod products;
pub mod recommendations;
pub mod schedule;
pub mod storefront;
