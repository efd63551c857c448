//! Expense tracker - personal expense tracking core
//!
//! This library keeps a live local copy of a user's expenses, categories and
//! monthly budget, synchronised from a document store, and derives monthly
//! totals, per-category summaries, filtered views and exports from it.
//! Renaming a category rewrites the name copied onto its expenses, and a
//! category cannot be deleted while expenses still reference it.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (expenses, categories, budget, money)
//! - `store`: Document store boundary, record codec and store implementations
//! - `services`: Ledger, category registry, budget tracker and consistency rules
//! - `reports`: Filtering and category summaries
//! - `export`: CSV and JSON export
//! - `display`: Terminal formatting
//! - `cli`: Command handlers for the `expense` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use expense_tracker::models::UserId;
//! use expense_tracker::services::Session;
//! use expense_tracker::store::MemoryStore;
//!
//! let session = Session::new(Arc::new(MemoryStore::new()));
//! session.sign_in(UserId::parse("alice")?).await?;
//! session.wait_until_synced().await?;
//! println!("{}", session.ledger().monthly_total());
//! ```

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod models;
pub mod reports;
pub mod services;
pub mod store;

pub use error::{ExpenseError, ExpenseResult};
