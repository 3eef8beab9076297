//! # Tradescope Database Crate
//!
//! The PostgreSQL home of the backtest trade records, and the production
//! implementation of the analytics engine's `TradeStore`.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** all SQL lives here. The analytics crate only ever sees
//!   `RecordFilter`s going in and `TradeRecord`s coming out.
//! - **Server-side filtering:** each filter predicate becomes a bound `WHERE` clause,
//!   and date bounds are computed with `MIN`/`MAX` in the database.
//! - **Asynchronous & Pooled:** all operations go through a shared `PgPool`.
//!
//! ## Public API
//!
//! - `connect` / `run_migrations`: pool setup and schema management.
//! - `DbRepository`: reads for the engine, `replace_all` for ingestion.
//! - `DbError`: the errors this crate can return.

pub mod connection;
pub mod error;
pub mod repository;

pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use repository::{DbRepository, DbTradeRecord};
