//! # Tradescope Core Types
//!
//! The shared vocabulary of the workspace: the immutable `TradeRecord` produced by a
//! backtest run, the ordered `McapCategory` tiers, and the single policy that maps a
//! capitalization rank onto a tier.
//!
//! This crate has no knowledge of storage, caching or transport. Every other crate
//! depends on it; it depends on nothing in the workspace.

pub mod enums;
pub mod error;
pub mod structs;
pub mod tiers;

// Re-export the core types to provide a clean public API.
pub use enums::McapCategory;
pub use error::CoreError;
pub use structs::TradeRecord;
pub use tiers::{categorize_snapshot, parse_capitalization, RankBands};
