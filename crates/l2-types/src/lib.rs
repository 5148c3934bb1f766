//! Shared types for the L2 orderbook engine
//!
//! This crate provides the value and message types exchanged between the
//! market-data client, the orderbook engine and its readers.
//! It has minimal dependencies and can be used independently.
//!
//! # Key Types
//!
//! - [`PriceLevel`] - Aggregated price level with decimal precision
//! - [`Side`], [`SortOrder`] - Book side and traversal direction
//! - [`LevelEntry`], [`BookSnapshot`], [`BookDelta`], [`FeedMessage`] - Typed feed records
//! - [`BookError`] - Ingestion error taxonomy

pub mod enums;
pub mod error;
pub mod level;
pub mod messages;

// Re-export commonly used types
pub use enums::*;
pub use error::*;
pub use level::*;
pub use messages::{BookDelta, BookSnapshot, FeedMessage, LevelEntry};

// Re-export rust_decimal for users
pub use rust_decimal::Decimal;
