//! # Engine Error Type
//!
//! Unified error type for order-engine operations.
//!
//! ## Failure Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Validation failure   → Err(EngineError), error notification sent,     │
//! │                         state unchanged                                 │
//! │  Not-found id         → Ok(None), silent no-op (not an error)           │
//! │  Persistence failure  → logged and swallowed, in-memory state           │
//! │                         stays authoritative (never in this enum)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bodegon_core::CoreError;
use thiserror::Error;

/// Errors surfaced by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Business rule violation from the core (insufficient stock,
    /// invalid input).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// `close_order` was called on an order that is already PAID.
    #[error("Order {0} is already closed")]
    AlreadyClosed(String),

    /// `replace_all_orders` requires the dev-tools capability flag.
    #[error("Developer tools are disabled for this engine")]
    DevToolsDisabled,
}

impl EngineError {
    /// Shorthand for the insufficient-stock validation failure.
    pub fn insufficient_stock(product: &str, available: i64, requested: i64) -> Self {
        EngineError::Core(CoreError::InsufficientStock {
            product: product.to_string(),
            available,
            requested,
        })
    }
}

/// Convenience type alias for Results with EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================
