//! # bodegon-core: Pure Business Logic for Bodegon POS
//!
//! This crate is the **heart** of Bodegon POS. It contains all business
//! logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Bodegon POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      Host / UI Layer                            │   │
//! │  │    Ticket UI ──► Slot Grid ──► Cash UI ──► Notifications        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bodegon-engine                               │   │
//! │  │    Order engine, stock ledger, collaborator traits              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bodegon-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐   │   │
//! │  │   │   types   │  │   money   │  │ optimizer │  │conversion │   │   │
//! │  │   │   Order   │  │   Money   │  │  greedy   │  │ units_per │   │   │
//! │  │   │ OrderItem │  │ Bolivars  │  │ repacking │  │  chain    │   │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Order, OrderItem, catalog rows, keys)
//! - [`money`] - Dual-currency integer money (USD cents / Bs céntimos)
//! - [`conversion`] - Pack-to-canonical-unit resolution
//! - [`pricing`] - Tiered price book
//! - [`optimizer`] - Greedy pack repacking for on-premise consumption
//! - [`validation`] - Boundary input validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic over its inputs
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: USD cents and Bs céntimos (i64), never floats
//! 4. **Canonical Units**: All stock math converts packs to single units first

// =============================================================================
// Module Declarations
// =============================================================================

pub mod conversion;
pub mod error;
pub mod money;
pub mod optimizer;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use bodegon_core::Money` instead of
// `use bodegon_core::money::Money`

pub use conversion::PackCatalog;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Bolivars, ExchangeRate, Money};
pub use optimizer::{calculate_order_total, OrderTotals};
pub use pricing::PriceBook;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum pack quantity of a single order item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum customer name length accepted at the engine boundary.
pub const MAX_CUSTOMER_NAME_LEN: usize = 120;

/// Maximum product name length accepted at the engine boundary.
pub const MAX_PRODUCT_NAME_LEN: usize = 200;
