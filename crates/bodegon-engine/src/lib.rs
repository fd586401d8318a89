//! # bodegon-engine: Order Engine & Stock Ledger for Bodegon POS
//!
//! This crate owns all state mutation for the POS: the in-flight order
//! collection, the stock ledger and the calls out to the injected
//! collaborators.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Bodegon POS Data Flow                              │
//! │                                                                         │
//! │  Host / UI action (add item, fill slot, close ticket)                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  bodegon-engine (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  OrderEngine  │    │  StockLedger  │    │CatalogSnapshot│  │   │
//! │  │   │  (engine.rs)  │───►│  (ledger.rs)  │───►│ (catalog.rs) │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ one Mutex,    │    │ canonical     │    │ packs, prices│  │   │
//! │  │   │ every mutation│    │ units, zero   │    │ subtypes,    │  │   │
//! │  │   │ serialized    │    │ clamp, mirror │    │ product ids  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                          │                                     │
//! │       ▼                          ▼                                     │
//! │  OrderStore (KV mirror)     CatalogBackend (inventory upserts)         │
//! │  NotificationSink (fire-and-forget user feedback)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`engine`] - The order lifecycle state machine
//! - [`ledger`] - Stock arithmetic in canonical units, restock batches
//! - [`catalog`] - One-pass snapshot load of the catalog backend
//! - [`traits`] - The three collaborator contracts
//! - [`memory`] - In-memory collaborators (fixtures and starting point)
//! - [`config`] - Engine-wide configuration
//! - [`error`] - Engine error type
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bodegon_engine::{EngineConfig, OrderEngine};
//! use bodegon_engine::memory::{MemoryCatalog, MemoryStore, NullNotifier};
//!
//! let engine = OrderEngine::new(backend, store, notifier, EngineConfig::default());
//! engine.load_catalog().await;
//! engine.load_persisted().await;
//!
//! let order = engine
//!     .create_order("Maria", Vec::new(), OrderType::Local, None, "")
//!     .await?;
//! engine.update_order_item_slot(&order.id, 0, 0, Some("Polar Pilsen")).await?;
//! engine.close_order(&order.id, "Efectivo", "").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod traits;

// =============================================================================
// Re-exports
// =============================================================================

pub use catalog::CatalogSnapshot;
pub use config::EngineConfig;
pub use engine::OrderEngine;
pub use error::{EngineError, EngineResult};
pub use ledger::{InventoryReport, StockLedger, StockMovement};
pub use traits::{BackendError, CatalogBackend, NoticeLevel, NotificationSink, OrderStore};
