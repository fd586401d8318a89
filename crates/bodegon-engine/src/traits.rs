//! # Collaborator Contracts
//!
//! The three seams the engine is injected with. The engine never
//! reaches past these traits: catalog/price CRUD, durable storage and
//! user feedback all live on the host's side of the boundary.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Collaborators                                     │
//! │                                                                         │
//! │   OrderEngine ──► CatalogBackend    products, packs, prices, stock      │
//! │              ──► OrderStore         durable KV mirror of the orders     │
//! │              ──► NotificationSink   fire-and-forget user feedback       │
//! │                                                                         │
//! │   Backend/store failures are logged and swallowed: the in-memory        │
//! │   state is authoritative, there is no rollback on persistence           │
//! │   failure.                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use async_trait::async_trait;
use bodegon_core::types::{EmissionDef, InventoryRow, PriceRow, ProductMeta};

/// Opaque collaborator failure. The engine only ever logs these.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// Catalog Backend
// =============================================================================

/// The inventory-store collaborator: read side feeds the one-pass
/// snapshot load, `upsert_inventory` mirrors every ledger write.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    async fn fetch_catalog(&self) -> Result<Vec<ProductMeta>, BackendError>;

    async fn fetch_emissions(&self) -> Result<Vec<EmissionDef>, BackendError>;

    /// Configured subtypes. `None` means "not configured" — the engine
    /// falls back to its defaults.
    async fn fetch_subtypes(&self) -> Result<Option<Vec<String>>, BackendError>;

    async fn fetch_inventory(&self) -> Result<Vec<InventoryRow>, BackendError>;

    async fn fetch_prices(&self) -> Result<Vec<PriceRow>, BackendError>;

    /// Persists a new absolute on-hand quantity for (product, subtype).
    async fn upsert_inventory(
        &self,
        product_id: &str,
        subtype: &str,
        quantity: i64,
    ) -> Result<(), BackendError>;
}

// =============================================================================
// Order Store
// =============================================================================

/// Durable KV mirror for the order collection.
///
/// Invoked after every mutation with the full serialized order list.
/// Last write wins; there is no merge and no rollback.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn save(&self, key: &str, value: serde_json::Value) -> Result<(), BackendError>;

    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>, BackendError>;
}

// =============================================================================
// Notification Sink
// =============================================================================

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Fire-and-forget user feedback. No core logic depends on delivery.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str, level: NoticeLevel, duration: Option<Duration>);
}
