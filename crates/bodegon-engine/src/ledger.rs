//! # Stock Ledger
//!
//! On-hand stock in canonical units, with the pending-inventory
//! scratch map for batched restocks.
//!
//! ## Mutation Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Stock Ledger                                    │
//! │                                                                         │
//! │  check_stock()   read-only: available ≥ qty × units_per(pack)           │
//! │  deduct_stock()  available = max(0, available − units)  (zero clamp)    │
//! │  add_stock()     available = available + units          (unbounded)     │
//! │  set_base_stock() absolute write (restock counts, admin corrections)    │
//! │                                                                         │
//! │  Every write mirrors the NEW ABSOLUTE quantity to the catalog           │
//! │  backend. Mirror failures are logged and swallowed: the in-memory       │
//! │  count is authoritative.                                                │
//! │                                                                         │
//! │  All order-engine stock mutation funnels through these operations;      │
//! │  nothing else writes the inventory map.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Zero Clamp
//! Deduction clamps at zero instead of failing. Callers that need
//! exactness pre-check with [`StockLedger::check_stock`]; the clamp
//! covers drift between the counted shelf and the ledger.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;

use bodegon_core::types::StockKey;

use crate::catalog::CatalogSnapshot;
use crate::traits::CatalogBackend;

// =============================================================================
// Inventory History
// =============================================================================

/// One movement inside a committed restock batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub product: String,
    pub subtype: String,
    /// Signed canonical units (negative for shrinkage corrections).
    pub quantity: i64,
}

/// A committed restock batch, newest first in the history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    pub id: String,
    #[serde(rename = "timestamp")]
    pub committed_at: DateTime<Utc>,
    pub movements: Vec<StockMovement>,
    pub total_units: i64,
}

// =============================================================================
// Stock Ledger
// =============================================================================

/// The on-hand stock map plus the pending-restock scratch state.
///
/// Lives inside the engine's state mutex; per-key serialization falls
/// out of the engine serializing every mutation.
pub struct StockLedger {
    backend: Arc<dyn CatalogBackend>,
    inventory: HashMap<StockKey, i64>,
    /// Uncommitted restock deltas. Entries that net to zero are
    /// removed so the map stays sparse.
    pending: HashMap<StockKey, i64>,
    history: Vec<InventoryReport>,
    history_cap: usize,
}

impl StockLedger {
    pub fn new(backend: Arc<dyn CatalogBackend>, history_cap: usize) -> Self {
        StockLedger {
            backend,
            inventory: HashMap::new(),
            pending: HashMap::new(),
            history: Vec::new(),
            history_cap,
        }
    }

    /// Replaces the on-hand map with freshly loaded counts.
    pub fn load_inventory(&mut self, inventory: HashMap<StockKey, i64>) {
        self.inventory = inventory;
    }

    /// On-hand canonical units for (product, subtype). Unknown keys
    /// are zero.
    pub fn available(&self, product: &str, subtype: &str) -> i64 {
        self.inventory
            .get(&StockKey::new(product, subtype))
            .copied()
            .unwrap_or(0)
    }

    /// Whether `qty` packs of `emission` can be served from stock.
    pub fn check_stock(
        &self,
        catalog: &CatalogSnapshot,
        product: &str,
        emission: &str,
        subtype: &str,
        qty: u32,
    ) -> bool {
        let required = qty as i64 * catalog.packs().units_per(emission, subtype) as i64;
        self.available(product, subtype) >= required
    }

    /// Deducts `qty` packs, clamped at zero, and mirrors the new
    /// absolute count.
    pub async fn deduct_stock(
        &mut self,
        catalog: &CatalogSnapshot,
        product: &str,
        emission: &str,
        subtype: &str,
        qty: u32,
    ) {
        let units = qty as i64 * catalog.packs().units_per(emission, subtype) as i64;
        let new_total = (self.available(product, subtype) - units).max(0);

        self.inventory
            .insert(StockKey::new(product, subtype), new_total);
        debug!(product = %product, subtype = %subtype, units = units, available = new_total, "stock deducted");

        self.mirror(catalog, product, subtype, new_total).await;
    }

    /// Adds `qty` packs (unbounded above) and mirrors the new
    /// absolute count.
    pub async fn add_stock(
        &mut self,
        catalog: &CatalogSnapshot,
        product: &str,
        emission: &str,
        subtype: &str,
        qty: u32,
    ) {
        self.add_units(
            catalog,
            product,
            subtype,
            qty as i64 * catalog.packs().units_per(emission, subtype) as i64,
        )
        .await;
    }

    async fn add_units(
        &mut self,
        catalog: &CatalogSnapshot,
        product: &str,
        subtype: &str,
        units: i64,
    ) {
        let new_total = self.available(product, subtype) + units;

        self.inventory
            .insert(StockKey::new(product, subtype), new_total);
        debug!(product = %product, subtype = %subtype, units = units, available = new_total, "stock added");

        self.mirror(catalog, product, subtype, new_total).await;
    }

    /// Overwrites the on-hand count with an absolute value.
    pub async fn set_base_stock(
        &mut self,
        catalog: &CatalogSnapshot,
        product: &str,
        subtype: &str,
        units: i64,
    ) {
        self.inventory
            .insert(StockKey::new(product, subtype), units);
        info!(product = %product, subtype = %subtype, units = units, "base stock set");

        self.mirror(catalog, product, subtype, units).await;
    }

    /// Mirrors a new absolute count to the backend. Products the
    /// catalog does not know are kept in-memory only.
    async fn mirror(&self, catalog: &CatalogSnapshot, product: &str, subtype: &str, total: i64) {
        let Some(product_id) = catalog.product_id(product) else {
            debug!(product = %product, "no catalog id, skipping inventory mirror");
            return;
        };
        if let Err(err) = self.backend.upsert_inventory(product_id, subtype, total).await {
            error!(product = %product, subtype = %subtype, %err, "inventory mirror write failed");
        }
    }

    // -------------------------------------------------------------------------
    // Pending inventory (restock session)
    // -------------------------------------------------------------------------

    /// Accumulates a signed delta into the pending-restock map.
    pub fn update_pending(&mut self, product: &str, subtype: &str, delta: i64) {
        let key = StockKey::new(product, subtype);
        let current = self.pending.get(&key).copied().unwrap_or(0);
        let next = current + delta;
        if next == 0 {
            self.pending.remove(&key);
        } else {
            self.pending.insert(key, next);
        }
    }

    /// Pending delta for (product, subtype). Unknown keys are zero.
    pub fn pending(&self, product: &str, subtype: &str) -> i64 {
        self.pending
            .get(&StockKey::new(product, subtype))
            .copied()
            .unwrap_or(0)
    }

    pub fn pending_entries(&self) -> &HashMap<StockKey, i64> {
        &self.pending
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Applies every pending delta to on-hand stock at unit
    /// granularity, logs a timestamped report into the capped history
    /// and empties the scratch map.
    pub async fn commit_inventory(&mut self, catalog: &CatalogSnapshot) -> InventoryReport {
        let entries: Vec<(StockKey, i64)> = self.pending.drain().collect();

        let mut movements = Vec::with_capacity(entries.len());
        let mut total_units = 0;
        for (key, quantity) in entries {
            self.add_units(catalog, &key.product, &key.subtype, quantity)
                .await;
            total_units += quantity;
            movements.push(StockMovement {
                product: key.product,
                subtype: key.subtype,
                quantity,
            });
        }

        let report = InventoryReport {
            id: Uuid::new_v4().to_string(),
            committed_at: Utc::now(),
            movements,
            total_units,
        };

        info!(movements = report.movements.len(), total_units = total_units, "inventory committed");

        self.history.insert(0, report.clone());
        self.history.truncate(self.history_cap);
        report
    }

    /// Committed restock reports, newest first.
    pub fn history(&self) -> &[InventoryReport] {
        &self.history
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
