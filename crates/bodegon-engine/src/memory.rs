//! # In-Memory Collaborators
//!
//! Default implementations of the collaborator traits, backed by plain
//! maps. They serve two audiences: test fixtures inside this
//! workspace, and integrators who want a running engine before wiring
//! a real backend.
//!
//! ```rust,ignore
//! let backend = Arc::new(
//!     MemoryCatalog::new()
//!         .with_product("p1", "Polar Pilsen")
//!         .with_emission("Caja", 36)
//!         .with_inventory("p1", "Botella", 100)
//!         .with_price("p1", "Caja", "Botella", true, 3000),
//! );
//! let engine = OrderEngine::new(backend, Arc::new(MemoryStore::new()),
//!     Arc::new(NullNotifier), EngineConfig::default());
//! ```

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use bodegon_core::types::{EmissionDef, InventoryRow, PriceRow, ProductMeta};

use crate::traits::{BackendError, CatalogBackend, NoticeLevel, NotificationSink, OrderStore};

// =============================================================================
// Memory Catalog
// =============================================================================

#[derive(Debug, Default)]
struct CatalogData {
    products: Vec<ProductMeta>,
    emissions: Vec<EmissionDef>,
    subtypes: Option<Vec<String>>,
    inventory: Vec<InventoryRow>,
    prices: Vec<PriceRow>,
    upsert_count: usize,
}

/// Catalog backend over in-memory tables, seeded with builder calls.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    data: Mutex<CatalogData>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        MemoryCatalog::default()
    }

    pub fn with_product(self, id: &str, name: &str) -> Self {
        self.data.lock().unwrap().products.push(ProductMeta {
            id: id.to_string(),
            name: name.to_string(),
            color: None,
        });
        self
    }

    pub fn with_emission(self, name: &str, units: u32) -> Self {
        {
            let mut data = self.data.lock().unwrap();
            let id = format!("em-{}", data.emissions.len());
            data.emissions.push(EmissionDef {
                id,
                name: name.to_string(),
                units,
            });
        }
        self
    }

    pub fn with_subtypes(self, subtypes: &[&str]) -> Self {
        self.data.lock().unwrap().subtypes =
            Some(subtypes.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_inventory(self, product_id: &str, subtype: &str, quantity: i64) -> Self {
        self.data.lock().unwrap().inventory.push(InventoryRow {
            product_id: product_id.to_string(),
            subtype: subtype.to_string(),
            quantity,
        });
        self
    }

    pub fn with_price(
        self,
        product_id: &str,
        emission: &str,
        subtype: &str,
        is_local: bool,
        price_cents: i64,
    ) -> Self {
        self.data.lock().unwrap().prices.push(PriceRow {
            product_id: product_id.to_string(),
            emission: emission.to_string(),
            subtype: subtype.to_string(),
            is_local,
            price_cents,
        });
        self
    }

    /// Last upserted quantity for (product, subtype), for assertions
    /// on the mirror write.
    pub fn inventory_quantity(&self, product_id: &str, subtype: &str) -> Option<i64> {
        self.data
            .lock()
            .unwrap()
            .inventory
            .iter()
            .find(|row| row.product_id == product_id && row.subtype == subtype)
            .map(|row| row.quantity)
    }

    /// How many mirror writes the backend has received.
    pub fn upsert_count(&self) -> usize {
        self.data.lock().unwrap().upsert_count
    }
}

#[async_trait]
impl CatalogBackend for MemoryCatalog {
    async fn fetch_catalog(&self) -> Result<Vec<ProductMeta>, BackendError> {
        Ok(self.data.lock().unwrap().products.clone())
    }

    async fn fetch_emissions(&self) -> Result<Vec<EmissionDef>, BackendError> {
        Ok(self.data.lock().unwrap().emissions.clone())
    }

    async fn fetch_subtypes(&self) -> Result<Option<Vec<String>>, BackendError> {
        Ok(self.data.lock().unwrap().subtypes.clone())
    }

    async fn fetch_inventory(&self) -> Result<Vec<InventoryRow>, BackendError> {
        Ok(self.data.lock().unwrap().inventory.clone())
    }

    async fn fetch_prices(&self) -> Result<Vec<PriceRow>, BackendError> {
        Ok(self.data.lock().unwrap().prices.clone())
    }

    async fn upsert_inventory(
        &self,
        product_id: &str,
        subtype: &str,
        quantity: i64,
    ) -> Result<(), BackendError> {
        let mut data = self.data.lock().unwrap();
        data.upsert_count += 1;
        if let Some(row) = data
            .inventory
            .iter_mut()
            .find(|row| row.product_id == product_id && row.subtype == subtype)
        {
            row.quantity = quantity;
        } else {
            data.inventory.push(InventoryRow {
                product_id: product_id.to_string(),
                subtype: subtype.to_string(),
                quantity,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Memory Store
// =============================================================================

/// KV order store over a map. `failing()` builds a store whose every
/// call errors, for exercising the log-and-swallow policy.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, serde_json::Value>>,
    fail: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// A store that rejects every read and write.
    pub fn failing() -> Self {
        MemoryStore {
            entries: Mutex::new(HashMap::new()),
            fail: true,
        }
    }

    /// Direct read of a stored value, for assertions.
    pub fn saved(&self, key: &str) -> Option<serde_json::Value> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    /// Seeds a value before the engine hydrates, for assertions.
    pub fn seed(&self, key: &str, value: serde_json::Value) {
        self.entries.lock().unwrap().insert(key.to_string(), value);
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn save(&self, key: &str, value: serde_json::Value) -> Result<(), BackendError> {
        if self.fail {
            return Err("store unavailable".into());
        }
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>, BackendError> {
        if self.fail {
            return Err("store unavailable".into());
        }
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }
}

// =============================================================================
// Notifiers
// =============================================================================

/// Swallows every notice.
#[derive(Debug, Default)]
pub struct NullNotifier;

impl NotificationSink for NullNotifier {
    fn notify(&self, _message: &str, _level: NoticeLevel, _duration: Option<Duration>) {}
}

/// One recorded notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub level: NoticeLevel,
}

/// Records every notice for assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        RecordingNotifier::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    /// Whether any recorded notice contains `fragment`.
    pub fn saw(&self, fragment: &str) -> bool {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .any(|n| n.message.contains(fragment))
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, message: &str, level: NoticeLevel, _duration: Option<Duration>) {
        self.notices.lock().unwrap().push(Notice {
            message: message.to_string(),
            level,
        });
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_replaces_existing_row() {
        let backend = MemoryCatalog::new().with_inventory("p1", "Botella", 10);

        backend.upsert_inventory("p1", "Botella", 4).await.unwrap();

        assert_eq!(backend.inventory_quantity("p1", "Botella"), Some(4));
        assert_eq!(backend.fetch_inventory().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failing_store_errors_both_ways() {
        let store = MemoryStore::failing();
        assert!(store.save("k", serde_json::json!([])).await.is_err());
        assert!(store.load("k").await.is_err());
    }

    #[test]
    fn test_recording_notifier_matches_fragments() {
        let notifier = RecordingNotifier::new();
        notifier.notify("Ticket #1234 Creado", NoticeLevel::Success, None);

        assert!(notifier.saw("Creado"));
        assert!(!notifier.saw("cancelado"));
        assert_eq!(notifier.notices()[0].level, NoticeLevel::Success);
    }
}
