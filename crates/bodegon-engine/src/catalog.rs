//! # Catalog Snapshot
//!
//! In-memory mirror of the catalog backend, built in one load pass.
//!
//! ## Load Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Catalog Snapshot Load                               │
//! │                                                                         │
//! │  CatalogBackend                          CatalogSnapshot                │
//! │  ──────────────                          ───────────────                │
//! │  fetch_catalog()    ──► products + name ↔ id maps                      │
//! │  fetch_emissions()  ──► PackCatalog (Unidad-first name list)            │
//! │  fetch_subtypes()   ──► subtype list (engine defaults as fallback)      │
//! │  fetch_prices()     ──► PriceBook (typed composite keys)                │
//! │  fetch_inventory()  ──► StockKey → units (handed to the ledger)         │
//! │                                                                         │
//! │  Every fetch failure degrades to a fallback and a warning; a POS        │
//! │  with an empty catalog still serves open tabs.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Catalog CRUD stays on the backend's side of the boundary. The few
//! mutators here (`set_price`, `update_conversion`, `set_exchange_rate`)
//! only refresh the mirror the optimizer and ledger read.

use std::collections::HashMap;

use tracing::{debug, warn};

use bodegon_core::money::ExchangeRate;
use bodegon_core::types::{ProductMeta, StockKey};
use bodegon_core::{Money, PackCatalog, PriceBook, PriceTier};

use crate::traits::CatalogBackend;

/// Typed in-memory mirror of the catalog backend.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    products: Vec<ProductMeta>,
    /// Product name → backend id, for the inventory mirror writes.
    product_ids: HashMap<String, String>,
    packs: PackCatalog,
    subtypes: Vec<String>,
    book: PriceBook,
}

/// The result of one load pass: the snapshot plus the on-hand counts
/// the stock ledger takes ownership of.
#[derive(Debug)]
pub struct CatalogLoad {
    pub snapshot: CatalogSnapshot,
    pub inventory: HashMap<StockKey, i64>,
}

impl CatalogSnapshot {
    /// An empty snapshot with the engine's default subtypes. Used
    /// before the first load and by tests that seed state directly.
    pub fn empty(default_subtypes: &[String]) -> Self {
        CatalogSnapshot {
            products: Vec::new(),
            product_ids: HashMap::new(),
            packs: PackCatalog::fallback(),
            subtypes: default_subtypes.to_vec(),
            book: PriceBook::new(),
        }
    }

    /// Loads everything the engine reads from the backend in one pass.
    ///
    /// Each fetch failure is logged and replaced with a fallback: no
    /// products, the builtin pack list, the default subtypes, an empty
    /// price book, zero stock. The engine never refuses to start over
    /// a broken backend.
    pub async fn load(backend: &dyn CatalogBackend, default_subtypes: &[String]) -> CatalogLoad {
        let products = match backend.fetch_catalog().await {
            Ok(products) => products,
            Err(err) => {
                warn!(%err, "catalog fetch failed, starting with no products");
                Vec::new()
            }
        };

        let mut product_ids = HashMap::new();
        let mut product_names = HashMap::new();
        for product in &products {
            product_ids.insert(product.name.clone(), product.id.clone());
            product_names.insert(product.id.clone(), product.name.clone());
        }

        let packs = match backend.fetch_emissions().await {
            Ok(emissions) => PackCatalog::new(emissions),
            Err(err) => {
                warn!(%err, "emission fetch failed, using builtin pack list");
                PackCatalog::fallback()
            }
        };

        let subtypes = match backend.fetch_subtypes().await {
            Ok(Some(subtypes)) if !subtypes.is_empty() => subtypes,
            Ok(_) => default_subtypes.to_vec(),
            Err(err) => {
                warn!(%err, "subtype fetch failed, using defaults");
                default_subtypes.to_vec()
            }
        };

        let mut book = PriceBook::new();
        match backend.fetch_prices().await {
            Ok(rows) => {
                for row in rows {
                    // Price rows are keyed by backend product id; rows
                    // for unknown products are dropped.
                    let Some(name) = product_names.get(&row.product_id) else {
                        debug!(product_id = %row.product_id, "price row for unknown product");
                        continue;
                    };
                    let tier = if row.is_local {
                        PriceTier::Local
                    } else {
                        PriceTier::Standard
                    };
                    book.set_price(
                        name,
                        &row.emission,
                        &row.subtype,
                        tier,
                        Money::from_cents(row.price_cents),
                    );
                }
            }
            Err(err) => warn!(%err, "price fetch failed, starting with an empty price book"),
        }

        let mut inventory = HashMap::new();
        match backend.fetch_inventory().await {
            Ok(rows) => {
                for row in rows {
                    let Some(name) = product_names.get(&row.product_id) else {
                        debug!(product_id = %row.product_id, "inventory row for unknown product");
                        continue;
                    };
                    inventory.insert(StockKey::new(name, &row.subtype), row.quantity);
                }
            }
            Err(err) => warn!(%err, "inventory fetch failed, starting with zero stock"),
        }

        debug!(
            products = products.len(),
            emissions = packs.emissions().len(),
            subtypes = subtypes.len(),
            stock_keys = inventory.len(),
            "catalog snapshot loaded"
        );

        CatalogLoad {
            snapshot: CatalogSnapshot {
                products,
                product_ids,
                packs,
                subtypes,
                book,
            },
            inventory,
        }
    }

    pub fn products(&self) -> &[ProductMeta] {
        &self.products
    }

    /// Resolves a product name to its backend id.
    pub fn product_id(&self, name: &str) -> Option<&str> {
        self.product_ids.get(name).map(String::as_str)
    }

    pub fn packs(&self) -> &PackCatalog {
        &self.packs
    }

    pub fn subtypes(&self) -> &[String] {
        &self.subtypes
    }

    pub fn book(&self) -> &PriceBook {
        &self.book
    }

    /// Refreshes the exchange rate used for derived Bs prices.
    pub fn set_exchange_rate(&mut self, rate: ExchangeRate) {
        self.book.set_exchange_rate(rate);
    }

    /// Mirrors a conversion-override change into the pack catalog.
    pub fn update_conversion(&mut self, emission: &str, subtype: &str, units: u32) {
        self.packs.set_conversion(emission, subtype, units);
    }

    /// Mirrors a price change into the book.
    pub fn set_price(
        &mut self,
        product: &str,
        emission: &str,
        subtype: &str,
        tier: PriceTier,
        price: Money,
    ) {
        self.book.set_price(product, emission, subtype, tier, price);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
