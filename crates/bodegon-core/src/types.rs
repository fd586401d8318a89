//! # Domain Types
//!
//! Core domain types used throughout Bodegon POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │     Order       │   │   OrderItem     │   │    Payment      │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  method         │        │
//! │  │  ticket_number  │   │  emission       │   │  amount_usd     │        │
//! │  │  status         │   │  slots          │   │  created_at     │        │
//! │  │  items          │   │  composition?   │   └─────────────────┘        │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │   OrderStatus   │   │   OrderType     │   │    Variety      │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  Open           │   │  Local          │   │  Normal         │        │
//! │  │  Paid           │   │  Llevar         │   │  Variado        │        │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Slot Model
//! `OrderItem::slots` is the per-unit consumption ledger of an item:
//! each entry is one canonical unit, holding the name of the product
//! actually consumed for that unit (`None` while unassigned). A
//! `Variado` item holds exactly one slot — the box counts as a single
//! stock-holding unit mapped to its first-selected product.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::money::{Bolivars, Money};

// =============================================================================
// Emission Names
// =============================================================================
// Emission (pack) names are catalog-driven strings; these are the ones
// the engine itself gives meaning to.

/// The canonical single-unit emission. Always converts to 1 unit.
pub const UNIT_EMISSION: &str = "Unidad";

/// Free-form open-tab emission. Always converts to 1 unit; its slot
/// list is kept dense (no positional nulls).
pub const OPEN_TAB_EMISSION: &str = "Libre";

/// Name of the catch-all consumption item synthesized for an open tab.
pub const CONSUMPTION_ITEM: &str = "Consumo";

/// Full case. Units resolved per subtype (24 cans / 36 tercios / 12).
pub const CASE_EMISSION: &str = "Caja";

/// Half case.
pub const HALF_CASE_EMISSION: &str = "Media Caja";

/// Six pack, offered as an optimizer candidate for can subtypes.
pub const SIX_PACK_EMISSION: &str = "Six Pack";

/// Default container subtype for synthesized consumption items.
pub const DEFAULT_SUBTYPE: &str = "Botella";

// =============================================================================
// Status / Type / Variety Enums
// =============================================================================

/// The lifecycle status of an order.
///
/// `Open --close--> Paid` (terminal), `Open --cancel--> deleted`
/// (terminal). `Paid` is absorbing; no transition returns to `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Tab is open; items may be added, removed and re-slotted.
    Open,
    /// Order has been closed and priced. Totals are frozen.
    Paid,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Open
    }
}

/// On-premise consumption vs. take-away sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum OrderType {
    /// On-premise: slot tracking and pack optimization apply.
    Local,
    /// Take-away: flat per-pack pricing, deduction deferred to close.
    Llevar,
}

impl OrderType {
    /// Checks whether this is an on-premise order.
    #[inline]
    pub fn is_local(&self) -> bool {
        matches!(self, OrderType::Local)
    }
}

impl Default for OrderType {
    fn default() -> Self {
        OrderType::Local
    }
}

/// Whether an item is a single product or a mixed selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Variety {
    /// A single product at a fixed emission.
    Normal,
    /// A mixed box whose per-unit contents are pinned via slots.
    Variado,
}

impl Default for Variety {
    fn default() -> Self {
        Variety::Normal
    }
}

/// Price tier: take-away list price vs. on-premise discounted price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PriceTier {
    Standard,
    Local,
}

// =============================================================================
// Composite Keys
// =============================================================================

/// Typed composite key for per-product, per-subtype stock counts.
///
/// Replaces delimiter-joined string keys; product names may contain
/// any character without colliding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StockKey {
    pub product: String,
    pub subtype: String,
}

impl StockKey {
    pub fn new(product: impl Into<String>, subtype: impl Into<String>) -> Self {
        StockKey {
            product: product.into(),
            subtype: subtype.into(),
        }
    }
}

/// Typed composite key for the price book.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriceKey {
    pub product: String,
    pub emission: String,
    pub subtype: String,
    pub tier: PriceTier,
}

impl PriceKey {
    pub fn new(
        product: impl Into<String>,
        emission: impl Into<String>,
        subtype: impl Into<String>,
        tier: PriceTier,
    ) -> Self {
        PriceKey {
            product: product.into(),
            emission: emission.into(),
            subtype: subtype.into(),
            tier,
        }
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line item on an order.
///
/// While an order is open, `slots` carries the unit-level consumption;
/// prices are unset. Once an order closes, items are replaced by the
/// optimizer's priced output lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Product name (for `Variado` items, the base product of the box).
    pub name: String,

    /// Single product vs. mixed selection.
    pub variety: Variety,

    /// Emission (pack) name, or `Libre`/`Consumo` for open consumption.
    pub emission: String,

    /// Container subtype (e.g. `Botella`, `Lata Grande`).
    pub subtype: String,

    /// Number of packs requested.
    pub quantity: u32,

    /// Per-unit consumption slots. Each populated entry holds stock
    /// for exactly one canonical unit of the named product.
    pub slots: Vec<Option<String>>,

    /// When this item was added to the order.
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,

    /// Unit price in USD, set on optimizer output lines.
    pub unit_price_usd: Option<Money>,

    /// Unit price in Bs, set on optimizer output lines.
    pub unit_price_bs: Option<Bolivars>,

    /// Line total in USD, set on optimizer output lines.
    pub total_price_usd: Option<Money>,

    /// Line total in Bs, set on optimizer output lines.
    pub total_price_bs: Option<Bolivars>,

    /// For a pre-assembled `Variado` box: product → units per box.
    /// Deduction expands each component separately.
    pub composition: Option<HashMap<String, u32>>,
}

impl OrderItem {
    /// Creates a plain item with empty slots and unset prices.
    pub fn new(
        name: impl Into<String>,
        variety: Variety,
        emission: impl Into<String>,
        subtype: impl Into<String>,
        quantity: u32,
    ) -> Self {
        OrderItem {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            variety,
            emission: emission.into(),
            subtype: subtype.into(),
            quantity,
            slots: Vec::new(),
            added_at: Utc::now(),
            unit_price_usd: None,
            unit_price_bs: None,
            total_price_usd: None,
            total_price_bs: None,
            composition: None,
        }
    }

    /// The catch-all "Consumo" item synthesized when an open tab is
    /// created with no pre-selected products.
    pub fn open_consumption() -> Self {
        OrderItem::new(
            CONSUMPTION_ITEM,
            Variety::Variado,
            OPEN_TAB_EMISSION,
            DEFAULT_SUBTYPE,
            1,
        )
    }

    /// Iterates the populated slot entries.
    pub fn populated_slots(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().flatten().map(String::as_str)
    }

    /// Number of populated slots (canonical units this item currently
    /// holds stock for).
    pub fn populated_slot_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Whether this item's slot list stays dense (open consumption)
    /// rather than keeping positional nulls for a fixed pack size.
    pub fn is_open_tab(&self) -> bool {
        self.emission == OPEN_TAB_EMISSION
    }

    /// Whether this item represents free-form consumption rather than
    /// a concrete pack purchase.
    pub fn is_consumption(&self) -> bool {
        self.emission == OPEN_TAB_EMISSION || self.emission == CONSUMPTION_ITEM
    }
}

// =============================================================================
// Payment
// =============================================================================

/// A payment towards an order.
///
/// Split-tender scaffold: the engine itself never appends payments,
/// but the list round-trips through persistence for hosts that do.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Payment method name (org-configurable, e.g. `Efectivo`).
    pub method: String,

    /// Amount paid in USD.
    pub amount_usd: Money,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Order
// =============================================================================

/// An open tab or a closed sale.
///
/// ## Invariant
/// While `status` is [`OrderStatus::Open`], `total_usd`/`total_bs` are
/// `None`. Once `Paid`, both totals are set and `items` has been
/// replaced by the optimizer's output (`Local`) or the direct-sale
/// input echoed back (`Llevar`).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Human-readable ticket number (1000..=9999).
    pub ticket_number: u16,

    pub customer_name: String,

    pub status: OrderStatus,

    #[serde(rename = "type")]
    pub order_type: OrderType,

    /// Payment method; set at creation for pre-paid flows, at close
    /// otherwise.
    pub payment_method: Option<String>,

    /// Free-form payment reference (transfer number, etc.).
    pub reference: String,

    /// Operator who created the order.
    pub created_by: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,

    pub items: Vec<OrderItem>,

    pub payments: Vec<Payment>,

    /// Final USD total. `None` while the order is open.
    pub total_usd: Option<Money>,

    /// Final Bs total. `None` while the order is open.
    pub total_bs: Option<Bolivars>,
}

impl Order {
    /// Whether the order can still be mutated.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }
}

// =============================================================================
// Catalog Rows
// =============================================================================
// The shapes the inventory-store collaborator returns. The engine maps
// these into its typed in-memory mirrors on load.

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductMeta {
    pub id: String,
    pub name: String,
    /// Display color hex, used by hosts; opaque to the engine.
    pub color: Option<String>,
}

/// An emission (pack) definition.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EmissionDef {
    pub id: String,
    pub name: String,
    /// Canonical units per pack. Zero means "not specified"; the
    /// conversion chain falls through to heuristics.
    pub units: u32,
}

/// One on-hand stock count, already in canonical units.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRow {
    pub product_id: String,
    pub subtype: String,
    pub quantity: i64,
}

/// One price-table entry.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceRow {
    pub product_id: String,
    pub emission: String,
    pub subtype: String,
    /// `true` for the on-premise (local-rate) tier.
    pub is_local: bool,
    /// Price in USD cents.
    pub price_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
