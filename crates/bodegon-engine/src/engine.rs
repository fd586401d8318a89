//! # Order Engine
//!
//! The order lifecycle state machine and the single place stock moves.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Order State Machine                                │
//! │                                                                         │
//! │   create_order ──► OPEN ──close_order──► PAID (terminal, retained)      │
//! │   process_direct_sale ─────────────────► PAID                           │
//! │                      │                                                  │
//! │                      └───cancel_order──► deleted (terminal,             │
//! │                                          stock restored)                │
//! │                                                                         │
//! │   While OPEN: add_item_to_order / remove_item_from_order /              │
//! │               update_order_item_slot                                    │
//! │                                                                         │
//! │   Stock timing by order type:                                           │
//! │   ─────────────────────────                                             │
//! │   Local    Variado: 1 unit on add, rest pinned slot by slot             │
//! │            Standard: deferred to close (slots or own pack)              │
//! │   Llevar   everything deferred to close / direct sale                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization Model
//! One `tokio::sync::Mutex` over the whole engine state serializes
//! every order and ledger mutation — the "single global sequential
//! actor" realization of the original's single-UI-thread assumption.
//! The mutex is held across the persistence await, so the mirror sees
//! mutations in the order they were applied.
//!
//! ## Failure Policy
//! Insufficient stock notifies the user and returns an error with the
//! state untouched. Unknown order/item ids are silent no-ops surfaced
//! as `Ok(None)`. Store and backend failures are logged and swallowed;
//! the in-memory state stays authoritative.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use bodegon_core::money::ExchangeRate;
use bodegon_core::types::{
    Order, OrderItem, OrderStatus, OrderType, PriceTier, Variety, UNIT_EMISSION,
};
use bodegon_core::validation::{validate_customer_name, validate_product_name, validate_quantity};
use bodegon_core::{calculate_order_total, CoreError, Money};

use crate::catalog::CatalogSnapshot;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::ledger::{InventoryReport, StockLedger};
use crate::traits::{CatalogBackend, NoticeLevel, NotificationSink, OrderStore};

/// Everything behind the engine's mutex: the order collection (newest
/// first), the catalog mirror and the stock ledger.
struct EngineState {
    orders: Vec<Order>,
    catalog: CatalogSnapshot,
    ledger: StockLedger,
}

/// The order/inventory engine.
///
/// Hosted as a library: the integrator supplies the three
/// collaborators and whatever transport sits above.
pub struct OrderEngine {
    state: Mutex<EngineState>,
    backend: Arc<dyn CatalogBackend>,
    store: Arc<dyn OrderStore>,
    notifier: Arc<dyn NotificationSink>,
    config: EngineConfig,
}

impl OrderEngine {
    /// Builds an engine with an empty order list and an unloaded
    /// catalog. Call [`load_catalog`](Self::load_catalog) and
    /// [`load_persisted`](Self::load_persisted) before serving.
    pub fn new(
        backend: Arc<dyn CatalogBackend>,
        store: Arc<dyn OrderStore>,
        notifier: Arc<dyn NotificationSink>,
        config: EngineConfig,
    ) -> Self {
        let catalog = CatalogSnapshot::empty(&config.default_subtypes);
        let ledger = StockLedger::new(backend.clone(), config.history_cap);
        OrderEngine {
            state: Mutex::new(EngineState {
                orders: Vec::new(),
                catalog,
                ledger,
            }),
            backend,
            store,
            notifier,
            config,
        }
    }

    /// Refreshes the catalog snapshot and on-hand counts from the
    /// backend. Fetch failures degrade to fallbacks (see
    /// [`CatalogSnapshot::load`]).
    pub async fn load_catalog(&self) {
        let load = CatalogSnapshot::load(self.backend.as_ref(), &self.config.default_subtypes).await;
        let mut state = self.state.lock().await;
        state.catalog = load.snapshot;
        state.ledger.load_inventory(load.inventory);
    }

    /// Hydrates the order collection from the store. A missing or
    /// malformed payload leaves the list empty.
    pub async fn load_persisted(&self) {
        let value = match self.store.load(&self.config.store_key).await {
            Ok(Some(value)) => value,
            Ok(None) => return,
            Err(err) => {
                error!(key = %self.config.store_key, %err, "order mirror read failed");
                return;
            }
        };

        match serde_json::from_value::<Vec<Order>>(value) {
            Ok(orders) => {
                info!(count = orders.len(), "orders hydrated from store");
                self.state.lock().await.orders = orders;
            }
            Err(err) => warn!(%err, "stored order payload malformed, starting empty"),
        }
    }

    // -------------------------------------------------------------------------
    // Order lifecycle
    // -------------------------------------------------------------------------

    /// Opens a new ticket.
    ///
    /// An empty `Local` ticket is an open bar tab: the catch-all
    /// "Consumo" item is seeded so consumption has somewhere to land.
    /// `Variado` input items get their slot list seeded with the base
    /// product; nothing is deducted here.
    pub async fn create_order(
        &self,
        customer_name: &str,
        items: Vec<OrderItem>,
        order_type: OrderType,
        payment_method: Option<String>,
        reference: &str,
    ) -> EngineResult<Order> {
        debug!(customer = %customer_name, ?order_type, "create_order");
        validate_customer_name(customer_name).map_err(CoreError::from)?;

        let now = Utc::now();
        let mut initial_items: Vec<OrderItem> = items
            .into_iter()
            .map(|mut item| {
                item.added_at = now;
                item.slots = if item.variety == Variety::Variado {
                    vec![Some(item.name.clone())]
                } else {
                    Vec::new()
                };
                item
            })
            .collect();

        if initial_items.is_empty() && order_type.is_local() {
            initial_items.push(OrderItem::open_consumption());
        }

        let order = Order {
            id: Uuid::new_v4().to_string(),
            ticket_number: generate_ticket_number(),
            customer_name: name_or(customer_name, "Cliente"),
            status: OrderStatus::Open,
            order_type,
            payment_method,
            reference: reference.to_string(),
            created_by: self.config.operator.clone(),
            created_at: now,
            closed_at: None,
            items: initial_items,
            payments: Vec::new(),
            total_usd: None,
            total_bs: None,
        };

        let mut state = self.state.lock().await;
        state.orders.insert(0, order.clone());
        self.persist(&state.orders).await;

        self.notifier.notify(
            &format!("Ticket #{} Creado", order.ticket_number),
            NoticeLevel::Success,
            None,
        );
        info!(order_id = %order.id, ticket = order.ticket_number, "order created");
        Ok(order)
    }

    /// Appends an item to an open order, with availability checked up
    /// front.
    ///
    /// A `Variado` box is proxy-checked at one canonical unit
    /// regardless of the requested quantity; its per-unit contents get
    /// pinned later through slots. Standard items check the full
    /// quantity at their own pack. On a `Local` order the `Variado`
    /// unit is deducted immediately; standard items defer deduction
    /// until their slots fill (or the order closes). Non-local orders
    /// defer everything to close.
    pub async fn add_item_to_order(
        &self,
        order_id: &str,
        mut item: OrderItem,
    ) -> EngineResult<Option<Order>> {
        debug!(order_id = %order_id, item = %item.name, "add_item_to_order");
        validate_product_name(&item.name).map_err(CoreError::from)?;
        let quantity = item.quantity.max(1);
        validate_quantity(quantity).map_err(CoreError::from)?;

        let mut state = self.state.lock().await;
        let EngineState {
            orders,
            catalog,
            ledger,
        } = &mut *state;

        let Some(order) = orders.iter_mut().find(|o| o.id == order_id && o.is_open()) else {
            return Ok(None);
        };

        let (check_emission, check_qty) = if item.variety == Variety::Variado {
            (UNIT_EMISSION, 1)
        } else {
            (item.emission.as_str(), quantity)
        };

        if !ledger.check_stock(catalog, &item.name, check_emission, &item.subtype, check_qty) {
            let required =
                check_qty as i64 * catalog.packs().units_per(check_emission, &item.subtype) as i64;
            let available = ledger.available(&item.name, &item.subtype);
            self.notifier.notify(
                &format!("Stock insuficiente para {}", item.name),
                NoticeLevel::Error,
                None,
            );
            return Err(EngineError::insufficient_stock(
                &item.name, available, required,
            ));
        }

        item.quantity = quantity;
        item.added_at = Utc::now();

        if order.order_type.is_local() {
            if item.variety == Variety::Variado {
                ledger
                    .deduct_stock(catalog, &item.name, UNIT_EMISSION, &item.subtype, 1)
                    .await;
                item.slots = vec![Some(item.name.clone())];
            } else {
                // Deduction deferred until the consumer pins units to
                // slots, or until close.
                item.slots = Vec::new();
            }
        }

        let name = item.name.clone();
        order.items.push(item);
        let updated = order.clone();

        self.persist(orders).await;
        self.notifier.notify(
            &format!("{} agregado", name),
            NoticeLevel::Info,
            Some(Duration::from_millis(1500)),
        );
        info!(order_id = %order_id, item = %name, "item added");
        Ok(Some(updated))
    }

    /// Removes an item from an open order.
    ///
    /// On a `Local` order every populated slot returns one canonical
    /// unit; an item with an empty slot list falls back to one unit of
    /// its own product name, covering legacy bulk-added items.
    /// Non-local removal restores nothing — nothing was deducted yet.
    pub async fn remove_item_from_order(
        &self,
        order_id: &str,
        item_id: &str,
    ) -> EngineResult<Option<Order>> {
        debug!(order_id = %order_id, item_id = %item_id, "remove_item_from_order");

        let mut state = self.state.lock().await;
        let EngineState {
            orders,
            catalog,
            ledger,
        } = &mut *state;

        let Some(order) = orders.iter_mut().find(|o| o.id == order_id && o.is_open()) else {
            return Ok(None);
        };
        let Some(pos) = order.items.iter().position(|i| i.id == item_id) else {
            return Ok(None);
        };
        let item = order.items.remove(pos);

        if order.order_type.is_local() {
            if item.slots.is_empty() {
                ledger
                    .add_stock(catalog, &item.name, UNIT_EMISSION, &item.subtype, 1)
                    .await;
            } else {
                for slot in item.populated_slots() {
                    ledger
                        .add_stock(catalog, slot, UNIT_EMISSION, &item.subtype, 1)
                        .await;
                }
            }
        }

        let updated = order.clone();
        self.persist(orders).await;
        info!(order_id = %order_id, item = %item.name, "item removed");
        Ok(Some(updated))
    }

    /// Cancels an open order, restoring stock for everything it held.
    ///
    /// Restoration follows populated slots; the product-name fallback
    /// applies only to `Variado` items (a standard item with no slots
    /// never had stock taken). The order is deleted outright, not
    /// archived.
    pub async fn cancel_order(&self, order_id: &str) -> EngineResult<Option<Order>> {
        debug!(order_id = %order_id, "cancel_order");

        let mut state = self.state.lock().await;
        let EngineState {
            orders,
            catalog,
            ledger,
        } = &mut *state;

        let Some(pos) = orders.iter().position(|o| o.id == order_id && o.is_open()) else {
            return Ok(None);
        };
        let order = orders.remove(pos);

        if order.order_type.is_local() {
            for item in &order.items {
                if item.slots.is_empty() {
                    if item.variety == Variety::Variado {
                        ledger
                            .add_stock(catalog, &item.name, UNIT_EMISSION, &item.subtype, 1)
                            .await;
                    }
                } else {
                    for slot in item.populated_slots() {
                        ledger
                            .add_stock(catalog, slot, UNIT_EMISSION, &item.subtype, 1)
                            .await;
                    }
                }
            }
        }

        self.persist(orders).await;
        self.notifier
            .notify("Ticket cancelado", NoticeLevel::Info, None);
        info!(order_id = %order_id, ticket = order.ticket_number, "order cancelled");
        Ok(Some(order))
    }

    /// Reassigns one consumption slot on a `Local` order.
    ///
    /// Sequencing is restore-old before deduct-new so availability
    /// nets correctly when old and new name the same product. `Libre`
    /// items keep their slot list dense; fixed packs keep positional
    /// nulls as placeholders.
    pub async fn update_order_item_slot(
        &self,
        order_id: &str,
        item_index: usize,
        slot_index: usize,
        content: Option<&str>,
    ) -> EngineResult<Option<Order>> {
        debug!(order_id = %order_id, item_index, slot_index, ?content, "update_order_item_slot");

        let mut state = self.state.lock().await;
        let EngineState {
            orders,
            catalog,
            ledger,
        } = &mut *state;

        let Some(order) = orders.iter_mut().find(|o| o.id == order_id && o.is_open()) else {
            return Ok(None);
        };
        let is_local = order.order_type.is_local();
        let Some(item) = order.items.get_mut(item_index) else {
            return Ok(None);
        };

        let subtype = item.subtype.clone();
        let old_content = item.slots.get(slot_index).cloned().flatten();

        if is_local {
            if let Some(content) = content {
                if !ledger.check_stock(catalog, content, UNIT_EMISSION, &subtype, 1) {
                    self.notifier.notify(
                        &format!("Stock insuficiente para {}", content),
                        NoticeLevel::Error,
                        None,
                    );
                    return Err(EngineError::insufficient_stock(
                        content,
                        ledger.available(content, &subtype),
                        1,
                    ));
                }
            }

            if let Some(old) = &old_content {
                ledger
                    .add_stock(catalog, old, UNIT_EMISSION, &subtype, 1)
                    .await;
            }
            if let Some(content) = content {
                ledger
                    .deduct_stock(catalog, content, UNIT_EMISSION, &subtype, 1)
                    .await;
            }
        }

        if item.slots.len() <= slot_index {
            item.slots.resize(slot_index + 1, None);
        }
        item.slots[slot_index] = content.map(str::to_string);
        if item.is_open_tab() {
            item.slots.retain(Option::is_some);
        }

        let updated = order.clone();
        self.persist(orders).await;
        Ok(Some(updated))
    }

    /// Closes an open order: realizes any deferred stock deduction,
    /// prices the consumption through the optimizer, and freezes the
    /// order as `PAID`.
    ///
    /// Closing an already-`PAID` order is rejected with
    /// [`EngineError::AlreadyClosed`]; an unknown id is a silent
    /// no-op.
    pub async fn close_order(
        &self,
        order_id: &str,
        payment_method: &str,
        reference: &str,
    ) -> EngineResult<Option<Order>> {
        debug!(order_id = %order_id, method = %payment_method, "close_order");

        let mut state = self.state.lock().await;
        let EngineState {
            orders,
            catalog,
            ledger,
        } = &mut *state;

        let Some(pos) = orders.iter().position(|o| o.id == order_id) else {
            return Ok(None);
        };
        if !orders[pos].is_open() {
            return Err(EngineError::AlreadyClosed(order_id.to_string()));
        }

        let is_local = orders[pos].order_type.is_local();
        let items = orders[pos].items.clone();

        for item in &items {
            if !is_local {
                // Take-away: everything was deferred to this moment.
                if item.variety == Variety::Variado {
                    if item.slots.is_empty() {
                        ledger
                            .deduct_stock(catalog, &item.name, UNIT_EMISSION, &item.subtype, 1)
                            .await;
                    } else {
                        for slot in item.populated_slots() {
                            ledger
                                .deduct_stock(catalog, slot, UNIT_EMISSION, &item.subtype, 1)
                                .await;
                        }
                    }
                } else {
                    ledger
                        .deduct_stock(
                            catalog,
                            &item.name,
                            &item.emission,
                            &item.subtype,
                            item.quantity.max(1),
                        )
                        .await;
                }
            } else if item.variety != Variety::Variado
                && !item.is_consumption()
                && item.populated_slot_count() == 0
                && item.quantity > 0
            {
                // A standard local item whose units were never pinned:
                // deduct at its own pack now, matching the optimizer's
                // own-pack pricing for the same item.
                ledger
                    .deduct_stock(catalog, &item.name, &item.emission, &item.subtype, item.quantity)
                    .await;
            }
            // Local Variado/Consumo stock was already taken
            // incrementally, slot by slot.
        }

        let totals =
            calculate_order_total(&items, orders[pos].order_type, catalog.packs(), catalog.book());

        let order = &mut orders[pos];
        order.status = OrderStatus::Paid;
        order.closed_at = Some(Utc::now());
        order.payment_method = Some(payment_method.to_string());
        order.reference = reference.to_string();
        order.total_usd = Some(totals.total_usd);
        order.total_bs = Some(totals.total_bs);
        order.items = totals.optimized_items;
        let updated = order.clone();

        self.persist(orders).await;
        self.notifier.notify(
            &format!("Ticket Cerrado: {} Bs", totals.total_bs),
            NoticeLevel::Success,
            None,
        );
        info!(
            order_id = %order_id,
            ticket = updated.ticket_number,
            total_usd = %totals.total_usd,
            "order closed"
        );
        Ok(Some(updated))
    }

    /// Registers a take-away sale in one step: price through the
    /// optimizer, deduct stock from the caller's item list, store the
    /// order already `PAID`.
    ///
    /// Deduction always follows the **pre-optimization** items. A
    /// `Variado` box carrying a composition map deducts each component
    /// separately at unit granularity.
    pub async fn process_direct_sale(
        &self,
        customer_name: &str,
        items: Vec<OrderItem>,
        payment_method: &str,
        reference: &str,
    ) -> EngineResult<Order> {
        debug!(customer = %customer_name, items = items.len(), "process_direct_sale");
        validate_customer_name(customer_name).map_err(CoreError::from)?;

        let mut state = self.state.lock().await;
        let EngineState {
            orders,
            catalog,
            ledger,
        } = &mut *state;

        let totals =
            calculate_order_total(&items, OrderType::Llevar, catalog.packs(), catalog.book());

        for item in &items {
            let quantity = item.quantity.max(1);
            match (item.variety, item.composition.as_ref()) {
                (Variety::Variado, Some(composition)) => {
                    for (product, units) in composition {
                        ledger
                            .deduct_stock(
                                catalog,
                                product,
                                UNIT_EMISSION,
                                &item.subtype,
                                units * quantity,
                            )
                            .await;
                    }
                }
                _ => {
                    ledger
                        .deduct_stock(catalog, &item.name, &item.emission, &item.subtype, quantity)
                        .await;
                }
            }
        }

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            ticket_number: generate_ticket_number(),
            customer_name: name_or(customer_name, "Venta Directa"),
            status: OrderStatus::Paid,
            order_type: OrderType::Llevar,
            payment_method: Some(payment_method.to_string()),
            reference: reference.to_string(),
            created_by: self.config.operator.clone(),
            created_at: now,
            closed_at: Some(now),
            items: totals.optimized_items,
            payments: Vec::new(),
            total_usd: Some(totals.total_usd),
            total_bs: Some(totals.total_bs),
        };

        orders.insert(0, order.clone());
        self.persist(orders).await;
        self.notifier
            .notify("Venta Registrada en Caja", NoticeLevel::Success, None);
        info!(order_id = %order.id, total_usd = %totals.total_usd, "direct sale processed");
        Ok(order)
    }

    /// Replaces the whole order collection. Administrative API for
    /// test-data tooling, gated behind the dev-tools capability.
    pub async fn replace_all_orders(&self, orders: Vec<Order>) -> EngineResult<()> {
        if !self.config.dev_tools {
            return Err(EngineError::DevToolsDisabled);
        }

        let mut state = self.state.lock().await;
        state.orders = orders;
        self.persist(&state.orders).await;
        info!(count = state.orders.len(), "order collection replaced");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Read accessors
    // -------------------------------------------------------------------------

    /// All orders, open and closed, newest first.
    pub async fn orders(&self) -> Vec<Order> {
        self.state.lock().await.orders.clone()
    }

    pub async fn order(&self, order_id: &str) -> Option<Order> {
        self.state
            .lock()
            .await
            .orders
            .iter()
            .find(|o| o.id == order_id)
            .cloned()
    }

    pub async fn open_orders(&self) -> Vec<Order> {
        self.state
            .lock()
            .await
            .orders
            .iter()
            .filter(|o| o.is_open())
            .cloned()
            .collect()
    }

    // -------------------------------------------------------------------------
    // Stock ledger surface
    // -------------------------------------------------------------------------
    // The host-facing ledger API. Same serialization as the order
    // operations: everything funnels through the one state mutex.

    pub async fn check_stock(
        &self,
        product: &str,
        emission: &str,
        subtype: &str,
        qty: u32,
    ) -> bool {
        let state = self.state.lock().await;
        state
            .ledger
            .check_stock(&state.catalog, product, emission, subtype, qty)
    }

    pub async fn available(&self, product: &str, subtype: &str) -> i64 {
        self.state.lock().await.ledger.available(product, subtype)
    }

    pub async fn add_stock(&self, product: &str, emission: &str, subtype: &str, qty: u32) {
        let mut state = self.state.lock().await;
        let EngineState { catalog, ledger, .. } = &mut *state;
        ledger.add_stock(catalog, product, emission, subtype, qty).await;
    }

    pub async fn deduct_stock(&self, product: &str, emission: &str, subtype: &str, qty: u32) {
        let mut state = self.state.lock().await;
        let EngineState { catalog, ledger, .. } = &mut *state;
        ledger
            .deduct_stock(catalog, product, emission, subtype, qty)
            .await;
    }

    pub async fn set_base_stock(&self, product: &str, subtype: &str, units: i64) {
        let mut state = self.state.lock().await;
        let EngineState { catalog, ledger, .. } = &mut *state;
        ledger.set_base_stock(catalog, product, subtype, units).await;
    }

    pub async fn update_pending_inventory(&self, product: &str, subtype: &str, delta: i64) {
        self.state
            .lock()
            .await
            .ledger
            .update_pending(product, subtype, delta);
    }

    pub async fn pending_inventory(&self, product: &str, subtype: &str) -> i64 {
        self.state.lock().await.ledger.pending(product, subtype)
    }

    pub async fn clear_pending_inventory(&self) {
        self.state.lock().await.ledger.clear_pending();
    }

    /// Commits the pending restock batch and returns its report.
    pub async fn commit_inventory(&self) -> InventoryReport {
        let mut state = self.state.lock().await;
        let EngineState { catalog, ledger, .. } = &mut *state;
        ledger.commit_inventory(catalog).await
    }

    pub async fn inventory_history(&self) -> Vec<InventoryReport> {
        self.state.lock().await.ledger.history().to_vec()
    }

    // -------------------------------------------------------------------------
    // Catalog mirror surface
    // -------------------------------------------------------------------------

    pub async fn set_exchange_rate(&self, rate: ExchangeRate) {
        self.state.lock().await.catalog.set_exchange_rate(rate);
    }

    pub async fn update_conversion(&self, emission: &str, subtype: &str, units: u32) {
        self.state
            .lock()
            .await
            .catalog
            .update_conversion(emission, subtype, units);
    }

    pub async fn set_price(
        &self,
        product: &str,
        emission: &str,
        subtype: &str,
        tier: PriceTier,
        price: Money,
    ) {
        self.state
            .lock()
            .await
            .catalog
            .set_price(product, emission, subtype, tier, price);
    }

    // -------------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------------

    /// Mirrors the order list to the store. Failures are logged and
    /// swallowed; the in-memory list stays authoritative.
    async fn persist(&self, orders: &[Order]) {
        match serde_json::to_value(orders) {
            Ok(value) => {
                if let Err(err) = self.store.save(&self.config.store_key, value).await {
                    error!(key = %self.config.store_key, %err, "order mirror write failed");
                }
            }
            Err(err) => error!(%err, "order list serialization failed"),
        }
    }
}

/// Human-readable ticket number in 1000..=9999, derived from the clock
/// the same way receipt numbers are.
fn generate_ticket_number() -> u16 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    1000 + (nanos % 9000) as u16
}

fn name_or(name: &str, fallback: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        fallback.to_string()
    } else {
        name.to_string()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
