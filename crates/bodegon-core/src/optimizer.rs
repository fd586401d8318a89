//! # Pack Optimizer
//!
//! Converts an order's consumption into priced line items.
//!
//! ## Two Pricing Paths
//! ```text
//! calculate_order_total(items, type)
//!     │
//!     ├─ Llevar (take-away): flat per-pack pricing at the standard
//!     │  tier; items echo back unchanged.
//!     │
//!     └─ Local (on-premise): slot occupancy is aggregated per
//!        (product, subtype) and greedily repacked into the largest
//!        discounted packs available at the local tier:
//!
//!        59 × Polar Pilsen (Botella), Caja=36 @ $30, Media Caja=18 @ $16
//!            ├─ 1 × Caja        (36 units, $30)
//!            ├─ 1 × Media Caja  (18 units, $16)
//!            └─ 5 × Unidad      ($1 each)   → $51 total
//! ```
//!
//! ## Greedy Caveat
//! Largest-units-first is the classic coin-change heuristic. It is not
//! globally optimal for arbitrary denominations, but the case-size
//! hierarchies in real catalogs (36/18/6/1, 24/12/6/1) are
//! divisor-friendly, where greedy is exact. Candidate ties keep
//! catalog iteration order (stable sort).

use crate::conversion::PackCatalog;
use crate::money::{Bolivars, Money};
use crate::pricing::PriceBook;
use crate::types::{
    OrderItem, OrderType, PriceTier, StockKey, Variety, CASE_EMISSION, HALF_CASE_EMISSION,
    SIX_PACK_EMISSION, UNIT_EMISSION,
};

// =============================================================================
// Output
// =============================================================================

/// The optimizer's result: totals in both currencies, a human-readable
/// repacking summary, and the priced line items that replace the
/// order's items at close time.
#[derive(Debug, Clone)]
pub struct OrderTotals {
    pub total_usd: Money,
    pub total_bs: Bolivars,
    pub details: Vec<String>,
    pub optimized_items: Vec<OrderItem>,
}

/// One surviving repacking candidate for a consumption bucket.
#[derive(Debug)]
struct Candidate {
    name: String,
    units: u32,
    price_usd: Money,
    price_bs: Bolivars,
}

// =============================================================================
// Entry Point
// =============================================================================

/// Prices a list of order items.
///
/// Pure over its inputs: the caller supplies the pack catalog and the
/// price book, and nothing here touches stock.
pub fn calculate_order_total(
    items: &[OrderItem],
    order_type: OrderType,
    packs: &PackCatalog,
    book: &PriceBook,
) -> OrderTotals {
    if order_type.is_local() {
        calculate_local(items, packs, book)
    } else {
        calculate_take_away(items, book)
    }
}

// =============================================================================
// Take-Away Path
// =============================================================================

fn calculate_take_away(items: &[OrderItem], book: &PriceBook) -> OrderTotals {
    let mut total_usd = Money::zero();
    let mut total_bs = Bolivars::zero();

    for item in items {
        let qty = item.quantity.max(1) as i64;

        if item.variety == Variety::Variado && item.composition.is_some() {
            // Pre-assembled mixed box: priced by its own stored unit
            // price, the catalog has no entry for an ad-hoc mix.
            total_usd += item.unit_price_usd.unwrap_or_else(Money::zero) * qty;
            total_bs += item.unit_price_bs.unwrap_or_else(Bolivars::zero) * qty;
        } else {
            total_usd +=
                book.usd(&item.name, &item.emission, &item.subtype, PriceTier::Standard) * qty;
            total_bs +=
                book.bs(&item.name, &item.emission, &item.subtype, PriceTier::Standard) * qty;
        }
    }

    OrderTotals {
        total_usd,
        total_bs,
        details: Vec::new(),
        optimized_items: items.to_vec(),
    }
}

// =============================================================================
// Local (On-Premise) Path
// =============================================================================

fn calculate_local(items: &[OrderItem], packs: &PackCatalog, book: &PriceBook) -> OrderTotals {
    let mut total_usd = Money::zero();
    let mut total_bs = Bolivars::zero();
    let mut details = Vec::new();
    let mut optimized_items = Vec::new();

    // 1. Aggregate slot occupancy per (product, subtype), preserving
    //    first-seen order so output is deterministic.
    let mut consumption: Vec<(StockKey, u32)> = Vec::new();
    for item in items {
        for slot in item.populated_slots() {
            let key = StockKey::new(slot, &item.subtype);
            match consumption.iter_mut().find(|(k, _)| *k == key) {
                Some((_, count)) => *count += 1,
                None => consumption.push((key, 1)),
            }
        }

        // A standard item that never got slotted would otherwise fall
        // out of the consumption map and close at zero. Price it at
        // its own pack instead (local tier, standard as fallback).
        if item.variety != Variety::Variado
            && !item.is_consumption()
            && item.populated_slot_count() == 0
            && item.quantity > 0
        {
            let tier = if book
                .usd(&item.name, &item.emission, &item.subtype, PriceTier::Local)
                .is_positive()
            {
                PriceTier::Local
            } else {
                PriceTier::Standard
            };
            let unit_usd = book.usd(&item.name, &item.emission, &item.subtype, tier);
            let unit_bs = book.bs(&item.name, &item.emission, &item.subtype, tier);
            let qty = item.quantity;

            total_usd += unit_usd * qty as i64;
            total_bs += unit_bs * qty as i64;
            details.push(format!("{} {}{}", qty, item.emission, plural(qty)));
            optimized_items.push(priced_line(
                &item.name,
                &item.emission,
                &item.subtype,
                qty,
                unit_usd,
                unit_bs,
            ));
        }
    }

    // 2. Greedily repack each bucket into the largest discounted packs.
    for (key, total_units) in consumption {
        let candidates = collect_candidates(&key, packs, book);
        let mut remaining = total_units;

        for cand in &candidates {
            if remaining >= cand.units {
                let count = remaining / cand.units;
                remaining %= cand.units;

                total_usd += cand.price_usd * count as i64;
                total_bs += cand.price_bs * count as i64;
                details.push(format!("{} {}{}", count, cand.name, plural(count)));
                optimized_items.push(priced_line(
                    &key.product,
                    &cand.name,
                    &key.subtype,
                    count,
                    cand.price_usd,
                    cand.price_bs,
                ));
            }
        }

        // 3. Leftover loose units at the local unit price.
        if remaining > 0 {
            let unit_usd = book.usd(&key.product, UNIT_EMISSION, &key.subtype, PriceTier::Local);
            let unit_bs = book.bs(&key.product, UNIT_EMISSION, &key.subtype, PriceTier::Local);

            total_usd += unit_usd * remaining as i64;
            total_bs += unit_bs * remaining as i64;
            optimized_items.push(priced_line(
                &key.product,
                UNIT_EMISSION,
                &key.subtype,
                remaining,
                unit_usd,
                unit_bs,
            ));
        }
    }

    OrderTotals {
        total_usd,
        total_bs,
        details,
        optimized_items,
    }
}

/// Builds the surviving candidate list for one bucket, largest first.
///
/// Candidate names are the builtin defaults (`Caja`, `Media Caja`,
/// plus `Six Pack` for can subtypes) merged with every catalog-defined
/// emission. A candidate survives only as a real multi-unit discount
/// pack: more than one unit per pack AND a positive local-tier price.
fn collect_candidates(key: &StockKey, packs: &PackCatalog, book: &PriceBook) -> Vec<Candidate> {
    let is_can = key.subtype.to_lowercase().contains("lata");

    let mut names: Vec<String> = vec![CASE_EMISSION.to_string(), HALF_CASE_EMISSION.to_string()];
    if is_can {
        names.push(SIX_PACK_EMISSION.to_string());
    }
    for name in packs.emission_names() {
        if !names.iter().any(|n| n == name) {
            names.push(name.clone());
        }
    }

    let mut candidates = Vec::new();
    for name in names {
        let units = packs.units_per(&name, &key.subtype);
        let price_usd = book.usd(&key.product, &name, &key.subtype, PriceTier::Local);

        if units > 1 && price_usd.is_positive() {
            let price_bs = book.bs(&key.product, &name, &key.subtype, PriceTier::Local);
            candidates.push(Candidate {
                name,
                units,
                price_usd,
                price_bs,
            });
        }
    }

    // Stable sort keeps catalog iteration order between equal sizes.
    candidates.sort_by(|a, b| b.units.cmp(&a.units));
    candidates
}

/// Builds one priced output line. Output lines are always `Normal`:
/// the mix has been pinned to concrete products by this point.
fn priced_line(
    product: &str,
    emission: &str,
    subtype: &str,
    quantity: u32,
    unit_usd: Money,
    unit_bs: Bolivars,
) -> OrderItem {
    let mut line = OrderItem::new(product, Variety::Normal, emission, subtype, quantity);
    line.unit_price_usd = Some(unit_usd);
    line.unit_price_bs = Some(unit_bs);
    line.total_price_usd = Some(unit_usd * quantity as i64);
    line.total_price_bs = Some(unit_bs * quantity as i64);
    line
}

fn plural(count: u32) -> &'static str {
    if count > 1 {
        "s"
    } else {
        ""
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::ExchangeRate;
    use crate::types::{EmissionDef, OPEN_TAB_EMISSION};

    fn emission(name: &str, units: u32) -> EmissionDef {
        EmissionDef {
            id: format!("em-{}", name),
            name: name.to_string(),
            units,
        }
    }

    /// Pilsen bottle catalog from the canonical repacking example:
    /// Caja = 36 units @ $30 local, Media Caja = 18 @ $16, Unidad $1.
    fn pilsen_fixture() -> (PackCatalog, PriceBook) {
        let packs = PackCatalog::new(vec![
            emission(UNIT_EMISSION, 1),
            emission(CASE_EMISSION, 36),
            emission(HALF_CASE_EMISSION, 18),
        ]);

        let mut book = PriceBook::new();
        book.set_price("Polar Pilsen", CASE_EMISSION, "Botella", PriceTier::Local, Money::from_cents(3000));
        book.set_price("Polar Pilsen", HALF_CASE_EMISSION, "Botella", PriceTier::Local, Money::from_cents(1600));
        book.set_price("Polar Pilsen", UNIT_EMISSION, "Botella", PriceTier::Local, Money::from_cents(100));
        (packs, book)
    }

    fn consumption_item(product: &str, subtype: &str, units: usize) -> OrderItem {
        let mut item = OrderItem::open_consumption();
        item.subtype = subtype.to_string();
        item.slots = vec![Some(product.to_string()); units];
        item
    }

    #[test]
    fn test_greedy_repacking_case_half_case_and_loose_units() {
        let (packs, book) = pilsen_fixture();
        let items = vec![consumption_item("Polar Pilsen", "Botella", 59)];

        let totals = calculate_order_total(&items, OrderType::Local, &packs, &book);

        // 1 Caja ($30) + 1 Media Caja ($16) + 5 Unidad ($5) = $51.
        assert_eq!(totals.total_usd.cents(), 5100);
        assert_eq!(totals.optimized_items.len(), 3);

        let caja = &totals.optimized_items[0];
        assert_eq!((caja.emission.as_str(), caja.quantity), (CASE_EMISSION, 1));
        assert_eq!(caja.total_price_usd.unwrap().cents(), 3000);
        assert_eq!(caja.variety, Variety::Normal);

        let media = &totals.optimized_items[1];
        assert_eq!((media.emission.as_str(), media.quantity), (HALF_CASE_EMISSION, 1));
        assert_eq!(media.total_price_usd.unwrap().cents(), 1600);

        let unidad = &totals.optimized_items[2];
        assert_eq!((unidad.emission.as_str(), unidad.quantity), (UNIT_EMISSION, 5));
        assert_eq!(unidad.total_price_usd.unwrap().cents(), 500);

        assert_eq!(totals.details, vec!["1 Caja", "1 Media Caja"]);
    }

    #[test]
    fn test_half_case_skipped_when_remainder_is_smaller() {
        let (packs, book) = pilsen_fixture();
        let items = vec![consumption_item("Polar Pilsen", "Botella", 41)];

        let totals = calculate_order_total(&items, OrderType::Local, &packs, &book);

        // 41 = 1 Caja (36) + 5 loose; Media Caja (18) never fits.
        assert_eq!(totals.total_usd.cents(), 3500);
        assert_eq!(totals.optimized_items.len(), 2);
        assert_eq!(totals.optimized_items[1].emission, UNIT_EMISSION);
        assert_eq!(totals.optimized_items[1].quantity, 5);
        assert_eq!(totals.details, vec!["1 Caja"]);
    }

    #[test]
    fn test_exact_fit_leaves_no_remainder_line() {
        let (packs, book) = pilsen_fixture();
        let items = vec![consumption_item("Polar Pilsen", "Botella", 54)];

        let totals = calculate_order_total(&items, OrderType::Local, &packs, &book);

        // 1 Caja + 1 Media Caja, no Unidad line.
        assert_eq!(totals.total_usd.cents(), 4600);
        assert_eq!(totals.optimized_items.len(), 2);
    }

    #[test]
    fn test_unpriced_pack_is_skipped() {
        let (packs, mut book) = pilsen_fixture();
        // Remove the Caja discount: only Media Caja survives.
        book.set_price("Polar Pilsen", CASE_EMISSION, "Botella", PriceTier::Local, Money::zero());
        let items = vec![consumption_item("Polar Pilsen", "Botella", 40)];

        let totals = calculate_order_total(&items, OrderType::Local, &packs, &book);

        // 2 Media Caja ($32) + 4 Unidad ($4).
        assert_eq!(totals.total_usd.cents(), 3600);
        assert_eq!(totals.optimized_items[0].emission, HALF_CASE_EMISSION);
        assert_eq!(totals.optimized_items[0].quantity, 2);
    }

    #[test]
    fn test_single_unit_pack_is_never_a_candidate() {
        let mut packs = PackCatalog::new(vec![emission("Suelto", 1)]);
        packs.set_conversion("Suelto", "Botella", 1);

        let mut book = PriceBook::new();
        // Priced, but one unit per pack: must not be chosen.
        book.set_price("Polar Pilsen", "Suelto", "Botella", PriceTier::Local, Money::from_cents(90));
        book.set_price("Polar Pilsen", UNIT_EMISSION, "Botella", PriceTier::Local, Money::from_cents(100));

        let items = vec![consumption_item("Polar Pilsen", "Botella", 3)];
        let totals = calculate_order_total(&items, OrderType::Local, &packs, &book);

        assert_eq!(totals.optimized_items.len(), 1);
        assert_eq!(totals.optimized_items[0].emission, UNIT_EMISSION);
        assert_eq!(totals.total_usd.cents(), 300);
    }

    #[test]
    fn test_six_pack_candidate_only_for_can_subtypes() {
        // Six Pack is not a catalog emission; it only enters via the
        // can-subtype default and a conversion override.
        let mut packs = PackCatalog::new(vec![]);
        packs.set_conversion(SIX_PACK_EMISSION, "Lata Grande", 6);
        packs.set_conversion(SIX_PACK_EMISSION, "Botella", 6);

        let mut book = PriceBook::new();
        for subtype in ["Lata Grande", "Botella"] {
            book.set_price("Polar Light", SIX_PACK_EMISSION, subtype, PriceTier::Local, Money::from_cents(550));
            book.set_price("Polar Light", UNIT_EMISSION, subtype, PriceTier::Local, Money::from_cents(100));
        }

        let cans = vec![consumption_item("Polar Light", "Lata Grande", 6)];
        let bottles = vec![consumption_item("Polar Light", "Botella", 6)];

        let can_totals = calculate_order_total(&cans, OrderType::Local, &packs, &book);
        assert_eq!(can_totals.optimized_items[0].emission, SIX_PACK_EMISSION);
        assert_eq!(can_totals.total_usd.cents(), 550);

        // Bottles never see the Six Pack default: six loose units.
        let bottle_totals = calculate_order_total(&bottles, OrderType::Local, &packs, &book);
        assert_eq!(bottle_totals.optimized_items[0].emission, UNIT_EMISSION);
        assert_eq!(bottle_totals.total_usd.cents(), 600);
    }

    #[test]
    fn test_slots_across_items_share_buckets() {
        let (packs, book) = pilsen_fixture();
        let items = vec![
            consumption_item("Polar Pilsen", "Botella", 20),
            consumption_item("Polar Pilsen", "Botella", 16),
        ];

        let totals = calculate_order_total(&items, OrderType::Local, &packs, &book);

        // 36 total units across both items: exactly one Caja.
        assert_eq!(totals.total_usd.cents(), 3000);
        assert_eq!(totals.optimized_items.len(), 1);
    }

    #[test]
    fn test_mixed_slots_split_into_buckets_in_first_seen_order() {
        let (packs, mut book) = pilsen_fixture();
        book.set_price("Solera Verde", UNIT_EMISSION, "Botella", PriceTier::Local, Money::from_cents(150));

        let mut item = OrderItem::open_consumption();
        item.slots = vec![
            Some("Polar Pilsen".to_string()),
            Some("Solera Verde".to_string()),
            Some("Polar Pilsen".to_string()),
        ];

        let totals = calculate_order_total(&[item], OrderType::Local, &packs, &book);

        assert_eq!(totals.optimized_items.len(), 2);
        assert_eq!(totals.optimized_items[0].name, "Polar Pilsen");
        assert_eq!(totals.optimized_items[0].quantity, 2);
        assert_eq!(totals.optimized_items[1].name, "Solera Verde");
        assert_eq!(totals.total_usd.cents(), 350);
    }

    #[test]
    fn test_unfilled_standard_item_priced_at_own_pack() {
        let (packs, mut book) = pilsen_fixture();
        book.set_price("Polar Pilsen", CASE_EMISSION, "Botella", PriceTier::Standard, Money::from_cents(3600));

        let item = OrderItem::new("Polar Pilsen", Variety::Normal, CASE_EMISSION, "Botella", 2);
        let totals = calculate_order_total(&[item], OrderType::Local, &packs, &book);

        // Local tier exists for Caja ($30), so it wins over standard.
        assert_eq!(totals.total_usd.cents(), 6000);
        assert_eq!(totals.optimized_items.len(), 1);
        assert_eq!(totals.optimized_items[0].quantity, 2);
        assert_eq!(totals.details, vec!["2 Cajas"]);
    }

    #[test]
    fn test_unfilled_standard_item_falls_back_to_standard_tier() {
        let packs = PackCatalog::new(vec![emission(CASE_EMISSION, 36)]);
        let mut book = PriceBook::new();
        book.set_price("Solera Azul", CASE_EMISSION, "Botella", PriceTier::Standard, Money::from_cents(4000));

        let item = OrderItem::new("Solera Azul", Variety::Normal, CASE_EMISSION, "Botella", 1);
        let totals = calculate_order_total(&[item], OrderType::Local, &packs, &book);

        assert_eq!(totals.total_usd.cents(), 4000);
    }

    #[test]
    fn test_take_away_flat_pricing() {
        let packs = PackCatalog::new(vec![emission(CASE_EMISSION, 36)]);
        let mut book = PriceBook::new();
        book.set_exchange_rate(ExchangeRate::new(36.0));
        book.set_price("Polar Pilsen", CASE_EMISSION, "Botella", PriceTier::Standard, Money::from_cents(3600));

        let item = OrderItem::new("Polar Pilsen", Variety::Normal, CASE_EMISSION, "Botella", 2);
        let totals = calculate_order_total(&[item.clone()], OrderType::Llevar, &packs, &book);

        assert_eq!(totals.total_usd.cents(), 7200);
        assert_eq!(totals.total_bs.cents(), 7200 * 36);
        // Identity copy, not a repacked line.
        assert_eq!(totals.optimized_items.len(), 1);
        assert_eq!(totals.optimized_items[0].id, item.id);
        assert!(totals.details.is_empty());
    }

    #[test]
    fn test_take_away_composition_box_uses_stored_price() {
        let packs = PackCatalog::new(vec![]);
        let book = PriceBook::new();

        let mut boxed = OrderItem::new("Caja Variada", Variety::Variado, CASE_EMISSION, "Botella", 2);
        boxed.composition = Some(
            [("Polar Pilsen".to_string(), 20u32), ("Solera Verde".to_string(), 16u32)]
                .into_iter()
                .collect(),
        );
        boxed.unit_price_usd = Some(Money::from_cents(3200));
        boxed.unit_price_bs = Some(Bolivars::from_cents(115_200));

        let totals = calculate_order_total(&[boxed], OrderType::Llevar, &packs, &book);

        assert_eq!(totals.total_usd.cents(), 6400);
        assert_eq!(totals.total_bs.cents(), 230_400);
    }

    #[test]
    fn test_open_tab_item_with_no_slots_prices_nothing() {
        let (packs, book) = pilsen_fixture();
        let mut item = OrderItem::open_consumption();
        item.emission = OPEN_TAB_EMISSION.to_string();

        let totals = calculate_order_total(&[item], OrderType::Local, &packs, &book);

        assert!(totals.total_usd.is_zero());
        assert!(totals.optimized_items.is_empty());
    }
}
