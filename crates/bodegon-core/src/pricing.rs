//! # Price Book
//!
//! In-memory mirror of the catalog's price tables, keyed by typed
//! composite keys. Price CRUD lives with the catalog collaborator; the
//! book is what the optimizer and engine read.
//!
//! Missing entries resolve to zero, never an error — the optimizer
//! treats a zero local price as "no discount pack defined" and the
//! take-away path prices the line at zero exactly like the original
//! tables would.

use std::collections::HashMap;

use crate::money::{Bolivars, ExchangeRate, Money};
use crate::types::{PriceKey, PriceTier};

/// Tiered price table plus the exchange rate used to derive Bs prices.
#[derive(Debug, Clone, Default)]
pub struct PriceBook {
    prices: HashMap<PriceKey, Money>,
    rate: ExchangeRate,
}

impl PriceBook {
    pub fn new() -> Self {
        PriceBook::default()
    }

    /// Sets a price for (product, emission, subtype, tier).
    pub fn set_price(
        &mut self,
        product: impl Into<String>,
        emission: impl Into<String>,
        subtype: impl Into<String>,
        tier: PriceTier,
        price: Money,
    ) {
        self.prices
            .insert(PriceKey::new(product, emission, subtype, tier), price);
    }

    /// USD price lookup. Missing entries are zero.
    pub fn usd(&self, product: &str, emission: &str, subtype: &str, tier: PriceTier) -> Money {
        self.prices
            .get(&PriceKey::new(product, emission, subtype, tier))
            .copied()
            .unwrap_or_else(Money::zero)
    }

    /// Bs price lookup: the USD price converted at the current rate.
    pub fn bs(&self, product: &str, emission: &str, subtype: &str, tier: PriceTier) -> Bolivars {
        self.usd(product, emission, subtype, tier).to_bs(self.rate)
    }

    pub fn set_exchange_rate(&mut self, rate: ExchangeRate) {
        self.rate = rate;
    }

    pub fn exchange_rate(&self) -> ExchangeRate {
        self.rate
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiered_lookup() {
        let mut book = PriceBook::new();
        book.set_price(
            "Polar Pilsen",
            "Caja",
            "Botella",
            PriceTier::Standard,
            Money::from_cents(3600),
        );
        book.set_price(
            "Polar Pilsen",
            "Caja",
            "Botella",
            PriceTier::Local,
            Money::from_cents(3000),
        );

        assert_eq!(
            book.usd("Polar Pilsen", "Caja", "Botella", PriceTier::Standard).cents(),
            3600
        );
        assert_eq!(
            book.usd("Polar Pilsen", "Caja", "Botella", PriceTier::Local).cents(),
            3000
        );
    }

    #[test]
    fn test_missing_price_is_zero() {
        let book = PriceBook::new();
        assert!(book.usd("Solera Verde", "Caja", "Botella", PriceTier::Local).is_zero());
    }

    #[test]
    fn test_bs_price_follows_rate() {
        let mut book = PriceBook::new();
        book.set_price(
            "Polar Pilsen",
            "Unidad",
            "Botella",
            PriceTier::Local,
            Money::from_cents(100),
        );

        // No rate set: Bs price is zero.
        assert!(book.bs("Polar Pilsen", "Unidad", "Botella", PriceTier::Local).is_zero());

        book.set_exchange_rate(ExchangeRate::new(36.0));
        assert_eq!(
            book.bs("Polar Pilsen", "Unidad", "Botella", PriceTier::Local).cents(),
            3600
        );
    }
}
