//! # Pack Conversion
//!
//! Resolution of emission (pack) names into canonical units.
//!
//! ## Fallback Chain
//! ```text
//! units_per(emission, subtype)
//!     ├─ 1. "Unidad" / "Libre" / empty         → 1  (always, no override)
//!     ├─ 2. explicit conversion override        → configured units
//!     ├─ 3. emission definition                 → defined units
//!     ├─ 4. "Caja" heuristic by subtype name    → lata 24 / tercio 36 / 12
//!     └─ 5. default                             → 1
//! ```
//!
//! The chain is total: unknown inputs resolve to 1, never an error.
//! All stock arithmetic multiplies through this before touching the
//! ledger, so on-hand counts are always in single bottles/cans.

use crate::types::{EmissionDef, CASE_EMISSION, OPEN_TAB_EMISSION, UNIT_EMISSION};

/// Units-per-case heuristics for catalogs that never defined "Caja".
const CASE_UNITS_CAN: u32 = 24;
const CASE_UNITS_TERCIO: u32 = 36;
const CASE_UNITS_DEFAULT: u32 = 12;

// =============================================================================
// Pack Catalog
// =============================================================================

/// The pack-denomination side of the catalog: emission definitions,
/// the ordered emission-name list, and per-subtype conversion
/// overrides.
#[derive(Debug, Clone, Default)]
pub struct PackCatalog {
    emissions: Vec<EmissionDef>,
    /// Ordered names, `Unidad` first (display and candidate order).
    emission_names: Vec<String>,
    /// (emission, subtype) → units override.
    conversions: Vec<ConversionOverride>,
}

/// An explicit (emission, subtype) → units override.
#[derive(Debug, Clone)]
pub struct ConversionOverride {
    pub emission: String,
    pub subtype: String,
    pub units: u32,
}

impl PackCatalog {
    /// Builds a catalog from emission definitions, normalizing the
    /// name list so `Unidad` comes first.
    pub fn new(emissions: Vec<EmissionDef>) -> Self {
        let mut emission_names = vec![UNIT_EMISSION.to_string()];
        for def in &emissions {
            if def.name != UNIT_EMISSION && !emission_names.contains(&def.name) {
                emission_names.push(def.name.clone());
            }
        }
        PackCatalog {
            emissions,
            emission_names,
            conversions: Vec::new(),
        }
    }

    /// The fallback catalog when no emissions could be loaded.
    pub fn fallback() -> Self {
        PackCatalog {
            emissions: Vec::new(),
            emission_names: vec![UNIT_EMISSION.to_string(), CASE_EMISSION.to_string()],
            conversions: Vec::new(),
        }
    }

    /// Ordered emission names (`Unidad` first).
    pub fn emission_names(&self) -> &[String] {
        &self.emission_names
    }

    /// The raw emission definitions.
    pub fn emissions(&self) -> &[EmissionDef] {
        &self.emissions
    }

    /// Sets (or replaces) a per-subtype conversion override.
    pub fn set_conversion(
        &mut self,
        emission: impl Into<String>,
        subtype: impl Into<String>,
        units: u32,
    ) {
        let emission = emission.into();
        let subtype = subtype.into();
        if let Some(existing) = self
            .conversions
            .iter_mut()
            .find(|c| c.emission == emission && c.subtype == subtype)
        {
            existing.units = units;
        } else {
            self.conversions.push(ConversionOverride {
                emission,
                subtype,
                units,
            });
        }
    }

    /// Looks up an explicit conversion override.
    pub fn conversion(&self, emission: &str, subtype: &str) -> Option<u32> {
        self.conversions
            .iter()
            .find(|c| c.emission == emission && c.subtype == subtype)
            .map(|c| c.units)
    }

    /// Resolves an emission name to canonical units for a subtype.
    ///
    /// Pure and total; see the module-level fallback chain.
    pub fn units_per(&self, emission: &str, subtype: &str) -> u32 {
        // Single units and open tabs are always 1, overrides ignored.
        if emission.is_empty() || emission == UNIT_EMISSION || emission == OPEN_TAB_EMISSION {
            return 1;
        }

        if let Some(units) = self.conversion(emission, subtype) {
            return units;
        }

        if let Some(def) = self.emissions.iter().find(|e| e.name == emission) {
            if def.units > 0 {
                return def.units;
            }
        }

        if emission == CASE_EMISSION {
            let subtype_lower = subtype.to_lowercase();
            if subtype_lower.contains("lata") {
                return CASE_UNITS_CAN;
            }
            if subtype_lower.contains("tercio") {
                return CASE_UNITS_TERCIO;
            }
            return CASE_UNITS_DEFAULT;
        }

        1
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HALF_CASE_EMISSION;

    fn emission(name: &str, units: u32) -> EmissionDef {
        EmissionDef {
            id: format!("em-{}", name),
            name: name.to_string(),
            units,
        }
    }

    #[test]
    fn test_unidad_and_libre_are_always_one() {
        let mut packs = PackCatalog::new(vec![emission("Unidad", 1)]);
        packs.set_conversion(UNIT_EMISSION, "Botella", 12);
        packs.set_conversion(OPEN_TAB_EMISSION, "Botella", 12);

        assert_eq!(packs.units_per(UNIT_EMISSION, "Botella"), 1);
        assert_eq!(packs.units_per(OPEN_TAB_EMISSION, "Botella"), 1);
        assert_eq!(packs.units_per("", "Botella"), 1);
    }

    #[test]
    fn test_override_beats_definition() {
        let mut packs = PackCatalog::new(vec![emission("Caja", 12)]);
        packs.set_conversion("Caja", "Botella Tercio", 36);

        assert_eq!(packs.units_per("Caja", "Botella Tercio"), 36);
        assert_eq!(packs.units_per("Caja", "Botella"), 12);
    }

    #[test]
    fn test_definition_beats_heuristic() {
        let packs = PackCatalog::new(vec![emission("Caja", 30)]);
        assert_eq!(packs.units_per("Caja", "Lata Grande"), 30);
    }

    #[test]
    fn test_case_heuristics_by_subtype() {
        let packs = PackCatalog::new(vec![]);
        assert_eq!(packs.units_per("Caja", "Lata Pequeña"), 24);
        assert_eq!(packs.units_per("Caja", "lata grande"), 24);
        assert_eq!(packs.units_per("Caja", "Botella Tercio"), 36);
        assert_eq!(packs.units_per("Caja", "Botella"), 12);
    }

    #[test]
    fn test_unknown_emission_defaults_to_one() {
        let packs = PackCatalog::new(vec![]);
        assert_eq!(packs.units_per("Growler", "Botella"), 1);
    }

    #[test]
    fn test_zero_unit_definition_falls_through() {
        // units = 0 means "not specified" — the Caja heuristic applies.
        let packs = PackCatalog::new(vec![emission("Caja", 0)]);
        assert_eq!(packs.units_per("Caja", "Botella"), 12);
    }

    #[test]
    fn test_emission_names_put_unidad_first() {
        let packs = PackCatalog::new(vec![
            emission("Caja", 36),
            emission(HALF_CASE_EMISSION, 18),
            emission("Unidad", 1),
        ]);
        assert_eq!(packs.emission_names()[0], UNIT_EMISSION);
        assert_eq!(packs.emission_names().len(), 3);
    }
}
