//! # Validation Module
//!
//! Input validation at the engine boundary.
//!
//! These run before any business logic: a caller that hands over a
//! thousand-pack item or a kilobyte customer name is stopped here,
//! without touching stock or order state.

use crate::error::ValidationError;
use crate::{MAX_CUSTOMER_NAME_LEN, MAX_ITEM_QUANTITY, MAX_PRODUCT_NAME_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a customer name.
///
/// Empty names are allowed — the engine substitutes its default
/// ("Cliente" / "Venta Directa") — but oversized input is rejected.
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    if name.trim().len() > MAX_CUSTOMER_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "customerName".to_string(),
            max: MAX_CUSTOMER_NAME_LEN,
        });
    }
    Ok(())
}

/// Validates a product name.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > MAX_PRODUCT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_PRODUCT_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a pack quantity (after the engine's zero→one
/// normalization).
pub fn validate_quantity(quantity: u32) -> ValidationResult<()> {
    if quantity == 0 || quantity as i64 > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_name_allows_empty() {
        assert!(validate_customer_name("").is_ok());
        assert!(validate_customer_name("Juan Perez").is_ok());
    }

    #[test]
    fn test_customer_name_rejects_oversized() {
        let long = "x".repeat(MAX_CUSTOMER_NAME_LEN + 1);
        assert!(validate_customer_name(&long).is_err());
    }

    #[test]
    fn test_product_name_required() {
        assert!(validate_product_name("Polar Pilsen").is_ok());
        assert!(validate_product_name("  ").is_err());
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(1000).is_err());
    }
}
