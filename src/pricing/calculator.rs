//! Unit price computation
//!
//! `(price / quantity) / conversion_factor(unit)`, rounded to cents and
//! expressed in the display unit of the unit's family.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::PriceError;
use super::parser::PriceExpression;
use super::units::{CanonicalUnit, UnitTable};

/// A computed price per display unit
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UnitPrice {
    /// Rounded to 2 fractional digits
    pub value: f64,
    pub display_unit: CanonicalUnit,
    /// Unit the price was stated in
    pub source_unit: CanonicalUnit,
}

impl UnitPrice {
    /// Conversion was a no-op: the price was already per display unit
    pub fn is_redundant(&self) -> bool {
        self.source_unit == self.display_unit
    }

    /// Badge text, e.g. `" ($6.65/lb)"`
    pub fn badge_text(&self) -> String {
        format!(" (${:.2}/{})", self.value, self.display_unit)
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Stateless calculator over a unit table
#[derive(Debug, Clone)]
pub struct PriceCalculator {
    table: Arc<UnitTable>,
}

impl PriceCalculator {
    pub fn new(table: Arc<UnitTable>) -> Self {
        Self { table }
    }

    /// Price per display unit. Re-validates the unit against the table and
    /// reports `UnknownUnit` instead of producing a meaningless number.
    pub fn compute(&self, price: f64, quantity: f64, unit: CanonicalUnit) -> Result<UnitPrice, PriceError> {
        let factor = self.table.conversion_factor(unit)?;
        let family = self.table.family(unit)?;
        if !(quantity.is_finite() && quantity > 0.0) {
            return Err(PriceError::NoMatch);
        }

        Ok(UnitPrice {
            value: round_cents((price / quantity) / factor),
            display_unit: family.display_unit(),
            source_unit: unit,
        })
    }

    pub fn compute_expression(&self, expr: &PriceExpression) -> Result<UnitPrice, PriceError> {
        self.compute(expr.price, expr.quantity, expr.unit)
    }
}

// ==================== TESTS ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::units::UnitFamily;

    fn calculator() -> PriceCalculator {
        PriceCalculator::new(Arc::new(UnitTable::standard()))
    }

    #[test]
    fn test_ounce_rate_to_pound() {
        let result = calculator().compute(0.25, 1.0, CanonicalUnit::Ounce).unwrap();
        assert_eq!(result.value, 4.00);
        assert_eq!(result.display_unit, CanonicalUnit::Pound);
        assert_eq!(result.badge_text(), " ($4.00/lb)");
    }

    #[test]
    fn test_composite_ounces() {
        let result = calculator().compute(4.99, 12.0, CanonicalUnit::Ounce).unwrap();
        assert_eq!(result.value, 6.65);
        assert_eq!(result.badge_text(), " ($6.65/lb)");
    }

    #[test]
    fn test_liquid_goes_to_liter() {
        let result = calculator().compute(3.79, 1.0, CanonicalUnit::Gallon).unwrap();
        assert_eq!(result.display_unit, CanonicalUnit::Liter);
        assert_eq!(result.value, 1.00);
        assert_eq!(result.badge_text(), " ($1.00/liter)");
    }

    #[test]
    fn test_count_goes_to_each() {
        let result = calculator().compute(5.0, 24.0, CanonicalUnit::Each).unwrap();
        assert_eq!(result.display_unit, CanonicalUnit::Each);
        assert_eq!(result.value, 0.21);
        assert!(result.is_redundant());
    }

    #[test]
    fn test_redundant_only_when_units_match() {
        let c = calculator();
        assert!(c.compute(2.0, 1.0, CanonicalUnit::Pound).unwrap().is_redundant());
        assert!(!c.compute(2.0, 1.0, CanonicalUnit::Kilogram).unwrap().is_redundant());
    }

    #[test]
    fn test_quantity_scale_invariance() {
        let c = calculator();
        for unit in CanonicalUnit::ALL {
            for k in [2.0, 3.0, 12.0, 0.5] {
                let base = c.compute(1.5, 1.0, unit).unwrap();
                let scaled = c.compute(1.5 * k, k, unit).unwrap();
                assert_eq!(base.value, scaled.value, "{} scaled by {}", unit, k);
            }
        }
    }

    #[test]
    fn test_display_unit_follows_family() {
        let table = UnitTable::standard();
        let c = calculator();
        for unit in CanonicalUnit::ALL {
            let result = c.compute(1.0, 1.0, unit).unwrap();
            assert_eq!(result.display_unit, table.family(unit).unwrap().display_unit());
        }
    }

    #[test]
    fn test_unknown_unit_is_an_error() {
        let table = UnitTable::with_units(&[(CanonicalUnit::Pound, 1.0, UnitFamily::Solid)]);
        let c = PriceCalculator::new(Arc::new(table));
        assert_eq!(
            c.compute(1.0, 1.0, CanonicalUnit::Ounce),
            Err(PriceError::UnknownUnit("oz".to_string()))
        );
    }
}
