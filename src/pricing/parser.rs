//! PriceCortex - price/quantity expression recognition via Regex
//!
//! Two independent recognizers:
//! - Explicit rate: a single price already stated per unit, which must span
//!   the whole candidate text ("$0.25/oz", "25¢ per pound", "3 dollars / lb")
//! - Composite: a currency amount and a quantity+unit found anywhere in the
//!   text, in either order ("$4.99 for 12 oz", "12 oz - $4.99")
//!
//! Unit tokens go through the unit table's synonym resolution; a token the
//! pattern admits but the table does not know is rejected.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::PriceError;
use super::units::{CanonicalUnit, CurrencyScale, Resolution, UnitTable};

/// Unit spellings the recognizers accept, before synonym resolution.
/// Alternation order matters: longer forms that share a prefix come after
/// the short form only when the short form cannot end at a word boundary.
const UNIT_PATTERN: &str = r"fl\.?\s*oz|oz|ounce|pi?n?t|qr?t|quart|gal|gall?on|li?ter|litre|ltr|gra?m|kg|kilogram|lb|pound|count|ct|cnt|each";

// ==================== TYPE DEFINITIONS ====================

/// Which recognizer produced an expression
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionKind {
    ExplicitRate,
    Composite,
}

/// A recognized price expression. Only constructed with price > 0 and quantity > 0.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PriceExpression {
    pub kind: ExpressionKind,
    /// Price in base currency
    pub price: f64,
    /// Quantity of `unit` the price buys; 1 for explicit rates
    pub quantity: f64,
    pub unit: CanonicalUnit,
    /// Exact matched text (the whole rate, or the currency amount for composites)
    pub source: String,
    /// The price digits as written, used to find the text node holding the price
    pub price_literal: String,
}

impl PriceExpression {
    pub fn new(
        kind: ExpressionKind,
        price: f64,
        quantity: f64,
        unit: CanonicalUnit,
        source: &str,
        price_literal: &str,
    ) -> Option<Self> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(price) || !valid(quantity) {
            return None;
        }
        Some(Self {
            kind,
            price,
            quantity,
            unit,
            source: source.to_string(),
            price_literal: price_literal.to_string(),
        })
    }
}

// ==================== MAIN IMPLEMENTATION ====================

/// Price expression recognizer
#[derive(Debug, Clone)]
pub struct PriceCortex {
    table: Arc<UnitTable>,
    // "$0.25/oz", anchored at both ends
    explicit_rate_re: Regex,
    // "$4.99"
    price_re: Regex,
    // "12 oz", "1.5 gallons"
    quantity_re: Regex,
}

impl PriceCortex {
    /// Compile the recognizers against a unit table
    pub fn new(table: Arc<UnitTable>) -> Result<Self, PriceError> {
        // Group 1: amount, Group 2: optional currency word, Group 3: unit
        let explicit_rate_re = Regex::new(&format!(
            r"(?i)^\$?\s*(\d+(?:\.\d+)?)\s*(c|cents?|¢|dollars?)?\s*(?:per|/|\\)\s*({})s?$",
            UNIT_PATTERN
        ))?;

        // Group 1: amount
        let price_re = Regex::new(r"\$\s*(\d+(?:\.\d+)?)")?;

        // Group 1: quantity, Group 2: unit
        let quantity_re = Regex::new(&format!(
            r"(?i)(\d+(?:\.\d+)?)\s*({})s?\b",
            UNIT_PATTERN
        ))?;

        Ok(Self {
            table,
            explicit_rate_re,
            price_re,
            quantity_re,
        })
    }

    pub fn table(&self) -> &UnitTable {
        &self.table
    }

    /// Match an explicit per-unit price that makes up the entire text
    /// (surrounding whitespace aside). Quantity is always 1.
    pub fn parse_explicit_rate(&self, text: &str) -> Result<PriceExpression, PriceError> {
        let candidate = text.trim();
        let caps = self
            .explicit_rate_re
            .captures(candidate)
            .ok_or(PriceError::NoMatch)?;

        let literal = caps.get(1).ok_or(PriceError::NoMatch)?.as_str();
        let amount: f64 = literal.parse().map_err(|_| PriceError::NoMatch)?;

        let scale = match caps.get(2) {
            None => CurrencyScale::Base,
            Some(word) => match self.table.resolve(word.as_str()) {
                Resolution::Currency(scale) => scale,
                _ => return Err(PriceError::NoMatch),
            },
        };

        let unit_token = caps.get(3).ok_or(PriceError::NoMatch)?.as_str();
        let unit = self.table.lookup_unit(unit_token)?;

        PriceExpression::new(
            ExpressionKind::ExplicitRate,
            scale.to_base(amount),
            1.0,
            unit,
            candidate,
            literal,
        )
        .ok_or(PriceError::NoMatch)
    }

    /// Match a currency amount and a quantity+unit anywhere in the text.
    /// Both must be present; their order is irrelevant. A quantity that
    /// starts inside the currency amount is not a quantity.
    pub fn parse_composite(&self, text: &str) -> Result<PriceExpression, PriceError> {
        let price_caps = self.price_re.captures(text).ok_or(PriceError::NoMatch)?;
        let price_match = price_caps.get(0).ok_or(PriceError::NoMatch)?;

        // The price's own digits never count as the quantity ("$3.99 lb")
        let quantity_caps = self
            .quantity_re
            .captures_iter(text)
            .find(|caps| {
                caps.get(0)
                    .map_or(false, |m| !price_match.range().contains(&m.start()))
            })
            .ok_or(PriceError::NoMatch)?;

        let source = price_match.as_str();
        let literal = price_caps.get(1).ok_or(PriceError::NoMatch)?.as_str();
        let price: f64 = literal.parse().map_err(|_| PriceError::NoMatch)?;

        let quantity: f64 = quantity_caps
            .get(1)
            .ok_or(PriceError::NoMatch)?
            .as_str()
            .parse()
            .map_err(|_| PriceError::NoMatch)?;
        let unit_token = quantity_caps.get(2).ok_or(PriceError::NoMatch)?.as_str();
        let unit = self.table.lookup_unit(unit_token)?;

        PriceExpression::new(ExpressionKind::Composite, price, quantity, unit, source, literal)
            .ok_or(PriceError::NoMatch)
    }

    /// Explicit rate first, then composite
    pub fn parse(&self, text: &str) -> Result<PriceExpression, PriceError> {
        match self.parse_explicit_rate(text) {
            Ok(expr) => Ok(expr),
            Err(_) => self.parse_composite(text),
        }
    }
}

// ==================== TESTS ====================

#[cfg(test)]
mod tests {
    use super::*;

    fn cortex() -> PriceCortex {
        PriceCortex::new(Arc::new(UnitTable::standard())).unwrap()
    }

    #[test]
    fn test_explicit_rate_slash() {
        let expr = cortex().parse_explicit_rate("$0.25/oz").unwrap();
        assert_eq!(expr.kind, ExpressionKind::ExplicitRate);
        assert_eq!(expr.price, 0.25);
        assert_eq!(expr.quantity, 1.0);
        assert_eq!(expr.unit, CanonicalUnit::Ounce);
        assert_eq!(expr.source, "$0.25/oz");
        assert_eq!(expr.price_literal, "0.25");
    }

    #[test]
    fn test_explicit_rate_cents_per_word() {
        let expr = cortex().parse_explicit_rate("25¢ per pound").unwrap();
        assert!((expr.price - 0.25).abs() < 1e-12);
        assert_eq!(expr.unit, CanonicalUnit::Pound);

        let expr = cortex().parse_explicit_rate("12 Cents Per Ounce").unwrap();
        assert!((expr.price - 0.12).abs() < 1e-12);
        assert_eq!(expr.unit, CanonicalUnit::Ounce);

        let expr = cortex().parse_explicit_rate("40c/ct").unwrap();
        assert!((expr.price - 0.40).abs() < 1e-12);
        assert_eq!(expr.unit, CanonicalUnit::Each);
    }

    #[test]
    fn test_explicit_rate_dollar_word_is_unscaled() {
        let expr = cortex().parse_explicit_rate("3 dollars / lb").unwrap();
        assert_eq!(expr.price, 3.0);
        assert_eq!(expr.unit, CanonicalUnit::Pound);
    }

    #[test]
    fn test_explicit_rate_requires_full_text() {
        let c = cortex();
        assert_eq!(c.parse_explicit_rate("$0.25/oz, save 10%"), Err(PriceError::NoMatch));
        assert_eq!(c.parse_explicit_rate("only $0.25/oz"), Err(PriceError::NoMatch));
        // Surrounding whitespace is not content
        assert!(c.parse_explicit_rate("\n  $0.25/oz  ").is_ok());
    }

    #[test]
    fn test_explicit_rate_rejects_unrelated_numbers() {
        assert_eq!(
            cortex().parse_explicit_rate("order within 25 per week"),
            Err(PriceError::NoMatch)
        );
        assert_eq!(cortex().parse_explicit_rate("ships 25 per week"), Err(PriceError::NoMatch));
    }

    #[test]
    fn test_explicit_rate_unknown_unit_token() {
        // "pit" fits the pint spelling pattern but is not a unit
        assert_eq!(
            cortex().parse_explicit_rate("$2 per pit"),
            Err(PriceError::UnknownUnit("pit".to_string()))
        );
    }

    #[test]
    fn test_explicit_rate_zero_price_discarded() {
        assert_eq!(cortex().parse_explicit_rate("$0.00/oz"), Err(PriceError::NoMatch));
    }

    #[test]
    fn test_composite_price_then_quantity() {
        let expr = cortex().parse_composite("$4.99 for 12 oz").unwrap();
        assert_eq!(expr.kind, ExpressionKind::Composite);
        assert_eq!(expr.price, 4.99);
        assert_eq!(expr.quantity, 12.0);
        assert_eq!(expr.unit, CanonicalUnit::Ounce);
        assert_eq!(expr.source, "$4.99");
        assert_eq!(expr.price_literal, "4.99");
    }

    #[test]
    fn test_composite_quantity_then_price() {
        let expr = cortex().parse_composite("Orange Juice 1.5 Gallons - $ 6.49").unwrap();
        assert_eq!(expr.price, 6.49);
        assert_eq!(expr.quantity, 1.5);
        assert_eq!(expr.unit, CanonicalUnit::Gallon);
    }

    #[test]
    fn test_composite_synonyms() {
        let c = cortex();
        assert_eq!(c.parse_composite("$3 for 2 lbs").unwrap().unit, CanonicalUnit::Pound);
        assert_eq!(c.parse_composite("$3, 16 fl oz").unwrap().unit, CanonicalUnit::FluidOunce);
        assert_eq!(c.parse_composite("$3, 16 fl. oz").unwrap().unit, CanonicalUnit::FluidOunce);
        assert_eq!(c.parse_composite("$5 (24 count)").unwrap().unit, CanonicalUnit::Each);
        assert_eq!(c.parse_composite("$5 500 grams").unwrap().unit, CanonicalUnit::Gram);
        assert_eq!(c.parse_composite("$5 2 litre").unwrap().unit, CanonicalUnit::Liter);
    }

    #[test]
    fn test_composite_needs_both_signals() {
        let c = cortex();
        assert_eq!(c.parse_composite("$4.99"), Err(PriceError::NoMatch));
        assert_eq!(c.parse_composite("12 oz"), Err(PriceError::NoMatch));
        assert_eq!(c.parse_composite("Add to cart"), Err(PriceError::NoMatch));
    }

    #[test]
    fn test_composite_quantity_not_taken_from_price() {
        let c = cortex();
        assert_eq!(c.parse_composite("Bananas $3.99 lb"), Err(PriceError::NoMatch));
        assert_eq!(c.parse_composite("$1.25 each"), Err(PriceError::NoMatch));

        let expr = c.parse_composite("$1.25 each, 6 ct").unwrap();
        assert_eq!(expr.quantity, 6.0);
        assert_eq!(expr.unit, CanonicalUnit::Each);
    }

    #[test]
    fn test_composite_unit_must_end_at_word_boundary() {
        assert_eq!(cortex().parse_composite("$4.99 12 ozzy"), Err(PriceError::NoMatch));
    }

    #[test]
    fn test_composite_unknown_unit_rejected() {
        assert_eq!(
            cortex().parse_composite("$3.00 for 2 pits"),
            Err(PriceError::UnknownUnit("pit".to_string()))
        );
    }

    #[test]
    fn test_composite_non_positive_discarded() {
        let c = cortex();
        assert_eq!(c.parse_composite("$0 for 12 oz"), Err(PriceError::NoMatch));
        assert_eq!(c.parse_composite("$4.99 for 0 oz"), Err(PriceError::NoMatch));
    }

    #[test]
    fn test_unit_missing_from_table_rejected() {
        use crate::pricing::units::UnitFamily;
        let table = UnitTable::with_units(&[(CanonicalUnit::Pound, 1.0, UnitFamily::Solid)]);
        let c = PriceCortex::new(Arc::new(table)).unwrap();
        assert!(c.parse_composite("$4.99 for 2 lb").is_ok());
        assert!(matches!(c.parse_composite("$4.99 for 12 oz"), Err(PriceError::UnknownUnit(_))));
    }

    #[test]
    fn test_parse_prefers_explicit_rate() {
        let expr = cortex().parse("$0.25/oz").unwrap();
        assert_eq!(expr.kind, ExpressionKind::ExplicitRate);
        let expr = cortex().parse("$4.99 for 12 oz").unwrap();
        assert_eq!(expr.kind, ExpressionKind::Composite);
    }
}
