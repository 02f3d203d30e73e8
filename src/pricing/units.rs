//! Unit Table - canonical units, families, conversion factors and synonyms
//!
//! Every canonical unit belongs to exactly one family, and every family has
//! one display unit that computed prices are expressed in:
//! - liquid → liter
//! - solid  → lb
//! - count  → each
//!
//! Conversion factors are "how many display units is one of this unit".

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::error::PriceError;

// ==================== TYPE DEFINITIONS ====================

/// Closed set of units the engine computes with
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CanonicalUnit {
    #[serde(rename = "fl oz")]
    FluidOunce,
    #[serde(rename = "pt")]
    Pint,
    #[serde(rename = "qt")]
    Quart,
    #[serde(rename = "gal")]
    Gallon,
    #[serde(rename = "liter")]
    Liter,
    #[serde(rename = "oz")]
    Ounce,
    #[serde(rename = "g")]
    Gram,
    #[serde(rename = "kg")]
    Kilogram,
    #[serde(rename = "lb")]
    Pound,
    #[serde(rename = "each")]
    Each,
}

impl CanonicalUnit {
    pub const ALL: [CanonicalUnit; 10] = [
        CanonicalUnit::FluidOunce,
        CanonicalUnit::Pint,
        CanonicalUnit::Quart,
        CanonicalUnit::Gallon,
        CanonicalUnit::Liter,
        CanonicalUnit::Ounce,
        CanonicalUnit::Gram,
        CanonicalUnit::Kilogram,
        CanonicalUnit::Pound,
        CanonicalUnit::Each,
    ];

    /// Abbreviation used in badges and as the canonical synonym key
    pub fn abbreviation(&self) -> &'static str {
        match self {
            CanonicalUnit::FluidOunce => "fl oz",
            CanonicalUnit::Pint => "pt",
            CanonicalUnit::Quart => "qt",
            CanonicalUnit::Gallon => "gal",
            CanonicalUnit::Liter => "liter",
            CanonicalUnit::Ounce => "oz",
            CanonicalUnit::Gram => "g",
            CanonicalUnit::Kilogram => "kg",
            CanonicalUnit::Pound => "lb",
            CanonicalUnit::Each => "each",
        }
    }
}

impl std::fmt::Display for CanonicalUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// Unit family, which decides the display unit of a computed price
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UnitFamily {
    Liquid,
    Solid,
    Count,
}

impl UnitFamily {
    /// The single unit this family's prices are displayed in
    pub fn display_unit(&self) -> CanonicalUnit {
        match self {
            UnitFamily::Liquid => CanonicalUnit::Liter,
            UnitFamily::Solid => CanonicalUnit::Pound,
            UnitFamily::Count => CanonicalUnit::Each,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitFamily::Liquid => "liquid",
            UnitFamily::Solid => "solid",
            UnitFamily::Count => "count",
        }
    }
}

/// Scale applied to an amount written with a currency word
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyScale {
    /// Dollars, no scaling
    Base,
    /// Cents, divide by 100
    Cents,
}

impl CurrencyScale {
    pub fn to_base(&self, amount: f64) -> f64 {
        match self {
            CurrencyScale::Base => amount,
            CurrencyScale::Cents => amount / 100.0,
        }
    }
}

/// Outcome of synonym resolution
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    Unit(CanonicalUnit),
    Currency(CurrencyScale),
    /// Not a known token; carries the token as given
    Unknown(String),
}

impl Resolution {
    /// Canonical spelling of the resolved token. Resolving it again yields
    /// the same resolution.
    pub fn token(&self) -> &str {
        match self {
            Resolution::Unit(unit) => unit.abbreviation(),
            Resolution::Currency(CurrencyScale::Base) => "$",
            Resolution::Currency(CurrencyScale::Cents) => "¢",
            Resolution::Unknown(token) => token,
        }
    }
}

// ==================== STATIC TABLES ====================

/// (unit, display units per unit, family)
const STANDARD_UNITS: &[(CanonicalUnit, f64, UnitFamily)] = &[
    (CanonicalUnit::FluidOunce, 0.0295735, UnitFamily::Liquid),
    (CanonicalUnit::Pint, 0.473176, UnitFamily::Liquid),
    (CanonicalUnit::Quart, 0.946353, UnitFamily::Liquid),
    (CanonicalUnit::Gallon, 3.78541, UnitFamily::Liquid),
    (CanonicalUnit::Liter, 1.0, UnitFamily::Liquid),
    (CanonicalUnit::Ounce, 0.0625, UnitFamily::Solid),
    (CanonicalUnit::Gram, 0.00220462, UnitFamily::Solid),
    (CanonicalUnit::Kilogram, 2.20462, UnitFamily::Solid),
    (CanonicalUnit::Pound, 1.0, UnitFamily::Solid),
    (CanonicalUnit::Each, 1.0, UnitFamily::Count),
];

/// Alternate spellings, already normalized (lowercase, single spaces)
const UNIT_SYNONYMS: &[(&str, CanonicalUnit)] = &[
    ("fluid ounce", CanonicalUnit::FluidOunce),
    ("floz", CanonicalUnit::FluidOunce),
    ("pint", CanonicalUnit::Pint),
    ("pnt", CanonicalUnit::Pint),
    ("quart", CanonicalUnit::Quart),
    ("qrt", CanonicalUnit::Quart),
    ("gallon", CanonicalUnit::Gallon),
    ("galon", CanonicalUnit::Gallon),
    ("lter", CanonicalUnit::Liter),
    ("ltr", CanonicalUnit::Liter),
    ("litre", CanonicalUnit::Liter),
    ("ounce", CanonicalUnit::Ounce),
    ("gram", CanonicalUnit::Gram),
    ("grm", CanonicalUnit::Gram),
    ("kilogram", CanonicalUnit::Kilogram),
    ("pound", CanonicalUnit::Pound),
    ("count", CanonicalUnit::Each),
    ("ct", CanonicalUnit::Each),
    ("cnt", CanonicalUnit::Each),
    ("ea", CanonicalUnit::Each),
];

const CURRENCY_WORDS: &[(&str, CurrencyScale)] = &[
    ("$", CurrencyScale::Base),
    ("dollar", CurrencyScale::Base),
    ("dollars", CurrencyScale::Base),
    ("¢", CurrencyScale::Cents),
    ("c", CurrencyScale::Cents),
    ("cent", CurrencyScale::Cents),
    ("cents", CurrencyScale::Cents),
];

/// Lowercase, treat dots as spaces, collapse whitespace ("Fl. Oz" → "fl oz")
fn normalize_token(token: &str) -> String {
    token
        .to_lowercase()
        .replace('.', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ==================== MAIN IMPLEMENTATION ====================

/// Immutable unit configuration shared by the parser and the calculator
#[derive(Debug, Clone)]
pub struct UnitTable {
    units: HashMap<CanonicalUnit, (f64, UnitFamily)>,
    synonyms: HashMap<String, Resolution>,
}

impl Default for UnitTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl UnitTable {
    /// Table with every canonical unit
    pub fn standard() -> Self {
        Self::with_units(STANDARD_UNITS)
    }

    /// Table restricted to the given units. Synonyms still resolve for
    /// every spelling, but lookups of units missing here report `UnknownUnit`.
    pub fn with_units(entries: &[(CanonicalUnit, f64, UnitFamily)]) -> Self {
        let units = entries
            .iter()
            .filter(|(_, factor, _)| *factor > 0.0)
            .map(|&(unit, factor, family)| (unit, (factor, family)))
            .collect();

        let mut synonyms = HashMap::new();
        for unit in CanonicalUnit::ALL {
            synonyms.insert(unit.abbreviation().to_string(), Resolution::Unit(unit));
        }
        for &(token, unit) in UNIT_SYNONYMS {
            synonyms.insert(token.to_string(), Resolution::Unit(unit));
        }
        for &(token, scale) in CURRENCY_WORDS {
            synonyms.insert(token.to_string(), Resolution::Currency(scale));
        }

        Self { units, synonyms }
    }

    /// Resolve a raw token to a canonical unit or currency word.
    /// Case-insensitive; a trailing plural `s` on a unit is tolerated.
    /// Unknown tokens come back unchanged.
    pub fn resolve(&self, token: &str) -> Resolution {
        let key = normalize_token(token);
        if let Some(resolution) = self.synonyms.get(&key) {
            return resolution.clone();
        }
        if let Some(stem) = key.strip_suffix('s') {
            if let Some(Resolution::Unit(unit)) = self.synonyms.get(stem) {
                return Resolution::Unit(*unit);
            }
        }
        Resolution::Unknown(token.to_string())
    }

    /// Resolve a token that must name a unit present in this table
    pub fn lookup_unit(&self, token: &str) -> Result<CanonicalUnit, PriceError> {
        match self.resolve(token) {
            Resolution::Unit(unit) if self.units.contains_key(&unit) => Ok(unit),
            _ => Err(PriceError::UnknownUnit(token.to_string())),
        }
    }

    pub fn conversion_factor(&self, unit: CanonicalUnit) -> Result<f64, PriceError> {
        self.units
            .get(&unit)
            .map(|(factor, _)| *factor)
            .ok_or_else(|| PriceError::UnknownUnit(unit.abbreviation().to_string()))
    }

    pub fn family(&self, unit: CanonicalUnit) -> Result<UnitFamily, PriceError> {
        self.units
            .get(&unit)
            .map(|(_, family)| *family)
            .ok_or_else(|| PriceError::UnknownUnit(unit.abbreviation().to_string()))
    }

    pub fn contains(&self, unit: CanonicalUnit) -> bool {
        self.units.contains_key(&unit)
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }
}

// ==================== TESTS ====================
