//! Filter engine - page modes and per-field query predicates
//!
//! A predicate is a field plus query text. Text of the form `!>N` or `!<N`
//! is a numeric comparison; anything else is a case-insensitive substring
//! match against the field's formatted value. A query that cannot be
//! evaluated (absent value, non-numeric operand) filters the entity out
//! instead of failing.

use clap::ValueEnum;
use std::fmt;
use std::str::FromStr;

use crate::core::entity::Entity;
use crate::core::value::{self, Value};
use crate::schema::{FieldId, SchemaError};

/// Implicit filter applied before any predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PageMode {
    /// Everything
    #[default]
    Normal,
    /// Quantity below the entity's low-stock threshold
    LowStock,
    /// Quantity of zero (or no quantity at all)
    OutOfStock,
}

impl fmt::Display for PageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageMode::Normal => write!(f, "normal"),
            PageMode::LowStock => write!(f, "low-stock"),
            PageMode::OutOfStock => write!(f, "out-of-stock"),
        }
    }
}

/// One `(field, query text)` filter condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub field: FieldId,
    pub text: String,
}

impl Predicate {
    pub fn new(field: FieldId, text: impl Into<String>) -> Self {
        Self {
            field,
            text: text.into(),
        }
    }

    /// Build a predicate from a field key
    pub fn parse(key: &str, text: &str) -> Result<Self, SchemaError> {
        Ok(Self::new(key.parse()?, text))
    }

    /// Predicates with empty text always pass
    pub fn is_active(&self) -> bool {
        !self.text.is_empty()
    }

    fn query(&self) -> Query<'_> {
        let relational = self
            .text
            .strip_prefix("!>")
            .map(|n| (Relation::Greater, n))
            .or_else(|| self.text.strip_prefix("!<").map(|n| (Relation::Less, n)));
        match relational {
            Some((relation, operand)) => Query::Compare(relation, operand),
            None => Query::Contains(&self.text),
        }
    }
}

/// Parses `key=text`
impl FromStr for Predicate {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, text) = s.split_once('=').unwrap_or((s, ""));
        Self::parse(key, text)
    }
}

#[derive(Debug, Clone, Copy)]
enum Relation {
    Greater,
    Less,
}

#[derive(Debug)]
enum Query<'a> {
    Compare(Relation, &'a str),
    Contains(&'a str),
}

/// Whether an entity passes the page mode and every active predicate
pub fn matches<E: Entity>(entity: &E, predicates: &[Predicate], mode: PageMode) -> bool {
    let in_page = match mode {
        PageMode::Normal => true,
        PageMode::LowStock => match (entity.quantity(), entity.low_stock_threshold()) {
            (Some(quantity), Some(threshold)) => quantity < threshold,
            _ => false,
        },
        PageMode::OutOfStock => entity.quantity().unwrap_or(0) == 0,
    };
    if !in_page {
        return false;
    }

    predicates
        .iter()
        .filter(|p| p.is_active())
        .all(|p| predicate_holds(entity.get_detail(p.field), p))
}

fn predicate_holds(value: Option<&Value>, predicate: &Predicate) -> bool {
    let Some(value) = value else {
        return false;
    };
    match predicate.query() {
        Query::Compare(relation, operand) => {
            let (Some(actual), Ok(limit)) = (numeric(value), operand.trim().parse::<f64>()) else {
                return false;
            };
            match relation {
                Relation::Greater => actual > limit,
                Relation::Less => actual < limit,
            }
        }
        Query::Contains(needle) => value::format(value)
            .to_lowercase()
            .contains(&needle.to_lowercase()),
    }
}

/// Numeric reading of a value, parsing the text of non-numeric tags
fn numeric(value: &Value) -> Option<f64> {
    value
        .as_number()
        .or_else(|| value::format(value).trim().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}
