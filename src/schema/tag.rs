//! Type tags carried by every schema field

use std::fmt;

/// The type of a detail field - determines how its text is coerced,
/// compared and whether it may be edited after creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Immutable identifier, generated once (`STR`)
    Id,
    /// Mutable free text (`str`)
    Text,
    /// Mutable non-negative integer (`int`)
    Int,
    /// Mutable non-negative decimal shown as currency (`cost`)
    Cost,
    /// Magnitude plus unit, stored as `"<num> <unit>"` (`value`)
    Measure,
    /// One entry of a fixed category list (`cat`)
    Category(&'static [&'static str]),
    /// Immutable creation timestamp (`DATE`)
    Created,
    /// Mutable modification timestamp (`date`)
    Modified,
}

impl TypeTag {
    /// Short tag name as it appears in schema listings
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Id => "STR",
            TypeTag::Text => "str",
            TypeTag::Int => "int",
            TypeTag::Cost => "cost",
            TypeTag::Measure => "value",
            TypeTag::Category(_) => "cat",
            TypeTag::Created => "DATE",
            TypeTag::Modified => "date",
        }
    }

    /// Whether the field can be changed after the entity is created
    pub fn is_mutable(&self) -> bool {
        !matches!(self, TypeTag::Id | TypeTag::Created)
    }

    /// Whether values of this tag order numerically
    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeTag::Int | TypeTag::Cost | TypeTag::Measure)
    }

    /// Category choices, empty for every other tag
    pub fn choices(&self) -> &'static [&'static str] {
        match self {
            TypeTag::Category(choices) => choices,
            _ => &[],
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
