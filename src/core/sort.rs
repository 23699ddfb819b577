//! Sort comparator - type-aware ordering of entities by one field
//!
//! Numeric tags (`int`, `cost`, `value`) compare by number, with an absent
//! value counting as 0; a `value` compares its magnitude only and ignores the
//! unit. Every other tag compares the formatted text case-insensitively, and
//! there an absent value sorts before every present one.

use std::cmp::Ordering;

use crate::core::entity::Entity;
use crate::core::store::EntityStore;
use crate::core::value::{self, Value};
use crate::schema::{FieldId, TypeTag};

/// Field and direction of a sorted view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: FieldId,
    pub descending: bool,
}

impl SortKey {
    pub fn ascending(field: FieldId) -> Self {
        Self {
            field,
            descending: false,
        }
    }
}

/// Compare two entities by a field, using the field's schema tag
pub fn compare<E: Entity>(a: &E, b: &E, field: FieldId) -> Ordering {
    compare_values(a.get_detail(field), b.get_detail(field), field.tag())
}

/// Compare two slot values of the given tag
pub fn compare_values(a: Option<&Value>, b: Option<&Value>, tag: TypeTag) -> Ordering {
    if tag.is_numeric() {
        return number_or_zero(a).total_cmp(&number_or_zero(b));
    }
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => value::format(a)
            .to_lowercase()
            .cmp(&value::format(b).to_lowercase()),
    }
}

fn number_or_zero(value: Option<&Value>) -> f64 {
    value
        .and_then(Value::as_number)
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// Stable-sort store indices by a key; ties keep their current order
pub fn sort_indices<E: Entity>(store: &EntityStore<E>, indices: &mut [usize], key: SortKey) {
    indices.sort_by(|&a, &b| match (store.get(a), store.get(b)) {
        (Some(ea), Some(eb)) => {
            let ord = compare(ea, eb, key.field);
            if key.descending {
                ord.reverse()
            } else {
                ord
            }
        }
        _ => Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Item;

    fn item(id: &str, field: FieldId, text: Option<&str>) -> Item {
        let mut item = Item::new(id.to_string(), value::now());
        if let Some(text) = text {
            item.set_field_text(field, text).unwrap();
        }
        item
    }

    #[test]
    fn test_measure_compares_magnitude_only() {
        let small = item("AAAAA", FieldId::ItemValue, Some("4.7 kΩ"));
        let large = item("BBBBB", FieldId::ItemValue, Some("10 Ω"));
        assert_eq!(compare(&small, &large, FieldId::ItemValue), Ordering::Less);
        assert_eq!(compare(&large, &small, FieldId::ItemValue), Ordering::Greater);
    }

    #[test]
    fn test_numeric_absent_counts_as_zero() {
        let none = item("AAAAA", FieldId::ItemQuantity, None);
        let zero = item("BBBBB", FieldId::ItemQuantity, Some("0"));
        let three = item("CCCCC", FieldId::ItemQuantity, Some("3"));
        assert_eq!(compare(&none, &zero, FieldId::ItemQuantity), Ordering::Equal);
        assert_eq!(compare(&none, &three, FieldId::ItemQuantity), Ordering::Less);
    }

    #[test]
    fn test_cost_numeric_not_lexicographic() {
        let nine = item("AAAAA", FieldId::ItemCost, Some("9"));
        let ten = item("BBBBB", FieldId::ItemCost, Some("10"));
        assert_eq!(compare(&nine, &ten, FieldId::ItemCost), Ordering::Less);
    }

    #[test]
    fn test_text_is_case_insensitive() {
        let lower = item("AAAAA", FieldId::ItemName, Some("apple"));
        let upper = item("BBBBB", FieldId::ItemName, Some("Banana"));
        assert_eq!(compare(&lower, &upper, FieldId::ItemName), Ordering::Less);
        let same = item("CCCCC", FieldId::ItemName, Some("APPLE"));
        assert_eq!(compare(&lower, &same, FieldId::ItemName), Ordering::Equal);
    }

    #[test]
    fn test_absent_text_sorts_first() {
        let none = item("AAAAA", FieldId::ItemName, None);
        let named = item("BBBBB", FieldId::ItemName, Some("Anything"));
        // "none" would sort after "Anything" if absent values were formatted
        assert_eq!(compare(&none, &named, FieldId::ItemName), Ordering::Less);
        assert_eq!(compare(&named, &none, FieldId::ItemName), Ordering::Greater);
        assert_eq!(compare(&none, &none, FieldId::ItemName), Ordering::Equal);
    }

    #[test]
    fn test_ordering_laws() {
        let fields = [
            (FieldId::ItemName, vec![None, Some("b"), Some("A"), Some("a"), Some("c")]),
            (FieldId::ItemQuantity, vec![None, Some("0"), Some("2"), Some("10")]),
            (FieldId::ItemValue, vec![None, Some("4.7 kΩ"), Some("10 Ω"), Some("x V")]),
        ];
        for (field, texts) in fields {
            let items: Vec<Item> = texts
                .iter()
                .enumerate()
                .map(|(n, t)| item(&format!("I{:04}", n), field, *t))
                .collect();
            for a in &items {
                for b in &items {
                    // antisymmetry
                    assert_eq!(compare(a, b, field), compare(b, a, field).reverse());
                    for c in &items {
                        if compare(a, b, field) != Ordering::Greater
                            && compare(b, c, field) != Ordering::Greater
                        {
                            assert_ne!(compare(a, c, field), Ordering::Greater);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_sort_indices_stable_and_reversible() {
        let store: EntityStore<Item> = [
            item("AAAAA", FieldId::ItemQuantity, Some("5")),
            item("BBBBB", FieldId::ItemQuantity, Some("1")),
            item("CCCCC", FieldId::ItemQuantity, Some("5")),
        ]
        .into_iter()
        .collect();

        let mut indices = vec![0, 1, 2];
        sort_indices(&store, &mut indices, SortKey::ascending(FieldId::ItemQuantity));
        assert_eq!(indices, vec![1, 0, 2]);

        let mut indices = vec![0, 1, 2];
        sort_indices(
            &store,
            &mut indices,
            SortKey {
                field: FieldId::ItemQuantity,
                descending: true,
            },
        );
        assert_eq!(indices, vec![0, 2, 1]);
    }
}
