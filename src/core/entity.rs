//! Entity trait - common interface over the schema-indexed detail slots

use miette::Diagnostic;
use thiserror::Error;

use crate::core::value::{self, CoerceError, Value};
use crate::schema::{EntityKind, FieldId, FieldSpec, Schema, SchemaError, TypeTag};

/// Failure to edit a single detail field
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum EditError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Coerce(#[from] CoerceError),
}

/// Detail values of one entity, one slot per field of its kind's schema
#[derive(Debug, Clone, PartialEq)]
pub struct Details {
    kind: EntityKind,
    slots: Vec<Option<Value>>,
}

impl Details {
    /// All slots unset, except categories which take their first entry
    pub fn new(kind: EntityKind) -> Self {
        let slots = kind
            .schema()
            .fields()
            .iter()
            .map(|spec| match spec.tag {
                TypeTag::Category(choices) => {
                    choices.first().map(|c| Value::Category(c.to_string()))
                }
                _ => None,
            })
            .collect();
        Self { kind, slots }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn schema(&self) -> &'static Schema {
        self.kind.schema()
    }

    pub fn get(&self, field: FieldId) -> Option<&Value> {
        self.schema()
            .position(field)
            .and_then(|idx| self.slots.get(idx))
            .and_then(Option::as_ref)
    }

    /// Store a value without any mutability check
    ///
    /// The variant must match the field's tag and the field must belong to
    /// this kind. Used while building entities; edits go through
    /// [`Entity::assign`].
    pub fn set(&mut self, field: FieldId, value: Option<Value>) -> Result<(), SchemaError> {
        let idx = self
            .schema()
            .position(field)
            .ok_or(SchemaError::WrongKind {
                field,
                kind: self.kind,
            })?;
        let tag = field.tag();
        if let Some(ref v) = value {
            if !v.fits(tag) {
                return Err(SchemaError::TagMismatch {
                    field,
                    expected: tag,
                });
            }
        }
        self.slots[idx] = value.and_then(value::normalize);
        Ok(())
    }

    /// Formatted text of a slot, `None` when unset
    pub fn text(&self, field: FieldId) -> Option<String> {
        self.get(field).map(value::format)
    }

    /// Slots in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&'static FieldSpec, Option<&Value>)> {
        self.schema()
            .fields()
            .iter()
            .zip(self.slots.iter().map(Option::as_ref))
    }
}

/// Common interface of items, products and parts
pub trait Entity {
    /// Kind whose schema describes this entity
    const KIND: EntityKind;

    fn details(&self) -> &Details;

    fn details_mut(&mut self) -> &mut Details;

    /// The immutable identifier (empty if somehow unset)
    fn id(&self) -> &str {
        self.details()
            .get(Self::KIND.schema().id_field())
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Typed value of a detail field, `None` when unset or not of this kind
    fn get_detail(&self, field: FieldId) -> Option<&Value> {
        self.details().get(field)
    }

    fn detail_text(&self, field: FieldId) -> Option<String> {
        self.details().text(field)
    }

    fn quantity(&self) -> Option<u64> {
        self.get_detail(Self::KIND.schema().quantity_field())
            .and_then(Value::as_int)
    }

    fn low_stock_threshold(&self) -> Option<u64> {
        Self::KIND
            .schema()
            .low_stock_field()
            .and_then(|f| self.get_detail(f))
            .and_then(Value::as_int)
    }

    /// Edit a mutable field, stamping the modification time
    fn assign(&mut self, field: FieldId, value: Option<Value>) -> Result<(), EditError> {
        let schema = Self::KIND.schema();
        if !schema.contains(field) {
            return Err(SchemaError::WrongKind {
                field,
                kind: Self::KIND,
            }
            .into());
        }
        if !field.tag().is_mutable() {
            return Err(SchemaError::Immutable(field).into());
        }
        self.details_mut().set(field, value)?;
        if let Some(modified) = schema.modified_field() {
            if modified != field {
                self.details_mut()
                    .set(modified, Some(Value::Modified(value::now())))?;
            }
        }
        Ok(())
    }

    fn set_field(&mut self, field: FieldId, value: Value) -> Result<(), EditError> {
        self.assign(field, Some(value))
    }

    /// Coerce text for the field and assign it; empty text clears the field
    fn set_field_text(&mut self, field: FieldId, text: &str) -> Result<(), EditError> {
        let value = value::decode_cell(text, field.tag())?;
        self.assign(field, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        details: Details,
    }

    impl Entity for Probe {
        const KIND: EntityKind = EntityKind::Item;

        fn details(&self) -> &Details {
            &self.details
        }

        fn details_mut(&mut self) -> &mut Details {
            &mut self.details
        }
    }

    fn probe() -> Probe {
        let mut details = Details::new(EntityKind::Item);
        details
            .set(FieldId::ItemId, Some(Value::Id("ABCDE".to_string())))
            .unwrap();
        Probe { details }
    }

    #[test]
    fn test_new_details_fully_initialized() {
        let details = Details::new(EntityKind::Item);
        assert_eq!(details.iter().count(), EntityKind::Item.schema().len());
        assert_eq!(
            details.get(FieldId::ItemCategory),
            Some(&Value::Category("Component".to_string()))
        );
        assert_eq!(details.get(FieldId::ItemName), None);
    }

    #[test]
    fn test_set_rejects_wrong_kind_and_tag() {
        let mut details = Details::new(EntityKind::Item);
        assert!(matches!(
            details.set(FieldId::ProductName, Some(Value::Text("x".into()))),
            Err(SchemaError::WrongKind { .. })
        ));
        assert!(matches!(
            details.set(FieldId::ItemQuantity, Some(Value::Text("x".into()))),
            Err(SchemaError::TagMismatch { .. })
        ));
    }

    #[test]
    fn test_set_normalizes_zero_measure() {
        let mut details = Details::new(EntityKind::Item);
        details
            .set(
                FieldId::ItemValue,
                Some(Value::Measure {
                    magnitude: 0.0,
                    unit: "V".into(),
                }),
            )
            .unwrap();
        assert_eq!(details.get(FieldId::ItemValue), None);
    }

    #[test]
    fn test_assign_rejects_immutable() {
        let mut p = probe();
        let err = p
            .set_field(FieldId::ItemId, Value::Id("ZZZZZ".into()))
            .unwrap_err();
        assert_eq!(err, EditError::Schema(SchemaError::Immutable(FieldId::ItemId)));
        assert_eq!(p.id(), "ABCDE");
    }

    #[test]
    fn test_set_field_text_stamps_modified() {
        let mut p = probe();
        assert!(p.get_detail(FieldId::ItemModified).is_none());
        p.set_field_text(FieldId::ItemQuantity, "12").unwrap();
        assert_eq!(p.quantity(), Some(12));
        assert!(matches!(
            p.get_detail(FieldId::ItemModified),
            Some(Value::Modified(_))
        ));
    }

    #[test]
    fn test_set_field_text_invalid_keeps_old_value() {
        let mut p = probe();
        p.set_field_text(FieldId::ItemQuantity, "4").unwrap();
        let err = p.set_field_text(FieldId::ItemQuantity, "four").unwrap_err();
        assert!(matches!(err, EditError::Coerce(_)));
        assert_eq!(p.quantity(), Some(4));
    }

    #[test]
    fn test_set_field_text_empty_clears() {
        let mut p = probe();
        p.set_field_text(FieldId::ItemLocation, "Shelf 2").unwrap();
        p.set_field_text(FieldId::ItemLocation, "").unwrap();
        assert_eq!(p.get_detail(FieldId::ItemLocation), None);
    }
}
