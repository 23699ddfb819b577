//! Item entity - a tracked inventory unit with free-form custom fields

use chrono::NaiveDateTime;

use crate::core::entity::{Details, Entity};
use crate::core::value::{Value, TIMESTAMP_FORMAT};
use crate::schema::{EntityKind, FieldId};

/// A free-form name/value pair attached to an item beyond its schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomField {
    pub name: String,
    pub value: String,
}

impl CustomField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An Item entity - tracked inventory unit
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    details: Details,

    /// Custom fields in insertion order
    custom: Vec<CustomField>,
}

impl Entity for Item {
    const KIND: EntityKind = EntityKind::Item;

    fn details(&self) -> &Details {
        &self.details
    }

    fn details_mut(&mut self) -> &mut Details {
        &mut self.details
    }
}

impl Item {
    /// Create a new item with its id and both timestamps assigned
    pub fn new(id: String, now: NaiveDateTime) -> Self {
        let mut details = Details::new(EntityKind::Item);
        let stamps = [
            (FieldId::ItemId, Value::Id(id)),
            (
                FieldId::ItemCreated,
                Value::Created(now.format(TIMESTAMP_FORMAT).to_string()),
            ),
            (FieldId::ItemModified, Value::Modified(now)),
        ];
        for (field, value) in stamps {
            // Fields and variants above are fixed by the item schema
            let _ = details.set(field, Some(value));
        }
        Self {
            details,
            custom: Vec::new(),
        }
    }

    /// Rebuild an item from stored details
    pub fn from_parts(details: Details, custom: Vec<CustomField>) -> Self {
        Self { details, custom }
    }

    pub fn name(&self) -> &str {
        self.get_detail(FieldId::ItemName)
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    pub fn custom_fields(&self) -> &[CustomField] {
        &self.custom
    }

    pub fn custom_field(&self, name: &str) -> Option<&str> {
        self.custom
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    /// Update a custom field in place, or append it if the name is new
    pub fn set_custom_field(&mut self, name: &str, value: &str) {
        match self.custom.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.value = value.to_string(),
            None => self.custom.push(CustomField::new(name, value)),
        }
        self.touch();
    }

    pub fn remove_custom_field(&mut self, name: &str) -> Option<CustomField> {
        let idx = self.custom.iter().position(|c| c.name == name)?;
        self.touch();
        Some(self.custom.remove(idx))
    }

    fn touch(&mut self) {
        let _ = self.details.set(
            FieldId::ItemModified,
            Some(Value::Modified(crate::core::value::now())),
        );
    }
}
