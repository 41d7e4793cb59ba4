//! Property values held by default objects and struct defaults.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use unrealscript_core::{ClassId, FunctionId, Name, ObjectRef, PropertyId};

/// A single imported value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Byte(u8),
    Int(i32),
    Bool(bool),
    Float(OrderedFloat<f32>),
    Name(Name),
    String(String),
    /// Object or class reference.
    Object(ObjectRef),
    /// `Default__<Class>` archetype reference.
    Archetype(ClassId),
    /// Delegate bound to a function, or unbound.
    Delegate(Option<FunctionId>),
    /// Struct value, keyed by member.
    Struct(ObjectValues),
    /// Dynamic array elements.
    Array(Vec<PropertyValue>),
    /// Opaque text for map properties.
    Raw(String),
}

/// Values of an object's properties, keyed by property and array index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectValues {
    values: BTreeMap<(PropertyId, u32), PropertyValue>,
}

impl ObjectValues {
    /// Empty value set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of element `index` of a property.
    pub fn get(&self, property: PropertyId, index: u32) -> Option<&PropertyValue> {
        self.values.get(&(property, index))
    }

    /// Mutable value of element `index` of a property.
    pub fn get_mut(&mut self, property: PropertyId, index: u32) -> Option<&mut PropertyValue> {
        self.values.get_mut(&(property, index))
    }

    /// Set element `index` of a property.
    pub fn set(&mut self, property: PropertyId, index: u32, value: PropertyValue) {
        self.values.insert((property, index), value);
    }

    /// Remove a value.
    pub fn remove(&mut self, property: PropertyId, index: u32) -> Option<PropertyValue> {
        self.values.remove(&(property, index))
    }

    /// Copy in every value from `parent` that is not already set here.
    pub fn inherit_from(&mut self, parent: &ObjectValues) {
        for (key, value) in &parent.values {
            self.values.entry(*key).or_insert_with(|| value.clone());
        }
    }

    /// Iterate over `(property, index, value)`.
    pub fn iter(&self) -> impl Iterator<Item = (PropertyId, u32, &PropertyValue)> {
        self.values.iter().map(|((p, i), v)| (*p, *i, v))
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Remove every value.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inherit_keeps_overrides() {
        let health = PropertyId::new(1);
        let speed = PropertyId::new(2);
        let mut parent = ObjectValues::new();
        parent.set(health, 0, PropertyValue::Int(100));
        parent.set(speed, 0, PropertyValue::Float(OrderedFloat(440.0)));

        let mut child = ObjectValues::new();
        child.set(health, 0, PropertyValue::Int(50));
        child.inherit_from(&parent);

        assert_eq!(child.get(health, 0), Some(&PropertyValue::Int(50)));
        assert_eq!(
            child.get(speed, 0),
            Some(&PropertyValue::Float(OrderedFloat(440.0)))
        );
        assert_eq!(child.len(), 2);
    }

    #[test]
    fn fixed_array_elements_are_separate() {
        let slots = PropertyId::new(3);
        let mut values = ObjectValues::new();
        values.set(slots, 0, PropertyValue::Byte(1));
        values.set(slots, 2, PropertyValue::Byte(3));
        assert_eq!(values.get(slots, 1), None);
        assert_eq!(values.iter().count(), 2);
    }
}
