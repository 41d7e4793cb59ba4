//! Compiler-only metadata.
//!
//! Side tables for what the reflection graph does not keep: where function
//! bodies and state code start in the source, raw default-parameter text,
//! export-text overrides, `<Key=Value>` metadata and the native multiple
//! inheritance parents of a class. Entries are created during the
//! declaration pass, read during code generation and header export, and kept
//! for the whole batch so later classes can reach an earlier class's data.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use unrealscript_core::{ClassId, FunctionId, PropertyId, StateId, StructId};
use unrealscript_parser::SourcePos;
use unrealscript_registry::Registry;

/// Raw text of an optional parameter's default value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultValueText {
    pub text: String,
    /// Where the text starts in the class source.
    pub pos: SourcePos,
}

/// Per-property data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenData {
    /// `<Key=Value>` metadata, including `ToolTip`.
    pub metadata: BTreeMap<String, String>,
    pub declared_line: u32,
    pub default_value: Option<DefaultValueText>,
    /// Native type text overriding the generated one.
    pub export_text: Option<String>,
}

/// Per-function data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionData {
    /// Position just inside the body's `{`, when the function has a body.
    pub body: Option<SourcePos>,
    pub declared_line: u32,
    pub metadata: BTreeMap<String, String>,
}

/// Per-struct data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructData {
    pub declared_line: u32,
    pub metadata: BTreeMap<String, String>,
}

/// Per-state data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateData {
    /// Where the state's code begins, after its functions.
    pub code: Option<SourcePos>,
    pub declared_line: u32,
}

/// Everything recorded for one class.
#[derive(Debug, Clone)]
pub struct ClassMetaData {
    pub class: ClassId,
    /// Source file name, for messages.
    pub file: String,
    /// Native base classes from `inherits`.
    pub inheritance_parents: Vec<String>,
    pub metadata: BTreeMap<String, String>,
    /// Position just inside the `replication` block's `{`.
    pub replication: Option<SourcePos>,
    properties: FxHashMap<PropertyId, TokenData>,
    functions: FxHashMap<FunctionId, FunctionData>,
    structs: FxHashMap<StructId, StructData>,
    states: FxHashMap<StateId, StateData>,
}

impl ClassMetaData {
    fn new(class: ClassId, file: String) -> Self {
        Self {
            class,
            file,
            inheritance_parents: Vec::new(),
            metadata: BTreeMap::new(),
            replication: None,
            properties: FxHashMap::default(),
            functions: FxHashMap::default(),
            structs: FxHashMap::default(),
            states: FxHashMap::default(),
        }
    }

    pub fn property(&self, id: PropertyId) -> Option<&TokenData> {
        self.properties.get(&id)
    }

    pub fn property_mut(&mut self, id: PropertyId) -> Option<&mut TokenData> {
        self.properties.get_mut(&id)
    }

    pub fn function(&self, id: FunctionId) -> Option<&FunctionData> {
        self.functions.get(&id)
    }

    pub fn function_mut(&mut self, id: FunctionId) -> Option<&mut FunctionData> {
        self.functions.get_mut(&id)
    }

    pub fn state(&self, id: StateId) -> Option<&StateData> {
        self.states.get(&id)
    }

    pub fn state_mut(&mut self, id: StateId) -> Option<&mut StateData> {
        self.states.get_mut(&id)
    }

    pub fn script_struct(&self, id: StructId) -> Option<&StructData> {
        self.structs.get(&id)
    }
}

/// Metadata for every class in the batch.
#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    classes: FxHashMap<ClassId, ClassMetaData>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh record for `class`, replacing any earlier one.
    pub fn add_class(&mut self, class: ClassId, file: impl Into<String>) -> &mut ClassMetaData {
        let fresh = ClassMetaData::new(class, file.into());
        let slot = self.classes.entry(class).or_insert_with(|| fresh.clone());
        *slot = fresh;
        slot
    }

    pub fn find_class_data(&self, class: ClassId) -> Option<&ClassMetaData> {
        self.classes.get(&class)
    }

    pub fn find_class_data_mut(&mut self, class: ClassId) -> Option<&mut ClassMetaData> {
        self.classes.get_mut(&class)
    }

    /// Drop a class's record.
    pub fn remove_class(&mut self, class: ClassId) {
        self.classes.remove(&class);
    }

    pub fn add_property(&mut self, class: ClassId, property: PropertyId, data: TokenData) {
        if let Some(meta) = self.classes.get_mut(&class) {
            meta.properties.insert(property, data);
        }
    }

    pub fn add_function(&mut self, class: ClassId, function: FunctionId, data: FunctionData) {
        if let Some(meta) = self.classes.get_mut(&class) {
            meta.functions.insert(function, data);
        }
    }

    pub fn add_struct(&mut self, class: ClassId, id: StructId, data: StructData) {
        if let Some(meta) = self.classes.get_mut(&class) {
            meta.structs.insert(id, data);
        }
    }

    pub fn add_state(&mut self, class: ClassId, state: StateId, data: StateData) {
        if let Some(meta) = self.classes.get_mut(&class) {
            meta.states.insert(state, data);
        }
    }

    /// Property data, searched from `class` up through its parents.
    pub fn find_token_data(&self, registry: &Registry, class: ClassId, property: PropertyId) -> Option<&TokenData> {
        registry
            .class_chain(class)
            .find_map(|c| self.classes.get(&c).and_then(|m| m.property(property)))
    }

    /// Function data, searched from `class` up through its parents.
    pub fn find_function_data(&self, registry: &Registry, class: ClassId, function: FunctionId) -> Option<&FunctionData> {
        registry
            .class_chain(class)
            .find_map(|c| self.classes.get(&c).and_then(|m| m.function(function)))
    }

    /// Struct data, searched from `class` up through its parents.
    pub fn find_struct_data(&self, registry: &Registry, class: ClassId, id: StructId) -> Option<&StructData> {
        registry
            .class_chain(class)
            .find_map(|c| self.classes.get(&c).and_then(|m| m.script_struct(id)))
    }

    /// State data, searched from `class` up through its parents.
    pub fn find_state_data(&self, registry: &Registry, class: ClassId, state: StateId) -> Option<&StateData> {
        registry
            .class_chain(class)
            .find_map(|c| self.classes.get(&c).and_then(|m| m.state(state)))
    }

    /// Forget source positions once a class's code is generated.
    pub fn shrink(&mut self, class: ClassId) {
        if let Some(meta) = self.classes.get_mut(&class) {
            meta.replication = None;
            for data in meta.functions.values_mut() {
                data.body = None;
            }
            for data in meta.states.values_mut() {
                data.code = None;
            }
            for data in meta.properties.values_mut() {
                if let Some(default) = data.default_value.as_mut() {
                    default.pos = SourcePos::default();
                }
            }
            meta.properties.shrink_to_fit();
            meta.functions.shrink_to_fit();
        }
    }

    /// Number of classes with metadata.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unrealscript_core::{FieldOwner, Name, PropertyType};
    use unrealscript_registry::PropertyEntry;

    #[test]
    fn inherited_property_data_found_from_subclass() {
        let mut registry = Registry::new();
        let object = registry.add_class(Name::new("Object"), Name::new("Core")).unwrap();
        let actor = registry.add_class(Name::new("Actor"), Name::new("Engine")).unwrap();
        registry.class_mut(actor).super_class = Some(object);
        let tag = registry.add_property(PropertyEntry::new(
            Name::new("Tag"),
            FieldOwner::Class(object),
            PropertyType::Name,
        ));

        let mut store = MetadataStore::new();
        store.add_class(object, "Object.uc");
        store.add_class(actor, "Actor.uc");
        let mut data = TokenData::default();
        data.metadata.insert("ToolTip".into(), "Tag name".into());
        store.add_property(object, tag, data);

        let found = store.find_token_data(&registry, actor, tag).unwrap();
        assert_eq!(found.metadata.get("ToolTip").map(String::as_str), Some("Tag name"));
        assert!(store.find_class_data(actor).unwrap().property(tag).is_none());
    }

    #[test]
    fn shrink_clears_positions() {
        let mut registry = Registry::new();
        let object = registry.add_class(Name::new("Object"), Name::new("Core")).unwrap();
        let f = registry.add_function(unrealscript_registry::FunctionEntry::new(
            Name::new("Tick"),
            FieldOwner::Class(object),
        ));
        let mut store = MetadataStore::new();
        store.add_class(object, "Object.uc");
        store.add_function(
            object,
            f,
            FunctionData {
                body: Some(SourcePos::START),
                declared_line: 3,
                metadata: BTreeMap::new(),
            },
        );
        store.shrink(object);
        let data = store.find_function_data(&registry, object, f).unwrap();
        assert_eq!(data.body, None);
        assert_eq!(data.declared_line, 3);
    }
}
