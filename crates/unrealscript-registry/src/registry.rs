//! Registry - the reflection graph the compiler builds and reads.
//!
//! Every class, struct, function, state, property, enum and const lives in a
//! flat arena and is addressed by its typed id. Name indexes give lookup by
//! name for the kinds that are globally visible (classes, structs, enums and
//! enum tags); fields are found by walking an owner's lists and its
//! inheritance chain.
//!
//! # Example
//!
//! ```
//! use unrealscript_core::Name;
//! use unrealscript_registry::Registry;
//!
//! let mut registry = Registry::new();
//! let object = registry.add_class(Name::new("Object"), Name::new("Core")).unwrap();
//! let actor = registry.add_class(Name::new("Actor"), Name::new("Engine")).unwrap();
//! registry.class_mut(actor).super_class = Some(object);
//!
//! assert!(registry.is_child_of(actor, object));
//! assert_eq!(registry.find_class("actor"), Some(actor));
//! ```

use rustc_hash::FxHashMap;

use unrealscript_core::{
    ClassFlags, ClassId, ConstId, EnumId, FieldOwner, FunctionId, Name, PropertyFlags,
    PropertyId, PropertyType, RegistrationError, StateId, StructId,
};

use crate::entries::{
    ClassEntry, ConstEntry, EnumEntry, FunctionEntry, PropertyEntry, StateEntry, StructEntry,
};

/// Name of the intrinsic class describing classes.
pub const CLASS_CLASS_NAME: &str = "Class";

/// Name of the root class.
pub const OBJECT_CLASS_NAME: &str = "Object";

/// The reflection graph.
#[derive(Debug, Clone)]
pub struct Registry {
    classes: Vec<ClassEntry>,
    structs: Vec<StructEntry>,
    functions: Vec<FunctionEntry>,
    states: Vec<StateEntry>,
    properties: Vec<PropertyEntry>,
    enums: Vec<EnumEntry>,
    consts: Vec<ConstEntry>,

    class_by_name: FxHashMap<Name, ClassId>,
    struct_by_name: FxHashMap<Name, StructId>,
    enum_by_name: FxHashMap<Name, EnumId>,
    /// Tag name -> every enum declaring it, with the tag's value.
    enum_tags: FxHashMap<Name, Vec<(EnumId, u8)>>,
    /// Operator symbol -> operator functions.
    operators: FxHashMap<Name, Vec<FunctionId>>,

    object_class: Option<ClassId>,
    class_class: ClassId,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a registry holding only the intrinsic `Class` class.
    pub fn new() -> Self {
        let mut registry = Self {
            classes: Vec::new(),
            structs: Vec::new(),
            functions: Vec::new(),
            states: Vec::new(),
            properties: Vec::new(),
            enums: Vec::new(),
            consts: Vec::new(),
            class_by_name: FxHashMap::default(),
            struct_by_name: FxHashMap::default(),
            enum_by_name: FxHashMap::default(),
            enum_tags: FxHashMap::default(),
            operators: FxHashMap::default(),
            object_class: None,
            class_class: ClassId::new(0),
        };
        let name = Name::new(CLASS_CLASS_NAME);
        let mut class = ClassEntry::new(name.clone(), Name::new("Core"));
        class.flags = ClassFlags::INTRINSIC | ClassFlags::NATIVE | ClassFlags::PARSED | ClassFlags::COMPILED;
        registry.classes.push(class);
        registry.class_by_name.insert(name, registry.class_class);
        registry
    }

    // ==========================================================================
    // Arena access
    // ==========================================================================

    pub fn class(&self, id: ClassId) -> &ClassEntry {
        &self.classes[id.index() as usize]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassEntry {
        &mut self.classes[id.index() as usize]
    }

    pub fn script_struct(&self, id: StructId) -> &StructEntry {
        &self.structs[id.index() as usize]
    }

    pub fn script_struct_mut(&mut self, id: StructId) -> &mut StructEntry {
        &mut self.structs[id.index() as usize]
    }

    pub fn function(&self, id: FunctionId) -> &FunctionEntry {
        &self.functions[id.index() as usize]
    }

    pub fn function_mut(&mut self, id: FunctionId) -> &mut FunctionEntry {
        &mut self.functions[id.index() as usize]
    }

    pub fn state(&self, id: StateId) -> &StateEntry {
        &self.states[id.index() as usize]
    }

    pub fn state_mut(&mut self, id: StateId) -> &mut StateEntry {
        &mut self.states[id.index() as usize]
    }

    pub fn property(&self, id: PropertyId) -> &PropertyEntry {
        &self.properties[id.index() as usize]
    }

    pub fn property_mut(&mut self, id: PropertyId) -> &mut PropertyEntry {
        &mut self.properties[id.index() as usize]
    }

    pub fn enumeration(&self, id: EnumId) -> &EnumEntry {
        &self.enums[id.index() as usize]
    }

    pub fn constant(&self, id: ConstId) -> &ConstEntry {
        &self.consts[id.index() as usize]
    }

    pub fn constant_mut(&mut self, id: ConstId) -> &mut ConstEntry {
        &mut self.consts[id.index() as usize]
    }

    /// Ids of every class, in creation order.
    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        (0..self.classes.len() as u32).map(ClassId::new)
    }

    /// Ids of every function, in creation order.
    pub fn function_ids(&self) -> impl Iterator<Item = FunctionId> + '_ {
        (0..self.functions.len() as u32).map(FunctionId::new)
    }

    /// Number of classes including intrinsics.
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    // ==========================================================================
    // Classes
    // ==========================================================================

    /// Add a class. The first class named `Object` becomes the root.
    pub fn add_class(&mut self, name: Name, package: Name) -> Result<ClassId, RegistrationError> {
        if self.class_by_name.contains_key(&name) {
            return Err(RegistrationError::DuplicateClass(name.to_string()));
        }
        let id = ClassId::new(self.classes.len() as u32);
        let is_root = name == OBJECT_CLASS_NAME && self.object_class.is_none();
        self.classes.push(ClassEntry::new(name.clone(), package));
        self.class_by_name.insert(name, id);
        if is_root {
            self.object_class = Some(id);
            let class_class = self.class_class;
            self.class_mut(class_class).super_class = Some(id);
        }
        Ok(id)
    }

    /// Look up a class by name.
    pub fn find_class(&self, name: &str) -> Option<ClassId> {
        self.class_by_name.get(&Name::new(name)).copied()
    }

    /// The root `Object` class, once declared.
    pub fn object_class(&self) -> Option<ClassId> {
        self.object_class
    }

    /// The intrinsic `Class` class.
    pub fn class_class(&self) -> ClassId {
        self.class_class
    }

    /// Iterate a class and its ancestors, nearest first.
    pub fn class_chain(&self, class: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        std::iter::successors(Some(class), move |c| self.class(*c).super_class)
    }

    /// Whether `child` is `parent` or inherits from it.
    pub fn is_child_of(&self, child: ClassId, parent: ClassId) -> bool {
        self.class_chain(child).any(|c| c == parent)
    }

    /// Number of inheritance steps from `child` up to `parent`.
    pub fn inheritance_distance(&self, child: ClassId, parent: ClassId) -> Option<u32> {
        self.class_chain(child)
            .position(|c| c == parent)
            .map(|d| d as u32)
    }

    /// Whether `class` implements `interface`, directly or through a parent
    /// class or parent interface.
    pub fn implements_interface(&self, class: ClassId, interface: ClassId) -> bool {
        self.class_chain(class).any(|c| {
            c == interface
                || self
                    .class(c)
                    .interfaces
                    .iter()
                    .any(|i| i.class != c && self.implements_interface(i.class, interface))
        })
    }

    /// Clear everything a failed compile may have left on a class.
    ///
    /// Declared fields are detached from the class and its name indexes, so
    /// a later attempt starts from an empty class.
    pub fn reset_class(&mut self, id: ClassId) {
        let structs = std::mem::take(&mut self.class_mut(id).structs);
        for s in structs {
            let name = self.script_struct(s).name.clone();
            if self.struct_by_name.get(&name) == Some(&s) {
                self.struct_by_name.remove(&name);
            }
        }
        let enums = std::mem::take(&mut self.class_mut(id).enums);
        for e in enums {
            let entry = self.enumeration(e).clone();
            if self.enum_by_name.get(&entry.name) == Some(&e) {
                self.enum_by_name.remove(&entry.name);
            }
            for tag in &entry.tags {
                if let Some(owners) = self.enum_tags.get_mut(tag) {
                    owners.retain(|(owner, _)| *owner != e);
                }
            }
        }
        let mut functions = std::mem::take(&mut self.class_mut(id).functions);
        for state in std::mem::take(&mut self.class_mut(id).states) {
            functions.extend(std::mem::take(&mut self.state_mut(state).functions));
        }
        for f in functions {
            let name = self.function(f).name.clone();
            if let Some(ops) = self.operators.get_mut(&name) {
                ops.retain(|op| *op != f);
            }
        }
        let class = self.class_mut(id);
        class.properties.clear();
        class.consts.clear();
        class.interfaces.clear();
        class.script.clear();
        class.defaults.clear();
        class.defaults_imported = false;
        class.cpp_text = None;
        class.default_properties_text = None;
        class.flags.remove(ClassFlags::RECOMPILE_CLEAR);
    }

    // ==========================================================================
    // Structs
    // ==========================================================================

    /// Add a struct declared in `owner`.
    pub fn add_struct(&mut self, owner: ClassId, name: Name) -> Result<StructId, RegistrationError> {
        if self.struct_by_name.contains_key(&name) {
            return Err(RegistrationError::DuplicateStruct(name.to_string()));
        }
        let id = StructId::new(self.structs.len() as u32);
        self.structs.push(StructEntry::new(name.clone(), owner));
        self.struct_by_name.insert(name, id);
        self.class_mut(owner).structs.push(id);
        Ok(id)
    }

    /// Look up a struct by name.
    pub fn find_struct(&self, name: &str) -> Option<StructId> {
        self.struct_by_name.get(&Name::new(name)).copied()
    }

    /// Iterate a struct and its parents, nearest first.
    pub fn struct_chain(&self, id: StructId) -> impl Iterator<Item = StructId> + '_ {
        std::iter::successors(Some(id), move |s| self.script_struct(*s).super_struct)
    }

    /// Number of inheritance steps from struct `child` up to `parent`.
    pub fn struct_distance(&self, child: StructId, parent: StructId) -> Option<u32> {
        self.struct_chain(child)
            .position(|s| s == parent)
            .map(|d| d as u32)
    }

    // ==========================================================================
    // Enums
    // ==========================================================================

    /// Add an enum. `tags` must already include the `_MAX` sentinel.
    pub fn add_enum(&mut self, owner: ClassId, name: Name, tags: Vec<Name>) -> Result<EnumId, RegistrationError> {
        if self.enum_by_name.contains_key(&name) {
            return Err(RegistrationError::DuplicateEnum(name.to_string()));
        }
        let id = EnumId::new(self.enums.len() as u32);
        for (index, tag) in tags.iter().enumerate() {
            self.enum_tags
                .entry(tag.clone())
                .or_default()
                .push((id, index as u8));
        }
        self.enums.push(EnumEntry {
            name: name.clone(),
            owner,
            tags,
        });
        self.enum_by_name.insert(name, id);
        self.class_mut(owner).enums.push(id);
        Ok(id)
    }

    /// Look up an enum by name.
    pub fn find_enum(&self, name: &str) -> Option<EnumId> {
        self.enum_by_name.get(&Name::new(name)).copied()
    }

    /// Every enum declaring a tag, with the tag's value.
    pub fn find_enum_tag(&self, tag: &str) -> &[(EnumId, u8)] {
        self.enum_tags
            .get(&Name::new(tag))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // ==========================================================================
    // Fields
    // ==========================================================================

    /// Add a property to its owner.
    ///
    /// Function parameters go to the parameter list (or the return slot for
    /// the return value); anything else declared in a function is a local.
    pub fn add_property(&mut self, entry: PropertyEntry) -> PropertyId {
        let id = PropertyId::new(self.properties.len() as u32);
        let owner = entry.owner;
        let flags = entry.flags;
        self.properties.push(entry);
        match owner {
            FieldOwner::Class(c) => self.class_mut(c).properties.push(id),
            FieldOwner::Struct(s) => self.script_struct_mut(s).properties.push(id),
            FieldOwner::Function(f) => {
                let function = self.function_mut(f);
                if flags.contains(PropertyFlags::RETURN_PARM) {
                    function.return_param = Some(id);
                } else if flags.contains(PropertyFlags::PARM) {
                    function.params.push(id);
                } else {
                    function.locals.push(id);
                }
            }
            FieldOwner::State(s) => {
                let owner = self.state(s).owner;
                self.class_mut(owner).properties.push(id);
            }
        }
        id
    }

    /// Add a function to its owner.
    pub fn add_function(&mut self, entry: FunctionEntry) -> FunctionId {
        let id = FunctionId::new(self.functions.len() as u32);
        let owner = entry.owner;
        if entry.is_operator() {
            self.operators
                .entry(entry.name.clone())
                .or_default()
                .push(id);
        }
        self.functions.push(entry);
        match owner {
            FieldOwner::Class(c) => self.class_mut(c).functions.push(id),
            FieldOwner::State(s) => self.state_mut(s).functions.push(id),
            FieldOwner::Struct(_) | FieldOwner::Function(_) => {}
        }
        id
    }

    /// Add a state to a class.
    pub fn add_state(&mut self, owner: ClassId, name: Name) -> StateId {
        let id = StateId::new(self.states.len() as u32);
        self.states.push(StateEntry::new(name, owner));
        self.class_mut(owner).states.push(id);
        id
    }

    /// Add a constant.
    pub fn add_const(&mut self, entry: ConstEntry) -> ConstId {
        let id = ConstId::new(self.consts.len() as u32);
        let class = match entry.owner {
            FieldOwner::Class(c) => Some(c),
            FieldOwner::Struct(s) => Some(self.script_struct(s).owner),
            FieldOwner::State(s) => Some(self.state(s).owner),
            FieldOwner::Function(_) => None,
        };
        self.consts.push(entry);
        if let Some(class) = class {
            self.class_mut(class).consts.push(id);
        }
        id
    }

    /// The class a function belongs to.
    pub fn function_class(&self, id: FunctionId) -> ClassId {
        match self.function(id).owner {
            FieldOwner::Class(c) => c,
            FieldOwner::State(s) => self.state(s).owner,
            FieldOwner::Struct(s) => self.script_struct(s).owner,
            FieldOwner::Function(f) => self.function_class(f),
        }
    }

    /// The class a property belongs to, following struct and function owners.
    pub fn property_class(&self, id: PropertyId) -> ClassId {
        match self.property(id).owner {
            FieldOwner::Class(c) => c,
            FieldOwner::State(s) => self.state(s).owner,
            FieldOwner::Struct(s) => self.script_struct(s).owner,
            FieldOwner::Function(f) => self.function_class(f),
        }
    }

    /// Find a property declared directly by `owner`.
    pub fn find_own_property(&self, owner: FieldOwner, name: &str) -> Option<PropertyId> {
        let list: Vec<PropertyId> = match owner {
            FieldOwner::Class(c) => self.class(c).properties.clone(),
            FieldOwner::Struct(s) => self.script_struct(s).properties.clone(),
            FieldOwner::Function(f) => {
                let func = self.function(f);
                func.params
                    .iter()
                    .chain(func.return_param.iter())
                    .chain(func.locals.iter())
                    .copied()
                    .collect()
            }
            FieldOwner::State(_) => Vec::new(),
        };
        list.into_iter().find(|p| self.property(*p).name == name)
    }

    /// Find a member variable of a class or any of its ancestors.
    pub fn find_class_property(&self, class: ClassId, name: &str) -> Option<PropertyId> {
        self.class_chain(class)
            .find_map(|c| self.find_own_property(FieldOwner::Class(c), name))
    }

    /// Find a member of a struct or any of its parents.
    pub fn find_struct_member(&self, id: StructId, name: &str) -> Option<PropertyId> {
        self.struct_chain(id)
            .find_map(|s| self.find_own_property(FieldOwner::Struct(s), name))
    }

    /// Every member of a struct, parents first.
    pub fn struct_members(&self, id: StructId) -> Vec<PropertyId> {
        let mut chain: Vec<StructId> = self.struct_chain(id).collect();
        chain.reverse();
        chain
            .into_iter()
            .flat_map(|s| self.script_struct(s).properties.clone())
            .collect()
    }

    /// Every member variable of a class, root class first.
    pub fn class_properties(&self, class: ClassId) -> Vec<PropertyId> {
        let mut chain: Vec<ClassId> = self.class_chain(class).collect();
        chain.reverse();
        chain
            .into_iter()
            .flat_map(|c| self.class(c).properties.clone())
            .collect()
    }

    /// Find a state by name in a class or its ancestors.
    pub fn find_state(&self, class: ClassId, name: &str) -> Option<StateId> {
        self.class_chain(class).find_map(|c| {
            self.class(c)
                .states
                .iter()
                .copied()
                .find(|s| self.state(*s).name == name)
        })
    }

    /// Find a function declared directly in a class (not in its states).
    pub fn find_own_function(&self, class: ClassId, name: &str) -> Option<FunctionId> {
        self.class(class)
            .functions
            .iter()
            .copied()
            .find(|f| self.function(*f).name == name)
    }

    /// Find a class-scope function in a class or its ancestors.
    pub fn find_class_function(&self, class: ClassId, name: &str) -> Option<FunctionId> {
        self.class_chain(class)
            .find_map(|c| self.find_own_function(c, name))
    }

    /// Find a function in a state or the states it extends.
    pub fn find_state_function(&self, state: StateId, name: &str) -> Option<FunctionId> {
        std::iter::successors(Some(state), |s| self.state(*s).super_state).find_map(|s| {
            self.state(s)
                .functions
                .iter()
                .copied()
                .find(|f| self.function(*f).name == name)
        })
    }

    /// Find a function visible from code in `class`, optionally inside
    /// `state`. State functions hide class functions.
    pub fn find_function(&self, class: ClassId, state: Option<StateId>, name: &str) -> Option<FunctionId> {
        state
            .and_then(|s| self.find_state_function(s, name))
            .or_else(|| self.find_class_function(class, name))
    }

    /// Find a constant visible from `class`, falling back to any class.
    pub fn find_const(&self, class: Option<ClassId>, name: &str) -> Option<ConstId> {
        if let Some(class) = class {
            for c in self.class_chain(class) {
                if let Some(id) = self
                    .class(c)
                    .consts
                    .iter()
                    .copied()
                    .find(|k| self.constant(*k).name == name)
                {
                    return Some(id);
                }
            }
        }
        (0..self.consts.len() as u32)
            .map(ConstId::new)
            .find(|k| self.constant(*k).name == name)
    }

    /// Every operator function declared with `symbol`.
    pub fn operators(&self, symbol: &str) -> &[FunctionId] {
        self.operators
            .get(&Name::new(symbol))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // ==========================================================================
    // Display
    // ==========================================================================

    /// Script spelling of a type, for messages.
    pub fn type_name(&self, ty: &PropertyType) -> String {
        match ty {
            PropertyType::None => "None".to_string(),
            PropertyType::Byte { enum_: Some(e) } => self.enumeration(*e).name.to_string(),
            PropertyType::Byte { enum_: None } => "byte".to_string(),
            PropertyType::Int => "int".to_string(),
            PropertyType::Bool => "bool".to_string(),
            PropertyType::Float => "float".to_string(),
            PropertyType::Name => "name".to_string(),
            PropertyType::String => "string".to_string(),
            PropertyType::Struct(s) => self.script_struct(*s).name.to_string(),
            PropertyType::Object { class: None, .. } => "None".to_string(),
            PropertyType::Object {
                meta: Some(meta), ..
            } => format!("class<{}>", self.class(*meta).name),
            PropertyType::Object {
                class: Some(c),
                meta: None,
            } => self.class(*c).name.to_string(),
            PropertyType::Interface(c) => self.class(*c).name.to_string(),
            PropertyType::Delegate { function: Some(f) } => {
                format!("delegate<{}>", self.function(*f).name)
            }
            PropertyType::Delegate { function: None } => "delegate".to_string(),
            PropertyType::Array(inner) => format!("array<{}>", self.type_name(inner)),
            PropertyType::Map { export_text } => format!("map{{{}}}", export_text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unrealscript_core::FunctionFlags;

    fn core() -> (Registry, ClassId) {
        let mut registry = Registry::new();
        let object = registry
            .add_class(Name::new("Object"), Name::new("Core"))
            .unwrap();
        (registry, object)
    }

    #[test]
    fn object_becomes_root_and_class_extends_it() {
        let (registry, object) = core();
        assert_eq!(registry.object_class(), Some(object));
        let class_class = registry.class_class();
        assert!(registry.is_child_of(class_class, object));
        assert!(registry.class(class_class).flags.contains(ClassFlags::INTRINSIC));
    }

    #[test]
    fn duplicate_class_is_rejected() {
        let (mut registry, _) = core();
        let err = registry
            .add_class(Name::new("OBJECT"), Name::new("Core"))
            .unwrap_err();
        assert_eq!(err, RegistrationError::DuplicateClass("OBJECT".into()));
    }

    #[test]
    fn inheritance_distance() {
        let (mut registry, object) = core();
        let actor = registry.add_class(Name::new("Actor"), Name::new("Engine")).unwrap();
        let pawn = registry.add_class(Name::new("Pawn"), Name::new("Engine")).unwrap();
        registry.class_mut(actor).super_class = Some(object);
        registry.class_mut(pawn).super_class = Some(actor);
        assert_eq!(registry.inheritance_distance(pawn, object), Some(2));
        assert_eq!(registry.inheritance_distance(pawn, pawn), Some(0));
        assert_eq!(registry.inheritance_distance(actor, pawn), None);
    }

    #[test]
    fn function_parameters_are_sorted_by_flags() {
        let (mut registry, object) = core();
        let f = registry.add_function(FunctionEntry::new(Name::new("Clamp"), FieldOwner::Class(object)));
        let owner = FieldOwner::Function(f);
        let mut a = PropertyEntry::new(Name::new("V"), owner, PropertyType::Int);
        a.flags = PropertyFlags::PARM;
        let mut r = PropertyEntry::new(Name::new("ReturnValue"), owner, PropertyType::Int);
        r.flags = PropertyFlags::PARM | PropertyFlags::RETURN_PARM | PropertyFlags::OUT_PARM;
        let l = PropertyEntry::new(Name::new("Tmp"), owner, PropertyType::Int);
        let a = registry.add_property(a);
        let r = registry.add_property(r);
        let l = registry.add_property(l);
        let func = registry.function(f);
        assert_eq!(func.params, vec![a]);
        assert_eq!(func.return_param, Some(r));
        assert_eq!(func.locals, vec![l]);
        assert_eq!(registry.find_own_property(owner, "tmp"), Some(l));
    }

    #[test]
    fn state_functions_hide_class_functions() {
        let (mut registry, object) = core();
        let class_fn = registry.add_function(FunctionEntry::new(Name::new("Tick"), FieldOwner::Class(object)));
        let state = registry.add_state(object, Name::new("Idle"));
        let state_fn = registry.add_function(FunctionEntry::new(Name::new("Tick"), FieldOwner::State(state)));
        assert_eq!(registry.find_function(object, Some(state), "tick"), Some(state_fn));
        assert_eq!(registry.find_function(object, None, "tick"), Some(class_fn));
    }

    #[test]
    fn operators_are_indexed_by_symbol() {
        let (mut registry, object) = core();
        let mut op = FunctionEntry::new(Name::new("+"), FieldOwner::Class(object));
        op.flags = FunctionFlags::OPERATOR | FunctionFlags::STATIC | FunctionFlags::FINAL;
        let id = registry.add_function(op);
        assert_eq!(registry.operators("+"), &[id]);
        assert!(registry.operators("-").is_empty());
    }

    #[test]
    fn enum_tags_are_indexed() {
        let (mut registry, object) = core();
        let tags = ["PHYS_None", "PHYS_Walking", "EPhysics_MAX"]
            .into_iter()
            .map(Name::new)
            .collect();
        let e = registry.add_enum(object, Name::new("EPhysics"), tags).unwrap();
        assert_eq!(registry.find_enum_tag("phys_walking"), &[(e, 1)]);
        assert_eq!(registry.enumeration(e).declared_tags().len(), 2);
        assert_eq!(registry.type_name(&PropertyType::Byte { enum_: Some(e) }), "EPhysics");
    }

    #[test]
    fn reset_class_detaches_fields() {
        let (mut registry, object) = core();
        registry.add_struct(object, Name::new("Vector")).unwrap();
        registry.add_property(PropertyEntry::new(
            Name::new("X"),
            FieldOwner::Class(object),
            PropertyType::Int,
        ));
        registry.class_mut(object).flags |= ClassFlags::PARSED;
        registry.reset_class(object);
        assert!(registry.find_struct("Vector").is_none());
        assert!(registry.class(object).properties.is_empty());
        assert!(!registry.class(object).flags.contains(ClassFlags::PARSED));
    }

    #[test]
    fn type_names() {
        let (registry, object) = core();
        let class_of = PropertyType::Object {
            class: Some(registry.class_class()),
            meta: Some(object),
        };
        assert_eq!(registry.type_name(&class_of), "class<Object>");
        assert_eq!(
            registry.type_name(&PropertyType::Array(Box::new(PropertyType::object(object)))),
            "array<Object>"
        );
    }
}
