//! `class` and `interface` statements, and the interface contract check.

use unrealscript_core::{
    ClassFlags, ClassId, FieldOwner, FunctionFlags, Name, PlatformFlags, PropertyFlags,
    PropertyId, PropertyType,
};
use unrealscript_parser::Token;
use unrealscript_registry::{ImplementedInterface, OBJECT_CLASS_NAME, PropertyEntry};

use super::name_list;
use crate::compiler::{Result, ScriptCompiler, token_error};
use crate::conversion::signatures_match;
use crate::metadata::TokenData;
use crate::nest::{NestKind, NestNode};

impl<'a> ScriptCompiler<'a> {
    /// `class Name [extends Parent] [specifiers] ;`
    pub(crate) fn compile_class_declaration(&mut self) -> Result<()> {
        let tooltip = self.lexer.take_comment();
        self.expect_class_name()?;

        let class_name = self.class_name();
        if self.match_identifier("extends")? {
            let parent = self.expect_name("parent class name")?;
            let parent_id = self.registry.find_class(&parent.text).ok_or_else(|| {
                token_error(
                    &parent,
                    format!("Superclass {} of class {} not found", parent.text, class_name),
                )
            })?;
            if parent_id == self.class || self.registry.is_child_of(parent_id, self.class) {
                return Err(token_error(
                    &parent,
                    format!("Class '{}' can't extend itself", class_name),
                ));
            }
            if self.registry.class(parent_id).is_interface() {
                return Err(token_error(
                    &parent,
                    format!("Class '{}' can't extend interface '{}'", class_name, parent.text),
                ));
            }
            self.set_super_class(parent_id);
        } else if !class_name.matches(OBJECT_CLASS_NAME) {
            return Err(self.declaration_error(format!(
                "Class '{}' must extend another class",
                class_name
            )));
        }

        self.push_nest(NestKind::Class, NestNode::Class(self.class))?;
        loop {
            let token = self.get_word()?;
            if token.matches_symbol(";") {
                break;
            }
            if token.is_eof() {
                return Err(self.declaration_error("Missing ';' after class declaration"));
            }
            self.compile_class_specifier(&token)?;
        }
        self.validate_class()?;
        self.add_vftable_properties()?;

        if let Some(text) = tooltip {
            self.class_meta_mut()?.metadata.insert("ToolTip".into(), text);
        }
        tracing::debug!(class = %class_name, "class declared");
        Ok(())
    }

    /// `interface Name [extends Parent] [specifiers] ;`
    pub(crate) fn compile_interface_declaration(&mut self) -> Result<()> {
        let tooltip = self.lexer.take_comment();
        self.expect_class_name()?;

        let class_name = self.class_name();
        let parent_id = if self.match_identifier("extends")? {
            let parent = self.expect_name("parent interface name")?;
            let id = self.registry.find_class(&parent.text).ok_or_else(|| {
                token_error(
                    &parent,
                    format!("Superclass {} of interface {} not found", parent.text, class_name),
                )
            })?;
            let entry = self.registry.class(id);
            if !entry.is_interface() && !entry.name.matches("Interface") {
                return Err(token_error(
                    &parent,
                    format!("Interface '{}' can only extend another interface", class_name),
                ));
            }
            Some(id)
        } else {
            self.registry
                .find_class("Interface")
                .filter(|id| *id != self.class)
                .or_else(|| self.registry.object_class())
        };
        if let Some(parent_id) = parent_id {
            self.set_super_class(parent_id);
        }
        self.registry.class_mut(self.class).flags |= ClassFlags::INTERFACE | ClassFlags::ABSTRACT;

        self.push_nest(NestKind::Interface, NestNode::Class(self.class))?;
        loop {
            let token = self.get_word()?;
            if token.matches_symbol(";") {
                break;
            }
            if token.is_eof() {
                return Err(self.declaration_error("Missing ';' after interface declaration"));
            }
            if token.matches_identifier("native") {
                self.registry.class_mut(self.class).flags |= ClassFlags::NATIVE;
                self.compile_header_group()?;
            } else if token.matches_identifier("nativeonly") {
                self.registry.class_mut(self.class).flags |= ClassFlags::NATIVE | ClassFlags::NATIVE_ONLY;
            } else if token.matches_identifier("dependson") {
                let names = name_list(&mut self.lexer)?;
                self.registry.class_mut(self.class).depends_on.extend(names);
            } else {
                return Err(token_error(
                    &token,
                    format!("Unknown interface specifier '{}'", token.text),
                ));
            }
        }

        if let Some(text) = tooltip {
            self.class_meta_mut()?.metadata.insert("ToolTip".into(), text);
        }
        Ok(())
    }

    fn expect_class_name(&mut self) -> Result<()> {
        let name = self.expect_name("class name")?;
        let expected = self.class_name();
        if !expected.matches(&name.text) {
            return Err(token_error(
                &name,
                format!("Script vs. class name mismatch ({} vs {})", expected, name.text),
            ));
        }
        Ok(())
    }

    fn set_super_class(&mut self, parent: ClassId) {
        let parent_entry = self.registry.class(parent);
        let inherited = parent_entry.flags & ClassFlags::INHERIT;
        let within = parent_entry.within;
        let config_name = parent_entry.config_name.clone();
        let class = self.registry.class_mut(self.class);
        class.super_class = Some(parent);
        class.flags |= inherited;
        class.within = within;
        class.config_name = config_name;
    }

    /// `native` may name the header group the class is exported into.
    fn compile_header_group(&mut self) -> Result<()> {
        if self.match_symbol("(")? {
            let group = self.expect_name("header group name")?;
            self.require_symbol(")", "native specifier")?;
            self.registry.class_mut(self.class).header_group = Some(group.text);
        }
        Ok(())
    }

    fn compile_class_specifier(&mut self, token: &Token) -> Result<()> {
        let class = self.class;
        let word = token.text.to_ascii_lowercase();
        match word.as_str() {
            "native" => {
                self.registry.class_mut(class).flags |= ClassFlags::NATIVE;
                self.compile_header_group()?;
            }
            "nativereplication" => {
                self.registry.class_mut(class).flags |= ClassFlags::NATIVE_REPLICATION;
            }
            "noexport" => self.registry.class_mut(class).flags |= ClassFlags::NO_EXPORT,
            "nativeonly" => self.registry.class_mut(class).flags |= ClassFlags::NATIVE_ONLY,
            "abstract" => self.registry.class_mut(class).flags |= ClassFlags::ABSTRACT,
            "transient" => self.registry.class_mut(class).flags |= ClassFlags::TRANSIENT,
            "nontransient" => self.registry.class_mut(class).flags -= ClassFlags::TRANSIENT,
            "config" => {
                let name = if self.match_symbol("(")? {
                    let name = self.expect_name("config file name")?;
                    self.require_symbol(")", "config specifier")?;
                    Some(Name::new(&name.text))
                } else {
                    None
                };
                let entry = self.registry.class_mut(class);
                entry.flags |= ClassFlags::CONFIG;
                match name {
                    // `config(inherit)` keeps the parent's file.
                    Some(name) if !name.matches("inherit") => entry.config_name = name,
                    Some(_) => {}
                    None if entry.config_name.is_none() => entry.config_name = Name::new("System"),
                    None => {}
                }
            }
            "perobjectconfig" => {
                self.registry.class_mut(class).flags |= ClassFlags::PER_OBJECT_CONFIG;
            }
            "perobjectlocalized" => {
                self.registry.class_mut(class).flags |= ClassFlags::PER_OBJECT_LOCALIZED;
            }
            "localized" => self.registry.class_mut(class).flags |= ClassFlags::LOCALIZED,
            "placeable" => self.registry.class_mut(class).flags |= ClassFlags::PLACEABLE,
            "notplaceable" => self.registry.class_mut(class).flags -= ClassFlags::PLACEABLE,
            "editinlinenew" => self.registry.class_mut(class).flags |= ClassFlags::EDIT_INLINE_NEW,
            "noteditinlinenew" => {
                self.registry.class_mut(class).flags -= ClassFlags::EDIT_INLINE_NEW;
            }
            "collapsecategories" => {
                self.registry.class_mut(class).flags |= ClassFlags::COLLAPSE_CATEGORIES;
            }
            "dontcollapsecategories" => {
                self.registry.class_mut(class).flags -= ClassFlags::COLLAPSE_CATEGORIES;
            }
            "hidedropdown" => self.registry.class_mut(class).flags |= ClassFlags::HIDE_DROP_DOWN,
            "deprecated" => self.registry.class_mut(class).flags |= ClassFlags::DEPRECATED,
            "safereplace" => self.registry.class_mut(class).flags |= ClassFlags::SAFE_REPLACE,
            "hidecategories" => {
                let names = name_list(&mut self.lexer)?;
                let entry = self.registry.class_mut(class);
                entry.show_categories.retain(|c| !names.contains(c));
                entry.hide_categories.extend(names);
            }
            "showcategories" => {
                let names = name_list(&mut self.lexer)?;
                let entry = self.registry.class_mut(class);
                entry.hide_categories.retain(|c| !names.contains(c));
                entry.show_categories.extend(names);
            }
            "autoexpandcategories" => {
                let names = name_list(&mut self.lexer)?;
                self.registry.class_mut(class).auto_expand_categories.extend(names);
            }
            "dontsortcategories" => {
                let names = name_list(&mut self.lexer)?;
                self.registry.class_mut(class).dont_sort_categories.extend(names);
            }
            "classgroup" => {
                name_list(&mut self.lexer)?;
            }
            "dependson" => {
                let names = name_list(&mut self.lexer)?;
                for name in &names {
                    if self.registry.find_class(name.as_str()).is_none() {
                        return Err(token_error(
                            token,
                            format!("Class '{}' named in DependsOn not found", name),
                        ));
                    }
                }
                self.registry.class_mut(class).depends_on.extend(names);
            }
            "implements" => {
                for name in name_list(&mut self.lexer)? {
                    let interface = self
                        .registry
                        .find_class(name.as_str())
                        .ok_or_else(|| token_error(token, format!("Interface '{}' not found", name)))?;
                    if !self.registry.class(interface).is_interface() {
                        return Err(token_error(
                            token,
                            format!("Class '{}' is not an interface", name),
                        ));
                    }
                    let entry = self.registry.class_mut(class);
                    if entry.interfaces.iter().all(|i| i.class != interface) {
                        entry.interfaces.push(ImplementedInterface {
                            class: interface,
                            pointer_property: None,
                        });
                    }
                }
            }
            "inherits" => {
                let names = name_list(&mut self.lexer)?;
                let meta = self.class_meta_mut()?;
                meta.inheritance_parents
                    .extend(names.iter().map(|n| n.to_string()));
            }
            "platform" => {
                let mut platforms = PlatformFlags::empty();
                for name in name_list(&mut self.lexer)? {
                    platforms |= PlatformFlags::from_platform_name(name.as_str()).ok_or_else(|| {
                        token_error(token, format!("Unknown platform '{}'", name))
                    })?;
                }
                self.registry.class_mut(class).platform_flags = platforms;
            }
            "within" => {
                let outer = self.expect_name("'within' class name")?;
                let outer_id = self.registry.find_class(&outer.text).ok_or_else(|| {
                    token_error(&outer, format!("Within class '{}' not found", outer.text))
                })?;
                let inherited = self.registry.class(class).within;
                if let Some(required) = inherited
                    && !self.registry.is_child_of(outer_id, required)
                {
                    return Err(token_error(
                        &outer,
                        format!(
                            "Within class {} must be a child of {}",
                            outer.text,
                            self.registry.class(required).name
                        ),
                    ));
                }
                self.registry.class_mut(class).within = Some(outer_id);
            }
            _ => {
                return Err(token_error(
                    token,
                    format!("Unknown class specifier '{}'", token.text),
                ));
            }
        }
        Ok(())
    }

    /// Specifier combinations that only make sense together.
    fn validate_class(&mut self) -> Result<()> {
        let entry = self.registry.class(self.class);
        if entry.flags.contains(ClassFlags::NO_EXPORT) && !entry.is_native() {
            return Err(self.declaration_error("'noexport' is only valid for native classes"));
        }
        if entry.flags.contains(ClassFlags::NATIVE_REPLICATION) && !entry.is_native() {
            return Err(self.declaration_error(
                "'nativereplication' is only valid for native classes",
            ));
        }
        if entry.is_native()
            && let Some(parent) = entry.super_class
            && !self.registry.class(parent).is_native()
        {
            return Err(self.declaration_error(format!(
                "Native classes cannot extend non-native classes ({} extends {})",
                entry.name,
                self.registry.class(parent).name
            )));
        }
        let inherits = self
            .session
            .metadata
            .find_class_data(self.class)
            .is_some_and(|m| !m.inheritance_parents.is_empty());
        if inherits && !entry.is_native() {
            return Err(self.declaration_error("'inherits' is only valid for native classes"));
        }
        Ok(())
    }

    /// Hidden pointer properties standing in for native vtables, one per
    /// native interface and one per `inherits` parent.
    fn add_vftable_properties(&mut self) -> Result<()> {
        if !self.class_entry().is_native() {
            return Ok(());
        }
        let pointer = self
            .registry
            .find_struct("Pointer")
            .map(PropertyType::Struct)
            .unwrap_or(PropertyType::Int);

        let interfaces = self.class_entry().interfaces.clone();
        for (index, interface) in interfaces.iter().enumerate() {
            if !self.registry.class(interface.class).is_native() {
                continue;
            }
            let name = format!("VfTable_I{}", self.registry.class(interface.class).name);
            let property = self.add_vftable_property(&name, pointer.clone());
            self.registry.class_mut(self.class).interfaces[index].pointer_property = Some(property);
        }

        let parents = self
            .session
            .metadata
            .find_class_data(self.class)
            .map(|m| m.inheritance_parents.clone())
            .unwrap_or_default();
        for parent in parents {
            self.add_vftable_property(&format!("VfTable_{}", parent), pointer.clone());
        }
        Ok(())
    }

    fn add_vftable_property(&mut self, name: &str, ty: PropertyType) -> PropertyId {
        let mut entry = PropertyEntry::new(Name::new(name), FieldOwner::Class(self.class), ty);
        entry.flags = PropertyFlags::CONST | PropertyFlags::NATIVE | PropertyFlags::NO_EXPORT;
        let id = self.registry.add_property(entry);
        let data = TokenData {
            declared_line: self.lexer.line(),
            ..TokenData::default()
        };
        self.session.metadata.add_property(self.class, id, data);
        id
    }

    /// Every function of every implemented interface must be implemented
    /// somewhere in the class chain of a concrete class.
    pub(crate) fn check_interface_contracts(&mut self) -> Result<()> {
        let entry = self.class_entry();
        if entry.flags.contains(ClassFlags::ABSTRACT) || entry.is_interface() {
            return Ok(());
        }
        let mut interfaces: Vec<ClassId> = Vec::new();
        for class in self.registry.class_chain(self.class) {
            for implemented in &self.registry.class(class).interfaces {
                for iface in self.registry.class_chain(implemented.class) {
                    if self.registry.class(iface).is_interface() && !interfaces.contains(&iface) {
                        interfaces.push(iface);
                    }
                }
            }
        }

        for interface in interfaces {
            let functions = self.registry.class(interface).functions.clone();
            for function in functions {
                let required = self.registry.function(function);
                if required.flags.intersects(FunctionFlags::DELEGATE | FunctionFlags::NATIVE) {
                    continue;
                }
                let name = required.name.clone();
                let interface_name = self.registry.class(interface).name.clone();
                let Some(found) = self.registry.find_class_function(self.class, name.as_str()) else {
                    return Err(self.declaration_error(format!(
                        "Missing implementation of '{}' from interface '{}'",
                        name, interface_name
                    )));
                };
                if !signatures_match(self.registry, found, function) {
                    return Err(self.declaration_error(format!(
                        "Implementation of '{}' differs from interface '{}'",
                        name, interface_name
                    )));
                }
            }
        }
        Ok(())
    }
}
