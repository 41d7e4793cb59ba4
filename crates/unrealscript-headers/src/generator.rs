//! Native header text for one header group of a package.
//!
//! Classes are written in name order, each after its parent and its
//! `DependsOn` classes when those share the header. Every class brings its
//! enums, consts, structs and event parameter structs along, followed by the
//! class declaration itself.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;
use unrealscript_compiler::CompilationSession;
use unrealscript_core::{ClassFlags, ClassId, FunctionFlags, FunctionId, Name, PropertyFlags, PropertyKind, PropertyType, StructId};
use unrealscript_registry::{ClassEntry, Registry};

use crate::cpp::{self, TypeUse};
use crate::diff::{begin_props_marker, end_props_marker, has_parent_class_changed, have_properties_changed};

/// Whether a class gets a declaration in its package's headers.
pub fn exports_header(entry: &ClassEntry) -> bool {
    entry.is_native() && !entry.flags.intersects(ClassFlags::NO_EXPORT | ClassFlags::INTRINSIC)
}

/// `<Package><Group>Classes.h`.
pub fn header_file_name(package: &Name, group: Option<&str>) -> String {
    format!("{}{}Classes.h", package, group.unwrap_or(""))
}

/// Output of one [`NativeHeaderGenerator::generate`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedHeader {
    pub file_name: String,
    pub text: String,
    /// Exported classes, parents before children.
    pub classes: Vec<ClassId>,
    /// Classes whose base class or member block differs from the previous
    /// header.
    pub changed: FxHashSet<ClassId>,
}

/// Builds the header for one `(package, group)` pair.
pub struct NativeHeaderGenerator<'a> {
    registry: &'a Registry,
    session: &'a mut CompilationSession,
    package: Name,
    group: Option<String>,
    previous: Option<&'a str>,
}

/// Native functions, events and delegates of one class.
struct ClassFunctions {
    natives: Vec<FunctionId>,
    events: Vec<FunctionId>,
    delegates: Vec<FunctionId>,
}

impl<'a> NativeHeaderGenerator<'a> {
    pub fn new(
        registry: &'a Registry,
        session: &'a mut CompilationSession,
        package: Name,
        group: Option<String>,
    ) -> Self {
        Self {
            registry,
            session,
            package,
            group,
            previous: None,
        }
    }

    /// Compare against the header currently on disk.
    pub fn with_previous(mut self, previous: Option<&'a str>) -> Self {
        self.previous = previous;
        self
    }

    /// Exported classes of this package and group, sorted by name.
    pub fn classes_in_group(&self) -> Vec<ClassId> {
        let mut classes: Vec<ClassId> = self
            .registry
            .class_ids()
            .filter(|&id| {
                let entry = self.registry.class(id);
                entry.package == self.package
                    && exports_header(entry)
                    && entry.header_group.as_deref() == self.group.as_deref()
            })
            .collect();
        classes.sort_by_key(|&id| self.registry.class(id).name.as_str().to_ascii_lowercase());
        classes
    }

    /// `classes` reordered so parents and `DependsOn` targets in the same
    /// header come first. A dependency cycle is cut where it closes.
    fn dependency_order(&self, classes: &[ClassId]) -> Vec<ClassId> {
        let members: FxHashSet<ClassId> = classes.iter().copied().collect();
        let mut order = Vec::with_capacity(classes.len());
        let mut visiting = FxHashSet::default();
        for &class in classes {
            self.visit(class, &members, &mut visiting, &mut order);
        }
        order
    }

    fn visit(
        &self,
        class: ClassId,
        members: &FxHashSet<ClassId>,
        visiting: &mut FxHashSet<ClassId>,
        order: &mut Vec<ClassId>,
    ) {
        if order.contains(&class) || !visiting.insert(class) {
            return;
        }
        let entry = self.registry.class(class);
        let mut before: Vec<ClassId> = entry.super_class.into_iter().collect();
        before.extend(
            entry
                .depends_on
                .iter()
                .filter_map(|name| self.registry.find_class(name.as_str())),
        );
        for dependency in before {
            if members.contains(&dependency) {
                self.visit(dependency, members, visiting, order);
            }
        }
        visiting.remove(&class);
        order.push(class);
    }

    fn cpp_name(&mut self, class: ClassId) -> String {
        self.session.cpp_names.name_of(self.registry, class)
    }

    fn api(&self) -> String {
        self.package.as_str().to_ascii_uppercase()
    }

    fn guard(&self) -> String {
        format!(
            "{}{}",
            self.api(),
            self.group.as_deref().unwrap_or("").to_ascii_uppercase()
        )
    }

    fn functions_of(&self, class: ClassId) -> ClassFunctions {
        let mut functions = ClassFunctions {
            natives: Vec::new(),
            events: Vec::new(),
            delegates: Vec::new(),
        };
        for &id in &self.registry.class(class).functions {
            let entry = self.registry.function(id);
            if entry.flags.contains(FunctionFlags::NO_EXPORT) {
                continue;
            }
            if entry.flags.contains(FunctionFlags::NATIVE) {
                functions.natives.push(id);
            } else if entry.super_function.is_some() {
                // Proxies live with the first declaration.
                continue;
            } else if entry.is_delegate() {
                functions.delegates.push(id);
            } else if entry.flags.contains(FunctionFlags::EVENT) {
                functions.events.push(id);
            }
        }
        functions
    }

    /// Generate the header text and work out which classes changed.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn generate(&mut self) -> GeneratedHeader {
        let classes = self.dependency_order(&self.classes_in_group());
        let api = self.api();
        let guard = self.guard();
        let mut changed = FxHashSet::default();

        let mut names = BTreeSet::new();
        let mut body = String::new();
        let mut autogen_functions = String::new();
        for &class in &classes {
            let functions = self.functions_of(class);
            for &id in functions.events.iter().chain(&functions.delegates) {
                names.insert(self.registry.function(id).name.to_string());
            }
            let cpp = self.cpp_name(class);
            for &id in &functions.natives {
                let entry = self.registry.function(id);
                let index = if entry.native_index > 0 {
                    i32::from(entry.native_index)
                } else {
                    -1
                };
                autogen_functions.push_str(&format!(
                    "AUTOGENERATE_FUNCTION({},{},exec{});\n",
                    cpp, index, entry.friendly_name
                ));
            }

            body.push_str(&self.export_types(class));
            body.push_str(&self.export_parms_structs(class, &functions));
            let (text, block, super_cpp) = self.export_class(class, &functions);
            body.push_str(&text);

            if let Some(previous) = self.previous {
                let name = self.registry.class(class).name.to_string();
                if has_parent_class_changed(previous, &cpp, &super_cpp)
                    || have_properties_changed(previous, &name, &block)
                {
                    changed.insert(class);
                }
            } else {
                changed.insert(class);
            }
        }

        let mut out = String::with_capacity(body.len() + 2048);
        out.push_str(BANNER);
        out.push_str("#if SUPPORTS_PRAGMA_PACK\n#pragma pack (push,4)\n#endif\n\n");

        out.push_str("#ifndef NAMES_ONLY\n");
        out.push_str(&format!(
            "#define AUTOGENERATE_NAME(name) extern FName {}_##name;\n",
            api
        ));
        out.push_str("#define AUTOGENERATE_FUNCTION(cls,idx,name)\n#endif\n\n");
        for name in &names {
            out.push_str(&format!("AUTOGENERATE_NAME({})\n", name));
        }
        if !names.is_empty() {
            out.push('\n');
        }

        out.push_str("#ifndef NAMES_ONLY\n\n");
        out.push_str(&format!(
            "#ifndef INCLUDED_{}_CLASSES_H\n#define INCLUDED_{}_CLASSES_H 1\n",
            guard, guard
        ));
        out.push_str("#define ENABLE_DECLARECLASS_MACRO 1\n#include \"UnObjBas.h\"\n#undef ENABLE_DECLARECLASS_MACRO\n\n");
        out.push_str(&body);
        out.push_str(&format!("#endif // !INCLUDED_{}_CLASSES_H\n", guard));
        out.push_str("#endif // !NAMES_ONLY\n\n");

        out.push_str(&autogen_functions);
        if !autogen_functions.is_empty() {
            out.push('\n');
        }
        out.push_str("#ifndef NAMES_ONLY\n#undef AUTOGENERATE_NAME\n#undef AUTOGENERATE_FUNCTION\n#endif\n\n");

        out.push_str(&self.export_static_linking(&classes));
        out.push_str(&self.export_size_checks(&classes));
        out.push_str("#if SUPPORTS_PRAGMA_PACK\n#pragma pack (pop)\n#endif\n");

        tracing::debug!(
            package = %self.package,
            group = self.group.as_deref().unwrap_or(""),
            classes = classes.len(),
            changed = changed.len(),
            "generated header"
        );
        GeneratedHeader {
            file_name: header_file_name(&self.package, self.group.as_deref()),
            text: out,
            classes,
            changed,
        }
    }

    /// Enums, consts and structs declared in `class`.
    fn export_types(&mut self, class: ClassId) -> String {
        let mut out = String::new();
        let registry = self.registry;
        let entry = registry.class(class);

        for &id in &entry.enums {
            let enumeration = registry.enumeration(id);
            out.push_str(&format!("enum {}\n{{\n", enumeration.name));
            for (index, tag) in enumeration.tags.iter().enumerate() {
                out.push_str(&format!("    {:<32}={},\n", tag.as_str(), index));
            }
            out.push_str("};\n");
            out.push_str(&format!(
                "#define FOREACH_ENUM_{}(op) \\\n",
                enumeration.name.as_str().to_ascii_uppercase()
            ));
            for tag in enumeration.declared_tags() {
                out.push_str(&format!("    op({}) \\\n", tag));
            }
            out.push('\n');
        }

        for &id in &entry.consts {
            let constant = registry.constant(id);
            let value = if constant.value_text.starts_with('"') {
                format!("TEXT({})", constant.value_text)
            } else {
                constant.value_text.clone()
            };
            out.push_str(&format!("#define UCONST_{} {}\n", constant.name, value));
        }
        if !entry.consts.is_empty() {
            out.push('\n');
        }

        let mut written = FxHashSet::default();
        for &id in &entry.structs {
            self.export_struct(class, id, &mut written, &mut out);
        }
        out
    }

    /// One struct, after its parent when the parent is declared in the same
    /// class.
    fn export_struct(
        &mut self,
        class: ClassId,
        id: StructId,
        written: &mut FxHashSet<StructId>,
        out: &mut String,
    ) {
        if !written.insert(id) {
            return;
        }
        let registry = self.registry;
        let entry = registry.script_struct(id);
        if let Some(parent) = entry.super_struct
            && registry.script_struct(parent).owner == class
        {
            self.export_struct(class, parent, written, out);
        }

        match entry.super_struct {
            Some(parent) => out.push_str(&format!(
                "struct F{} : public F{}\n{{\n",
                entry.name,
                registry.script_struct(parent).name
            )),
            None => out.push_str(&format!("struct F{}\n{{\n", entry.name)),
        }
        for &member in &entry.properties {
            let property = registry.property(member);
            let line = cpp::member_declaration(registry, &mut self.session.cpp_names, property);
            out.push_str(&format!("    {}\n", line));
        }
        if let Some(text) = &entry.cpp_text {
            push_raw_block(out, text);
        }
        out.push_str("};\n\n");
    }

    /// `<Class>_event<Name>_Parms` for every event and delegate with
    /// parameters or a return value.
    fn export_parms_structs(&mut self, class: ClassId, functions: &ClassFunctions) -> String {
        let mut out = String::new();
        let class_name = self.registry.class(class).name.clone();
        for &id in functions.events.iter().chain(&functions.delegates) {
            let entry = self.registry.function(id);
            if entry.params.is_empty() && entry.return_param.is_none() {
                continue;
            }
            let struct_name = format!("{}_event{}_Parms", class_name, entry.name);
            out.push_str(&format!("struct {}\n{{\n", struct_name));
            for &param in entry.params.iter().chain(entry.return_param.iter()) {
                let property = self.registry.property(param);
                let line = cpp::parms_member(self.registry, &mut self.session.cpp_names, property);
                out.push_str(&format!("    {}\n", line));
            }
            out.push_str(&format!("    {}(EEventParm)\n    {{\n    }}\n}};\n\n", struct_name));
        }
        out
    }

    /// The C++ declaration of `class`: returns the text, the member block
    /// between the property markers and the base class name.
    fn export_class(&mut self, class: ClassId, functions: &ClassFunctions) -> (String, String, String) {
        let registry = self.registry;
        let entry = registry.class(class);
        let name = entry.name.clone();
        let cpp = self.cpp_name(class);
        let super_cpp = match entry.super_class {
            Some(parent) => self.cpp_name(parent),
            None => String::new(),
        };

        let block = self.export_properties(class);
        let mut out = String::new();

        let mut bases = Vec::new();
        if !super_cpp.is_empty() {
            bases.push(format!("public {}", super_cpp));
        }
        if !entry.is_interface() {
            for interface in &entry.interfaces {
                if self.registry.class(interface.class).is_native() {
                    bases.push(format!(
                        "public {}",
                        self.session.cpp_names.interface_name(self.registry, interface.class)
                    ));
                }
            }
            if let Some(meta) = self.session.metadata.find_class_data(class) {
                for parent in &meta.inheritance_parents {
                    bases.push(format!("public {}", parent));
                }
            }
        }
        if bases.is_empty() {
            out.push_str(&format!("class {}\n{{\npublic:\n", cpp));
        } else {
            out.push_str(&format!("class {} : {}\n{{\npublic:\n", cpp, bases.join(", ")));
        }
        out.push_str(&format!("    {}\n", begin_props_marker(name.as_str())));
        out.push_str(&block);
        out.push_str(&format!("    {}\n\n", end_props_marker(name.as_str())));

        if !entry.is_interface() {
            for &id in &functions.natives {
                out.push_str(&self.export_native(class, id));
            }
        }
        for &id in &functions.events {
            out.push_str(&self.export_proxy(class, id, false));
        }
        for &id in &functions.delegates {
            out.push_str(&self.export_proxy(class, id, true));
        }

        let declare = if entry.is_interface() {
            "DECLARE_CLASS_INTF"
        } else if entry.flags.contains(ClassFlags::ABSTRACT) {
            "DECLARE_ABSTRACT_CLASS"
        } else {
            "DECLARE_CLASS"
        };
        out.push_str(&format!(
            "    {}({},{},{},{})\n",
            declare,
            cpp,
            if super_cpp.is_empty() { "UObject" } else { super_cpp.as_str() },
            cpp::class_flags_expr(entry.flags),
            self.package
        ));
        if !entry.platform_flags.is_all() {
            out.push_str(&format!(
                "    DECLARE_PLATFORM_FLAGS(0x{:08X})\n",
                entry.platform_flags.bits()
            ));
        }
        match &entry.cpp_text {
            Some(text) => push_raw_block(&mut out, text),
            None => out.push_str(&format!("    NO_DEFAULT_CONSTRUCTOR({})\n", cpp)),
        }
        out.push_str("};\n\n");

        if entry.is_interface() {
            out.push_str(&self.export_native_interface(class, functions));
        }
        (out, block, super_cpp)
    }

    /// Member lines between the property markers.
    fn export_properties(&mut self, class: ClassId) -> String {
        let entry = self.registry.class(class);
        let own: Vec<_> = entry
            .properties
            .iter()
            .copied()
            .filter(|&id| !self.registry.property(id).flags.contains(PropertyFlags::NO_EXPORT))
            .collect();
        let mut out = String::new();

        if let Some(&first) = own.first()
            && let Some(trailing) = self.trailing_parent_kind(class)
        {
            let first = layout_kind(&self.registry.property(first).ty, self.registry.property(first).array_dim);
            let bool_after_byte = trailing == PropertyKind::Byte && first == PropertyKind::Bool;
            let byte_after_bool = trailing == PropertyKind::Bool && first == PropertyKind::Byte;
            if bool_after_byte || byte_after_bool {
                out.push_str("    SCRIPT_ALIGN;\n");
            }
        }
        for id in own {
            let property = self.registry.property(id);
            let line = cpp::member_declaration(self.registry, &mut self.session.cpp_names, property);
            out.push_str(&format!("    {}\n", line));
        }
        out
    }

    /// Layout kind of the last property of the nearest ancestor that has
    /// any. Bool arrays count as plain words.
    fn trailing_parent_kind(&self, class: ClassId) -> Option<PropertyKind> {
        self.registry.class_chain(class).skip(1).find_map(|ancestor| {
            self.registry
                .class(ancestor)
                .properties
                .last()
                .map(|&id| {
                    let property = self.registry.property(id);
                    layout_kind(&property.ty, property.array_dim)
                })
        })
    }

    /// Prototype and `exec` entry point of a native function.
    fn export_native(&mut self, class: ClassId, id: FunctionId) -> String {
        let entry = self.registry.function(id);
        let name = entry.friendly_name.clone();
        let flags = entry.flags;
        let params = entry.params.clone();
        let return_param = entry.return_param;

        let hand_written = flags.intersects(FunctionFlags::LATENT | FunctionFlags::ITERATOR)
            || params
                .iter()
                .any(|&p| self.registry.property(p).flags.contains(PropertyFlags::SKIP_PARM));
        if hand_written {
            return format!("    DECLARE_FUNCTION(exec{});\n", name);
        }

        let mut out = String::new();
        let return_type = match return_param {
            Some(ret) => cpp::cpp_type(
                self.registry,
                &mut self.session.cpp_names,
                &self.registry.property(ret).ty,
                TypeUse::Value,
            ),
            None => "void".into(),
        };
        let declarations: Vec<String> = params
            .iter()
            .map(|&p| {
                cpp::parameter_declaration(self.registry, &mut self.session.cpp_names, self.registry.property(p))
            })
            .collect();
        let is_static = flags.contains(FunctionFlags::STATIC);
        out.push_str(&format!(
            "    {}{} {}({});\n",
            if is_static { "static " } else { "" },
            return_type,
            name,
            declarations.join(",")
        ));

        out.push_str(&format!("    DECLARE_FUNCTION(exec{})\n    {{\n", name));
        for &p in &params {
            let line = cpp::parm_macro(self.registry, &mut self.session.cpp_names, self.registry.property(p));
            out.push_str(&format!("        {}\n", line));
        }
        out.push_str("        P_FINISH;\n");
        let args: Vec<String> = params
            .iter()
            .map(|&p| self.registry.property(p).name.to_string())
            .collect();
        let target = if is_static {
            format!("{}::", self.cpp_name(class))
        } else {
            "this->".into()
        };
        let call = format!("{}{}({})", target, name, args.join(","));
        match return_param {
            Some(_) => out.push_str(&format!("        *({}*)Result={};\n", return_type, call)),
            None => out.push_str(&format!("        {};\n", call)),
        }
        out.push_str("    }\n");
        out
    }

    /// `event<Name>` or `delegate<Name>` calling back into script.
    fn export_proxy(&mut self, class: ClassId, id: FunctionId, delegate: bool) -> String {
        let api = self.api();
        let class_name = self.registry.class(class).name.clone();
        let entry = self.registry.function(id);
        let name = entry.name.clone();
        let params = entry.params.clone();
        let return_param = entry.return_param;

        let return_type = match return_param {
            Some(ret) => cpp::cpp_type(
                self.registry,
                &mut self.session.cpp_names,
                &self.registry.property(ret).ty,
                TypeUse::Value,
            ),
            None => "void".into(),
        };
        let declarations: Vec<String> = params
            .iter()
            .map(|&p| {
                cpp::parameter_declaration(self.registry, &mut self.session.cpp_names, self.registry.property(p))
            })
            .collect();

        let prefix = if delegate { "delegate" } else { "event" };
        let mut out = format!(
            "    {} {}{}({})\n    {{\n",
            return_type,
            prefix,
            name,
            declarations.join(",")
        );
        let has_parms = !params.is_empty() || return_param.is_some();
        if has_parms {
            out.push_str(&format!(
                "        {}_event{}_Parms Parms(EC_EventParm);\n",
                class_name, name
            ));
            if let Some(ret) = return_param
                && let Some(zero) = cpp::return_initializer(&self.registry.property(ret).ty)
            {
                out.push_str(&format!("        Parms.ReturnValue={};\n", zero));
            }
            for &p in &params {
                let property = self.registry.property(p);
                if property.array_dim > 1 {
                    out.push_str(&format!(
                        "        appMemcpy(&Parms.{0},{0},sizeof(Parms.{0}));\n",
                        property.name
                    ));
                } else {
                    out.push_str(&format!("        Parms.{0}={0};\n", property.name));
                }
            }
        }
        let parms_arg = if has_parms { "&Parms" } else { "NULL" };
        if delegate {
            out.push_str(&format!(
                "        ProcessDelegate({}_{},&__{}__Delegate,{});\n",
                api, name, name, parms_arg
            ));
        } else {
            out.push_str(&format!(
                "        ProcessEvent(FindFunctionChecked({}_{}),{});\n",
                api, name, parms_arg
            ));
        }
        for &p in &params {
            let property = self.registry.property(p);
            if property.flags.contains(PropertyFlags::OUT_PARM) && property.array_dim <= 1 {
                out.push_str(&format!("        {0}=Parms.{0};\n", property.name));
            }
        }
        if return_param.is_some() {
            out.push_str("        return Parms.ReturnValue;\n");
        }
        out.push_str("    }\n");
        out
    }

    /// The `I<Name>` class with pure virtual natives for an interface.
    fn export_native_interface(&mut self, class: ClassId, functions: &ClassFunctions) -> String {
        let name = self.session.cpp_names.interface_name(self.registry, class);
        let mut out = format!(
            "class {0}\n{{\nprotected:\n    virtual ~{0}(){{}}\npublic:\n",
            name
        );
        for &id in &functions.natives {
            let entry = self.registry.function(id);
            let friendly = entry.friendly_name.clone();
            let params = entry.params.clone();
            let return_type = match entry.return_param {
                Some(ret) => cpp::cpp_type(
                    self.registry,
                    &mut self.session.cpp_names,
                    &self.registry.property(ret).ty,
                    TypeUse::Value,
                ),
                None => "void".into(),
            };
            let declarations: Vec<String> = params
                .iter()
                .map(|&p| {
                    cpp::parameter_declaration(self.registry, &mut self.session.cpp_names, self.registry.property(p))
                })
                .collect();
            out.push_str(&format!(
                "    virtual {} {}({})=0;\n",
                return_type,
                friendly,
                declarations.join(",")
            ));
        }
        out.push_str("};\n\n");
        out
    }

    /// Registration macros and native tables for statically linked builds.
    fn export_static_linking(&mut self, classes: &[ClassId]) -> String {
        let guard = self.guard();
        let package = self.package.clone();
        let mut registrants = String::new();
        let mut tables = String::new();
        for &class in classes {
            let cpp = self.cpp_name(class);
            registrants.push_str(&format!("    {}::StaticClass(); \\\n", cpp));
            let natives = self.functions_of(class).natives;
            if natives.is_empty() || self.registry.class(class).is_interface() {
                continue;
            }
            let table = format!("G{}{}Natives", package, cpp);
            registrants.push_str(&format!(
                "    GNativeLookupFuncs.Set(FName(\"{}\"), {}); \\\n",
                self.registry.class(class).name,
                table
            ));
            tables.push_str(&format!("NATIVE_INFO({}) {}[] =\n{{\n", cpp, table));
            for id in natives {
                tables.push_str(&format!(
                    "    MAP_NATIVE({},exec{})\n",
                    cpp,
                    self.registry.function(id).friendly_name
                ));
            }
            tables.push_str("    {NULL,NULL}\n};\n");
            tables.push_str(&format!("IMPLEMENT_NATIVE_HANDLER({},{});\n\n", package, cpp));
        }

        let mut out = String::from("#ifdef STATIC_LINKING_MOJO\n");
        out.push_str(&format!("#ifndef {0}_NATIVE_DEFS\n#define {0}_NATIVE_DEFS\n\n", guard));
        out.push_str(&format!("#define AUTO_INITIALIZE_REGISTRANTS_{} \\\n", guard));
        out.push_str(&registrants);
        out.push_str(&format!("\n#endif // {}_NATIVE_DEFS\n\n", guard));
        out.push_str("#ifdef NATIVES_ONLY\n");
        out.push_str(&tables);
        out.push_str("#endif // NATIVES_ONLY\n#endif // STATIC_LINKING_MOJO\n\n");
        out
    }

    /// Offset and size assertions against the script layout.
    fn export_size_checks(&mut self, classes: &[ClassId]) -> String {
        let mut out = String::from("#ifdef VERIFY_CLASS_SIZES\n");
        for &class in classes {
            if self.registry.class(class).is_interface() {
                continue;
            }
            let cpp = self.cpp_name(class);
            let (prefix, bare) = cpp.split_at(1);
            for &id in &self.registry.class(class).properties {
                let property = self.registry.property(id);
                let bitfield = matches!(property.ty, PropertyType::Bool) && property.array_dim <= 1;
                if bitfield || property.flags.contains(PropertyFlags::NO_EXPORT) {
                    continue;
                }
                out.push_str(&format!(
                    "VERIFY_CLASS_OFFSET_NODIE({},{},{})\n",
                    prefix, bare, property.name
                ));
            }
            out.push_str(&format!("VERIFY_CLASS_SIZE_NODIE({})\n", cpp));
        }
        out.push_str("#endif // VERIFY_CLASS_SIZES\n");
        out
    }
}

const BANNER: &str = "\
/*===========================================================================
    C++ class definitions exported from UnrealScript.
    This is automatically generated by the tools.
    DO NOT modify this manually! Edit the corresponding .uc files instead!
===========================================================================*/
";

/// Layout-relevant kind: bool arrays are plain words, not bitfields.
fn layout_kind(ty: &PropertyType, array_dim: u32) -> PropertyKind {
    match ty {
        PropertyType::Bool if array_dim > 1 => PropertyKind::Int,
        _ => ty.kind(),
    }
}

/// Append a `cpptext` block, one level indented.
fn push_raw_block(out: &mut String, text: &str) {
    for line in text.trim_matches('\n').lines() {
        if line.trim().is_empty() {
            out.push('\n');
        } else {
            out.push_str("    ");
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }
}
