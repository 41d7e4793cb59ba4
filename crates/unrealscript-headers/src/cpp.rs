//! C++ spellings of script types, parameter unpacking macros and class flags.

use unrealscript_compiler::session::CppNameCache;
use unrealscript_core::{ClassFlags, PropertyFlags, PropertyType};
use unrealscript_registry::{PropertyEntry, Registry};

/// Where a type is written. Members use the no-init container types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeUse {
    Member,
    Value,
}

/// Class flags carried into `DECLARE_CLASS`.
const EXPORTED_CLASS_FLAGS: &[(ClassFlags, &str)] = &[
    (ClassFlags::TRANSIENT, "CLASS_Transient"),
    (ClassFlags::CONFIG, "CLASS_Config"),
    (ClassFlags::LOCALIZED, "CLASS_Localized"),
    (ClassFlags::NATIVE_REPLICATION, "CLASS_NativeReplication"),
    (ClassFlags::PER_OBJECT_CONFIG, "CLASS_PerObjectConfig"),
    (ClassFlags::EDIT_INLINE_NEW, "CLASS_EditInlineNew"),
    (ClassFlags::COLLAPSE_CATEGORIES, "CLASS_CollapseCategories"),
    (ClassFlags::INTERFACE, "CLASS_Interface"),
    (ClassFlags::HAS_INSTANCED_PROPS, "CLASS_HasInstancedProps"),
    (ClassFlags::DEPRECATED, "CLASS_Deprecated"),
];

/// `0|CLASS_Config|CLASS_Transient` style flag expression.
pub fn class_flags_expr(flags: ClassFlags) -> String {
    let mut out = String::from("0");
    for (flag, name) in EXPORTED_CLASS_FLAGS {
        if flags.contains(*flag) {
            out.push('|');
            out.push_str(name);
        }
    }
    out
}

/// The C++ type of `ty`.
pub fn cpp_type(
    registry: &Registry,
    names: &mut CppNameCache,
    ty: &PropertyType,
    usage: TypeUse,
) -> String {
    match ty {
        PropertyType::None => "void".into(),
        PropertyType::Byte { .. } => "BYTE".into(),
        PropertyType::Int => "INT".into(),
        PropertyType::Bool => "UBOOL".into(),
        PropertyType::Float => "FLOAT".into(),
        PropertyType::Name => "FName".into(),
        PropertyType::String => match usage {
            TypeUse::Member => "FStringNoInit".into(),
            TypeUse::Value => "FString".into(),
        },
        PropertyType::Struct(id) => format!("F{}", registry.script_struct(*id).name),
        PropertyType::Object { meta: Some(_), .. } => "class UClass*".into(),
        PropertyType::Object { class, meta: None } => {
            let name = match class {
                Some(class) => names.name_of(registry, *class),
                None => "UObject".into(),
            };
            format!("class {}*", name)
        }
        PropertyType::Interface(class) => {
            format!("TScriptInterface<class {}>", names.interface_name(registry, *class))
        }
        PropertyType::Delegate { .. } => "FScriptDelegate".into(),
        PropertyType::Array(inner) => {
            let inner = cpp_type(registry, names, inner, TypeUse::Value);
            let container = match usage {
                TypeUse::Member => "TArrayNoInit",
                TypeUse::Value => "TArray",
            };
            // Nested templates need a space before the closing bracket.
            if inner.ends_with('>') {
                format!("{}<{} >", container, inner)
            } else {
                format!("{}<{}>", container, inner)
            }
        }
        PropertyType::Map { export_text } if !export_text.is_empty() => export_text.clone(),
        PropertyType::Map { .. } => "TMap<FName,INT>".into(),
    }
}

/// A member declaration inside a class or struct body, without indentation.
pub fn member_declaration(
    registry: &Registry,
    names: &mut CppNameCache,
    property: &PropertyEntry,
) -> String {
    if matches!(property.ty, PropertyType::Bool) && property.array_dim <= 1 {
        return format!("BITFIELD {}:1;", property.name);
    }
    let ty = cpp_type(registry, names, &property.ty, TypeUse::Member);
    if property.array_dim > 1 {
        format!("{} {}[{}];", ty, property.name, property.array_dim)
    } else {
        format!("{} {};", ty, property.name)
    }
}

/// A member of an event parameter struct. Bools are whole words here.
pub fn parms_member(registry: &Registry, names: &mut CppNameCache, property: &PropertyEntry) -> String {
    let ty = cpp_type(registry, names, &property.ty, TypeUse::Value);
    if property.array_dim > 1 {
        format!("{} {}[{}];", ty, property.name, property.array_dim)
    } else {
        format!("{} {};", ty, property.name)
    }
}

/// A parameter in a native prototype or event proxy signature.
pub fn parameter_declaration(
    registry: &Registry,
    names: &mut CppNameCache,
    property: &PropertyEntry,
) -> String {
    let ty = cpp_type(registry, names, &property.ty, TypeUse::Value);
    if property.array_dim > 1 {
        return format!("{}* {}", ty, property.name);
    }
    if property.flags.contains(PropertyFlags::OUT_PARM) {
        return format!("{}& {}", ty, property.name);
    }
    let by_reference = matches!(
        property.ty,
        PropertyType::String
            | PropertyType::Struct(_)
            | PropertyType::Array(_)
            | PropertyType::Delegate { .. }
            | PropertyType::Interface(_)
            | PropertyType::Map { .. }
    );
    if by_reference {
        format!("const {}& {}", ty, property.name)
    } else {
        format!("{} {}", ty, property.name)
    }
}

/// The `P_GET_*` statement that pulls `property` off the script stack.
///
/// The macro is the type's base name followed by `_INIT` for `init`
/// parameters, `_OPTX` for optional ones and `_REF` for out parameters.
pub fn parm_macro(registry: &Registry, names: &mut CppNameCache, property: &PropertyEntry) -> String {
    let (base, type_arg) = if property.array_dim > 1 {
        (
            "ARRAY",
            Some(cpp_type(registry, names, &property.ty, TypeUse::Value)),
        )
    } else {
        match &property.ty {
            PropertyType::Byte { .. } | PropertyType::None => ("BYTE", None),
            PropertyType::Int => ("INT", None),
            PropertyType::Bool => ("UBOOL", None),
            PropertyType::Float => ("FLOAT", None),
            PropertyType::Name => ("NAME", None),
            PropertyType::String => ("STR", None),
            PropertyType::Delegate { .. } => ("DELEGATE", None),
            PropertyType::Struct(_) | PropertyType::Map { .. } => (
                "STRUCT",
                Some(cpp_type(registry, names, &property.ty, TypeUse::Value)),
            ),
            PropertyType::Object { .. } => {
                let ty = cpp_type(registry, names, &property.ty, TypeUse::Value);
                let bare = ty.trim_start_matches("class ").trim_end_matches('*');
                ("OBJECT", Some(bare.to_string()))
            }
            PropertyType::Interface(class) => {
                ("TINTERFACE", Some(names.interface_name(registry, *class)))
            }
            PropertyType::Array(inner) => (
                "TARRAY",
                Some(cpp_type(registry, names, inner, TypeUse::Value)),
            ),
        }
    };

    let flags = property.flags;
    let optional = flags.contains(PropertyFlags::OPTIONAL_PARM);
    let mut name = format!("P_GET_{}", base);
    if flags.contains(PropertyFlags::INIT) {
        name.push_str("_INIT");
    }
    if optional {
        name.push_str("_OPTX");
    }
    if flags.contains(PropertyFlags::OUT_PARM) || property.array_dim > 1 {
        name.push_str("_REF");
    }

    let mut args = Vec::with_capacity(3);
    if let Some(ty) = type_arg {
        args.push(ty);
    }
    args.push(property.name.to_string());
    if optional {
        args.push(optional_default(registry, names, &property.ty));
    }
    format!("{}({});", name, args.join(","))
}

/// The value an omitted optional parameter takes in native code.
fn optional_default(registry: &Registry, names: &mut CppNameCache, ty: &PropertyType) -> String {
    match ty {
        PropertyType::Bool => "FALSE".into(),
        PropertyType::Float => "0.f".into(),
        PropertyType::Name => "NAME_None".into(),
        PropertyType::String => "TEXT(\"\")".into(),
        PropertyType::Object { .. } | PropertyType::Interface(_) => "NULL".into(),
        PropertyType::Struct(_) => format!(
            "{}(EC_EventParm)",
            cpp_type(registry, names, ty, TypeUse::Value)
        ),
        PropertyType::Delegate { .. } | PropertyType::Array(_) | PropertyType::Map { .. } => {
            format!("{}()", cpp_type(registry, names, ty, TypeUse::Value))
        }
        _ => "0".into(),
    }
}

/// The zero value an event proxy stores into a return value before the call.
pub fn return_initializer(ty: &PropertyType) -> Option<&'static str> {
    match ty {
        PropertyType::Bool => Some("FALSE"),
        PropertyType::Byte { .. } | PropertyType::Int | PropertyType::Float => Some("0"),
        PropertyType::Object { .. } => Some("NULL"),
        PropertyType::Name => Some("NAME_None"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unrealscript_core::{FieldOwner, FunctionId, Name};

    fn parm(name: &str, ty: PropertyType, flags: PropertyFlags) -> PropertyEntry {
        let mut entry = PropertyEntry::new(
            Name::new(name),
            FieldOwner::Function(FunctionId::new(0)),
            ty,
        );
        entry.flags = flags | PropertyFlags::PARM;
        entry
    }

    #[test]
    fn flag_expression_lists_exported_flags() {
        let flags = ClassFlags::CONFIG | ClassFlags::NATIVE | ClassFlags::TRANSIENT;
        assert_eq!(class_flags_expr(flags), "0|CLASS_Transient|CLASS_Config");
        assert_eq!(class_flags_expr(ClassFlags::empty()), "0");
    }

    #[test]
    fn member_strings_and_arrays_use_no_init_types() {
        let registry = Registry::new();
        let mut names = CppNameCache::default();
        let array = PropertyType::Array(Box::new(PropertyType::Array(Box::new(PropertyType::Int))));
        assert_eq!(
            cpp_type(&registry, &mut names, &PropertyType::String, TypeUse::Member),
            "FStringNoInit"
        );
        assert_eq!(
            cpp_type(&registry, &mut names, &array, TypeUse::Member),
            "TArrayNoInit<TArray<INT> >"
        );
    }

    #[test]
    fn bools_are_bitfields_unless_arrays() {
        let registry = Registry::new();
        let mut names = CppNameCache::default();
        let mut flag = parm("bReady", PropertyType::Bool, PropertyFlags::empty());
        assert_eq!(member_declaration(&registry, &mut names, &flag), "BITFIELD bReady:1;");
        flag.array_dim = 4;
        assert_eq!(member_declaration(&registry, &mut names, &flag), "UBOOL bReady[4];");
    }

    #[test]
    fn parm_macros_combine_suffixes() {
        let registry = Registry::new();
        let mut names = CppNameCache::default();
        let plain = parm("Count", PropertyType::Int, PropertyFlags::empty());
        assert_eq!(parm_macro(&registry, &mut names, &plain), "P_GET_INT(Count);");

        let optional = parm("Label", PropertyType::String, PropertyFlags::OPTIONAL_PARM);
        assert_eq!(
            parm_macro(&registry, &mut names, &optional),
            "P_GET_STR_OPTX(Label,TEXT(\"\"));"
        );

        let out = parm(
            "Items",
            PropertyType::Array(Box::new(PropertyType::Float)),
            PropertyFlags::OUT_PARM | PropertyFlags::INIT,
        );
        assert_eq!(
            parm_macro(&registry, &mut names, &out),
            "P_GET_TARRAY_INIT_REF(FLOAT,Items);"
        );
    }

    #[test]
    fn reference_parameters() {
        let registry = Registry::new();
        let mut names = CppNameCache::default();
        let text = parm("S", PropertyType::String, PropertyFlags::empty());
        assert_eq!(parameter_declaration(&registry, &mut names, &text), "const FString& S");
        let out = parm("N", PropertyType::Int, PropertyFlags::OUT_PARM);
        assert_eq!(parameter_declaration(&registry, &mut names, &out), "INT& N");
    }
}
