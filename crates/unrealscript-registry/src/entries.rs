//! Reflection objects stored in the [`Registry`](crate::Registry) arenas.

use unrealscript_core::{
    ClassFlags, ClassId, ConstId, ConstValue, EnumId, FieldOwner, FunctionFlags, FunctionId,
    Name, PlatformFlags, PropertyBase, PropertyFlags, PropertyId, PropertyType, StateFlags,
    StateId, StructFlags, StructId,
};

use crate::values::ObjectValues;

/// An interface a class implements, and the hidden vtable property that
/// backs it in native code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplementedInterface {
    /// The interface class.
    pub class: ClassId,
    /// `VfTable_I<Name>` pointer property, present for native interfaces.
    pub pointer_property: Option<PropertyId>,
}

/// A class or interface.
#[derive(Debug, Clone)]
pub struct ClassEntry {
    pub name: Name,
    /// Package the class was loaded from.
    pub package: Name,
    pub super_class: Option<ClassId>,
    /// Class whose instances must own instances of this class.
    pub within: Option<ClassId>,
    pub flags: ClassFlags,
    pub platform_flags: PlatformFlags,
    /// Config file name from `config(Name)`.
    pub config_name: Name,
    /// Header group from `native(Group)`.
    pub header_group: Option<String>,
    pub interfaces: Vec<ImplementedInterface>,
    /// Classes named in `DependsOn`.
    pub depends_on: Vec<Name>,
    pub hide_categories: Vec<Name>,
    pub show_categories: Vec<Name>,
    pub auto_expand_categories: Vec<Name>,
    pub dont_sort_categories: Vec<Name>,
    pub properties: Vec<PropertyId>,
    pub functions: Vec<FunctionId>,
    pub states: Vec<StateId>,
    pub structs: Vec<StructId>,
    pub enums: Vec<EnumId>,
    pub consts: Vec<ConstId>,
    /// Class-scope bytecode (replication conditions).
    pub script: Vec<u8>,
    /// Size of an instance including inherited properties.
    pub properties_size: u32,
    pub min_alignment: u32,
    /// Size recorded from the previous native build, for conformance checks.
    pub native_size: Option<u32>,
    /// Default property values.
    pub defaults: ObjectValues,
    /// Whether `defaultproperties` has been imported.
    pub defaults_imported: bool,
    /// Raw `cpptext` block.
    pub cpp_text: Option<String>,
    /// Raw `defaultproperties` block.
    pub default_properties_text: Option<String>,
}

impl ClassEntry {
    /// A new class with no fields.
    pub fn new(name: Name, package: Name) -> Self {
        Self {
            name,
            package,
            super_class: None,
            within: None,
            flags: ClassFlags::empty(),
            platform_flags: PlatformFlags::default(),
            config_name: Name::none(),
            header_group: None,
            interfaces: Vec::new(),
            depends_on: Vec::new(),
            hide_categories: Vec::new(),
            show_categories: Vec::new(),
            auto_expand_categories: Vec::new(),
            dont_sort_categories: Vec::new(),
            properties: Vec::new(),
            functions: Vec::new(),
            states: Vec::new(),
            structs: Vec::new(),
            enums: Vec::new(),
            consts: Vec::new(),
            script: Vec::new(),
            properties_size: 0,
            min_alignment: 4,
            native_size: None,
            defaults: ObjectValues::default(),
            defaults_imported: false,
            cpp_text: None,
            default_properties_text: None,
        }
    }

    /// Whether this class has a native counterpart.
    pub fn is_native(&self) -> bool {
        self.flags.contains(ClassFlags::NATIVE)
    }

    /// Whether this is an interface.
    pub fn is_interface(&self) -> bool {
        self.flags.contains(ClassFlags::INTERFACE)
    }
}

/// A script struct.
#[derive(Debug, Clone)]
pub struct StructEntry {
    pub name: Name,
    /// Class the struct is declared in.
    pub owner: ClassId,
    pub super_struct: Option<StructId>,
    pub flags: StructFlags,
    pub properties: Vec<PropertyId>,
    pub size: u32,
    pub min_alignment: u32,
    /// Raw `structcpptext` block.
    pub cpp_text: Option<String>,
    /// Raw `structdefaultproperties` block.
    pub default_properties_text: Option<String>,
    pub defaults: ObjectValues,
    /// Whether the members have been laid out.
    pub linked: bool,
}

impl StructEntry {
    /// A new empty struct.
    pub fn new(name: Name, owner: ClassId) -> Self {
        Self {
            name,
            owner,
            super_struct: None,
            flags: StructFlags::empty(),
            properties: Vec::new(),
            size: 0,
            min_alignment: 1,
            cpp_text: None,
            default_properties_text: None,
            defaults: ObjectValues::default(),
            linked: false,
        }
    }
}

/// A function, event, delegate or operator.
#[derive(Debug, Clone)]
pub struct FunctionEntry {
    /// Script name; the operator symbol for operators.
    pub name: Name,
    /// Name used in C++ (`Add_IntInt` for operators).
    pub friendly_name: Name,
    pub owner: FieldOwner,
    /// The function this overrides.
    pub super_function: Option<FunctionId>,
    pub flags: FunctionFlags,
    /// Native index from `native(N)`, 0 when none.
    pub native_index: u16,
    /// Binding precedence of an operator.
    pub operator_precedence: u8,
    /// Parameters in declaration order, excluding the return value.
    pub params: Vec<PropertyId>,
    pub return_param: Option<PropertyId>,
    pub locals: Vec<PropertyId>,
    pub script: Vec<u8>,
    /// Size of the parameter block including the return value.
    pub parms_size: u32,
    /// Size of the frame including locals.
    pub frame_size: u32,
    pub return_value_offset: Option<u32>,
    /// Offset of this function's replication condition in the class script.
    pub rep_offset: Option<u16>,
}

impl FunctionEntry {
    /// A new function with no parameters.
    pub fn new(name: Name, owner: FieldOwner) -> Self {
        Self {
            friendly_name: name.clone(),
            name,
            owner,
            super_function: None,
            flags: FunctionFlags::empty(),
            native_index: 0,
            operator_precedence: 0,
            params: Vec::new(),
            return_param: None,
            locals: Vec::new(),
            script: Vec::new(),
            parms_size: 0,
            frame_size: 0,
            return_value_offset: None,
            rep_offset: None,
        }
    }

    /// Whether any flag in `flags` is set.
    pub fn has_any(&self, flags: FunctionFlags) -> bool {
        self.flags.intersects(flags)
    }

    /// Whether this is an operator.
    pub fn is_operator(&self) -> bool {
        self.flags.contains(FunctionFlags::OPERATOR)
    }

    /// Whether this is a delegate declaration.
    pub fn is_delegate(&self) -> bool {
        self.flags.contains(FunctionFlags::DELEGATE)
    }
}

/// A state.
#[derive(Debug, Clone)]
pub struct StateEntry {
    pub name: Name,
    pub owner: ClassId,
    /// State named in `extends`, or the same-named state of the super class.
    pub super_state: Option<StateId>,
    pub flags: StateFlags,
    pub functions: Vec<FunctionId>,
    /// Functions listed in `ignores`.
    pub ignores: Vec<Name>,
    /// State code.
    pub script: Vec<u8>,
    /// Offset of the label table in `script`.
    pub label_table_offset: Option<u16>,
}

impl StateEntry {
    /// A new state with no code.
    pub fn new(name: Name, owner: ClassId) -> Self {
        Self {
            name,
            owner,
            super_state: None,
            flags: StateFlags::empty(),
            functions: Vec::new(),
            ignores: Vec::new(),
            script: Vec::new(),
            label_table_offset: None,
        }
    }
}

/// A member variable, struct member, parameter or local.
#[derive(Debug, Clone)]
pub struct PropertyEntry {
    pub name: Name,
    pub owner: FieldOwner,
    pub ty: PropertyType,
    /// Fixed array dimension, 1 for scalars.
    pub array_dim: u32,
    pub flags: PropertyFlags,
    /// Editor category from `var(Category)`.
    pub category: Name,
    /// Byte offset within the owner, set by linking.
    pub offset: u32,
    /// Bit within the bitfield word, for bools.
    pub bool_mask: u32,
    /// Offset of this property's replication condition in the class script.
    pub rep_offset: Option<u16>,
}

impl PropertyEntry {
    /// A new scalar property.
    pub fn new(name: Name, owner: FieldOwner, ty: PropertyType) -> Self {
        Self {
            name,
            owner,
            ty,
            array_dim: 1,
            flags: PropertyFlags::empty(),
            category: Name::none(),
            offset: 0,
            bool_mask: 0,
            rep_offset: None,
        }
    }

    /// The compile-time shape of this property.
    pub fn base(&self) -> PropertyBase {
        PropertyBase {
            ty: self.ty.clone(),
            array_dim: self.array_dim,
            flags: self.flags,
        }
    }

    /// Whether this is a function parameter (including the return value).
    pub fn is_parm(&self) -> bool {
        self.flags.contains(PropertyFlags::PARM)
    }
}

/// An enumeration.
#[derive(Debug, Clone)]
pub struct EnumEntry {
    pub name: Name,
    pub owner: ClassId,
    /// Tags in order, ending with the `<Name>_MAX` sentinel.
    pub tags: Vec<Name>,
}

impl EnumEntry {
    /// Index of a tag.
    pub fn tag_index(&self, tag: &Name) -> Option<u8> {
        self.tags.iter().position(|t| t == tag).map(|i| i as u8)
    }

    /// Tags excluding the `_MAX` sentinel.
    pub fn declared_tags(&self) -> &[Name] {
        &self.tags[..self.tags.len().saturating_sub(1)]
    }
}

/// A named constant.
#[derive(Debug, Clone)]
pub struct ConstEntry {
    pub name: Name,
    pub owner: FieldOwner,
    /// Source text of the value, exported to headers.
    pub value_text: String,
    pub value: ConstValue,
}
