//! Identifier types for reflection objects.
//!
//! The registry stores classes, structs, functions, states, properties, enums
//! and consts in flat arenas. These ids index those arenas. [`ObjectRef`] is
//! the 32-bit form in which bytecode refers to any of them.

use std::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            /// Create an id from an arena index.
            #[inline]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// Get the underlying arena index.
            #[inline]
            pub const fn index(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }

        impl From<u32> for $name {
            fn from(index: u32) -> Self {
                Self::new(index)
            }
        }
    };
}

arena_id!(
    /// Identifies a class (or interface) in the registry.
    ClassId,
    "class"
);
arena_id!(
    /// Identifies a script struct.
    StructId,
    "struct"
);
arena_id!(
    /// Identifies a function, delegate or operator.
    FunctionId,
    "function"
);
arena_id!(
    /// Identifies a state.
    StateId,
    "state"
);
arena_id!(
    /// Identifies a property: member variable, parameter or local.
    PropertyId,
    "property"
);
arena_id!(
    /// Identifies an enumeration.
    EnumId,
    "enum"
);
arena_id!(
    /// Identifies a named constant.
    ConstId,
    "const"
);

/// The scope that owns a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldOwner {
    /// Declared at class scope.
    Class(ClassId),
    /// Member of a script struct.
    Struct(StructId),
    /// Parameter or local of a function.
    Function(FunctionId),
    /// Declared inside a state.
    State(StateId),
}

/// Kind tag carried in the top bits of an [`ObjectRef`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ObjectRefKind {
    /// A class object.
    Class = 1,
    /// A script struct.
    Struct = 2,
    /// A function.
    Function = 3,
    /// A state.
    State = 4,
    /// A property.
    Property = 5,
    /// An enumeration.
    Enum = 6,
    /// A constant.
    Const = 7,
    /// An object resolved outside the reflection graph (content packages).
    External = 8,
}

/// A reference to a reflection object as stored in bytecode.
///
/// The top four bits hold the [`ObjectRefKind`], the remaining 28 bits the
/// arena index. The all-zero value is the null object (`None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ObjectRef(u32);

impl ObjectRef {
    const INDEX_BITS: u32 = 28;
    const INDEX_MASK: u32 = (1 << Self::INDEX_BITS) - 1;

    /// The null reference.
    pub const NONE: ObjectRef = ObjectRef(0);

    /// Build a reference from a kind and arena index.
    pub fn new(kind: ObjectRefKind, index: u32) -> Self {
        debug_assert!(index <= Self::INDEX_MASK);
        Self(((kind as u32) << Self::INDEX_BITS) | (index & Self::INDEX_MASK))
    }

    /// Reinterpret a raw bytecode value.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw bytecode value.
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Whether this is the null reference.
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// The kind tag, if the reference is not null and the tag is valid.
    pub fn kind(self) -> Option<ObjectRefKind> {
        match self.0 >> Self::INDEX_BITS {
            1 => Some(ObjectRefKind::Class),
            2 => Some(ObjectRefKind::Struct),
            3 => Some(ObjectRefKind::Function),
            4 => Some(ObjectRefKind::State),
            5 => Some(ObjectRefKind::Property),
            6 => Some(ObjectRefKind::Enum),
            7 => Some(ObjectRefKind::Const),
            8 => Some(ObjectRefKind::External),
            _ => None,
        }
    }

    /// The arena index.
    pub fn index(self) -> u32 {
        self.0 & Self::INDEX_MASK
    }
}

impl From<ClassId> for ObjectRef {
    fn from(id: ClassId) -> Self {
        Self::new(ObjectRefKind::Class, id.index())
    }
}

impl From<StructId> for ObjectRef {
    fn from(id: StructId) -> Self {
        Self::new(ObjectRefKind::Struct, id.index())
    }
}

impl From<FunctionId> for ObjectRef {
    fn from(id: FunctionId) -> Self {
        Self::new(ObjectRefKind::Function, id.index())
    }
}

impl From<StateId> for ObjectRef {
    fn from(id: StateId) -> Self {
        Self::new(ObjectRefKind::State, id.index())
    }
}

impl From<PropertyId> for ObjectRef {
    fn from(id: PropertyId) -> Self {
        Self::new(ObjectRefKind::Property, id.index())
    }
}

impl From<EnumId> for ObjectRef {
    fn from(id: EnumId) -> Self {
        Self::new(ObjectRefKind::Enum, id.index())
    }
}

impl From<ConstId> for ObjectRef {
    fn from(id: ConstId) -> Self {
        Self::new(ObjectRefKind::Const, id.index())
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            None if self.is_none() => f.write_str("None"),
            None => write!(f, "invalid({:#x})", self.0),
            Some(kind) => write!(f, "{:?}#{}", kind, self.index()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_display() {
        assert_eq!(ClassId::new(3).to_string(), "class_3");
        assert_eq!(PropertyId::new(12).to_string(), "property_12");
    }

    #[test]
    fn object_ref_encodes_kind_and_index() {
        let r = ObjectRef::from(FunctionId::new(77));
        assert_eq!(r.kind(), Some(ObjectRefKind::Function));
        assert_eq!(r.index(), 77);
        assert_eq!(ObjectRef::from_raw(r.raw()), r);
    }

    #[test]
    fn none_reference() {
        assert!(ObjectRef::NONE.is_none());
        assert_eq!(ObjectRef::NONE.kind(), None);
        assert_eq!(ObjectRef::NONE.to_string(), "None");
        assert!(!ObjectRef::from(ClassId::new(0)).is_none());
    }
}
