//! Value shapes used while type checking.
//!
//! [`PropertyType`] is the closed set of value kinds a property, parameter or
//! expression can have. [`PropertyBase`] adds the fixed array dimension and
//! the property flags, and is what the expression compiler passes around to
//! describe "the type of this value".

use std::fmt;

use ordered_float::OrderedFloat;

use crate::{ClassId, EnumId, FunctionId, Name, ObjectRef, PropertyFlags, StructId};

/// The kind of a value, without the referenced class/struct/enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyKind {
    /// No value (a function without a return value).
    None,
    Byte,
    Int,
    Bool,
    Float,
    Name,
    String,
    Struct,
    Object,
    Interface,
    Delegate,
    Array,
    Map,
}

impl PropertyKind {
    /// Script keyword for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyKind::None => "None",
            PropertyKind::Byte => "byte",
            PropertyKind::Int => "int",
            PropertyKind::Bool => "bool",
            PropertyKind::Float => "float",
            PropertyKind::Name => "name",
            PropertyKind::String => "string",
            PropertyKind::Struct => "struct",
            PropertyKind::Object => "object",
            PropertyKind::Interface => "interface",
            PropertyKind::Delegate => "delegate",
            PropertyKind::Array => "array",
            PropertyKind::Map => "map",
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The full type of a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyType {
    /// No value.
    None,
    /// `byte`, optionally restricted to an enumeration.
    Byte { enum_: Option<EnumId> },
    Int,
    Bool,
    Float,
    Name,
    String,
    /// A script struct by value.
    Struct(StructId),
    /// An object reference. `class` is `None` only for the `None` literal.
    /// `meta` is set for `class<Limitor>` references, where `class` is the
    /// intrinsic `Class` class.
    Object {
        class: Option<ClassId>,
        meta: Option<ClassId>,
    },
    /// A reference to an object implementing an interface class.
    Interface(ClassId),
    /// A delegate bound to a function signature. `None` for the `None`
    /// literal assigned to a delegate.
    Delegate { function: Option<FunctionId> },
    /// A dynamic array.
    Array(Box<PropertyType>),
    /// A native-only map, carried as its C++ export text.
    Map { export_text: String },
}

impl PropertyType {
    /// The kind of this type.
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyType::None => PropertyKind::None,
            PropertyType::Byte { .. } => PropertyKind::Byte,
            PropertyType::Int => PropertyKind::Int,
            PropertyType::Bool => PropertyKind::Bool,
            PropertyType::Float => PropertyKind::Float,
            PropertyType::Name => PropertyKind::Name,
            PropertyType::String => PropertyKind::String,
            PropertyType::Struct(_) => PropertyKind::Struct,
            PropertyType::Object { .. } => PropertyKind::Object,
            PropertyType::Interface(_) => PropertyKind::Interface,
            PropertyType::Delegate { .. } => PropertyKind::Delegate,
            PropertyType::Array(_) => PropertyKind::Array,
            PropertyType::Map { .. } => PropertyKind::Map,
        }
    }

    /// Plain `byte`.
    pub fn byte() -> Self {
        PropertyType::Byte { enum_: None }
    }

    /// An object reference to instances of `class`.
    pub fn object(class: ClassId) -> Self {
        PropertyType::Object {
            class: Some(class),
            meta: None,
        }
    }

    /// The type of the `None` literal.
    pub fn null_object() -> Self {
        PropertyType::Object {
            class: None,
            meta: None,
        }
    }

    /// Whether this is the `None` value type.
    pub fn is_none(&self) -> bool {
        matches!(self, PropertyType::None)
    }

    /// Whether this is the `None` object literal.
    pub fn is_null_object(&self) -> bool {
        matches!(self, PropertyType::Object { class: None, .. })
    }

    /// Whether this is `byte`, `int` or `float`.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            PropertyType::Byte { .. } | PropertyType::Int | PropertyType::Float
        )
    }

    /// Whether values of this type are object references.
    pub fn is_object_reference(&self) -> bool {
        matches!(self, PropertyType::Object { .. } | PropertyType::Interface(_))
    }

    /// The element type of a dynamic array.
    pub fn inner(&self) -> Option<&PropertyType> {
        match self {
            PropertyType::Array(inner) => Some(inner),
            _ => None,
        }
    }

    /// The enumeration a byte is restricted to.
    pub fn enum_id(&self) -> Option<EnumId> {
        match self {
            PropertyType::Byte { enum_ } => *enum_,
            _ => None,
        }
    }

    /// Whether values of this type need construction or destruction in
    /// native code.
    pub fn needs_ctor_link(&self) -> bool {
        matches!(
            self,
            PropertyType::String | PropertyType::Array(_) | PropertyType::Map { .. }
        )
    }
}

/// The shape of a value during compilation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyBase {
    /// Value type.
    pub ty: PropertyType,
    /// Fixed array dimension, 1 for scalars.
    pub array_dim: u32,
    /// Property flags relevant to type checking.
    pub flags: PropertyFlags,
}

impl PropertyBase {
    /// A scalar of the given type with no flags.
    pub fn new(ty: PropertyType) -> Self {
        Self {
            ty,
            array_dim: 1,
            flags: PropertyFlags::empty(),
        }
    }

    /// The "no value" shape.
    pub fn none() -> Self {
        Self::new(PropertyType::None)
    }

    /// Replace the flags.
    pub fn with_flags(mut self, flags: PropertyFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Kind of the underlying type.
    pub fn kind(&self) -> PropertyKind {
        self.ty.kind()
    }

    /// Whether this is a dynamic array.
    pub fn is_dynamic_array(&self) -> bool {
        matches!(self.ty, PropertyType::Array(_))
    }

    /// Whether this is a fixed-size array.
    pub fn is_fixed_array(&self) -> bool {
        self.array_dim > 1
    }

    /// Whether this is an out parameter.
    pub fn is_out(&self) -> bool {
        self.flags.contains(PropertyFlags::OUT_PARM)
    }

    /// Whether this is a const value.
    pub fn is_const(&self) -> bool {
        self.flags.contains(PropertyFlags::CONST)
    }

    /// The shape of one element of an array, fixed or dynamic.
    pub fn element(&self) -> PropertyBase {
        if self.array_dim > 1 {
            return PropertyBase {
                ty: self.ty.clone(),
                array_dim: 1,
                flags: self.flags,
            };
        }
        match &self.ty {
            PropertyType::Array(inner) => PropertyBase {
                ty: (**inner).clone(),
                array_dim: 1,
                flags: self.flags,
            },
            _ => self.clone(),
        }
    }

    /// Whether two shapes have the same type and dimension, ignoring flags.
    pub fn matches_type(&self, other: &PropertyBase) -> bool {
        self.ty == other.ty && self.array_dim == other.array_dim
    }
}

impl Default for PropertyBase {
    fn default() -> Self {
        Self::none()
    }
}

/// A compile-time constant value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstValue {
    Byte(u8),
    Int(i32),
    Bool(bool),
    Float(OrderedFloat<f32>),
    Name(Name),
    String(String),
    /// `vect(x,y,z)`.
    Vector([OrderedFloat<f32>; 3]),
    /// `rot(pitch,yaw,roll)`.
    Rotator([i32; 3]),
    /// An object or class reference.
    Object(ObjectRef),
}

impl ConstValue {
    /// Kind of value this constant produces.
    pub fn kind(&self) -> PropertyKind {
        match self {
            ConstValue::Byte(_) => PropertyKind::Byte,
            ConstValue::Int(_) => PropertyKind::Int,
            ConstValue::Bool(_) => PropertyKind::Bool,
            ConstValue::Float(_) => PropertyKind::Float,
            ConstValue::Name(_) => PropertyKind::Name,
            ConstValue::String(_) => PropertyKind::String,
            ConstValue::Vector(_) | ConstValue::Rotator(_) => PropertyKind::Struct,
            ConstValue::Object(_) => PropertyKind::Object,
        }
    }

    /// Render this constant as script text that tokenizes back to it.
    pub fn export_text(&self) -> String {
        match self {
            ConstValue::Byte(v) => v.to_string(),
            ConstValue::Int(v) => v.to_string(),
            ConstValue::Bool(v) => if *v { "True" } else { "False" }.to_string(),
            ConstValue::Float(v) => float_text(v.into_inner()),
            ConstValue::Name(n) => format!("'{}'", n),
            ConstValue::String(s) => {
                let mut out = String::with_capacity(s.len() + 2);
                out.push('"');
                for ch in s.chars() {
                    match ch {
                        '"' | '\\' => {
                            out.push('\\');
                            out.push(ch);
                        }
                        '\n' => out.push_str("\\n"),
                        '\r' => out.push_str("\\r"),
                        _ => out.push(ch),
                    }
                }
                out.push('"');
                out
            }
            ConstValue::Vector([x, y, z]) => format!(
                "vect({},{},{})",
                float_text(x.into_inner()),
                float_text(y.into_inner()),
                float_text(z.into_inner())
            ),
            ConstValue::Rotator([p, y, r]) => format!("rot({},{},{})", p, y, r),
            ConstValue::Object(r) if r.is_none() => "None".to_string(),
            ConstValue::Object(r) => r.to_string(),
        }
    }
}

/// Shortest text that parses back to exactly `value`, always lexing as a
/// float rather than an int.
fn float_text(value: f32) -> String {
    let text = format!("{:?}", value);
    if text.contains(['.', 'e', 'E']) || !value.is_finite() {
        text
    } else {
        format!("{}.0", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_of_dynamic_array() {
        let arr = PropertyBase::new(PropertyType::Array(Box::new(PropertyType::Int)));
        assert!(arr.is_dynamic_array());
        assert_eq!(arr.element().ty, PropertyType::Int);
    }

    #[test]
    fn element_of_fixed_array_keeps_type() {
        let mut fixed = PropertyBase::new(PropertyType::Float);
        fixed.array_dim = 4;
        assert!(fixed.is_fixed_array());
        let elem = fixed.element();
        assert_eq!(elem.array_dim, 1);
        assert_eq!(elem.ty, PropertyType::Float);
    }

    #[test]
    fn null_object() {
        let t = PropertyType::null_object();
        assert!(t.is_null_object());
        assert!(t.is_object_reference());
        assert!(!PropertyType::object(ClassId::new(0)).is_null_object());
    }

    #[test]
    fn export_text_escapes_strings() {
        let s = ConstValue::String("say \"hi\" \\o/".to_string());
        assert_eq!(s.export_text(), r#""say \"hi\" \\o/""#);
        assert_eq!(ConstValue::Float(OrderedFloat(1.5)).export_text(), "1.500000");
        assert_eq!(ConstValue::Rotator([0, 16384, -3]).export_text(), "rot(0,16384,-3)");
        assert_eq!(ConstValue::Object(ObjectRef::NONE).export_text(), "None");
    }

    #[test]
    fn matches_type_ignores_flags() {
        let a = PropertyBase::new(PropertyType::Int).with_flags(PropertyFlags::OUT_PARM);
        let b = PropertyBase::new(PropertyType::Int);
        assert!(a.matches_type(&b));
        assert_ne!(a, b);
    }
}
