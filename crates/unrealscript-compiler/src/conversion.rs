//! Type conversion system.
//!
//! Decides whether a value of one shape can be used where another is
//! expected, what bytecode (if any) performs the conversion, and what it
//! costs. Costs drive operator and argument matching:
//!
//! 1. Identity (same type, enum bytes count as bytes)
//! 2. `None` to an object, interface or delegate
//! 3. Subclass to parent class, scaled by inheritance distance
//! 4. Numeric widening (`byte` to `int`)
//! 5. Integer to float
//! 6. Truncation (`float` to `int`), only for `coerce` parameters
//! 7. Explicit-only conversions, only for `coerce` parameters
//!
//! Out parameters never convert.

use bitflags::bitflags;
use unrealscript_core::{ClassId, FunctionId, PropertyBase, PropertyFlags, PropertyType};
use unrealscript_registry::Registry;

use crate::bytecode::CastToken;

bitflags! {
    /// How a primitive conversion may be applied.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ConversionFlags: u8 {
        /// Applied implicitly.
        const AUTO = 0x01;
        /// Loses information.
        const TRUNCATE = 0x02;
    }
}

/// Primitive shape used as the conversion table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConvKind {
    None,
    Byte,
    Int,
    Bool,
    Float,
    Name,
    String,
    Object,
    Interface,
    Delegate,
    Vector,
    Rotator,
    Struct,
    Array,
    Map,
}

impl ConvKind {
    /// Classify a type. `Vector` and `Rotator` are recognised by struct name.
    pub fn of(registry: &Registry, ty: &PropertyType) -> ConvKind {
        match ty {
            PropertyType::None => ConvKind::None,
            PropertyType::Byte { .. } => ConvKind::Byte,
            PropertyType::Int => ConvKind::Int,
            PropertyType::Bool => ConvKind::Bool,
            PropertyType::Float => ConvKind::Float,
            PropertyType::Name => ConvKind::Name,
            PropertyType::String => ConvKind::String,
            PropertyType::Object { .. } => ConvKind::Object,
            PropertyType::Interface(_) => ConvKind::Interface,
            PropertyType::Delegate { .. } => ConvKind::Delegate,
            PropertyType::Struct(s) => {
                let name = &registry.script_struct(*s).name;
                if name.matches("Vector") {
                    ConvKind::Vector
                } else if name.matches("Rotator") {
                    ConvKind::Rotator
                } else {
                    ConvKind::Struct
                }
            }
            PropertyType::Array(_) => ConvKind::Array,
            PropertyType::Map { .. } => ConvKind::Map,
        }
    }
}

/// A primitive conversion table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastEntry {
    pub cast: CastToken,
    pub flags: ConversionFlags,
}

impl CastEntry {
    const fn explicit(cast: CastToken) -> Self {
        Self {
            cast,
            flags: ConversionFlags::empty(),
        }
    }

    const fn auto(cast: CastToken) -> Self {
        Self {
            cast,
            flags: ConversionFlags::AUTO,
        }
    }

    const fn truncate(cast: CastToken) -> Self {
        Self {
            cast,
            flags: ConversionFlags::AUTO.union(ConversionFlags::TRUNCATE),
        }
    }

    pub fn is_auto(&self) -> bool {
        self.flags.contains(ConversionFlags::AUTO)
    }

    pub fn is_truncating(&self) -> bool {
        self.flags.contains(ConversionFlags::TRUNCATE)
    }
}

/// Look up the primitive conversion from `src` to `dest`.
pub fn get_conversion(dest: ConvKind, src: ConvKind) -> Option<CastEntry> {
    use CastToken as C;
    use ConvKind as K;
    let entry = match (dest, src) {
        (K::Byte, K::Int) => CastEntry::truncate(C::IntToByte),
        (K::Byte, K::Bool) => CastEntry::explicit(C::BoolToByte),
        (K::Byte, K::Float) => CastEntry::truncate(C::FloatToByte),
        (K::Byte, K::String) => CastEntry::explicit(C::StringToByte),

        (K::Int, K::Byte) => CastEntry::auto(C::ByteToInt),
        (K::Int, K::Bool) => CastEntry::explicit(C::BoolToInt),
        (K::Int, K::Float) => CastEntry::truncate(C::FloatToInt),
        (K::Int, K::String) => CastEntry::explicit(C::StringToInt),

        (K::Bool, K::Byte) => CastEntry::explicit(C::ByteToBool),
        (K::Bool, K::Int) => CastEntry::explicit(C::IntToBool),
        (K::Bool, K::Float) => CastEntry::explicit(C::FloatToBool),
        (K::Bool, K::Object) => CastEntry::explicit(C::ObjectToBool),
        (K::Bool, K::Interface) => CastEntry::explicit(C::InterfaceToBool),
        (K::Bool, K::Name) => CastEntry::explicit(C::NameToBool),
        (K::Bool, K::String) => CastEntry::explicit(C::StringToBool),
        (K::Bool, K::Vector) => CastEntry::explicit(C::VectorToBool),
        (K::Bool, K::Rotator) => CastEntry::explicit(C::RotatorToBool),

        (K::Float, K::Byte) => CastEntry::auto(C::ByteToFloat),
        (K::Float, K::Int) => CastEntry::auto(C::IntToFloat),
        (K::Float, K::Bool) => CastEntry::explicit(C::BoolToFloat),
        (K::Float, K::String) => CastEntry::explicit(C::StringToFloat),

        (K::Name, K::String) => CastEntry::explicit(C::StringToName),

        (K::String, K::Byte) => CastEntry::explicit(C::ByteToString),
        (K::String, K::Int) => CastEntry::explicit(C::IntToString),
        (K::String, K::Bool) => CastEntry::explicit(C::BoolToString),
        (K::String, K::Float) => CastEntry::explicit(C::FloatToString),
        (K::String, K::Object) => CastEntry::explicit(C::ObjectToString),
        (K::String, K::Interface) => CastEntry::explicit(C::InterfaceToString),
        (K::String, K::Name) => CastEntry::explicit(C::NameToString),
        (K::String, K::Vector) => CastEntry::explicit(C::VectorToString),
        (K::String, K::Rotator) => CastEntry::explicit(C::RotatorToString),
        (K::String, K::Delegate) => CastEntry::explicit(C::DelegateToString),

        (K::Vector, K::String) => CastEntry::explicit(C::StringToVector),
        (K::Vector, K::Rotator) => CastEntry::explicit(C::RotatorToVector),
        (K::Rotator, K::String) => CastEntry::explicit(C::StringToRotator),
        (K::Rotator, K::Vector) => CastEntry::explicit(C::VectorToRotator),
        _ => return None,
    };
    Some(entry)
}

/// A conversion from one value shape to another, with its cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conversion {
    pub kind: ConversionKind,
    pub cost: u32,
}

/// The code a conversion needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionKind {
    /// Nothing to emit.
    Identity,
    /// `None` used as a delegate; the null object becomes an empty delegate.
    NullDelegate,
    /// Object to an interface it implements.
    InterfaceCast(ClassId),
    /// A primitive cast.
    Primitive(CastToken),
}

impl Conversion {
    /// Exact match.
    pub const COST_EXACT: u32 = 0;
    /// `None` to a reference type.
    pub const COST_NULL: u32 = 1;
    /// Numeric widening.
    pub const COST_WIDEN: u32 = 101;
    /// Integer to float.
    pub const COST_INT_TO_FLOAT: u32 = 102;
    /// Narrowing conversion into a `coerce` parameter.
    pub const COST_TRUNCATE: u32 = 104;
    /// Explicit-only conversion into a `coerce` parameter.
    pub const COST_EXPLICIT: u32 = 200;
    /// No conversion.
    pub const COST_MAX: u32 = u32::MAX;

    fn new(kind: ConversionKind, cost: u32) -> Self {
        Self { kind, cost }
    }

    pub(crate) fn identity() -> Self {
        Self::new(ConversionKind::Identity, Self::COST_EXACT)
    }

    pub fn is_exact(&self) -> bool {
        self.cost == Self::COST_EXACT
    }
}

/// Whether two shapes are the same type, treating enum bytes as bytes.
pub fn same_type(dest: &PropertyBase, src: &PropertyBase) -> bool {
    if dest.array_dim != src.array_dim {
        return false;
    }
    match (&dest.ty, &src.ty) {
        (PropertyType::Byte { .. }, PropertyType::Byte { .. }) => true,
        (a, b) => a == b,
    }
}

/// Find how a `src` value converts to `dest`.
///
/// `coerce` is set for `coerce` parameters and explicit casts, and admits
/// truncating and explicit-only primitive conversions.
pub fn find_conversion(
    registry: &Registry,
    dest: &PropertyBase,
    src: &PropertyBase,
    coerce: bool,
) -> Option<Conversion> {
    if same_type(dest, src) {
        return Some(Conversion::identity());
    }
    if dest.is_out() || dest.array_dim != src.array_dim {
        return None;
    }
    match (&dest.ty, &src.ty) {
        (_, PropertyType::None) | (PropertyType::None, _) => None,

        (PropertyType::Object { .. }, PropertyType::Object { class: None, .. })
        | (PropertyType::Interface(_), PropertyType::Object { class: None, .. }) => {
            Some(Conversion::new(ConversionKind::Identity, Conversion::COST_NULL))
        }
        (PropertyType::Delegate { .. }, PropertyType::Object { class: None, .. }) => Some(
            Conversion::new(ConversionKind::NullDelegate, Conversion::COST_NULL),
        ),

        (
            PropertyType::Object {
                class: Some(dest_class),
                meta: dest_meta,
            },
            PropertyType::Object {
                class: Some(src_class),
                meta: src_meta,
            },
        ) => object_distance(registry, *dest_class, *dest_meta, *src_class, *src_meta)
            .map(|d| Conversion::new(ConversionKind::Identity, d)),

        (PropertyType::Interface(iface), PropertyType::Object { class: Some(c), .. })
        | (PropertyType::Interface(iface), PropertyType::Interface(c)) => {
            if registry.implements_interface(*c, *iface) {
                Some(Conversion::new(
                    ConversionKind::InterfaceCast(*iface),
                    Conversion::COST_NULL,
                ))
            } else {
                None
            }
        }

        (PropertyType::Object { class: Some(c), meta: None }, PropertyType::Interface(_))
            if Some(*c) == registry.object_class() =>
        {
            Some(Conversion::new(
                ConversionKind::Primitive(CastToken::InterfaceToObject),
                Conversion::COST_NULL,
            ))
        }

        (PropertyType::Struct(d), PropertyType::Struct(s))
            if ConvKind::of(registry, &dest.ty) == ConvKind::of(registry, &src.ty) =>
        {
            registry
                .struct_distance(*s, *d)
                .map(|dist| Conversion::new(ConversionKind::Identity, dist))
        }

        (
            PropertyType::Delegate { function: Some(d) },
            PropertyType::Delegate { function: Some(s) },
        ) => {
            if signatures_match(registry, *d, *s) {
                Some(Conversion::new(ConversionKind::Identity, Conversion::COST_NULL))
            } else {
                None
            }
        }
        (PropertyType::Delegate { function: None }, PropertyType::Delegate { .. }) => {
            Some(Conversion::new(ConversionKind::Identity, Conversion::COST_NULL))
        }

        (PropertyType::Array(_), _) | (_, PropertyType::Array(_)) => None,
        (PropertyType::Map { .. }, _) | (_, PropertyType::Map { .. }) => None,

        (dest_ty, src_ty) => {
            let entry = get_conversion(ConvKind::of(registry, dest_ty), ConvKind::of(registry, src_ty))?;
            let cost = if entry.is_truncating() {
                if !coerce {
                    return None;
                }
                Conversion::COST_TRUNCATE
            } else if entry.is_auto() {
                match entry.cast {
                    CastToken::IntToFloat | CastToken::ByteToFloat => Conversion::COST_INT_TO_FLOAT,
                    _ => Conversion::COST_WIDEN,
                }
            } else if coerce {
                Conversion::COST_EXPLICIT
            } else {
                return None;
            };
            Some(Conversion::new(ConversionKind::Primitive(entry.cast), cost))
        }
    }
}

/// The cost of converting `src` to `dest`, [`Conversion::COST_MAX`] when
/// impossible.
pub fn conversion_cost(registry: &Registry, dest: &PropertyBase, src: &PropertyBase, coerce: bool) -> u32 {
    find_conversion(registry, dest, src, coerce)
        .map(|c| c.cost)
        .unwrap_or(Conversion::COST_MAX)
}

/// Distance from an object type to a parent object type. Class references
/// (`class<X>`) compare their limitor classes.
fn object_distance(
    registry: &Registry,
    dest_class: ClassId,
    dest_meta: Option<ClassId>,
    src_class: ClassId,
    src_meta: Option<ClassId>,
) -> Option<u32> {
    match (dest_meta, src_meta) {
        (Some(dest_meta), Some(src_meta)) => registry.inheritance_distance(src_meta, dest_meta),
        (Some(dest_meta), None) => {
            // A plain `Class` reference only fits `class<Object>`.
            if registry.is_child_of(src_class, registry.class_class())
                && Some(dest_meta) == registry.object_class()
            {
                Some(Conversion::COST_NULL)
            } else {
                None
            }
        }
        (None, _) => registry.inheritance_distance(src_class, dest_class),
    }
}

/// Whether two functions take and return the same types.
pub fn signatures_match(registry: &Registry, a: FunctionId, b: FunctionId) -> bool {
    if a == b {
        return true;
    }
    let fa = registry.function(a);
    let fb = registry.function(b);
    if fa.params.len() != fb.params.len() {
        return false;
    }
    let returns = match (fa.return_param, fb.return_param) {
        (None, None) => true,
        (Some(x), Some(y)) => registry.property(x).base().matches_type(&registry.property(y).base()),
        _ => false,
    };
    returns
        && fa.params.iter().zip(&fb.params).all(|(x, y)| {
            let (x, y) = (registry.property(*x), registry.property(*y));
            x.base().matches_type(&y.base())
                && x.flags.contains(PropertyFlags::OUT_PARM) == y.flags.contains(PropertyFlags::OUT_PARM)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use unrealscript_core::{Name, PropertyFlags};

    fn base(ty: PropertyType) -> PropertyBase {
        PropertyBase::new(ty)
    }

    fn core() -> (Registry, ClassId, ClassId) {
        let mut registry = Registry::new();
        let object = registry.add_class(Name::new("Object"), Name::new("Core")).unwrap();
        let actor = registry.add_class(Name::new("Actor"), Name::new("Engine")).unwrap();
        registry.class_mut(actor).super_class = Some(object);
        (registry, object, actor)
    }

    #[test]
    fn identity_costs_nothing() {
        let (registry, _, actor) = core();
        for ty in [
            PropertyType::Int,
            PropertyType::Float,
            PropertyType::String,
            PropertyType::object(actor),
        ] {
            assert_eq!(conversion_cost(&registry, &base(ty.clone()), &base(ty), false), 0);
        }
    }

    #[test]
    fn byte_widens_to_int_but_int_does_not_narrow() {
        let (registry, _, _) = core();
        let byte = base(PropertyType::byte());
        let int = base(PropertyType::Int);
        assert_eq!(conversion_cost(&registry, &int, &byte, false), Conversion::COST_WIDEN);
        assert_eq!(conversion_cost(&registry, &byte, &int, false), Conversion::COST_MAX);
        assert_eq!(conversion_cost(&registry, &byte, &int, true), Conversion::COST_TRUNCATE);
    }

    #[test]
    fn int_to_float_is_automatic() {
        let (registry, _, _) = core();
        let conv = find_conversion(&registry, &base(PropertyType::Float), &base(PropertyType::Int), false).unwrap();
        assert_eq!(conv.kind, ConversionKind::Primitive(CastToken::IntToFloat));
        assert_eq!(conv.cost, Conversion::COST_INT_TO_FLOAT);
    }

    #[test]
    fn explicit_conversions_need_coerce() {
        let (registry, _, _) = core();
        let string = base(PropertyType::String);
        let int = base(PropertyType::Int);
        assert!(find_conversion(&registry, &string, &int, false).is_none());
        let conv = find_conversion(&registry, &string, &int, true).unwrap();
        assert_eq!(conv.kind, ConversionKind::Primitive(CastToken::IntToString));
        assert_eq!(conv.cost, Conversion::COST_EXPLICIT);
    }

    #[test]
    fn enum_bytes_match_plain_bytes() {
        let (mut registry, object, _) = core();
        let e = registry
            .add_enum(object, Name::new("EMode"), vec![Name::new("M_A"), Name::new("EMode_MAX")])
            .unwrap();
        let tagged = base(PropertyType::Byte { enum_: Some(e) });
        assert_eq!(conversion_cost(&registry, &base(PropertyType::byte()), &tagged, false), 0);
    }

    #[test]
    fn subclass_cost_is_distance() {
        let (registry, object, actor) = core();
        let cost = conversion_cost(
            &registry,
            &base(PropertyType::object(object)),
            &base(PropertyType::object(actor)),
            false,
        );
        assert_eq!(cost, 1);
        assert_eq!(
            conversion_cost(
                &registry,
                &base(PropertyType::object(actor)),
                &base(PropertyType::object(object)),
                false
            ),
            Conversion::COST_MAX
        );
        assert_eq!(
            conversion_cost(
                &registry,
                &base(PropertyType::object(actor)),
                &base(PropertyType::null_object()),
                false
            ),
            Conversion::COST_NULL
        );
    }

    #[test]
    fn out_parameters_never_convert() {
        let (registry, _, _) = core();
        let dest = base(PropertyType::Int).with_flags(PropertyFlags::OUT_PARM);
        assert!(find_conversion(&registry, &dest, &base(PropertyType::byte()), true).is_none());
        assert!(find_conversion(&registry, &dest, &base(PropertyType::Int), false).is_some());
    }

    #[test]
    fn arrays_need_identical_inner_types() {
        let (registry, _, _) = core();
        let ints = base(PropertyType::Array(Box::new(PropertyType::Int)));
        let floats = base(PropertyType::Array(Box::new(PropertyType::Float)));
        assert_eq!(conversion_cost(&registry, &floats, &ints, true), Conversion::COST_MAX);
    }

    #[test]
    fn vector_rotator_by_struct_name() {
        let (mut registry, object, _) = core();
        let vector = registry.add_struct(object, Name::new("Vector")).unwrap();
        let rotator = registry.add_struct(object, Name::new("Rotator")).unwrap();
        let conv = find_conversion(
            &registry,
            &base(PropertyType::Struct(rotator)),
            &base(PropertyType::Struct(vector)),
            true,
        )
        .unwrap();
        assert_eq!(conv.kind, ConversionKind::Primitive(CastToken::VectorToRotator));
    }

    #[test]
    fn none_becomes_empty_delegate() {
        let (registry, _, _) = core();
        let conv = find_conversion(
            &registry,
            &base(PropertyType::Delegate { function: None }),
            &base(PropertyType::null_object()),
            false,
        )
        .unwrap();
        assert_eq!(conv.kind, ConversionKind::NullDelegate);
    }
}
