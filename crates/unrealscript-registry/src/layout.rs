//! Memory layout of classes, structs and function frames.
//!
//! Offsets follow the native object layout the generated headers describe:
//! every property is aligned to its natural alignment, consecutive scalar
//! bools share one 32-bit bitfield, and a struct's size is rounded up to its
//! alignment. A child starts laying out its own fields at the end of its
//! parent and never packs bools into the parent's last bitfield.

use unrealscript_core::{ClassId, FieldOwner, FunctionId, PropertyId, PropertyType, StructId};

use crate::registry::Registry;

/// Size and alignment of a `map{...}` property.
pub const MAP_SIZE: u32 = 20;

/// Round `value` up to a multiple of `align`.
pub fn align_up(value: u32, align: u32) -> u32 {
    if align <= 1 {
        value
    } else {
        value.div_ceil(align) * align
    }
}

/// Result of laying out a list of properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutEnd {
    /// First free byte after the last property.
    pub size: u32,
    /// Largest alignment seen.
    pub align: u32,
}

impl Registry {
    /// Size and alignment of one element of a type.
    pub fn type_layout(&mut self, ty: &PropertyType) -> (u32, u32) {
        match ty {
            PropertyType::None => (0, 1),
            PropertyType::Byte { .. } => (1, 1),
            PropertyType::Int
            | PropertyType::Bool
            | PropertyType::Float
            | PropertyType::Object { .. } => (4, 4),
            PropertyType::Name | PropertyType::Interface(_) => (8, 4),
            PropertyType::String | PropertyType::Array(_) | PropertyType::Delegate { .. } => {
                (12, 4)
            }
            PropertyType::Map { .. } => (MAP_SIZE, 4),
            PropertyType::Struct(id) => {
                self.link_struct(*id);
                let entry = self.script_struct(*id);
                (entry.size, entry.min_alignment.max(1))
            }
        }
    }

    /// Assign offsets to `properties` starting at `start`.
    fn layout_properties(&mut self, properties: &[PropertyId], start: u32, align: u32) -> LayoutEnd {
        let mut offset = start;
        let mut max_align = align.max(1);
        // Offset of the open bitfield and the next free bit in it.
        let mut bitfield: Option<(u32, u32)> = None;

        for &id in properties {
            let ty = self.property(id).ty.clone();
            let dim = self.property(id).array_dim.max(1);

            if matches!(ty, PropertyType::Bool) && dim == 1 {
                let (word, bit) = match bitfield {
                    Some((word, bit)) if bit < 32 => (word, bit),
                    _ => {
                        let word = align_up(offset, 4);
                        offset = word + 4;
                        (word, 0)
                    }
                };
                max_align = max_align.max(4);
                let prop = self.property_mut(id);
                prop.offset = word;
                prop.bool_mask = 1 << bit;
                bitfield = Some((word, bit + 1));
                continue;
            }
            bitfield = None;

            let (size, elem_align) = self.type_layout(&ty);
            offset = align_up(offset, elem_align);
            max_align = max_align.max(elem_align);
            let prop = self.property_mut(id);
            prop.offset = offset;
            prop.bool_mask = if matches!(ty, PropertyType::Bool) { 1 } else { 0 };
            offset += size * dim;
        }

        LayoutEnd {
            size: offset,
            align: max_align,
        }
    }

    /// Lay out a struct, its parent first. Does nothing once linked.
    pub fn link_struct(&mut self, id: StructId) {
        if self.script_struct(id).linked {
            return;
        }
        // Marked first so a struct containing itself cannot recurse forever.
        self.script_struct_mut(id).linked = true;

        let (start, align) = match self.script_struct(id).super_struct {
            Some(parent) => {
                self.link_struct(parent);
                let p = self.script_struct(parent);
                (p.size, p.min_alignment)
            }
            None => (0, 1),
        };
        let members = self.script_struct(id).properties.clone();
        let end = self.layout_properties(&members, start, align);
        let entry = self.script_struct_mut(id);
        entry.min_alignment = end.align;
        entry.size = align_up(end.size, end.align);
        tracing::trace!(name = %entry.name, size = entry.size, "linked struct");
    }

    /// Lay out a class's own properties after its parent's.
    pub fn link_class(&mut self, id: ClassId) {
        let (start, align) = match self.class(id).super_class {
            Some(parent) => {
                let p = self.class(parent);
                (p.properties_size, p.min_alignment)
            }
            None => (0, 4),
        };
        for s in self.class(id).structs.clone() {
            self.link_struct(s);
        }
        let properties = self.class(id).properties.clone();
        let end = self.layout_properties(&properties, start, align);
        let entry = self.class_mut(id);
        entry.min_alignment = end.align;
        entry.properties_size = align_up(end.size, end.align);
        tracing::trace!(name = %entry.name, size = entry.properties_size, "linked class");
    }

    /// Lay out a function's parameters, return value and locals.
    pub fn link_function(&mut self, id: FunctionId) {
        let function = self.function(id);
        let mut parms: Vec<PropertyId> = function.params.clone();
        parms.extend(function.return_param);
        let locals = function.locals.clone();

        let parm_end = self.layout_properties(&parms, 0, 1);
        let frame_end = self.layout_properties(&locals, parm_end.size, parm_end.align);

        let return_offset = self
            .function(id)
            .return_param
            .map(|r| self.property(r).offset);
        let function = self.function_mut(id);
        function.parms_size = parm_end.size;
        function.frame_size = frame_end.size;
        function.return_value_offset = return_offset;
    }

    /// Size of a property including every fixed-array element.
    pub fn property_size(&mut self, id: PropertyId) -> u32 {
        let ty = self.property(id).ty.clone();
        let dim = self.property(id).array_dim.max(1);
        self.type_layout(&ty).0 * dim
    }

    /// Whether a property lives in a function frame.
    pub fn is_frame_property(&self, id: PropertyId) -> bool {
        matches!(self.property(id).owner, FieldOwner::Function(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entries::{FunctionEntry, PropertyEntry};
    use unrealscript_core::{Name, PropertyFlags};

    fn prop(registry: &mut Registry, owner: FieldOwner, name: &str, ty: PropertyType) -> PropertyId {
        registry.add_property(PropertyEntry::new(Name::new(name), owner, ty))
    }

    #[test]
    fn align_up_rounds() {
        assert_eq!(align_up(5, 4), 8);
        assert_eq!(align_up(8, 4), 8);
        assert_eq!(align_up(3, 1), 3);
    }

    #[test]
    fn bools_share_a_bitfield() {
        let mut registry = Registry::new();
        let object = registry.add_class(Name::new("Object"), Name::new("Core")).unwrap();
        let owner = FieldOwner::Class(object);
        let a = prop(&mut registry, owner, "bA", PropertyType::Bool);
        let b = prop(&mut registry, owner, "bB", PropertyType::Bool);
        let n = prop(&mut registry, owner, "Count", PropertyType::byte());
        let c = prop(&mut registry, owner, "bC", PropertyType::Bool);
        registry.link_class(object);

        assert_eq!(registry.property(a).offset, 0);
        assert_eq!(registry.property(b).offset, 0);
        assert_eq!(registry.property(a).bool_mask, 1);
        assert_eq!(registry.property(b).bool_mask, 2);
        assert_eq!(registry.property(n).offset, 4);
        assert_eq!(registry.property(c).offset, 8);
        assert_eq!(registry.property(c).bool_mask, 1);
        assert_eq!(registry.class(object).properties_size, 12);
    }

    #[test]
    fn struct_size_rounds_to_alignment() {
        let mut registry = Registry::new();
        let object = registry.add_class(Name::new("Object"), Name::new("Core")).unwrap();
        let s = registry.add_struct(object, Name::new("Pair")).unwrap();
        let owner = FieldOwner::Struct(s);
        prop(&mut registry, owner, "Key", PropertyType::Int);
        prop(&mut registry, owner, "Tag", PropertyType::byte());
        registry.link_struct(s);
        assert_eq!(registry.script_struct(s).size, 8);
        assert_eq!(registry.script_struct(s).min_alignment, 4);
    }

    #[test]
    fn child_class_starts_after_parent() {
        let mut registry = Registry::new();
        let object = registry.add_class(Name::new("Object"), Name::new("Core")).unwrap();
        let actor = registry.add_class(Name::new("Actor"), Name::new("Engine")).unwrap();
        registry.class_mut(actor).super_class = Some(object);
        prop(&mut registry, FieldOwner::Class(object), "Outer", PropertyType::object(object));
        let tag = prop(&mut registry, FieldOwner::Class(actor), "Tag", PropertyType::Name);
        registry.link_class(object);
        registry.link_class(actor);
        assert_eq!(registry.property(tag).offset, 4);
        assert_eq!(registry.class(actor).properties_size, 12);
    }

    #[test]
    fn function_frame() {
        let mut registry = Registry::new();
        let object = registry.add_class(Name::new("Object"), Name::new("Core")).unwrap();
        let f = registry.add_function(FunctionEntry::new(Name::new("Lerp"), FieldOwner::Class(object)));
        let owner = FieldOwner::Function(f);
        let mut alpha = PropertyEntry::new(Name::new("Alpha"), owner, PropertyType::Float);
        alpha.flags = PropertyFlags::PARM;
        registry.add_property(alpha);
        let mut ret = PropertyEntry::new(Name::new("ReturnValue"), owner, PropertyType::String);
        ret.flags = PropertyFlags::PARM | PropertyFlags::RETURN_PARM | PropertyFlags::OUT_PARM;
        registry.add_property(ret);
        prop(&mut registry, owner, "Tmp", PropertyType::byte());
        registry.link_function(f);

        let func = registry.function(f);
        assert_eq!(func.parms_size, 16);
        assert_eq!(func.return_value_offset, Some(4));
        assert_eq!(func.frame_size, 17);
    }
}
