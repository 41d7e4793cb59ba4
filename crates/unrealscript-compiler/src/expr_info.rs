//! What the compiler knows about an expression it has just emitted.
//!
//! Every expression compile returns an [`ExprInfo`]: the value's shape, where
//! its code starts in the buffer (so conversions and headers can be inserted
//! in front of it), and whether it can be assigned to.

use unrealscript_core::{ConstValue, FunctionId, PropertyBase, PropertyId};

use crate::bytecode::SiteId;

/// The local variable an expression reads, if it is rooted in one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LocalRef {
    pub property: PropertyId,
    /// Whether the read happened before any assignment.
    pub unassigned_read: bool,
}

/// A compiled expression.
#[derive(Debug, Clone)]
pub(crate) struct ExprInfo {
    /// Type of the value, with the flags of the property it reads.
    pub ty: PropertyBase,
    /// Buffer offset of the expression's first byte.
    pub start: usize,
    /// Whether the expression names storage.
    pub lvalue: bool,
    /// Whether evaluating the expression changes state.
    pub side_effect: bool,
    /// Value of a literal or named constant.
    pub const_value: Option<ConstValue>,
    /// Property read directly by the expression.
    pub property: Option<PropertyId>,
    /// Function called by the expression.
    pub call: Option<FunctionId>,
    pub local: Option<LocalRef>,
    /// Struct-modified flags to set if the expression is written.
    pub struct_mods: Vec<SiteId>,
}

impl ExprInfo {
    /// A value that is not storage.
    pub fn rvalue(ty: PropertyBase, start: usize) -> Self {
        Self {
            ty,
            start,
            lvalue: false,
            side_effect: false,
            const_value: None,
            property: None,
            call: None,
            local: None,
            struct_mods: Vec::new(),
        }
    }

    /// A compile-time constant.
    pub fn constant(ty: PropertyBase, start: usize, value: ConstValue) -> Self {
        Self {
            const_value: Some(value),
            ..Self::rvalue(ty, start)
        }
    }

    /// A read of a property.
    pub fn variable(ty: PropertyBase, start: usize, property: PropertyId) -> Self {
        Self {
            lvalue: true,
            property: Some(property),
            ..Self::rvalue(ty, start)
        }
    }

    /// The result of a call.
    pub fn call(ty: PropertyBase, start: usize, function: FunctionId) -> Self {
        Self {
            side_effect: true,
            call: Some(function),
            ..Self::rvalue(ty, start)
        }
    }

    /// Whether the expression yields no value.
    pub fn is_void(&self) -> bool {
        self.ty.ty.is_none()
    }

    /// Whether the expression may be the target of an assignment.
    pub fn is_assignable(&self) -> bool {
        self.lvalue && !self.ty.is_const()
    }

    /// Derive the info of an element or member reached through this value.
    pub fn derived(&self, ty: PropertyBase) -> Self {
        Self {
            ty,
            start: self.start,
            lvalue: self.lvalue,
            side_effect: false,
            const_value: None,
            property: None,
            call: None,
            local: self.local,
            struct_mods: self.struct_mods.clone(),
        }
    }
}
