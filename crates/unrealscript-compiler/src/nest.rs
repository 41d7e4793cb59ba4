//! Nesting and jump fixups.
//!
//! Every lexical construct the compiler enters (class, state, function, `if`,
//! loops, `switch`) pushes a [`Nest`]. A nest decides which statements are
//! allowed inside it and collects the forward jumps that target one of its
//! positions. Jumps are emitted as placeholders with
//! [`NestStack::emit_address_to_fixup_later`]; the positions they aim at are
//! recorded with [`NestStack::set_fixup`]; [`NestStack::pop`] resolves every
//! placeholder and fails if one has no target.

use bitflags::bitflags;
use unrealscript_core::limits::MAX_NEST;
use unrealscript_core::{
    ClassId, CompileError, FunctionId, Name, PropertyBase, Span, StateId,
};

use crate::bytecode::{ScriptBuffer, SiteId};

type Result<T> = std::result::Result<T, CompileError>;

/// The kind of a nesting level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NestKind {
    None,
    Class,
    Interface,
    State,
    Function,
    If,
    Loop,
    Switch,
    For,
    ForEach,
}

impl NestKind {
    /// Keyword shown in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            NestKind::None => "global scope",
            NestKind::Class => "class",
            NestKind::Interface => "interface",
            NestKind::State => "state",
            NestKind::Function => "function",
            NestKind::If => "if",
            NestKind::Loop => "loop",
            NestKind::Switch => "switch",
            NestKind::For => "for",
            NestKind::ForEach => "foreach",
        }
    }

    /// Whether `break` leaves this nest.
    pub fn is_breakable(&self) -> bool {
        matches!(
            self,
            NestKind::Loop | NestKind::For | NestKind::ForEach | NestKind::Switch
        )
    }

    /// Whether `continue` targets this nest.
    pub fn is_loop(&self) -> bool {
        matches!(self, NestKind::Loop | NestKind::For | NestKind::ForEach)
    }
}

bitflags! {
    /// What may appear directly inside a nest.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AllowFlags: u32 {
        /// Executable statements.
        const CMD = 0x0001;
        const FUNCTION = 0x0002;
        const VAR_DECL = 0x0004;
        const RETURN = 0x0008;
        const STATE = 0x0010;
        const IGNORES = 0x0020;
        /// `enum` and `struct` declarations.
        const TYPE_DECL = 0x0040;
        const CASE = 0x0080;
        const DEFAULT_CASE = 0x0100;
        const LABEL = 0x0200;
        const BREAK = 0x0400;
        const CONTINUE = 0x0800;
        const REPLICATION = 0x1000;
        const CONST = 0x2000;
        const CPP_TEXT = 0x4000;
        const DEFAULT_PROPERTIES = 0x8000;
        /// Code that runs in a state rather than a function.
        const STATE_CODE = 0x1_0000;
    }
}

impl AllowFlags {
    /// Permissions of a new nest of `kind` inside a nest allowing `parent`.
    pub fn derive(kind: NestKind, parent: AllowFlags) -> AllowFlags {
        let inherited = parent & (Self::CMD | Self::RETURN | Self::STATE_CODE);
        match kind {
            NestKind::None => AllowFlags::empty(),
            NestKind::Class => {
                Self::VAR_DECL
                    | Self::FUNCTION
                    | Self::STATE
                    | Self::TYPE_DECL
                    | Self::CONST
                    | Self::REPLICATION
                    | Self::CPP_TEXT
                    | Self::DEFAULT_PROPERTIES
            }
            NestKind::Interface => Self::FUNCTION | Self::CPP_TEXT,
            NestKind::State => {
                Self::FUNCTION | Self::IGNORES | Self::CMD | Self::LABEL | Self::STATE_CODE
            }
            NestKind::Function => Self::CMD | Self::VAR_DECL | Self::RETURN | Self::LABEL,
            NestKind::If => inherited | (parent & (Self::BREAK | Self::CONTINUE)),
            NestKind::Loop | NestKind::For | NestKind::ForEach => {
                inherited | Self::BREAK | Self::CONTINUE
            }
            NestKind::Switch => {
                inherited | (parent & Self::CONTINUE) | Self::BREAK | Self::CASE | Self::DEFAULT_CASE
            }
        }
    }
}

/// The positions a nest's jumps can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixupKind {
    IfEnd,
    ElseEnd,
    LoopStart,
    LoopEnd,
    SwitchEnd,
    ForStart,
    ForEnd,
    IteratorEnd,
    ContinueLoop,
    /// A named label; the target comes from the nest's label list.
    Label,
}

impl FixupKind {
    const COUNT: usize = 10;

    fn slot(self) -> usize {
        self as usize
    }
}

/// A jump operand waiting for its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixup {
    pub site: SiteId,
    pub kind: FixupKind,
    pub label: Option<Name>,
    /// Where the jump was written, for messages.
    pub span: Span,
}

/// The reflection object a nest compiles into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NestNode {
    None,
    Class(ClassId),
    State(StateId),
    Function(FunctionId),
}

/// Bookkeeping for an open `switch`.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchNest {
    /// Type of the switch expression.
    pub ty: PropertyBase,
    /// The previous `case` operand, pointed at the next `case` once it is
    /// compiled.
    pub chain: Option<SiteId>,
    pub has_default: bool,
}

/// One nesting level.
#[derive(Debug, Clone)]
pub struct Nest {
    pub kind: NestKind,
    pub allow: AllowFlags,
    pub node: NestNode,
    fixups: Vec<Fixup>,
    targets: [Option<SiteId>; FixupKind::COUNT],
    /// Labels declared directly in this nest.
    pub labels: Vec<(Name, SiteId)>,
    pub switch: Option<SwitchNest>,
    /// Set on a `foreach` over an iterator function, whose frame must be
    /// popped when code leaves the loop early.
    pub iterator: bool,
}

impl Nest {
    fn new(kind: NestKind, allow: AllowFlags, node: NestNode) -> Self {
        Self {
            kind,
            allow,
            node,
            fixups: Vec::new(),
            targets: [None; FixupKind::COUNT],
            labels: Vec::new(),
            switch: None,
            iterator: false,
        }
    }

    /// Target recorded for a fixup kind.
    pub fn target(&self, kind: FixupKind) -> Option<SiteId> {
        self.targets[kind.slot()]
    }

    /// Jumps not yet resolved.
    pub fn pending(&self) -> &[Fixup] {
        &self.fixups
    }

    /// Find a label.
    pub fn label(&self, name: &Name) -> Option<SiteId> {
        self.labels.iter().find(|(n, _)| n == name).map(|(_, s)| *s)
    }
}

/// The stack of open nests.
#[derive(Debug, Clone, Default)]
pub struct NestStack {
    nests: Vec<Nest>,
}

impl NestStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open nests.
    pub fn len(&self) -> usize {
        self.nests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nests.is_empty()
    }

    pub fn get(&self, index: usize) -> &Nest {
        &self.nests[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut Nest {
        &mut self.nests[index]
    }

    /// The innermost nest.
    pub fn top(&self) -> Option<&Nest> {
        self.nests.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Nest> {
        self.nests.last_mut()
    }

    /// Index of the innermost nest.
    pub fn top_index(&self) -> Option<usize> {
        self.nests.len().checked_sub(1)
    }

    /// Permissions of the innermost nest.
    pub fn allow(&self) -> AllowFlags {
        self.top().map(|n| n.allow).unwrap_or_default()
    }

    /// Innermost nest satisfying `pred`, searching outwards.
    pub fn find(&self, pred: impl Fn(&Nest) -> bool) -> Option<usize> {
        self.nests.iter().rposition(pred)
    }

    /// Innermost nest of one of `kinds`.
    pub fn find_kind(&self, kinds: &[NestKind]) -> Option<usize> {
        self.find(|n| kinds.contains(&n.kind))
    }

    /// Iterate from the innermost nest outwards.
    pub fn iter_inner(&self) -> impl Iterator<Item = &Nest> {
        self.nests.iter().rev()
    }

    /// Open a nest.
    pub fn push(&mut self, kind: NestKind, node: NestNode, span: Span) -> Result<usize> {
        if self.nests.len() >= MAX_NEST {
            return Err(CompileError::declaration("Maximum nesting limit exceeded", span));
        }
        let allow = AllowFlags::derive(kind, self.allow());
        self.nests.push(Nest::new(kind, allow, node));
        tracing::trace!(kind = kind.as_str(), depth = self.nests.len(), "push nest");
        Ok(self.nests.len() - 1)
    }

    /// Emit a jump operand that will point at `kind` (or `label`) of nest
    /// `index` once the nest closes.
    pub fn emit_address_to_fixup_later(
        &mut self,
        buffer: &mut ScriptBuffer,
        index: usize,
        kind: FixupKind,
        label: Option<Name>,
        span: Span,
    ) -> SiteId {
        let site = buffer.emit_placeholder();
        self.nests[index].fixups.push(Fixup {
            site,
            kind,
            label,
            span,
        });
        site
    }

    /// Emit a `case` chain operand, patched when the next `case` (or the
    /// end of the switch) is reached.
    pub fn emit_address_to_chain_later(&mut self, buffer: &mut ScriptBuffer, index: usize, span: Span) -> Result<()> {
        let site = buffer.emit_placeholder();
        let switch = self.nests[index]
            .switch
            .as_mut()
            .ok_or_else(|| CompileError::internal("Case chain outside a switch", span))?;
        if switch.chain.is_some() {
            return Err(CompileError::internal("Case chain already pending", span));
        }
        switch.chain = Some(site);
        Ok(())
    }

    /// Point the pending `case` chain operand at the current position.
    pub fn resolve_chain(&mut self, buffer: &mut ScriptBuffer, index: usize) {
        if let Some(switch) = self.nests[index].switch.as_mut()
            && let Some(site) = switch.chain.take()
        {
            let here = buffer.marker();
            buffer.resolve(site, here);
        }
    }

    /// Record the current position as the target of `kind` in nest `index`.
    pub fn set_fixup(&mut self, buffer: &mut ScriptBuffer, index: usize, kind: FixupKind) -> SiteId {
        let here = buffer.marker();
        self.set_fixup_at(index, kind, here);
        here
    }

    /// Record an existing site as the target of `kind` in nest `index`.
    pub fn set_fixup_at(&mut self, index: usize, kind: FixupKind, site: SiteId) {
        self.nests[index].targets[kind.slot()] = Some(site);
    }

    /// Declare a label at the current position in nest `index`.
    pub fn add_label(&mut self, buffer: &mut ScriptBuffer, index: usize, name: Name, span: Span) -> Result<SiteId> {
        if self.nests[index].label(&name).is_some() {
            return Err(CompileError::declaration(
                format!("Duplicate label '{}'", name),
                span,
            ));
        }
        let here = buffer.marker();
        self.nests[index].labels.push((name, here));
        Ok(here)
    }

    /// Close the innermost nest, resolving its jumps.
    ///
    /// Fails if the innermost nest is not of `kind`, if a `goto` names a
    /// label that was never declared, or if any jump has no target.
    pub fn pop(&mut self, buffer: &mut ScriptBuffer, kind: NestKind, span: Span) -> Result<Nest> {
        let Some(nest) = self.nests.pop() else {
            return Err(CompileError::internal(
                format!("Unexpected end of {}", kind.as_str()),
                span,
            ));
        };
        if nest.kind != kind {
            return Err(CompileError::internal(
                format!(
                    "Nest mismatch: closing {} while inside {}",
                    kind.as_str(),
                    nest.kind.as_str()
                ),
                span,
            ));
        }
        for fixup in &nest.fixups {
            let target = match (&fixup.kind, &fixup.label) {
                (FixupKind::Label, Some(label)) => nest.label(label).ok_or_else(|| {
                    CompileError::type_error(format!("Label '{}' not found", label), fixup.span)
                })?,
                (other, _) => nest.target(*other).ok_or_else(|| {
                    CompileError::internal(
                        format!("Unresolved {:?} jump in {}", other, kind.as_str()),
                        fixup.span,
                    )
                })?,
            };
            buffer.resolve(fixup.site, target);
        }
        tracing::trace!(kind = kind.as_str(), depth = self.nests.len(), "pop nest");
        Ok(nest)
    }

    /// Drop every open nest, after a compile error.
    pub fn clear(&mut self) {
        self.nests.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::ExprToken;

    #[test]
    fn function_allows_locals_and_return() {
        let allow = AllowFlags::derive(NestKind::Function, AllowFlags::empty());
        assert!(allow.contains(AllowFlags::VAR_DECL | AllowFlags::RETURN | AllowFlags::CMD));
        let inner = AllowFlags::derive(NestKind::If, allow);
        assert!(inner.contains(AllowFlags::RETURN));
        assert!(!inner.contains(AllowFlags::VAR_DECL));
        assert!(!inner.contains(AllowFlags::BREAK));
    }

    #[test]
    fn switch_inside_loop_keeps_continue() {
        let func = AllowFlags::derive(NestKind::Function, AllowFlags::empty());
        let looped = AllowFlags::derive(NestKind::Loop, func);
        let switch = AllowFlags::derive(NestKind::Switch, looped);
        assert!(switch.contains(AllowFlags::CONTINUE | AllowFlags::BREAK | AllowFlags::CASE));
        let plain_switch = AllowFlags::derive(NestKind::Switch, func);
        assert!(!plain_switch.contains(AllowFlags::CONTINUE));
    }

    #[test]
    fn forward_jump_resolved_on_pop() {
        let mut buffer = ScriptBuffer::new();
        let mut nests = NestStack::new();
        nests.push(NestKind::Function, NestNode::None, Span::default()).unwrap();
        let index = nests.push(NestKind::If, NestNode::None, Span::default()).unwrap();
        buffer.emit_token(ExprToken::JumpIfNot);
        nests.emit_address_to_fixup_later(&mut buffer, index, FixupKind::IfEnd, None, Span::default());
        buffer.emit_token(ExprToken::True);
        buffer.emit_token(ExprToken::Stop);
        nests.set_fixup(&mut buffer, index, FixupKind::IfEnd);
        nests.pop(&mut buffer, NestKind::If, Span::default()).unwrap();

        assert_eq!(buffer.read_u16(1), 5);
        assert_eq!(buffer.pending_placeholders(), 0);
        assert_eq!(nests.len(), 1);
    }

    #[test]
    fn missing_target_is_internal_error() {
        let mut buffer = ScriptBuffer::new();
        let mut nests = NestStack::new();
        let index = nests.push(NestKind::Loop, NestNode::None, Span::default()).unwrap();
        nests.emit_address_to_fixup_later(&mut buffer, index, FixupKind::LoopEnd, None, Span::default());
        let err = nests.pop(&mut buffer, NestKind::Loop, Span::default()).unwrap_err();
        assert_eq!(err.kind, unrealscript_core::CompileErrorKind::Internal);
    }

    #[test]
    fn labels_resolve_backwards_and_forwards() {
        let mut buffer = ScriptBuffer::new();
        let mut nests = NestStack::new();
        let index = nests.push(NestKind::Function, NestNode::None, Span::default()).unwrap();
        nests.add_label(&mut buffer, index, Name::new("Top"), Span::default()).unwrap();
        buffer.emit_token(ExprToken::Jump);
        nests.emit_address_to_fixup_later(&mut buffer, index, FixupKind::Label, Some(Name::new("done")), Span::default());
        buffer.emit_token(ExprToken::Jump);
        nests.emit_address_to_fixup_later(&mut buffer, index, FixupKind::Label, Some(Name::new("top")), Span::default());
        nests.add_label(&mut buffer, index, Name::new("Done"), Span::default()).unwrap();
        nests.pop(&mut buffer, NestKind::Function, Span::default()).unwrap();
        assert_eq!(buffer.read_u16(1), 6);
        assert_eq!(buffer.read_u16(4), 0);
    }

    #[test]
    fn unknown_label_is_reported() {
        let mut buffer = ScriptBuffer::new();
        let mut nests = NestStack::new();
        let index = nests.push(NestKind::Function, NestNode::None, Span::default()).unwrap();
        nests.emit_address_to_fixup_later(&mut buffer, index, FixupKind::Label, Some(Name::new("Nowhere")), Span::new(7, 3, 1));
        let err = nests.pop(&mut buffer, NestKind::Function, Span::default()).unwrap_err();
        assert_eq!(err.message, "Label 'Nowhere' not found");
        assert_eq!(err.line, 7);
    }

    #[test]
    fn mismatched_pop_fails() {
        let mut buffer = ScriptBuffer::new();
        let mut nests = NestStack::new();
        nests.push(NestKind::Function, NestNode::None, Span::default()).unwrap();
        assert!(nests.pop(&mut buffer, NestKind::State, Span::default()).is_err());
    }

    #[test]
    fn case_chain_points_at_next_case() {
        let mut buffer = ScriptBuffer::new();
        let mut nests = NestStack::new();
        let index = nests.push(NestKind::Switch, NestNode::None, Span::default()).unwrap();
        nests.get_mut(index).switch = Some(SwitchNest {
            ty: PropertyBase::new(unrealscript_core::PropertyType::Int),
            chain: None,
            has_default: false,
        });
        buffer.emit_token(ExprToken::Case);
        nests.emit_address_to_chain_later(&mut buffer, index, Span::default()).unwrap();
        buffer.emit_token(ExprToken::IntOne);
        nests.resolve_chain(&mut buffer, index);
        assert_eq!(buffer.read_u16(1), 4);
        assert!(nests.get(index).switch.as_ref().unwrap().chain.is_none());
    }
}
