//! Growable script buffer with relocatable code sites.
//!
//! Bytecode is mostly appended, but the compiler regularly needs to put an
//! instruction *before* code it already emitted (a cast in front of an
//! operand, `Let` in front of an assignment target, a `for` increment after
//! the loop body). [`ScriptBuffer::splice`] moves a byte range and keeps every
//! registered [`CodeSite`] pointing at the same logical code.
//!
//! Sites come in a few kinds:
//!
//! - [`SiteKind::Placeholder`]: a `u16` jump operand waiting for its target
//! - [`SiteKind::Address`]: a resolved `u16` jump operand; its stored value is
//!   an absolute code offset and is relocated along with the code
//! - [`SiteKind::Skip`]: a `u16` length operand
//! - [`SiteKind::StructModified`]: a one-byte flag patched once it is known
//!   whether a struct member access is written through
//! - [`SiteKind::Marker`]: a bare position, such as a loop start or label

use std::ops::Range;

use ordered_float::OrderedFloat;
use unrealscript_core::ObjectRef;

use super::token::{CastToken, ExprToken};

/// Handle to a registered code site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteId(u32);

/// What a code site refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteKind {
    Placeholder,
    Address,
    Skip,
    StructModified,
    Marker,
}

/// A position in the buffer that follows relocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeSite {
    pub pos: usize,
    pub kind: SiteKind,
    /// Cleared when the code holding the site is rewound away.
    pub live: bool,
}

/// A saved buffer length, for rewinding speculative code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferCheckpoint {
    len: usize,
    sites: usize,
}

/// Bytecode under construction for one function, state or class.
#[derive(Debug, Clone, Default)]
pub struct ScriptBuffer {
    code: Vec<u8>,
    sites: Vec<CodeSite>,
}

impl ScriptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.code.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.code
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.code
    }

    // ==========================================================================
    // Emission
    // ==========================================================================

    pub fn emit_u8(&mut self, value: u8) {
        self.code.push(value);
    }

    pub fn emit_token(&mut self, token: ExprToken) {
        self.code.push(token.byte());
    }

    pub fn emit_cast(&mut self, cast: CastToken) {
        self.code.push(ExprToken::PrimitiveCast.byte());
        self.code.push(cast.into());
    }

    pub fn emit_u16(&mut self, value: u16) {
        self.code.extend_from_slice(&value.to_le_bytes());
    }

    pub fn emit_u32(&mut self, value: u32) {
        self.code.extend_from_slice(&value.to_le_bytes());
    }

    pub fn emit_i32(&mut self, value: i32) {
        self.code.extend_from_slice(&value.to_le_bytes());
    }

    pub fn emit_f32(&mut self, value: OrderedFloat<f32>) {
        self.code.extend_from_slice(&value.into_inner().to_le_bytes());
    }

    pub fn emit_object(&mut self, reference: ObjectRef) {
        self.emit_u32(reference.raw());
    }

    /// Emit a null-terminated single-byte string.
    pub fn emit_cstring(&mut self, text: &str) {
        self.code.extend(text.chars().map(|c| c as u8));
        self.code.push(0);
    }

    /// Emit a null-terminated UTF-16 string.
    pub fn emit_wide_string(&mut self, text: &str) {
        for unit in text.encode_utf16() {
            self.emit_u16(unit);
        }
        self.emit_u16(0);
    }

    pub fn emit_bytes(&mut self, bytes: &[u8]) {
        self.code.extend_from_slice(bytes);
    }

    /// Read a `u16` operand.
    pub fn read_u16(&self, pos: usize) -> u16 {
        u16::from_le_bytes([self.code[pos], self.code[pos + 1]])
    }

    /// Overwrite a `u16` operand.
    pub fn patch_u16(&mut self, pos: usize, value: u16) {
        self.code[pos..pos + 2].copy_from_slice(&value.to_le_bytes());
    }

    /// Overwrite a `u32` operand.
    pub fn patch_u32(&mut self, pos: usize, value: u32) {
        self.code[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Overwrite one byte.
    pub fn patch_u8(&mut self, pos: usize, value: u8) {
        self.code[pos] = value;
    }

    // ==========================================================================
    // Sites
    // ==========================================================================

    fn track(&mut self, pos: usize, kind: SiteKind) -> SiteId {
        let id = SiteId(self.sites.len() as u32);
        self.sites.push(CodeSite {
            pos,
            kind,
            live: true,
        });
        id
    }

    /// Emit a jump operand to be resolved later.
    pub fn emit_placeholder(&mut self) -> SiteId {
        let id = self.track(self.code.len(), SiteKind::Placeholder);
        self.emit_u16(u16::MAX);
        id
    }

    /// Emit a jump operand for an already known target site.
    pub fn emit_address(&mut self, target: SiteId) -> SiteId {
        let target = self.site(target).pos;
        let id = self.track(self.code.len(), SiteKind::Address);
        self.emit_u16(target as u16);
        id
    }

    /// Emit a length operand, filled in by [`finish_skip`](Self::finish_skip).
    pub fn emit_skip(&mut self) -> SiteId {
        let id = self.track(self.code.len(), SiteKind::Skip);
        self.emit_u16(0);
        id
    }

    /// Emit a struct-modification flag, initially clear.
    pub fn emit_struct_modified(&mut self) -> SiteId {
        let id = self.track(self.code.len(), SiteKind::StructModified);
        self.emit_u8(0);
        id
    }

    /// Register an already emitted struct-modification flag byte.
    pub fn struct_modified_at(&mut self, pos: usize) -> SiteId {
        self.track(pos, SiteKind::StructModified)
    }

    /// Mark the current end of the buffer.
    pub fn marker(&mut self) -> SiteId {
        self.track(self.code.len(), SiteKind::Marker)
    }

    /// Mark an arbitrary position.
    pub fn marker_at(&mut self, pos: usize) -> SiteId {
        self.track(pos, SiteKind::Marker)
    }

    pub fn site(&self, id: SiteId) -> CodeSite {
        self.sites[id.0 as usize]
    }

    /// Current position of a site.
    pub fn site_pos(&self, id: SiteId) -> usize {
        self.sites[id.0 as usize].pos
    }

    /// Point a placeholder at `target`'s current position.
    pub fn resolve(&mut self, placeholder: SiteId, target: SiteId) {
        let target = self.site_pos(target);
        let site = &mut self.sites[placeholder.0 as usize];
        if !site.live {
            return;
        }
        site.kind = SiteKind::Address;
        let pos = site.pos;
        self.patch_u16(pos, target as u16);
    }

    /// Store the number of bytes emitted since a skip operand.
    pub fn finish_skip(&mut self, skip: SiteId) {
        let pos = self.site_pos(skip);
        let size = self.code.len() - (pos + 2);
        self.patch_u16(pos, size as u16);
    }

    /// Set a struct-modification flag.
    pub fn set_struct_modified(&mut self, id: SiteId) {
        let site = self.site(id);
        if site.live && site.kind == SiteKind::StructModified {
            self.patch_u8(site.pos, 1);
        }
    }

    /// Every live placeholder, for consistency checks.
    pub fn pending_placeholders(&self) -> usize {
        self.sites
            .iter()
            .filter(|s| s.live && s.kind == SiteKind::Placeholder)
            .count()
    }

    // ==========================================================================
    // Relocation
    // ==========================================================================

    /// Save the current length.
    pub fn checkpoint(&self) -> BufferCheckpoint {
        BufferCheckpoint {
            len: self.code.len(),
            sites: self.sites.len(),
        }
    }

    /// Drop everything emitted since `checkpoint`.
    pub fn restore(&mut self, checkpoint: BufferCheckpoint) {
        self.code.truncate(checkpoint.len);
        let from = checkpoint.sites.min(self.sites.len());
        for site in &mut self.sites[from..] {
            site.live = false;
        }
    }

    /// Drop the code from `pos` to the end. Sites inside the dropped code
    /// die; markers at `pos` itself stay.
    pub fn truncate(&mut self, pos: usize) {
        self.code.truncate(pos);
        for site in &mut self.sites {
            if site.pos > pos || (site.pos == pos && site.kind != SiteKind::Marker) {
                site.live = false;
            }
        }
    }

    /// Move the bytes in `range` so they start at `dest` (an offset in the
    /// buffer before the move, outside `range`), shifting the code in
    /// between. Sites and resolved addresses follow the code they refer to;
    /// a position equal to `dest` ends up at the start of the moved block.
    pub fn splice(&mut self, range: Range<usize>, dest: usize) {
        let Range { start, end } = range;
        debug_assert!(start <= end && end <= self.code.len() && dest <= self.code.len());
        debug_assert!(dest <= start || dest >= end);
        if start == end || dest == start || dest == end {
            return;
        }
        let block: Vec<u8> = self.code[start..end].to_vec();
        let len = end - start;
        if dest > end {
            self.code.copy_within(end..dest, start);
            self.code[dest - len..dest].copy_from_slice(&block);
        } else {
            self.code.copy_within(dest..start, dest + len);
            self.code[dest..dest + len].copy_from_slice(&block);
        }

        let remap = |p: usize| -> usize {
            if dest > end {
                if (start..end).contains(&p) {
                    p + (dest - end)
                } else if p >= end && p <= dest {
                    p - len
                } else {
                    p
                }
            } else if (start..end).contains(&p) {
                p - (start - dest)
            } else if p > dest && p < start {
                p + len
            } else {
                p
            }
        };

        for i in 0..self.sites.len() {
            let site = self.sites[i];
            if !site.live {
                continue;
            }
            let pos = remap(site.pos);
            self.sites[i].pos = pos;
            if site.kind == SiteKind::Address {
                let target = self.read_u16(pos) as usize;
                self.patch_u16(pos, remap(target) as u16);
            }
        }
    }

    /// Insert `bytes` at `pos`, returning how many bytes were inserted.
    pub fn insert(&mut self, pos: usize, bytes: &[u8]) -> usize {
        let start = self.code.len();
        self.code.extend_from_slice(bytes);
        self.splice(start..self.code.len(), pos);
        bytes.len()
    }

    /// Move everything emitted since `from` to `dest`.
    pub fn move_tail(&mut self, from: usize, dest: usize) {
        let len = self.code.len();
        self.splice(from..len, dest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_before_operand() {
        let mut buf = ScriptBuffer::new();
        buf.emit_token(ExprToken::IntOne);
        let start = buf.len();
        buf.emit_token(ExprToken::IntZero);
        buf.insert(start, &[ExprToken::PrimitiveCast.byte(), CastToken::IntToFloat.into()]);
        assert_eq!(buf.as_bytes(), &[0x26, 0x38, 0x3F, 0x25]);
    }

    #[test]
    fn moving_forward_shifts_addresses() {
        let mut buf = ScriptBuffer::new();
        // [inc: 2 bytes][body: jump to body end]
        buf.emit_u8(0xAA);
        buf.emit_u8(0xBB);
        let body = buf.len();
        buf.emit_token(ExprToken::Jump);
        let jump = buf.emit_placeholder();
        let body_end = buf.marker();
        buf.resolve(jump, body_end);
        assert_eq!(buf.read_u16(body + 1), 5);

        let len = buf.len();
        buf.splice(0..body, len);
        // body first, then the moved bytes; the jump now lands on them
        assert_eq!(buf.as_bytes()[0], ExprToken::Jump.byte());
        assert_eq!(buf.read_u16(1), 3);
        assert_eq!(&buf.as_bytes()[3..], &[0xAA, 0xBB]);
        assert_eq!(buf.site_pos(jump), 1);
        assert_eq!(buf.site_pos(body_end), 3);
    }

    #[test]
    fn moving_backward_keeps_dest_marker() {
        let mut buf = ScriptBuffer::new();
        buf.emit_u8(1);
        let operand = buf.marker();
        buf.emit_u8(2);
        buf.emit_u8(3);
        let moved = buf.marker();
        buf.emit_u8(9);
        buf.splice(3..4, 1);
        assert_eq!(buf.as_bytes(), &[1, 9, 2, 3]);
        assert_eq!(buf.site_pos(operand), 1);
        assert_eq!(buf.site_pos(moved), 1);
    }

    #[test]
    fn restore_kills_late_sites() {
        let mut buf = ScriptBuffer::new();
        buf.emit_u8(1);
        let cp = buf.checkpoint();
        let flag = buf.emit_struct_modified();
        buf.restore(cp);
        assert_eq!(buf.len(), 1);
        assert!(!buf.site(flag).live);
        buf.emit_u8(7);
        buf.set_struct_modified(flag);
        assert_eq!(buf.as_bytes(), &[1, 7]);
    }

    #[test]
    fn skip_measures_following_code() {
        let mut buf = ScriptBuffer::new();
        buf.emit_token(ExprToken::Skip);
        let skip = buf.emit_skip();
        buf.emit_token(ExprToken::True);
        buf.emit_token(ExprToken::False);
        buf.finish_skip(skip);
        assert_eq!(buf.read_u16(1), 2);
    }
}
