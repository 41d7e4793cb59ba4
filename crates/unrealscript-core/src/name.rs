//! Case-insensitive names and the session name table.
//!
//! UnrealScript identifiers compare without regard to case (`Health`,
//! `health` and `HEALTH` all name the same property). [`Name`] keeps the
//! spelling it was first written with while hashing and comparing
//! case-insensitively. [`NameTable`] interns names and hands out the stable
//! 32-bit indices that name constants use in bytecode.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHashMap;

/// The spelling of the null name.
pub const NAME_NONE: &str = "None";

/// A case-insensitive identifier.
#[derive(Clone)]
pub struct Name(Arc<str>);

impl Name {
    /// Create a name from text.
    pub fn new(text: &str) -> Self {
        Self(Arc::from(text))
    }

    /// The `None` name.
    pub fn none() -> Self {
        Self::new(NAME_NONE)
    }

    /// Whether this is the `None` name.
    pub fn is_none(&self) -> bool {
        self.0.eq_ignore_ascii_case(NAME_NONE)
    }

    /// The spelling of this name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against plain text.
    pub fn matches(&self, text: &str) -> bool {
        self.0.eq_ignore_ascii_case(text)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Name {}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.matches(other)
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self.matches(other)
    }
}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
        state.write_u8(0xff);
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        let a = self.0.bytes().map(|b| b.to_ascii_lowercase());
        let b = other.0.bytes().map(|b| b.to_ascii_lowercase());
        a.cmp(b)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

impl From<&str> for Name {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Interning table for names.
///
/// Index 0 is always `None`. Interning a name that differs only in case from
/// an existing entry returns the existing entry, so the first spelling wins.
#[derive(Debug, Clone)]
pub struct NameTable {
    entries: Vec<Name>,
    index: FxHashMap<Name, u32>,
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new()
    }
}

impl NameTable {
    /// Create a table containing only `None`.
    pub fn new() -> Self {
        let mut table = Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
        };
        table.intern(NAME_NONE);
        table
    }

    /// Intern text, returning the canonical name.
    pub fn intern(&mut self, text: &str) -> Name {
        let probe = Name::new(text);
        if let Some(&index) = self.index.get(&probe) {
            return self.entries[index as usize].clone();
        }
        let index = self.entries.len() as u32;
        self.entries.push(probe.clone());
        self.index.insert(probe.clone(), index);
        probe
    }

    /// The bytecode index of a name, interning it if needed.
    pub fn index_of(&mut self, name: &Name) -> u32 {
        if let Some(&index) = self.index.get(name) {
            return index;
        }
        let index = self.entries.len() as u32;
        self.entries.push(name.clone());
        self.index.insert(name.clone(), index);
        index
    }

    /// Find an already interned name.
    pub fn find(&self, text: &str) -> Option<u32> {
        self.index.get(&Name::new(text)).copied()
    }

    /// Look up the name stored at an index.
    pub fn get(&self, index: u32) -> Option<&Name> {
        self.entries.get(index as usize)
    }

    /// Number of interned names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty. Never true, `None` is always present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn names_compare_case_insensitively() {
        assert_eq!(Name::new("Health"), Name::new("HEALTH"));
        assert_ne!(Name::new("Health"), Name::new("Healthy"));
        assert!(Name::new("none").is_none());
        assert!(Name::new("Count") == "count");
    }

    #[test]
    fn names_hash_case_insensitively() {
        let mut set = FxHashSet::default();
        set.insert(Name::new("Actor"));
        assert!(set.contains(&Name::new("actor")));
    }

    #[test]
    fn first_spelling_wins() {
        let mut table = NameTable::new();
        let first = table.intern("bHidden");
        let second = table.intern("BHIDDEN");
        assert_eq!(second.as_str(), "bHidden");
        assert_eq!(first, second);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn none_is_index_zero() {
        let mut table = NameTable::new();
        assert_eq!(table.index_of(&Name::none()), 0);
        let idx = table.index_of(&Name::new("Tick"));
        assert_eq!(idx, 1);
        assert_eq!(table.get(idx).map(Name::as_str), Some("Tick"));
        assert_eq!(table.find("tick"), Some(1));
    }

    #[test]
    fn names_order_case_insensitively() {
        let mut names = vec![Name::new("beta"), Name::new("Alpha"), Name::new("gamma")];
        names.sort();
        let spelled: Vec<_> = names.iter().map(Name::as_str).collect();
        assert_eq!(spelled, ["Alpha", "beta", "gamma"]);
    }
}
