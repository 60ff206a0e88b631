use bimap::BiMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Interned identifier. Two atoms from the same pool are equal iff their text is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Atom(u32);

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AtomPool {
    map: BiMap<String, Atom>,
}

impl AtomPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the atom for `id`, interning it on first use.
    pub fn atom(&mut self, id: &str) -> Atom {
        if let Some(&atom) = self.map.get_by_left(id) {
            return atom;
        }
        let atom = Atom(self.map.len() as u32);
        self.map.insert(id.to_string(), atom);
        atom
    }

    /// Looks `id` up without interning it.
    pub fn find(&self, id: &str) -> Option<Atom> {
        self.map.get_by_left(id).copied()
    }

    pub fn id(&self, atom: Atom) -> &str {
        self.map.get_by_right(&atom).map_or("", String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
