//! Interned identifiers.
//!
//! Names are compared constantly during validation and lowering, so the
//! frontend interns every identifier and string literal into an [`Atom`].

use rustc_hash::FxHashMap;
use std::fmt;

/// An interned string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(u32);

impl Atom {
    /// Returns the raw index of this atom.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The string interner.
#[derive(Debug, Default, Clone)]
pub struct Interner {
    map: FxHashMap<Box<str>, Atom>,
    strings: Vec<Box<str>>,
}

impl Interner {
    /// Creates an empty interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a string, returning the existing atom if already present.
    pub fn intern(&mut self, name: &str) -> Atom {
        if let Some(&atom) = self.map.get(name) {
            return atom;
        }
        let atom = Atom(self.strings.len() as u32);
        self.strings.push(name.into());
        self.map.insert(name.into(), atom);
        atom
    }

    /// Returns the atom for a string without interning it.
    pub fn get(&self, name: &str) -> Option<Atom> {
        self.map.get(name).copied()
    }

    /// Returns the string behind an atom.
    pub fn resolve(&self, atom: Atom) -> &str {
        &self.strings[atom.index()]
    }

    /// Returns the number of interned strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Returns true if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// Atoms for the names the validator and the IR generator look for.
#[derive(Debug, Clone, Copy)]
pub struct Keywords {
    /// `arguments`
    pub arguments: Atom,
    /// `eval`
    pub eval: Atom,
    /// `use strict`
    pub use_strict: Atom,
    /// `this`
    pub this: Atom,
    /// `new.target`
    pub new_target: Atom,
    /// `global`
    pub global: Atom,
    /// `SyntaxError`
    pub syntax_error: Atom,
    /// The empty string
    pub empty: Atom,
}

impl Keywords {
    /// Interns every keyword into `interner`.
    pub fn new(interner: &mut Interner) -> Self {
        Self {
            arguments: interner.intern("arguments"),
            eval: interner.intern("eval"),
            use_strict: interner.intern("use strict"),
            this: interner.intern("this"),
            new_target: interner.intern("new.target"),
            global: interner.intern("global"),
            syntax_error: interner.intern("SyntaxError"),
            empty: interner.intern(""),
        }
    }
}
