//! Interned symbols for predicate names, object names, type names and
//! lifted-variable names, plus the typed object universe (`World`) that the
//! grounder enumerates against.
//!
//! Grounded on `classical/state.rs`'s `World` (symbol table over a
//! `RefPool`), trimmed to drop the type-hierarchy side of that table: this
//! planner's domains are flat (an object has exactly one declared type, no
//! supertype lattice), so a plain `object -> type` map replaces the
//! teacher's `TypeHierarchy`.

use std::collections::HashMap;
use std::fmt;
use strips_collections::create_ref_type;
use strips_collections::ref_store::RefPool;

create_ref_type!(Sym);

impl fmt::Debug for Sym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sym({})", self.to_u32())
    }
}

/// Interns strings (predicate, object, type and variable names) behind
/// `Sym` handles.
#[derive(Default, Clone)]
pub struct SymbolTable {
    pool: RefPool<Sym, String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: &str) -> Sym {
        self.pool.get_or_intern(name.to_string())
    }

    pub fn get(&self, sym: Sym) -> &str {
        &self.pool[sym]
    }

    pub fn lookup(&self, name: &str) -> Option<Sym> {
        self.pool.get_ref(name)
    }
}

impl fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.pool)
    }
}

/// The typed object universe a grounded problem is defined over.
///
/// Owns the `SymbolTable` so a `World` is the single place a caller needs to
/// go from raw names to `Sym`s and back.
#[derive(Default, Clone, Debug)]
pub struct World {
    pub symbols: SymbolTable,
    object_type: HashMap<Sym, Sym>,
    type_objects: HashMap<Sym, Vec<Sym>>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `obj` as having type `tpe`. Declaring the same object twice
    /// with different types overwrites the previous type and leaves a stale
    /// entry in the reverse index; callers shouldn't do that.
    pub fn declare_object(&mut self, obj: Sym, tpe: Sym) {
        self.object_type.insert(obj, tpe);
        self.type_objects.entry(tpe).or_default().push(obj);
    }

    pub fn type_of(&self, obj: Sym) -> Option<Sym> {
        self.object_type.get(&obj).copied()
    }

    pub fn objects_of_type(&self, tpe: Sym) -> &[Sym] {
        self.type_objects.get(&tpe).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn objects(&self) -> impl Iterator<Item = Sym> + '_ {
        self.object_type.keys().copied()
    }
}
