//! Lifted action schemas: the parser-facing representation of one `:action`
//! block, expressed as pattern sets of positive/negative preconditions and
//! effects over a parameter list.
//!
//! Grounded on `classical/mod.rs`'s `ActionSchema`/`ParameterizedPred`, but
//! flattened: the teacher's version carries full chronicle `Holed<SAtom>`
//! expressions tied to the `aries` symbol/type system, where this one only
//! needs argument positions that are either a declared variable or a
//! constant object, which is exactly what `operators.py`'s `OperatorCell`
//! works with.

use crate::symbols::Sym;
use std::collections::{HashMap, HashSet};

/// One argument position in a pattern: either a schema variable or a
/// literal object constant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Term {
    Var(Sym),
    Const(Sym),
}

impl Term {
    /// The symbol used as this term's key when building partial bindings:
    /// the variable name for `Var`, the constant itself for `Const` (so the
    /// assignment enumerator's identity-constant filter can catch a
    /// mismatched constant position).
    pub fn key(self) -> Sym {
        match self {
            Term::Var(s) | Term::Const(s) => s,
        }
    }
}

/// Maps a predicate symbol to the set of distinct argument-vector patterns
/// it appears under. A predicate can appear more than once per schema with
/// different argument shapes (e.g. `(on ?x ?y)` and `(on ?y ?z)` in the same
/// action), hence the `HashSet<Vec<Term>>` rather than a single vector.
pub type PatternSet = HashMap<Sym, HashSet<Vec<Term>>>;

#[derive(Clone, Debug)]
pub struct ActionSchema {
    pub name: Sym,
    /// Declared parameters in source order, as (variable, type) pairs.
    pub parameters: Vec<(Sym, Sym)>,
    pub precondition_pos: PatternSet,
    pub precondition_neg: PatternSet,
    pub effect_pos: PatternSet,
    pub effect_neg: PatternSet,
}

impl ActionSchema {
    pub fn distinct_variable_count(&self) -> usize {
        self.parameters
            .iter()
            .map(|(v, _)| *v)
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Picks, among several prototype groundings a parser emitted for the same
/// schema name, the one with the greatest number of distinct variable
/// names — ties keep the first occurrence.
///
/// Mirrors `operators.py`'s `_get_generic_op`, which exists because
/// `pddlpy` can hand back multiple differently-named groundings of the
/// same action; a well-formed PDDL action only ever has one parameter list,
/// so with this crate's own parser `candidates` is always a single-element
/// slice and this function is a pass-through. It stays generic over the
/// contract so a different front end could still feed it several.
pub fn pick_canonical(candidates: &[ActionSchema]) -> &ActionSchema {
    let mut best = candidates.first().expect("at least one grounding prototype per schema");
    let mut best_count = best.distinct_variable_count();
    for candidate in &candidates[1..] {
        let count = candidate.distinct_variable_count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

/// Groups `schemas` by name and keeps only the canonical grounding of each
/// group (see `pick_canonical`). With this crate's own parser every group
/// has exactly one member; the grouping still runs so a future front end
/// that emits several prototypes per name is handled correctly.
pub fn canonicalize_schemas(schemas: Vec<ActionSchema>) -> Vec<ActionSchema> {
    let mut groups: HashMap<Sym, Vec<ActionSchema>> = HashMap::new();
    for schema in schemas {
        groups.entry(schema.name).or_default().push(schema);
    }
    groups
        .into_values()
        .map(|candidates| pick_canonical(&candidates).clone())
        .collect()
}

pub fn merge_patterns(a: &PatternSet, b: &PatternSet) -> PatternSet {
    let mut out = a.clone();
    for (&pred, vecs) in b {
        out.entry(pred).or_default().extend(vecs.iter().cloned());
    }
    out
}

pub fn pattern_vars(patterns: &PatternSet) -> HashSet<Sym> {
    let mut out = HashSet::new();
    for vecs in patterns.values() {
        for pattern in vecs {
            out.extend(pattern.iter().filter_map(|t| match t {
                Term::Var(s) => Some(*s),
                Term::Const(_) => None,
            }));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolTable;

    fn bare_schema(table: &mut SymbolTable, name: &str, params: Vec<(Sym, Sym)>) -> ActionSchema {
        ActionSchema {
            name: table.intern(name),
            parameters: params,
            precondition_pos: PatternSet::new(),
            precondition_neg: PatternSet::new(),
            effect_pos: PatternSet::new(),
            effect_neg: PatternSet::new(),
        }
    }

    // spec.md §4.2: among several prototype groundings sharing a name, keep
    // the one with the greatest number of distinct variable names.
    #[test]
    fn pick_canonical_prefers_more_distinct_variables() {
        let mut table = SymbolTable::new();
        let object = table.intern("object");
        let x = table.intern("?x");
        let y = table.intern("?y");

        // A degenerate prototype where two parameter slots share the same
        // variable name (one distinct variable)...
        let degenerate = bare_schema(&mut table, "move", vec![(x, object), (x, object)]);
        // ...versus a well-formed one (two distinct variables).
        let well_formed = bare_schema(&mut table, "move", vec![(x, object), (y, object)]);

        let picked = pick_canonical(&[degenerate, well_formed.clone()]);
        assert_eq!(picked.distinct_variable_count(), 2);
        assert_eq!(picked.parameters, well_formed.parameters);
    }

    // spec.md §4.2: "ties broken by first occurrence" — among prototypes
    // with an equal distinct-variable count, the earliest in `candidates`
    // wins, not the last.
    #[test]
    fn pick_canonical_breaks_ties_by_first_occurrence() {
        let mut table = SymbolTable::new();
        let object = table.intern("object");
        let x = table.intern("?x");
        let y = table.intern("?y");

        let first = bare_schema(&mut table, "move", vec![(x, object), (y, object)]);
        let second = bare_schema(&mut table, "move", vec![(y, object), (x, object)]);

        let picked = pick_canonical(&[first.clone(), second]);
        assert_eq!(picked.parameters, first.parameters);
    }

    #[test]
    fn canonicalize_schemas_keeps_one_entry_per_name() {
        let mut table = SymbolTable::new();
        let object = table.intern("object");
        let x = table.intern("?x");

        let move_schema = bare_schema(&mut table, "move", vec![(x, object)]);
        let jump_schema = bare_schema(&mut table, "jump", vec![(x, object)]);

        let canonical = canonicalize_schemas(vec![move_schema, jump_schema]);
        assert_eq!(canonical.len(), 2);
    }

    #[test]
    fn merge_patterns_unions_argument_vectors_per_predicate() {
        let mut table = SymbolTable::new();
        let at = table.intern("at");
        let x = table.intern("?x");
        let y = table.intern("?y");

        let mut a = PatternSet::new();
        a.insert(at, [vec![Term::Var(x)]].into_iter().collect());
        let mut b = PatternSet::new();
        b.insert(at, [vec![Term::Var(y)]].into_iter().collect());

        let merged = merge_patterns(&a, &b);
        assert_eq!(merged[&at].len(), 2);
    }
}
