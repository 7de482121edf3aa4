//! Operator cells: the per-schema, per-direction grounding engine that turns
//! a `State` into the set of applicable ground actions.
//!
//! Grounded on `operators.py`'s `OperatorCell`: `_parse_op`'s forward/
//! backward pattern-set table becomes the `match` in `OperatorCell::new`,
//! `get_possible_assignations` becomes `applicable_actions`'s use of the
//! `AssignmentEnumerator`, and `effects_of_assignation` becomes
//! `instantiate`.

use crate::classical::ground::{AssignmentEnumerator, Binding};
use crate::classical::schema::{merge_patterns, pattern_vars, ActionSchema, PatternSet, Term};
use crate::classical::state::{Fact, State};
use crate::symbols::{Sym, World};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// A ground action: a schema name applied to a concrete binding, together
/// with its already-instantiated precondition and effect fact sets.
///
/// Fully value-typed (`Eq`/`Hash`/`Ord` all structural) so the same action
/// recurring across RPG layers, or across different search nodes, compares
/// equal without needing identity tricks. `binding` is kept sorted by
/// variable symbol so two instances built from the same underlying
/// assignment always hash/compare equal regardless of insertion order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroundAction {
    pub schema_name: Sym,
    pub binding: Vec<(Sym, Sym)>,
    pub precond_pos: State,
    pub precond_neg: State,
    pub effect_pos: State,
    pub effect_neg: State,
}

impl GroundAction {
    /// The synthetic `void` action: applicable in every state, with no
    /// effect beyond restating the state it was built from as its own
    /// precondition. Used by the RPG builder as the "do nothing new"
    /// fallback that guarantees monotonic fact-layer growth terminates.
    pub fn void(void_name: Sym, state: &State) -> Self {
        GroundAction {
            schema_name: void_name,
            binding: Vec::new(),
            precond_pos: state.clone(),
            precond_neg: State::new(),
            effect_pos: state.clone(),
            effect_neg: State::new(),
        }
    }
}

fn instantiate(pattern: &PatternSet, binding: &Binding) -> State {
    let mut out = State::new();
    for (&pred, vecs) in pattern {
        for args in vecs {
            let resolved: Vec<Sym> = args
                .iter()
                .map(|t| match t {
                    Term::Var(v) => *binding.get(v).expect("binding covers every schema variable"),
                    Term::Const(c) => *c,
                })
                .collect();
            out.insert(Fact::new(pred, resolved));
        }
    }
    out
}

pub struct OperatorCell {
    schema_name: Sym,
    i_pos: PatternSet,
    i_neg: PatternSet,
    o_pos: PatternSet,
    o_neg: PatternSet,
    /// Predicates mentioned by `i_pos` or `i_neg`; what the manager indexes
    /// cells by for fact routing.
    input_predicates: HashSet<Sym>,
    /// Variables with no positive occurrence in `i_pos` — under the
    /// extended grounding behaviour these get their candidate domain fed to
    /// the enumerator explicitly, since no fact-derived partial would ever
    /// bind them otherwise.
    negative_only_vars: Vec<(Sym, Sym)>,
    enumerator: AssignmentEnumerator,
}

impl OperatorCell {
    pub fn new(schema: &ActionSchema, direction: Direction) -> Self {
        let (i_pos, i_neg, o_pos, o_neg) = match direction {
            Direction::Forward => (
                schema.precondition_pos.clone(),
                schema.precondition_neg.clone(),
                schema.effect_pos.clone(),
                schema.effect_neg.clone(),
            ),
            Direction::Backward => {
                // i_pos = effect_pos ∪ (precondition_pos \ effect_neg)
                let mut i_pos = schema.effect_pos.clone();
                for (&pred, vecs) in &schema.precondition_pos {
                    let excluded = schema.effect_neg.get(&pred);
                    for args in vecs {
                        let excluded = excluded.map_or(false, |e| e.contains(args));
                        if !excluded {
                            i_pos.entry(pred).or_default().insert(args.clone());
                        }
                    }
                }
                let i_neg = schema.effect_neg.clone();

                // o_pos = precondition_pos ∩ effect_neg
                let mut o_pos = PatternSet::new();
                for (&pred, vecs) in &schema.precondition_pos {
                    if let Some(effect_neg_vecs) = schema.effect_neg.get(&pred) {
                        let inter: HashSet<Vec<Term>> =
                            vecs.intersection(effect_neg_vecs).cloned().collect();
                        if !inter.is_empty() {
                            o_pos.insert(pred, inter);
                        }
                    }
                }
                let o_neg = schema.effect_pos.clone();
                (i_pos, i_neg, o_pos, o_neg)
            }
        };

        let input_patterns = merge_patterns(&i_pos, &i_neg);
        let vars_pos = pattern_vars(&i_pos);
        let vars_neg = pattern_vars(&i_neg);

        let mut vars = vars_pos.clone();
        vars.extend(vars_neg.iter().copied());

        let negative_only_vars: Vec<(Sym, Sym)> = schema
            .parameters
            .iter()
            .filter(|(v, _)| vars_neg.contains(v) && !vars_pos.contains(v))
            .cloned()
            .collect();

        OperatorCell {
            schema_name: schema.name,
            i_pos,
            i_neg,
            o_pos,
            o_neg,
            input_predicates: input_patterns.keys().copied().collect(),
            negative_only_vars,
            enumerator: AssignmentEnumerator::new(vars),
        }
    }

    pub fn input_predicates(&self) -> &HashSet<Sym> {
        &self.input_predicates
    }

    fn partials_from_facts<'a>(&self, facts: impl Iterator<Item = &'a Fact>) -> Vec<HashMap<Sym, Sym>> {
        let input = merge_patterns(&self.i_pos, &self.i_neg);
        let mut partials = Vec::new();
        for fact in facts {
            if let Some(patterns) = input.get(&fact.predicate) {
                for args in patterns {
                    if args.len() != fact.args.len() {
                        continue;
                    }
                    let partial: HashMap<Sym, Sym> = args
                        .iter()
                        .zip(fact.args.iter())
                        .map(|(term, &arg)| (term.key(), arg))
                        .collect();
                    partials.push(partial);
                }
            }
        }
        partials
    }

    /// Returns every ground action this cell can produce from `state`.
    /// `state` is the full current state: partials are built only from the
    /// facts whose predicate this cell cares about (cheap, via
    /// `partials_from_facts`), but feasibility is checked against the whole
    /// state since a precondition can reference a fact this cell wasn't
    /// indexed under as an *input* predicate once bound.
    pub fn applicable_actions(&mut self, state: &State, world: &World) -> Vec<GroundAction> {
        let mut partials = self.partials_from_facts(state.iter());

        for &(var, tpe) in &self.negative_only_vars {
            for &obj in world.objects_of_type(tpe) {
                let mut m = HashMap::new();
                m.insert(var, obj);
                partials.push(m);
            }
        }

        let candidates = self.enumerator.process(partials);

        let mut actions = Vec::with_capacity(candidates.len());
        for binding in candidates {
            let precond_pos = instantiate(&self.i_pos, &binding);
            if !precond_pos.iter().all(|f| state.contains(f)) {
                continue;
            }
            let precond_neg = instantiate(&self.i_neg, &binding);
            if precond_neg.iter().any(|f| state.contains(f)) {
                continue;
            }
            let effect_pos = instantiate(&self.o_pos, &binding);
            let effect_neg = instantiate(&self.o_neg, &binding);

            let mut sorted_binding: Vec<(Sym, Sym)> = binding.into_iter().collect();
            sorted_binding.sort();

            actions.push(GroundAction {
                schema_name: self.schema_name,
                binding: sorted_binding,
                precond_pos,
                precond_neg,
                effect_pos,
                effect_neg,
            });
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolTable;

    fn pattern(pred: Sym, args: Vec<Term>) -> PatternSet {
        let mut m = PatternSet::new();
        m.insert(pred, [args].into_iter().collect());
        m
    }

    // Invariant (spec.md §8.1): every action a cell returns satisfies
    // precond_pos(a) ⊆ S and precond_neg(a) ∩ S = ∅.
    #[test]
    fn applicable_actions_respect_positive_and_negative_preconditions() {
        let mut table = SymbolTable::new();
        let block = table.intern("block");
        let x = table.intern("?x");
        let y = table.intern("?y");
        let on = table.intern("on");
        let clear = table.intern("clear");
        let a = table.intern("a");
        let b = table.intern("b");
        let c = table.intern("c");

        let mut precondition_pos = pattern(on, vec![Term::Var(x)]);
        precondition_pos.insert(clear, [vec![Term::Var(y)]].into_iter().collect());
        let schema = ActionSchema {
            name: table.intern("swap"),
            parameters: vec![(x, block), (y, block)],
            precondition_pos,
            precondition_neg: PatternSet::new(),
            effect_pos: pattern(on, vec![Term::Var(y)]),
            effect_neg: pattern(on, vec![Term::Var(x)]),
        };

        let mut world = World::new();
        world.declare_object(a, block);
        world.declare_object(b, block);
        world.declare_object(c, block);
        world.symbols = table;

        let mut cell = OperatorCell::new(&schema, Direction::Forward);
        let state: State = [Fact::new(on, vec![a]), Fact::new(clear, vec![b]), Fact::new(clear, vec![c])]
            .into_iter()
            .collect();

        let actions = cell.applicable_actions(&state, &world);
        assert!(!actions.is_empty());
        for action in &actions {
            assert!(action.precond_pos.iter().all(|f| state.contains(f)));
            assert!(action.precond_neg.iter().all(|f| !state.contains(f)));
        }
        // on(a) + {clear(b), clear(c)} grounds exactly two swaps: x=a,y=b and x=a,y=c.
        assert_eq!(actions.len(), 2);
    }

    // A variable with only a negative occurrence grounds across every
    // object of its declared type (the extended variant from spec.md §9).
    #[test]
    fn negative_only_variable_grounds_across_its_declared_type() {
        let mut table = SymbolTable::new();
        let block = table.intern("block");
        let x = table.intern("?x");
        let y = table.intern("?y");
        let at = table.intern("at");
        let locked = table.intern("locked");
        let a = table.intern("a");
        let b = table.intern("b");

        let mut precondition_neg = PatternSet::new();
        precondition_neg.insert(locked, [vec![Term::Var(y)]].into_iter().collect());

        let schema = ActionSchema {
            name: table.intern("free"),
            parameters: vec![(x, block), (y, block)],
            precondition_pos: pattern(at, vec![Term::Var(x)]),
            precondition_neg,
            effect_pos: pattern(at, vec![Term::Var(x)]),
            effect_neg: PatternSet::new(),
        };

        let mut world = World::new();
        world.declare_object(a, block);
        world.declare_object(b, block);
        world.symbols = table;

        let mut cell = OperatorCell::new(&schema, Direction::Forward);
        let state: State = [Fact::new(at, vec![a]), Fact::new(locked, vec![b])].into_iter().collect();

        let actions = cell.applicable_actions(&state, &world);
        // y is never bound from a fact, so without the type-domain grounding
        // this schema would produce nothing; here it grounds y over {a, b}
        // and drops the binding where locked(y) holds in the state.
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].binding, vec![(x, a), (y, a)]);
    }

    // spec.md §4.2's direction table for `swap`: pre_pos={on(x),clear(y)},
    // eff_pos={on(y)}, eff_neg={on(x)}. Backward gives
    // i_pos = eff_pos ∪ (pre_pos \ eff_neg) = {on(y), clear(y)} (on(x) is
    // excluded since it's also in eff_neg), i_neg = eff_neg = {on(x)},
    // o_pos = pre_pos ∩ eff_neg = {on(x)}, o_neg = eff_pos = {on(y)}.
    #[test]
    fn backward_cell_derives_the_spec_pattern_table() {
        let mut table = SymbolTable::new();
        let block = table.intern("block");
        let x = table.intern("?x");
        let y = table.intern("?y");
        let on = table.intern("on");
        let clear = table.intern("clear");

        let mut precondition_pos = pattern(on, vec![Term::Var(x)]);
        precondition_pos.insert(clear, [vec![Term::Var(y)]].into_iter().collect());
        let schema = ActionSchema {
            name: table.intern("swap"),
            parameters: vec![(x, block), (y, block)],
            precondition_pos,
            precondition_neg: PatternSet::new(),
            effect_pos: pattern(on, vec![Term::Var(y)]),
            effect_neg: pattern(on, vec![Term::Var(x)]),
        };

        let cell = OperatorCell::new(&schema, Direction::Backward);
        // i_pos should contain clear(y) but not on(x) (excluded by eff_neg).
        assert!(cell.i_pos.get(&clear).map_or(false, |v| v.contains(&vec![Term::Var(y)])));
        assert!(!cell.i_pos.get(&on).map_or(false, |v| v.contains(&vec![Term::Var(x)])));
        // i_neg = eff_neg = {on(x)}.
        assert!(cell.i_neg.get(&on).map_or(false, |v| v.contains(&vec![Term::Var(x)])));
        // o_pos = pre_pos ∩ eff_neg = {on(x)}.
        assert!(cell.o_pos.get(&on).map_or(false, |v| v.contains(&vec![Term::Var(x)])));
        // o_neg = eff_pos = {on(y)}.
        assert!(cell.o_neg.get(&on).map_or(false, |v| v.contains(&vec![Term::Var(y)])));
    }
}
