//! Routes facts to the operator cells that care about them and aggregates
//! their applicable actions, plus the synthetic `void` action.
//!
//! Grounded on `operators.py`'s `OperatorsManager`: `_build_actions_and_mapper`
//! becomes `OperatorsManager::new`'s predicate -> cell-index map, and
//! `get_applicable_actions` becomes `applicable_actions`.

use crate::classical::operator::{Direction, GroundAction, OperatorCell};
use crate::classical::schema::ActionSchema;
use crate::classical::state::{Fact, State};
use crate::symbols::{Sym, World};
use std::collections::HashMap;

pub struct OperatorsManager {
    forward_cells: Vec<OperatorCell>,
    backward_cells: Vec<OperatorCell>,
    forward_index: HashMap<Sym, Vec<usize>>,
    backward_index: HashMap<Sym, Vec<usize>>,
    void_name: Sym,
}

fn build_cells(schemas: &[ActionSchema], direction: Direction) -> (Vec<OperatorCell>, HashMap<Sym, Vec<usize>>) {
    let mut cells = Vec::with_capacity(schemas.len());
    let mut index: HashMap<Sym, Vec<usize>> = HashMap::new();
    for schema in schemas {
        let cell = OperatorCell::new(schema, direction);
        let idx = cells.len();
        for &pred in cell.input_predicates() {
            index.entry(pred).or_default().push(idx);
        }
        cells.push(cell);
    }
    (cells, index)
}

impl OperatorsManager {
    /// `schemas` must already be the canonicalized schema per distinct
    /// action name (see `schema::pick_canonical`); this manager builds one
    /// forward and one backward cell per entry.
    pub fn new(schemas: &[ActionSchema], void_name: Sym) -> Self {
        let (forward_cells, forward_index) = build_cells(schemas, Direction::Forward);
        let (backward_cells, backward_index) = build_cells(schemas, Direction::Backward);
        OperatorsManager {
            forward_cells,
            backward_cells,
            forward_index,
            backward_index,
            void_name,
        }
    }

    pub fn applicable_actions(&mut self, state: &State, world: &World, direction: Direction) -> Vec<GroundAction> {
        let (cells, index) = match direction {
            Direction::Forward => (&mut self.forward_cells, &self.forward_index),
            Direction::Backward => (&mut self.backward_cells, &self.backward_index),
        };

        let mut touched: Vec<usize> = Vec::new();
        let mut seen = vec![false; cells.len()];
        for fact in state {
            match index.get(&fact.predicate) {
                Some(idxs) => {
                    for &i in idxs {
                        if !seen[i] {
                            seen[i] = true;
                            touched.push(i);
                        }
                    }
                }
                None => log::warn!(
                    "fact with predicate not mentioned by any operator, dropped during routing"
                ),
            }
        }

        let mut out = Vec::new();
        for i in touched {
            out.extend(cells[i].applicable_actions(state, world));
        }
        out
    }

    pub fn void_action(&self, state: &State) -> GroundAction {
        GroundAction::void(self.void_name, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classical::schema::{PatternSet, Term};
    use crate::symbols::SymbolTable;

    fn pattern(pred: Sym, args: Vec<Term>) -> PatternSet {
        let mut m = PatternSet::new();
        m.insert(pred, [args].into_iter().collect());
        m
    }

    // Facts whose predicate no cell cares about are routed to nothing, and
    // a cell is consulted only when at least one such fact is present.
    #[test]
    fn facts_are_routed_only_to_cells_that_mention_their_predicate() {
        let mut table = SymbolTable::new();
        let object = table.intern("object");
        let x = table.intern("?x");
        let at = table.intern("at");
        let visited = table.intern("visited");
        let unrelated = table.intern("unrelated");
        let a = table.intern("a");

        let schema = ActionSchema {
            name: table.intern("move"),
            parameters: vec![(x, object)],
            precondition_pos: pattern(at, vec![Term::Var(x)]),
            precondition_neg: PatternSet::new(),
            effect_pos: pattern(visited, vec![Term::Var(x)]),
            effect_neg: PatternSet::new(),
        };

        let void = table.intern("void");
        let mut world = World::new();
        world.declare_object(a, object);
        world.symbols = table;

        let mut manager = OperatorsManager::new(&[schema], void);

        // A state with only an unrelated fact: no cell is routed anything.
        let state_unrelated: State = [Fact::new(unrelated, vec![a])].into_iter().collect();
        let actions = manager.applicable_actions(&state_unrelated, &world, Direction::Forward);
        assert!(actions.is_empty());

        // A state with the relevant fact grounds the one schema.
        let state_relevant: State = [Fact::new(at, vec![a])].into_iter().collect();
        let actions = manager.applicable_actions(&state_relevant, &world, Direction::Forward);
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn void_action_restates_the_state_as_both_precondition_and_effect() {
        let mut table = SymbolTable::new();
        let object = table.intern("object");
        let x = table.intern("?x");
        let at = table.intern("at");
        let a = table.intern("a");

        let schema = ActionSchema {
            name: table.intern("move"),
            parameters: vec![(x, object)],
            precondition_pos: pattern(at, vec![Term::Var(x)]),
            precondition_neg: PatternSet::new(),
            effect_pos: PatternSet::new(),
            effect_neg: PatternSet::new(),
        };

        let void = table.intern("void");
        let manager = OperatorsManager::new(&[schema], void);
        let state: State = [Fact::new(at, vec![a])].into_iter().collect();

        let action = manager.void_action(&state);
        assert_eq!(action.precond_pos, state);
        assert_eq!(action.effect_pos, state);
        assert!(action.precond_neg.is_empty());
        assert!(action.effect_neg.is_empty());
    }
}
