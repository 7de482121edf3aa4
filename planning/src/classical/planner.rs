//! Forward A* search over ground states, using the RPG-derived heuristic
//! for guidance.
//!
//! Grounded on the legacy `classical/search.rs`'s `Node`/`plan_search`
//! shape (a `BinaryHeap<Rc<Node>>` ordered by `f`, parent pointers via `Rc`
//! for cheap plan reconstruction, a `HashSet` of already-generated states),
//! with the teacher's YAHSP2 lookahead and edge-weighting dropped: this
//! planner only ever wants plain unweighted `f = g + h`, so `Cfg::h_weight`/
//! `use_lookahead` and the `extract_relaxed_plan`/`lookahead` machinery they
//! gate have no counterpart here.

use crate::classical::heuristic::{build_rpg, heuristic, Cost, Heuristic};
use crate::classical::operator::{Direction, GroundAction};
use crate::classical::operators_manager::OperatorsManager;
use crate::classical::schema::canonicalize_schemas;
use crate::classical::state::{Fact, State};
use crate::parsing::DomainProblem;
use crate::symbols::World;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::rc::Rc;

struct Node {
    state: State,
    parent: Option<Rc<Node>>,
    action: Option<Rc<GroundAction>>,
    g: u32,
    f: Cost,
    /// Insertion order, used only to break ties on `f` deterministically
    /// (earliest-inserted first) rather than relying on an arbitrary
    /// `BinaryHeap` tie order.
    seq: u64,
}

impl Node {
    fn extract_plan(&self) -> Vec<Rc<GroundAction>> {
        let mut plan = Vec::with_capacity(self.g as usize);
        let mut cur = self;
        while let Some(action) = &cur.action {
            plan.push(action.clone());
            cur = cur.parent.as_ref().expect("a node with an action always has a parent");
        }
        plan.reverse();
        plan
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f && self.seq == other.seq
    }
}
impl Eq for Node {}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse the f comparison so the lowest
        // f pops first, and break ties on seq so the earliest-generated
        // node of equal cost pops first.
        other
            .f
            .partial_cmp(&self.f)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug)]
pub enum PlanOutcome {
    Plan(Vec<Rc<GroundAction>>),
    NoPlan,
}

/// Owns everything a solve needs: the typed object universe, the operator
/// cells, and the problem instance. Dropping a `Planner` releases the whole
/// search — nothing it builds outlives it.
pub struct Planner {
    world: World,
    operators: OperatorsManager,
    initial_state: State,
    goal: Vec<Fact>,
}

impl Planner {
    pub fn new(world: World, operators: OperatorsManager, initial_state: State, goal: Vec<Fact>) -> Self {
        Planner {
            world,
            operators,
            initial_state,
            goal,
        }
    }

    /// Builds a `Planner` directly from a parsed domain/problem: picks the
    /// canonical grounding of each action schema and interns the `void`
    /// action's name.
    pub fn from_domain_problem(mut dp: DomainProblem) -> Self {
        let schemas = canonicalize_schemas(dp.actions);
        let void_name = dp.world.symbols.intern("void");
        let operators = OperatorsManager::new(&schemas, void_name);
        Planner::new(dp.world, operators, dp.initial_state, dp.goal)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn initial_state(&self) -> &State {
        &self.initial_state
    }

    pub fn goal(&self) -> &[Fact] {
        &self.goal
    }

    pub fn solve(&mut self, mode: Heuristic) -> PlanOutcome {
        log::info!(
            "building relaxed planning graph from {} initial facts toward {} goal facts",
            self.initial_state.len(),
            self.goal.len()
        );
        let rpg = build_rpg(&self.initial_state, &mut self.operators, &self.world, &self.goal);
        if rpg.unsolvable {
            log::info!("relaxed planning graph reached a fixpoint without satisfying the goal");
            return PlanOutcome::NoPlan;
        }

        match astar(&self.initial_state, &mut self.operators, &self.world, &rpg, &self.goal, mode) {
            Some(plan) => PlanOutcome::Plan(plan),
            None => PlanOutcome::NoPlan,
        }
    }
}

fn astar(
    initial_state: &State,
    operators: &mut OperatorsManager,
    world: &World,
    rpg: &crate::classical::heuristic::Rpg,
    goal: &[Fact],
    mode: Heuristic,
) -> Option<Vec<Rc<GroundAction>>> {
    let mut heap: BinaryHeap<Rc<Node>> = BinaryHeap::new();
    let mut seen: HashSet<State> = HashSet::new();
    let mut seq: u64 = 0;

    let h0 = heuristic(rpg, initial_state, goal, mode);
    seen.insert(initial_state.clone());
    heap.push(Rc::new(Node {
        state: initial_state.clone(),
        parent: None,
        action: None,
        g: 0,
        f: h0,
        seq,
    }));
    seq += 1;

    let mut expansions = 0u64;
    while let Some(node) = heap.pop() {
        if goal.iter().all(|f| node.state.contains(f)) {
            log::info!("plan found after {expansions} expansions, length {}", node.g);
            return Some(node.extract_plan());
        }
        expansions += 1;

        let actions = operators.applicable_actions(&node.state, world, Direction::Forward);
        for action in actions {
            let mut next_state = node.state.clone();
            for fact in &action.effect_neg {
                next_state.remove(fact);
            }
            for fact in &action.effect_pos {
                next_state.insert(fact.clone());
            }

            if !seen.insert(next_state.clone()) {
                continue;
            }

            let h = heuristic(rpg, &next_state, goal, mode);
            let g = node.g + 1;
            let f = g as Cost + h;
            heap.push(Rc::new(Node {
                state: next_state,
                parent: Some(node.clone()),
                action: Some(Rc::new(action)),
                g,
                f,
                seq,
            }));
            seq += 1;
        }
    }

    log::info!("search exhausted after {expansions} expansions without reaching the goal");
    None
}
