//! Classical (STRIPS-style) planning: grounding, the relaxed planning
//! graph, heuristic extraction and forward A* search.

pub mod graph;
pub mod ground;
pub mod heuristic;
pub mod operator;
pub mod operators_manager;
pub mod planner;
pub mod schema;
pub mod state;

pub use graph::{Label, LayerKind, LayeredGraph, NodeId};
pub use ground::{AssignmentEnumerator, Binding};
pub use heuristic::{build_rpg, heuristic as compute_heuristic, Cost, Heuristic, Rpg};
pub use operator::{Direction, GroundAction, OperatorCell};
pub use operators_manager::OperatorsManager;
pub use planner::{Planner, PlanOutcome};
pub use schema::{canonicalize_schemas, pick_canonical, ActionSchema, PatternSet, Term};
pub use state::{Fact, State};
