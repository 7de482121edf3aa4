//! PDDL domain/problem parsing: just enough of the language to feed the
//! classical grounder (`:action` preconditions/effects as STRIPS literals,
//! typed objects, a ground `:init` and `:goal`). Durative actions, numeric
//! fluents and HTN blocks are out of scope.

pub mod pddl;
pub mod sexpr;

pub use pddl::{parse_domain, parse_problem, read_domain_problem, DomainProblem};
pub use sexpr::{parse_all, parse_one, SExpr};
