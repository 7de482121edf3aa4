//! The ground fact/state data model shared by every other classical module.
//!
//! Grounded on `classical/state.rs`'s `SvId`/`State` pair, but this planner
//! keeps facts as plain predicate-applied-to-objects tuples instead of
//! packing them into bitset-indexed state variables: the spec's grounding
//! and RPG machinery want to inspect a fact's predicate and arguments
//! directly, so the extra indirection of an interned state-variable layer
//! earns nothing here.

use crate::symbols::Sym;
use std::collections::BTreeSet;

/// A single ground fact: a predicate symbol applied to object arguments.
///
/// `Ord`/`Hash` are derived so a `Fact` can be used directly as a key
/// (heuristic memoization, achiever indices) and so `State` can keep a
/// canonical iteration order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fact {
    pub predicate: Sym,
    pub args: Box<[Sym]>,
}

impl Fact {
    pub fn new(predicate: Sym, args: impl Into<Box<[Sym]>>) -> Self {
        Fact {
            predicate,
            args: args.into(),
        }
    }
}

/// A closed-world state: the set of facts currently true.
///
/// Backed by a `BTreeSet` rather than a `HashSet` so that `State` itself
/// implements `Hash`/`Eq` structurally (`BTreeSet`'s iteration order is a
/// function of its contents) — the A* closed set keys directly on the full
/// fact set rather than on a separately computed hash, avoiding the
/// collision risk a hand-rolled state hash would carry.
pub type State = BTreeSet<Fact>;
