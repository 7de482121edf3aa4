//! The assignment enumerator: given a stream of partial variable bindings,
//! finds every way to combine them into a *total* binding over a declared
//! variable set `V`, using a prefix tree so overlapping partials are merged
//! without ever materializing their full cartesian product.
//!
//! Grounded directly on `utils.py`'s `VariablesAssign` class; the class's
//! `tree`/`_update_tree`/`process_assignations`/`reset` map onto
//! `AssignmentEnumerator`'s `tree`/`recurse`/`process`/`reset` one for one.

use crate::symbols::Sym;
use rand::seq::SliceRandom;
use std::collections::{BTreeMap, HashMap, HashSet};

/// A (possibly partial) variable binding. Kept as a `BTreeMap` so it can be
/// used as a `HashMap`/`HashSet` key (std's `BTreeMap` implements `Hash`)
/// while still supporting ordered iteration where that matters.
pub type Binding = BTreeMap<Sym, Sym>;

#[derive(Default)]
struct TreeNode {
    children: HashMap<Binding, TreeNode>,
}

/// Enumerates total bindings over a fixed variable set `V` from a stream of
/// partial bindings.
pub struct AssignmentEnumerator {
    vars: HashSet<Sym>,
    tree: TreeNode,
}

impl AssignmentEnumerator {
    pub fn new(vars: HashSet<Sym>) -> Self {
        AssignmentEnumerator {
            vars,
            tree: TreeNode::default(),
        }
    }

    pub fn reset(&mut self) {
        self.tree = TreeNode::default();
    }

    /// Filters and restricts an incoming partial binding per the entry
    /// rule: a key outside `V` is only admitted when its value equals the
    /// key itself (an "identity constant" — this is how a mismatched
    /// literal-constant argument position gets rejected instead of
    /// silently dropped). Returns `None` when the whole partial must be
    /// discarded.
    fn filter_partial(&self, partial: &HashMap<Sym, Sym>) -> Option<Binding> {
        for (&k, &v) in partial {
            if !self.vars.contains(&k) && v != k {
                return None;
            }
        }
        Some(
            partial
                .iter()
                .filter(|(k, _)| self.vars.contains(k))
                .map(|(&k, &v)| (k, v))
                .collect(),
        )
    }

    /// Processes a batch of partial bindings and returns every total
    /// binding over `V` they combine into. Resets internal state before
    /// returning, so the enumerator is ready for the next batch.
    pub fn process(&mut self, partials: Vec<HashMap<Sym, Sym>>) -> HashSet<Binding> {
        let n_vars = self.vars.len();
        let mut filtered: Vec<Binding> = partials
            .iter()
            .filter_map(|p| self.filter_partial(p))
            .collect();

        // The order partials are folded into the tree doesn't affect the
        // resulting set, only the tree's internal shape; shuffling matches
        // `utils.py`'s `np.random.permutation` and avoids accidentally
        // depending on caller iteration order.
        let mut rng = rand::rng();
        filtered.shuffle(&mut rng);

        let mut out = HashSet::new();
        let empty_cache = Binding::new();
        for assignment in filtered {
            recurse(&empty_cache, &mut self.tree, assignment, n_vars, &mut out);
        }
        self.reset();
        out
    }
}

fn recurse(
    cache: &Binding,
    node: &mut TreeNode,
    assignment: Binding,
    n_vars: usize,
    out: &mut HashSet<Binding>,
) {
    if assignment.is_empty() {
        if cache.len() == n_vars {
            out.insert(cache.clone());
        }
        return;
    }
    if assignment.len() == n_vars {
        out.insert(assignment);
        return;
    }

    // Classify existing children of this tree node against `assignment`:
    // compatible means every variable they share agrees; fully contained
    // additionally requires every variable of the child to be present in
    // `assignment`. A fully-contained child short-circuits the search: only
    // it is recursed into. Otherwise every compatible child, plus
    // `assignment` itself (freshly inserted as a new child), is recursed
    // into.
    let mut compatible: Vec<Binding> = Vec::new();
    let mut fully_contained: Option<Binding> = None;
    for key in node.children.keys() {
        let mut shared = 0usize;
        let mut agrees = true;
        for (v, val) in key.iter() {
            if let Some(pval) = assignment.get(v) {
                shared += 1;
                if pval != val {
                    agrees = false;
                    break;
                }
            }
        }
        if agrees {
            if shared == key.len() {
                fully_contained = Some(key.clone());
                break;
            }
            compatible.push(key.clone());
        }
    }

    let targets: Vec<Binding> = if let Some(q) = fully_contained {
        vec![q]
    } else {
        node.children.entry(assignment.clone()).or_default();
        compatible.push(assignment.clone());
        compatible
    };

    for target in targets {
        let mut new_cache = cache.clone();
        new_cache.extend(target.iter().map(|(&v, &val)| (v, val)));
        let residual: Binding = assignment
            .iter()
            .filter(|(v, _)| !target.contains_key(*v))
            .map(|(&v, &val)| (v, val))
            .collect();
        let child = node.children.get_mut(&target).expect("target was just classified or inserted");
        recurse(&new_cache, child, residual, n_vars, out);
    }
}
