//! Reads a PDDL domain and problem pair into a `DomainProblem`: a flat
//! object universe, the initial state, the goal, and one `ActionSchema` per
//! `:action` block.
//!
//! Grounded on `parsing/pddl.rs`'s `parse_pddl_domain`/`parse_pddl_problem`
//! and `Domain`/`TypedSymbol` shapes, simplified in three ways that follow
//! directly from this planner's simpler, flat data model (see
//! `symbols::World`, `classical::schema::ActionSchema`):
//!
//! - `:types` hierarchy is flattened at load time (an object declared under
//!   a subtype is also registered under every ancestor type) rather than
//!   kept as a `TypeHierarchy` queried at grounding time.
//! - `:predicates` declarations are accepted but unused: grounding here
//!   only ever looks at the literal argument patterns inside each action's
//!   own precondition/effect, the way `operators.py` does, so a separate
//!   arity table adds nothing.
//! - Durative actions, numeric fluents and HTN `:task`/`:method` blocks are
//!   out of scope and rejected with an error rather than silently ignored.

use crate::classical::schema::{ActionSchema, PatternSet, Term};
use crate::classical::state::{Fact, State};
use crate::symbols::{Sym, World};
use anyhow::{bail, Context, Result};
use std::collections::{HashMap, VecDeque};

use super::sexpr::{parse_one, ListExt, SExpr};

pub struct DomainProblem {
    pub world: World,
    pub initial_state: State,
    pub goal: Vec<Fact>,
    pub actions: Vec<ActionSchema>,
}

struct TypeHierarchy {
    parent: HashMap<String, String>,
}

impl TypeHierarchy {
    fn ancestors(&self, tpe: &str) -> Vec<String> {
        let mut out = vec![tpe.to_string()];
        let mut cur = tpe.to_string();
        while let Some(parent) = self.parent.get(&cur) {
            out.push(parent.clone());
            cur = parent.clone();
        }
        out
    }
}

/// Parses `(name1 name2 - type name3 - type ...)`-style typed lists (used
/// for `:types`, `:constants`, `:objects` and action `:parameters`). An
/// untyped trailing run defaults to `object`.
fn parse_typed_list(items: &[SExpr]) -> Result<Vec<(String, String)>> {
    let mut pending: Vec<String> = Vec::new();
    let mut out = Vec::new();
    let mut i = 0;
    while i < items.len() {
        let atom = items[i].as_atom()?;
        if atom == "-" {
            i += 1;
            let tpe = items
                .get(i)
                .context("`-` in a typed list must be followed by a type name")?
                .as_atom()?
                .to_string();
            for name in pending.drain(..) {
                out.push((name, tpe.clone()));
            }
            i += 1;
        } else {
            pending.push(atom.to_string());
            i += 1;
        }
    }
    for name in pending.drain(..) {
        out.push((name, "object".to_string()));
    }
    Ok(out)
}

fn parse_term(atom: &str, symbols: &mut crate::symbols::SymbolTable) -> Term {
    let sym = symbols.intern(atom);
    if atom.starts_with('?') {
        Term::Var(sym)
    } else {
        Term::Const(sym)
    }
}

/// Parses one literal, `(pred arg1 arg2 ...)` or `(not (pred arg1 ...))`,
/// inserting it into `pos`/`neg` as appropriate.
fn parse_literal(
    expr: &SExpr,
    world: &mut World,
    pos: &mut PatternSet,
    neg: &mut PatternSet,
) -> Result<()> {
    let list = expr.as_list()?;
    let mut items: VecDeque<SExpr> = list.to_vec().into();
    let head = items.take_atom()?;

    if head == "not" {
        let inner = items.take_front()?;
        parse_literal(&inner, world, neg, pos)?;
        return Ok(());
    }

    let pred = world.symbols.intern(&head);
    let args: Vec<Term> = items
        .iter()
        .map(|e| parse_term(e.as_atom().unwrap_or(""), &mut world.symbols))
        .collect();
    pos.entry(pred).or_default().insert(args);
    Ok(())
}

/// Parses a `:precondition`/`:effect` body, which is either a single
/// literal or an `(and lit1 lit2 ...)` conjunction.
fn parse_conjunction(expr: &SExpr, world: &mut World) -> Result<(PatternSet, PatternSet)> {
    let mut pos = PatternSet::new();
    let mut neg = PatternSet::new();
    let list = expr.as_list()?;
    if list.is_empty() {
        return Ok((pos, neg));
    }
    if list.first().and_then(|e| e.as_atom().ok()) == Some("and") {
        for lit in &list[1..] {
            parse_literal(lit, world, &mut pos, &mut neg)?;
        }
    } else {
        parse_literal(expr, world, &mut pos, &mut neg)?;
    }
    Ok((pos, neg))
}

fn declare_typed(world: &mut World, name: &str, tpe: &str, hierarchy: &TypeHierarchy) {
    let obj = world.symbols.intern(name);
    for ancestor in hierarchy.ancestors(tpe) {
        let tpe_sym = world.symbols.intern(&ancestor);
        world.declare_object(obj, tpe_sym);
    }
}

fn parse_action(items: &[SExpr], world: &mut World) -> Result<ActionSchema> {
    let mut items: VecDeque<SExpr> = items.to_vec().into();
    let name = items.take_atom()?;

    let mut parameters: Vec<(Sym, Sym)> = Vec::new();
    let mut precondition_pos = PatternSet::new();
    let mut precondition_neg = PatternSet::new();
    let mut effect_pos = PatternSet::new();
    let mut effect_neg = PatternSet::new();

    while let Ok(key_expr) = items.take_front() {
        let key = key_expr.as_atom()?;
        match key {
            ":parameters" => {
                let list = items.take_front()?;
                for (var, tpe) in parse_typed_list(list.as_list()?)? {
                    let var_sym = world.symbols.intern(&var);
                    let tpe_sym = world.symbols.intern(&tpe);
                    parameters.push((var_sym, tpe_sym));
                }
            }
            ":precondition" => {
                let body = items.take_front()?;
                let (pos, neg) = parse_conjunction(&body, world)?;
                precondition_pos = pos;
                precondition_neg = neg;
            }
            ":effect" => {
                let body = items.take_front()?;
                let (pos, neg) = parse_conjunction(&body, world)?;
                effect_pos = pos;
                effect_neg = neg;
            }
            other => bail!("unsupported action keyword `{other}` in action `{name}`"),
        }
    }

    Ok(ActionSchema {
        name: world.symbols.intern(&name),
        parameters,
        precondition_pos,
        precondition_neg,
        effect_pos,
        effect_neg,
    })
}

pub fn parse_domain(src: &str) -> Result<(World, Vec<ActionSchema>, TypeHierarchy)> {
    let root = parse_one(src).context("parsing domain file")?;
    let mut items: VecDeque<SExpr> = root.as_list()?.to_vec().into();
    let define = items.take_atom()?;
    if define != "define" {
        bail!("domain file must start with `(define ...)`");
    }
    let _name_form = items.take_front()?; // (domain NAME)

    let mut world = World::new();
    let mut hierarchy = TypeHierarchy { parent: HashMap::new() };
    let mut constants: Vec<(String, String)> = Vec::new();
    let mut actions = Vec::new();

    for section in items {
        let list = section.as_list()?;
        let key = list.first().context("empty section in domain file")?.as_atom()?;
        match key {
            ":requirements" => {}
            ":types" => {
                for (sub, sup) in parse_typed_list(&list[1..])? {
                    hierarchy.parent.insert(sub, sup);
                }
            }
            ":predicates" => {}
            ":constants" => {
                constants = parse_typed_list(&list[1..])?;
            }
            ":action" => {
                actions.push(parse_action(&list[1..], &mut world)?);
            }
            ":durative-action" | ":task" | ":method" => {
                bail!("`{key}` is outside this planner's scope (classical STRIPS only)")
            }
            other => bail!("unsupported domain section `{other}`"),
        }
    }

    for (name, tpe) in &constants {
        declare_typed(&mut world, name, tpe, &hierarchy);
    }

    Ok((world, actions, hierarchy))
}

pub fn parse_problem(
    src: &str,
    mut world: World,
    hierarchy: &TypeHierarchy,
) -> Result<(World, State, Vec<Fact>)> {
    let root = parse_one(src).context("parsing problem file")?;
    let mut items: VecDeque<SExpr> = root.as_list()?.to_vec().into();
    let define = items.take_atom()?;
    if define != "define" {
        bail!("problem file must start with `(define ...)`");
    }
    let _name_form = items.take_front()?; // (problem NAME)

    let mut initial_state = State::new();
    let mut goal = Vec::new();

    for section in items {
        let list = section.as_list()?;
        let key = list.first().context("empty section in problem file")?.as_atom()?;
        match key {
            ":domain" => {}
            ":objects" => {
                for (name, tpe) in parse_typed_list(&list[1..])? {
                    declare_typed(&mut world, &name, &tpe, hierarchy);
                }
            }
            ":init" => {
                for fact_expr in &list[1..] {
                    let fact_list = fact_expr.as_list()?;
                    let mut fact_items: VecDeque<SExpr> = fact_list.to_vec().into();
                    let pred_name = fact_items.take_atom()?;
                    let pred = world.symbols.intern(&pred_name);
                    let args: Vec<Sym> = fact_items
                        .iter()
                        .map(|e| world.symbols.intern(e.as_atom().unwrap_or("")))
                        .collect();
                    initial_state.insert(Fact::new(pred, args));
                }
            }
            ":goal" => {
                let body = list.get(1).context(":goal must have a body")?;
                let (pos, _neg) = parse_conjunction(body, &mut world)?;
                for (pred, arg_vecs) in pos {
                    for args in arg_vecs {
                        let resolved: Vec<Sym> = args
                            .iter()
                            .map(|t| match t {
                                Term::Const(c) => *c,
                                Term::Var(v) => *v,
                            })
                            .collect();
                        goal.push(Fact::new(pred, resolved));
                    }
                }
            }
            other => bail!("unsupported problem section `{other}`"),
        }
    }

    Ok((world, initial_state, goal))
}

/// Parses a domain/problem pair into a fully built `DomainProblem`.
///
/// `:goal` is required to be ground (no free variables) per the classical
/// STRIPS subset this planner targets, so `Term::Var`/`Term::Const` collapse
/// to the same symbol lookup there; a variable-looking atom in a `:goal`
/// literal is accepted as a plain object name rather than rejected, since
/// PDDL itself doesn't allow quantifiers in this subset and authoring a
/// goal literal with a `?`-prefixed object name would be unusual but not
/// actually ambiguous.
pub fn read_domain_problem(domain_src: &str, problem_src: &str) -> Result<DomainProblem> {
    let (world, actions, hierarchy) = parse_domain(domain_src)?;
    let (world, initial_state, goal) = parse_problem(problem_src, world, &hierarchy)?;
    Ok(DomainProblem {
        world,
        initial_state,
        goal,
        actions,
    })
}
